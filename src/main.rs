use std::sync::Arc;

use course_recs::{
    api::{create_router, AppState},
    config::Config,
    db::{create_redis_client, graph::queries, Neo4jGraph, RedisCache},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("course_recs=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    // Refuse to start with a broken query template
    queries::validate_all()?;

    let graph = Neo4jGraph::connect(&config.neo4j_uri, &config.neo4j_user, &config.neo4j_password)
        .await?;
    let redis_client = create_redis_client(&config.redis_url)?;
    let cache = RedisCache::new(redis_client, config.cache_ttl_secs);

    let state = AppState::new(Arc::new(graph), Arc::new(cache));
    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
