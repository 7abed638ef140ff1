use neo4rs::{Graph, Node, Row};

use super::{ColumnKind, CypherQuery, Field, GraphStore, Params, Record, Scalar};
use crate::{
    error::{AppError, AppResult},
    models::PropertyMap,
};

/// Neo4j-backed graph store
///
/// Wraps a `neo4rs` connection pool. Rows are converted into [`Record`]s using
/// the column types each query declares.
#[derive(Clone)]
pub struct Neo4jGraph {
    graph: Graph,
}

impl Neo4jGraph {
    /// Connects to Neo4j over Bolt
    pub async fn connect(uri: &str, user: &str, password: &str) -> AppResult<Self> {
        let graph = Graph::new(uri, user, password).await?;
        tracing::info!(uri = %uri, "Connected to Neo4j");
        Ok(Self { graph })
    }

    fn to_record(query: &CypherQuery, row: &Row) -> AppResult<Record> {
        let mut fields = Vec::with_capacity(query.columns().len());

        for column in query.columns() {
            let name = column.name;
            let field = match column.kind {
                ColumnKind::Bool => row.get::<Option<bool>>(name).map(|v| v.map(Field::Bool)),
                ColumnKind::Int => row.get::<Option<i64>>(name).map(|v| v.map(Field::Int)),
                ColumnKind::Text => row.get::<Option<String>>(name).map(|v| v.map(Field::Text)),
                ColumnKind::IntList => row.get::<Option<Vec<i64>>>(name).map(|v| v.map(Field::IntList)),
                ColumnKind::Node => row
                    .get::<Option<Node>>(name)
                    .map(|v| v.and_then(|node| node_properties(&node)).map(Field::Node)),
            }
            .map_err(|e| {
                AppError::MalformedRecord(format!("{}: column `{}`: {}", query.name(), name, e))
            })?;

            fields.push(field.unwrap_or(Field::Null));
        }

        Record::new(query, fields)
    }
}

fn node_properties(node: &Node) -> Option<PropertyMap> {
    match node.to::<PropertyMap>() {
        Ok(props) => Some(props),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read node properties");
            None
        }
    }
}

#[async_trait::async_trait]
impl GraphStore for Neo4jGraph {
    async fn run(&self, query: &CypherQuery, params: Params) -> AppResult<Vec<Record>> {
        params.check_against(query)?;

        let mut q = neo4rs::query(query.text());
        for (name, value) in params.iter() {
            let Scalar::Int(v) = value;
            q = q.param(name, *v);
        }

        tracing::debug!(query = query.name(), "Running graph query");

        let mut stream = self.graph.execute(q).await?;
        let mut records = Vec::new();
        while let Some(row) = stream.next().await? {
            records.push(Self::to_record(query, &row)?);
        }

        tracing::debug!(query = query.name(), rows = records.len(), "Graph query finished");

        Ok(records)
    }
}
