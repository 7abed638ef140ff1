use std::sync::Arc;

use crate::{
    db::graph::{queries, GraphStore, Params},
    error::AppResult,
    models::{StudentId, Strategy},
};

/// Picks the primary recommendation strategy from the student's rating history
#[derive(Clone)]
pub struct StrategySelector {
    graph: Arc<dyn GraphStore>,
}

impl StrategySelector {
    pub fn new(graph: Arc<dyn GraphStore>) -> Self {
        Self { graph }
    }

    /// Students with at least one rating get content-based recommendations,
    /// everyone else collaborative filtering. An unknown student counts as unrated.
    pub async fn select_strategy(&self, student_id: StudentId) -> AppResult<Strategy> {
        let records = self
            .graph
            .run(&queries::HAS_RATED, Params::new().int("studentId", student_id))
            .await?;

        let has_rated = match records.first() {
            Some(record) => record.bool("hasRated")?,
            None => false,
        };

        let strategy = if has_rated {
            Strategy::ContentBased
        } else {
            Strategy::CollaborativeFiltering
        };

        tracing::debug!(student_id, has_rated, strategy = %strategy, "Strategy selected");

        Ok(strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::graph::{Field, MockGraphStore, Record, Scalar};
    use crate::error::AppError;

    fn selector_with(answer: Option<bool>) -> StrategySelector {
        let mut graph = MockGraphStore::new();
        graph
            .expect_run()
            .withf(|query, params| {
                query.name() == "has_rated" && params.get("studentId") == Some(&Scalar::Int(5))
            })
            .times(1)
            .returning(move |query, _| {
                Ok(answer
                    .map(|value| Record::new(query, vec![Field::Bool(value)]).unwrap())
                    .into_iter()
                    .collect())
            });
        StrategySelector::new(Arc::new(graph))
    }

    #[tokio::test]
    async fn test_rated_student_gets_content_based() {
        let strategy = selector_with(Some(true)).select_strategy(5).await.unwrap();
        assert_eq!(strategy, Strategy::ContentBased);
    }

    #[tokio::test]
    async fn test_unrated_student_gets_collaborative() {
        let strategy = selector_with(Some(false)).select_strategy(5).await.unwrap();
        assert_eq!(strategy, Strategy::CollaborativeFiltering);
    }

    #[tokio::test]
    async fn test_no_rows_means_unrated() {
        let strategy = selector_with(None).select_strategy(5).await.unwrap();
        assert_eq!(strategy, Strategy::CollaborativeFiltering);
    }

    #[tokio::test]
    async fn test_graph_failure_propagates() {
        let mut graph = MockGraphStore::new();
        graph
            .expect_run()
            .returning(|_, _| Err(AppError::Graph("connection reset".to_string())));

        let err = StrategySelector::new(Arc::new(graph))
            .select_strategy(5)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Graph(_)));
    }
}
