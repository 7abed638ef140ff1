use std::sync::Arc;

use crate::{
    db::graph::{queries, CypherQuery, GraphStore, Params, Record},
    error::{AppError, AppResult},
    models::{Category, CategoryId, Course, CourseId, StudentId, MAX_RECOMMENDATIONS},
};

/// Where the fallback looks for a category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryContext {
    /// Category of a course the student is enrolled in or has rated
    Student(StudentId),
    /// Category of the given course
    Course(CourseId),
}

/// A resolved category together with the course it was reached through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCategory {
    pub category: Category,
    pub reference_course: CourseId,
}

/// Finds courses that share a category with the student's or course's context
#[derive(Clone)]
pub struct CategoryFallbackResolver {
    graph: Arc<dyn GraphStore>,
}

impl CategoryFallbackResolver {
    pub fn new(graph: Arc<dyn GraphStore>) -> Self {
        Self { graph }
    }

    /// Up to ten courses from the context's category, in store order.
    ///
    /// For a student, courses they have rated or enrolled in are left out.
    /// Fails with `NotFound` when the context has no category.
    pub async fn resolve_by_category(&self, context: CategoryContext) -> AppResult<Vec<Course>> {
        let resolved = self.resolve_category(context).await?;
        let candidates = match context {
            CategoryContext::Student(student_id) => {
                self.fetch_courses(
                    &queries::UNSEEN_CATEGORY_COURSES,
                    Params::new()
                        .int("categoryId", resolved.category.id)
                        .int("studentId", student_id)
                        .int("limit", MAX_RECOMMENDATIONS as i64 + 1),
                )
                .await?
            }
            CategoryContext::Course(_) => self.category_courses(resolved.category.id).await?,
        };

        Ok(siblings_of(candidates, resolved.reference_course))
    }

    /// Resolves the category of `context` via its `IN_CATEGORY` edge.
    ///
    /// A missing edge or a malformed category node both surface as `NotFound`.
    pub async fn resolve_category(&self, context: CategoryContext) -> AppResult<ResolvedCategory> {
        let (query, params) = match context {
            CategoryContext::Student(id) => {
                (&queries::STUDENT_CATEGORY, Params::new().int("studentId", id))
            }
            CategoryContext::Course(id) => {
                (&queries::COURSE_CATEGORY, Params::new().int("courseId", id))
            }
        };

        let records = self.graph.run(query, params).await?;
        let record = records
            .first()
            .ok_or_else(|| AppError::NotFound(format!("No category for {:?}", context)))?;

        match Self::parse_category(context, record) {
            Ok(resolved) => {
                tracing::debug!(
                    context = ?context,
                    category_id = resolved.category.id,
                    category = %resolved.category.name,
                    "Resolved fallback category"
                );
                Ok(resolved)
            }
            Err(AppError::MalformedRecord(reason)) => {
                tracing::warn!(context = ?context, reason = %reason, "Malformed category record");
                Err(AppError::NotFound(format!(
                    "No usable category for {:?}",
                    context
                )))
            }
            Err(e) => Err(e),
        }
    }

    /// Every course in the category, nothing excluded.
    ///
    /// Fetches one row past the cap so a caller dropping its own course
    /// still has a full list.
    pub async fn category_courses(&self, category_id: CategoryId) -> AppResult<Vec<Course>> {
        self.fetch_courses(
            &queries::CATEGORY_COURSES,
            Params::new()
                .int("categoryId", category_id)
                .int("limit", MAX_RECOMMENDATIONS as i64 + 1),
        )
        .await
    }

    async fn fetch_courses(&self, query: &CypherQuery, params: Params) -> AppResult<Vec<Course>> {
        let records = self.graph.run(query, params).await?;

        Ok(records
            .iter()
            .filter_map(|record| {
                record
                    .node("c")
                    .and_then(|props| Course::from_properties(props.clone()))
                    .map_err(|e| tracing::warn!(error = %e, "Skipping malformed course row"))
                    .ok()
            })
            .collect())
    }

    fn parse_category(context: CategoryContext, record: &Record) -> AppResult<ResolvedCategory> {
        let category = Category::from_properties(record.node("category")?.clone())?;
        let reference_course = match context {
            CategoryContext::Student(_) => record.int("courseId")?,
            CategoryContext::Course(id) => id,
        };
        Ok(ResolvedCategory {
            category,
            reference_course,
        })
    }
}

/// Drops `reference` from a category list and applies the cap
pub fn siblings_of(courses: Vec<Course>, reference: CourseId) -> Vec<Course> {
    courses
        .into_iter()
        .filter(|course| course.id != reference)
        .take(MAX_RECOMMENDATIONS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::graph::{Field, MockGraphStore, Scalar};
    use serde_json::json;

    fn node(value: serde_json::Value) -> Field {
        Field::Node(value.as_object().cloned().unwrap())
    }

    fn math() -> Field {
        node(json!({ "id": 1, "name": "Math" }))
    }

    fn expect_courses(
        graph: &mut MockGraphStore,
        name: &'static str,
        student: Option<i64>,
        ids: Vec<i64>,
    ) {
        graph
            .expect_run()
            .withf(move |query, params| {
                query.name() == name
                    && params.get("categoryId") == Some(&Scalar::Int(1))
                    && params.get("studentId") == student.map(Scalar::Int).as_ref()
                    && params.get("limit") == Some(&Scalar::Int(11))
            })
            .times(1)
            .returning(move |query, _| {
                Ok(ids
                    .iter()
                    .map(|id| {
                        Record::new(query, vec![node(json!({ "id": id, "courseTitle": "x" }))])
                            .unwrap()
                    })
                    .collect())
            });
    }

    fn expect_student_math(graph: &mut MockGraphStore, reference: i64) {
        graph
            .expect_run()
            .withf(|query, params| {
                query.name() == "student_category"
                    && params.get("studentId") == Some(&Scalar::Int(5))
            })
            .times(1)
            .returning(move |query, _| {
                Ok(vec![Record::new(query, vec![math(), Field::Int(reference)]).unwrap()])
            });
    }

    fn ids(courses: &[Course]) -> Vec<i64> {
        courses.iter().map(|c| c.id).collect()
    }

    #[tokio::test]
    async fn test_course_context_returns_siblings() {
        let mut graph = MockGraphStore::new();
        graph
            .expect_run()
            .withf(|query, params| {
                query.name() == "course_category" && params.get("courseId") == Some(&Scalar::Int(10))
            })
            .times(1)
            .returning(|query, _| Ok(vec![Record::new(query, vec![math()]).unwrap()]));
        expect_courses(&mut graph, "category_courses", None, vec![10, 20, 30]);

        let resolver = CategoryFallbackResolver::new(Arc::new(graph));
        let courses = resolver
            .resolve_by_category(CategoryContext::Course(10))
            .await
            .unwrap();

        assert_eq!(ids(&courses), vec![20, 30]);
    }

    #[tokio::test]
    async fn test_student_context_skips_student_history() {
        let mut graph = MockGraphStore::new();
        // Math was reached through rated course 10; 11 is rated too and filtered by the store
        expect_student_math(&mut graph, 10);
        expect_courses(&mut graph, "unseen_category_courses", Some(5), vec![20]);
        graph
            .expect_run()
            .withf(|query, _| query.name() == "category_courses")
            .times(0);

        let resolver = CategoryFallbackResolver::new(Arc::new(graph));
        let courses = resolver
            .resolve_by_category(CategoryContext::Student(5))
            .await
            .unwrap();

        assert_eq!(ids(&courses), vec![20]);
    }

    #[tokio::test]
    async fn test_student_context_excludes_reference_course() {
        let mut graph = MockGraphStore::new();
        expect_student_math(&mut graph, 10);
        expect_courses(&mut graph, "unseen_category_courses", Some(5), vec![10, 20]);

        let resolver = CategoryFallbackResolver::new(Arc::new(graph));
        let courses = resolver
            .resolve_by_category(CategoryContext::Student(5))
            .await
            .unwrap();

        assert_eq!(ids(&courses), vec![20]);
    }

    #[tokio::test]
    async fn test_category_courses_keeps_every_course() {
        let mut graph = MockGraphStore::new();
        expect_courses(&mut graph, "category_courses", None, vec![10, 20, 30]);

        let resolver = CategoryFallbackResolver::new(Arc::new(graph));
        let courses = resolver.category_courses(1).await.unwrap();

        assert_eq!(ids(&courses), vec![10, 20, 30]);
    }

    #[test]
    fn test_siblings_of_drops_reference_and_caps() {
        let courses: Vec<Course> = (1..=11).map(|id| Course::new(id, "x")).collect();

        let siblings = siblings_of(courses.clone(), 5);
        assert_eq!(siblings.len(), MAX_RECOMMENDATIONS);
        assert!(!ids(&siblings).contains(&5));

        let siblings = siblings_of(courses, 42);
        assert_eq!(ids(&siblings), (1..=10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_missing_category_is_not_found() {
        let mut graph = MockGraphStore::new();
        graph
            .expect_run()
            .withf(|query, _| query.name() == "student_category")
            .times(1)
            .returning(|_, _| Ok(vec![]));

        let resolver = CategoryFallbackResolver::new(Arc::new(graph));
        let err = resolver
            .resolve_by_category(CategoryContext::Student(7))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_malformed_category_is_not_found() {
        let mut graph = MockGraphStore::new();
        graph
            .expect_run()
            .withf(|query, _| query.name() == "course_category")
            .times(1)
            .returning(|query, _| {
                Ok(vec![Record::new(query, vec![node(json!({ "id": 1 }))]).unwrap()])
            });

        let resolver = CategoryFallbackResolver::new(Arc::new(graph));
        let err = resolver
            .resolve_by_category(CategoryContext::Course(10))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_upstream_failure_is_not_masked() {
        let mut graph = MockGraphStore::new();
        graph
            .expect_run()
            .returning(|_, _| Err(AppError::Graph("unavailable".to_string())));

        let resolver = CategoryFallbackResolver::new(Arc::new(graph));
        let err = resolver
            .resolve_by_category(CategoryContext::Course(10))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Graph(_)));
    }

    #[tokio::test]
    async fn test_siblings_capped() {
        let mut graph = MockGraphStore::new();
        graph
            .expect_run()
            .withf(|query, _| query.name() == "course_category")
            .returning(|query, _| Ok(vec![Record::new(query, vec![math()]).unwrap()]));
        expect_courses(&mut graph, "category_courses", None, (100..120).collect());

        let resolver = CategoryFallbackResolver::new(Arc::new(graph));
        let courses = resolver
            .resolve_by_category(CategoryContext::Course(10))
            .await
            .unwrap();

        assert_eq!(courses.len(), MAX_RECOMMENDATIONS);
    }
}
