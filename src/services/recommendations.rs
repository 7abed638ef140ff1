use std::collections::HashSet;
use std::sync::Arc;

use tracing::instrument;

use crate::{
    db::{
        graph::{queries, GraphStore, Params, Record},
        CacheKey, CacheStore,
    },
    error::{AppError, AppResult},
    models::{
        Course, CourseId, Observation, ScoredRecommendation, StudentId, Strategy,
        MAX_RECOMMENDATIONS,
    },
    services::{
        fallback::{siblings_of, CategoryContext, CategoryFallbackResolver},
        scoring::ScoreAggregator,
        strategy::StrategySelector,
    },
};

/// Course recommendation engine
///
/// Cache-aside over a strategy cascade: the student's cached list is served
/// when present; otherwise the selected primary strategy runs, falling back to
/// category siblings when it comes back empty. Only non-empty lists are cached.
///
/// Upstream failures from the graph store or the cache propagate unchanged;
/// only an empty but successful result moves the cascade forward.
#[derive(Clone)]
pub struct RecommendationEngine {
    graph: Arc<dyn GraphStore>,
    cache: Arc<dyn CacheStore>,
    selector: StrategySelector,
    aggregator: ScoreAggregator,
    fallback: CategoryFallbackResolver,
}

impl RecommendationEngine {
    pub fn new(graph: Arc<dyn GraphStore>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            selector: StrategySelector::new(graph.clone()),
            fallback: CategoryFallbackResolver::new(graph.clone()),
            aggregator: ScoreAggregator::default(),
            graph,
            cache,
        }
    }

    /// Recommends up to ten courses for a student
    #[instrument(skip(self))]
    pub async fn recommend(&self, student_id: StudentId) -> AppResult<Vec<Course>> {
        let key = CacheKey::Student(student_id);

        if let Some(cached) = self.read_cached(&key).await? {
            tracing::debug!(key = %key, count = cached.len(), "Cache hit");
            return Ok(cached);
        }

        tracing::debug!(key = %key, "Cache miss");

        let strategy = self.selector.select_strategy(student_id).await?;
        let mut courses: Vec<Course> = match strategy {
            Strategy::ContentBased => self
                .content_based(student_id)
                .await?
                .into_iter()
                .map(|rec| rec.course)
                .collect(),
            Strategy::CollaborativeFiltering => self.co_enrollment(student_id).await?,
        };

        let fallback_used = courses.is_empty();
        if fallback_used {
            tracing::info!(
                student_id,
                strategy = %strategy,
                "Primary strategy returned nothing, falling back to category"
            );
            courses = match self
                .fallback
                .resolve_by_category(CategoryContext::Student(student_id))
                .await
            {
                Ok(courses) => courses,
                Err(AppError::NotFound(reason)) => {
                    tracing::debug!(student_id, reason = %reason, "Category fallback unresolved");
                    Vec::new()
                }
                Err(e) => return Err(e),
            };
        }

        if courses.is_empty() {
            return Err(AppError::NotFound(format!(
                "No recommendations available for student {}",
                student_id
            )));
        }

        courses.truncate(MAX_RECOMMENDATIONS);
        self.write_cached(&key, &courses).await?;

        tracing::info!(
            student_id,
            strategy = %strategy,
            fallback_used,
            count = courses.len(),
            "Recommendations computed"
        );

        Ok(courses)
    }

    /// Courses sharing a category with `course_id`
    ///
    /// The category's full course list is cached under `category:<id>` and
    /// shared by every course in it; `course_id` is dropped on the way out.
    #[instrument(skip(self))]
    pub async fn similar_courses(&self, course_id: CourseId) -> AppResult<Vec<Course>> {
        let resolved = self
            .fallback
            .resolve_category(CategoryContext::Course(course_id))
            .await?;
        let key = CacheKey::Category(resolved.category.id);

        let members = match self.read_cached(&key).await? {
            Some(cached) => {
                tracing::debug!(key = %key, count = cached.len(), "Cache hit");
                cached
            }
            None => {
                let members = self.fallback.category_courses(resolved.category.id).await?;
                if !members.is_empty() {
                    self.write_cached(&key, &members).await?;
                }
                members
            }
        };

        let courses = siblings_of(members, course_id);
        if courses.is_empty() {
            return Err(AppError::NotFound(format!(
                "No courses share a category with course {}",
                course_id
            )));
        }

        tracing::info!(
            course_id,
            category = %resolved.category.name,
            count = courses.len(),
            "Similar courses computed"
        );

        Ok(courses)
    }

    /// Shared-category scoring over the student's rated courses
    async fn content_based(
        &self,
        student_id: StudentId,
    ) -> AppResult<Vec<ScoredRecommendation>> {
        let records = self
            .graph
            .run(&queries::CONTENT_BASED, Params::new().int("studentId", student_id))
            .await?;

        let mut rated: HashSet<CourseId> = HashSet::new();
        let mut observations = Vec::with_capacity(records.len());

        for record in &records {
            if let Ok(ids) = record.int_list("ratedIds") {
                rated.extend(ids.iter().copied());
            }
            match parse_observation(record) {
                Ok(obs) => observations.push(obs),
                Err(e) => tracing::warn!(student_id, error = %e, "Skipping malformed content row"),
            }
        }

        let ranked = self.aggregator.aggregate(observations, &rated);

        tracing::debug!(
            student_id,
            rows = records.len(),
            candidates = ranked.len(),
            "Content-based scoring finished"
        );

        Ok(ranked)
    }

    /// Courses most taken by peers who share an enrollment with the student
    async fn co_enrollment(&self, student_id: StudentId) -> AppResult<Vec<Course>> {
        let records = self
            .graph
            .run(
                &queries::CO_ENROLLMENT,
                Params::new()
                    .int("studentId", student_id)
                    .int("limit", MAX_RECOMMENDATIONS as i64),
            )
            .await?;

        let mut courses: Vec<Course> = records
            .iter()
            .filter_map(|record| {
                record
                    .node("rec")
                    .and_then(|props| Course::from_properties(props.clone()))
                    .map_err(|e| {
                        tracing::warn!(student_id, error = %e, "Skipping malformed co-enrollment row")
                    })
                    .ok()
            })
            .collect();
        courses.truncate(MAX_RECOMMENDATIONS);

        Ok(courses)
    }

    async fn read_cached(&self, key: &CacheKey) -> AppResult<Option<Vec<Course>>> {
        match self.cache.get(key).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn write_cached(&self, key: &CacheKey, courses: &[Course]) -> AppResult<()> {
        let json = serde_json::to_string(courses)?;
        self.cache.set(key, json).await
    }
}

fn parse_observation(record: &Record) -> AppResult<Observation> {
    let course = Course::from_properties(record.node("rec")?.clone())?;
    let category = record.text("category")?.to_string();
    let weight = u64::try_from(record.int("weight")?)
        .map_err(|_| AppError::MalformedRecord("negative weight".to_string()))?;

    Ok(Observation {
        course,
        category,
        weight,
    })
}
