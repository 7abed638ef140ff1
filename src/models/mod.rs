use serde::{Deserialize, Serialize};
use std::fmt::Display;

mod course;

pub use course::{Category, CategoryId, Course, CourseId, PropertyMap, StudentId};

/// Upper bound on every recommendation list produced by the service
pub const MAX_RECOMMENDATIONS: usize = 10;

/// Primary recommendation strategy for a student
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Co-enrollment counts over peers who share a course with the student
    CollaborativeFiltering,
    /// Shared-category scoring over the student's rated courses
    ContentBased,
}

impl Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::CollaborativeFiltering => write!(f, "collaborative_filtering"),
            Strategy::ContentBased => write!(f, "content_based"),
        }
    }
}

/// One row of content-based evidence: `weight` (rated course, shared category)
/// pairs connect `course` to the student through `category`.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub course: Course,
    pub category: String,
    pub weight: u64,
}

/// Contribution of a single category to a recommendation's score
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryScore {
    pub category: String,
    pub weight: u64,
}

/// A ranked candidate course, created per request and never persisted
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoredRecommendation {
    pub course: Course,
    pub score: u64,
    pub contributing_categories: Vec<CategoryScore>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_display() {
        assert_eq!(Strategy::ContentBased.to_string(), "content_based");
        assert_eq!(
            Strategy::CollaborativeFiltering.to_string(),
            "collaborative_filtering"
        );
    }

    #[test]
    fn test_strategy_serde_matches_display() {
        let json = serde_json::to_string(&Strategy::ContentBased).unwrap();
        assert_eq!(json, r#""content_based""#);
    }
}
