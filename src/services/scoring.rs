use std::collections::{BTreeMap, HashSet};

use crate::models::{
    CategoryScore, CourseId, Observation, ScoredRecommendation, MAX_RECOMMENDATIONS,
};

/// Ranks content-based candidates by their shared-category evidence
#[derive(Debug, Clone, Copy)]
pub struct ScoreAggregator {
    limit: usize,
}

impl Default for ScoreAggregator {
    fn default() -> Self {
        Self {
            limit: MAX_RECOMMENDATIONS,
        }
    }
}

impl ScoreAggregator {
    /// Groups observations by course and ranks the result.
    ///
    /// Courses in `rated` never appear in the output. Scores are sorted
    /// descending with ties broken by ascending course id, then truncated.
    pub fn aggregate<I>(&self, observations: I, rated: &HashSet<CourseId>) -> Vec<ScoredRecommendation>
    where
        I: IntoIterator<Item = Observation>,
    {
        let mut by_course: BTreeMap<CourseId, ScoredRecommendation> = BTreeMap::new();

        for obs in observations {
            if rated.contains(&obs.course.id) {
                continue;
            }

            let entry = by_course
                .entry(obs.course.id)
                .or_insert_with(|| ScoredRecommendation {
                    course: obs.course.clone(),
                    score: 0,
                    contributing_categories: Vec::new(),
                });

            entry.score += obs.weight;
            match entry
                .contributing_categories
                .iter_mut()
                .find(|c| c.category == obs.category)
            {
                Some(existing) => existing.weight += obs.weight,
                None => entry.contributing_categories.push(CategoryScore {
                    category: obs.category,
                    weight: obs.weight,
                }),
            }
        }

        // BTreeMap yields ascending ids; the stable sort keeps that order among ties
        let mut ranked: Vec<ScoredRecommendation> = by_course.into_values().collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked.truncate(self.limit);

        for rec in &mut ranked {
            rec.contributing_categories
                .sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.category.cmp(&b.category)));
        }

        ranked
    }
}
