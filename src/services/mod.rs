pub mod fallback;
pub mod recommendations;
pub mod scoring;
pub mod strategy;

pub use fallback::{CategoryContext, CategoryFallbackResolver};
pub use recommendations::RecommendationEngine;
pub use scoring::ScoreAggregator;
pub use strategy::StrategySelector;
