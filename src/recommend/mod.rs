//! Recommendation pipeline: feature aggregation + scoring engine.

pub mod features;
pub mod scoring;

pub use features::{course_signals, CourseSignals, FeatureDefaults};
pub use scoring::{
    recommend, score_candidate, to_confidence, FeatureVector, Recommendation, ScoredCandidate,
    Weights,
};
