//! Aggregation layer: per-(student, course) signals derived from attempts.
//!
//! `recency_gap_days` and `tag_gap` are accepted as independent inputs with
//! config-supplied defaults, so a real recency/tag-overlap computation can be
//! wired in later without touching the scoring contract.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::model::Attempt;

/// Assumed "high hint usage" ceiling per attempt; hint averages are
/// normalized against it.
const HINT_CEILING: f64 = 3.0;

/// Per-request contextual signals the store cannot derive yet.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeatureDefaults {
    pub recency_gap_days: f64,
    pub tag_gap: f64,
}

impl Default for FeatureDefaults {
    fn default() -> Self {
        Self {
            recency_gap_days: 5.0,
            tag_gap: 0.3,
        }
    }
}

/// Signals computed from one student's attempts within one course.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CourseSignals {
    /// Coarse completion proxy: 10 points per attempt, capped at 100.
    pub progress: f64,
    /// Average hints used per attempt, normalized; 0.0 with no attempts.
    pub hint_rate: f64,
    pub last_activity: Option<DateTime<Utc>>,
}

pub fn course_signals(attempts: &[Attempt]) -> CourseSignals {
    let progress = (attempts.len() as f64 * 10.0).min(100.0);
    let hint_rate = if attempts.is_empty() {
        0.0
    } else {
        let avg =
            attempts.iter().map(|a| f64::from(a.hints_used)).sum::<f64>() / attempts.len() as f64;
        avg / HINT_CEILING
    };
    let last_activity = attempts.iter().map(|a| a.timestamp).max();
    CourseSignals {
        progress,
        hint_rate,
        last_activity,
    }
}
