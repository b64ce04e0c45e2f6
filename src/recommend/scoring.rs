//! Scoring engine: fixed-weight linear score over four normalized features,
//! logistic confidence transform, and stable ranking of course candidates.
//!
//! The score itself is an unbounded real number; `to_confidence` maps it into
//! [0, 1] for display. Inputs are validated at this boundary so NaN/Infinity
//! never propagate into rankings.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Feature vector used for one (student, course) scoring pass. Derived at
/// request time, returned to the caller for explainability, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    pub progress_inverse: f64,
    pub recency_gap_days: f64,
    pub tag_gap: f64,
    pub hint_rate: f64,
}

/// Calibrated scoring weights. One named value object instead of magic
/// numbers in the scoring path; overridable from config.
///
/// `hint_rate` is negative: heavy hint usage lowers the urgency of a course.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub progress_inverse: f64,
    pub recency_gap_days: f64,
    pub tag_gap: f64,
    pub hint_rate: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            progress_inverse: 0.6,
            recency_gap_days: 0.3,
            tag_gap: 0.2,
            hint_rate: -0.2,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ScoreError {
    #[error("Invalid feature value: {feature} = {value}")]
    InvalidFeatureValue { feature: &'static str, value: f64 },
}

/// Score one course candidate.
///
/// `progress` is clamped to [0, 100] and inverted; `recency_gap_days` is
/// normalized against a 10-day horizon; `tag_gap` and `hint_rate` enter as-is.
/// Returns the raw score together with the feature vector that produced it.
pub fn score_candidate(
    progress: f64,
    recency_gap_days: f64,
    tag_gap: f64,
    hint_rate: f64,
    weights: &Weights,
) -> Result<(f64, FeatureVector), ScoreError> {
    for (feature, value) in [
        ("progress", progress),
        ("recency_gap_days", recency_gap_days),
        ("tag_gap", tag_gap),
        ("hint_rate", hint_rate),
    ] {
        if !value.is_finite() {
            return Err(ScoreError::InvalidFeatureValue { feature, value });
        }
    }

    let progress_inverse = 100.0 - progress.clamp(0.0, 100.0);
    let features = FeatureVector {
        progress_inverse,
        recency_gap_days,
        tag_gap,
        hint_rate,
    };
    let score = weights.progress_inverse * (progress_inverse / 100.0)
        + weights.recency_gap_days * (recency_gap_days / 10.0)
        + weights.tag_gap * tag_gap
        + weights.hint_rate * hint_rate;
    Ok((score, features))
}

/// Logistic transform of the unbounded score into [0, 1].
/// The clamp is defensive for numerical edge cases; `to_confidence(0) == 0.5`.
pub fn to_confidence(score: f64) -> f64 {
    (1.0 / (1.0 + (-score).exp())).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    pub id: String,
    pub title: String,
    pub score: f64,
    pub features: FeatureVector,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseRef {
    pub id: String,
    pub title: String,
}

/// Response shape for the recommendation endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub recommendation: CourseRef,
    pub confidence: f64,
    pub reason_features: FeatureVector,
    pub alternatives: Vec<CourseRef>,
}

/// Sort candidates by score descending. `sort_by` is stable, so candidates
/// with equal scores keep their input order.
pub fn rank(mut candidates: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    candidates
}

/// Pick the top candidate plus up to two alternates. `None` when there is
/// nothing to rank; the caller surfaces that as an informational outcome.
pub fn recommend(candidates: Vec<ScoredCandidate>) -> Option<Recommendation> {
    let mut ranked = rank(candidates).into_iter();
    let top = ranked.next()?;
    let alternatives = ranked
        .take(2)
        .map(|c| CourseRef {
            id: c.id,
            title: c.title,
        })
        .collect();
    Some(Recommendation {
        recommendation: CourseRef {
            id: top.id,
            title: top.title,
        },
        confidence: to_confidence(top.score),
        reason_features: top.features,
        alternatives,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, score: f64) -> ScoredCandidate {
        ScoredCandidate {
            id: id.to_string(),
            title: id.to_string(),
            score,
            features: FeatureVector {
                progress_inverse: 0.0,
                recency_gap_days: 0.0,
                tag_gap: 0.0,
                hint_rate: 0.0,
            },
        }
    }

    #[test]
    fn fresh_course_scores_high() {
        let (score, features) =
            score_candidate(0.0, 5.0, 0.3, 0.0, &Weights::default()).unwrap();
        assert!((score - 0.81).abs() < 1e-12, "score was {score}");
        assert!((features.progress_inverse - 100.0).abs() < 1e-12);
        let confidence = to_confidence(score);
        assert!((confidence - 0.6922).abs() < 1e-3, "confidence was {confidence}");
    }

    #[test]
    fn finished_course_with_heavy_hints_scores_low() {
        let (score, features) =
            score_candidate(100.0, 5.0, 0.3, 1.0, &Weights::default()).unwrap();
        assert!((score - 0.01).abs() < 1e-12, "score was {score}");
        assert_eq!(features.progress_inverse, 0.0);
        let confidence = to_confidence(score);
        assert!((confidence - 0.5025).abs() < 1e-3, "confidence was {confidence}");
    }

    #[test]
    fn confidence_is_monotone_and_centered() {
        assert_eq!(to_confidence(0.0), 0.5);
        let samples = [-10.0, -1.0, -0.1, 0.0, 0.1, 1.0, 10.0];
        for pair in samples.windows(2) {
            assert!(to_confidence(pair[0]) < to_confidence(pair[1]));
        }
        for s in samples {
            let c = to_confidence(s);
            assert!((0.0..=1.0).contains(&c));
        }
    }

    #[test]
    fn progress_is_clamped_before_inversion() {
        let w = Weights::default();
        let (_, f) = score_candidate(-5.0, 0.0, 0.0, 0.0, &w).unwrap();
        assert_eq!(f.progress_inverse, 100.0);
        let (_, f) = score_candidate(250.0, 0.0, 0.0, 0.0, &w).unwrap();
        assert_eq!(f.progress_inverse, 0.0);
    }

    #[test]
    fn non_finite_inputs_are_rejected() {
        let w = Weights::default();
        assert!(matches!(
            score_candidate(f64::NAN, 0.0, 0.0, 0.0, &w),
            Err(ScoreError::InvalidFeatureValue { feature: "progress", .. })
        ));
        assert!(matches!(
            score_candidate(0.0, f64::INFINITY, 0.0, 0.0, &w),
            Err(ScoreError::InvalidFeatureValue { feature: "recency_gap_days", .. })
        ));
    }

    #[test]
    fn ranking_orders_by_score_and_fills_alternatives() {
        let rec = recommend(vec![
            candidate("a", 0.81),
            candidate("b", 0.01),
            candidate("c", 0.5),
        ])
        .unwrap();
        assert_eq!(rec.recommendation.id, "a");
        let alt_ids: Vec<&str> = rec.alternatives.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(alt_ids, vec!["c", "b"]);
    }

    #[test]
    fn equal_scores_preserve_input_order() {
        let ranked = rank(vec![
            candidate("first", 0.4),
            candidate("second", 0.4),
            candidate("third", 0.4),
        ]);
        let ids: Vec<&str> = ranked.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn single_candidate_has_no_alternatives() {
        let rec = recommend(vec![candidate("only", 0.2)]).unwrap();
        assert_eq!(rec.recommendation.id, "only");
        assert!(rec.alternatives.is_empty());
    }

    #[test]
    fn zero_candidates_yield_no_recommendation() {
        assert!(recommend(Vec::new()).is_none());
    }
}
