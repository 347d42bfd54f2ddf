// Review aggregation: folds per-frame and per-subtitle signals into the
// shapes the status determiner consumes. Everything here is transient:
// computed per moderation run, handed to the calling workflow, never
// persisted by this crate.

pub mod conclusion;
pub mod status;

use serde::{Deserialize, Serialize};

use crate::client::AnalysisResult;

/// Rolled-up view of one video's frame review.
///
/// Ratios are percentages in [0,100]. Ratios rather than absolute counts
/// keep the verdict comparable between a 30-frame short and a 600-frame
/// upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameReviewAggregate {
    pub violation_count: usize,
    pub suspicious_count: usize,
    pub total_frames: usize,
    pub violation_ratio: f64,
    pub suspicious_ratio: f64,
    pub avg_score: f64,
}

impl FrameReviewAggregate {
    /// Build the aggregate from raw counts and a frame-weighted score sum.
    ///
    /// Zero reviewed frames means no evidence either way: ratios 0 and a
    /// clean score, so a degraded run can never reject on an empty basis.
    pub fn from_counts(
        violation_count: usize,
        suspicious_count: usize,
        total_frames: usize,
        score_sum: f64,
    ) -> Self {
        let (violation_ratio, suspicious_ratio, avg_score) = if total_frames == 0 {
            (0.0, 0.0, 100.0)
        } else {
            (
                violation_count as f64 / total_frames as f64 * 100.0,
                suspicious_count as f64 / total_frames as f64 * 100.0,
                score_sum / total_frames as f64,
            )
        };
        Self {
            violation_count,
            suspicious_count,
            total_frames,
            violation_ratio,
            suspicious_ratio,
            avg_score,
        }
    }
}

/// Outcome of running the subtitle-derived text through text moderation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleReviewResult {
    pub is_violation: bool,
    pub is_suspicious: bool,
    pub score: f64,
}

impl SubtitleReviewResult {
    /// Map a text analysis onto the subtitle result shape.
    ///
    /// `suspicious_gate` is the same score gate the weighted verdict uses,
    /// so "suspicious subtitle" and "score worth a human look" agree.
    pub fn from_analysis(result: &AnalysisResult, suspicious_gate: f64) -> Self {
        let is_violation = result.is_inappropriate;
        Self {
            is_violation,
            is_suspicious: !is_violation && result.score < suspicious_gate,
            score: result.score,
        }
    }
}
