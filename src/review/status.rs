// Final status determination: the publish/review/reject state machine.
//
// The weighted score blends the frame and subtitle signals 70/30: visual
// classification is the higher-confidence signal, so it dominates. The
// decision ladder is ordered by severity, and order beats arithmetic: a
// video with a high average score still gets rejected when enough of its
// frames are outright violations.

use serde::{Deserialize, Serialize};

use super::{FrameReviewAggregate, SubtitleReviewResult};

/// Where a review cycle leaves the content. Reviewing hands off to a human
/// queue owned by the surrounding workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReviewStatus {
    Published,
    Reviewing,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Published => "PUBLISHED",
            ReviewStatus::Reviewing => "REVIEWING",
            ReviewStatus::Rejected => "REJECTED",
        }
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The status plus the weighted score that accompanied it (one decimal).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinalVerdict {
    pub status: ReviewStatus,
    pub score: f64,
}

/// Tuned decision thresholds.
///
/// These came out of manual review of early moderation runs, not first
/// principles. Treat them as policy knobs, overridable from the
/// environment, never as invariants other code may assume.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReviewThresholds {
    /// Violation ratio (%) above which content is rejected outright
    pub violation_reject_ratio: f64,
    /// Violation ratio (%) at or above which content needs human review
    pub violation_review_ratio: f64,
    /// Suspicious ratio (%) above which content needs human review
    pub suspicious_review_ratio: f64,
    /// Weighted score below which content needs human review
    pub score_review_gate: f64,
}

impl Default for ReviewThresholds {
    fn default() -> Self {
        Self {
            violation_reject_ratio: 10.0,
            violation_review_ratio: 5.0,
            suspicious_review_ratio: 20.0,
            score_review_gate: 60.0,
        }
    }
}

/// Frame average weight in the blended score; subtitles get the rest.
const FRAME_WEIGHT: f64 = 0.7;
const SUBTITLE_WEIGHT: f64 = 0.3;

/// Blend the frame and subtitle scores, one decimal.
///
/// A missing review on either side contributes a clean 100; absence of
/// evidence is not evidence of violation.
pub fn weighted_score(
    frame: Option<&FrameReviewAggregate>,
    subtitle: Option<&SubtitleReviewResult>,
) -> f64 {
    let frame_avg = frame.map(|f| f.avg_score).unwrap_or(100.0);
    let subtitle_score = subtitle.map(|s| s.score).unwrap_or(100.0);
    round1(frame_avg * FRAME_WEIGHT + subtitle_score * SUBTITLE_WEIGHT)
}

/// Run the decision ladder. First match wins.
pub fn determine_status(
    frame: Option<&FrameReviewAggregate>,
    subtitle: Option<&SubtitleReviewResult>,
    thresholds: &ReviewThresholds,
) -> FinalVerdict {
    let score = weighted_score(frame, subtitle);
    let violation_ratio = frame.map(|f| f.violation_ratio).unwrap_or(0.0);
    let suspicious_ratio = frame.map(|f| f.suspicious_ratio).unwrap_or(0.0);
    let subtitle_violation = subtitle.map(|s| s.is_violation).unwrap_or(false);
    let subtitle_suspicious = subtitle.map(|s| s.is_suspicious).unwrap_or(false);

    let status = if violation_ratio > thresholds.violation_reject_ratio || subtitle_violation {
        ReviewStatus::Rejected
    } else if violation_ratio >= thresholds.violation_review_ratio
        || suspicious_ratio > thresholds.suspicious_review_ratio
        || subtitle_suspicious
    {
        ReviewStatus::Reviewing
    } else if score < thresholds.score_review_gate {
        ReviewStatus::Reviewing
    } else {
        ReviewStatus::Published
    };

    FinalVerdict { status, score }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
