// Review conclusion text: explains the verdict to uploaders and mods.
//
// Each message branch re-derives the decision ladder branch that fired, so
// the explanation can never contradict the verdict: same inputs, same
// conditions, same order.

use super::status::{FinalVerdict, ReviewStatus, ReviewThresholds};
use super::{FrameReviewAggregate, SubtitleReviewResult};

/// Render a human-readable explanation for a final verdict.
///
/// Interpolates the concrete counts and ratios that drove the decision,
/// e.g. "54 frames reviewed, 7 flagged as violations (13.0%)".
pub fn generate_conclusion(
    frame: Option<&FrameReviewAggregate>,
    subtitle: Option<&SubtitleReviewResult>,
    verdict: &FinalVerdict,
    thresholds: &ReviewThresholds,
) -> String {
    let frame_line = match frame {
        Some(f) => format!(
            "{} frames reviewed, {} flagged as violations ({:.1}%), {} suspicious ({:.1}%).",
            f.total_frames, f.violation_count, f.violation_ratio, f.suspicious_count,
            f.suspicious_ratio
        ),
        None => "No frame review was performed.".to_string(),
    };

    match verdict.status {
        ReviewStatus::Rejected => {
            let trigger = match (frame, subtitle) {
                (Some(f), _) if f.violation_ratio > thresholds.violation_reject_ratio => format!(
                    "the violation ratio exceeds {:.0}%",
                    thresholds.violation_reject_ratio
                ),
                _ => "the subtitles contain a policy violation".to_string(),
            };
            format!(
                "Rejected: {trigger}. {frame_line} Weighted score {:.1}.",
                verdict.score
            )
        }
        ReviewStatus::Reviewing => {
            let trigger = if let Some(f) = frame.filter(|f| {
                f.violation_ratio >= thresholds.violation_review_ratio
                    && f.violation_ratio <= thresholds.violation_reject_ratio
            }) {
                format!(
                    "the violation ratio ({:.1}%) falls in the manual-review band",
                    f.violation_ratio
                )
            } else if let Some(f) =
                frame.filter(|f| f.suspicious_ratio > thresholds.suspicious_review_ratio)
            {
                format!(
                    "{:.1}% of frames look suspicious (limit {:.0}%)",
                    f.suspicious_ratio, thresholds.suspicious_review_ratio
                )
            } else if subtitle.map(|s| s.is_suspicious).unwrap_or(false) {
                "the subtitles look suspicious".to_string()
            } else {
                format!(
                    "the weighted score {:.1} is below the {:.0} publish gate",
                    verdict.score, thresholds.score_review_gate
                )
            };
            format!("Queued for human review: {trigger}. {frame_line}")
        }
        ReviewStatus::Published => format!(
            "Published automatically: no violations found. {frame_line} Weighted score {:.1}.",
            verdict.score
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::status::determine_status;

    fn frames(
        violation_count: usize,
        suspicious_count: usize,
        total: usize,
        avg: f64,
    ) -> FrameReviewAggregate {
        FrameReviewAggregate::from_counts(
            violation_count,
            suspicious_count,
            total,
            avg * total as f64,
        )
    }

    fn conclude(
        frame: Option<&FrameReviewAggregate>,
        subtitle: Option<&SubtitleReviewResult>,
    ) -> (FinalVerdict, String) {
        let thresholds = ReviewThresholds::default();
        let verdict = determine_status(frame, subtitle, &thresholds);
        let text = generate_conclusion(frame, subtitle, &verdict, &thresholds);
        (verdict, text)
    }

    #[test]
    fn rejected_message_cites_ratio() {
        let f = frames(7, 0, 54, 90.0);
        let (verdict, text) = conclude(Some(&f), None);
        assert_eq!(verdict.status, ReviewStatus::Rejected);
        assert!(text.starts_with("Rejected:"));
        assert!(text.contains("54 frames reviewed"));
        assert!(text.contains("7 flagged as violations (13.0%)"));
    }

    #[test]
    fn subtitle_rejection_names_subtitles() {
        let sub = SubtitleReviewResult {
            is_violation: true,
            is_suspicious: false,
            score: 10.0,
        };
        let (verdict, text) = conclude(None, Some(&sub));
        assert_eq!(verdict.status, ReviewStatus::Rejected);
        assert!(text.contains("subtitles contain a policy violation"));
        assert!(text.contains("No frame review was performed."));
    }

    #[test]
    fn review_band_message_matches_trigger() {
        let f = frames(4, 0, 50, 92.0); // 8% violations
        let (verdict, text) = conclude(Some(&f), None);
        assert_eq!(verdict.status, ReviewStatus::Reviewing);
        assert!(text.contains("manual-review band"));
    }

    #[test]
    fn suspicious_ratio_message_matches_trigger() {
        let f = frames(0, 15, 50, 92.0); // 30% suspicious
        let (verdict, text) = conclude(Some(&f), None);
        assert_eq!(verdict.status, ReviewStatus::Reviewing);
        assert!(text.contains("look suspicious"));
        assert!(text.contains("30.0%"));
    }

    #[test]
    fn low_score_message_matches_trigger() {
        let f = frames(0, 0, 50, 40.0); // weighted 58.0
        let (verdict, text) = conclude(Some(&f), None);
        assert_eq!(verdict.status, ReviewStatus::Reviewing);
        assert!(text.contains("weighted score 58.0"));
    }

    #[test]
    fn published_message_reports_counts() {
        let f = frames(0, 0, 60, 95.0);
        let (verdict, text) = conclude(Some(&f), None);
        assert_eq!(verdict.status, ReviewStatus::Published);
        assert!(text.starts_with("Published automatically"));
        assert!(text.contains("60 frames reviewed"));
        assert!(text.contains("96.5")); // 95*0.7 + 100*0.3
    }
}
