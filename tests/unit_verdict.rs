// Unit tests for the status determiner and conclusion generator.
//
// Exercises the decision ladder's severity ordering (ratio triggers beat
// the numeric score), the 70/30 weighted score with missing-review
// defaults, and the 1:1 mapping between verdict branches and explanation
// templates.

use palisade::review::conclusion::generate_conclusion;
use palisade::review::status::{determine_status, ReviewStatus, ReviewThresholds};
use palisade::review::{FrameReviewAggregate, SubtitleReviewResult};

fn frames(violation_ratio: f64, suspicious_ratio: f64, avg_score: f64) -> FrameReviewAggregate {
    FrameReviewAggregate {
        violation_count: (violation_ratio) as usize,
        suspicious_count: (suspicious_ratio) as usize,
        total_frames: 100,
        violation_ratio,
        suspicious_ratio,
        avg_score,
    }
}

// ============================================================
// Decision ladder: severity order beats arithmetic
// ============================================================

#[test]
fn violation_ratio_above_ten_rejects_despite_score() {
    let verdict = determine_status(
        Some(&frames(12.0, 0.0, 90.0)),
        None,
        &ReviewThresholds::default(),
    );
    assert_eq!(verdict.status, ReviewStatus::Rejected);
    assert_eq!(verdict.score, 93.0); // 90*0.7 + 100*0.3
}

#[test]
fn suspicious_ratio_above_twenty_reviews_despite_score() {
    let verdict = determine_status(
        Some(&frames(3.0, 25.0, 95.0)),
        None,
        &ReviewThresholds::default(),
    );
    assert_eq!(verdict.status, ReviewStatus::Reviewing);
}

#[test]
fn five_percent_violations_reviews() {
    let verdict = determine_status(
        Some(&frames(5.0, 0.0, 99.0)),
        None,
        &ReviewThresholds::default(),
    );
    assert_eq!(verdict.status, ReviewStatus::Reviewing);
}

#[test]
fn below_five_percent_violations_falls_through_to_score() {
    let verdict = determine_status(
        Some(&frames(4.9, 0.0, 99.0)),
        None,
        &ReviewThresholds::default(),
    );
    assert_eq!(verdict.status, ReviewStatus::Published);
}

// ============================================================
// Weighted score: 70/30 blend, clean defaults
// ============================================================

#[test]
fn score_fifty_with_no_subtitle_publishes() {
    // 50*0.7 + 100*0.3 = 65.0
    let verdict = determine_status(
        Some(&frames(0.0, 0.0, 50.0)),
        None,
        &ReviewThresholds::default(),
    );
    assert_eq!(verdict.score, 65.0);
    assert_eq!(verdict.status, ReviewStatus::Published);
}

#[test]
fn score_forty_with_no_subtitle_reviews() {
    // 40*0.7 + 100*0.3 = 58.0 < 60
    let verdict = determine_status(
        Some(&frames(0.0, 0.0, 40.0)),
        None,
        &ReviewThresholds::default(),
    );
    assert_eq!(verdict.score, 58.0);
    assert_eq!(verdict.status, ReviewStatus::Reviewing);
}

#[test]
fn weighted_score_of_exactly_sixty_publishes() {
    // frame avg such that the rounded blend lands exactly on 60.0
    let verdict = determine_status(
        Some(&frames(0.0, 0.0, 42.857142857)),
        None,
        &ReviewThresholds::default(),
    );
    assert_eq!(verdict.score, 60.0);
    assert_eq!(verdict.status, ReviewStatus::Published);
}

#[test]
fn low_subtitle_score_drags_the_blend() {
    let subtitle = SubtitleReviewResult {
        is_violation: false,
        is_suspicious: false,
        score: 20.0,
    };
    // 70*0.7 + 20*0.3 = 55.0 < 60
    let verdict = determine_status(
        Some(&frames(0.0, 0.0, 70.0)),
        Some(&subtitle),
        &ReviewThresholds::default(),
    );
    assert_eq!(verdict.score, 55.0);
    assert_eq!(verdict.status, ReviewStatus::Reviewing);
}

// ============================================================
// Subtitle flags: independent of ratios
// ============================================================

#[test]
fn subtitle_violation_rejects_on_its_own() {
    let subtitle = SubtitleReviewResult {
        is_violation: true,
        is_suspicious: false,
        score: 5.0,
    };
    let verdict = determine_status(None, Some(&subtitle), &ReviewThresholds::default());
    assert_eq!(verdict.status, ReviewStatus::Rejected);
}

#[test]
fn subtitle_suspicion_reviews_on_its_own() {
    let subtitle = SubtitleReviewResult {
        is_violation: false,
        is_suspicious: true,
        score: 50.0,
    };
    let verdict = determine_status(None, Some(&subtitle), &ReviewThresholds::default());
    assert_eq!(verdict.status, ReviewStatus::Reviewing);
}

// ============================================================
// Conclusion: explanation agrees with the verdict
// ============================================================

#[test]
fn every_status_has_a_distinct_opening() {
    let thresholds = ReviewThresholds::default();
    let cases = [
        (frames(12.0, 0.0, 90.0), "Rejected:"),
        (frames(0.0, 25.0, 95.0), "Queued for human review:"),
        (frames(0.0, 0.0, 95.0), "Published automatically:"),
    ];
    for (frame, expected_prefix) in cases {
        let verdict = determine_status(Some(&frame), None, &thresholds);
        let text = generate_conclusion(Some(&frame), None, &verdict, &thresholds);
        assert!(
            text.starts_with(expected_prefix),
            "expected {expected_prefix:?} for {:?}, got {text:?}",
            verdict.status
        );
    }
}

#[test]
fn conclusion_interpolates_driving_counts() {
    let thresholds = ReviewThresholds::default();
    let frame = FrameReviewAggregate::from_counts(7, 2, 54, 54.0 * 88.0);
    let verdict = determine_status(Some(&frame), None, &thresholds);
    let text = generate_conclusion(Some(&frame), None, &verdict, &thresholds);
    assert!(text.contains("54 frames reviewed"));
    assert!(text.contains("7 flagged as violations (13.0%)"));
}
