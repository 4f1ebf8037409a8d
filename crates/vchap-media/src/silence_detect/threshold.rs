//! Adaptive silence threshold estimation.
//!
//! Picks a reference duration from the distribution of detected silences and
//! scales it down by the adaptive ratio. Long outlier pauses (intermissions,
//! dead air at the end of a recording) are fenced off with the usual
//! `1.5 * IQR` rule so they do not drag the threshold up.

use serde::{Deserialize, Serialize};
use vchap_models::SilenceSegment;

/// Below this many segments quartiles are meaningless.
const MIN_SEGMENTS_FOR_QUARTILES: usize = 4;

/// Tukey fence multiplier.
const IQR_FENCE: f64 = 1.5;

/// Inputs of the estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdParams {
    /// Floor of the result, seconds
    pub min_silence: f64,
    /// Multiplier on the reference duration, clamped to [0, 1]
    pub adaptive_ratio: f64,
}

/// How the reference duration was chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ReferenceMethod {
    /// No segments, the floor is returned as is
    Floor,
    /// Too few segments for quartiles, median by index
    Median { count: usize },
    /// Largest duration inside the IQR fences
    InlierMax {
        count: usize,
        q1: f64,
        q3: f64,
        iqr: f64,
        lower: f64,
        upper: f64,
        outliers: usize,
    },
    /// Every duration fell outside the fences, median by index
    MedianFallback { count: usize },
}

/// Result of [`estimate_threshold`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdEstimate {
    /// Minimum silence duration that counts as a chapter break
    pub threshold: f64,
    /// Reference duration before scaling, `None` when no segments
    pub reference: Option<f64>,
    /// Ratio actually applied after clamping
    pub ratio: f64,
    pub method: ReferenceMethod,
}

/// Estimate the chapter-break threshold from detected silences.
///
/// The result is never below `params.min_silence`.
pub fn estimate_threshold(segments: &[SilenceSegment], params: &ThresholdParams) -> ThresholdEstimate {
    let ratio = params.adaptive_ratio.clamp(0.0, 1.0);

    if segments.is_empty() {
        return ThresholdEstimate {
            threshold: params.min_silence,
            reference: None,
            ratio,
            method: ReferenceMethod::Floor,
        };
    }

    let mut durations: Vec<f64> = segments.iter().map(|s| s.duration).collect();
    durations.sort_by(f64::total_cmp);

    let (reference, method) = reference_duration(&durations);

    ThresholdEstimate {
        threshold: params.min_silence.max(reference * ratio),
        reference: Some(reference),
        ratio,
        method,
    }
}

/// Pick the reference from sorted, non-empty durations.
fn reference_duration(sorted: &[f64]) -> (f64, ReferenceMethod) {
    let n = sorted.len();
    let median = sorted[n / 2];

    if n < MIN_SEGMENTS_FOR_QUARTILES {
        return (median, ReferenceMethod::Median { count: n });
    }

    let q1 = sorted[n / 4];
    let q3 = sorted[3 * n / 4];
    let iqr = q3 - q1;
    let lower = q1 - IQR_FENCE * iqr;
    let upper = q3 + IQR_FENCE * iqr;

    let inliers = sorted.iter().filter(|&&d| d >= lower && d <= upper);
    let Some(max_inlier) = inliers.clone().copied().reduce(f64::max) else {
        return (median, ReferenceMethod::MedianFallback { count: n });
    };

    (
        max_inlier,
        ReferenceMethod::InlierMax {
            count: n,
            q1,
            q3,
            iqr,
            lower,
            upper,
            outliers: n - inliers.count(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(durations: &[f64]) -> Vec<SilenceSegment> {
        durations
            .iter()
            .enumerate()
            .map(|(i, &d)| {
                let end = (i as f64 + 1.0) * 100.0;
                SilenceSegment::from_end(end, d)
            })
            .collect()
    }

    fn params(min_silence: f64, adaptive_ratio: f64) -> ThresholdParams {
        ThresholdParams {
            min_silence,
            adaptive_ratio,
        }
    }

    #[test]
    fn test_empty_returns_floor() {
        let estimate = estimate_threshold(&[], &params(1.0, 0.7));
        assert_eq!(estimate.threshold, 1.0);
        assert_eq!(estimate.reference, None);
        assert_eq!(estimate.method, ReferenceMethod::Floor);
    }

    #[test]
    fn test_small_set_uses_index_median() {
        // sorted [1.0, 2.0, 2.2], index 1
        let estimate = estimate_threshold(&segments(&[2.0, 2.2, 1.0]), &params(1.0, 0.7));
        assert_eq!(estimate.reference, Some(2.0));
        assert!((estimate.threshold - 1.4).abs() < 1e-9);
        assert_eq!(estimate.method, ReferenceMethod::Median { count: 3 });
    }

    #[test]
    fn test_even_small_set_is_not_averaged() {
        // sorted [1.0, 3.0], index 1
        let estimate = estimate_threshold(&segments(&[3.0, 1.0]), &params(0.5, 1.0));
        assert_eq!(estimate.reference, Some(3.0));
        assert_eq!(estimate.threshold, 3.0);
    }

    #[test]
    fn test_outlier_excluded() {
        // sorted [1, 2, 3, 4, 100]: q1 = 2, q3 = 4, fences [-1, 7]
        let estimate = estimate_threshold(&segments(&[4.0, 100.0, 1.0, 3.0, 2.0]), &params(1.0, 0.5));
        assert_eq!(estimate.reference, Some(4.0));
        assert!((estimate.threshold - 2.0).abs() < 1e-9);

        match estimate.method {
            ReferenceMethod::InlierMax {
                count,
                q1,
                q3,
                iqr,
                lower,
                upper,
                outliers,
            } => {
                assert_eq!(count, 5);
                assert_eq!(q1, 2.0);
                assert_eq!(q3, 4.0);
                assert_eq!(iqr, 2.0);
                assert_eq!(lower, -1.0);
                assert_eq!(upper, 7.0);
                assert_eq!(outliers, 1);
            }
            other => panic!("unexpected method {:?}", other),
        }
    }

    #[test]
    fn test_quartile_indices_are_not_interpolated() {
        // n = 4: q1 = sorted[1], q3 = sorted[3]
        let estimate = estimate_threshold(&segments(&[1.0, 2.0, 3.0, 4.0]), &params(0.0, 1.0));
        match estimate.method {
            ReferenceMethod::InlierMax { q1, q3, outliers, .. } => {
                assert_eq!(q1, 2.0);
                assert_eq!(q3, 4.0);
                assert_eq!(outliers, 0);
            }
            other => panic!("unexpected method {:?}", other),
        }
        assert_eq!(estimate.reference, Some(4.0));
    }

    #[test]
    fn test_fence_is_inclusive() {
        // sorted [2, 2, 4, 4, 7]: q1 = 2, q3 = 4, upper fence = 7 exactly
        let estimate = estimate_threshold(&segments(&[2.0, 2.0, 4.0, 4.0, 7.0]), &params(0.0, 1.0));
        assert_eq!(estimate.reference, Some(7.0));
    }

    #[test]
    fn test_identical_durations() {
        let estimate = estimate_threshold(&segments(&[3.0; 6]), &params(1.0, 0.5));
        assert_eq!(estimate.reference, Some(3.0));
        assert!((estimate.threshold - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_floor_wins_over_small_reference() {
        let estimate = estimate_threshold(&segments(&[0.5, 0.6, 0.7]), &params(1.0, 0.7));
        assert_eq!(estimate.threshold, 1.0);
        assert!(estimate.reference.is_some());
    }

    #[test]
    fn test_ratio_is_clamped() {
        let segs = segments(&[2.0, 2.0, 2.0]);

        let high = estimate_threshold(&segs, &params(0.0, 5.0));
        assert_eq!(high.ratio, 1.0);
        assert_eq!(high.threshold, 2.0);

        let low = estimate_threshold(&segs, &params(0.25, -1.0));
        assert_eq!(low.ratio, 0.0);
        assert_eq!(low.threshold, 0.25);
    }

    #[test]
    fn test_threshold_never_below_floor() {
        let sets: [&[f64]; 4] = [&[0.1], &[0.2, 0.3, 5.0, 0.4], &[10.0, 20.0], &[1.0, 1.0, 1.0, 1.0, 50.0]];
        for durations in sets {
            for ratio in [0.0, 0.3, 0.7, 1.0] {
                for floor in [0.0, 1.0, 4.0] {
                    let estimate = estimate_threshold(&segments(durations), &params(floor, ratio));
                    assert!(estimate.threshold >= floor, "{durations:?} ratio={ratio} floor={floor}");
                }
            }
        }
    }

    #[test]
    fn test_threshold_monotonic_in_ratio() {
        let segs = segments(&[1.5, 2.5, 3.0, 4.0, 8.0, 2.0]);
        let mut previous = f64::NEG_INFINITY;
        for step in 0..=20 {
            let ratio = step as f64 / 20.0;
            let threshold = estimate_threshold(&segs, &params(1.0, ratio)).threshold;
            assert!(threshold >= previous, "ratio {ratio}");
            previous = threshold;
        }
    }
}
