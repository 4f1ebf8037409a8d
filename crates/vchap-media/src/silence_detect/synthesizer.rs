//! Chapter mark synthesis from qualifying silences.

use vchap_models::{ChapterMark, SilenceSegment};

/// Placement and naming parameters for [`synthesize_chapters`].
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisParams {
    /// Fraction of a silence pulled back from its end
    pub safety_ratio: f64,
    /// Seconds at the start of the video without chapter marks
    pub skip_head: f64,
    /// Seconds at the end of the video without chapter marks
    pub skip_tail: f64,
    /// Minimum distance between consecutive marks
    pub min_gap: f64,
    /// Title prefix, titles are `"{prefix} {index}"`
    pub prefix: String,
    /// Index of the first mark
    pub start_index: u32,
}

impl Default for SynthesisParams {
    fn default() -> Self {
        Self {
            safety_ratio: 0.10,
            skip_head: 2.0,
            skip_tail: 2.0,
            min_gap: 5.0,
            prefix: "Chapter".to_string(),
            start_index: 1,
        }
    }
}

/// Turn silences into chapter marks.
///
/// A cut is placed inside each silence at least `threshold` long, slightly
/// before its end so the new chapter starts just ahead of speech. The first
/// mark is always at `0.0`; the result is never empty.
pub fn synthesize_chapters(
    segments: &[SilenceSegment],
    threshold: f64,
    duration: f64,
    params: &SynthesisParams,
) -> Vec<ChapterMark> {
    let window_end = duration - params.skip_tail;

    let mut candidates: Vec<f64> = segments
        .iter()
        .filter(|s| s.duration >= threshold)
        .map(|s| s.end - params.safety_ratio * s.duration)
        .filter(|&t| t >= params.skip_head && t <= window_end)
        .collect();
    candidates.sort_by(f64::total_cmp);

    let mut times = vec![0.0];
    let mut last = 0.0;
    for time in candidates {
        if time - last >= params.min_gap {
            times.push(time);
            last = time;
        }
    }

    // Inclusive range ends at u32::MAX instead of overflowing
    times
        .into_iter()
        .zip(params.start_index..=u32::MAX)
        .map(|(time, index)| ChapterMark::numbered(time, &params.prefix, index))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn times(marks: &[ChapterMark]) -> Vec<f64> {
        marks.iter().map(|m| m.time).collect()
    }

    #[test]
    fn test_empty_segments_single_mark() {
        let params = SynthesisParams {
            prefix: "Part".to_string(),
            start_index: 3,
            ..Default::default()
        };
        let marks = synthesize_chapters(&[], 1.0, 600.0, &params);
        assert_eq!(marks, vec![ChapterMark::new(0.0, "Part 3", 3)]);
    }

    #[test]
    fn test_start_index_at_u32_max() {
        let params = SynthesisParams {
            start_index: u32::MAX,
            ..Default::default()
        };
        let marks = synthesize_chapters(&[], 1.0, 60.0, &params);
        assert_eq!(marks.len(), 1);
        assert_eq!(marks[0].index, u32::MAX);

        // Indices never wrap; marks past u32::MAX are dropped
        let segments = [SilenceSegment::new(10.0, 12.0, 2.0)];
        let marks = synthesize_chapters(&segments, 1.0, 60.0, &params);
        assert_eq!(marks.len(), 1);
        assert_eq!(marks[0].index, u32::MAX);
    }

    #[test]
    fn test_reference_scenario() {
        let segments = [
            SilenceSegment::new(10.0, 12.0, 2.0),
            SilenceSegment::new(20.0, 22.2, 2.2),
            SilenceSegment::new(40.0, 41.0, 1.0),
        ];
        let marks = synthesize_chapters(&segments, 1.4, 60.0, &SynthesisParams::default());

        assert_eq!(marks.len(), 3);
        assert_eq!(marks[0].time, 0.0);
        assert!((marks[1].time - 11.8).abs() < 1e-9);
        assert!((marks[2].time - 21.98).abs() < 1e-9);

        let indices: Vec<u32> = marks.iter().map(|m| m.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(marks[2].title, "Chapter 3");
    }

    #[test]
    fn test_unsorted_input() {
        let segments = [
            SilenceSegment::from_end(50.0, 2.0),
            SilenceSegment::from_end(20.0, 2.0),
            SilenceSegment::from_end(35.0, 2.0),
        ];
        let params = SynthesisParams {
            safety_ratio: 0.0,
            ..Default::default()
        };
        let marks = synthesize_chapters(&segments, 1.0, 100.0, &params);
        assert_eq!(times(&marks), vec![0.0, 20.0, 35.0, 50.0]);
    }

    #[test]
    fn test_min_gap_enforced() {
        let segments = [
            SilenceSegment::from_end(3.0, 1.0),
            SilenceSegment::from_end(10.0, 1.0),
            SilenceSegment::from_end(12.0, 1.0),
            SilenceSegment::from_end(15.0, 1.0),
            SilenceSegment::from_end(40.0, 1.0),
        ];
        let params = SynthesisParams {
            safety_ratio: 0.0,
            skip_head: 0.0,
            ..Default::default()
        };
        let marks = synthesize_chapters(&segments, 1.0, 100.0, &params);

        // 3.0 is closer than min_gap to the seeded 0.0 mark
        assert_eq!(times(&marks), vec![0.0, 10.0, 15.0, 40.0]);
        for pair in marks.windows(2) {
            assert!(pair[1].time - pair[0].time >= params.min_gap);
        }
    }

    #[test]
    fn test_non_positive_min_gap_accepts_all() {
        let segments = [
            SilenceSegment::from_end(10.0, 1.0),
            SilenceSegment::from_end(10.5, 1.0),
            SilenceSegment::from_end(11.0, 1.0),
        ];
        for min_gap in [0.0, -3.0] {
            let params = SynthesisParams {
                safety_ratio: 0.0,
                min_gap,
                ..Default::default()
            };
            let marks = synthesize_chapters(&segments, 1.0, 100.0, &params);
            assert_eq!(times(&marks), vec![0.0, 10.0, 10.5, 11.0]);
        }
    }

    #[test]
    fn test_boundary_window_inclusive() {
        let segments = [
            SilenceSegment::from_end(1.0, 1.0),
            SilenceSegment::from_end(2.0, 1.0),
            SilenceSegment::from_end(50.0, 1.0),
            SilenceSegment::from_end(98.0, 1.0),
            SilenceSegment::from_end(99.0, 1.0),
        ];
        let params = SynthesisParams {
            safety_ratio: 0.0,
            min_gap: 0.0,
            ..Default::default()
        };
        let marks = synthesize_chapters(&segments, 1.0, 100.0, &params);
        assert_eq!(times(&marks), vec![0.0, 2.0, 50.0, 98.0]);

        for mark in &marks[1..] {
            assert!(mark.time >= params.skip_head);
            assert!(mark.time <= 100.0 - params.skip_tail);
        }
    }

    #[test]
    fn test_short_silences_dropped() {
        let segments = [
            SilenceSegment::from_end(20.0, 0.9),
            SilenceSegment::from_end(40.0, 1.0),
        ];
        let params = SynthesisParams {
            safety_ratio: 0.0,
            ..Default::default()
        };
        let marks = synthesize_chapters(&segments, 1.0, 100.0, &params);
        assert_eq!(times(&marks), vec![0.0, 40.0]);
    }

    #[test]
    fn test_all_filtered_gives_single_mark() {
        let segments = [SilenceSegment::from_end(30.0, 0.5)];
        let marks = synthesize_chapters(&segments, 1.0, 60.0, &SynthesisParams::default());
        assert_eq!(marks.len(), 1);
        assert_eq!(marks[0].time, 0.0);
        assert_eq!(marks[0].index, 1);
    }

    #[test]
    fn test_video_shorter_than_margins() {
        let segments = [SilenceSegment::from_end(2.0, 1.0)];
        let marks = synthesize_chapters(&segments, 0.5, 3.0, &SynthesisParams::default());
        assert_eq!(times(&marks), vec![0.0]);
    }

    #[test]
    fn test_deterministic() {
        let segments = [
            SilenceSegment::from_end(30.0, 3.0),
            SilenceSegment::from_end(90.0, 2.5),
            SilenceSegment::from_end(60.0, 4.0),
        ];
        let params = SynthesisParams::default();
        let first = synthesize_chapters(&segments, 2.0, 120.0, &params);
        let second = synthesize_chapters(&segments, 2.0, 120.0, &params);
        assert_eq!(first, second);
    }
}
