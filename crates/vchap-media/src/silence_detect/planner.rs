//! Chapter planning: threshold selection followed by synthesis.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use vchap_models::{ChapterConfig, ChapterMark, SilenceSegment};

use super::synthesizer::{synthesize_chapters, SynthesisParams};
use super::threshold::{estimate_threshold, ReferenceMethod, ThresholdEstimate, ThresholdParams};

/// Outcome of planning chapters for one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterPlan {
    /// Threshold the synthesizer used
    pub threshold: f64,
    /// Estimator details, `None` when adaptive mode was off or no silences
    pub estimate: Option<ThresholdEstimate>,
    /// Segments at least `threshold` long
    pub kept_segments: usize,
    pub chapters: Vec<ChapterMark>,
}

impl ThresholdParams {
    pub fn from_config(config: &ChapterConfig) -> Self {
        Self {
            min_silence: config.detection.min_silence,
            adaptive_ratio: config.adaptive.adaptive_ratio,
        }
    }
}

impl SynthesisParams {
    pub fn from_config(config: &ChapterConfig) -> Self {
        Self {
            safety_ratio: config.detection.safety_ratio,
            skip_head: config.detection.skip_head,
            skip_tail: config.detection.skip_tail,
            min_gap: config.detection.min_gap,
            prefix: config.chapters.prefix.clone(),
            start_index: config.chapters.start_index,
        }
    }
}

/// Plan chapter marks for a video of `duration` seconds.
pub fn plan_chapters(segments: &[SilenceSegment], duration: f64, config: &ChapterConfig) -> ChapterPlan {
    let synthesis = SynthesisParams::from_config(config);

    if segments.is_empty() {
        return ChapterPlan {
            threshold: config.detection.min_silence,
            estimate: None,
            kept_segments: 0,
            chapters: synthesize_chapters(segments, config.detection.min_silence, duration, &synthesis),
        };
    }

    let estimate = config
        .adaptive
        .enabled
        .then(|| estimate_threshold(segments, &ThresholdParams::from_config(config)));

    let threshold = match &estimate {
        Some(estimate) => {
            log_estimate(estimate);
            estimate.threshold
        }
        None => {
            debug!(threshold = config.detection.min_silence, "Adaptive threshold disabled");
            config.detection.min_silence
        }
    };

    let kept_segments = segments.iter().filter(|s| s.duration >= threshold).count();
    let chapters = synthesize_chapters(segments, threshold, duration, &synthesis);

    info!(
        threshold = threshold,
        detected = segments.len(),
        kept = kept_segments,
        chapters = chapters.len(),
        "Planned chapters"
    );

    ChapterPlan {
        threshold,
        estimate,
        kept_segments,
        chapters,
    }
}

fn log_estimate(estimate: &ThresholdEstimate) {
    match &estimate.method {
        ReferenceMethod::InlierMax {
            count,
            q1,
            q3,
            iqr,
            lower,
            upper,
            outliers,
        } => info!(
            segments = count,
            q1 = q1,
            q3 = q3,
            iqr = iqr,
            lower = lower,
            upper = upper,
            outliers = outliers,
            reference = estimate.reference,
            threshold = estimate.threshold,
            "Adaptive threshold from inlier maximum"
        ),
        ReferenceMethod::Median { count } | ReferenceMethod::MedianFallback { count } => info!(
            segments = count,
            reference = estimate.reference,
            threshold = estimate.threshold,
            "Adaptive threshold from median"
        ),
        ReferenceMethod::Floor => info!(threshold = estimate.threshold, "Adaptive threshold at floor"),
    }
}
