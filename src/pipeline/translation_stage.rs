/*!
 * Segment-by-segment translation with per-segment fallback.
 *
 * Each segment gets exactly one translation attempt, preceded by a fixed
 * pacing delay. A failed segment keeps its original text, so the stage as a
 * whole always produces output.
 */

use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::pipeline::splitter::{SEGMENT_DELIMITER, split_for_translation};
use crate::providers::Translator;

/// Result of translating one segment
#[derive(Debug)]
pub enum SegmentOutcome {
    /// The translator returned a translation
    Translated { ordinal: usize, text: String },
    /// The translator failed; the original text stands in
    Fallback {
        ordinal: usize,
        original: String,
        error: ProviderError,
    },
}

impl SegmentOutcome {
    pub fn ordinal(&self) -> usize {
        match self {
            Self::Translated { ordinal, .. } | Self::Fallback { ordinal, .. } => *ordinal,
        }
    }

    /// Text that goes into the reassembled translation
    pub fn text(&self) -> &str {
        match self {
            Self::Translated { text, .. } => text,
            Self::Fallback { original, .. } => original,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Outcomes of a translation stage run, in segment order
#[derive(Debug, Default)]
pub struct TranslationReport {
    outcomes: Vec<SegmentOutcome>,
}

impl TranslationReport {
    pub fn new(outcomes: Vec<SegmentOutcome>) -> Self {
        Self { outcomes }
    }

    /// The translated transcript, segments rejoined with `". "`
    pub fn text(&self) -> String {
        self.outcomes
            .iter()
            .map(SegmentOutcome::text)
            .collect::<Vec<_>>()
            .join(SEGMENT_DELIMITER)
    }

    pub fn outcomes(&self) -> &[SegmentOutcome] {
        &self.outcomes
    }

    /// Ordinals of segments that fell back to their original text
    pub fn degraded_ordinals(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.is_fallback())
            .map(SegmentOutcome::ordinal)
            .collect()
    }

    pub fn is_degraded(&self) -> bool {
        self.outcomes.iter().any(SegmentOutcome::is_fallback)
    }
}

/// Drives transcript segments through a [`Translator`]
#[derive(Debug, Clone)]
pub struct TranslationStage {
    translator: Arc<dyn Translator>,
    /// Pause before every attempt
    delay: Duration,
}

impl TranslationStage {
    pub fn new(translator: Arc<dyn Translator>, delay: Duration) -> Self {
        Self { translator, delay }
    }

    pub async fn translate(&self, text: &str, target_language: &str) -> TranslationReport {
        self.translate_with_progress(text, target_language, |_, _| {}).await
    }

    /// Translate `text`, calling `on_segment(outcome, total)` after every segment
    pub async fn translate_with_progress<F>(&self, text: &str, target_language: &str, on_segment: F) -> TranslationReport
    where
        F: Fn(&SegmentOutcome, usize) + Send + Sync,
    {
        let segments = split_for_translation(text);
        let total = segments.len();
        debug!("Translating {} segment(s) into {}", total, target_language);

        let mut outcomes = Vec::with_capacity(total);
        for segment in segments {
            tokio::time::sleep(self.delay).await;

            let outcome = match self.translator.translate_segment(segment.text, target_language).await {
                Ok(text) => SegmentOutcome::Translated {
                    ordinal: segment.ordinal,
                    text,
                },
                Err(error) => {
                    warn!(
                        "Translation of segment {} failed, keeping original text: {}",
                        segment.ordinal, error
                    );
                    SegmentOutcome::Fallback {
                        ordinal: segment.ordinal,
                        original: segment.text.to_string(),
                        error,
                    }
                }
            };

            on_segment(&outcome, total);
            outcomes.push(outcome);
        }

        TranslationReport::new(outcomes)
    }
}
