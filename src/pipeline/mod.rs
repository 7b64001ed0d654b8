/*!
 * Transcribe → translate → synthesize pipeline.
 *
 * - `splitter`: sentence segments for translation, size-capped chunks for synthesis
 * - `translation_stage`: paced per-segment translation with fallback to the original text
 * - `synthesis_stage`: per-chunk synthesis and reassembly into one audio file
 * - `janitor`: scoped deletion of run-scoped temporary files
 * - `orchestrator`: sequences the stages and owns the run's lifecycle
 */

use std::fmt;

pub mod janitor;
pub mod orchestrator;
pub mod splitter;
pub mod synthesis_stage;
pub mod translation_stage;

pub use janitor::ResourceJanitor;
pub use orchestrator::{
    AudioArtifact, AudioInput, OutputTarget, Pipeline, PipelineEvent, PipelineObserver, PipelineResult,
    TranscriptTranslation,
};
pub use splitter::{Segment, split_for_synthesis, split_for_translation};
pub use synthesis_stage::SynthesisStage;
pub use translation_stage::{SegmentOutcome, TranslationReport, TranslationStage};

/// Stages of a pipeline run.
///
/// Runs move strictly forward: `Idle → Transcribing → Translating →
/// Synthesizing → Done`, or `Translating → Done` for text-only runs.
/// `Failed` is reachable from every non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Idle,
    Transcribing,
    Translating,
    Synthesizing,
    Done,
    Failed,
}

impl PipelineStage {
    /// Whether the run has finished, successfully or not
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(self, next: PipelineStage) -> bool {
        use PipelineStage::*;
        match (self, next) {
            (from, Failed) => !from.is_terminal(),
            (Idle, Transcribing)
            | (Transcribing, Translating)
            | (Translating, Synthesizing)
            | (Translating, Done)
            | (Synthesizing, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Transcribing => "transcribing",
            Self::Translating => "translating",
            Self::Synthesizing => "synthesizing",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
