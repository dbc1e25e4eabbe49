use crate::config::AlignConfig;
use crate::error::AlignError;
use crate::score::Score;
use crate::types::{AlignmentOutcome, LrcLine, Syllable, TempoEvent, WordTiming};

/// External notation parser boundary: whatever reads the notation bytes
/// hands the core a fully-materialized score through this trait.
pub trait ScoreSource: Send + Sync {
    fn load(&self) -> Result<Score, AlignError>;
}

pub trait SyllableJoiner: Send + Sync {
    fn join(
        &self,
        syllables: &[Syllable],
        tempo_changes: &[TempoEvent],
        ppq: u32,
    ) -> Vec<WordTiming>;
}

pub trait LineMatcher: Send + Sync {
    fn align(
        &self,
        lines: &[LrcLine],
        timing: &[WordTiming],
        config: &AlignConfig,
    ) -> AlignmentOutcome;
}
