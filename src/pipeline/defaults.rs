use crate::alignment::matcher::align_words;
use crate::alignment::syllables::join_syllables;
use crate::config::AlignConfig;
use crate::pipeline::traits::{LineMatcher, SyllableJoiner};
use crate::types::{AlignmentOutcome, LrcLine, Syllable, TempoEvent, WordTiming};

pub struct HyphenSyllableJoiner;

impl SyllableJoiner for HyphenSyllableJoiner {
    fn join(
        &self,
        syllables: &[Syllable],
        tempo_changes: &[TempoEvent],
        ppq: u32,
    ) -> Vec<WordTiming> {
        join_syllables(syllables, tempo_changes, ppq)
    }
}

pub struct SequentialLineMatcher;

impl LineMatcher for SequentialLineMatcher {
    fn align(
        &self,
        lines: &[LrcLine],
        timing: &[WordTiming],
        config: &AlignConfig,
    ) -> AlignmentOutcome {
        align_words(lines, timing, config)
    }
}
