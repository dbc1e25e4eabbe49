use crate::config::{AlignConfig, ChordConfig};
use crate::pipeline::defaults::{HyphenSyllableJoiner, SequentialLineMatcher};
use crate::pipeline::runtime::{LyricEnhancer, LyricEnhancerParts};
use crate::pipeline::traits::{LineMatcher, SyllableJoiner};

pub struct LyricEnhancerBuilder {
    config: AlignConfig,
    chord_config: ChordConfig,
    joiner: Option<Box<dyn SyllableJoiner>>,
    matcher: Option<Box<dyn LineMatcher>>,
}

impl LyricEnhancerBuilder {
    pub fn new() -> Self {
        Self {
            config: AlignConfig::default(),
            chord_config: ChordConfig::default(),
            joiner: None,
            matcher: None,
        }
    }

    pub fn with_config(mut self, config: AlignConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_chord_config(mut self, chord_config: ChordConfig) -> Self {
        self.chord_config = chord_config;
        self
    }

    pub fn with_joiner(mut self, joiner: Box<dyn SyllableJoiner>) -> Self {
        self.joiner = Some(joiner);
        self
    }

    pub fn with_matcher(mut self, matcher: Box<dyn LineMatcher>) -> Self {
        self.matcher = Some(matcher);
        self
    }

    pub fn build(self) -> LyricEnhancer {
        LyricEnhancer::from_parts(LyricEnhancerParts {
            config: self.config,
            chord_config: self.chord_config,
            joiner: self.joiner.unwrap_or_else(|| Box::new(HyphenSyllableJoiner)),
            matcher: self
                .matcher
                .unwrap_or_else(|| Box::new(SequentialLineMatcher)),
        })
    }
}

impl Default for LyricEnhancerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
