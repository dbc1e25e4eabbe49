pub mod alignment;
pub mod chords;
pub mod config;
pub mod error;
pub mod lrc;
pub mod payload;
pub mod pipeline;
pub mod score;
pub mod types;

pub use config::{AlignConfig, ChordConfig};
pub use error::AlignError;
pub use lrc::{parse_lrc, LrcDocument};
pub use payload::{ChordEnhancementPayload, EnhancementPayload};
pub use pipeline::builder::LyricEnhancerBuilder;
pub use pipeline::runtime::{ChordEnhancement, Enhancement, LyricEnhancer};
pub use pipeline::traits::{LineMatcher, ScoreSource, SyllableJoiner};
pub use score::Score;
pub use types::{
    AlignmentOutcome, AlignmentStats, ChordEvent, LrcLine, Syllable, TempoEvent, TrackAnalysis,
    WordPatch, WordTiming,
};
