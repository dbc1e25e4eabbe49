//! Chord extraction, independent of the lyric alignment path.

pub mod extract;
pub mod templates;
pub mod tracks;

use crate::config::ChordConfig;
use crate::score::Score;
use crate::types::{ChordEvent, TrackAnalysis};

/// Events extracted from one selected track.
#[derive(Debug, Clone, PartialEq)]
pub struct ChordExtraction {
    pub track: TrackAnalysis,
    pub events: Vec<ChordEvent>,
}

/// Pick the most suitable track and extract chord events from it: explicit
/// markers when the track has any, pitch-class inference otherwise. `None`
/// when no track is a usable chord source (a non-fatal outcome; the song
/// simply ships without chords).
pub fn extract_chords(score: &Score, config: &ChordConfig) -> Option<ChordExtraction> {
    let (track, analysis) = tracks::select_track(score, config)?;
    let events = if analysis.explicit_chord_count > 0 {
        extract::extract_explicit(track, &score.tempo_changes, score.ppq)
    } else {
        extract::infer_chords(track, &score.tempo_changes, score.ppq, config)
    };
    tracing::debug!(
        track = analysis.track_name.as_str(),
        explicit = analysis.explicit_chord_count > 0,
        events = events.len(),
        "chords: extraction complete"
    );
    Some(ChordExtraction {
        track: analysis,
        events,
    })
}
