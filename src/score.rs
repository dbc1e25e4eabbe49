//! Data model at the notation-parser boundary.
//!
//! The byte-level notation parser is an external capability; it hands this
//! crate a fully-materialized [`Score`] and nothing else. Everything here is
//! read-only input to the alignment and chord engines.

use crate::error::AlignError;
use crate::types::{Syllable, TempoEvent};

/// A parsed notation score: ordered tracks plus the tempo automation list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Score {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub tracks: Vec<Track>,
    /// Sorted ascending by tick; tick 0 present after [`Score::validate`].
    pub tempo_changes: Vec<TempoEvent>,
    /// Pulses per quarter note of the tick timeline.
    pub ppq: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Track {
    pub name: String,
    pub is_percussion: bool,
    pub bars: Vec<Bar>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bar {
    pub voices: Vec<Voice>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Voice {
    pub beats: Vec<Beat>,
}

/// One beat: an absolute tick position, an optional lyric fragment, an
/// optional named chord marker, and the notes sounding at this onset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Beat {
    pub tick: u32,
    pub duration_ticks: u32,
    pub syllable: Option<String>,
    pub chord_name: Option<String>,
    pub notes: Vec<Note>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    /// MIDI pitch number.
    pub pitch: u8,
    pub duration_ticks: u32,
}

impl Track {
    /// All beats of the track flattened across bars and voices, sorted by
    /// tick. Tick order is the timeline order every consumer assumes.
    pub fn beats_in_order(&self) -> Vec<&Beat> {
        let mut beats: Vec<&Beat> = self
            .bars
            .iter()
            .flat_map(|bar| bar.voices.iter())
            .flat_map(|voice| voice.beats.iter())
            .collect();
        beats.sort_by_key(|b| b.tick);
        beats
    }

    /// First tick of each bar (minimum beat tick), used as measure-window
    /// boundaries by chord inference. Bars without beats are skipped.
    pub fn bar_start_ticks(&self) -> Vec<u32> {
        self.bars
            .iter()
            .filter_map(|bar| {
                bar.voices
                    .iter()
                    .flat_map(|voice| voice.beats.iter())
                    .map(|b| b.tick)
                    .min()
            })
            .collect()
    }

    /// Tick just past the last sounding beat, or 0 for a silent track.
    pub fn end_tick(&self) -> u32 {
        self.bars
            .iter()
            .flat_map(|bar| bar.voices.iter())
            .flat_map(|voice| voice.beats.iter())
            .map(|b| b.tick + b.duration_ticks)
            .max()
            .unwrap_or(0)
    }

    pub fn has_syllables(&self) -> bool {
        self.bars
            .iter()
            .flat_map(|bar| bar.voices.iter())
            .flat_map(|voice| voice.beats.iter())
            .any(|b| b.syllable.is_some())
    }

    pub fn explicit_chord_count(&self) -> usize {
        self.bars
            .iter()
            .flat_map(|bar| bar.voices.iter())
            .flat_map(|voice| voice.beats.iter())
            .filter(|b| b.chord_name.is_some())
            .count()
    }
}

impl Score {
    /// The raw syllable stream: every lyric-bearing beat of the first track
    /// that carries syllables, in tick order. Notation files put lyrics on
    /// one vocal track; the rest are instrumental.
    pub fn syllables(&self) -> Vec<Syllable> {
        let Some(track) = self.tracks.iter().find(|t| t.has_syllables()) else {
            return Vec::new();
        };
        track
            .beats_in_order()
            .into_iter()
            .filter_map(|beat| {
                beat.syllable.as_ref().map(|text| Syllable {
                    tick: beat.tick,
                    text: text.clone(),
                })
            })
            .collect()
    }

    /// Boundary guard for host parsers: a score that fails here is a parser
    /// bug, not something the alignment engines will paper over.
    pub fn validate(&self) -> Result<(), AlignError> {
        if self.ppq == 0 {
            return Err(AlignError::invalid_input("score ppq must be positive"));
        }
        for pair in self.tempo_changes.windows(2) {
            if pair[1].tick < pair[0].tick {
                return Err(AlignError::invalid_input(format!(
                    "tempo map not sorted: tick {} after tick {}",
                    pair[1].tick, pair[0].tick
                )));
            }
        }
        if let Some(bad) = self.tempo_changes.iter().find(|t| t.bpm <= 0.0) {
            return Err(AlignError::invalid_input(format!(
                "non-positive bpm {} at tick {}",
                bad.bpm, bad.tick
            )));
        }
        if let Some(first) = self.tempo_changes.first() {
            if first.tick != 0 {
                return Err(AlignError::invalid_input(
                    "tempo map must start at tick 0",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beat(tick: u32, syllable: Option<&str>) -> Beat {
        Beat {
            tick,
            duration_ticks: 480,
            syllable: syllable.map(str::to_string),
            chord_name: None,
            notes: vec![],
        }
    }

    fn single_voice_track(beats: Vec<Beat>) -> Track {
        Track {
            name: "Vocals".to_string(),
            is_percussion: false,
            bars: vec![Bar {
                voices: vec![Voice { beats }],
            }],
        }
    }

    #[test]
    fn syllables_come_from_first_lyric_track_in_tick_order() {
        let instrumental = single_voice_track(vec![beat(0, None), beat(480, None)]);
        let vocal = single_voice_track(vec![
            beat(960, Some("world")),
            beat(0, Some("hello")),
        ]);
        let score = Score {
            tracks: vec![instrumental, vocal],
            tempo_changes: vec![TempoEvent { tick: 0, bpm: 120.0 }],
            ppq: 960,
            ..Score::default()
        };
        let syllables = score.syllables();
        assert_eq!(syllables.len(), 2);
        assert_eq!(syllables[0].text, "hello");
        assert_eq!(syllables[0].tick, 0);
        assert_eq!(syllables[1].text, "world");
    }

    #[test]
    fn validate_rejects_unsorted_tempo_map() {
        let score = Score {
            tempo_changes: vec![
                TempoEvent { tick: 0, bpm: 120.0 },
                TempoEvent { tick: 960, bpm: 140.0 },
                TempoEvent { tick: 480, bpm: 100.0 },
            ],
            ppq: 960,
            ..Score::default()
        };
        assert!(score.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_positive_bpm() {
        let score = Score {
            tempo_changes: vec![TempoEvent { tick: 0, bpm: 0.0 }],
            ppq: 960,
            ..Score::default()
        };
        assert!(score.validate().is_err());
    }

    #[test]
    fn validate_accepts_empty_tempo_map() {
        let score = Score {
            ppq: 960,
            ..Score::default()
        };
        assert!(score.validate().is_ok());
    }

    #[test]
    fn end_tick_covers_last_beat() {
        let track = single_voice_track(vec![beat(0, None), beat(960, None)]);
        assert_eq!(track.end_tick(), 1440);
    }
}
