//! Track suitability scoring: which instrument track should feed chord
//! extraction.

use std::collections::BTreeMap;

use crate::config::ChordConfig;
use crate::score::{Score, Track};
use crate::types::TrackAnalysis;

const GUITAR_KEYWORDS: [&str; 3] = ["guitar", "gtr", "rhythm"];
const VOCAL_KEYWORDS: [&str; 4] = ["vocal", "voice", "vox", "sing"];

const GUITAR_NAME_BONUS: i32 = 2;
const VOCAL_NAME_PENALTY: i32 = -2;
const CHORDAL_BONUS: i32 = 2;
const BEAT_GRID_BONUS: i32 = 1;
const MONOPHONIC_PENALTY: i32 = -2;
const PERCUSSION_PENALTY: i32 = -5;

/// Score one track as a chord source.
///
/// Onsets are grouped by tick across voices; the group shape (simultaneous
/// note count, grid regularity, monophonic runs) drives the numeric score.
/// Explicit chord markers anywhere in the track make it eligible no matter
/// what the notes look like.
pub fn analyze_track(
    track: &Track,
    track_index: usize,
    ppq: u32,
    config: &ChordConfig,
) -> TrackAnalysis {
    debug_assert!(ppq > 0, "ppq must be positive");
    let ppq = ppq.max(1);
    let mut groups: BTreeMap<u32, usize> = BTreeMap::new();
    for beat in track.beats_in_order() {
        if beat.notes.is_empty() {
            continue;
        }
        *groups.entry(beat.tick).or_insert(0) += beat.notes.len();
    }

    let mut score = 0i32;
    if !groups.is_empty() {
        let total = groups.len() as f64;

        let chordal = groups
            .values()
            .filter(|&&n| n >= config.chordal_group_min_notes)
            .count() as f64;
        if chordal / total > config.chordal_ratio {
            score += CHORDAL_BONUS;
        }

        let on_grid = groups
            .keys()
            .filter(|&&tick| grid_distance(tick, ppq) <= config.beat_grid_tolerance_ticks)
            .count() as f64;
        if on_grid / total > config.beat_grid_ratio {
            score += BEAT_GRID_BONUS;
        }

        let counts: Vec<usize> = groups.values().copied().collect();
        let run_members = counts
            .windows(2)
            .filter(|pair| pair[0] == 1 && pair[1] == 1)
            .count() as f64;
        if run_members / total > config.monophonic_ratio {
            score += MONOPHONIC_PENALTY;
        }
    }

    if track.is_percussion {
        score += PERCUSSION_PENALTY;
    }

    let explicit_chord_count = track.explicit_chord_count();
    let eligible = explicit_chord_count > 0
        || (!track.is_percussion && score >= config.min_track_score);

    TrackAnalysis {
        track_index,
        track_name: track.name.clone(),
        score,
        explicit_chord_count,
        is_percussion: track.is_percussion,
        eligible,
    }
}

/// Pick the chord-source track. Tracks with explicit markers always beat
/// inference candidates; among them, guitar-named tracks outrank
/// vocal-named ones, then marker count decides. Without markers the best
/// eligible numeric score wins. `None` when no track is usable.
pub fn select_track<'a>(
    score: &'a Score,
    config: &ChordConfig,
) -> Option<(&'a Track, TrackAnalysis)> {
    let analyses: Vec<TrackAnalysis> = score
        .tracks
        .iter()
        .enumerate()
        .map(|(i, t)| analyze_track(t, i, score.ppq, config))
        .collect();

    let explicit_best = analyses
        .iter()
        .filter(|a| a.explicit_chord_count > 0)
        .max_by_key(|a| {
            (
                name_bias(&a.track_name),
                a.explicit_chord_count,
                std::cmp::Reverse(a.track_index),
            )
        });
    if let Some(analysis) = explicit_best {
        tracing::debug!(
            track = analysis.track_name.as_str(),
            markers = analysis.explicit_chord_count,
            "chords: selected explicit-marker track"
        );
        return Some((&score.tracks[analysis.track_index], analysis.clone()));
    }

    let inferred_best = analyses
        .iter()
        .filter(|a| a.eligible)
        .max_by_key(|a| (a.score, std::cmp::Reverse(a.track_index)));
    match inferred_best {
        Some(analysis) => {
            tracing::debug!(
                track = analysis.track_name.as_str(),
                score = analysis.score,
                "chords: selected inference track"
            );
            Some((&score.tracks[analysis.track_index], analysis.clone()))
        }
        None => {
            tracing::warn!("chords: no usable track, extraction skipped");
            None
        }
    }
}

fn grid_distance(tick: u32, ppq: u32) -> u32 {
    let rem = tick % ppq;
    rem.min(ppq - rem)
}

fn name_bias(name: &str) -> i32 {
    let lower = name.to_lowercase();
    if GUITAR_KEYWORDS.iter().any(|k| lower.contains(k)) {
        GUITAR_NAME_BONUS
    } else if VOCAL_KEYWORDS.iter().any(|k| lower.contains(k)) {
        VOCAL_NAME_PENALTY
    } else {
        0
    }
}
