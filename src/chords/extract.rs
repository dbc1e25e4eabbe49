//! Chord event extraction: explicit per-beat markers, or pitch-class
//! inference over fixed time windows when the notation carries none.

use crate::alignment::tempo::tick_to_ms;
use crate::chords::templates::{best_candidate, ChordCandidate, PITCH_CLASSES};
use crate::config::ChordConfig;
use crate::score::Track;
use crate::types::{ChordEvent, TempoEvent};

/// Walk the track's beats in tick order and turn marker changes into
/// events. A repeated name extends the open event; only a differing name
/// closes it. Explicit markers are authoritative: confidence is 1.0.
pub fn extract_explicit(track: &Track, tempo_changes: &[TempoEvent], ppq: u32) -> Vec<ChordEvent> {
    let mut events: Vec<ChordEvent> = Vec::new();
    let mut open: Option<(String, f64)> = None;

    for beat in track.beats_in_order() {
        let Some(name) = beat.chord_name.as_deref() else {
            continue;
        };
        if open.as_ref().is_some_and(|(prev, _)| prev == name) {
            continue;
        }
        let start_ms = tick_to_ms(beat.tick, tempo_changes, ppq);
        if let Some((prev_name, prev_start)) = open.take() {
            events.push(ChordEvent {
                start_ms: prev_start,
                duration_ms: start_ms - prev_start,
                chord: prev_name,
                confidence: 1.0,
            });
        }
        open = Some((name.to_string(), start_ms));
    }

    if let Some((name, start_ms)) = open {
        let end_ms = tick_to_ms(track.end_tick(), tempo_changes, ppq);
        events.push(ChordEvent {
            start_ms,
            duration_ms: (end_ms - start_ms).max(0.0),
            chord: name,
            confidence: 1.0,
        });
    }
    events
}

/// One inference window: a tick span plus its accumulated evidence.
#[derive(Debug, Clone)]
struct Window {
    start_tick: u32,
    histogram: [f64; PITCH_CLASSES],
    /// Lowest MIDI pitch sounding in the window.
    bass_pitch: Option<u8>,
}

/// Infer chord events from note content when no explicit markers exist.
///
/// Windows are one per measure by default (one per beat with
/// `window_per_beat`); each builds a duration-weighted pitch-class
/// histogram that is scored against the chord templates. Emission is
/// smoothed: a differing candidate must clearly beat the previous emitted
/// score and clear an absolute floor, which suppresses flicker between
/// harmonically ambiguous adjacent windows.
pub fn infer_chords(
    track: &Track,
    tempo_changes: &[TempoEvent],
    ppq: u32,
    config: &ChordConfig,
) -> Vec<ChordEvent> {
    debug_assert!(ppq > 0, "ppq must be positive");
    let ppq = ppq.max(1);
    let windows = build_windows(track, ppq, config);
    if windows.is_empty() {
        return Vec::new();
    }

    let mut events: Vec<ChordEvent> = Vec::new();
    let mut last: Option<ChordCandidate> = None;

    for window in &windows {
        let total_energy: f64 = window.histogram.iter().sum();
        let bass = window.bass_pitch.map(|p| usize::from(p) % PITCH_CLASSES);
        let Some(candidate) = best_candidate(&window.histogram, bass, config) else {
            continue;
        };

        match last {
            Some(prev) if candidate.same_chord(&prev) => {
                // Same harmony: track its current strength so the next
                // change is judged against fresh evidence.
                last = Some(candidate);
            }
            Some(prev) => {
                if candidate.score > prev.score * config.smoothing_threshold
                    && candidate.score >= config.min_chord_score
                {
                    let start_ms = tick_to_ms(window.start_tick, tempo_changes, ppq);
                    close_open_event(&mut events, start_ms);
                    events.push(ChordEvent {
                        start_ms,
                        duration_ms: 0.0,
                        chord: candidate.name(),
                        confidence: confidence(candidate.score, total_energy),
                    });
                    last = Some(candidate);
                }
            }
            None => {
                if candidate.score >= config.min_chord_score {
                    let start_ms = tick_to_ms(window.start_tick, tempo_changes, ppq);
                    events.push(ChordEvent {
                        start_ms,
                        duration_ms: 0.0,
                        chord: candidate.name(),
                        confidence: confidence(candidate.score, total_energy),
                    });
                    last = Some(candidate);
                }
            }
        }
    }

    let end_ms = tick_to_ms(track.end_tick(), tempo_changes, ppq);
    close_open_event(&mut events, end_ms);
    events
}

fn close_open_event(events: &mut [ChordEvent], at_ms: f64) {
    if let Some(open) = events.last_mut() {
        if open.duration_ms == 0.0 {
            open.duration_ms = (at_ms - open.start_ms).max(0.0);
        }
    }
}

fn confidence(score: f64, total_energy: f64) -> f64 {
    if total_energy <= 0.0 {
        return 0.0;
    }
    (score / total_energy).clamp(0.0, 1.0)
}

fn build_windows(track: &Track, ppq: u32, config: &ChordConfig) -> Vec<Window> {
    let end_tick = track.end_tick();
    if end_tick == 0 {
        return Vec::new();
    }

    let starts: Vec<u32> = if config.window_per_beat {
        let first = track.bar_start_ticks().first().copied().unwrap_or(0);
        (first..end_tick).step_by(ppq as usize).collect()
    } else {
        track.bar_start_ticks()
    };
    if starts.is_empty() {
        return Vec::new();
    }

    let mut windows: Vec<Window> = starts
        .iter()
        .map(|&start_tick| Window {
            start_tick,
            histogram: [0.0; PITCH_CLASSES],
            bass_pitch: None,
        })
        .collect();

    for beat in track.beats_in_order() {
        // Last window whose start is at or before the onset.
        let slot = match windows.iter().rposition(|w| w.start_tick <= beat.tick) {
            Some(slot) => slot,
            None => continue,
        };
        let window = &mut windows[slot];
        for note in &beat.notes {
            let weight = (f64::from(note.duration_ticks) / f64::from(ppq)).sqrt();
            window.histogram[usize::from(note.pitch) % PITCH_CLASSES] += weight;
            window.bass_pitch = Some(match window.bass_pitch {
                Some(bass) => bass.min(note.pitch),
                None => note.pitch,
            });
        }
    }
    windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::{Bar, Beat, Note, Voice};

    fn note(pitch: u8, duration_ticks: u32) -> Note {
        Note {
            pitch,
            duration_ticks,
        }
    }

    fn beat(tick: u32, notes: Vec<Note>, chord_name: Option<&str>) -> Beat {
        Beat {
            tick,
            duration_ticks: notes.iter().map(|n| n.duration_ticks).max().unwrap_or(480),
            syllable: None,
            chord_name: chord_name.map(str::to_string),
            notes,
        }
    }

    fn one_bar_track(beats: Vec<Beat>) -> Track {
        Track {
            name: "Guitar".to_string(),
            is_percussion: false,
            bars: vec![Bar {
                voices: vec![Voice { beats }],
            }],
        }
    }

    fn bars_track(bars: Vec<Vec<Beat>>) -> Track {
        Track {
            name: "Guitar".to_string(),
            is_percussion: false,
            bars: bars
                .into_iter()
                .map(|beats| Bar {
                    voices: vec![Voice { beats }],
                })
                .collect(),
        }
    }

    // C major: C3 E3 G3. A minor: A2 C3 E3.
    const C_MAJOR: [u8; 3] = [48, 52, 55];
    const A_MINOR: [u8; 3] = [45, 48, 52];

    fn triad_beats(tick: u32, pitches: &[u8]) -> Beat {
        triad_beats_for(tick, pitches, 960)
    }

    fn triad_beats_for(tick: u32, pitches: &[u8], duration_ticks: u32) -> Beat {
        beat(
            tick,
            pitches.iter().map(|&p| note(p, duration_ticks)).collect(),
            None,
        )
    }

    #[test]
    fn explicit_markers_become_events_on_change() {
        let track = one_bar_track(vec![
            beat(0, vec![], Some("C")),
            beat(960, vec![], Some("C")),
            beat(1920, vec![], Some("G")),
            beat(2880, vec![note(40, 960)], None),
        ]);
        let events = extract_explicit(&track, &[], 960);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].chord, "C");
        assert_eq!(events[0].start_ms, 0.0);
        assert_eq!(events[0].duration_ms, 1000.0);
        assert_eq!(events[1].chord, "G");
        assert_eq!(events[1].confidence, 1.0);
        // Closed at track end (3840 ticks = 2000 ms at 120 BPM).
        assert_eq!(events[1].duration_ms, 1000.0);
    }

    #[test]
    fn explicit_extraction_without_markers_is_empty() {
        let track = one_bar_track(vec![beat(0, vec![note(40, 960)], None)]);
        assert!(extract_explicit(&track, &[], 960).is_empty());
    }

    #[test]
    fn inference_emits_one_event_per_stable_harmony() {
        let track = bars_track(vec![
            vec![triad_beats(0, &C_MAJOR), triad_beats(1920, &C_MAJOR)],
            vec![triad_beats(3840, &C_MAJOR)],
        ]);
        let events = infer_chords(&track, &[], 960, &ChordConfig::default());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].chord, "C");
        assert_eq!(events[0].start_ms, 0.0);
        assert!(events[0].duration_ms > 0.0);
    }

    #[test]
    fn inference_detects_a_change_across_measures() {
        // The Am bar carries clearly more energy than the C bar, so the
        // change clears the smoothing margin.
        let track = bars_track(vec![
            vec![
                triad_beats_for(0, &C_MAJOR, 480),
                triad_beats_for(1920, &C_MAJOR, 480),
            ],
            vec![triad_beats(3840, &A_MINOR), triad_beats(5760, &A_MINOR)],
        ]);
        let events = infer_chords(&track, &[], 960, &ChordConfig::default());
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].chord, "C");
        assert_eq!(events[1].chord, "Am");
        // The first event closes where the second opens.
        assert_eq!(
            events[0].start_ms + events[0].duration_ms,
            events[1].start_ms
        );
    }

    #[test]
    fn weak_windows_do_not_emit() {
        // A single short note carries too little energy to clear the
        // absolute score floor.
        let track = bars_track(vec![vec![beat(0, vec![note(48, 60)], None)]]);
        let events = infer_chords(&track, &[], 960, &ChordConfig::default());
        assert!(events.is_empty());
    }

    #[test]
    fn flicker_between_ambiguous_windows_is_suppressed() {
        // Bar 2 leans Am but shares two pitch classes with C; its score
        // cannot beat the C score by the smoothing margin, so no event.
        let track = bars_track(vec![
            vec![
                triad_beats(0, &C_MAJOR),
                triad_beats(960, &C_MAJOR),
                triad_beats(1920, &C_MAJOR),
            ],
            vec![beat(3840, vec![note(45, 480), note(48, 480), note(52, 480)], None)],
            vec![
                triad_beats(7680, &C_MAJOR),
                triad_beats(8640, &C_MAJOR),
            ],
        ]);
        let events = infer_chords(&track, &[], 960, &ChordConfig::default());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].chord, "C");
    }

    #[test]
    fn confidence_is_normalized_and_bounded() {
        let track = bars_track(vec![vec![
            triad_beats(0, &C_MAJOR),
            triad_beats(960, &C_MAJOR),
        ]]);
        let events = infer_chords(&track, &[], 960, &ChordConfig::default());
        assert_eq!(events.len(), 1);
        assert!(events[0].confidence > 0.0);
        assert!(events[0].confidence <= 1.0);
    }

    #[test]
    fn per_beat_windows_follow_the_quarter_grid() {
        let track = bars_track(vec![vec![
            triad_beats(0, &C_MAJOR),
            triad_beats(960, &A_MINOR),
        ]]);
        let config = ChordConfig {
            window_per_beat: true,
            ..ChordConfig::default()
        };
        let events = infer_chords(&track, &[], 960, &config);
        // Two windows, but Am shares C and E with C major and cannot clear
        // the smoothing bar; per-measure would have merged everything into
        // one window anyway.
        assert!(!events.is_empty());
        assert_eq!(events[0].chord, "C");
    }
}
