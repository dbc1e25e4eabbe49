use crate::types::TempoEvent;

/// Tempo assumed when the notation carries no tempo automation at all.
pub const FALLBACK_BPM: f64 = 120.0;

/// Convert a tick position to absolute milliseconds by walking the tempo
/// segments strictly before `tick` and adding the remainder under the last
/// applicable tempo.
///
/// `tempo_changes` is sorted ascending by tick with tick 0 present (or
/// empty, which falls back to 120 BPM). All BPM values must be positive;
/// a zero or negative BPM is a caller bug, not a runtime condition.
pub fn tick_to_ms(tick: u32, tempo_changes: &[TempoEvent], ppq: u32) -> f64 {
    debug_assert!(ppq > 0, "ppq must be positive");

    let mut elapsed_ms = 0.0;
    let mut segment_tick = 0u32;
    let mut segment_bpm = tempo_changes
        .first()
        .map(|t| t.bpm)
        .unwrap_or(FALLBACK_BPM);
    debug_assert!(segment_bpm > 0.0, "bpm must be positive");

    for change in tempo_changes.iter().skip(1) {
        if change.tick >= tick {
            break;
        }
        debug_assert!(change.bpm > 0.0, "bpm must be positive");
        elapsed_ms += ticks_to_ms(change.tick - segment_tick, segment_bpm, ppq);
        segment_tick = change.tick;
        segment_bpm = change.bpm;
    }

    elapsed_ms + ticks_to_ms(tick.saturating_sub(segment_tick), segment_bpm, ppq)
}

#[inline]
fn ticks_to_ms(ticks: u32, bpm: f64, ppq: u32) -> f64 {
    ticks as f64 * 60_000.0 / (bpm * ppq as f64)
}
