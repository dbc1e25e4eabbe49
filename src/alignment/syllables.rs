//! Joins notation syllable fragments into complete words.
//!
//! Notation files split sung words across beats and mark the joins with
//! hyphens: a trailing hyphen ("de-") continues into the next fragment, a
//! leading hyphen ("-tion") continues the previous word, and a bare "-"
//! beat marks the next fragment as a continuation without carrying text.

use crate::alignment::tempo::tick_to_ms;
use crate::types::{Syllable, TempoEvent, WordTiming};

/// Merge the syllable stream into whole words, each starting at the tick of
/// its first fragment (converted to milliseconds).
///
/// Rule precedence is load-bearing and mirrors what real notation files
/// rely on: the bare-hyphen marker and a leading hyphen always join; a
/// trailing-hyphen continuation is broken when the incoming fragment starts
/// uppercase ("lse-" then "Be" is two words, while "de-" "struc-" "tion"
/// is one).
pub fn join_syllables(
    syllables: &[Syllable],
    tempo_changes: &[TempoEvent],
    ppq: u32,
) -> Vec<WordTiming> {
    let mut words: Vec<(u32, String)> = Vec::new();
    let mut current = String::new();
    let mut current_tick: Option<u32> = None;
    let mut continuation_marked = false;
    let mut trailing_open = false;

    for syllable in syllables {
        let text = syllable.text.trim();
        if text.is_empty() {
            continue;
        }
        if text == "-" {
            continuation_marked = true;
            continue;
        }

        let leading = text.starts_with('-');
        let trailing = text.ends_with('-');
        let core = text.trim_start_matches('-').trim_end_matches('-');

        if current.is_empty() {
            if (leading || continuation_marked) && !words.is_empty() {
                // Continuation of a word already flushed: reopen it.
                let (tick, prefix) = words.pop().expect("non-empty");
                current = prefix;
                current_tick = Some(tick);
            }
        } else if !leading && !continuation_marked && trailing_open && starts_uppercase(core) {
            // Malformed join: an uppercase fragment after a trailing hyphen
            // is a new word, not a continuation.
            flush(&mut words, &mut current, &mut current_tick);
        }

        if current_tick.is_none() {
            current_tick = Some(syllable.tick);
        }
        current.push_str(core);
        continuation_marked = false;
        trailing_open = trailing;

        if !trailing {
            flush(&mut words, &mut current, &mut current_tick);
        }
    }

    // Notation ended mid-continuation: the partial word is still real.
    if !current.is_empty() {
        flush(&mut words, &mut current, &mut current_tick);
    }

    words
        .into_iter()
        .map(|(tick, text)| WordTiming {
            start_ms: tick_to_ms(tick, tempo_changes, ppq),
            text,
        })
        .collect()
}

fn flush(words: &mut Vec<(u32, String)>, current: &mut String, current_tick: &mut Option<u32>) {
    if current.is_empty() {
        *current_tick = None;
        return;
    }
    let tick = current_tick.take().unwrap_or(0);
    words.push((tick, std::mem::take(current)));
}

fn starts_uppercase(s: &str) -> bool {
    s.chars().next().is_some_and(char::is_uppercase)
}
