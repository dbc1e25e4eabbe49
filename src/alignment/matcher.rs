//! Primary sequential word matcher.
//!
//! Walks the lyric lines word by word against the timing stream with a
//! single forward-only cursor. The cursor advances only on a successful
//! match, so a later lyric word can retry the same timing position after a
//! miss; it is threaded through the loop explicitly and never shared.

use crate::alignment::normalize::normalize_token;
use crate::config::AlignConfig;
use crate::types::{AlignmentOutcome, AlignmentStats, LrcLine, WordPatch, WordTiming};

/// A successful window probe: `start` is the timing index of the first
/// consumed entry, `len` the number of consecutive entries consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MatchSpan {
    start: usize,
    len: usize,
}

/// Align the timing stream to the lyric line/word stream.
///
/// Every lyric word counts toward `total_words`; only words that received a
/// patch count toward `matched_words`. Patch start times are monotonically
/// non-decreasing in (line, word) order because the cursor never rewinds.
pub fn align_words(
    lines: &[LrcLine],
    timing: &[WordTiming],
    config: &AlignConfig,
) -> AlignmentOutcome {
    let normalized: Vec<String> = timing.iter().map(|w| normalize_token(&w.text)).collect();

    let mut cursor = 0usize;
    let mut patches: Vec<WordPatch> = Vec::new();
    let mut total_words = 0usize;

    for (line_index, line) in lines.iter().enumerate() {
        let next_line_start = lines.get(line_index + 1).map(|l| l.start_ms);

        for (word_index, word) in line.words.iter().enumerate() {
            total_words += 1;
            let target = normalize_token(word);
            if target.is_empty() {
                continue;
            }

            let Some(span) = probe_window(&normalized, cursor, &target, config) else {
                // Miss: leave the cursor where it is so the next lyric word
                // can retry this timing position.
                continue;
            };

            let start_ms = timing[span.start].start_ms;
            let duration_ms = patch_duration(timing, span, start_ms, next_line_start, config);
            patches.push(WordPatch {
                line_index,
                word_index,
                start_ms,
                duration_ms,
                source_text: Some(consumed_text(timing, span)),
            });
            cursor = span.start + span.len;
        }
    }

    let stats = AlignmentStats::from_counts(total_words, patches.len());
    tracing::debug!(
        total_words = stats.total_words,
        matched_words = stats.matched_words,
        coverage = format!("{:.1}", stats.coverage),
        "matcher: primary pass complete"
    );
    AlignmentOutcome { patches, stats }
}

/// Search `[cursor, cursor + lookahead)` for an exact match or a join match
/// (up to `max_join_span` consecutive entries concatenated). Earlier offsets
/// win; at one offset an exact match wins over a join.
fn probe_window(
    normalized: &[String],
    cursor: usize,
    target: &str,
    config: &AlignConfig,
) -> Option<MatchSpan> {
    for offset in 0..config.lookahead_window {
        let at = cursor + offset;
        if at >= normalized.len() {
            return None;
        }
        if normalized[at] == target {
            return Some(MatchSpan { start: at, len: 1 });
        }
        if let Some(len) = probe_join(normalized, at, target, config.max_join_span) {
            return Some(MatchSpan { start: at, len });
        }
    }
    None
}

/// Join match: the notation split one sung word across consecutive timing
/// entries ("Con" + "trol"). Every joined part must be non-empty so a join
/// never swallows positions it took no text from.
fn probe_join(
    normalized: &[String],
    at: usize,
    target: &str,
    max_join_span: usize,
) -> Option<usize> {
    let mut joined = String::new();
    for len in 1..=max_join_span {
        let Some(part) = normalized.get(at + len - 1) else {
            return None;
        };
        if part.is_empty() {
            return None;
        }
        joined.push_str(part);
        if joined.len() > target.len() {
            return None;
        }
        if len > 1 && joined == target {
            return Some(len);
        }
    }
    None
}

fn patch_duration(
    timing: &[WordTiming],
    span: MatchSpan,
    start_ms: f64,
    next_line_start: Option<f64>,
    config: &AlignConfig,
) -> f64 {
    let end = span.start + span.len;
    let raw = if let Some(next) = timing.get(end) {
        (next.start_ms - start_ms).min(config.max_word_duration_ms)
    } else if let Some(line_start) = next_line_start {
        (line_start - start_ms).min(config.max_word_duration_ms)
    } else if span.len > 1 {
        // Last match in both streams: fall back to the span itself.
        (timing[end - 1].start_ms - start_ms).min(config.max_word_duration_ms)
    } else {
        config.fallback_word_duration_ms
    };
    raw.max(config.min_word_duration_ms)
}

fn consumed_text(timing: &[WordTiming], span: MatchSpan) -> String {
    timing[span.start..span.start + span.len]
        .iter()
        .map(|w| w.text.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(entries: &[(f64, &str)]) -> Vec<WordTiming> {
        entries
            .iter()
            .map(|&(start_ms, text)| WordTiming {
                start_ms,
                text: text.to_string(),
            })
            .collect()
    }

    fn lines(entries: &[(f64, &str)]) -> Vec<LrcLine> {
        entries
            .iter()
            .map(|&(start_ms, text)| LrcLine::new(start_ms, text))
            .collect()
    }

    #[test]
    fn exact_matches_are_case_insensitive() {
        let lines = lines(&[(0.0, "HELLO World")]);
        let timing = timing(&[(100.0, "hello"), (600.0, "WORLD")]);
        let outcome = align_words(&lines, &timing, &AlignConfig::default());
        assert_eq!(outcome.stats.coverage, 100.0);
        assert_eq!(outcome.patches.len(), 2);
        assert_eq!(outcome.patches[0].start_ms, 100.0);
        assert_eq!(outcome.patches[1].start_ms, 600.0);
    }

    #[test]
    fn internal_punctuation_is_significant() {
        let lines = lines(&[(0.0, "Don't")]);
        let timing = timing(&[(100.0, "Dont")]);
        let outcome = align_words(&lines, &timing, &AlignConfig::default());
        assert_eq!(outcome.stats.matched_words, 0);
        assert_eq!(outcome.stats.total_words, 1);
    }

    #[test]
    fn join_match_recovers_split_syllables() {
        let lines = lines(&[(4900.0, "Control yourself")]);
        let timing = timing(&[
            (5000.0, "Con"),
            (5200.0, "trol"),
            (5500.0, "your"),
            (5700.0, "self"),
        ]);
        let outcome = align_words(&lines, &timing, &AlignConfig::default());
        assert_eq!(outcome.stats.coverage, 100.0);
        assert_eq!(outcome.patches.len(), 2);
        assert_eq!(outcome.patches[0].start_ms, 5000.0);
        assert_eq!(outcome.patches[0].source_text.as_deref(), Some("Control"));
        assert_eq!(outcome.patches[1].start_ms, 5500.0);
    }

    #[test]
    fn cursor_stays_put_on_a_miss() {
        let lines = lines(&[(0.0, "missing hello")]);
        let timing = timing(&[(100.0, "hello")]);
        let outcome = align_words(&lines, &timing, &AlignConfig::default());
        // "missing" fails but does not consume the stream; "hello" still lands.
        assert_eq!(outcome.stats.matched_words, 1);
        assert_eq!(outcome.patches[0].word_index, 1);
    }

    #[test]
    fn lookahead_window_is_bounded() {
        let mut entries: Vec<(f64, &str)> = (0..25).map(|i| (i as f64 * 100.0, "filler")).collect();
        entries.push((2500.0, "target"));
        let timing = timing(&entries);
        let lines = lines(&[(0.0, "target")]);
        let config = AlignConfig::default();
        let outcome = align_words(&lines, &timing, &config);
        // The target sits past the 20-entry window and must not match.
        assert_eq!(outcome.stats.matched_words, 0);
    }

    #[test]
    fn empty_normalization_counts_toward_total_only() {
        let lines = lines(&[(0.0, "--- hello")]);
        let timing = timing(&[(100.0, "hello")]);
        let outcome = align_words(&lines, &timing, &AlignConfig::default());
        assert_eq!(outcome.stats.total_words, 2);
        assert_eq!(outcome.stats.matched_words, 1);
        assert_eq!(outcome.stats.coverage, 50.0);
    }

    #[test]
    fn duration_comes_from_the_next_timing_entry() {
        let lines = lines(&[(0.0, "one two")]);
        let timing = timing(&[(100.0, "one"), (400.0, "two"), (900.0, "three")]);
        let outcome = align_words(&lines, &timing, &AlignConfig::default());
        assert_eq!(outcome.patches[0].duration_ms, 300.0);
        assert_eq!(outcome.patches[1].duration_ms, 500.0);
    }

    #[test]
    fn duration_is_clamped_to_bounds() {
        let lines = lines(&[(0.0, "one two")]);
        let timing = timing(&[(100.0, "one"), (110.0, "two"), (9000.0, "x")]);
        let outcome = align_words(&lines, &timing, &AlignConfig::default());
        assert_eq!(outcome.patches[0].duration_ms, 50.0);
        assert_eq!(outcome.patches[1].duration_ms, 2000.0);
    }

    #[test]
    fn final_word_duration_falls_back_to_next_line_start() {
        let lines = lines(&[(0.0, "one"), (800.0, "two")]);
        let timing = timing(&[(100.0, "one")]);
        let outcome = align_words(&lines, &timing, &AlignConfig::default());
        assert_eq!(outcome.patches[0].duration_ms, 700.0);
    }

    #[test]
    fn patch_starts_are_monotonic() {
        let lines = lines(&[(0.0, "a b a"), (1000.0, "b a b")]);
        let timing = timing(&[
            (0.0, "a"),
            (200.0, "b"),
            (400.0, "a"),
            (1000.0, "b"),
            (1200.0, "a"),
            (1400.0, "b"),
        ]);
        let outcome = align_words(&lines, &timing, &AlignConfig::default());
        for pair in outcome.patches.windows(2) {
            assert!(pair[1].start_ms >= pair[0].start_ms);
        }
    }

    #[test]
    fn coverage_bounds_hold_for_disjoint_streams() {
        let lines = lines(&[(0.0, "alpha beta gamma")]);
        let timing = timing(&[(0.0, "delta"), (100.0, "epsilon")]);
        let outcome = align_words(&lines, &timing, &AlignConfig::default());
        assert_eq!(outcome.stats.matched_words, 0);
        assert_eq!(outcome.stats.coverage, 0.0);
        assert!(outcome.stats.matched_words <= outcome.stats.total_words);
    }

    #[test]
    fn empty_inputs_yield_empty_outcome() {
        let outcome = align_words(&[], &[], &AlignConfig::default());
        assert!(outcome.patches.is_empty());
        assert_eq!(outcome.stats.coverage, 0.0);
    }
}
