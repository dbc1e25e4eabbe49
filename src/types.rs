/// One tempo change in the notation timeline. The tempo map is sorted
/// ascending by tick and always carries an entry at tick 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoEvent {
    pub tick: u32,
    pub bpm: f64,
}

/// Raw lyric fragment as the notation file carries it. A leading, trailing,
/// or bare hyphen is a continuation marker, not text.
#[derive(Debug, Clone, PartialEq)]
pub struct Syllable {
    pub tick: u32,
    pub text: String,
}

/// One fully-joined word of the canonical timing stream, sorted ascending by
/// `start_ms` (tick order is preserved through tempo conversion).
#[derive(Debug, Clone, PartialEq)]
pub struct WordTiming {
    pub start_ms: f64,
    pub text: String,
}

/// One lyric line of the transcript. `words` are the whitespace-split tokens
/// of `text`, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct LrcLine {
    pub start_ms: f64,
    pub text: String,
    pub words: Vec<String>,
}

impl LrcLine {
    pub fn new(start_ms: f64, text: impl Into<String>) -> Self {
        let text = text.into();
        let words = text.split_whitespace().map(str::to_string).collect();
        Self {
            start_ms,
            text,
            words,
        }
    }
}

/// One resolved word timing. `word_index` is unique per `line_index` and
/// indexes into that line's `words`.
#[derive(Debug, Clone, PartialEq)]
pub struct WordPatch {
    pub line_index: usize,
    pub word_index: usize,
    pub start_ms: f64,
    pub duration_ms: f64,
    /// Raw timing-stream text the match consumed (joined for multi-entry
    /// matches). Diagnostic only; not required for rendering.
    pub source_text: Option<String>,
}

/// Alignment quality signal. `coverage` is a percentage in [0, 100];
/// degraded/partial coverage is the expected steady state, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AlignmentStats {
    pub total_words: usize,
    pub matched_words: usize,
    pub coverage: f64,
}

impl AlignmentStats {
    pub fn from_counts(total_words: usize, matched_words: usize) -> Self {
        let coverage = if total_words == 0 {
            0.0
        } else {
            matched_words as f64 / total_words as f64 * 100.0
        };
        Self {
            total_words,
            matched_words,
            coverage,
        }
    }
}

/// Result of one alignment pass over the full lyric/word streams.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlignmentOutcome {
    pub patches: Vec<WordPatch>,
    pub stats: AlignmentStats,
}

/// One chord-change event on the absolute timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ChordEvent {
    pub start_ms: f64,
    pub duration_ms: f64,
    pub chord: String,
    /// In [0, 1]. Explicit markers carry 1.0; inferred chords carry the
    /// template score normalized by window energy.
    pub confidence: f64,
}

/// Suitability verdict for one notation track as a chord source.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackAnalysis {
    pub track_index: usize,
    pub track_name: String,
    pub score: i32,
    pub explicit_chord_count: usize,
    pub is_percussion: bool,
    pub eligible: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lrc_line_splits_words_on_whitespace() {
        let line = LrcLine::new(1000.0, "hello  brave world");
        assert_eq!(line.words, ["hello", "brave", "world"]);
        assert_eq!(line.text, "hello  brave world");
    }

    #[test]
    fn stats_coverage_is_percentage() {
        let stats = AlignmentStats::from_counts(4, 3);
        assert_eq!(stats.coverage, 75.0);
    }

    #[test]
    fn stats_empty_input_yields_zero_coverage() {
        let stats = AlignmentStats::from_counts(0, 0);
        assert_eq!(stats.coverage, 0.0);
    }
}
