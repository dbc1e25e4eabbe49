use std::borrow::Cow;

use crate::alignment::offset::estimate_global_offset;
use crate::alignment::recovery::recover_blocks;
use crate::chords;
use crate::config::{AlignConfig, ChordConfig};
use crate::error::AlignError;
use crate::lrc::parse_lrc;
use crate::payload::{
    bind_chords_to_lines, build_payload, render_enhanced, ChordEnhancementPayload,
    EnhancementPayload, GpMeta, GpWord,
};
use crate::pipeline::traits::{LineMatcher, ScoreSource, SyllableJoiner};
use crate::score::Score;
use crate::types::{AlignmentStats, ChordEvent, TrackAnalysis, WordPatch, WordTiming};

/// The full alignment pipeline: syllable joining, the primary sequential
/// pass, one-shot re-synchronization, the recovery pass, payload encoding,
/// and transcript rendering. Stateless across calls; one instance can serve
/// any number of songs concurrently.
pub struct LyricEnhancer {
    config: AlignConfig,
    chord_config: ChordConfig,
    joiner: Box<dyn SyllableJoiner>,
    matcher: Box<dyn LineMatcher>,
}

pub(crate) struct LyricEnhancerParts {
    pub config: AlignConfig,
    pub chord_config: ChordConfig,
    pub joiner: Box<dyn SyllableJoiner>,
    pub matcher: Box<dyn LineMatcher>,
}

/// Everything one alignment run produces. `enhanced_lrc` is always the
/// canonical rendering of `payload` over the input transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct Enhancement {
    pub enhanced_lrc: String,
    pub payload: EnhancementPayload,
    pub patches: Vec<WordPatch>,
    pub stats: AlignmentStats,
    pub global_offset_ms: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChordEnhancement {
    pub payload: ChordEnhancementPayload,
    pub events: Vec<ChordEvent>,
    pub track: TrackAnalysis,
}

impl LyricEnhancer {
    pub(crate) fn from_parts(parts: LyricEnhancerParts) -> Self {
        Self {
            config: parts.config,
            chord_config: parts.chord_config,
            joiner: parts.joiner,
            matcher: parts.matcher,
        }
    }

    pub fn config(&self) -> &AlignConfig {
        &self.config
    }

    pub fn chord_config(&self) -> &ChordConfig {
        &self.chord_config
    }

    /// Align a transcript against a parsed score.
    pub fn enhance(&self, lrc_text: &str, score: &Score) -> Result<Enhancement, AlignError> {
        score.validate()?;
        let syllables = score.syllables();
        let timing = self
            .joiner
            .join(&syllables, &score.tempo_changes, score.ppq);
        let gp_meta = GpMeta {
            title: score.title.clone(),
            artist: score.artist.clone(),
            track_name: score
                .tracks
                .iter()
                .find(|t| t.has_syllables())
                .map(|t| t.name.clone()),
        };
        let gp_words = timing
            .iter()
            .map(|w| GpWord {
                start: w.start_ms,
                text: w.text.clone(),
            })
            .collect();
        self.enhance_inner(lrc_text, &timing, Some(gp_meta), Some(gp_words))
    }

    /// Align a transcript against a score produced by an external parser.
    pub fn enhance_from_source(
        &self,
        lrc_text: &str,
        source: &dyn ScoreSource,
    ) -> Result<Enhancement, AlignError> {
        let score = source.load()?;
        self.enhance(lrc_text, &score)
    }

    /// Align a transcript against an already-joined timing stream.
    pub fn enhance_with_timing(
        &self,
        lrc_text: &str,
        timing: &[WordTiming],
    ) -> Result<Enhancement, AlignError> {
        self.enhance_inner(lrc_text, timing, None, None)
    }

    fn enhance_inner(
        &self,
        lrc_text: &str,
        timing: &[WordTiming],
        gp_meta: Option<GpMeta>,
        gp_words: Option<Vec<GpWord>>,
    ) -> Result<Enhancement, AlignError> {
        let doc = parse_lrc(lrc_text);
        let total_words: usize = doc.lines.iter().map(|l| l.words.len()).sum();

        if doc.lines.is_empty() || timing.is_empty() {
            tracing::debug!(
                lines = doc.lines.len(),
                timing_words = timing.len(),
                "enhance: nothing to align"
            );
            let payload = build_payload(&[], gp_meta, gp_words);
            let enhanced_lrc = render_enhanced(lrc_text, &payload)?;
            return Ok(Enhancement {
                enhanced_lrc,
                payload,
                patches: Vec::new(),
                stats: AlignmentStats::from_counts(total_words, 0),
                global_offset_ms: None,
            });
        }

        let base = self.matcher.align(&doc.lines, timing, &self.config);
        let global_offset_ms =
            estimate_global_offset(&doc.lines, &base.patches, self.config.offset_sample_count);

        let mut chosen = base;
        let mut timing_used: Cow<'_, [WordTiming]> = Cow::Borrowed(timing);
        if let Some(offset) = global_offset_ms {
            if offset.abs() >= self.config.resync_min_offset_ms {
                let shifted: Vec<WordTiming> = timing
                    .iter()
                    .map(|w| WordTiming {
                        start_ms: w.start_ms - offset,
                        text: w.text.clone(),
                    })
                    .collect();
                // Matching is textual, so the re-run cannot lose words to
                // the shift; keeping the shifted pass on a tie is what
                // moves the patch times onto the transcript's timeline.
                let second = self.matcher.align(&doc.lines, &shifted, &self.config);
                if second.stats.matched_words >= chosen.stats.matched_words {
                    tracing::debug!(
                        offset_ms = format!("{offset:.0}"),
                        base_matched = chosen.stats.matched_words,
                        resynced_matched = second.stats.matched_words,
                        "enhance: resynchronized pass kept"
                    );
                    chosen = second;
                    timing_used = Cow::Owned(shifted);
                }
            }
        }

        let recovered = recover_blocks(&doc.lines, &timing_used, &chosen.patches, &self.config);
        let mut patches = chosen.patches;
        patches.extend(recovered);
        patches.sort_by(|a, b| (a.line_index, a.word_index).cmp(&(b.line_index, b.word_index)));

        let stats = AlignmentStats::from_counts(total_words, patches.len());
        tracing::debug!(
            matched = stats.matched_words,
            total = stats.total_words,
            coverage = format!("{:.1}", stats.coverage),
            "enhance: alignment complete"
        );

        let payload = build_payload(&patches, gp_meta, gp_words);
        let enhanced_lrc = render_enhanced(lrc_text, &payload)?;
        Ok(Enhancement {
            enhanced_lrc,
            payload,
            patches,
            stats,
            global_offset_ms,
        })
    }

    /// Extract chord events from the score's most suitable track. `None`
    /// when no track is usable.
    pub fn extract_chords(&self, score: &Score) -> Option<chords::ChordExtraction> {
        chords::extract_chords(score, &self.chord_config)
    }

    /// Extract chords and bind them to the transcript's lines. `patches`
    /// (typically from a prior [`LyricEnhancer::enhance`] run) let events
    /// reference the matched word they land on; pass an empty slice when
    /// no alignment ran.
    pub fn enhance_chords(
        &self,
        score: &Score,
        lrc_text: &str,
        patches: &[WordPatch],
    ) -> Option<ChordEnhancement> {
        let extraction = chords::extract_chords(score, &self.chord_config)?;
        let doc = parse_lrc(lrc_text);
        let payload = bind_chords_to_lines(&extraction.events, &doc.lines, patches);
        Some(ChordEnhancement {
            payload,
            events: extraction.events,
            track: extraction.track,
        })
    }
}
