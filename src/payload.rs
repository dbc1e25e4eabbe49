//! Versioned enhancement payloads and the transcript renderer.
//!
//! The payload is the only externally persisted artifact. It is a closed,
//! versioned structure: `version` gates decoding outright, `algoVersion`
//! records which alignment heuristics produced it. Word starts are stored
//! relative to the line's first matched word to keep the JSON compact.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::AlignError;
use crate::lrc::{classify_row, format_timecode, Row};
use crate::types::{ChordEvent, LrcLine, WordPatch};

/// Payload container layout version. Bump only on breaking shape changes.
pub const PATCH_FORMAT_VERSION: u32 = 1;
/// Alignment heuristics revision recorded in emitted payloads.
pub const ALGO_VERSION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancementPayload {
    pub version: u32,
    pub algo_version: u32,
    pub lines: Vec<PayloadLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gp_meta: Option<GpMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gp_words: Option<Vec<GpWord>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadLine {
    pub idx: usize,
    /// Absolute reference time of the line's first matched word. Word
    /// `start` offsets are relative to this; when absent, offsets are
    /// relative to the transcript line's own timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_ms: Option<f64>,
    pub words: Vec<PayloadWord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadWord {
    pub idx: usize,
    pub start: f64,
    pub dur: f64,
}

/// Source-score metadata carried along for provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_name: Option<String>,
}

/// One entry of the joined timing stream, kept for diagnostics and offline
/// re-alignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpWord {
    pub start: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChordEnhancementPayload {
    pub patch_format_version: u32,
    pub algo_version: u32,
    pub lines: Vec<ChordPayloadLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordPayloadLine {
    pub idx: usize,
    pub chords: Vec<ChordPayloadEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChordPayloadEntry {
    /// Milliseconds relative to the owning line's timestamp, clamped >= 0.
    pub start: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dur: Option<f64>,
    pub chord: String,
    /// Matched word the event lands on, when the line has one at or before
    /// the event time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_idx: Option<usize>,
}

/// Group patches into line-relative payload entries. Only lines with at
/// least one patch appear; offsets are clamped to zero so a recovered word
/// starting before the line reference cannot go negative.
pub fn encode_patches(patches: &[WordPatch]) -> Vec<PayloadLine> {
    let mut by_line: BTreeMap<usize, Vec<&WordPatch>> = BTreeMap::new();
    for patch in patches {
        by_line.entry(patch.line_index).or_default().push(patch);
    }

    by_line
        .into_iter()
        .map(|(idx, mut line_patches)| {
            line_patches.sort_by_key(|p| p.word_index);
            let reference = line_patches[0].start_ms;
            let words = line_patches
                .iter()
                .map(|p| PayloadWord {
                    idx: p.word_index,
                    start: (p.start_ms - reference).max(0.0).round(),
                    dur: p.duration_ms.round(),
                })
                .collect();
            PayloadLine {
                idx,
                start_ms: Some(reference.round()),
                words,
            }
        })
        .collect()
}

pub fn build_payload(
    patches: &[WordPatch],
    gp_meta: Option<GpMeta>,
    gp_words: Option<Vec<GpWord>>,
) -> EnhancementPayload {
    EnhancementPayload {
        version: PATCH_FORMAT_VERSION,
        algo_version: ALGO_VERSION,
        lines: encode_patches(patches),
        gp_meta,
        gp_words,
    }
}

/// Re-render the original transcript with `<mm:ss.xx>` markers spliced
/// before each word the payload knows about.
///
/// Rows without a payload entry, and rows that are not timed lines, pass
/// through byte-for-byte. The first word of a line is kept bare when its
/// offset is exactly zero: it already coincides with the line's leading
/// timestamp. The output is byte-stable for a given payload + transcript.
pub fn render_enhanced(
    lrc_text: &str,
    payload: &EnhancementPayload,
) -> Result<String, AlignError> {
    if payload.version != PATCH_FORMAT_VERSION {
        return Err(AlignError::UnsupportedPayloadVersion {
            version: payload.version,
            supported: PATCH_FORMAT_VERSION,
        });
    }
    if payload.algo_version > ALGO_VERSION {
        tracing::warn!(
            payload_algo_version = payload.algo_version,
            crate_algo_version = ALGO_VERSION,
            "rendering a payload produced by a newer aligner"
        );
    }

    let by_line: HashMap<usize, &PayloadLine> =
        payload.lines.iter().map(|l| (l.idx, l)).collect();

    let mut out = String::with_capacity(lrc_text.len() + payload.lines.len() * 16);
    let mut line_counter = 0usize;
    for (row_number, row) in lrc_text.split('\n').enumerate() {
        if row_number > 0 {
            out.push('\n');
        }
        let Row::Timed { times_ms, text } = classify_row(row) else {
            out.push_str(row);
            continue;
        };

        let entry = (0..times_ms.len())
            .find_map(|k| by_line.get(&(line_counter + k)).map(|e| (k, *e)));
        match entry {
            Some((k, e)) => {
                let base_ms = e.start_ms.unwrap_or(times_ms[k]);
                let tag_prefix = &row[..row.len() - text.len()];
                out.push_str(tag_prefix);
                splice_words(&mut out, text, e, base_ms);
            }
            None => out.push_str(row),
        }
        line_counter += times_ms.len();
    }
    Ok(out)
}

fn splice_words(out: &mut String, text: &str, entry: &PayloadLine, base_ms: f64) {
    let offsets: HashMap<usize, f64> = entry.words.iter().map(|w| (w.idx, w.start)).collect();
    let mut word_index = 0usize;
    let mut prev_was_space = true;
    for c in text.chars() {
        let is_space = c.is_whitespace();
        if !is_space && prev_was_space {
            if let Some(&offset) = offsets.get(&word_index) {
                if word_index != 0 || offset != 0.0 {
                    out.push('<');
                    out.push_str(&format_timecode(base_ms + offset));
                    out.push('>');
                }
            }
            word_index += 1;
        }
        out.push(c);
        prev_was_space = is_space;
    }
}

/// Assign chord events to lyric lines by time: each event belongs to the
/// latest line starting at or before it (events ahead of the first line go
/// to line 0). `word_idx` points at the latest matched word of that line
/// at or before the event time, when one exists.
pub fn bind_chords_to_lines(
    events: &[ChordEvent],
    lines: &[LrcLine],
    patches: &[WordPatch],
) -> ChordEnhancementPayload {
    let mut by_line: BTreeMap<usize, Vec<ChordPayloadEntry>> = BTreeMap::new();
    if !lines.is_empty() {
        for event in events {
            let line_index = lines
                .partition_point(|l| l.start_ms <= event.start_ms)
                .saturating_sub(1);
            let line_start = lines[line_index].start_ms;
            let word_idx = patches
                .iter()
                .filter(|p| p.line_index == line_index && p.start_ms <= event.start_ms)
                .map(|p| p.word_index)
                .max();
            by_line.entry(line_index).or_default().push(ChordPayloadEntry {
                start: (event.start_ms - line_start).max(0.0).round(),
                dur: Some(event.duration_ms.round()),
                chord: event.chord.clone(),
                word_idx,
            });
        }
    }

    ChordEnhancementPayload {
        patch_format_version: PATCH_FORMAT_VERSION,
        algo_version: ALGO_VERSION,
        lines: by_line
            .into_iter()
            .map(|(idx, chords)| ChordPayloadLine { idx, chords })
            .collect(),
    }
}

pub fn payload_to_json(payload: &EnhancementPayload) -> Result<String, AlignError> {
    serde_json::to_string(payload).map_err(|e| AlignError::json("serialize enhancement payload", e))
}

pub fn payload_from_json(data: &str) -> Result<EnhancementPayload, AlignError> {
    let payload: EnhancementPayload =
        serde_json::from_str(data).map_err(|e| AlignError::json("parse enhancement payload", e))?;
    if payload.version != PATCH_FORMAT_VERSION {
        return Err(AlignError::UnsupportedPayloadVersion {
            version: payload.version,
            supported: PATCH_FORMAT_VERSION,
        });
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch(line_index: usize, word_index: usize, start_ms: f64, duration_ms: f64) -> WordPatch {
        WordPatch {
            line_index,
            word_index,
            start_ms,
            duration_ms,
            source_text: None,
        }
    }

    #[test]
    fn encode_groups_by_line_and_rebases_on_first_word() {
        let lines = encode_patches(&[
            patch(0, 0, 1000.0, 300.0),
            patch(0, 1, 1400.0, 300.0),
            patch(2, 0, 5000.0, 200.0),
        ]);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].idx, 0);
        assert_eq!(lines[0].start_ms, Some(1000.0));
        assert_eq!(lines[0].words[0].start, 0.0);
        assert_eq!(lines[0].words[1].start, 400.0);
        assert_eq!(lines[1].idx, 2);
    }

    #[test]
    fn encode_sorts_words_and_clamps_negative_offsets() {
        let lines = encode_patches(&[
            patch(0, 1, 1400.0, 300.0),
            patch(0, 0, 1500.0, 300.0),
        ]);
        // Word 0 is the reference even though word 1 starts earlier.
        assert_eq!(lines[0].start_ms, Some(1500.0));
        assert_eq!(lines[0].words[0].idx, 0);
        assert_eq!(lines[0].words[0].start, 0.0);
        assert_eq!(lines[0].words[1].start, 0.0);
    }

    #[test]
    fn render_splices_markers_before_known_words() {
        let payload = build_payload(
            &[
                patch(0, 0, 12_340.0, 300.0),
                patch(0, 1, 12_900.0, 300.0),
            ],
            None,
            None,
        );
        let rendered = render_enhanced("[00:12.34]hello world", &payload).unwrap();
        // First word sits at offset zero and stays bare.
        assert_eq!(rendered, "[00:12.34]hello <00:12.90>world");
    }

    #[test]
    fn render_marks_a_zero_offset_word_that_is_not_first() {
        let payload = build_payload(&[patch(0, 1, 12_340.0, 300.0)], None, None);
        let rendered = render_enhanced("[00:12.34]hello world", &payload).unwrap();
        assert_eq!(rendered, "[00:12.34]hello <00:12.34>world");
    }

    #[test]
    fn render_passes_unknown_rows_through_unchanged() {
        let payload = build_payload(&[patch(1, 0, 5_000.0, 300.0)], None, None);
        let source = "[ti:Title]\n\nfree text\n[00:01.00]unmatched line\n[00:05.00]go";
        let rendered = render_enhanced(source, &payload).unwrap();
        assert_eq!(
            rendered,
            "[ti:Title]\n\nfree text\n[00:01.00]unmatched line\n[00:05.00]go"
        );
    }

    #[test]
    fn render_preserves_interior_whitespace() {
        let payload = build_payload(
            &[patch(0, 0, 1_000.0, 100.0), patch(0, 1, 1_500.0, 100.0)],
            None,
            None,
        );
        let rendered = render_enhanced("[00:01.00]one   two", &payload).unwrap();
        assert_eq!(rendered, "[00:01.00]one   <00:01.50>two");
    }

    #[test]
    fn render_handles_shared_text_rows_by_first_matching_index() {
        let payload = build_payload(&[patch(1, 0, 90_000.0, 300.0)], None, None);
        let rendered = render_enhanced("[00:10.00][01:30.00]chorus here", &payload).unwrap();
        // Line 1 owns the entry; its reference time drives the marker, and
        // word 0 at offset zero stays bare.
        assert_eq!(rendered, "[00:10.00][01:30.00]chorus here");
    }

    #[test]
    fn render_rejects_unknown_payload_version() {
        let mut payload = build_payload(&[], None, None);
        payload.version = 99;
        let err = render_enhanced("[00:01.00]x", &payload).unwrap_err();
        assert!(matches!(
            err,
            AlignError::UnsupportedPayloadVersion { version: 99, .. }
        ));
    }

    #[test]
    fn json_round_trip_preserves_the_payload() {
        let payload = build_payload(
            &[patch(0, 0, 1000.0, 300.0)],
            Some(GpMeta {
                title: Some("Song".to_string()),
                artist: None,
                track_name: Some("Vocals".to_string()),
            }),
            Some(vec![GpWord {
                start: 1000.0,
                text: "hello".to_string(),
            }]),
        );
        let json = payload_to_json(&payload).unwrap();
        assert!(json.contains("\"algoVersion\""));
        assert!(json.contains("\"gpMeta\""));
        assert_eq!(payload_from_json(&json).unwrap(), payload);
    }

    #[test]
    fn from_json_rejects_foreign_versions() {
        let json = r#"{"version":7,"algoVersion":1,"lines":[]}"#;
        assert!(payload_from_json(json).is_err());
    }

    #[test]
    fn binds_chords_to_the_latest_line_before_the_event() {
        let lines = vec![LrcLine::new(0.0, "first line"), LrcLine::new(10_000.0, "second line")];
        let events = vec![
            ChordEvent {
                start_ms: 500.0,
                duration_ms: 2000.0,
                chord: "C".to_string(),
                confidence: 1.0,
            },
            ChordEvent {
                start_ms: 11_000.0,
                duration_ms: 2000.0,
                chord: "G".to_string(),
                confidence: 1.0,
            },
        ];
        let patches = vec![patch(1, 1, 10_800.0, 300.0)];
        let payload = bind_chords_to_lines(&events, &lines, &patches);
        assert_eq!(payload.lines.len(), 2);
        assert_eq!(payload.lines[0].idx, 0);
        assert_eq!(payload.lines[0].chords[0].start, 500.0);
        assert_eq!(payload.lines[0].chords[0].word_idx, None);
        assert_eq!(payload.lines[1].chords[0].start, 1000.0);
        assert_eq!(payload.lines[1].chords[0].word_idx, Some(1));
    }

    #[test]
    fn events_before_the_first_line_bind_to_line_zero() {
        let lines = vec![LrcLine::new(5_000.0, "late start")];
        let events = vec![ChordEvent {
            start_ms: 1_000.0,
            duration_ms: 2000.0,
            chord: "Am".to_string(),
            confidence: 0.8,
        }];
        let payload = bind_chords_to_lines(&events, &lines, &[]);
        assert_eq!(payload.lines[0].idx, 0);
        // Clamped instead of negative.
        assert_eq!(payload.lines[0].chords[0].start, 0.0);
    }
}
