//! Line-timed lyric transcript parsing and timecode formatting.
//!
//! The transcript format: metadata rows `[tag:value]` (recognized tags:
//! `ti`, `ar`, `al`, `length`), and timed rows `[mm:ss.xx]text` or
//! `[mm:ss.xx][mm:ss.xx]text` (shared text, duplicated across timestamps).
//! The centisecond field accepts 2 or 3 digits; 3 digits are milliseconds.
//! Anything else is passed through untouched by every consumer.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::LrcLine;

static TIME_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[(\d{1,2}):(\d{2})\.(\d{2,3})\]").unwrap());

static META_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[(ti|ar|al|length):\s*([^\]]*?)\s*\]\s*$").unwrap());

/// A parsed transcript: the timed lines in document order plus whatever
/// recognized metadata tags the file carried.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LrcDocument {
    pub lines: Vec<LrcLine>,
    pub metadata: Vec<(String, String)>,
}

/// Row classification shared by the parser and the payload renderer, so
/// both assign identical line indices to identical input.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Row<'a> {
    /// One or more leading time tags; `text` is everything after the last
    /// tag, bytes untouched.
    Timed { times_ms: Vec<f64>, text: &'a str },
    Meta { tag: &'a str, value: &'a str },
    Other,
}

pub(crate) fn classify_row(row: &str) -> Row<'_> {
    let mut rest = row;
    let mut times_ms = Vec::new();
    while let Some(caps) = TIME_TAG.captures(rest) {
        let minutes: f64 = caps[1].parse().unwrap_or(0.0);
        let seconds: f64 = caps[2].parse().unwrap_or(0.0);
        let frac = &caps[3];
        let frac_ms: f64 = match frac.len() {
            2 => frac.parse::<f64>().unwrap_or(0.0) * 10.0,
            _ => frac.parse::<f64>().unwrap_or(0.0),
        };
        times_ms.push(minutes * 60_000.0 + seconds * 1000.0 + frac_ms);
        rest = &rest[caps.get(0).expect("anchored match").end()..];
    }
    if !times_ms.is_empty() {
        return Row::Timed {
            times_ms,
            text: rest,
        };
    }
    if let Some(caps) = META_TAG.captures(row) {
        let tag = caps.get(1).expect("tag group").as_str();
        let value = caps.get(2).expect("value group").as_str();
        return Row::Meta { tag, value };
    }
    Row::Other
}

/// Parse the transcript into timed lines (document order; a row with N
/// time tags yields N lines sharing its text) and metadata.
pub fn parse_lrc(text: &str) -> LrcDocument {
    let mut doc = LrcDocument::default();
    for row in text.lines() {
        match classify_row(row) {
            Row::Timed { times_ms, text } => {
                for time_ms in times_ms {
                    doc.lines.push(LrcLine::new(time_ms, text.trim_start()));
                }
            }
            Row::Meta { tag, value } => {
                doc.metadata.push((tag.to_string(), value.to_string()));
            }
            Row::Other => {}
        }
    }
    doc
}

/// `mm:ss.xx` with centisecond precision, the shape used both for line
/// tags and for inline word markers.
pub fn format_timecode(ms: f64) -> String {
    let total_centis = (ms / 10.0).round().max(0.0) as i64;
    let minutes = total_centis / 6000;
    let seconds = (total_centis / 100) % 60;
    let centis = total_centis % 100;
    format!("{minutes:02}:{seconds:02}.{centis:02}")
}
