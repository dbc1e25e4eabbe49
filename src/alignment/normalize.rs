//! Token canonicalization for fuzzy comparison.
//!
//! Both the timing-stream word and the lyric-stream word pass through
//! [`normalize_token`] before any equality check. The transform is pure and
//! idempotent: `normalize_token(normalize_token(x)) == normalize_token(x)`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Notation prolongation markers: a parenthesized vowel run such as `(o)`
/// or `(oo)` appended to a sung word.
static PROLONGATION_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([aeiou]+\)").unwrap());

/// Interjection shapes: `oh`, `ooh`, `ohh`, `ah`, `aah`, ... optionally
/// hyphen-chained (`oh-oh-oh`). Matched after vowel-run collapsing.
static INTERJECTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[ao]+h+(-[ao]+h+)*$").unwrap());

/// Canonicalize one word token for matching.
///
/// Internal punctuation is intentionally kept: "don't" and "dont" are
/// distinct tokens.
pub fn normalize_token(token: &str) -> String {
    let mut s = token.to_lowercase();
    s = map_confusables(&s);
    if let Some(plus) = s.find('+') {
        s.truncate(plus);
    }
    if s.contains('(') {
        s = PROLONGATION_MARKER.replace_all(&s, "").into_owned();
    }
    s = collapse_vowel_runs(&s);
    let trimmed = s.trim_matches(|c: char| !c.is_alphanumeric());
    if INTERJECTION.is_match(trimmed) {
        // Collapse the whole interjection to its leading vowel.
        return trimmed[..1].to_string();
    }
    trimmed.to_string()
}

/// Map common Cyrillic look-alikes to their Latin equivalents so mixed-script
/// notation exports still compare equal.
fn map_confusables(s: &str) -> String {
    if !s.chars().any(|c| matches!(c, 'а' | 'е' | 'о' | 'р' | 'с' | 'у' | 'х')) {
        return s.to_string();
    }
    s.chars()
        .map(|c| match c {
            'а' => 'a',
            'е' => 'e',
            'о' => 'o',
            'р' => 'p',
            'с' => 'c',
            'у' => 'y',
            'х' => 'x',
            other => other,
        })
        .collect()
}

/// Collapse a run of one repeated vowel to a single instance ("coool" and
/// "cool" both become "col").
fn collapse_vowel_runs(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev: Option<char> = None;
    for c in s.chars() {
        if matches!(c, 'a' | 'e' | 'i' | 'o' | 'u') && prev == Some(c) {
            continue;
        }
        out.push(c);
        prev = Some(c);
    }
    out
}
