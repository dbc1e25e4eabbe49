//! Non-sequential recovery for lyric sections the primary pass missed.
//!
//! When the notation and the transcript diverge structurally (a shortened
//! solo, a dropped bridge), the sequential cursor sails past whole sections
//! and leaves contiguous blocks of lines with zero matches. This pass
//! re-searches the *entire* timing stream for each such block.
//!
//! Worst case is quadratic in `unmatched_tokens * timing_stream_length`;
//! callers running very long scores should budget or chunk this pass.

use std::collections::{HashMap, HashSet};

use crate::alignment::normalize::normalize_token;
use crate::config::AlignConfig;
use crate::types::{LrcLine, WordPatch, WordTiming};

/// One lyric token inside an unmatched block, with its provenance.
#[derive(Debug, Clone)]
struct BlockToken {
    line_index: usize,
    word_index: usize,
    normalized: String,
}

/// Result of greedily walking one anchor candidate.
#[derive(Debug, Clone, Default)]
struct AnchorWalk {
    hits: usize,
    /// `(block token position, timing index)` for every hit.
    assignments: Vec<(usize, usize)>,
}

/// Find additional patches for lines the base pass missed entirely.
///
/// Returned patches cover only lines absent from `base_patches`, so the
/// caller can merge without deduplication.
pub fn recover_blocks(
    lines: &[LrcLine],
    timing: &[WordTiming],
    base_patches: &[WordPatch],
    config: &AlignConfig,
) -> Vec<WordPatch> {
    if lines.is_empty() || timing.is_empty() {
        return Vec::new();
    }

    let matched_lines: HashSet<usize> = base_patches.iter().map(|p| p.line_index).collect();
    let normalized: Vec<String> = timing.iter().map(|w| normalize_token(&w.text)).collect();

    let mut recovered = Vec::new();
    for (block_start, block_end) in unmatched_blocks(lines.len(), &matched_lines) {
        let tokens = block_tokens(lines, block_start, block_end);
        if tokens.len() < 2 {
            continue;
        }
        if let Some(patches) = recover_one_block(lines, timing, &normalized, &tokens, config) {
            recovered.extend(patches);
        }
    }

    recovered.sort_by(|a, b| (a.line_index, a.word_index).cmp(&(b.line_index, b.word_index)));
    recovered
}

/// Maximal runs `[start, end]` of line indices with zero matched words.
fn unmatched_blocks(line_count: usize, matched: &HashSet<usize>) -> Vec<(usize, usize)> {
    let mut blocks = Vec::new();
    let mut run_start: Option<usize> = None;
    for index in 0..line_count {
        if matched.contains(&index) {
            if let Some(start) = run_start.take() {
                blocks.push((start, index - 1));
            }
            continue;
        }
        if run_start.is_none() {
            run_start = Some(index);
        }
    }
    if let Some(start) = run_start {
        blocks.push((start, line_count - 1));
    }
    blocks
}

fn block_tokens(lines: &[LrcLine], block_start: usize, block_end: usize) -> Vec<BlockToken> {
    let mut tokens = Vec::new();
    for line_index in block_start..=block_end {
        for (word_index, word) in lines[line_index].words.iter().enumerate() {
            let normalized = normalize_token(word);
            if normalized.is_empty() {
                continue;
            }
            tokens.push(BlockToken {
                line_index,
                word_index,
                normalized,
            });
        }
    }
    tokens
}

fn recover_one_block(
    lines: &[LrcLine],
    timing: &[WordTiming],
    normalized: &[String],
    tokens: &[BlockToken],
    config: &AlignConfig,
) -> Option<Vec<WordPatch>> {
    let mut best: Option<AnchorWalk> = None;
    for anchor in 0..timing.len() {
        let walk = walk_anchor(normalized, tokens, anchor, config.recovery_max_extra_tokens);
        let improves = match &best {
            None => walk.hits > 0,
            Some(prev) => walk.hits > prev.hits,
        };
        if improves {
            best = Some(walk);
        }
    }

    let best = best?;
    let hit_ratio = best.hits as f64 / tokens.len() as f64;
    if hit_ratio < config.recovery_min_hit_ratio || best.hits < config.recovery_min_hits {
        tracing::debug!(
            block_start = tokens.first().map(|t| t.line_index),
            block_tokens = tokens.len(),
            hits = best.hits,
            hit_ratio = format!("{hit_ratio:.2}"),
            "recovery: block rejected"
        );
        return None;
    }
    tracing::debug!(
        block_start = tokens.first().map(|t| t.line_index),
        block_tokens = tokens.len(),
        hits = best.hits,
        hit_ratio = format!("{hit_ratio:.2}"),
        "recovery: block anchored"
    );

    Some(patches_from_walk(lines, timing, tokens, &best, config))
}

/// Greedy left-to-right consumption from one anchor: each timing token
/// either matches the next expected lyric token (a hit) or burns one unit
/// of the extra-token budget.
fn walk_anchor(
    normalized: &[String],
    tokens: &[BlockToken],
    anchor: usize,
    max_extra_tokens: usize,
) -> AnchorWalk {
    let mut walk = AnchorWalk::default();
    let mut timing_index = anchor;
    let mut expected = 0usize;
    let mut extras = 0usize;

    while timing_index < normalized.len() && expected < tokens.len() {
        if normalized[timing_index] == tokens[expected].normalized {
            walk.assignments.push((expected, timing_index));
            walk.hits += 1;
            expected += 1;
        } else {
            extras += 1;
            if extras > max_extra_tokens {
                break;
            }
        }
        timing_index += 1;
    }
    walk
}

/// Turn accepted assignments into patches, re-basing each line so its first
/// recovered word lands exactly on the line's own timestamp.
fn patches_from_walk(
    lines: &[LrcLine],
    timing: &[WordTiming],
    tokens: &[BlockToken],
    walk: &AnchorWalk,
    config: &AlignConfig,
) -> Vec<WordPatch> {
    let mut per_line: HashMap<usize, Vec<(usize, usize)>> = HashMap::new();
    for &(token_pos, timing_index) in &walk.assignments {
        per_line
            .entry(tokens[token_pos].line_index)
            .or_default()
            .push((token_pos, timing_index));
    }

    let mut patches = Vec::new();
    for (line_index, assigned) in per_line {
        let line_start = lines[line_index].start_ms;
        let min_recovered = assigned
            .iter()
            .map(|&(_, ti)| timing[ti].start_ms)
            .fold(f64::INFINITY, f64::min);
        let shift = line_start - min_recovered;

        for &(token_pos, timing_index) in &assigned {
            let raw_duration = timing
                .get(timing_index + 1)
                .map(|next| next.start_ms - timing[timing_index].start_ms)
                .unwrap_or(config.fallback_word_duration_ms);
            patches.push(WordPatch {
                line_index,
                word_index: tokens[token_pos].word_index,
                start_ms: timing[timing_index].start_ms + shift,
                duration_ms: raw_duration.clamp(
                    config.min_word_duration_ms,
                    config.max_word_duration_ms,
                ),
                source_text: Some(timing[timing_index].text.clone()),
            });
        }
    }
    patches
}
