//! Global offset estimation between the two timelines.

use std::cmp::Ordering;

use crate::types::{LrcLine, WordPatch};

/// Median delta between patch start times and their line start times, taken
/// over the earliest `sample_count` patches. Positive means the timing
/// stream runs ahead of the lyric-line timestamps. `None` when there are no
/// samples at all.
///
/// Callers can shift the timing stream by the returned offset and re-run
/// the primary pass for a one-shot re-synchronization.
pub fn estimate_global_offset(
    lines: &[LrcLine],
    patches: &[WordPatch],
    sample_count: usize,
) -> Option<f64> {
    let mut earliest: Vec<&WordPatch> = patches.iter().collect();
    earliest.sort_by(|a, b| {
        a.start_ms
            .partial_cmp(&b.start_ms)
            .unwrap_or(Ordering::Equal)
    });

    let mut deltas: Vec<f64> = earliest
        .iter()
        .take(sample_count)
        .filter_map(|p| lines.get(p.line_index).map(|l| p.start_ms - l.start_ms))
        .collect();
    if deltas.is_empty() {
        return None;
    }

    deltas.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = deltas.len() / 2;
    let median = if deltas.len() % 2 == 0 {
        (deltas[mid - 1] + deltas[mid]) / 2.0
    } else {
        deltas[mid]
    };
    Some(median)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LrcLine;

    fn patch(line_index: usize, start_ms: f64) -> WordPatch {
        WordPatch {
            line_index,
            word_index: 0,
            start_ms,
            duration_ms: 100.0,
            source_text: None,
        }
    }

    #[test]
    fn median_of_even_sample_is_the_middle_mean() {
        let lines: Vec<LrcLine> = (0..4).map(|i| LrcLine::new(i as f64 * 1000.0, "x")).collect();
        let patches = vec![
            patch(0, 100.0),
            patch(1, 1100.0),
            patch(2, 2150.0),
            patch(3, 3200.0),
        ];
        // Deltas are [100, 100, 150, 200].
        assert_eq!(estimate_global_offset(&lines, &patches, 8), Some(125.0));
    }

    #[test]
    fn median_of_odd_sample_is_the_middle_value() {
        let lines: Vec<LrcLine> = (0..3).map(|i| LrcLine::new(i as f64 * 1000.0, "x")).collect();
        let patches = vec![patch(0, 90.0), patch(1, 1050.0), patch(2, 2200.0)];
        assert_eq!(estimate_global_offset(&lines, &patches, 8), Some(90.0));
    }

    #[test]
    fn only_the_earliest_patches_feed_the_estimate() {
        let lines: Vec<LrcLine> = (0..3).map(|i| LrcLine::new(i as f64 * 1000.0, "x")).collect();
        // The late outlier at delta 5000 must be ignored with sample_count 2.
        let patches = vec![patch(0, 100.0), patch(1, 1100.0), patch(2, 7000.0)];
        assert_eq!(estimate_global_offset(&lines, &patches, 2), Some(100.0));
    }

    #[test]
    fn negative_offset_means_timing_runs_behind() {
        let lines = vec![LrcLine::new(1000.0, "x")];
        let patches = vec![patch(0, 800.0)];
        assert_eq!(estimate_global_offset(&lines, &patches, 8), Some(-200.0));
    }

    #[test]
    fn no_patches_yields_none() {
        let lines = vec![LrcLine::new(0.0, "x")];
        assert_eq!(estimate_global_offset(&lines, &[], 8), None);
    }
}
