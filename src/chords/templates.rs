//! Chord templates and pitch-class-histogram scoring.

use crate::config::ChordConfig;

pub const PITCH_CLASSES: usize = 12;

pub const ROOT_NAMES: [&str; PITCH_CLASSES] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Dominant7,
    Minor7,
}

impl ChordQuality {
    pub const ALL: [ChordQuality; 5] = [
        ChordQuality::Major,
        ChordQuality::Minor,
        ChordQuality::Diminished,
        ChordQuality::Dominant7,
        ChordQuality::Minor7,
    ];

    /// Semitone offsets from the root.
    pub fn intervals(self) -> &'static [usize] {
        match self {
            ChordQuality::Major => &[0, 4, 7],
            ChordQuality::Minor => &[0, 3, 7],
            ChordQuality::Diminished => &[0, 3, 6],
            ChordQuality::Dominant7 => &[0, 4, 7, 10],
            ChordQuality::Minor7 => &[0, 3, 7, 10],
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            ChordQuality::Major => "",
            ChordQuality::Minor => "m",
            ChordQuality::Diminished => "dim",
            ChordQuality::Dominant7 => "7",
            ChordQuality::Minor7 => "m7",
        }
    }

    pub fn is_seventh(self) -> bool {
        matches!(self, ChordQuality::Dominant7 | ChordQuality::Minor7)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChordCandidate {
    pub root: usize,
    pub quality: ChordQuality,
    pub score: f64,
}

impl ChordCandidate {
    pub fn name(&self) -> String {
        format!("{}{}", ROOT_NAMES[self.root], self.quality.suffix())
    }

    pub fn same_chord(&self, other: &ChordCandidate) -> bool {
        self.root == other.root && self.quality == other.quality
    }
}

/// Score every root x quality combination against the window histogram and
/// return the best. In-template energy counts for the candidate,
/// out-of-template energy against it; the bass pitch class nudges the root
/// choice, and seventh qualities pay a flat penalty so ambiguous windows
/// resolve to the simpler triad. `None` when the window carries no energy.
pub fn best_candidate(
    histogram: &[f64; PITCH_CLASSES],
    bass: Option<usize>,
    config: &ChordConfig,
) -> Option<ChordCandidate> {
    let total: f64 = histogram.iter().sum();
    if total <= 0.0 {
        return None;
    }

    let mut best: Option<ChordCandidate> = None;
    for root in 0..PITCH_CLASSES {
        for quality in ChordQuality::ALL {
            let in_template: f64 = quality
                .intervals()
                .iter()
                .map(|&interval| histogram[(root + interval) % PITCH_CLASSES])
                .sum();
            let out_of_template = total - in_template;
            let mut score = in_template - config.out_of_template_penalty * out_of_template;

            if let Some(bass_pc) = bass {
                if bass_pc == root {
                    score += config.bass_root_bonus;
                } else if quality
                    .intervals()
                    .iter()
                    .any(|&interval| (root + interval) % PITCH_CLASSES == bass_pc)
                {
                    score += config.bass_in_template_bonus;
                }
            }
            if quality.is_seventh() {
                score -= config.seventh_penalty;
            }

            if best.map_or(true, |b| score > b.score) {
                best = Some(ChordCandidate {
                    root,
                    quality,
                    score,
                });
            }
        }
    }
    best
}
