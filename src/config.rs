/// Tuning knobs for the word alignment pipeline. Defaults reproduce the
/// behavior the heuristics were calibrated against; every threshold is a
/// named field so callers can tune without forking the matcher.
#[derive(Debug, Clone)]
pub struct AlignConfig {
    /// Pulses per quarter note of the notation timeline.
    pub ppq: u32,
    /// Lookahead window the matcher searches from the current cursor.
    pub lookahead_window: usize,
    /// Maximum consecutive timing entries a join match may concatenate.
    pub max_join_span: usize,
    /// Floor for every emitted patch duration.
    pub min_word_duration_ms: f64,
    /// Cap for every emitted patch duration.
    pub max_word_duration_ms: f64,
    /// Duration assigned when no following timing entry or line exists.
    pub fallback_word_duration_ms: f64,
    /// How many of the earliest patches feed the global offset median.
    pub offset_sample_count: usize,
    /// Minimum |offset| before the orchestrator shifts the timing stream
    /// and retries the primary pass once. The offset median is inflated by
    /// in-line word offsets even for perfectly aligned songs, so this sits
    /// well above that noise floor.
    pub resync_min_offset_ms: f64,
    /// Non-matching timing tokens a recovery anchor may absorb before the
    /// anchor is abandoned.
    pub recovery_max_extra_tokens: usize,
    /// Minimum hit ratio for a recovery anchor to be accepted.
    pub recovery_min_hit_ratio: f64,
    /// Minimum absolute hits for a recovery anchor to be accepted.
    pub recovery_min_hits: usize,
}

impl AlignConfig {
    pub const DEFAULT_PPQ: u32 = 960;
    pub const DEFAULT_LOOKAHEAD_WINDOW: usize = 20;
    pub const DEFAULT_MAX_JOIN_SPAN: usize = 3;
    pub const MIN_WORD_DURATION_MS: f64 = 50.0;
    pub const MAX_WORD_DURATION_MS: f64 = 2000.0;
    pub const FALLBACK_WORD_DURATION_MS: f64 = 500.0;
    pub const DEFAULT_OFFSET_SAMPLE_COUNT: usize = 8;
    pub const DEFAULT_RESYNC_MIN_OFFSET_MS: f64 = 2000.0;
    pub const DEFAULT_RECOVERY_MAX_EXTRA_TOKENS: usize = 10;
    pub const DEFAULT_RECOVERY_MIN_HIT_RATIO: f64 = 0.7;
    pub const DEFAULT_RECOVERY_MIN_HITS: usize = 2;
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            ppq: Self::DEFAULT_PPQ,
            lookahead_window: Self::DEFAULT_LOOKAHEAD_WINDOW,
            max_join_span: Self::DEFAULT_MAX_JOIN_SPAN,
            min_word_duration_ms: Self::MIN_WORD_DURATION_MS,
            max_word_duration_ms: Self::MAX_WORD_DURATION_MS,
            fallback_word_duration_ms: Self::FALLBACK_WORD_DURATION_MS,
            offset_sample_count: Self::DEFAULT_OFFSET_SAMPLE_COUNT,
            resync_min_offset_ms: Self::DEFAULT_RESYNC_MIN_OFFSET_MS,
            recovery_max_extra_tokens: Self::DEFAULT_RECOVERY_MAX_EXTRA_TOKENS,
            recovery_min_hit_ratio: Self::DEFAULT_RECOVERY_MIN_HIT_RATIO,
            recovery_min_hits: Self::DEFAULT_RECOVERY_MIN_HITS,
        }
    }
}

/// Tuning knobs for chord extraction and inference.
#[derive(Debug, Clone)]
pub struct ChordConfig {
    /// One inference window per beat instead of per measure.
    pub window_per_beat: bool,
    /// Simultaneous notes an onset group needs to count as chordal.
    pub chordal_group_min_notes: usize,
    /// Fraction of chordal onset groups that earns the chordal bonus.
    pub chordal_ratio: f64,
    /// Fraction of on-grid onset groups that earns the grid bonus.
    pub beat_grid_ratio: f64,
    /// Distance from the beat grid an onset may sit and still count.
    pub beat_grid_tolerance_ticks: u32,
    /// Fraction of monophonic-run groups that triggers the penalty.
    pub monophonic_ratio: f64,
    /// Minimum numeric track score for a track without explicit markers
    /// to be a usable chord source.
    pub min_track_score: i32,
    /// A differing candidate must beat the previous emitted score times
    /// this factor, or it is treated as flicker and dropped.
    pub smoothing_threshold: f64,
    /// Absolute score floor below which no inferred chord is emitted.
    pub min_chord_score: f64,
    /// Weight of out-of-template energy against the candidate.
    pub out_of_template_penalty: f64,
    /// Bonus when the window's bass note is the candidate root.
    pub bass_root_bonus: f64,
    /// Bonus when the bass is some other template member.
    pub bass_in_template_bonus: f64,
    /// Penalty keeping seventh chords from beating equivalent triads.
    pub seventh_penalty: f64,
}

impl ChordConfig {
    pub const DEFAULT_CHORDAL_GROUP_MIN_NOTES: usize = 3;
    pub const DEFAULT_CHORDAL_RATIO: f64 = 0.3;
    pub const DEFAULT_BEAT_GRID_RATIO: f64 = 0.5;
    pub const DEFAULT_BEAT_GRID_TOLERANCE_TICKS: u32 = 10;
    pub const DEFAULT_MONOPHONIC_RATIO: f64 = 0.5;
    pub const DEFAULT_MIN_TRACK_SCORE: i32 = 1;
    pub const DEFAULT_SMOOTHING_THRESHOLD: f64 = 1.15;
    pub const DEFAULT_MIN_CHORD_SCORE: f64 = 2.0;
    pub const DEFAULT_OUT_OF_TEMPLATE_PENALTY: f64 = 0.4;
    pub const DEFAULT_BASS_ROOT_BONUS: f64 = 0.8;
    pub const DEFAULT_BASS_IN_TEMPLATE_BONUS: f64 = 0.4;
    pub const DEFAULT_SEVENTH_PENALTY: f64 = 0.5;
}

impl Default for ChordConfig {
    fn default() -> Self {
        Self {
            window_per_beat: false,
            chordal_group_min_notes: Self::DEFAULT_CHORDAL_GROUP_MIN_NOTES,
            chordal_ratio: Self::DEFAULT_CHORDAL_RATIO,
            beat_grid_ratio: Self::DEFAULT_BEAT_GRID_RATIO,
            beat_grid_tolerance_ticks: Self::DEFAULT_BEAT_GRID_TOLERANCE_TICKS,
            monophonic_ratio: Self::DEFAULT_MONOPHONIC_RATIO,
            min_track_score: Self::DEFAULT_MIN_TRACK_SCORE,
            smoothing_threshold: Self::DEFAULT_SMOOTHING_THRESHOLD,
            min_chord_score: Self::DEFAULT_MIN_CHORD_SCORE,
            out_of_template_penalty: Self::DEFAULT_OUT_OF_TEMPLATE_PENALTY,
            bass_root_bonus: Self::DEFAULT_BASS_ROOT_BONUS,
            bass_in_template_bonus: Self::DEFAULT_BASS_IN_TEMPLATE_BONUS,
            seventh_penalty: Self::DEFAULT_SEVENTH_PENALTY,
        }
    }
}
