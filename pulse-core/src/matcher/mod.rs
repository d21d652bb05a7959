//! Hold-duration matching and tiered scoring.
//!
//! All functions here are pure. Band edges are inclusive: a hold that lands
//! exactly on `target ± width` still counts for that band.

use core::time::Duration;

use crate::cues::CueType;

pub mod policy;

pub use policy::{
    ComboScoring, FlatScoring, MAX_COMBO_MULTIPLIER, Scoring, ScoringMode, ScoringPolicy,
    TieredScoring,
};

/// Half-width of the band that awards [`ScoreTier::Perfect`].
pub const PERFECT_BAND: Duration = Duration::from_millis(20);
/// Half-width of the band that awards [`ScoreTier::Great`].
pub const GREAT_BAND: Duration = Duration::from_millis(50);
/// Default half-width of the outermost scoring band.
pub const GOOD_BAND: Duration = Duration::from_millis(100);

/// Scoring tier awarded to an accepted hold.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScoreTier {
    Perfect,
    Great,
    Good,
}

impl ScoreTier {
    /// Points the tier is worth before any multiplier.
    #[must_use]
    pub const fn points(self) -> u32 {
        match self {
            ScoreTier::Perfect => 10,
            ScoreTier::Great => 8,
            ScoreTier::Good => 5,
        }
    }

    /// Uppercase label shown next to score popups.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            ScoreTier::Perfect => "PERFECT",
            ScoreTier::Great => "GREAT",
            ScoreTier::Good => "GOOD",
        }
    }
}

/// Result of scoring one input against its expected cue.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Judgement {
    Hit { tier: ScoreTier, points: u32 },
    Miss,
}

impl Judgement {
    /// A hit worth the tier's base points.
    #[must_use]
    pub const fn hit(tier: ScoreTier) -> Self {
        Judgement::Hit {
            tier,
            points: tier.points(),
        }
    }

    #[must_use]
    pub const fn is_miss(self) -> bool {
        matches!(self, Judgement::Miss)
    }

    #[must_use]
    pub const fn is_hit(self) -> bool {
        !self.is_miss()
    }

    /// Points awarded, zero for a miss.
    #[must_use]
    pub const fn points(self) -> u32 {
        match self {
            Judgement::Hit { points, .. } => points,
            Judgement::Miss => 0,
        }
    }

    #[must_use]
    pub const fn tier(self) -> Option<ScoreTier> {
        match self {
            Judgement::Hit { tier, .. } => Some(tier),
            Judgement::Miss => None,
        }
    }
}

/// Width of the outermost tier band.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OuterBand {
    /// Same width for every cue.
    Fixed(Duration),
    /// Each cue's catalog tolerance.
    CueTolerance,
}

impl OuterBand {
    /// Resolves the band width for `cue`.
    #[must_use]
    pub const fn width(self, cue: CueType) -> Duration {
        match self {
            OuterBand::Fixed(width) => width,
            OuterBand::CueTolerance => cue.tolerance(),
        }
    }
}

impl Default for OuterBand {
    fn default() -> Self {
        OuterBand::Fixed(GOOD_BAND)
    }
}

/// Inclusive acceptance window around a target hold.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct HoldWindow {
    pub target: Duration,
    pub tolerance: Duration,
}

impl HoldWindow {
    #[must_use]
    pub const fn new(target: Duration, tolerance: Duration) -> Self {
        Self { target, tolerance }
    }

    /// Single-band window from the cue catalog.
    #[must_use]
    pub const fn for_cue(cue: CueType) -> Self {
        Self::new(cue.target_hold(), cue.tolerance())
    }

    /// Shortest accepted hold.
    #[must_use]
    pub fn min_hold(&self) -> Duration {
        self.target.saturating_sub(self.tolerance)
    }

    /// Longest accepted hold.
    #[must_use]
    pub fn max_hold(&self) -> Duration {
        self.target.saturating_add(self.tolerance)
    }

    /// Absolute distance between `held` and the target.
    #[must_use]
    pub fn deviation(&self, held: Duration) -> Duration {
        if held > self.target {
            held - self.target
        } else {
            self.target - held
        }
    }

    /// Validate that a hold duration sits within the window.
    #[must_use]
    pub fn contains(&self, held: Duration) -> bool {
        self.deviation(held) <= self.tolerance
    }

    /// Linear accuracy in `0.0..=1.0`, falling to zero at the window edge.
    ///
    /// A zero-width window reports `1.0` for an exact hit and `0.0` otherwise.
    #[must_use]
    pub fn accuracy(&self, held: Duration) -> f32 {
        let deviation = self.deviation(held);
        if self.tolerance.is_zero() {
            return if deviation.is_zero() { 1.0 } else { 0.0 };
        }

        let ratio = deviation.as_secs_f32() / self.tolerance.as_secs_f32();
        if ratio >= 1.0 { 0.0 } else { 1.0 - ratio }
    }
}

/// Pass/fail check: right button and hold inside the cue's tolerance.
#[must_use]
pub fn matches(pressed: CueType, expected: CueType, held: Duration) -> bool {
    pressed == expected && HoldWindow::for_cue(expected).contains(held)
}

/// Tiered score for a hold of `expected` using the default outer band.
#[must_use]
pub fn score(held: Duration, expected: CueType) -> Judgement {
    score_with(held, expected, OuterBand::default())
}

/// Tiered score returning the narrowest band the hold falls into.
#[must_use]
pub fn score_with(held: Duration, expected: CueType, outer: OuterBand) -> Judgement {
    let deviation = HoldWindow::for_cue(expected).deviation(held);
    let bands = [
        (ScoreTier::Perfect, PERFECT_BAND),
        (ScoreTier::Great, GREAT_BAND),
        (ScoreTier::Good, outer.width(expected)),
    ];

    bands
        .iter()
        .find(|(_, width)| deviation <= *width)
        .map_or(Judgement::Miss, |(tier, _)| Judgement::hit(*tier))
}

/// Tiered score that treats a wrong button as a miss.
#[must_use]
pub fn score_input(pressed: CueType, expected: CueType, held: Duration) -> Judgement {
    score_input_with(pressed, expected, held, OuterBand::default())
}

/// [`score_input`] with an explicit outer band.
#[must_use]
pub fn score_input_with(
    pressed: CueType,
    expected: CueType,
    held: Duration,
    outer: OuterBand,
) -> Judgement {
    if pressed != expected {
        return Judgement::Miss;
    }
    score_with(held, expected, outer)
}

/// Accuracy of `held` against the cue's single-band window.
#[must_use]
pub fn accuracy(held: Duration, expected: CueType) -> f32 {
    HoldWindow::for_cue(expected).accuracy(held)
}
