//! Pluggable scoring strategies applied by the round session.

use core::time::Duration;

use crate::cues::CueType;

use super::{Judgement, OuterBand, ScoreTier, matches, score_input_with};

/// Highest multiplier [`ComboScoring`] can reach.
pub const MAX_COMBO_MULTIPLIER: u32 = 4;

/// Identifies which scoring strategy is active.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScoringMode {
    Flat,
    Tiered,
    Combo,
}

/// Strategy that turns one release into a [`Judgement`].
pub trait ScoringPolicy {
    /// Which strategy this is, for hosts that label the active rules.
    fn mode(&self) -> ScoringMode;

    /// Scores a release of `pressed` held for `held` against `expected`.
    fn judge(&mut self, pressed: CueType, expected: CueType, held: Duration) -> Judgement;

    /// Clears any per-game state.
    fn reset(&mut self) {}
}

/// Pass/fail scoring: every accepted hold is worth a flat ten points.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct FlatScoring;

impl ScoringPolicy for FlatScoring {
    fn mode(&self) -> ScoringMode {
        ScoringMode::Flat
    }

    fn judge(&mut self, pressed: CueType, expected: CueType, held: Duration) -> Judgement {
        if matches(pressed, expected, held) {
            Judgement::hit(ScoreTier::Perfect)
        } else {
            Judgement::Miss
        }
    }
}

/// Perfect/Great/Good bands around the target hold.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TieredScoring {
    outer: OuterBand,
}

impl TieredScoring {
    #[must_use]
    pub const fn new(outer: OuterBand) -> Self {
        Self { outer }
    }

    #[must_use]
    pub const fn outer_band(&self) -> OuterBand {
        self.outer
    }
}

impl ScoringPolicy for TieredScoring {
    fn mode(&self) -> ScoringMode {
        ScoringMode::Tiered
    }

    fn judge(&mut self, pressed: CueType, expected: CueType, held: Duration) -> Judgement {
        score_input_with(pressed, expected, held, self.outer)
    }
}

/// Tiered scoring with a multiplier that grows on consecutive Perfect holds.
///
/// The current multiplier is applied first and then advanced, so the first
/// Perfect of a streak is worth base points. Any other hit or a miss drops the
/// multiplier back to one.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ComboScoring {
    tiered: TieredScoring,
    multiplier: u32,
}

impl ComboScoring {
    #[must_use]
    pub const fn new(outer: OuterBand) -> Self {
        Self {
            tiered: TieredScoring::new(outer),
            multiplier: 1,
        }
    }

    /// Multiplier the next hit will receive.
    #[must_use]
    pub const fn multiplier(&self) -> u32 {
        self.multiplier
    }
}

impl Default for ComboScoring {
    fn default() -> Self {
        Self::new(OuterBand::default())
    }
}

impl ScoringPolicy for ComboScoring {
    fn mode(&self) -> ScoringMode {
        ScoringMode::Combo
    }

    fn judge(&mut self, pressed: CueType, expected: CueType, held: Duration) -> Judgement {
        match self.tiered.judge(pressed, expected, held) {
            Judgement::Hit { tier, points } => {
                let awarded = points.saturating_mul(self.multiplier);
                self.multiplier = if tier == ScoreTier::Perfect {
                    (self.multiplier + 1).min(MAX_COMBO_MULTIPLIER)
                } else {
                    1
                };
                Judgement::Hit {
                    tier,
                    points: awarded,
                }
            }
            Judgement::Miss => {
                self.multiplier = 1;
                Judgement::Miss
            }
        }
    }

    fn reset(&mut self) {
        self.multiplier = 1;
    }
}

/// Closed set of the built-in strategies, selectable at runtime without boxing.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Scoring {
    Flat(FlatScoring),
    Tiered(TieredScoring),
    Combo(ComboScoring),
}

impl Scoring {
    /// Builds the strategy for `mode`; `outer` is ignored by flat scoring.
    #[must_use]
    pub const fn from_mode(mode: ScoringMode, outer: OuterBand) -> Self {
        match mode {
            ScoringMode::Flat => Scoring::Flat(FlatScoring),
            ScoringMode::Tiered => Scoring::Tiered(TieredScoring::new(outer)),
            ScoringMode::Combo => Scoring::Combo(ComboScoring::new(outer)),
        }
    }
}

impl Default for Scoring {
    fn default() -> Self {
        Scoring::Tiered(TieredScoring::default())
    }
}

impl ScoringPolicy for Scoring {
    fn mode(&self) -> ScoringMode {
        match self {
            Scoring::Flat(policy) => policy.mode(),
            Scoring::Tiered(policy) => policy.mode(),
            Scoring::Combo(policy) => policy.mode(),
        }
    }

    fn judge(&mut self, pressed: CueType, expected: CueType, held: Duration) -> Judgement {
        match self {
            Scoring::Flat(policy) => policy.judge(pressed, expected, held),
            Scoring::Tiered(policy) => policy.judge(pressed, expected, held),
            Scoring::Combo(policy) => policy.judge(pressed, expected, held),
        }
    }

    fn reset(&mut self) {
        match self {
            Scoring::Flat(policy) => policy.reset(),
            Scoring::Tiered(policy) => policy.reset(),
            Scoring::Combo(policy) => policy.reset(),
        }
    }
}
