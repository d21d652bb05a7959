//! Game rules selected by the host at construction time.

use core::time::Duration;

use crate::matcher::{OuterBand, Scoring, ScoringMode};
use crate::orchestrator::FailurePolicy;
use crate::session::{BonusRule, MISS_PENALTY};

/// Pause after the perfect round that unlocks the bonus chain.
pub const BONUS_UNLOCK_DELAY: Duration = Duration::from_millis(2_000);
/// Pause between consecutive bonus rounds.
pub const BONUS_CHAIN_DELAY: Duration = Duration::from_millis(600);
/// Pause before an ordinary next round.
pub const NEXT_ROUND_DELAY: Duration = Duration::from_millis(1_000);
/// Pause between clearing the final round and the victory screen.
pub const VICTORY_DELAY: Duration = Duration::from_millis(1_200);
/// How long a score popup stays visible.
pub const POPUP_LIFETIME: Duration = Duration::from_millis(900);
/// Lives granted by the survival preset.
pub const SURVIVAL_LIVES: u8 = 3;
/// Last round of the sudden-death preset.
pub const SUDDEN_DEATH_FINAL_ROUND: u32 = 25;

/// Delays the orchestrator waits before leaving a completed round.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RoundDelays {
    pub bonus_unlock: Duration,
    pub bonus_chain: Duration,
    pub next_round: Duration,
    pub victory: Duration,
}

impl RoundDelays {
    #[must_use]
    pub const fn new(
        bonus_unlock: Duration,
        bonus_chain: Duration,
        next_round: Duration,
        victory: Duration,
    ) -> Self {
        Self {
            bonus_unlock,
            bonus_chain,
            next_round,
            victory,
        }
    }

    /// Every delay set to zero, handy for hosts that step rounds manually.
    #[must_use]
    pub const fn immediate() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO, Duration::ZERO, Duration::ZERO)
    }
}

impl Default for RoundDelays {
    fn default() -> Self {
        Self::new(
            BONUS_UNLOCK_DELAY,
            BONUS_CHAIN_DELAY,
            NEXT_ROUND_DELAY,
            VICTORY_DELAY,
        )
    }
}

/// Deduction applied while the player sits idle in the input window.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct IdlePenalty {
    after: Duration,
    points: u32,
}

impl IdlePenalty {
    #[must_use]
    pub const fn new(after: Duration, points: u32) -> Self {
        Self { after, points }
    }

    /// Idle time that triggers one deduction.
    #[must_use]
    pub const fn after(&self) -> Duration {
        self.after
    }

    #[must_use]
    pub const fn points(&self) -> u32 {
        self.points
    }

    /// Returns `false` for a zero interval, which would fire on every poll.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        !self.after.is_zero() && self.points > 0
    }
}

impl Default for IdlePenalty {
    fn default() -> Self {
        Self::new(Duration::from_secs(2), 10)
    }
}

/// Complete rule set for a game.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct GameConfig {
    pub failure: FailurePolicy,
    pub scoring: ScoringMode,
    pub outer_band: OuterBand,
    pub miss_penalty: u32,
    pub delays: RoundDelays,
    /// Completing this round wins the game.
    pub final_round: Option<u32>,
    pub idle_penalty: Option<IdlePenalty>,
    pub popup_lifetime: Duration,
}

impl GameConfig {
    /// Bonus-chain rules with tiered scoring; the canonical game.
    #[must_use]
    pub const fn bonus_chain() -> Self {
        Self {
            failure: FailurePolicy::BonusChain,
            scoring: ScoringMode::Tiered,
            outer_band: OuterBand::Fixed(crate::matcher::GOOD_BAND),
            miss_penalty: MISS_PENALTY,
            delays: RoundDelays::new(
                BONUS_UNLOCK_DELAY,
                BONUS_CHAIN_DELAY,
                NEXT_ROUND_DELAY,
                VICTORY_DELAY,
            ),
            final_round: None,
            idle_penalty: None,
            popup_lifetime: POPUP_LIFETIME,
        }
    }

    /// Pass/fail scoring where the first miss ends the game.
    #[must_use]
    pub const fn sudden_death() -> Self {
        Self::bonus_chain()
            .with_failure_policy(FailurePolicy::SuddenDeath)
            .with_scoring(ScoringMode::Flat)
            .with_final_round(Some(SUDDEN_DEATH_FINAL_ROUND))
    }

    /// Three lives, combo scoring and an idle penalty.
    #[must_use]
    pub const fn survival() -> Self {
        Self::bonus_chain()
            .with_failure_policy(FailurePolicy::Lives(SURVIVAL_LIVES))
            .with_scoring(ScoringMode::Combo)
            .with_idle_penalty(Some(IdlePenalty::new(Duration::from_secs(2), 10)))
    }

    #[must_use]
    pub const fn with_failure_policy(mut self, failure: FailurePolicy) -> Self {
        self.failure = failure;
        self
    }

    #[must_use]
    pub const fn with_scoring(mut self, scoring: ScoringMode) -> Self {
        self.scoring = scoring;
        self
    }

    #[must_use]
    pub const fn with_outer_band(mut self, outer_band: OuterBand) -> Self {
        self.outer_band = outer_band;
        self
    }

    #[must_use]
    pub const fn with_miss_penalty(mut self, points: u32) -> Self {
        self.miss_penalty = points;
        self
    }

    #[must_use]
    pub const fn with_delays(mut self, delays: RoundDelays) -> Self {
        self.delays = delays;
        self
    }

    #[must_use]
    pub const fn with_final_round(mut self, final_round: Option<u32>) -> Self {
        self.final_round = final_round;
        self
    }

    #[must_use]
    pub const fn with_idle_penalty(mut self, idle_penalty: Option<IdlePenalty>) -> Self {
        self.idle_penalty = idle_penalty;
        self
    }

    #[must_use]
    pub const fn with_popup_lifetime(mut self, lifetime: Duration) -> Self {
        self.popup_lifetime = lifetime;
        self
    }

    /// Bonus rounds only exist under the bonus-chain policy.
    #[must_use]
    pub const fn bonus_rule(&self) -> BonusRule {
        match self.failure {
            FailurePolicy::BonusChain => BonusRule::Chain,
            FailurePolicy::SuddenDeath | FailurePolicy::Lives(_) => BonusRule::Disabled,
        }
    }

    /// Fresh scoring strategy for a new orchestrator.
    #[must_use]
    pub const fn scoring_policy(&self) -> Scoring {
        Scoring::from_mode(self.scoring, self.outer_band)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::bonus_chain()
    }
}
