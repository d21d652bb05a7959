//! Delayed transitions keyed to the round generation.

use super::GameOverCause;

/// What happens when a pending transition falls due.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransitionAction {
    StartRound,
    FinishGame(GameOverCause),
}

/// Transition waiting for its deadline.
///
/// It only fires while `generation` still names the current round instance.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PendingTransition<I> {
    pub generation: u32,
    pub due: I,
    pub action: TransitionAction,
}

impl<I: Ord + Copy> PendingTransition<I> {
    #[must_use]
    pub const fn new(generation: u32, due: I, action: TransitionAction) -> Self {
        Self {
            generation,
            due,
            action,
        }
    }

    /// Returns `true` once `now` has reached the deadline.
    #[must_use]
    pub fn is_due(&self, now: I) -> bool {
        self.due <= now
    }

    /// Returns `true` when the transition belongs to an earlier round instance.
    #[must_use]
    pub const fn is_stale(&self, generation: u32) -> bool {
        self.generation != generation
    }
}
