//! Bounded diagnostics log of orchestrator decisions.
//!
//! Hosts read it to drive UI transitions after each entry point or to dump a
//! trace when something looks off. The log keeps the most recent entries and
//! silently overwrites the oldest ones.

use core::fmt;

use heapless::HistoryBuf;

use crate::cues::CueType;
use crate::matcher::Judgement;
use crate::orchestrator::GameOverCause;
use crate::services::{PlaybackTicket, StoreError};
use crate::session::{GamePhase, InputRejected, RoundSummary};

/// Entries retained by [`EventLog`] unless a capacity is given.
pub const EVENT_LOG_CAPACITY: usize = 64;

/// Identifier assigned to every recorded event.
pub type EventId = u32;

/// Why an input event was dropped.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IgnoreReason {
    /// Input arrived while the input window was closed.
    WrongPhase(GamePhase),
    /// Press while another hold is still in progress.
    AlreadyHolding,
    /// Release without a matching press.
    NotHolding,
    NoSequence,
    RoundComplete,
}

impl From<InputRejected> for IgnoreReason {
    fn from(rejection: InputRejected) -> Self {
        match rejection {
            InputRejected::WrongPhase(phase) => IgnoreReason::WrongPhase(phase),
            InputRejected::NoSequence => IgnoreReason::NoSequence,
            InputRejected::RoundComplete => IgnoreReason::RoundComplete,
        }
    }
}

/// Something the orchestrator did or refused to do.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum GameEvent {
    GameStarted,
    RoundStarted {
        round: u32,
        cues: usize,
        is_bonus: bool,
    },
    InputWindowOpened {
        round: u32,
    },
    InputScored {
        cue: CueType,
        judgement: Judgement,
    },
    InputIgnored(IgnoreReason),
    /// A playback completion arrived for a round that is no longer current.
    StalePlayback(PlaybackTicket),
    RoundCompleted(RoundSummary),
    BonusUnlocked {
        round: u32,
    },
    LifeLost {
        remaining: u8,
    },
    IdlePenalty {
        points: u32,
    },
    HighScoreSaved {
        score: u32,
    },
    StoreFailed(StoreError),
    GameOver {
        cause: GameOverCause,
        round: u32,
        score: u32,
    },
    ReturnedToMenu,
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameEvent::GameStarted => f.write_str("game-started"),
            GameEvent::RoundStarted {
                round,
                cues,
                is_bonus,
            } => {
                write!(f, "round-started {round} ({cues} cues)")?;
                if *is_bonus {
                    f.write_str(" bonus")?;
                }
                Ok(())
            }
            GameEvent::InputWindowOpened { round } => write!(f, "input-window {round}"),
            GameEvent::InputScored { cue, judgement } => match judgement.tier() {
                Some(tier) => write!(f, "{cue} {} +{}", tier.label(), judgement.points()),
                None => write!(f, "{cue} MISS"),
            },
            GameEvent::InputIgnored(reason) => write!(f, "input-ignored {reason:?}"),
            GameEvent::StalePlayback(ticket) => {
                write!(f, "stale-playback generation {}", ticket.generation())
            }
            GameEvent::RoundCompleted(summary) => write!(
                f,
                "round-completed {} perfect={}",
                summary.round, summary.perfect
            ),
            GameEvent::BonusUnlocked { round } => write!(f, "bonus-unlocked {round}"),
            GameEvent::LifeLost { remaining } => write!(f, "life-lost {remaining} left"),
            GameEvent::IdlePenalty { points } => write!(f, "idle-penalty -{points}"),
            GameEvent::HighScoreSaved { score } => write!(f, "high-score-saved {score}"),
            GameEvent::StoreFailed(error) => write!(f, "store-failed: {error}"),
            GameEvent::GameOver {
                cause,
                round,
                score,
            } => write!(f, "game-over {cause:?} round {round} score {score}"),
            GameEvent::ReturnedToMenu => f.write_str("menu"),
        }
    }
}

/// Event stored in the ring buffer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct EventRecord<I> {
    pub id: EventId,
    pub at: I,
    pub event: GameEvent,
}

/// Records game events into a fixed-size ring buffer.
pub struct EventLog<I, const CAPACITY: usize = EVENT_LOG_CAPACITY> {
    ring: HistoryBuf<EventRecord<I>, CAPACITY>,
    next_event_id: EventId,
}

impl<I: Copy, const CAPACITY: usize> EventLog<I, CAPACITY> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            next_event_id: 0,
        }
    }

    /// Appends `event`, overwriting the oldest entry when full.
    pub fn record(&mut self, event: GameEvent, at: I) -> EventId {
        let id = self.next_event_id;
        self.next_event_id = self.next_event_id.wrapping_add(1);
        self.ring.write(EventRecord { id, at, event });
        id
    }

    /// Iterates retained events from oldest to newest.
    pub fn oldest_first(&self) -> impl Iterator<Item = &EventRecord<I>> + '_ {
        self.ring.oldest_ordered()
    }

    /// Events recorded after `id`, oldest first.
    pub fn since(&self, id: EventId) -> impl Iterator<Item = &EventRecord<I>> + '_ {
        self.oldest_first().filter(move |record| record.id > id)
    }

    #[must_use]
    pub fn latest(&self) -> Option<&EventRecord<I>> {
        self.ring.recent()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Drops every retained entry; identifiers keep counting.
    pub fn clear(&mut self) {
        self.ring.clear();
    }
}

impl<I: Copy, const CAPACITY: usize> Default for EventLog<I, CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}
