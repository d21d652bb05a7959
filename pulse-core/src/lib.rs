#![no_std]

// Round engine for the Pulse haptic memory game.
//
// The device plays a sequence of tactile cues and the player answers by
// holding buttons for matching durations. This crate owns sequence
// generation, hold scoring and round progression; rendering, the haptic
// engine and durable storage are reached through the traits in `services`.

#[macro_use]
mod fmt;

pub mod config;
pub mod cues;
pub mod events;
pub mod matcher;
pub mod orchestrator;
pub mod sequence;
pub mod services;
pub mod session;
pub mod time;

pub use config::GameConfig;
pub use cues::CueType;
pub use matcher::{Judgement, ScoreTier};
pub use orchestrator::{FailurePolicy, GameOverCause, RoundOrchestrator, RoundVerdict};
pub use sequence::{Sequence, SequenceGenerator};
pub use session::{GamePhase, RoundSession};
pub use time::{GameInstant, Timestamp};
