//! Collaborator contracts the orchestrator drives, plus hardware-free stand-ins.
//!
//! Playback and feedback are fire-and-forget: the orchestrator never waits on
//! them. Playback completion comes back through
//! [`RoundOrchestrator::on_playback_complete`](crate::orchestrator::RoundOrchestrator::on_playback_complete)
//! carrying the [`PlaybackTicket`] handed out with the request.

use thiserror::Error;

use crate::cues::CueType;
use crate::sequence::Sequence;

/// Identifies one playback request so late completions can be discarded.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlaybackTicket {
    generation: u32,
    round: u32,
}

impl PlaybackTicket {
    #[must_use]
    pub(crate) const fn new(generation: u32, round: u32) -> Self {
        Self { generation, round }
    }

    /// Round instance the playback belongs to.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Round number of the sequence being played.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }
}

/// Plays cue sequences on the tactile device.
pub trait CuePlayback {
    /// Starts playing `sequence`. Completion must be reported later with `ticket`.
    fn play(&mut self, sequence: &Sequence, ticket: PlaybackTicket);

    /// Plays one cue right away, e.g. as press acknowledgement.
    fn play_immediate(&mut self, cue: CueType);

    /// Stops any playback in progress.
    fn stop(&mut self);
}

/// Playback driver that performs no hardware interaction.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopPlayback;

impl NoopPlayback {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl CuePlayback for NoopPlayback {
    fn play(&mut self, _: &Sequence, _: PlaybackTicket) {}

    fn play_immediate(&mut self, _: CueType) {}

    fn stop(&mut self) {}
}

/// Failure reported by a [`ScoreStore`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    #[error("score storage is unavailable")]
    Unavailable,
    #[error("score storage rejected the write")]
    WriteRejected,
    #[error("stored score data is corrupt")]
    Corrupt,
}

/// Durable integer storage for the high score and lifetime counters.
///
/// Counters only grow; [`ScoreStore::reset_all`] is the single way back to zero.
pub trait ScoreStore {
    /// Reads the stored high score, zero when none was saved yet.
    fn high_score(&mut self) -> Result<u32, StoreError>;

    /// Persists `score` when it beats the stored value; otherwise does nothing.
    fn save_high_score(&mut self, score: u32) -> Result<(), StoreError>;

    fn games_played(&mut self) -> Result<u32, StoreError>;

    fn record_game_played(&mut self) -> Result<(), StoreError>;

    /// Total cues reproduced across every completed round.
    fn total_patterns(&mut self) -> Result<u32, StoreError>;

    fn add_patterns_completed(&mut self, count: u32) -> Result<(), StoreError>;

    /// Clears the high score and every counter.
    fn reset_all(&mut self) -> Result<(), StoreError>;
}

/// In-memory [`ScoreStore`] for hosts without durable storage and for tests.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct MemoryScoreStore {
    high_score: u32,
    games_played: u32,
    total_patterns: u32,
    high_score_writes: u32,
}

impl MemoryScoreStore {
    #[must_use]
    pub const fn new() -> Self {
        Self::with_high_score(0)
    }

    /// Creates a store that already holds `high_score`.
    #[must_use]
    pub const fn with_high_score(high_score: u32) -> Self {
        Self {
            high_score,
            games_played: 0,
            total_patterns: 0,
            high_score_writes: 0,
        }
    }

    /// Number of times the stored high score actually changed.
    #[must_use]
    pub const fn high_score_writes(&self) -> u32 {
        self.high_score_writes
    }
}

impl ScoreStore for MemoryScoreStore {
    fn high_score(&mut self) -> Result<u32, StoreError> {
        Ok(self.high_score)
    }

    fn save_high_score(&mut self, score: u32) -> Result<(), StoreError> {
        if score > self.high_score {
            self.high_score = score;
            self.high_score_writes += 1;
        }
        Ok(())
    }

    fn games_played(&mut self) -> Result<u32, StoreError> {
        Ok(self.games_played)
    }

    fn record_game_played(&mut self) -> Result<(), StoreError> {
        self.games_played = self.games_played.saturating_add(1);
        Ok(())
    }

    fn total_patterns(&mut self) -> Result<u32, StoreError> {
        Ok(self.total_patterns)
    }

    fn add_patterns_completed(&mut self, count: u32) -> Result<(), StoreError> {
        self.total_patterns = self.total_patterns.saturating_add(count);
        Ok(())
    }

    fn reset_all(&mut self) -> Result<(), StoreError> {
        *self = Self::new();
        Ok(())
    }
}

/// Non-tactile feedback accompanying game events.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FeedbackSignal {
    Success,
    Error,
    Warning,
}

/// Emits [`FeedbackSignal`]s; failures are the implementation's concern.
pub trait Feedback {
    fn signal(&mut self, signal: FeedbackSignal);
}

#[derive(Copy, Clone, Debug, Default)]
pub struct NoopFeedback;

impl NoopFeedback {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Feedback for NoopFeedback {
    fn signal(&mut self, _: FeedbackSignal) {}
}
