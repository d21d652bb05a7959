//! Round sequences, their generator and playback timing.

use core::time::Duration;

use heapless::Vec;
use rand::{Rng, RngCore, distributions::Standard};
use thiserror::Error;

use crate::cues::CueType;

/// Longest sequence a round can ask for.
pub const MAX_SEQUENCE_LEN: usize = 25;

/// Cues added on top of the round number (round 1 plays three cues).
pub const BASE_SEQUENCE_LEN: usize = 2;

/// Number of cues played in `round`.
#[must_use]
pub const fn sequence_length(round: u32) -> usize {
    let wanted = (round as usize).saturating_add(BASE_SEQUENCE_LEN);
    if wanted > MAX_SEQUENCE_LEN {
        MAX_SEQUENCE_LEN
    } else {
        wanted
    }
}

/// Raised when a hand-built sequence exceeds [`MAX_SEQUENCE_LEN`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("sequence of {requested} cues exceeds the {max} cue limit", max = MAX_SEQUENCE_LEN)]
pub struct SequenceCapacityError {
    pub requested: usize,
}

/// Ordered cues the player must reproduce in one round.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Sequence {
    cues: Vec<CueType, MAX_SEQUENCE_LEN>,
    round: u32,
    is_bonus: bool,
}

impl Sequence {
    /// Builds a sequence from explicit cues, e.g. for practice drills.
    pub fn from_cues(
        round: u32,
        is_bonus: bool,
        cues: &[CueType],
    ) -> Result<Self, SequenceCapacityError> {
        let stored = Vec::from_slice(cues).map_err(|_| SequenceCapacityError {
            requested: cues.len(),
        })?;

        Ok(Self {
            cues: stored,
            round,
            is_bonus,
        })
    }

    /// Returns the cues in playback order.
    #[must_use]
    pub fn cues(&self) -> &[CueType] {
        &self.cues
    }

    /// Returns the cue at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<CueType> {
        self.cues.get(index).copied()
    }

    /// Returns the number of cues.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cues.len()
    }

    /// Returns `true` when the sequence holds no cues.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Round the sequence was generated for.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// Returns `true` when the sequence was stamped as a bonus round.
    #[must_use]
    pub const fn is_bonus(&self) -> bool {
        self.is_bonus
    }
}

/// Produces round sequences from an injected random source.
#[derive(Clone, Debug)]
pub struct SequenceGenerator<R> {
    rng: R,
}

impl<R: RngCore> SequenceGenerator<R> {
    /// Creates a generator that draws cues from `rng`.
    #[must_use]
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Generates the sequence for `round`, stamping the caller's bonus decision.
    ///
    /// Positions are drawn independently and uniformly; no run-length limits
    /// are applied.
    pub fn generate(&mut self, round: u32, is_bonus: bool) -> Sequence {
        let mut cues = Vec::new();
        for _ in 0..sequence_length(round) {
            let cue: CueType = self.rng.sample(Standard);
            // sequence_length never exceeds the vector capacity
            let _ = cues.push(cue);
        }

        Sequence {
            cues,
            round,
            is_bonus,
        }
    }

    /// Mutably accesses the random source, e.g. to reseed it.
    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }
}

/// Pause before the first cue.
pub const PLAYBACK_LEAD_IN: Duration = Duration::from_millis(300);
/// Silence after every cue.
pub const PLAYBACK_GAP: Duration = Duration::from_millis(350);
/// Extra pause after the final gap before completion is reported.
pub const PLAYBACK_TRAILING: Duration = Duration::from_millis(200);

/// Spacing a playback implementation applies around each cue.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PlaybackTiming {
    pub lead_in: Duration,
    pub gap: Duration,
    pub trailing: Duration,
}

impl PlaybackTiming {
    /// Creates a timing profile.
    #[must_use]
    pub const fn new(lead_in: Duration, gap: Duration, trailing: Duration) -> Self {
        Self {
            lead_in,
            gap,
            trailing,
        }
    }

    /// Start offset of every cue relative to the playback request.
    pub fn cue_schedule(
        self,
        sequence: &Sequence,
    ) -> impl Iterator<Item = (Duration, CueType)> + '_ {
        let gap = self.gap;
        let mut offset = self.lead_in;
        sequence.cues().iter().map(move |cue| {
            let start = offset;
            offset += cue.playback_duration() + gap;
            (start, *cue)
        })
    }

    /// Time from the playback request until completion should be signalled.
    #[must_use]
    pub fn total(&self, sequence: &Sequence) -> Duration {
        let cues: Duration = sequence
            .cues()
            .iter()
            .map(|cue| cue.playback_duration() + self.gap)
            .sum();
        self.lead_in + cues + self.trailing
    }
}

impl Default for PlaybackTiming {
    fn default() -> Self {
        Self::new(PLAYBACK_LEAD_IN, PLAYBACK_GAP, PLAYBACK_TRAILING)
    }
}
