#![allow(dead_code)]

use core::time::Duration;

use pulse_core::config::GameConfig;
use pulse_core::cues::CueType;
use pulse_core::matcher::Judgement;
use pulse_core::orchestrator::RoundOrchestrator;
use pulse_core::sequence::{PlaybackTiming, Sequence};
use pulse_core::services::{
    CuePlayback, Feedback, FeedbackSignal, MemoryScoreStore, PlaybackTicket, ScoreStore,
    StoreError,
};
use pulse_core::session::GamePhase;
use pulse_core::time::Timestamp;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub const SEED: u64 = 0x5EED_CAFE;

/// Added to the target hold to force a miss for every cue.
pub const MISS_OFFSET: Duration = Duration::from_secs(1);

/// Pause between two answers.
pub const INPUT_GAP: Duration = Duration::from_millis(120);

#[derive(Debug, Default)]
pub struct RecordingPlayback {
    pub requests: Vec<(PlaybackTicket, Vec<CueType>)>,
    pub immediate: Vec<CueType>,
    pub stops: usize,
}

impl RecordingPlayback {
    pub fn last_ticket(&self) -> Option<PlaybackTicket> {
        self.requests.last().map(|(ticket, _)| *ticket)
    }
}

impl CuePlayback for RecordingPlayback {
    fn play(&mut self, sequence: &Sequence, ticket: PlaybackTicket) {
        self.requests.push((ticket, sequence.cues().to_vec()));
    }

    fn play_immediate(&mut self, cue: CueType) {
        self.immediate.push(cue);
    }

    fn stop(&mut self) {
        self.stops += 1;
    }
}

#[derive(Debug, Default)]
pub struct RecordingFeedback {
    pub signals: Vec<FeedbackSignal>,
}

impl Feedback for RecordingFeedback {
    fn signal(&mut self, signal: FeedbackSignal) {
        self.signals.push(signal);
    }
}

/// Store whose reads and writes can be made to fail.
#[derive(Debug, Default)]
pub struct FlakyStore {
    pub inner: MemoryScoreStore,
    pub fail_reads: bool,
    pub fail_writes: bool,
}

impl FlakyStore {
    fn read<T>(&mut self, op: impl FnOnce(&mut MemoryScoreStore) -> Result<T, StoreError>) -> Result<T, StoreError> {
        if self.fail_reads {
            return Err(StoreError::Unavailable);
        }
        op(&mut self.inner)
    }

    fn write(&mut self, op: impl FnOnce(&mut MemoryScoreStore) -> Result<(), StoreError>) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::WriteRejected);
        }
        op(&mut self.inner)
    }
}

impl ScoreStore for FlakyStore {
    fn high_score(&mut self) -> Result<u32, StoreError> {
        self.read(MemoryScoreStore::high_score)
    }

    fn save_high_score(&mut self, score: u32) -> Result<(), StoreError> {
        self.write(|store| store.save_high_score(score))
    }

    fn games_played(&mut self) -> Result<u32, StoreError> {
        self.read(MemoryScoreStore::games_played)
    }

    fn record_game_played(&mut self) -> Result<(), StoreError> {
        self.write(MemoryScoreStore::record_game_played)
    }

    fn total_patterns(&mut self) -> Result<u32, StoreError> {
        self.read(MemoryScoreStore::total_patterns)
    }

    fn add_patterns_completed(&mut self, count: u32) -> Result<(), StoreError> {
        self.write(|store| store.add_patterns_completed(count))
    }

    fn reset_all(&mut self) -> Result<(), StoreError> {
        self.write(MemoryScoreStore::reset_all)
    }
}

pub type TestGame<S> =
    RoundOrchestrator<Timestamp, ChaCha8Rng, RecordingPlayback, S, RecordingFeedback>;

/// Drives an orchestrator with a simulated clock.
pub struct Harness<S: ScoreStore = MemoryScoreStore> {
    pub game: TestGame<S>,
    pub now: Timestamp,
}

pub fn harness(config: GameConfig) -> Harness {
    Harness::with_store(config, MemoryScoreStore::new())
}

impl<S: ScoreStore> Harness<S> {
    pub fn with_store(config: GameConfig, store: S) -> Self {
        let game = RoundOrchestrator::new(
            config,
            ChaCha8Rng::seed_from_u64(SEED),
            RecordingPlayback::default(),
            store,
            RecordingFeedback::default(),
        );
        Self {
            game,
            now: Timestamp::ZERO,
        }
    }

    pub fn advance(&mut self, by: Duration) {
        self.now = self.now + by;
    }

    pub fn start(&mut self) {
        self.game.start_game(self.now);
    }

    /// Waits out the playback of the active round and reports completion.
    pub fn finish_playback(&mut self) {
        let ticket = self
            .game
            .playback()
            .last_ticket()
            .expect("playback was requested");
        let sequence = self
            .game
            .session()
            .sequence()
            .expect("a round is active")
            .clone();
        self.advance(PlaybackTiming::default().total(&sequence));
        self.game.on_playback_complete(ticket, self.now);
    }

    /// Presses `cue`, keeps it down for `held` and releases it.
    pub fn hold(&mut self, cue: CueType, held: Duration) -> Option<Judgement> {
        self.game.on_input_down(cue, self.now);
        self.advance(held);
        self.game.on_input_up(cue, self.now)
    }

    pub fn expected_cues(&self) -> Vec<CueType> {
        self.game
            .session()
            .sequence()
            .map(|sequence| sequence.cues().to_vec())
            .unwrap_or_default()
    }

    /// Plays back and answers the active round, missing the listed positions.
    ///
    /// Stops early once the input window closes.
    pub fn play_round(&mut self, misses: &[usize]) -> Vec<Judgement> {
        self.finish_playback();

        let mut judgements = Vec::new();
        for (index, cue) in self.expected_cues().into_iter().enumerate() {
            if self.game.phase() != GamePhase::WaitingForInput {
                break;
            }
            let held = if misses.contains(&index) {
                cue.target_hold() + MISS_OFFSET
            } else {
                cue.target_hold()
            };
            judgements.extend(self.hold(cue, held));
            self.advance(INPUT_GAP);
        }
        judgements
    }

    /// Jumps to the scheduled transition and lets it fire.
    pub fn fire_pending(&mut self) {
        let due = self
            .game
            .pending_transition()
            .expect("a transition is scheduled")
            .due;
        self.now = self.now.max(due);
        self.game.poll(self.now);
    }
}
