//! Per-game round state: phase, score, the active sequence and recorded inputs.
//!
//! The session scores inputs and enforces phase legality but never decides what
//! follows a completed round; that choice belongs to the orchestrator.

use core::time::Duration;

use heapless::Vec;
use rand::RngCore;
use thiserror::Error;

use crate::cues::CueType;
use crate::matcher::{Judgement, Scoring, ScoringPolicy};
use crate::sequence::{MAX_SEQUENCE_LEN, Sequence, SequenceGenerator};

/// Round that always plays as the first bonus round.
pub const BONUS_UNLOCK_ROUND: u32 = 5;
/// First round that can continue a bonus chain.
pub const BONUS_CHAIN_START: u32 = 6;
/// Points deducted for every missed input.
pub const MISS_PENALTY: u32 = 5;

/// Lifecycle phases of a game.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GamePhase {
    Menu,
    PlayingPattern,
    WaitingForInput,
    RoundCorrect,
    BonusUnlocked,
    GameOver,
}

impl GamePhase {
    /// Returns `true` when moving from `self` to `next` is a legal edge.
    ///
    /// Any phase may fall back to [`GamePhase::Menu`].
    #[must_use]
    pub const fn can_transition_to(self, next: GamePhase) -> bool {
        match (self, next) {
            (_, GamePhase::Menu)
            | (
                GamePhase::Menu
                | GamePhase::RoundCorrect
                | GamePhase::BonusUnlocked
                | GamePhase::GameOver,
                GamePhase::PlayingPattern,
            )
            | (GamePhase::PlayingPattern, GamePhase::WaitingForInput)
            | (GamePhase::WaitingForInput, GamePhase::RoundCorrect)
            | (GamePhase::RoundCorrect, GamePhase::BonusUnlocked)
            | (GamePhase::WaitingForInput | GamePhase::RoundCorrect, GamePhase::GameOver) => true,
            _ => false,
        }
    }

    /// Returns `true` while the player may press inputs.
    #[must_use]
    pub const fn accepts_input(self) -> bool {
        matches!(self, GamePhase::WaitingForInput)
    }

    /// Returns `true` between the first round starting and the game ending.
    #[must_use]
    pub const fn is_in_game(self) -> bool {
        !matches!(self, GamePhase::Menu | GamePhase::GameOver)
    }
}

/// Failure reported when attempting an illegal phase transition.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("illegal phase transition from {from:?} to {to:?}")]
pub struct TransitionError {
    pub from: GamePhase,
    pub to: GamePhase,
}

impl TransitionError {
    #[must_use]
    pub const fn new(from: GamePhase, to: GamePhase) -> Self {
        Self { from, to }
    }
}

/// Reason [`RoundSession::record_input`] refused an input.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputRejected {
    #[error("input is not accepted while {0:?}")]
    WrongPhase(GamePhase),
    #[error("no sequence is active")]
    NoSequence,
    #[error("every cue of the round was already answered")]
    RoundComplete,
}

/// Which rounds are flagged as bonus rounds.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BonusRule {
    /// Round five unlocks the chain; each later perfect bonus round extends it.
    #[default]
    Chain,
    Disabled,
}

impl BonusRule {
    /// Decides whether `round` is a bonus round given how the previous one went.
    #[must_use]
    pub const fn is_bonus(self, round: u32, previous_bonus: bool, previous_perfect: bool) -> bool {
        match self {
            BonusRule::Chain => {
                round == BONUS_UNLOCK_ROUND
                    || (round >= BONUS_CHAIN_START && previous_bonus && previous_perfect)
            }
            BonusRule::Disabled => false,
        }
    }
}

/// One scored input of the active round.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RecordedInput<I> {
    pub cue: CueType,
    pub expected: CueType,
    pub held: Duration,
    pub at: I,
    pub judgement: Judgement,
}

/// Snapshot of a finished round.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RoundSummary {
    pub round: u32,
    pub cues: usize,
    pub is_bonus: bool,
    pub perfect: bool,
    pub score: u32,
}

/// State of one game from the first round to game over.
#[derive(Clone, Debug)]
pub struct RoundSession<I, S = Scoring> {
    phase: GamePhase,
    score: u32,
    high_score: u32,
    round: u32,
    sequence: Option<Sequence>,
    inputs: Vec<RecordedInput<I>, MAX_SEQUENCE_LEN>,
    round_was_perfect: bool,
    scoring: S,
    bonus_rule: BonusRule,
    miss_penalty: u32,
}

impl<I, S> RoundSession<I, S>
where
    I: Copy,
    S: ScoringPolicy,
{
    /// Creates a session in [`GamePhase::Menu`] with the default miss penalty.
    #[must_use]
    pub const fn new(scoring: S, bonus_rule: BonusRule) -> Self {
        Self {
            phase: GamePhase::Menu,
            score: 0,
            high_score: 0,
            round: 0,
            sequence: None,
            inputs: Vec::new(),
            round_was_perfect: true,
            scoring,
            bonus_rule,
            miss_penalty: MISS_PENALTY,
        }
    }

    /// Overrides the points deducted per miss.
    #[must_use]
    pub const fn with_miss_penalty(mut self, points: u32) -> Self {
        self.miss_penalty = points;
        self
    }

    /// Returns to the menu, clearing everything except the high score.
    pub fn reset(&mut self) {
        self.phase = GamePhase::Menu;
        self.score = 0;
        self.round = 0;
        self.sequence = None;
        self.inputs.clear();
        self.round_was_perfect = true;
        self.scoring.reset();
    }

    /// Moves to `next` when the edge is legal.
    pub fn transition_to(&mut self, next: GamePhase) -> Result<(), TransitionError> {
        if !self.phase.can_transition_to(next) {
            return Err(TransitionError::new(self.phase, next));
        }
        self.phase = next;
        Ok(())
    }

    /// Advances to the next round and generates its sequence.
    pub fn start_new_round<R: RngCore>(
        &mut self,
        generator: &mut SequenceGenerator<R>,
    ) -> Result<&Sequence, TransitionError> {
        self.ensure_can_start()?;

        let round = self.round.saturating_add(1);
        let previous_bonus = self.sequence.as_ref().is_some_and(Sequence::is_bonus);
        let previous_perfect = self.round_was_perfect && self.is_round_complete();
        let is_bonus = self
            .bonus_rule
            .is_bonus(round, previous_bonus, previous_perfect);

        let sequence = generator.generate(round, is_bonus);
        self.start_round_with(sequence)
    }

    /// Starts a round that plays a caller-built sequence, e.g. a practice drill.
    ///
    /// The session adopts the sequence's round number and bonus flag.
    pub fn start_round_with(&mut self, sequence: Sequence) -> Result<&Sequence, TransitionError> {
        self.ensure_can_start()?;

        self.phase = GamePhase::PlayingPattern;
        self.round = sequence.round();
        self.inputs.clear();
        self.round_was_perfect = true;
        Ok(self.sequence.insert(sequence))
    }

    fn ensure_can_start(&self) -> Result<(), TransitionError> {
        if self.phase.can_transition_to(GamePhase::PlayingPattern) {
            Ok(())
        } else {
            Err(TransitionError::new(self.phase, GamePhase::PlayingPattern))
        }
    }

    /// Opens the input window once playback has finished.
    pub fn open_input_window(&mut self) -> Result<(), TransitionError> {
        self.transition_to(GamePhase::WaitingForInput)
    }

    /// Scores a release against the next expected cue.
    ///
    /// Misses deduct the miss penalty (never below zero) and spoil the
    /// perfect flag. The last input of the round moves the phase to
    /// [`GamePhase::RoundCorrect`] regardless of how it scored.
    pub fn record_input(
        &mut self,
        cue: CueType,
        held: Duration,
        at: I,
    ) -> Result<Judgement, InputRejected> {
        if !self.phase.accepts_input() {
            return Err(InputRejected::WrongPhase(self.phase));
        }

        debug_assert!(
            self.sequence.is_some(),
            "input window open without an active sequence"
        );
        let Some(sequence) = self.sequence.as_ref() else {
            return Err(InputRejected::NoSequence);
        };
        let total = sequence.len();
        let Some(expected) = sequence.get(self.inputs.len()) else {
            return Err(InputRejected::RoundComplete);
        };

        let judgement = self.scoring.judge(cue, expected, held);
        match judgement {
            Judgement::Hit { points, .. } => self.add_points(points),
            Judgement::Miss => {
                self.round_was_perfect = false;
                self.apply_penalty(self.miss_penalty);
            }
        }

        self.inputs
            .push(RecordedInput {
                cue,
                expected,
                held,
                at,
                judgement,
            })
            .map_err(|_| InputRejected::RoundComplete)?;

        if self.inputs.len() == total {
            self.phase = GamePhase::RoundCorrect;
        }

        Ok(judgement)
    }

    fn add_points(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
        if self.score > self.high_score {
            self.high_score = self.score;
        }
    }

    /// Deducts `points`, stopping at zero.
    pub fn apply_penalty(&mut self, points: u32) {
        self.score = self.score.saturating_sub(points);
    }

    /// Replaces the in-memory high score, e.g. with the persisted value.
    pub fn set_high_score(&mut self, high_score: u32) {
        self.high_score = high_score;
    }

    /// Returns `true` once every cue of the active sequence has an input.
    #[must_use]
    pub fn is_round_complete(&self) -> bool {
        self.sequence
            .as_ref()
            .is_some_and(|sequence| self.inputs.len() == sequence.len())
    }

    /// Summary of the active round.
    #[must_use]
    pub fn summary(&self) -> Option<RoundSummary> {
        self.sequence.as_ref().map(|sequence| RoundSummary {
            round: self.round,
            cues: sequence.len(),
            is_bonus: sequence.is_bonus(),
            perfect: self.round_was_perfect,
            score: self.score,
        })
    }

    /// Cue the next input will be scored against.
    #[must_use]
    pub fn expected_cue(&self) -> Option<CueType> {
        self.sequence
            .as_ref()
            .and_then(|sequence| sequence.get(self.inputs.len()))
    }

    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.phase
    }

    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub const fn high_score(&self) -> u32 {
        self.high_score
    }

    /// Current round number, zero before the first round.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    #[must_use]
    pub const fn sequence(&self) -> Option<&Sequence> {
        self.sequence.as_ref()
    }

    #[must_use]
    pub fn inputs(&self) -> &[RecordedInput<I>] {
        &self.inputs
    }

    /// `false` once any input of the active round missed.
    #[must_use]
    pub const fn round_was_perfect(&self) -> bool {
        self.round_was_perfect
    }

    #[must_use]
    pub fn is_bonus_round(&self) -> bool {
        self.sequence.as_ref().is_some_and(Sequence::is_bonus)
    }

    #[must_use]
    pub const fn bonus_rule(&self) -> BonusRule {
        self.bonus_rule
    }

    #[must_use]
    pub const fn miss_penalty(&self) -> u32 {
        self.miss_penalty
    }

    #[must_use]
    pub const fn scoring(&self) -> &S {
        &self.scoring
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{FlatScoring, ScoreTier};
    use rand::rngs::mock::StepRng;

    type TestSession = RoundSession<u64>;

    fn session() -> TestSession {
        RoundSession::new(Scoring::default(), BonusRule::Chain)
    }

    fn generator() -> SequenceGenerator<StepRng> {
        SequenceGenerator::new(StepRng::new(3, 0x5851_F42D_4C95_7F2D))
    }

    fn play_round(session: &mut TestSession, perfect: bool) {
        session.open_input_window().unwrap();
        let cues: heapless::Vec<CueType, MAX_SEQUENCE_LEN> =
            session.sequence().unwrap().cues().iter().copied().collect();
        for (index, cue) in cues.iter().enumerate() {
            let held = if !perfect && index == 0 {
                cue.target_hold() + Duration::from_secs(1)
            } else {
                cue.target_hold()
            };
            session.record_input(*cue, held, 0).unwrap();
        }
    }

    #[test]
    fn legal_transitions_follow_round_lifecycle() {
        use GamePhase::{
            BonusUnlocked, GameOver, Menu, PlayingPattern, RoundCorrect, WaitingForInput,
        };
        assert!(Menu.can_transition_to(PlayingPattern));
        assert!(PlayingPattern.can_transition_to(WaitingForInput));
        assert!(WaitingForInput.can_transition_to(RoundCorrect));
        assert!(RoundCorrect.can_transition_to(BonusUnlocked));
        assert!(BonusUnlocked.can_transition_to(PlayingPattern));
        assert!(GameOver.can_transition_to(PlayingPattern));
        assert!(WaitingForInput.can_transition_to(Menu));

        assert!(!Menu.can_transition_to(WaitingForInput));
        assert!(!PlayingPattern.can_transition_to(RoundCorrect));
        assert!(!GameOver.can_transition_to(WaitingForInput));
        assert!(!WaitingForInput.can_transition_to(PlayingPattern));
    }

    #[test]
    fn illegal_transition_is_rejected_without_change() {
        let mut session = session();
        let error = session.transition_to(GamePhase::RoundCorrect).unwrap_err();
        assert_eq!(
            error,
            TransitionError::new(GamePhase::Menu, GamePhase::RoundCorrect)
        );
        assert_eq!(session.phase(), GamePhase::Menu);
    }

    #[test]
    fn start_new_round_resets_round_state() {
        let mut session = session();
        let mut generator = generator();

        let length = session.start_new_round(&mut generator).unwrap().len();
        assert_eq!(length, 3);
        assert_eq!(session.round(), 1);
        assert_eq!(session.phase(), GamePhase::PlayingPattern);
        assert!(session.round_was_perfect());
        assert!(session.inputs().is_empty());
        assert!(!session.is_round_complete());
    }

    #[test]
    fn input_outside_window_is_rejected() {
        let mut session = session();
        let mut generator = generator();
        assert_eq!(
            session.record_input(CueType::Short, Duration::ZERO, 0),
            Err(InputRejected::WrongPhase(GamePhase::Menu))
        );

        session.start_new_round(&mut generator).unwrap();
        assert_eq!(
            session.record_input(CueType::Short, Duration::ZERO, 0),
            Err(InputRejected::WrongPhase(GamePhase::PlayingPattern))
        );
    }

    #[test]
    fn round_completes_on_last_input_and_stays_complete() {
        let mut session = session();
        let mut generator = generator();
        session.start_new_round(&mut generator).unwrap();
        session.open_input_window().unwrap();

        let cues: heapless::Vec<CueType, MAX_SEQUENCE_LEN> =
            session.sequence().unwrap().cues().iter().copied().collect();
        let (last, leading) = cues.split_last().unwrap();
        for cue in leading {
            session.record_input(*cue, cue.target_hold(), 1).unwrap();
            assert!(!session.is_round_complete());
        }

        session.record_input(*last, last.target_hold(), 2).unwrap();
        assert!(session.is_round_complete());
        assert_eq!(session.phase(), GamePhase::RoundCorrect);
        assert_eq!(
            session.record_input(*last, last.target_hold(), 3),
            Err(InputRejected::WrongPhase(GamePhase::RoundCorrect))
        );
        assert!(session.is_round_complete());
        assert_eq!(session.score(), 30);
        assert_eq!(session.high_score(), 30);
    }

    #[test]
    fn misses_never_drive_score_negative() {
        let mut session = session();
        let mut generator = generator();
        session.start_new_round(&mut generator).unwrap();
        session.open_input_window().unwrap();

        let expected = session.expected_cue().unwrap();
        let judgement = session
            .record_input(expected, expected.target_hold(), 0)
            .unwrap();
        assert_eq!(judgement, Judgement::hit(ScoreTier::Perfect));

        while session.phase() == GamePhase::WaitingForInput {
            let judgement = session
                .record_input(CueType::Long, Duration::ZERO, 0)
                .unwrap();
            assert!(judgement.is_miss());
        }

        assert_eq!(session.score(), 0);
        assert_eq!(session.high_score(), 10);
        assert!(!session.round_was_perfect());

        session.apply_penalty(u32::MAX);
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn bonus_chain_requires_perfect_bonus_rounds() {
        let mut session = session();
        let mut generator = generator();

        for round in 1..=4 {
            session.start_new_round(&mut generator).unwrap();
            assert!(!session.is_bonus_round(), "round {round}");
            play_round(&mut session, round != 3);
        }

        session.start_new_round(&mut generator).unwrap();
        assert!(session.is_bonus_round());
        play_round(&mut session, true);

        session.start_new_round(&mut generator).unwrap();
        assert!(session.is_bonus_round());
        play_round(&mut session, false);

        session.start_new_round(&mut generator).unwrap();
        assert_eq!(session.round(), 7);
        assert!(!session.is_bonus_round());
    }

    #[test]
    fn disabled_bonus_rule_never_flags_rounds() {
        let mut session: TestSession =
            RoundSession::new(Scoring::Flat(FlatScoring), BonusRule::Disabled);
        let mut generator = generator();

        for _ in 0..7 {
            session.start_new_round(&mut generator).unwrap();
            assert!(!session.is_bonus_round());
            play_round(&mut session, true);
        }
    }

    #[test]
    fn reset_keeps_high_score_only() {
        let mut session = session().with_miss_penalty(2);
        let mut generator = generator();
        session.start_new_round(&mut generator).unwrap();
        play_round(&mut session, true);
        let best = session.high_score();

        session.reset();
        assert_eq!(session.phase(), GamePhase::Menu);
        assert_eq!(session.score(), 0);
        assert_eq!(session.round(), 0);
        assert!(session.sequence().is_none());
        assert_eq!(session.high_score(), best);
        assert_eq!(session.miss_penalty(), 2);
    }

    #[test]
    fn drill_sequence_is_played_as_given() {
        let mut session = session();
        let drill = Sequence::from_cues(9, false, &[CueType::Long, CueType::Long]).unwrap();
        session.start_round_with(drill).unwrap();
        assert_eq!(session.round(), 9);
        assert_eq!(session.expected_cue(), Some(CueType::Long));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "without an active sequence")]
    fn input_without_sequence_is_a_logic_error() {
        let mut session = session();
        session.transition_to(GamePhase::PlayingPattern).unwrap();
        session.transition_to(GamePhase::WaitingForInput).unwrap();
        let _ = session.record_input(CueType::Short, Duration::ZERO, 0);
    }
}
