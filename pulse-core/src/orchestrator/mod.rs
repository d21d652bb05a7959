//! Round controller driving the session, the playback device and persistence.
//!
//! The orchestrator is a deadline-driven state machine. It never blocks or
//! sleeps: hosts feed it button edges, playback completions and periodic
//! [`RoundOrchestrator::poll`] calls, each stamped with the current instant,
//! and use [`RoundOrchestrator::next_deadline`] to decide when to poll next.
//!
//! Every round instance gets a fresh generation number. Playback tickets and
//! delayed transitions carry the generation they were issued for, so anything
//! that arrives after the game moved on is dropped instead of acted upon.

use rand::RngCore;

use crate::config::{GameConfig, IdlePenalty};
use crate::cues::CueType;
use crate::events::{EventLog, GameEvent, IgnoreReason};
use crate::fmt::millis;
use crate::matcher::{Judgement, ScoringMode, ScoringPolicy};
use crate::sequence::SequenceGenerator;
use crate::services::{
    CuePlayback, Feedback, FeedbackSignal, PlaybackTicket, ScoreStore, StoreError,
};
use crate::session::{BONUS_CHAIN_START, BONUS_UNLOCK_ROUND, GamePhase, RoundSession};
use crate::time::GameInstant;

mod popup;
mod schedule;

pub use popup::{PopupId, PopupTracker, ScorePopup};
pub use schedule::{PendingTransition, TransitionAction};

/// How misses and completed rounds decide whether the game continues.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FailurePolicy {
    /// Misses only cost points until round six; from then on an imperfect
    /// round ends the game. Round five unlocks the bonus chain.
    BonusChain,
    /// The first miss ends the game.
    SuddenDeath,
    /// Each miss costs a life; the game ends when none remain.
    Lives(u8),
}

impl FailurePolicy {
    /// Lives at the start of a game, if the policy counts them.
    ///
    /// A zero-life configuration still grants one life.
    #[must_use]
    pub const fn starting_lives(self) -> Option<u8> {
        match self {
            FailurePolicy::Lives(0) => Some(1),
            FailurePolicy::Lives(lives) => Some(lives),
            FailurePolicy::BonusChain | FailurePolicy::SuddenDeath => None,
        }
    }
}

/// Why a game ended.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GameOverCause {
    /// An imperfect round at or after round six.
    ChainBroken,
    SuddenDeath,
    OutOfLives,
    /// The configured final round was cleared.
    Victory,
}

impl GameOverCause {
    #[must_use]
    pub const fn is_victory(self) -> bool {
        matches!(self, GameOverCause::Victory)
    }
}

/// What follows a completed round.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RoundVerdict {
    /// Perfect round five: announce the bonus chain, then continue.
    UnlockBonus,
    /// Perfect round six or later: continue after the short chain delay.
    ContinueBonusChain,
    NextRound,
    Victory,
    GameOver,
}

/// Decides the post-round branch for a completed round.
///
/// Under [`FailurePolicy::BonusChain`] an imperfect round at or after
/// [`BONUS_CHAIN_START`] ends the game before the final round is considered.
/// The other policies end games on misses, so their completed rounds always
/// advance.
#[must_use]
pub fn decide_round(
    policy: FailurePolicy,
    round: u32,
    perfect: bool,
    final_round: Option<u32>,
) -> RoundVerdict {
    let chain_broken =
        matches!(policy, FailurePolicy::BonusChain) && !perfect && round >= BONUS_CHAIN_START;
    if chain_broken {
        return RoundVerdict::GameOver;
    }

    if final_round.is_some_and(|last| round >= last) {
        return RoundVerdict::Victory;
    }

    match policy {
        FailurePolicy::BonusChain if perfect && round == BONUS_UNLOCK_ROUND => {
            RoundVerdict::UnlockBonus
        }
        FailurePolicy::BonusChain if perfect && round >= BONUS_CHAIN_START => {
            RoundVerdict::ContinueBonusChain
        }
        _ => RoundVerdict::NextRound,
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct ActiveHold<I> {
    cue: CueType,
    started: I,
}

/// Drives a game from the menu through rounds to game over.
pub struct RoundOrchestrator<I, R, P, S, F>
where
    I: GameInstant,
{
    config: GameConfig,
    session: RoundSession<I>,
    generator: SequenceGenerator<R>,
    playback: P,
    store: S,
    feedback: F,
    generation: u32,
    playback_ticket: Option<PlaybackTicket>,
    pending: Option<PendingTransition<I>>,
    hold: Option<ActiveHold<I>>,
    window_opened_at: Option<I>,
    idle_since: Option<I>,
    lives: Option<u8>,
    game_over: Option<GameOverCause>,
    popups: PopupTracker<I>,
    events: EventLog<I>,
}

impl<I, R, P, S, F> RoundOrchestrator<I, R, P, S, F>
where
    I: GameInstant,
    R: RngCore,
    P: CuePlayback,
    S: ScoreStore,
    F: Feedback,
{
    /// Creates an orchestrator sitting in the menu.
    pub fn new(config: GameConfig, rng: R, playback: P, store: S, feedback: F) -> Self {
        let session = RoundSession::new(config.scoring_policy(), config.bonus_rule())
            .with_miss_penalty(config.miss_penalty);

        Self {
            config,
            session,
            generator: SequenceGenerator::new(rng),
            playback,
            store,
            feedback,
            generation: 0,
            playback_ticket: None,
            pending: None,
            hold: None,
            window_opened_at: None,
            idle_since: None,
            lives: config.failure.starting_lives(),
            game_over: None,
            popups: PopupTracker::new(),
            events: EventLog::new(),
        }
    }

    /// Starts a fresh game and its first round.
    pub fn start_game(&mut self, now: I) {
        self.cancel_pending();
        self.session.reset();
        self.reload_high_score(now);
        if let Err(error) = self.store.record_game_played() {
            self.store_failed(error, now);
        }

        self.lives = self.config.failure.starting_lives();
        self.game_over = None;
        self.events.record(GameEvent::GameStarted, now);
        info!(
            "orchestrator: game started high={} lives={}",
            self.session.high_score(),
            self.lives.unwrap_or(0)
        );

        self.start_new_round(now);
    }

    /// Same as [`RoundOrchestrator::start_game`].
    pub fn restart_game(&mut self, now: I) {
        self.start_game(now);
    }

    /// Abandons the game and returns to the menu.
    pub fn return_to_menu(&mut self, now: I) {
        self.cancel_pending();
        self.session.reset();
        self.game_over = None;
        self.events.record(GameEvent::ReturnedToMenu, now);
        info!("orchestrator: returned to menu");
    }

    /// Begins the next round and hands its sequence to the playback device.
    ///
    /// Ignored while a round is still playing back or collecting input.
    pub fn start_new_round(&mut self, now: I) {
        let phase = self.session.phase();
        if !phase.can_transition_to(GamePhase::PlayingPattern) {
            warn!("orchestrator: cannot start a round while {}", phase);
            return;
        }

        self.generation = self.generation.wrapping_add(1);
        self.pending = None;
        self.playback_ticket = None;
        self.hold = None;
        self.window_opened_at = None;
        self.idle_since = None;

        let sequence = match self.session.start_new_round(&mut self.generator) {
            Ok(sequence) => sequence,
            Err(error) => {
                warn!(
                    "orchestrator: cannot start a round while {}",
                    error.from
                );
                return;
            }
        };

        let ticket = PlaybackTicket::new(self.generation, sequence.round());
        info!(
            "orchestrator: round {} started cues={} bonus={}",
            sequence.round(),
            sequence.len(),
            sequence.is_bonus()
        );
        self.events.record(
            GameEvent::RoundStarted {
                round: sequence.round(),
                cues: sequence.len(),
                is_bonus: sequence.is_bonus(),
            },
            now,
        );
        self.playback.play(sequence, ticket);
        self.playback_ticket = Some(ticket);
    }

    /// Opens the input window when `ticket` names the playback still awaited.
    pub fn on_playback_complete(&mut self, ticket: PlaybackTicket, now: I) {
        let awaited = self.playback_ticket == Some(ticket)
            && self.session.phase() == GamePhase::PlayingPattern;
        if !awaited {
            debug!(
                "orchestrator: stale playback completion generation={} current={}",
                ticket.generation(),
                self.generation
            );
            self.events.record(GameEvent::StalePlayback(ticket), now);
            return;
        }

        self.playback_ticket = None;
        if let Err(error) = self.session.open_input_window() {
            warn!("orchestrator: cannot open input window from {}", error.from);
            return;
        }

        self.window_opened_at = Some(now);
        self.idle_since = Some(now);
        self.events.record(
            GameEvent::InputWindowOpened {
                round: self.session.round(),
            },
            now,
        );
    }

    /// Starts timing a hold and acknowledges it on the device.
    pub fn on_input_down(&mut self, cue: CueType, now: I) {
        let phase = self.session.phase();
        if !phase.accepts_input() {
            self.ignore_input(IgnoreReason::WrongPhase(phase), now);
            return;
        }
        if self.hold.is_some() {
            self.ignore_input(IgnoreReason::AlreadyHolding, now);
            return;
        }

        self.hold = Some(ActiveHold { cue, started: now });
        self.idle_since = None;
        self.playback.play_immediate(cue);
        trace!("orchestrator: {} pressed", cue);
    }

    /// Ends the hold in progress, scores it and reacts to the outcome.
    ///
    /// The cue pressed down is the one scored; a release reported for a
    /// different button still ends that hold.
    pub fn on_input_up(&mut self, cue: CueType, now: I) -> Option<Judgement> {
        let phase = self.session.phase();
        if !phase.accepts_input() {
            self.ignore_input(IgnoreReason::WrongPhase(phase), now);
            return None;
        }
        let Some(hold) = self.hold.take() else {
            self.ignore_input(IgnoreReason::NotHolding, now);
            return None;
        };
        if hold.cue != cue {
            debug!("orchestrator: {} released while holding {}", cue, hold.cue);
        }

        let held = now.saturating_duration_since(hold.started);
        self.idle_since = Some(now);

        let judgement = match self.session.record_input(hold.cue, held, now) {
            Ok(judgement) => judgement,
            Err(rejection) => {
                self.ignore_input(rejection.into(), now);
                return None;
            }
        };

        debug!(
            "orchestrator: {} held {}ms -> {}",
            hold.cue,
            millis(held),
            judgement
        );
        self.popups
            .show(judgement, now + self.config.popup_lifetime);
        self.events.record(
            GameEvent::InputScored {
                cue: hold.cue,
                judgement,
            },
            now,
        );

        if judgement.is_miss() {
            self.feedback.signal(FeedbackSignal::Error);
            if let Some(cause) = self.register_miss(now) {
                self.end_game(now, cause);
                return Some(judgement);
            }
        }

        if self.session.is_round_complete() {
            self.resolve_round(now);
        }

        Some(judgement)
    }

    fn register_miss(&mut self, now: I) -> Option<GameOverCause> {
        match self.config.failure {
            FailurePolicy::BonusChain => None,
            FailurePolicy::SuddenDeath => Some(GameOverCause::SuddenDeath),
            FailurePolicy::Lives(_) => {
                let remaining = self.lives.map_or(0, |lives| lives.saturating_sub(1));
                self.lives = Some(remaining);
                self.events.record(GameEvent::LifeLost { remaining }, now);
                (remaining == 0).then_some(GameOverCause::OutOfLives)
            }
        }
    }

    /// Applies the post-round branch to a just-completed round.
    ///
    /// Does nothing unless the round is complete and not yet resolved.
    pub fn resolve_round(&mut self, now: I) -> Option<RoundVerdict> {
        if self.session.phase() != GamePhase::RoundCorrect || self.pending.is_some() {
            return None;
        }
        let summary = self.session.summary()?;
        let verdict = decide_round(
            self.config.failure,
            summary.round,
            summary.perfect,
            self.config.final_round,
        );

        info!(
            "orchestrator: round {} complete perfect={} score={} -> {}",
            summary.round,
            summary.perfect,
            summary.score,
            verdict
        );
        self.events.record(GameEvent::RoundCompleted(summary), now);
        let cues = u32::try_from(summary.cues).unwrap_or(u32::MAX);
        if let Err(error) = self.store.add_patterns_completed(cues) {
            self.store_failed(error, now);
        }

        let delays = self.config.delays;
        match verdict {
            RoundVerdict::UnlockBonus => {
                self.feedback.signal(FeedbackSignal::Success);
                self.enter(GamePhase::BonusUnlocked);
                self.events.record(
                    GameEvent::BonusUnlocked {
                        round: summary.round,
                    },
                    now,
                );
                self.schedule(now + delays.bonus_unlock, TransitionAction::StartRound);
            }
            RoundVerdict::ContinueBonusChain => {
                self.feedback.signal(FeedbackSignal::Success);
                self.schedule(now + delays.bonus_chain, TransitionAction::StartRound);
            }
            RoundVerdict::NextRound => {
                self.feedback.signal(FeedbackSignal::Success);
                self.schedule(now + delays.next_round, TransitionAction::StartRound);
            }
            RoundVerdict::Victory => {
                self.feedback.signal(FeedbackSignal::Success);
                self.schedule(
                    now + delays.victory,
                    TransitionAction::FinishGame(GameOverCause::Victory),
                );
            }
            RoundVerdict::GameOver => self.end_game(now, GameOverCause::ChainBroken),
        }

        Some(verdict)
    }

    fn schedule(&mut self, due: I, action: TransitionAction) {
        self.pending = Some(PendingTransition::new(self.generation, due, action));
    }

    fn end_game(&mut self, now: I, cause: GameOverCause) {
        self.pending = None;
        self.playback_ticket = None;
        self.hold = None;
        self.idle_since = None;

        self.persist_high_score(now);
        self.enter(GamePhase::GameOver);
        self.game_over = Some(cause);

        let round = self.session.round();
        let score = self.session.score();
        info!(
            "orchestrator: game over {} round={} score={}",
            cause, round, score
        );
        self.events
            .record(GameEvent::GameOver { cause, round, score }, now);
    }

    /// Saves the score when it beats the stored record, then adopts the stored value.
    ///
    /// Storage failures are logged and leave the in-memory high score alone.
    pub fn persist_high_score(&mut self, now: I) {
        let score = self.session.score();
        match self.store.high_score() {
            Ok(stored) if score > stored => match self.store.save_high_score(score) {
                Ok(()) => {
                    info!("orchestrator: new high score {}", score);
                    self.events.record(GameEvent::HighScoreSaved { score }, now);
                }
                Err(error) => self.store_failed(error, now),
            },
            Ok(_) => {}
            Err(error) => self.store_failed(error, now),
        }

        self.reload_high_score(now);
    }

    fn reload_high_score(&mut self, now: I) {
        match self.store.high_score() {
            Ok(stored) => self.session.set_high_score(stored),
            Err(error) => self.store_failed(error, now),
        }
    }

    /// Clears the stored high score and counters.
    pub fn reset_records(&mut self, now: I) {
        match self.store.reset_all() {
            Ok(()) => self.session.set_high_score(0),
            Err(error) => self.store_failed(error, now),
        }
    }

    /// Fires due transitions, expires popups and applies the idle penalty.
    pub fn poll(&mut self, now: I) {
        if let Some(pending) = self.pending
            && pending.is_due(now)
        {
            self.pending = None;
            if pending.is_stale(self.generation) {
                debug!(
                    "orchestrator: dropping stale transition generation={}",
                    pending.generation
                );
            } else {
                match pending.action {
                    TransitionAction::StartRound => self.start_new_round(now),
                    TransitionAction::FinishGame(cause) => self.end_game(now, cause),
                }
            }
        }

        if let Some(id) = self.popups.expire(now) {
            trace!("orchestrator: popup {} expired", id);
        }

        self.apply_idle_penalty(now);
    }

    fn apply_idle_penalty(&mut self, now: I) {
        let Some(deadline) = self.idle_deadline() else {
            return;
        };
        if now < deadline {
            return;
        }
        let Some(penalty) = self.active_idle_penalty() else {
            return;
        };

        self.session.apply_penalty(penalty.points());
        self.idle_since = Some(now);
        self.feedback.signal(FeedbackSignal::Warning);
        warn!(
            "orchestrator: idle penalty -{} score={}",
            penalty.points(),
            self.session.score()
        );
        self.events.record(
            GameEvent::IdlePenalty {
                points: penalty.points(),
            },
            now,
        );
    }

    fn active_idle_penalty(&self) -> Option<IdlePenalty> {
        self.config.idle_penalty.filter(IdlePenalty::is_enabled)
    }

    fn idle_deadline(&self) -> Option<I> {
        if !self.session.phase().accepts_input() || self.hold.is_some() {
            return None;
        }
        let penalty = self.active_idle_penalty()?;
        self.idle_since.map(|since| since + penalty.after())
    }

    /// Earliest instant at which [`RoundOrchestrator::poll`] has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<I> {
        [
            self.pending.map(|pending| pending.due),
            self.popups.next_expiry(),
            self.idle_deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Hides the score popup if `id` still names it.
    pub fn dismiss_popup(&mut self, id: PopupId) -> bool {
        self.popups.dismiss(id)
    }

    fn cancel_pending(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.pending = None;
        self.playback_ticket = None;
        self.hold = None;
        self.window_opened_at = None;
        self.idle_since = None;
        self.popups.clear();
        self.playback.stop();
    }

    fn enter(&mut self, phase: GamePhase) {
        if let Err(error) = self.session.transition_to(phase) {
            warn!(
                "orchestrator: illegal transition {} -> {}",
                error.from, error.to
            );
        }
    }

    fn ignore_input(&mut self, reason: IgnoreReason, now: I) {
        debug!("orchestrator: input ignored {}", reason);
        self.events.record(GameEvent::InputIgnored(reason), now);
    }

    fn store_failed(&mut self, error: StoreError, now: I) {
        warn!("orchestrator: score store failed: {}", error);
        self.events.record(GameEvent::StoreFailed(error), now);
    }

    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub const fn failure_policy(&self) -> FailurePolicy {
        self.config.failure
    }

    #[must_use]
    pub fn scoring_mode(&self) -> ScoringMode {
        self.session.scoring().mode()
    }

    #[must_use]
    pub const fn session(&self) -> &RoundSession<I> {
        &self.session
    }

    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.session.phase()
    }

    #[must_use]
    pub const fn score(&self) -> u32 {
        self.session.score()
    }

    #[must_use]
    pub const fn high_score(&self) -> u32 {
        self.session.high_score()
    }

    #[must_use]
    pub const fn round(&self) -> u32 {
        self.session.round()
    }

    /// Lives left under [`FailurePolicy::Lives`].
    #[must_use]
    pub const fn lives_remaining(&self) -> Option<u8> {
        self.lives
    }

    #[must_use]
    pub const fn game_over_cause(&self) -> Option<GameOverCause> {
        self.game_over
    }

    /// Current round instance; bumps on every round start and cancellation.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Ticket of the playback the orchestrator is waiting on.
    #[must_use]
    pub const fn awaited_playback(&self) -> Option<PlaybackTicket> {
        self.playback_ticket
    }

    #[must_use]
    pub const fn pending_transition(&self) -> Option<&PendingTransition<I>> {
        self.pending.as_ref()
    }

    #[must_use]
    pub const fn input_window_opened_at(&self) -> Option<I> {
        self.window_opened_at
    }

    #[must_use]
    pub const fn is_holding(&self) -> bool {
        self.hold.is_some()
    }

    #[must_use]
    pub const fn active_popup(&self) -> Option<&ScorePopup<I>> {
        self.popups.active()
    }

    #[must_use]
    pub const fn events(&self) -> &EventLog<I> {
        &self.events
    }

    #[must_use]
    pub const fn playback(&self) -> &P {
        &self.playback
    }

    pub fn playback_mut(&mut self) -> &mut P {
        &mut self.playback
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    #[must_use]
    pub const fn feedback(&self) -> &F {
        &self.feedback
    }
}
