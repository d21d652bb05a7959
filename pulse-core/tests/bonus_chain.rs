mod common;

use core::time::Duration;

use common::harness;
use pulse_core::config::GameConfig;
use pulse_core::events::GameEvent;
use pulse_core::orchestrator::{GameOverCause, TransitionAction};
use pulse_core::services::{FeedbackSignal, ScoreStore};
use pulse_core::session::GamePhase;
use pulse_core::time::GameInstant;

#[test]
fn perfect_rounds_five_through_eight_chain_bonus_rounds() {
    let mut game = harness(GameConfig::bonus_chain());
    game.start();

    let mut bonus_flags = Vec::new();
    for round in 1..=8 {
        assert_eq!(game.game.round(), round);
        bonus_flags.push(game.game.session().is_bonus_round());

        game.play_round(&[]);
        let expected_phase = if round == 5 {
            GamePhase::BonusUnlocked
        } else {
            GamePhase::RoundCorrect
        };
        assert_eq!(game.game.phase(), expected_phase, "round {round}");
        game.fire_pending();
    }

    assert_eq!(
        bonus_flags,
        [false, false, false, false, true, true, true, true]
    );
    assert_eq!(game.game.round(), 9);
    assert!(game.game.session().is_bonus_round());
    assert_eq!(game.game.phase(), GamePhase::PlayingPattern);
}

#[test]
fn delay_depends_on_round_outcome() {
    let mut game = harness(GameConfig::bonus_chain());
    game.start();

    let mut delays = Vec::new();
    for _ in 1..=6 {
        game.play_round(&[]);
        let pending = *game.game.pending_transition().expect("next round scheduled");
        assert_eq!(pending.action, TransitionAction::StartRound);
        let resolved_at = game
            .game
            .session()
            .inputs()
            .last()
            .expect("round answered")
            .at;
        delays.push(pending.due.saturating_duration_since(resolved_at));
        game.fire_pending();
    }

    let second = Duration::from_secs(1);
    assert_eq!(
        delays,
        [
            second,
            second,
            second,
            second,
            Duration::from_secs(2),
            Duration::from_millis(600),
        ]
    );
}

#[test]
fn miss_in_round_seven_ends_the_game() {
    let mut game = harness(GameConfig::bonus_chain());
    game.start();

    for _ in 1..=6 {
        game.play_round(&[]);
        game.fire_pending();
    }
    assert_eq!(game.game.round(), 7);
    assert!(game.game.session().is_bonus_round());

    let judgements = game.play_round(&[1]);
    assert_eq!(judgements.len(), 9, "bonus-chain misses do not cut the round short");
    assert!(judgements[1].is_miss());

    assert_eq!(game.game.phase(), GamePhase::GameOver);
    assert_eq!(game.game.round(), 7);
    assert_eq!(
        game.game.game_over_cause(),
        Some(GameOverCause::ChainBroken)
    );
    assert!(game.game.pending_transition().is_none());

    let score = game.game.score();
    assert!(score > 0);
    assert!(
        game.game
            .events()
            .oldest_first()
            .any(|record| record.event == GameEvent::HighScoreSaved { score })
    );
    assert_eq!(game.game.store_mut().high_score(), Ok(score));
}

#[test]
fn miss_before_the_bonus_chain_only_costs_points() {
    let mut game = harness(GameConfig::bonus_chain());
    game.start();

    game.play_round(&[]);
    game.fire_pending();
    game.play_round(&[]);
    game.fire_pending();

    let judgements = game.play_round(&[0]);
    assert!(judgements[0].is_miss());
    assert_eq!(game.game.phase(), GamePhase::RoundCorrect);
    assert!(!game.game.session().round_was_perfect());
    assert_eq!(game.game.score(), 30 + 40 + 40 - 5);
    assert!(
        game.game
            .feedback()
            .signals
            .contains(&FeedbackSignal::Error)
    );

    game.fire_pending();
    assert_eq!(game.game.round(), 4);
    assert_eq!(game.game.phase(), GamePhase::PlayingPattern);
    assert!(!game.game.session().is_bonus_round());

    let store = game.game.store_mut();
    assert_eq!(store.total_patterns(), Ok(3 + 4 + 5));
    assert_eq!(store.games_played(), Ok(1));
}

#[test]
fn imperfect_unlock_round_skips_bonus_and_round_six_decides() {
    let mut game = harness(GameConfig::bonus_chain());
    game.start();

    for _ in 1..=4 {
        game.play_round(&[]);
        game.fire_pending();
    }

    game.play_round(&[2]);
    assert_eq!(game.game.phase(), GamePhase::RoundCorrect);
    game.fire_pending();
    assert_eq!(game.game.round(), 6);
    assert!(!game.game.session().is_bonus_round());

    game.play_round(&[0]);
    assert_eq!(game.game.phase(), GamePhase::GameOver);
    assert_eq!(game.game.round(), 6);
}
