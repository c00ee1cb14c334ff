mod common;

use std::time::{Duration, Instant};

use common::{Faulty, Hung, Misbehaviour, Overlapping, Sleepy, Sweeper};
use fleetmatch::controller::{OpponentView, ShotContext};
use fleetmatch::{
    Configuration, ControllerFailure, ControllerRegister, Elimination, Event, Match, PlayerEvent,
    PlayerId, RoundEvent, RoundId, RoundMode, TimeoutPolicy, SELECT_SHOT,
};

fn small(policy: TimeoutPolicy) -> Configuration {
    small_with_deadline(policy, Duration::from_millis(50))
}

fn small_with_deadline(policy: TimeoutPolicy, deadline: Duration) -> Configuration {
    Configuration::new()
        .with_field(6, 6)
        .with_ship_sizes([2, 3])
        .with_controller_timeout(deadline)
        .with_timeout_policy(policy)
        .with_rounds(RoundMode::AllRounds, 1)
}

fn shot_context() -> ShotContext {
    ShotContext {
        player: PlayerId(0),
        round: RoundId(0),
        width: 6,
        height: 6,
        opponents: vec![OpponentView {
            id: PlayerId(1),
            active: true,
            hits: vec![],
            misses: vec![],
            sunk: vec![],
            ship_lengths_remaining: vec![2],
        }],
    }
}

fn timeouts(game: &Match) -> Vec<(PlayerId, String)> {
    game.events()
        .filter_map(|e| match e {
            Event::Player(PlayerEvent::TimedOut { player, method }) => {
                Some((*player, method.clone()))
            }
            _ => None,
        })
        .collect()
}

fn faults(game: &Match) -> usize {
    game.events()
        .filter(|e| matches!(e, Event::Player(PlayerEvent::Faulted { .. })))
        .count()
}

fn eliminations(game: &Match) -> Vec<(PlayerId, Elimination)> {
    game.events()
        .filter_map(|e| match e {
            Event::Round(RoundEvent::PlayerEliminated { player, cause, .. }) => {
                Some((*player, *cause))
            }
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn slow_call_returns_within_deadline() {
    let register = ControllerRegister::new(
        PlayerId(0),
        Box::new(Sleepy::new(Duration::from_millis(600), 1)),
        Duration::from_millis(50),
    );
    let started = Instant::now();
    let result = register.request_move(shot_context()).await;
    let elapsed = started.elapsed();
    assert_eq!(result, Err(ControllerFailure::Timeout { method: SELECT_SHOT }));
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_millis(400), "took {:?}", elapsed);
}

#[tokio::test]
async fn next_call_waits_for_abandoned_call_within_its_deadline() {
    let register = ControllerRegister::new(
        PlayerId(0),
        Box::new(Sleepy::new(Duration::from_millis(130), 1)),
        Duration::from_millis(100),
    );
    assert_eq!(
        register.request_move(shot_context()).await,
        Err(ControllerFailure::Timeout { method: SELECT_SHOT })
    );
    // The stalled call frees the controller well before this call's deadline.
    let shot = register.request_move(shot_context()).await.unwrap();
    assert_eq!(shot.receiver(), PlayerId(1));
}

#[tokio::test]
async fn notify_skips_a_busy_controller() {
    let register = ControllerRegister::new(
        PlayerId(0),
        Box::new(Hung::new()),
        Duration::from_millis(50),
    );
    assert_eq!(
        register.request_move(shot_context()).await,
        Err(ControllerFailure::Timeout { method: SELECT_SHOT })
    );
    let started = Instant::now();
    register.notify(Vec::new()).await;
    assert!(started.elapsed() < Duration::from_millis(50), "took {:?}", started.elapsed());
}

#[tokio::test]
async fn fast_call_passes_through() {
    let register = ControllerRegister::new(
        PlayerId(0),
        Box::new(Sweeper::new("quick")),
        Duration::from_millis(200),
    );
    let shot = register.request_move(shot_context()).await.unwrap();
    assert_eq!(shot.receiver(), PlayerId(1));
    assert_eq!(register.name(), "quick");
}

#[tokio::test]
async fn panicking_controller_is_a_fault() {
    let register = ControllerRegister::new(
        PlayerId(0),
        Box::new(Faulty::new(Misbehaviour::Panic)),
        Duration::from_millis(200),
    );
    let err = register.request_move(shot_context()).await.unwrap_err();
    assert!(matches!(err, ControllerFailure::Fault { .. }));
    // A poisoned controller remains callable.
    let err = register.request_move(shot_context()).await.unwrap_err();
    assert!(matches!(err, ControllerFailure::Fault { .. }));
}

#[tokio::test]
async fn single_timeout_is_recorded_once_and_play_continues() {
    let mut game = Match::new(small(TimeoutPolicy::Forfeit)).unwrap();
    let slow = game
        .add_player(Box::new(Sleepy::new(Duration::from_millis(200), 1)))
        .unwrap();
    let quick = game.add_player(Box::new(Sweeper::new("quick"))).unwrap();

    assert!(game.play_round().await.unwrap());
    assert_eq!(timeouts(&game), vec![(slow, SELECT_SHOT.to_string())]);
    assert_eq!(game.player(slow).unwrap().timeouts, 1);
    assert_eq!(game.player(quick).unwrap().timeouts, 0);
    assert!(eliminations(&game).is_empty());
    assert!(game.round(RoundId(0)).unwrap().concluded);
}

#[tokio::test]
async fn eliminate_policy_removes_player_on_first_failure() {
    let mut game = Match::new(small(TimeoutPolicy::Eliminate)).unwrap();
    let slow = game
        .add_player(Box::new(Sleepy::new(Duration::from_millis(200), 1)))
        .unwrap();
    let quick = game.add_player(Box::new(Sweeper::new("quick"))).unwrap();

    game.play_round().await.unwrap();
    assert_eq!(timeouts(&game).len(), 1);
    assert_eq!(
        eliminations(&game),
        vec![(slow, Elimination::ControllerFailures)]
    );
    assert_eq!(game.round(RoundId(0)).unwrap().winner, Some(quick));
    // Eliminated before the quick player fired a single shot.
    let shots = game
        .events()
        .filter(|e| matches!(e, Event::Round(RoundEvent::ShotResolved { .. })))
        .count();
    assert_eq!(shots, 0);
}

#[tokio::test]
async fn eliminate_after_counts_failures_in_round() {
    let mut game = Match::new(small(TimeoutPolicy::EliminateAfter(3))).unwrap();
    let faulty = game
        .add_player(Box::new(Faulty::new(Misbehaviour::Error)))
        .unwrap();
    let quick = game.add_player(Box::new(Sweeper::new("quick"))).unwrap();

    game.play_round().await.unwrap();
    let faults: Vec<&Event> = game
        .events()
        .filter(|e| matches!(e, Event::Player(PlayerEvent::Faulted { .. })))
        .collect();
    assert_eq!(faults.len(), 3);
    assert_eq!(
        eliminations(&game),
        vec![(faulty, Elimination::ControllerFailures)]
    );
    assert_eq!(game.round(RoundId(0)).unwrap().winner, Some(quick));
    assert_eq!(game.player(faulty).unwrap().faults, 3);
}

#[tokio::test]
async fn illegal_shots_are_faults() {
    for mode in [Misbehaviour::OwnBoard, Misbehaviour::OutOfBounds, Misbehaviour::Panic] {
        let mut game = Match::new(small(TimeoutPolicy::Eliminate)).unwrap();
        let faulty = game.add_player(Box::new(Faulty::new(mode))).unwrap();
        game.add_player(Box::new(Sweeper::new("quick"))).unwrap();

        game.play_round().await.unwrap();
        let reasons: Vec<String> = game
            .events()
            .filter_map(|e| match e {
                Event::Player(PlayerEvent::Faulted {
                    player,
                    method,
                    reason,
                }) if *player == faulty => {
                    assert_eq!(method, SELECT_SHOT);
                    Some(reason.clone())
                }
                _ => None,
            })
            .collect();
        assert_eq!(reasons.len(), 1, "{:?}", mode);
        match mode {
            Misbehaviour::OwnBoard => assert!(reasons[0].contains("own board")),
            Misbehaviour::OutOfBounds => assert!(reasons[0].contains("out of bounds")),
            _ => {}
        }
    }
}

#[tokio::test]
async fn illegal_placement_eliminates_for_the_round() {
    let mut game = Match::new(small(TimeoutPolicy::Forfeit)).unwrap();
    let bad = game.add_player(Box::new(Overlapping)).unwrap();
    let good = game.add_player(Box::new(Sweeper::new("good"))).unwrap();

    game.play_round().await.unwrap();
    assert_eq!(eliminations(&game), vec![(bad, Elimination::NoFleet)]);
    assert_eq!(game.round(RoundId(0)).unwrap().winner, Some(good));
    assert!(game.player(bad).unwrap().fleet.ships.is_empty());
    let placement_fault = game.events().any(|e| {
        matches!(e, Event::Player(PlayerEvent::Faulted { player, method, .. })
            if *player == bad && method == "place_ships")
    });
    assert!(placement_fault);
}

#[tokio::test]
async fn one_overrun_counts_as_one_failure() {
    let config = small_with_deadline(TimeoutPolicy::EliminateAfter(2), Duration::from_millis(100));
    let mut game = Match::new(config).unwrap();
    let slow = game
        .add_player(Box::new(Sleepy::new(Duration::from_millis(130), 1)))
        .unwrap();
    game.add_player(Box::new(Sweeper::new("quick"))).unwrap();

    game.play_round().await.unwrap();
    assert_eq!(timeouts(&game), vec![(slow, SELECT_SHOT.to_string())]);
    assert_eq!(faults(&game), 0);
    let removed = eliminations(&game)
        .into_iter()
        .filter(|(_, cause)| *cause == Elimination::ControllerFailures)
        .count();
    assert_eq!(removed, 0);
    assert_eq!(game.player(slow).unwrap().timeouts, 1);
    assert_eq!(game.player(slow).unwrap().faults, 0);
    assert!(game.round(RoundId(0)).unwrap().concluded);
}

#[tokio::test]
async fn hung_controller_does_not_hold_up_the_round() {
    let mut game = Match::new(small(TimeoutPolicy::Eliminate)).unwrap();
    let hung = game.add_player(Box::new(Hung::new())).unwrap();
    let quick = game.add_player(Box::new(Sweeper::new("quick"))).unwrap();

    let started = Instant::now();
    assert!(game.play_round().await.unwrap());
    let elapsed = started.elapsed();
    assert!(elapsed < Duration::from_millis(300), "took {:?}", elapsed);

    assert_eq!(timeouts(&game), vec![(hung, SELECT_SHOT.to_string())]);
    assert_eq!(faults(&game), 0);
    assert_eq!(
        eliminations(&game),
        vec![(hung, Elimination::ControllerFailures)]
    );
    assert_eq!(game.round(RoundId(0)).unwrap().winner, Some(quick));
}
