mod common;

use common::Sweeper;
use fleetmatch::{Configuration, Event, Match, PlayerId, RoundEvent, RoundId, RoundMode};

async fn three_player_round() -> Match {
    let config = Configuration::new()
        .with_field(6, 6)
        .with_ship_sizes([2])
        .with_rounds(RoundMode::AllRounds, 1);
    let mut game = Match::new(config).unwrap();
    for name in ["a", "b", "c"] {
        game.add_player(Box::new(Sweeper::new(name))).unwrap();
    }
    game.play_round().await.unwrap();
    game
}

fn logged_turns(game: &Match) -> Vec<PlayerId> {
    game.events()
        .filter_map(|e| match e {
            Event::Round(RoundEvent::TurnChanged { next: Some(next), .. }) => Some(*next),
            _ => None,
        })
        .collect()
}

fn holder(game: &Match) -> Option<PlayerId> {
    game.round(RoundId(0)).and_then(|r| r.current_turn)
}

#[tokio::test]
async fn turns_cycle_in_roster_order_skipping_sunk_players() {
    let game = three_player_round().await;
    // c sinks a on the third turn, so the rotation continues with b and c.
    assert_eq!(
        logged_turns(&game),
        vec![PlayerId(0), PlayerId(1), PlayerId(2), PlayerId(1), PlayerId(2)]
    );
    let round = game.round(RoundId(0)).unwrap();
    assert_eq!(round.winner, Some(PlayerId(2)));
    assert_eq!(round.participants, vec![PlayerId(0), PlayerId(1), PlayerId(2)]);
    assert_eq!(round.turns, 4);
}

#[tokio::test]
async fn first_turns_visit_every_participant_once() {
    let game = three_player_round().await;
    let mut first: Vec<PlayerId> = logged_turns(&game).into_iter().take(3).collect();
    first.sort();
    assert_eq!(first, vec![PlayerId(0), PlayerId(1), PlayerId(2)]);
}

#[tokio::test]
async fn stepping_backward_retraces_the_turn_sequence() {
    let mut game = three_player_round().await;
    let len = game.journal().len();
    let logged = logged_turns(&game);

    let mut backward = vec![];
    let mut last = holder(&game);
    for to in (0..len).rev() {
        game.seek(to).unwrap();
        let now = holder(&game);
        if now != last {
            if let Some(p) = last {
                backward.push(p);
            }
            last = now;
        }
    }
    backward.reverse();
    assert_eq!(backward, logged);

    let mut forward = vec![];
    let mut last = None;
    for to in 1..=len {
        game.seek(to).unwrap();
        let now = holder(&game);
        if now != last {
            if let Some(p) = now {
                forward.push(p);
            }
            last = now;
        }
    }
    assert_eq!(forward, logged);
}
