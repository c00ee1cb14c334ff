use fleetmatch::{
    Configuration, Event, Match, PlayerEvent, PlayerId, ProbabilityController, RoundEvent,
    RoundMode,
};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: {} <seed1> <seed2>", args[0]);
        std::process::exit(1);
    }
    let seed1: u64 = args[1].parse()?;
    let seed2: u64 = args[2].parse()?;

    let config = Configuration::new().with_rounds(RoundMode::AllRounds, 1);
    let mut game = Match::new(config)?;
    let p1 = game.add_player(Box::new(ProbabilityController::seeded(seed1).with_name("player1")))?;
    let p2 = game.add_player(Box::new(ProbabilityController::seeded(seed2).with_name("player2")))?;

    while !game.play_round().await? {}
    game.end()?;

    let shots = |player: PlayerId| {
        game.events()
            .filter(|e| match e {
                Event::Round(RoundEvent::ShotResolved { shooter, .. }) => *shooter == player,
                _ => false,
            })
            .count()
    };
    let winner = game.events().find_map(|e| match e {
        Event::Player(PlayerEvent::Won { player, .. }) if *player == p1 => Some("player1"),
        Event::Player(PlayerEvent::Won { player, .. }) if *player == p2 => Some("player2"),
        _ => None,
    });
    let status = |player: PlayerId| {
        if game.player(player).map(|p| p.score > 0).unwrap_or(false) {
            "Won"
        } else {
            "Lost"
        }
    };

    let result = json!({
        "player1": {"status": status(p1), "guesses": shots(p1)},
        "player2": {"status": status(p2), "guesses": shots(p2)},
        "winner": winner,
        "events": game.journal().len(),
    });

    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
