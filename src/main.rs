use std::time::Duration;

use clap::{Parser, ValueEnum};
use fleetmatch::{
    init_logging, Configuration, Controller, FileRecorder, Match, MatchState,
    ProbabilityController, RandomController, Recorder, Replay, RoundMode, Scheduler,
    TimeoutPolicy,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ControllerType {
    Random,
    Probability,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Policy {
    Forfeit,
    Eliminate,
}

#[derive(Parser)]
enum Commands {
    /// Play a match between built-in controllers.
    Run {
        #[arg(long, help = "Fix RNG seed for reproducible matches (e.g., --seed 12345)")]
        seed: Option<u64>,
        #[arg(long, default_value_t = 2)]
        players: usize,
        #[arg(long, value_enum, default_value_t = ControllerType::Probability)]
        controller: ControllerType,
        #[arg(long, default_value_t = 10)]
        width: u32,
        #[arg(long, default_value_t = 10)]
        height: u32,
        #[arg(long, default_value_t = 1, help = "Rounds to play, or wins needed with --first-to")]
        rounds: u32,
        #[arg(long, help = "End the match once a player has won --rounds rounds")]
        first_to: bool,
        #[arg(long, default_value_t = 1000, help = "Controller deadline in milliseconds")]
        timeout_ms: u64,
        #[arg(long, value_enum, default_value_t = Policy::Forfeit)]
        policy: Policy,
        #[arg(long, help = "Eliminate a player after this many failures in a round")]
        eliminate_after: Option<u32>,
        #[arg(long, help = "Write the match record to this file")]
        save: Option<std::path::PathBuf>,
    },
    /// Replay a saved match record.
    Replay {
        file: std::path::PathBuf,
        #[arg(long, help = "Stop after this many events")]
        to: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            seed,
            players,
            controller,
            width,
            height,
            rounds,
            first_to,
            timeout_ms,
            policy,
            eliminate_after,
            save,
        } => {
            if let Some(s) = seed {
                println!("Using fixed seed: {} (match will be reproducible)", s);
            }
            let policy = match (eliminate_after, policy) {
                (Some(n), _) => TimeoutPolicy::EliminateAfter(n),
                (None, Policy::Forfeit) => TimeoutPolicy::Forfeit,
                (None, Policy::Eliminate) => TimeoutPolicy::Eliminate,
            };
            let mode = if first_to {
                RoundMode::FirstTo
            } else {
                RoundMode::AllRounds
            };
            let config = Configuration::new()
                .with_field(width, height)
                .with_rounds(mode, rounds)
                .with_controller_timeout(Duration::from_millis(timeout_ms))
                .with_timeout_policy(policy);

            let mut game = Match::new(config)?;
            for i in 0..players {
                let seed = seed.map(|s| s.wrapping_add(i as u64));
                game.add_player(build_controller(controller, seed, i))?;
            }

            let mut scheduler = Scheduler::new(game);
            scheduler.start()?;
            let finished = scheduler.wait().await?;
            let shared = scheduler.game();
            let game = shared.lock().await;
            print_scores(game.state());
            if !finished {
                println!("Match stopped before completion.");
            }
            if let Some(path) = save {
                let mut recorder = FileRecorder::new(&path);
                recorder.save(&game.record()).await?;
                println!("Saved {} events to {}", game.journal().len(), path.display());
            }
        }
        Commands::Replay { file, to } => {
            let record = FileRecorder::new(&file).load().await?;
            let mut replay = Replay::from_record(&record)?;
            if let Some(to) = to {
                replay.seek(to.min(replay.len()))?;
            }
            for (i, event) in replay.journal().events_since(0).iter().enumerate() {
                println!("{:>5}  {}", i, event);
            }
            println!("Position {} of {}", replay.position(), replay.len());
            print_scores(replay.state());
        }
    }
    Ok(())
}

fn build_controller(kind: ControllerType, seed: Option<u64>, index: usize) -> Box<dyn Controller> {
    let name = format!("{:?}-{}", kind, index + 1).to_lowercase();
    match (kind, seed) {
        (ControllerType::Random, Some(s)) => Box::new(RandomController::seeded(s).with_name(name)),
        (ControllerType::Random, None) => Box::new(RandomController::new().with_name(name)),
        (ControllerType::Probability, Some(s)) => {
            Box::new(ProbabilityController::seeded(s).with_name(name))
        }
        (ControllerType::Probability, None) => {
            Box::new(ProbabilityController::new().with_name(name))
        }
    }
}

fn print_scores(state: &MatchState) {
    println!("{} rounds played", state.completed_rounds());
    for player in state.players() {
        println!(
            "{:>4} {:<16} wins: {:<4} timeouts: {:<4} faults: {}",
            player.id.to_string(),
            player.name,
            player.score,
            player.timeouts,
            player.faults
        );
    }
}
