// ═══════════════════════════════════════════════════════════════════════
// Runner - CLI entry point for running games and tournaments
// ═══════════════════════════════════════════════════════════════════════

use caylus_agents::AgentKind;
use caylus_engine::engine::{final_standings, to_json, winners};
use caylus_tournament::{play, run_batch, Database, TournamentConfig, TournamentError};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "caylus-runner", about = "Caylus rules engine lab")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single game and print the log and standings
    Play {
        /// Random seed when omitted
        #[arg(short, long)]
        seed: Option<u64>,
        #[arg(short, long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(2..=5))]
        players: u8,
        /// Agent type: "random" or "heuristic"
        #[arg(short, long, default_value = "heuristic")]
        agent: AgentKind,
        /// Write the final state as JSON to this file
        #[arg(long)]
        dump: Option<String>,
    },
    /// Run a tournament of N games
    Tournament {
        #[arg(short, long)]
        games: Option<u32>,
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(2..=5))]
        players: Option<u8>,
        #[arg(short, long, default_value = "results.db")]
        db: String,
        /// Agent types seated in rotation; repeat the flag for several
        #[arg(short, long)]
        agent: Vec<AgentKind>,
        /// JSON tournament config; flags override it
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Show leaderboard from database
    Leaderboard {
        #[arg(short, long, default_value = "results.db")]
        db: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Play { seed, players, agent, dump } => {
            cmd_play(seed.unwrap_or_else(rand::random), players, agent, dump.as_deref())
        }
        Commands::Tournament { games, players, db, agent, config } => {
            cmd_tournament(games, players, &db, agent, config.as_deref())
        }
        Commands::Leaderboard { db } => cmd_leaderboard(&db),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_play(seed: u64, player_count: u8, agent: AgentKind, dump: Option<&str>) -> Result<(), TournamentError> {
    println!("=== Caylus ===\n");
    println!("Running single game: seed={seed}, players={player_count}, agent={agent}\n");

    tracing::info!(seed, players = player_count, %agent, "playing single game");
    let roster = vec![agent; player_count as usize];
    let (state, _) = play(&roster, seed, TournamentConfig::default().max_decisions)?;

    // The log is newest-first
    for line in state.log.iter().rev() {
        println!("  {line}");
    }
    println!();
    println!("Game finished after {} turns", state.turn);
    let top = winners(&state);
    if top.len() > 1 {
        let names: Vec<String> = top.iter().map(|c| c.to_string()).collect();
        println!("  Draw between {}", names.join(", "));
    } else if let Some(w) = top.first() {
        println!("  Winner: {w}");
    }
    println!("\n  Final standings:");
    for (color, score) in final_standings(&state) {
        let p = state.player(color).map_err(|reason| TournamentError::Rejected { seed, reason })?;
        println!(
            "    {:8} {:>3} VP  -- deniers: {}, houses: {}, resources: {}",
            color.to_string(),
            score,
            p.deniers,
            p.houses.placed,
            p.resources
        );
    }

    if let Some(path) = dump {
        std::fs::write(path, to_json(&state)?)?;
        println!("\nFinal state written to {path}");
    }
    Ok(())
}

fn cmd_tournament(
    games: Option<u32>,
    players: Option<u8>,
    db_path: &str,
    agents: Vec<AgentKind>,
    config_path: Option<&str>,
) -> Result<(), TournamentError> {
    let mut config = match config_path {
        Some(path) => TournamentConfig::load(path)?,
        None => TournamentConfig::default(),
    };
    if let Some(games) = games {
        config.games = games;
    }
    if let Some(players) = players {
        config.players = players;
    }
    if !agents.is_empty() {
        config.agents = agents;
    }
    // A config file can still carry a bad table size
    config.validate()?;

    let names: Vec<String> = config.agents.iter().map(|a| a.to_string()).collect();
    println!(
        "=== Tournament: {} games, {} players, agents={} ===\n",
        config.games,
        config.players,
        names.join(",")
    );

    let mut db = Database::new(db_path)?;
    tracing::info!(db = db_path, k = config.elo_k, "recording results");
    let mut wins: HashMap<AgentKind, u32> = HashMap::new();
    let mut draws = 0u32;
    let mut errors = 0u32;

    for (g, outcome) in run_batch(&config).into_iter().enumerate() {
        match outcome {
            Ok(result) => {
                if result.is_draw() {
                    draws += 1;
                } else if let Some(pr) = result.player_results.iter().find(|pr| result.winners.contains(&pr.color)) {
                    *wins.entry(pr.agent).or_insert(0) += 1;
                }
                db.store_game(&result)?;
                db.update_elo(&result, config.elo_k)?;
            }
            Err(e) => {
                errors += 1;
                eprintln!("Game {}: ERROR -- {}", g + 1, e);
            }
        }
    }

    println!("--- Summary ({} games, {} draws, {} errors) ---", config.games, draws, errors);
    for kind in AgentKind::ALL {
        let w = wins.get(&kind).copied().unwrap_or(0);
        let pct = if config.games > 0 { w as f64 / config.games as f64 * 100.0 } else { 0.0 };
        println!("  {:10}: {:>4} wins ({:.1}%)", kind.to_string(), w, pct);
    }
    println!("\nResults saved to: {db_path}");
    println!("Total games in DB: {}", db.game_count()?);
    Ok(())
}

fn cmd_leaderboard(db_path: &str) -> Result<(), TournamentError> {
    let db = Database::new(db_path)?;
    let board = db.leaderboard()?;
    if board.is_empty() {
        println!("No agents found. Run some tournaments first.");
        return Ok(());
    }
    println!("=== Leaderboard ===\n");
    println!("{:<20} {:>8} {:>8} {:>8} {:>8}", "Agent", "ELO", "Games", "Wins", "Draws");
    println!("{}", "-".repeat(56));
    for s in &board {
        println!("{:<20} {:>8.1} {:>8} {:>8} {:>8}", s.name, s.elo, s.games, s.wins, s.draws);
    }
    Ok(())
}
