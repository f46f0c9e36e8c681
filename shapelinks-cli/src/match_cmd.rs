//! Match command - play games between two search agents
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_setup(), play_match(), report_results()
//! - Level 3: play_single_game(), compute_match_statistics()
//! - Level 4: formatting utilities

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Args;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use shapelinks_core::{
    AgentConfig, Board, BoardConfig, CancelToken, GameBoard, GameResult, Move, PColor, SearchAgent,
};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct MatchArgs {
    /// First agent setup "<maxDepth>,<heuristicMode>" (plays White in odd games)
    #[arg(long, default_value = "6,1")]
    pub white: String,

    /// Second agent setup (plays Red in odd games)
    #[arg(long, alias = "black", default_value = "6,3")]
    pub red: String,

    /// Number of games to play (will alternate colors)
    #[arg(long, default_value = "2")]
    pub games: usize,

    /// Time limit per decision in milliseconds
    #[arg(long, default_value = "3600")]
    pub time_limit_ms: u64,

    /// Single pass at the configured depth instead of iterative deepening
    #[arg(long)]
    pub fixed_depth: bool,

    /// Play games on all cores
    #[arg(long)]
    pub parallel: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Both agent configurations, with distinct report names
#[derive(Clone, Debug)]
struct MatchSetup {
    first: AgentConfig,
    second: AgentConfig,
    first_name: String,
    second_name: String,
    board: BoardConfig,
}

/// Think time of one side in one game
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct ThinkTime {
    decisions: u32,
    total: Duration,
}

/// Result of a single game
#[derive(Clone, Debug)]
struct GameRecord {
    game_number: usize,
    white: String,
    red: String,
    result: GameResult,
    moves: Vec<Move>,
    /// Indexed by color
    think: [ThinkTime; 2],
}

impl GameRecord {
    fn winner(&self) -> Option<&str> {
        match self.result {
            GameResult::WonBy(PColor::White) => Some(&self.white),
            GameResult::WonBy(PColor::Red) => Some(&self.red),
            _ => None,
        }
    }
}

/// Per-agent totals over the match
#[derive(Clone, Debug, Default, PartialEq)]
struct AgentSummary {
    wins: usize,
    decisions: u32,
    think: Duration,
}

impl AgentSummary {
    fn mean_think_ms(&self) -> f64 {
        if self.decisions == 0 {
            0.0
        } else {
            self.think.as_secs_f64() * 1000.0 / self.decisions as f64
        }
    }
}

/// Aggregated match results
#[derive(Clone, Debug)]
struct MatchResults {
    games: Vec<GameRecord>,
    agents: BTreeMap<String, AgentSummary>,
    draws: usize,
    avg_moves: f32,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run match command
///
/// 1. Build both agent configurations
/// 2. Play the match (multiple games)
/// 3. Report results
pub fn run(args: MatchArgs, seed: Option<u64>) -> Result<()> {
    let setup = build_setup(&args);

    tracing::info!(
        "Starting match: {} vs {} ({} games, {} ms per move)",
        setup.first_name,
        setup.second_name,
        args.games,
        args.time_limit_ms
    );

    let results = play_match(&setup, &args, seed)?;

    report_results(&results, &args);

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Parse both setup strings into agent configurations; unusable parts fall
/// back to defaults
fn build_setup(args: &MatchArgs) -> MatchSetup {
    let configure = |setup: &str| -> AgentConfig {
        let config = AgentConfig::from_setup(setup).with_time_limit(args.time_limit_ms);
        if args.fixed_depth {
            config.into_fixed_depth()
        } else {
            config
        }
    };

    let first = configure(&args.white);
    let second = configure(&args.red);

    let first_name = first.name();
    let mut second_name = second.name();
    if second_name == first_name {
        second_name.push_str("#2");
    }

    MatchSetup {
        first,
        second,
        first_name,
        second_name,
        board: BoardConfig::default(),
    }
}

/// Play all games in the match
fn play_match(setup: &MatchSetup, args: &MatchArgs, seed: Option<u64>) -> Result<MatchResults> {
    let mut rng = create_rng(seed);
    // Seeds drawn up front so parallel and sequential runs agree
    let game_seeds: Vec<(u64, u64)> = (0..args.games).map(|_| (rng.gen(), rng.gen())).collect();

    let play = |(index, seeds): (usize, &(u64, u64))| -> Result<GameRecord> {
        // Alternate colors for fairness
        let swap_colors = index % 2 == 1;
        let record = play_single_game(setup, index + 1, swap_colors, *seeds)?;

        tracing::info!(
            "Game {}: {} (W) vs {} (R): {:?} after {} moves",
            record.game_number,
            record.white,
            record.red,
            record.result,
            record.moves.len()
        );

        Ok(record)
    };

    let games = if args.parallel {
        game_seeds
            .par_iter()
            .enumerate()
            .map(play)
            .collect::<Result<Vec<_>>>()?
    } else {
        game_seeds
            .iter()
            .enumerate()
            .map(play)
            .collect::<Result<Vec<_>>>()?
    };

    Ok(compute_match_statistics(games))
}

/// Report match results
fn report_results(results: &MatchResults, args: &MatchArgs) {
    if args.json {
        print_json_results(results);
    } else {
        print_text_results(results);
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Play one game with a fresh pair of agents
fn play_single_game(
    setup: &MatchSetup,
    game_number: usize,
    swap_colors: bool,
    seeds: (u64, u64),
) -> Result<GameRecord> {
    let mut board = Board::new(&setup.board).context("Failed to create board")?;

    let first = SearchAgent::for_board(setup.first.clone().with_seed(seeds.0), &board);
    let second = SearchAgent::for_board(setup.second.clone().with_seed(seeds.1), &board);
    let (first_name, second_name) = (setup.first_name.clone(), setup.second_name.clone());

    // Indexed by color
    let (mut agents, names) = if swap_colors {
        ([second, first], [second_name, first_name])
    } else {
        ([first, second], [first_name, second_name])
    };

    let cancel = CancelToken::new();
    let mut think = [ThinkTime::default(); 2];

    while !board.result().is_terminal() {
        let side = board.turn().index();

        let start = Instant::now();
        let mv = agents[side]
            .decide(&mut board, &cancel)
            .with_context(|| format!("{} found no move in game {}", names[side], game_number))?;
        let elapsed = start.elapsed();

        think[side].decisions += 1;
        think[side].total += elapsed;

        tracing::debug!(
            game = game_number,
            agent = %names[side],
            %mv,
            elapsed_ms = elapsed.as_millis() as u64,
            "move"
        );

        board
            .do_move(mv.shape, mv.column)
            .with_context(|| format!("{} played an illegal move: {}", names[side], mv))?;
    }

    let [white, red] = names;
    Ok(GameRecord {
        game_number,
        white,
        red,
        result: board.result(),
        moves: board.history().to_vec(),
        think,
    })
}

/// Compute aggregate statistics from game records
fn compute_match_statistics(games: Vec<GameRecord>) -> MatchResults {
    let mut agents: BTreeMap<String, AgentSummary> = BTreeMap::new();
    let mut draws = 0;

    for game in &games {
        for (name, think) in [(&game.white, game.think[0]), (&game.red, game.think[1])] {
            let summary = agents.entry(name.clone()).or_default();
            summary.decisions += think.decisions;
            summary.think += think.total;
        }

        match game.winner() {
            Some(winner) => {
                if let Some(summary) = agents.get_mut(winner) {
                    summary.wins += 1;
                }
            }
            None => draws += 1,
        }
    }

    let total_moves: usize = games.iter().map(|g| g.moves.len()).sum();
    let avg_moves = if games.is_empty() {
        0.0
    } else {
        total_moves as f32 / games.len() as f32
    };

    MatchResults {
        games,
        agents,
        draws,
        avg_moves,
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Create RNG from seed or random
fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}

fn result_label(result: GameResult) -> String {
    match result {
        GameResult::WonBy(color) => format!("{} wins", color),
        GameResult::Draw => "draw".to_string(),
        GameResult::InProgress => "unfinished".to_string(),
    }
}

/// Print results as JSON
fn print_json_results(results: &MatchResults) {
    #[derive(serde::Serialize)]
    struct JsonGame {
        game_number: usize,
        white: String,
        red: String,
        result: String,
        winner: Option<String>,
        moves: Vec<String>,
    }

    #[derive(serde::Serialize)]
    struct JsonAgent {
        name: String,
        wins: usize,
        decisions: u32,
        mean_think_ms: f64,
    }

    #[derive(serde::Serialize)]
    struct JsonOutput {
        total_games: usize,
        draws: usize,
        avg_moves: f32,
        agents: Vec<JsonAgent>,
        games: Vec<JsonGame>,
    }

    let output = JsonOutput {
        total_games: results.games.len(),
        draws: results.draws,
        avg_moves: results.avg_moves,
        agents: results
            .agents
            .iter()
            .map(|(name, s)| JsonAgent {
                name: name.clone(),
                wins: s.wins,
                decisions: s.decisions,
                mean_think_ms: s.mean_think_ms(),
            })
            .collect(),
        games: results
            .games
            .iter()
            .map(|g| JsonGame {
                game_number: g.game_number,
                white: g.white.clone(),
                red: g.red.clone(),
                result: result_label(g.result),
                winner: g.winner().map(str::to_string),
                moves: g.moves.iter().map(Move::notation).collect(),
            })
            .collect(),
    };

    if let Ok(json) = serde_json::to_string_pretty(&output) {
        println!("{}", json);
    }
}

/// Print results as text
fn print_text_results(results: &MatchResults) {
    let total = results.games.len();
    let pct = |n: usize| {
        if total > 0 {
            n as f32 / total as f32 * 100.0
        } else {
            0.0
        }
    };

    println!("\n=== Match Results ===");
    println!("Total games: {}", total);
    for (name, summary) in &results.agents {
        println!(
            "{:<16} {} wins ({:.1}%), mean think {:.1} ms over {} moves",
            name,
            summary.wins,
            pct(summary.wins),
            summary.mean_think_ms(),
            summary.decisions
        );
    }
    println!("Draws:           {} ({:.1}%)", results.draws, pct(results.draws));
    println!("Avg moves:       {:.1}", results.avg_moves);

    println!("\nGame details:");
    for game in &results.games {
        println!(
            "  Game {}: {} (W) vs {} (R): {} in {} moves",
            game.game_number,
            game.white,
            game.red,
            result_label(game.result),
            game.moves.len()
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================
