//! Think command - ask one agent for a move on a replayed position

use anyhow::{Context, Result};
use clap::Args;

use shapelinks_core::{AgentConfig, Board, CancelToken, Decision, GameBoard, Move, SearchAgent};

#[derive(Args)]
pub struct ThinkArgs {
    /// Agent setup "<maxDepth>,<heuristicMode>"
    #[arg(long, default_value = "6,1")]
    pub setup: String,

    /// Moves played so far, comma-separated, e.g. "3r,3s,2r"
    #[arg(long, default_value = "")]
    pub moves: String,

    /// Time limit in milliseconds
    #[arg(long, default_value = "3600")]
    pub time_limit_ms: u64,

    /// Single pass at the configured depth
    #[arg(long)]
    pub fixed_depth: bool,

    /// Output the decision as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ThinkArgs, seed: Option<u64>) -> Result<()> {
    let moves = parse_moves(&args.moves)?;
    let mut board = Board::standard();
    for mv in &moves {
        board
            .do_move(mv.shape, mv.column)
            .with_context(|| format!("Cannot replay {}", mv))?;
    }

    let mut config = AgentConfig::from_setup(&args.setup).with_time_limit(args.time_limit_ms);
    if args.fixed_depth {
        config = config.into_fixed_depth();
    }
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    // A replayed position is never the agent's first decision of a game
    config.opening_book = config.opening_book && moves.is_empty();

    let mut agent = SearchAgent::for_board(config, &board);
    tracing::info!("{} thinking on position after {} moves", agent, moves.len());

    let decision = agent.think(&mut board, &CancelToken::new());

    if args.json {
        print_json(&agent, &decision)?;
    } else {
        println!("{}", board);
        print_text(&agent, &decision);
    }

    Ok(())
}

fn parse_moves(s: &str) -> Result<Vec<Move>> {
    s.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(|m| m.parse::<Move>().context("Invalid move list"))
        .collect()
}

fn print_text(agent: &SearchAgent, decision: &Decision) {
    match decision.best_move {
        Some(mv) => println!("{}: {} ({})", agent, mv, mv.notation()),
        None => println!("{}: no move", agent),
    }
    println!("Score:     {}", decision.score);
    println!("Outcome:   {:?}", decision.outcome);
    println!("Depth:     {}", decision.stats.completed_depth);
    println!("Nodes:     {}", decision.stats.nodes);
    println!("TT hits:   {} ({} cutoffs)", decision.stats.tt_hits, decision.stats.tt_cutoffs);
}

fn print_json(agent: &SearchAgent, decision: &Decision) -> Result<()> {
    #[derive(serde::Serialize)]
    struct JsonDecision {
        agent: String,
        best_move: Option<String>,
        score: Option<f32>,
        outcome: String,
        completed_depth: u32,
        nodes: u64,
        tt_hits: u64,
        tt_cutoffs: u64,
    }

    let output = JsonDecision {
        agent: agent.name().to_string(),
        best_move: decision.best_move.map(|m| m.notation()),
        // NaN and infinities have no JSON form
        score: Some(decision.score).filter(|s| s.is_finite()),
        outcome: format!("{:?}", decision.outcome),
        completed_depth: decision.stats.completed_depth,
        nodes: decision.stats.nodes,
        tt_hits: decision.stats.tt_hits,
        tt_cutoffs: decision.stats.tt_cutoffs,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
