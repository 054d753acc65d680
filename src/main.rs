use anyhow::Result;
use clap::Parser;
use std::time::Duration;

use talon::board::cozy::Position;
use talon::search::alphabeta::{SearchParams, Searcher};

#[derive(Parser, Debug)]
#[command(author, version, about = "Search a chess position and print the best move", long_about = None)]
struct Args {
    /// Starting FEN (defaults to the initial position)
    #[arg(long)]
    fen: Option<String>,

    /// Moves played from the starting position, in UCI form
    #[arg(long, num_args = 0..)]
    moves: Vec<String>,

    /// Search depth
    #[arg(long, default_value_t = 6)]
    depth: u32,

    /// Time budget in milliseconds
    #[arg(long)]
    movetime: Option<u64>,

    /// Worker threads for the root split
    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// Transposition table size in MB
    #[arg(long, default_value_t = 64)]
    hash: usize,

    /// Full SearchParams as JSON; overrides the flags above
    #[arg(long)]
    params: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut pos = match &args.fen {
        Some(fen) => Position::from_fen(fen)?,
        None => Position::startpos(),
    };
    for m in &args.moves {
        pos.make_move_uci(m)?;
    }

    let params: SearchParams = match &args.params {
        Some(json) => serde_json::from_str(json)?,
        None => SearchParams {
            depth: args.depth,
            movetime: args.movetime.map(Duration::from_millis),
            use_tt: true,
            threads: args.threads,
            use_aspiration: true,
            aspiration_window_cp: 15,
            use_nullmove: true,
            use_lmr: true,
            use_singular: true,
            use_multicut: false,
            max_nodes: None,
        },
    };

    let mut searcher = Searcher::default();
    searcher.set_tt_capacity_mb(args.hash);
    log::info!("transposition table sized to {} MB", args.hash);

    let res = searcher.search_with_params(pos.board(), params);
    match res.bestmove {
        Some(m) => println!("bestmove {m} score cp {} nodes {}", res.score_cp, res.nodes),
        None => println!("bestmove 0000 score cp {} nodes {}", res.score_cp, res.nodes),
    }
    Ok(())
}
