use std::process::ExitCode;
use std::time::Instant;

use ai::{MoveOrdering, SearchConfig, SearchEngine, TerminalScoring};
use clap::Parser;
use engine::{Board, START_FEN, WHITE};

#[derive(Parser, Debug)]
#[command(about = "Print the move the search engine picks for a position")]
struct Args {
    /// Position to search
    #[arg(long, default_value = START_FEN)]
    fen: String,

    /// Search depth in plies
    #[arg(short, long, default_value_t = 3)]
    depth: u32,

    /// Try captures before quiet moves
    #[arg(long)]
    captures_first: bool,

    /// Disable alpha-beta cutoffs (plain minimax)
    #[arg(long)]
    no_pruning: bool,

    /// Score checkmates by distance instead of material
    #[arg(long)]
    mate_aware: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut board = match Board::from_fen(&args.fen) {
        Ok(board) => board,
        Err(err) => {
            log::error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let config = SearchConfig {
        depth: args.depth,
        ordering: if args.captures_first { MoveOrdering::CapturesFirst } else { MoveOrdering::Native },
        pruning: !args.no_pruning,
        terminal: if args.mate_aware { TerminalScoring::MateAware } else { TerminalScoring::Material },
    };
    let mut engine = SearchEngine::new(config);

    let maximizing = board.current_turn == WHITE;
    let start = Instant::now();
    let result = engine.search_default(&mut board, maximizing);
    let elapsed = start.elapsed();

    match result.best_move {
        Some(mv) => println!("bestmove {mv}"),
        None => println!("bestmove none ({:?})", board.game_status()),
    }
    println!(
        "depth {} score {:+} nodes {} leaves {} cutoffs {} time {}ms",
        result.depth,
        result.score,
        result.stats.nodes,
        result.stats.leaves,
        result.stats.cutoffs,
        elapsed.as_millis()
    );
    ExitCode::SUCCESS
}
