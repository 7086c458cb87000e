//! Fixed-depth benchmark over a small suite of positions.
//!
//! Useful both as a smoke test and as a quick, reproducible speed
//! measurement: the node counts are deterministic for a given build, so a
//! changed total is the first sign a functional change sneaked in.

use crate::search::Search;
use crate::search_tables::HistoryTable;
use crate::time_control::TimeController;
use crate::transpositions::TTable;
use chess::board::Position;
use colored::Colorize;
use std::time::Duration;
use uci::time_control::TimeControl;

/// A spread of openings, middlegames and endgames.
const BENCH_POSITIONS: [&str; 10] = [
    // Startpos
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    // Kiwipete
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    // Open middlegames
    "r1bq1rk1/pp2b1pp/n1pp1n2/3P1p2/2P1p3/2N1P2N/PP2BPPP/R1BQ1RK1 b - - 2 10",
    "r3k2r/ppp1pp1p/2nqb1pn/3p4/4P3/2PP4/PP1NBPPP/R2QK1NR w KQkq - 1 5",
    "2r4r/1p4k1/1Pnp4/3Qb1pq/8/4BpPp/5P2/2RR1BK1 w - - 0 42",
    // Tactical
    "r1bqk2r/pppp1ppp/5n2/4b3/4P3/P1N5/1PP2PPP/R1BQKB1R w KQkq - 0 5",
    // Endgames
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "8/8/1p2k1p1/3p3p/1p1P1P1P/1P2PK2/8/8 w - - 3 54",
    "8/5k2/1pnrp1p1/p1p4p/P6P/4R1PK/1P3P2/4R3 b - - 1 38",
    "6k1/5pp1/8/2bKP2P/2P5/p4PNb/B7/8 b - - 1 44",
];

/// Run the bench suite (or a single FEN) at a fixed depth and report the
/// aggregate speed.
pub fn run_bench(depth: usize, fen: Option<String>) {
    let mut total_nodes = 0;
    let mut total_time = Duration::ZERO;

    match fen {
        Some(fen) => run_single(&fen, depth, &mut total_nodes, &mut total_time),
        None => {
            for fen in BENCH_POSITIONS {
                run_single(fen, depth, &mut total_nodes, &mut total_time);
            }
        }
    }

    let nps = (1_000_000 * total_nodes)
        .checked_div(total_time.as_micros() as u64)
        .unwrap_or_default();

    println!();
    println!("{:12} {total_nodes}", "nodes:".blue());
    println!("{:12} {nps}", "nps:".blue());
}

fn run_single(fen: &str, depth: usize, total_nodes: &mut u64, total_time: &mut Duration) {
    let position: Position = match fen.parse() {
        Ok(position) => position,
        Err(err) => {
            eprintln!("{}: {err}", "error".red());
            return;
        }
    };

    let mut tt = TTable::with_capacity_mb(16);
    let mut history = HistoryTable::boxed();
    let (tc, _handle) = TimeController::new(TimeControl::Depth(depth), position.side, false, false);

    let report = Search::new(position, &mut tt, &mut history, tc, 1).run::<false>();

    *total_nodes += report.nodes;
    *total_time += report.duration;

    let best = report
        .pv
        .first()
        .map(|mv| mv.to_string())
        .unwrap_or_else(|| "none".to_string());

    println!(
        "{:68} {} {best:6} {} {:7} {} {:9}",
        fen,
        "bestmove".green(),
        "score".green(),
        report.score,
        "nodes".green(),
        report.nodes,
    );
}
