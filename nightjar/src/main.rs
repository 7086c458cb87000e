use chess::board::Position;
use chess::fen::START_FEN;
use clap::{Parser, Subcommand};
use nightjar::bench::run_bench;
use nightjar::controller::SearchController;

#[derive(Debug, Parser)]
#[command(name = "nightjar", about = "A UCI chess engine")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a fixed-depth search over the bench suite
    Bench {
        /// The search depth, in ply
        #[arg(short, long, default_value_t = 8)]
        depth: usize,

        /// A single FEN to bench instead of the suite
        #[arg(short, long)]
        fen: Option<String>,
    },

    /// Count the leaf nodes of the legal move tree
    Perft {
        /// The perft depth
        #[arg(short, long, default_value_t = 5)]
        depth: usize,

        /// The position to expand
        #[arg(short, long, default_value = START_FEN)]
        fen: String,

        /// Split the count out per root move
        #[arg(long)]
        divide: bool,
    },
}

fn main() -> anyhow::Result<()> {
    match Cli::parse().command {
        // No subcommand: speak UCI on stdin/stdout.
        None => SearchController::new(Position::default()).run()?,

        Some(Command::Bench { depth, fen }) => run_bench(depth, fen),

        Some(Command::Perft { depth, fen, divide }) => {
            let mut position: Position = fen.parse()?;

            if divide {
                let mut total = 0;
                for (mv, nodes) in position.perft_divide(depth) {
                    println!("{mv}: {nodes}");
                    total += nodes;
                }
                println!("\n{total}");
            } else {
                println!("{}", position.perft(depth));
            }
        }
    }

    Ok(())
}
