//! The UCI front-end: a stdin loop that parses client messages and drives
//! a dedicated search thread over a channel.
//!
//! Besides the standard protocol, a handful of the usual diagnostic
//! extensions are accepted on the same prompt: `perft`/`divide`, `bench`,
//! `see <move>`, `print` (the board plus the move selector's ordering for
//! the current position) and `hashstats`.

use crate::bench::run_bench;
use crate::movepick::{Generator, MoveSelector};
use crate::search::Search;
use crate::search_tables::HistoryTable;
use crate::time_control::{TimeController, TimeControlHandle};
use crate::transpositions::TTable;
use chess::board::Position;
use chess::moves::Move;
use itertools::Itertools;
use std::io::BufRead;
use std::io::Write;
use uci::client::UciClientMessage;
use uci::engine::{IdType, UciEngineMessage};
use uci::options::{OptionType, UciOption};

const NAME: &str = "Nightjar";
const VERSION: &str = env!("CARGO_PKG_VERSION");
const AUTHOR: &str = "the Nightjar developers";

/// The default transposition table size, in megabytes.
pub const DEFAULT_TT_SIZE: usize = 64;

const UCI_OPTIONS: [UciOption; 4] = [
    UciOption {
        name: "Hash",
        option_type: OptionType::Spin {
            min: 1,
            max: 1024,
            default: DEFAULT_TT_SIZE as i32,
        },
    },
    UciOption {
        name: "MultiPV",
        option_type: OptionType::Spin {
            min: 1,
            max: 64,
            default: 1,
        },
    },
    UciOption {
        name: "Ponder",
        option_type: OptionType::Check { default: false },
    },
    UciOption {
        name: "Clear Hash",
        option_type: OptionType::Button,
    },
];

/// Wires stdin/stdout up to the search thread.
pub struct SearchController {
    position: Position,
    tc_handle: Option<TimeControlHandle>,
    search_thread: SearchThread,

    multi_pv: u32,
    ponder: bool,
}

impl SearchController {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            tc_handle: None,
            search_thread: SearchThread::new(),
            multi_pv: 1,
            ponder: false,
        }
    }

    /// Listen on stdin and dispatch any valid UCI messages until `quit`.
    pub fn run(&mut self) -> anyhow::Result<()> {
        let stdin = std::io::stdin().lock();

        for input in stdin.lines() {
            let input = input?;

            match input.trim().parse::<UciClientMessage>() {
                Ok(command) => {
                    if self.handle_command(command)? {
                        break;
                    }
                }

                // Not a protocol message; maybe one of the extensions.
                Err(_) => self.handle_extension(input.trim()),
            }

            std::io::stdout().flush()?;
        }

        Ok(())
    }

    /// Handle a single protocol message; returns true on `quit`.
    fn handle_command(&mut self, command: UciClientMessage) -> anyhow::Result<bool> {
        use UciClientMessage::*;

        match command {
            Uci => {
                println!("{}", UciEngineMessage::Id(IdType::Name(format!("{NAME} {VERSION}"))));
                println!("{}", UciEngineMessage::Id(IdType::Author(AUTHOR.to_string())));

                for option in UCI_OPTIONS {
                    println!("{}", UciEngineMessage::UciOption(option));
                }

                println!("{}", UciEngineMessage::UciOk);
            }

            IsReady => println!("{}", UciEngineMessage::ReadyOk),

            Debug(_) => {}

            UciNewGame => {
                self.position = chess::board::Position::default();
                self.tc_handle = None;
                self.search_thread.clear_tables();
            }

            Position(pos, moves) => {
                let mut position = *pos;

                for mv in moves {
                    if let Err(err) = position.play_bare_move(mv) {
                        println!("info string {err}");
                        break;
                    }
                }

                self.position = position;
            }

            Go(tc, pondering) => {
                let (tc, tc_handle) =
                    TimeController::new(tc, self.position.side, pondering, self.ponder);

                self.tc_handle = Some(tc_handle);
                self.search_thread
                    .search(self.position.clone(), tc, self.multi_pv);
            }

            Stop => {
                if let Some(handle) = &self.tc_handle {
                    handle.stop();
                }
            }

            PonderHit => {
                if let Some(handle) = &self.tc_handle {
                    handle.ponderhit();
                }
            }

            SetOption(name, value) => match name.as_str() {
                "Hash" => self.search_thread.resize_tt(value.parse()?),
                "MultiPV" => self.multi_pv = value.parse()?,
                "Ponder" => self.ponder = value == "true",
                "Clear Hash" => self.search_thread.clear_tables(),
                _ => println!("info string unknown option {name}"),
            },

            Quit => return Ok(true),
        }

        Ok(false)
    }

    /// The non-standard diagnostic commands.
    fn handle_extension(&mut self, input: &str) {
        let (command, args) = input.split_once(' ').unwrap_or((input, ""));

        match command {
            "" => {}

            "perft" => {
                let depth = args.trim().parse().unwrap_or(1);
                let nodes = self.position.perft(depth);
                println!("perft {depth}: {nodes}");
            }

            "divide" => {
                let depth = args.trim().parse().unwrap_or(1);
                let mut total = 0;

                for (mv, nodes) in self.position.perft_divide(depth) {
                    println!("{mv}: {nodes}");
                    total += nodes;
                }

                println!("\n{total}");
            }

            "bench" => {
                let depth = args.trim().parse().unwrap_or(8);
                run_bench(depth, None);
            }

            "see" => match args.trim().parse().ok().and_then(|mv| self.position.find_move(mv)) {
                Some(mv) => println!("see: {}", self.position.static_exchange_eval(mv)),
                None => println!("info string not a legal move: {args}"),
            },

            "print" => self.print_position(),

            "hashstats" => self.search_thread.print_tt_stats(),

            _ => println!("info string unknown command {command}"),
        }
    }

    /// Print the board, the legal moves, and the moves the way the selector
    /// would order them for a PV node.
    fn print_position(&mut self) {
        println!("{}", self.position);
        println!("FEN: {}", self.position.to_fen());

        println!(
            "moves: {}",
            self.position.generate_legal_moves().iter().join(" ")
        );

        let history = HistoryTable::boxed();
        let mut sel = if self.position.is_check() {
            MoveSelector::new(&self.position, Generator::Escape, Move::NULL, 0, None, &history)
        } else {
            MoveSelector::new(&self.position, Generator::Pv, Move::NULL, 0, None, &history)
        };

        print!("ordered moves:");
        loop {
            let mv = sel.select_move(&self.position, &history);
            if mv.is_null() {
                break;
            }
            print!(" {mv}");
        }
        println!();
    }
}

////////////////////////////////////////////////////////////////////////////////
//
// Search thread
//
////////////////////////////////////////////////////////////////////////////////

/// A handle to the long-running thread that owns the transposition table
/// and history and runs the actual searches.
struct SearchThread {
    tx: std::sync::mpsc::Sender<SearchCommand>,
}

enum SearchCommand {
    Search(Position, TimeController, u32),
    Clear,
    ResizeTT(usize),
    PrintTTStats,
}

impl SearchThread {
    fn new() -> Self {
        let (tx, rx) = std::sync::mpsc::channel::<SearchCommand>();

        std::thread::spawn(move || {
            let mut tt = TTable::with_capacity_mb(DEFAULT_TT_SIZE);
            let mut history = HistoryTable::boxed();

            for command in rx.iter() {
                match command {
                    SearchCommand::Search(pos, tc, multi_pv) => {
                        let report =
                            Search::new(pos, &mut tt, &mut history, tc, multi_pv).run::<true>();

                        let ponder = report.pv.get(1).map(|mv| mv.bare());
                        match report.pv.first() {
                            Some(best) => {
                                println!("{}", UciEngineMessage::BestMove(best.bare(), ponder))
                            }
                            // Mated or stalemated; there is nothing to play.
                            None => println!("bestmove 0000"),
                        }
                    }

                    SearchCommand::Clear => {
                        tt.clear();
                        history.clear();
                    }

                    SearchCommand::ResizeTT(mb_size) => {
                        tt = TTable::with_capacity_mb(mb_size);
                    }

                    SearchCommand::PrintTTStats => tt.print_stats(),
                }
            }
        });

        Self { tx }
    }

    fn search(&self, position: Position, tc: TimeController, multi_pv: u32) {
        let _ = self.tx.send(SearchCommand::Search(position, tc, multi_pv));
    }

    fn clear_tables(&self) {
        let _ = self.tx.send(SearchCommand::Clear);
    }

    fn resize_tt(&self, mb_size: usize) {
        let _ = self.tx.send(SearchCommand::ResizeTT(mb_size));
    }

    fn print_tt_stats(&self) {
        let _ = self.tx.send(SearchCommand::PrintTTStats);
    }
}
