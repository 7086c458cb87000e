//! Messages the engine sends back to the client.

use crate::options::UciOption;
use crate::search_info::SearchInfo;
use chess::moves::BareMove;
use colored::Colorize;
use std::fmt::Display;
use std::io::IsTerminal;

/// Messages that can be sent from the engine back to the client
#[derive(Debug, Clone)]
pub enum UciEngineMessage {
    Id(IdType),
    UciOk,
    ReadyOk,
    BestMove(BareMove, Option<BareMove>),
    Info(SearchInfo),
    UciOption(UciOption),
}

impl Display for UciEngineMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use UciEngineMessage::*;

        // Tone down the protocol keywords when a human is watching.
        if std::io::stdout().is_terminal() {
            match self {
                Id(id) => write!(f, "{}", format!("id {id}").bright_black()),
                UciOk => write!(f, "{}", "uciok".bright_black()),
                ReadyOk => write!(f, "{}", "readyok".bright_black()),
                BestMove(mv, ponder) => {
                    write!(f, "{} {}", "bestmove".bright_black(), format!("{mv}").italic())?;
                    if let Some(ponder) = ponder {
                        write!(f, " {} {ponder}", "ponder".bright_black())?;
                    }
                    Ok(())
                }
                Info(info) => write!(f, "{} {info}", "info".bright_black()),
                UciOption(option) => write!(f, "{} {option}", "option".bright_black()),
            }
        } else {
            match self {
                Id(id) => write!(f, "id {id}"),
                UciOk => write!(f, "uciok"),
                ReadyOk => write!(f, "readyok"),
                BestMove(mv, ponder) => {
                    write!(f, "bestmove {mv}")?;
                    if let Some(ponder) = ponder {
                        write!(f, " ponder {ponder}")?;
                    }
                    Ok(())
                }
                Info(info) => write!(f, "info {info}"),
                UciOption(option) => write!(f, "option {option}"),
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
//
// ID Information
//
////////////////////////////////////////////////////////////////////////////////

/// A piece of identifying information to report to the client
#[derive(Debug, Clone)]
pub enum IdType {
    /// The name and version of the engine
    Name(String),

    /// The author of the engine
    Author(String),
}

impl Display for IdType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdType::Name(name) => write!(f, "name {name}"),
            IdType::Author(author) => write!(f, "author {author}"),
        }
    }
}
