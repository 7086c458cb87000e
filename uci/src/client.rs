//! Messages that can be sent from the client (GUI) to the engine.

use crate::time_control::TimeControl;
use anyhow::anyhow;
use chess::board;
use chess::moves::BareMove;
use std::fmt::Display;
use std::str::FromStr;

/// Messages that can be sent from the client to the engine
#[derive(Debug, Clone)]
pub enum UciClientMessage {
    Uci,
    Debug(bool),
    IsReady,
    SetOption(String, String),
    UciNewGame,
    Position(Box<board::Position>, Vec<BareMove>),
    Go(TimeControl, bool),
    PonderHit,
    Stop,
    Quit,
}

impl Display for UciClientMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use UciClientMessage::*;

        match self {
            Uci => writeln!(f, "uci"),
            Debug(flag) => writeln!(f, "debug {}", if *flag { "on" } else { "off" }),
            IsReady => writeln!(f, "isready"),
            SetOption(opt, val) => writeln!(f, "setoption name {opt} value {val}"),
            UciNewGame => writeln!(f, "ucinewgame"),
            Position(pos, moves) => {
                write!(f, "position fen {fen}", fen = pos.to_fen())?;

                if !moves.is_empty() {
                    write!(f, " moves")?;
                    for mv in moves {
                        write!(f, " {mv}")?;
                    }
                }

                Ok(())
            }
            Go(tc, ponder) => {
                write!(f, "go ")?;
                if *ponder {
                    write!(f, "ponder ")?;
                }
                writeln!(f, "{tc}")
            }
            PonderHit => writeln!(f, "ponderhit"),
            Stop => writeln!(f, "stop"),
            Quit => writeln!(f, "quit"),
        }
    }
}

impl FromStr for UciClientMessage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        use UciClientMessage::*;
        let s = s.trim();
        let (msg, remainder) = s.split_once(' ').unwrap_or((s, ""));

        match msg {
            "uci" => Ok(Uci),

            "isready" => Ok(IsReady),

            "debug" => match remainder.split_whitespace().next() {
                Some("on") => Ok(Debug(true)),
                Some("off") => Ok(Debug(false)),
                _ => Err(anyhow!("Invalid UCI message: {s}")),
            },

            "setoption" => {
                let mut parts = remainder.split_whitespace();

                if parts.next() != Some("name") {
                    Err(anyhow!("Invalid UCI message: {s}"))?;
                }

                let name = parts
                    .by_ref()
                    .take_while(|&word| word != "value")
                    .collect::<Vec<_>>()
                    .join(" ");

                // Button options come without a value.
                let value = parts.collect::<Vec<_>>().join(" ");

                Ok(SetOption(name, value))
            }

            "ucinewgame" => Ok(UciNewGame),

            "position" => {
                let mut parts = remainder.split_whitespace();

                let pos = match parts.next() {
                    Some("startpos") => board::Position::default(),
                    Some("fen") => {
                        let fen = parts.by_ref().take(6).collect::<Vec<_>>().join(" ");
                        fen.parse()?
                    }
                    _ => Err(anyhow!("Invalid UCI message: {s}"))?,
                };

                let mut moves = Vec::new();
                if let Some("moves") = parts.next() {
                    for mv in parts {
                        moves.push(mv.parse()?);
                    }
                }

                Ok(Position(Box::new(pos), moves))
            }

            "go" => {
                let (tc, ponder) = TimeControl::parse_go(remainder)?;
                Ok(Go(tc, ponder))
            }

            "ponderhit" => Ok(PonderHit),
            "stop" => Ok(Stop),
            "quit" => Ok(Quit),

            _ => Err(anyhow!("Invalid UCI message: {s}")),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
//
// Tests
//
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_position() {
        let msg: UciClientMessage = "position startpos moves e2e4 e7e5".parse().unwrap();

        let UciClientMessage::Position(pos, moves) = msg else {
            panic!("Expected a position message");
        };

        assert_eq!(pos.to_fen(), chess::fen::START_FEN);
        assert_eq!(moves.len(), 2);
        assert_eq!(moves[0].to_string(), "e2e4");
    }

    #[test]
    fn parse_position_fen() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let msg: UciClientMessage = format!("position fen {fen}").parse().unwrap();

        let UciClientMessage::Position(pos, moves) = msg else {
            panic!("Expected a position message");
        };

        assert_eq!(pos.to_fen(), fen);
        assert!(moves.is_empty());
    }

    #[test]
    fn parse_setoption() {
        let msg: UciClientMessage = "setoption name Hash value 128".parse().unwrap();

        let UciClientMessage::SetOption(name, value) = msg else {
            panic!("Expected a setoption message");
        };

        assert_eq!(name, "Hash");
        assert_eq!(value, "128");
    }

    #[test]
    fn parse_setoption_button() {
        let msg: UciClientMessage = "setoption name Clear Hash".parse().unwrap();

        let UciClientMessage::SetOption(name, value) = msg else {
            panic!("Expected a setoption message");
        };

        assert_eq!(name, "Clear Hash");
        assert!(value.is_empty());
    }

    #[test]
    fn parse_go() {
        let msg: UciClientMessage = "go ponder wtime 1000 btime 1000".parse().unwrap();
        assert!(matches!(msg, UciClientMessage::Go(TimeControl::Clock { .. }, true)));

        let msg: UciClientMessage = "go depth 6".parse().unwrap();
        assert!(matches!(msg, UciClientMessage::Go(TimeControl::Depth(6), false)));
    }
}
