//! The time constraints a `go` command can place on a search.

use anyhow::anyhow;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

/// A time control represents the constraints placed on the search, whether
/// that's an actual time, a cutoff search depth, or a cutoff node count.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TimeControl {
    /// Keep going until we get an explicit `stop` signal
    Infinite,

    /// Search up to the requested search depth
    Depth(usize),

    /// Search a requested number of nodes
    Nodes(u64),

    /// Search for a fixed amount of time
    FixedTime(Duration),

    /// Given the remaining time on both clocks, choose your own time budget.
    Clock {
        wtime: Duration,
        btime: Duration,
        winc: Option<Duration>,
        binc: Option<Duration>,
        movestogo: Option<u32>,
    },
}

impl TimeControl {
    /// Parse the argument list of a `go` command. The tokens can come in any
    /// order, and `ponder` can be mixed in with any of them, so this returns
    /// the ponder flag alongside the time control.
    pub fn parse_go(args: &str) -> anyhow::Result<(Self, bool)> {
        let mut tokens = args.split_whitespace();

        let mut ponder = false;
        let mut depth = None;
        let mut nodes = None;
        let mut movetime = None;
        let mut infinite = false;
        let mut wtime = None;
        let mut btime = None;
        let mut winc = None;
        let mut binc = None;
        let mut movestogo = None;

        while let Some(token) = tokens.next() {
            let mut value = |name: &str| -> anyhow::Result<u64> {
                tokens
                    .next()
                    .ok_or(anyhow!("go {name} is missing its value"))?
                    .parse()
                    .map_err(|_| anyhow!("Invalid go {name} value"))
            };

            match token {
                "ponder" => ponder = true,
                "infinite" => infinite = true,
                "depth" => depth = Some(value("depth")?),
                "nodes" => nodes = Some(value("nodes")?),
                "movetime" => movetime = Some(value("movetime")?),
                "wtime" => wtime = Some(value("wtime")?),
                "btime" => btime = Some(value("btime")?),
                "winc" => winc = Some(value("winc")?),
                "binc" => binc = Some(value("binc")?),
                "movestogo" => movestogo = Some(value("movestogo")? as u32),

                // `searchmoves` and friends aren't supported; skip the token
                // rather than give up on the whole command.
                _ => {}
            }
        }

        let tc = if infinite {
            TimeControl::Infinite
        } else if let (Some(wtime), Some(btime)) = (wtime, btime) {
            TimeControl::Clock {
                wtime: Duration::from_millis(wtime),
                btime: Duration::from_millis(btime),
                winc: winc.map(Duration::from_millis),
                binc: binc.map(Duration::from_millis),
                movestogo,
            }
        } else if let Some(movetime) = movetime {
            TimeControl::FixedTime(Duration::from_millis(movetime))
        } else if let Some(depth) = depth {
            TimeControl::Depth(depth as usize)
        } else if let Some(nodes) = nodes {
            TimeControl::Nodes(nodes)
        } else {
            // A bare `go` (or `go ponder`) searches until told to stop.
            TimeControl::Infinite
        };

        Ok((tc, ponder))
    }
}

impl Display for TimeControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use TimeControl::*;

        match self {
            Depth(n) => write!(f, "depth {n}"),
            Nodes(n) => write!(f, "nodes {n}"),
            FixedTime(n) => write!(f, "movetime {}", n.as_millis()),
            Infinite => write!(f, "infinite"),
            Clock {
                wtime,
                btime,
                winc,
                binc,
                movestogo,
            } => {
                write!(f, "wtime {} btime {}", wtime.as_millis(), btime.as_millis())?;

                if let Some(winc) = winc {
                    write!(f, " winc {}", winc.as_millis())?;
                }
                if let Some(binc) = binc {
                    write!(f, " binc {}", binc.as_millis())?;
                }
                if let Some(movestogo) = movestogo {
                    write!(f, " movestogo {movestogo}")?;
                }

                Ok(())
            }
        }
    }
}

impl FromStr for TimeControl {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        Ok(Self::parse_go(s)?.0)
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
    fn parse_clock() {
        let (tc, ponder) =
            TimeControl::parse_go("wtime 300000 btime 300000 winc 2000 binc 2000").unwrap();

        assert!(!ponder);
        assert_eq!(
            tc,
            TimeControl::Clock {
                wtime: Duration::from_millis(300000),
                btime: Duration::from_millis(300000),
                winc: Some(Duration::from_millis(2000)),
                binc: Some(Duration::from_millis(2000)),
                movestogo: None,
            }
        );
    }

    #[test]
    fn parse_simple_controls() {
        assert_eq!("depth 12".parse::<TimeControl>().unwrap(), TimeControl::Depth(12));
        assert_eq!("nodes 40000".parse::<TimeControl>().unwrap(), TimeControl::Nodes(40000));
        assert_eq!(
            "movetime 5000".parse::<TimeControl>().unwrap(),
            TimeControl::FixedTime(Duration::from_millis(5000))
        );
        assert_eq!("infinite".parse::<TimeControl>().unwrap(), TimeControl::Infinite);
        assert_eq!("".parse::<TimeControl>().unwrap(), TimeControl::Infinite);
    }

    #[test]
    fn parse_ponder() {
        let (tc, ponder) = TimeControl::parse_go("ponder wtime 1000 btime 1000").unwrap();
        assert!(ponder);
        assert!(matches!(tc, TimeControl::Clock { .. }));
    }
}
