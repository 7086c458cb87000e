//! The payload of a UCI `info` line.

use chess::moves::BareMove;
use std::fmt::Display;

/// Information we might want to print in a UCI `info` message
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SearchInfo {
    /// The nominal search depth
    pub depth: Option<u8>,

    /// The selective search depth (e.g., max depth reached in quiescence)
    pub seldepth: Option<u8>,

    /// The total duration of the search so far, in milliseconds
    pub time: Option<u64>,

    /// The number of nodes searched so far
    pub nodes: Option<u64>,

    /// The best score found so far
    pub score: Option<Score>,

    /// How full the transposition table is, as a value per mille
    pub hashfull: Option<u32>,

    /// The number of nodes searched per second
    pub nps: Option<u64>,

    /// The current principal variation
    pub pv: Vec<BareMove>,
}

/// A search score, either as a plain centipawn value or as a distance to
/// mate (in full moves, negative when we're the one getting mated).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Score {
    Cp(i32),
    Mate(i32),
}

impl Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Score::Cp(value) => write!(f, "cp {value}"),
            Score::Mate(moves) => write!(f, "mate {moves}"),
        }
    }
}

impl Display for SearchInfo {
    /// Format the SearchInfo as the body of a UCI `info` message
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(depth) = self.depth {
            write!(f, "depth {depth} ")?;
        }

        if let Some(seldepth) = self.seldepth {
            write!(f, "seldepth {seldepth} ")?;
        }

        if let Some(score) = self.score {
            write!(f, "score {score} ")?;
        }

        if let Some(nodes) = self.nodes {
            write!(f, "nodes {nodes} ")?;
        }

        if let Some(nps) = self.nps {
            write!(f, "nps {nps} ")?;
        }

        if let Some(hashfull) = self.hashfull {
            write!(f, "hashfull {hashfull} ")?;
        }

        if let Some(time) = self.time {
            write!(f, "time {time} ")?;
        }

        if !self.pv.is_empty() {
            write!(f, "pv")?;
            for mv in self.pv.iter() {
                write!(f, " {mv}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatting() {
        let info = SearchInfo {
            depth: Some(8),
            seldepth: Some(14),
            time: Some(132),
            nodes: Some(41234),
            score: Some(Score::Cp(35)),
            hashfull: Some(17),
            nps: Some(312378),
            pv: vec!["e2e4".parse().unwrap(), "e7e5".parse().unwrap()],
        };

        assert_eq!(
            info.to_string(),
            "depth 8 seldepth 14 score cp 35 nodes 41234 nps 312378 hashfull 17 time 132 pv e2e4 e7e5"
        );
    }

    #[test]
    fn mate_scores() {
        assert_eq!(Score::Mate(3).to_string(), "mate 3");
        assert_eq!(Score::Mate(-2).to_string(), "mate -2");
    }
}
