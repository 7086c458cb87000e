//! Position evaluation.
//!
//! The evaluator is deliberately simple: material plus piece-square bonuses,
//! both of which the board keeps as running totals, so evaluating a position
//! is a handful of additions. What it lacks in nuance it makes back in the
//! endgame module, which recognizes specific material combinations and
//! either adjudicates them outright (forced wins, dead draws) or scales each
//! side's contribution to steer the search away from unwinnable positions.
//!
//! All scores are centipawns from the side to move's point of view.

pub mod endgame;

use chess::board::Position;
use chess::piece::PieceType;
use chess::psqt::ROOK_VAL;
use endgame::MaterialData;

pub type Score = i32;

/// The score of a drawn position.
pub const DRAW_VALUE: Score = 0;

/// The sentinel score for an endgame the recognizer adjudicates as won.
/// Large enough to dwarf any positional evaluation, small enough to lose
/// against an actual forced mate.
pub const WON_ENDGAME: Score = 10_000;

/// The score of being checkmated on the spot.
pub const MATE_SCORE: Score = 32_000;

/// Scores this close to `MATE_SCORE` encode a mate distance in plies.
pub const MATE_BOUND: Score = MATE_SCORE - 512;

/// Evaluate the position from material and piece-square bonuses alone.
pub fn simple_eval(pos: &Position) -> Score {
    let us = pos.side;
    let them = !us;

    pos.material_eval[us] - pos.material_eval[them] + pos.piece_square_eval[us]
        - pos.piece_square_eval[them]
}

/// The full static evaluation: endgame adjudication when the recognizer has
/// a verdict, otherwise the material and piece-square totals with each
/// side's contribution scaled by the endgame scale factors.
pub fn evaluate(pos: &Position) -> Score {
    let md = MaterialData::classify(pos);

    if let Some(score) = endgame::endgame_score(pos, &md) {
        return score;
    }

    let scale = endgame::determine_endgame_scale(pos, &md);
    let us = pos.side;
    let them = !us;

    let ours = (pos.material_eval[us] + pos.piece_square_eval[us]) * scale[us];
    let theirs = (pos.material_eval[them] + pos.piece_square_eval[them]) * scale[them];

    (ours - theirs) / endgame::FULL_SCALE
}

/// Neither side can force a mate: no pawns, and less than a rook's worth of
/// material on either side.
pub fn insufficient_material(pos: &Position) -> bool {
    use chess::piece::Color::*;

    pos.piece_count[White][PieceType::Pawn] == 0
        && pos.piece_count[Black][PieceType::Pawn] == 0
        && pos.material_eval[White] < ROOK_VAL
        && pos.material_eval[Black] < ROOK_VAL
}

/// Is the position drawn by rule: fifty moves without progress, dead
/// material, or a threefold repetition?
pub fn is_draw(pos: &Position) -> bool {
    pos.halfmove_clock >= 100 || insufficient_material(pos) || pos.is_repetition(3)
}

////////////////////////////////////////////////////////////////////////////////
//
// Mate score helpers
//
////////////////////////////////////////////////////////////////////////////////

/// Helpers for working with mate scores, which encode "mate in N plies" as
/// an offset from `MATE_SCORE` and need adjusting whenever they move between
/// plies (e.g., in and out of the transposition table).
pub trait ScoreExt {
    fn is_mate(self) -> bool;

    /// The number of plies until mate, for a mate score.
    fn mate_distance(self) -> i32;

    /// Convert a root-relative mate score to a node-relative one for storing
    /// in the transposition table at the given ply.
    fn relative(self, ply: usize) -> Self;

    /// Convert a node-relative mate score from the transposition table back
    /// to a root-relative one.
    fn absolute(self, ply: usize) -> Self;
}

impl ScoreExt for Score {
    fn is_mate(self) -> bool {
        self.abs() >= MATE_BOUND
    }

    fn mate_distance(self) -> i32 {
        MATE_SCORE - self.abs()
    }

    fn relative(self, ply: usize) -> Self {
        if self >= MATE_BOUND {
            self + ply as Score
        } else if self <= -MATE_BOUND {
            self - ply as Score
        } else {
            self
        }
    }

    fn absolute(self, ply: usize) -> Self {
        if self >= MATE_BOUND {
            self - ply as Score
        } else if self <= -MATE_BOUND {
            self + ply as Score
        } else {
            self
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

    /// Swap the colors of a FEN: mirror the ranks, swap piece case, flip the
    /// side to move and the castling rights.
    fn color_flipped(fen: &str) -> String {
        let mut parts = fen.split_whitespace();
        let placement = parts.next().unwrap();
        let side = parts.next().unwrap();
        let castling = parts.next().unwrap();
        let rest: Vec<_> = parts.collect();

        let swap_case = |c: char| {
            if c.is_uppercase() {
                c.to_ascii_lowercase()
            } else {
                c.to_ascii_uppercase()
            }
        };

        let placement = placement
            .split('/')
            .rev()
            .map(|rank| rank.chars().map(swap_case).collect::<String>())
            .collect::<Vec<_>>()
            .join("/");

        let castling: String = if castling == "-" {
            castling.to_string()
        } else {
            castling.chars().map(swap_case).collect()
        };

        format!(
            "{placement} {} {castling} {}",
            if side == "w" { "b" } else { "w" },
            rest.join(" ")
        )
    }

    #[test]
    fn startpos_is_balanced() {
        let pos = Position::default();
        assert_eq!(simple_eval(&pos), 0);
        assert_eq!(evaluate(&pos), 0);
    }

    #[test]
    fn eval_flips_with_the_colors() {
        for fen in [
            "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 0 1",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        ] {
            let pos: Position = fen.parse().unwrap();
            let flipped: Position = color_flipped(fen).parse().unwrap();

            assert_eq!(simple_eval(&pos), -simple_eval(&flipped));
        }
    }

    #[test]
    fn material_advantage_shows() {
        // White is up a rook.
        let pos: Position = "4k3/8/8/8/8/8/8/R3K3 w - - 0 1".parse().unwrap();
        assert!(simple_eval(&pos) >= ROOK_VAL - 50);

        let pos: Position = "4k3/8/8/8/8/8/8/R3K3 b - - 0 1".parse().unwrap();
        assert!(simple_eval(&pos) <= -(ROOK_VAL - 50));
    }

    #[test]
    fn insufficient_material_detection() {
        for fen in [
            "4k3/8/8/8/8/8/8/4K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/2B1K3 w - - 0 1",
            "4kn2/8/8/8/8/8/8/2B1K3 w - - 0 1",
        ] {
            let pos: Position = fen.parse().unwrap();
            assert!(insufficient_material(&pos), "{fen}");
            assert!(is_draw(&pos), "{fen}");
        }

        for fen in [
            "4k3/8/8/8/8/8/8/R3K3 w - - 0 1",
            "4k3/7p/8/8/8/8/8/4K3 w - - 0 1",
        ] {
            let pos: Position = fen.parse().unwrap();
            assert!(!insufficient_material(&pos), "{fen}");
        }
    }

    #[test]
    fn fifty_move_rule() {
        let pos: Position = "4k3/8/8/8/8/8/8/R3K3 w - - 100 80".parse().unwrap();
        assert!(is_draw(&pos));

        let pos: Position = "4k3/8/8/8/8/8/8/R3K3 w - - 99 80".parse().unwrap();
        assert!(!is_draw(&pos));
    }

    #[test]
    fn mate_score_adjustment() {
        let score = MATE_SCORE - 5;
        assert!(score.is_mate());
        assert_eq!(score.mate_distance(), 5);

        // Round-trip through the TT conventions.
        assert_eq!(score.relative(3).absolute(3), score);
        assert_eq!((-score).relative(3).absolute(3), -score);

        assert!(!WON_ENDGAME.is_mate());
        assert!(!(1234 as Score).is_mate());
    }
}
