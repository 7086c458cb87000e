//! Logic for parsing and serializing FEN strings.
//!
//! A FEN string captures an entire board state in six space-separated
//! fields: the piece placement (eighth rank first), the side to move, the
//! remaining castling rights, the en-passant square, the halfmove clock and
//! the fullmove counter. The last two fields are optional on input, since
//! plenty of test suites leave them off.

use crate::board::Position;
use crate::piece::{Color, Piece, PieceType};
use crate::square::Square;
use anyhow::anyhow;
use itertools::Itertools;
use std::str::FromStr;

/// The starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl FromStr for Position {
    type Err = anyhow::Error;

    fn from_str(fen: &str) -> anyhow::Result<Self> {
        let mut parts = fen.split_whitespace();
        let placement = parts.next().ok_or(anyhow!("Empty FEN string"))?;

        let mut pos = Position::empty();

        let ranks: Vec<_> = placement.split('/').collect();
        if ranks.len() != 8 {
            Err(anyhow!("FEN placement should hold 8 ranks: {placement}"))?;
        }

        for (i, rank) in ranks.iter().enumerate() {
            let mut file = 0usize;

            for c in rank.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as usize;
                } else {
                    let piece: Piece = c.to_string().parse()?;
                    if file > 7 {
                        Err(anyhow!("FEN rank overflows the board: {rank}"))?;
                    }
                    pos.put(piece, Square::new(file, 7 - i));
                    file += 1;
                }
            }

            if file != 8 {
                Err(anyhow!("FEN rank does not span 8 files: {rank}"))?;
            }
        }

        pos.side = parts
            .next()
            .ok_or(anyhow!("FEN is missing the side to move"))?
            .parse()?;

        pos.castling = parts
            .next()
            .ok_or(anyhow!("FEN is missing the castling rights"))?
            .parse()?;

        pos.en_passant = match parts.next().ok_or(anyhow!("FEN is missing the ep square"))? {
            "-" => None,
            sq => Some(sq.parse()?),
        };

        pos.halfmove_clock = match parts.next() {
            Some(count) => count.parse()?,
            None => 0,
        };

        pos.fullmove = match parts.next() {
            Some(count) => count.parse()?,
            None => 1,
        };

        for side in [Color::White, Color::Black] {
            if pos.piece_count[side][PieceType::King] != 1 {
                Err(anyhow!("FEN needs exactly one king per side: {fen}"))?;
            }
        }

        pos.hash = pos.recompute_hash();
        pos.assert_valid();

        Ok(pos)
    }
}

impl Default for Position {
    fn default() -> Self {
        START_FEN.parse().unwrap()
    }
}

impl Position {
    /// Serialize the position back into a FEN string.
    pub fn to_fen(&self) -> String {
        let mut placement: Vec<String> = Vec::new();

        for rank in (0..8).rev() {
            let squares = (0..8).map(|file| self.piece_at(Square::new(file, rank)));
            let mut line = String::new();

            for (empty, group) in &squares.group_by(|piece| piece.is_none()) {
                if empty {
                    line.push_str(&group.count().to_string());
                } else {
                    for piece in group.flatten() {
                        line.push_str(&piece.to_string());
                    }
                }
            }

            placement.push(line);
        }

        let en_passant = match self.en_passant {
            Some(sq) => sq.to_string(),
            None => "-".to_string(),
        };

        format!(
            "{} {} {} {} {} {}",
            placement.iter().join("/"),
            self.side,
            self.castling,
            en_passant,
            self.halfmove_clock,
            self.fullmove,
        )
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
    use crate::piece::{Color, PieceType};

    #[test]
    fn startpos() {
        let pos = Position::default();

        assert_eq!(pos.piece_at(Square::E1), Some(Piece::WK));
        assert_eq!(pos.piece_at(Square::new(3, 7)), Some(Piece::BQ));
        assert_eq!(pos.side, Color::White);
        assert_eq!(pos.piece_count[Color::White][PieceType::Pawn], 8);
        assert_eq!(pos.material_eval[Color::White], pos.material_eval[Color::Black]);
        assert_eq!(pos.king_square(Color::Black), Square::E8);
    }

    #[test]
    fn roundtrips() {
        for fen in [
            START_FEN,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq c6 0 2",
        ] {
            let pos: Position = fen.parse().unwrap();
            assert_eq!(pos.to_fen(), fen);
        }
    }

    #[test]
    fn invalid_fens() {
        assert!("".parse::<Position>().is_err());
        assert!("8/8/8/8/8/8/8 w - - 0 1".parse::<Position>().is_err());
        assert!("9/8/8/8/8/8/8/8 w - - 0 1".parse::<Position>().is_err());
        assert!("8/8/8/8/8/8/8/8 w - - 0 1".parse::<Position>().is_err());
    }

    #[test]
    fn optional_counters() {
        let pos: Position = "4k3/8/8/8/8/8/8/4K3 w - -".parse().unwrap();
        assert_eq!(pos.halfmove_clock, 0);
        assert_eq!(pos.fullmove, 1);
    }
}
