//! Move encoding.
//!
//! A move packs everything the board needs to play and take back the move
//! without looking anything up: the source and target squares, the moving
//! piece, the captured piece type (if any), the promotion piece type (if
//! any), and flags for the two special pawn/king moves that don't follow
//! from the squares alone.
//!
//! The all-zero value doubles as the null move, which is safe because no
//! real move has an identical source and target square.

use crate::piece::{Piece, PieceType};
use crate::square::Square;
use anyhow::anyhow;
use std::fmt::Display;
use std::str::FromStr;

/// Pack all the metadata related to a move in a u32:
///
///  8 bits for the source square (as its 0x88 index)
///  8 bits for the target square
///  4 bits for the moving piece
///  3 bits for the captured piece type (offset by one, 0 meaning "none")
///  3 bits for the promotion piece type (offset by one, 0 meaning "none")
///  2 bits of flags (en-passant, castle)
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Move(u32);

impl Move {
    pub const NULL: Move = Move(0);

    const FROM_SHIFT: u32 = 0;
    const TO_SHIFT: u32 = 8;
    const PIECE_SHIFT: u32 = 16;
    const CAPTURE_SHIFT: u32 = 20;
    const PROMO_SHIFT: u32 = 23;
    const EP_FLAG: u32 = 1 << 26;
    const CASTLE_FLAG: u32 = 1 << 27;

    /// Create a quiet move.
    pub fn new(src: Square, tgt: Square, piece: Piece) -> Move {
        Move(
            (src.0 as u32) << Self::FROM_SHIFT
                | (tgt.0 as u32) << Self::TO_SHIFT
                | (piece as u32) << Self::PIECE_SHIFT,
        )
    }

    /// Create a capture of the piece type sitting on the target square.
    pub fn new_capture(src: Square, tgt: Square, piece: Piece, victim: PieceType) -> Move {
        Move(Move::new(src, tgt, piece).0 | (victim as u32 + 1) << Self::CAPTURE_SHIFT)
    }

    /// Create a promotion, capturing or not.
    pub fn new_promotion(
        src: Square,
        tgt: Square,
        piece: Piece,
        promo: PieceType,
        victim: Option<PieceType>,
    ) -> Move {
        let base = match victim {
            Some(victim) => Move::new_capture(src, tgt, piece, victim),
            None => Move::new(src, tgt, piece),
        };

        Move(base.0 | (promo as u32 + 1) << Self::PROMO_SHIFT)
    }

    /// Create an en-passant capture. The captured pawn does not sit on the
    /// target square; the board derives its square from the target.
    pub fn new_en_passant(src: Square, tgt: Square, piece: Piece) -> Move {
        Move(Move::new_capture(src, tgt, piece, PieceType::Pawn).0 | Self::EP_FLAG)
    }

    /// Create a castling move, encoded as the king's trip.
    pub fn new_castle(src: Square, tgt: Square, piece: Piece) -> Move {
        Move(Move::new(src, tgt, piece).0 | Self::CASTLE_FLAG)
    }

    pub fn src(self) -> Square {
        Square((self.0 >> Self::FROM_SHIFT) as u8)
    }

    pub fn tgt(self) -> Square {
        Square((self.0 >> Self::TO_SHIFT) as u8)
    }

    /// The moving piece. For castles, the king.
    pub fn piece(self) -> Piece {
        Piece::ALL[(self.0 >> Self::PIECE_SHIFT) as usize & 0xF]
    }

    pub fn piece_type(self) -> PieceType {
        self.piece().piece_type()
    }

    /// The type of the captured piece, if the move is a capture.
    pub fn captured_type(self) -> Option<PieceType> {
        match (self.0 >> Self::CAPTURE_SHIFT) & 0x7 {
            0 => None,
            n => Some(PieceType::ALL[n as usize - 1]),
        }
    }

    /// The piece type the pawn promotes into, if the move is a promotion.
    pub fn promo_type(self) -> Option<PieceType> {
        match (self.0 >> Self::PROMO_SHIFT) & 0x7 {
            0 => None,
            n => Some(PieceType::ALL[n as usize - 1]),
        }
    }

    pub fn is_capture(self) -> bool {
        (self.0 >> Self::CAPTURE_SHIFT) & 0x7 != 0
    }

    pub fn is_promotion(self) -> bool {
        (self.0 >> Self::PROMO_SHIFT) & 0x7 != 0
    }

    pub fn is_en_passant(self) -> bool {
        self.0 & Self::EP_FLAG != 0
    }

    pub fn is_castle(self) -> bool {
        self.0 & Self::CASTLE_FLAG != 0
    }

    /// Captures and promotions; everything the tactical generator produces.
    pub fn is_tactical(self) -> bool {
        self.is_capture() || self.is_promotion()
    }

    pub fn is_quiet(self) -> bool {
        !self.is_tactical()
    }

    pub fn is_null(self) -> bool {
        self == Self::NULL
    }

    /// Forget everything but the wire representation.
    pub fn bare(self) -> BareMove {
        BareMove {
            src: self.src(),
            tgt: self.tgt(),
            promo: self.promo_type(),
        }
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.bare())
    }
}

////////////////////////////////////////////////////////////////////////////////
//
// Bare moves
//
////////////////////////////////////////////////////////////////////////////////

/// The bare coordinate form of a move, as it travels over the UCI wire:
/// source square, target square and an optional promotion ("e7e8q").
///
/// A bare move knows nothing about the board, so it can't tell whether it's
/// a capture or a castle; the board resolves it against its legal moves.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct BareMove {
    pub src: Square,
    pub tgt: Square,
    pub promo: Option<PieceType>,
}

impl Display for BareMove {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.src, self.tgt)?;

        if let Some(promo) = self.promo {
            let label = match promo {
                PieceType::Knight => "n",
                PieceType::Bishop => "b",
                PieceType::Rook => "r",
                _ => "q",
            };

            write!(f, "{label}")?;
        }

        Ok(())
    }
}

impl FromStr for BareMove {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        if s.len() < 4 {
            Err(anyhow!("Not a valid move string: {s}"))?;
        }

        let src: Square = s[0..2].parse()?;
        let tgt: Square = s[2..4].parse()?;

        let promo = match s.get(4..5) {
            Some("n") | Some("N") => Some(PieceType::Knight),
            Some("b") | Some("B") => Some(PieceType::Bishop),
            Some("r") | Some("R") => Some(PieceType::Rook),
            Some("q") | Some("Q") => Some(PieceType::Queen),
            Some(other) => Err(anyhow!("Not a valid promotion label: {other}"))?,
            None => None,
        };

        Ok(BareMove { src, tgt, promo })
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
    use crate::piece::Piece::*;

    #[test]
    fn accessors_roundtrip() {
        let mv = Move::new_capture(Square::E4, Square::D5, WP, PieceType::Pawn);
        assert_eq!(mv.src(), Square::E4);
        assert_eq!(mv.tgt(), Square::D5);
        assert_eq!(mv.piece(), WP);
        assert_eq!(mv.captured_type(), Some(PieceType::Pawn));
        assert!(mv.is_capture());
        assert!(!mv.is_promotion());
        assert!(!mv.is_en_passant());

        let mv = Move::new_promotion(Square::E7, Square::E8, WP, PieceType::Queen, None);
        assert_eq!(mv.promo_type(), Some(PieceType::Queen));
        assert!(mv.is_promotion());
        assert!(!mv.is_capture());
        assert!(mv.is_tactical());

        let mv = Move::new_castle(Square::E1, Square::G1, WK);
        assert!(mv.is_castle());
        assert!(mv.is_quiet());
    }

    #[test]
    fn null_move_is_zero() {
        assert!(Move::NULL.is_null());
        assert!(!Move::new(Square::G1, Square::F3, WN).is_null());
    }

    #[test]
    fn bare_move_parsing() {
        let mv: BareMove = "e2e4".parse().unwrap();
        assert_eq!(mv.src, Square::E2);
        assert_eq!(mv.tgt, Square::E4);
        assert_eq!(mv.promo, None);

        let mv: BareMove = "e7e8q".parse().unwrap();
        assert_eq!(mv.promo, Some(PieceType::Queen));
        assert_eq!(mv.to_string(), "e7e8q");

        assert!("e9".parse::<BareMove>().is_err());
    }
}
