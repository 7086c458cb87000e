//! Static Exchange Evaluation
//!
//! SEE answers the question: if both sides keep trading pieces on this one
//! square, always recapturing with their least valuable attacker, who comes
//! out ahead? The move selector uses the sign of the answer to split
//! captures into good and bad tactics.
//!
//! The implementation runs the classic swap algorithm: build up the chain
//! of captures by repeatedly picking the cheapest attacker, then fold the
//! gains back with a minimax pass. Attackers are discovered lazily through
//! the 0x88 attack tables with already-traded pieces masked out, which
//! handles x-ray attackers (a rook behind a rook, a bishop behind a pawn)
//! for free.

use crate::attacks::{direction, possible_attack, PAWN_PUSH};
use crate::board::Position;
use crate::moves::Move;
use crate::piece::{Color, Piece, PieceType};
use crate::psqt::material_value;
use crate::square::Square;

impl Position {
    /// The net material outcome of the capture sequence started by `mv`,
    /// in centipawns. Positive means the exchange favors the moving side.
    pub fn static_exchange_eval(&self, mv: Move) -> i32 {
        let tgt = mv.tgt();
        let mut traded = [false; Square::COUNT];
        let mut gain = [0i32; 32];
        let mut depth = 0;

        // The piece that ends up on the target square after the first move.
        let mut on_target = match mv.promo_type() {
            Some(promo) => material_value(promo),
            None => material_value(mv.piece_type()),
        };

        gain[0] = match mv.captured_type() {
            Some(victim) => material_value(victim),
            None => 0,
        };
        if let Some(promo) = mv.promo_type() {
            gain[0] += material_value(promo) - material_value(PieceType::Pawn);
        }

        traded[mv.src()] = true;
        if mv.is_en_passant() {
            let cap_sq = tgt.offset(-PAWN_PUSH[self.side]).unwrap();
            traded[cap_sq] = true;
        }

        let mut side = !mv.piece().color();

        while let Some(from) = self.least_valuable_attacker(tgt, side, &traded) {
            depth += 1;
            gain[depth] = on_target - gain[depth - 1];

            on_target = material_value(self.board[from].unwrap().piece_type());
            traded[from] = true;
            side = !side;

            if depth == 31 {
                break;
            }
        }

        while depth > 0 {
            gain[depth - 1] = -i32::max(-gain[depth - 1], gain[depth]);
            depth -= 1;
        }

        gain[0]
    }

    /// The cheapest piece of `side` that attacks `sq`, ignoring pieces that
    /// already took part in the exchange. Masked-out pieces also don't block
    /// anymore, which is what reveals x-ray attackers.
    fn least_valuable_attacker(
        &self,
        sq: Square,
        side: Color,
        traded: &[bool; Square::COUNT],
    ) -> Option<Square> {
        let pawn = Piece::new(PieceType::Pawn, side);
        for &from in &self.pawns[side] {
            if !traded[from] && possible_attack(from, sq, pawn) {
                return Some(from);
            }
        }

        let mut best: Option<(Square, i32)> = None;

        for &from in &self.pieces[side] {
            if traded[from] {
                continue;
            }

            let piece = self.board[from].unwrap();
            if !possible_attack(from, sq, piece) {
                continue;
            }
            if piece.is_slider() && !self.clear_path_traded(from, sq, traded) {
                continue;
            }

            let value = material_value(piece.piece_type());
            if best.map_or(true, |(_, v)| value < v) {
                best = Some((from, value));
            }
        }

        best.map(|(from, _)| from)
    }

    /// Like `clear_path`, but squares whose piece was already traded off
    /// count as empty.
    fn clear_path_traded(&self, from: Square, to: Square, traded: &[bool; Square::COUNT]) -> bool {
        let dir = direction(from, to);
        debug_assert!(dir != 0);

        let mut sq = from.offset(dir).unwrap();
        while sq != to {
            if self.board[sq].is_some() && !traded[sq] {
                return false;
            }
            sq = sq.offset(dir).unwrap();
        }

        true
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
    use crate::movegen::MoveList;

    fn see_for(fen: &str, mv: &str) -> i32 {
        let mut pos: Position = fen.parse().unwrap();
        let mv = pos.find_move(mv.parse().unwrap()).unwrap();
        pos.static_exchange_eval(mv)
    }

    #[test]
    fn winning_capture() {
        // Pawn takes an undefended knight.
        assert_eq!(
            see_for("4k3/8/8/3n4/4P3/8/8/4K3 w - - 0 1", "e4d5"),
            material_value(PieceType::Knight)
        );
    }

    #[test]
    fn losing_capture() {
        // Rook takes a pawn defended by a pawn: wins 100, loses 500.
        assert_eq!(
            see_for("4k3/2p5/3p4/8/3R4/8/8/4K3 w - - 0 1", "d4d6"),
            material_value(PieceType::Pawn) - material_value(PieceType::Rook)
        );
    }

    #[test]
    fn even_exchange() {
        // Rook takes rook, recaptured by a rook.
        assert_eq!(see_for("3rk3/8/8/8/8/8/8/3RK3 w - - 0 1", "d1d8"), 0);
    }

    #[test]
    fn xray_support() {
        // Doubled rooks vs a lone defended pawn: Rxd5 is sound because the
        // second rook backs up the first.
        let fen = "3rk3/8/8/3p4/8/8/3R4/3RK3 w - - 0 1";
        assert!(see_for(fen, "d2d5") >= 0);
    }

    #[test]
    fn quiet_move_sees_zero() {
        let mut pos = Position::default();
        let mv = pos.find_move("g1f3".parse().unwrap()).unwrap();
        assert_eq!(pos.static_exchange_eval(mv), 0);
    }

    #[test]
    fn bad_captures_flagged_in_kiwipete() {
        let mut pos: Position =
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1"
                .parse()
                .unwrap();

        let mut tacticals = MoveList::new();
        pos.generate_pseudo_tactical_moves(&mut tacticals);

        // There's at least one losing and one winning capture in kiwipete.
        assert!(tacticals.iter().any(|&mv| pos.static_exchange_eval(mv) < 0));
        assert!(tacticals.iter().any(|&mv| pos.static_exchange_eval(mv) >= 0));
    }
}
