//! Pseudo-legal move generation.
//!
//! The generators are split along the lines the search wants to consume
//! them in: quiet moves, tactical moves (captures and promotions),
//! quiescence moves (captures, queen promotions and optionally direct
//! checks), and check evasions. All of them produce pseudo-legal moves;
//! whether a move leaves its own king hanging is the caller's concern,
//! except for evasion king steps, which are filtered against attacked
//! squares on the spot.

use crate::attacks::{
    direction, possible_attack, BISHOP_DIRS, KING_DELTAS, KNIGHT_DELTAS, PAWN_CAPTURES, PAWN_PUSH,
    ROOK_DIRS,
};
use crate::board::Position;
use crate::castling::CastleType;
use crate::moves::{BareMove, Move};
use crate::piece::{Piece, PieceType};
use crate::square::Square;
use arrayvec::ArrayVec;
use PieceType::*;

/// An upper bound on the number of moves in any reachable position.
pub const MAX_MOVES: usize = 256;

/// The fixed-capacity list all generators write into.
pub type MoveList = ArrayVec<Move, MAX_MOVES>;

/// The promotion piece types, most valuable first.
const PROMOTIONS: [PieceType; 4] = [Queen, Rook, Bishop, Knight];

impl Position {
    ////////////////////////////////////////////////////////////////////////////
    //
    // Quiet moves
    //
    ////////////////////////////////////////////////////////////////////////////

    /// Generate all pseudo-legal non-captures and non-promotions: piece
    /// moves to empty squares, pawn pushes, castles.
    pub fn generate_pseudo_quiet_moves(&self, moves: &mut MoveList) {
        let us = self.side;

        for castle in CastleType::ALL {
            if castle.color() == us && self.can_castle(castle) {
                moves.push(Move::new_castle(
                    castle.king_src(),
                    castle.king_tgt(),
                    Piece::new(King, us),
                ));
            }
        }

        let pawn = Piece::new(Pawn, us);
        let push = PAWN_PUSH[us];
        for &from in &self.pawns[us] {
            let to = from.offset(push).unwrap();
            if self.board[to].is_some() || to.relative_rank(us) == 7 {
                continue;
            }

            moves.push(Move::new(from, to, pawn));

            if from.relative_rank(us) == 1 {
                let to = from.offset(2 * push).unwrap();
                if self.board[to].is_none() {
                    moves.push(Move::new(from, to, pawn));
                }
            }
        }

        for &from in &self.pieces[us] {
            let piece = self.board[from].unwrap();
            match piece.piece_type() {
                Knight => self.leaper_quiets(from, piece, &KNIGHT_DELTAS, moves),
                King => self.leaper_quiets(from, piece, &KING_DELTAS, moves),
                Bishop => self.slider_quiets(from, piece, &BISHOP_DIRS, moves),
                Rook => self.slider_quiets(from, piece, &ROOK_DIRS, moves),
                Queen => {
                    self.slider_quiets(from, piece, &BISHOP_DIRS, moves);
                    self.slider_quiets(from, piece, &ROOK_DIRS, moves);
                }
                Pawn => unreachable!(),
            }
        }
    }

    fn leaper_quiets(&self, from: Square, piece: Piece, deltas: &[i32], moves: &mut MoveList) {
        for &delta in deltas {
            if let Some(to) = from.offset(delta) {
                if self.board[to].is_none() {
                    moves.push(Move::new(from, to, piece));
                }
            }
        }
    }

    fn slider_quiets(&self, from: Square, piece: Piece, dirs: &[i32], moves: &mut MoveList) {
        for &dir in dirs {
            let mut to = from.offset(dir);
            while let Some(sq) = to {
                if self.board[sq].is_some() {
                    break;
                }
                moves.push(Move::new(from, sq, piece));
                to = sq.offset(dir);
            }
        }
    }

    ////////////////////////////////////////////////////////////////////////////
    //
    // Tactical moves
    //
    ////////////////////////////////////////////////////////////////////////////

    /// Generate all pseudo-legal captures and promotions.
    pub fn generate_pseudo_tactical_moves(&self, moves: &mut MoveList) {
        let us = self.side;
        let pawn = Piece::new(Pawn, us);
        let push = PAWN_PUSH[us];

        for &from in &self.pawns[us] {
            for &delta in &PAWN_CAPTURES[us] {
                let Some(to) = from.offset(delta) else {
                    continue;
                };

                if self.en_passant == Some(to) {
                    moves.push(Move::new_en_passant(from, to, pawn));
                    continue;
                }

                let Some(victim) = self.board[to] else {
                    continue;
                };
                if victim.color() == us {
                    continue;
                }

                if to.relative_rank(us) == 7 {
                    for promo in PROMOTIONS {
                        moves.push(Move::new_promotion(
                            from,
                            to,
                            pawn,
                            promo,
                            Some(victim.piece_type()),
                        ));
                    }
                } else {
                    moves.push(Move::new_capture(from, to, pawn, victim.piece_type()));
                }
            }

            let to = from.offset(push).unwrap();
            if to.relative_rank(us) == 7 && self.board[to].is_none() {
                for promo in PROMOTIONS {
                    moves.push(Move::new_promotion(from, to, pawn, promo, None));
                }
            }
        }

        for &from in &self.pieces[us] {
            let piece = self.board[from].unwrap();
            match piece.piece_type() {
                Knight => self.leaper_captures(from, piece, &KNIGHT_DELTAS, moves),
                King => self.leaper_captures(from, piece, &KING_DELTAS, moves),
                Bishop => self.slider_captures(from, piece, &BISHOP_DIRS, moves),
                Rook => self.slider_captures(from, piece, &ROOK_DIRS, moves),
                Queen => {
                    self.slider_captures(from, piece, &BISHOP_DIRS, moves);
                    self.slider_captures(from, piece, &ROOK_DIRS, moves);
                }
                Pawn => unreachable!(),
            }
        }
    }

    fn leaper_captures(&self, from: Square, piece: Piece, deltas: &[i32], moves: &mut MoveList) {
        let us = piece.color();

        for &delta in deltas {
            if let Some(to) = from.offset(delta) {
                if let Some(victim) = self.board[to] {
                    if victim.color() != us {
                        moves.push(Move::new_capture(from, to, piece, victim.piece_type()));
                    }
                }
            }
        }
    }

    fn slider_captures(&self, from: Square, piece: Piece, dirs: &[i32], moves: &mut MoveList) {
        let us = piece.color();

        for &dir in dirs {
            let mut to = from.offset(dir);
            while let Some(sq) = to {
                match self.board[sq] {
                    None => to = sq.offset(dir),
                    Some(victim) => {
                        if victim.color() != us {
                            moves.push(Move::new_capture(from, sq, piece, victim.piece_type()));
                        }
                        break;
                    }
                }
            }
        }
    }

    ////////////////////////////////////////////////////////////////////////////
    //
    // Quiescence moves
    //
    ////////////////////////////////////////////////////////////////////////////

    /// Generate the moves quiescence search looks at: captures and queen
    /// promotions, plus quiet moves that give a direct check when `checks`
    /// is set.
    pub fn generate_quiescence_moves(&self, moves: &mut MoveList, checks: bool) {
        let mut tacticals = MoveList::new();
        self.generate_pseudo_tactical_moves(&mut tacticals);

        for mv in tacticals {
            if mv.promo_type().map_or(true, |promo| promo == Queen) {
                moves.push(mv);
            }
        }

        if checks {
            self.generate_quiet_checks(moves);
        }
    }

    /// Quiet moves that deliver a direct check. Discovered checks are left
    /// for the regular search to find.
    fn generate_quiet_checks(&self, moves: &mut MoveList) {
        let ksq = self.king_square(!self.side);

        let mut quiets = MoveList::new();
        self.generate_pseudo_quiet_moves(&mut quiets);

        for mv in quiets {
            let (attacker, from) = if mv.is_castle() {
                let castle = CastleType::from_king_trip(mv.src(), mv.tgt()).unwrap();
                (Piece::new(Rook, self.side), castle.rook_tgt())
            } else {
                (mv.piece(), mv.tgt())
            };

            if !possible_attack(from, ksq, attacker) {
                continue;
            }

            // The checking path may pass over the square just vacated.
            if attacker.is_slider() && !self.clear_path(from, ksq, Some(mv.src())) {
                continue;
            }

            moves.push(mv);
        }
    }

    ////////////////////////////////////////////////////////////////////////////
    //
    // Check evasions
    //
    ////////////////////////////////////////////////////////////////////////////

    /// Generate moves that can resolve a check: king steps to unattacked
    /// squares, captures of a lone checker, and interpositions on a lone
    /// sliding checker.
    pub fn generate_evasions(&self, moves: &mut MoveList) {
        let us = self.side;
        let them = !us;
        let ksq = self.king_square(us);
        let king = Piece::new(King, us);

        let checkers = self.attackers(ksq, them);
        debug_assert!(!checkers.is_empty());

        for &delta in &KING_DELTAS {
            let Some(to) = ksq.offset(delta) else {
                continue;
            };

            if let Some(piece) = self.board[to] {
                if piece.color() == us {
                    continue;
                }
            }

            // Lift the king off the board, or stepping away along the
            // checking ray would look safe.
            if self.is_attacked_skip(to, them, Some(ksq)) {
                continue;
            }

            match self.board[to] {
                Some(victim) => moves.push(Move::new_capture(ksq, to, king, victim.piece_type())),
                None => moves.push(Move::new(ksq, to, king)),
            }
        }

        if checkers.len() != 1 {
            return;
        }

        let checker_sq = checkers[0];
        let checker = self.board[checker_sq].unwrap();

        for from in self.attackers(checker_sq, us) {
            let piece = self.board[from].unwrap();
            if piece.is_king() {
                continue;
            }

            if piece.is_pawn() && checker_sq.relative_rank(us) == 7 {
                for promo in PROMOTIONS {
                    moves.push(Move::new_promotion(
                        from,
                        checker_sq,
                        piece,
                        promo,
                        Some(checker.piece_type()),
                    ));
                }
            } else {
                moves.push(Move::new_capture(from, checker_sq, piece, checker.piece_type()));
            }
        }

        if let Some(ep) = self.en_passant {
            if checker.is_pawn() && Some(checker_sq) == ep.offset(-PAWN_PUSH[us]) {
                let pawn = Piece::new(Pawn, us);
                for &delta in &PAWN_CAPTURES[us] {
                    if let Some(from) = ep.offset(-delta) {
                        if self.board[from] == Some(pawn) {
                            moves.push(Move::new_en_passant(from, ep, pawn));
                        }
                    }
                }
            }
        }

        if checker.is_slider() {
            let dir = direction(checker_sq, ksq);
            let mut block_sq = checker_sq.offset(dir).unwrap();
            while block_sq != ksq {
                self.quiet_moves_to(block_sq, moves);
                block_sq = block_sq.offset(dir).unwrap();
            }
        }
    }

    /// All quiet ways `side` can put a piece on the (empty) target square.
    fn quiet_moves_to(&self, tgt: Square, moves: &mut MoveList) {
        let us = self.side;
        debug_assert!(self.board[tgt].is_none());

        for &from in &self.pieces[us] {
            let piece = self.board[from].unwrap();
            if piece.is_king() || !possible_attack(from, tgt, piece) {
                continue;
            }
            if piece.is_slider() && !self.clear_path(from, tgt, None) {
                continue;
            }
            moves.push(Move::new(from, tgt, piece));
        }

        let push = PAWN_PUSH[us];
        let pawn = Piece::new(Pawn, us);
        if let Some(from) = tgt.offset(-push) {
            if self.board[from] == Some(pawn) {
                if tgt.relative_rank(us) == 7 {
                    for promo in PROMOTIONS {
                        moves.push(Move::new_promotion(from, tgt, pawn, promo, None));
                    }
                } else {
                    moves.push(Move::new(from, tgt, pawn));
                }
            } else if self.board[from].is_none() {
                if let Some(from) = from.offset(-push) {
                    if self.board[from] == Some(pawn) && from.relative_rank(us) == 1 {
                        moves.push(Move::new(from, tgt, pawn));
                    }
                }
            }
        }
    }

    ////////////////////////////////////////////////////////////////////////////
    //
    // Aggregates
    //
    ////////////////////////////////////////////////////////////////////////////

    /// Generate every pseudo-legal move.
    pub fn generate_pseudo_moves(&self, moves: &mut MoveList) {
        self.generate_pseudo_tactical_moves(moves);
        self.generate_pseudo_quiet_moves(moves);
    }

    /// Generate all strictly legal moves.
    pub fn generate_legal_moves(&mut self) -> MoveList {
        let mut pseudo = MoveList::new();

        if self.is_check() {
            self.generate_evasions(&mut pseudo);
        } else {
            self.generate_pseudo_moves(&mut pseudo);
        }

        let mut legal = MoveList::new();
        for mv in pseudo {
            if self.is_move_legal(mv) {
                legal.push(mv);
            }
        }

        legal
    }

    /// Resolve a bare coordinate move against the legal moves.
    pub fn find_move(&mut self, bare: BareMove) -> Option<Move> {
        self.generate_legal_moves()
            .into_iter()
            .find(|mv| mv.src() == bare.src && mv.tgt() == bare.tgt && mv.promo_type() == bare.promo)
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
    fn startpos_moves() {
        let mut pos = Position::default();

        let mut quiets = MoveList::new();
        pos.generate_pseudo_quiet_moves(&mut quiets);
        assert_eq!(quiets.len(), 20);

        let mut tacticals = MoveList::new();
        pos.generate_pseudo_tactical_moves(&mut tacticals);
        assert!(tacticals.is_empty());

        assert_eq!(pos.generate_legal_moves().len(), 20);
    }

    #[test]
    fn kiwipete_legal_moves() {
        let mut pos: Position =
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1"
                .parse()
                .unwrap();

        assert_eq!(pos.generate_legal_moves().len(), 48);
    }

    #[test]
    fn rook_check_evasions() {
        let mut pos: Position = "4k3/8/8/8/8/8/4r3/4K3 w - - 0 1".parse().unwrap();
        assert!(pos.is_check());

        // Kxe2, Kd1 and Kf1; d2 and f2 stay covered by the rook.
        let legal = pos.generate_legal_moves();
        assert_eq!(legal.len(), 3);
    }

    #[test]
    fn single_evasion() {
        let mut pos: Position = "4k3/8/8/8/8/8/5nPP/7K w - - 0 1".parse().unwrap();
        assert!(pos.is_check());

        let mut evasions = MoveList::new();
        pos.generate_evasions(&mut evasions);
        assert_eq!(evasions.len(), 1);
        assert_eq!(evasions[0].tgt(), Square::new(6, 0));
    }

    #[test]
    fn back_rank_evasions() {
        // Rh1 checks along the back rank. Nothing can interpose on f1/g1,
        // but the bishop captures the checker, and the king steps up. Kd1
        // stays illegal because the rook x-rays through the lifted king.
        let mut pos: Position = "4k3/8/8/8/8/5B2/3R3P/4K2r w - - 0 1".parse().unwrap();
        assert!(pos.is_check());

        let legal = pos.generate_legal_moves();

        assert!(legal.iter().any(|mv| mv.is_capture() && mv.tgt() == Square::H1));
        assert!(legal.iter().any(|mv| mv.tgt() == Square::E2));
        assert!(!legal.iter().any(|mv| mv.tgt() == Square::D1));
        assert_eq!(legal.len(), 3);
    }

    #[test]
    fn quiescence_checks() {
        // With checks enabled, the quiet rook lift to d8 (a direct check on
        // the e8 king) shows up alongside the captures.
        let pos: Position = "4k3/8/8/8/8/8/8/3RK3 w - - 0 1".parse().unwrap();

        let mut moves = MoveList::new();
        pos.generate_quiescence_moves(&mut moves, true);

        assert!(moves
            .iter()
            .any(|mv| mv.piece() == Piece::WR && mv.tgt() == Square::D8 && mv.is_quiet()));
    }

    #[test]
    fn promotions_generated() {
        let pos: Position = "8/2k2P2/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();

        let mut tacticals = MoveList::new();
        pos.generate_pseudo_tactical_moves(&mut tacticals);
        assert_eq!(tacticals.len(), 4);

        // Quiescence keeps only the queen promotion.
        let mut quiescence = MoveList::new();
        pos.generate_quiescence_moves(&mut quiescence, false);
        assert_eq!(quiescence.len(), 1);
        assert_eq!(quiescence[0].promo_type(), Some(PieceType::Queen));
    }
}
