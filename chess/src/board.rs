//! The board state and the logic for playing and taking back moves.
//!
//! `Position` is the central type of this crate. Besides the raw 0x88 board
//! array it carries a set of denormalized fields (dense piece lists, piece
//! counts, running material and piece-square totals, the Zobrist hash) that
//! `do_move`/`undo_move` keep in sync at all times. The search core only
//! ever reads these fields.
//!
//! Two invariants are worth calling out:
//!
//! 1. `pieces[side][0]` is always the king of that side.
//! 2. After any `do_move`/`undo_move` pair, every denormalized field equals
//!    a full recomputation from the board array (`assert_valid`).

use crate::attacks::{direction, possible_attack, PAWN_PUSH};
use crate::castling::{CastleType, CastlingRights};
use crate::moves::{BareMove, Move};
use crate::piece::{Color, Piece, PieceType};
use crate::psqt::{material_value, psqt};
use crate::square::Square;
use crate::zobrist::ZHash;
use arrayvec::ArrayVec;
use colored::Colorize;
use std::fmt::Display;

/// A full chess position.
#[derive(Debug, Clone)]
pub struct Position {
    /// The board array, indexed by 0x88 square.
    pub board: [Option<Piece>; Square::COUNT],

    /// The side to move.
    pub side: Color,

    /// The remaining castling rights for both players.
    pub castling: CastlingRights,

    /// The square a pawn can currently be captured en-passant on.
    pub en_passant: Option<Square>,

    /// Half-moves since the last capture or pawn move, for the fifty move
    /// rule.
    pub halfmove_clock: u32,

    /// The full-move counter, incremented after Black's move.
    pub fullmove: u32,

    /// The Zobrist hash of the position.
    pub hash: ZHash,

    /// Running total of each side's non-king material, in centipawns.
    pub material_eval: [i32; 2],

    /// Running total of each side's piece-square bonuses.
    pub piece_square_eval: [i32; 2],

    /// The number of pieces of each type, per side.
    pub piece_count: [[u8; PieceType::COUNT]; 2],

    /// Dense square lists of each side's non-pawn pieces. The king sits at
    /// index 0.
    pub pieces: [ArrayVec<Square, 16>; 2],

    /// Dense square lists of each side's pawns.
    pub pawns: [ArrayVec<Square, 8>; 2],

    /// For every occupied square, the index of that square within its piece
    /// list.
    index: [u8; Square::COUNT],

    /// The hashes of all positions played so far, for repetition detection.
    history: Vec<ZHash>,
}

/// The irreversible state that `undo_move` can't reconstruct from the move
/// alone.
#[derive(Debug, Default, Copy, Clone)]
pub struct UndoInfo {
    castling: CastlingRights,
    en_passant: Option<Square>,
    halfmove_clock: u32,
    hash: ZHash,
}

impl Position {
    /// An empty board, used as the starting point for FEN parsing.
    pub fn empty() -> Self {
        Self {
            board: [None; Square::COUNT],
            side: Color::White,
            castling: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove: 1,
            hash: ZHash::NULL,
            material_eval: [0; 2],
            piece_square_eval: [0; 2],
            piece_count: [[0; PieceType::COUNT]; 2],
            pieces: [ArrayVec::new_const(), ArrayVec::new_const()],
            pawns: [ArrayVec::new_const(), ArrayVec::new_const()],
            index: [0; Square::COUNT],
            history: Vec::new(),
        }
    }

    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.board[sq]
    }

    pub fn king_square(&self, side: Color) -> Square {
        self.pieces[side][0]
    }

    /// The number of non-pawn pieces of a side, king included.
    pub fn num_pieces(&self, side: Color) -> usize {
        self.pieces[side].len()
    }

    pub fn num_pawns(&self, side: Color) -> usize {
        self.pawns[side].len()
    }

    ////////////////////////////////////////////////////////////////////////////
    //
    // Low-level board surgery
    //
    // These maintain the board array, the piece lists and the running totals,
    // but deliberately not the hash: `do_move` owns the hash updates, and
    // `undo_move` restores the hash wholesale from the undo record.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub(crate) fn put(&mut self, piece: Piece, sq: Square) {
        let side = piece.color();
        debug_assert!(self.board[sq].is_none());
        self.board[sq] = Some(piece);

        if piece.is_pawn() {
            self.index[sq] = self.pawns[side].len() as u8;
            self.pawns[side].push(sq);
        } else if piece.is_king() {
            // The king claims slot 0, wherever it shows up in setup order.
            self.pieces[side].insert(0, sq);
            for (i, &s) in self.pieces[side].iter().enumerate() {
                self.index[s] = i as u8;
            }
        } else {
            self.index[sq] = self.pieces[side].len() as u8;
            self.pieces[side].push(sq);
        }

        self.piece_count[side][piece.piece_type()] += 1;
        if !piece.is_king() {
            self.material_eval[side] += material_value(piece.piece_type());
        }
        self.piece_square_eval[side] += psqt(piece, sq);
    }

    pub(crate) fn take(&mut self, sq: Square) -> Piece {
        let piece = self.board[sq].take().unwrap();
        let side = piece.color();
        let i = self.index[sq] as usize;

        if piece.is_pawn() {
            debug_assert_eq!(self.pawns[side][i], sq);
            self.pawns[side].swap_remove(i);
            if let Some(&moved) = self.pawns[side].get(i) {
                self.index[moved] = i as u8;
            }
        } else {
            debug_assert!(i != 0, "captured a king");
            debug_assert_eq!(self.pieces[side][i], sq);
            self.pieces[side].swap_remove(i);
            if let Some(&moved) = self.pieces[side].get(i) {
                self.index[moved] = i as u8;
            }
        }

        self.piece_count[side][piece.piece_type()] -= 1;
        if !piece.is_king() {
            self.material_eval[side] -= material_value(piece.piece_type());
        }
        self.piece_square_eval[side] -= psqt(piece, sq);

        piece
    }

    fn shift(&mut self, from: Square, to: Square) {
        let piece = self.board[from].take().unwrap();
        debug_assert!(self.board[to].is_none());
        self.board[to] = Some(piece);

        let side = piece.color();
        let i = self.index[from] as usize;
        self.index[to] = i as u8;

        if piece.is_pawn() {
            self.pawns[side][i] = to;
        } else {
            self.pieces[side][i] = to;
        }

        self.piece_square_eval[side] += psqt(piece, to) - psqt(piece, from);
    }

    ////////////////////////////////////////////////////////////////////////////
    //
    // Playing moves
    //
    ////////////////////////////////////////////////////////////////////////////

    /// Play a move, storing the irreversible state into `undo` so the move
    /// can be taken back later.
    ///
    /// The move must be pseudo-legal; full legality is the caller's problem.
    pub fn do_move(&mut self, mv: Move, undo: &mut UndoInfo) {
        let us = self.side;
        let src = mv.src();
        let tgt = mv.tgt();
        let piece = mv.piece();
        debug_assert_eq!(self.board[src], Some(piece));

        *undo = UndoInfo {
            castling: self.castling,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            hash: self.hash,
        };
        self.history.push(self.hash);

        if let Some(ep) = self.en_passant {
            self.hash.toggle_ep(ep.file());
        }
        self.en_passant = None;
        self.halfmove_clock += 1;

        if mv.is_capture() {
            let cap_sq = if mv.is_en_passant() {
                tgt.offset(-PAWN_PUSH[us]).unwrap()
            } else {
                tgt
            };

            let victim = self.take(cap_sq);
            self.hash.toggle_piece(victim, cap_sq);
            self.halfmove_clock = 0;
        }

        self.shift(src, tgt);
        self.hash.toggle_piece(piece, src);
        self.hash.toggle_piece(piece, tgt);

        if piece.is_pawn() {
            self.halfmove_clock = 0;

            if let Some(promo) = mv.promo_type() {
                let promoted = Piece::new(promo, us);
                self.take(tgt);
                self.put(promoted, tgt);
                self.hash.toggle_piece(piece, tgt);
                self.hash.toggle_piece(promoted, tgt);
            } else if tgt.0 as i32 - src.0 as i32 == 2 * PAWN_PUSH[us] {
                let ep = src.offset(PAWN_PUSH[us]).unwrap();
                self.en_passant = Some(ep);
                self.hash.toggle_ep(ep.file());
            }
        }

        if mv.is_castle() {
            let castle = CastleType::from_king_trip(src, tgt).unwrap();
            let rook = Piece::new(PieceType::Rook, us);
            self.shift(castle.rook_src(), castle.rook_tgt());
            self.hash.toggle_piece(rook, castle.rook_src());
            self.hash.toggle_piece(rook, castle.rook_tgt());
        }

        let retained = CastlingRights::retained(src) & CastlingRights::retained(tgt);
        if self.castling.0 & !retained != 0 {
            self.hash.toggle_castling(self.castling.0);
            self.castling.0 &= retained;
            self.hash.toggle_castling(self.castling.0);
        }

        if us.is_black() {
            self.fullmove += 1;
        }
        self.side = !us;
        self.hash.toggle_side();

        self.assert_valid();
    }

    /// Take back a move played by `do_move`, restoring the irreversible
    /// state from the matching `undo` record.
    pub fn undo_move(&mut self, mv: Move, undo: &UndoInfo) {
        let us = !self.side;
        let src = mv.src();
        let tgt = mv.tgt();

        self.side = us;
        if us.is_black() {
            self.fullmove -= 1;
        }

        if mv.is_castle() {
            let castle = CastleType::from_king_trip(src, tgt).unwrap();
            self.shift(castle.rook_tgt(), castle.rook_src());
        }

        if mv.is_promotion() {
            self.take(tgt);
            self.put(Piece::new(PieceType::Pawn, us), tgt);
        }

        self.shift(tgt, src);

        if mv.is_capture() {
            let cap_sq = if mv.is_en_passant() {
                tgt.offset(-PAWN_PUSH[us]).unwrap()
            } else {
                tgt
            };

            self.put(Piece::new(mv.captured_type().unwrap(), !us), cap_sq);
        }

        self.castling = undo.castling;
        self.en_passant = undo.en_passant;
        self.halfmove_clock = undo.halfmove_clock;
        self.hash = undo.hash;
        self.history.pop();

        self.assert_valid();
    }

    /// Resolve a bare UCI move against the legal moves and play it.
    pub fn play_bare_move(&mut self, bare: BareMove) -> anyhow::Result<()> {
        let mv = self
            .find_move(bare)
            .ok_or_else(|| anyhow::anyhow!("Illegal move: {bare}"))?;

        let mut undo = UndoInfo::default();
        self.do_move(mv, &mut undo);
        Ok(())
    }

    ////////////////////////////////////////////////////////////////////////////
    //
    // Attacks and legality
    //
    ////////////////////////////////////////////////////////////////////////////

    /// Is `sq` attacked by any piece of the given side?
    pub fn is_attacked(&self, sq: Square, by: Color) -> bool {
        self.is_attacked_skip(sq, by, None)
    }

    /// Like `is_attacked`, but treating `skipped` as empty. Used for king
    /// flight squares, where the king itself would otherwise block the very
    /// slider that's checking it.
    pub(crate) fn is_attacked_skip(&self, sq: Square, by: Color, skipped: Option<Square>) -> bool {
        let pawn = Piece::new(PieceType::Pawn, by);
        for &from in &self.pawns[by] {
            if possible_attack(from, sq, pawn) {
                return true;
            }
        }

        for &from in &self.pieces[by] {
            let piece = self.board[from].unwrap();
            if !possible_attack(from, sq, piece) {
                continue;
            }
            if !piece.is_slider() || self.clear_path(from, sq, skipped) {
                return true;
            }
        }

        false
    }

    /// All squares from which `side` attacks `sq`.
    pub fn attackers(&self, sq: Square, side: Color) -> ArrayVec<Square, 24> {
        let mut found = ArrayVec::new();

        let pawn = Piece::new(PieceType::Pawn, side);
        for &from in &self.pawns[side] {
            if possible_attack(from, sq, pawn) {
                found.push(from);
            }
        }

        for &from in &self.pieces[side] {
            let piece = self.board[from].unwrap();
            if !possible_attack(from, sq, piece) {
                continue;
            }
            if !piece.is_slider() || self.clear_path(from, sq, None) {
                found.push(from);
            }
        }

        found
    }

    /// Are all squares strictly between `from` and `to` empty?
    pub(crate) fn clear_path(&self, from: Square, to: Square, skipped: Option<Square>) -> bool {
        let dir = direction(from, to);
        debug_assert!(dir != 0);

        let mut sq = from.offset(dir).unwrap();
        while sq != to {
            if self.board[sq].is_some() && Some(sq) != skipped {
                return false;
            }
            sq = sq.offset(dir).unwrap();
        }

        true
    }

    /// Is the side to move in check?
    pub fn is_check(&self) -> bool {
        self.is_attacked(self.king_square(self.side), !self.side)
    }

    /// Verify that a move is pseudo-legal in this position: the right piece
    /// on the right square, a coherent capture, a clear path. Needed for
    /// moves that come from outside the generators (hash moves, killers),
    /// which were legal in *some* position, just maybe not this one.
    pub fn is_pseudo_move_legal(&self, mv: Move) -> bool {
        if mv.is_null() {
            return false;
        }

        let src = mv.src();
        let tgt = mv.tgt();
        if !src.is_valid() || !tgt.is_valid() {
            return false;
        }

        let piece = mv.piece();
        if piece.color() != self.side || self.board[src] != Some(piece) {
            return false;
        }

        if mv.is_castle() {
            let Some(castle) = CastleType::from_king_trip(src, tgt) else {
                return false;
            };
            return piece.is_king() && castle.color() == self.side && self.can_castle(castle);
        }

        if mv.is_en_passant() {
            if self.en_passant != Some(tgt) || !piece.is_pawn() {
                return false;
            }
            let Some(cap_sq) = tgt.offset(-PAWN_PUSH[self.side]) else {
                return false;
            };
            return self.board[cap_sq] == Some(Piece::new(PieceType::Pawn, !self.side))
                && possible_attack(src, tgt, piece);
        }

        match mv.captured_type() {
            Some(PieceType::King) => return false,
            Some(victim) => match self.board[tgt] {
                Some(target) => {
                    if target.color() == self.side || target.piece_type() != victim {
                        return false;
                    }
                }
                None => return false,
            },
            None => {
                if self.board[tgt].is_some() {
                    return false;
                }
            }
        }

        if piece.is_pawn() {
            if mv.is_promotion() != (tgt.relative_rank(self.side) == 7) {
                return false;
            }

            if mv.is_capture() {
                return possible_attack(src, tgt, piece);
            }

            let push = PAWN_PUSH[self.side];
            let diff = tgt.0 as i32 - src.0 as i32;

            return diff == push
                || (diff == 2 * push
                    && src.relative_rank(self.side) == 1
                    && self.board[src.offset(push).unwrap()].is_none());
        }

        if mv.is_promotion() {
            return false;
        }

        possible_attack(src, tgt, piece) && (!piece.is_slider() || self.clear_path(src, tgt, None))
    }

    /// A sanity test for moves pulled out of the transposition table, which
    /// under a hash collision can be an arbitrary bit pattern.
    pub fn is_plausible_move_legal(&self, mv: Move) -> bool {
        self.is_pseudo_move_legal(mv)
    }

    /// Full legality: play the move and verify our king isn't left hanging.
    /// The move must already be pseudo-legal.
    pub fn is_move_legal(&mut self, mv: Move) -> bool {
        let mut undo = UndoInfo::default();
        self.do_move(mv, &mut undo);
        let legal = !self.is_attacked(self.king_square(!self.side), self.side);
        self.undo_move(mv, &undo);

        legal
    }

    /// Can this castle be played right now? Checks rights, emptiness, and
    /// that the king doesn't pass through an attacked square.
    pub fn can_castle(&self, castle: CastleType) -> bool {
        if !self.castling.has(castle) {
            return false;
        }

        let rook = Piece::new(PieceType::Rook, castle.color());
        if self.board[castle.rook_src()] != Some(rook) {
            return false;
        }

        if castle.vacated().iter().any(|&sq| self.board[sq].is_some()) {
            return false;
        }

        let them = !castle.color();
        !castle.safe().iter().any(|&sq| self.is_attacked(sq, them))
    }

    ////////////////////////////////////////////////////////////////////////////
    //
    // Repetitions
    //
    ////////////////////////////////////////////////////////////////////////////

    /// Has the current position occurred at least `count` times, the current
    /// occurrence included? Only positions since the last irreversible move
    /// can repeat, so the scan is bounded by the halfmove clock.
    pub fn is_repetition(&self, count: usize) -> bool {
        let mut seen = 1;

        for &hash in self
            .history
            .iter()
            .rev()
            .take(self.halfmove_clock as usize)
            .skip(1)
            .step_by(2)
        {
            if hash == self.hash {
                seen += 1;
                if seen >= count {
                    return true;
                }
            }
        }

        false
    }

    ////////////////////////////////////////////////////////////////////////////
    //
    // Validation
    //
    ////////////////////////////////////////////////////////////////////////////

    /// Recompute the hash from scratch. Used when setting up a position and
    /// to validate the incremental updates in debug builds.
    pub fn recompute_hash(&self) -> ZHash {
        let mut hash = ZHash::NULL;

        for sq in Square::all() {
            if let Some(piece) = self.board[sq] {
                hash.toggle_piece(piece, sq);
            }
        }

        if self.side.is_black() {
            hash.toggle_side();
        }
        hash.toggle_castling(self.castling.0);
        if let Some(ep) = self.en_passant {
            hash.toggle_ep(ep.file());
        }

        hash
    }

    /// Cross-check every denormalized field against a full recomputation
    /// from the board array. Compiled away in release builds.
    pub fn assert_valid(&self) {
        #[cfg(debug_assertions)]
        {
            let mut material = [0i32; 2];
            let mut pst = [0i32; 2];
            let mut counts = [[0u8; PieceType::COUNT]; 2];

            for sq in Square::all() {
                if let Some(piece) = self.board[sq] {
                    let side = piece.color();
                    counts[side][piece.piece_type()] += 1;
                    if !piece.is_king() {
                        material[side] += material_value(piece.piece_type());
                    }
                    pst[side] += psqt(piece, sq);

                    let i = self.index[sq] as usize;
                    if piece.is_pawn() {
                        assert_eq!(self.pawns[side][i], sq);
                    } else {
                        assert_eq!(self.pieces[side][i], sq);
                    }
                }
            }

            assert_eq!(self.material_eval, material);
            assert_eq!(self.piece_square_eval, pst);
            assert_eq!(self.piece_count, counts);
            assert_eq!(self.hash, self.recompute_hash());

            for side in [Color::White, Color::Black] {
                assert_eq!(
                    self.board[self.pieces[side][0]],
                    Some(Piece::new(PieceType::King, side))
                );
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
//
// Utility traits
//
////////////////////////////////////////////////////////////////////////////////

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", "  a b c d e f g h".bright_blue())?;

        for rank in (0..8).rev() {
            write!(f, "{} ", (rank + 1).to_string().bright_blue())?;

            for file in 0..8 {
                match self.board[Square::new(file, rank)] {
                    Some(piece) => write!(f, "{piece} ")?,
                    None => write!(f, "{} ", ".".bright_black())?,
                }
            }

            writeln!(f, "{}", (rank + 1).to_string().bright_blue())?;
        }

        writeln!(f, "{}", "  a b c d e f g h".bright_blue())
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

    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

    fn snapshot(pos: &Position) -> (ZHash, [i32; 2], [i32; 2], [[u8; 6]; 2]) {
        (
            pos.hash,
            pos.material_eval,
            pos.piece_square_eval,
            pos.piece_count,
        )
    }

    #[test]
    fn do_undo_roundtrip() {
        let mut pos: Position = KIWIPETE.parse().unwrap();
        let before = snapshot(&pos);

        // A capture, a castle, a quiet move and an en-passant setup, played
        // and unwound in LIFO order.
        let mut moves = Vec::new();
        for mv in [
            "e5g6", // knight takes pawn
            "b4c3", // pawn takes knight
            "e1g1", // white castles short
            "e7d6", // quiet queen move
        ] {
            let bare: BareMove = mv.parse().unwrap();
            let mv = pos.find_move(bare).unwrap();
            let mut undo = UndoInfo::default();
            pos.do_move(mv, &mut undo);
            moves.push((mv, undo));
        }

        assert_ne!(snapshot(&pos), before);

        for (mv, undo) in moves.into_iter().rev() {
            pos.undo_move(mv, &undo);
        }

        assert_eq!(snapshot(&pos), before);
        assert_eq!(pos.castling, CastlingRights::ALL);
        assert_eq!(pos.side, Color::White);
    }

    #[test]
    fn en_passant_roundtrip() {
        let mut pos: Position =
            "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3"
                .parse()
                .unwrap();
        let before = snapshot(&pos);

        let mv = pos.find_move("e5f6".parse().unwrap()).unwrap();
        assert!(mv.is_en_passant());

        let mut undo = UndoInfo::default();
        pos.do_move(mv, &mut undo);
        assert_eq!(pos.piece_at(Square::new(5, 4)), None); // f5 pawn gone
        pos.undo_move(mv, &undo);

        assert_eq!(snapshot(&pos), before);
    }

    #[test]
    fn promotion_roundtrip() {
        let mut pos: Position = "8/2k2P2/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
        let before = snapshot(&pos);

        let mv = pos.find_move("f7f8q".parse().unwrap()).unwrap();
        let mut undo = UndoInfo::default();
        pos.do_move(mv, &mut undo);

        assert_eq!(pos.piece_at(Square::new(5, 7)), Some(Piece::WQ));
        assert_eq!(pos.piece_count[Color::White][PieceType::Pawn], 0);

        pos.undo_move(mv, &undo);
        assert_eq!(snapshot(&pos), before);
    }

    #[test]
    fn attacks() {
        let pos: Position = KIWIPETE.parse().unwrap();

        // The f3 queen eyes f7, but f6 is covered by black too.
        assert!(pos.is_attacked(Square::new(5, 6), Color::White));
        assert!(pos.is_attacked(Square::new(5, 5), Color::Black));
        assert!(!pos.is_check());
    }

    #[test]
    fn threefold_repetition() {
        let mut pos = Position::default();

        for mv in ["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8"] {
            assert!(!pos.is_repetition(3));
            pos.play_bare_move(mv.parse().unwrap()).unwrap();
        }

        assert!(pos.is_repetition(3));
        assert!(pos.is_repetition(2));
    }

    #[test]
    fn pseudo_legality_rejects_stale_moves() {
        let mut pos = Position::default();
        let nf3 = pos.find_move("g1f3".parse().unwrap()).unwrap();

        assert!(pos.is_pseudo_move_legal(nf3));

        // After playing it, the same move is no longer pseudo-legal: the
        // knight is gone from g1 (and it's Black's turn besides).
        let mut undo = UndoInfo::default();
        pos.do_move(nf3, &mut undo);
        assert!(!pos.is_pseudo_move_legal(nf3));
    }
}
