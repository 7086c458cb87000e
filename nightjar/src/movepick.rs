//! The move selector: lazy, phased move generation and ordering.
//!
//! Alpha-beta lives or dies by move ordering, and the best orderings are
//! expensive. The selector therefore never builds one big sorted list; it
//! works through a sequence of phases and only generates (let alone scores)
//! a class of moves when the previous classes have run dry. If the hash
//! move cuts off, nothing was ever generated at all.
//!
//! The phase sequence depends on the kind of node being searched:
//!
//! | Generator       | Phases                                          |
//! |-----------------|-------------------------------------------------|
//! | Root            | Root (pre-sorted)                               |
//! | Pv / NonPv      | Hash, GoodTactics, Killers, Quiet, BadTactics   |
//! | Escape          | Evasions                                        |
//! | Quiescence      | Hash, QSearch                                   |
//! | QuiescenceChecks| Hash, QSearchChecks                             |
//!
//! Any non-root selector created while in check is coerced to Escape.
//!
//! Within a phase, the first `ordered_moves` picks scan the score list for
//! the best remaining move (a lazy selection sort); after that the moves
//! come out in generation order. Tactical moves that lose material by SEE
//! are deferred into a bad-tactics buffer and only dealt out after the
//! quiet moves.

use crate::evaluate::Score;
use crate::search_tables::{HistoryTable, Killers, MAX_HISTORY};
use arrayvec::ArrayVec;
use chess::board::Position;
use chess::movegen::{MoveList, MAX_MOVES};
use chess::moves::Move;
use chess::piece::PieceType;
use chess::psqt::material_value;

/// The kind of node a selector is generating moves for.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Generator {
    Root = 0,
    Pv = 1,
    NonPv = 2,
    Escape = 3,
    Quiescence = 4,
    QuiescenceChecks = 5,
}

/// The selection phases. Each generator kind walks a fixed slice of these.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Phase {
    Hash,
    Root,
    GoodTactics,
    Killers,
    Quiet,
    BadTactics,
    Evasions,
    QSearch,
    QSearchChecks,
    End,
}

/// The phase sequence for each generator kind.
const PHASE_TABLE: [&[Phase]; 6] = [
    &[Phase::Root, Phase::End],
    &[
        Phase::Hash,
        Phase::GoodTactics,
        Phase::Killers,
        Phase::Quiet,
        Phase::BadTactics,
        Phase::End,
    ],
    &[
        Phase::Hash,
        Phase::GoodTactics,
        Phase::Killers,
        Phase::Quiet,
        Phase::BadTactics,
        Phase::End,
    ],
    &[Phase::Evasions, Phase::End],
    &[Phase::Hash, Phase::QSearch, Phase::End],
    &[Phase::Hash, Phase::QSearchChecks, Phase::End],
];

/// How many moves are selected by scanning the score list for the highest
/// remaining score, as opposed to taken in generation order. Root is 0
/// because root moves are already fully sorted.
const ORDERED_MOVE_COUNT: [usize; 6] = [0, 256, 16, 16, 4, 4];

/// Everything the root selector needs to know about a root move to order
/// it: the subtree size from the previous iteration, the latest score, and
/// the quiescence score computed when the move list was built.
#[derive(Debug, Copy, Clone)]
pub struct RootMove {
    pub mv: Move,
    pub nodes: u64,
    pub score: Score,
    pub qsearch_score: Score,
}

impl RootMove {
    pub fn new(mv: Move) -> Self {
        Self {
            mv,
            nodes: 0,
            score: 0,
            qsearch_score: 0,
        }
    }
}

/// A move selector for a single search node. All buffers live inline; a
/// selector is created on the stack, drained, and dropped with the node.
pub struct MoveSelector {
    generator: Generator,
    phases: &'static [Phase],
    phase_idx: usize,

    moves: [Move; MAX_MOVES],
    scores: [i32; MAX_MOVES],
    moves_end: usize,
    current: usize,

    hash_move: Move,
    killers: [Move; 5],
    num_killers: usize,
    mate_killer: Move,

    bad_tactics: ArrayVec<Move, MAX_MOVES>,
    bad_index: usize,

    depth: i32,
    ordered_moves: usize,
    moves_so_far: usize,
    single_reply: bool,
    root_count: usize,
}

impl MoveSelector {
    /// Set up a selector for an interior or quiescence node. `killers`
    /// carries this ply's killer slots and, when the ply allows it, the
    /// slots from two plies back.
    pub fn new(
        pos: &Position,
        generator: Generator,
        hash_move: Move,
        depth: i32,
        killers: Option<(&Killers, Option<&Killers>)>,
        history: &HistoryTable,
    ) -> Self {
        debug_assert!(generator != Generator::Root, "use new_root at the root");

        // In check, nothing but evasions makes sense, whatever was asked.
        let coerced = if pos.is_check() {
            Generator::Escape
        } else {
            generator
        };

        let mut sel = Self::raw(coerced, generator, hash_move, depth);

        if let Some((node, prev)) = killers {
            sel.mate_killer = node.mate_killer;

            sel.killers[0] = node.moves[0];
            if !sel.killers[0].is_null() {
                sel.num_killers += 1;
                sel.killers[1] = node.moves[1];
                if !sel.killers[1].is_null() {
                    sel.num_killers += 1;
                }
            }

            // Import the killers from two plies up, skipping duplicates.
            if let Some(prev) = prev {
                let two = prev.moves;
                if two[0] != sel.killers[0] && two[0] != sel.killers[1] {
                    sel.killers[sel.num_killers] = two[0];
                    if !sel.killers[sel.num_killers].is_null() {
                        sel.num_killers += 1;
                        if two[1] != sel.killers[0] && two[1] != sel.killers[1] {
                            sel.killers[sel.num_killers] = two[1];
                        }
                        if !sel.killers[sel.num_killers].is_null() {
                            sel.num_killers += 1;
                        }
                    }
                }
            }
        }

        sel.setup_phase(pos, history);
        sel
    }

    /// Set up the root selector. Root moves are fully sorted up front, by
    /// subtree node count (or score in MultiPV mode), with the quiescence
    /// score as a proxy at the shallowest depths and the hash move pinned
    /// to the front.
    pub fn new_root(
        pos: &Position,
        roots: &[RootMove],
        hash_move: Move,
        depth: i32,
        multi_pv: u32,
        history: &HistoryTable,
    ) -> Self {
        let mut sel = Self::raw(Generator::Root, Generator::Root, hash_move, depth);

        sel.sort_root_moves(roots, multi_pv);
        sel.root_count = roots.len();
        sel.setup_phase(pos, history);
        sel
    }

    fn raw(generator: Generator, requested: Generator, hash_move: Move, depth: i32) -> Self {
        Self {
            generator,
            phases: PHASE_TABLE[generator as usize],
            phase_idx: 0,
            moves: [Move::NULL; MAX_MOVES],
            scores: [0; MAX_MOVES],
            moves_end: 0,
            current: 0,
            hash_move,
            killers: [Move::NULL; 5],
            num_killers: 0,
            mate_killer: Move::NULL,
            bad_tactics: ArrayVec::new(),
            bad_index: 0,
            depth,
            ordered_moves: ORDERED_MOVE_COUNT[requested as usize],
            moves_so_far: 0,
            single_reply: false,
            root_count: 0,
        }
    }

    /// Is the current position a check with exactly one way out?
    pub fn has_single_reply(&self) -> bool {
        self.single_reply
    }

    /// How many moves this selector has handed out so far.
    pub fn moves_so_far(&self) -> usize {
        self.moves_so_far
    }

    fn phase(&self) -> Phase {
        self.phases[self.phase_idx]
    }

    ////////////////////////////////////////////////////////////////////////////
    //
    // Phase setup
    //
    ////////////////////////////////////////////////////////////////////////////

    fn advance_phase(&mut self, pos: &Position, history: &HistoryTable) {
        self.phase_idx += 1;
        self.setup_phase(pos, history);
    }

    /// Generate and score the move buffer for the current phase.
    fn setup_phase(&mut self, pos: &Position, history: &HistoryTable) {
        self.moves_end = 0;
        self.current = 0;

        debug_assert!(
            matches!(self.phase(), Phase::Evasions | Phase::Root | Phase::End) || !pos.is_check()
        );

        match self.phase() {
            Phase::End => {}

            Phase::Hash => {
                self.moves[0] = self.hash_move;
                self.moves_end = 1;
            }

            Phase::Root => {
                // Sorted once at construction time.
                self.moves_end = self.root_count;
            }

            Phase::Evasions => {
                self.fill(|list| pos.generate_evasions(list));
                self.score_moves(pos, history);
            }

            Phase::GoodTactics => {
                self.fill(|list| pos.generate_pseudo_tactical_moves(list));
                self.bad_tactics.clear();
                self.bad_index = 0;
                self.score_tactics();
            }

            Phase::Killers => {
                self.moves[..self.num_killers].copy_from_slice(&self.killers[..self.num_killers]);
                self.moves_end = self.num_killers;
            }

            Phase::Quiet => {
                self.fill(|list| pos.generate_pseudo_quiet_moves(list));
                self.score_quiet(history);
            }

            Phase::BadTactics => {
                self.moves[..self.bad_tactics.len()].copy_from_slice(&self.bad_tactics);
                self.moves_end = self.bad_tactics.len();
            }

            Phase::QSearch => {
                self.fill(|list| pos.generate_quiescence_moves(list, false));
                self.score_moves(pos, history);
            }

            Phase::QSearchChecks => {
                self.fill(|list| pos.generate_quiescence_moves(list, true));
                self.score_moves(pos, history);
            }
        }

        self.single_reply = self.generator == Generator::Escape && self.moves_end == 1;
    }

    fn fill<F: FnOnce(&mut MoveList)>(&mut self, generate: F) {
        let mut list = MoveList::new();
        generate(&mut list);

        self.moves_end = list.len();
        self.moves[..list.len()].copy_from_slice(&list);
    }

    ////////////////////////////////////////////////////////////////////////////
    //
    // Selection
    //
    ////////////////////////////////////////////////////////////////////////////

    /// Hand out the next move, lazily moving through the phases. Returns
    /// the null move once everything has been dealt.
    ///
    /// Every yielded move is pseudo-legal; the caller still has to run the
    /// full legality test before playing it.
    pub fn select_move(&mut self, pos: &Position, history: &HistoryTable) -> Move {
        loop {
            match self.phase() {
                Phase::End => return Move::NULL,

                Phase::Hash => {
                    if self.current < self.moves_end {
                        self.current += 1;
                        let mv = self.hash_move;

                        if !mv.is_null() && pos.is_plausible_move_legal(mv) {
                            self.moves_so_far += 1;
                            debug_assert!(pos.is_pseudo_move_legal(mv));
                            return mv;
                        }
                    }
                }

                Phase::Root => {
                    if self.current < self.moves_end {
                        let mv = self.moves[self.current];
                        self.current += 1;
                        self.moves_so_far += 1;
                        debug_assert!(pos.is_pseudo_move_legal(mv));
                        return mv;
                    }
                }

                Phase::Killers => {
                    while self.current < self.moves_end {
                        let mv = self.moves[self.current];
                        self.current += 1;

                        if mv.is_null()
                            || mv == self.hash_move
                            || !pos.is_plausible_move_legal(mv)
                        {
                            continue;
                        }

                        self.moves_so_far += 1;
                        debug_assert!(pos.is_pseudo_move_legal(mv));
                        return mv;
                    }
                }

                Phase::Evasions => {
                    if self.current < self.moves_end {
                        let mv = if self.current >= self.ordered_moves {
                            let mv = self.moves[self.current];
                            self.current += 1;
                            mv
                        } else {
                            self.best_remaining().0
                        };

                        self.moves_so_far += 1;
                        debug_assert!(pos.is_pseudo_move_legal(mv));
                        return mv;
                    }
                }

                Phase::GoodTactics => {
                    while self.current < self.moves_end {
                        let (mv, _) = self.best_remaining();

                        if mv == self.hash_move || !pos.is_pseudo_move_legal(mv) {
                            continue;
                        }

                        // Losing tactics wait until after the quiet moves.
                        if pos.static_exchange_eval(mv) < 0 {
                            self.bad_tactics.push(mv);
                            continue;
                        }

                        self.moves_so_far += 1;
                        return mv;
                    }
                }

                Phase::Quiet => {
                    while self.current < self.moves_end {
                        let (mv, _) = self.best_remaining();

                        if mv == self.hash_move || self.killers.contains(&mv) {
                            continue;
                        }
                        if !pos.is_pseudo_move_legal(mv) {
                            continue;
                        }

                        self.moves_so_far += 1;
                        return mv;
                    }
                }

                Phase::BadTactics => {
                    if self.bad_index < self.moves_end {
                        let mv = self.moves[self.bad_index];
                        self.bad_index += 1;
                        self.moves_so_far += 1;
                        debug_assert!(pos.is_pseudo_move_legal(mv));
                        return mv;
                    }
                }

                Phase::QSearch | Phase::QSearchChecks => {
                    while self.current < self.moves_end {
                        // Past the ordered prefix, deal in generation order.
                        if self.current >= self.ordered_moves {
                            let mv = self.moves[self.current];
                            self.current += 1;

                            if mv == self.hash_move || !pos.is_pseudo_move_legal(mv) {
                                continue;
                            }

                            self.moves_so_far += 1;
                            return mv;
                        }

                        let (mv, best_score) = self.best_remaining();

                        // In quiescence, anything scored as a losing tactic
                        // is not worth searching, queen promotions excepted.
                        if mv.promo_type() != Some(PieceType::Queen) && best_score < MAX_HISTORY {
                            continue;
                        }
                        if mv == self.hash_move || !pos.is_pseudo_move_legal(mv) {
                            continue;
                        }

                        self.moves_so_far += 1;
                        return mv;
                    }
                }
            }

            if self.phase() == Phase::End {
                return Move::NULL;
            }
            self.advance_phase(pos, history);
        }
    }

    /// Scan the unselected part of the buffer for the highest-scored move,
    /// swap it into the cursor slot, and hand it out.
    fn best_remaining(&mut self) -> (Move, i32) {
        let offset = self.current;
        debug_assert!(offset < self.moves_end);

        let mut best = offset;
        for i in offset..self.moves_end {
            if self.scores[i] > self.scores[best] {
                best = i;
            }
        }

        self.moves.swap(offset, best);
        self.scores.swap(offset, best);
        self.current += 1;

        (self.moves[offset], self.scores[offset])
    }

    ////////////////////////////////////////////////////////////////////////////
    //
    // Scoring
    //
    ////////////////////////////////////////////////////////////////////////////

    /// Score a mixed move list (evasions, quiescence): hash move and mate
    /// killer on top, then tactics by their tactical score, then killers,
    /// then everything else by history.
    fn score_moves(&mut self, pos: &Position, history: &HistoryTable) {
        let hash_score = 1000 * MAX_HISTORY;
        let killer_score = 700 * MAX_HISTORY;

        for i in 0..self.moves_end {
            let mv = self.moves[i];

            self.scores[i] = if mv == self.hash_move {
                hash_score
            } else if mv == self.mate_killer {
                hash_score - 1
            } else if mv.is_tactical() {
                score_tactical_move(pos, mv)
            } else if mv == self.killers[0] {
                killer_score
            } else if mv == self.killers[1] {
                killer_score - 1
            } else if mv == self.killers[2] {
                killer_score - 2
            } else if mv == self.killers[3] {
                killer_score - 3
            } else {
                history.get(mv)
            };
        }
    }

    /// Score the tactical move list by victim and attacker, with a bonus
    /// for clearly safe captures and a penalty for underpromotions. SEE is
    /// deferred until the move is actually about to be selected.
    fn score_tactics(&mut self) {
        for i in 0..self.moves_end {
            let mv = self.moves[i];
            let victim = type_value(mv.captured_type());
            let attacker = type_value(Some(mv.piece_type()));

            let mut bonus = 0;
            match (mv.promo_type(), mv.captured_type()) {
                (Some(promo), _) if promo != PieceType::Queen => bonus = -1000,
                (_, Some(captured)) if mv.piece_type() <= captured => {
                    bonus = material_value(captured) - material_value(mv.piece_type());
                }
                _ => {}
            }

            self.scores[i] = 6 * victim - attacker + bonus;
        }
    }

    fn score_quiet(&mut self, history: &HistoryTable) {
        for i in 0..self.moves_end {
            self.scores[i] = history.get(self.moves[i]);
        }
    }

    ////////////////////////////////////////////////////////////////////////////
    //
    // Root ordering
    //
    ////////////////////////////////////////////////////////////////////////////

    /// Insertion-sort the root moves, best first. At shallow depths the
    /// qsearch scores are the best signal we have; later the subtree sizes
    /// from the previous iteration are far more telling (unless MultiPV
    /// needs the scores themselves). The hash move always sorts first.
    fn sort_root_moves(&mut self, roots: &[RootMove], multi_pv: u32) {
        let mut keys = [0i64; MAX_MOVES];

        for (i, root) in roots.iter().enumerate() {
            self.moves[i] = root.mv;

            keys[i] = if self.depth <= 2 {
                root.qsearch_score as i64
            } else if multi_pv > 1 {
                root.score as i64
            } else {
                root.nodes as i64
            };

            if root.mv == self.hash_move {
                keys[i] = i64::MAX;
            }
        }

        for i in 1..roots.len() {
            let (mv, key) = (self.moves[i], keys[i]);
            let mut j = i;

            while j > 0 && keys[j - 1] < key {
                self.moves[j] = self.moves[j - 1];
                keys[j] = keys[j - 1];
                j -= 1;
            }

            self.moves[j] = mv;
            keys[j] = key;
        }
    }
}

/// Piece types as 1-based values for the victim/attacker arithmetic, with
/// "no piece" as 0.
fn type_value(ptype: Option<PieceType>) -> i32 {
    match ptype {
        Some(ptype) => ptype as i32 + 1,
        None => 0,
    }
}

/// The full ordering score for a capture or promotion: victim/attacker
/// difference, shifted far up for tactics that look safe (winning trades
/// and anything SEE approves of) and far down for the rest.
fn score_tactical_move(pos: &Position, mv: Move) -> i32 {
    let good_tactic_score = 800 * MAX_HISTORY;
    let bad_tactic_score = -800 * MAX_HISTORY;

    let good = match (mv.promo_type(), mv.captured_type()) {
        (Some(promo), _) if promo != PieceType::Queen => false,
        (_, Some(captured)) if mv.piece_type() <= captured => true,
        _ => pos.static_exchange_eval(mv) >= 0,
    };

    let victim = type_value(mv.captured_type());
    let attacker = type_value(Some(mv.piece_type()));

    6 * victim - attacker + 5 + if good { good_tactic_score } else { bad_tactic_score }
}

////////////////////////////////////////////////////////////////////////////////
//
// Tests
//
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use chess::movegen::MoveList;

    fn drain(
        sel: &mut MoveSelector,
        pos: &Position,
        history: &HistoryTable,
    ) -> Vec<Move> {
        let mut yielded = Vec::new();
        loop {
            let mv = sel.select_move(pos, history);
            if mv.is_null() {
                break;
            }
            yielded.push(mv);
        }
        yielded
    }

    #[test]
    fn phase_order_after_e4_e5() {
        let mut pos: Position = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2"
            .parse()
            .unwrap();
        let history = HistoryTable::boxed();

        let hash_move = pos.find_move("d1h5".parse().unwrap()).unwrap();
        let killer = pos.find_move("g1f3".parse().unwrap()).unwrap();

        let mut killers = Killers::default();
        killers.add(killer);

        let mut sel = MoveSelector::new(
            &pos,
            Generator::Pv,
            hash_move,
            4,
            Some((&killers, None)),
            &history,
        );

        let yielded = drain(&mut sel, &pos, &history);

        // Hash move first, the killer right after (there are no tactics in
        // this position), then the quiet moves, with no duplicates.
        assert_eq!(yielded[0], hash_move);
        assert_eq!(yielded[1], killer);

        let mut seen = yielded.clone();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), yielded.len(), "a move was yielded twice");

        // And the selector is exhaustive: every pseudo-legal move shows up.
        let mut pseudo = MoveList::new();
        pos.generate_pseudo_moves(&mut pseudo);
        assert_eq!(yielded.len(), pseudo.len());
        for mv in pseudo {
            assert!(yielded.contains(&mv), "missing {mv}");
        }
    }

    #[test]
    fn exhaustive_and_unique_in_kiwipete() {
        let pos: Position =
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1"
                .parse()
                .unwrap();
        let history = HistoryTable::boxed();

        let mut sel =
            MoveSelector::new(&pos, Generator::NonPv, Move::NULL, 4, None, &history);
        let yielded = drain(&mut sel, &pos, &history);

        let mut seen = yielded.clone();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), yielded.len());

        let mut pseudo = MoveList::new();
        pos.generate_pseudo_moves(&mut pseudo);
        assert_eq!(yielded.len(), pseudo.len());

        // Bad tactics come after the quiets: the first yielded moves must
        // all be tactical.
        assert!(yielded[0].is_tactical());
    }

    #[test]
    fn coerced_to_evasions_in_check() {
        let pos: Position = "4k3/8/8/8/8/8/4r3/4K3 w - - 0 1".parse().unwrap();
        let history = HistoryTable::boxed();

        let mut sel = MoveSelector::new(&pos, Generator::Pv, Move::NULL, 4, None, &history);
        let yielded = drain(&mut sel, &pos, &history);

        let mut evasions = MoveList::new();
        pos.generate_evasions(&mut evasions);
        assert_eq!(yielded.len(), evasions.len());
        assert!(!sel.has_single_reply());
    }

    #[test]
    fn single_reply_detected() {
        let pos: Position = "4k3/8/8/8/8/8/5nPP/7K w - - 0 1".parse().unwrap();
        let history = HistoryTable::boxed();

        let mut sel =
            MoveSelector::new(&pos, Generator::NonPv, Move::NULL, 4, None, &history);

        assert!(sel.has_single_reply());
        let yielded = drain(&mut sel, &pos, &history);
        assert_eq!(yielded.len(), 1);
    }

    #[test]
    fn quiescence_skips_losing_captures() {
        // A rook capture defended by a pawn: the only capture loses
        // material, so quiescence yields nothing at all.
        let pos: Position = "4k3/2p5/3p4/8/3R4/8/8/4K3 w - - 0 1".parse().unwrap();
        let history = HistoryTable::boxed();

        let mut sel =
            MoveSelector::new(&pos, Generator::Quiescence, Move::NULL, 0, None, &history);
        let yielded = drain(&mut sel, &pos, &history);

        assert!(yielded.is_empty(), "yielded {yielded:?}");
    }

    #[test]
    fn bad_tactics_deferred_to_the_end() {
        // Rxd6 loses the exchange; every other pseudo move is quiet, so the
        // losing capture must come out last.
        let pos: Position = "4k3/2p5/3p4/8/3R4/8/8/4K3 w - - 0 1".parse().unwrap();
        let history = HistoryTable::boxed();

        let mut sel = MoveSelector::new(&pos, Generator::Pv, Move::NULL, 4, None, &history);
        let yielded = drain(&mut sel, &pos, &history);

        let last = *yielded.last().unwrap();
        assert!(last.is_capture());
        assert!(pos.static_exchange_eval(last) < 0);
    }

    #[test]
    fn root_ordering_by_nodes() {
        let mut pos = Position::default();
        let history = HistoryTable::boxed();

        let mut roots: Vec<RootMove> = pos
            .generate_legal_moves()
            .into_iter()
            .map(RootMove::new)
            .collect();

        // Fake some node counts; pick two moves to pin down.
        let busy = roots[5].mv;
        let hash_move = roots[10].mv;
        for (i, root) in roots.iter_mut().enumerate() {
            root.nodes = i as u64;
        }
        roots[5].nodes = 1_000_000;

        let mut sel = MoveSelector::new_root(&pos, &roots, hash_move, 6, 1, &history);
        let yielded = drain(&mut sel, &pos, &history);

        assert_eq!(yielded.len(), roots.len());
        assert_eq!(yielded[0], hash_move);
        assert_eq!(yielded[1], busy);
    }
}
