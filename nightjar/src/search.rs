//! The search driver: iterative deepening, negamax with alpha-beta and
//! principal variation search, and quiescence.
//!
//! The driver owns the glue between the core data structures. At each node
//! it probes the transposition table, asks a move selector for moves in
//! cutoff-friendly order, filters them for full legality, and recurses. At
//! the end of every deepening iteration the principal variation is written
//! back into the table so it survives evictions, and the table's age is
//! bumped so stale entries make way.
//!
//! Abort handling is cooperative: the controller's status flag is polled on
//! a coarse node cadence, and once it trips, the search unwinds without
//! writing to the table and reports the last completed iteration.

use crate::evaluate::{evaluate, is_draw, Score, ScoreExt, DRAW_VALUE, MATE_BOUND, MATE_SCORE};
use crate::movepick::{Generator, MoveSelector, RootMove};
use crate::search_tables::{HistoryTable, Killers, PVTable};
use crate::time_control::TimeController;
use crate::transpositions::{Bound, TTable};
use chess::board::{Position, UndoInfo};
use chess::moves::Move;
use std::time::Duration;
use uci::search_info::{Score as UciScore, SearchInfo};

/// The hard ceiling on search depth, in plies.
pub const MAX_DEPTH: usize = 128;

/// Search state for one `go` command.
pub struct Search<'a> {
    pos: Position,
    tt: &'a mut TTable,
    history: &'a mut HistoryTable,
    pub tc: TimeController,
    multi_pv: u32,

    /// Per-ply killer slots.
    stack: [Killers; MAX_DEPTH],

    /// The legal root moves with their ordering statistics.
    root_moves: Vec<RootMove>,

    nodes: u64,
    seldepth: usize,
    aborted: bool,
}

/// The outcome of a search: everything needed for UCI reporting plus the
/// move to play.
#[derive(Debug, Clone, Default)]
pub struct SearchReport {
    pub depth: u8,
    pub seldepth: u8,
    pub nodes: u64,
    pub duration: Duration,
    pub score: Score,
    pub pv: Vec<Move>,
    pub hashfull: u32,
}

impl<'a> Search<'a> {
    pub fn new(
        pos: Position,
        tt: &'a mut TTable,
        history: &'a mut HistoryTable,
        tc: TimeController,
        multi_pv: u32,
    ) -> Self {
        Self {
            pos,
            tt,
            history,
            tc,
            multi_pv,
            stack: [Killers::default(); MAX_DEPTH],
            root_moves: Vec::new(),
            nodes: 0,
            seldepth: 0,
            aborted: false,
        }
    }

    ////////////////////////////////////////////////////////////////////////////
    //
    // Iterative deepening
    //
    ////////////////////////////////////////////////////////////////////////////

    /// Run the search to completion and return the result of the deepest
    /// fully completed iteration.
    pub fn run<const DEBUG: bool>(&mut self) -> SearchReport {
        self.init_root_moves();

        let mut report = SearchReport::default();
        if self.root_moves.is_empty() {
            // Mated or stalemated on arrival; nothing to search.
            report.score = if self.pos.is_check() {
                -MATE_SCORE
            } else {
                DRAW_VALUE
            };
            return report;
        }

        // A forced move needs no deliberation beyond a token iteration.
        let forced = self.root_moves.len() == 1;

        let mut depth = 1;
        while depth <= MAX_DEPTH && self.tc.should_deepen(depth) {
            self.tt.increment_age();
            self.seldepth = 0;
            for killers in self.stack.iter_mut() {
                killers.clear();
            }

            let mut pv = PVTable::new();
            let score = self.search_root(depth as i32, &mut pv);

            if self.aborted && depth > 1 {
                break;
            }

            report = SearchReport {
                depth: depth as u8,
                seldepth: self.seldepth as u8,
                nodes: self.nodes,
                duration: self.tc.elapsed(),
                score,
                pv: pv.moves().to_vec(),
                hashfull: self.tt.hashfull(),
            };

            // Make sure the PV survives in the table across the next
            // iteration's evictions.
            self.tt.put_line(&mut self.pos, &report.pv, depth as i32, score);

            if DEBUG {
                println!("info {}", SearchInfo::from(&report));
            }

            if self.aborted || forced {
                break;
            }
            depth += 1;
        }

        // Even a stillborn search has to move.
        if report.pv.is_empty() {
            report.pv = vec![self.root_moves[0].mv];
        }

        report
    }

    /// Build the root move list, seeding each move with a quiescence score
    /// that orders the very first iterations.
    fn init_root_moves(&mut self) {
        self.root_moves = self
            .pos
            .generate_legal_moves()
            .into_iter()
            .map(RootMove::new)
            .collect();

        let mut undo = UndoInfo::default();
        for i in 0..self.root_moves.len() {
            let mv = self.root_moves[i].mv;
            self.pos.do_move(mv, &mut undo);
            let score = -self.quiescence(1, 1, -MATE_SCORE, MATE_SCORE);
            self.pos.undo_move(mv, &undo);
            self.root_moves[i].qsearch_score = score;
        }
    }

    ////////////////////////////////////////////////////////////////////////////
    //
    // Root node
    //
    ////////////////////////////////////////////////////////////////////////////

    fn search_root(&mut self, depth: i32, pv: &mut PVTable) -> Score {
        let mut alpha = -MATE_SCORE;
        let beta = MATE_SCORE;

        let hash_move = match self.tt.get(self.pos.hash) {
            Some(entry) => entry.get_move(),
            None => Move::NULL,
        };

        let mut sel = MoveSelector::new_root(
            &self.pos,
            &self.root_moves,
            hash_move,
            depth,
            self.multi_pv,
            self.history,
        );

        let mut best_move = Move::NULL;
        let mut move_count = 0;
        let mut undo = UndoInfo::default();

        loop {
            let mv = sel.select_move(&self.pos, self.history);
            if mv.is_null() {
                break;
            }

            move_count += 1;
            let nodes_before = self.nodes;
            let mut child_pv = PVTable::new();

            self.pos.do_move(mv, &mut undo);

            let score = if move_count == 1 {
                -self.search(depth - 1, 1, -beta, -alpha, &mut child_pv, true)
            } else {
                let score = -self.search(depth - 1, 1, -alpha - 1, -alpha, &mut child_pv, false);
                if score > alpha && !self.aborted {
                    -self.search(depth - 1, 1, -beta, -alpha, &mut child_pv, true)
                } else {
                    score
                }
            };

            self.pos.undo_move(mv, &undo);

            // Node counts drive the next iteration's root ordering.
            if let Some(root) = self.root_moves.iter_mut().find(|root| root.mv == mv) {
                root.nodes += self.nodes - nodes_before;
                root.score = score;
            }

            if self.aborted {
                break;
            }

            if score > alpha {
                alpha = score;
                best_move = mv;
                pv.add_to_front(mv, &child_pv);
            }
        }

        if !self.aborted && !best_move.is_null() {
            self.tt
                .put(self.pos.hash, best_move, depth, alpha, Bound::Exact);
        }

        alpha
    }

    ////////////////////////////////////////////////////////////////////////////
    //
    // Negamax
    //
    ////////////////////////////////////////////////////////////////////////////

    fn search(
        &mut self,
        depth: i32,
        ply: usize,
        mut alpha: Score,
        beta: Score,
        pv: &mut PVTable,
        is_pv: bool,
    ) -> Score {
        pv.clear();

        if self.should_abort() {
            return 0;
        }

        self.nodes += 1;
        self.seldepth = self.seldepth.max(ply);

        if is_draw(&self.pos) {
            return DRAW_VALUE;
        }
        if ply >= MAX_DEPTH - 1 {
            return evaluate(&self.pos);
        }

        let in_check = self.pos.is_check();

        // Checks get resolved before we allow the search to go quiet.
        let depth = if in_check { depth + 1 } else { depth };
        if depth <= 0 {
            return self.quiescence(ply, 0, alpha, beta);
        }

        ////////////////////////////////////////////////////////////////////////
        //
        // Transposition table probe
        //
        ////////////////////////////////////////////////////////////////////////

        let mut hash_move = Move::NULL;

        if let Some(entry) = self.tt.get(self.pos.hash) {
            hash_move = entry.get_move();

            if !is_pv && entry.get_depth() >= depth {
                let score = entry.get_score().absolute(ply);

                match entry.get_bound() {
                    Bound::Exact => return score,
                    Bound::Lower if score >= beta => return score,
                    Bound::Upper if score <= alpha => return score,
                    _ => {}
                }
            }
        }

        ////////////////////////////////////////////////////////////////////////
        //
        // Move loop
        //
        ////////////////////////////////////////////////////////////////////////

        let generator = if is_pv { Generator::Pv } else { Generator::NonPv };

        let node_killers = self.stack[ply];
        let prev_killers = if ply >= 2 {
            Some(self.stack[ply - 2])
        } else {
            None
        };

        let mut sel = MoveSelector::new(
            &self.pos,
            generator,
            hash_move,
            depth,
            Some((&node_killers, prev_killers.as_ref())),
            self.history,
        );

        // A single legal answer to a check isn't worth a whole ply.
        let extension = if sel.has_single_reply() { 1 } else { 0 };

        let mut best_score = -MATE_SCORE;
        let mut best_move = Move::NULL;
        let mut move_count = 0;
        let mut child_pv = PVTable::new();
        let mut undo = UndoInfo::default();

        loop {
            let mv = sel.select_move(&self.pos, self.history);
            if mv.is_null() {
                break;
            }
            if !self.pos.is_move_legal(mv) {
                continue;
            }

            move_count += 1;
            let child_depth = depth - 1 + extension;

            self.pos.do_move(mv, &mut undo);

            let score = if move_count == 1 {
                -self.search(child_depth, ply + 1, -beta, -alpha, &mut child_pv, is_pv)
            } else {
                let score =
                    -self.search(child_depth, ply + 1, -alpha - 1, -alpha, &mut child_pv, false);
                if score > alpha && score < beta && is_pv && !self.aborted {
                    -self.search(child_depth, ply + 1, -beta, -alpha, &mut child_pv, true)
                } else {
                    score
                }
            };

            self.pos.undo_move(mv, &undo);

            if self.aborted {
                return best_score;
            }

            if score > best_score {
                best_score = score;
                best_move = mv;

                if score > alpha {
                    alpha = score;

                    if is_pv {
                        pv.add_to_front(mv, &child_pv);
                    }

                    if score >= beta {
                        self.register_cutoff(mv, ply, depth, score);
                        self.tt
                            .put(self.pos.hash, mv, depth, score.relative(ply), Bound::Lower);
                        return score;
                    }
                }
            }
        }

        if move_count == 0 {
            return if in_check {
                -MATE_SCORE + ply as Score
            } else {
                DRAW_VALUE
            };
        }

        let bound = if pv.moves().is_empty() {
            Bound::Upper
        } else {
            Bound::Exact
        };
        self.tt.put(
            self.pos.hash,
            best_move,
            depth,
            best_score.relative(ply),
            bound,
        );

        best_score
    }

    /// Bookkeeping for a fail-high: quiet cutoff moves become killers (or
    /// the mate killer) and earn history credit.
    fn register_cutoff(&mut self, mv: Move, ply: usize, depth: i32, score: Score) {
        if !mv.is_quiet() {
            return;
        }

        if score >= MATE_BOUND {
            self.stack[ply].mate_killer = mv;
        } else {
            self.stack[ply].add(mv);
        }

        self.history.cutoff(mv, depth);
    }

    ////////////////////////////////////////////////////////////////////////////
    //
    // Quiescence
    //
    ////////////////////////////////////////////////////////////////////////////

    /// Resolve the tactical dust before trusting the static evaluation:
    /// keep searching captures (and, at the first quiescence ply, checks)
    /// until the position goes quiet.
    fn quiescence(&mut self, ply: usize, qdepth: i32, mut alpha: Score, beta: Score) -> Score {
        if self.should_abort() {
            return 0;
        }

        self.nodes += 1;
        self.seldepth = self.seldepth.max(ply);

        if is_draw(&self.pos) {
            return DRAW_VALUE;
        }
        if ply >= MAX_DEPTH - 1 {
            return evaluate(&self.pos);
        }

        let in_check = self.pos.is_check();
        let mut best_score;

        if in_check {
            // No standing pat while in check; every evasion gets searched.
            best_score = -MATE_SCORE + ply as Score;
        } else {
            let stand_pat = evaluate(&self.pos);
            if stand_pat >= beta {
                return stand_pat;
            }
            if stand_pat > alpha {
                alpha = stand_pat;
            }
            best_score = stand_pat;
        }

        let hash_move = match self.tt.get(self.pos.hash) {
            Some(entry) => entry.get_move(),
            None => Move::NULL,
        };

        let generator = if qdepth == 0 {
            Generator::QuiescenceChecks
        } else {
            Generator::Quiescence
        };

        let mut sel = MoveSelector::new(&self.pos, generator, hash_move, 0, None, self.history);
        let mut undo = UndoInfo::default();

        loop {
            let mv = sel.select_move(&self.pos, self.history);
            if mv.is_null() {
                break;
            }
            if !self.pos.is_move_legal(mv) {
                continue;
            }

            self.pos.do_move(mv, &mut undo);
            let score = -self.quiescence(ply + 1, qdepth + 1, -beta, -alpha);
            self.pos.undo_move(mv, &undo);

            if self.aborted {
                return best_score;
            }

            if score > best_score {
                best_score = score;
                if score > alpha {
                    alpha = score;
                    if score >= beta {
                        return score;
                    }
                }
            }
        }

        // In check with no legal evasion, best_score still holds the mate
        // score it was seeded with.
        best_score
    }

    fn should_abort(&mut self) -> bool {
        if !self.aborted && !self.tc.should_continue(self.nodes) {
            self.aborted = true;
        }
        self.aborted
    }
}

////////////////////////////////////////////////////////////////////////////////
//
// UCI reporting
//
////////////////////////////////////////////////////////////////////////////////

impl From<&SearchReport> for SearchInfo {
    fn from(report: &SearchReport) -> Self {
        let nps = (1_000_000 * report.nodes)
            .checked_div(report.duration.as_micros() as u64)
            .unwrap_or_default();

        Self {
            depth: Some(report.depth),
            seldepth: Some(report.seldepth),
            time: Some(report.duration.as_millis() as u64),
            nodes: Some(report.nodes),
            score: Some(report.score.to_uci()),
            pv: report.pv.iter().map(|mv| mv.bare()).collect(),
            hashfull: Some(report.hashfull),
            nps: Some(nps),
        }
    }
}

trait ScoreUciExt {
    fn to_uci(self) -> UciScore;
}

impl ScoreUciExt for Score {
    fn to_uci(self) -> UciScore {
        if self.is_mate() {
            UciScore::Mate(self.signum() * (self.mate_distance() + 1) / 2)
        } else {
            UciScore::Cp(self)
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
    use crate::time_control::TimeController;
    use chess::piece::Color;
    use uci::time_control::TimeControl;

    fn search_fen(fen: &str, depth: usize) -> SearchReport {
        let pos: Position = fen.parse().unwrap();
        let mut tt = TTable::with_capacity_mb(8);
        let mut history = HistoryTable::boxed();
        let (tc, _handle) =
            TimeController::new(TimeControl::Depth(depth), pos.side, false, false);

        Search::new(pos, &mut tt, &mut history, tc, 1).run::<false>()
    }

    #[test]
    fn finds_mate_in_one() {
        // Back-rank mate: Ra8#.
        let report = search_fen("6k1/5ppp/8/8/8/8/8/R3K3 w - - 0 1", 3);

        assert_eq!(report.pv[0].to_string(), "a1a8");
        assert!(report.score >= MATE_BOUND);
    }

    #[test]
    fn finds_hanging_queen() {
        // A queen en prise: take it.
        let report = search_fen("4k3/8/8/3q4/8/8/3R4/4K3 w - - 0 1", 4);
        assert_eq!(report.pv[0].to_string(), "d2d5");
    }

    #[test]
    fn escapes_check() {
        let report = search_fen("4k3/8/8/8/8/8/4r3/4K3 w - - 0 1", 3);
        assert!(!report.pv.is_empty());

        // All three legal replies are king moves.
        let first = report.pv[0].to_string();
        assert!(["e1e2", "e1d1", "e1f1"].contains(&first.as_str()), "{first}");
    }

    #[test]
    fn mated_position_reports_mate_score() {
        // Fool's mate position, mated side to move.
        let report = search_fen(
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
            3,
        );

        // White is getting mated whatever the reply.
        assert!(report.score <= -MATE_BOUND + MAX_DEPTH as Score);
    }

    #[test]
    fn stalemate_is_a_draw() {
        // Classic stalemate: black to move has nothing.
        let report = search_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", 3);
        assert!(report.pv.is_empty() || report.score == DRAW_VALUE);
    }

    #[test]
    fn respects_depth_limit() {
        let report = search_fen(chess::fen::START_FEN, 4);
        assert_eq!(report.depth, 4);
        assert!(!report.pv.is_empty());
        assert!(report.nodes > 0);
    }
}
