//! Endgame recognition.
//!
//! The static evaluator is happy to report that a king and rook-pawn are a
//! pawn up against a bare king, but if the defending king owns the corner,
//! no amount of searching turns that pawn into a win. This module closes
//! the gap for a handful of material combinations with exact, closed-form
//! knowledge:
//!
//! - *Score functions* adjudicate a position outright (forced win, dead
//!   draw, or a "drive the king to the right corner" gradient for KBNK)
//!   and replace the evaluation wholesale.
//!
//! - *Scale functions* recognize drawn sub-cases of generally-won endings
//!   (KPK with the wrong opposition, rook-pawn with the wrong bishop, ...)
//!   and scale a side's evaluation contribution down, to zero for a dead
//!   draw.
//!
//! Every function normalizes the geometry so the strong side plays up the
//! board (ranks mirrored when the strong side is Black) and, where only
//! half the files differ, mirrors files as well.

use crate::evaluate::{Score, DRAW_VALUE, WON_ENDGAME};
use chess::attacks::{direction, possible_attack, PAWN_PUSH};
use chess::board::Position;
use chess::piece::{Color, Piece, PieceType};
use chess::psqt::ROOK_VAL;
use chess::square::Square;

/// A scale factor of 16 leaves a side's evaluation untouched; 0 wipes it.
pub const FULL_SCALE: i32 = 16;

/// The endgame classes the recognizer knows about.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EndgameType {
    /// Not a special endgame; evaluate normally.
    None,

    /// A generically won position for the strong side (e.g. KQK, KRK).
    Win,

    /// A dead draw regardless of the details (e.g. KK, KNK, KBK).
    Draw,

    /// King, bishop and knight vs king: won, but only via the right corner.
    Kbnk,

    /// King and pawn vs king.
    Kpk,

    /// King, bishop and pawn vs king.
    Kbpk,

    /// King, knight and pawn vs king.
    Knpk,

    /// King and rook vs king and pawn.
    Krkp,

    /// King and pawn vs king and bishop. Recognized but not scaled (see
    /// `determine_endgame_scale`).
    Kpkb,

    /// King, rook and pawn vs king and rook. Recognized but not scaled.
    Krpkr,
}

/// What the material signature of a position tells us: the endgame class,
/// which side is the strong one, and the baseline scale factors the scaling
/// functions start from.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MaterialData {
    pub eg_type: EndgameType,
    pub strong_side: Color,
    pub scale: [i32; 2],
}

impl MaterialData {
    /// Classify the position's material signature.
    pub fn classify(pos: &Position) -> Self {
        use Color::*;
        use EndgameType::*;
        use PieceType::*;

        let counts = |side: Color| {
            let c = &pos.piece_count[side];
            (c[Pawn], c[Knight], c[Bishop], c[Rook], c[Queen])
        };

        for strong in [White, Black] {
            let weak = !strong;
            let s = counts(strong);
            let w = counts(weak);

            if w == (0, 0, 0, 0, 0) {
                let eg_type = match s {
                    (0, 0, 0, 0, 0) => Some(Draw),
                    (0, 1, 0, 0, 0) | (0, 0, 1, 0, 0) | (0, 2, 0, 0, 0) => Some(Draw),
                    (0, 1, 1, 0, 0) => Some(Kbnk),
                    (1, 0, 0, 0, 0) => Some(Kpk),
                    (1, 1, 0, 0, 0) => Some(Knpk),
                    (1, 0, 1, 0, 0) => Some(Kbpk),

                    // Any pawnless material from a rook upwards mates a
                    // bare king sooner or later.
                    _ if s.0 == 0 && pos.material_eval[strong] >= ROOK_VAL => Some(Win),

                    _ => Option::None,
                };

                if let Some(eg_type) = eg_type {
                    return Self::with(eg_type, strong);
                }
            }

            if s == (0, 0, 0, 1, 0) && w == (1, 0, 0, 0, 0) {
                return Self::with(Krkp, strong);
            }

            if s == (1, 0, 0, 1, 0) && w == (0, 0, 0, 1, 0) {
                return Self::with(Krpkr, strong);
            }

            if s == (1, 0, 0, 0, 0) && w == (0, 0, 1, 0, 0) {
                return Self::with(Kpkb, strong);
            }
        }

        Self::with(None, White)
    }

    fn with(eg_type: EndgameType, strong_side: Color) -> Self {
        let weak_side = !strong_side;
        let mut scale = [FULL_SCALE; 2];

        match eg_type {
            // Dead draws score as such before scale even matters; zero both
            // sides for consistency.
            EndgameType::Draw => scale = [0; 2],

            // Keep the full winning margin but silence the defender's
            // positional noise.
            EndgameType::Win | EndgameType::Kbnk => scale[weak_side] = 0,

            _ => {}
        }

        Self {
            eg_type,
            strong_side,
            scale,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
//
// Dispatch
//
////////////////////////////////////////////////////////////////////////////////

/// If the recognized endgame has a closed-form verdict, return it as the
/// final score; otherwise the caller falls back to normal evaluation.
pub fn endgame_score(pos: &Position, md: &MaterialData) -> Option<Score> {
    match md.eg_type {
        EndgameType::Draw => Some(DRAW_VALUE),
        EndgameType::Win => Some(score_win(pos, md)),
        EndgameType::Kbnk => Some(score_kbnk(pos, md)),
        _ => None,
    }
}

/// Start from the baseline scale of the material signature and let the
/// endgame-specific scaling function shrink it further.
///
/// `scale_krpkr` and `scale_kpkb` exist below but are deliberately not
/// dispatched, mirroring the reference behavior this engine was validated
/// against; wiring them in is a tuning decision, not a bug fix.
pub fn determine_endgame_scale(pos: &Position, md: &MaterialData) -> [i32; 2] {
    let mut scale = md.scale;

    match md.eg_type {
        EndgameType::Kpk => scale_kpk(pos, md, &mut scale),
        EndgameType::Knpk => scale_knpk(pos, md, &mut scale),
        EndgameType::Kbpk => scale_kbpk(pos, md, &mut scale),
        EndgameType::Krkp => scale_krkp(pos, md, &mut scale),
        _ => {}
    }

    scale
}

////////////////////////////////////////////////////////////////////////////////
//
// Score functions
//
////////////////////////////////////////////////////////////////////////////////

fn score_win(pos: &Position, md: &MaterialData) -> Score {
    WON_ENDGAME * if md.strong_side == pos.side { 1 } else { -1 }
}

/// KBN vs K: herd the bare king towards a corner the bishop controls. The
/// score rises as the defending king gets closer to the right corner and as
/// the kings close in on each other.
fn score_kbnk(pos: &Position, md: &MaterialData) -> Score {
    let strong = md.strong_side;
    let weak = !strong;
    debug_assert_eq!(pos.num_pieces(strong), 3);
    debug_assert_eq!(pos.num_pawns(strong), 0);
    debug_assert_eq!(pos.num_pieces(weak), 1);

    let wk = pos.king_square(strong);
    let bk = pos.king_square(weak);

    let wb = pos.pieces[strong][1..]
        .iter()
        .copied()
        .find(|&sq| pos.board[sq] == Some(Piece::new(PieceType::Bishop, strong)))
        .expect("KBNK without a bishop");

    let (t1, t2) = if wb.color() == Color::White {
        (Square::A8, Square::H1)
    } else {
        (Square::A1, Square::H8)
    };

    let corner_dist = usize::min(bk.distance(t1), bk.distance(t2))
        + usize::min(bk.rank(), bk.file());

    let score = WON_ENDGAME - 10 * corner_dist as Score - wk.distance(bk) as Score;
    score * if strong == pos.side { 1 } else { -1 }
}

////////////////////////////////////////////////////////////////////////////////
//
// Scale functions
//
////////////////////////////////////////////////////////////////////////////////

/// KP vs K: an exhaustive rule list for the drawn configurations. Files are
/// mirrored so the pawn lives on the queenside; ranks are handled through
/// the per-side push direction.
fn scale_kpk(pos: &Position, md: &MaterialData, scale: &mut [i32; 2]) {
    let strong = md.strong_side;
    let weak = !strong;
    let sstm = pos.side == strong;
    debug_assert_eq!(pos.num_pieces(strong), 1);
    debug_assert_eq!(pos.num_pawns(strong), 1);
    debug_assert_eq!(pos.num_pieces(weak), 1);
    debug_assert_eq!(pos.num_pawns(weak), 0);

    let mut p = pos.pawns[strong][0];
    let mut sk = pos.king_square(strong);
    let mut wk = pos.king_square(weak);

    if p.file() >= 4 {
        p = p.mirror();
        sk = sk.mirror();
        wk = wk.mirror();
    }

    let push = PAWN_PUSH[strong];
    let p_rank = p.relative_rank(strong);
    let (pi, ski, wki) = (p.0 as i32, sk.0 as i32, wk.0 as i32);

    let mut draw = false;

    if wki == pi + push {
        // Weak king blockades the push square.
        if p_rank <= 5 {
            draw = true;
        } else if sstm {
            draw = ski == pi - push - 1 || ski == pi - push + 1;
        } else {
            draw = ski != pi - push - 1 && ski != pi - push + 1;
        }
    } else if wki == pi + 2 * push {
        if p_rank <= 4 {
            draw = true;
        } else {
            debug_assert_eq!(p_rank, 5);
            if !sstm || (ski != pi - 1 && ski != pi + 1) {
                draw = true;
            }
        }
    } else if ski == pi - 1 || ski == pi + 1 {
        // Kings in opposition with the strong side to move.
        if wki == ski + 2 * push && sstm {
            draw = true;
        }
    } else if ski >= pi + push - 1 && ski <= pi + push + 1 {
        if p_rank <= 3 && wki == ski + 2 * push && sstm {
            draw = true;
        }
    }

    // Rook pawns have their own pathologies.
    if !draw && p.file() == 0 {
        let corner = if strong == Color::White {
            Square::A8
        } else {
            Square::A1
        };

        if wk.distance(corner) <= 1 {
            draw = true;
        } else if sk.file() == 0
            && wk.file() == 2
            && wk.relative_rank(strong) > p_rank + (p_rank == 1) as usize
        {
            // Strong king trapped in front of its own pawn.
            draw = true;
        }
    }

    if draw {
        scale[0] = 0;
        scale[1] = 0;
    }
}

/// KNP vs K: drawn only when the pawn sits on its seventh rank on a rook
/// file with the defending king on the promotion corner.
fn scale_knpk(pos: &Position, md: &MaterialData, scale: &mut [i32; 2]) {
    let strong = md.strong_side;
    debug_assert_eq!(pos.num_pieces(strong), 2);
    debug_assert_eq!(pos.num_pawns(strong), 1);
    debug_assert_eq!(pos.num_pieces(!strong), 1);
    debug_assert_eq!(pos.num_pawns(!strong), 0);

    let mut p = pos.pawns[strong][0];
    let mut defender = pos.king_square(!strong);

    if strong == Color::Black {
        p = p.flip();
        defender = defender.flip();
    }
    if p.file() == 7 {
        p = p.mirror();
        defender = defender.mirror();
    }

    if p == Square::A7 && defender.distance(Square::A8) <= 1 {
        scale[0] = 0;
        scale[1] = 0;
    }
}

/// KBP vs K: the rook-pawn-plus-wrong-bishop draw. If the bishop doesn't
/// control the promotion corner and the defending king does, the pawn never
/// queens.
fn scale_kbpk(pos: &Position, md: &MaterialData, scale: &mut [i32; 2]) {
    let strong = md.strong_side;
    debug_assert_eq!(pos.num_pieces(strong), 2);
    debug_assert_eq!(pos.num_pawns(strong), 1);
    debug_assert_eq!(pos.num_pieces(!strong), 1);
    debug_assert_eq!(pos.num_pawns(!strong), 0);

    let mut pf = pos.pawns[strong][0].file();
    let mut bc = pos.pieces[strong][1].color();

    if pf == 7 {
        pf = 0;
        bc = !bc;
    }

    let corner = if strong == Color::White {
        Square::A8
    } else {
        Square::A1
    };

    if pf == 0 && pos.king_square(!strong).distance(corner) <= 1 && bc != strong {
        scale[0] = 0;
        scale[1] = 0;
    }
}

/// KR vs KP: decide the race between the rook picking the pawn off and the
/// pawn running home under its king's escort.
fn scale_krkp(pos: &Position, md: &MaterialData, scale: &mut [i32; 2]) {
    let strong = md.strong_side;
    let weak = !strong;
    debug_assert_eq!(pos.num_pieces(strong), 2);
    debug_assert_eq!(pos.num_pawns(strong), 0);
    debug_assert_eq!(pos.num_pieces(weak), 1);
    debug_assert_eq!(pos.num_pawns(weak), 1);

    let mut bp = pos.pawns[weak][0];
    let mut wr = pos.pieces[strong][1];
    let mut wk = pos.king_square(strong);
    let mut bk = pos.king_square(weak);
    let tempo = (pos.side == strong) as i32;

    // Normalize so the strong side is White and the pawn runs down toward
    // rank 1. The promotion square is on the pawn's file at rank 1.
    if strong == Color::Black {
        wr = wr.flip();
        wk = wk.flip();
        bk = bk.flip();
        bp = bp.flip();
    }
    let prom_sq = Square::new(bp.file(), 0);

    // The strong king parks in front of the pawn, or beats the defending
    // king to the promotion square, or the defender is too far from both
    // pawn and rook to hold anything.
    if (wk.0 < bp.0 && wk.file() == bp.file())
        || (wk.distance(prom_sq) as i32 + 1 - tempo < bk.distance(prom_sq) as i32)
        || (bk.distance(bp) as i32 - (tempo ^ 1) >= 3 && bk.distance(wr) as i32 >= 3)
    {
        scale[strong] = FULL_SCALE;
        scale[weak] = 0;
        return;
    }

    let mut dist = i32::max(1, bk.distance(prom_sq) as i32) + bp.distance(prom_sq) as i32;

    if bk.0 as i32 == bp.0 as i32 - 16 {
        // The defending king is in the pawn's way.
        if prom_sq == Square::A1 || prom_sq == Square::H1 {
            return;
        }
        dist += 1;
    }

    if wr.file() != bp.file() && wr.rank() != 0 {
        dist -= 1;
    }
    if tempo == 0 {
        dist -= 1;
    }

    if wk.distance(prom_sq) as i32 > dist {
        scale[0] = 0;
        scale[1] = 0;
    }
}

/// KRP vs KR: the classic back-rank and Philidor-adjacent draws. Defined
/// but not dispatched; see `determine_endgame_scale`.
pub fn scale_krpkr(pos: &Position, md: &MaterialData, scale: &mut [i32; 2]) {
    let strong = md.strong_side;
    let weak = !strong;
    debug_assert_eq!(pos.num_pieces(strong), 2);
    debug_assert_eq!(pos.num_pawns(strong), 1);
    debug_assert_eq!(pos.num_pieces(weak), 2);
    debug_assert_eq!(pos.num_pawns(weak), 0);

    let mut wp = pos.pawns[strong][0];
    let mut wk = pos.king_square(strong);
    let mut wr = pos.pieces[strong][1];
    let mut bk = pos.king_square(weak);
    let mut br = pos.pieces[weak][1];

    if strong == Color::Black {
        wp = wp.flip();
        wk = wk.flip();
        wr = wr.flip();
        bk = bk.flip();
        br = br.flip();
    }

    let wp_file = wp.file();
    let wp_rank = wp.rank();
    let br_file = br.file();
    let prom_sq = Square::new(wp_file, 7);

    if bk == prom_sq {
        if br_file > wp_file {
            scale[0] = 0;
            scale[1] = 0;
        }
    } else if bk.file() == wp_file && bk.rank() > wp_rank {
        scale[0] = 0;
        scale[1] = 0;
    } else if wr == prom_sq
        && wp_rank == 6
        && br_file == wp_file
        && (bk == Square::A7 || bk == Square::B7 || bk == Square::G7 || bk == Square::H7)
        && ((br.rank() <= 2 && wk.distance(wp) > 1) || wk.distance(wp) > 2)
    {
        scale[0] = 0;
        scale[1] = 0;
    }
}

/// KP vs KB: drawn when the bishop controls (or occupies) a square on the
/// pawn's path. Defined but not dispatched; see `determine_endgame_scale`.
pub fn scale_kpkb(pos: &Position, md: &MaterialData, scale: &mut [i32; 2]) {
    let strong = md.strong_side;
    let weak = !strong;
    debug_assert_eq!(pos.num_pieces(strong), 1);
    debug_assert_eq!(pos.num_pawns(strong), 1);
    debug_assert_eq!(pos.num_pieces(weak), 2);
    debug_assert_eq!(pos.num_pawns(weak), 0);

    let mut wp = pos.pawns[strong][0];
    let mut bk = pos.king_square(weak);
    let mut bb = pos.pieces[weak][1];
    let prom_sq = Square::new(wp.file(), 7);

    if strong == Color::Black {
        wp = wp.flip();
        bk = bk.flip();
        bb = bb.flip();
    }

    let bishop = Piece::new(PieceType::Bishop, weak);
    let mut to = wp.offset(16).unwrap();

    while to != prom_sq {
        if to == bb {
            scale[0] = 0;
            scale[1] = 0;
            return;
        }

        if possible_attack(bb, to, bishop) {
            // Walk the bishop's ray; only the defending king can unblock it.
            let dir = direction(bb, to);
            let mut sq = bb.offset(dir).unwrap();
            while sq != to && sq != bk {
                sq = sq.offset(dir).unwrap();
            }
            if sq == to {
                scale[0] = 0;
                scale[1] = 0;
            }
            return;
        }

        to = to.offset(16).unwrap();
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

    fn material_data(fen: &str) -> (Position, MaterialData) {
        let pos: Position = fen.parse().unwrap();
        let md = MaterialData::classify(&pos);
        (pos, md)
    }

    #[test]
    fn classify_signatures() {
        use EndgameType::*;

        for (fen, expected, strong) in [
            ("4k3/8/8/8/8/8/8/4K3 w - - 0 1", Draw, Color::White),
            ("4k3/8/8/8/8/8/8/2B1K3 w - - 0 1", Draw, Color::White),
            ("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1", Kpk, Color::White),
            ("4K3/8/8/8/8/8/4p3/4k3 w - - 0 1", Kpk, Color::Black),
            ("k7/8/8/8/3NKB2/8/8/8 w - - 0 1", Kbnk, Color::White),
            ("4k3/8/8/8/8/8/8/R3K3 w - - 0 1", Win, Color::White),
            ("4k3/8/8/8/8/8/8/Q3K3 b - - 0 1", Win, Color::White),
            ("8/8/8/8/8/6R1/1kp5/7K w - - 0 1", Krkp, Color::White),
            ("4k2r/4P3/8/8/8/8/8/R3K3 w - - 0 1", Krpkr, Color::White),
            ("4k3/8/4b3/8/4P3/8/8/4K3 w - - 0 1", Kpkb, Color::White),
            ("4k3/8/8/8/8/8/P6N/K7 w - - 0 1", Knpk, Color::White),
            ("k7/8/P7/8/8/8/8/2B1K3 w - - 0 1", Kbpk, Color::White),
        ] {
            let (_, md) = material_data(fen);
            assert_eq!(md.eg_type, expected, "{fen}");
            assert_eq!(md.strong_side, strong, "{fen}");
        }

        // A middlegame position is nothing special.
        let (_, md) = material_data(chess::fen::START_FEN);
        assert_eq!(md.eg_type, None);
        assert_eq!(md.scale, [FULL_SCALE; 2]);
    }

    #[test]
    fn endgame_closure() {
        // Draw signatures score exactly DRAW_VALUE, win signatures exactly
        // +/- WON_ENDGAME.
        let (pos, md) = material_data("4k3/8/8/8/8/8/8/2B1K3 w - - 0 1");
        assert_eq!(endgame_score(&pos, &md), Some(DRAW_VALUE));

        let (pos, md) = material_data("4k3/8/8/8/8/8/8/R3K3 w - - 0 1");
        assert_eq!(endgame_score(&pos, &md), Some(WON_ENDGAME));

        let (pos, md) = material_data("4k3/8/8/8/8/8/8/R3K3 b - - 0 1");
        assert_eq!(endgame_score(&pos, &md), Some(-WON_ENDGAME));

        // KPK has no score function; it only scales.
        let (pos, md) = material_data("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1");
        assert_eq!(endgame_score(&pos, &md), Option::None);
    }

    #[test]
    fn kbnk_corner_gradient() {
        // Dark-squared bishop: the defending king on a8 already sits in a
        // wrong (light) corner... which for corner_dist purposes counts the
        // dark corners a1/h8, both 7 away, plus the rank/file pull of 0.
        let (pos, md) = material_data("k7/8/8/8/3NKB2/8/8/8 w - - 0 1");
        let expected = WON_ENDGAME - 10 * 7 - 4;
        assert_eq!(endgame_score(&pos, &md), Some(expected));

        let (pos, md) = material_data("k7/8/8/8/3NKB2/8/8/8 b - - 0 1");
        assert_eq!(endgame_score(&pos, &md), Some(-expected));
    }

    #[test]
    fn kpk_blockade_draws() {
        // Weak king sits right on the push square with the pawn still on
        // rank 2: dead draw.
        let (pos, md) = material_data("8/8/8/8/8/4k3/4P3/4K3 w - - 0 1");
        assert_eq!(determine_endgame_scale(&pos, &md), [0, 0]);

        // Same, for Black as the strong side.
        let (pos, md) = material_data("4k3/4p3/4K3/8/8/8/8/8 b - - 0 1");
        assert_eq!(determine_endgame_scale(&pos, &md), [0, 0]);
    }

    #[test]
    fn kpk_live_positions_keep_scale() {
        // Strong king escorts the pawn from the side: no draw rule applies.
        let (pos, md) = material_data("8/8/8/4k3/8/4K3/4P3/8 w - - 0 1");
        assert_eq!(determine_endgame_scale(&pos, &md), md.scale);
        assert_eq!(md.scale, [FULL_SCALE; 2]);
    }

    #[test]
    fn kpk_rook_pawn_draws() {
        // Defender owns the promotion corner of a rook pawn.
        let (pos, md) = material_data("7k/8/8/8/8/8/P7/K7 w - - 0 1");
        assert_eq!(determine_endgame_scale(&pos, &md), md.scale);

        let (pos, md) = material_data("1k6/8/8/8/8/8/P7/K7 w - - 0 1");
        assert_eq!(determine_endgame_scale(&pos, &md), [0, 0]);
    }

    #[test]
    fn knpk_corner_draw() {
        // Pawn on a7, defender on the corner: the knight can't lose a tempo.
        let (pos, md) = material_data("k7/P7/8/8/8/8/8/K6N w - - 0 1");
        assert_eq!(md.eg_type, EndgameType::Knpk);
        assert_eq!(determine_endgame_scale(&pos, &md), [0, 0]);

        // Pawn one rank back is still winnable.
        let (pos, md) = material_data("k7/8/P7/8/8/8/8/K6N w - - 0 1");
        assert_eq!(determine_endgame_scale(&pos, &md), [FULL_SCALE; 2]);
    }

    #[test]
    fn kbpk_wrong_bishop_draw() {
        // Dark-squared bishop, a-pawn, light promotion corner held by the
        // defender: draw.
        let (pos, md) = material_data("k7/8/P7/8/8/8/8/2B1K3 w - - 0 1");
        assert_eq!(determine_endgame_scale(&pos, &md), [0, 0]);

        // The light-squared bishop on d3 controls a8: winnable.
        let (pos, md) = material_data("k7/8/P7/8/8/3B4/8/4K3 w - - 0 1");
        assert_eq!(determine_endgame_scale(&pos, &md), [FULL_SCALE; 2]);
    }

    #[test]
    fn krkp_verdicts() {
        // Strong king already in front of the pawn: full win, defender's
        // eval silenced.
        let (pos, md) = material_data("8/8/8/8/8/1k6/p7/K3R3 w - - 0 1");
        assert_eq!(determine_endgame_scale(&pos, &md), [FULL_SCALE, 0]);

        // Strong king hopelessly far from the passer: draw.
        let (pos, md) = material_data("8/8/8/8/8/6R1/1kp5/7K w - - 0 1");
        assert_eq!(determine_endgame_scale(&pos, &md), [0, 0]);
    }

    #[test]
    fn krpkr_stays_unwired() {
        // Back-rank defense: the function itself calls it a draw, but the
        // dispatch table leaves KRPKR alone.
        let (pos, md) = material_data("4k2r/4P3/8/8/8/8/8/R3K3 w - - 0 1");
        assert_eq!(determine_endgame_scale(&pos, &md), md.scale);

        let mut scale = md.scale;
        scale_krpkr(&pos, &md, &mut scale);
        assert_eq!(scale, [0, 0]);
    }

    #[test]
    fn kpkb_stays_unwired() {
        // Bishop parked on the pawn's path.
        let (pos, md) = material_data("4k3/8/4b3/8/4P3/8/8/4K3 w - - 0 1");
        assert_eq!(determine_endgame_scale(&pos, &md), md.scale);

        let mut scale = md.scale;
        scale_kpkb(&pos, &md, &mut scale);
        assert_eq!(scale, [0, 0]);

        // Bishop covering a path square from the side.
        let (pos, md) = material_data("4k3/8/8/8/4P2b/8/8/4K3 w - - 0 1");
        let mut scale = md.scale;
        scale_kpkb(&pos, &md, &mut scale);
        assert_eq!(scale, [0, 0]);
    }
}
