//! Legality resolution: check, pins, king safety, and castling.
//!
//! The resolver turns the attack map's candidate moves into the final
//! legal-move surface, per side. Checks restrict non-king pieces to the
//! checker's attack line, pins restrict a piece to its pin line, king
//! moves are filtered against enemy coverage, and castling is evaluated
//! against its full precondition set.

use std::collections::BTreeMap;

use chess_core::{Color, Move, MoveKind, PieceKind, Square, Wing};

use crate::attacks::{AttackLine, AttackMap};
use crate::board::{Board, Piece, PieceId};
use crate::position::{rook_home, Position};

/// Per-ply analysis of a position: the rebuilt attack map, both sides'
/// legal moves, and check flags.
///
/// The legal-move maps are the authoritative surface: a move is legal
/// if and only if its destination appears under its piece here. Every
/// live piece of a side has an entry; an immobilized piece maps to an
/// empty list.
#[derive(Debug, Clone)]
pub struct Analysis {
    attacks: AttackMap,
    legal: [BTreeMap<PieceId, Vec<Square>>; 2],
    in_check: [bool; 2],
}

impl Analysis {
    /// Analyzes a position: rebuilds the attack map and resolves both
    /// sides' legal moves.
    pub fn of(position: &Position) -> Self {
        let attacks = AttackMap::compute(position.board(), position.en_passant());
        let mut analysis = Analysis {
            attacks,
            legal: [BTreeMap::new(), BTreeMap::new()],
            in_check: [false, false],
        };
        for color in Color::ALL {
            analysis.resolve_side(position, color);
        }
        analysis
    }

    /// The attack map this analysis was resolved from.
    pub fn attacks(&self) -> &AttackMap {
        &self.attacks
    }

    /// The legal moves of one side, keyed by piece.
    pub fn legal_moves(&self, color: Color) -> &BTreeMap<PieceId, Vec<Square>> {
        &self.legal[color.index()]
    }

    /// True if the given side's king is in check.
    pub fn is_check(&self, color: Color) -> bool {
        self.in_check[color.index()]
    }

    /// True if the given side has at least one legal move.
    pub fn has_moves(&self, color: Color) -> bool {
        self.legal[color.index()].values().any(|d| !d.is_empty())
    }

    /// True if moving `piece` to `to` is legal for `color`.
    pub fn is_legal(&self, color: Color, piece: PieceId, to: Square) -> bool {
        self.legal[color.index()]
            .get(&piece)
            .is_some_and(|dests| dests.contains(&to))
    }

    fn resolve_side(&mut self, position: &Position, color: Color) {
        let board = position.board();
        let king_id = board.king(color);
        let king_sq = board.piece(king_id).square;
        let enemy = color.opposite();

        let checkers: Vec<AttackLine> = self
            .attacks
            .on(king_sq)
            .direct
            .iter()
            .filter(|line| board.piece(line.attacker).color == enemy)
            .cloned()
            .collect();
        self.in_check[color.index()] = !checkers.is_empty();

        let mut legal = BTreeMap::new();
        for piece in board.pieces_of(color) {
            if piece.id == king_id {
                continue;
            }
            legal.insert(piece.id, self.resolve_piece(position, piece, king_sq, &checkers));
        }
        legal.insert(king_id, self.resolve_king(position, board.piece(king_id), &checkers));
        self.legal[color.index()] = legal;
    }

    /// Filters a non-king piece's candidates down to its legal set.
    fn resolve_piece(
        &self,
        position: &Position,
        piece: &Piece,
        king_sq: Square,
        checkers: &[AttackLine],
    ) -> Vec<Square> {
        let board = position.board();

        // An en-passant candidate is set aside and judged by simulation:
        // it is the one capture that empties two squares of the same
        // rank in a single ply, which the line filters below cannot see.
        let ep_target = position.en_passant().filter(|target| {
            piece.kind == PieceKind::Pawn && self.attacks.candidates(piece.id).contains(target)
        });

        let mut dests: Vec<Square> = self.attacks.candidates(piece.id).to_vec();
        if let Some(target) = ep_target {
            dests.retain(|d| *d != target);
        }

        match checkers.len() {
            0 => {}
            // capture the checker or block its line
            1 => dests.retain(|d| *d != king_sq && checkers[0].contains(*d)),
            // double check: only the king may move
            _ => dests.clear(),
        }

        // pin: a direct attacker of this piece that also x-rays its own
        // king through it restricts it to that line
        for attack in &self.attacks.on(piece.square).direct {
            if board.piece(attack.attacker).color == piece.color {
                continue;
            }
            for xray in &self.attacks.on(king_sq).indirect {
                if xray.attacker == attack.attacker && xray.contains(piece.square) {
                    dests.retain(|d| xray.contains(*d));
                }
            }
        }

        if let Some(target) = ep_target {
            if checkers.len() < 2 {
                let mv = Move::new(piece.square, target, MoveKind::EnPassant);
                if !leaves_king_attacked(position, mv, piece.color) {
                    dests.push(target);
                }
            }
        }

        dests
    }

    /// Filters the king's candidates and evaluates castling.
    fn resolve_king(
        &self,
        position: &Position,
        king: &Piece,
        checkers: &[AttackLine],
    ) -> Vec<Square> {
        let board = position.board();
        let mut dests: Vec<Square> = self.attacks.candidates(king.id).to_vec();
        dests.retain(|&dest| self.king_destination_safe(board, king, dest, checkers));

        // castling out of check is illegal
        if checkers.is_empty() {
            for wing in Wing::ALL {
                if let Some(target) = self.castling_destination(position, king, wing) {
                    dests.push(target);
                }
            }
        }
        dests
    }

    fn king_destination_safe(
        &self,
        board: &Board,
        king: &Piece,
        dest: Square,
        checkers: &[AttackLine],
    ) -> bool {
        let enemy = king.color.opposite();
        let on = self.attacks.on(dest);

        // squares the enemy reaches directly are out
        if self.attacks.is_attacked(board, dest, enemy) {
            return false;
        }
        // capturing a guarded piece is out
        if board.occupant(dest).is_some() && !on.defenders.is_empty() {
            return false;
        }
        // a sliding check cannot be escaped by stepping along its own
        // ray: the checker's x-ray through the king's current square
        // still covers the destination
        if !checkers.is_empty() {
            for xray in &on.indirect {
                if xray.contains(king.square)
                    && checkers.iter().any(|c| c.attacker == xray.attacker)
                {
                    return false;
                }
            }
        }
        true
    }

    /// Returns the king's landing square if castling on `wing` is legal.
    fn castling_destination(
        &self,
        position: &Position,
        king: &Piece,
        wing: Wing,
    ) -> Option<Square> {
        let board = position.board();
        let color = king.color;
        if !position.castling().can_castle(color, wing) || king.has_moved {
            return None;
        }
        let rook = board.piece_at(rook_home(color, wing))?;
        if rook.kind != PieceKind::Rook || rook.color != color || rook.has_moved {
            return None;
        }

        let back = color.back_rank();
        // squares between king and rook, the king's path, and where it lands
        let (between, path, target): (&[u8], &[u8], u8) = match wing {
            Wing::Kingside => (&[5, 6], &[5, 6], 6),
            Wing::Queenside => (&[1, 2, 3], &[2, 3], 2),
        };
        for &file in between {
            if !board.is_empty(Square::from_coords(file, back)?) {
                return None;
            }
        }
        let enemy = color.opposite();
        for &file in path {
            if self.attacks.is_attacked(board, Square::from_coords(file, back)?, enemy) {
                return None;
            }
        }
        Square::from_coords(target, back)
    }
}

/// Applies `mv` to a scratch clone and reports whether `color`'s king
/// ends up directly attacked.
fn leaves_king_attacked(position: &Position, mv: Move, color: Color) -> bool {
    let mut scratch = position.clone();
    scratch.apply(mv);
    let board = scratch.board();
    let attacks = AttackMap::compute(board, None);
    attacks.is_attacked(board, board.king_square(color), color.opposite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    fn total_moves(analysis: &Analysis, color: Color) -> usize {
        analysis.legal_moves(color).values().map(Vec::len).sum()
    }

    #[test]
    fn twenty_moves_from_the_start() {
        let position = Position::new();
        let analysis = Analysis::of(&position);
        assert_eq!(total_moves(&analysis, Color::White), 20);
        assert_eq!(total_moves(&analysis, Color::Black), 20);
        assert!(!analysis.is_check(Color::White));
        assert!(!analysis.is_check(Color::Black));
    }

    #[test]
    fn every_live_piece_has_an_entry() {
        let position = Position::new();
        let analysis = Analysis::of(&position);
        assert_eq!(analysis.legal_moves(Color::White).len(), 16);
        // boxed-in pieces are present with empty destination lists
        let rook = position.board().occupant(sq("a1")).unwrap();
        assert_eq!(analysis.legal_moves(Color::White)[&rook], Vec::<Square>::new());
    }

    #[test]
    fn pinned_knight_cannot_move() {
        let layout = [
            [".", ".", ".", ".", "Kb", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", "Nb", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            ["Bw", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", "Kw", ".", ".", "."],
        ];
        let position = Position::from_layout(&layout, Color::Black).unwrap();
        let analysis = Analysis::of(&position);
        let knight = position.board().occupant(sq("c6")).unwrap();
        assert!(analysis.legal_moves(Color::Black)[&knight].is_empty());
        assert!(!analysis.is_check(Color::Black));
    }

    #[test]
    fn pinned_rook_can_slide_along_the_pin_line() {
        let layout = [
            [".", ".", ".", ".", "Kb", ".", ".", "."],
            [".", ".", ".", ".", "Rb", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", "Rw", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", "Kw", ".", ".", "."],
        ];
        let position = Position::from_layout(&layout, Color::Black).unwrap();
        let analysis = Analysis::of(&position);
        let rook = position.board().occupant(sq("e7")).unwrap();
        let mut dests = analysis.legal_moves(Color::Black)[&rook].clone();
        dests.sort();
        // down the e-file, up to and including the pinning rook
        let mut expected: Vec<_> = ["e4", "e5", "e6"].iter().map(|s| sq(s)).collect();
        expected.sort();
        assert_eq!(dests, expected);
    }

    #[test]
    fn single_check_restricts_to_block_or_capture() {
        let layout = [
            [".", ".", ".", ".", "Kb", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", "Rb", ".", ".", "Rw"],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", "Kw", ".", ".", "."],
        ];
        // black rook on e4 checks the white king on e1
        let position = Position::from_layout(&layout, Color::White).unwrap();
        let analysis = Analysis::of(&position);
        assert!(analysis.is_check(Color::White));

        // the white rook on h4 can only resolve the check by capturing
        // the checker; none of its other squares lie on the check line
        let rook = position.board().occupant(sq("h4")).unwrap();
        assert_eq!(analysis.legal_moves(Color::White)[&rook], vec![sq("e4")]);

        // the king sidesteps but may not stay on the e-file
        let king = position.board().king(Color::White);
        let dests = &analysis.legal_moves(Color::White)[&king];
        assert!(!dests.contains(&sq("e2")));
        assert!(dests.contains(&sq("d1")));
        assert!(dests.contains(&sq("f2")));
    }

    #[test]
    fn double_check_leaves_only_king_moves() {
        let layout = [
            [".", ".", ".", "Qb", "Kb", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", "Nw", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", "Rw", ".", "Kw", "."],
        ];
        let position = Position::from_layout(&layout, Color::Black).unwrap();
        let analysis = Analysis::of(&position);
        assert!(analysis.is_check(Color::Black));

        let queen = position.board().occupant(sq("d8")).unwrap();
        assert!(analysis.legal_moves(Color::Black)[&queen].is_empty());

        let king = position.board().king(Color::Black);
        let mut dests = analysis.legal_moves(Color::Black)[&king].clone();
        dests.sort();
        let mut expected: Vec<_> = ["f7", "f8"].iter().map(|s| sq(s)).collect();
        expected.sort();
        assert_eq!(dests, expected);
    }

    #[test]
    fn king_cannot_step_along_a_sliding_check_ray() {
        let layout = [
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", "Kb", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", "Rw", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", "Kw", "."],
        ];
        let position = Position::from_layout(&layout, Color::Black).unwrap();
        let analysis = Analysis::of(&position);
        assert!(analysis.is_check(Color::Black));

        let king = position.board().king(Color::Black);
        let dests = &analysis.legal_moves(Color::Black)[&king];
        // e6 lies on the rook's ray beyond the king: still covered
        assert!(!dests.contains(&sq("e6")));
        assert!(!dests.contains(&sq("e4")));
        assert!(dests.contains(&sq("d4")));
        assert!(dests.contains(&sq("f6")));
    }

    #[test]
    fn king_cannot_capture_a_guarded_checker() {
        let layout = [
            [".", ".", ".", ".", ".", ".", ".", "Kw"],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", "Bw", ".", "."],
            [".", ".", ".", ".", "Rw", ".", ".", "."],
            [".", ".", ".", ".", "Kb", ".", ".", "."],
        ];
        // the white rook on e2 checks the black king on e1 and is
        // guarded by the bishop on f3
        let position = Position::from_layout(&layout, Color::Black).unwrap();
        let analysis = Analysis::of(&position);
        assert!(analysis.is_check(Color::Black));

        let king = position.board().king(Color::Black);
        let dests = &analysis.legal_moves(Color::Black)[&king];
        assert!(!dests.contains(&sq("e2")));
        // d1 is only x-rayed by the bishop through the rook: fine
        assert!(dests.contains(&sq("d1")));
        assert!(dests.contains(&sq("f1")));
        assert!(!dests.contains(&sq("d2")));
    }

    #[test]
    fn kings_keep_their_distance() {
        let layout = [
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", "Kb", ".", "Kw", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
        ];
        let position = Position::from_layout(&layout, Color::White).unwrap();
        let analysis = Analysis::of(&position);
        let king = position.board().king(Color::White);
        let dests = &analysis.legal_moves(Color::White)[&king];
        assert!(!dests.contains(&sq("e4")));
        assert!(!dests.contains(&sq("e5")));
        assert!(!dests.contains(&sq("e6")));
        assert!(dests.contains(&sq("g5")));
    }

    #[test]
    fn castling_blocked_by_attack_on_path() {
        let layout = [
            ["Rb", ".", ".", ".", "Kb", ".", ".", "Rb"],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", "Rb", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            ["Pw", "Pw", "Pw", "Pw", "Pw", ".", "Pw", "Pw"],
            ["Rw", ".", ".", ".", "Kw", ".", ".", "Rw"],
        ];
        // black rook on f5 covers f1: no kingside castling for White,
        // queenside is fine
        let position = Position::from_layout(&layout, Color::White).unwrap();
        let analysis = Analysis::of(&position);
        let king = position.board().king(Color::White);
        let dests = &analysis.legal_moves(Color::White)[&king];
        assert!(!dests.contains(&sq("g1")));
        assert!(dests.contains(&sq("c1")));
    }

    #[test]
    fn castling_requires_empty_between_squares() {
        let position = Position::new();
        let analysis = Analysis::of(&position);
        let king = position.board().king(Color::White);
        let dests = &analysis.legal_moves(Color::White)[&king];
        assert!(dests.is_empty());
    }

    #[test]
    fn no_castling_while_in_check() {
        let layout = [
            ["Rb", ".", ".", ".", "Kb", ".", ".", "Rb"],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", "Rw", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", "Kw", ".", ".", "."],
        ];
        let position = Position::from_layout(&layout, Color::Black).unwrap();
        let analysis = Analysis::of(&position);
        assert!(analysis.is_check(Color::Black));
        let king = position.board().king(Color::Black);
        let dests = &analysis.legal_moves(Color::Black)[&king];
        assert!(!dests.contains(&sq("g8")));
        assert!(!dests.contains(&sq("c8")));
    }

    #[test]
    fn en_passant_discovering_check_on_own_king_is_rejected() {
        // kings and pawns on the same rank with a rook behind: after
        // exd6 both pawns leave rank 5 and the rook hits the king
        let layout = [
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", "Pb", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            ["Kw", ".", ".", ".", "Pw", ".", ".", "Rb"],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", "Kb", ".", ".", "."],
        ];
        let mut position = Position::from_layout(&layout, Color::Black).unwrap();
        position.apply(Move::normal(sq("d7"), sq("d5")));
        assert_eq!(position.en_passant(), Some(sq("d6")));

        let analysis = Analysis::of(&position);
        let pawn = position.board().occupant(sq("e5")).unwrap();
        assert!(!analysis.legal_moves(Color::White)[&pawn].contains(&sq("d6")));
    }

    #[test]
    fn en_passant_capturing_the_checking_pawn_is_allowed() {
        // a double push lands next to a white pawn and checks the white
        // king diagonally; the en-passant capture removes the checker
        let layout = [
            [".", ".", ".", ".", "Kb", ".", ".", "."],
            [".", ".", "Pb", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", "Pw", ".", ".", ".", ".", ".", "."],
            [".", "Kw", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
            [".", ".", ".", ".", ".", ".", ".", "."],
        ];
        let mut position = Position::from_layout(&layout, Color::Black).unwrap();
        position.apply(Move::normal(sq("c7"), sq("c5")));
        assert_eq!(position.en_passant(), Some(sq("c6")));

        let analysis = Analysis::of(&position);
        assert!(analysis.is_check(Color::White));
        let pawn = position.board().occupant(sq("b5")).unwrap();
        assert!(analysis.legal_moves(Color::White)[&pawn].contains(&sq("c6")));
    }
}
