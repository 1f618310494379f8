//! Attack map generation.
//!
//! For every piece on the board the map records which squares it
//! attacks, classified as direct (reachable on its next move) or
//! indirect (x-ray influence through exactly one blocker), together
//! with the full attack line from attacker to target. Squares also
//! record their defenders. The map is rebuilt from scratch every ply;
//! nothing is patched incrementally.
//!
//! Sliding pieces share one ray walker, knights and kings share one
//! offset walker, and pawns get their own handling because their
//! attacks (capture diagonals, recorded even when empty) and their
//! moves (forward pushes, never attacking) are disjoint.

use crate::board::{Board, Piece, PieceId};
use chess_core::{Color, PieceKind, Square};

/// Rook and queen ray directions.
const ORTHOGONAL: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Bishop and queen ray directions.
const DIAGONAL: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Knight jump offsets.
const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

/// King step offsets.
const KING_OFFSETS: [(i8, i8); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// One attacker's influence on one square: the attacker's id and the
/// ordered squares from the attacker's square to the target, inclusive.
#[derive(Debug, Clone)]
pub struct AttackLine {
    pub attacker: PieceId,
    pub squares: Vec<Square>,
}

impl AttackLine {
    /// True if `square` lies on this line.
    pub fn contains(&self, square: Square) -> bool {
        self.squares.contains(&square)
    }
}

/// Everything recorded about one square during attack generation.
#[derive(Debug, Clone, Default)]
pub struct SquareAttacks {
    /// Attackers that reach this square on their next move.
    pub direct: Vec<AttackLine>,
    /// X-ray attackers whose line penetrates exactly one blocker.
    pub indirect: Vec<AttackLine>,
    /// Pieces of the occupant's own color guarding it.
    pub defenders: Vec<PieceId>,
}

/// The full attack map for a board: per-square attack records plus each
/// piece's candidate destinations (pseudo-legal, before check and pin
/// resolution).
#[derive(Debug, Clone)]
pub struct AttackMap {
    squares: Vec<SquareAttacks>,
    candidates: Vec<Vec<Square>>,
}

impl AttackMap {
    /// Computes the attack map for every piece of both colors.
    ///
    /// `en_passant` is the current en-passant target square, if any;
    /// it turns the matching pawn capture diagonal into a candidate
    /// move for the side entitled to play it.
    pub fn compute(board: &Board, en_passant: Option<Square>) -> Self {
        let mut map = AttackMap {
            squares: vec![SquareAttacks::default(); 64],
            candidates: vec![Vec::new(); board.arena_len()],
        };
        for piece in board.live_pieces() {
            match piece.kind {
                PieceKind::Rook => map.walk_rays(board, piece, &ORTHOGONAL),
                PieceKind::Bishop => map.walk_rays(board, piece, &DIAGONAL),
                PieceKind::Queen => {
                    map.walk_rays(board, piece, &ORTHOGONAL);
                    map.walk_rays(board, piece, &DIAGONAL);
                }
                PieceKind::Knight => map.walk_offsets(board, piece, &KNIGHT_OFFSETS),
                PieceKind::King => map.walk_offsets(board, piece, &KING_OFFSETS),
                PieceKind::Pawn => map.pawn(board, piece, en_passant),
            }
        }
        map
    }

    /// Returns the attack record for a square.
    #[inline]
    pub fn on(&self, square: Square) -> &SquareAttacks {
        &self.squares[square.index() as usize]
    }

    /// Returns a piece's candidate destinations.
    #[inline]
    pub fn candidates(&self, id: PieceId) -> &[Square] {
        &self.candidates[id.index()]
    }

    /// True if `by` attacks `square` directly.
    pub fn is_attacked(&self, board: &Board, square: Square, by: Color) -> bool {
        self.on(square)
            .direct
            .iter()
            .any(|line| board.piece(line.attacker).color == by)
    }

    fn record(&mut self, target: Square, attacker: PieceId, line: &[Square], direct: bool) {
        let entry = AttackLine {
            attacker,
            squares: line.to_vec(),
        };
        let square = &mut self.squares[target.index() as usize];
        if direct {
            square.direct.push(entry);
        } else {
            square.indirect.push(entry);
        }
    }

    /// Walks every ray in `directions`, accumulating direct attacks up
    /// to the first occupied square, then x-raying on until the second.
    fn walk_rays(&mut self, board: &Board, piece: &Piece, directions: &[(i8, i8)]) {
        for &(df, dr) in directions {
            let mut line = vec![piece.square];
            let mut square = piece.square;
            let mut direct = true;
            while let Some(next) = square.offset(df, dr) {
                square = next;
                line.push(square);
                match board.piece_at(square) {
                    None => {
                        self.record(square, piece.id, &line, direct);
                        if direct {
                            self.candidates[piece.id.index()].push(square);
                        }
                    }
                    Some(occupant) => {
                        if occupant.color == piece.color && direct {
                            self.squares[square.index() as usize].defenders.push(piece.id);
                        } else {
                            self.record(square, piece.id, &line, direct);
                            if direct
                                && occupant.color != piece.color
                                && occupant.kind != PieceKind::King
                            {
                                self.candidates[piece.id.index()].push(square);
                            }
                        }
                        if !direct {
                            break; // second blocker ends the ray
                        }
                        direct = false; // penetrate the first blocker in x-ray mode
                    }
                }
            }
        }
    }

    /// Fixed-offset destinations for knights and kings.
    fn walk_offsets(&mut self, board: &Board, piece: &Piece, offsets: &[(i8, i8)]) {
        for &(df, dr) in offsets {
            let Some(square) = piece.square.offset(df, dr) else {
                continue;
            };
            let line = [piece.square, square];
            match board.piece_at(square) {
                None => {
                    self.record(square, piece.id, &line, true);
                    self.candidates[piece.id.index()].push(square);
                }
                Some(occupant) if occupant.color != piece.color => {
                    self.record(square, piece.id, &line, true);
                    if occupant.kind != PieceKind::King {
                        self.candidates[piece.id.index()].push(square);
                    }
                }
                Some(_) => {
                    self.squares[square.index() as usize].defenders.push(piece.id);
                }
            }
        }
    }

    /// Pawn moves and attacks. Pushes never attack; capture diagonals
    /// always do, even when empty, because they constrain the enemy
    /// king.
    fn pawn(&mut self, board: &Board, piece: &Piece, en_passant: Option<Square>) {
        let dir = piece.color.pawn_direction();

        if let Some(one) = piece.square.offset(0, dir) {
            if board.is_empty(one) {
                self.candidates[piece.id.index()].push(one);
                if piece.square.rank().index() == piece.color.pawn_rank() {
                    if let Some(two) = one.offset(0, dir) {
                        if board.is_empty(two) {
                            self.candidates[piece.id.index()].push(two);
                        }
                    }
                }
            }
        }

        for df in [-1i8, 1] {
            let Some(square) = piece.square.offset(df, dir) else {
                continue;
            };
            let line = [piece.square, square];
            match board.piece_at(square) {
                None => {
                    self.record(square, piece.id, &line, true);
                    if en_passant == Some(square) && en_passant_capturer(square) == piece.color {
                        self.candidates[piece.id.index()].push(square);
                    }
                }
                Some(occupant) if occupant.color != piece.color => {
                    self.record(square, piece.id, &line, true);
                    if occupant.kind != PieceKind::King {
                        self.candidates[piece.id.index()].push(square);
                    }
                }
                Some(_) => {
                    self.squares[square.index() as usize].defenders.push(piece.id);
                }
            }
        }
    }
}

/// The color entitled to capture on an en-passant target square. A
/// target on rank 3 was left by a White double push, so Black captures
/// there, and vice versa.
fn en_passant_capturer(target: Square) -> Color {
    if target.rank().index() == 2 {
        Color::Black
    } else {
        Color::White
    }
}
