//! Board state: square occupancy, the piece arena, and king lookup.
//!
//! The board is a pure container. It answers "what is where" and applies
//! raw placement changes; chess legality lives in the attack and
//! legality modules. Pieces and squares refer to each other through
//! [`PieceId`] arena indices, never through owning references.

use chess_core::{Color, PieceKind, Square};
use thiserror::Error;

/// Stable identity of a piece, indexing the board's piece arena.
///
/// Ids are never reused; a promoted pawn's replacement gets a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PieceId(usize);

impl PieceId {
    /// Returns the arena index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A piece in the arena.
///
/// Captured (or promoted-away) pieces stay in the arena with `alive`
/// cleared, so ids held elsewhere keep resolving.
#[derive(Debug, Clone)]
pub struct Piece {
    pub id: PieceId,
    pub kind: PieceKind,
    pub color: Color,
    pub square: Square,
    pub has_moved: bool,
    pub alive: bool,
}

/// Errors raised when building a board from a layout grid.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("unknown piece symbol {symbol:?} on {square}")]
    UnknownSymbol { symbol: String, square: Square },

    #[error("layout has no {0} king")]
    MissingKing(Color),

    #[error("layout has more than one {0} king")]
    DuplicateKing(Color),
}

/// The 8x8 board: occupancy per square plus the arena of every piece
/// that has ever been on it, with a king cache per side.
#[derive(Debug, Clone)]
pub struct Board {
    squares: [Option<PieceId>; 64],
    pieces: Vec<Piece>,
    kings: [PieceId; 2],
}

/// The standard starting layout, rank 8 at the top.
const STANDARD: [[&str; 8]; 8] = [
    ["Rb", "Nb", "Bb", "Qb", "Kb", "Bb", "Nb", "Rb"],
    ["Pb", "Pb", "Pb", "Pb", "Pb", "Pb", "Pb", "Pb"],
    [".", ".", ".", ".", ".", ".", ".", "."],
    [".", ".", ".", ".", ".", ".", ".", "."],
    [".", ".", ".", ".", ".", ".", ".", "."],
    [".", ".", ".", ".", ".", ".", ".", "."],
    ["Pw", "Pw", "Pw", "Pw", "Pw", "Pw", "Pw", "Pw"],
    ["Rw", "Nw", "Bw", "Qw", "Kw", "Bw", "Nw", "Rw"],
];

impl Board {
    /// Creates the standard starting board.
    pub fn standard() -> Self {
        Self::from_layout(&STANDARD).expect("standard layout is valid")
    }

    /// Builds a board from an 8x8 symbol grid.
    ///
    /// Rows run from rank 8 down to rank 1, so a literal reads like a
    /// diagram from White's side. Cells hold two-character symbols such
    /// as `"Rw"` or `"Kb"`, or `"."` for an empty square. Pieces found
    /// off their home squares are marked as having moved, which
    /// forfeits castling and pawn double-push rights.
    pub fn from_layout(layout: &[[&str; 8]; 8]) -> Result<Self, LayoutError> {
        let mut board = Board {
            squares: [None; 64],
            pieces: Vec::new(),
            kings: [PieceId(0); 2],
        };
        let mut kings = [None; 2];

        for (row, cells) in layout.iter().enumerate() {
            let rank = 7 - row as u8;
            for (file, cell) in cells.iter().enumerate() {
                if *cell == "." {
                    continue;
                }
                let square = Square::from_coords(file as u8, rank)
                    .expect("layout indices are in range");
                let (kind, color) =
                    PieceKind::from_symbol(cell).ok_or_else(|| LayoutError::UnknownSymbol {
                        symbol: (*cell).to_string(),
                        square,
                    })?;
                let id = PieceId(board.pieces.len());
                if kind == PieceKind::King {
                    if kings[color.index()].is_some() {
                        return Err(LayoutError::DuplicateKing(color));
                    }
                    kings[color.index()] = Some(id);
                }
                board.pieces.push(Piece {
                    id,
                    kind,
                    color,
                    square,
                    has_moved: !on_home_square(kind, color, square),
                    alive: true,
                });
                board.squares[square.index() as usize] = Some(id);
            }
        }

        for color in Color::ALL {
            match kings[color.index()] {
                Some(id) => board.kings[color.index()] = id,
                None => return Err(LayoutError::MissingKing(color)),
            }
        }
        Ok(board)
    }

    /// Returns the id of the piece on a square, if any.
    #[inline]
    pub fn occupant(&self, square: Square) -> Option<PieceId> {
        self.squares[square.index() as usize]
    }

    /// Returns true if the square is empty.
    #[inline]
    pub fn is_empty(&self, square: Square) -> bool {
        self.occupant(square).is_none()
    }

    /// Returns the color of the piece on a square, if any.
    #[inline]
    pub fn color_at(&self, square: Square) -> Option<Color> {
        self.occupant(square).map(|id| self.piece(id).color)
    }

    /// Resolves a piece id.
    #[inline]
    pub fn piece(&self, id: PieceId) -> &Piece {
        &self.pieces[id.0]
    }

    /// Returns the piece on a square, if any.
    #[inline]
    pub fn piece_at(&self, square: Square) -> Option<&Piece> {
        self.occupant(square).map(|id| self.piece(id))
    }

    /// Returns the id of a color's king.
    #[inline]
    pub fn king(&self, color: Color) -> PieceId {
        self.kings[color.index()]
    }

    /// Returns the square a color's king stands on.
    #[inline]
    pub fn king_square(&self, color: Color) -> Square {
        self.piece(self.king(color)).square
    }

    /// Iterates over the live pieces of one color.
    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = &Piece> {
        self.pieces.iter().filter(move |p| p.alive && p.color == color)
    }

    /// Iterates over all live pieces.
    pub fn live_pieces(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.iter().filter(|p| p.alive)
    }

    /// Number of arena slots, dead pieces included.
    #[inline]
    pub(crate) fn arena_len(&self) -> usize {
        self.pieces.len()
    }

    /// Moves a piece to an empty destination square, marking it moved.
    /// Captures must be removed before calling this.
    pub(crate) fn move_piece(&mut self, id: PieceId, to: Square) {
        debug_assert!(self.is_empty(to), "destination must be cleared first");
        let from = self.pieces[id.0].square;
        self.squares[from.index() as usize] = None;
        self.squares[to.index() as usize] = Some(id);
        let piece = &mut self.pieces[id.0];
        piece.square = to;
        piece.has_moved = true;
    }

    /// Removes a piece from the board, keeping its arena slot.
    pub(crate) fn remove(&mut self, id: PieceId) {
        let square = self.pieces[id.0].square;
        self.squares[square.index() as usize] = None;
        self.pieces[id.0].alive = false;
    }

    /// Replaces a pawn with a freshly allocated piece of the chosen
    /// kind on the same square, returning the new id.
    pub(crate) fn promote(&mut self, pawn: PieceId, kind: PieceKind) -> PieceId {
        let (square, color) = {
            let p = &self.pieces[pawn.0];
            (p.square, p.color)
        };
        self.pieces[pawn.0].alive = false;
        let id = PieceId(self.pieces.len());
        self.pieces.push(Piece {
            id,
            kind,
            color,
            square,
            has_moved: true,
            alive: true,
        });
        self.squares[square.index() as usize] = Some(id);
        id
    }
}

/// True if a piece of this kind and color sitting on `square` could
/// never have moved.
fn on_home_square(kind: PieceKind, color: Color, square: Square) -> bool {
    let (file, rank) = square.coords();
    match kind {
        PieceKind::Pawn => rank == color.pawn_rank(),
        PieceKind::Rook => rank == color.back_rank() && (file == 0 || file == 7),
        PieceKind::King => rank == color.back_rank() && file == 4,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_setup() {
        let board = Board::standard();
        assert_eq!(board.live_pieces().count(), 32);
        assert_eq!(board.pieces_of(Color::White).count(), 16);
        assert_eq!(board.pieces_of(Color::Black).count(), 16);
        assert_eq!(board.king_square(Color::White), Square::E1);
        assert_eq!(board.king_square(Color::Black), Square::E8);
        assert_eq!(
            board.piece_at(Square::A1).map(|p| (p.kind, p.color)),
            Some((PieceKind::Rook, Color::White))
        );
        assert!(board.is_empty(Square::from_algebraic("e4").unwrap()));
    }

    #[test]
    fn occupancy_and_coordinates_agree() {
        let board = Board::standard();
        for piece in board.live_pieces() {
            assert_eq!(board.occupant(piece.square), Some(piece.id));
        }
    }

    #[test]
    fn layout_rejects_unknown_symbol() {
        let mut layout = [["."; 8]; 8];
        layout[7][4] = "Kw";
        layout[0][4] = "Kb";
        layout[3][3] = "Xw";
        assert!(matches!(
            Board::from_layout(&layout),
            Err(LayoutError::UnknownSymbol { .. })
        ));
    }

    #[test]
    fn layout_rejects_missing_king() {
        let mut layout = [["."; 8]; 8];
        layout[7][4] = "Kw";
        assert_eq!(
            Board::from_layout(&layout).unwrap_err(),
            LayoutError::MissingKing(Color::Black)
        );
    }

    #[test]
    fn layout_rejects_duplicate_king() {
        let mut layout = [["."; 8]; 8];
        layout[7][4] = "Kw";
        layout[7][0] = "Kw";
        layout[0][4] = "Kb";
        assert_eq!(
            Board::from_layout(&layout).unwrap_err(),
            LayoutError::DuplicateKing(Color::White)
        );
    }

    #[test]
    fn layout_marks_displaced_pieces_as_moved() {
        let mut layout = [["."; 8]; 8];
        layout[7][4] = "Kw"; // e1
        layout[0][4] = "Kb"; // e8
        layout[7][0] = "Rw"; // a1, home
        layout[4][0] = "Rb"; // a4, displaced
        layout[3][3] = "Pw"; // d5, displaced
        layout[6][2] = "Pb"; // c2, displaced
        let board = Board::from_layout(&layout).unwrap();

        let white_rook = board.piece_at(Square::A1).unwrap();
        assert!(!white_rook.has_moved);
        let black_rook = board.piece_at(Square::from_algebraic("a4").unwrap()).unwrap();
        assert!(black_rook.has_moved);
        let white_pawn = board.piece_at(Square::from_algebraic("d5").unwrap()).unwrap();
        assert!(white_pawn.has_moved);
        let black_pawn = board.piece_at(Square::from_algebraic("c2").unwrap()).unwrap();
        assert!(black_pawn.has_moved);
    }

    #[test]
    fn remove_and_promote_keep_arena_slots() {
        let mut board = Board::standard();
        let pawn = board.occupant(Square::from_algebraic("e2").unwrap()).unwrap();
        board.remove(pawn);
        assert!(!board.piece(pawn).alive);
        assert!(board.is_empty(Square::from_algebraic("e2").unwrap()));

        let pawn_a2 = board.occupant(Square::from_algebraic("a2").unwrap()).unwrap();
        let queen = board.promote(pawn_a2, PieceKind::Queen);
        assert_ne!(queen, pawn_a2);
        assert!(!board.piece(pawn_a2).alive);
        let promoted = board.piece(queen);
        assert_eq!(promoted.kind, PieceKind::Queen);
        assert_eq!(promoted.square, Square::from_algebraic("a2").unwrap());
        assert!(promoted.has_moved);
    }
}
