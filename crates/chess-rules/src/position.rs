//! Position: the complete game state, and the move executor that
//! mutates it.

use std::collections::HashMap;

use chess_core::{Color, Move, MoveKind, PieceKind, Square, Wing};

use crate::board::{Board, LayoutError};
use crate::game::MoveError;
use crate::zobrist::ZOBRIST;

/// Castling rights flags, one bit per color and wing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    const fn bit(color: Color, wing: Wing) -> u8 {
        1 << (color.index() * 2 + wing.index())
    }

    /// True if the given side may still castle on the given wing.
    #[inline]
    pub const fn can_castle(self, color: Color, wing: Wing) -> bool {
        self.0 & Self::bit(color, wing) != 0
    }

    /// Permanently removes one right.
    #[inline]
    pub fn remove(&mut self, color: Color, wing: Wing) {
        self.0 &= !Self::bit(color, wing);
    }

    /// Permanently removes both of a color's rights.
    #[inline]
    pub fn remove_color(&mut self, color: Color) {
        self.0 &= !(Self::bit(color, Wing::Kingside) | Self::bit(color, Wing::Queenside));
    }

    /// Grants one right.
    #[inline]
    fn grant(&mut self, color: Color, wing: Wing) {
        self.0 |= Self::bit(color, wing);
    }

    /// Returns the raw flags (bit 0 = White kingside ... bit 3 = Black
    /// queenside).
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }
}

/// The home square of the rook on a given wing.
pub(crate) const fn rook_home(color: Color, wing: Wing) -> Square {
    match (color, wing) {
        (Color::White, Wing::Kingside) => Square::H1,
        (Color::White, Wing::Queenside) => Square::A1,
        (Color::Black, Wing::Kingside) => Square::H8,
        (Color::Black, Wing::Queenside) => Square::A8,
    }
}

/// Complete chess position state.
///
/// Mutated in place by [`Position::apply`]; there is no undo. Callers
/// exploring continuations (search, what-if UI) must work on a
/// [`Clone`], which is deep and fully independent.
#[derive(Debug, Clone)]
pub struct Position {
    board: Board,
    side_to_move: Color,
    castling: CastlingRights,
    en_passant: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
    /// Occurrence count per canonical position key, this position
    /// included.
    repetitions: HashMap<u64, u32>,
    /// The game record in algebraic notation.
    moves: Vec<String>,
}

impl Position {
    /// Creates the standard starting position.
    pub fn new() -> Self {
        let mut position = Position {
            board: Board::standard(),
            side_to_move: Color::White,
            castling: CastlingRights::ALL,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            repetitions: HashMap::new(),
            moves: Vec::new(),
        };
        position.repetitions.insert(position.key(), 1);
        position
    }

    /// Builds a position from a layout grid (see [`Board::from_layout`]).
    ///
    /// Castling rights are granted exactly where the precondition still
    /// holds: king and rook standing unmoved on their home squares.
    pub fn from_layout(layout: &[[&str; 8]; 8], side_to_move: Color) -> Result<Self, LayoutError> {
        let board = Board::from_layout(layout)?;
        let mut castling = CastlingRights::NONE;
        for color in Color::ALL {
            let king = board.piece(board.king(color));
            if king.has_moved {
                continue;
            }
            for wing in Wing::ALL {
                if let Some(rook) = board.piece_at(rook_home(color, wing)) {
                    if rook.kind == PieceKind::Rook && rook.color == color && !rook.has_moved {
                        castling.grant(color, wing);
                    }
                }
            }
        }
        let mut position = Position {
            board,
            side_to_move,
            castling,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            repetitions: HashMap::new(),
            moves: Vec::new(),
        };
        position.repetitions.insert(position.key(), 1);
        Ok(position)
    }

    /// The board.
    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The side to move.
    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// Current castling rights.
    #[inline]
    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    /// The en-passant target square, live for exactly one ply after a
    /// double push.
    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    /// Plies since the last capture or pawn move.
    #[inline]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    /// Full move number, starting at 1 and incremented after Black
    /// moves.
    #[inline]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// The game record so far, in algebraic notation.
    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    /// The canonical key of the current position: board layout, side to
    /// move, castling rights, and en-passant availability.
    pub fn key(&self) -> u64 {
        let mut key = 0u64;
        for piece in self.board.live_pieces() {
            key ^= ZOBRIST.piece_key(piece.kind, piece.color, piece.square);
        }
        if self.side_to_move == Color::Black {
            key ^= ZOBRIST.black_to_move;
        }
        for color in Color::ALL {
            for wing in Wing::ALL {
                if self.castling.can_castle(color, wing) {
                    key ^= ZOBRIST.castling_key(color.index() * 2 + wing.index());
                }
            }
        }
        if let Some(target) = self.en_passant {
            key ^= ZOBRIST.en_passant_key(target.file().index() as usize);
        }
        key
    }

    /// How many times the current position has occurred, itself
    /// included.
    pub fn repetition_count(&self) -> u32 {
        self.repetitions.get(&self.key()).copied().unwrap_or(0)
    }

    pub(crate) fn record_move(&mut self, san: String) {
        self.moves.push(san);
    }

    /// Classifies a validated (from, to) request into a tagged move.
    ///
    /// Legality is the resolver's business; this only fixes the kind
    /// tag, and enforces that a promoting pawn move carries an explicit,
    /// sensible piece choice.
    pub(crate) fn classify(
        &self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> Result<Move, MoveError> {
        let piece = self
            .board
            .piece_at(from)
            .ok_or(MoveError::NoPieceAtOrigin { square: from })?;
        let kind = if piece.kind == PieceKind::Pawn
            && self.en_passant == Some(to)
            && from.file() != to.file()
        {
            MoveKind::EnPassant
        } else if piece.kind == PieceKind::Pawn && to.rank().index() == piece.color.promotion_rank()
        {
            match promotion {
                None => return Err(MoveError::PromotionRequired),
                Some(PieceKind::Pawn) | Some(PieceKind::King) => {
                    return Err(MoveError::IllegalMove { from, to })
                }
                Some(chosen) => MoveKind::Promotion(chosen),
            }
        } else if piece.kind == PieceKind::King
            && (to.file().index() as i8 - from.file().index() as i8).abs() == 2
        {
            if to.file().index() > from.file().index() {
                MoveKind::Castle(Wing::Kingside)
            } else {
                MoveKind::Castle(Wing::Queenside)
            }
        } else if self.board.occupant(to).is_some() {
            MoveKind::Capture
        } else {
            MoveKind::Normal
        };
        Ok(Move::new(from, to, kind))
    }

    /// Applies a move that has already been validated, mutating the
    /// position in place and updating rights, clocks, the en-passant
    /// target, and the repetition table.
    ///
    /// # Panics
    ///
    /// May panic on a move that was never validated; go through
    /// [`Game::play`](crate::Game::play) unless the move came straight
    /// out of the current legal-move map.
    pub fn apply(&mut self, mv: Move) {
        let us = self.side_to_move;
        let mover = self
            .board
            .occupant(mv.from)
            .expect("validated move has a piece at its origin");
        let kind = self.board.piece(mover).kind;

        // the target lives for exactly one ply, used or not
        self.en_passant = None;

        let mut captured = false;
        match mv.kind {
            MoveKind::Normal | MoveKind::Capture => {
                if let Some(victim) = self.board.occupant(mv.to) {
                    self.board.remove(victim);
                    captured = true;
                }
                self.board.move_piece(mover, mv.to);
            }
            MoveKind::EnPassant => {
                let behind = mv
                    .to
                    .offset(0, -us.pawn_direction())
                    .expect("en-passant target has a square behind it");
                if let Some(victim) = self.board.occupant(behind) {
                    self.board.remove(victim);
                }
                captured = true;
                self.board.move_piece(mover, mv.to);
            }
            MoveKind::Castle(wing) => {
                self.board.move_piece(mover, mv.to);
                let back = us.back_rank();
                let rook_to_file = match wing {
                    Wing::Kingside => 5,
                    Wing::Queenside => 3,
                };
                let rook = self
                    .board
                    .occupant(rook_home(us, wing))
                    .expect("validated castling has a rook at home");
                let rook_to = Square::from_coords(rook_to_file, back)
                    .expect("castling squares are on the board");
                self.board.move_piece(rook, rook_to);
            }
            MoveKind::Promotion(promoted) => {
                if let Some(victim) = self.board.occupant(mv.to) {
                    self.board.remove(victim);
                    captured = true;
                }
                self.board.move_piece(mover, mv.to);
                self.board.promote(mover, promoted);
            }
        }

        // castling rights: king moves forfeit both wings, a rook leaving
        // home forfeits its wing, and anything arriving on a rook home
        // square kills that right (the rook there was just captured, or
        // was long gone)
        if kind == PieceKind::King {
            self.castling.remove_color(us);
        }
        if kind == PieceKind::Rook {
            for wing in Wing::ALL {
                if mv.from == rook_home(us, wing) {
                    self.castling.remove(us, wing);
                }
            }
        }
        for color in Color::ALL {
            for wing in Wing::ALL {
                if mv.to == rook_home(color, wing) {
                    self.castling.remove(color, wing);
                }
            }
        }

        // a double push opens next ply's en-passant window
        if kind == PieceKind::Pawn {
            let delta = mv.to.rank().index() as i8 - mv.from.rank().index() as i8;
            if delta.abs() == 2 {
                self.en_passant = mv.from.offset(0, us.pawn_direction());
            }
        }

        if kind == PieceKind::Pawn || captured {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if us == Color::Black {
            self.fullmove_number += 1;
        }
        self.side_to_move = us.opposite();

        let key = self.key();
        *self.repetitions.entry(key).or_insert(0) += 1;
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}
