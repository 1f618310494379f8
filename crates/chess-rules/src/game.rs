//! Game state tracking.
//!
//! [`Game`] drives one full ply at a time: validate the request against
//! the current analysis, classify it, produce its notation, execute it,
//! re-analyze, and classify the resulting state. It also accepts the
//! two exogenous endings, resignation and draw by agreement.

use chess_core::{Color, PieceKind, Square};
use thiserror::Error;
use tracing::debug;

use crate::board::{LayoutError, PieceId};
use crate::legality::Analysis;
use crate::position::Position;
use crate::san;
use std::collections::BTreeMap;

/// Why a move request was rejected. None of these mutate the position.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    /// A coordinate was outside the 8x8 board.
    #[error("coordinate ({file}, {rank}) is off the board")]
    OutOfBounds { file: u8, rank: u8 },

    /// The origin square is empty.
    #[error("no piece on {square}")]
    NoPieceAtOrigin { square: Square },

    /// The piece on the origin square belongs to the side not on move.
    #[error("{color} is not on move")]
    WrongSideToMove { color: Color },

    /// The destination is not in the piece's resolved legal set; pin
    /// and check violations land here too.
    #[error("illegal move {from}{to}")]
    IllegalMove { from: Square, to: Square },

    /// A pawn reached the far rank without a promotion piece choice.
    #[error("promotion requires a piece choice")]
    PromotionRequired,

    /// The game has ended; no further moves are accepted.
    #[error("game is over")]
    GameOver,
}

/// Terminal classification of a game. All non-`Ongoing` states are
/// final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Ongoing,
    Checkmate { winner: Color },
    Stalemate,
    FiftyMoveDraw,
    ThreefoldDraw,
    Resignation { winner: Color },
    DrawAgreed,
}

impl GameState {
    /// True for every state except `Ongoing`.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, GameState::Ongoing)
    }

    /// The winning side, for decisive results.
    #[inline]
    pub const fn winner(self) -> Option<Color> {
        match self {
            GameState::Checkmate { winner } | GameState::Resignation { winner } => Some(winner),
            _ => None,
        }
    }
}

/// A complete game: the authoritative position, its current analysis,
/// and the terminal classification.
///
/// Cloning a game yields a fully independent copy; search over a clone
/// never touches the original.
#[derive(Debug, Clone)]
pub struct Game {
    position: Position,
    analysis: Analysis,
    state: GameState,
}

impl Game {
    /// Starts a game from the standard position.
    pub fn new() -> Self {
        Self::from_position(Position::new())
    }

    /// Starts a game from an arbitrary position. Terminal conditions
    /// already present (a mate or stalemate layout) are classified
    /// immediately.
    pub fn from_position(position: Position) -> Self {
        let analysis = Analysis::of(&position);
        let mut game = Game {
            position,
            analysis,
            state: GameState::Ongoing,
        };
        game.refresh_state();
        game
    }

    /// Starts a game from a layout grid (see
    /// [`Board::from_layout`](crate::Board::from_layout)).
    pub fn from_layout(layout: &[[&str; 8]; 8], side_to_move: Color) -> Result<Self, LayoutError> {
        Ok(Self::from_position(Position::from_layout(layout, side_to_move)?))
    }

    /// The current position.
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// The current per-ply analysis.
    pub fn analysis(&self) -> &Analysis {
        &self.analysis
    }

    /// The game's terminal classification, `Ongoing` while play
    /// continues.
    pub fn state(&self) -> GameState {
        self.state
    }

    /// True once the game has ended.
    pub fn is_over(&self) -> bool {
        self.state.is_terminal()
    }

    /// True if the given side's king is currently in check.
    pub fn is_check(&self, color: Color) -> bool {
        self.analysis.is_check(color)
    }

    /// The legal moves of one side, keyed by piece. Useful for
    /// highlighting and for move selection by a search.
    pub fn legal_moves(&self, color: Color) -> &BTreeMap<PieceId, Vec<Square>> {
        self.analysis.legal_moves(color)
    }

    /// The move record so far, in algebraic notation.
    pub fn moves(&self) -> &[String] {
        self.position.moves()
    }

    /// Number of plies played.
    pub fn ply_count(&self) -> usize {
        self.position.moves().len()
    }

    /// Plays one move given as raw (file, rank) coordinate pairs,
    /// returning the notation recorded for it.
    ///
    /// `promotion` is consulted only when a pawn reaches the far rank,
    /// and is then required.
    pub fn play(
        &mut self,
        from: (u8, u8),
        to: (u8, u8),
        promotion: Option<PieceKind>,
    ) -> Result<String, MoveError> {
        let from = Square::from_coords(from.0, from.1).ok_or(MoveError::OutOfBounds {
            file: from.0,
            rank: from.1,
        })?;
        let to = Square::from_coords(to.0, to.1).ok_or(MoveError::OutOfBounds {
            file: to.0,
            rank: to.1,
        })?;
        self.play_squares(from, to, promotion)
    }

    /// Plays one move given as squares. See [`Game::play`].
    pub fn play_squares(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> Result<String, MoveError> {
        if self.state.is_terminal() {
            return Err(MoveError::GameOver);
        }
        let (piece, color) = {
            let piece = self
                .position
                .board()
                .piece_at(from)
                .ok_or(MoveError::NoPieceAtOrigin { square: from })?;
            (piece.id, piece.color)
        };
        if color != self.position.side_to_move() {
            return Err(MoveError::WrongSideToMove { color });
        }
        if !self.analysis.is_legal(color, piece, to) {
            return Err(MoveError::IllegalMove { from, to });
        }
        let mv = self.position.classify(from, to, promotion)?;

        let mut san = san::notation(&self.position, &self.analysis, mv);
        self.position.apply(mv);
        self.analysis = Analysis::of(&self.position);

        let defender = color.opposite();
        if self.analysis.is_check(defender) {
            san.push(if self.analysis.has_moves(defender) { '+' } else { '#' });
        }
        debug!(mv = %mv, san = %san, "applied move");
        self.position.record_move(san.clone());
        self.refresh_state();
        Ok(san)
    }

    /// Resigns on behalf of `color`; the opponent wins.
    pub fn resign(&mut self, color: Color) -> Result<(), MoveError> {
        if self.state.is_terminal() {
            return Err(MoveError::GameOver);
        }
        self.state = GameState::Resignation {
            winner: color.opposite(),
        };
        debug!(state = ?self.state, "game over");
        Ok(())
    }

    /// Ends the game as a draw by agreement.
    pub fn agree_draw(&mut self) -> Result<(), MoveError> {
        if self.state.is_terminal() {
            return Err(MoveError::GameOver);
        }
        self.state = GameState::DrawAgreed;
        debug!(state = ?self.state, "game over");
        Ok(())
    }

    /// Classifies the current position. Mate and stalemate outrank the
    /// counter-based draws; a mating move on the hundredth halfmove is
    /// a mate.
    fn refresh_state(&mut self) {
        let side = self.position.side_to_move();
        let next = if !self.analysis.has_moves(side) {
            if self.analysis.is_check(side) {
                GameState::Checkmate {
                    winner: side.opposite(),
                }
            } else {
                GameState::Stalemate
            }
        } else if self.position.halfmove_clock() >= 100 {
            GameState::FiftyMoveDraw
        } else if self.position.repetition_count() >= 3 {
            GameState::ThreefoldDraw
        } else {
            GameState::Ongoing
        };
        if next.is_terminal() {
            debug!(state = ?next, "game over");
        }
        self.state = next;
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}
