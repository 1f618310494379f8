//! Attack-map based chess rules engine.
//!
//! This crate determines move legality, executes moves, and tracks
//! game-ending conditions for two-player chess:
//! - [`Board`] - square occupancy and the piece arena
//! - [`AttackMap`] - per-piece attack sets, direct and x-ray, rebuilt
//!   from scratch every ply
//! - [`Analysis`] - check, pin, and king-safety resolution into the
//!   authoritative legal-move surface
//! - [`Position`] - complete game state, mutated in place by the move
//!   executor
//! - [`Game`] - full-ply orchestration, notation, and terminal states
//!
//! # Architecture
//!
//! Data flows one direction per ply: the board feeds attack
//! generation, attacks feed legality resolution, the caller picks a
//! move, the executor mutates the position, and the tracker
//! reclassifies the result. The full recomputation each ply trades
//! throughput for simplicity; consumers that need speculative search
//! clone the position and explore the clone.
//!
//! # Example
//!
//! ```
//! use chess_rules::{Game, GameState};
//!
//! let mut game = Game::new();
//! game.play((4, 1), (4, 3), None).unwrap(); // e4
//! game.play((4, 6), (4, 4), None).unwrap(); // e5
//! assert_eq!(game.moves(), ["e4", "e5"]);
//! assert_eq!(game.state(), GameState::Ongoing);
//! ```

mod attacks;
mod board;
mod game;
mod legality;
pub mod perft;
mod position;
mod san;
mod zobrist;

pub use attacks::{AttackLine, AttackMap, SquareAttacks};
pub use board::{Board, LayoutError, Piece, PieceId};
pub use game::{Game, GameState, MoveError};
pub use legality::Analysis;
pub use position::{CastlingRights, Position};
