//! Core types for chess.
//!
//! This crate provides the fundamental types shared by the rules engine
//! and its consumers:
//! - [`PieceKind`] and [`Color`] for piece identity
//! - [`Square`], [`File`], and [`Rank`] for board coordinates
//! - [`Move`], [`MoveKind`], and [`Wing`] for move representation
//!
//! No board or rules logic lives here; see the `chess-rules` crate.

mod color;
mod mov;
mod piece;
mod square;

pub use color::Color;
pub use mov::{Move, MoveKind, Wing};
pub use piece::PieceKind;
pub use square::{File, Rank, Square};
