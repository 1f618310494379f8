//! Algebraic notation generation.
//!
//! Notation is produced from the position *before* the move is applied;
//! the game tracker appends the `+`/`#` suffix afterwards, once the
//! reply position is analyzed.

use chess_core::{MoveKind, Move, PieceKind, Square, Wing};

use crate::board::{Board, Piece};
use crate::legality::Analysis;
use crate::position::Position;

/// Renders a validated move in standard algebraic notation, without
/// the check/mate suffix.
pub(crate) fn notation(position: &Position, analysis: &Analysis, mv: Move) -> String {
    match mv.kind {
        MoveKind::Castle(Wing::Kingside) => return "O-O".to_string(),
        MoveKind::Castle(Wing::Queenside) => return "O-O-O".to_string(),
        _ => {}
    }

    let board = position.board();
    let piece = board
        .piece_at(mv.from)
        .expect("notation is rendered for validated moves");
    let is_capture = board.occupant(mv.to).is_some() || mv.kind == MoveKind::EnPassant;

    let mut san = String::new();
    if piece.kind == PieceKind::Pawn {
        if is_capture {
            san.push(mv.from.file().to_char());
            san.push('x');
        }
    } else {
        san.push(piece.kind.to_char());
        san.push_str(&disambiguation(board, analysis, piece, mv.to));
        if is_capture {
            san.push('x');
        }
    }
    san.push_str(&mv.to.to_algebraic());
    if let MoveKind::Promotion(kind) = mv.kind {
        san.push('=');
        san.push(kind.to_char());
    }
    san
}

/// Minimal disambiguation against other pieces of the same kind that
/// can legally reach the same square: file if it settles it, else rank,
/// else both.
fn disambiguation(board: &Board, analysis: &Analysis, piece: &Piece, to: Square) -> String {
    if piece.kind == PieceKind::King {
        return String::new();
    }
    let rivals: Vec<Square> = analysis
        .legal_moves(piece.color)
        .iter()
        .filter(|(id, dests)| {
            **id != piece.id && board.piece(**id).kind == piece.kind && dests.contains(&to)
        })
        .map(|(id, _)| board.piece(*id).square)
        .collect();

    if rivals.is_empty() {
        String::new()
    } else if rivals.iter().all(|s| s.file() != piece.square.file()) {
        piece.square.file().to_string()
    } else if rivals.iter().all(|s| s.rank() != piece.square.rank()) {
        piece.square.rank().to_string()
    } else {
        piece.square.to_algebraic()
    }
}
