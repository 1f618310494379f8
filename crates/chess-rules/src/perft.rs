//! Perft validation of move generation.
//!
//! Perft counts leaf nodes of the legal-move tree at a given depth;
//! the counts for well-known positions are established and any
//! generator defect shows up as a mismatch. Exploration works the way
//! external searchers are expected to: clone the position, apply, and
//! recurse.

use chess_core::{Move, PieceKind};

use crate::legality::Analysis;
use crate::position::Position;

/// Counts the leaf nodes of the legal-move tree at `depth`.
pub fn perft(position: &Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let analysis = Analysis::of(position);
    let moves = moves_of(position, &analysis);
    if depth == 1 {
        return moves.len() as u64;
    }
    let mut nodes = 0u64;
    for mv in moves {
        let mut next = position.clone();
        next.apply(mv);
        nodes += perft(&next, depth - 1);
    }
    nodes
}

/// Perft split by first move, sorted by coordinate notation. Useful
/// for pinning down which subtree disagrees with a reference count.
pub fn perft_divide(position: &Position, depth: u32) -> Vec<(String, u64)> {
    let analysis = Analysis::of(position);
    let mut results = Vec::new();
    for mv in moves_of(position, &analysis) {
        let nodes = if depth > 1 {
            let mut next = position.clone();
            next.apply(mv);
            perft(&next, depth - 1)
        } else {
            1
        };
        results.push((mv.to_string(), nodes));
    }
    results.sort_by(|a, b| a.0.cmp(&b.0));
    results
}

/// Materializes the legal-move map into tagged moves, expanding each
/// promoting destination into all four promotion choices.
fn moves_of(position: &Position, analysis: &Analysis) -> Vec<Move> {
    let us = position.side_to_move();
    let board = position.board();
    let mut moves = Vec::new();
    for (id, dests) in analysis.legal_moves(us) {
        let piece = board.piece(*id);
        for &to in dests {
            if piece.kind == PieceKind::Pawn && to.rank().index() == piece.color.promotion_rank() {
                for promo in PieceKind::PROMOTIONS {
                    moves.push(
                        position
                            .classify(piece.square, to, Some(promo))
                            .expect("resolved moves classify"),
                    );
                }
            } else {
                moves.push(
                    position
                        .classify(piece.square, to, None)
                        .expect("resolved moves classify"),
                );
            }
        }
    }
    moves
}
