//! Zobrist keys for the canonical position key.
//!
//! A position's key XORs one random number per piece-on-square, plus
//! values for the side to move, each castling right, and the en-passant
//! file. Two positions with the same layout, mover, rights, and
//! en-passant availability hash identically, which is exactly the
//! repetition-detection notion of "the same position".

use chess_core::{Color, PieceKind, Square};

/// Zobrist key tables, generated at compile time from a fixed seed.
pub struct ZobristKeys {
    /// Keys for pieces: [kind][color][square].
    pieces: [[[u64; 64]; 2]; 6],
    /// Key XORed in when Black is to move.
    pub black_to_move: u64,
    /// Keys for the four castling rights.
    castling: [u64; 4],
    /// Keys for the en-passant target file.
    en_passant: [u64; 8],
}

impl ZobristKeys {
    const fn new() -> Self {
        // xorshift64; const-evaluable and reproducible
        const fn next_random(state: u64) -> (u64, u64) {
            let mut x = state;
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            (x, x)
        }

        let mut state = 0x9E37_79B9_7F4A_7C15u64;
        let mut pieces = [[[0u64; 64]; 2]; 6];
        let mut castling = [0u64; 4];
        let mut en_passant = [0u64; 8];

        let mut kind = 0;
        while kind < 6 {
            let mut color = 0;
            while color < 2 {
                let mut square = 0;
                while square < 64 {
                    let (new_state, value) = next_random(state);
                    state = new_state;
                    pieces[kind][color][square] = value;
                    square += 1;
                }
                color += 1;
            }
            kind += 1;
        }

        let (new_state, black_to_move) = next_random(state);
        state = new_state;

        let mut i = 0;
        while i < 4 {
            let (new_state, value) = next_random(state);
            state = new_state;
            castling[i] = value;
            i += 1;
        }

        let mut i = 0;
        while i < 8 {
            let (new_state, value) = next_random(state);
            state = new_state;
            en_passant[i] = value;
            i += 1;
        }

        ZobristKeys {
            pieces,
            black_to_move,
            castling,
            en_passant,
        }
    }

    /// Returns the key for a piece on a square.
    #[inline]
    pub fn piece_key(&self, kind: PieceKind, color: Color, square: Square) -> u64 {
        self.pieces[kind.index()][color.index()][square.index() as usize]
    }

    /// Returns the key for a castling right (0-3).
    #[inline]
    pub fn castling_key(&self, right: usize) -> u64 {
        self.castling[right]
    }

    /// Returns the key for an en-passant file (0-7).
    #[inline]
    pub fn en_passant_key(&self, file: usize) -> u64 {
        self.en_passant[file]
    }
}

/// Global key tables, initialized at compile time.
pub static ZOBRIST: ZobristKeys = ZobristKeys::new();
