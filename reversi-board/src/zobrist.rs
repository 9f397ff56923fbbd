//! Zobrist keys for position hashing.
//!
//! One random key per (colour, square) plus one side-to-move key, generated
//! once per process from a fixed seed and never mutated afterwards. The side
//! key is folded in when Black is to move.

use crate::bitboard::Bitboard;
use crate::game::Player;
use crate::location::Location;
use crate::NUM_SPACES;
use once_cell::sync::Lazy;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Seed for the process-wide key set.
pub const SEED: u64 = 0x0123_4567_89AB_CDEF;

static KEYS: Lazy<ZobristKeys> = Lazy::new(|| ZobristKeys::generate(SEED));

/// The process-wide key set.
#[inline]
pub fn keys() -> &'static ZobristKeys {
    &KEYS
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZobristKeys {
    pieces: [[u64; NUM_SPACES]; 2],
    side: u64,
}

impl ZobristKeys {
    /// Generate a key set from `seed`. The same seed always yields the same keys.
    pub fn generate(seed: u64) -> Self {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let mut pieces = [[0u64; NUM_SPACES]; 2];

        for colour in pieces.iter_mut() {
            for key in colour.iter_mut() {
                *key = rng.gen();
            }
        }

        Self {
            pieces,
            side: rng.gen(),
        }
    }

    /// Key for a disc of `player` at `loc`.
    #[inline]
    pub fn piece(&self, player: Player, loc: Location) -> u64 {
        self.pieces[player.index()][loc.to_index() as usize]
    }

    /// Key toggled when the side to move changes.
    #[inline]
    pub fn side(&self) -> u64 {
        self.side
    }

    /// Hash a position from scratch.
    pub fn hash(&self, black: Bitboard, white: Bitboard, side_to_move: Player) -> u64 {
        let mut hash = self.hash_discs(Player::Black, black) ^ self.hash_discs(Player::White, white);
        if side_to_move == Player::Black {
            hash ^= self.side;
        }
        hash
    }

    /// Update `hash` after `player` places a disc at `loc`, flipping `flips`.
    /// The side to move is toggled as part of the update.
    #[inline]
    pub fn update(&self, hash: u64, player: Player, loc: Location, flips: Bitboard) -> u64 {
        let flipped = self.hash_discs(player, flips) ^ self.hash_discs(!player, flips);
        hash ^ self.piece(player, loc) ^ flipped ^ self.side
    }

    /// Update `hash` for a pass: only the side to move changes.
    #[inline]
    pub fn toggle_side(&self, hash: u64) -> u64 {
        hash ^ self.side
    }

    #[inline]
    fn hash_discs(&self, player: Player, discs: Bitboard) -> u64 {
        discs
            .locations()
            .fold(0, |hash, loc| hash ^ self.piece(player, loc))
    }
}
