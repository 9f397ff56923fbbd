//! Transposition table for caching search results.
//!
//! One entry per slot, indexed by `hash % capacity`. A slot whose generation
//! is 0 is empty; live entries always carry a non-zero generation. The table
//! belongs to a single search and is not shared between threads.

use crate::Score;
use reversi_board::Location;
use std::mem;

/// How a stored score relates to the true minimax value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Bound {
    /// The score is exact.
    Exact,
    /// The search failed high: the true value is at least the score.
    Lower,
    /// No move raised alpha: the true value is at most the score.
    Upper,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entry {
    pub key: u64,
    pub depth: u8,
    pub score: Score,
    pub bound: Bound,
    pub best_move: Option<Location>,
    pub generation: u16,
}

impl Entry {
    const EMPTY: Entry = Entry {
        key: 0,
        depth: 0,
        score: 0,
        bound: Bound::Exact,
        best_move: None,
        generation: 0,
    };

    #[inline]
    fn is_empty(&self) -> bool {
        self.generation == 0
    }
}

/// What a probe found for the searched position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Probe {
    /// A score the caller may return directly, if the entry was deep enough and its bound fits the window.
    pub score: Option<Score>,
    /// The stored best move, for ordering. Present even when the score is unusable.
    pub best_move: Option<Location>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TableStats {
    pub hits: u64,
    pub misses: u64,
    pub collisions: u64,
    pub stores: u64,
}

pub struct TranspositionTable {
    entries: Vec<Entry>,
    generation: u16,
    stats: TableStats,
}

/// Replace a different position only if the new search is this much deeper.
const REPLACE_DEPTH_MARGIN: u8 = 2;

/// Slots examined by [`TranspositionTable::occupancy`].
const OCCUPANCY_SAMPLE: usize = 1000;

impl TranspositionTable {
    /// Create a table holding `capacity` entries (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: vec![Entry::EMPTY; capacity.max(1)],
            generation: 1,
            stats: TableStats::default(),
        }
    }

    /// Create a table using about `size_mb` megabytes.
    pub fn with_size_mb(size_mb: usize) -> Self {
        Self::with_capacity(size_mb * 1024 * 1024 / mem::size_of::<Entry>())
    }

    #[inline]
    fn index(&self, hash: u64) -> usize {
        (hash % self.entries.len() as u64) as usize
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn generation(&self) -> u16 {
        self.generation
    }

    pub fn stats(&self) -> TableStats {
        self.stats
    }

    /// Start a new search: entries from earlier searches become stale.
    pub fn new_search(&mut self) {
        self.generation = match self.generation.wrapping_add(1) {
            0 => 1,
            generation => generation,
        };
    }

    /// Empty every slot and reset the statistics.
    pub fn clear(&mut self) {
        self.entries.fill(Entry::EMPTY);
        self.generation = 1;
        self.stats = TableStats::default();
    }

    /// Look up `hash` for a search of `depth` with window (`alpha`, `beta`).
    pub fn probe(&mut self, hash: u64, depth: u8, alpha: Score, beta: Score) -> Probe {
        let entry = self.entries[self.index(hash)];
        if entry.is_empty() || entry.key != hash {
            self.stats.misses += 1;
            return Probe::default();
        }

        self.stats.hits += 1;
        let usable = entry.depth >= depth
            && match entry.bound {
                Bound::Exact => true,
                Bound::Lower => entry.score >= beta,
                Bound::Upper => entry.score <= alpha,
            };

        Probe {
            score: usable.then_some(entry.score),
            best_move: entry.best_move,
        }
    }

    /// The stored best move for `hash`, without any score validation.
    pub fn best_move(&self, hash: u64) -> Option<Location> {
        let entry = &self.entries[self.index(hash)];
        if entry.is_empty() || entry.key != hash {
            None
        } else {
            entry.best_move
        }
    }

    /// Record a search result. Returns whether the slot was written.
    pub fn store(
        &mut self,
        hash: u64,
        depth: u8,
        score: Score,
        bound: Bound,
        best_move: Option<Location>,
    ) -> bool {
        let index = self.index(hash);
        let slot = &self.entries[index];

        let replace = if slot.is_empty() {
            true
        } else if slot.key == hash {
            depth >= slot.depth
        } else {
            self.stats.collisions += 1;
            slot.generation != self.generation
                || depth > slot.depth.saturating_add(REPLACE_DEPTH_MARGIN)
        };

        if replace {
            self.entries[index] = Entry {
                key: hash,
                depth,
                score,
                bound,
                best_move,
                generation: self.generation,
            };
            self.stats.stores += 1;
        }
        replace
    }

    /// Fraction of occupied slots, estimated over an evenly spaced sample.
    pub fn occupancy(&self) -> f64 {
        let step = (self.entries.len() / OCCUPANCY_SAMPLE).max(1);
        let (sampled, filled) = self
            .entries
            .iter()
            .step_by(step)
            .take(OCCUPANCY_SAMPLE)
            .fold((0usize, 0usize), |(sampled, filled), entry| {
                (sampled + 1, filled + usize::from(!entry.is_empty()))
            });

        filled as f64 / sampled as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(name: &str) -> Location {
        name.parse().unwrap()
    }

    #[test]
    fn store_then_probe() {
        let mut tt = TranspositionTable::with_capacity(101);
        assert!(tt.store(12345, 6, 42, Bound::Exact, Some(loc("C4"))));

        let probe = tt.probe(12345, 6, -100, 100);
        assert_eq!(probe.score, Some(42));
        assert_eq!(probe.best_move, Some(loc("C4")));
        assert_eq!(tt.best_move(12345), Some(loc("C4")));
        assert_eq!(tt.stats().hits, 1);
    }

    #[test]
    fn shallow_entries_only_give_a_move() {
        let mut tt = TranspositionTable::with_capacity(101);
        tt.store(7, 3, 42, Bound::Exact, Some(loc("D3")));

        let probe = tt.probe(7, 4, -100, 100);
        assert_eq!(probe.score, None);
        assert_eq!(probe.best_move, Some(loc("D3")));
    }

    #[test]
    fn bounds_respect_the_window() {
        let mut tt = TranspositionTable::with_capacity(101);
        tt.store(1, 5, 50, Bound::Lower, None);
        assert_eq!(tt.probe(1, 5, 0, 40).score, Some(50));
        assert_eq!(tt.probe(1, 5, 0, 60).score, None);

        tt.store(2, 5, -50, Bound::Upper, None);
        assert_eq!(tt.probe(2, 5, -40, 0).score, Some(-50));
        assert_eq!(tt.probe(2, 5, -60, 0).score, None);
    }

    #[test]
    fn wrong_key_is_a_miss() {
        let mut tt = TranspositionTable::with_capacity(10);
        tt.store(3, 5, 10, Bound::Exact, Some(loc("F5")));

        // 13 % 10 == 3 % 10: same slot, different position.
        assert_eq!(tt.probe(13, 1, -100, 100), Probe::default());
        assert_eq!(tt.best_move(13), None);
        assert_eq!(tt.stats().misses, 1);
    }

    #[test]
    fn same_key_keeps_the_deeper_result() {
        let mut tt = TranspositionTable::with_capacity(10);
        tt.store(3, 6, 10, Bound::Exact, None);
        assert!(!tt.store(3, 5, 20, Bound::Exact, None));
        assert!(tt.store(3, 6, 30, Bound::Exact, None));
        assert_eq!(tt.probe(3, 6, -100, 100).score, Some(30));
    }

    #[test]
    fn collisions_replace_stale_or_much_deeper() {
        let mut tt = TranspositionTable::with_capacity(10);
        tt.store(3, 6, 10, Bound::Exact, None);

        // Same generation: needs more than two extra plies.
        assert!(!tt.store(13, 8, 20, Bound::Exact, None));
        assert!(tt.store(13, 9, 20, Bound::Exact, None));
        assert_eq!(tt.stats().collisions, 2);

        // A later search may overwrite anything from an earlier one.
        tt.new_search();
        assert!(tt.store(23, 1, 30, Bound::Exact, None));
        assert_eq!(tt.probe(23, 1, -100, 100).score, Some(30));
    }

    #[test]
    fn generation_skips_zero() {
        let mut tt = TranspositionTable::with_capacity(4);
        assert_eq!(tt.generation(), 1);
        for _ in 0..u16::MAX {
            tt.new_search();
        }
        assert_eq!(tt.generation(), 1);
        tt.new_search();
        assert_eq!(tt.generation(), 2);
    }

    #[test]
    fn old_entries_stay_stale_across_many_searches() {
        let mut tt = TranspositionTable::with_capacity(10);
        tt.store(3, 20, 10, Bound::Exact, None);
        for _ in 0..255 {
            tt.new_search();
        }

        // A shallow store may still evict the entry from 255 searches ago.
        assert!(tt.store(13, 1, 20, Bound::Exact, None));
        assert_eq!(tt.probe(13, 1, -100, 100).score, Some(20));
    }

    #[test]
    fn occupancy_and_clear() {
        let mut tt = TranspositionTable::with_capacity(100);
        assert_eq!(tt.occupancy(), 0.0);
        for hash in 0..50 {
            tt.store(hash, 1, 0, Bound::Exact, None);
        }
        assert!((tt.occupancy() - 0.5).abs() < 1e-9);

        tt.clear();
        assert_eq!(tt.occupancy(), 0.0);
        assert_eq!(tt.stats(), TableStats::default());
    }

    #[test]
    fn sized_in_megabytes() {
        let tt = TranspositionTable::with_size_mb(1);
        assert_eq!(tt.capacity(), 1024 * 1024 / mem::size_of::<Entry>());
    }
}
