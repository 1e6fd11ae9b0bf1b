use chess_core::{Move, Zobrist};
use dashmap::DashMap;
use std::mem::size_of;
use std::sync::atomic::{AtomicUsize, Ordering};

/// How a stored score relates to the node's true minimax value (spec §4.4).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum NodeType {
    Exact,
    LowerBound,
    UpperBound,
}

#[derive(Debug, Clone, Copy)]
pub struct Transposition {
    pub depth: u8,
    pub score: i32,
    pub best: Option<Move>,
    pub node_type: NodeType,
}

const ENTRY_SIZE: usize = size_of::<Zobrist>() + size_of::<Transposition>();

/// A transposition table shared by every Lazy-SMP worker of one search.
///
/// Replacement is always-replace: a probe that finds a shallower or equal
/// entry simply overwrites it. Capacity is bounded by a megabyte budget;
/// once exceeded, an arbitrary entry is evicted rather than attempting an
/// optimal replacement policy (spec §4.4 calls this out explicitly as
/// "simple, non-optimal").
pub struct TranspositionTable {
    entries: DashMap<Zobrist, Transposition>,
    capacity: usize,
    len: AtomicUsize,
}

impl TranspositionTable {
    pub fn with_megabyte_budget(megabytes: usize) -> Self {
        let capacity = (megabytes * 1_048_576 / ENTRY_SIZE).max(1);
        Self {
            entries: DashMap::new(),
            capacity,
            len: AtomicUsize::new(0),
        }
    }

    pub fn get(&self, key: Zobrist) -> Option<Transposition> {
        self.entries.get(&key).map(|e| *e)
    }

    pub fn insert(&self, key: Zobrist, value: Transposition) {
        let is_new = !self.entries.contains_key(&key);

        if is_new && self.len.load(Ordering::Relaxed) >= self.capacity {
            if let Some(evict) = self.entries.iter().next().map(|e| *e.key()) {
                self.entries.remove(&evict);
                self.len.fetch_sub(1, Ordering::Relaxed);
            }
        }

        if self.entries.insert(key, value).is_none() {
            self.len.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn clear(&self) {
        self.entries.clear();
        self.len.store(0, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(depth: u8, score: i32) -> Transposition {
        Transposition {
            depth,
            score,
            best: None,
            node_type: NodeType::Exact,
        }
    }

    #[test]
    fn insert_then_get_round_trips() {
        let tt = TranspositionTable::with_megabyte_budget(1);
        tt.insert(42, sample(3, 100));
        assert_eq!(tt.get(42).unwrap().score, 100);
    }

    #[test]
    fn clear_empties_the_table() {
        let tt = TranspositionTable::with_megabyte_budget(1);
        tt.insert(1, sample(1, 1));
        tt.clear();
        assert!(tt.is_empty());
        assert!(tt.get(1).is_none());
    }

    #[test]
    fn always_replace_overwrites_without_growing_len() {
        let tt = TranspositionTable::with_megabyte_budget(1);
        tt.insert(7, sample(1, 1));
        tt.insert(7, sample(5, 999));
        assert_eq!(tt.len(), 1);
        assert_eq!(tt.get(7).unwrap().depth, 5);
    }

    #[test]
    fn inserting_past_capacity_evicts_something() {
        // A budget of zero megabytes rounds up to a capacity of exactly 1.
        let tt = TranspositionTable::with_megabyte_budget(0);
        tt.insert(1, sample(1, 1));
        tt.insert(2, sample(1, 2));
        assert_eq!(tt.len(), 1);
    }
}
