//! Property-based tests for the circular journal
//!
//! Uses proptest to check count, ordering and round-trip invariants over
//! random command sequences and capacities.

use proptest::prelude::*;
use std::sync::Arc;
use tapedeck_core::Command;
use tapedeck_journal::{CircularJournal, FixedClock, MemoryStore, RingState};

fn arbitrary_command() -> impl Strategy<Value = Command> {
    (0u8..6).prop_map(|code| Command::from_code(code).unwrap())
}

fn open(store: &Arc<MemoryStore>, capacity: usize) -> CircularJournal {
    CircularJournal::open(store.clone(), capacity, Arc::new(FixedClock::at(1_700_000_000))).unwrap()
}

proptest! {
    /// Property: count is min(N, C) and the snapshot is the last C appends in order
    #[test]
    fn snapshot_is_newest_appends_in_order(
        capacity in 1usize..32,
        commands in prop::collection::vec((arbitrary_command(), 0u16..100), 0..80)
    ) {
        let store = Arc::new(MemoryStore::new());
        let journal = open(&store, capacity);

        for (event, song) in &commands {
            journal.append(*event, *song).unwrap();
        }

        prop_assert_eq!(journal.len(), commands.len().min(capacity));

        let expected: Vec<(Command, u16)> = commands
            .iter()
            .skip(commands.len().saturating_sub(capacity))
            .copied()
            .collect();
        let actual: Vec<(Command, u16)> = journal
            .snapshot()
            .iter()
            .map(|e| (e.event, e.song_id))
            .collect();
        prop_assert_eq!(actual, expected);
    }

    /// Property: reloading from the store reproduces the ring exactly
    #[test]
    fn reload_reproduces_ring(
        capacity in 1usize..16,
        commands in prop::collection::vec((arbitrary_command(), 0u16..100), 0..40),
        pops in 0usize..8
    ) {
        let store = Arc::new(MemoryStore::new());
        let before: RingState = {
            let journal = open(&store, capacity);
            for (event, song) in &commands {
                journal.append(*event, *song).unwrap();
            }
            for _ in 0..pops {
                journal.read_oldest().unwrap();
            }
            journal.ring_state()
        };

        let reloaded = open(&store, capacity);
        let after = reloaded.ring_state();
        prop_assert_eq!(after.to_blob().unwrap(), before.to_blob().unwrap());
        prop_assert_eq!(after, before);
    }

    /// Property: reading the oldest entry until empty yields the snapshot
    #[test]
    fn read_oldest_drains_snapshot(
        capacity in 1usize..16,
        songs in prop::collection::vec(0u16..1000, 0..40)
    ) {
        let store = Arc::new(MemoryStore::new());
        let journal = open(&store, capacity);
        for song in &songs {
            journal.append(Command::Next, *song).unwrap();
        }

        let snapshot = journal.snapshot();
        let mut popped = Vec::new();
        while let Some(entry) = journal.read_oldest().unwrap() {
            popped.push(entry);
        }

        prop_assert_eq!(popped, snapshot);
        prop_assert!(journal.is_empty());
    }
}
