//! Crawl frontier
//!
//! The frontier holds the work the engine knows about but has not processed
//! yet: pending player names and pending match ids, each paired with a set
//! of items already handled in this pass. The sets only suppress redundant
//! work within one process; the store's existence check is what prevents
//! duplicates across runs.

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

/// A double-ended work queue that never holds the same item twice
///
/// Items are taken from the front. `push_front` gives an item priority over
/// everything already queued, `push_back` puts it behind.
#[derive(Debug, Clone)]
pub struct WorkQueue<T> {
    items: VecDeque<T>,
    members: HashSet<T>,
}

impl<T: Clone + Eq + Hash> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
            members: HashSet::new(),
        }
    }

    /// Queues an item ahead of everything else
    ///
    /// An item that is already queued is moved to the front.
    pub fn push_front(&mut self, item: T) {
        if self.members.contains(&item) {
            self.items.retain(|queued| queued != &item);
        } else {
            self.members.insert(item.clone());
        }
        self.items.push_front(item);
    }

    /// Queues an item behind everything else
    ///
    /// Returns false if the item was already queued; its position is kept.
    pub fn push_back(&mut self, item: T) -> bool {
        if !self.members.insert(item.clone()) {
            return false;
        }
        self.items.push_back(item);
        true
    }

    /// Removes and returns the next item to process
    pub fn pop_front(&mut self) -> Option<T> {
        let item = self.items.pop_front()?;
        self.members.remove(&item);
        Some(item)
    }

    pub fn contains(&self, item: &T) -> bool {
        self.members.contains(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.members.clear();
    }

    /// Iterates items in processing order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<T: Clone + Eq + Hash> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Pending and done sets for players and matches
#[derive(Debug, Clone, Default)]
pub struct Frontier {
    pending_players: WorkQueue<String>,
    pending_matches: WorkQueue<String>,
    done_players: HashSet<String>,
    done_matches: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Players =====

    /// Queues players behind the current work, skipping ones already done
    ///
    /// Returns the number of names actually queued.
    pub fn seed_players<I>(&mut self, names: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let mut queued = 0;
        for name in names {
            if !self.done_players.contains(&name) && self.pending_players.push_back(name) {
                queued += 1;
            }
        }
        queued
    }

    /// Queues newly discovered players ahead of all earlier work
    ///
    /// Names already done in this pass are ignored. The discovered names
    /// keep their relative order at the front of the queue. Returns the
    /// names that were queued.
    pub fn discover_players<I>(&mut self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut seen = HashSet::new();
        let fresh: Vec<String> = names
            .into_iter()
            .filter(|name| !self.done_players.contains(name) && seen.insert(name.clone()))
            .collect();

        for name in fresh.iter().rev() {
            self.pending_players.push_front(name.clone());
        }

        fresh
    }

    /// Removes and returns the next player to crawl
    pub fn pop_player(&mut self) -> Option<String> {
        self.pending_players.pop_front()
    }

    pub fn mark_player_done(&mut self, name: &str) {
        self.done_players.insert(name.to_string());
    }

    pub fn is_player_done(&self, name: &str) -> bool {
        self.done_players.contains(name)
    }

    pub fn pending_players(&self) -> &WorkQueue<String> {
        &self.pending_players
    }

    // ===== Matches =====

    /// Queues match ids not handled yet in this pass
    ///
    /// Returns the number of ids actually queued.
    pub fn enqueue_matches<I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let mut queued = 0;
        for id in ids {
            if !self.done_matches.contains(&id) && self.pending_matches.push_back(id) {
                queued += 1;
            }
        }
        queued
    }

    /// Removes and returns the next match to crawl
    pub fn pop_match(&mut self) -> Option<String> {
        self.pending_matches.pop_front()
    }

    pub fn mark_match_done(&mut self, id: &str) {
        self.done_matches.insert(id.to_string());
    }

    pub fn is_match_done(&self, id: &str) -> bool {
        self.done_matches.contains(id)
    }

    pub fn pending_matches(&self) -> &WorkQueue<String> {
        &self.pending_matches
    }

    // ===== Pass Management =====

    /// Clears all pending work and done sets
    pub fn flush(&mut self) {
        self.pending_players.clear();
        self.pending_matches.clear();
        self.done_players.clear();
        self.done_matches.clear();
    }

    /// Returns true if nothing is pending
    pub fn is_empty(&self) -> bool {
        self.pending_players.is_empty() && self.pending_matches.is_empty()
    }
}
