//! Wait-for graph used to detect deadlocks.
//!
//! With exclusive locks only, a waiting transaction waits on exactly one
//! holder, so the graph is a partial function `waiter -> holder` and a cycle
//! through a transaction is found by following edges from it.

use std::collections::{HashMap, HashSet};

use super::TxnId;

/// Directed graph of which transaction waits on which.
#[derive(Debug, Clone, Default)]
pub struct WaitForGraph {
    edges: HashMap<TxnId, TxnId>,
}

impl WaitForGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `waiter` is blocked on a lock held by `holder`.
    ///
    /// Replaces any earlier edge out of `waiter`.
    pub fn add_wait(&mut self, waiter: TxnId, holder: TxnId) {
        self.edges.insert(waiter, holder);
    }

    /// Remove the edge out of `waiter`, returning the holder it pointed to.
    pub fn remove_waiter(&mut self, waiter: TxnId) -> Option<TxnId> {
        self.edges.remove(&waiter)
    }

    /// Remove every edge pointing at `holder`. Returns how many were removed.
    pub fn remove_holder(&mut self, holder: TxnId) -> usize {
        let before = self.edges.len();
        self.edges.retain(|_, h| *h != holder);
        before - self.edges.len()
    }

    /// The transaction `waiter` is blocked on, if any.
    #[must_use]
    pub fn waiting_on(&self, waiter: TxnId) -> Option<TxnId> {
        self.edges.get(&waiter).copied()
    }

    /// Find the cycle passing through `start`.
    ///
    /// Returns the members in wait order beginning with `start`, or `None` if
    /// following edges from `start` ends or loops without returning to it.
    #[must_use]
    pub fn find_cycle(&self, start: TxnId) -> Option<Vec<TxnId>> {
        let mut path = vec![start];
        let mut seen = HashSet::from([start]);
        let mut current = start;

        while let Some(&next) = self.edges.get(&current) {
            if next == start {
                return Some(path);
            }
            if !seen.insert(next) {
                return None;
            }
            path.push(next);
            current = next;
        }

        None
    }

    /// The transactions that currently have an outgoing edge.
    pub fn waiters(&self) -> impl Iterator<Item = TxnId> + '_ {
        self.edges.keys().copied()
    }

    /// Number of waiting transactions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Check if no transaction is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn t(id: u64) -> TxnId {
        TxnId::new(id)
    }

    #[test]
    fn test_two_party_cycle() {
        let mut graph = WaitForGraph::new();
        graph.add_wait(t(2), t(1));
        assert_eq!(graph.find_cycle(t(2)), None);

        graph.add_wait(t(1), t(2));
        assert_eq!(graph.find_cycle(t(1)), Some(vec![t(1), t(2)]));
        assert_eq!(graph.find_cycle(t(2)), Some(vec![t(2), t(1)]));
    }

    #[test]
    fn test_chain_is_not_a_cycle() {
        let mut graph = WaitForGraph::new();
        graph.add_wait(t(1), t(2));
        graph.add_wait(t(2), t(3));
        assert_eq!(graph.find_cycle(t(1)), None);
    }

    #[test]
    fn test_cycle_not_through_start() {
        let mut graph = WaitForGraph::new();
        graph.add_wait(t(1), t(2));
        graph.add_wait(t(2), t(3));
        graph.add_wait(t(3), t(2));
        assert_eq!(graph.find_cycle(t(1)), None);
        assert_eq!(graph.find_cycle(t(2)), Some(vec![t(2), t(3)]));
    }

    #[test]
    fn test_remove_holder_breaks_cycle() {
        let mut graph = WaitForGraph::new();
        graph.add_wait(t(1), t(2));
        graph.add_wait(t(3), t(2));
        graph.add_wait(t(2), t(1));

        assert_eq!(graph.remove_holder(t(2)), 2);
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.waiting_on(t(2)), Some(t(1)));
        assert_eq!(graph.find_cycle(t(2)), None);
    }

    #[test]
    fn test_add_wait_replaces_edge() {
        let mut graph = WaitForGraph::new();
        graph.add_wait(t(1), t(2));
        graph.add_wait(t(1), t(3));
        assert_eq!(graph.waiting_on(t(1)), Some(t(3)));
        assert_eq!(graph.remove_waiter(t(1)), Some(t(3)));
        assert!(graph.is_empty());
    }

    /// Walk the edge function `n` times and report whether `start` recurs.
    fn reaches_itself(edges: &HashMap<TxnId, TxnId>, start: TxnId) -> bool {
        let mut current = start;
        for _ in 0..=edges.len() {
            match edges.get(&current) {
                Some(&next) if next == start => return true,
                Some(&next) => current = next,
                None => return false,
            }
        }
        false
    }

    proptest! {
        #[test]
        fn cycle_detection_matches_brute_force(
            raw in proptest::collection::vec((1u64..12, 1u64..12), 0..16),
            start in 1u64..12,
        ) {
            let mut graph = WaitForGraph::new();
            let mut edges = HashMap::new();
            for (waiter, holder) in raw {
                if waiter != holder {
                    graph.add_wait(t(waiter), t(holder));
                    edges.insert(t(waiter), t(holder));
                }
            }

            let found = graph.find_cycle(t(start));
            prop_assert_eq!(found.is_some(), reaches_itself(&edges, t(start)));

            if let Some(cycle) = found {
                prop_assert_eq!(cycle[0], t(start));
                for pair in cycle.windows(2) {
                    prop_assert_eq!(edges.get(&pair[0]), Some(&pair[1]));
                }
                let last = cycle[cycle.len() - 1];
                prop_assert_eq!(edges.get(&last), Some(&t(start)));
            }
        }
    }
}
