//! Set-valued dataflow over a directed graph.

use crate::types::Queue;
use std::cmp;

/// The values attached to the nodes of a [`Digraph`].
pub trait Set {
    /// Add all elements of `other` into `self` and report whether `self` grew.
    fn union_with(&mut self, other: &Self) -> bool;
}

impl<B> Set for bit_set::BitSet<B>
where
    B: bit_vec::BitBlock,
{
    fn union_with(&mut self, other: &Self) -> bool {
        let before = self.len();
        bit_set::BitSet::union_with(self, other);
        self.len() != before
    }
}

/// A directed graph over the dense node ids `0..node_count`.
///
/// An edge `x -> y` means that the set of `y` includes the set of `x`.
#[derive(Debug, Default, Clone)]
pub struct Digraph {
    successors: Vec<Vec<usize>>,
    edge_count: usize,
}

impl Digraph {
    pub fn new(node_count: usize) -> Self {
        Self {
            successors: vec![vec![]; node_count],
            edge_count: 0,
        }
    }

    pub fn node_count(&self) -> usize {
        self.successors.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Add the edge `from -> to`. Returns `false` if it already exists.
    pub fn add_edge(&mut self, from: usize, to: usize) -> bool {
        let successors = &mut self.successors[from];
        if successors.contains(&to) {
            return false;
        }
        successors.push(to);
        self.edge_count += 1;
        true
    }

    pub fn successors(&self, node: usize) -> &[usize] {
        &self.successors[node]
    }

    /// Propagate the sets along the edges until nothing changes.
    ///
    /// Cycles are allowed. A node is queued again only when its set grows,
    /// so the number of processed nodes, which is returned, never exceeds
    /// `node_count * (max set size + 1)`.
    pub fn propagate<T: Set>(&self, sets: &mut [T]) -> usize {
        assert_eq!(
            sets.len(),
            self.node_count(),
            "every node must have a set"
        );

        let mut queue: Queue<usize> = (0..self.node_count()).collect();
        let mut pops = 0;
        while let Some(x) = queue.pop() {
            pops += 1;
            for &y in &self.successors[x] {
                if x == y {
                    continue;
                }
                // F(y) <- F(y) \cup F(x)
                let (slot, added) = get_two_mut(sets, y, x);
                if slot.union_with(added) {
                    queue.push(y);
                }
            }
        }

        tracing::trace!(
            nodes = self.node_count(),
            edges = self.edge_count,
            pops,
            "propagated"
        );
        pops
    }
}

fn get_two_mut<T>(slice: &mut [T], x: usize, y: usize) -> (&mut T, &T) {
    assert!(
        x != y && cmp::max(x, y) < slice.len(),
        "index condition not satisfied"
    );
    let i = (x + y) / 2 + 1;
    let (a, b) = slice.split_at_mut(i);
    if x < y {
        (&mut a[x], &b[y - i])
    } else {
        (&mut b[x - i], &a[y])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bit_set::BitSet;

    fn set(elems: &[usize]) -> BitSet {
        elems.iter().copied().collect()
    }

    #[test]
    fn test_get_two_mut() {
        let mut v = vec!["a", "b", "c", "d"];
        assert!(matches!(get_two_mut(&mut v, 0, 1), t if *t.0=="a" && *t.1=="b"));
        assert!(matches!(get_two_mut(&mut v, 1, 0), t if *t.0=="b" && *t.1=="a"));
        assert!(matches!(get_two_mut(&mut v, 0, 2), t if *t.0=="a" && *t.1=="c"));
        assert!(matches!(get_two_mut(&mut v, 2, 1), t if *t.0=="c" && *t.1=="b"));
        assert!(matches!(get_two_mut(&mut v, 3, 2), t if *t.0=="d" && *t.1=="c"));
    }

    #[test]
    fn duplicate_edges_are_ignored() {
        let mut g = Digraph::new(2);
        assert!(g.add_edge(0, 1));
        assert!(!g.add_edge(0, 1));
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.successors(0), [1]);
    }

    #[test]
    fn propagate_chain() {
        // 0 -> 1 -> 2
        let mut g = Digraph::new(3);
        g.add_edge(0, 1);
        g.add_edge(1, 2);
        let mut sets = vec![set(&[0]), set(&[1]), set(&[2])];
        g.propagate(&mut sets);
        assert_eq!(sets, [set(&[0]), set(&[0, 1]), set(&[0, 1, 2])]);
    }

    #[test]
    fn propagate_cycle() {
        // 0 -> 1 -> 2 -> 0, 2 -> 3, 3 -> 3
        let mut g = Digraph::new(4);
        g.add_edge(0, 1);
        g.add_edge(1, 2);
        g.add_edge(2, 0);
        g.add_edge(2, 3);
        g.add_edge(3, 3);
        let mut sets = vec![set(&[0]), set(&[1]), set(&[2]), set(&[3])];
        let pops = g.propagate(&mut sets);

        let all = set(&[0, 1, 2]);
        assert_eq!(sets[0], all);
        assert_eq!(sets[1], all);
        assert_eq!(sets[2], all);
        assert_eq!(sets[3], set(&[0, 1, 2, 3]));
        assert!(pops <= g.node_count() * (4 + 1));
    }

    #[test]
    fn propagate_without_edges_visits_each_node_once() {
        let g = Digraph::new(5);
        let mut sets = vec![BitSet::new(); 5];
        assert_eq!(g.propagate(&mut sets), 5);
    }
}
