//! Composition graph and cycle detection.
//!
//! The graph is built once per mutation from a single bulk fetch of all
//! component edges, then checked in memory. This keeps the cycle check to one
//! round-trip regardless of composition depth.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::error::{CompositionError, Result};

/// In-memory adjacency view of the compound component edges
/// (parent exercise -> child exercises).
#[derive(Debug, Default)]
pub struct CompositionGraph {
    children: HashMap<Uuid, Vec<Uuid>>,
}

impl CompositionGraph {
    /// Build the graph from `(parent_exercise_id, child_exercise_id)` pairs.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (Uuid, Uuid)>,
    {
        let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for (parent, child) in edges {
            children.entry(parent).or_default().push(child);
        }
        Self { children }
    }

    /// Direct children of an exercise. Simple exercises have none.
    pub fn children_of(&self, id: Uuid) -> &[Uuid] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `target` is reachable from `start` via zero or more edges.
    ///
    /// Iterative depth-first search. The visited set also terminates the walk
    /// on already-corrupt cyclic data instead of looping forever.
    pub fn reaches(&self, start: Uuid, target: Uuid) -> bool {
        if start == target {
            return true;
        }
        let mut visited = HashSet::new();
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            for &child in self.children_of(node) {
                if child == target {
                    return true;
                }
                stack.push(child);
            }
        }
        false
    }

    /// Validate that adding the edge `parent -> child` keeps the graph
    /// acyclic. The edge is not inserted; callers write it only on `Ok`.
    pub fn check_new_edge(&self, parent: Uuid, child: Uuid) -> Result<()> {
        if parent == child {
            return Err(CompositionError::SelfReference(parent));
        }
        // A cycle would close exactly when the parent is already reachable
        // from the candidate child.
        if self.reaches(child, parent) {
            return Err(CompositionError::CircularReference { parent, child });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn empty_graph_allows_any_edge() {
        let g = CompositionGraph::default();
        let v = ids(2);
        assert_eq!(g.check_new_edge(v[0], v[1]), Ok(()));
    }

    #[test]
    fn self_reference_rejected_regardless_of_state() {
        let g = CompositionGraph::default();
        let v = ids(1);
        assert_eq!(
            g.check_new_edge(v[0], v[0]),
            Err(CompositionError::SelfReference(v[0]))
        );
    }

    #[test]
    fn direct_cycle_rejected() {
        // A contains B; adding B -> A must fail.
        let v = ids(2);
        let g = CompositionGraph::from_edges([(v[0], v[1])]);
        assert_eq!(
            g.check_new_edge(v[1], v[0]),
            Err(CompositionError::CircularReference {
                parent: v[1],
                child: v[0],
            })
        );
    }

    #[test]
    fn transitive_cycle_rejected() {
        // C contains D, D contains E; adding E -> C must fail (E -> C -> D -> E).
        let v = ids(3);
        let (c, d, e) = (v[0], v[1], v[2]);
        let g = CompositionGraph::from_edges([(c, d), (d, e)]);
        assert_eq!(
            g.check_new_edge(e, c),
            Err(CompositionError::CircularReference { parent: e, child: c })
        );
    }

    #[test]
    fn diamond_composition_is_not_a_cycle() {
        // A -> B, A -> C, B -> D, C -> D: D appears twice but nothing cycles.
        let v = ids(4);
        let g = CompositionGraph::from_edges([(v[0], v[1]), (v[0], v[2]), (v[1], v[3])]);
        assert_eq!(g.check_new_edge(v[2], v[3]), Ok(()));
    }

    #[test]
    fn simple_child_never_cycles() {
        let v = ids(3);
        let g = CompositionGraph::from_edges([(v[0], v[1])]);
        // v[2] has no components of its own.
        assert_eq!(g.check_new_edge(v[0], v[2]), Ok(()));
    }

    #[test]
    fn dfs_terminates_on_corrupt_cyclic_data() {
        // Already-cyclic edges must not hang the walk.
        let v = ids(3);
        let g = CompositionGraph::from_edges([(v[0], v[1]), (v[1], v[0])]);
        assert!(!g.reaches(v[0], v[2]));
        assert!(g.reaches(v[0], v[1]));
    }

    #[test]
    fn reaches_is_reflexive() {
        let v = ids(1);
        let g = CompositionGraph::default();
        assert!(g.reaches(v[0], v[0]));
    }
}
