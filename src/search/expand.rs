use std::sync::Arc;

use bit_set::BitSet;

use crate::graph::Graph;
use crate::search::node::PartialColoring;

/** enumerates the children of an internal search node.

For a node about to color vertex v, the children are, in order: one child per
existing color not held by a lower-indexed neighbor of v (ascending), then a
single child introducing the next unused color. Workers push this sequence on
their stack in reverse so the lowest color is explored first, which tends to
keep the color count low and strengthens pruning. A pure function of the
graph and the node. */
#[derive(Debug, Clone)]
pub struct Expander {
    /// replicated instance
    graph: Arc<Graph>,
}

impl Expander {
    /// creates an expander over a replicated instance
    pub fn new(graph: Arc<Graph>) -> Self {
        Self { graph }
    }

    /// ordered legal extensions of the next uncolored vertex
    pub fn children(&self, node: &PartialColoring) -> Vec<PartialColoring> {
        debug_assert!(!node.is_final());
        let v = node.next_vertex();
        // colors held by the already-colored neighbors of v
        let mut forbidden = BitSet::with_capacity(node.nb_colors() as usize + 2);
        for &u in self.graph.neighbors(v) {
            if u < v {
                forbidden.insert(node.color_of(u) as usize);
            }
        }
        let mut children = Vec::with_capacity(node.nb_colors() as usize + 1);
        for color in 1..=node.nb_colors() {
            if !forbidden.contains(color as usize) {
                children.push(node.extend(color));
            }
        }
        children.push(node.extend(node.nb_colors() + 1));
        children
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    /// every complete coloring of the tree, by exhaustive expansion
    fn enumerate_leaves(expander: &Expander, n: usize) -> Vec<PartialColoring> {
        let mut leaves = Vec::new();
        let mut stack = vec![PartialColoring::root(n)];
        while let Some(curr) = stack.pop() {
            if curr.is_final() {
                leaves.push(curr);
            } else {
                stack.extend(expander.children(&curr));
            }
        }
        leaves
    }

    /// reference chromatic number by k-colorability backtracking, no symmetry breaking
    fn chromatic_number_reference(graph: &Graph) -> u32 {
        fn colorable(graph: &Graph, colors: &mut [u32], v: usize, k: u32) -> bool {
            if v == graph.order() {
                return true;
            }
            for c in 1..=k {
                let conflict = graph.neighbors(v).iter().any(|&u| colors[u] == c);
                if !conflict {
                    colors[v] = c;
                    if colorable(graph, colors, v + 1, k) {
                        return true;
                    }
                    colors[v] = 0;
                }
            }
            false
        }
        if graph.order() == 0 {
            return 0;
        }
        let mut k = 1;
        loop {
            let mut colors = vec![0; graph.order()];
            if colorable(graph, &mut colors, 0, k) {
                return k;
            }
            k += 1;
        }
    }

    #[test]
    fn test_children_of_the_root_introduce_a_single_color() {
        let graph = Arc::new(Graph::from_edges(3, &[(0, 1), (1, 2)]));
        let expander = Expander::new(graph);
        let children = expander.children(&PartialColoring::root(3));
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].color_of(0), 1);
        assert_eq!(children[0].nb_colors(), 1);
    }

    #[test]
    fn test_children_avoid_neighbor_colors() {
        // path 0-1-2: once 0 and 1 are colored 1 and 2, vertex 2 may reuse 1 or open 3
        let graph = Arc::new(Graph::from_edges(3, &[(0, 1), (1, 2)]));
        let expander = Expander::new(graph);
        let node = PartialColoring::root(3).extend(1).extend(2);
        let children = expander.children(&node);
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].color_of(2), 1);
        assert_eq!(children[1].color_of(2), 3);
    }

    #[test]
    fn test_children_keep_the_prefix_proper() {
        for seed in 0..20 {
            let graph = Arc::new(Graph::random(8, 0.5, seed));
            let expander = Expander::new(graph.clone());
            let mut stack = vec![PartialColoring::root(8)];
            while let Some(curr) = stack.pop() {
                if curr.is_final() {
                    continue;
                }
                for child in expander.children(&curr) {
                    for v in 0..child.next_vertex() {
                        for &u in graph.neighbors(v) {
                            if u < child.next_vertex() {
                                assert_ne!(child.color_of(u), child.color_of(v));
                            }
                        }
                    }
                    // bound the walk: only go deep on the first few levels
                    if child.next_vertex() < 5 {
                        stack.push(child);
                    }
                }
            }
        }
    }

    #[test]
    fn test_children_are_ordered_and_canonical() {
        for seed in 0..20 {
            let graph = Arc::new(Graph::random(7, 0.4, seed));
            let expander = Expander::new(graph);
            let mut stack = vec![PartialColoring::root(7)];
            while let Some(curr) = stack.pop() {
                if curr.is_final() {
                    continue;
                }
                let children = expander.children(&curr);
                // existing colors ascending, then exactly one new color
                let last = children.last().unwrap();
                assert_eq!(last.color_of(curr.next_vertex()), curr.nb_colors() + 1);
                assert_eq!(last.nb_colors(), curr.nb_colors() + 1);
                for pair in children.windows(2) {
                    assert!(pair[0].color_of(curr.next_vertex())
                        < pair[1].color_of(curr.next_vertex()));
                }
                for child in &children[..children.len() - 1] {
                    assert_eq!(child.nb_colors(), curr.nb_colors());
                }
                stack.extend(children);
            }
        }
    }

    #[test]
    fn test_expansion_is_pure() {
        let graph = Arc::new(Graph::random(6, 0.5, 3));
        let expander = Expander::new(graph);
        let node = PartialColoring::root(6).extend(1).extend(2).extend(1);
        assert_eq!(expander.children(&node), expander.children(&node));
    }

    #[test]
    fn test_enumeration_reaches_the_chromatic_number() {
        for seed in 0..15 {
            let graph = Arc::new(Graph::random(7, 0.5, seed));
            let expected = chromatic_number_reference(&graph);
            let expander = Expander::new(graph.clone());
            let best = enumerate_leaves(&expander, 7)
                .iter()
                .map(PartialColoring::nb_colors)
                .min()
                .unwrap();
            assert_eq!(best, expected, "seed {}", seed);
        }
    }

    #[test]
    fn test_leaves_are_proper_colorings() {
        let graph = Arc::new(Graph::from_edges(5, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0)]));
        let expander = Expander::new(graph.clone());
        for leaf in enumerate_leaves(&expander, 5) {
            assert_eq!(
                leaf.check(&graph),
                crate::search::node::CheckerResult::Ok(leaf.nb_colors())
            );
        }
    }
}
