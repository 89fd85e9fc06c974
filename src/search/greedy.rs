use bit_set::BitSet;
use priority_queue::PriorityQueue;

use crate::graph::{Graph, VertexId};
use crate::search::node::PartialColoring;

/// queue priority of an uncolored vertex: saturation degree first, plain
/// degree as the tie break (tuples order lexicographically)
type Saturation = (usize, usize);

/** greedy DSATUR coloring, used to seed the branch-and-bound upper bound.
    1. choose an uncolored vertex that sees the most colors (break ties by the largest degree)
    2. give it the first color none of its neighbors holds
    3. mark all its neighbors as seeing this color
    4. repeat until every vertex is colored

Deterministic for a given graph, so every rank computes the same bound
without communicating. The result is relabeled into first-use canonical
form. */
pub fn greedy_dsatur(graph: &Graph) -> PartialColoring {
    let n = graph.order();
    let mut remaining_vertices: PriorityQueue<VertexId, Saturation> = PriorityQueue::new();
    for i in 0..n {
        remaining_vertices.push(i, (0, graph.degree(i)));
    }
    let mut colors: Vec<Option<usize>> = vec![None; n]; // colors[v] -> color class of v
    let mut adj_colors: Vec<BitSet> = vec![BitSet::default(); n]; // adj_colors[v] -> classes v sees
    while let Some((current_vertex, _)) = remaining_vertices.pop() {
        // first class not seen by a neighbor
        let mut color: usize = 0;
        while adj_colors[current_vertex].contains(color) {
            color += 1;
        }
        colors[current_vertex] = Some(color);
        // update saturation degrees
        for &neighbor in graph.neighbors(current_vertex) {
            if colors[neighbor].is_none() && !adj_colors[neighbor].contains(color) {
                adj_colors[neighbor].insert(color);
                remaining_vertices.change_priority_by(&neighbor, |(dsat, _)| *dsat += 1);
            }
        }
    }
    let assignment: Vec<usize> = colors.into_iter().map(|c| c.unwrap()).collect();
    PartialColoring::from_assignment(&assignment)
}
