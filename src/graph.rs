use std::fmt;

use bit_set::BitSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::dimacs;

/** Vertex Id */
pub type VertexId = usize;

/** Complete coloring represented as a partition (res[c]: vertices with color c). */
pub type Partition = Vec<Vec<VertexId>>;

/// errors raised while building a graph from an instance file
#[derive(Debug, Error)]
pub enum GraphError {
    /// the instance file could not be read
    #[error("unable to read instance {path}: {source}")]
    Io {
        /// file that was requested
        path: String,
        /// underlying I/O failure
        #[source]
        source: std::io::Error,
    },
    /// the file was readable but does not encode a valid instance
    #[error("invalid instance {path}: {reason}")]
    Load {
        /// file that was requested
        path: String,
        /// what went wrong
        reason: String,
    },
}

/** models an undirected simple graph (symmetric adjacency relation, no diagonal).
Read-only after construction; every rank of the search owns an identical replica. */
#[derive(Debug)]
pub struct Graph {
    /// nb vertices
    n: usize,
    /// nb edges
    m: usize,
    /// edges of the graph
    edges: Vec<(VertexId, VertexId)>,
    /// adj_list[i]: list of vertices adjacent to i
    adj_list: Vec<Vec<VertexId>>,
    /// adj_matrix[i]: bitset of the neighbors of i
    adj_matrix: Vec<BitSet>,
}

impl Graph {
    /// builds the edge list
    fn build_edges(adj_list: &[Vec<VertexId>]) -> Vec<(VertexId, VertexId)> {
        let mut res = Vec::new();
        for (i, l) in adj_list.iter().enumerate() {
            for j in l {
                if i < *j {
                    res.push((i, *j));
                }
            }
        }
        res
    }

    /** constructor using an adjacency list */
    pub fn from_adj_list(adj_list: Vec<Vec<VertexId>>) -> Self {
        let n = adj_list.len();
        // compute nb edges
        let mut m = 0;
        for e in &adj_list {
            // at the end: m = ∑ d(v)
            m += e.len();
        }
        m /= 2; // m = (∑ d(v)) / 2
        let edges = Self::build_edges(&adj_list);
        let mut adj_matrix = vec![BitSet::default(); n];
        for (a, row) in adj_matrix.iter_mut().enumerate() {
            for b in &adj_list[a] {
                row.insert(*b);
            }
        }
        Self { n, m, edges, adj_list, adj_matrix }
    }

    /** constructor using an explicit edge list over n vertices */
    pub fn from_edges(n: usize, edges: &[(VertexId, VertexId)]) -> Self {
        let mut adj_list = vec![Vec::new(); n];
        for (a, b) in edges {
            adj_list[*a].push(*b);
            adj_list[*b].push(*a);
        }
        Self::from_adj_list(adj_list)
    }

    /** creates an instance from a DIMACS file.
    If `expected_order` is given, the order declared by the problem line must match it. */
    pub fn from_dimacs(filename: &str, expected_order: Option<usize>) -> Result<Self, GraphError> {
        let (n, _, adj_list) = dimacs::read_from_file(filename)?;
        if let Some(expected) = expected_order {
            if n != expected {
                return Err(GraphError::Load {
                    path: filename.to_string(),
                    reason: format!("instance declares {} vertices, expected {}", n, expected),
                });
            }
        }
        Ok(Self::from_adj_list(adj_list))
    }

    /** samples a Bernoulli(p) random graph: each pair {i,j} of the upper triangle
    is an edge with probability p, then mirrored. Deterministic for a given seed. */
    pub fn random(n: usize, p: f64, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut adj_list = vec![Vec::new(); n];
        for i in 0..n {
            for j in i + 1..n {
                if rng.gen_bool(p) {
                    adj_list[i].push(j);
                    adj_list[j].push(i);
                }
            }
        }
        Self::from_adj_list(adj_list)
    }

    /// returns the number of vertices in the graph
    pub fn order(&self) -> usize { self.n }

    /// returns the number of edges in the graph
    pub fn nb_edges(&self) -> usize { self.m }

    /// number of neighbors of vertex u
    pub fn degree(&self, u: VertexId) -> usize { self.adj_list[u].len() }

    /// returns the neighbors of vertex u
    pub fn neighbors(&self, u: VertexId) -> &[VertexId] { &self.adj_list[u] }

    /// returns true iff u and v are adjacent (symmetric, false on the diagonal)
    pub fn edge(&self, u: VertexId, v: VertexId) -> bool { self.adj_matrix[u].contains(v) }

    /// returns all edges in the instance
    pub fn edges(&self) -> &[(VertexId, VertexId)] { &self.edges }

    /// displays various information about the instance
    pub fn display_statistics(&self) {
        println!("\t{} \t vertices", self.order());
        println!("\t{} \t edges", self.nb_edges());
        if self.n > 0 {
            let degrees: Vec<usize> = (0..self.order()).map(|i| self.degree(i)).collect();
            println!("\t{} \t min degree", degrees.iter().min().unwrap());
            println!("\t{} \t max degree", degrees.iter().max().unwrap());
        }
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "graph with {} vertices and {} edges", self.n, self.m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_edges() {
        let g = Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
        assert_eq!(g.order(), 4);
        assert_eq!(g.nb_edges(), 4);
        assert!(g.edge(0, 1));
        assert!(g.edge(1, 0));
        assert!(!g.edge(0, 2));
        assert!(!g.edge(2, 2));
        assert_eq!(g.degree(0), 2);
    }

    #[test]
    fn test_random_is_symmetric_without_diagonal() {
        let g = Graph::random(20, 0.4, 42);
        for i in 0..20 {
            assert!(!g.edge(i, i));
            for j in 0..20 {
                assert_eq!(g.edge(i, j), g.edge(j, i));
            }
        }
    }

    #[test]
    fn test_random_is_deterministic() {
        let g1 = Graph::random(15, 0.3, 7);
        let g2 = Graph::random(15, 0.3, 7);
        assert_eq!(g1.edges(), g2.edges());
    }

    #[test]
    fn test_dimacs_order_mismatch() {
        let res = Graph::from_dimacs("insts/peterson.col", Some(11));
        assert!(matches!(res, Err(GraphError::Load { .. })));
    }

    #[test]
    fn test_dimacs_missing_file() {
        let res = Graph::from_dimacs("insts/does-not-exist.col", None);
        assert!(matches!(res, Err(GraphError::Io { .. })));
    }
}
