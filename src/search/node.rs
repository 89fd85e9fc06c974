use std::fmt;

use crate::comm::CommError;
use crate::graph::{Graph, Partition, VertexId};

/** a node of the search tree: colors assigned to a prefix of the vertices.
`colors[v] == 0` means unassigned; assigned values are 1..=n. Vertices
`0..next` are colored, `next..n` are not, and colors are introduced in
first-use order: vertex v may only use a color in `1..=tot_colors+1` where
`tot_colors` is the number of distinct colors in the prefix. This canonical
ordering keeps exactly one representative per color-permutation class in the
tree. Nodes are immutable; extensions produce fresh values. */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialColoring {
    /// colors[v]: color of vertex v, 0 while unassigned
    colors: Vec<u32>,
    /// next vertex to color; also the length of the colored prefix
    next: usize,
    /// number of distinct colors in the prefix (its maximum value)
    tot_colors: u32,
}

/** checker result.
Returns the number of colors if the coloring is complete and proper,
otherwise an explanation of what is wrong. */
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CheckerResult {
    /// coloring is a complete proper coloring, with its cost
    Ok(u32),
    /// some vertex is not colored
    VertexNotColored(VertexId),
    /// two adjacent vertices share a color
    ConflictingEdge(VertexId, VertexId),
    /// a color is introduced out of first-use order at this vertex
    NonCanonical(VertexId),
}

impl PartialColoring {
    /// the root of the search tree: nothing assigned yet
    pub fn root(n: usize) -> Self {
        Self { colors: vec![0; n], next: 0, tot_colors: 0 }
    }

    /** canonicalizes a complete assignment (`assignment[v]`: arbitrary color
    class index of v) by relabeling classes in first-use order. The result is
    a final node; properness is the caller's concern. */
    pub fn from_assignment(assignment: &[usize]) -> Self {
        let n = assignment.len();
        let nb_classes = assignment.iter().max().map_or(0, |c| c + 1);
        let mut relabel = vec![0u32; nb_classes];
        let mut colors = Vec::with_capacity(n);
        let mut tot_colors = 0u32;
        for &class in assignment {
            if relabel[class] == 0 {
                tot_colors += 1;
                relabel[class] = tot_colors;
            }
            colors.push(relabel[class]);
        }
        Self { colors, next: n, tot_colors }
    }

    /// true iff every vertex is colored
    pub fn is_final(&self) -> bool { self.next == self.colors.len() }

    /// number of distinct colors used so far (the cost of a final node)
    pub fn nb_colors(&self) -> u32 { self.tot_colors }

    /// next vertex to be colored
    pub fn next_vertex(&self) -> VertexId { self.next }

    /// number of vertices of the underlying graph
    pub fn order(&self) -> usize { self.colors.len() }

    /// color of vertex v (0 while unassigned)
    pub fn color_of(&self, v: VertexId) -> u32 { self.colors[v] }

    /** colors the next vertex with `color`, returning the child node.
    `color` must be an existing color or the single next unused one. */
    pub fn extend(&self, color: u32) -> Self {
        debug_assert!(!self.is_final());
        debug_assert!(color >= 1 && color <= self.tot_colors + 1);
        let mut colors = self.colors.clone();
        colors[self.next] = color;
        Self {
            colors,
            next: self.next + 1,
            tot_colors: self.tot_colors.max(color),
        }
    }

    /// flat wire payload: `[colors[0..n] | tot_colors | next]`
    pub fn to_words(&self) -> Vec<u32> {
        let mut words = self.colors.clone();
        words.push(self.tot_colors);
        words.push(self.next as u32);
        words
    }

    /** decodes a wire payload for a graph of order n. The payload must hold
    exactly n+2 words and describe a consistent node (dense colored prefix,
    `tot_colors` equal to the prefix maximum). */
    pub fn from_words(n: usize, words: &[u32]) -> Result<Self, CommError> {
        if words.len() != n + 2 {
            return Err(CommError::Protocol(format!(
                "node payload holds {} words, expected {}", words.len(), n + 2
            )));
        }
        let colors = words[..n].to_vec();
        let tot_colors = words[n];
        let next = words[n + 1] as usize;
        if next > n {
            return Err(CommError::Protocol(format!(
                "node payload colors {} vertices out of {}", next, n
            )));
        }
        let mut prefix_max = 0u32;
        for (v, &color) in colors.iter().enumerate() {
            if (color != 0) != (v < next) {
                return Err(CommError::Protocol(format!(
                    "node payload has a sparse colored prefix at vertex {}", v
                )));
            }
            prefix_max = prefix_max.max(color);
        }
        if prefix_max != tot_colors {
            return Err(CommError::Protocol(format!(
                "node payload declares {} colors but uses {}", tot_colors, prefix_max
            )));
        }
        Ok(Self { colors, next, tot_colors })
    }

    /// partition view of the colored prefix (res[c]: vertices with color c+1)
    pub fn partition(&self) -> Partition {
        let mut res = vec![Vec::new(); self.tot_colors as usize];
        for v in 0..self.next {
            res[(self.colors[v] - 1) as usize].push(v);
        }
        res
    }

    /** checks that this node is a complete proper coloring of `graph`, with
    colors in first-use order. */
    pub fn check(&self, graph: &Graph) -> CheckerResult {
        for v in 0..self.order() {
            if self.colors[v] == 0 {
                return CheckerResult::VertexNotColored(v);
            }
        }
        for &(u, v) in graph.edges() {
            if self.colors[u] == self.colors[v] {
                return CheckerResult::ConflictingEdge(u, v);
            }
        }
        let mut seen_max = 0u32;
        for v in 0..self.order() {
            if self.colors[v] > seen_max + 1 {
                return CheckerResult::NonCanonical(v);
            }
            seen_max = seen_max.max(self.colors[v]);
        }
        CheckerResult::Ok(self.tot_colors)
    }
}

impl fmt::Display for PartialColoring {
    /// one line per color, listing its vertices (the DIMACS-adjacent export format)
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} colors, {} / {} vertices colored",
            self.tot_colors, self.next, self.colors.len())?;
        for (c, class) in self.partition().iter().enumerate() {
            write!(f, "{}:", c + 1)?;
            for v in class {
                write!(f, " {}", v)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_is_internal_and_empty() {
        let root = PartialColoring::root(5);
        assert!(!root.is_final());
        assert_eq!(root.nb_colors(), 0);
        assert_eq!(root.next_vertex(), 0);
    }

    #[test]
    fn test_extend_introduces_colors_in_order() {
        let node = PartialColoring::root(3).extend(1).extend(2).extend(1);
        assert!(node.is_final());
        assert_eq!(node.nb_colors(), 2);
        assert_eq!(node.color_of(0), 1);
        assert_eq!(node.color_of(1), 2);
        assert_eq!(node.color_of(2), 1);
    }

    #[test]
    fn test_words_roundtrip() {
        let node = PartialColoring::root(4).extend(1).extend(2);
        let words = node.to_words();
        assert_eq!(words, vec![1, 2, 0, 0, 2, 2]);
        assert_eq!(PartialColoring::from_words(4, &words).unwrap(), node);
    }

    #[test]
    fn test_wrong_payload_length_is_a_protocol_violation() {
        let res = PartialColoring::from_words(4, &[1, 2, 3]);
        assert!(matches!(res, Err(crate::comm::CommError::Protocol(_))));
    }

    #[test]
    fn test_inconsistent_payload_is_a_protocol_violation() {
        // declares two colored vertices but vertex 1 is unassigned
        let res = PartialColoring::from_words(3, &[1, 0, 0, 1, 2]);
        assert!(res.is_err());
        // declared color count does not match the prefix maximum
        let res = PartialColoring::from_words(3, &[1, 2, 0, 3, 2]);
        assert!(res.is_err());
    }

    #[test]
    fn test_from_assignment_relabels_canonically() {
        // classes appear as 2, 0, 2, 1 -> relabeled 1, 2, 1, 3
        let node = PartialColoring::from_assignment(&[2, 0, 2, 1]);
        assert_eq!(node.color_of(0), 1);
        assert_eq!(node.color_of(1), 2);
        assert_eq!(node.color_of(2), 1);
        assert_eq!(node.color_of(3), 3);
        assert_eq!(node.nb_colors(), 3);
    }

    #[test]
    fn test_checker_flags_conflicts() {
        let g = Graph::from_edges(3, &[(0, 1), (1, 2)]);
        let proper = PartialColoring::root(3).extend(1).extend(2).extend(1);
        assert_eq!(proper.check(&g), CheckerResult::Ok(2));
        let conflicting = PartialColoring::from_assignment(&[0, 0, 1]);
        assert_eq!(conflicting.check(&g), CheckerResult::ConflictingEdge(0, 1));
        let incomplete = PartialColoring::root(3).extend(1);
        assert_eq!(incomplete.check(&g), CheckerResult::VertexNotColored(1));
    }

    #[test]
    fn test_checker_flags_out_of_order_colors() {
        // a complete proper assignment that introduces color 3 before color 2;
        // the codec accepts it (dense prefix, consistent maximum) but the
        // checker must reject it as out of first-use order at vertex 1
        let g = Graph::from_edges(3, &[(0, 1)]);
        let node = PartialColoring::from_words(3, &[1, 3, 2, 3, 3]).unwrap();
        assert_eq!(node.check(&g), CheckerResult::NonCanonical(1));
    }

    #[test]
    fn test_partition_groups_by_color() {
        let node = PartialColoring::root(4).extend(1).extend(2).extend(1).extend(2);
        assert_eq!(node.partition(), vec![vec![0, 2], vec![1, 3]]);
    }
}
