use std::fs;

use nom::branch::alt;
use nom::bytes::complete::{tag, take, take_until};
use nom::character::complete::{digit1, multispace0, space1};
use nom::error::{Error, ErrorKind};
use nom::IResult;

use crate::graph::{GraphError, VertexId};

/// reads an instance from file, returns (n, m, adj_list).
/// Lines starting with `c` are comments, `p edge n m` (or `p col n m`) declares
/// the dimensions, `e u v` adds the edge {u-1, v-1} (DIMACS indices start at 1).
pub fn read_from_file(filename: &str) -> Result<(usize, usize, Vec<Vec<VertexId>>), GraphError> {
    let content = fs::read_to_string(filename)
        .map_err(|e| GraphError::Io { path: filename.to_string(), source: e })?
        .replace('\r', "");
    read_from_str(content.trim_start()).map_err(|reason| GraphError::Load {
        path: filename.to_string(),
        reason,
    })
}

/// parses the body of a DIMACS instance; errors carry the offending detail
fn read_from_str(s: &str) -> Result<(usize, usize, Vec<Vec<VertexId>>), String> {
    let mut rest = match skip_comments(s) {
        Ok((rest, _)) => rest,
        Err(_) => s,
    };
    let (after_header, (n, m)) = read_header(rest)
        .map_err(|_| "missing problem line (p edge <n> <m>)".to_string())?;
    rest = after_header;
    let mut adj_list = vec![Vec::new(); n];
    let mut check_nb_edges = 0;
    loop {
        if let Ok((tmp, _)) = skip_comments(rest) {
            rest = tmp;
        }
        match read_edge(rest) {
            Ok((tmp, (a, b))) => {
                if a == 0 || b == 0 || a > n || b > n {
                    return Err(format!("edge ({},{}) out of range for {} vertices", a, b, n));
                }
                if a == b {
                    return Err(format!("self-loop on vertex {}", a));
                }
                rest = tmp;
                adj_list[a - 1].push(b - 1);
                adj_list[b - 1].push(a - 1);
                check_nb_edges += 1;
            }
            Err(_) => break,
        }
    }
    // some instances list every edge in both directions
    if check_nb_edges != m && 2 * check_nb_edges != m {
        return Err(format!("problem line declares {} edges, found {}", m, check_nb_edges));
    }
    Ok((n, m, adj_list))
}

/// skips a single comment
fn skip_comment(s: &str) -> IResult<&str, &str> {
    let (s, _) = tag("c")(s)?;
    let (s, _) = take_until("\n")(s)?;
    take(1usize)(s)
}

/// skips all comments
pub fn skip_comments(s: &str) -> IResult<&str, Vec<&str>> {
    nom::multi::many0(skip_comment)(s)
}

/// reads two numbers separated by spaces, consuming any trailing blank space
fn read_two_integers(s: &str) -> IResult<&str, (usize, usize)> {
    let (s, s1) = digit1(s)?;
    let (s, _) = space1(s)?;
    let (s, s2) = digit1(s)?;
    let (s, _) = multispace0(s)?;
    let n1 = s1.parse::<usize>()
        .map_err(|_| nom::Err::Error(Error::new(s, ErrorKind::Digit)))?;
    let n2 = s2.parse::<usize>()
        .map_err(|_| nom::Err::Error(Error::new(s, ErrorKind::Digit)))?;
    Ok((s, (n1, n2)))
}

/// reads header containing (n,m)
pub fn read_header(s: &str) -> IResult<&str, (usize, usize)> {
    let (s, _) = alt((tag("p edge "), tag("p col ")))(s)?;
    read_two_integers(s)
}

/// reads edge line (WARNING: indices start at 1 in the DIMACS format)
pub fn read_edge(s: &str) -> IResult<&str, (usize, usize)> {
    let (s, _) = tag("e ")(s)?;
    read_two_integers(s)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_instance() {
        let (n, m, adj_list) = read_from_file("insts/peterson.col").unwrap();
        assert_eq!(n, 10);
        assert_eq!(m, 15);
        assert!(adj_list.iter().all(|l| l.len() == 3));
    }

    #[test]
    fn test_read_comment() {
        let s = "c this is a test comment\np edge 2 1\ne 1 2";
        assert_eq!(
            skip_comments(s),
            Ok(("p edge 2 1\ne 1 2", vec!["\n"]))
        );
    }

    #[test]
    fn test_read_header() {
        let s = "p edge 2 1\ne 1 2";
        assert_eq!(read_header(s).unwrap().0, "e 1 2");
        assert_eq!(read_header(s).unwrap().1, (2, 1));
    }

    #[test]
    fn test_read_header_col() {
        let s = "p col 2 1\ne 1 2";
        assert_eq!(read_header(s).unwrap().0, "e 1 2");
        assert_eq!(read_header(s).unwrap().1, (2, 1));
    }

    #[test]
    fn test_read_edge() {
        let s = "e 1 2\n";
        assert_eq!(read_edge(s).unwrap().1, (1, 2));
        assert_eq!(read_edge(s).unwrap().0, "");
    }

    #[test]
    fn test_body_with_interleaved_comments() {
        let s = "p edge 3 2\ne 1 2\nc middle comment\ne 2 3\n";
        let (n, m, adj_list) = read_from_str(s).unwrap();
        assert_eq!((n, m), (3, 2));
        assert_eq!(adj_list, vec![vec![1], vec![0, 2], vec![1]]);
    }

    #[test]
    fn test_missing_header() {
        let s = "e 1 2\n";
        assert!(read_from_str(s).is_err());
    }

    #[test]
    fn test_vertex_out_of_range() {
        let s = "p edge 2 1\ne 1 5\n";
        assert!(read_from_str(s).unwrap_err().contains("out of range"));
    }

    #[test]
    fn test_self_loop_rejected() {
        let s = "p edge 2 1\ne 1 1\n";
        assert!(read_from_str(s).unwrap_err().contains("self-loop"));
    }

    #[test]
    fn test_edge_count_mismatch() {
        let s = "p edge 3 3\ne 1 2\n";
        assert!(read_from_str(s).unwrap_err().contains("declares"));
    }
}
