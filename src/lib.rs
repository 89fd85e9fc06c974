//! Exact graph coloring (chromatic number) via distributed branch-and-bound

// #![warn(clippy::all, clippy::pedantic)]
// useful additional warnings if docs are missing, or crates imported but unused, etc.
#![warn(missing_debug_implementations)]
#![warn(missing_docs)]
#![warn(trivial_casts, trivial_numeric_casts)]
#![warn(unsafe_code)]
#![warn(unused_extern_crates)]
#![warn(variant_size_differences)]

// not sure if already by default in clippy
#![warn(clippy::similar_names)]
#![warn(clippy::shadow_unrelated)]
#![warn(clippy::shadow_same)]
#![warn(clippy::shadow_reuse)]


/// symmetric adjacency relation over {0,..,n-1} and its constructors
pub mod graph;

/// read DIMACS instance files
pub mod dimacs;

/// rank-based message-passing runtime (mailboxes, bound broadcasts, barrier)
pub mod comm;

/// distributed branch-and-bound search for the chromatic number
pub mod search;

/// helper and utility methods for executables
pub mod util;
