use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use crate::search::node::PartialColoring;

/** process-local upper bound on the number of colors, shared by the two
threads of a rank (the search loop reads it, the listener writes it).
Monotonically non-increasing; relaxed ordering is enough because nothing is
published through it, only the bound value itself matters. */
#[derive(Debug)]
pub struct SharedBound {
    value: AtomicU32,
}

impl SharedBound {
    /// creates a bound starting at `initial` (n+1 before any coloring is known)
    pub fn new(initial: u32) -> Self {
        Self { value: AtomicU32::new(initial) }
    }

    /// current bound
    pub fn current(&self) -> u32 {
        self.value.load(Ordering::Relaxed)
    }

    /// lowers the bound to `candidate` if it improves it; true iff it did
    pub fn tighten(&self, candidate: u32) -> bool {
        self.value.fetch_min(candidate, Ordering::Relaxed) > candidate
    }
}

/** the coordinator's pairing of the bound with the best coloring seen.
Both members are updated under one lock so the announced solution always
matches the announced bound, whatever order improvements arrive in. */
#[derive(Debug)]
pub struct Incumbent {
    bound: SharedBound,
    best: Mutex<Option<PartialColoring>>,
}

impl Incumbent {
    /// creates an empty incumbent with the bound at `initial`
    pub fn new(initial: u32) -> Self {
        Self { bound: SharedBound::new(initial), best: Mutex::new(None) }
    }

    /// current bound
    pub fn current(&self) -> u32 {
        self.bound.current()
    }

    /** records `node` as the new best if it strictly improves the bound,
    returning the new bound; stale offers are dropped. */
    pub fn offer(&self, node: PartialColoring) -> Option<u32> {
        debug_assert!(node.is_final());
        let mut best = self.best.lock().unwrap();
        let cost = node.nb_colors();
        if cost >= self.bound.current() {
            return None;
        }
        self.bound.tighten(cost);
        *best = Some(node);
        Some(cost)
    }

    /// snapshot of the best coloring recorded so far
    pub fn best(&self) -> Option<PartialColoring> {
        self.best.lock().unwrap().clone()
    }
}
