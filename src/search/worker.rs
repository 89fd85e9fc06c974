use std::sync::Arc;
use std::thread;

use crate::comm::{BoundReceiver, CommError, Endpoint, Tag, TERMINATE};
use crate::graph::Graph;
use crate::search::bound::SharedBound;
use crate::search::expand::Expander;
use crate::search::node::PartialColoring;

/// what a worker rank reports when its subtree is exhausted
#[derive(Debug)]
pub struct WorkerReport {
    /// number of nodes popped from the stack
    pub explored: u64,
}

/** runs a worker rank: receive one envelope from the coordinator, search the
subtree it carries depth-first (or skip it entirely on `Idle`), report every
improvement, then sign off with `Done` and wait at the barrier.

Children are pushed in reverse so the lowest-color extension is explored
first. Pruning compares against the process-local bound, which the listener
thread tightens whenever the coordinator broadcasts a better one. */
pub fn run(
    mut endpoint: Endpoint,
    graph: Arc<Graph>,
    bound: Arc<SharedBound>,
) -> Result<WorkerReport, CommError> {
    let n = graph.order();
    let rank = endpoint.rank();
    let initial = endpoint.recv()?;

    let bound_rx = endpoint.take_bound_receiver().ok_or_else(|| {
        CommError::Protocol(format!("rank {}: bound receiver already detached", rank))
    })?;
    let listener_bound = bound.clone();
    let listener = thread::spawn(move || listen_for_root(bound_rx, listener_bound));

    let mut explored = 0u64;
    match initial.tag {
        Tag::Idle => {
            log::debug!("rank {} received no subtree", rank);
        }
        Tag::InitialNode => {
            let subtree_root = PartialColoring::from_words(n, &initial.words)?;
            let expander = Expander::new(graph);
            let mut stack = vec![subtree_root];
            while let Some(curr) = stack.pop() {
                explored += 1;
                if !curr.is_final() {
                    // prune nodes that already need as many colors as the best known coloring
                    if curr.nb_colors() >= bound.current() {
                        continue;
                    }
                    let children = expander.children(&curr);
                    // reversed so the lowest-color child is popped next
                    stack.extend(children.into_iter().rev());
                } else if bound.tighten(curr.nb_colors()) {
                    endpoint.send(0, Tag::Solution, curr.to_words())?;
                }
            }
            log::debug!("rank {} explored {} nodes", rank, explored);
        }
        other => {
            return Err(CommError::Protocol(format!(
                "rank {} received tag {:?} as its initial envelope", rank, other
            )));
        }
    }

    endpoint.send(0, Tag::Done, PartialColoring::root(n).to_words())?;
    endpoint.barrier_wait();
    match listener.join() {
        Ok(result) => result?,
        Err(_) => {
            return Err(CommError::Protocol(format!("rank {}: listener panicked", rank)));
        }
    }
    Ok(WorkerReport { explored })
}

/** listener thread of a worker: tightens the local bound from broadcasts
until the terminate sentinel arrives. A missed or late update is harmless,
the next loop iteration simply prunes with the tighter value. */
fn listen_for_root(bound_rx: BoundReceiver, bound: Arc<SharedBound>) -> Result<(), CommError> {
    loop {
        let value = bound_rx.recv()?;
        if value == TERMINATE {
            return Ok(());
        }
        if bound.tighten(value) {
            log::debug!("bound tightened to {} by broadcast", value);
        }
    }
}
