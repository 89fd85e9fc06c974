use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;

use crate::comm::{BoundBroadcaster, CommError, Endpoint, Mailbox, Tag, TERMINATE};
use crate::graph::Graph;
use crate::search::bound::Incumbent;
use crate::search::expand::Expander;
use crate::search::node::PartialColoring;

/// what rank 0 reports once every worker is done
#[derive(Debug)]
pub struct CoordinatorReport {
    /// best coloring found, `None` only for pathological empty searches
    pub best: Option<PartialColoring>,
    /// its cost (the chromatic number at termination)
    pub nb_colors: u32,
    /// true if the breadth-first phase already drained the whole tree
    pub serial: bool,
    /// number of subtree roots handed to workers
    pub frontier_size: usize,
}

/** runs rank 0: builds the frontier breadth-first, scatters it, listens for
worker improvements while parked at the barrier, then announces.

The frontier never outgrows the worker count: a node whose children would
overflow it is pushed back and the phase stops, so every worker receives at
most one subtree. If the queue drains first, the search already finished
serially; workers are still released through the normal protocol (an `Idle`
envelope each) so the whole job terminates cleanly. */
pub fn run(
    mut endpoint: Endpoint,
    graph: Arc<Graph>,
    incumbent: Arc<Incumbent>,
) -> Result<CoordinatorReport, CommError> {
    let n = graph.order();
    let nb_workers = endpoint.nb_workers();
    let expander = Expander::new(graph);

    // phase 1: breadth-first expansion until the frontier can seed every worker
    let mut queue: VecDeque<PartialColoring> = VecDeque::new();
    queue.push_back(PartialColoring::root(n));
    while let Some(curr) = queue.pop_front() {
        if !curr.is_final() {
            // prune nodes that already need as many colors as the best known coloring
            if curr.nb_colors() >= incumbent.current() {
                continue;
            }
            let children = expander.children(&curr);
            if queue.len() + children.len() <= nb_workers {
                queue.extend(children);
            } else {
                queue.push_back(curr);
                break;
            }
        } else if let Some(new_bound) = incumbent.offer(curr) {
            log::info!("breadth-first phase found a {}-coloring", new_bound);
        }
    }
    let serial = queue.is_empty();
    let frontier_size = queue.len();
    if serial {
        log::info!("frontier drained: solved without any worker");
    } else {
        log::info!(
            "dispatching {} subtree roots to {} workers (bound {})",
            frontier_size, nb_workers, incumbent.current()
        );
    }

    // phase 2: one subtree root per worker, a dummy for the workers left over
    let mut next_rank = 1;
    for node in queue.drain(..) {
        endpoint.send(next_rank, Tag::InitialNode, node.to_words())?;
        next_rank += 1;
    }
    let dummy = PartialColoring::root(n).to_words();
    for rank in next_rank..=nb_workers {
        endpoint.send(rank, Tag::Idle, dummy.clone())?;
    }

    // the listener aggregates improvements while this thread waits at the barrier
    let mailbox = endpoint.take_mailbox().ok_or_else(|| {
        CommError::Protocol("coordinator mailbox already detached".to_string())
    })?;
    let broadcaster = endpoint.take_bound_broadcaster().ok_or_else(|| {
        CommError::Protocol("coordinator bound broadcaster already detached".to_string())
    })?;
    let listener_incumbent = incumbent.clone();
    let listener = thread::spawn(move || {
        listen_for_workers(mailbox, broadcaster, listener_incumbent, nb_workers, n)
    });
    endpoint.barrier_wait();
    match listener.join() {
        Ok(result) => result?,
        Err(_) => return Err(CommError::Protocol("coordinator listener panicked".to_string())),
    }

    let best = incumbent.best();
    Ok(CoordinatorReport {
        nb_colors: incumbent.current(),
        best,
        serial,
        frontier_size,
    })
}

/** listener thread of rank 0: receives until every worker sent `Done`.
Improvements are recorded and rebroadcast; stale ones are dropped silently
(an expected race with another worker's earlier improvement). Once the last
`Done` is in, the terminate sentinel releases every worker listener. */
fn listen_for_workers(
    mailbox: Mailbox,
    broadcaster: BoundBroadcaster,
    incumbent: Arc<Incumbent>,
    nb_workers: usize,
    n: usize,
) -> Result<(), CommError> {
    let mut nb_done = 0;
    while nb_done < nb_workers {
        let envelope = mailbox.recv()?;
        match envelope.tag {
            Tag::Done => {
                nb_done += 1;
                log::debug!("worker {} done ({}/{})", envelope.src, nb_done, nb_workers);
            }
            Tag::Solution => {
                let node = PartialColoring::from_words(n, &envelope.words)?;
                if let Some(new_bound) = incumbent.offer(node) {
                    log::info!("worker {} improved the bound to {}", envelope.src, new_bound);
                    broadcaster.broadcast(new_bound)?;
                }
            }
            other => {
                return Err(CommError::Protocol(format!(
                    "coordinator received tag {:?} from rank {}", other, envelope.src
                )));
            }
        }
    }
    broadcaster.broadcast(TERMINATE)
}
