use std::sync::Arc;
use std::thread;

use thiserror::Error;

use crate::comm::{CommError, Runtime, ThreadSupport};
use crate::graph::Graph;
use crate::search::bound::{Incumbent, SharedBound};
use crate::search::greedy::greedy_dsatur;
use crate::search::node::PartialColoring;
use crate::search::{coordinator, worker};

/// exit code of the executables when the coordinator solved the instance
/// on its own and no worker ever searched (mirrors the historical abort code)
pub const EXIT_NO_PARALLELISM: i32 = 69;

/// how to run the search
#[derive(Debug, Clone, Copy)]
pub struct SolveConfig {
    /// number of ranks: 1 coordinator + (nb_procs - 1) workers
    pub nb_procs: usize,
    /// seed the upper bound with a greedy DSATUR coloring before searching
    pub greedy_init: bool,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self { nb_procs: 4, greedy_init: false }
    }
}

/// errors surfaced by [`solve`]
#[derive(Debug, Error)]
pub enum SolveError {
    /// the configuration cannot drive the two-phase search
    #[error("invalid configuration: {0}")]
    Config(String),
    /// the messaging runtime failed
    #[error(transparent)]
    Comm(#[from] CommError),
}

/// outcome of a complete search
#[derive(Debug)]
pub struct SolveReport {
    /// the chromatic number of the instance
    pub nb_colors: u32,
    /// an optimal coloring (always present for graphs the search ran on)
    pub coloring: Option<PartialColoring>,
    /// true if the coordinator finished the search alone
    pub serial: bool,
    /// number of subtree roots that were dispatched
    pub frontier_size: usize,
    /// total nodes popped across all workers
    pub explored: u64,
}

/** solves the instance exactly: spawns one thread per rank over the
message-passing runtime, runs the coordinator on the calling thread's scope
and one worker per remaining rank, and joins everything into a report.

Every rank receives its own replica of the graph and its own local bound;
the only cross-rank traffic is the node dispatch, the improvement reports
and the bound broadcasts. With `greedy_init` the (deterministic) DSATUR
bound pre-seeds every rank locally, which only strengthens pruning. */
pub fn solve(graph: Arc<Graph>, config: SolveConfig) -> Result<SolveReport, SolveError> {
    if config.nb_procs < 2 {
        return Err(SolveError::Config(format!(
            "{} ranks requested, the two-phase search needs a coordinator and at least one worker",
            config.nb_procs
        )));
    }
    let n = graph.order();
    // the listener threads issue communication calls concurrently with the
    // search threads, so anything below full thread support is fatal
    let (runtime, endpoints) = Runtime::init_thread(config.nb_procs, ThreadSupport::Multiple)?;
    log::info!(
        "runtime of {} ranks provides {:?} thread support",
        runtime.size(), runtime.provided()
    );

    let incumbent = Arc::new(Incumbent::new(n as u32 + 1));
    if config.greedy_init && n > 0 {
        let seed_coloring = greedy_dsatur(&graph);
        if let Some(seeded) = incumbent.offer(seed_coloring) {
            log::info!("greedy seed: {} colors", seeded);
        }
    }
    let initial_bound = incumbent.current();

    let mut endpoint_iter = endpoints.into_iter();
    let coordinator_endpoint = endpoint_iter
        .next()
        .expect("runtime built no endpoints");

    thread::scope(|scope| {
        let mut worker_handles = Vec::with_capacity(config.nb_procs - 1);
        for endpoint in endpoint_iter {
            let worker_graph = graph.clone();
            let worker_bound = Arc::new(SharedBound::new(initial_bound));
            worker_handles.push(
                scope.spawn(move || worker::run(endpoint, worker_graph, worker_bound)),
            );
        }
        let coordinator_result =
            coordinator::run(coordinator_endpoint, graph.clone(), incumbent.clone());
        let mut explored = 0u64;
        for handle in worker_handles {
            match handle.join() {
                Ok(Ok(report)) => explored += report.explored,
                Ok(Err(comm_error)) => return Err(SolveError::from(comm_error)),
                Err(_) => {
                    return Err(SolveError::Comm(CommError::Protocol(
                        "worker thread panicked".to_string(),
                    )));
                }
            }
        }
        let report = coordinator_result?;
        Ok(SolveReport {
            nb_colors: report.nb_colors,
            coloring: report.best,
            serial: report.serial,
            frontier_size: report.frontier_size,
            explored,
        })
    })
}
