//! Rank-based message-passing runtime.
//!
//! Ranks share no mutable state; all traffic flows through tagged mailboxes
//! (point-to-point, any-source receive on the owner side), a one-way
//! root-to-workers bound channel carrying bare integers, and a barrier over
//! all ranks. Senders are clonable and may be used from several threads of
//! the same rank; each receiving half is owned by exactly one thread.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Barrier};

use thiserror::Error;

/// rank of a process within the runtime; rank 0 coordinates
pub type Rank = usize;

/// sentinel broadcast on the bound channel to release worker listeners.
/// Strictly greater than any legal color count, passed by value.
pub const TERMINATE: u32 = u32::MAX;

/// level of threading a messaging runtime provides.
/// The search needs `Multiple`: the main thread and the bound listener of a
/// rank issue communication calls concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ThreadSupport {
    /// only one thread per rank may communicate
    Single,
    /// several threads may communicate, one at a time
    Serialized,
    /// any thread may communicate at any time
    Multiple,
}

/// message kinds exchanged point-to-point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// coordinator to worker: root of the subtree the worker must search
    InitialNode,
    /// coordinator to worker: dummy payload, the worker skips searching
    Idle,
    /// worker to coordinator: improved complete coloring
    Solution,
    /// worker to coordinator: the worker finished its subtree
    Done,
}

/// errors raised by the runtime
#[derive(Debug, Error)]
pub enum CommError {
    /// the runtime cannot provide the threading level the search needs
    #[error("messaging runtime provides thread support {provided:?} but {required:?} is required")]
    ThreadSupport {
        /// level the caller asked for
        required: ThreadSupport,
        /// level the runtime can give
        provided: ThreadSupport,
    },
    /// a payload arrived with an unexpected tag or shape (a coding bug, not a transient fault)
    #[error("protocol violation: {0}")]
    Protocol(String),
    /// a peer endpoint is gone
    #[error("channel to rank {0} closed")]
    Disconnected(Rank),
}

/// a tagged point-to-point message; the payload is a flat word vector
#[derive(Debug, Clone)]
pub struct Envelope {
    /// rank that sent the message
    pub src: Rank,
    /// message kind
    pub tag: Tag,
    /// flat payload (n+2 words for a search node)
    pub words: Vec<u32>,
}

/// receiving half of a rank's mailbox; owned by one thread at a time
#[derive(Debug)]
pub struct Mailbox {
    owner: Rank,
    rx: Receiver<Envelope>,
}

impl Mailbox {
    /// blocking receive of the next envelope, from any source, with any tag
    pub fn recv(&self) -> Result<Envelope, CommError> {
        self.rx.recv().map_err(|_| CommError::Disconnected(self.owner))
    }
}

/// receiving half of the bound channel; owned by a worker's listener thread
#[derive(Debug)]
pub struct BoundReceiver {
    rx: Receiver<u32>,
}

impl BoundReceiver {
    /// blocking receive of the next broadcast value (a bound or [`TERMINATE`])
    pub fn recv(&self) -> Result<u32, CommError> {
        // rank 0 is the only sender on this channel
        self.rx.recv().map_err(|_| CommError::Disconnected(0))
    }
}

/// broadcasting half of the bound channel; owned by the coordinator's listener thread
#[derive(Debug)]
pub struct BoundBroadcaster {
    txs: Vec<(Rank, Sender<u32>)>,
}

impl BoundBroadcaster {
    /// sends `value` to the bound channel of every worker
    pub fn broadcast(&self, value: u32) -> Result<(), CommError> {
        for (rank, tx) in &self.txs {
            tx.send(value).map_err(|_| CommError::Disconnected(*rank))?;
        }
        Ok(())
    }
}

/** per-rank communication handle created by [`Runtime::init_thread`].
The receiving halves can be detached so that a listener thread owns them
while the main thread keeps sending. */
#[derive(Debug)]
pub struct Endpoint {
    rank: Rank,
    size: usize,
    mailbox: Option<Mailbox>,
    peers: Vec<Sender<Envelope>>,
    bound_rx: Option<BoundReceiver>,
    bound_txs: Option<BoundBroadcaster>,
    barrier: Arc<Barrier>,
}

impl Endpoint {
    /// rank of this endpoint
    pub fn rank(&self) -> Rank { self.rank }

    /// number of worker ranks (every rank except the coordinator)
    pub fn nb_workers(&self) -> usize { self.size - 1 }

    /// sends a tagged payload to `dest`
    pub fn send(&self, dest: Rank, tag: Tag, words: Vec<u32>) -> Result<(), CommError> {
        let envelope = Envelope { src: self.rank, tag, words };
        self.peers[dest].send(envelope).map_err(|_| CommError::Disconnected(dest))
    }

    /// blocking receive on the mailbox, from any source, with any tag
    pub fn recv(&self) -> Result<Envelope, CommError> {
        match &self.mailbox {
            Some(mailbox) => mailbox.recv(),
            None => Err(CommError::Protocol(format!(
                "rank {}: mailbox already detached", self.rank
            ))),
        }
    }

    /// detaches the mailbox so that a listener thread can own it
    pub fn take_mailbox(&mut self) -> Option<Mailbox> { self.mailbox.take() }

    /// detaches the bound receiver (present on worker ranks only)
    pub fn take_bound_receiver(&mut self) -> Option<BoundReceiver> { self.bound_rx.take() }

    /// detaches the bound broadcaster (present on rank 0 only)
    pub fn take_bound_broadcaster(&mut self) -> Option<BoundBroadcaster> { self.bound_txs.take() }

    /// blocks until every rank of the runtime reached the barrier
    pub fn barrier_wait(&self) {
        self.barrier.wait();
    }
}

/** the messaging runtime: owns nothing after init, but records the provided
threading level the way an MPI implementation reports it. */
#[derive(Debug)]
pub struct Runtime {
    size: usize,
    provided: ThreadSupport,
}

impl Runtime {
    /// threading level this in-process transport can always give
    const PROVIDED: ThreadSupport = ThreadSupport::Multiple;

    /** initializes a runtime of `size` ranks requesting the threading level
    `required`. Fails with [`CommError::ThreadSupport`] if the transport
    cannot provide it. */
    pub fn init_thread(
        size: usize,
        required: ThreadSupport,
    ) -> Result<(Self, Vec<Endpoint>), CommError> {
        check_thread_support(required, Self::PROVIDED)?;
        if size == 0 {
            return Err(CommError::Protocol("runtime needs at least one rank".to_string()));
        }
        let barrier = Arc::new(Barrier::new(size));
        // one mailbox per rank, every rank holds a sender to every mailbox
        let mut mailboxes = Vec::with_capacity(size);
        let mut peer_txs = Vec::with_capacity(size);
        for rank in 0..size {
            let (tx, rx) = channel::<Envelope>();
            peer_txs.push(tx);
            mailboxes.push(Mailbox { owner: rank, rx });
        }
        // one bound channel per worker, all senders go to rank 0
        let mut bound_txs = Vec::with_capacity(size.saturating_sub(1));
        let mut bound_rxs = Vec::with_capacity(size.saturating_sub(1));
        for rank in 1..size {
            let (tx, rx) = channel::<u32>();
            bound_txs.push((rank, tx));
            bound_rxs.push(BoundReceiver { rx });
        }
        let mut endpoints = Vec::with_capacity(size);
        let mut bound_rx_iter = bound_rxs.into_iter();
        for (rank, mailbox) in mailboxes.into_iter().enumerate() {
            endpoints.push(Endpoint {
                rank,
                size,
                mailbox: Some(mailbox),
                peers: peer_txs.clone(),
                bound_rx: if rank == 0 { None } else { bound_rx_iter.next() },
                bound_txs: if rank == 0 {
                    Some(BoundBroadcaster { txs: bound_txs.clone() })
                } else {
                    None
                },
                barrier: barrier.clone(),
            });
        }
        Ok((Self { size, provided: Self::PROVIDED }, endpoints))
    }

    /// total number of ranks
    pub fn size(&self) -> usize { self.size }

    /// threading level the runtime actually provides
    pub fn provided(&self) -> ThreadSupport { self.provided }
}

/// init-time check mirroring `MPI_Init_thread`: the provided level must reach the required one
fn check_thread_support(
    required: ThreadSupport,
    provided: ThreadSupport,
) -> Result<(), CommError> {
    if provided < required {
        return Err(CommError::ThreadSupport { required, provided });
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_thread_support_levels() {
        assert!(check_thread_support(ThreadSupport::Multiple, ThreadSupport::Multiple).is_ok());
        assert!(check_thread_support(ThreadSupport::Single, ThreadSupport::Multiple).is_ok());
        let err = check_thread_support(ThreadSupport::Multiple, ThreadSupport::Single);
        assert!(matches!(err, Err(CommError::ThreadSupport { .. })));
    }

    #[test]
    fn test_point_to_point_carries_source_and_tag() {
        let (runtime, mut endpoints) = Runtime::init_thread(3, ThreadSupport::Multiple).unwrap();
        assert_eq!(runtime.size(), 3);
        assert_eq!(runtime.provided(), ThreadSupport::Multiple);
        let worker = endpoints.remove(2);
        let root = endpoints.remove(0);
        let handle = thread::spawn(move || {
            worker.send(0, Tag::Solution, vec![1, 2, 3]).unwrap();
            worker.send(0, Tag::Done, vec![]).unwrap();
        });
        let first = root.recv().unwrap();
        assert_eq!(first.src, 2);
        assert_eq!(first.tag, Tag::Solution);
        assert_eq!(first.words, vec![1, 2, 3]);
        let second = root.recv().unwrap();
        assert_eq!(second.tag, Tag::Done);
        handle.join().unwrap();
    }

    #[test]
    fn test_bound_broadcast_reaches_every_worker() {
        let (_rt, mut endpoints) = Runtime::init_thread(3, ThreadSupport::Multiple).unwrap();
        let mut root = endpoints.remove(0);
        let broadcaster = root.take_bound_broadcaster().unwrap();
        broadcaster.broadcast(4).unwrap();
        broadcaster.broadcast(TERMINATE).unwrap();
        for endpoint in endpoints.iter_mut() {
            let rx = endpoint.take_bound_receiver().unwrap();
            assert_eq!(rx.recv().unwrap(), 4);
            assert_eq!(rx.recv().unwrap(), TERMINATE);
        }
    }

    #[test]
    fn test_only_workers_listen_for_bounds() {
        let (_rt, mut endpoints) = Runtime::init_thread(2, ThreadSupport::Multiple).unwrap();
        assert!(endpoints[0].take_bound_receiver().is_none());
        assert!(endpoints[0].take_bound_broadcaster().is_some());
        assert!(endpoints[1].take_bound_receiver().is_some());
        assert!(endpoints[1].take_bound_broadcaster().is_none());
    }

    #[test]
    fn test_barrier_releases_all_ranks() {
        let (_rt, endpoints) = Runtime::init_thread(4, ThreadSupport::Multiple).unwrap();
        let handles: Vec<_> = endpoints
            .into_iter()
            .map(|endpoint| thread::spawn(move || endpoint.barrier_wait()))
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_detached_mailbox_reports_protocol_violation() {
        let (_rt, mut endpoints) = Runtime::init_thread(2, ThreadSupport::Multiple).unwrap();
        let endpoint = &mut endpoints[1];
        let _mailbox = endpoint.take_mailbox().unwrap();
        assert!(matches!(endpoint.recv(), Err(CommError::Protocol(_))));
    }
}
