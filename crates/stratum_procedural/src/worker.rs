//! # Sharded Worker Pool
//!
//! A fixed set of threads, each draining its own FIFO channel.
//!
//! Every job carries a shard key; jobs with equal keys always land on the
//! same worker, in dispatch order. Keying by region gives each region a
//! single thread that runs all its loads, unloads and evictions strictly
//! in order, which is what makes reference counts and per-key persistence
//! race free without any cross-worker coordination.
//!
//! A job may return a follow-up job. It is queued at the back of the same
//! worker's channel, behind anything dispatched meanwhile.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};

use crate::error::{CacheError, CacheResult};

/// Job handler. Returns an optional follow-up for the same shard.
pub type Handler<J> = Arc<dyn Fn(J) -> Option<J> + Send + Sync>;

enum Message<J> {
    Run(J),
    Stop,
}

/// Counts jobs dispatched but not finished.
#[derive(Default)]
struct InFlight {
    count: Mutex<usize>,
    drained: Condvar,
}

impl InFlight {
    fn begin(&self) {
        *self.count.lock() += 1;
    }

    fn end(&self) {
        let mut count = self.count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.drained.notify_all();
        }
    }

    fn wait(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.drained.wait(&mut count);
        }
    }
}

/// Fixed pool of sharded workers.
pub struct WorkerPool<J: Send + 'static> {
    senders: Vec<Sender<Message<J>>>,
    handles: Vec<JoinHandle<()>>,
    in_flight: Arc<InFlight>,
}

impl<J: Send + 'static> WorkerPool<J> {
    /// Starts `count` workers named `<name>-<i>`.
    ///
    /// # Errors
    ///
    /// [`CacheError::WorkerSpawn`] if a thread cannot be started. Workers
    /// already started are stopped again.
    pub fn spawn(count: usize, name: &str, handler: Handler<J>) -> CacheResult<Self> {
        let in_flight = Arc::new(InFlight::default());
        let mut pool = Self {
            senders: Vec::with_capacity(count),
            handles: Vec::with_capacity(count),
            in_flight,
        };

        for i in 0..count.max(1) {
            let (tx, rx) = unbounded();
            let own = tx.clone();
            let handler = Arc::clone(&handler);
            let in_flight = Arc::clone(&pool.in_flight);
            let handle = thread::Builder::new()
                .name(format!("{name}-{i}"))
                .spawn(move || Self::worker_loop(&rx, &own, &handler, &in_flight))
                .map_err(|e| CacheError::WorkerSpawn(e.to_string()))?;
            pool.senders.push(tx);
            pool.handles.push(handle);
        }
        Ok(pool)
    }

    fn worker_loop(
        rx: &Receiver<Message<J>>,
        own: &Sender<Message<J>>,
        handler: &Handler<J>,
        in_flight: &InFlight,
    ) {
        while let Ok(message) = rx.recv() {
            match message {
                Message::Run(job) => Self::run_job(job, own, handler, in_flight),
                Message::Stop => {
                    // Follow-ups queued behind the stop still run.
                    while let Ok(message) = rx.try_recv() {
                        if let Message::Run(job) = message {
                            Self::run_job(job, own, handler, in_flight);
                        }
                    }
                    break;
                }
            }
        }
    }

    fn run_job(job: J, own: &Sender<Message<J>>, handler: &Handler<J>, in_flight: &InFlight) {
        if let Some(next) = handler(job) {
            in_flight.begin();
            if own.send(Message::Run(next)).is_err() {
                in_flight.end();
            }
        }
        in_flight.end();
    }

    /// Number of workers.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.senders.len()
    }

    /// Worker owning `key`.
    #[must_use]
    pub fn shard<K: Hash>(&self, key: &K) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.senders.len().max(1) as u64) as usize
    }

    /// Queues `job` on the worker owning `key`.
    ///
    /// # Errors
    ///
    /// [`CacheError::ShutDown`] after [`WorkerPool::shutdown`].
    pub fn dispatch<K: Hash>(&self, key: &K, job: J) -> CacheResult<()> {
        let sender = self
            .senders
            .get(self.shard(key))
            .ok_or(CacheError::ShutDown)?;
        self.in_flight.begin();
        sender.send(Message::Run(job)).map_err(|_| {
            self.in_flight.end();
            CacheError::ShutDown
        })
    }

    /// Blocks until every dispatched job, and every follow-up it spawned,
    /// has finished.
    pub fn wait_idle(&self) {
        self.in_flight.wait();
    }

    /// Drains every queue, then stops and joins the workers.
    pub fn shutdown(&mut self) {
        for sender in &self.senders {
            let _ = sender.send(Message::Stop);
        }
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
        self.senders.clear();
    }
}

impl<J: Send + 'static> Drop for WorkerPool<J> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
