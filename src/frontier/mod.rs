//! Frontier module
//!
//! The frontier owns every not-yet-fetched URL and decides when a worker
//! may start fetching it. Admission for a host requires a free concurrency
//! slot (`in_flight < max_per_host`) and that its spacing instant has
//! passed. Hosts with dispatchable work sit in a round-robin ready deque;
//! hosts waiting out their interval sit in a min-heap keyed by that
//! instant, so `next()` sleeps exactly until the earliest of them (or until
//! an enqueue, release, or close wakes it).
//!
//! `next()` hands out a [`Lease`] alongside each URL. Dropping the lease
//! releases the host slot, so a worker that unwinds mid-fetch cannot leak
//! concurrency. `next()` reports closure only once the frontier is closed,
//! every queue is drained, and every lease is back.

mod host_state;

use crate::dedup::VisitedSet;
use crate::url::host_of;
use host_state::{HostState, Slot};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{watch, Notify};
use url::Url;

/// How a leased fetch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Error,
    Cancelled,
}

struct Inner {
    hosts: HashMap<String, HostState>,
    /// Hosts eligible for dispatch, serviced round-robin
    ready: VecDeque<String>,
    /// Hosts waiting out their spacing interval, earliest first
    delayed: BinaryHeap<Reverse<(Instant, String)>>,
    closed: bool,
    /// URLs queued across all hosts
    queued: usize,
    /// Leases handed out and not yet released
    leases: usize,
}

impl Inner {
    /// No work left and none can appear: every queue empty, every lease back
    fn terminal(&self) -> bool {
        self.queued == 0 && self.leases == 0
    }

    /// Moves a parked host into ready or delayed if it has dispatchable work
    fn schedule_host(&mut self, host: &str, now: Instant, max_per_host: usize) {
        let Some(state) = self.hosts.get_mut(host) else {
            return;
        };
        if state.slot != Slot::Parked
            || state.queue.is_empty()
            || state.in_flight >= max_per_host
        {
            return;
        }

        if now >= state.next_earliest_dispatch {
            state.slot = Slot::Ready;
            self.ready.push_back(host.to_string());
        } else {
            let at = state.next_earliest_dispatch;
            state.slot = Slot::Delayed;
            self.delayed.push(Reverse((at, host.to_string())));
        }
    }

    /// Promotes delayed hosts whose spacing instant has passed
    fn promote_due(&mut self, now: Instant) {
        while let Some(Reverse((at, _))) = self.delayed.peek() {
            if *at > now {
                break;
            }
            let Reverse((_, host)) = self.delayed.pop().expect("peeked entry");
            if let Some(state) = self.hosts.get_mut(&host) {
                if state.slot == Slot::Delayed {
                    state.slot = Slot::Ready;
                    self.ready.push_back(host);
                }
            }
        }
    }
}

struct Shared {
    inner: Mutex<Inner>,
    wake: Notify,
    closed_tx: watch::Sender<bool>,
    visited: VisitedSet,
    max_per_host: usize,
    min_interval: Duration,
}

impl Shared {
    fn release(&self, host: &str, outcome: Outcome) {
        let mut inner = self.inner.lock().expect("frontier lock poisoned");
        let now = Instant::now();

        if let Some(state) = inner.hosts.get_mut(host) {
            debug_assert!(state.in_flight > 0, "release without matching lease");
            state.in_flight = state.in_flight.saturating_sub(1);
            state.next_earliest_dispatch = now + self.min_interval;
        }
        inner.leases = inner.leases.saturating_sub(1);
        inner.schedule_host(host, now, self.max_per_host);
        let terminal = inner.terminal();
        drop(inner);

        tracing::trace!(host, ?outcome, "lease released");
        self.wake.notify_one();
        if terminal {
            self.wake.notify_waiters();
        }
    }
}

/// The right to occupy one of a host's concurrency slots
///
/// Obtained from [`Frontier::next`]; give it back with [`Lease::release`].
/// Dropping an unreleased lease releases it as cancelled, so the slot
/// survives any exit path.
pub struct Lease {
    shared: Arc<Shared>,
    host: String,
    released: bool,
}

impl Lease {
    /// The host this lease occupies a slot on
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the slot and starts the host's next spacing interval
    pub fn release(mut self, outcome: Outcome) {
        self.release_once(outcome);
    }

    fn release_once(&mut self, outcome: Outcome) {
        if !self.released {
            self.released = true;
            self.shared.release(&self.host, outcome);
        }
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.release_once(Outcome::Cancelled);
    }
}

impl std::fmt::Debug for Lease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lease")
            .field("host", &self.host)
            .field("released", &self.released)
            .finish()
    }
}

/// Per-host URL queues with politeness admission
///
/// Cheap to clone; clones share one frontier.
#[derive(Clone)]
pub struct Frontier {
    shared: Arc<Shared>,
}

impl Frontier {
    /// Creates a frontier over the given visited set
    pub fn new(visited: VisitedSet, max_per_host: usize, min_interval: Duration) -> Self {
        let (closed_tx, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    hosts: HashMap::new(),
                    ready: VecDeque::new(),
                    delayed: BinaryHeap::new(),
                    closed: false,
                    queued: 0,
                    leases: 0,
                }),
                wake: Notify::new(),
                closed_tx,
                visited,
                max_per_host,
                min_interval,
            }),
        }
    }

    /// Queues a URL unless it was ever queued before or the frontier is
    /// closed; returns true iff the URL was admitted
    pub fn enqueue(&self, url: Url) -> bool {
        if !self.shared.visited.add_if_absent(&url) {
            return false;
        }

        let host = host_of(&url);
        {
            let mut inner = self.shared.inner.lock().expect("frontier lock poisoned");
            if inner.closed {
                return false;
            }
            let now = Instant::now();
            inner
                .hosts
                .entry(host.clone())
                .or_insert_with(|| HostState::new(now))
                .queue
                .push_back(url);
            inner.queued += 1;
            inner.schedule_host(&host, now, self.shared.max_per_host);
        }

        self.shared.wake.notify_one();
        true
    }

    /// Waits for an admissible URL and leases its host slot
    ///
    /// Returns `None` once the frontier is closed with all queues empty and
    /// all leases released; that is the workers' only exit signal. An open
    /// frontier that runs completely dry (nothing queued, nothing leased)
    /// closes itself, since no worker can ever enqueue again.
    pub async fn next(&self) -> Option<(Url, Lease)> {
        loop {
            let deadline = {
                let mut inner = self.shared.inner.lock().expect("frontier lock poisoned");
                let now = Instant::now();
                inner.promote_due(now);

                if let Some((url, lease)) = self.try_dispatch(&mut inner, now) {
                    let more_ready = !inner.ready.is_empty();
                    drop(inner);
                    if more_ready {
                        self.shared.wake.notify_one();
                    }
                    return Some((url, lease));
                }

                if inner.terminal() {
                    inner.closed = true;
                    drop(inner);
                    self.shared.closed_tx.send_replace(true);
                    // Pass the exit signal along so every parked worker drains
                    self.shared.wake.notify_one();
                    return None;
                }

                inner.delayed.peek().map(|Reverse((at, _))| *at)
            };

            match deadline {
                Some(at) => {
                    tokio::select! {
                        _ = self.shared.wake.notified() => {}
                        _ = tokio::time::sleep_until(at.into()) => {}
                    }
                }
                None => self.shared.wake.notified().await,
            }
        }
    }

    fn try_dispatch(&self, inner: &mut Inner, now: Instant) -> Option<(Url, Lease)> {
        while let Some(host) = inner.ready.pop_front() {
            enum Verdict {
                Park,
                Delay(Instant),
                Dispatch(Url),
            }

            let verdict = {
                let state = inner.hosts.get_mut(&host).expect("ready host must exist");
                state.slot = Slot::Parked;
                if state.queue.is_empty() || state.in_flight >= self.shared.max_per_host {
                    Verdict::Park
                } else if !state.admissible(self.shared.max_per_host, now) {
                    Verdict::Delay(state.next_earliest_dispatch)
                } else {
                    let url = state.queue.pop_front().expect("queue checked non-empty");
                    state.in_flight += 1;
                    // Spacing runs start-to-start; release pushes it out again
                    state.next_earliest_dispatch = now + self.shared.min_interval;
                    Verdict::Dispatch(url)
                }
            };

            match verdict {
                Verdict::Park => continue,
                Verdict::Delay(at) => {
                    if let Some(state) = inner.hosts.get_mut(&host) {
                        state.slot = Slot::Delayed;
                    }
                    inner.delayed.push(Reverse((at, host)));
                }
                Verdict::Dispatch(url) => {
                    inner.queued -= 1;
                    inner.leases += 1;
                    inner.schedule_host(&host, now, self.shared.max_per_host);
                    let lease = Lease {
                        shared: self.shared.clone(),
                        host,
                        released: false,
                    };
                    return Some((url, lease));
                }
            }
        }
        None
    }

    /// Stops admitting URLs; pending `next()` callers drain what remains
    pub fn close(&self) {
        {
            let mut inner = self.shared.inner.lock().expect("frontier lock poisoned");
            if inner.closed {
                return;
            }
            inner.closed = true;
        }
        tracing::debug!("frontier closed");
        self.shared.closed_tx.send_replace(true);
        self.shared.wake.notify_waiters();
        self.shared.wake.notify_one();
    }

    /// Completes once the frontier is closed (by `close()` or self-termination)
    pub async fn wait_closed(&self) {
        let mut rx = self.shared.closed_tx.subscribe();
        // Only errors if the frontier itself is gone
        let _ = rx.wait_for(|closed| *closed).await;
    }

    pub fn is_closed(&self) -> bool {
        self.shared.inner.lock().expect("frontier lock poisoned").closed
    }

    /// URLs queued across all hosts
    pub fn queued_len(&self) -> usize {
        self.shared.inner.lock().expect("frontier lock poisoned").queued
    }

    /// Distinct hosts seen so far
    pub fn host_count(&self) -> usize {
        self.shared
            .inner
            .lock()
            .expect("frontier lock poisoned")
            .hosts
            .len()
    }

    /// Leases currently held by workers
    pub fn outstanding_leases(&self) -> usize {
        self.shared.inner.lock().expect("frontier lock poisoned").leases
    }

    /// Current in-flight count for one host
    pub fn in_flight(&self, host: &str) -> usize {
        self.shared
            .inner
            .lock()
            .expect("frontier lock poisoned")
            .hosts
            .get(host)
            .map(|s| s.in_flight)
            .unwrap_or(0)
    }

    /// URLs ever admitted past deduplication (best-effort)
    pub fn visited_len(&self) -> usize {
        self.shared.visited.len()
    }
}
