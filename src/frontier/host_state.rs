use std::collections::VecDeque;
use std::time::Instant;
use url::Url;

/// Where a host currently sits in the frontier's scheduling structures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    /// Not scheduled: queue empty, at its concurrency cap, or being examined
    Parked,
    /// In the ready deque, eligible for dispatch now
    Ready,
    /// In the delayed heap, waiting out its spacing interval
    Delayed,
}

/// Per-host crawl state
///
/// Created lazily on the first enqueue for a host and never reclaimed
/// during a run; an idle host is a few words.
#[derive(Debug)]
pub(crate) struct HostState {
    /// Pending URLs for this host, strict FIFO
    pub queue: VecDeque<Url>,

    /// Workers currently fetching from this host
    pub in_flight: usize,

    /// No fetch for this host may start before this instant
    pub next_earliest_dispatch: Instant,

    pub slot: Slot,
}

impl HostState {
    pub fn new(now: Instant) -> Self {
        Self {
            queue: VecDeque::new(),
            in_flight: 0,
            next_earliest_dispatch: now,
            slot: Slot::Parked,
        }
    }

    /// True if a fetch for this host may start at `now`
    pub fn admissible(&self, max_per_host: usize, now: Instant) -> bool {
        self.in_flight < max_per_host && now >= self.next_earliest_dispatch
    }
}
