//! URL deduplication module
//!
//! The visited set is the crawl's membership oracle: a URL is fetched at
//! most once because enqueueing is gated on `add_if_absent`. Two backends
//! share the contract; the Bloom variant trades a bounded false-positive
//! rate (a never-fetched URL is silently lost) for constant memory. Once
//! `add_if_absent` returns for a URL, every later call for it returns false.

mod bloom;

pub use bloom::BloomFilter;

use std::collections::HashSet;
use std::sync::Mutex;
use url::Url;

/// How many discovered URLs to expect per budgeted page when sizing the
/// Bloom filter
const BLOOM_INFLATION: usize = 4;

/// Membership oracle over normalized URLs
pub enum VisitedSet {
    /// Hash-set backend: no false positives, no false negatives
    Exact(Mutex<HashSet<String>>),
    /// Bloom backend: no false negatives, bounded false-positive rate
    Bloom(Mutex<BloomFilter>),
}

impl VisitedSet {
    /// Creates the exact hash-set variant
    pub fn exact() -> Self {
        Self::Exact(Mutex::new(HashSet::new()))
    }

    /// Creates the approximate variant sized for `max_pages` at the given
    /// false-positive rate, with headroom for links discovered but never
    /// fetched
    pub fn bloom(max_pages: u64, false_positive_rate: f64) -> Self {
        let expected = (max_pages as usize).saturating_mul(BLOOM_INFLATION);
        Self::Bloom(Mutex::new(BloomFilter::with_capacity(
            expected,
            false_positive_rate,
        )))
    }

    /// Atomically tests membership and inserts if absent
    ///
    /// Returns true iff the URL was newly inserted. This is the only
    /// deduplication primitive the enqueue path uses, so there is no
    /// check-then-insert window.
    pub fn add_if_absent(&self, url: &Url) -> bool {
        match self {
            Self::Exact(set) => {
                let mut set = set.lock().expect("visited set lock poisoned");
                set.insert(url.as_str().to_string())
            }
            Self::Bloom(filter) => {
                let mut filter = filter.lock().expect("visited set lock poisoned");
                filter.insert(url.as_str().as_bytes())
            }
        }
    }

    /// Best-effort count of URLs marked so far
    pub fn len(&self) -> usize {
        match self {
            Self::Exact(set) => set.lock().expect("visited set lock poisoned").len(),
            Self::Bloom(filter) => filter.lock().expect("visited set lock poisoned").inserted(),
        }
    }

    /// True if nothing has been marked yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_exact_first_add_succeeds() {
        let visited = VisitedSet::exact();
        assert!(visited.add_if_absent(&url("https://example.com/")));
    }

    #[test]
    fn test_exact_second_add_fails() {
        let visited = VisitedSet::exact();
        assert!(visited.add_if_absent(&url("https://example.com/")));
        assert!(!visited.add_if_absent(&url("https://example.com/")));
    }

    #[test]
    fn test_exact_distinct_urls_independent() {
        let visited = VisitedSet::exact();
        assert!(visited.add_if_absent(&url("https://example.com/a")));
        assert!(visited.add_if_absent(&url("https://example.com/b")));
        assert_eq!(visited.len(), 2);
    }

    #[test]
    fn test_bloom_dedups() {
        let visited = VisitedSet::bloom(1_000, 0.01);
        assert!(visited.add_if_absent(&url("https://example.com/")));
        assert!(!visited.add_if_absent(&url("https://example.com/")));
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_concurrent_add_if_absent_admits_once() {
        use std::sync::Arc;

        let visited = Arc::new(VisitedSet::exact());
        let target = url("https://example.com/contended");

        let mut handles = Vec::new();
        for _ in 0..16 {
            let visited = visited.clone();
            let target = target.clone();
            handles.push(std::thread::spawn(move || visited.add_if_absent(&target)));
        }

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&fresh| fresh)
            .count();
        assert_eq!(admitted, 1);
    }
}
