//! DNS resolution module
//!
//! Host lookups go through a run-scoped cache: positive results live for
//! the whole crawl, failures are remembered for a short TTL so broken hosts
//! do not hammer the resolver. Concurrent misses for the same host coalesce
//! onto a single in-flight lookup (singleflight) and all callers share its
//! result. The cache also plugs into reqwest's connection pool, so the
//! transport resolves through the same entries the crawler sees.

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::watch;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// DNS resolution errors
#[derive(Debug, Clone, Error)]
pub enum DnsError {
    #[error("DNS resolution failed for {host}: {message}")]
    Resolution { host: String, message: String },

    #[error("No addresses found for {0}")]
    NoRecords(String),
}

/// Backend that performs real lookups; a seam so tests can count queries
#[async_trait]
pub trait DnsBackend: Send + Sync {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, DnsError>;
}

/// Production backend over the system resolver configuration
pub struct SystemDnsBackend {
    resolver: TokioAsyncResolver,
}

impl SystemDnsBackend {
    pub fn new() -> Self {
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default()),
        }
    }
}

impl Default for SystemDnsBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DnsBackend for SystemDnsBackend {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, DnsError> {
        let lookup = self
            .resolver
            .lookup_ip(host)
            .await
            .map_err(|e| DnsError::Resolution {
                host: host.to_string(),
                message: e.to_string(),
            })?;

        let addrs: Vec<IpAddr> = lookup.iter().collect();
        if addrs.is_empty() {
            return Err(DnsError::NoRecords(host.to_string()));
        }
        Ok(addrs)
    }
}

/// One cache slot per host
enum Entry {
    /// Resolved addresses; valid for the rest of the run
    Ready(Arc<Vec<IpAddr>>),
    /// Remembered failure; suppresses lookups until `expires`
    Negative { error: DnsError, expires: Instant },
    /// A lookup is in flight; waiters subscribe to its completion
    Pending(watch::Receiver<bool>),
}

/// Host-to-address cache with singleflight coalescing
pub struct DnsCache {
    backend: Arc<dyn DnsBackend>,
    cache: Option<Mutex<HashMap<String, Entry>>>,
    negative_ttl: Duration,
}

impl DnsCache {
    /// Creates a cache over the given backend
    ///
    /// With `use_cache` false every call goes straight to the backend,
    /// matching the raw-lookup configuration.
    pub fn new(backend: Arc<dyn DnsBackend>, use_cache: bool, negative_ttl: Duration) -> Self {
        Self {
            backend,
            cache: use_cache.then(|| Mutex::new(HashMap::new())),
            negative_ttl,
        }
    }

    /// Resolves a host, consulting the cache first
    ///
    /// On a miss exactly one caller performs the real lookup; everyone else
    /// waits for that result. Failures are cached for the negative TTL.
    pub async fn resolve(&self, host: &str) -> Result<Arc<Vec<IpAddr>>, DnsError> {
        let Some(cache) = &self.cache else {
            return self.backend.lookup(host).await.map(Arc::new);
        };

        loop {
            enum Role {
                Leader(watch::Sender<bool>),
                Follower(watch::Receiver<bool>),
            }

            let role = {
                let mut map = cache.lock().expect("dns cache lock poisoned");
                match map.get(host) {
                    Some(Entry::Ready(addrs)) => return Ok(addrs.clone()),
                    Some(Entry::Negative { error, expires }) if *expires > Instant::now() => {
                        return Err(error.clone());
                    }
                    Some(Entry::Pending(rx)) => Role::Follower(rx.clone()),
                    // Absent, or an expired negative entry: take leadership
                    _ => {
                        let (tx, rx) = watch::channel(false);
                        map.insert(host.to_string(), Entry::Pending(rx));
                        Role::Leader(tx)
                    }
                }
            };

            match role {
                Role::Leader(tx) => {
                    let result = self.backend.lookup(host).await;

                    let published = {
                        let mut map = cache.lock().expect("dns cache lock poisoned");
                        match result {
                            Ok(addrs) => {
                                let addrs = Arc::new(addrs);
                                map.insert(host.to_string(), Entry::Ready(addrs.clone()));
                                Ok(addrs)
                            }
                            Err(error) => {
                                map.insert(
                                    host.to_string(),
                                    Entry::Negative {
                                        error: error.clone(),
                                        expires: Instant::now() + self.negative_ttl,
                                    },
                                );
                                Err(error)
                            }
                        }
                    };

                    let _ = tx.send(true);
                    return published;
                }
                Role::Follower(mut rx) => {
                    if rx.changed().await.is_err() {
                        // The leader was cancelled before publishing. Clear
                        // its dead slot (unless a new leader already took
                        // over) and contend again.
                        let mut map = cache.lock().expect("dns cache lock poisoned");
                        if let Some(Entry::Pending(stored)) = map.get(host) {
                            if stored.has_changed().is_err() {
                                map.remove(host);
                            }
                        }
                    }
                    // Re-read the cache; the published entry decides our result
                }
            }
        }
    }

    /// Number of settled entries currently cached (best-effort)
    pub fn len(&self) -> usize {
        match &self.cache {
            Some(cache) => cache
                .lock()
                .expect("dns cache lock poisoned")
                .values()
                .filter(|e| !matches!(e, Entry::Pending(_)))
                .count(),
            None => 0,
        }
    }

    /// True if nothing has been cached yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Bridges the cache into reqwest so pooled connections resolve through it
pub struct SharedDns(pub Arc<DnsCache>);

impl reqwest::dns::Resolve for SharedDns {
    fn resolve(&self, name: reqwest::dns::Name) -> reqwest::dns::Resolving {
        let cache = self.0.clone();
        Box::pin(async move {
            let addrs = cache
                .resolve(name.as_str())
                .await
                .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;
            // reqwest swaps in the URL's port
            let socket_addrs: Vec<SocketAddr> =
                addrs.iter().map(|ip| SocketAddr::new(*ip, 0)).collect();
            Ok(Box::new(socket_addrs.into_iter()) as reqwest::dns::Addrs)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend that counts lookups and can be told to fail
    struct CountingBackend {
        calls: AtomicUsize,
        fail: bool,
        delay: Duration,
    }

    impl CountingBackend {
        fn ok() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
                delay: Duration::ZERO,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::ok()
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::ok()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DnsBackend for CountingBackend {
        async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, DnsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(DnsError::NoRecords(host.to_string()));
            }
            Ok(vec![IpAddr::from([93, 184, 216, 34])])
        }
    }

    #[tokio::test]
    async fn test_hit_skips_backend() {
        let backend = Arc::new(CountingBackend::ok());
        let cache = DnsCache::new(backend.clone(), true, Duration::from_secs(30));

        cache.resolve("example.com").await.unwrap();
        cache.resolve("example.com").await.unwrap();

        assert_eq!(backend.calls(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_distinct_hosts_resolved_separately() {
        let backend = Arc::new(CountingBackend::ok());
        let cache = DnsCache::new(backend.clone(), true, Duration::from_secs(30));

        cache.resolve("a.example.com").await.unwrap();
        cache.resolve("b.example.com").await.unwrap();

        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_cache_disabled_does_raw_lookups() {
        let backend = Arc::new(CountingBackend::ok());
        let cache = DnsCache::new(backend.clone(), false, Duration::from_secs(30));

        cache.resolve("example.com").await.unwrap();
        cache.resolve("example.com").await.unwrap();

        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_misses_coalesce() {
        let backend = Arc::new(CountingBackend::slow(Duration::from_millis(50)));
        let cache = Arc::new(DnsCache::new(backend.clone(), true, Duration::from_secs(30)));

        let mut handles = Vec::new();
        for _ in 0..50 {
            let cache = cache.clone();
            handles.push(tokio::spawn(
                async move { cache.resolve("fresh.example.com").await },
            ));
        }

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        assert_eq!(backend.calls(), 1, "misses must collapse to one lookup");
    }

    #[tokio::test]
    async fn test_negative_result_cached() {
        let backend = Arc::new(CountingBackend::failing());
        let cache = DnsCache::new(backend.clone(), true, Duration::from_secs(30));

        assert!(cache.resolve("broken.example.com").await.is_err());
        assert!(cache.resolve("broken.example.com").await.is_err());

        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_expired_negative_retries() {
        let backend = Arc::new(CountingBackend::failing());
        let cache = DnsCache::new(backend.clone(), true, Duration::ZERO);

        assert!(cache.resolve("broken.example.com").await.is_err());
        assert!(cache.resolve("broken.example.com").await.is_err());

        assert_eq!(backend.calls(), 2);
    }
}
