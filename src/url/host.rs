use url::Url;

/// Returns the politeness key for a URL: its lowercased host
///
/// Normalized URLs always carry a domain host, so the fallback is only
/// reachable for URLs built outside the normalizer.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use driftnet::url::host_of;
///
/// let url = Url::parse("https://Example.COM/path").unwrap();
/// assert_eq!(host_of(&url), "example.com");
/// ```
pub fn host_of(url: &Url) -> String {
    url.host_str().unwrap_or("unknown").to_lowercase()
}
