use crate::{UrlError, UrlResult};
use url::{Host, Url};

/// Normalizes a link discovered on a page, resolving it against the page URL
///
/// # Normalization Steps
///
/// 1. Resolve `raw` against `base` if relative; reject if malformed
/// 2. Lowercase scheme and host (guaranteed by the `url` crate on parse)
/// 3. Remove fragment (everything after #)
/// 4. Drop default ports (80 for http, 443 for https)
/// 5. Normalize path: collapse duplicate slashes, remove dot segments,
///    strip trailing slash (except root), empty path becomes /
/// 6. Keep the query string verbatim
///
/// Rejects URLs whose scheme is not http(s), whose host is empty or a raw
/// IP literal, or whose normalized form exceeds `max_len` bytes.
/// Percent-encoded sequences are left intact.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use driftnet::url::normalize;
///
/// let base = Url::parse("https://example.com/a/b").unwrap();
/// let url = normalize(&base, "../c#frag", 2048).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/c");
/// ```
pub fn normalize(base: &Url, raw: &str, max_len: usize) -> UrlResult<Url> {
    let url = base
        .join(raw.trim())
        .map_err(|e| UrlError::Parse(e.to_string()))?;
    finish(url, max_len)
}

/// Normalizes a seed URL, which must already be absolute
pub fn normalize_seed(raw: &str, max_len: usize) -> UrlResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    finish(url, max_len)
}

/// Shared tail of both normalization paths
fn finish(mut url: Url, max_len: usize) -> UrlResult<Url> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    match url.host() {
        None => return Err(UrlError::MissingHost),
        Some(Host::Domain(d)) if d.is_empty() => return Err(UrlError::MissingHost),
        Some(Host::Ipv4(addr)) => return Err(UrlError::IpLiteralHost(addr.to_string())),
        Some(Host::Ipv6(addr)) => return Err(UrlError::IpLiteralHost(addr.to_string())),
        Some(Host::Domain(_)) => {}
    }

    url.set_fragment(None);

    // The url crate already drops scheme-default ports and lowercases the
    // scheme and host; only the path needs manual work.
    let normalized_path = normalize_path(url.path());
    if normalized_path != url.path() {
        url.set_path(&normalized_path);
    }

    let len = url.as_str().len();
    if len > max_len {
        return Err(UrlError::TooLong { len, max: max_len });
    }

    Ok(url)
}

/// Normalizes a URL path: collapses duplicate slashes, resolves dot
/// segments, and strips the trailing slash (except for the root)
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut normalized_segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            // Empty segments come from duplicate slashes
            "" | "." => continue,
            ".." => {
                normalized_segments.pop();
            }
            _ => normalized_segments.push(segment),
        }
    }

    if normalized_segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", normalized_segments.join("/"))
}
