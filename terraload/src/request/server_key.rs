//! Server key derivation.
//!
//! Requests are grouped for per-server throttling by a `host:port` key. URLs
//! without an explicit port get the scheme default: `443` for `https`, `80`
//! for everything else.

use reqwest::Url;

/// Returns true for `data:` and `blob:` URIs, which never touch the network.
pub fn is_data_or_blob_uri(url: &str) -> bool {
    let trimmed = url.trim_start();
    has_scheme(trimmed, "data:") || has_scheme(trimmed, "blob:")
}

fn has_scheme(url: &str, scheme: &str) -> bool {
    url.get(..scheme.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
}

/// Derives the `host:port` key for `url`, resolving relative URLs against `base`.
///
/// A relative URL with no base, or input that cannot be parsed at all, has an
/// empty authority and yields `":80"`, so every request still lands in exactly
/// one per-server bucket.
pub fn derive_server_key(url: &str, base: Option<&Url>) -> String {
    let resolved = match Url::parse(url) {
        Ok(parsed) => Some(parsed),
        Err(_) => base.and_then(|base| base.join(url).ok()),
    };

    let Some(resolved) = resolved else {
        return ":80".to_string();
    };

    let host = resolved.host_str().unwrap_or_default();
    let port = match resolved.port() {
        Some(port) => port,
        None if resolved.scheme() == "https" => 443,
        None => 80,
    };
    format!("{}:{}", host, port)
}
