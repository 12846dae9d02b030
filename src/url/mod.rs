//! URL handling module for docmapper
//!
//! This module provides URL canonicalization, the duplicate index built on top
//! of it, and the link admission policy that scopes a crawl to one site.

mod admission;
mod dedup;
mod normalize;

// Re-export main types
pub use admission::{LinkPolicy, Rejection};
pub use dedup::DuplicateIndex;
pub use normalize::{normalize_url, NormalizationPolicy};

use crate::UrlError;
use url::Url;

/// Returns the `host[:port]` key used to compare URLs for scope
///
/// The port is only included when it differs from the scheme's default.
pub fn host_key(url: &Url) -> Result<String, UrlError> {
    let host = url
        .host_str()
        .ok_or_else(|| UrlError::MissingHost(url.to_string()))?;

    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// [`host_key`] with a leading `www.` removed when `strip_www` is set
///
/// Two URLs are on the same site for crawl scoping when their scope keys are equal.
pub fn scope_key(url: &Url, strip_www: bool) -> Result<String, UrlError> {
    let key = host_key(url)?;

    Ok(match key.strip_prefix("www.") {
        Some(apex) if strip_www => apex.to_string(),
        _ => key,
    })
}
