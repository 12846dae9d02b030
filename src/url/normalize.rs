use crate::UrlError;
use serde::{Deserialize, Serialize};
use url::Url;

/// Which transforms the canonicalizer applies
///
/// Two raw URLs are duplicates iff their canonical strings under the same
/// policy are byte-equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationPolicy {
    pub strip_fragment: bool,
    pub strip_query: bool,
    pub lowercase: bool,
    pub strip_www: bool,
    pub strip_trailing_slash: bool,
    pub sort_query_params: bool,
}

impl Default for NormalizationPolicy {
    fn default() -> Self {
        Self {
            strip_fragment: true,
            strip_query: false,
            lowercase: true,
            strip_www: true,
            strip_trailing_slash: true,
            sort_query_params: true,
        }
    }
}

impl NormalizationPolicy {
    /// A policy that only parses and re-serializes, used when dedupe is disabled
    pub fn identity() -> Self {
        Self {
            strip_fragment: false,
            strip_query: false,
            lowercase: false,
            strip_www: false,
            strip_trailing_slash: false,
            sort_query_params: false,
        }
    }
}

/// Normalizes a URL into its canonical string form
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if it cannot be parsed as an absolute URL
/// 2. Strip the fragment
/// 3. Strip the query string
/// 4. If the query is kept, re-encode its parameters sorted by key
///    (stable for repeated keys)
/// 5. Remove a leading `www.` from the host
/// 6. Remove trailing slashes from the path unless the path is exactly `/`
/// 7. Lowercase the entire serialized URL
///
/// Steps 2-7 are each governed by a flag on `policy`. The step order is fixed
/// because duplicate detection compares the resulting strings byte for byte.
///
/// # Arguments
///
/// * `raw` - The URL string to normalize
/// * `policy` - Which transforms to apply
///
/// # Returns
///
/// * `Ok(String)` - Canonical URL string
/// * `Err(UrlError)` - Failed to parse or rewrite the URL
///
/// # Examples
///
/// ```
/// use docmapper::url::{normalize_url, NormalizationPolicy};
///
/// let canonical = normalize_url("https://WWW.Example.com/Docs/#intro", &NormalizationPolicy::default()).unwrap();
/// assert_eq!(canonical, "https://example.com/docs");
/// ```
pub fn normalize_url(raw: &str, policy: &NormalizationPolicy) -> Result<String, UrlError> {
    let mut url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

    if policy.strip_fragment {
        url.set_fragment(None);
    }

    if policy.strip_query {
        url.set_query(None);
    } else if policy.sort_query_params && url.query().is_some() {
        sort_query_params(&mut url);
    }

    if policy.strip_www {
        strip_www_prefix(&mut url)?;
    }

    if policy.strip_trailing_slash {
        strip_trailing_slash(&mut url);
    }

    let serialized = String::from(url);
    if policy.lowercase {
        Ok(serialized.to_lowercase())
    } else {
        Ok(serialized)
    }
}

/// Re-encodes the query with parameters sorted by key
///
/// An empty parameter list removes the `?` entirely.
fn sort_query_params(url: &mut Url) {
    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

    if pairs.is_empty() {
        url.set_query(None);
        return;
    }

    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    url.query_pairs_mut().clear().extend_pairs(pairs);
}

fn strip_www_prefix(url: &mut Url) -> Result<(), UrlError> {
    let stripped = match url.host_str() {
        Some(host) if host.len() > 4 && host[..4].eq_ignore_ascii_case("www.") => {
            host[4..].to_string()
        }
        _ => return Ok(()),
    };

    url.set_host(Some(&stripped))
        .map_err(|e| UrlError::Parse(format!("cannot rewrite host '{}': {}", stripped, e)))
}

fn strip_trailing_slash(url: &mut Url) {
    let path = url.path();
    if path == "/" || !path.ends_with('/') {
        return;
    }

    let trimmed = path.trim_end_matches('/');
    let trimmed = if trimmed.is_empty() { "/" } else { trimmed }.to_string();
    url.set_path(&trimmed);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(raw: &str) -> String {
        normalize_url(raw, &NormalizationPolicy::default()).unwrap()
    }

    #[test]
    fn test_strips_fragment() {
        assert_eq!(
            normalize("https://example.com/page#section"),
            "https://example.com/page"
        );
    }

    #[test]
    fn test_keeps_fragment_when_disabled() {
        let policy = NormalizationPolicy {
            strip_fragment: false,
            ..NormalizationPolicy::default()
        };
        assert_eq!(
            normalize_url("https://example.com/page#Section", &policy).unwrap(),
            "https://example.com/page#section"
        );
    }

    #[test]
    fn test_strips_query_when_enabled() {
        let policy = NormalizationPolicy {
            strip_query: true,
            ..NormalizationPolicy::default()
        };
        assert_eq!(
            normalize_url("https://example.com/page?b=2&a=1", &policy).unwrap(),
            "https://example.com/page"
        );
    }

    #[test]
    fn test_sorts_query_params() {
        assert_eq!(
            normalize("https://example.com/page?z=1&a=2&m=3"),
            "https://example.com/page?a=2&m=3&z=1"
        );
    }

    #[test]
    fn test_query_sort_is_stable_for_repeated_keys() {
        assert_eq!(
            normalize("https://example.com/page?b=1&a=2&b=0"),
            "https://example.com/page?a=2&b=1&b=0"
        );
    }

    #[test]
    fn test_query_order_preserved_without_sorting() {
        let policy = NormalizationPolicy {
            sort_query_params: false,
            ..NormalizationPolicy::default()
        };
        assert_eq!(
            normalize_url("https://example.com/page?z=1&a=2", &policy).unwrap(),
            "https://example.com/page?z=1&a=2"
        );
    }

    #[test]
    fn test_empty_query_removed_when_sorting() {
        assert_eq!(normalize("https://example.com/page?"), "https://example.com/page");
    }

    #[test]
    fn test_strips_www_case_insensitive() {
        assert_eq!(normalize("https://WWW.Example.COM/docs"), "https://example.com/docs");
        assert_eq!(normalize("https://www.example.com/"), "https://example.com/");
    }

    #[test]
    fn test_keeps_www_when_disabled() {
        let policy = NormalizationPolicy {
            strip_www: false,
            ..NormalizationPolicy::default()
        };
        assert_eq!(
            normalize_url("https://www.example.com/", &policy).unwrap(),
            "https://www.example.com/"
        );
    }

    #[test]
    fn test_strips_trailing_slash_except_root() {
        assert_eq!(normalize("https://example.com/docs/"), "https://example.com/docs");
        assert_eq!(normalize("https://example.com/"), "https://example.com/");
        assert_eq!(normalize("https://example.com"), "https://example.com/");
    }

    #[test]
    fn test_lowercases_whole_url() {
        assert_eq!(
            normalize("https://Example.com/Docs/Guide?Key=Value"),
            "https://example.com/docs/guide?key=value"
        );
    }

    #[test]
    fn test_case_preserved_when_disabled() {
        let policy = NormalizationPolicy {
            lowercase: false,
            ..NormalizationPolicy::default()
        };
        assert_eq!(
            normalize_url("https://example.com/Docs/Guide", &policy).unwrap(),
            "https://example.com/Docs/Guide"
        );
    }

    #[test]
    fn test_identity_policy_only_reserializes() {
        assert_eq!(
            normalize_url("https://www.example.com/a/?b=1&a=2#x", &NormalizationPolicy::identity())
                .unwrap(),
            "https://www.example.com/a/?b=1&a=2#x"
        );
    }

    #[test]
    fn test_invalid_url() {
        let policy = NormalizationPolicy::default();
        assert!(matches!(
            normalize_url("not a url", &policy),
            Err(UrlError::Parse(_))
        ));
        assert!(matches!(
            normalize_url("/relative/path", &policy),
            Err(UrlError::Parse(_))
        ));
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "https://WWW.Example.com/Docs/?b=%2F&a=hello world#frag",
            "https://example.com/a//",
            "http://www.example.com:8080/path/to/page/?q=1",
            "https://example.com/",
            "https://example.com/search?q=rust&q=tokio",
        ];

        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {}", input);
        }
    }

    #[test]
    fn test_equivalent_urls_share_canonical_form() {
        assert_eq!(
            normalize("https://example.com/docs/"),
            normalize("https://Example.com/docs/")
        );
        assert_eq!(
            normalize("https://www.example.com/docs#top"),
            normalize("https://example.com/docs/")
        );
    }
}
