use std::fmt;
use url::Url;

/// Path extensions that are never crawled
const DENIED_EXTENSIONS: &[&str] = &[
    ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".zip", ".tar", ".gz", ".mp4", ".avi", ".mov",
];

/// Path fragments that mark non-content pages
const NON_CONTENT_PATHS: &[&str] = &["/login", "/register", "/api/", "/admin/", "/search"];

/// Bare hrefs longer than this with no path-like characters are treated as garbage
const MAX_BARE_TOKEN_LEN: usize = 10;

/// Why a discovered link was not followed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    DepthExceeded,
    Unparseable,
    Malformed,
    ExternalHost,
    DeniedExtension,
    SamePageAnchor,
    NonContentPath,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::DepthExceeded => "depth limit exceeded",
            Self::Unparseable => "cannot be resolved",
            Self::Malformed => "malformed reference",
            Self::ExternalHost => "outside the crawl domain",
            Self::DeniedExtension => "binary or media file",
            Self::SamePageAnchor => "same-page anchor",
            Self::NonContentPath => "non-content path",
        };
        f.write_str(reason)
    }
}

/// Decides whether a discovered link is eligible to be queued
///
/// The policy is stateless: every decision depends only on the link, the page
/// it was found on and the depth bound.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkPolicy;

impl LinkPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Returns true if `link`, found on `origin`, should be followed
    pub fn should_follow(
        &self,
        link: &str,
        origin: &Url,
        current_depth: usize,
        max_depth: usize,
    ) -> bool {
        self.evaluate(link, origin, current_depth, max_depth).is_ok()
    }

    /// Resolves `link` against `origin` and applies every admission rule
    ///
    /// # Arguments
    ///
    /// * `link` - The raw `href` value as found in the page
    /// * `origin` - URL of the page the link was found on
    /// * `current_depth` - Depth the link would be fetched at
    /// * `max_depth` - Configured depth bound
    ///
    /// # Returns
    ///
    /// * `Ok(Url)` - The resolved absolute URL
    /// * `Err(Rejection)` - The first rule that rejected the link
    pub fn evaluate(
        &self,
        link: &str,
        origin: &Url,
        current_depth: usize,
        max_depth: usize,
    ) -> Result<Url, Rejection> {
        if current_depth > max_depth {
            return Err(Rejection::DepthExceeded);
        }

        let link = link.trim();
        let absolute = Url::parse(link).ok();

        if is_malformed(link, absolute.as_ref()) {
            return Err(Rejection::Malformed);
        }

        let resolved = origin.join(link).map_err(|_| Rejection::Unparseable)?;

        if resolved.host_str() != origin.host_str()
            || resolved.port_or_known_default() != origin.port_or_known_default()
        {
            return Err(Rejection::ExternalHost);
        }

        let path = resolved.path().to_lowercase();
        if DENIED_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            return Err(Rejection::DeniedExtension);
        }

        let has_fragment = resolved.fragment().is_some_and(|f| !f.is_empty());
        if has_fragment && resolved.path() == origin.path() {
            return Err(Rejection::SamePageAnchor);
        }

        if NON_CONTENT_PATHS
            .iter()
            .any(|segment| resolved.path().contains(segment))
        {
            return Err(Rejection::NonContentPath);
        }

        tracing::trace!("Admitted link {} -> {}", link, resolved);
        Ok(resolved)
    }
}

/// Heuristic guard against garbage hrefs
///
/// An absolute reference must carry an http(s) scheme and a host. A relative
/// reference must not contain `://`, and a bare token with no path markers
/// must be short enough to plausibly be a file name.
fn is_malformed(link: &str, absolute: Option<&Url>) -> bool {
    if let Some(url) = absolute {
        return url.host_str().is_none() || !matches!(url.scheme(), "http" | "https");
    }

    if link.contains("://") {
        return true;
    }

    let is_bare_token = !link.starts_with('/')
        && !link.starts_with('#')
        && !link.starts_with('?')
        && !link.contains('.')
        && !link.contains('/');

    is_bare_token && link.len() > MAX_BARE_TOKEN_LEN
}
