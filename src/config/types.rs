use serde::{Deserialize, Serialize};

use crate::url::NormalizationPolicy;

/// Browser user agents rotated across requests when none are configured
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:89.0) Gecko/20100101 Firefox/89.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:89.0) Gecko/20100101 Firefox/89.0",
    "Mozilla/5.0 (X11; Linux x86_64; rv:89.0) Gecko/20100101 Firefox/89.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/91.0.864.59",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
];

/// Main configuration structure for docmapper
///
/// Every section is optional in the TOML file; missing sections fall back to
/// their defaults so that a crawl can be driven entirely from the command line.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub deduplication: DeduplicationConfig,
    pub quality: QualityConfig,
    pub tree: TreeConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Entry URL of the documentation site; its host bounds the crawl
    #[serde(rename = "root-url")]
    pub root_url: String,

    /// Maximum number of hops from the root URL
    #[serde(rename = "max-depth")]
    pub max_depth: usize,

    /// Number of concurrent fetch workers
    pub concurrency: usize,

    /// Lower bound of the per-request politeness delay (milliseconds)
    #[serde(rename = "min-delay")]
    pub min_delay: u64,

    /// Upper bound of the per-request politeness delay (milliseconds)
    #[serde(rename = "max-delay")]
    pub max_delay: u64,

    #[serde(rename = "respect-robots")]
    pub respect_robots: bool,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            root_url: String::new(),
            max_depth: 5,
            concurrency: 2,
            min_delay: 1000,
            max_delay: 3000,
            respect_robots: true,
            request_timeout: 30,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Agent token matched against robots.txt `User-agent:` groups
    #[serde(rename = "robots-name")]
    pub robots_name: String,

    /// User agents picked at random for each request
    pub agents: Vec<String>,

    /// Proxy URLs used in round-robin order
    pub proxies: Vec<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            robots_name: "docmapper".to_string(),
            agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
            proxies: Vec::new(),
        }
    }
}

/// URL deduplication configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeduplicationConfig {
    pub enabled: bool,
    #[serde(rename = "strip-fragment")]
    pub strip_fragment: bool,
    #[serde(rename = "strip-query")]
    pub strip_query: bool,
    pub lowercase: bool,
    #[serde(rename = "strip-www")]
    pub strip_www: bool,
    #[serde(rename = "strip-trailing-slash")]
    pub strip_trailing_slash: bool,
    #[serde(rename = "sort-query-params")]
    pub sort_query_params: bool,
}

impl Default for DeduplicationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            strip_fragment: true,
            strip_query: false,
            lowercase: true,
            strip_www: true,
            strip_trailing_slash: true,
            sort_query_params: true,
        }
    }
}

impl DeduplicationConfig {
    /// The normalization policy described by this section
    pub fn policy(&self) -> NormalizationPolicy {
        NormalizationPolicy {
            strip_fragment: self.strip_fragment,
            strip_query: self.strip_query,
            lowercase: self.lowercase,
            strip_www: self.strip_www,
            strip_trailing_slash: self.strip_trailing_slash,
            sort_query_params: self.sort_query_params,
        }
    }
}

/// Content quality gating configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    pub enabled: bool,
    #[serde(rename = "min-word-count")]
    pub min_word_count: usize,
    #[serde(rename = "require-title")]
    pub require_title: bool,
    #[serde(rename = "require-content")]
    pub require_content: bool,
    #[serde(rename = "skip-navigation-pages")]
    pub skip_navigation_pages: bool,
    #[serde(rename = "blacklist-patterns")]
    pub blacklist_patterns: Vec<String>,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_word_count: 50,
            require_title: true,
            require_content: true,
            skip_navigation_pages: true,
            blacklist_patterns: vec![
                "404".to_string(),
                "not found".to_string(),
                "error".to_string(),
            ],
        }
    }
}

/// Key used when re-sorting the children of every tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Index,
    Title,
    Url,
    Date,
}

/// Hierarchy assembly configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Emit hierarchical output instead of the flat crawl-order list
    pub enabled: bool,
    #[serde(rename = "fallback-to-root")]
    pub fallback_to_root: bool,
    #[serde(rename = "sort-children")]
    pub sort_children: bool,
    #[serde(rename = "sort-by")]
    pub sort_by: SortKey,
    #[serde(rename = "auto-index")]
    pub auto_index: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            fallback_to_root: true,
            sort_children: false,
            sort_by: SortKey::Index,
            auto_index: true,
        }
    }
}

/// Serialization format of the crawl output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Markdown,
    Text,
    Json,
    Sqlite,
}

/// File layout of the crawl output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputLayout {
    #[default]
    Single,
    PerPage,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving the generated files
    pub directory: String,
    pub format: OutputFormat,
    pub layout: OutputLayout,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "output".to_string(),
            format: OutputFormat::Markdown,
            layout: OutputLayout::Single,
        }
    }
}
