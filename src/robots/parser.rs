//! Robots.txt parser implementation
//!
//! Per-URL decisions go through the robotstxt crate's matcher. The crawl-start
//! abort decision uses a simpler group scan: the first group naming `*` or the
//! configured agent governs, and a `Disallow: /` in it blocks the whole site.

use robotstxt::DefaultMatcher;

/// Parsed robots.txt data
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
    /// Whether to allow all (true = allow all, false = parse content)
    allow_all: bool,
}

/// One `User-agent:` group and its `Disallow:` values
#[derive(Debug, Default)]
struct Group {
    agents: Vec<String>,
    disallows: Vec<String>,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// This is used when robots.txt cannot be fetched or does not exist.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to check
    /// * `user_agent` - The agent token to match groups against
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.allow_all || self.content.is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }

    /// Returns true if the governing group for `user_agent` contains `Disallow: /`
    ///
    /// Directive names are matched case-insensitively. The governing group is
    /// the first one whose `User-agent:` lines name `*` or a token contained in
    /// `user_agent`.
    pub fn disallows_all(&self, user_agent: &str) -> bool {
        if self.allow_all {
            return false;
        }

        let agent = user_agent.to_lowercase();
        self.groups()
            .into_iter()
            .find(|group| {
                group
                    .agents
                    .iter()
                    .any(|ua| ua == "*" || (!ua.is_empty() && agent.contains(ua.as_str())))
            })
            .is_some_and(|group| group.disallows.iter().any(|path| path == "/"))
    }

    fn groups(&self) -> Vec<Group> {
        let mut groups: Vec<Group> = Vec::new();
        let mut in_rules = true;

        for line in self.content.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            if key == "user-agent" {
                // Consecutive User-agent lines share one group
                if in_rules {
                    groups.push(Group::default());
                    in_rules = false;
                }
                if let Some(group) = groups.last_mut() {
                    group.agents.push(value.to_lowercase());
                }
                continue;
            }

            in_rules = true;
            if key == "disallow" {
                if let Some(group) = groups.last_mut() {
                    group.disallows.push(value.to_string());
                }
            }
        }

        groups
    }
}
