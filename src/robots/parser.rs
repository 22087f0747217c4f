//! Robots.txt rules for a single site
//!
//! Allow/disallow matching is delegated to the robotstxt crate;
//! `Crawl-delay` is not part of its matcher and is read here.

use robotstxt::DefaultMatcher;

/// Parsed robots.txt data
///
/// `None` content means the site has no usable robots.txt, which permits
/// everything.
#[derive(Debug, Clone, Default)]
pub struct ParsedRobots {
    content: Option<String>,
}

impl ParsedRobots {
    /// Wraps raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: Some(content.to_string()),
        }
    }

    /// A permissive rule set, used when robots.txt cannot be fetched
    pub fn allow_all() -> Self {
        Self { content: None }
    }

    /// Checks if a URL is allowed for the given user agent token
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL to check
    /// * `user_agent` - Product token of the crawler (e.g. "shootings-crawler")
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        match self.content.as_deref() {
            None | Some("") => true,
            Some(content) => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(content, user_agent, url)
            }
        }
    }

    /// `Crawl-delay` in seconds for the given user agent token
    ///
    /// A group naming the agent wins over the `*` group.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        let content = self.content.as_deref()?;
        let agent = user_agent.to_lowercase();

        let mut group: Vec<String> = Vec::new();
        let mut group_has_rules = false;
        let mut specific = None;
        let mut wildcard = None;

        for line in content.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match key.trim().to_lowercase().as_str() {
                "user-agent" => {
                    // A user-agent line after rules opens a new group
                    if group_has_rules {
                        group.clear();
                        group_has_rules = false;
                    }
                    group.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    group_has_rules = true;
                    let Ok(delay) = value.parse::<f64>() else {
                        continue;
                    };
                    if group.iter().any(|ua| ua != "*" && agent.contains(ua.as_str())) {
                        specific = Some(delay);
                    } else if group.iter().any(|ua| ua == "*") {
                        wildcard = Some(delay);
                    }
                }
                _ => group_has_rules = true,
            }
        }

        specific.or(wildcard)
    }
}
