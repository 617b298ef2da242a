//! Minimal `robots.txt` policy: fetched once per job, checked per
//! candidate URL.

use url::Url;

use super::HttpFetcher;

/// Product token robots.txt groups are matched against. We only honor
/// rules for our own token or the wildcard group, not a full
/// multi-crawler robots implementation.
const PRODUCT_TOKEN: &str = "crawlforge";

#[derive(Debug, Clone, Default)]
pub struct RobotsPolicy {
    disallow: Vec<String>,
}

impl RobotsPolicy {
    /// Permissive policy used when the fetch fails or returns non-2xx.
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Fetch and parse `{origin}/robots.txt`. Never errors: any failure
    /// degrades to "no policy".
    pub async fn fetch(origin: &str, fetcher: &HttpFetcher) -> Self {
        let robots_url = format!("{}/robots.txt", origin.trim_end_matches('/'));
        match fetcher.fetch_text(&robots_url).await {
            Ok(body) => Self::parse(&body),
            Err(_) => Self::permissive(),
        }
    }

    fn parse(body: &str) -> Self {
        let mut groups: Vec<(Vec<String>, Vec<String>)> = Vec::new();
        let mut current_agents: Vec<String> = Vec::new();
        let mut current_disallow: Vec<String> = Vec::new();
        let mut in_group = false;

        for raw_line in body.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim().to_string();

            match key.as_str() {
                "user-agent" => {
                    // A user-agent line after rules have started closes the
                    // previous group.
                    if in_group && !current_disallow.is_empty() {
                        groups.push((
                            std::mem::take(&mut current_agents),
                            std::mem::take(&mut current_disallow),
                        ));
                        in_group = false;
                    }
                    current_agents.push(value.to_ascii_lowercase());
                    in_group = true;
                }
                "disallow" => {
                    if !value.is_empty() {
                        current_disallow.push(value);
                    } else {
                        // Empty Disallow means "allow everything" for this
                        // group; no-op.
                    }
                }
                _ => {}
            }
        }
        if !current_agents.is_empty() {
            groups.push((current_agents, current_disallow));
        }

        let mut disallow = Vec::new();
        // Prefer a group that names our token exactly; else fall back to
        // the wildcard group.
        if let Some((_, rules)) = groups
            .iter()
            .find(|(agents, _)| agents.iter().any(|a| a == PRODUCT_TOKEN))
        {
            disallow = rules.clone();
        } else if let Some((_, rules)) = groups.iter().find(|(agents, _)| agents.iter().any(|a| a == "*")) {
            disallow = rules.clone();
        }

        Self { disallow }
    }

    /// True if `url` is forbidden for our fixed User-Agent.
    pub fn is_allowed(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return true;
        };
        let path = parsed.path();
        !self.disallow.iter().any(|rule| path.starts_with(rule.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_disallowed_prefix() {
        let body = "User-agent: *\nDisallow: /private/\n";
        let policy = RobotsPolicy::parse(body);
        assert!(!policy.is_allowed("https://host/private/x"));
        assert!(policy.is_allowed("https://host/public/x"));
    }

    #[test]
    fn empty_disallow_allows_everything() {
        let body = "User-agent: *\nDisallow:\n";
        let policy = RobotsPolicy::parse(body);
        assert!(policy.is_allowed("https://host/anything"));
    }

    #[test]
    fn permissive_allows_everything() {
        let policy = RobotsPolicy::permissive();
        assert!(policy.is_allowed("https://host/anything"));
    }

    #[test]
    fn falls_back_to_wildcard_when_no_named_group() {
        let body = "User-agent: googlebot\nDisallow: /only-google/\nUser-agent: *\nDisallow: /all/\n";
        let policy = RobotsPolicy::parse(body);
        assert!(!policy.is_allowed("https://host/all/x"));
        assert!(policy.is_allowed("https://host/only-google/x"));
    }
}
