//! Page fetcher & parser.

mod links;
mod parse;
mod robots;

pub use links::{extract_links, extract_links_with_context, LinkContext};
pub use parse::{extract_main_content, extract_title, strip_title_suffix};
pub use robots::RobotsPolicy;

use crate::error::{FetchError, FetchResult};

/// Fixed User-Agent sent with every outbound request, including
/// `robots.txt` fetches.
pub const USER_AGENT: &str = "crawlforge/1.0 (+https://github.com/crawlforge/worker)";

#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .expect("reqwest client config is static and known-valid");
        Self { client }
    }

    /// GET a resource as text. Non-2xx is an error.
    pub async fn fetch_text(&self, url: &str) -> FetchResult<String> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }
        Ok(response.text().await?)
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}
