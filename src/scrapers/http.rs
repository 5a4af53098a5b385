use crate::scrapers::traits::PageSource;
use crate::scrapers::types::ScrapeParams;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Page source for server-rendered pages; no JavaScript runs
pub struct HttpPageSource {
    client: Client,
}

impl HttpPageSource {
    pub fn new(params: &ScrapeParams) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(90))
            .user_agent(params.user_agent.as_str())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch(&self, url: &str) -> Result<String> {
        debug!("Fetching URL: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        if !response.status().is_success() {
            warn!("{} returned status: {}", url, response.status());
            anyhow::bail!("Failed to fetch {}: {}", url, response.status());
        }

        let html = response.text().await.context("Failed to read response body")?;
        debug!("Downloaded {} bytes of HTML", html.len());

        Ok(html)
    }

    fn source_name(&self) -> &'static str {
        "HTTP"
    }
}
