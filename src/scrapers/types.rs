use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Parameters for a portfolio scrape run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeParams {
    /// Prefix of the snapshot file names (`<source>_<date>_cleaned.json`)
    pub source: String,
    /// Site root used to absolutize relative property links
    pub base_url: String,
    /// Portfolio listing page
    pub listing_url: String,
    /// Directory snapshots are written to and read from
    pub data_dir: String,
    pub user_agent: String,
    pub headless: bool,
    /// Detail page fetches per property before it is skipped
    pub attempts: u32,
    pub retry_delay: Duration,
    /// Wait after navigation for client-side rendering to finish
    pub settle_delay: Duration,
    /// Scroll-to-bottom passes used to trigger lazy loading
    pub scroll_passes: u32,
    /// Selector of the cookie consent button
    pub consent_selector: String,
    /// Write the `updated` snapshot after every property
    pub save_after_each: bool,
    /// Keep a copy of every rendered detail page here
    pub debug_dir: Option<String>,
}

impl Default for ScrapeParams {
    fn default() -> Self {
        Self {
            source: "allied".to_string(),
            base_url: "https://alliedreit.com".to_string(),
            listing_url: "https://alliedreit.com/properties/".to_string(),
            data_dir: "data".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36".to_string(),
            headless: true,
            attempts: 2,
            retry_delay: Duration::from_secs(5),
            settle_delay: Duration::from_secs(8),
            scroll_passes: 5,
            consent_selector: ".trustarc-acceptall-btn".to_string(),
            save_after_each: true,
            debug_dir: None,
        }
    }
}
