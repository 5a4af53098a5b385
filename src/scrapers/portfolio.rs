use crate::builder::PropertyBuilder;
use crate::models::{Property, SkippedProperty, Snapshot};
use crate::parsing::parse_listing;
use crate::scrapers::traits::PageSource;
use crate::scrapers::types::ScrapeParams;
use crate::store::{SnapshotStore, Stage};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Captures a portfolio snapshot: listing page first, then every property
/// with declared availability gets its detail page extracted
pub struct PortfolioScraper<S> {
    source: S,
    params: ScrapeParams,
    store: SnapshotStore,
}

impl<S: PageSource> PortfolioScraper<S> {
    pub fn new(source: S, params: ScrapeParams) -> Self {
        let store = SnapshotStore::new(&params.data_dir, &params.source);
        Self {
            source,
            params,
            store,
        }
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Scrape, clean and persist the snapshot for `date`
    pub async fn run(&self, date: NaiveDate) -> Result<(Snapshot, PathBuf)> {
        let snapshot = self.scrape(date).await?.cleaned();
        let path = self
            .store
            .save(&snapshot, Stage::Cleaned)
            .context("Failed to save cleaned snapshot")?;
        info!("💾 Cleaned snapshot saved to {}", path.display());
        Ok((snapshot, path))
    }

    /// Scrape the portfolio without cleaning
    pub async fn scrape(&self, date: NaiveDate) -> Result<Snapshot> {
        info!(
            "Scraping properties list from {} via {}",
            self.params.listing_url,
            self.source.source_name()
        );
        let listing = self
            .fetch_with_retries(&self.params.listing_url, "properties list")
            .await
            .context("Failed to load listing page")?;

        let summaries = parse_listing(&listing, &self.params.base_url);
        if summaries.is_empty() {
            anyhow::bail!("No properties found on {}", self.params.listing_url);
        }
        info!("Total scraped: {}", summaries.len());

        let mut snapshot = Snapshot::new(date);
        for summary in summaries {
            let builder = PropertyBuilder::new(summary);
            let property = if builder.needs_extraction() {
                self.extract(builder, &mut snapshot.skipped).await
            } else {
                builder.fully_leased()
            };
            let name = property.name.clone();
            snapshot.properties.push(property);

            if self.params.save_after_each {
                let path = self.store.save(&snapshot, Stage::Updated)?;
                debug!("Intermediate snapshot saved to {} after {}", path.display(), name);
            }
        }

        let path = self.store.save(&snapshot, Stage::Updated)?;
        info!(
            "Updated snapshot saved to {} ({} properties, {} skipped)",
            path.display(),
            snapshot.properties.len(),
            snapshot.skipped.len()
        );
        Ok(snapshot)
    }

    async fn extract(
        &self,
        builder: PropertyBuilder,
        skipped: &mut Vec<SkippedProperty>,
    ) -> Property {
        info!("Scraping suites for {} at {}", builder.name(), builder.link());

        match self.fetch_with_retries(builder.link(), builder.name()).await {
            Ok(html) => {
                if let Some(dir) = &self.params.debug_dir {
                    keep_copy(Path::new(dir), builder.name(), &html).await;
                }
                builder.extract_page(&html)
            }
            Err(err) => {
                let (property, record) = builder.skipped(format!("{:#}", err));
                skipped.push(record);
                property
            }
        }
    }

    /// Fetch `url` up to `attempts` times, pausing `retry_delay` in between.
    /// The last error is returned once every attempt has failed.
    async fn fetch_with_retries(&self, url: &str, what: &str) -> Result<String> {
        let attempts = self.params.attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.source.fetch(url).await {
                Ok(html) => return Ok(html),
                Err(err) => {
                    warn!(
                        "Error loading {} (attempt {}/{}): {:#}",
                        what, attempt, attempts, err
                    );
                    if attempt >= attempts {
                        return Err(err);
                    }
                    tokio::time::sleep(self.params.retry_delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Save a rendered page for offline `extract` runs
async fn keep_copy(dir: &Path, name: &str, html: &str) {
    let slug: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let path = dir.join(format!("{}.html", slug));
    let result = async {
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(&path, html).await
    }
    .await;
    if let Err(err) = result {
        warn!("Failed to keep page copy at {}: {}", path.display(), err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    const LISTING: &str = "https://example.com/properties/";

    struct MockPageSource {
        pages: HashMap<String, String>,
        /// Fetches of a url that fail before its page is served
        failures: Mutex<HashMap<String, usize>>,
        fetched: Mutex<Vec<String>>,
    }

    impl MockPageSource {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, html)| (url.to_string(), html.to_string()))
                    .collect(),
                failures: Mutex::new(HashMap::new()),
                fetched: Mutex::new(Vec::new()),
            }
        }

        fn failing_first(self, url: &str, times: usize) -> Self {
            self.failures.lock().unwrap().insert(url.to_string(), times);
            self
        }

        fn fetch_count(&self, url: &str) -> usize {
            self.fetched.lock().unwrap().iter().filter(|u| *u == url).count()
        }
    }

    #[async_trait]
    impl PageSource for MockPageSource {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.fetched.lock().unwrap().push(url.to_string());
            if let Some(remaining) = self.failures.lock().unwrap().get_mut(url) {
                if *remaining > 0 {
                    *remaining -= 1;
                    anyhow::bail!("net::ERR_CONNECTION_RESET");
                }
            }
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("page load timeout"))
        }

        fn source_name(&self) -> &'static str {
            "Mock"
        }
    }

    fn article(name: &str, suites: u32, href: &str) -> String {
        format!(
            r#"<article class="item"><a href="{href}"><h2>{name}</h2>
            <p class="paragraph-2 uppercase bold">Toronto</p>
            <p class="body">100,000 SQ. FT. total GLA</p>
            <p class="body">Suites available: {suites}</p></a></article>"#
        )
    }

    fn params(dir: &Path) -> ScrapeParams {
        ScrapeParams {
            base_url: "https://example.com".to_string(),
            listing_url: LISTING.to_string(),
            data_dir: dir.display().to_string(),
            retry_delay: Duration::ZERO,
            ..ScrapeParams::default()
        }
    }

    #[tokio::test]
    async fn test_scrape_extracts_skips_and_saves() {
        let listing = [
            article("Leased Up", 0, "/property/leased/"),
            article("Open Floors", 2, "/property/open/"),
            article("Broken Page", 1, "/property/broken/"),
        ]
        .concat();
        let detail = r#"<h2>Availability</h2><table>
            <tr><td>101</td><td>Office</td><td>1,000 SF</td><td>Now</td></tr>
            <tr><td>Suite #</td><td>Office</td><td>50 SF</td><td>Now</td></tr>
            </table>"#;

        let dir = tempfile::tempdir().unwrap();
        let source = MockPageSource::new(&[
            (LISTING, listing.as_str()),
            ("https://example.com/property/open/", detail),
        ]);
        let scraper = PortfolioScraper::new(source, params(dir.path()));
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let (snapshot, path) = scraper.run(date).await.unwrap();
        assert!(path.ends_with("allied_2024-06-01_cleaned.json"));
        assert!(scraper
            .store()
            .path_for(date, Stage::Updated)
            .exists());

        assert_eq!(snapshot.properties.len(), 3);
        assert!(snapshot.properties[0].suites.is_empty());
        assert_eq!(scraper.source.fetch_count("https://example.com/property/leased/"), 0);

        let open = snapshot.property("Open Floors").unwrap();
        assert_eq!(open.suites.len(), 1);
        assert_eq!(open.available_sqft, 1_000);

        assert_eq!(scraper.source.fetch_count("https://example.com/property/broken/"), 2);
        assert_eq!(snapshot.skipped.len(), 1);
        assert_eq!(snapshot.skipped[0].name, "Broken Page");
        assert_eq!(snapshot.skipped[0].reason, "page load timeout");

        let reloaded = scraper.store().load_date(date).unwrap();
        assert_eq!(reloaded, snapshot);
    }

    #[tokio::test]
    async fn test_listing_load_is_retried() {
        let listing = article("Open Floors", 0, "/property/open/");
        let dir = tempfile::tempdir().unwrap();
        let source =
            MockPageSource::new(&[(LISTING, listing.as_str())]).failing_first(LISTING, 1);
        let scraper = PortfolioScraper::new(source, params(dir.path()));
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let snapshot = scraper.scrape(date).await.unwrap();
        assert_eq!(scraper.source.fetch_count(LISTING), 2);
        assert_eq!(snapshot.properties.len(), 1);
        assert_eq!(snapshot.properties[0].name, "Open Floors");
    }

    #[tokio::test]
    async fn test_listing_load_gives_up_after_attempts() {
        let listing = article("Open Floors", 0, "/property/open/");
        let dir = tempfile::tempdir().unwrap();
        let source =
            MockPageSource::new(&[(LISTING, listing.as_str())]).failing_first(LISTING, 2);
        let scraper = PortfolioScraper::new(source, params(dir.path()));
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let err = scraper.scrape(date).await.unwrap_err();
        assert_eq!(scraper.source.fetch_count(LISTING), 2);
        assert!(format!("{:#}", err).starts_with("Failed to load listing page"));
    }

    #[tokio::test]
    async fn test_scrape_fails_without_properties() {
        let dir = tempfile::tempdir().unwrap();
        let source = MockPageSource::new(&[(LISTING, "<html><body></body></html>")]);
        let scraper = PortfolioScraper::new(source, params(dir.path()));
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert!(scraper.scrape(date).await.is_err());
    }
}
