use crate::scrapers::traits::PageSource;
use crate::scrapers::types::ScrapeParams;
use anyhow::{Context, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Pause between scroll passes so lazy content can load
const SCROLL_PAUSE: Duration = Duration::from_secs(2);

/// Page source that renders pages in headless Chrome
pub struct BrowserPageSource {
    browser: Browser,
    params: ScrapeParams,
}

impl BrowserPageSource {
    /// Launch the browser used for every subsequent fetch
    pub fn new(params: ScrapeParams) -> Result<Self> {
        info!("Launching headless Chrome...");

        let options = LaunchOptions::default_builder()
            .headless(params.headless)
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;

        Ok(Self { browser, params })
    }

    fn render(browser: &Browser, params: &ScrapeParams, url: &str) -> Result<String> {
        let tab = browser.new_tab().context("Failed to open tab")?;
        closing(
            &tab,
            |tab| Self::load(tab, params, url),
            |tab| {
                if let Err(err) = tab.close(true) {
                    debug!("Failed to close tab for {}: {}", url, err);
                }
            },
        )
    }

    fn load(tab: &Tab, params: &ScrapeParams, url: &str) -> Result<String> {
        tab.set_user_agent(&params.user_agent, None, None)?;

        tab.navigate_to(url)
            .with_context(|| format!("Failed to navigate to {}", url))?;
        tab.wait_until_navigated()
            .with_context(|| format!("Page load timed out for {}", url))?;

        // Accept cookies if present
        let consent = tab.evaluate(
            &format!(
                r#"(() => {{
                    const button = document.querySelector('{}');
                    if (button) {{ button.click(); return true; }}
                    return false;
                }})()"#,
                params.consent_selector
            ),
            false,
        )?;
        match consent.value.and_then(|v| v.as_bool()) {
            Some(true) => debug!("Cookie prompt accepted on {}", url),
            _ => debug!("No cookie prompt on {}", url),
        }

        for _ in 0..params.scroll_passes {
            tab.evaluate("window.scrollTo(0, document.body.scrollHeight);", false)?;
            thread::sleep(SCROLL_PAUSE);
        }

        // Clicking a suite row renders its rent details as an extra row
        tab.evaluate(
            r#"document.querySelectorAll('table tr').forEach(row => {
                try { row.click(); } catch (e) {}
            });"#,
            false,
        )?;

        thread::sleep(params.settle_delay);

        let html = tab.get_content().context("Failed to read page HTML")?;
        debug!("Rendered {} bytes from {}", html.len(), url);
        Ok(html)
    }
}

/// Run `body` on `resource`, then `close` it whether or not `body` failed
fn closing<T, R>(
    resource: &T,
    body: impl FnOnce(&T) -> Result<R>,
    close: impl FnOnce(&T),
) -> Result<R> {
    let result = body(resource);
    close(resource);
    result
}

#[async_trait]
impl PageSource for BrowserPageSource {
    async fn fetch(&self, url: &str) -> Result<String> {
        let browser = self.browser.clone();
        let params = self.params.clone();
        let url = url.to_string();

        tokio::task::spawn_blocking(move || Self::render(&browser, &params, &url))
            .await
            .context("Browser task failed")?
    }

    fn source_name(&self) -> &'static str {
        "Chrome"
    }
}
