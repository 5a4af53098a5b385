use anyhow::Result;
use async_trait::async_trait;

/// Something that turns a URL into a fully rendered HTML document.
/// Session handling, consent prompts and lazy loading are its business.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch and render the page at `url`
    async fn fetch(&self, url: &str) -> Result<String>;

    /// Get the name of the page source
    fn source_name(&self) -> &'static str;
}
