pub mod browser;
pub mod http;
pub mod portfolio;
pub mod traits;
pub mod types;

pub use browser::BrowserPageSource;
pub use http::HttpPageSource;
pub use portfolio::PortfolioScraper;
pub use traits::PageSource;
pub use types::ScrapeParams;
