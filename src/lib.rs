//! Leasing availability tracking for a commercial real-estate portfolio.
//!
//! A scrape run turns the portfolio's listing and detail pages into a dated
//! [`models::Snapshot`]; [`diff::DiffEngine`] compares consecutive snapshots
//! to report suites that came onto or left the market.

pub mod builder;
pub mod diff;
pub mod models;
pub mod parsing;
pub mod scrapers;
pub mod store;
