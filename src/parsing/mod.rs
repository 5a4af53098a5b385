pub mod document;
pub mod extractor;
pub mod listing;
pub mod normalize;

pub use extractor::{extract_suites, Extraction, Strategy};
pub use listing::parse_listing;
