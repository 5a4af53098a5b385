use std::collections::HashSet;

use tracing::{info, warn};

use crate::models::{Property, PropertySummary, SkippedProperty, Suite};
use crate::parsing::{extract_suites, Extraction};

/// Assembles a [`Property`] from its listing summary and extracted suites
pub struct PropertyBuilder {
    summary: PropertySummary,
}

impl PropertyBuilder {
    pub fn new(summary: PropertySummary) -> Self {
        Self { summary }
    }

    pub fn name(&self) -> &str {
        &self.summary.name
    }

    pub fn link(&self) -> &str {
        &self.summary.link
    }

    /// Properties the listing reports as fully leased never get a detail fetch
    pub fn needs_extraction(&self) -> bool {
        self.summary.available_suites > 0
    }

    /// Extract suites from a rendered detail page and build the record
    pub fn extract_page(self, html: &str) -> Property {
        let extraction = extract_suites(html);
        self.with_extraction(extraction)
    }

    pub fn with_extraction(self, extraction: Extraction) -> Property {
        if extraction.strategy.is_none() {
            warn!("No availability section found for {}", self.summary.name);
        }
        self.with_suites(extraction.suites)
    }

    /// Build the record, reporting any disagreement with the listing.
    /// Suite numbers are unique per property; later copies of a number are
    /// dropped.
    pub fn with_suites(self, mut suites: Vec<Suite>) -> Property {
        let mut seen = HashSet::new();
        suites.retain(|suite| {
            let first = seen.insert(suite.suite_number.clone());
            if !first {
                warn!(
                    "Duplicate suite {} for {} ({} sq ft), keeping the first",
                    suite.suite_number, self.summary.name, suite.sq_ft
                );
            }
            first
        });

        let declared = self.summary.available_suites;
        let found = suites.len() as u64;
        if found != declared {
            warn!(
                "Suite count mismatch for {}: listing says {}, found {}",
                self.summary.name, declared, found
            );
        }

        let available_sqft: u64 = suites.iter().map(|s| s.sq_ft).sum();
        if available_sqft == 0 && !suites.is_empty() {
            warn!(
                "Zero available_sqft for {} despite {} suites",
                self.summary.name,
                suites.len()
            );
        }

        info!(
            "Added {} suites for {}, total sqft: {}",
            suites.len(),
            self.summary.name,
            available_sqft
        );
        self.into_property(suites, available_sqft)
    }

    /// Record for a property with nothing available
    pub fn fully_leased(self) -> Property {
        self.into_property(Vec::new(), 0)
    }

    /// Record for a property whose detail page could not be fetched
    pub fn skipped(self, reason: impl Into<String>) -> (Property, SkippedProperty) {
        let skipped = SkippedProperty {
            name: self.summary.name.clone(),
            link: self.summary.link.clone(),
            reason: reason.into(),
        };
        warn!("Skipped {}: {}", skipped.name, skipped.reason);
        (self.into_property(Vec::new(), 0), skipped)
    }

    fn into_property(self, suites: Vec<Suite>, available_sqft: u64) -> Property {
        let PropertySummary {
            name,
            city,
            total_gla,
            available_suites,
            link,
        } = self.summary;

        Property {
            name,
            city,
            total_gla,
            available_suites,
            link,
            available_sqft,
            suites,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(available_suites: u64) -> PropertySummary {
        PropertySummary {
            name: "QRC West".to_string(),
            city: "Toronto".to_string(),
            total_gla: 120_000,
            available_suites,
            link: "https://alliedreit.com/property/qrc-west/".to_string(),
        }
    }

    fn suite(number: &str, sq_ft: u64) -> Suite {
        Suite {
            sq_ft,
            ..Suite::new(number)
        }
    }

    #[test]
    fn test_with_suites_sums_area() {
        let property = PropertyBuilder::new(summary(3))
            .with_suites(vec![suite("100", 1_000), suite("200", 2_500), suite("300", 0)]);
        assert_eq!(property.available_sqft, 3_500);
        assert_eq!(property.suites.len(), 3);
        assert_eq!(property.available_suites, 3);
        assert_eq!(property.total_gla, 120_000);
    }

    #[test]
    fn test_count_mismatch_does_not_alter_output() {
        let property = PropertyBuilder::new(summary(5)).with_suites(vec![suite("100", 700)]);
        assert_eq!(property.available_suites, 5);
        assert_eq!(property.suites.len(), 1);
        assert_eq!(property.available_sqft, 700);
    }

    #[test]
    fn test_zero_declared_suites_skip_extraction() {
        let builder = PropertyBuilder::new(summary(0));
        assert!(!builder.needs_extraction());
        let property = builder.fully_leased();
        assert!(property.suites.is_empty());
        assert_eq!(property.available_sqft, 0);
    }

    #[test]
    fn test_skipped_records_reason() {
        let (property, skipped) = PropertyBuilder::new(summary(2)).skipped("page load timeout");
        assert!(property.suites.is_empty());
        assert_eq!(property.available_sqft, 0);
        assert_eq!(skipped.name, "QRC West");
        assert_eq!(skipped.link, "https://alliedreit.com/property/qrc-west/");
        assert_eq!(skipped.reason, "page load timeout");
    }

    #[test]
    fn test_duplicate_suite_numbers_keep_first() {
        let property = PropertyBuilder::new(summary(2)).with_suites(vec![
            suite("Suite 100", 1_000),
            suite("Suite 200", 500),
            suite("Suite 100", 2_000),
        ]);
        assert_eq!(property.suites.len(), 2);
        assert_eq!(property.suites[0].suite_number, "Suite 100");
        assert_eq!(property.suites[0].sq_ft, 1_000);
        assert_eq!(property.suites[1].suite_number, "Suite 200");
        assert_eq!(property.available_sqft, 1_500);
    }

    #[test]
    fn test_missing_availability_section() {
        let property = PropertyBuilder::new(summary(2))
            .extract_page("<html><body><h2>Overview</h2></body></html>");
        assert!(property.suites.is_empty());
        assert_eq!(property.available_sqft, 0);
    }
}
