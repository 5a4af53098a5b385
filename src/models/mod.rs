use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Placeholder used for any suite field the source page did not resolve
pub const UNKNOWN: &str = "Unknown";

/// Suite number emitted by template header rows; never a real suite
pub const PLACEHOLDER_SUITE: &str = "Suite #";

/// One leasable unit within a property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Suite {
    pub suite_number: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// `0` means the size could not be resolved
    pub sq_ft: u64,
    pub availability: String,
    pub net_rent: String,
    pub additional_rent: String,
}

impl Suite {
    /// A suite with every descriptive field unresolved
    pub fn new(suite_number: impl Into<String>) -> Self {
        Self {
            suite_number: suite_number.into(),
            kind: UNKNOWN.to_string(),
            sq_ft: 0,
            availability: UNKNOWN.to_string(),
            net_rent: UNKNOWN.to_string(),
            additional_rent: UNKNOWN.to_string(),
        }
    }
}

/// Summary fields read from the portfolio listing page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PropertySummary {
    pub name: String,
    pub city: String,
    pub total_gla: u64,
    /// Suite count declared by the listing, not the extracted one
    pub available_suites: u64,
    pub link: String,
}

/// Core property record as persisted in a snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub city: String,
    pub total_gla: u64,
    pub available_suites: u64,
    pub link: String,
    /// Sum of `sq_ft` over `suites`
    #[serde(default)]
    pub available_sqft: u64,
    #[serde(default)]
    pub suites: Vec<Suite>,
}

/// A property whose detail page could not be extracted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkippedProperty {
    pub name: String,
    pub link: String,
    pub reason: String,
}

/// Full portfolio state captured on one date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    pub date: NaiveDate,
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(rename = "skipped_properties", default)]
    pub skipped: Vec<SkippedProperty>,
}

impl Snapshot {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            properties: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Drop placeholder suites picked up from template rows and recompute totals
    pub fn cleaned(mut self) -> Self {
        for property in &mut self.properties {
            property
                .suites
                .retain(|suite| suite.suite_number != PLACEHOLDER_SUITE);
            property.available_sqft = property.suites.iter().map(|s| s.sq_ft).sum();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suite(number: &str, sq_ft: u64) -> Suite {
        Suite {
            sq_ft,
            ..Suite::new(number)
        }
    }

    #[test]
    fn test_cleaned_drops_placeholder_suites() {
        let mut snapshot = Snapshot::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        snapshot.properties.push(Property {
            name: "King Street".to_string(),
            city: "Toronto".to_string(),
            total_gla: 50_000,
            available_suites: 2,
            link: String::new(),
            available_sqft: 1_500,
            suites: vec![suite(PLACEHOLDER_SUITE, 500), suite("200", 1_000)],
        });

        let cleaned = snapshot.cleaned();
        let property = &cleaned.properties[0];
        assert_eq!(property.suites.len(), 1);
        assert_eq!(property.suites[0].suite_number, "200");
        assert_eq!(property.available_sqft, 1_000);
    }

    #[test]
    fn test_snapshot_json_field_names() {
        let mut snapshot = Snapshot::new(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        snapshot.skipped.push(SkippedProperty {
            name: "A".to_string(),
            link: "https://example.com/a".to_string(),
            reason: "timeout".to_string(),
        });
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["date"], "2024-03-05");
        assert_eq!(value["skipped_properties"][0]["reason"], "timeout");
    }

    #[test]
    fn test_listing_stage_property_defaults() {
        let json = r#"{"name":"A","city":"","total_gla":10,"available_suites":0,"link":""}"#;
        let property: Property = serde_json::from_str(json).unwrap();
        assert_eq!(property.available_sqft, 0);
        assert!(property.suites.is_empty());
    }
}
