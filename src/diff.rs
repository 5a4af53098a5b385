//! Leasing activity between consecutive snapshots.
//!
//! Suites are matched by suite number only. A suite that keeps its number
//! counts as unchanged even if its other fields moved.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use tracing::info;

use crate::models::{Property, Snapshot};
use crate::store::SnapshotSeries;

/// How a property is recognised as "the same" across two snapshots
pub trait PropertyKey {
    fn key(&self, property: &Property) -> String;
}

/// Identify properties by their listing name
#[derive(Debug, Clone, Copy, Default)]
pub struct ByName;

impl PropertyKey for ByName {
    fn key(&self, property: &Property) -> String {
        property.name.clone()
    }
}

/// A suite that appeared or disappeared, with the area it carried
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteChange {
    pub suite_number: String,
    pub sq_ft: u64,
}

/// Added and removed suites of one property, each sorted by suite number
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyChange {
    /// Identity the two snapshots were matched on
    pub key: String,
    /// Display name, taken from the newer snapshot when present there
    pub property: String,
    pub added: Vec<SuiteChange>,
    pub removed: Vec<SuiteChange>,
}

impl PropertyChange {
    pub fn added_sqft(&self) -> u64 {
        self.added.iter().map(|s| s.sq_ft).sum()
    }

    pub fn removed_sqft(&self) -> u64 {
        self.removed.iter().map(|s| s.sq_ft).sum()
    }

    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    pub fn lines(&self) -> Vec<String> {
        let added = self.added.iter().map(|s| {
            format!("{} suite {} added ({} sq ft)", self.property, s.suite_number, s.sq_ft)
        });
        let removed = self.removed.iter().map(|s| {
            format!("{} suite {} removed ({} sq ft)", self.property, s.suite_number, s.sq_ft)
        });
        added.chain(removed).collect()
    }
}

/// Changes between two consecutive snapshots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Every property present on either date, sorted by key
    pub changes: Vec<PropertyChange>,
    pub added_sqft: u64,
    pub removed_sqft: u64,
}

impl ChangeReport {
    /// Removed minus added area; positive means more area left the market
    /// than came onto it
    pub fn net_change(&self) -> i64 {
        self.removed_sqft as i64 - self.added_sqft as i64
    }

    pub fn change_for(&self, property: &str) -> Option<&PropertyChange> {
        self.changes.iter().find(|c| c.property == property)
    }

    pub fn net_line(&self) -> String {
        format!(
            "Net square footage change: {} sq ft (positive indicates net leased)",
            self.net_change()
        )
    }

    /// Report body: suite lines in property order, then the net change line
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.changes.iter().flat_map(|c| c.lines()).collect();
        lines.push(self.net_line());
        lines
    }
}

/// Key-presence diff over snapshots
#[derive(Debug, Clone, Default)]
pub struct DiffEngine<K = ByName> {
    key: K,
}

impl DiffEngine<ByName> {
    pub fn new() -> Self {
        Self { key: ByName }
    }
}

impl<K: PropertyKey> DiffEngine<K> {
    pub fn with_key(key: K) -> Self {
        Self { key }
    }

    /// One report per adjacent pair of the series, oldest first
    pub fn compare_consecutive(&self, series: &SnapshotSeries) -> Vec<ChangeReport> {
        series
            .pairs()
            .map(|(prev, curr)| {
                info!("Comparing {} to {}", prev.date, curr.date);
                self.compare(prev, curr)
            })
            .collect()
    }

    pub fn compare(&self, prev: &Snapshot, curr: &Snapshot) -> ChangeReport {
        let prev_index = self.index(prev);
        let curr_index = self.index(curr);
        let empty = BTreeMap::new();

        let keys: BTreeSet<&String> = prev_index.keys().chain(curr_index.keys()).collect();
        let changes: Vec<PropertyChange> = keys
            .into_iter()
            .map(|key| {
                let before = prev_index.get(key);
                let after = curr_index.get(key);
                let property = after.or(before).map_or(key.as_str(), |(name, _)| *name);
                let before = before.map_or(&empty, |(_, suites)| suites);
                let after = after.map_or(&empty, |(_, suites)| suites);
                PropertyChange {
                    key: key.clone(),
                    property: property.to_string(),
                    added: difference(after, before),
                    removed: difference(before, after),
                }
            })
            .collect();

        ChangeReport {
            from: prev.date,
            to: curr.date,
            added_sqft: changes.iter().map(PropertyChange::added_sqft).sum(),
            removed_sqft: changes.iter().map(PropertyChange::removed_sqft).sum(),
            changes,
        }
    }

    /// Property key -> (name, suite number -> area). A repeated property key
    /// keeps its last record; a repeated suite number keeps its first.
    fn index<'a>(&self, snapshot: &'a Snapshot) -> BTreeMap<String, (&'a str, SuiteAreas<'a>)> {
        let mut index = BTreeMap::new();
        for property in &snapshot.properties {
            let mut suites = BTreeMap::new();
            for suite in &property.suites {
                suites.entry(suite.suite_number.as_str()).or_insert(suite.sq_ft);
            }
            index.insert(self.key.key(property), (property.name.as_str(), suites));
        }
        index
    }
}

type SuiteAreas<'a> = BTreeMap<&'a str, u64>;

/// Suites in `left` whose number is absent from `right`, sorted by number
fn difference(left: &SuiteAreas<'_>, right: &SuiteAreas<'_>) -> Vec<SuiteChange> {
    left.iter()
        .filter(|(number, _)| !right.contains_key(*number))
        .map(|(number, sq_ft)| SuiteChange {
            suite_number: number.to_string(),
            sq_ft: *sq_ft,
        })
        .collect()
}
