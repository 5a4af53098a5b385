//! Suite extraction from a property detail page.
//!
//! Detail pages lay out their availability in one of several markup shapes.
//! Each shape is a [`Strategy`]; they are tried in [`Strategy::CASCADE`] order
//! and the first one whose anchor is present wins, even when it then yields
//! no suites.

use std::collections::HashMap;

use scraper::{ElementRef, Html};
use tracing::debug;

use super::document::{
    descendants_named, enclosing, has_class, next_sibling_named, text_of, AvailabilitySection,
};
use super::normalize::{normalize_label, or_unknown, parse_area_text, parse_size_token};
use crate::models::Suite;

/// Markup shapes of the availability section, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// A `table` with one row per suite and optional expanded detail rows
    Tabular,
    /// Cards headed by `h3.number`, fields in classed paragraphs
    LabeledCard,
    /// A generic "Suite #" heading followed by groups opened by a "Type" label
    GroupedGeneric,
    /// One `h3` per suite with `h4` label / `p` value pairs underneath
    PerHeading,
}

impl Strategy {
    pub const CASCADE: [Strategy; 4] = [
        Strategy::Tabular,
        Strategy::LabeledCard,
        Strategy::GroupedGeneric,
        Strategy::PerHeading,
    ];

    /// Run this strategy; `None` means its anchor is absent from the section
    pub fn apply(self, section: &AvailabilitySection<'_>) -> Option<Vec<Suite>> {
        match self {
            Strategy::Tabular => tabular(section),
            Strategy::LabeledCard => labeled_card(section),
            Strategy::GroupedGeneric => grouped_generic(section),
            Strategy::PerHeading => Some(per_heading(section)),
        }
    }
}

/// Result of running the cascade over one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// `None` when the page has no availability heading at all
    pub strategy: Option<Strategy>,
    pub suites: Vec<Suite>,
}

impl Extraction {
    pub fn total_sqft(&self) -> u64 {
        self.suites.iter().map(|s| s.sq_ft).sum()
    }
}

/// Parse a rendered detail page and extract its suites
pub fn extract_suites(html: &str) -> Extraction {
    let document = Html::parse_document(html);
    extract_from_document(&document)
}

pub fn extract_from_document(document: &Html) -> Extraction {
    let Some(section) = AvailabilitySection::locate(document) else {
        return Extraction::default();
    };

    for strategy in Strategy::CASCADE {
        if let Some(suites) = strategy.apply(&section) {
            debug!(?strategy, suites = suites.len(), "Availability strategy selected");
            return Extraction {
                strategy: Some(strategy),
                suites,
            };
        }
    }

    Extraction::default()
}

fn tabular(section: &AvailabilitySection<'_>) -> Option<Vec<Suite>> {
    let table = section.first("table")?;
    let rows = descendants_named(table, "tr");
    let mut suites = Vec::new();

    let mut i = 0;
    while i < rows.len() {
        let cells = descendants_named(rows[i], "td");
        i += 1;
        if cells.len() < 4 {
            continue;
        }

        let mut suite = Suite {
            kind: or_unknown(&text_of(cells[1])),
            sq_ft: parse_area_text(&text_of(cells[2])),
            availability: or_unknown(&text_of(cells[3])),
            ..Suite::new(strip_row_marker(&text_of(cells[0])))
        };

        // An expanded row carries the rent details of the row above it
        if let Some(next) = rows.get(i) {
            let detail_cells = descendants_named(*next, "td");
            if detail_cells.len() == 1 {
                apply_detail_cell(&mut suite, detail_cells[0]);
                i += 1;
            }
        }

        if suite.sq_ft > 0 {
            suites.push(suite);
        }
    }

    Some(suites)
}

/// Drop the expand/collapse toggle glyph rendered before the suite number
fn strip_row_marker(text: &str) -> String {
    match text.strip_prefix(['v', '^']) {
        Some(rest) => rest.trim_start().to_string(),
        None => text.to_string(),
    }
}

fn apply_detail_cell(suite: &mut Suite, cell: ElementRef<'_>) {
    let paragraphs = descendants_named(cell, "p");
    for pair in paragraphs.chunks_exact(2) {
        let value = text_of(pair[1]);
        match normalize_label(&text_of(pair[0])).as_str() {
            "net rent" => suite.net_rent = value,
            "additional rent" => suite.additional_rent = value,
            _ => {}
        }
    }
}

fn labeled_card(section: &AvailabilitySection<'_>) -> Option<Vec<Suite>> {
    let headings = section.with_class("h3", "number");
    if headings.is_empty() {
        return None;
    }
    Some(headings.into_iter().map(card_suite).collect())
}

fn card_suite(heading: ElementRef<'_>) -> Suite {
    let mut suite = Suite::new(text_of(heading));
    let Some(card) = enclosing(heading, "div") else {
        return suite;
    };

    let paragraphs = descendants_named(card, "p");
    let by_class = |class: &str| paragraphs.iter().copied().find(|p| has_class(*p, class));
    let by_label = |label: &str| {
        paragraphs
            .iter()
            .copied()
            .find(|p| text_of(*p).to_lowercase().contains(label))
    };

    if let Some(p) = by_class("type") {
        suite.kind = or_unknown(&text_of(p));
    }
    suite.sq_ft = by_class("size")
        .map(|p| parse_size_token(&text_of(p)))
        .unwrap_or(0);
    if let Some(p) = by_class("avail") {
        suite.availability = or_unknown(&text_of(p));
    }
    if let Some(p) = by_class("net")
        .or_else(|| by_class("rent"))
        .or_else(|| by_label("net rent:"))
    {
        suite.net_rent = or_unknown(&text_of(p));
    }
    if let Some(p) = by_class("additional")
        .or_else(|| by_class("additional-rent"))
        .or_else(|| by_label("additional rent:"))
    {
        suite.additional_rent = or_unknown(&text_of(p));
    }

    suite
}

fn grouped_generic(section: &AvailabilitySection<'_>) -> Option<Vec<Suite>> {
    let (_, first_heading) = *section.positioned("h3").first()?;
    if !text_of(first_heading).to_lowercase().contains("suite #") {
        return None;
    }

    let labels = section.positioned("h4");
    let is_type = |h4: ElementRef<'_>| normalize_label(&text_of(h4)) == "type";
    let starts: Vec<usize> = labels
        .iter()
        .enumerate()
        .filter(|(_, (_, h4))| is_type(*h4))
        .map(|(k, _)| k)
        .collect();

    let mut suites = Vec::new();
    for (ordinal, &start) in starts.iter().enumerate() {
        let end = labels[start + 1..]
            .iter()
            .position(|(_, h4)| is_type(*h4))
            .map_or(labels.len(), |offset| start + 1 + offset);
        let details = label_values(labels[start..end].iter().map(|(_, h4)| *h4));
        if let Some(suite) = suite_from_details(format!("Suite {}", ordinal + 1), &details) {
            suites.push(suite);
        }
    }

    Some(suites)
}

fn per_heading(section: &AvailabilitySection<'_>) -> Vec<Suite> {
    let headings = section.positioned("h3");
    let labels = section.positioned("h4");
    let mut suites = Vec::new();

    for (i, (position, heading)) in headings.iter().enumerate() {
        let until = headings.get(i + 1).map_or(usize::MAX, |(next, _)| *next);
        let details = label_values(
            labels
                .iter()
                .filter(|(at, _)| *at > *position && *at < until)
                .map(|(_, h4)| *h4),
        );
        if let Some(suite) = suite_from_details(text_of(*heading), &details) {
            suites.push(suite);
        }
    }

    suites
}

/// Map each `h4` label to the text of the `p` that follows it
fn label_values<'a>(labels: impl Iterator<Item = ElementRef<'a>>) -> HashMap<String, String> {
    labels
        .map(|h4| {
            let value = next_sibling_named(h4, "p")
                .map(text_of)
                .unwrap_or_default();
            (normalize_label(&text_of(h4)), value)
        })
        .collect()
}

/// Build a suite from label/value pairs; groups without a size label are not suites
fn suite_from_details(suite_number: String, details: &HashMap<String, String>) -> Option<Suite> {
    let size = details.get("size")?;
    let field = |label: &str| or_unknown(details.get(label).map_or("", String::as_str));

    Some(Suite {
        kind: field("type"),
        sq_ft: parse_size_token(size),
        availability: field("availability"),
        net_rent: field("net rent"),
        additional_rent: field("additional rent"),
        suite_number,
    })
}
