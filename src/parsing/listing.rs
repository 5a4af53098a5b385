use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::{info, warn};

use super::document::text_of;
use super::normalize::{parse_count, parse_leading_number};
use crate::models::PropertySummary;

const SUITES_LABEL: &str = "Suites available:";

static GLA_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d[\d,]*\s*SQ\.\s*FT\.\s*total GLA").unwrap());

static AREA_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d[\d,]*\s*(square feet|SQ\.\s*FT\.)").unwrap());

/// Parse the portfolio listing page into one summary per property card.
///
/// Cards without a name are skipped; every other missing field falls back to
/// an empty string or `0` with a warning.
pub fn parse_listing(html: &str, base_url: &str) -> Vec<PropertySummary> {
    let document = Html::parse_document(html);
    let article_selector = Selector::parse("article.item").unwrap();
    let name_selector = Selector::parse("h2").unwrap();
    let city_selector = Selector::parse("p.paragraph-2.uppercase.bold").unwrap();
    let body_selector = Selector::parse("p.body").unwrap();
    let link_selector = Selector::parse("a[href]").unwrap();

    let articles: Vec<_> = document.select(&article_selector).collect();
    info!("Found {} property articles", articles.len());

    let mut properties = Vec::new();
    for article in articles {
        let Some(name_el) = article.select(&name_selector).next() else {
            warn!("Skipping article: no name found");
            continue;
        };
        let name = text_of(name_el);

        let city = article
            .select(&city_selector)
            .next()
            .map(|el| city_segment(&text_of(el)))
            .unwrap_or_default();
        if city.is_empty() {
            warn!("Empty city for {}", name);
        }

        let bodies: Vec<String> = article.select(&body_selector).map(text_of).collect();

        let mut total_gla = bodies
            .iter()
            .find(|text| GLA_PATTERN.is_match(text))
            .map(|text| parse_leading_number(text))
            .unwrap_or(0);
        if total_gla == 0 {
            if let Some(text) = article.text().find(|text| AREA_PATTERN.is_match(text)) {
                total_gla = parse_leading_number(text);
                info!("Fallback GLA used for {}: {}", name, total_gla);
            }
        }
        if total_gla == 0 {
            warn!("Empty total_gla for {}", name);
        }

        let available_suites = match bodies.iter().find(|text| text.contains(SUITES_LABEL)) {
            Some(text) => parse_count(text, SUITES_LABEL),
            None => {
                warn!("No suite count found for {}", name);
                0
            }
        };

        let link = article
            .select(&link_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(|href| absolute_link(href, base_url))
            .unwrap_or_default();
        if link.is_empty() {
            warn!("Empty link for {}", name);
        }

        properties.push(PropertySummary {
            name,
            city,
            total_gla,
            available_suites,
            link,
        });
    }

    properties
}

/// `"123 Main St, Toronto"` -> `"Toronto"`
fn city_segment(text: &str) -> String {
    text.rsplit(',').next().unwrap_or("").trim().to_string()
}

fn absolute_link(href: &str, base_url: &str) -> String {
    let href = href.trim();
    if href.is_empty() || href.starts_with("http") {
        return href.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if href.starts_with('/') {
        format!("{}{}", base, href)
    } else {
        format!("{}/{}", base, href)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://alliedreit.com";

    #[test]
    fn test_parse_listing_card() {
        let html = r#"
            <article class="item">
              <a href="/property/king-portland-centre/">
                <h2>King Portland Centre</h2>
                <p class="paragraph-2 uppercase bold">620 King St W, Toronto</p>
                <p class="body">345,012 SQ. FT. total GLA</p>
                <p class="body">Suites available: 3</p>
              </a>
            </article>"#;
        let properties = parse_listing(html, BASE);
        assert_eq!(properties.len(), 1);
        let property = &properties[0];
        assert_eq!(property.name, "King Portland Centre");
        assert_eq!(property.city, "Toronto");
        assert_eq!(property.total_gla, 345_012);
        assert_eq!(property.available_suites, 3);
        assert_eq!(
            property.link,
            "https://alliedreit.com/property/king-portland-centre/"
        );
    }

    #[test]
    fn test_parse_listing_fallbacks() {
        let html = r#"
            <article class="item"><p>No name here</p></article>
            <article class="item">
              <h2>The Chambers</h2>
              <p class="paragraph-2 uppercase bold">Ottawa</p>
              <span>Roughly 98,000 square feet</span>
              <a href="https://example.com/chambers">More</a>
            </article>"#;
        let properties = parse_listing(html, BASE);
        assert_eq!(properties.len(), 1);
        let property = &properties[0];
        assert_eq!(property.city, "Ottawa");
        assert_eq!(property.total_gla, 98_000);
        assert_eq!(property.available_suites, 0);
        assert_eq!(property.link, "https://example.com/chambers");
    }

    #[test]
    fn test_absolute_link() {
        assert_eq!(absolute_link("/a/", "https://x.com/"), "https://x.com/a/");
        assert_eq!(absolute_link("a", "https://x.com"), "https://x.com/a");
        assert_eq!(absolute_link("", "https://x.com"), "");
    }
}
