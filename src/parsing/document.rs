use scraper::{ElementRef, Html};

/// Heading text that opens the availability part of a detail page
const AVAILABILITY_HEADING: &str = "availability";

/// Elements that follow the "Availability" heading, in document order.
///
/// Positions in this view are the ordering used to decide whether one
/// heading comes before another.
pub struct AvailabilitySection<'a> {
    following: Vec<ElementRef<'a>>,
}

impl<'a> AvailabilitySection<'a> {
    /// Find the first `h2` mentioning availability; `None` if the page has none
    pub fn locate(document: &'a Html) -> Option<Self> {
        let mut elements = document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap);

        elements.by_ref().find(|el| {
            el.value().name() == "h2" && text_of(*el).to_lowercase().contains(AVAILABILITY_HEADING)
        })?;

        Some(Self {
            following: elements.collect(),
        })
    }

    /// First element with the given tag after the heading
    pub fn first(&self, tag: &str) -> Option<ElementRef<'a>> {
        self.following
            .iter()
            .copied()
            .find(|el| el.value().name() == tag)
    }

    /// Every element with the given tag, paired with its position
    pub fn positioned(&self, tag: &str) -> Vec<(usize, ElementRef<'a>)> {
        self.following
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, el)| el.value().name() == tag)
            .collect()
    }

    /// Every element with the given tag carrying `class`
    pub fn with_class(&self, tag: &str, class: &str) -> Vec<ElementRef<'a>> {
        self.following
            .iter()
            .copied()
            .filter(|el| el.value().name() == tag && has_class(*el, class))
            .collect()
    }
}

/// Concatenated, trimmed text content
pub fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

pub fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

/// Descendants of `el` with the given tag, in document order
pub fn descendants_named<'a>(el: ElementRef<'a>, tag: &str) -> Vec<ElementRef<'a>> {
    el.descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == tag)
        .collect()
}

/// Next sibling of `el` with the given tag, skipping anything in between
pub fn next_sibling_named<'a>(el: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    el.next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|sibling| sibling.value().name() == tag)
}

/// Closest ancestor of `el` with the given tag
pub fn enclosing<'a>(el: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == tag)
}
