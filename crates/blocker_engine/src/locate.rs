use blocker_core::NodeHandle;
use scraper::Selector;

use crate::surface::Surface;

/// One strategy for finding a control in the tree.
#[derive(Debug, Clone)]
pub enum Locator {
    /// First element matching a structural selector.
    Css(Selector),
    /// First `candidates` element whose trimmed text starts with one of `labels`,
    /// else the first whose text contains one. Labels are tried in order within each
    /// pass, so an earlier label beats an earlier element.
    /// With `within`, only candidates inside matching containers are considered.
    Labelled {
        within: Option<Selector>,
        candidates: Selector,
        labels: Vec<String>,
    },
    /// Last `candidates` element inside the most recent `within` container.
    LastWithin { within: Selector, candidates: Selector },
}

impl Locator {
    pub fn locate<S: Surface + ?Sized>(
        &self,
        surface: &S,
        scope: Option<NodeHandle>,
    ) -> Option<NodeHandle> {
        match self {
            Locator::Css(selector) => surface.select(scope, selector).into_iter().next(),
            Locator::Labelled {
                within,
                candidates,
                labels,
            } => {
                let items: Vec<(NodeHandle, String)> = containers(surface, scope, within.as_ref())
                    .into_iter()
                    .flat_map(|container| surface.select(container, candidates))
                    .filter_map(|item| {
                        surface
                            .text(item)
                            .ok()
                            .map(|text| (item, text.trim().to_string()))
                    })
                    .collect();
                find_labelled(&items, labels, |text, label| text.starts_with(label))
                    .or_else(|| find_labelled(&items, labels, |text, label| text.contains(label)))
            }
            Locator::LastWithin { within, candidates } => surface
                .select(scope, within)
                .into_iter()
                .last()
                .and_then(|container| surface.select(Some(container), candidates).into_iter().last()),
        }
    }
}

fn find_labelled(
    items: &[(NodeHandle, String)],
    labels: &[String],
    accepts: impl Fn(&str, &str) -> bool,
) -> Option<NodeHandle> {
    labels.iter().find_map(|label| {
        items
            .iter()
            .find(|(_, text)| accepts(text.as_str(), label.as_str()))
            .map(|(item, _)| *item)
    })
}

fn containers<S: Surface + ?Sized>(
    surface: &S,
    scope: Option<NodeHandle>,
    within: Option<&Selector>,
) -> Vec<Option<NodeHandle>> {
    match within {
        Some(selector) => surface.select(scope, selector).into_iter().map(Some).collect(),
        None => vec![scope],
    }
}

/// Ordered fallback locators; the first one that finds something wins.
#[derive(Debug, Clone, Default)]
pub struct LocatorChain {
    locators: Vec<Locator>,
}

impl LocatorChain {
    pub fn new(locators: Vec<Locator>) -> Self {
        Self { locators }
    }

    pub fn locate<S: Surface + ?Sized>(
        &self,
        surface: &S,
        scope: Option<NodeHandle>,
    ) -> Option<NodeHandle> {
        self.locators
            .iter()
            .find_map(|locator| locator.locate(surface, scope))
    }

    pub fn len(&self) -> usize {
        self.locators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }
}
