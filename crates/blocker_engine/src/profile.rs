use scraper::Selector;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::locate::{Locator, LocatorChain};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("invalid selector for {field}: {selector:?}: {message}")]
    InvalidSelector {
        field: &'static str,
        selector: String,
        message: String,
    },
    #[error("no selectors configured for {0}")]
    EmptyChain(&'static str),
    #[error("no block labels configured")]
    NoLabels,
}

/// Selectors and label tokens describing where things live in the feed's markup.
///
/// The defaults describe the live feed. Everything can be overridden from the runner
/// config when the site changes its markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceProfile {
    /// Container of one post.
    pub record: String,
    /// Author name element inside a post; also holds the profile link.
    pub display_name: String,
    pub body_text: String,
    pub profile_link: String,
    /// "More actions" affordance inside a post, tried in order.
    pub more_actions: Vec<String>,
    pub menu_item: String,
    /// Structural fallback for the block menu item, used when no label matches.
    pub block_item: String,
    /// Dialog asking to confirm the block.
    pub confirmation_surface: String,
    /// Structural fallback for the confirm button.
    pub confirm_control: String,
    /// Anything that can be clicked inside the confirmation surface.
    pub actionable: String,
    /// Label tokens of the block menu item and confirm button, in priority order.
    pub block_labels: Vec<String>,
}

impl Default for SurfaceProfile {
    fn default() -> Self {
        Self {
            record: r#"article[data-testid="tweet"]"#.into(),
            display_name: r#"[data-testid="User-Name"]"#.into(),
            body_text: r#"[data-testid="tweetText"]"#.into(),
            profile_link: r#"a[href*="/"]"#.into(),
            more_actions: vec![
                r#"[data-testid="caret"]"#.into(),
                r#"[aria-label="More"][role="button"]"#.into(),
                r#"button[aria-haspopup="menu"]"#.into(),
            ],
            menu_item: r#"[role="menuitem"]"#.into(),
            block_item: r#"div[role="menuitem"][data-testid="block"]"#.into(),
            confirmation_surface: r#"[data-testid="confirmationSheetDialog"]"#.into(),
            confirm_control: r#"[data-testid="confirmationSheetConfirm"]"#.into(),
            actionable: r#"button, [role="button"]"#.into(),
            block_labels: vec!["Block".into(), "屏蔽".into(), "拉黑".into()],
        }
    }
}

impl SurfaceProfile {
    /// Parses every selector and assembles the locator chains used by the pipeline.
    pub fn compile(&self) -> Result<CompiledProfile, ProfileError> {
        let labels: Vec<String> = self
            .block_labels
            .iter()
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty())
            .collect();
        if labels.is_empty() {
            return Err(ProfileError::NoLabels);
        }
        if self.more_actions.is_empty() {
            return Err(ProfileError::EmptyChain("more_actions"));
        }

        let more_actions = self
            .more_actions
            .iter()
            .map(|css| parse("more_actions", css).map(Locator::Css))
            .collect::<Result<Vec<_>, _>>()?;

        let menu_item = parse("menu_item", &self.menu_item)?;
        let block_item = parse("block_item", &self.block_item)?;
        let confirmation_surface = parse("confirmation_surface", &self.confirmation_surface)?;
        let actionable = parse("actionable", &self.actionable)?;
        let confirm_control = parse("confirm_control", &self.confirm_control)?;

        Ok(CompiledProfile {
            record: parse("record", &self.record)?,
            display_name: parse("display_name", &self.display_name)?,
            body_text: parse("body_text", &self.body_text)?,
            profile_link: parse("profile_link", &self.profile_link)?,
            more_actions: LocatorChain::new(more_actions),
            block_option: LocatorChain::new(vec![
                Locator::Labelled {
                    within: None,
                    candidates: menu_item,
                    labels: labels.clone(),
                },
                Locator::Css(block_item),
            ]),
            confirm_control: LocatorChain::new(vec![
                Locator::Labelled {
                    within: Some(confirmation_surface.clone()),
                    candidates: actionable.clone(),
                    labels,
                },
                Locator::LastWithin {
                    within: confirmation_surface.clone(),
                    candidates: actionable,
                },
                Locator::Css(confirm_control),
            ]),
            confirmation_surface,
        })
    }
}

fn parse(field: &'static str, css: &str) -> Result<Selector, ProfileError> {
    Selector::parse(css).map_err(|err| ProfileError::InvalidSelector {
        field,
        selector: css.to_string(),
        message: err.to_string(),
    })
}

/// A [`SurfaceProfile`] with every selector parsed.
#[derive(Debug, Clone)]
pub struct CompiledProfile {
    pub record: Selector,
    pub display_name: Selector,
    pub body_text: Selector,
    pub profile_link: Selector,
    pub confirmation_surface: Selector,
    pub more_actions: LocatorChain,
    pub block_option: LocatorChain,
    pub confirm_control: LocatorChain,
}

impl CompiledProfile {
    pub fn live_feed() -> Result<Self, ProfileError> {
        SurfaceProfile::default().compile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_compiles() {
        let compiled = CompiledProfile::live_feed().unwrap();
        assert_eq!(compiled.more_actions.len(), 3);
        assert_eq!(compiled.block_option.len(), 2);
        assert_eq!(compiled.confirm_control.len(), 3);
    }

    #[test]
    fn bad_selector_names_the_field() {
        let profile = SurfaceProfile {
            menu_item: "[role=".into(),
            ..SurfaceProfile::default()
        };
        match profile.compile() {
            Err(ProfileError::InvalidSelector { field, selector, .. }) => {
                assert_eq!(field, "menu_item");
                assert_eq!(selector, "[role=");
            }
            other => panic!("expected selector error, got {other:?}"),
        }
    }

    #[test]
    fn blank_labels_are_rejected() {
        let profile = SurfaceProfile {
            block_labels: vec!["  ".into()],
            ..SurfaceProfile::default()
        };
        assert_eq!(profile.compile().unwrap_err(), ProfileError::NoLabels);
    }
}
