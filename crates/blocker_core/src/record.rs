use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Opaque key for a node of the external tree. Issued and interpreted by the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub u64);

/// Canonical account key: the lowercased handle taken from the author's profile link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Canonicalises a raw handle (`@SpamBot`, ` spambot `) into an identity.
    pub fn new(handle: &str) -> Option<Self> {
        let handle = handle.trim().trim_start_matches('@').trim();
        if handle.is_empty() {
            return None;
        }
        Some(Self(handle.to_lowercase()))
    }

    /// Resolves the identity encoded in a profile link such as `/SpamBot` or
    /// `https://x.com/SpamBot`. The last non-empty path segment is the handle.
    pub fn from_profile_href(href: &str) -> Option<Self> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') || href.starts_with('?') {
            return None;
        }
        let url = match Url::parse(href) {
            Ok(url) => url,
            Err(_) => Url::parse("https://feed.invalid/").ok()?.join(href).ok()?,
        };
        let segment = url
            .path_segments()?
            .filter(|segment| !segment.is_empty())
            .last()?
            .to_string();
        Self::new(&segment)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One candidate post extracted from the tree during a scan pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// `None` when the profile link could not be resolved yet.
    pub identity: Option<Identity>,
    pub display_name: String,
    pub body_text: String,
}

/// A record together with the tree node it was extracted from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub node: NodeHandle,
    pub record: Record,
}
