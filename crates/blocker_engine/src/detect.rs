//! Record extraction for the detection observer.
//!
//! Everything here only reads the tree. Whether a record is queued is decided by
//! [`blocker_core::update`] when the resulting `Msg::ScanCompleted` is dispatched.

use std::collections::HashSet;

use blocker_core::{Candidate, Identity, NodeHandle, Record};
use blocker_logging::{blocker_debug, blocker_trace};

use crate::profile::CompiledProfile;
use crate::surface::{Mutation, Surface};

/// Extracts every record in the document. Used once on activation and after rule changes.
pub fn scan_document<S: Surface + ?Sized>(surface: &S, profile: &CompiledProfile) -> Vec<Candidate> {
    let candidates = collect(surface, profile, surface.select(None, &profile.record));
    blocker_debug!("Full scan found {} records", candidates.len());
    candidates
}

/// Extracts the records reachable from inserted subtrees: the enclosing record of each
/// inserted root plus every record inside it.
pub fn scan_changes<S: Surface + ?Sized>(
    surface: &S,
    profile: &CompiledProfile,
    mutations: &[Mutation],
) -> Vec<Candidate> {
    let mut nodes = Vec::new();
    for mutation in mutations {
        let Mutation::Added(root) = *mutation else {
            continue;
        };
        if !surface.is_attached(root) {
            continue;
        }
        nodes.extend(surface.closest(root, &profile.record));
        nodes.extend(surface.select(Some(root), &profile.record));
    }
    collect(surface, profile, nodes)
}

fn collect<S: Surface + ?Sized>(
    surface: &S,
    profile: &CompiledProfile,
    nodes: Vec<NodeHandle>,
) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    nodes
        .into_iter()
        .filter(|node| seen.insert(*node))
        .filter_map(|node| {
            extract_record(surface, profile, node).map(|record| Candidate { node, record })
        })
        .collect()
}

/// Reads one record. Returns `None` when the post has no author name yet.
pub fn extract_record<S: Surface + ?Sized>(
    surface: &S,
    profile: &CompiledProfile,
    node: NodeHandle,
) -> Option<Record> {
    let Some(name_node) = surface
        .select(Some(node), &profile.display_name)
        .into_iter()
        .next()
    else {
        blocker_trace!("Record {:?} has no author name", node);
        return None;
    };

    let display_name = match surface.text(name_node) {
        Ok(text) => text.trim().to_string(),
        Err(err) => {
            blocker_debug!("Skipping record {:?}: {}", node, err);
            return None;
        }
    };

    let body_text = surface
        .select(Some(node), &profile.body_text)
        .into_iter()
        .next()
        .and_then(|body| surface.text(body).ok())
        .map(|text| text.trim().to_string())
        .unwrap_or_default();

    let identity = surface
        .select(Some(name_node), &profile.profile_link)
        .into_iter()
        .filter_map(|link| surface.attr(link, "href").ok().flatten())
        .find_map(|href| Identity::from_profile_href(&href));

    Some(Record {
        identity,
        display_name,
        body_text,
    })
}

/// The newest confirmation surface in the document.
pub fn open_confirmation<S: Surface + ?Sized>(
    surface: &S,
    profile: &CompiledProfile,
) -> Option<NodeHandle> {
    surface
        .select(None, &profile.confirmation_surface)
        .into_iter()
        .last()
}

/// Confirmation surfaces that left the tree: removed roots that are one, and those
/// inside removed subtrees.
pub fn closed_confirmations<S: Surface + ?Sized>(
    surface: &S,
    profile: &CompiledProfile,
    mutations: &[Mutation],
) -> Vec<NodeHandle> {
    let mut sheets = Vec::new();
    for mutation in mutations {
        let Mutation::Removed(root) = *mutation else {
            continue;
        };
        if surface.matches(root, &profile.confirmation_surface) {
            sheets.push(root);
        }
        sheets.extend(surface.select(Some(root), &profile.confirmation_surface));
    }
    sheets
}
