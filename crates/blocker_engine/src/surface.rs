use blocker_core::NodeHandle;
use scraper::Selector;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("unknown node handle {0:?}")]
    UnknownHandle(NodeHandle),
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeHandle),
    #[error("node {0:?} is no longer attached to the document")]
    Detached(NodeHandle),
    #[error("invalid markup: {0}")]
    Markup(String),
}

/// Structural change observed on the tree since the last [`Surface::take_mutations`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Root of a subtree that was inserted.
    Added(NodeHandle),
    /// Root of a subtree that was detached. Its contents stay readable.
    Removed(NodeHandle),
}

/// The external content tree the pipeline observes and interacts with.
///
/// Read methods take `&self`; only interactions and mutation draining need `&mut self`.
pub trait Surface {
    /// Elements matching `selector` below `scope` (the whole document when `None`),
    /// in document order. The scope element itself is not included.
    fn select(&self, scope: Option<NodeHandle>, selector: &Selector) -> Vec<NodeHandle>;

    fn matches(&self, node: NodeHandle, selector: &Selector) -> bool;

    /// Closest ancestor-or-self of `node` matching `selector`.
    fn closest(&self, node: NodeHandle, selector: &Selector) -> Option<NodeHandle>;

    /// Concatenated text content of `node`.
    fn text(&self, node: NodeHandle) -> Result<String, SurfaceError>;

    fn attr(&self, node: NodeHandle, name: &str) -> Result<Option<String>, SurfaceError>;

    fn is_attached(&self, node: NodeHandle) -> bool;

    /// Dispatches a synthetic click on `node`.
    fn click(&mut self, node: NodeHandle) -> Result<(), SurfaceError>;

    /// Drains the structural changes recorded since the previous call.
    fn take_mutations(&mut self) -> Vec<Mutation>;
}
