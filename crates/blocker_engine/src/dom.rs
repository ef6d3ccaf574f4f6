use std::cell::RefCell;
use std::collections::HashMap;

use blocker_core::NodeHandle;
use ego_tree::{NodeId, NodeRef, Tree};
use scraper::{ElementRef, Html, Node, Selector};

use crate::surface::{Mutation, Surface, SurfaceError};

/// Stable `NodeHandle`s for ego-tree node ids, handed out on first sight.
#[derive(Debug, Default)]
struct HandleRegistry {
    ids: Vec<NodeId>,
    handles: HashMap<NodeId, NodeHandle>,
}

impl HandleRegistry {
    fn handle(&mut self, id: NodeId) -> NodeHandle {
        if let Some(handle) = self.handles.get(&id) {
            return *handle;
        }
        let handle = NodeHandle(self.ids.len() as u64);
        self.ids.push(id);
        self.handles.insert(id, handle);
        handle
    }

    fn id(&self, handle: NodeHandle) -> Option<NodeId> {
        usize::try_from(handle.0)
            .ok()
            .and_then(|index| self.ids.get(index).copied())
    }
}

/// A mutable HTML document backed by scraper's ego-tree.
///
/// Insertions and removals are recorded as [`Mutation`]s; clicks are only logged,
/// since a static document has nothing to react with. See
/// [`crate::RehearsalSurface`] for a document that reacts like the live feed.
#[derive(Debug)]
pub struct HtmlSurface {
    html: Html,
    registry: RefCell<HandleRegistry>,
    mutations: Vec<Mutation>,
    clicks: Vec<NodeHandle>,
}

impl HtmlSurface {
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
            registry: RefCell::new(HandleRegistry::default()),
            mutations: Vec::new(),
            clicks: Vec::new(),
        }
    }

    pub fn body(&self) -> Option<NodeHandle> {
        let selector = Selector::parse("body").ok()?;
        self.select(None, &selector).into_iter().next()
    }

    /// Parses `markup` as a fragment and appends its top-level nodes to `parent`.
    /// Returns the inserted element roots.
    pub fn append_html(
        &mut self,
        parent: NodeHandle,
        markup: &str,
    ) -> Result<Vec<NodeHandle>, SurfaceError> {
        let parent_id = self.attached_id(parent)?;
        let fragment = Html::parse_fragment(markup);

        let mut added = Vec::new();
        for child in fragment.root_element().children() {
            let Some(id) = copy_subtree(&mut self.html.tree, parent_id, child) else {
                return Err(SurfaceError::UnknownHandle(parent));
            };
            if child.value().is_element() {
                let handle = self.handle(id);
                self.mutations.push(Mutation::Added(handle));
                added.push(handle);
            }
        }
        Ok(added)
    }

    /// Detaches `node` and its subtree from the document.
    pub fn remove(&mut self, node: NodeHandle) -> Result<(), SurfaceError> {
        let id = self.attached_id(node)?;
        if let Some(mut target) = self.html.tree.get_mut(id) {
            target.detach();
        }
        self.mutations.push(Mutation::Removed(node));
        Ok(())
    }

    /// Every node clicked so far, oldest first.
    pub fn clicks(&self) -> &[NodeHandle] {
        &self.clicks
    }

    pub fn to_html(&self) -> String {
        self.html.html()
    }

    fn handle(&self, id: NodeId) -> NodeHandle {
        self.registry.borrow_mut().handle(id)
    }

    fn node_id(&self, node: NodeHandle) -> Result<NodeId, SurfaceError> {
        self.registry
            .borrow()
            .id(node)
            .ok_or(SurfaceError::UnknownHandle(node))
    }

    fn node_ref(&self, node: NodeHandle) -> Result<NodeRef<'_, Node>, SurfaceError> {
        let id = self.node_id(node)?;
        self.html
            .tree
            .get(id)
            .ok_or(SurfaceError::UnknownHandle(node))
    }

    fn element(&self, node: NodeHandle) -> Result<ElementRef<'_>, SurfaceError> {
        ElementRef::wrap(self.node_ref(node)?).ok_or(SurfaceError::NotAnElement(node))
    }

    /// ego-tree keeps detached subtrees in storage, so whole-document queries
    /// must check that a node still hangs off the root.
    fn reaches_root(&self, id: NodeId) -> bool {
        let root = self.html.tree.root().id();
        self.html.tree.get(id).is_some_and(|node| {
            node.id() == root || node.ancestors().any(|ancestor| ancestor.id() == root)
        })
    }

    fn attached_id(&self, node: NodeHandle) -> Result<NodeId, SurfaceError> {
        if !self.is_attached(node) {
            return Err(SurfaceError::Detached(node));
        }
        self.node_id(node)
    }
}

fn copy_subtree(tree: &mut Tree<Node>, parent: NodeId, source: NodeRef<'_, Node>) -> Option<NodeId> {
    let id = tree.get_mut(parent)?.append(source.value().clone()).id();
    for child in source.children() {
        copy_subtree(tree, id, child)?;
    }
    Some(id)
}

impl Surface for HtmlSurface {
    fn select(&self, scope: Option<NodeHandle>, selector: &Selector) -> Vec<NodeHandle> {
        match scope {
            None => self
                .html
                .select(selector)
                .filter(|element| self.reaches_root(element.id()))
                .map(|element| self.handle(element.id()))
                .collect(),
            Some(scope) => match self.element(scope) {
                Ok(element) => element
                    .select(selector)
                    .map(|found| self.handle(found.id()))
                    .collect(),
                Err(_) => Vec::new(),
            },
        }
    }

    fn matches(&self, node: NodeHandle, selector: &Selector) -> bool {
        self.element(node)
            .map(|element| selector.matches(&element))
            .unwrap_or(false)
    }

    fn closest(&self, node: NodeHandle, selector: &Selector) -> Option<NodeHandle> {
        let start = self.node_ref(node).ok()?;
        std::iter::once(start)
            .chain(start.ancestors())
            .filter_map(ElementRef::wrap)
            .find(|element| selector.matches(element))
            .map(|element| self.handle(element.id()))
    }

    fn text(&self, node: NodeHandle) -> Result<String, SurfaceError> {
        Ok(self.element(node)?.text().collect())
    }

    fn attr(&self, node: NodeHandle, name: &str) -> Result<Option<String>, SurfaceError> {
        Ok(self.element(node)?.value().attr(name).map(str::to_string))
    }

    fn is_attached(&self, node: NodeHandle) -> bool {
        self.node_id(node).is_ok_and(|id| self.reaches_root(id))
    }

    fn click(&mut self, node: NodeHandle) -> Result<(), SurfaceError> {
        self.attached_id(node)?;
        self.element(node)?;
        self.clicks.push(node);
        Ok(())
    }

    fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.mutations)
    }
}
