//! An in-memory, externally-mutable document tree.
//!
//! This is the surface the engine automates against. The tree is shared
//! behind an `Arc<RwLock<..>>` so that test harnesses and host integrations
//! can mutate it out-of-band while the engine holds a handle to it, which is
//! exactly the situation the scan/verify loop is designed to survive.
//!
//! Every mutation bumps a generation counter. Fingerprints record the
//! generation they were scanned at; the executor refuses to trust a handle
//! whose generation no longer matches the document.

use crate::errors::AutomationError;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Index of a node slot inside a [`Document`].
///
/// Ids are never reused within one document; removing a node tombstones its
/// slot. An id is only meaningful for the document that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

/// The mutable record backing one element node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub tag: String,
    /// Stable identifier attribute, if the host assigned one.
    pub identifier: Option<String>,
    pub classes: Vec<String>,
    /// The node's own text content (not including descendants).
    pub text: Option<String>,
    /// Computed-style hidden flag.
    pub hidden: bool,
    /// Box geometry as (x, y, width, height).
    pub bounds: (f64, f64, f64, f64),
    /// A reachable edit affordance exists for this node.
    pub editable: bool,
    /// A reachable delete affordance exists for this node.
    pub removable: bool,
}

impl NodeRecord {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            identifier: None,
            classes: Vec::new(),
            text: None,
            hidden: false,
            bounds: (0.0, 0.0, 200.0, 24.0),
            editable: false,
            removable: false,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.identifier = Some(id.into());
        self
    }

    pub fn with_classes(mut self, classes: &[&str]) -> Self {
        self.classes = classes.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_bounds(mut self, bounds: (f64, f64, f64, f64)) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    pub fn removable(mut self, removable: bool) -> Self {
        self.removable = removable;
        self
    }
}

#[derive(Debug)]
struct Slot {
    record: NodeRecord,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Tombstone flag; set when the node is removed from the tree.
    detached: bool,
}

#[derive(Debug)]
struct Tree {
    slots: Vec<Slot>,
    root: NodeId,
    generation: u64,
}

/// A cheaply-cloneable handle to one shared document tree.
#[derive(Debug, Clone)]
pub struct Document {
    inner: Arc<RwLock<Tree>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates a document holding a single `body` root node.
    pub fn new() -> Self {
        let root_slot = Slot {
            record: NodeRecord::new("body"),
            parent: None,
            children: Vec::new(),
            detached: false,
        };
        Self {
            inner: Arc::new(RwLock::new(Tree {
                slots: vec![root_slot],
                root: NodeId(0),
                generation: 0,
            })),
        }
    }

    pub fn root(&self) -> NodeId {
        self.read().root
    }

    /// Current mutation generation. Bumped by every append/set_text/remove.
    pub fn generation(&self) -> u64 {
        self.read().generation
    }

    /// Appends a child under `parent` and returns its id.
    pub fn append(&self, parent: NodeId, record: NodeRecord) -> Result<NodeId, AutomationError> {
        let mut tree = self.write();
        if !live(&tree, parent) {
            return Err(AutomationError::ElementNotFound(format!(
                "cannot append under detached node {parent:?}"
            )));
        }
        let id = NodeId(tree.slots.len());
        tree.slots.push(Slot {
            record,
            parent: Some(parent),
            children: Vec::new(),
            detached: false,
        });
        tree.slots[parent.0].children.push(id);
        tree.generation += 1;
        Ok(id)
    }

    /// Replaces the node's own text. Bumps the generation.
    pub fn set_text(&self, id: NodeId, text: &str) -> Result<(), AutomationError> {
        let mut tree = self.write();
        if !live(&tree, id) {
            return Err(AutomationError::ElementNotFound(format!(
                "cannot set text on detached node {id:?}"
            )));
        }
        tree.slots[id.0].record.text = Some(text.to_string());
        tree.generation += 1;
        debug!(?id, new_text = text, "set_text applied");
        Ok(())
    }

    /// Detaches the node and its whole subtree. Bumps the generation.
    pub fn remove(&self, id: NodeId) -> Result<(), AutomationError> {
        let mut tree = self.write();
        if !live(&tree, id) {
            return Err(AutomationError::ElementNotFound(format!(
                "cannot remove detached node {id:?}"
            )));
        }
        if id == tree.root {
            return Err(AutomationError::UnsupportedOperation(
                "cannot remove the document root".to_string(),
            ));
        }
        // Detach from parent first, then tombstone the subtree.
        if let Some(parent) = tree.slots[id.0].parent {
            tree.slots[parent.0].children.retain(|c| *c != id);
        }
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            tree.slots[next.0].detached = true;
            stack.extend(tree.slots[next.0].children.iter().copied());
        }
        tree.generation += 1;
        debug!(?id, "subtree removed");
        Ok(())
    }

    /// Snapshot of one node's record, if it is still attached.
    pub fn node(&self, id: NodeId) -> Option<NodeRecord> {
        let tree = self.read();
        live(&tree, id).then(|| tree.slots[id.0].record.clone())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        let tree = self.read();
        if !live(&tree, id) {
            return None;
        }
        tree.slots[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let tree = self.read();
        if !live(&tree, id) {
            return Vec::new();
        }
        tree.slots[id.0].children.clone()
    }

    /// All attached nodes in depth-first document order, root included.
    pub fn walk(&self) -> Vec<NodeId> {
        let tree = self.read();
        let mut order = Vec::new();
        let mut stack = vec![tree.root];
        while let Some(id) = stack.pop() {
            if !live(&tree, id) {
                continue;
            }
            order.push(id);
            // Reverse so the leftmost child is visited first.
            stack.extend(tree.slots[id.0].children.iter().rev().copied());
        }
        order
    }

    /// All descendants of `id` in document order, `id` excluded.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let tree = self.read();
        let mut order = Vec::new();
        if !live(&tree, id) {
            return order;
        }
        let mut stack: Vec<NodeId> = tree.slots[id.0].children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            if !live(&tree, next) {
                continue;
            }
            order.push(next);
            stack.extend(tree.slots[next.0].children.iter().rev().copied());
        }
        order
    }

    /// Own text plus descendant text, joined in document order.
    pub fn deep_text(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        if let Some(record) = self.node(id) {
            if let Some(text) = record.text {
                if !text.trim().is_empty() {
                    parts.push(text.trim().to_string());
                }
            }
        }
        for child in self.descendants(id) {
            if let Some(record) = self.node(child) {
                if let Some(text) = record.text {
                    if !text.trim().is_empty() {
                        parts.push(text.trim().to_string());
                    }
                }
            }
        }
        parts.join(" ")
    }

    /// Whether `identifier` is assigned to exactly one attached node.
    pub fn identifier_is_unique(&self, identifier: &str) -> bool {
        let tree = self.read();
        let mut hits = 0usize;
        for (idx, slot) in tree.slots.iter().enumerate() {
            if !live(&tree, NodeId(idx)) {
                continue;
            }
            if slot.record.identifier.as_deref() == Some(identifier) {
                hits += 1;
            }
        }
        hits == 1
    }

    /// Absolute ancestor-index path from the root, e.g. `/body[0]/section[1]/h1[0]`.
    ///
    /// Each segment indexes the node among same-tag siblings, which keeps the
    /// path valid under unrelated attribute churn.
    pub fn absolute_path(&self, id: NodeId) -> String {
        let segments = self.path_segments(id);
        let mut out = String::new();
        for segment in &segments {
            out.push('/');
            out.push_str(segment);
        }
        if out.is_empty() {
            out.push('/');
        }
        out
    }

    /// The last `keep` segments of the structural path, joined with `/`.
    pub fn trimmed_path(&self, id: NodeId, keep: usize) -> String {
        let segments = self.path_segments(id);
        let start = segments.len().saturating_sub(keep);
        segments[start..].join("/")
    }

    fn path_segments(&self, id: NodeId) -> Vec<String> {
        let tree = self.read();
        if !live(&tree, id) {
            return Vec::new();
        }
        let mut segments = Vec::new();
        let mut current = id;
        loop {
            let slot = &tree.slots[current.0];
            let tag = &slot.record.tag;
            let nth = match slot.parent {
                Some(parent) => tree.slots[parent.0]
                    .children
                    .iter()
                    .filter(|c| tree.slots[c.0].record.tag == *tag)
                    .position(|c| *c == current)
                    .unwrap_or(0),
                None => 0,
            };
            segments.push(format!("{tag}[{nth}]"));
            match slot.parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
        segments.reverse();
        segments
    }

    /// Resolves one locator string to an attached node, read-only.
    ///
    /// Supported grammars, in the order the executor tries them:
    /// - `#identifier`
    /// - trimmed structural path suffix, e.g. `section[1]/h1[0]`
    /// - absolute path from the root, e.g. `/body[0]/section[1]/h1[0]`
    /// - `text:<literal>` matched against own text, then deep text
    pub fn resolve_locator(&self, locator: &str) -> Option<NodeId> {
        let locator = locator.trim();
        if locator.is_empty() {
            return None;
        }
        if let Some(identifier) = locator.strip_prefix('#') {
            return self
                .walk()
                .into_iter()
                .find(|id| self.node(*id).and_then(|n| n.identifier).as_deref() == Some(identifier));
        }
        if let Some(needle) = locator.strip_prefix("text:") {
            let needle = needle.trim().to_lowercase();
            if needle.is_empty() {
                return None;
            }
            return self.walk().into_iter().find(|id| {
                let own = self
                    .node(*id)
                    .and_then(|n| n.text)
                    .map(|t| t.trim().to_lowercase());
                own.as_deref() == Some(needle.as_str())
                    || self.deep_text(*id).to_lowercase() == needle
            });
        }
        if let Some(rest) = locator.strip_prefix('/') {
            return self.resolve_absolute(rest);
        }
        // Trimmed structural path: match by segment-aligned suffix, first hit
        // in document order wins.
        let suffix: Vec<&str> = locator.split('/').collect();
        self.walk().into_iter().find(|id| {
            let segments = self.path_segments(*id);
            segments.len() >= suffix.len()
                && segments[segments.len() - suffix.len()..]
                    .iter()
                    .zip(&suffix)
                    .all(|(have, want)| have == want)
        })
    }

    fn resolve_absolute(&self, path: &str) -> Option<NodeId> {
        let tree = self.read();
        let mut current: Option<NodeId> = None;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let (tag, nth) = parse_segment(segment)?;
            current = match current {
                None => {
                    let root = tree.root;
                    (tree.slots[root.0].record.tag == tag && nth == 0).then_some(root)
                }
                Some(parent) => tree.slots[parent.0]
                    .children
                    .iter()
                    .filter(|c| live(&tree, **c) && tree.slots[c.0].record.tag == tag)
                    .nth(nth)
                    .copied(),
            };
            current?;
        }
        current.filter(|id| live(&tree, *id))
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Tree> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Tree> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn live(tree: &Tree, id: NodeId) -> bool {
    id.0 < tree.slots.len() && !tree.slots[id.0].detached
}

/// Parses a `tag[nth]` path segment.
fn parse_segment(segment: &str) -> Option<(String, usize)> {
    let open = segment.find('[')?;
    let close = segment.strip_suffix(']')?;
    let tag = close.get(..open)?.to_string();
    let nth = close.get(open + 1..)?.parse().ok()?;
    Some((tag, nth))
}
