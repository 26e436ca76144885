//! Arena-based document tree.
//!
//! All nodes live in a contiguous `Vec<NodeData>` owned by the [`Document`]
//! and are referenced by [`NodeId`], a newtype over `NonZeroU32`. Links
//! between nodes (parent, siblings, children, attributes) are plain indices,
//! so the tree has no reference cycles and no per-node reference counting:
//! dropping the `Document` frees everything.
//!
//! # Lists
//!
//! Every node owns up to two doubly linked lists:
//!
//! - the **child list** (`first_child` .. `last_child`), owned by the
//!   Document and by Elements;
//! - the **attribute list** (`first_attribute` .. `last_attribute`), owned
//!   by Elements and Declarations.
//!
//! An attribute's `parent` is its owner and its sibling links run through
//! the attribute list. The two lists never share members.
//!
//! # Mutation
//!
//! Nodes are created detached with [`Document::create_node`] (or one of the
//! typed helpers) and placed with the four `adopt_as_*` operations, which
//! first [`orphan`](Document::orphan) the node from wherever it was. Each
//! operation relinks all affected pointers before returning, so the
//! invariants checked by [`Document::check_invariants`] hold between calls.
//!
//! Orphaned nodes stay allocated in the arena until the document is dropped.

mod node;
pub mod walk;

pub use node::{NodeKind, NodeType};
pub use walk::{NodeTypeSet, Sink, Walk};

use crate::error::ParserWarning;
use std::num::NonZeroU32;

/// A typed index into the document's node arena.
///
/// `NodeId` is a newtype over `NonZeroU32`, so `Option<NodeId>` has the same
/// size as `NodeId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    /// Creates a `NodeId` from a raw arena index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 0.
    #[allow(clippy::expect_used, clippy::cast_possible_truncation)]
    fn from_index(index: usize) -> Self {
        Self(NonZeroU32::new(index as u32).expect("NodeId index must be non-zero"))
    }

    fn as_index(self) -> usize {
        self.0.get() as usize
    }
}

/// Storage for a single node in the document arena.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// What kind of node this is and its payload.
    pub kind: NodeKind,
    /// Owner of this node. Only the Document node and detached nodes have none.
    pub parent: Option<NodeId>,
    /// Previous node in the same list (child list or attribute list).
    pub prev_sibling: Option<NodeId>,
    /// Next node in the same list.
    pub next_sibling: Option<NodeId>,
    /// First child node.
    pub first_child: Option<NodeId>,
    /// Last child node (for O(1) append).
    pub last_child: Option<NodeId>,
    /// First attribute node.
    pub first_attribute: Option<NodeId>,
    /// Last attribute node.
    pub last_attribute: Option<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            prev_sibling: None,
            next_sibling: None,
            first_child: None,
            last_child: None,
            first_attribute: None,
            last_attribute: None,
        }
    }

    fn is_attribute(&self) -> bool {
        matches!(self.kind, NodeKind::Attribute { .. })
    }
}

/// Which of a node's two lists an operation works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum List {
    Children,
    Attributes,
}

/// Compares two names, optionally ignoring case.
///
/// Case folding is Unicode-aware (`char::to_lowercase`), so `"ÄBC"` matches
/// `"äbc"` when `case_sensitive` is false.
#[must_use]
pub fn names_equal(a: &str, b: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        return a == b;
    }
    if a.is_ascii() && b.is_ascii() {
        return a.eq_ignore_ascii_case(b);
    }
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// A markup or JSON document.
///
/// The `Document` owns every node in an arena and exposes navigation through
/// `&Document` and mutation through `&mut Document`.
///
/// The two case-sensitivity flags are set from
/// [`ParseOptions`](crate::parser::ParseOptions) when parsing and consulted by
/// the parser and by name lookups such as [`Document::attribute`]. Changing
/// them later only affects subsequent lookups and parses; existing structure
/// is not re-validated.
///
/// # Examples
///
/// ```
/// use relaxml::Document;
///
/// let mut doc = Document::new();
/// let item = doc.create_element("item");
/// doc.adopt_as_last_child(doc.root(), item);
/// doc.set_attribute(item, "id", "7");
/// assert_eq!(doc.attribute(item, "id"), Some("7"));
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    /// The node arena. Index 0 is an unused placeholder for `NonZeroU32`.
    nodes: Vec<NodeData>,
    /// The Document node.
    root: NodeId,
    /// Whether element names compare case-sensitively.
    pub element_case_sensitive: bool,
    /// Whether attribute names compare case-sensitively.
    pub attribute_case_sensitive: bool,
    /// Recoverable problems found while parsing, in discovery order.
    pub warnings: Vec<ParserWarning>,
}

impl Document {
    /// Creates an empty document holding only the Document node.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = Vec::with_capacity(64);
        nodes.push(NodeData::new(NodeKind::Document));
        nodes.push(NodeData::new(NodeKind::Document));
        Self {
            nodes,
            root: NodeId::from_index(1),
            element_case_sensitive: true,
            attribute_case_sensitive: true,
            warnings: Vec::new(),
        }
    }

    /// Returns the Document node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the first element child of the Document node.
    #[must_use]
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(self.root)
            .find(|&id| self.node_type(id) == NodeType::Element)
    }

    /// Returns the `NodeData` for the given node.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this document.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.as_index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.as_index()]
    }

    /// Returns the type tag of a node.
    #[must_use]
    pub fn node_type(&self, id: NodeId) -> NodeType {
        self.node(id).kind.node_type()
    }

    /// Returns the name of an element, attribute or declaration.
    #[must_use]
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { name }
            | NodeKind::Attribute { name, .. }
            | NodeKind::Declaration { name } => Some(name),
            _ => None,
        }
    }

    /// Returns the textual payload of a text, comment, unknown or attribute node.
    #[must_use]
    pub fn node_value(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Text { content, .. }
            | NodeKind::Comment { content }
            | NodeKind::Unknown { content }
            | NodeKind::Attribute { value: content, .. } => Some(content),
            _ => None,
        }
    }

    /// Renames an element, attribute or declaration.
    ///
    /// Renaming an attribute does not check its owner for a name clash.
    ///
    /// # Panics
    ///
    /// Panics if the node kind carries no name.
    pub fn set_node_name(&mut self, id: NodeId, new_name: &str) {
        match &mut self.node_mut(id).kind {
            NodeKind::Element { name }
            | NodeKind::Attribute { name, .. }
            | NodeKind::Declaration { name } => {
                new_name.clone_into(name);
            }
            other => panic!("{:?} nodes have no name", other.node_type()),
        }
    }

    /// Replaces the textual payload of a text, comment, unknown or attribute node.
    ///
    /// # Panics
    ///
    /// Panics if the node kind carries no textual payload.
    pub fn set_node_value(&mut self, id: NodeId, new_value: &str) {
        match &mut self.node_mut(id).kind {
            NodeKind::Text { content, .. }
            | NodeKind::Comment { content }
            | NodeKind::Unknown { content }
            | NodeKind::Attribute { value: content, .. } => {
                new_value.clone_into(content);
            }
            other => panic!("{:?} nodes have no value", other.node_type()),
        }
    }

    // --- Navigation ---

    /// Returns the owner of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Returns the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    /// Returns the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    /// Returns the next node in the same list.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    /// Returns the previous node in the same list.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev_sibling
    }

    /// Returns the first attribute of an element or declaration.
    #[must_use]
    pub fn first_attribute(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_attribute
    }

    /// Returns the last attribute of an element or declaration.
    #[must_use]
    pub fn last_attribute(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_attribute
    }

    /// Returns an iterator over the children of a node.
    pub fn children(&self, id: NodeId) -> Siblings<'_> {
        Siblings {
            doc: self,
            next: self.node(id).first_child,
        }
    }

    /// Returns an iterator over the attribute nodes of a node.
    pub fn attributes(&self, id: NodeId) -> Siblings<'_> {
        Siblings {
            doc: self,
            next: self.node(id).first_attribute,
        }
    }

    /// Returns an iterator over the element children of a node.
    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .filter(move |&child| self.node_type(child) == NodeType::Element)
    }

    /// Returns an iterator over a node and its ancestors (walking up to the
    /// Document node).
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: Some(id),
        }
    }

    /// Returns an iterator over all descendants of a node in document order.
    /// Attributes are not included.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            root: id,
            next: self.first_child(id),
        }
    }

    /// Returns `true` if `ancestor` is `id` or one of its ancestors.
    #[must_use]
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    // --- Lookup ---

    /// Finds an attribute node by name, honoring `attribute_case_sensitive`.
    #[must_use]
    pub fn attribute_node(&self, owner: NodeId, name: &str) -> Option<NodeId> {
        self.attributes(owner).find(|&attr| {
            self.node_name(attr)
                .is_some_and(|n| names_equal(n, name, self.attribute_case_sensitive))
        })
    }

    /// Returns the value of an attribute by name.
    #[must_use]
    pub fn attribute(&self, owner: NodeId, name: &str) -> Option<&str> {
        self.attribute_node(owner, name)
            .and_then(|attr| self.node_value(attr))
    }

    /// Finds the first child element with the given name, honoring
    /// `element_case_sensitive`.
    #[must_use]
    pub fn child_element(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.child_elements(parent).find(|&child| {
            self.node_name(child)
                .is_some_and(|n| names_equal(n, name, self.element_case_sensitive))
        })
    }

    // --- Creation ---

    /// Allocates a new detached node and returns its id.
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        let index = self.nodes.len();
        self.nodes.push(NodeData::new(kind));
        NodeId::from_index(index)
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.create_node(NodeKind::Element {
            name: name.to_string(),
        })
    }

    /// Creates a detached attribute.
    pub fn create_attribute(&mut self, name: &str, value: &str) -> NodeId {
        self.create_node(NodeKind::Attribute {
            name: name.to_string(),
            value: value.to_string(),
        })
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.create_node(NodeKind::Text {
            content: content.to_string(),
            cdata: false,
        })
    }

    /// Creates a detached CDATA text node.
    pub fn create_cdata(&mut self, content: &str) -> NodeId {
        self.create_node(NodeKind::Text {
            content: content.to_string(),
            cdata: true,
        })
    }

    /// Creates a detached comment.
    pub fn create_comment(&mut self, content: &str) -> NodeId {
        self.create_node(NodeKind::Comment {
            content: content.to_string(),
        })
    }

    /// Creates a detached declaration.
    pub fn create_declaration(&mut self, name: &str) -> NodeId {
        self.create_node(NodeKind::Declaration {
            name: name.to_string(),
        })
    }

    /// Creates a detached unknown node holding `content` verbatim.
    pub fn create_unknown(&mut self, content: &str) -> NodeId {
        self.create_node(NodeKind::Unknown {
            content: content.to_string(),
        })
    }

    // --- Adoption ---

    /// Makes `node` the first child of `parent`. Attribute nodes become the
    /// first attribute instead.
    ///
    /// # Panics
    ///
    /// Panics if `parent` cannot own `node` (see [`NodeType::can_own_children`]
    /// and [`NodeType::can_own_attributes`]), if `node` is the Document node,
    /// or if `node` is `parent` or one of its ancestors.
    pub fn adopt_as_first_child(&mut self, parent: NodeId, node: NodeId) {
        let list = self.prepare_adoption(parent, node);
        let next = match list {
            List::Children => self.node(parent).first_child,
            List::Attributes => self.node(parent).first_attribute,
        };
        self.splice(parent, node, None, next, list);
        if list == List::Attributes {
            self.drop_attributes_named_like(node);
        }
    }

    /// Makes `node` the last child of `parent`. Attribute nodes become the
    /// last attribute instead.
    ///
    /// # Panics
    ///
    /// Same conditions as [`adopt_as_first_child`](Self::adopt_as_first_child).
    pub fn adopt_as_last_child(&mut self, parent: NodeId, node: NodeId) {
        let list = self.prepare_adoption(parent, node);
        let prev = match list {
            List::Children => self.node(parent).last_child,
            List::Attributes => self.node(parent).last_attribute,
        };
        self.splice(parent, node, prev, None, list);
        if list == List::Attributes {
            self.drop_attributes_named_like(node);
        }
    }

    /// Inserts `node` immediately before `reference` in the list that holds
    /// `reference`.
    ///
    /// # Panics
    ///
    /// Panics if `reference` has no parent, if exactly one of the two nodes
    /// is an attribute, or under the conditions of
    /// [`adopt_as_first_child`](Self::adopt_as_first_child).
    pub fn adopt_as_previous_sibling(&mut self, reference: NodeId, node: NodeId) {
        let parent = self.sibling_parent(reference, node);
        let list = self.prepare_adoption(parent, node);
        let prev = self.node(reference).prev_sibling;
        self.splice(parent, node, prev, Some(reference), list);
        if list == List::Attributes {
            self.drop_attributes_named_like(node);
        }
    }

    /// Inserts `node` immediately after `reference` in the list that holds
    /// `reference`.
    ///
    /// # Panics
    ///
    /// Same conditions as [`adopt_as_previous_sibling`](Self::adopt_as_previous_sibling).
    pub fn adopt_as_next_sibling(&mut self, reference: NodeId, node: NodeId) {
        let parent = self.sibling_parent(reference, node);
        let list = self.prepare_adoption(parent, node);
        let next = self.node(reference).next_sibling;
        self.splice(parent, node, Some(reference), next, list);
        if list == List::Attributes {
            self.drop_attributes_named_like(node);
        }
    }

    /// Sets an attribute, replacing any attribute with the same name.
    /// Returns the attribute node.
    pub fn set_attribute(&mut self, owner: NodeId, name: &str, value: &str) -> NodeId {
        if let Some(existing) = self.attribute_node(owner, name) {
            self.set_node_value(existing, value);
            return existing;
        }
        let attr = self.create_attribute(name, value);
        self.adopt_as_last_child(owner, attr);
        attr
    }

    /// Removes an attribute by name. Returns the orphaned attribute node.
    pub fn remove_attribute(&mut self, owner: NodeId, name: &str) -> Option<NodeId> {
        let attr = self.attribute_node(owner, name)?;
        self.orphan(attr);
        Some(attr)
    }

    /// Appends a freshly created, detached node to `parent` without the
    /// adoption checks. Used by the parsers, which only ever append new
    /// nodes below their current element.
    pub(crate) fn append_detached(&mut self, parent: NodeId, node: NodeId) {
        debug_assert!(self.node(node).parent.is_none());
        if self.node(node).is_attribute() {
            let prev = self.node(parent).last_attribute;
            self.splice(parent, node, prev, None, List::Attributes);
        } else {
            let prev = self.node(parent).last_child;
            self.splice(parent, node, prev, None, List::Children);
        }
    }

    fn sibling_parent(&self, reference: NodeId, node: NodeId) -> NodeId {
        assert_ne!(reference, node, "a node cannot be adopted as its own sibling");
        assert_eq!(
            self.node(reference).is_attribute(),
            self.node(node).is_attribute(),
            "attributes and children cannot be siblings"
        );
        let Some(parent) = self.node(reference).parent else {
            panic!("cannot adopt a sibling of a node that has no parent");
        };
        parent
    }

    /// Checks the adoption contract and detaches `node`. Returns the list it
    /// will join.
    fn prepare_adoption(&mut self, parent: NodeId, node: NodeId) -> List {
        let parent_type = self.node_type(parent);
        let node_type = self.node_type(node);
        assert!(
            node_type != NodeType::Document,
            "the Document node cannot be adopted"
        );
        let list = if node_type == NodeType::Attribute {
            assert!(
                parent_type.can_own_attributes(),
                "{parent_type:?} nodes cannot own attributes"
            );
            List::Attributes
        } else {
            assert!(
                parent_type.can_own_children(),
                "{parent_type:?} nodes cannot own children"
            );
            assert!(
                !self.is_ancestor_or_self(node, parent),
                "a node cannot be adopted into its own subtree"
            );
            List::Children
        };
        self.orphan(node);
        list
    }

    /// Links a detached `node` between `prev` and `next` in `parent`'s list.
    fn splice(
        &mut self,
        parent: NodeId,
        node: NodeId,
        prev: Option<NodeId>,
        next: Option<NodeId>,
        list: List,
    ) {
        {
            let data = self.node_mut(node);
            data.parent = Some(parent);
            data.prev_sibling = prev;
            data.next_sibling = next;
        }
        match prev {
            Some(p) => self.node_mut(p).next_sibling = Some(node),
            None => match list {
                List::Children => self.node_mut(parent).first_child = Some(node),
                List::Attributes => self.node_mut(parent).first_attribute = Some(node),
            },
        }
        match next {
            Some(n) => self.node_mut(n).prev_sibling = Some(node),
            None => match list {
                List::Children => self.node_mut(parent).last_child = Some(node),
                List::Attributes => self.node_mut(parent).last_attribute = Some(node),
            },
        }
    }

    /// Orphans every other attribute of `attr`'s owner that has the same name.
    fn drop_attributes_named_like(&mut self, attr: NodeId) {
        let Some(owner) = self.parent(attr) else {
            return;
        };
        let Some(name) = self.node_name(attr) else {
            return;
        };
        let duplicates: Vec<NodeId> = self
            .attributes(owner)
            .filter(|&other| {
                other != attr
                    && self
                        .node_name(other)
                        .is_some_and(|n| names_equal(n, name, self.attribute_case_sensitive))
            })
            .collect();
        for duplicate in duplicates {
            self.orphan(duplicate);
        }
    }

    /// Detaches a node from its owner, closing the gap in the owner's list.
    ///
    /// The node keeps its own children and attributes. Orphaning a detached
    /// node does nothing.
    pub fn orphan(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).parent else {
            return;
        };
        let list = if self.node(id).is_attribute() {
            List::Attributes
        } else {
            List::Children
        };
        let prev = self.node(id).prev_sibling;
        let next = self.node(id).next_sibling;

        match prev {
            Some(p) => self.node_mut(p).next_sibling = next,
            None => match list {
                List::Children => self.node_mut(parent).first_child = next,
                List::Attributes => self.node_mut(parent).first_attribute = next,
            },
        }
        match next {
            Some(n) => self.node_mut(n).prev_sibling = prev,
            None => match list {
                List::Children => self.node_mut(parent).last_child = prev,
                List::Attributes => self.node_mut(parent).last_attribute = prev,
            },
        }

        let data = self.node_mut(id);
        data.parent = None;
        data.prev_sibling = None;
        data.next_sibling = None;
    }

    /// Detaches every descendant and attribute of a node, leaving each of
    /// them fully unlinked. The node itself stays where it is.
    pub fn clear(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            pending.extend(self.children(current));
            let attributes: Vec<NodeId> = self.attributes(current).collect();
            for attr in attributes {
                let data = self.node_mut(attr);
                data.parent = None;
                data.prev_sibling = None;
                data.next_sibling = None;
            }
            let data = self.node_mut(current);
            data.first_child = None;
            data.last_child = None;
            data.first_attribute = None;
            data.last_attribute = None;
            if current != id {
                data.parent = None;
                data.prev_sibling = None;
                data.next_sibling = None;
            }
        }
    }

    // --- Cloning ---

    /// Deep-copies the subtree rooted at `id` (attributes included) into new
    /// detached nodes of this document and returns the copy's root.
    ///
    /// The copy runs on an explicit cursor pair rather than recursion, so
    /// arbitrarily deep trees are safe.
    ///
    /// # Panics
    ///
    /// Panics if `id` is the Document node; clone the whole `Document` instead.
    pub fn clone_node(&mut self, id: NodeId) -> NodeId {
        self.copy_subtree(None, id)
    }

    /// Deep-copies the subtree rooted at `id` in `source` into new detached
    /// nodes of this document and returns the copy's root.
    ///
    /// # Panics
    ///
    /// Panics if `id` is `source`'s Document node.
    pub fn import_node(&mut self, source: &Document, id: NodeId) -> NodeId {
        self.copy_subtree(Some(source), id)
    }

    fn source<'s>(&'s self, other: Option<&'s Document>) -> &'s Document {
        other.unwrap_or(self)
    }

    /// Walks the source subtree with one cursor while building the copy with
    /// a second. `allow_children` is false right after climbing back up, so
    /// an already-copied child list is not entered twice.
    fn copy_subtree(&mut self, other: Option<&Document>, root: NodeId) -> NodeId {
        let kind = self.source(other).node(root).kind.clone();
        assert!(
            kind != NodeKind::Document,
            "the Document node cannot be cloned into a subtree"
        );
        let copy_root = self.create_node(kind);
        self.copy_attributes(other, root, copy_root);

        let mut source = root;
        let mut copy = copy_root;
        let mut allow_children = true;
        loop {
            if allow_children {
                if let Some(child) = self.source(other).node(source).first_child {
                    let child_copy = self.copy_single(other, child);
                    let prev = self.node(copy).last_child;
                    self.splice(copy, child_copy, prev, None, List::Children);
                    source = child;
                    copy = child_copy;
                    continue;
                }
            }
            if source == root {
                break;
            }
            if let Some(next) = self.source(other).node(source).next_sibling {
                let Some(parent_copy) = self.node(copy).parent else {
                    break;
                };
                let next_copy = self.copy_single(other, next);
                self.splice(parent_copy, next_copy, Some(copy), None, List::Children);
                source = next;
                copy = next_copy;
                allow_children = true;
                continue;
            }
            let (Some(source_parent), Some(copy_parent)) =
                (self.source(other).node(source).parent, self.node(copy).parent)
            else {
                break;
            };
            source = source_parent;
            copy = copy_parent;
            allow_children = false;
        }
        copy_root
    }

    fn copy_single(&mut self, other: Option<&Document>, source: NodeId) -> NodeId {
        let kind = self.source(other).node(source).kind.clone();
        let copy = self.create_node(kind);
        self.copy_attributes(other, source, copy);
        copy
    }

    fn copy_attributes(&mut self, other: Option<&Document>, source: NodeId, copy: NodeId) {
        let mut attr = self.source(other).node(source).first_attribute;
        while let Some(current) = attr {
            let data = self.source(other).node(current);
            let kind = data.kind.clone();
            attr = data.next_sibling;
            let attr_copy = self.create_node(kind);
            let prev = self.node(copy).last_attribute;
            self.splice(copy, attr_copy, prev, None, List::Attributes);
        }
    }

    // --- Diagnostics ---

    /// Returns the number of nodes ever allocated (reachable or not),
    /// including the Document node.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Verifies the linkage invariants over every node reachable from the
    /// Document node and returns a description of the first violation.
    ///
    /// # Errors
    ///
    /// Returns a message naming the offending node when a link is asymmetric,
    /// a list end pointer is wrong, a node sits in a list its owner cannot
    /// hold, or a node appears in both lists.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.node(self.root).parent.is_some() {
            return Err("the Document node has a parent".to_string());
        }
        let mut pending = vec![self.root];
        while let Some(owner) = pending.pop() {
            let owner_type = self.node_type(owner);
            for list in [List::Children, List::Attributes] {
                let (first, last) = match list {
                    List::Children => (self.first_child(owner), self.last_child(owner)),
                    List::Attributes => (self.first_attribute(owner), self.last_attribute(owner)),
                };
                let allowed = match list {
                    List::Children => owner_type.can_own_children(),
                    List::Attributes => owner_type.can_own_attributes(),
                };
                if !allowed && first.is_some() {
                    return Err(format!("{owner:?} ({owner_type:?}) owns a {list:?} list"));
                }
                let mut prev = None;
                let mut current = first;
                while let Some(id) = current {
                    let data = self.node(id);
                    if data.parent != Some(owner) {
                        return Err(format!("{id:?} does not point back to its owner {owner:?}"));
                    }
                    if data.prev_sibling != prev {
                        return Err(format!("{id:?} has an asymmetric previous link"));
                    }
                    if data.is_attribute() != (list == List::Attributes) {
                        return Err(format!("{id:?} sits in the wrong list of {owner:?}"));
                    }
                    if data.kind == NodeKind::Document {
                        return Err(format!("{id:?} is a nested Document node"));
                    }
                    if list == List::Children {
                        pending.push(id);
                    } else if data.first_child.is_some() || data.first_attribute.is_some() {
                        return Err(format!("attribute {id:?} owns nodes"));
                    }
                    prev = Some(id);
                    current = data.next_sibling;
                }
                if prev != last {
                    return Err(format!("{owner:?} has a wrong last pointer for {list:?}"));
                }
            }
        }
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

// --- Iterators ---

/// Iterator over a child list or an attribute list.
pub struct Siblings<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Siblings<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).next_sibling;
        Some(current)
    }
}

/// Iterator over a node and its ancestors.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).parent;
        Some(current)
    }
}

/// Depth-first iterator over all descendants of a node.
pub struct Descendants<'a> {
    doc: &'a Document,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;

        if let Some(child) = self.doc.first_child(current) {
            self.next = Some(child);
            return Some(current);
        }

        if let Some(sibling) = self.doc.next_sibling(current) {
            self.next = Some(sibling);
            return Some(current);
        }

        let mut ancestor = self.doc.parent(current);
        while let Some(anc) = ancestor {
            if anc == self.root {
                self.next = None;
                return Some(current);
            }
            if let Some(sibling) = self.doc.next_sibling(anc) {
                self.next = Some(sibling);
                return Some(current);
            }
            ancestor = self.doc.parent(anc);
        }

        self.next = None;
        Some(current)
    }
}
