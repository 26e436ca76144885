//! Filtered depth-first traversal with per-kind callbacks.
//!
//! [`Document::walk`] visits a subtree in document order and hands every node
//! whose type is in the filter to a [`Sink`]. Elements and the Document node
//! get an entry callback before their children and an exit callback after.
//! Attributes are visited right after their owner's entry callback, but only
//! when the filter includes [`NodeType::Attribute`].
//!
//! The traversal is iterative, so very deep trees cannot overflow the stack.
//! The filter only decides which callbacks fire: the walk always descends
//! through every child list, so a `Text`-only filter still reaches text
//! nested inside elements.

use super::{Document, NodeId, NodeKind, NodeType};

/// Whether a walk should go on after a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    Continue,
    Stop,
}

/// A small set of [`NodeType`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeTypeSet(u8);

impl NodeTypeSet {
    /// The empty set.
    pub const NONE: Self = Self(0);

    /// Every node type.
    pub const ALL: Self = Self(0b0111_1111);

    const fn bit(node_type: NodeType) -> u8 {
        1 << node_type as u8
    }

    /// Builds a set from a slice of types.
    #[must_use]
    pub fn of(types: &[NodeType]) -> Self {
        types.iter().fold(Self::NONE, |set, &t| set.with(t))
    }

    /// Returns a copy of the set with `node_type` added.
    #[must_use]
    pub const fn with(self, node_type: NodeType) -> Self {
        Self(self.0 | Self::bit(node_type))
    }

    /// Returns a copy of the set with `node_type` removed.
    #[must_use]
    pub const fn without(self, node_type: NodeType) -> Self {
        Self(self.0 & !Self::bit(node_type))
    }

    /// Returns `true` if the set holds `node_type`.
    #[must_use]
    pub const fn contains(self, node_type: NodeType) -> bool {
        self.0 & Self::bit(node_type) != 0
    }
}

impl Default for NodeTypeSet {
    /// Everything except attributes.
    fn default() -> Self {
        Self::ALL.without(NodeType::Attribute)
    }
}

/// Receiver for [`Document::walk`] callbacks.
///
/// Every method defaults to [`Walk::Continue`], so a sink only implements
/// the callbacks it cares about. Returning [`Walk::Stop`] ends the walk
/// immediately; no further callbacks (including pending exits) fire.
#[allow(unused_variables)]
pub trait Sink {
    fn document_entry(&mut self, doc: &Document, id: NodeId) -> Walk {
        Walk::Continue
    }

    fn document_exit(&mut self, doc: &Document, id: NodeId) -> Walk {
        Walk::Continue
    }

    fn element_entry(&mut self, doc: &Document, id: NodeId) -> Walk {
        Walk::Continue
    }

    fn element_exit(&mut self, doc: &Document, id: NodeId) -> Walk {
        Walk::Continue
    }

    fn attribute(&mut self, doc: &Document, id: NodeId) -> Walk {
        Walk::Continue
    }

    fn text(&mut self, doc: &Document, id: NodeId) -> Walk {
        Walk::Continue
    }

    fn comment(&mut self, doc: &Document, id: NodeId) -> Walk {
        Walk::Continue
    }

    fn declaration(&mut self, doc: &Document, id: NodeId) -> Walk {
        Walk::Continue
    }

    fn unknown(&mut self, doc: &Document, id: NodeId) -> Walk {
        Walk::Continue
    }
}

impl Document {
    /// Walks the subtree rooted at `start` (inclusive) depth-first, calling
    /// `sink` for every node whose type is in `filter`.
    ///
    /// Returns [`Walk::Stop`] if a callback stopped the walk.
    pub fn walk<S: Sink + ?Sized>(&self, start: NodeId, sink: &mut S, filter: NodeTypeSet) -> Walk {
        let mut current = start;
        loop {
            if self.enter(current, sink, filter) == Walk::Stop {
                return Walk::Stop;
            }
            if let Some(child) = self.first_child(current) {
                current = child;
                continue;
            }
            loop {
                if self.leave(current, sink, filter) == Walk::Stop {
                    return Walk::Stop;
                }
                if current == start {
                    return Walk::Continue;
                }
                if let Some(next) = self.next_sibling(current) {
                    current = next;
                    break;
                }
                match self.parent(current) {
                    Some(parent) => current = parent,
                    None => return Walk::Continue,
                }
            }
        }
    }

    fn enter<S: Sink + ?Sized>(&self, id: NodeId, sink: &mut S, filter: NodeTypeSet) -> Walk {
        let node_type = self.node_type(id);
        let flow = if filter.contains(node_type) {
            match &self.node(id).kind {
                NodeKind::Document => sink.document_entry(self, id),
                NodeKind::Element { .. } => sink.element_entry(self, id),
                NodeKind::Attribute { .. } => sink.attribute(self, id),
                NodeKind::Text { .. } => sink.text(self, id),
                NodeKind::Comment { .. } => sink.comment(self, id),
                NodeKind::Declaration { .. } => sink.declaration(self, id),
                NodeKind::Unknown { .. } => sink.unknown(self, id),
            }
        } else {
            Walk::Continue
        };
        if flow == Walk::Stop {
            return Walk::Stop;
        }
        if filter.contains(NodeType::Attribute) && node_type.can_own_attributes() {
            for attr in self.attributes(id) {
                if sink.attribute(self, attr) == Walk::Stop {
                    return Walk::Stop;
                }
            }
        }
        Walk::Continue
    }

    fn leave<S: Sink + ?Sized>(&self, id: NodeId, sink: &mut S, filter: NodeTypeSet) -> Walk {
        let node_type = self.node_type(id);
        if !filter.contains(node_type) {
            return Walk::Continue;
        }
        match node_type {
            NodeType::Document => sink.document_exit(self, id),
            NodeType::Element => sink.element_exit(self, id),
            _ => Walk::Continue,
        }
    }

    /// Concatenates every text node in the subtree rooted at `id`
    /// (CDATA included), in document order.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut collector = TextCollector::default();
        self.walk(id, &mut collector, NodeTypeSet::of(&[NodeType::Text]));
        collector.text
    }
}

#[derive(Default)]
struct TextCollector {
    text: String,
}

impl Sink for TextCollector {
    fn text(&mut self, doc: &Document, id: NodeId) -> Walk {
        if let Some(content) = doc.node_value(id) {
            self.text.push_str(content);
        }
        Walk::Continue
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Records callbacks as short strings.
    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        stop_at: Option<String>,
    }

    impl Recorder {
        fn push(&mut self, event: String) -> Walk {
            let stop = self.stop_at.as_deref() == Some(event.as_str());
            self.events.push(event);
            if stop {
                Walk::Stop
            } else {
                Walk::Continue
            }
        }
    }

    impl Sink for Recorder {
        fn document_entry(&mut self, _: &Document, _: NodeId) -> Walk {
            self.push("doc>".into())
        }
        fn document_exit(&mut self, _: &Document, _: NodeId) -> Walk {
            self.push("<doc".into())
        }
        fn element_entry(&mut self, doc: &Document, id: NodeId) -> Walk {
            self.push(format!("{}>", doc.node_name(id).unwrap()))
        }
        fn element_exit(&mut self, doc: &Document, id: NodeId) -> Walk {
            self.push(format!("<{}", doc.node_name(id).unwrap()))
        }
        fn attribute(&mut self, doc: &Document, id: NodeId) -> Walk {
            self.push(format!("@{}", doc.node_name(id).unwrap()))
        }
        fn text(&mut self, doc: &Document, id: NodeId) -> Walk {
            self.push(format!("'{}'", doc.node_value(id).unwrap()))
        }
        fn comment(&mut self, _: &Document, _: NodeId) -> Walk {
            self.push("#comment".into())
        }
    }

    fn sample() -> Document {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.create_element("a");
        doc.adopt_as_last_child(root, a);
        doc.set_attribute(a, "x", "1");
        let t1 = doc.create_text("one");
        doc.adopt_as_last_child(a, t1);
        let b = doc.create_element("b");
        doc.adopt_as_last_child(a, b);
        let t2 = doc.create_cdata("two");
        doc.adopt_as_last_child(b, t2);
        let c = doc.create_comment("note");
        doc.adopt_as_last_child(a, c);
        doc
    }

    #[test]
    fn test_default_filter_skips_attributes() {
        let doc = sample();
        let mut rec = Recorder::default();
        let flow = doc.walk(doc.root(), &mut rec, NodeTypeSet::default());
        assert_eq!(flow, Walk::Continue);
        assert_eq!(
            rec.events,
            vec!["doc>", "a>", "'one'", "b>", "'two'", "<b", "#comment", "<a", "<doc"]
        );
    }

    #[test]
    fn test_attribute_filter_visits_after_owner() {
        let doc = sample();
        let mut rec = Recorder::default();
        doc.walk(doc.root(), &mut rec, NodeTypeSet::ALL);
        assert_eq!(&rec.events[..3], &["doc>", "a>", "@x"]);
    }

    #[test]
    fn test_text_filter_descends_through_elements() {
        let doc = sample();
        let mut rec = Recorder::default();
        doc.walk(doc.root(), &mut rec, NodeTypeSet::of(&[NodeType::Text]));
        assert_eq!(rec.events, vec!["'one'", "'two'"]);
        assert_eq!(doc.text_content(doc.root()), "onetwo");
    }

    #[test]
    fn test_stop_ends_walk_immediately() {
        let doc = sample();
        let mut rec = Recorder {
            stop_at: Some("'two'".into()),
            ..Recorder::default()
        };
        let flow = doc.walk(doc.root(), &mut rec, NodeTypeSet::default());
        assert_eq!(flow, Walk::Stop);
        assert_eq!(rec.events.last().unwrap(), "'two'");
        assert!(!rec.events.contains(&"<b".to_string()));
    }

    #[test]
    fn test_walk_from_inner_node_stays_in_subtree() {
        let doc = sample();
        let a = doc.root_element().unwrap();
        let b = doc.child_element(a, "b").unwrap();
        let mut rec = Recorder::default();
        doc.walk(b, &mut rec, NodeTypeSet::default());
        assert_eq!(rec.events, vec!["b>", "'two'", "<b"]);
    }

    #[test]
    fn test_deep_walk_is_iterative() {
        let mut doc = Document::new();
        let mut parent = doc.root();
        for _ in 0..200_000 {
            let child = doc.create_element("d");
            doc.append_detached(parent, child);
            parent = child;
        }
        let leaf = doc.create_text("x");
        doc.append_detached(parent, leaf);
        assert_eq!(doc.text_content(doc.root()), "x");
    }

    #[test]
    fn test_type_set_operations() {
        let set = NodeTypeSet::of(&[NodeType::Element, NodeType::Document]);
        assert!(set.contains(NodeType::Element));
        assert!(!set.contains(NodeType::Text));
        assert!(!NodeTypeSet::default().contains(NodeType::Attribute));
        assert!(NodeTypeSet::default().contains(NodeType::Unknown));
        assert_eq!(NodeTypeSet::NONE.with(NodeType::Text), NodeTypeSet::of(&[NodeType::Text]));
    }
}
