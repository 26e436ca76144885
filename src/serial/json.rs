//! JSON generation.
//!
//! Each element is mapped onto JSON from its local shape in the tree:
//!
//! * encoding: a run of adjacent element siblings sharing a name becomes one
//!   array field (first / middle / last entries place the brackets and
//!   commas); any other element is a plain object field.
//! * child state: no attributes and no text or element children gives `""`,
//!   text only gives a scalar, anything else a nested object holding the
//!   attributes as prefixed fields, then the text field, then child elements.
//! * text: a value that is a legal JSON number is written bare, anything else
//!   as a string.
//!
//! An element the walk starts from is written as an object without a key.
//! A whole document with one top-level element is written the same way; with
//! several, the top-level elements become fields of an outer object, or the
//! entries of an outer array when none of them has a name (what a JSON root
//! array parses into). Comments, declarations and unknown nodes have no JSON
//! form and are skipped.

use std::borrow::Cow;

use super::{Output, WriteOptions};
use crate::parser::json::is_json_number;
use crate::tree::{names_equal, Document, NodeId, NodeKind, NodeType, NodeTypeSet, Sink, Walk};

pub(super) fn write<O: Output>(doc: &Document, start: NodeId, options: &WriteOptions, out: &mut O) {
    let (root, entries) = match doc.node_type(start) {
        NodeType::Element => (start, false),
        NodeType::Document => {
            let mut elements = doc.child_elements(start);
            match (elements.next(), elements.next()) {
                (None, _) => {
                    out.put_str("{}");
                    return;
                }
                (Some(only), None) => (only, false),
                _ => (
                    start,
                    doc.child_elements(start)
                        .all(|e| doc.node_name(e).is_some_and(str::is_empty)),
                ),
            }
        }
        _ => {
            out.put_str("{}");
            return;
        }
    };
    let mut sink = JsonSink {
        out,
        options,
        root,
        entries,
        depth: 0,
        fields: Vec::new(),
        frames: Vec::new(),
    };
    doc.walk(
        root,
        &mut sink,
        NodeTypeSet::of(&[NodeType::Document, NodeType::Element]),
    );
}

/// Where an element sits in a run of same-named siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunPosition {
    First,
    Middle,
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Object,
    Array(RunPosition),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChildState {
    /// Nothing to say: written as `""`.
    Empty,
    /// Text children only: written as a scalar.
    TextOnly,
    /// Attributes or element children: written as an object.
    Complex,
}

/// An element whose exit is still pending.
struct Frame {
    encoding: Encoding,
    complex: bool,
}

struct JsonSink<'w, O: Output> {
    out: &'w mut O,
    options: &'w WriteOptions,
    root: NodeId,
    /// Top-level elements are bare array entries rather than fields.
    entries: bool,
    depth: usize,
    /// Fields written so far, one counter per open object.
    fields: Vec<usize>,
    frames: Vec<Frame>,
}

impl<O: Output> JsonSink<'_, O> {
    fn newline(&mut self) {
        if self.options.pretty {
            self.out.put_char('\n');
            for _ in 0..self.depth {
                self.out.put_str(&self.options.indent);
            }
        }
    }

    fn begin_field(&mut self) {
        if let Some(count) = self.fields.last_mut() {
            if *count > 0 {
                self.out.put_char(',');
            }
            *count += 1;
        }
        self.newline();
    }

    fn colon(&mut self) {
        self.out
            .put_str(if self.options.pretty { ": " } else { ":" });
    }

    fn value(&mut self, text: &str) {
        if is_json_number(text) {
            self.out.put_str(text);
        } else {
            write_string(self.out, text);
        }
    }

    fn open_object(&mut self, doc: &Document, id: NodeId) {
        self.out.put_char('{');
        self.depth += 1;
        self.fields.push(0);

        let mut prefix = [0u8; 4];
        let prefix: &str = self.options.json_attribute_prefix.encode_utf8(&mut prefix);
        for attr in doc.attributes(id) {
            if let NodeKind::Attribute { name, value } = &doc.node(attr).kind {
                self.begin_field();
                self.out.put_char('"');
                write_escaped(self.out, prefix);
                write_escaped(self.out, name);
                self.out.put_char('"');
                self.colon();
                self.value(value);
            }
        }

        let text = inline_text(doc, id);
        if !text.is_empty() {
            self.begin_field();
            write_string(self.out, &self.options.json_text_field);
            self.colon();
            self.value(&text);
        }
    }

    fn close_object(&mut self) {
        self.close('}');
    }

    fn close(&mut self, bracket: char) {
        let count = self.fields.pop().unwrap_or(0);
        self.depth -= 1;
        if count > 0 {
            self.newline();
        }
        self.out.put_char(bracket);
    }
}

impl<O: Output> Sink for JsonSink<'_, O> {
    fn document_entry(&mut self, _doc: &Document, _id: NodeId) -> Walk {
        self.out.put_char(if self.entries { '[' } else { '{' });
        self.depth += 1;
        self.fields.push(0);
        Walk::Continue
    }

    fn document_exit(&mut self, _doc: &Document, _id: NodeId) -> Walk {
        self.close(if self.entries { ']' } else { '}' });
        Walk::Continue
    }

    fn element_entry(&mut self, doc: &Document, id: NodeId) -> Walk {
        if id == self.root {
            self.open_object(doc, id);
            self.frames.push(Frame {
                encoding: Encoding::Object,
                complex: true,
            });
            return Walk::Continue;
        }

        let entry = self.entries && doc.parent(id) == Some(self.root);
        let encoding = if entry {
            Encoding::Object
        } else {
            encoding_of(doc, id)
        };
        match encoding {
            Encoding::Object if entry => self.begin_field(),
            Encoding::Object | Encoding::Array(RunPosition::First) => {
                self.begin_field();
                write_string(self.out, doc.node_name(id).unwrap_or_default());
                self.colon();
                if encoding != Encoding::Object {
                    self.out.put_char('[');
                    self.depth += 1;
                    self.newline();
                }
            }
            Encoding::Array(_) => {
                self.out.put_char(',');
                self.newline();
            }
        }

        let state = child_state(doc, id);
        match state {
            ChildState::Empty => self.out.put_str("\"\""),
            ChildState::TextOnly => self.value(&inline_text(doc, id)),
            ChildState::Complex => self.open_object(doc, id),
        }
        self.frames.push(Frame {
            encoding,
            complex: state == ChildState::Complex,
        });
        Walk::Continue
    }

    fn element_exit(&mut self, _doc: &Document, _id: NodeId) -> Walk {
        let Some(frame) = self.frames.pop() else {
            return Walk::Continue;
        };
        if frame.complex {
            self.close_object();
        }
        if frame.encoding == Encoding::Array(RunPosition::Last) {
            self.depth -= 1;
            self.newline();
            self.out.put_char(']');
        }
        Walk::Continue
    }
}

/// The nearest element sibling in one direction, skipping other node kinds.
fn adjacent_element(doc: &Document, id: NodeId, forward: bool) -> Option<NodeId> {
    let step = |n| {
        if forward {
            doc.next_sibling(n)
        } else {
            doc.prev_sibling(n)
        }
    };
    let mut current = step(id);
    while let Some(n) = current {
        if doc.node_type(n) == NodeType::Element {
            return Some(n);
        }
        current = step(n);
    }
    None
}

fn encoding_of(doc: &Document, id: NodeId) -> Encoding {
    let name = doc.node_name(id).unwrap_or_default();
    let same_name = |other: Option<NodeId>| {
        other
            .and_then(|n| doc.node_name(n))
            .is_some_and(|n| names_equal(n, name, doc.element_case_sensitive))
    };
    match (
        same_name(adjacent_element(doc, id, false)),
        same_name(adjacent_element(doc, id, true)),
    ) {
        (false, false) => Encoding::Object,
        (false, true) => Encoding::Array(RunPosition::First),
        (true, true) => Encoding::Array(RunPosition::Middle),
        (true, false) => Encoding::Array(RunPosition::Last),
    }
}

fn child_state(doc: &Document, id: NodeId) -> ChildState {
    if doc.first_attribute(id).is_some() || doc.child_elements(id).next().is_some() {
        ChildState::Complex
    } else if doc
        .children(id)
        .any(|c| doc.node_type(c) == NodeType::Text)
    {
        ChildState::TextOnly
    } else {
        ChildState::Empty
    }
}

/// The element's own text children, concatenated.
fn inline_text(doc: &Document, id: NodeId) -> Cow<'_, str> {
    let mut texts = doc.children(id).filter_map(|c| match &doc.node(c).kind {
        NodeKind::Text { content, .. } => Some(content.as_str()),
        _ => None,
    });
    let Some(first) = texts.next() else {
        return Cow::Borrowed("");
    };
    match texts.next() {
        None => Cow::Borrowed(first),
        Some(second) => {
            let mut joined = String::from(first);
            joined.push_str(second);
            texts.for_each(|t| joined.push_str(t));
            Cow::Owned(joined)
        }
    }
}

fn write_string<O: Output>(out: &mut O, s: &str) {
    out.put_char('"');
    write_escaped(out, s);
    out.put_char('"');
}

/// Writes `s` with JSON string escapes; control characters without a short
/// form become `\u00XX`.
fn write_escaped<O: Output>(out: &mut O, s: &str) {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut plain_from = 0;
    for (i, c) in s.char_indices() {
        let mut unicode = [b'\\', b'u', b'0', b'0', b'0', b'0'];
        let escape: &str = match c {
            '"' => "\\\"",
            '\\' => "\\\\",
            '\n' => "\\n",
            '\r' => "\\r",
            '\t' => "\\t",
            '\u{8}' => "\\b",
            '\u{c}' => "\\f",
            c if u32::from(c) < 0x20 => {
                let code = u32::from(c) as usize;
                unicode[4] = HEX[code >> 4];
                unicode[5] = HEX[code & 0xF];
                std::str::from_utf8(&unicode).unwrap_or("\\u0000")
            }
            _ => continue,
        };
        out.put_str(&s[plain_from..i]);
        out.put_str(escape);
        plain_from = i + c.len_utf8();
    }
    out.put_str(&s[plain_from..]);
}
