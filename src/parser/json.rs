//! JSON grammar producing the markup tree shape.
//!
//! | JSON | Tree |
//! |---|---|
//! | root object | unnamed root Element |
//! | root array | one unnamed top-level Element per entry |
//! | `"key": {...}` | Element `key`, members inside |
//! | `"key": [a, b]` | sibling Elements `key`, one per entry |
//! | `[[...]]` entry | Element with unnamed children |
//! | string, number, `true`, `false` | Text |
//! | `""`, `null` | childless Element |
//! | `"$key": scalar` | Attribute `key` |
//! | `"#text": scalar` | Text child |
//!
//! The attribute prefix and text field name come from [`ParseOptions`].
//! Open containers live on an explicit stack, one position-stack frame each.

use super::input::{is_space, ParserCursor};
use super::ParseOptions;
use crate::error::{ParserPos, WarningKind};
use crate::tree::{Document, NodeId};

/// Returns `true` if `s` is exactly a JSON number lexeme:
/// `-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?`.
pub(crate) fn is_json_number(s: &str) -> bool {
    let b = s.as_bytes();
    let digits = |mut i: usize| {
        while b.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        i
    };

    let mut i = usize::from(b.first() == Some(&b'-'));
    match b.get(i) {
        Some(b'0') => i += 1,
        Some(b'1'..=b'9') => i = digits(i),
        _ => return false,
    }
    if b.get(i) == Some(&b'.') {
        let start = i + 1;
        i = digits(start);
        if i == start {
            return false;
        }
    }
    if matches!(b.get(i), Some(b'e' | b'E')) {
        i += 1;
        if matches!(b.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let start = i;
        i = digits(start);
        if i == start {
            return false;
        }
    }
    i == b.len()
}

/// Characters that end a bare token.
fn is_delimiter(c: char) -> bool {
    is_space(c) || matches!(c, ',' | ':' | '"' | '{' | '}' | '[' | ']')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

impl Container {
    fn closer(self) -> char {
        match self {
            Self::Object => '}',
            Self::Array => ']',
        }
    }
}

/// Where a container is between its members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Start,
    AfterValue,
    AfterComma,
}

#[derive(Debug)]
struct Frame {
    container: Container,
    /// Object: the element receiving the members. Array: the parent of
    /// the entry elements.
    node: NodeId,
    /// Name given to each entry of an array.
    key: String,
    slot: Slot,
}

pub(crate) struct JsonParser<'a, 'o> {
    cursor: ParserCursor<'a>,
    options: &'o ParseOptions,
    doc: Document,
    stack: Vec<Frame>,
}

impl<'a, 'o> JsonParser<'a, 'o> {
    pub fn new(input: &'a str, options: &'o ParseOptions, doc: Document) -> Self {
        Self {
            cursor: ParserCursor::new(input, options.tab_width),
            options,
            doc,
            stack: Vec::new(),
        }
    }

    pub fn parse(mut self) -> Document {
        let base_depth = self.cursor.stack_depth();
        self.cursor.skip_whitespace();
        let root = self.doc.root();
        match self.cursor.peek() {
            None => {}
            Some('{') => {
                let element = self.append_element(root, "");
                self.open(Container::Object, element, String::new());
            }
            Some('[') => self.open(Container::Array, root, String::new()),
            Some(_) => {
                let start = self.cursor.position();
                let value = self.parse_scalar();
                self.cursor.warn_at(
                    WarningKind::IllegalValue,
                    "document must be an object or an array",
                    start,
                );
                let element = self.append_element(root, "");
                self.append_text(element, value);
            }
        }

        while !self.stack.is_empty() {
            self.step();
        }

        self.cursor.skip_whitespace();
        if !self.cursor.at_end() {
            self.cursor
                .warn(WarningKind::DataFoundAfterFinalObjectClose, "");
        }
        self.cursor.drain_positions(base_depth);
        self.doc.warnings = std::mem::take(&mut self.cursor.warnings);
        self.doc
    }

    // -- Containers --

    fn open(&mut self, container: Container, node: NodeId, key: String) {
        self.cursor.push_position();
        self.cursor.advance();
        self.stack.push(Frame {
            container,
            node,
            key,
            slot: Slot::Start,
        });
    }

    fn close(&mut self) {
        self.stack.pop();
        self.cursor.pop_position();
    }

    fn close_unterminated(&mut self) {
        let kind = if self.stack.len() == 1 {
            WarningKind::MustCloseRootObject
        } else {
            WarningKind::MissingObjectClose
        };
        self.cursor.warn(kind, "");
        self.close();
    }

    /// Advances the innermost open container by one token.
    fn step(&mut self) {
        self.cursor.skip_whitespace();
        let Some(frame) = self.stack.last() else {
            return;
        };
        let (container, slot, node) = (frame.container, frame.slot, frame.node);

        match self.cursor.peek() {
            None => self.close_unterminated(),
            Some(c) if c == container.closer() => {
                if slot == Slot::AfterComma {
                    self.cursor.warn(WarningKind::UnexpectedComma, "trailing comma");
                }
                self.cursor.advance();
                self.close();
            }
            // the other closer: this container was never closed
            Some('}' | ']') => self.close_unterminated(),
            Some(',') => {
                if slot == Slot::AfterValue {
                    self.set_slot(Slot::AfterComma);
                } else {
                    self.cursor.warn(WarningKind::UnexpectedComma, "");
                    if container == Container::Array {
                        let key = self.array_key();
                        self.append_element(node, &key);
                        self.set_slot(Slot::AfterComma);
                    }
                }
                self.cursor.advance();
            }
            Some(_) => {
                if slot == Slot::AfterValue {
                    self.cursor
                        .warn(WarningKind::IllegalValue, "missing ',' between values");
                }
                self.set_slot(Slot::AfterValue);
                match container {
                    Container::Object => self.parse_member(node),
                    Container::Array => {
                        let key = self.array_key();
                        self.parse_value(node, &key, false);
                    }
                }
            }
        }
    }

    fn set_slot(&mut self, slot: Slot) {
        if let Some(frame) = self.stack.last_mut() {
            frame.slot = slot;
        }
    }

    fn array_key(&self) -> String {
        self.stack
            .last()
            .map(|frame| frame.key.clone())
            .unwrap_or_default()
    }

    // -- Members and values --

    fn parse_member(&mut self, owner: NodeId) {
        let key_pos = self.cursor.position();
        let key = self.parse_key();
        self.cursor.skip_whitespace();
        if !self.cursor.eat(":") {
            self.cursor
                .warn(WarningKind::MissingColonBetweenStringAndValue, key.as_str());
        }
        self.cursor.skip_whitespace();
        let structured = matches!(self.cursor.peek(), Some('{' | '['));

        if let Some(name) = key.strip_prefix(self.options.json_attribute_prefix) {
            if name.is_empty() {
                self.cursor
                    .warn_at(WarningKind::AttributePrefixWithoutName, key.as_str(), key_pos);
                if !structured {
                    self.parse_scalar();
                    return;
                }
            } else if structured {
                self.cursor
                    .warn_at(WarningKind::AttributePrefixAtRoot, key.as_str(), key_pos);
            } else {
                let value = self.parse_scalar().unwrap_or_default();
                self.set_attribute(owner, name, &value, key_pos);
                return;
            }
        } else if key == self.options.json_text_field {
            if !structured {
                let value = self.parse_scalar();
                self.append_text(owner, value);
                return;
            }
            self.cursor
                .warn_at(WarningKind::IllegalValue, key.as_str(), key_pos);
        }

        self.parse_value(owner, &key, true);
    }

    /// Parses one value named `name` below `parent`. An array that is the
    /// value of an object member spreads into siblings; an array nested in
    /// an array becomes an element with unnamed children.
    fn parse_value(&mut self, parent: NodeId, name: &str, member: bool) {
        match self.cursor.peek() {
            Some('{') => {
                let element = self.append_element(parent, name);
                self.open(Container::Object, element, String::new());
            }
            Some('[') if member => self.open(Container::Array, parent, name.to_string()),
            Some('[') => {
                let element = self.append_element(parent, name);
                self.open(Container::Array, element, String::new());
            }
            _ => {
                let value = self.parse_scalar();
                let element = self.append_element(parent, name);
                self.append_text(element, value);
            }
        }
    }

    fn parse_key(&mut self) -> String {
        if self.cursor.peek() == Some('"') {
            return self.parse_string();
        }
        let start = self.cursor.position();
        let word = self.cursor.take_while(|c| !is_delimiter(c));
        if word.is_empty() {
            self.cursor.warn(WarningKind::MissingPairString, "");
        } else {
            self.cursor
                .warn_at(WarningKind::MissingStringQuotes, word, start);
        }
        word.to_string()
    }

    /// Parses a scalar. `None` stands for `null` or a missing value.
    fn parse_scalar(&mut self) -> Option<String> {
        match self.cursor.peek() {
            None | Some(',' | '}' | ']') => {
                self.cursor.warn(WarningKind::IllegalValue, "missing value");
                None
            }
            Some('"') => Some(self.parse_string()),
            Some(_) => self.parse_token(),
        }
    }

    fn parse_token(&mut self) -> Option<String> {
        let start = self.cursor.position();
        let mut token = self.cursor.take_while(|c| !is_delimiter(c));
        if token.is_empty() {
            self.cursor.advance();
            token = self.cursor.slice(start, self.cursor.position());
        }
        match token {
            "null" => None,
            "true" | "false" => Some(token.to_string()),
            _ if is_json_number(token) => Some(token.to_string()),
            _ if token.starts_with(|c: char| c == '-' || c.is_ascii_digit()) => {
                self.cursor
                    .warn_at(WarningKind::IllegalNumberSequence, token, start);
                Some(token.to_string())
            }
            _ => {
                self.cursor.warn_at(WarningKind::IllegalValue, token, start);
                Some(token.to_string())
            }
        }
    }

    fn parse_string(&mut self) -> String {
        let open_pos = self.cursor.position();
        self.cursor.advance();
        let mut out = String::new();
        loop {
            match self.cursor.advance() {
                None => {
                    self.cursor.warn_at(
                        WarningKind::MissingStringQuotes,
                        "unterminated string",
                        open_pos,
                    );
                    break;
                }
                Some('"') => break,
                Some('\\') => self.parse_escape(&mut out),
                Some(c) => out.push(c),
            }
        }
        out
    }

    /// Called after a backslash. Invalid escapes are kept literally.
    fn parse_escape(&mut self, out: &mut String) {
        let decoded = match self.cursor.peek() {
            Some(c @ ('"' | '\\' | '/')) => Some(c),
            Some('b') => Some('\u{8}'),
            Some('f') => Some('\u{c}'),
            Some('n') => Some('\n'),
            Some('r') => Some('\r'),
            Some('t') => Some('\t'),
            Some('u') => {
                self.cursor.advance();
                self.parse_unicode_escape(out);
                return;
            }
            _ => None,
        };
        match decoded {
            Some(c) => {
                self.cursor.advance();
                out.push(c);
            }
            None => {
                let detail = self.cursor.peek().map(|c| format!("\\{c}")).unwrap_or_default();
                self.cursor.warn(WarningKind::InvalidEscapeSequence, detail);
                out.push('\\');
            }
        }
    }

    /// Called after `\u`. Joins surrogate pairs; anything undecodable is
    /// kept literally.
    fn parse_unicode_escape(&mut self, out: &mut String) {
        let Some(high) = self.read_hex4() else {
            self.cursor.warn(WarningKind::InvalidUnicodeEscapeSequence, "");
            out.push_str("\\u");
            return;
        };
        self.cursor.advance_by(4);
        let code = if (0xD800..0xDC00).contains(&high) && self.cursor.looking_at("\\u") {
            let checkpoint = self.cursor.position();
            self.cursor.advance_by(2);
            match self.read_hex4() {
                Some(low) if (0xDC00..0xE000).contains(&low) => {
                    self.cursor.advance_by(4);
                    0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
                }
                _ => {
                    self.cursor.seek(checkpoint);
                    high
                }
            }
        } else {
            high
        };
        match char::from_u32(code) {
            Some(c) => out.push(c),
            None => {
                let literal = format!("\\u{high:04x}");
                let at = self.cursor.offset(self.cursor.position(), -6);
                self.cursor
                    .warn_at(WarningKind::InvalidUnicodeEscapeSequence, literal.as_str(), at);
                out.push_str(&literal);
            }
        }
    }

    fn read_hex4(&self) -> Option<u32> {
        let hex: String = self.cursor.rest().chars().take(4).collect();
        if hex.len() == 4 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            u32::from_str_radix(&hex, 16).ok()
        } else {
            None
        }
    }

    // -- Tree building --

    fn append_element(&mut self, parent: NodeId, name: &str) -> NodeId {
        let element = self.doc.create_element(name);
        self.doc.append_detached(parent, element);
        element
    }

    fn append_text(&mut self, parent: NodeId, value: Option<String>) {
        if let Some(text) = value.filter(|t| !t.is_empty()) {
            let node = self.doc.create_text(&text);
            self.doc.append_detached(parent, node);
        }
    }

    fn set_attribute(&mut self, owner: NodeId, name: &str, value: &str, at: ParserPos) {
        if let Some(existing) = self.doc.attribute_node(owner, name) {
            self.cursor
                .warn_at(WarningKind::DuplicateAttribute, name, at);
            self.doc.set_node_value(existing, value);
        } else {
            let attr = self.doc.create_attribute(name, value);
            self.doc.append_detached(owner, attr);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tree::NodeType;
    use pretty_assertions::assert_eq;

    fn parse(input: &str) -> Document {
        let options = ParseOptions::default();
        let doc = JsonParser::new(input, &options, options.new_document()).parse();
        doc.check_invariants().unwrap();
        doc
    }

    fn kinds(doc: &Document) -> Vec<WarningKind> {
        doc.warnings.iter().map(|w| w.kind).collect()
    }

    fn names(doc: &Document, parent: NodeId) -> Vec<String> {
        doc.children(parent)
            .filter_map(|c| doc.node_name(c).map(str::to_string))
            .collect()
    }

    #[test]
    fn test_is_json_number() {
        for ok in ["0", "-0", "12", "1.5", "-3.25e10", "1E+2", "0.0e-1"] {
            assert!(is_json_number(ok), "{ok}");
        }
        for bad in ["", "-", "01", "1.", ".5", "1e", "+1", "1.2.3", "0x10", " 1"] {
            assert!(!is_json_number(bad), "{bad}");
        }
    }

    #[test]
    fn test_attribute_and_text_field() {
        let doc = parse(r##"{"$test":"hello","#text":"Tove"}"##);
        assert!(doc.warnings.is_empty());
        let root = doc.root_element().unwrap();
        assert_eq!(doc.node_name(root), Some(""));
        assert_eq!(doc.attribute(root, "test"), Some("hello"));
        assert_eq!(doc.text_content(root), "Tove");
    }

    #[test]
    fn test_nested_objects_and_scalars() {
        let doc = parse(r#"{"a":{"b":1,"c":true,"d":null,"e":""}}"#);
        assert!(doc.warnings.is_empty());
        let root = doc.root_element().unwrap();
        let a = doc.child_element(root, "a").unwrap();
        assert_eq!(names(&doc, a), vec!["b", "c", "d", "e"]);
        assert_eq!(doc.text_content(doc.child_element(a, "b").unwrap()), "1");
        assert_eq!(doc.text_content(doc.child_element(a, "c").unwrap()), "true");
        assert!(doc.first_child(doc.child_element(a, "d").unwrap()).is_none());
        assert!(doc.first_child(doc.child_element(a, "e").unwrap()).is_none());
    }

    #[test]
    fn test_array_spreads_into_siblings() {
        let doc = parse(r#"{"foo":[1,{"x":2},[3,4]],"bar":[]}"#);
        assert!(doc.warnings.is_empty());
        let root = doc.root_element().unwrap();
        assert_eq!(names(&doc, root), vec!["foo", "foo", "foo"]);
        let third = doc.last_child(root).unwrap();
        assert_eq!(names(&doc, third), vec!["", ""]);
        assert_eq!(doc.text_content(third), "34");
    }

    #[test]
    fn test_root_array() {
        let doc = parse("[1, 2]");
        assert!(doc.warnings.is_empty());
        assert_eq!(names(&doc, doc.root()), vec!["", ""]);
    }

    #[test]
    fn test_unexpected_commas() {
        let doc = parse(r#"{"foo":[1,2,,3]}"#);
        assert_eq!(kinds(&doc), vec![WarningKind::UnexpectedComma]);
        let root = doc.root_element().unwrap();
        assert_eq!(doc.children(root).count(), 4);

        let doc = parse(r#"{"foo":[1,]}"#);
        assert_eq!(kinds(&doc), vec![WarningKind::UnexpectedComma]);
        assert_eq!(doc.children(doc.root_element().unwrap()).count(), 1);

        let doc = parse(r#"{,"a":1}"#);
        assert_eq!(kinds(&doc), vec![WarningKind::UnexpectedComma]);
        assert_eq!(doc.children(doc.root_element().unwrap()).count(), 1);
    }

    #[test]
    fn test_missing_quotes_and_colon() {
        let doc = parse(r#"{a:1, "b" 2}"#);
        assert_eq!(
            kinds(&doc),
            vec![
                WarningKind::MissingStringQuotes,
                WarningKind::MissingColonBetweenStringAndValue
            ]
        );
        let root = doc.root_element().unwrap();
        assert_eq!(names(&doc, root), vec!["a", "b"]);
    }

    #[test]
    fn test_missing_pair_string() {
        let doc = parse(r#"{:1}"#);
        assert_eq!(kinds(&doc), vec![WarningKind::MissingPairString]);
        let root = doc.root_element().unwrap();
        assert_eq!(names(&doc, root), vec![""]);
    }

    #[test]
    fn test_escapes() {
        let doc = parse(r#"{"a":"x\ny\u0041\ud83d\ude00\"\/"}"#);
        assert!(doc.warnings.is_empty());
        assert_eq!(doc.text_content(doc.root()), "x\nyA\u{1F600}\"/");

        let doc = parse(r#"{"a":"\q"}"#);
        assert_eq!(kinds(&doc), vec![WarningKind::InvalidEscapeSequence]);
        assert_eq!(doc.text_content(doc.root()), "\\q");

        let doc = parse(r#"{"a":"\u12G4"}"#);
        assert_eq!(kinds(&doc), vec![WarningKind::InvalidUnicodeEscapeSequence]);
        assert_eq!(doc.text_content(doc.root()), "\\u12G4");

        let doc = parse(r#"{"a":"\ud800x"}"#);
        assert_eq!(kinds(&doc), vec![WarningKind::InvalidUnicodeEscapeSequence]);
        assert_eq!(doc.text_content(doc.root()), "\\ud800x");
        // reported at the backslash that starts the escape
        assert_eq!(doc.warnings[0].position().column, 7);
    }

    #[test]
    fn test_illegal_number_and_value() {
        let doc = parse(r#"{"a":01,"b":nope}"#);
        assert_eq!(
            kinds(&doc),
            vec![WarningKind::IllegalNumberSequence, WarningKind::IllegalValue]
        );
        assert_eq!(doc.text_content(doc.root()), "01nope");
    }

    #[test]
    fn test_unclosed_containers() {
        let doc = parse(r#"{"a":{"b":[1"#);
        assert_eq!(
            kinds(&doc),
            vec![
                WarningKind::MissingObjectClose,
                WarningKind::MissingObjectClose,
                WarningKind::MustCloseRootObject
            ]
        );
        assert_eq!(doc.warnings[0].positions.len(), 4);
    }

    #[test]
    fn test_wrong_closing_bracket() {
        let doc = parse(r#"{"a":[1}"#);
        assert_eq!(kinds(&doc), vec![WarningKind::MissingObjectClose]);
        let root = doc.root_element().unwrap();
        assert_eq!(names(&doc, root), vec!["a"]);
    }

    #[test]
    fn test_data_after_root() {
        let doc = parse(r#"{"a":1} {"b":2}"#);
        assert_eq!(kinds(&doc), vec![WarningKind::DataFoundAfterFinalObjectClose]);
        assert_eq!(names(&doc, doc.root_element().unwrap()), vec!["a"]);
    }

    #[test]
    fn test_attribute_prefix_errors() {
        let doc = parse(r#"{"$":1,"$x":{"y":2},"$a":1,"$a":2}"#);
        assert_eq!(
            kinds(&doc),
            vec![
                WarningKind::AttributePrefixWithoutName,
                WarningKind::AttributePrefixAtRoot,
                WarningKind::DuplicateAttribute
            ]
        );
        let root = doc.root_element().unwrap();
        assert_eq!(names(&doc, root), vec!["$x"]);
        assert_eq!(doc.attribute(root, "a"), Some("2"));
    }

    #[test]
    fn test_text_field_with_object_is_illegal() {
        let doc = parse(r##"{"#text":{"a":1}}"##);
        assert_eq!(kinds(&doc), vec![WarningKind::IllegalValue]);
        let root = doc.root_element().unwrap();
        assert_eq!(names(&doc, root), vec!["#text"]);
    }

    #[test]
    fn test_scalar_root() {
        let doc = parse("42");
        assert_eq!(kinds(&doc), vec![WarningKind::IllegalValue]);
        assert_eq!(doc.text_content(doc.root()), "42");
    }

    #[test]
    fn test_custom_conventions() {
        let options = ParseOptions::default()
            .json_attribute_prefix('@')
            .json_text_field("_");
        let doc = JsonParser::new(r#"{"@id":7,"_":"body","$k":1}"#, &options, options.new_document())
            .parse();
        assert!(doc.warnings.is_empty());
        let root = doc.root_element().unwrap();
        assert_eq!(doc.attribute(root, "id"), Some("7"));
        assert!(doc.child_element(root, "$k").is_some());
        let first = doc.first_child(root).unwrap();
        assert_eq!(doc.node_type(first), NodeType::Text);
    }

    #[test]
    fn test_deep_arrays_do_not_overflow() {
        let depth = 50_000;
        let input = format!("{{\"a\":{}{}}}", "[".repeat(depth), "]".repeat(depth));
        let doc = parse(&input);
        assert!(doc.warnings.is_empty());
    }
}
