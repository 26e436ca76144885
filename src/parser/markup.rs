//! Markup grammar.
//!
//! The parser keeps the chain of open elements on an explicit stack
//! (`open`), so input nesting depth never turns into call-stack depth. Every
//! open element owns exactly one frame on the cursor's position stack; the
//! two stacks are pushed and popped together, and whatever is still open at
//! end of input is drained by [`MarkupParser::finish`].
//!
//! Recognized constructs:
//!
//! | Input | Node |
//! |---|---|
//! | `<name a="v" b=v c>` ... `</name>` | Element with Attributes |
//! | `<name/>`, or a void name | childless Element |
//! | text | Text (entities decoded) |
//! | `<![CDATA[ ... ]]>` | Text with `cdata` set |
//! | `<!-- ... -->` | Comment |
//! | `<?name a="v" ?>` | Declaration with Attributes |
//! | `<! ... >` | Unknown, kept verbatim |

use super::input::{decode_entities, is_name_start_char, is_space, ParserCursor};
use super::ParseOptions;
use crate::error::{ParserPos, WarningKind};
use crate::tree::{names_equal, Document, NodeId};

/// How a start tag or declaration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagEnd {
    /// `>`: an element stays open for content.
    Open,
    /// `/>` or `?>`: nothing follows.
    Closed,
}

/// Which tag the attribute loop is reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Element,
    Declaration,
}

pub(crate) struct MarkupParser<'a, 'o> {
    cursor: ParserCursor<'a>,
    options: &'o ParseOptions,
    doc: Document,
    /// Open elements, outermost first.
    open: Vec<NodeId>,
}

impl<'a, 'o> MarkupParser<'a, 'o> {
    pub fn new(input: &'a str, options: &'o ParseOptions, doc: Document) -> Self {
        Self {
            cursor: ParserCursor::new(input, options.tab_width),
            options,
            doc,
            open: Vec::new(),
        }
    }

    /// Runs the parser to the end of input and returns the document.
    pub fn parse(mut self) -> Document {
        let base_depth = self.cursor.stack_depth();
        while let Some(c) = self.cursor.peek() {
            if c == '<' && self.at_construct() {
                self.parse_construct();
            } else {
                self.parse_text();
            }
        }
        self.finish(base_depth);
        debug_assert_eq!(self.cursor.stack_depth(), base_depth);
        self.doc.warnings = std::mem::take(&mut self.cursor.warnings);
        self.doc
    }

    fn current(&self) -> NodeId {
        self.open.last().copied().unwrap_or_else(|| self.doc.root())
    }

    /// Whether the `<` under the cursor opens a tag or special section.
    /// Any other `<` is literal text.
    fn at_construct(&self) -> bool {
        matches!(self.cursor.peek_nth(1), Some(c) if c == '/' || c == '!' || c == '?' || is_name_start_char(c))
    }

    fn parse_construct(&mut self) {
        if self.cursor.looking_at("<!--") {
            self.parse_comment();
        } else if self.cursor.looking_at("<![CDATA[") {
            self.parse_cdata();
        } else if self.cursor.looking_at("<!") {
            self.parse_unknown();
        } else if self.cursor.looking_at("<?") {
            self.parse_declaration();
        } else if self.cursor.looking_at("</") {
            self.parse_end_tag();
        } else {
            self.parse_start_tag();
        }
    }

    // -- Text --

    fn parse_text(&mut self) {
        let start = self.cursor.position();
        loop {
            self.cursor.take_until("<");
            if self.cursor.at_end() || self.at_construct() {
                break;
            }
            self.cursor.advance();
        }
        let raw = self.cursor.slice(start, self.cursor.position());
        if !self.options.keep_blank_text && raw.chars().all(is_space) {
            return;
        }
        let text = self.doc.create_text(&decode_entities(raw));
        let parent = self.current();
        self.doc.append_detached(parent, text);
    }

    // -- Comments, CDATA, unknown tags --

    fn parse_comment(&mut self) {
        self.cursor.push_position();
        self.cursor.eat("<!--");
        let (content, closed) = self.cursor.take_until("-->");
        if closed {
            self.cursor.eat("-->");
        } else {
            self.cursor.warn(WarningKind::NoEndCommentFound, "");
        }
        let comment = self.doc.create_comment(content);
        let parent = self.current();
        self.doc.append_detached(parent, comment);
        self.cursor.pop_position();
    }

    fn parse_cdata(&mut self) {
        self.cursor.push_position();
        self.cursor.eat("<![CDATA[");
        let (content, closed) = self.cursor.take_until("]]>");
        if closed {
            self.cursor.eat("]]>");
        } else {
            self.cursor.warn(WarningKind::NoEndUnknownTagFound, "CDATA");
        }
        let text = self.doc.create_cdata(content);
        let parent = self.current();
        self.doc.append_detached(parent, text);
        self.cursor.pop_position();
    }

    /// `<!...>`: everything up to the `>` that is outside quotes and
    /// outside `[...]` nesting, so DOCTYPE internal subsets come through
    /// whole.
    fn parse_unknown(&mut self) {
        self.cursor.push_position();
        self.cursor.advance();
        let start = self.cursor.position();
        let mut depth = 0usize;
        let mut quote = None;
        let content = loop {
            let Some(c) = self.cursor.peek() else {
                self.cursor.warn(WarningKind::NoEndUnknownTagFound, "");
                break self.cursor.slice(start, self.cursor.position());
            };
            match (quote, c) {
                (Some(q), _) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"' | '\'') => quote = Some(c),
                (None, '[') => depth += 1,
                (None, ']') => depth = depth.saturating_sub(1),
                (None, '>') if depth == 0 => {
                    let content = self.cursor.slice(start, self.cursor.position());
                    self.cursor.advance();
                    break content;
                }
                _ => {}
            }
            self.cursor.advance();
        };
        let unknown = self.doc.create_unknown(content);
        let parent = self.current();
        self.doc.append_detached(parent, unknown);
        self.cursor.pop_position();
    }

    // -- Declarations --

    fn parse_declaration(&mut self) {
        self.cursor.push_position();
        self.cursor.eat("<?");
        let name = self.cursor.parse_name().unwrap_or_default();
        let decl = self.doc.create_declaration(name);
        let parent = self.current();
        self.doc.append_detached(parent, decl);
        self.parse_attributes(decl, TagKind::Declaration);
        self.cursor.pop_position();
    }

    // -- Elements --

    fn parse_start_tag(&mut self) {
        self.cursor.push_position();
        self.cursor.advance();
        let Some(name) = self.cursor.parse_name() else {
            panic!("start tag without a name at {}", self.cursor.position());
        };
        let element = self.doc.create_element(name);
        let parent = self.current();
        self.doc.append_detached(parent, element);

        let end = self.parse_attributes(element, TagKind::Element);
        if end == TagEnd::Closed || self.options.is_void(name) {
            self.cursor.pop_position();
        } else {
            self.open.push(element);
        }
    }

    /// Reads attributes up to the end of a start tag or declaration.
    fn parse_attributes(&mut self, owner: NodeId, kind: TagKind) -> TagEnd {
        loop {
            self.cursor.skip_whitespace();
            let Some(c) = self.cursor.peek() else {
                let warning = match kind {
                    TagKind::Element => WarningKind::NoEndBracketFound,
                    TagKind::Declaration => WarningKind::NoEndDeclarationFound,
                };
                let name = self.owner_name(owner);
                self.cursor.warn(warning, name);
                return TagEnd::Open;
            };
            match (kind, c) {
                (TagKind::Element, '>') => {
                    self.cursor.advance();
                    return TagEnd::Open;
                }
                (TagKind::Element, '/') => {
                    self.parse_close_slash(owner);
                    return TagEnd::Closed;
                }
                (TagKind::Element, '<') => {
                    let name = self.owner_name(owner);
                    self.cursor.warn(WarningKind::NoEndBracketFound, name);
                    return TagEnd::Open;
                }
                (TagKind::Declaration, '?') if self.cursor.looking_at("?>") => {
                    self.cursor.eat("?>");
                    return TagEnd::Closed;
                }
                (TagKind::Declaration, '>') => {
                    let name = self.owner_name(owner);
                    self.cursor.warn(WarningKind::NotProperEndDeclaration, name);
                    self.cursor.advance();
                    return TagEnd::Closed;
                }
                (TagKind::Declaration, '<') => {
                    let name = self.owner_name(owner);
                    self.cursor.warn(WarningKind::NoEndDeclarationFound, name);
                    return TagEnd::Closed;
                }
                (_, c) if is_name_start_char(c) => self.parse_attribute(owner),
                _ => self.skip_illegal_attribute(),
            }
        }
    }

    /// `/` inside a start tag: the element is self-closed, whatever follows.
    fn parse_close_slash(&mut self, owner: NodeId) {
        self.cursor.advance();
        self.cursor.skip_whitespace();
        if self.cursor.eat(">") {
            return;
        }
        let junk = self.cursor.take_while(|c| c != '>' && c != '<');
        self.cursor
            .warn(WarningKind::ContentAfterCloseSlashInElement, junk.trim());
        if !self.cursor.eat(">") {
            let name = self.owner_name(owner);
            self.cursor.warn(WarningKind::NoEndBracketFound, name);
        }
    }

    fn skip_illegal_attribute(&mut self) {
        let start = self.cursor.position();
        self.cursor.advance();
        while let Some(c) = self.cursor.peek() {
            if is_space(c) || matches!(c, '>' | '/' | '<' | '?') {
                break;
            }
            self.cursor.advance();
        }
        let junk = self.cursor.slice(start, self.cursor.position());
        self.cursor
            .warn_at(WarningKind::IllegalAttributeName, junk, start);
    }

    fn parse_attribute(&mut self, owner: NodeId) {
        let start = self.cursor.position();
        let name = self.cursor.parse_name().unwrap_or_default();
        self.cursor.skip_whitespace();

        let value = if self.cursor.eat("=") {
            self.cursor.skip_whitespace();
            self.parse_attribute_value(name)
        } else {
            self.cursor
                .warn_at(WarningKind::AttributeWithoutValue, name, start);
            String::new()
        };

        if let Some(existing) = self.doc.attribute_node(owner, name) {
            self.cursor
                .warn_at(WarningKind::DuplicateAttribute, name, start);
            self.doc.set_node_value(existing, &value);
        } else {
            let attr = self.doc.create_attribute(name, &value);
            self.doc.append_detached(owner, attr);
        }
    }

    fn parse_attribute_value(&mut self, name: &str) -> String {
        match self.cursor.peek() {
            Some(quote @ ('"' | '\'')) => {
                let quote_pos = self.cursor.position();
                self.cursor.advance();
                let closing = if quote == '"' { "\"" } else { "'" };
                if self.cursor.rest().contains(quote) {
                    let (raw, _) = self.cursor.take_until(closing);
                    self.cursor.advance();
                    decode_entities(raw).into_owned()
                } else {
                    self.cursor
                        .warn_at(WarningKind::AttributeValueMissingEndQuote, name, quote_pos);
                    let raw = self.cursor.take_while(|c| c != '>');
                    decode_entities(raw).into_owned()
                }
            }
            _ => {
                let start = self.cursor.position();
                while let Some(c) = self.cursor.peek() {
                    if is_space(c) || c == '>' || c == '<' || self.cursor.looking_at("/>") {
                        break;
                    }
                    self.cursor.advance();
                }
                let raw = self.cursor.slice(start, self.cursor.position());
                if raw.is_empty() {
                    self.cursor.warn(WarningKind::AttributeValueNotFound, name);
                }
                decode_entities(raw).into_owned()
            }
        }
    }

    fn owner_name(&self, owner: NodeId) -> String {
        self.doc.node_name(owner).unwrap_or_default().to_string()
    }

    // -- End tags --

    fn parse_end_tag(&mut self) {
        let tag_pos = self.cursor.position();
        self.cursor.eat("</");
        let name = self.cursor.parse_name().unwrap_or_default();
        self.cursor.skip_whitespace();
        match self.cursor.peek() {
            Some('>') => {
                self.cursor.advance();
            }
            None | Some('<') => {
                self.cursor.warn(WarningKind::NoEndBracketFound, name);
            }
            Some(_) => {
                let junk = self.cursor.take_while(|c| c != '>' && c != '<');
                self.cursor
                    .warn(WarningKind::ContentAfterCloseElementName, junk.trim());
                if !self.cursor.eat(">") {
                    self.cursor.warn(WarningKind::NoEndBracketFound, name);
                }
            }
        }
        self.close_element(name, tag_pos);
    }

    /// Matches an end tag against the open elements. Every element popped
    /// without a match raises `MismatchedEndTag` with the breadcrumb of the
    /// element being abandoned.
    fn close_element(&mut self, name: &str, tag_pos: ParserPos) {
        if self.open.is_empty() {
            self.cursor
                .warn_at(WarningKind::MismatchedEndTag, format!("</{name}>"), tag_pos);
            return;
        }
        if name.is_empty() {
            self.open.pop();
            self.cursor.pop_position();
            return;
        }
        if self.options.is_void(name) {
            // void elements never stay open, so their end tags have nothing to close
            return;
        }
        while let Some(top) = self.open.pop() {
            let top_name = self.doc.node_name(top).unwrap_or_default();
            if names_equal(top_name, name, self.doc.element_case_sensitive) {
                self.cursor.pop_position();
                return;
            }
            let detail = format!("</{name}> closes <{top_name}>");
            self.cursor
                .warn_at(WarningKind::MismatchedEndTag, detail, tag_pos);
            self.cursor.pop_position();
        }
    }

    /// End of input: report the innermost unclosed element once, then drain
    /// every remaining frame.
    fn finish(&mut self, base_depth: usize) {
        if let Some(&innermost) = self.open.last() {
            let name = self.owner_name(innermost);
            self.cursor.warn(WarningKind::NoEndTagFound, name);
        }
        self.open.clear();
        self.cursor.drain_positions(base_depth);
    }
}
