//! Markup generation.
//!
//! Compact by default. With `pretty`, the children of an element-only
//! parent (element children plus optional whitespace, no real text) each go
//! on their own indented line; mixed content is written inline.

use super::{Output, WriteOptions};
use crate::parser::input::is_space;
use crate::tree::{Document, NodeId, NodeKind, NodeTypeSet, Sink, Walk};

/// Name written for elements whose name is empty.
const UNNAMED_ELEMENT: &str = "unknown";

pub(super) fn write<O: Output>(doc: &Document, start: NodeId, options: &WriteOptions, out: &mut O) {
    let mut sink = MarkupSink {
        out,
        options,
        depth: 0,
        lines: Vec::new(),
    };
    doc.walk(start, &mut sink, NodeTypeSet::default());
}

struct MarkupSink<'w, O: Output> {
    out: &'w mut O,
    options: &'w WriteOptions,
    depth: usize,
    /// One entry per open parent: whether its children go on separate lines.
    lines: Vec<bool>,
}

impl<O: Output> MarkupSink<'_, O> {
    fn on_own_line(&self) -> bool {
        self.options.pretty && self.lines.last().copied().unwrap_or(false)
    }

    fn line_start(&mut self) {
        if self.on_own_line() {
            for _ in 0..self.depth {
                self.out.put_str(&self.options.indent);
            }
        }
    }

    fn line_end(&mut self) {
        if self.on_own_line() {
            self.out.put_char('\n');
        }
    }

    fn write_attributes(&mut self, doc: &Document, owner: NodeId) {
        for attr in doc.attributes(owner) {
            if let NodeKind::Attribute { name, value } = &doc.node(attr).kind {
                self.out.put_char(' ');
                self.out.put_str(name);
                self.out.put_str("=\"");
                write_escaped(self.out, value, true);
                self.out.put_char('"');
            }
        }
    }
}

impl<O: Output> Sink for MarkupSink<'_, O> {
    fn document_entry(&mut self, doc: &Document, id: NodeId) -> Walk {
        let lines = self.options.pretty && !has_real_text(doc, id);
        self.lines.push(lines);
        Walk::Continue
    }

    fn document_exit(&mut self, _doc: &Document, _id: NodeId) -> Walk {
        self.lines.pop();
        Walk::Continue
    }

    fn element_entry(&mut self, doc: &Document, id: NodeId) -> Walk {
        let name = element_name(doc, id);
        self.line_start();
        self.out.put_char('<');
        self.out.put_str(name);
        self.write_attributes(doc, id);

        if doc.first_child(id).is_none() {
            if self.options.force_end_tag {
                self.out.put_str("></");
                self.out.put_str(name);
                self.out.put_char('>');
            } else {
                self.out.put_str(" />");
            }
            self.line_end();
            return Walk::Continue;
        }

        self.out.put_char('>');
        let lines = self.options.pretty && is_element_only(doc, id);
        if lines {
            self.out.put_char('\n');
        }
        self.lines.push(lines);
        self.depth += 1;
        Walk::Continue
    }

    fn element_exit(&mut self, doc: &Document, id: NodeId) -> Walk {
        if doc.first_child(id).is_none() {
            return Walk::Continue;
        }
        self.depth -= 1;
        if self.lines.pop().unwrap_or(false) {
            for _ in 0..self.depth {
                self.out.put_str(&self.options.indent);
            }
        }
        self.out.put_str("</");
        self.out.put_str(element_name(doc, id));
        self.out.put_char('>');
        self.line_end();
        Walk::Continue
    }

    fn text(&mut self, doc: &Document, id: NodeId) -> Walk {
        if let NodeKind::Text { content, cdata } = &doc.node(id).kind {
            if *cdata {
                self.line_start();
                self.out.put_str("<![CDATA[");
                self.out.put_str(content);
                self.out.put_str("]]>");
                self.line_end();
            } else if !(self.on_own_line() && content.trim().is_empty()) {
                if blank_run(doc, id) {
                    write_space_refs(self.out, content);
                } else {
                    write_escaped(self.out, content, false);
                }
            }
        }
        Walk::Continue
    }

    fn comment(&mut self, doc: &Document, id: NodeId) -> Walk {
        if let NodeKind::Comment { content } = &doc.node(id).kind {
            self.line_start();
            self.out.put_str("<!--");
            self.out.put_str(content);
            self.out.put_str("-->");
            self.line_end();
        }
        Walk::Continue
    }

    fn declaration(&mut self, doc: &Document, id: NodeId) -> Walk {
        if let NodeKind::Declaration { name } = &doc.node(id).kind {
            self.line_start();
            self.out.put_str("<?");
            self.out.put_str(name);
            self.write_attributes(doc, id);
            self.out.put_str(" ?>");
            self.line_end();
        }
        Walk::Continue
    }

    fn unknown(&mut self, doc: &Document, id: NodeId) -> Walk {
        if let NodeKind::Unknown { content } = &doc.node(id).kind {
            self.line_start();
            self.out.put_char('<');
            self.out.put_str(content);
            self.out.put_char('>');
            self.line_end();
        }
        Walk::Continue
    }
}

fn element_name(doc: &Document, id: NodeId) -> &str {
    match doc.node_name(id) {
        Some(name) if !name.is_empty() => name,
        _ => UNNAMED_ELEMENT,
    }
}

fn has_real_text(doc: &Document, id: NodeId) -> bool {
    doc.children(id).any(|child| match &doc.node(child).kind {
        NodeKind::Text { content, cdata } => *cdata || !content.trim().is_empty(),
        _ => false,
    })
}

/// Returns `true` if the element has element children and no text other than
/// whitespace, so its children can be indented without changing content.
fn is_element_only(doc: &Document, id: NodeId) -> bool {
    doc.child_elements(id).next().is_some() && !has_real_text(doc, id)
}

/// Returns `true` if the plain text run around `id` (the adjacent text
/// siblings a reparse would read as one run) is whitespace only.
fn blank_run(doc: &Document, id: NodeId) -> bool {
    let plain = |n: &NodeId| matches!(doc.node(*n).kind, NodeKind::Text { cdata: false, .. });
    let mut first = id;
    while let Some(prev) = doc.prev_sibling(first).filter(plain) {
        first = prev;
    }
    let mut current = Some(first);
    while let Some(node) = current.filter(plain) {
        if let NodeKind::Text { content, .. } = &doc.node(node).kind {
            if !content.chars().all(is_space) {
                return false;
            }
        }
        current = doc.next_sibling(node);
    }
    true
}

/// Writes whitespace as character references, so a parser that drops blank
/// runs still keeps it.
fn write_space_refs<O: Output>(out: &mut O, text: &str) {
    for c in text.chars() {
        out.put_str(match c {
            '\t' => "&#9;",
            '\n' => "&#10;",
            '\r' => "&#13;",
            _ => "&#32;",
        });
    }
}

/// Writes `text` with `&`, `<` and `>` escaped, plus `"` when `in_attribute`.
fn write_escaped<O: Output>(out: &mut O, text: &str, in_attribute: bool) {
    let mut plain_from = 0;
    for (i, c) in text.char_indices() {
        let entity = match c {
            '&' => "&amp;",
            '<' => "&lt;",
            '>' => "&gt;",
            '"' if in_attribute => "&quot;",
            _ => continue,
        };
        out.put_str(&text[plain_from..i]);
        out.put_str(entity);
        plain_from = i + c.len_utf8();
    }
    out.put_str(&text[plain_from..]);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::parser::{parse_str, parse_str_with_options, ParseOptions};
    use crate::serial::{markup_size, node_to_markup, to_markup, to_markup_with_options, WriteOptions};
    use crate::tree::Document;
    use pretty_assertions::assert_eq;

    fn roundtrip(input: &str) -> String {
        to_markup(&parse_str(input))
    }

    #[test]
    fn test_empty_element() {
        assert_eq!(roundtrip("<a/>"), "<a />");
        assert_eq!(roundtrip("<a></a>"), "<a />");
    }

    #[test]
    fn test_force_end_tag() {
        let doc = parse_str("<a><b x='1'/></a>");
        let opts = WriteOptions::default().force_end_tag(true);
        assert_eq!(to_markup_with_options(&doc, &opts), "<a><b x=\"1\"></b></a>");
    }

    #[test]
    fn test_attributes_and_text() {
        assert_eq!(
            roundtrip("<to test=\"hello\" n=5>Tove</to>"),
            "<to test=\"hello\" n=\"5\">Tove</to>"
        );
    }

    #[test]
    fn test_escaping() {
        assert_eq!(
            roundtrip("<a q='say \"hi\" &amp; &lt;go&gt;'>1 &lt; 2 &amp;&amp; \"x\"</a>"),
            "<a q=\"say &quot;hi&quot; &amp; &lt;go&gt;\">1 &lt; 2 &amp;&amp; \"x\"</a>"
        );
    }

    #[test]
    fn test_comment_cdata_declaration_unknown() {
        let input = "<?xml version=\"1.0\" ?><!DOCTYPE r [<!ENTITY e \"v\">]><r><!--c--><![CDATA[<raw>]]></r>";
        assert_eq!(roundtrip(input), input);
    }

    #[test]
    fn test_unnamed_element() {
        let mut doc = Document::new();
        let e = doc.create_element("");
        doc.adopt_as_last_child(doc.root(), e);
        assert_eq!(to_markup(&doc), "<unknown />");
    }

    #[test]
    fn test_node_to_markup() {
        let doc = parse_str("<a><b>t</b><c/></a>");
        let a = doc.root_element().unwrap();
        let b = doc.child_element(a, "b").unwrap();
        assert_eq!(node_to_markup(&doc, b, &WriteOptions::default()), "<b>t</b>");
    }

    #[test]
    fn test_pretty_print() {
        let doc = parse_str("<root><child><inner>text</inner></child><!--note--><leaf/></root>");
        let opts = WriteOptions::default().pretty(true);
        assert_eq!(
            to_markup_with_options(&doc, &opts),
            "<root>\n  <child>\n    <inner>text</inner>\n  </child>\n  <!--note-->\n  <leaf />\n</root>\n"
        );
    }

    #[test]
    fn test_pretty_print_mixed_content_inline() {
        let doc = parse_str("<root><p>Hello <b>world</b></p></root>");
        let opts = WriteOptions::default().pretty(true).indent("\t");
        assert_eq!(
            to_markup_with_options(&doc, &opts),
            "<root>\n\t<p>Hello <b>world</b></p>\n</root>\n"
        );
    }

    #[test]
    fn test_pretty_print_skips_kept_blank_text() {
        let opts = ParseOptions::default().keep_blank_text(true);
        let doc = parse_str_with_options("<a>\n   <b/>\n</a>", &opts);
        let text = to_markup_with_options(&doc, &WriteOptions::default().pretty(true));
        assert_eq!(text, "<a>\n  <b />\n</a>\n");
    }

    #[test]
    fn test_blank_text_written_as_references() {
        let mut doc = Document::new();
        let a = doc.create_element("a");
        doc.adopt_as_last_child(doc.root(), a);
        let space = doc.create_text(" ");
        doc.adopt_as_last_child(a, space);
        let b = doc.create_element("b");
        doc.adopt_as_last_child(a, b);
        let tab = doc.create_text("\t\n");
        doc.adopt_as_last_child(a, tab);

        let first = to_markup(&doc);
        assert_eq!(first, "<a>&#32;<b />&#9;&#10;</a>");
        let reparsed = parse_str(&first);
        assert!(reparsed.warnings.is_empty());
        assert_eq!(to_markup(&reparsed), first);
    }

    #[test]
    fn test_blank_text_next_to_real_text_is_plain() {
        let mut doc = Document::new();
        let a = doc.create_element("a");
        doc.adopt_as_last_child(doc.root(), a);
        for part in ["x", " "] {
            let text = doc.create_text(part);
            doc.adopt_as_last_child(a, text);
        }
        assert_eq!(to_markup(&doc), "<a>x </a>");
        assert_eq!(roundtrip("<a>x </a>"), "<a>x </a>");
    }

    #[test]
    fn test_kept_blank_text_survives_default_reparse() {
        let opts = ParseOptions::default().keep_blank_text(true);
        let doc = parse_str_with_options("<a>\n <b/></a>", &opts);
        let first = to_markup(&doc);
        assert_eq!(first, "<a>&#10;&#32;<b /></a>");
        assert_eq!(roundtrip(&first), first);
    }

    #[test]
    fn test_size_matches_in_every_mode() {
        let doc = parse_str("<?pi a='1' ?><r x='&lt;'><s>é &amp; ü</s><t/><![CDATA[z]]></r>");
        for opts in [
            WriteOptions::default(),
            WriteOptions::default().force_end_tag(true),
            WriteOptions::default().pretty(true),
        ] {
            assert_eq!(markup_size(&doc, &opts), to_markup_with_options(&doc, &opts).len());
        }
    }
}
