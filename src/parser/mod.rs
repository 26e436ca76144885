//! Error-tolerant markup and JSON parsers.
//!
//! Both grammars are hand-rolled scanners over a [`ParserCursor`] and build
//! the same [`Document`] tree shape. Parsing never fails: every malformed
//! construct is recorded as a [`ParserWarning`](crate::ParserWarning) on
//! [`Document::warnings`] and the parser carries on with a best-effort
//! interpretation.
//!
//! Neither parser recurses on input nesting. Open elements (markup) and
//! open containers (JSON) live on explicit stacks, each entry paired with a
//! frame on the cursor's position stack.
//!
//! [`ParserCursor`]: input::ParserCursor

pub(crate) mod input;
pub(crate) mod json;
mod markup;

use serde::Deserialize;

use crate::encoding;
use crate::error::Result;
use crate::tree::{names_equal, Document};

/// The HTML void elements, for use with [`ParseOptions::void_elements`].
pub const HTML_VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Parse options controlling name matching, column counting and the JSON
/// conventions.
///
/// Use the builder pattern to configure options:
///
/// ```
/// use relaxml::parser::ParseOptions;
///
/// let opts = ParseOptions::default()
///     .element_case_sensitive(false)
///     .html_void_elements()
///     .tab_width(8);
/// assert!(opts.is_void("BR"));
/// ```
///
/// Options can also be read from configuration files; missing fields take
/// their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParseOptions {
    /// Whether element names compare case-sensitively (default: true).
    pub element_case_sensitive: bool,
    /// Whether attribute names compare case-sensitively (default: true).
    pub attribute_case_sensitive: bool,
    /// Column width of a tab stop when counting columns (default: 4).
    pub tab_width: u32,
    /// Elements that never have children, regardless of how they are closed.
    pub void_elements: Vec<String>,
    /// Keep whitespace-only text runs in markup (default: false).
    pub keep_blank_text: bool,
    /// Field-name prefix that turns a JSON field into an attribute (default: `$`).
    pub json_attribute_prefix: char,
    /// Field name that holds an element's inline text in JSON (default: `#text`).
    pub json_text_field: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            element_case_sensitive: true,
            attribute_case_sensitive: true,
            tab_width: 4,
            void_elements: Vec::new(),
            keep_blank_text: false,
            json_attribute_prefix: '$',
            json_text_field: "#text".to_string(),
        }
    }
}

impl ParseOptions {
    /// Enables or disables case-sensitive element names.
    #[must_use]
    pub fn element_case_sensitive(mut self, yes: bool) -> Self {
        self.element_case_sensitive = yes;
        self
    }

    /// Enables or disables case-sensitive attribute names.
    #[must_use]
    pub fn attribute_case_sensitive(mut self, yes: bool) -> Self {
        self.attribute_case_sensitive = yes;
        self
    }

    /// Sets the tab width used for column counting.
    #[must_use]
    pub fn tab_width(mut self, width: u32) -> Self {
        self.tab_width = width;
        self
    }

    /// Replaces the void element list.
    #[must_use]
    pub fn void_elements<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.void_elements = names.into_iter().map(Into::into).collect();
        self
    }

    /// Uses the HTML void element list (`br`, `img`, `hr`, ...).
    #[must_use]
    pub fn html_void_elements(self) -> Self {
        self.void_elements(HTML_VOID_ELEMENTS)
    }

    /// Keeps or drops whitespace-only text runs.
    #[must_use]
    pub fn keep_blank_text(mut self, yes: bool) -> Self {
        self.keep_blank_text = yes;
        self
    }

    /// Sets the JSON attribute prefix character.
    #[must_use]
    pub fn json_attribute_prefix(mut self, prefix: char) -> Self {
        self.json_attribute_prefix = prefix;
        self
    }

    /// Sets the JSON text field name.
    #[must_use]
    pub fn json_text_field(mut self, name: &str) -> Self {
        self.json_text_field = name.to_string();
        self
    }

    /// Returns `true` if `name` is on the void element list, honoring
    /// `element_case_sensitive`.
    #[must_use]
    pub fn is_void(&self, name: &str) -> bool {
        self.void_elements
            .iter()
            .any(|v| names_equal(v, name, self.element_case_sensitive))
    }

    fn new_document(&self) -> Document {
        let mut doc = Document::new();
        doc.element_case_sensitive = self.element_case_sensitive;
        doc.attribute_case_sensitive = self.attribute_case_sensitive;
        doc
    }
}

/// Parses markup with default options.
///
/// # Examples
///
/// ```
/// let doc = relaxml::parse_str(r#"<to test="hello">Tove</to>"#);
/// let to = doc.root_element().unwrap();
/// assert_eq!(doc.attribute(to, "test"), Some("hello"));
/// assert!(doc.warnings.is_empty());
/// ```
#[must_use]
pub fn parse_str(input: &str) -> Document {
    parse_str_with_options(input, &ParseOptions::default())
}

/// Parses markup with the given options.
#[must_use]
pub fn parse_str_with_options(input: &str, options: &ParseOptions) -> Document {
    tracing::debug!(len = input.len(), "parsing markup");
    let doc = markup::MarkupParser::new(input, options, options.new_document()).parse();
    log_result("markup", &doc);
    doc
}

/// Parses JSON with default options.
///
/// # Examples
///
/// ```
/// let doc = relaxml::parse_json(r#"{"foo":[1,2,,3]}"#);
/// assert_eq!(doc.warnings.len(), 1);
/// assert_eq!(relaxml::serial::to_json(&doc), r#"{"foo":[1,2,"",3]}"#);
/// ```
#[must_use]
pub fn parse_json(input: &str) -> Document {
    parse_json_with_options(input, &ParseOptions::default())
}

/// Parses JSON with the given options.
#[must_use]
pub fn parse_json_with_options(input: &str, options: &ParseOptions) -> Document {
    tracing::debug!(len = input.len(), "parsing JSON");
    let doc = json::JsonParser::new(input, options, options.new_document()).parse();
    log_result("json", &doc);
    doc
}

/// Returns `true` if `input` looks like JSON: its first non-whitespace
/// character is `{` or `[`.
#[must_use]
pub fn looks_like_json(input: &str) -> bool {
    matches!(input.trim_start().chars().next(), Some('{' | '['))
}

/// Parses JSON or markup, chosen by [`looks_like_json`].
#[must_use]
pub fn parse_auto(input: &str, options: &ParseOptions) -> Document {
    if looks_like_json(input) {
        parse_json_with_options(input, options)
    } else {
        parse_str_with_options(input, options)
    }
}

/// Decodes raw bytes (BOM sniffing, then an optional `encoding="..."`
/// declaration) and parses the text with [`parse_auto`].
///
/// # Errors
///
/// Returns [`Error::Encoding`](crate::Error::Encoding) if the bytes cannot
/// be decoded.
pub fn parse_bytes(input: &[u8], options: &ParseOptions) -> Result<Document> {
    let text = encoding::decode_to_utf8(input)?;
    Ok(parse_auto(&text, options))
}

fn log_result(format: &str, doc: &Document) {
    tracing::debug!(
        format,
        nodes = doc.node_count(),
        warnings = doc.warnings.len(),
        "parse finished"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_options() {
        let opts = ParseOptions::default();
        assert!(opts.element_case_sensitive);
        assert!(opts.attribute_case_sensitive);
        assert_eq!(opts.tab_width, 4);
        assert!(opts.void_elements.is_empty());
        assert_eq!(opts.json_attribute_prefix, '$');
        assert_eq!(opts.json_text_field, "#text");
    }

    #[test]
    fn test_is_void_honors_case_setting() {
        let opts = ParseOptions::default().void_elements(["br"]);
        assert!(opts.is_void("br"));
        assert!(!opts.is_void("BR"));
        let opts = opts.element_case_sensitive(false);
        assert!(opts.is_void("BR"));
    }

    #[test]
    fn test_options_from_toml() {
        let opts: ParseOptions = toml::from_str(
            r#"
            element_case_sensitive = false
            tab_width = 8
            void_elements = ["br", "hr"]
            json_attribute_prefix = "@"
            "#,
        )
        .unwrap();
        assert!(!opts.element_case_sensitive);
        assert!(opts.attribute_case_sensitive);
        assert_eq!(opts.tab_width, 8);
        assert_eq!(opts.void_elements, vec!["br", "hr"]);
        assert_eq!(opts.json_attribute_prefix, '@');
        assert_eq!(opts.json_text_field, "#text");
    }

    #[test]
    fn test_document_inherits_case_settings() {
        let opts = ParseOptions::default().attribute_case_sensitive(false);
        let doc = parse_str_with_options("<a ID='1'/>", &opts);
        let a = doc.root_element().unwrap();
        assert!(!doc.attribute_case_sensitive);
        assert_eq!(doc.attribute(a, "id"), Some("1"));
    }

    #[test]
    fn test_parse_auto_sniffs_json() {
        assert!(looks_like_json("  {\"a\":1}"));
        assert!(looks_like_json("\n[1]"));
        assert!(!looks_like_json("<a/>"));

        let doc = parse_auto(" {\"a\":1}", &ParseOptions::default());
        let root = doc.root_element().unwrap();
        assert_eq!(doc.node_name(root), Some(""));
        assert!(doc.child_element(root, "a").is_some());

        let doc = parse_auto("<a/>", &ParseOptions::default());
        assert_eq!(doc.node_name(doc.root_element().unwrap()), Some("a"));
    }

    #[test]
    fn test_parse_bytes_with_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("<a>é</a>".as_bytes());
        let doc = parse_bytes(&bytes, &ParseOptions::default()).unwrap();
        assert_eq!(doc.text_content(doc.root()), "é");
    }
}
