//! Markup and JSON generation.
//!
//! Generation is two-phase. The tree is walked once with a [`SizeCounter`]
//! to learn the exact output length, then walked again with the same sink
//! writing into a buffer of exactly that size ([`StringWriter`], or a
//! caller-provided slice through [`SliceWriter`]). The sinks are generic over
//! [`Output`], so both phases run the same branching code and the computed
//! size always matches the written length.

mod json;
mod markup;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::tree::{Document, NodeId};

/// Options controlling generated text.
///
/// # Examples
///
/// ```
/// use relaxml::serial::{to_markup_with_options, WriteOptions};
///
/// let doc = relaxml::parse_str("<a><b/></a>");
/// let text = to_markup_with_options(&doc, &WriteOptions::default().force_end_tag(true));
/// assert_eq!(text, "<a><b></b></a>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WriteOptions {
    /// Write `<name></name>` instead of `<name />` for childless elements.
    pub force_end_tag: bool,
    /// Put structure on separate, indented lines.
    pub pretty: bool,
    /// Indentation per level when `pretty` is set (default: two spaces).
    pub indent: String,
    /// Field-name prefix for attributes in JSON (default: `$`).
    pub json_attribute_prefix: char,
    /// Field name for inline text in JSON (default: `#text`).
    pub json_text_field: String,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            force_end_tag: false,
            pretty: false,
            indent: "  ".to_string(),
            json_attribute_prefix: '$',
            json_text_field: "#text".to_string(),
        }
    }
}

impl WriteOptions {
    /// Enables or disables forced end tags.
    #[must_use]
    pub fn force_end_tag(mut self, yes: bool) -> Self {
        self.force_end_tag = yes;
        self
    }

    /// Enables or disables pretty printing.
    #[must_use]
    pub fn pretty(mut self, yes: bool) -> Self {
        self.pretty = yes;
        self
    }

    /// Sets the indentation string used per nesting level.
    #[must_use]
    pub fn indent(mut self, s: &str) -> Self {
        self.indent = s.to_string();
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
}

// -------------------------------------------------------------------------
// Output targets
// -------------------------------------------------------------------------

/// A destination for generated text.
pub trait Output {
    /// Appends `s`.
    fn put_str(&mut self, s: &str);

    /// Appends one character.
    fn put_char(&mut self, c: char) {
        let mut buf = [0u8; 4];
        self.put_str(c.encode_utf8(&mut buf));
    }
}

/// Counts bytes without storing them.
#[derive(Debug, Default)]
pub struct SizeCounter {
    len: usize,
}

impl SizeCounter {
    /// Bytes counted so far.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Output for SizeCounter {
    fn put_str(&mut self, s: &str) {
        self.len += s.len();
    }

    fn put_char(&mut self, c: char) {
        self.len += c.len_utf8();
    }
}

/// Writes into a `String` allocated up front.
#[derive(Debug)]
pub struct StringWriter {
    out: String,
}

impl StringWriter {
    /// Creates a writer with room for exactly `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            out: String::with_capacity(capacity),
        }
    }

    pub fn into_string(self) -> String {
        self.out
    }
}

impl Output for StringWriter {
    fn put_str(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn put_char(&mut self, c: char) {
        self.out.push(c);
    }
}

/// Writes into a caller-provided byte slice through a moving cursor.
///
/// Writes past the end of the slice are dropped and remembered; check
/// [`SliceWriter::overflowed`] afterwards.
#[derive(Debug)]
pub struct SliceWriter<'b> {
    buf: &'b mut [u8],
    pos: usize,
    overflow: bool,
}

impl<'b> SliceWriter<'b> {
    pub fn new(buf: &'b mut [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            overflow: false,
        }
    }

    /// Bytes written so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Whether any write did not fit.
    pub fn overflowed(&self) -> bool {
        self.overflow
    }
}

impl Output for SliceWriter<'_> {
    fn put_str(&mut self, s: &str) {
        let end = self.pos + s.len();
        match self.buf.get_mut(self.pos..end) {
            Some(dest) => {
                dest.copy_from_slice(s.as_bytes());
                self.pos = end;
            }
            None => self.overflow = true,
        }
    }
}

// -------------------------------------------------------------------------
// Two-phase driver
// -------------------------------------------------------------------------

/// Which text format to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Markup,
    Json,
}

fn emit<O: Output>(format: Format, doc: &Document, start: NodeId, options: &WriteOptions, out: &mut O) {
    match format {
        Format::Markup => markup::write(doc, start, options, out),
        Format::Json => json::write(doc, start, options, out),
    }
}

fn measure(format: Format, doc: &Document, start: NodeId, options: &WriteOptions) -> usize {
    let mut counter = SizeCounter::default();
    emit(format, doc, start, options, &mut counter);
    counter.len()
}

fn generate(format: Format, doc: &Document, start: NodeId, options: &WriteOptions) -> String {
    let size = measure(format, doc, start, options);
    let mut writer = StringWriter::with_capacity(size);
    emit(format, doc, start, options, &mut writer);
    let text = writer.into_string();
    debug_assert_eq!(text.len(), size);
    tracing::debug!(?format, size, "generated text");
    text
}

fn generate_into(
    format: Format,
    doc: &Document,
    start: NodeId,
    options: &WriteOptions,
    buf: &mut [u8],
) -> Result<usize> {
    let needed = measure(format, doc, start, options);
    if needed > buf.len() {
        return Err(Error::BufferTooSmall {
            needed,
            available: buf.len(),
        });
    }
    let mut writer = SliceWriter::new(buf);
    emit(format, doc, start, options, &mut writer);
    debug_assert!(!writer.overflowed());
    debug_assert_eq!(writer.position(), needed);
    Ok(writer.position())
}

// -------------------------------------------------------------------------
// Markup
// -------------------------------------------------------------------------

/// Exact byte length of [`to_markup_with_options`]'s output.
pub fn markup_size(doc: &Document, options: &WriteOptions) -> usize {
    measure(Format::Markup, doc, doc.root(), options)
}

/// Generates compact markup for the whole document.
///
/// # Examples
///
/// ```
/// let doc = relaxml::parse_str("<outer><inner1></bogus></></outer>");
/// assert!(!doc.warnings.is_empty());
/// assert_eq!(relaxml::serial::to_markup(&doc), "<outer><inner1 /></outer>");
/// ```
pub fn to_markup(doc: &Document) -> String {
    to_markup_with_options(doc, &WriteOptions::default())
}

/// Generates markup for the whole document with the given options.
pub fn to_markup_with_options(doc: &Document, options: &WriteOptions) -> String {
    generate(Format::Markup, doc, doc.root(), options)
}

/// Generates markup for one node and its subtree.
pub fn node_to_markup(doc: &Document, node: NodeId, options: &WriteOptions) -> String {
    generate(Format::Markup, doc, node, options)
}

/// Writes markup for the whole document into `buf` and returns the number
/// of bytes written.
///
/// # Errors
///
/// Returns [`Error::BufferTooSmall`] (writing nothing) if `buf` is shorter
/// than [`markup_size`].
pub fn write_markup_into(doc: &Document, options: &WriteOptions, buf: &mut [u8]) -> Result<usize> {
    generate_into(Format::Markup, doc, doc.root(), options, buf)
}

// -------------------------------------------------------------------------
// JSON
// -------------------------------------------------------------------------

/// Exact byte length of [`to_json_with_options`]'s output.
pub fn json_size(doc: &Document, options: &WriteOptions) -> usize {
    measure(Format::Json, doc, doc.root(), options)
}

/// Generates compact JSON for the whole document.
///
/// A single top-level element is written as the outermost object, without
/// its name. Several top-level elements become fields of one object, with
/// same-named runs as arrays, or a JSON array when none of them is named.
/// # Examples
///
/// ```
/// let doc = relaxml::parse_str(r#"<to test="hello">Tove</to>"#);
/// assert_eq!(relaxml::serial::to_json(&doc), r##"{"$test":"hello","#text":"Tove"}"##);
/// ```
pub fn to_json(doc: &Document) -> String {
    to_json_with_options(doc, &WriteOptions::default())
}

/// Generates JSON for the whole document with the given options.
/// A document without elements produces `{}`.
pub fn to_json_with_options(doc: &Document, options: &WriteOptions) -> String {
    generate(Format::Json, doc, doc.root(), options)
}

/// Generates JSON for one element, written as the outermost object.
/// Given the Document node, this is the same as [`to_json_with_options`].
pub fn node_to_json(doc: &Document, node: NodeId, options: &WriteOptions) -> String {
    generate(Format::Json, doc, node, options)
}

/// Writes JSON for the document into `buf` and returns the number of bytes
/// written.
///
/// # Errors
///
/// Returns [`Error::BufferTooSmall`] (writing nothing) if `buf` is shorter
/// than [`json_size`].
pub fn write_json_into(doc: &Document, options: &WriteOptions, buf: &mut [u8]) -> Result<usize> {
    generate_into(Format::Json, doc, doc.root(), options, buf)
}
