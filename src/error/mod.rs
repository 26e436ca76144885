//! Warnings, positions and crate-level errors.
//!
//! Malformed input never makes a parse fail. Every recoverable problem is
//! recorded as a [`ParserWarning`] on the resulting [`Document`], carrying
//! the [`ParserPos`] of every construct that was open when it was raised so
//! callers can print a "found at X, inside Y, inside Z" breadcrumb.
//!
//! [`Error`] covers the few operations that can genuinely fail: decoding
//! raw bytes, writing into an undersized buffer, and the binary's I/O.
//!
//! [`Document`]: crate::tree::Document

use std::fmt;
use std::ops::Sub;

/// A snapshot of the parser cursor.
///
/// Rows and columns are 1-based. `index` counts characters from the start
/// of the input and is what position arithmetic works in; `offset` is the
/// matching byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParserPos {
    /// 0-based byte offset into the input.
    pub offset: usize,
    /// 0-based character index into the input.
    pub index: usize,
    /// 1-based row.
    pub row: u32,
    /// 1-based column, tab-expanded.
    pub column: u32,
}

impl ParserPos {
    /// The position before the first character of any input.
    pub const START: Self = Self {
        offset: 0,
        index: 0,
        row: 1,
        column: 1,
    };
}

impl Default for ParserPos {
    fn default() -> Self {
        Self::START
    }
}

impl fmt::Display for ParserPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.column)
    }
}

/// Signed distance in characters between two positions of the same input.
impl Sub for ParserPos {
    type Output = isize;

    #[allow(clippy::cast_possible_wrap)]
    fn sub(self, rhs: Self) -> isize {
        self.index as isize - rhs.index as isize
    }
}

/// The closed set of recoverable problems the parsers report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningKind {
    // -- markup --
    NoEndBracketFound,
    NoEndTagFound,
    DuplicateAttribute,
    IllegalAttributeName,
    MismatchedEndTag,
    ContentAfterCloseSlashInElement,
    ContentAfterCloseElementName,
    NoEndCommentFound,
    NoEndDeclarationFound,
    NotProperEndDeclaration,
    NoEndUnknownTagFound,
    AttributeWithoutValue,
    AttributeValueNotFound,
    AttributeValueMissingEndQuote,

    // -- JSON --
    MissingStringQuotes,
    MissingColonBetweenStringAndValue,
    InvalidEscapeSequence,
    InvalidUnicodeEscapeSequence,
    IllegalNumberSequence,
    UnexpectedComma,
    MissingObjectClose,
    MustCloseRootObject,
    DataFoundAfterFinalObjectClose,
    AttributePrefixWithoutName,
    AttributePrefixAtRoot,
    MissingPairString,
    IllegalValue,
}

impl WarningKind {
    /// A short human-readable description of the problem.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::NoEndBracketFound => "tag is missing its closing '>'",
            Self::NoEndTagFound => "element was never closed",
            Self::DuplicateAttribute => "duplicate attribute replaces the earlier value",
            Self::IllegalAttributeName => "illegal attribute name",
            Self::MismatchedEndTag => "end tag does not match the open element",
            Self::ContentAfterCloseSlashInElement => "content after '/' in element tag",
            Self::ContentAfterCloseElementName => "content after element name in end tag",
            Self::NoEndCommentFound => "comment is missing its closing '-->'",
            Self::NoEndDeclarationFound => "declaration is missing its closing '?>'",
            Self::NotProperEndDeclaration => "declaration closed with '>' instead of '?>'",
            Self::NoEndUnknownTagFound => "special tag is missing its closing '>'",
            Self::AttributeWithoutValue => "attribute has no value",
            Self::AttributeValueNotFound => "attribute has '=' but no value",
            Self::AttributeValueMissingEndQuote => "attribute value is missing its closing quote",
            Self::MissingStringQuotes => "string is missing its quotes",
            Self::MissingColonBetweenStringAndValue => "missing ':' between name and value",
            Self::InvalidEscapeSequence => "invalid escape sequence",
            Self::InvalidUnicodeEscapeSequence => "invalid unicode escape sequence",
            Self::IllegalNumberSequence => "illegal number",
            Self::UnexpectedComma => "unexpected ','",
            Self::MissingObjectClose => "object or array is missing its closing bracket",
            Self::MustCloseRootObject => "root object was never closed",
            Self::DataFoundAfterFinalObjectClose => "data found after the root object",
            Self::AttributePrefixWithoutName => "attribute prefix without a name",
            Self::AttributePrefixAtRoot => "attribute prefix on a structured value",
            Self::MissingPairString => "name missing from name/value pair",
            Self::IllegalValue => "illegal value",
        }
    }

    /// Returns `true` for the kinds only the JSON parser raises.
    #[must_use]
    pub fn is_json(self) -> bool {
        matches!(
            self,
            Self::MissingStringQuotes
                | Self::MissingColonBetweenStringAndValue
                | Self::InvalidEscapeSequence
                | Self::InvalidUnicodeEscapeSequence
                | Self::IllegalNumberSequence
                | Self::UnexpectedComma
                | Self::MissingObjectClose
                | Self::MustCloseRootObject
                | Self::DataFoundAfterFinalObjectClose
                | Self::AttributePrefixWithoutName
                | Self::AttributePrefixAtRoot
                | Self::MissingPairString
                | Self::IllegalValue
        )
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A recoverable problem found while parsing.
///
/// `positions` is the position stack at the moment the warning was raised,
/// outermost construct first; the last entry is where the problem itself
/// was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserWarning {
    /// What went wrong.
    pub kind: WarningKind,
    /// Extra context such as the offending name. May be empty.
    pub detail: String,
    /// Position breadcrumb, outermost first.
    pub positions: Vec<ParserPos>,
}

impl ParserWarning {
    /// Where the problem was found (the innermost position).
    #[must_use]
    pub fn position(&self) -> ParserPos {
        self.positions.last().copied().unwrap_or_default()
    }

    /// The human-readable breadcrumb, e.g. `"at 3:7, inside 2:3, inside 1:1"`.
    #[must_use]
    pub fn breadcrumb(&self) -> String {
        let mut out = String::new();
        for (i, pos) in self.positions.iter().rev().enumerate() {
            if i == 0 {
                out.push_str("at ");
            } else {
                out.push_str(", inside ");
            }
            out.push_str(&pos.to_string());
        }
        out
    }
}

impl fmt::Display for ParserWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        if !self.positions.is_empty() {
            write!(f, " {}", self.breadcrumb())?;
        }
        Ok(())
    }
}

/// Failures outside the recoverable-warning model.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Raw input bytes could not be decoded to text.
    #[error("encoding error: {message}")]
    Encoding { message: String },

    /// A caller-provided output buffer cannot hold the generated text.
    #[error("output buffer too small: {needed} bytes needed, {available} available")]
    BufferTooSmall { needed: usize, available: usize },

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file could not be understood.
    #[error("configuration error: {message}")]
    Config { message: String },
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
