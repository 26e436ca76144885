//! # relaxml
//!
//! An error-tolerant markup and JSON parser and generator built around one
//! arena-backed document tree.
//!
//! Markup and JSON parse into the same [`Document`] shape: elements,
//! attributes, text, comments, declarations and verbatim unknown tags.
//! Parsing never fails on malformed input. Every problem is recorded as a
//! [`ParserWarning`] on [`Document::warnings`] and the parser carries on with
//! its best interpretation. The tree can then be written back as markup or
//! bridged to JSON, in either direction.
//!
//! ## Quick Start
//!
//! ```
//! use relaxml::serial::{to_json, to_markup};
//!
//! let doc = relaxml::parse_str(r#"<to test="hello">Tove</to>"#);
//! assert!(doc.warnings.is_empty());
//! assert_eq!(to_json(&doc), r##"{"$test":"hello","#text":"Tove"}"##);
//!
//! let doc = relaxml::parse_json(r#"{"outer":[{"a":1},2]}"#);
//! assert_eq!(to_markup(&doc), "<unknown><outer><a>1</a></outer><outer>2</outer></unknown>");
//! ```
//!
//! ## Recovery
//!
//! ```
//! use relaxml::WarningKind;
//!
//! let doc = relaxml::parse_str("<outer><inner1></bogus></></outer>");
//! assert_eq!(doc.warnings[0].kind, WarningKind::MismatchedEndTag);
//! assert_eq!(relaxml::serial::to_markup(&doc), "<outer><inner1 /></outer>");
//! ```

pub mod encoding;
pub mod error;
pub mod parser;
pub mod serial;
pub mod tree;

pub use error::{Error, ParserPos, ParserWarning, Result, WarningKind};
pub use parser::{
    parse_auto, parse_bytes, parse_json, parse_json_with_options, parse_str,
    parse_str_with_options, ParseOptions,
};
pub use serial::WriteOptions;
pub use tree::{Document, NodeId, NodeKind, NodeType, NodeTypeSet, Sink, Walk};
