//! Byte-level input decoding.
//!
//! The parsers work on `&str`. Raw bytes are turned into UTF-8 here:
//!
//! 1. A byte order mark (UTF-8, UTF-16LE, UTF-16BE) wins outright.
//! 2. Otherwise, a leading `<?xml ... encoding="..." ?>` declaration names the
//!    encoding. Only ASCII-compatible encodings can be declared this way.
//! 3. Otherwise the bytes must be UTF-8.
//!
//! Transcoding goes through `encoding_rs`. Malformed sequences are an error,
//! not silently replaced.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};

use crate::error::{Error, Result};

/// How far into the input to look for an encoding declaration.
const DECLARATION_SCAN_LIMIT: usize = 256;

/// Picks the encoding of `bytes` and the length of its BOM.
///
/// # Examples
///
/// ```
/// use relaxml::encoding::sniff_encoding;
///
/// let (enc, bom) = sniff_encoding(b"\xFF\xFE<\0");
/// assert_eq!(enc.name(), "UTF-16LE");
/// assert_eq!(bom, 2);
///
/// let (enc, bom) = sniff_encoding(b"<?xml version='1.0' encoding='latin1' ?><a/>");
/// assert_eq!(enc.name(), "windows-1252");
/// assert_eq!(bom, 0);
/// ```
#[must_use]
pub fn sniff_encoding(bytes: &[u8]) -> (&'static Encoding, usize) {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return (encoding, bom_len);
    }
    let declared = declared_label(bytes)
        .and_then(Encoding::for_label)
        .filter(|enc| enc.is_ascii_compatible());
    (declared.unwrap_or(UTF_8), 0)
}

/// Decodes `bytes` to UTF-8 text, borrowing when the input already is UTF-8
/// without a BOM.
///
/// # Errors
///
/// Returns [`Error::Encoding`] if the bytes are malformed for the detected
/// encoding.
pub fn decode_to_utf8(bytes: &[u8]) -> Result<Cow<'_, str>> {
    let (encoding, bom_len) = sniff_encoding(bytes);
    let body = &bytes[bom_len..];
    if encoding == UTF_8 {
        return std::str::from_utf8(body)
            .map(Cow::Borrowed)
            .map_err(|e| Error::Encoding {
                message: format!("input is not valid UTF-8: {e}"),
            });
    }
    let (text, had_errors) = encoding.decode_without_bom_handling(body);
    if had_errors {
        return Err(Error::Encoding {
            message: format!("malformed byte sequence for {}", encoding.name()),
        });
    }
    tracing::debug!(encoding = encoding.name(), "transcoded input");
    Ok(text)
}

/// The `encoding` pseudo-attribute of a leading `<?xml` declaration.
fn declared_label(bytes: &[u8]) -> Option<&[u8]> {
    let head = &bytes[..bytes.len().min(DECLARATION_SCAN_LIMIT)];
    let head = head.strip_prefix(b"<?xml")?;
    let end = head.windows(2).position(|w| w == b"?>")?;
    let decl = &head[..end];

    let at = decl.windows(8).position(|w| w == b"encoding")?;
    let rest = trim_ascii_start(&decl[at + 8..]);
    let rest = trim_ascii_start(rest.strip_prefix(b"=")?);
    let (&quote, rest) = rest.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let len = rest.iter().position(|&b| b == quote)?;
    Some(&rest[..len])
}

fn trim_ascii_start(bytes: &[u8]) -> &[u8] {
    let skip = bytes.iter().take_while(|b| b.is_ascii_whitespace()).count();
    &bytes[skip..]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sniff_boms() {
        assert_eq!(sniff_encoding(b"\xEF\xBB\xBF<a/>"), (UTF_8, 3));
        assert_eq!(sniff_encoding(b"\xFE\xFF\0<").0.name(), "UTF-16BE");
        assert_eq!(sniff_encoding(b"\xFF\xFE<\0").1, 2);
        assert_eq!(sniff_encoding(b"<a/>"), (UTF_8, 0));
        assert_eq!(sniff_encoding(b""), (UTF_8, 0));
    }

    #[test]
    fn test_declared_label() {
        assert_eq!(
            declared_label(b"<?xml version=\"1.0\" encoding = 'ISO-8859-1' ?><a/>"),
            Some(&b"ISO-8859-1"[..])
        );
        assert_eq!(declared_label(b"<?xml version=\"1.0\" ?><a/>"), None);
        assert_eq!(declared_label(b"<a encoding='x'/>"), None);
        assert_eq!(declared_label(b"<?xml encoding=latin1 ?>"), None);
    }

    #[test]
    fn test_utf16_declaration_is_ignored() {
        let (enc, _) = sniff_encoding(b"<?xml encoding='UTF-16' ?><a/>");
        assert_eq!(enc, UTF_8);
    }

    #[test]
    fn test_decode_utf8_borrows() {
        let text = decode_to_utf8("<a>é</a>".as_bytes()).unwrap();
        assert!(matches!(text, Cow::Borrowed("<a>é</a>")));
    }

    #[test]
    fn test_decode_strips_bom() {
        let text = decode_to_utf8(b"\xEF\xBB\xBF{}").unwrap();
        assert_eq!(text, "{}");
    }

    #[test]
    fn test_decode_utf16le() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "<a>ü</a>".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_to_utf8(&bytes).unwrap(), "<a>ü</a>");
    }

    #[test]
    fn test_decode_declared_latin1() {
        let bytes = b"<?xml version='1.0' encoding='ISO-8859-1' ?><a>caf\xE9</a>";
        let text = decode_to_utf8(bytes).unwrap();
        assert!(text.ends_with("<a>café</a>"));
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let err = decode_to_utf8(b"<a>\xFF\xFE\xFD</a>").unwrap_err();
        assert!(matches!(err, Error::Encoding { .. }));
        assert!(err.to_string().contains("UTF-8"));
    }
}
