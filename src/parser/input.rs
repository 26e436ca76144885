//! Character-level input handling shared by the markup and JSON parsers.
//!
//! [`ParserCursor`] walks an immutable `&str` one character at a time,
//! keeping a [`ParserPos`] (byte offset, character index, row, column) up to
//! date in both directions. It also owns the **position stack**: every
//! nested construct a parser enters pushes its start position, and every
//! warning is raised with a snapshot of that stack so it can later be
//! printed as a breadcrumb.
//!
//! Column counting follows three rules: a tab jumps to the next tab stop,
//! a carriage return resets the column to 1, and a line feed starts a new
//! row at column 1.

use std::borrow::Cow;

use crate::error::{ParserPos, ParserWarning, WarningKind};

// -------------------------------------------------------------------------
// Name character classes
// -------------------------------------------------------------------------

/// Returns `true` if `c` may start an element or attribute name.
pub(crate) fn is_name_start_char(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == ':'
}

/// Returns `true` if `c` may appear after the first character of a name.
pub(crate) fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.' | '\u{B7}')
}

/// Returns `true` for the whitespace the grammars skip between tokens.
pub(crate) fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

// -------------------------------------------------------------------------
// Entities
// -------------------------------------------------------------------------

/// Decodes the predefined and numeric character references in `raw`.
///
/// `&amp; &lt; &gt; &quot; &apos;`, `&#N;` and `&#xH;` are replaced;
/// any other `&` sequence (including unknown names and references to
/// invalid code points) is kept literally.
pub(crate) fn decode_entities(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|&semi| semi <= 12)
            .and_then(|semi| decode_reference(&rest[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse::<u32>().ok()?,
            };
            char::from_u32(code).filter(|&c| c != '\0')
        }
    }
}

// -------------------------------------------------------------------------
// ParserCursor
// -------------------------------------------------------------------------

/// A bidirectional cursor over the parser input.
pub(crate) struct ParserCursor<'a> {
    input: &'a str,
    pos: ParserPos,
    tab_width: u32,
    stack: Vec<ParserPos>,
    /// Warnings raised so far, in discovery order.
    pub(crate) warnings: Vec<ParserWarning>,
}

impl<'a> ParserCursor<'a> {
    /// Creates a cursor at the start of `input`. A `tab_width` of 0 is
    /// treated as 1.
    pub fn new(input: &'a str, tab_width: u32) -> Self {
        Self {
            input,
            pos: ParserPos::START,
            tab_width: tab_width.max(1),
            stack: Vec::new(),
            warnings: Vec::new(),
        }
    }

    // -- Position queries --

    /// The current position.
    pub fn position(&self) -> ParserPos {
        self.pos
    }

    pub fn at_start(&self) -> bool {
        self.pos.offset == 0
    }

    pub fn at_end(&self) -> bool {
        self.pos.offset >= self.input.len()
    }

    /// The unconsumed input.
    pub fn rest(&self) -> &'a str {
        &self.input[self.pos.offset..]
    }

    /// The input between two positions.
    pub fn slice(&self, from: ParserPos, to: ParserPos) -> &'a str {
        &self.input[from.offset..to.offset]
    }

    /// Returns to a previously taken position. Row and column come with
    /// the snapshot, so no rescanning is needed.
    pub fn seek(&mut self, pos: ParserPos) {
        debug_assert!(self.input.is_char_boundary(pos.offset));
        self.pos = pos;
    }

    // -- Peeking --

    /// The character under the cursor.
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// The character `n` characters ahead of the cursor.
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    /// Returns `true` if the unconsumed input starts with `s`.
    pub fn looking_at(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    // -- Stepping --

    /// Consumes one character and returns it.
    pub fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos.offset += c.len_utf8();
        self.pos.index += 1;
        match c {
            '\n' => {
                self.pos.row += 1;
                self.pos.column = 1;
            }
            '\r' => self.pos.column = 1,
            '\t' => self.pos.column = self.next_tab_stop(self.pos.column),
            _ => self.pos.column += 1,
        }
        Some(c)
    }

    /// Consumes up to `n` characters.
    pub fn advance_by(&mut self, n: usize) {
        for _ in 0..n {
            if self.advance().is_none() {
                break;
            }
        }
    }

    /// The position `n` characters after `from`, or before it for a negative
    /// `n`, clamped to the input. The counterpart of `ParserPos - ParserPos`:
    /// `cursor.offset(a, b - a) == b`. The cursor itself does not move.
    pub fn offset(&self, from: ParserPos, n: isize) -> ParserPos {
        let mut probe = ParserCursor {
            input: self.input,
            pos: from,
            tab_width: self.tab_width,
            stack: Vec::new(),
            warnings: Vec::new(),
        };
        if n >= 0 {
            probe.advance_by(n.unsigned_abs());
        } else {
            for _ in 0..n.unsigned_abs() {
                if probe.step_back().is_none() {
                    break;
                }
            }
        }
        probe.pos
    }

    /// Consumes `s` if the input starts with it.
    pub fn eat(&mut self, s: &str) -> bool {
        if self.looking_at(s) {
            self.advance_by(s.chars().count());
            true
        } else {
            false
        }
    }

    /// Steps back over one character and returns it. The column is
    /// recomputed by rescanning the current line.
    pub fn step_back(&mut self) -> Option<char> {
        let c = self.input[..self.pos.offset].chars().next_back()?;
        self.pos.offset -= c.len_utf8();
        self.pos.index -= 1;
        if c == '\n' {
            self.pos.row -= 1;
        }
        self.pos.column = self.column_at(self.pos.offset);
        Some(c)
    }

    fn next_tab_stop(&self, column: u32) -> u32 {
        ((column - 1) / self.tab_width + 1) * self.tab_width + 1
    }

    /// Column of byte `offset`, counted from the preceding line feed.
    fn column_at(&self, offset: usize) -> u32 {
        let before = &self.input[..offset];
        let line_start = before.rfind('\n').map_or(0, |nl| nl + 1);
        before[line_start..].chars().fold(1, |column, c| match c {
            '\r' => 1,
            '\t' => self.next_tab_stop(column),
            _ => column + 1,
        })
    }

    /// Skips whitespace. Returns `true` if any was consumed.
    pub fn skip_whitespace(&mut self) -> bool {
        let start = self.pos.offset;
        while self.peek().is_some_and(is_space) {
            self.advance();
        }
        self.pos.offset > start
    }

    /// Consumes characters while `pred` holds and returns them.
    pub fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.advance();
        }
        self.slice(start, self.pos)
    }

    /// Consumes input up to (not including) the first occurrence of
    /// `terminator`. Returns the consumed text and whether the terminator
    /// was found; without it the cursor ends at end of input.
    pub fn take_until(&mut self, terminator: &str) -> (&'a str, bool) {
        let start = self.pos;
        match self.rest().find(terminator) {
            Some(len) => {
                let target = start.offset + len;
                while self.pos.offset < target {
                    self.advance();
                }
                (self.slice(start, self.pos), true)
            }
            None => {
                while self.advance().is_some() {}
                (self.slice(start, self.pos), false)
            }
        }
    }

    /// Parses a name (`is_name_start_char` then `is_name_char`*). Returns
    /// `None` without consuming anything if no name starts here.
    pub fn parse_name(&mut self) -> Option<&'a str> {
        if !self.peek().is_some_and(is_name_start_char) {
            return None;
        }
        let start = self.pos;
        self.advance();
        while self.peek().is_some_and(is_name_char) {
            self.advance();
        }
        Some(self.slice(start, self.pos))
    }

    // -- Position stack --

    /// Pushes the current position as the start of a nested construct.
    pub fn push_position(&mut self) {
        self.stack.push(self.pos);
    }

    /// Pushes an explicit position.
    pub fn push_position_at(&mut self, pos: ParserPos) {
        self.stack.push(pos);
    }

    /// Pops the innermost construct's start position.
    pub fn pop_position(&mut self) -> Option<ParserPos> {
        self.stack.pop()
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Drops every frame above `depth`. Used when parsing stops with
    /// constructs still open.
    pub fn drain_positions(&mut self, depth: usize) {
        self.stack.truncate(depth);
    }

    // -- Warnings --

    /// Raises a warning at the current position.
    pub fn warn(&mut self, kind: WarningKind, detail: impl Into<String>) {
        self.warn_at(kind, detail, self.pos);
    }

    /// Raises a warning at `at`, inside every construct on the stack.
    pub fn warn_at(&mut self, kind: WarningKind, detail: impl Into<String>, at: ParserPos) {
        let mut positions = Vec::with_capacity(self.stack.len() + 1);
        positions.extend_from_slice(&self.stack);
        positions.push(at);
        let warning = ParserWarning {
            kind,
            detail: detail.into(),
            positions,
        };
        tracing::trace!(kind = ?warning.kind, at = %at, "parser warning");
        self.warnings.push(warning);
    }
}
