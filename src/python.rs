//! Lexical reader for Python source.
//!
//! Introspection never executes the target package; it reads source text.
//! This module supplies the lexical layer that makes that reliable:
//!
//! - [`logical_lines`] splits a file into logical lines (statements) with their
//!   indentation, honouring brackets, strings, comments, backslash
//!   continuations and `;` separators. It is strict: an unterminated string or
//!   unbalanced bracket is a [`SyntaxError`], which discovery treats as an
//!   import failure.
//! - [`tokens`] breaks one logical line into names, strings, numbers and
//!   operators. It is lenient and never fails.
//! - [`string_expr`], [`string_value`] and [`string_dict`] evaluate the small
//!   subset of literals the hook cares about: docstrings and the gallery
//!   metadata mapping.
//! - [`cleandoc`] normalizes docstring indentation the way `inspect.cleandoc` does.
//!
//! Only top-level structure matters to callers, so there is no AST: semantic
//! decisions live in [`crate::introspect`] and [`crate::gallery`].

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("line {0}: unterminated string literal")]
    UnterminatedString(usize),
    #[error("line {0}: bracket is never closed")]
    UnclosedBracket(usize),
    #[error("line {0}: unmatched closing bracket")]
    UnmatchedBracket(usize),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LiteralError {
    #[error("expected a dict literal")]
    NotADict,
    #[error("dict keys must be string literals")]
    NonStringKey,
    #[error("value for key '{0}' is not a string literal")]
    NonStringValue(String),
    #[error("malformed dict literal")]
    Malformed,
}

/// One statement, with the indentation of the physical line it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine<'a> {
    pub indent: usize,
    /// 1-based line number where the statement starts.
    pub line: usize,
    /// Statement text; may span physical lines and carry a trailing comment.
    pub text: &'a str,
}

impl<'a> LogicalLine<'a> {
    pub fn tokens(&self) -> Vec<Tok<'a>> {
        tokens(self.text)
    }
}

/// A lexical token borrowed from the logical line text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tok<'a> {
    Name(&'a str),
    /// Full literal including prefix and quotes.
    Str(&'a str),
    Number(&'a str),
    Op(&'a str),
}

impl Tok<'_> {
    pub fn is_op(&self, op: &str) -> bool {
        matches!(self, Tok::Op(o) if *o == op)
    }

    pub fn is_name(&self, name: &str) -> bool {
        matches!(self, Tok::Name(n) if *n == name)
    }
}

// ============================================================================
// Logical lines
// ============================================================================

/// Split Python source into logical lines.
pub fn logical_lines(src: &str) -> Result<Vec<LogicalLine<'_>>, SyntaxError> {
    let bytes = src.as_bytes();
    let mut lines = Vec::new();
    let mut i = if src.starts_with('\u{feff}') { 3 } else { 0 };
    let mut line_no = 1;

    while i < bytes.len() {
        let mut indent = 0;
        while i < bytes.len() {
            match bytes[i] {
                b' ' => indent += 1,
                b'\t' => indent = (indent / 8 + 1) * 8,
                b'\x0c' => indent = 0,
                _ => break,
            }
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }
        match bytes[i] {
            b'\n' => {
                line_no += 1;
                i += 1;
            }
            b'\r' => i += 1,
            b'#' => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            _ => i = scan_statements(src, i, indent, &mut line_no, &mut lines)?,
        }
    }

    Ok(lines)
}

/// Scan from `start` to the end of the logical line, pushing one entry per
/// `;`-separated statement. Returns the offset just past the terminating newline.
fn scan_statements<'a>(
    src: &'a str,
    start: usize,
    indent: usize,
    line_no: &mut usize,
    out: &mut Vec<LogicalLine<'a>>,
) -> Result<usize, SyntaxError> {
    let bytes = src.as_bytes();
    let mut i = start;
    let mut stmt_start = start;
    let mut stmt_line = *line_no;
    let mut brackets: Vec<(u8, usize)> = Vec::new();

    let mut push = |from: usize, to: usize, line: usize| {
        let text = src[from..to].trim();
        if !text.is_empty() && !text.starts_with('#') {
            out.push(LogicalLine { indent, line, text });
        }
    };

    loop {
        if i >= bytes.len() {
            if let Some(&(_, line)) = brackets.first() {
                return Err(SyntaxError::UnclosedBracket(line));
            }
            push(stmt_start, bytes.len(), stmt_line);
            return Ok(bytes.len());
        }
        match bytes[i] {
            b'#' => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'\\' => {
                if bytes.get(i + 1) == Some(&b'\n') {
                    *line_no += 1;
                } else if bytes.get(i + 1) == Some(&b'\r') && bytes.get(i + 2) == Some(&b'\n') {
                    *line_no += 1;
                    i += 1;
                }
                i += 2;
            }
            b'\'' | b'"' => {
                let end = string_end(bytes, i)
                    .map_err(|_| SyntaxError::UnterminatedString(*line_no))?;
                *line_no += bytes[i..end].iter().filter(|&&b| b == b'\n').count();
                i = end;
            }
            open @ (b'(' | b'[' | b'{') => {
                brackets.push((open, *line_no));
                i += 1;
            }
            close @ (b')' | b']' | b'}') => {
                let expected = match close {
                    b')' => b'(',
                    b']' => b'[',
                    _ => b'{',
                };
                match brackets.pop() {
                    Some((open, _)) if open == expected => {}
                    _ => return Err(SyntaxError::UnmatchedBracket(*line_no)),
                }
                i += 1;
            }
            b';' if brackets.is_empty() => {
                push(stmt_start, i, stmt_line);
                i += 1;
                stmt_start = i;
                stmt_line = *line_no;
            }
            b'\n' => {
                *line_no += 1;
                if brackets.is_empty() {
                    push(stmt_start, i, stmt_line);
                    return Ok(i + 1);
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
}

/// Offset just past the string literal whose opening quote is at `i`.
///
/// `Err(len)` means the literal runs off the end of its line (single quotes)
/// or the file (triple quotes).
fn string_end(bytes: &[u8], i: usize) -> Result<usize, usize> {
    let quote = bytes[i];
    let triple = bytes.len() >= i + 3 && bytes[i + 1] == quote && bytes[i + 2] == quote;
    let mut j = if triple { i + 3 } else { i + 1 };

    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b if b == quote => {
                if !triple {
                    return Ok(j + 1);
                }
                if bytes.len() >= j + 3 && bytes[j + 1] == quote && bytes[j + 2] == quote {
                    return Ok(j + 3);
                }
                j += 1;
            }
            b'\n' if !triple => return Err(j),
            _ => j += 1,
        }
    }
    Err(bytes.len())
}

// ============================================================================
// Tokens
// ============================================================================

const OPERATORS: &[&str] = &[
    "**=", "//=", ">>=", "<<=", "...", "->", ":=", "==", "!=", "<=", ">=", "+=", "-=", "*=",
    "/=", "%=", "&=", "|=", "^=", "@=", "**", "//", "<<", ">>",
];

/// Tokenize one logical line. Comments and continuations are dropped.
pub fn tokens(text: &str) -> Vec<Tok<'_>> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;

    while i < text.len() {
        let Some(c) = text[i..].chars().next() else {
            break;
        };
        if c.is_whitespace() || c == '\\' {
            i += c.len_utf8();
        } else if c == '#' {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
        } else if c == '"' || c == '\'' {
            let end = string_end(bytes, i).unwrap_or_else(|e| e);
            out.push(Tok::Str(&text[i..end]));
            i = end;
        } else if c == '_' || c.is_alphabetic() {
            let start = i;
            i = word_end(text, i);
            let word = &text[start..i];
            if matches!(bytes.get(i), Some(b'"' | b'\'')) && is_string_prefix(word) {
                let end = string_end(bytes, i).unwrap_or_else(|e| e);
                out.push(Tok::Str(&text[start..end]));
                i = end;
            } else {
                out.push(Tok::Name(word));
            }
        } else if c.is_ascii_digit() || (c == '.' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit)) {
            let start = i;
            i = number_end(bytes, i);
            out.push(Tok::Number(&text[start..i]));
        } else {
            let rest = &text[i..];
            let op = OPERATORS
                .iter()
                .find(|op| rest.starts_with(**op))
                .map_or(&rest[..c.len_utf8()], |op| &rest[..op.len()]);
            out.push(Tok::Op(op));
            i += op.len();
        }
    }

    out
}

fn word_end(text: &str, start: usize) -> usize {
    text[start..]
        .char_indices()
        .find(|&(_, c)| !(c == '_' || c.is_alphanumeric()))
        .map_or(text.len(), |(off, _)| start + off)
}

fn number_end(bytes: &[u8], start: usize) -> usize {
    let hex = bytes[start..].starts_with(b"0x") || bytes[start..].starts_with(b"0X");
    let mut i = start;
    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_alphanumeric() || b == b'.' || b == b'_' {
            i += 1;
        } else if (b == b'+' || b == b'-') && !hex && matches!(bytes[i - 1], b'e' | b'E') {
            i += 1;
        } else {
            break;
        }
    }
    i
}

fn is_string_prefix(word: &str) -> bool {
    matches!(
        word.to_ascii_lowercase().as_str(),
        "r" | "u" | "b" | "f" | "t" | "br" | "rb" | "fr" | "rf" | "tr" | "rt"
    )
}

// ============================================================================
// Literals
// ============================================================================

/// Value of a single string literal token.
///
/// Returns `None` for bytes, f-strings and template strings (none of which
/// can be docstrings) and for unterminated literals.
pub fn string_value(literal: &str) -> Option<String> {
    let quote_pos = literal.find(['"', '\''])?;
    let prefix = literal[..quote_pos].to_ascii_lowercase();
    if prefix.contains(['b', 'f', 't']) {
        return None;
    }
    let quoted = &literal[quote_pos..];
    let quote = &quoted[..1];
    let delim = if quoted.len() >= 6 && quoted.starts_with(&quote.repeat(3)) {
        quote.repeat(3)
    } else {
        quote.to_string()
    };
    if quoted.len() < delim.len() * 2 || !quoted.ends_with(delim.as_str()) {
        return None;
    }
    let body = &quoted[delim.len()..quoted.len() - delim.len()];
    if prefix.contains('r') {
        Some(body.to_string())
    } else {
        Some(unescape(body))
    }
}

/// Value of an expression made only of string literals, optionally wrapped
/// in one pair of parentheses. Adjacent literals are concatenated.
pub fn string_expr(toks: &[Tok<'_>]) -> Option<String> {
    let inner = match toks {
        [Tok::Op("("), inner @ .., Tok::Op(")")] => inner,
        _ => toks,
    };
    if inner.is_empty() {
        return None;
    }
    inner.iter().try_fold(String::new(), |mut acc, tok| match tok {
        Tok::Str(lit) => {
            acc.push_str(&string_value(lit)?);
            Some(acc)
        }
        _ => None,
    })
}

/// Parse a `{"key": "value", ...}` literal whose keys and values are all strings.
pub fn string_dict(toks: &[Tok<'_>]) -> Result<Vec<(String, String)>, LiteralError> {
    let inner = match toks {
        [Tok::Op("{"), inner @ .., Tok::Op("}")] => inner,
        _ => return Err(LiteralError::NotADict),
    };

    let mut entries = Vec::new();
    let mut i = 0;
    while i < inner.len() {
        let key_end = literal_run(inner, i);
        let key = string_expr(&inner[i..key_end]).ok_or(LiteralError::NonStringKey)?;
        if !inner.get(key_end).is_some_and(|t| t.is_op(":")) {
            return Err(LiteralError::Malformed);
        }
        let value_start = key_end + 1;
        let value_end = literal_run(inner, value_start);
        let value = string_expr(&inner[value_start..value_end])
            .ok_or_else(|| LiteralError::NonStringValue(key.clone()))?;
        entries.push((key, value));

        match inner.get(value_end) {
            None => break,
            Some(t) if t.is_op(",") => i = value_end + 1,
            Some(_) => return Err(LiteralError::Malformed),
        }
    }
    Ok(entries)
}

/// End of the run of consecutive string tokens starting at `start`.
fn literal_run(toks: &[Tok<'_>], start: usize) -> usize {
    toks[start.min(toks.len())..]
        .iter()
        .position(|t| !matches!(t, Tok::Str(_)))
        .map_or(toks.len(), |off| start + off)
}

fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\n') => {}
            Some('\r') => {
                chars.next_if_eq(&'\n');
            }
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('a') => out.push('\x07'),
            Some('b') => out.push('\x08'),
            Some('f') => out.push('\x0c'),
            Some('v') => out.push('\x0b'),
            Some(d @ '0'..='7') => {
                let mut digits = d.to_string();
                while digits.len() < 3 {
                    match chars.next_if(|c| ('0'..='7').contains(c)) {
                        Some(c) => digits.push(c),
                        None => break,
                    }
                }
                match u32::from_str_radix(&digits, 8).ok().and_then(char::from_u32) {
                    Some(ch) => out.push(ch),
                    None => {
                        out.push('\\');
                        out.push_str(&digits);
                    }
                }
            }
            Some(kind @ ('x' | 'u' | 'U')) => {
                let width = match kind {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let mut digits = String::new();
                while digits.len() < width {
                    match chars.next_if(char::is_ascii_hexdigit) {
                        Some(c) => digits.push(c),
                        None => break,
                    }
                }
                let decoded = (digits.len() == width)
                    .then(|| u32::from_str_radix(&digits, 16).ok())
                    .flatten()
                    .and_then(char::from_u32);
                match decoded {
                    Some(ch) => out.push(ch),
                    None => {
                        out.push('\\');
                        out.push(kind);
                        out.push_str(&digits);
                    }
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

// ============================================================================
// Docstrings
// ============================================================================

/// Normalize docstring indentation like `inspect.cleandoc`.
///
/// The first line loses its leading whitespace, the common indentation of the
/// remaining lines is removed, and leading/trailing blank lines are dropped.
pub fn cleandoc(doc: &str) -> String {
    let expanded = doc.replace('\t', "        ");
    let lines: Vec<&str> = expanded.lines().collect();

    let leading = |line: &str| line.len() - line.trim_start_matches(' ').len();
    let margin = lines
        .iter()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .map(|l| leading(l))
        .min()
        .unwrap_or(0);

    let cleaned: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(idx, line)| {
            if idx == 0 {
                line.trim_start()
            } else {
                &line[leading(line).min(margin)..]
            }
        })
        .collect();

    let first = cleaned.iter().position(|l| !l.trim().is_empty());
    let last = cleaned.iter().rposition(|l| !l.trim().is_empty());
    match (first, last) {
        (Some(first), Some(last)) => cleaned[first..=last].join("\n"),
        _ => String::new(),
    }
}

/// First non-blank line of a docstring, trimmed; empty when there is none.
pub fn summary_line(doc: &str) -> String {
    doc.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default()
        .to_string()
}
