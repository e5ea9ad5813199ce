//! Identifier scanning for `insert into` and `use` arguments, plus the
//! escape-aware span reader the query rewriter uses for literals.
//!
//! Recognizes unquoted identifiers (`[A-Za-z_][A-Za-z0-9_]*`) and
//! double-quoted identifiers where `\"` does not terminate the token. The
//! returned remainder is always a suffix of the input.

/// Space, tab or newline.
fn is_whitespace(ch: char) -> bool {
    ch == ' ' || ch == '\t' || ch == '\n'
}

fn is_ident_first_char(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Scan the next identifier in `text`.
///
/// Returns `(identifier, remainder)`. When nothing identifier-like sits at
/// the cursor (after leading whitespace) the identifier is empty and the
/// remainder is the input with that whitespace removed.
///
/// ```rust
/// use influx_cli::identifier::next_identifier;
///
/// assert_eq!(next_identifier("  mydb.autogen"), ("mydb", ".autogen"));
/// assert_eq!(next_identifier(r#""my db" rest"#), ("my db", " rest"));
/// assert_eq!(next_identifier("=x"), ("", "=x"));
/// ```
pub fn next_identifier(text: &str) -> (&str, &str) {
    match text.chars().next() {
        Some(ch) if is_whitespace(ch) => next_identifier(&text[ch.len_utf8()..]),
        Some(ch) if is_ident_first_char(ch) => unquoted_identifier(text),
        Some('"') => quoted_identifier(text),
        _ => ("", text),
    }
}

fn unquoted_identifier(text: &str) -> (&str, &str) {
    let end = text
        .char_indices()
        .find(|(_, ch)| !is_ident_char(*ch))
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    text.split_at(end)
}

/// `text` starts with `"`. The identifier is the raw text between the quotes,
/// escapes included.
fn quoted_identifier(text: &str) -> (&str, &str) {
    match delimited_span(text, '"') {
        Some(len) if len > 2 => (&text[1..len - 1], &text[len..]),
        // Empty or unterminated: no identifier here.
        _ => ("", text),
    }
}

/// Byte length of the `delim`-enclosed span that opens `text`, both
/// delimiters included. A backslash escapes the character after it, so
/// `\"` inside `"..."` and `\/` inside `/.../` do not terminate the span.
///
/// Returns `None` when `text` does not start with `delim` or the span is
/// never closed.
pub fn delimited_span(text: &str, delim: char) -> Option<usize> {
    let body = text.strip_prefix(delim)?;
    let mut escaped = false;
    for (idx, ch) in body.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            c if c == delim => return Some(delim.len_utf8() + idx + c.len_utf8()),
            _ => {},
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unquoted_identifier() {
        assert_eq!(next_identifier("insert into db"), ("insert", " into db"));
        assert_eq!(next_identifier("_tmp1.rp"), ("_tmp1", ".rp"));
        assert_eq!(next_identifier("cpu,host=a value=1"), ("cpu", ",host=a value=1"));
    }

    #[test]
    fn test_leading_whitespace_is_skipped() {
        for input in ["mydb.rp", " mydb.rp", "\t\n mydb.rp"] {
            assert_eq!(next_identifier(input), next_identifier(input.trim_start()));
        }
        assert_eq!(next_identifier(" \t=5"), ("", "=5"));
    }

    #[test]
    fn test_no_identifier() {
        assert_eq!(next_identifier(""), ("", ""));
        assert_eq!(next_identifier("1abc"), ("", "1abc"));
        assert_eq!(next_identifier(".rp"), ("", ".rp"));
        assert_eq!(next_identifier("   "), ("", ""));
    }

    #[test]
    fn test_quoted_identifier() {
        assert_eq!(next_identifier(r#""my db".rp"#), ("my db", ".rp"));
        assert_eq!(next_identifier(r#""1st""#), ("1st", ""));
    }

    #[test]
    fn test_escaped_quote_does_not_terminate() {
        let (ident, rest) = next_identifier(r#""a\"b" tail"#);
        assert_eq!(ident, r#"a\"b"#);
        assert_eq!(rest, " tail");
    }

    #[test]
    fn test_double_backslash_before_quote_terminates() {
        let (ident, rest) = next_identifier(r#""a\\" tail"#);
        assert_eq!(ident, r#"a\\"#);
        assert_eq!(rest, " tail");
    }

    #[test]
    fn test_unterminated_or_empty_quote() {
        assert_eq!(next_identifier(r#""open"#), ("", r#""open"#));
        assert_eq!(next_identifier(r#"  "" x"#), ("", r#""" x"#));
    }

    #[test]
    fn test_delimited_span() {
        assert_eq!(delimited_span("'abc' x", '\''), Some(5));
        assert_eq!(delimited_span(r"'it\'s' x", '\''), Some(7));
        assert_eq!(delimited_span(r"/a\/b/ x", '/'), Some(6));
        assert_eq!(delimited_span(r#""a\\" x"#, '"'), Some(5));
        assert_eq!(delimited_span("'open", '\''), None);
        assert_eq!(delimited_span("abc", '\''), None);
    }

    #[test]
    fn test_remainder_is_suffix() {
        let inputs = ["insert into a.b c", r#" "x\"y".z"#, "??", "ab\u{e9}c"];
        for input in inputs {
            let (_, rest) = next_identifier(input);
            assert!(input.ends_with(rest));
        }
        assert_eq!(next_identifier("ab\u{e9}c"), ("ab", "\u{e9}c"));
    }
}
