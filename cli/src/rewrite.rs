//! Fills the session's database and retention policy into `SELECT` sources.
//!
//! Statements are first parsed into an AST and every relation of every
//! `SELECT` is qualified in place. The query language is wider than the SQL
//! grammar (duration literals, regex sources, `SHOW` statements), so when
//! the AST parse fails the same library's tokenizer is used instead: `FROM`
//! source paths of `SELECT` statements are re-rendered and every other
//! token is emitted as written. Only a tokenizer failure aborts the query.
//!
//! Before either pass, `/regex/` literals and quoted text using backslash
//! escapes are swapped for placeholder words (see [`MaskedQuery`]), since
//! the SQL tokenizer reads neither.

use crate::error::{CLIError, Result};
use crate::identifier::delimited_span;
use sqlparser::ast::{visit_relations_mut, Ident, ObjectName, ObjectNamePart, Statement};
use sqlparser::dialect::GenericDialect;
use sqlparser::keywords::Keyword;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::{Token, Tokenizer};
use std::ops::ControlFlow;

/// Qualify measurement references that lack a database or retention policy.
///
/// Explicit values are never overridden; empty `database` or
/// `retention_policy` arguments leave that part alone.
pub fn rewrite_query(query: &str, database: &str, retention_policy: &str) -> Result<String> {
    let masked = MaskedQuery::new(query);
    // Regex matches (`=~ /.../`) have no SQL equivalent; the printer would
    // re-space the operator.
    if masked.has_regex {
        log::debug!("[REWRITE] Regex literal present, rewriting tokens");
        let rewritten = rewrite_token_stream(&masked.text, database, retention_policy)?;
        return Ok(masked.restore(rewritten));
    }

    let dialect = GenericDialect {};
    let rewritten = match Parser::parse_sql(&dialect, &masked.text) {
        Ok(mut statements) => {
            for statement in statements.iter_mut() {
                if let Statement::Query(select) = statement {
                    let _ = visit_relations_mut(&mut **select, |name| {
                        qualify_object_name(name, database, retention_policy);
                        ControlFlow::<()>::Continue(())
                    });
                }
            }
            log::debug!("[REWRITE] AST rewrite of {} statement(s)", statements.len());
            statements
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(";\n")
        },
        Err(err) => {
            log::debug!("[REWRITE] AST parse failed ({}), rewriting tokens", err);
            rewrite_token_stream(&masked.text, database, retention_policy)?
        },
    };
    Ok(masked.restore(rewritten))
}

/// Query text with the literals the SQL tokenizer cannot read replaced by
/// placeholder words.
///
/// Masked: every terminated `/regex/` in a position where the query
/// language expects one, and every `'...'` or `"..."` containing a
/// backslash. Other quoted text is left for the tokenizer. An unterminated
/// literal stops the scan so the tokenizer reports it.
struct MaskedQuery {
    text: String,
    /// `(placeholder, original literal)` in order of appearance
    literals: Vec<(String, String)>,
    has_regex: bool,
}

impl MaskedQuery {
    fn new(query: &str) -> Self {
        let prefix = placeholder_prefix(query);
        let mut masked = Self {
            text: String::with_capacity(query.len()),
            literals: Vec::new(),
            has_regex: false,
        };
        let mut regex_allowed = false;
        let mut i = 0;

        while let Some(ch) = query[i..].chars().next() {
            let rest = &query[i..];
            let len = match ch {
                '-' if rest.starts_with("--") => rest.find('\n').unwrap_or(rest.len()),
                '/' if rest.starts_with("/*") => rest.find("*/").map_or(rest.len(), |end| end + 2),
                '\'' | '"' | '/' if ch != '/' || regex_allowed => {
                    let Some(len) = delimited_span(rest, ch) else {
                        masked.text.push_str(rest);
                        break;
                    };
                    let literal = &rest[..len];
                    if ch == '/' {
                        masked.has_regex = true;
                        masked.push_literal(&prefix, literal);
                    } else if literal.contains('\\') {
                        masked.push_literal(&prefix, literal);
                    } else {
                        masked.text.push_str(literal);
                    }
                    regex_allowed = false;
                    i += len;
                    continue;
                },
                c if c.is_ascii_alphanumeric() || c == '_' => {
                    let len = rest
                        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                        .unwrap_or(rest.len());
                    let word = &rest[..len];
                    regex_allowed = REGEX_AFTER_KEYWORDS
                        .iter()
                        .any(|keyword| word.eq_ignore_ascii_case(keyword));
                    len
                },
                c if c.is_whitespace() => c.len_utf8(),
                c => {
                    regex_allowed = matches!(c, '~' | ',' | '(' | '.');
                    c.len_utf8()
                },
            };
            masked.text.push_str(&rest[..len]);
            i += len;
        }

        masked
    }

    fn push_literal(&mut self, prefix: &str, literal: &str) {
        let placeholder = format!("{}{}__", prefix, self.literals.len());
        self.text.push_str(&placeholder);
        self.literals.push((placeholder, literal.to_string()));
    }

    /// Put the original literals back into rewritten text.
    fn restore(&self, rewritten: String) -> String {
        self.literals
            .iter()
            .fold(rewritten, |text, (placeholder, literal)| text.replacen(placeholder, literal, 1))
    }
}

/// A regex may follow these keywords, `=~`/`!~`, a comma, `(` or `.`;
/// anywhere else `/` is division.
const REGEX_AFTER_KEYWORDS: &[&str] = &["SELECT", "FROM", "BY"];

/// Placeholder stem that does not occur anywhere in `query`.
fn placeholder_prefix(query: &str) -> String {
    let mut prefix = String::from("__literal_");
    while query.contains(&prefix) {
        prefix.insert(0, '_');
    }
    prefix
}

/// `[m]`, `[rp, m]` or `[db, rp, m]` with gaps filled.
fn qualify_object_name(name: &mut ObjectName, database: &str, retention_policy: &str) {
    let mut idents = Vec::with_capacity(name.0.len());
    for part in &name.0 {
        match part {
            ObjectNamePart::Identifier(ident) => idents.push(ident.clone()),
            _ => return,
        }
    }

    let (db, rp, measurement) = match idents.len() {
        1 => (None, None, idents.remove(0)),
        2 => {
            let measurement = idents.remove(1);
            (None, Some(idents.remove(0)), measurement)
        },
        3 => {
            let measurement = idents.remove(2);
            let rp = idents.remove(1);
            (Some(idents.remove(0)), Some(rp), measurement)
        },
        _ => return,
    };

    let db = fill_ident(db, database);
    let rp = fill_ident(rp, retention_policy);

    let mut parts = Vec::with_capacity(3);
    if let Some(db) = db {
        parts.push(ObjectNamePart::Identifier(db));
        parts.push(ObjectNamePart::Identifier(
            rp.unwrap_or_else(|| Ident::new("")),
        ));
    } else if let Some(rp) = rp {
        parts.push(ObjectNamePart::Identifier(rp));
    }
    parts.push(ObjectNamePart::Identifier(measurement));
    name.0 = parts;
}

fn fill_ident(current: Option<Ident>, fallback: &str) -> Option<Ident> {
    match current {
        Some(ident) if !ident.value.is_empty() => Some(ident),
        _ if !fallback.is_empty() => Some(make_ident(fallback)),
        _ => None,
    }
}

fn make_ident(value: &str) -> Ident {
    if needs_quotes(value) {
        Ident::with_quote('"', value)
    } else {
        Ident::new(value)
    }
}

fn needs_quotes(value: &str) -> bool {
    let mut chars = value.chars();
    let plain = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        },
        None => false,
    };
    !plain || RESERVED_WORDS.contains(&value.to_ascii_uppercase().as_str())
}

/// Words the server's query language reserves; identifiers spelled like
/// these must be quoted.
const RESERVED_WORDS: &[&str] = &[
    "ALL", "ALTER", "ANY", "AS", "ASC", "BEGIN", "BY", "CREATE", "CONTINUOUS", "DATABASE",
    "DATABASES", "DEFAULT", "DELETE", "DESC", "DESTINATIONS", "DIAGNOSTICS", "DISTINCT", "DROP",
    "DURATION", "END", "EVERY", "EXPLAIN", "FIELD", "FOR", "FROM", "GRANT", "GRANTS", "GROUP",
    "GROUPS", "IN", "INF", "INSERT", "INTO", "KEY", "KEYS", "KILL", "LIMIT", "SHOW",
    "MEASUREMENT", "MEASUREMENTS", "NAME", "OFFSET", "ON", "ORDER", "PASSWORD", "POLICY",
    "POLICIES", "PRIVILEGES", "QUERIES", "QUERY", "READ", "REPLICATION", "RESAMPLE", "RETENTION",
    "REVOKE", "SELECT", "SERIES", "SET", "SHARD", "SHARDS", "SLIMIT", "SOFFSET", "STATS",
    "SUBSCRIPTION", "SUBSCRIPTIONS", "TAG", "TO", "USER", "USERS", "VALUES", "WHERE", "WITH",
    "WRITE",
];

/// Render a filled-in identifier the way it must appear in query text.
fn quote_ident(value: &str) -> String {
    if needs_quotes(value) {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

/// Token-level rewrite that keeps all text outside `FROM` sources intact.
pub fn rewrite_tokens(query: &str, database: &str, retention_policy: &str) -> Result<String> {
    let masked = MaskedQuery::new(query);
    let rewritten = rewrite_token_stream(&masked.text, database, retention_policy)?;
    Ok(masked.restore(rewritten))
}

fn rewrite_token_stream(query: &str, database: &str, retention_policy: &str) -> Result<String> {
    let dialect = GenericDialect {};
    let tokens = Tokenizer::new(&dialect, query)
        .with_unescape(false)
        .tokenize()
        .map_err(|e| CLIError::parse_error(e.to_string()))?;

    let mut out = String::with_capacity(query.len() + database.len() + retention_policy.len() + 8);
    // None until the statement's first significant token is seen
    let mut is_select: Option<bool> = None;
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];
        match token {
            Token::Whitespace(_) => {},
            Token::SemiColon => is_select = None,
            Token::Word(word) if is_select.is_none() => {
                is_select = Some(word.quote_style.is_none() && word.keyword == Keyword::SELECT);
            },
            Token::Word(word)
                if is_select == Some(true)
                    && word.quote_style.is_none()
                    && word.keyword == Keyword::FROM =>
            {
                out.push_str(&token.to_string());
                i = rewrite_sources(&tokens, i + 1, &mut out, database, retention_policy);
                continue;
            },
            _ if is_select.is_none() => is_select = Some(false),
            _ => {},
        }
        out.push_str(&token.to_string());
        i += 1;
    }

    Ok(out)
}

/// Rewrites a comma-separated source list starting at `start`. Returns the
/// index of the first token not consumed.
fn rewrite_sources(
    tokens: &[Token],
    start: usize,
    out: &mut String,
    database: &str,
    retention_policy: &str,
) -> usize {
    let mut i = start;
    loop {
        i = copy_whitespace(tokens, i, out);
        let Some((segments, next)) = source_path(tokens, i) else {
            return i;
        };
        out.push_str(&render_source(segments, database, retention_policy));
        i = next;

        let after = skip_whitespace(tokens, i);
        if matches!(tokens.get(after), Some(Token::Comma)) {
            for token in &tokens[i..=after] {
                out.push_str(&token.to_string());
            }
            i = after + 1;
        } else {
            return i;
        }
    }
}

/// Reads `seg(.seg)*` where a segment is a word or empty. Masked regexes
/// arrive here as words. Segments are returned as written; `None` marks an
/// empty one.
fn source_path(tokens: &[Token], start: usize) -> Option<(Vec<Option<String>>, usize)> {
    let mut segments = Vec::new();
    let mut i = start;
    loop {
        let segment = match tokens.get(i) {
            Some(Token::Word(_)) => {
                let text = tokens[i].to_string();
                i += 1;
                Some(text)
            },
            Some(Token::Period) if !segments.is_empty() || i == start => None,
            _ => return None,
        };
        segments.push(segment);

        match tokens.get(i) {
            Some(Token::Period) => i += 1,
            _ => break,
        }
    }

    match segments.last() {
        Some(Some(_)) => Some((segments, i)),
        _ => None,
    }
}

fn render_source(segments: Vec<Option<String>>, database: &str, retention_policy: &str) -> String {
    let (db, rp, measurement) = match segments.len() {
        1 => (None, None, segments[0].clone()),
        2 => (None, segments[0].clone(), segments[1].clone()),
        3 => (segments[0].clone(), segments[1].clone(), segments[2].clone()),
        _ => {
            return segments
                .into_iter()
                .map(Option::unwrap_or_default)
                .collect::<Vec<_>>()
                .join(".")
        },
    };

    let db = db.or_else(|| (!database.is_empty()).then(|| quote_ident(database)));
    let rp = rp.or_else(|| (!retention_policy.is_empty()).then(|| quote_ident(retention_policy)));

    let mut rendered = String::new();
    if let Some(db) = &db {
        rendered.push_str(db);
        rendered.push('.');
    }
    if rp.is_some() || db.is_some() {
        rendered.push_str(rp.as_deref().unwrap_or(""));
        rendered.push('.');
    }
    rendered.push_str(measurement.as_deref().unwrap_or(""));
    rendered
}

fn skip_whitespace(tokens: &[Token], mut i: usize) -> usize {
    while matches!(tokens.get(i), Some(Token::Whitespace(_))) {
        i += 1;
    }
    i
}

fn copy_whitespace(tokens: &[Token], mut i: usize, out: &mut String) -> usize {
    while let Some(token @ Token::Whitespace(_)) = tokens.get(i) {
        out.push_str(&token.to_string());
        i += 1;
    }
    i
}
