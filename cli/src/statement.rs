//! Scoping of `insert` and `use` statements.
//!
//! Splits the statement into its target identifiers and the remaining text
//! and resolves which database and retention policy it applies to.

use crate::error::{CLIError, Result};
use crate::identifier::next_identifier;
use crate::state::SessionState;
use influx_link::{BatchPoints, Point};

/// Where an `insert` statement writes and what it writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertTarget {
    pub database: String,
    pub retention_policy: String,
    /// Line-protocol text, passed to the server untouched
    pub point: String,
    pub precision: String,
    pub write_consistency: String,
}

impl InsertTarget {
    pub fn into_batch(self) -> BatchPoints {
        BatchPoints {
            points: vec![Point::raw(self.point)],
            database: self.database,
            retention_policy: self.retention_policy,
            precision: self.precision,
            write_consistency: self.write_consistency,
        }
    }
}

/// Parse `insert [into [db[.rp]]] <point>`.
///
/// Without `into` the session's database and retention policy apply. The
/// session's precision and write consistency always apply.
pub fn parse_insert(statement: &str, state: &SessionState) -> Result<InsertTarget> {
    let (keyword, rest) = next_identifier(statement);
    if !keyword.eq_ignore_ascii_case("insert") {
        return Err(CLIError::parse_error(format!(
            "found {}, expected INSERT",
            keyword
        )));
    }

    let mut target = InsertTarget {
        database: state.database.clone(),
        retention_policy: state.retention_policy.clone(),
        point: String::new(),
        precision: state.precision.clone(),
        write_consistency: state.write_consistency.clone(),
    };

    let (next, after_into) = next_identifier(rest);
    if !next.eq_ignore_ascii_case("into") {
        target.point = rest.trim_start().to_string();
        return Ok(target);
    }

    let (database, mut rest) = next_identifier(after_into);
    if database.is_empty() {
        return Err(CLIError::parse_error(format!(
            "found {}, expected database after INTO",
            first_token(rest)
        )));
    }
    target.database = database.to_string();

    if let Some(after_dot) = rest.strip_prefix('.') {
        let (retention_policy, after_rp) = next_identifier(after_dot);
        if retention_policy.is_empty() {
            return Err(CLIError::parse_error(format!(
                "found {}, expected retention policy after {}.",
                first_token(after_dot),
                database
            )));
        }
        target.retention_policy = retention_policy.to_string();
        rest = after_rp;
    }

    match rest.strip_prefix(' ') {
        Some(point) => {
            target.point = point.to_string();
            Ok(target)
        },
        None => Err(CLIError::parse_error(format!(
            "found {}, expected point after INTO {}",
            first_token(rest),
            database
        ))),
    }
}

/// Parse the argument of `use`: `<db>` or `<db>.<rp>`.
pub fn parse_database_and_retention_policy(text: &str) -> Result<(String, String)> {
    let (database, rest) = next_identifier(text);
    if database.is_empty() {
        return Err(CLIError::parse_error(format!(
            "unable to parse database name from {:?}",
            text.trim()
        )));
    }

    let (retention_policy, rest) = match rest.strip_prefix('.') {
        Some(after_dot) => {
            let (rp, rest) = next_identifier(after_dot);
            if rp.is_empty() {
                return Err(CLIError::parse_error(format!(
                    "unable to parse retention policy from {:?}",
                    after_dot.trim()
                )));
            }
            (rp, rest)
        },
        None => ("", rest),
    };

    if !rest.trim().is_empty() {
        return Err(CLIError::parse_error(format!(
            "found {}, expected end of statement",
            first_token(rest)
        )));
    }

    Ok((database.to_string(), retention_policy.to_string()))
}

/// First whitespace-delimited word of `text`, or `EOF`.
fn first_token(text: &str) -> &str {
    text.split_whitespace().next().unwrap_or("EOF")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scoped_state() -> SessionState {
        SessionState {
            database: "d".into(),
            retention_policy: "r".into(),
            precision: "s".into(),
            write_consistency: "one".into(),
            ..SessionState::default()
        }
    }

    #[test]
    fn test_insert_into_database_and_retention_policy() {
        let target = parse_insert("insert into mydb.myrp cpu value=1", &SessionState::default())
            .unwrap();
        assert_eq!(target.database, "mydb");
        assert_eq!(target.retention_policy, "myrp");
        assert_eq!(target.point, "cpu value=1");
    }

    #[test]
    fn test_insert_without_into_uses_session_scope() {
        let target = parse_insert("insert cpu value=1", &scoped_state()).unwrap();
        assert_eq!(target.database, "d");
        assert_eq!(target.retention_policy, "r");
        assert_eq!(target.point, "cpu value=1");
        assert_eq!(target.precision, "s");
        assert_eq!(target.write_consistency, "one");
    }

    #[test]
    fn test_insert_into_database_only() {
        let target = parse_insert("INSERT INTO other cpu,host=a value=2", &scoped_state()).unwrap();
        assert_eq!(target.database, "other");
        assert_eq!(target.retention_policy, "r");
        assert_eq!(target.point, "cpu,host=a value=2");
    }

    #[test]
    fn test_insert_into_quoted_identifiers() {
        let target =
            parse_insert(r#"insert into "my db"."one week" cpu value=3"#, &SessionState::default())
                .unwrap();
        assert_eq!(target.database, "my db");
        assert_eq!(target.retention_policy, "one week");
        assert_eq!(target.point, "cpu value=3");
    }

    #[test]
    fn test_insert_keyword_required() {
        let err = parse_insert("insrt x", &SessionState::default()).unwrap_err();
        assert!(matches!(err, CLIError::ParseError(_)));
        assert_eq!(err.to_string(), "found insrt, expected INSERT");
    }

    #[test]
    fn test_insert_into_missing_retention_policy() {
        let err = parse_insert("insert into db.=x cpu value=1", &SessionState::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "found =x, expected retention policy after db.");
    }

    #[test]
    fn test_insert_into_target_needs_separator() {
        let err = parse_insert("insert into cpu,host=a value=1", &SessionState::default())
            .unwrap_err();
        assert!(err.to_string().contains("expected point"));
    }

    #[test]
    fn test_into_batch_carries_scope() {
        let batch = parse_insert("insert cpu value=1", &scoped_state())
            .unwrap()
            .into_batch();
        assert_eq!(batch.points.len(), 1);
        assert_eq!(batch.points[0].raw, "cpu value=1");
        assert_eq!(batch.database, "d");
        assert_eq!(batch.precision, "s");
    }

    #[test]
    fn test_use_arguments() {
        assert_eq!(
            parse_database_and_retention_policy("telegraf").unwrap(),
            ("telegraf".to_string(), String::new())
        );
        assert_eq!(
            parse_database_and_retention_policy(r#" "my db".autogen "#).unwrap(),
            ("my db".to_string(), "autogen".to_string())
        );
        assert!(parse_database_and_retention_policy("").is_err());
        assert!(parse_database_and_retention_policy("db.").is_err());
        assert!(parse_database_and_retention_policy("db rp").is_err());
    }
}
