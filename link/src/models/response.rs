use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::value::Value;

/// Reply from the `/query` endpoint.
///
/// A chunked reply is decoded one chunk at a time and folded into a single
/// `Response` with [`Response::append`], so one statement may contribute
/// several consecutive [`QueryResult`]s.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub results: Vec<QueryResult>,

    /// Request-level failure reported by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    /// First error reported anywhere in the reply, request-level errors first.
    pub fn error(&self) -> Option<&str> {
        if let Some(err) = self.error.as_deref().filter(|e| !e.is_empty()) {
            return Some(err);
        }
        self.results
            .iter()
            .find_map(|result| result.error.as_deref().filter(|e| !e.is_empty()))
    }

    /// Folds a decoded chunk into this response. Returns `false` once a chunk
    /// carries a request-level error, after which no more chunks are expected.
    pub fn append(&mut self, chunk: Response) -> bool {
        self.results.extend(chunk.results);
        match chunk.error {
            Some(err) if !err.is_empty() => {
                self.error = Some(err);
                false
            },
            _ => true,
        }
    }
}

/// Outcome of one statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub statement_id: u64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub series: Vec<Series>,

    /// Informational notices such as deprecation warnings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,

    /// More chunks follow for this statement
    #[serde(default, skip_serializing_if = "is_false")]
    pub partial: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A group of rows sharing a measurement name, tag set and column list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Vec<Value>>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub partial: bool,
}

impl Series {
    /// Structural equality of the identifying header: name, tag mapping and
    /// ordered column list. Rows are not compared.
    pub fn same_header(&self, other: &Series) -> bool {
        self.name == other.name && self.tags == other.tags && self.columns == other.columns
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub level: String,
    pub text: String,
}

fn is_false(b: &bool) -> bool {
    !*b
}
