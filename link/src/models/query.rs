/// A query sent to the `/query` endpoint.
///
/// # Examples
///
/// ```rust
/// use influx_link::Query;
///
/// let query = Query::new("SELECT * FROM cpu")
///     .with_database("telegraf")
///     .with_retention_policy("autogen")
///     .with_chunking(true, 1000);
///
/// assert_eq!(query.database, "telegraf");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    /// Query text, possibly several `;`-separated statements
    pub command: String,

    /// Default database for unqualified measurements (`db` parameter)
    pub database: String,

    /// Default retention policy (`rp` parameter)
    pub retention_policy: String,

    /// Ask the server to stream the reply in chunks
    pub chunked: bool,

    /// Points per chunk; 0 lets the server choose
    pub chunk_size: usize,

    /// Restrict the query to a single data node; 0 means any
    pub node_id: i64,
}

impl Query {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_retention_policy(mut self, retention_policy: impl Into<String>) -> Self {
        self.retention_policy = retention_policy.into();
        self
    }

    pub fn with_chunking(mut self, chunked: bool, chunk_size: usize) -> Self {
        self.chunked = chunked;
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_node_id(mut self, node_id: i64) -> Self {
        self.node_id = node_id;
        self
    }

    /// URL query parameters for this request, excluding authentication and
    /// precision which the client adds itself.
    pub(crate) fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("q", self.command.clone())];
        if !self.database.is_empty() {
            params.push(("db", self.database.clone()));
        }
        if !self.retention_policy.is_empty() {
            params.push(("rp", self.retention_policy.clone()));
        }
        if self.chunked {
            params.push(("chunked", "true".to_string()));
            if self.chunk_size > 0 {
                params.push(("chunk_size", self.chunk_size.to_string()));
            }
        }
        if self.node_id > 0 {
            params.push(("node_id", self.node_id.to_string()));
        }
        params
    }
}
