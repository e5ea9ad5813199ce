/// A single point in line protocol, passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Point {
    pub raw: String,
}

impl Point {
    pub fn raw(line: impl Into<String>) -> Self {
        Self { raw: line.into() }
    }
}

/// A group of points written with one `/write` request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchPoints {
    pub points: Vec<Point>,
    pub database: String,
    pub retention_policy: String,
    /// Timestamp precision of the points; empty means nanoseconds
    pub precision: String,
    /// Write consistency for clustered servers; empty lets the server decide
    pub write_consistency: String,
}

impl BatchPoints {
    /// Line protocol body, one point per line.
    pub fn body(&self) -> String {
        let mut body = String::new();
        for point in &self.points {
            body.push_str(&point.raw);
            body.push('\n');
        }
        body
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub(crate) fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("db", self.database.clone())];
        if !self.retention_policy.is_empty() {
            params.push(("rp", self.retention_policy.clone()));
        }
        if !self.precision.is_empty() {
            params.push(("precision", self.precision.clone()));
        }
        if !self.write_consistency.is_empty() {
            params.push(("consistency", self.write_consistency.clone()));
        }
        params
    }
}
