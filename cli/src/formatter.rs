//! Output formatters for query results
//!
//! Renders a [`Response`] as JSON, CSV or aligned columns. The line-oriented
//! formats skip the name, tag and column header of a result whose first
//! series has the same header as the last one printed.

use influx_link::{QueryResult, Response, Series};
use serde::Serialize;

use crate::align::ColumnWriter;
use crate::error::{CLIError, Result};
use crate::state::OutputFormat;

/// Formats query results for display
pub struct OutputFormatter {
    format: OutputFormat,
    pretty: bool,
}

impl OutputFormatter {
    /// Create a new formatter
    pub fn new(format: OutputFormat, pretty: bool) -> Self {
        Self { format, pretty }
    }

    /// Format a query response. The text ends with a newline unless empty.
    pub fn format_response(&self, response: &Response) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_json(response),
            OutputFormat::Csv => Ok(self.format_csv(response)),
            OutputFormat::Column => Ok(self.format_columns(response)),
        }
    }

    fn format_json(&self, response: &Response) -> Result<String> {
        let mut buf = Vec::new();
        if self.pretty {
            let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
            let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
            response.serialize(&mut ser)?;
        } else {
            serde_json::to_writer(&mut buf, response)?;
        }
        buf.push(b'\n');
        String::from_utf8(buf).map_err(|e| CLIError::FormatError(e.to_string()))
    }

    fn format_csv(&self, response: &Response) -> String {
        let mut output = String::new();
        let mut headers = HeaderTracker::default();

        for result in &response.results {
            let suppress = headers.observe(result);
            for record in csv_records(result, suppress) {
                let fields: Vec<String> = record.iter().map(|f| escape_csv_field(f)).collect();
                output.push_str(&fields.join(","));
                output.push('\n');
            }
        }

        output
    }

    fn format_columns(&self, response: &Response) -> String {
        let mut writer = ColumnWriter::new(0, 1);
        let mut headers = HeaderTracker::default();

        for (i, result) in response.results.iter().enumerate() {
            for message in &result.messages {
                writer.write_line(&format!("{}: {}.", message.level, message.text));
            }

            let suppress = headers.observe(result);
            if !suppress && i > 0 {
                writer.write_line("");
            }

            for line in column_lines(result, suppress) {
                writer.write_line(&line);
            }
        }

        writer.flush()
    }
}

/// Remembers the header of the last result whose header was printed.
#[derive(Default)]
struct HeaderTracker<'a> {
    previous: Option<&'a Series>,
}

impl<'a> HeaderTracker<'a> {
    /// Returns whether `result`'s header repeats the previous one, and makes
    /// it the new reference when it does not.
    fn observe(&mut self, result: &'a QueryResult) -> bool {
        let Some(first) = result.series.first() else {
            return false;
        };
        let repeated = self.previous.is_some_and(|prev| prev.same_header(first));
        if !repeated {
            self.previous = Some(first);
        }
        repeated
    }
}

/// `key=value` pairs sorted by the whole pair.
fn sorted_tags(series: &Series) -> Vec<String> {
    let mut tags: Vec<String> = series
        .tags
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();
    tags.sort();
    tags
}

fn column_lines(result: &QueryResult, suppress: bool) -> Vec<String> {
    let mut lines = Vec::new();

    for (i, series) in result.series.iter().enumerate() {
        if !suppress {
            if i > 0 {
                lines.push(String::new());
            }
            if !series.name.is_empty() {
                lines.push(format!("name: {}", series.name));
            }
            let tags = sorted_tags(series);
            if !tags.is_empty() {
                lines.push(format!("tags: {}", tags.join(", ")));
            }
            lines.push(series.columns.join("\t"));
            let dashes: Vec<String> = series.columns.iter().map(|c| "-".repeat(c.len())).collect();
            lines.push(dashes.join("\t"));
        }

        for row in &series.values {
            let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
            lines.push(cells.join("\t"));
        }
    }

    lines
}

fn csv_records(result: &QueryResult, suppress: bool) -> Vec<Vec<String>> {
    let mut records = Vec::new();

    for series in &result.series {
        let tags = sorted_tags(series);
        let has_name = !series.name.is_empty();

        if !suppress {
            let mut header = Vec::with_capacity(series.columns.len() + 2);
            if has_name {
                header.push("name".to_string());
            }
            if !tags.is_empty() {
                header.push("tags".to_string());
            }
            header.extend(series.columns.iter().cloned());
            records.push(header);
        }

        for row in &series.values {
            let mut record = Vec::with_capacity(row.len() + 2);
            if has_name {
                record.push(series.name.clone());
            }
            if !tags.is_empty() {
                record.push(tags.join(","));
            }
            record.extend(row.iter().map(ToString::to_string));
            records.push(record);
        }
    }

    records
}

/// Quote a CSV field when it holds a separator, a quote, a line break or
/// starts with whitespace.
fn escape_csv_field(field: &str) -> String {
    let needs_quotes = !field.is_empty()
        && (field == r"\."
            || field.contains([',', '"', '\r', '\n'])
            || field.starts_with(char::is_whitespace));
    if needs_quotes {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
