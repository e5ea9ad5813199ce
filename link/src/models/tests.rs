use serde_json::json;

use super::*;

// ==================== Response decoding ====================

#[test]
fn test_response_decodes_series_and_messages() {
    let body = json!({
        "results": [{
            "statement_id": 0,
            "series": [{
                "name": "cpu",
                "tags": {"host": "a"},
                "columns": ["time", "value"],
                "values": [["2024-01-01T00:00:00Z", 1.5], ["2024-01-01T00:00:10Z", null]]
            }],
            "messages": [{"level": "warning", "text": "deprecated"}]
        }]
    });

    let response: Response = serde_json::from_value(body).unwrap();
    assert_eq!(response.results.len(), 1);
    let series = &response.results[0].series[0];
    assert_eq!(series.name, "cpu");
    assert_eq!(series.tags.get("host").map(String::as_str), Some("a"));
    assert_eq!(series.values[0][1], Value::Float(1.5));
    assert!(series.values[1][1].is_null());
    assert_eq!(response.results[0].messages[0].level, "warning");
    assert!(response.error().is_none());
}

#[test]
fn test_value_variants_from_json() {
    let row: Vec<Value> =
        serde_json::from_value(json!([null, true, -3, 18446744073709551615u64, 2.25, "x", [1]]))
            .unwrap();

    assert_eq!(row[0], Value::Null);
    assert_eq!(row[1], Value::Bool(true));
    assert_eq!(row[2], Value::Integer(-3));
    assert_eq!(row[3], Value::Unsigned(u64::MAX));
    assert_eq!(row[4], Value::Float(2.25));
    assert_eq!(row[5], Value::Text("x".into()));
    assert!(matches!(row[6], Value::Other(_)));
}

#[test]
fn test_value_display() {
    assert_eq!(Value::Null.to_string(), "");
    assert_eq!(Value::Bool(false).to_string(), "false");
    assert_eq!(Value::Integer(42).to_string(), "42");
    assert_eq!(Value::Unsigned(7).to_string(), "7");
    assert_eq!(Value::Float(0.5).to_string(), "0.5");
    assert_eq!(Value::Float(0.0000001).to_string(), "0.0000001");
    assert_eq!(Value::Text("idle".into()).to_string(), "idle");
}

#[test]
fn test_response_error_prefers_request_level() {
    let response: Response = serde_json::from_value(json!({
        "results": [{"statement_id": 0, "error": "database not found: x"}],
        "error": "authorization failed"
    }))
    .unwrap();
    assert_eq!(response.error(), Some("authorization failed"));

    let response: Response = serde_json::from_value(json!({
        "results": [{"statement_id": 0}, {"statement_id": 1, "error": "bad"}]
    }))
    .unwrap();
    assert_eq!(response.error(), Some("bad"));
}

#[test]
fn test_response_append_chunks() {
    let mut merged = Response::default();
    let first: Response = serde_json::from_value(json!({
        "results": [{"statement_id": 0, "partial": true, "series": [{"name": "cpu", "columns": ["v"], "values": [[1]]}]}]
    }))
    .unwrap();
    let second: Response = serde_json::from_value(json!({
        "results": [{"statement_id": 0, "series": [{"name": "cpu", "columns": ["v"], "values": [[2]]}]}]
    }))
    .unwrap();

    assert!(merged.append(first));
    assert!(merged.append(second));
    assert_eq!(merged.results.len(), 2);
    assert!(merged.results[0].partial);

    let failed = Response {
        results: vec![],
        error: Some("max-row-limit".into()),
    };
    assert!(!merged.append(failed));
    assert_eq!(merged.error(), Some("max-row-limit"));
}

#[test]
fn test_response_serialization_omits_empty_fields() {
    let response = Response {
        results: vec![QueryResult {
            statement_id: 0,
            series: vec![Series {
                name: "cpu".into(),
                columns: vec!["time".into()],
                values: vec![vec![Value::Integer(1)]],
                ..Series::default()
            }],
            ..QueryResult::default()
        }],
        error: None,
    };

    let text = serde_json::to_string(&response).unwrap();
    assert_eq!(
        text,
        r#"{"results":[{"statement_id":0,"series":[{"name":"cpu","columns":["time"],"values":[[1]]}]}]}"#
    );
}

#[test]
fn test_same_header_ignores_rows() {
    let a = Series {
        name: "cpu".into(),
        columns: vec!["time".into(), "value".into()],
        values: vec![vec![Value::Integer(1)]],
        ..Series::default()
    };
    let mut b = a.clone();
    b.values.clear();
    assert!(a.same_header(&b));

    b.tags.insert("host".into(), "a".into());
    assert!(!a.same_header(&b));
}

// ==================== Requests ====================

#[test]
fn test_query_params() {
    let query = Query::new("SELECT 1")
        .with_database("db")
        .with_chunking(true, 0)
        .with_node_id(3);
    let params = query.params();
    assert!(params.contains(&("q", "SELECT 1".to_string())));
    assert!(params.contains(&("db", "db".to_string())));
    assert!(params.contains(&("chunked", "true".to_string())));
    assert!(params.contains(&("node_id", "3".to_string())));
    assert!(!params.iter().any(|(k, _)| *k == "rp" || *k == "chunk_size"));
}

#[test]
fn test_batch_points_body() {
    let bp = BatchPoints {
        points: vec![Point::raw("cpu value=1"), Point::raw("cpu value=2")],
        database: "db".into(),
        precision: "s".into(),
        ..BatchPoints::default()
    };
    assert_eq!(bp.body(), "cpu value=1\ncpu value=2\n");
    assert_eq!(bp.len(), 2);
    let params = bp.params();
    assert!(params.contains(&("precision", "s".to_string())));
    assert!(!params.iter().any(|(k, _)| *k == "consistency"));
}
