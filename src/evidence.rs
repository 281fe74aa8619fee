use itertools::Itertools;
use serde_json::Value;

/// Strings verbatim, everything else as compact JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Reduces an edge's provenance payload to one readable string. The first
/// applicable rule wins: `source`, sorted `sources`, a `pmids` count, then the
/// whole payload as compact JSON.
pub fn extract_evidence(payload: Option<&Value>) -> String {
    let payload = match payload {
        Some(p) if !is_blank(p) => p,
        _ => return String::new(),
    };
    let fields = match payload {
        Value::Object(fields) => fields,
        other => return render_value(other),
    };

    if let Some(Value::String(source)) = fields.get("source") {
        return source.clone();
    }
    if let Some(sources) = fields.get("sources") {
        return match sources {
            Value::Array(values) => values.iter().map(render_value).sorted().join(";"),
            other => render_value(other),
        };
    }
    if let Some(pmids) = fields.get("pmids") {
        return match pmids {
            Value::Array(values) => format!("pmids:{}", values.len()),
            Value::Object(values) => format!("pmids:{}", values.len()),
            Value::String(value) => format!("pmids:{}", value.chars().count()),
            _ => "pmids".to_string(),
        };
    }
    payload.to_string()
}
