//! Query Builder: converts list parameters into the target API's
//! query-string dialect.
//!
//! The target API understands `$sort` (field name, leading `-` for
//! descending), `$limit` / `$page` for pagination and `$term` for free-text
//! search. Every other key is an exact-match filter; nested filter objects
//! are addressed by dotted paths (`author.name=x`) and array values become
//! repeated keys.

use serde_json::Value;

use crate::types::{RequestParams, SortOrder};

/// Build the flat key/value pairs for a list-like request.
pub fn build_query(params: &RequestParams) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    if let Some(sort) = &params.sort {
        if !sort.field.is_empty() {
            // The caller-facing `id` sorts by the wire identifier.
            let field = if sort.field == "id" {
                "_id"
            } else {
                sort.field.as_str()
            };
            let value = match sort.order {
                SortOrder::Asc => field.to_string(),
                SortOrder::Desc => format!("-{field}"),
            };
            pairs.push(("$sort".to_string(), value));
        }
    }

    for (key, value) in &params.filter {
        let key = if key == "q" { "$term" } else { key.as_str() };
        flatten_into(&mut pairs, key, value);
    }

    if let Some(pagination) = &params.pagination {
        pairs.push(("$limit".to_string(), pagination.per_page.to_string()));
        pairs.push(("$page".to_string(), pagination.page.to_string()));
    }

    pairs
}

/// Percent-encode pairs into a query string, arrays as repeated keys.
pub fn encode_query(pairs: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter().map(|(key, value)| (key.as_str(), value.as_str())))
        .finish()
}

fn flatten_into(pairs: &mut Vec<(String, String)>, key: &str, value: &Value) {
    match value {
        Value::Object(map) => {
            for (nested_key, nested_value) in map {
                flatten_into(pairs, &format!("{key}.{nested_key}"), nested_value);
            }
        }
        Value::Array(items) => {
            for item in items {
                flatten_into(pairs, key, item);
            }
        }
        Value::Null => {}
        Value::String(text) => pairs.push((key.to_string(), text.clone())),
        other => pairs.push((key.to_string(), other.to_string())),
    }
}
