//! In-memory REST server speaking the resource-collection convention the
//! adapter targets: list bodies are `{docs, items: {total}}`, records carry
//! `_id`, and list queries use `$sort`, `$limit`, `$page` and `$term`.
//!
//! Exists for integration tests; also runnable standalone via the binary.

use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub type Record = Map<String, Value>;
pub type Db = Arc<RwLock<HashMap<String, Vec<Record>>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/{resource}", get(list_records).post(create_record))
        .route(
            "/{resource}/{id}",
            get(get_record)
                .put(replace_record)
                .patch(merge_record)
                .delete(delete_record),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Query dialect: `$sort` (leading `-` descends), `$limit` / `$page`
/// paginate, `$term` matches any string field, repeated `_id` selects
/// specific records, and anything else is an exact match against the
/// (dotted-path) field.
async fn list_records(
    State(db): State<Db>,
    Path(resource): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
) -> Json<Value> {
    let mut sort = None;
    let mut limit = None;
    let mut page: usize = 1;
    let mut term = None;
    let mut ids = Vec::new();
    let mut filters = Vec::new();
    for (key, value) in query {
        match key.as_str() {
            "$sort" => sort = Some(value),
            "$limit" => limit = value.parse::<usize>().ok(),
            "$page" => page = value.parse().unwrap_or(1),
            "$term" => term = Some(value),
            "_id" => ids.push(value),
            _ => filters.push((key, value)),
        }
    }

    let db = db.read().await;
    let records = db.get(&resource).cloned().unwrap_or_default();
    let mut docs: Vec<Record> = records
        .into_iter()
        .filter(|record| matches(record, &ids, term.as_deref(), &filters))
        .collect();

    if let Some(spec) = sort {
        let (field, descending) = match spec.strip_prefix('-') {
            Some(field) => (field.to_string(), true),
            None => (spec, false),
        };
        docs.sort_by(|a, b| {
            let ordering = compare_fields(lookup(a, &field), lookup(b, &field));
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
    }

    let total = docs.len();
    if let Some(limit) = limit {
        let start = page.saturating_sub(1) * limit;
        docs = docs.into_iter().skip(start).take(limit).collect();
    }

    Json(json!({ "docs": docs, "items": { "total": total } }))
}

async fn create_record(
    State(db): State<Db>,
    Path(resource): Path<String>,
    Json(input): Json<Record>,
) -> (StatusCode, Json<Record>) {
    let mut record = input;
    record
        .entry("_id".to_string())
        .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
    let now = Value::String(Utc::now().to_rfc3339());
    record.insert("createdAt".to_string(), now.clone());
    record.insert("updatedAt".to_string(), now);
    db.write().await.entry(resource).or_default().push(record.clone());
    (StatusCode::CREATED, Json(record))
}

async fn get_record(
    State(db): State<Db>,
    Path((resource, id)): Path<(String, String)>,
) -> Result<Json<Record>, StatusCode> {
    let db = db.read().await;
    db.get(&resource)
        .and_then(|records| records.iter().find(|record| has_id(record, &id)))
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// Full replace: the stored record becomes the submitted payload with the
/// original `_id` and `createdAt` carried over and `updatedAt` stamped.
async fn replace_record(
    State(db): State<Db>,
    Path((resource, id)): Path<(String, String)>,
    Json(input): Json<Record>,
) -> Result<Json<Record>, StatusCode> {
    let mut db = db.write().await;
    let records = db.get_mut(&resource).ok_or(StatusCode::NOT_FOUND)?;
    let record = records
        .iter_mut()
        .find(|record| has_id(record, &id))
        .ok_or(StatusCode::NOT_FOUND)?;

    let mut replacement = input;
    replacement.insert("_id".to_string(), record["_id"].clone());
    if let Some(created) = record.get("createdAt") {
        replacement.insert("createdAt".to_string(), created.clone());
    }
    replacement.insert("updatedAt".to_string(), Value::String(Utc::now().to_rfc3339()));
    *record = replacement;
    Ok(Json(record.clone()))
}

/// Partial update: submitted fields overwrite, everything else is kept.
async fn merge_record(
    State(db): State<Db>,
    Path((resource, id)): Path<(String, String)>,
    Json(input): Json<Record>,
) -> Result<Json<Record>, StatusCode> {
    let mut db = db.write().await;
    let records = db.get_mut(&resource).ok_or(StatusCode::NOT_FOUND)?;
    let record = records
        .iter_mut()
        .find(|record| has_id(record, &id))
        .ok_or(StatusCode::NOT_FOUND)?;

    for (key, value) in input {
        if key != "_id" {
            record.insert(key, value);
        }
    }
    record.insert("updatedAt".to_string(), Value::String(Utc::now().to_rfc3339()));
    Ok(Json(record.clone()))
}

/// Removes the record and returns it, `_id` included.
async fn delete_record(
    State(db): State<Db>,
    Path((resource, id)): Path<(String, String)>,
) -> Result<Json<Record>, StatusCode> {
    let mut db = db.write().await;
    let records = db.get_mut(&resource).ok_or(StatusCode::NOT_FOUND)?;
    let index = records
        .iter()
        .position(|record| has_id(record, &id))
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(records.remove(index)))
}

fn has_id(record: &Record, id: &str) -> bool {
    record.get("_id").and_then(Value::as_str) == Some(id)
}

fn matches(record: &Record, ids: &[String], term: Option<&str>, filters: &[(String, String)]) -> bool {
    if !ids.is_empty() {
        let id = record.get("_id").and_then(Value::as_str).unwrap_or_default();
        if !ids.iter().any(|candidate| candidate == id) {
            return false;
        }
    }
    if let Some(term) = term {
        let hit = record
            .values()
            .any(|value| matches!(value, Value::String(s) if s.contains(term)));
        if !hit {
            return false;
        }
    }
    filters.iter().all(|(field, expected)| {
        lookup(record, field).is_some_and(|value| render(value) == *expected)
    })
}

/// Resolve a dotted path (`author.name`) inside a record.
fn lookup<'a>(record: &'a Record, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = record.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Query-string rendering of a field value, for equality filters.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            _ => render(a).cmp(&render(b)),
        },
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn lookup_resolves_dotted_paths() {
        let rec = record(json!({"author": {"name": "ada"}}));
        assert_eq!(lookup(&rec, "author.name"), Some(&json!("ada")));
        assert_eq!(lookup(&rec, "author.missing"), None);
        assert_eq!(lookup(&rec, "missing.name"), None);
    }

    #[test]
    fn matches_respects_id_selection() {
        let rec = record(json!({"_id": "a", "title": "x"}));
        assert!(matches(&rec, &["a".to_string()], None, &[]));
        assert!(!matches(&rec, &["b".to_string()], None, &[]));
    }

    #[test]
    fn matches_term_against_any_string_field() {
        let rec = record(json!({"_id": "a", "title": "rust rest", "count": 3}));
        assert!(matches(&rec, &[], Some("rest"), &[]));
        assert!(!matches(&rec, &[], Some("3"), &[]));
    }

    #[test]
    fn matches_filters_with_rendered_values() {
        let rec = record(json!({"_id": "a", "rank": 3, "author": {"name": "ada"}}));
        assert!(matches(
            &rec,
            &[],
            None,
            &[("rank".to_string(), "3".to_string())]
        ));
        assert!(matches(
            &rec,
            &[],
            None,
            &[("author.name".to_string(), "ada".to_string())]
        ));
        assert!(!matches(
            &rec,
            &[],
            None,
            &[("author.name".to_string(), "bob".to_string())]
        ));
    }

    #[test]
    fn compare_fields_orders_numbers_numerically() {
        let two = json!(2);
        let ten = json!(10);
        assert_eq!(compare_fields(Some(&two), Some(&ten)), Ordering::Less);
        assert_eq!(compare_fields(Some(&ten), Some(&two)), Ordering::Greater);
        assert_eq!(compare_fields(None, Some(&two)), Ordering::Less);
    }
}
