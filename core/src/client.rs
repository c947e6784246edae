//! Stateless request builder and response parser for the resource-collection
//! REST convention.
//!
//! # Design
//! `RestClient` holds only a `base_url` and carries no mutable state between
//! calls. `build_request` produces an `HttpRequest` and `parse_response`
//! consumes an `HttpResponse`; the owning [`DataProvider`](crate::DataProvider)
//! executes the HTTP round-trip in between, keeping this module deterministic
//! and free of I/O.

use serde_json::Value;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::query::{build_query, encode_query};
use crate::types::{OperationKind, ProviderResult, Record, RequestParams};

/// Fields the server manages itself; stripped from every outgoing payload.
const SERVER_MANAGED_FIELDS: [&str; 5] =
    ["id", "createdAt", "updatedAt", "deletedAt", "isDeleted"];

/// Sans-io translator between the data-request protocol and the REST API.
#[derive(Debug, Clone)]
pub struct RestClient {
    base_url: String,
}

impl RestClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The collection route, `{base}/{resource}`.
    pub(crate) fn collection_url(&self, resource: &str) -> String {
        format!("{}/{resource}", self.base_url)
    }

    /// The single-record route, `{base}/{resource}/{id}`.
    pub(crate) fn record_url(&self, resource: &str, id: &str) -> String {
        format!("{}/{resource}/{id}", self.base_url)
    }

    /// Translate an operation into the HTTP request that performs it.
    ///
    /// Pure function: no I/O happens here. The bulk operations have no
    /// single-request translation and fail with `UnsupportedOperation`
    /// before anything reaches the network.
    pub fn build_request(
        &self,
        kind: OperationKind,
        resource: &str,
        params: &RequestParams,
    ) -> Result<HttpRequest, ApiError> {
        match kind {
            OperationKind::List => {
                let query = encode_query(&build_query(params));
                Ok(HttpRequest::get(format!(
                    "{}?{query}",
                    self.collection_url(resource)
                )))
            }
            OperationKind::GetOne => {
                let id = require(params.id.as_deref(), "id")?;
                Ok(HttpRequest::get(self.record_url(resource, id)))
            }
            OperationKind::GetManyReference => {
                let id = require(params.id.as_deref(), "id")?;
                let target = require(params.target.as_deref(), "target")?;
                let mut params = params.clone();
                params
                    .filter
                    .insert(target.to_string(), Value::String(id.to_string()));
                let query = encode_query(&build_query(&params));
                Ok(HttpRequest::get(format!(
                    "{}?{query}",
                    self.collection_url(resource)
                )))
            }
            OperationKind::GetMany => {
                let pairs: Vec<(String, String)> = params
                    .ids
                    .iter()
                    .map(|id| ("_id".to_string(), id.clone()))
                    .collect();
                let query = encode_query(&pairs);
                Ok(HttpRequest::get(format!(
                    "{}?{query}",
                    self.collection_url(resource)
                )))
            }
            OperationKind::Create => {
                let body = serialize_body(&clean_data(&params.data))?;
                Ok(HttpRequest::json(
                    HttpMethod::Post,
                    self.collection_url(resource),
                    body,
                ))
            }
            OperationKind::Update => {
                let id = require(params.id.as_deref(), "id")?;
                let body = serialize_body(&clean_data(&params.data))?;
                Ok(HttpRequest::json(
                    HttpMethod::Put,
                    self.record_url(resource, id),
                    body,
                ))
            }
            OperationKind::Delete => {
                let id = require(params.id.as_deref(), "id")?;
                Ok(HttpRequest::delete(self.record_url(resource, id)))
            }
            OperationKind::UpdateMany | OperationKind::DeleteMany => {
                Err(ApiError::UnsupportedOperation(kind))
            }
        }
    }

    /// Reshape a response into the protocol's `{data, total}` form.
    pub fn parse_response(
        &self,
        response: HttpResponse,
        kind: OperationKind,
        params: &RequestParams,
    ) -> Result<ProviderResult, ApiError> {
        match kind {
            OperationKind::List | OperationKind::GetMany | OperationKind::GetManyReference => {
                let docs = response
                    .json
                    .get("docs")
                    .and_then(Value::as_array)
                    .ok_or_else(|| {
                        ApiError::DeserializationError(
                            "list body missing `docs` array".to_string(),
                        )
                    })?;
                let data = docs
                    .iter()
                    .map(promote_identifier)
                    .collect::<Result<Vec<_>, _>>()?;
                let total = response
                    .json
                    .pointer("/items/total")
                    .and_then(Value::as_u64)
                    .ok_or_else(|| {
                        ApiError::DeserializationError(
                            "list body missing `items.total`".to_string(),
                        )
                    })?;
                Ok(ProviderResult {
                    data: Value::Array(data),
                    total: Some(total),
                })
            }
            OperationKind::Create => Ok(ProviderResult {
                data: Value::Object(request_echo_identity(&params.data)),
                total: None,
            }),
            OperationKind::GetOne | OperationKind::Update | OperationKind::Delete => {
                Ok(ProviderResult {
                    data: promote_identifier(&response.json)?,
                    total: None,
                })
            }
            OperationKind::UpdateMany | OperationKind::DeleteMany => {
                Err(ApiError::UnsupportedOperation(kind))
            }
        }
    }
}

fn require<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, ApiError> {
    value.ok_or(ApiError::MissingParameter(name))
}

/// Move a record's wire identifier `_id` to the caller-facing key `id`.
fn promote_identifier(record: &Value) -> Result<Value, ApiError> {
    let object = record.as_object().ok_or_else(|| {
        ApiError::DeserializationError("expected a record object".to_string())
    })?;
    let mut record = object.clone();
    let id = record.remove("_id").ok_or_else(|| {
        ApiError::DeserializationError("record missing `_id`".to_string())
    })?;
    record.insert("id".to_string(), id);
    Ok(Value::Object(record))
}

/// Build the create result from the caller's own payload.
///
/// The create route of this convention does not echo the record under `id`;
/// callers supply the assigned `_id` inside the submitted data, and the
/// result is that data with `_id` moved to `id`. Kept as its own function so
/// the source of the identifier can change without touching the rest of the
/// translator.
fn request_echo_identity(data: &Record) -> Record {
    let mut record = data.clone();
    if let Some(id) = record.remove("_id") {
        record.insert("id".to_string(), id);
    }
    record
}

/// Strip server-managed fields from an outgoing payload.
pub(crate) fn clean_data(data: &Record) -> Record {
    data.iter()
        .filter(|(key, _)| !SERVER_MANAGED_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

pub(crate) fn serialize_body(data: &Record) -> Result<String, ApiError> {
    serde_json::to_string(data).map_err(|e| ApiError::SerializationError(e.to_string()))
}
