//! Protocol-side types for the generic data-request contract.
//!
//! # Design
//! `RequestParams` is a single parameter bag covering every operation; the
//! fields an operation does not use stay at their defaults. All types are
//! owned and `Clone` so parameters can be captured by fan-out futures
//! without lifetime concerns.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A schemaless record: a JSON object keyed by field name.
pub type Record = serde_json::Map<String, Value>;

/// Selector for the operation a request performs.
///
/// Closed enumeration so every translation switch is checked exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    List,
    GetOne,
    GetMany,
    GetManyReference,
    Create,
    Update,
    UpdateMany,
    Delete,
    DeleteMany,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::List => "list",
            OperationKind::GetOne => "get-one",
            OperationKind::GetMany => "get-many",
            OperationKind::GetManyReference => "get-many-by-reference",
            OperationKind::Create => "create",
            OperationKind::Update => "update",
            OperationKind::UpdateMany => "update-many",
            OperationKind::Delete => "delete",
            OperationKind::DeleteMany => "delete-many",
        };
        f.write_str(name)
    }
}

/// Sort direction for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Which field to sort by, and in which direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

/// One-based page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
}

/// Parameter bag for a single data request.
///
/// Which fields matter depends on the [`OperationKind`]: list uses
/// `pagination` / `sort` / `filter`, get-one and delete use `id`, the bulk
/// operations use `ids`, get-many-by-reference uses `id` + `target`, and
/// create / update carry the record in `data`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestParams {
    pub pagination: Option<Pagination>,
    pub sort: Option<Sort>,
    pub filter: Record,
    pub id: Option<String>,
    pub ids: Vec<String>,
    pub target: Option<String>,
    pub data: Record,
}

/// What a data request resolves to.
///
/// `data` is a single record object or an array of records depending on the
/// operation; `total` is present for list-like operations only.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResult {
    pub data: Value,
    pub total: Option<u64>,
}
