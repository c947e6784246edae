//! Data-provider adapter for a resource-collection REST convention.
//!
//! # Overview
//! Translates a generic CRUD data-request protocol (list, get-one, get-many,
//! get-many-by-reference, create, update, update-many, delete, delete-many)
//! into HTTP calls against a REST API speaking the `$sort` / `$limit` /
//! `$page` / `$term` query dialect, and reshapes the responses back into the
//! protocol's `{data, total}` form.
//!
//! # Design
//! - `RestClient` is the sans-io half: it builds `HttpRequest` values and
//!   parses `HttpResponse` values without touching the network.
//! - `DataProvider` owns a `RestClient` plus an injected [`Transport`] and
//!   performs the round-trips, including the per-id fan-out that emulates
//!   the bulk operations the target API lacks.
//! - Records are schemaless JSON objects. The wire identifier `_id` is
//!   renamed to `id` toward the caller, and server-managed fields are
//!   stripped from outgoing payloads.

pub mod client;
pub mod error;
pub mod http;
pub mod provider;
pub mod query;
pub mod types;

pub use client::RestClient;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use provider::DataProvider;
pub use types::{
    OperationKind, Pagination, ProviderResult, Record, RequestParams, Sort, SortOrder,
};
