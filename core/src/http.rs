//! HTTP data types and the injected transport seam.
//!
//! # Design
//! Requests and responses are plain data; the adapter never performs I/O
//! itself. A [`Transport`] implementation executes each `HttpRequest` and
//! hands back the parsed JSON body as an `HttpResponse`, mapping non-success
//! statuses and network failures to [`ApiError`]. All fields use owned types
//! so requests can be captured by concurrently running futures.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ApiError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built by [`RestClient::build_request`](crate::RestClient::build_request)
/// or by the bulk fan-out, then executed by a [`Transport`].
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// GET with no body.
    pub fn get(url: String) -> Self {
        Self {
            method: HttpMethod::Get,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    /// DELETE with no body.
    pub fn delete(url: String) -> Self {
        Self {
            method: HttpMethod::Delete,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Bodied request carrying a JSON payload.
    pub fn json(method: HttpMethod, url: String, body: String) -> Self {
        Self {
            method,
            url,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        }
    }
}

/// A successful response, reduced to its parsed JSON body.
///
/// Transports resolve only for success statuses, so a response always
/// carries usable JSON.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub json: Value,
}

/// The injected HTTP executor.
///
/// Timeouts, retries and authentication live behind this seam; the adapter
/// issues requests and propagates whatever error the transport returns.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}
