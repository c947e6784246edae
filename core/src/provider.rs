//! The adapter: dispatches protocol operations through an injected transport.
//!
//! # Design
//! `DataProvider` pairs the sans-io [`RestClient`] with a [`Transport`]
//! passed in explicitly at construction; there is no process-wide default
//! transport. The two bulk operations are special-cased before any request
//! translation: the target API's collection routes accept no filters on
//! UPDATE or DELETE, so they are emulated by one request per id.

use futures_util::future::try_join_all;
use serde_json::Value;

use crate::client::{self, RestClient};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, Transport};
use crate::types::{OperationKind, ProviderResult, RequestParams};

/// Data-provider adapter bound to one API base URL and one transport.
#[derive(Clone)]
pub struct DataProvider<T> {
    client: RestClient,
    transport: T,
}

impl<T: Transport> DataProvider<T> {
    pub fn new(base_url: &str, transport: T) -> Self {
        Self {
            client: RestClient::new(base_url),
            transport,
        }
    }

    /// Single entry point of the caller protocol: run one operation against
    /// one resource and return its `{data, total}` result.
    pub async fn dispatch(
        &self,
        kind: OperationKind,
        resource: &str,
        params: RequestParams,
    ) -> Result<ProviderResult, ApiError> {
        match kind {
            OperationKind::UpdateMany => self.fan_out_update(resource, &params).await,
            OperationKind::DeleteMany => self.fan_out_delete(resource, &params).await,
            _ => {
                let request = self.client.build_request(kind, resource, &params)?;
                tracing::debug!(
                    operation = %kind,
                    resource,
                    method = request.method.as_str(),
                    url = %request.url,
                    "dispatching request"
                );
                let response = self.transport.fetch(request).await?;
                self.client.parse_response(response, kind, &params)
            }
        }
    }

    pub async fn get_list(
        &self,
        resource: &str,
        params: RequestParams,
    ) -> Result<ProviderResult, ApiError> {
        self.dispatch(OperationKind::List, resource, params).await
    }

    pub async fn get_one(
        &self,
        resource: &str,
        params: RequestParams,
    ) -> Result<ProviderResult, ApiError> {
        self.dispatch(OperationKind::GetOne, resource, params).await
    }

    pub async fn get_many(
        &self,
        resource: &str,
        params: RequestParams,
    ) -> Result<ProviderResult, ApiError> {
        self.dispatch(OperationKind::GetMany, resource, params).await
    }

    pub async fn get_many_reference(
        &self,
        resource: &str,
        params: RequestParams,
    ) -> Result<ProviderResult, ApiError> {
        self.dispatch(OperationKind::GetManyReference, resource, params)
            .await
    }

    pub async fn create(
        &self,
        resource: &str,
        params: RequestParams,
    ) -> Result<ProviderResult, ApiError> {
        self.dispatch(OperationKind::Create, resource, params).await
    }

    pub async fn update(
        &self,
        resource: &str,
        params: RequestParams,
    ) -> Result<ProviderResult, ApiError> {
        self.dispatch(OperationKind::Update, resource, params).await
    }

    pub async fn update_many(
        &self,
        resource: &str,
        params: RequestParams,
    ) -> Result<ProviderResult, ApiError> {
        self.dispatch(OperationKind::UpdateMany, resource, params)
            .await
    }

    pub async fn delete(
        &self,
        resource: &str,
        params: RequestParams,
    ) -> Result<ProviderResult, ApiError> {
        self.dispatch(OperationKind::Delete, resource, params).await
    }

    pub async fn delete_many(
        &self,
        resource: &str,
        params: RequestParams,
    ) -> Result<ProviderResult, ApiError> {
        self.dispatch(OperationKind::DeleteMany, resource, params)
            .await
    }

    /// One PATCH per id, carrying the submitted data as-is. Unlike single
    /// update (PUT with server-managed fields stripped), bulk update sends
    /// the payload unmodified.
    async fn fan_out_update(
        &self,
        resource: &str,
        params: &RequestParams,
    ) -> Result<ProviderResult, ApiError> {
        let body = client::serialize_body(&params.data)?;
        let requests = params.ids.iter().map(|id| {
            HttpRequest::json(
                HttpMethod::Patch,
                self.client.record_url(resource, id),
                body.clone(),
            )
        });
        self.fan_out(requests).await
    }

    /// One DELETE per id.
    async fn fan_out_delete(
        &self,
        resource: &str,
        params: &RequestParams,
    ) -> Result<ProviderResult, ApiError> {
        let requests = params
            .ids
            .iter()
            .map(|id| HttpRequest::delete(self.client.record_url(resource, id)));
        self.fan_out(requests).await
    }

    /// Issue every request concurrently and await them jointly.
    ///
    /// Raw response bodies are collected in submission order. The first
    /// failure fails the whole aggregate; requests the server has already
    /// accepted are not rolled back, so a failed bulk call can leave a
    /// partial mutation behind.
    async fn fan_out(
        &self,
        requests: impl Iterator<Item = HttpRequest>,
    ) -> Result<ProviderResult, ApiError> {
        let calls: Vec<_> = requests
            .map(|request| self.transport.fetch(request))
            .collect();
        tracing::debug!(count = calls.len(), "fanning out bulk operation");
        let responses = try_join_all(calls).await?;
        let data = responses.into_iter().map(|response| response.json).collect();
        Ok(ProviderResult {
            data: Value::Array(data),
            total: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use serde_json::json;

    use super::*;
    use crate::http::HttpResponse;
    use crate::types::{Pagination, Record, Sort, SortOrder};

    /// Scripted transport: pops pre-seeded results, records every request.
    #[derive(Clone)]
    struct StubTransport {
        responses: Arc<Mutex<VecDeque<Result<HttpResponse, ApiError>>>>,
        seen: Arc<Mutex<Vec<HttpRequest>>>,
    }

    impl StubTransport {
        fn new(responses: Vec<Result<HttpResponse, ApiError>>) -> Self {
            Self {
                responses: Arc::new(Mutex::new(responses.into_iter().collect())),
                seen: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Transport for StubTransport {
        async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.seen.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("transport called more times than scripted")
        }
    }

    fn ok(json: serde_json::Value) -> Result<HttpResponse, ApiError> {
        Ok(HttpResponse { json })
    }

    fn object(value: serde_json::Value) -> Record {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[tokio::test]
    async fn list_round_trip_reshapes_the_response() {
        let transport = StubTransport::new(vec![ok(json!({
            "docs": [{"_id": "1", "title": "A"}],
            "items": {"total": 1}
        }))]);
        let provider = DataProvider::new("http://localhost:3000", transport.clone());

        let params = RequestParams {
            pagination: Some(Pagination {
                page: 1,
                per_page: 24,
            }),
            sort: Some(Sort {
                field: "title".to_string(),
                order: SortOrder::Desc,
            }),
            ..Default::default()
        };
        let result = provider.get_list("posts", params).await.unwrap();

        assert_eq!(result.data, json!([{"id": "1", "title": "A"}]));
        assert_eq!(result.total, Some(1));
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].url,
            "http://localhost:3000/posts?%24sort=-title&%24limit=24&%24page=1"
        );
    }

    #[tokio::test]
    async fn transport_errors_propagate_unchanged() {
        let transport = StubTransport::new(vec![Err(ApiError::HttpError {
            status: 500,
            body: "boom".to_string(),
        })]);
        let provider = DataProvider::new("http://localhost:3000", transport.clone());

        let params = RequestParams {
            id: Some("1".to_string()),
            ..Default::default()
        };
        let err = provider.get_one("posts", params).await.unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 500, .. }));
    }

    #[tokio::test]
    async fn missing_id_never_reaches_the_transport() {
        let transport = StubTransport::new(Vec::new());
        let provider = DataProvider::new("http://localhost:3000", transport.clone());

        let err = provider
            .get_one("posts", RequestParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::MissingParameter("id")));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn update_many_patches_each_id_with_the_raw_payload() {
        let transport = StubTransport::new(vec![
            ok(json!({"_id": "1", "flag": true})),
            ok(json!({"_id": "2", "flag": true})),
        ]);
        let provider = DataProvider::new("http://localhost:3000", transport.clone());

        let params = RequestParams {
            ids: vec!["1".to_string(), "2".to_string()],
            data: object(json!({"id": "1", "flag": true, "updatedAt": "t"})),
            ..Default::default()
        };
        let result = provider.update_many("posts", params).await.unwrap();

        // Raw bodies in submission order, no identifier translation.
        assert_eq!(
            result.data,
            json!([{"_id": "1", "flag": true}, {"_id": "2", "flag": true}])
        );
        assert_eq!(result.total, None);

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, HttpMethod::Patch);
        assert_eq!(requests[0].url, "http://localhost:3000/posts/1");
        assert_eq!(requests[1].url, "http://localhost:3000/posts/2");
        // The payload goes out unmodified, server-managed fields included.
        let body: serde_json::Value =
            serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"id": "1", "flag": true, "updatedAt": "t"}));
    }

    #[tokio::test]
    async fn delete_many_issues_one_delete_per_id() {
        let transport = StubTransport::new(vec![
            ok(json!({"_id": "1"})),
            ok(json!({"_id": "2"})),
        ]);
        let provider = DataProvider::new("http://localhost:3000", transport.clone());

        let params = RequestParams {
            ids: vec!["1".to_string(), "2".to_string()],
            ..Default::default()
        };
        let result = provider.delete_many("posts", params).await.unwrap();

        assert_eq!(result.data, json!([{"_id": "1"}, {"_id": "2"}]));
        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests
            .iter()
            .all(|request| request.method == HttpMethod::Delete));
    }

    #[tokio::test]
    async fn fan_out_fails_fast_after_issuing_every_request() {
        let transport = StubTransport::new(vec![
            ok(json!({"_id": "1"})),
            Err(ApiError::NotFound),
        ]);
        let provider = DataProvider::new("http://localhost:3000", transport.clone());

        let params = RequestParams {
            ids: vec!["1".to_string(), "missing".to_string()],
            ..Default::default()
        };
        let err = provider.delete_many("posts", params).await.unwrap_err();

        assert!(matches!(err, ApiError::NotFound));
        // The sibling request was already issued before the failure.
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn create_result_echoes_the_request_identity() {
        let transport = StubTransport::new(vec![ok(json!({"ok": true}))]);
        let provider = DataProvider::new("http://localhost:3000", transport.clone());

        let params = RequestParams {
            data: object(json!({"_id": "9", "title": "New"})),
            ..Default::default()
        };
        let result = provider.create("posts", params).await.unwrap();

        assert_eq!(result.data, json!({"id": "9", "title": "New"}));
        let requests = transport.requests();
        assert_eq!(requests[0].method, HttpMethod::Post);
        // `_id` survives cleaning; only server-managed fields are stripped.
        let body: serde_json::Value =
            serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"_id": "9", "title": "New"}));
    }
}
