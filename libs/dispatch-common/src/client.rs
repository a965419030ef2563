// HTTP client for the dispatcher, used by the CLI and the worker.

use reqwest::StatusCode;
use tracing::debug;

use crate::config::{slash_join, ClientConfig};
use crate::error::ClientError;
use crate::types::{NextTestResponse, PushListRequest, PushListResponse};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Created { queued: usize },
    Conflict,
}

#[derive(Debug, Clone)]
pub struct DispatcherClient {
    http: reqwest::Client,
    base_url: String,
}

impl DispatcherClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let base_url = config.dispatcher_url.clone();
        reqwest::Url::parse(&base_url).map_err(|e| ClientError::InvalidUrl {
            url: base_url.clone(),
            reason: e.to_string(),
        })?;

        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        slash_join(&[&self.base_url, path])
    }

    /// Submit the ordered test list for one build and suite.
    pub async fn push_list(&self, request: &PushListRequest) -> Result<PushOutcome, ClientError> {
        let url = self.endpoint("push_list");
        debug!(url = %url, tests = request.tests.len(), "Submitting test list");

        let response = self.http.post(&url).json(request).send().await?;
        let status = response.status();
        match status {
            StatusCode::CREATED | StatusCode::OK => {
                let body: PushListResponse = response.json().await?;
                Ok(PushOutcome::Created { queued: body.queued })
            }
            StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => Ok(PushOutcome::Conflict),
            _ => Err(ClientError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }

    /// Next test to run, or `None` when the queue is gone.
    pub async fn next_test(&self, build_id: &str, test_suite: &str) -> Result<Option<String>, ClientError> {
        let url = self.endpoint("next_test");
        let response = self
            .http
            .get(&url)
            .query(&[("build_id", build_id), ("test_suite", test_suite)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: NextTestResponse = response.json().await?;
        Ok(Some(body.details).filter(|name| !name.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NextTestQuery;
    use axum::extract::Query;
    use axum::response::{IntoResponse, Response};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use std::time::Duration;

    async fn push_reply(Json(request): Json<PushListRequest>) -> Response {
        match request.build_id.as_str() {
            "conflict" => (StatusCode::CONFLICT, Json(serde_json::json!({"error": "exists"}))).into_response(),
            "precondition" => StatusCode::PRECONDITION_FAILED.into_response(),
            "broken" => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
            _ => (
                StatusCode::CREATED,
                Json(PushListResponse {
                    status: "OK".to_string(),
                    queued: request.tests.len(),
                }),
            )
                .into_response(),
        }
    }

    async fn next_reply(Query(query): Query<NextTestQuery>) -> Response {
        match (query.build_id.as_deref(), query.test_suite.as_deref()) {
            (Some("b1"), Some("s1")) => Json(NextTestResponse { details: "t1".to_string() }).into_response(),
            (Some("bad"), _) => (StatusCode::BAD_REQUEST, "missing parameter").into_response(),
            _ => Json(NextTestResponse { details: String::new() }).into_response(),
        }
    }

    /// Serve canned dispatcher replies on an ephemeral port.
    async fn scripted_dispatcher() -> DispatcherClient {
        let app = Router::new()
            .route("/push_list", post(push_reply))
            .route("/next_test", get(next_reply));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        DispatcherClient::new(&ClientConfig {
            dispatcher_url: format!("http://{addr}/"),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn request(build_id: &str) -> PushListRequest {
        PushListRequest {
            build_id: build_id.to_string(),
            test_suite: "s1".to_string(),
            tests: vec!["t1".to_string(), "t2".to_string()],
        }
    }

    #[tokio::test]
    async fn test_push_list_created() {
        let client = scripted_dispatcher().await;
        assert_eq!(
            client.push_list(&request("b1")).await.unwrap(),
            PushOutcome::Created { queued: 2 }
        );
    }

    #[tokio::test]
    async fn test_push_list_conflict_statuses() {
        let client = scripted_dispatcher().await;
        assert_eq!(client.push_list(&request("conflict")).await.unwrap(), PushOutcome::Conflict);
        assert_eq!(client.push_list(&request("precondition")).await.unwrap(), PushOutcome::Conflict);
    }

    #[tokio::test]
    async fn test_push_list_server_error_is_status_error() {
        let client = scripted_dispatcher().await;
        match client.push_list(&request("broken")).await {
            Err(err @ ClientError::Status { .. }) => {
                assert!(err.is_transient());
                assert!(matches!(err, ClientError::Status { status: 500, ref body } if body == "boom"));
            }
            other => panic!("expected a status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_next_test_returns_name() {
        let client = scripted_dispatcher().await;
        assert_eq!(client.next_test("b1", "s1").await.unwrap(), Some("t1".to_string()));
    }

    #[tokio::test]
    async fn test_next_test_empty_details_is_none() {
        let client = scripted_dispatcher().await;
        assert_eq!(client.next_test("b1", "other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_next_test_bad_request_is_not_transient() {
        let client = scripted_dispatcher().await;
        let err = client.next_test("bad", "s1").await.unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 400, .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let config = ClientConfig {
            dispatcher_url: "not a url".to_string(),
            timeout: Duration::from_secs(1),
        };
        assert!(matches!(
            DispatcherClient::new(&config),
            Err(ClientError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let client = DispatcherClient::new(&ClientConfig::default()).unwrap();
        assert_eq!(client.endpoint("next_test"), "http://127.0.0.1:5000/next_test");
    }

    #[tokio::test]
    async fn test_connection_refused_is_transient_transport_error() {
        let config = ClientConfig {
            dispatcher_url: "http://127.0.0.1:9/".to_string(),
            timeout: Duration::from_secs(2),
        };
        let client = DispatcherClient::new(&config).unwrap();
        let err = client.next_test("b1", "s1").await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert!(err.is_transient());
    }
}
