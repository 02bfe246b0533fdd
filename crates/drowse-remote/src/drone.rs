//! Drone CI queue client.

use std::time::Duration;

use anyhow::Context;
use tracing::{debug, error, trace};

use drowse_core::{BoxFuture, DroneConfig, QueueItem, QueueSource};

/// Fetches the build queue from a Drone server.
pub struct DroneQueueClient {
    client: reqwest::Client,
    queue_url: String,
    token: String,
}

impl DroneQueueClient {
    pub fn new(config: &DroneConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("drowse/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            queue_url: format!("{}/api/queue", config.server.trim_end_matches('/')),
            token: config.token.clone(),
        })
    }

    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }

    /// Fetch the current queue.
    pub async fn get_queue(&self) -> anyhow::Result<Vec<QueueItem>> {
        debug!(phase = "start", url = %self.queue_url, "fetching drone queue");

        let response = self
            .client
            .get(&self.queue_url)
            .bearer_auth(&self.token)
            .send()
            .await
            .with_context(|| format!("request to {} failed", self.queue_url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, %body, "failed to fetch drone queue");
            anyhow::bail!("failed to fetch drone queue: {} - {}", status, body);
        }

        let queue: Vec<QueueItem> = response
            .json()
            .await
            .context("drone queue response is not a queue")?;

        debug!(phase = "finish", queue_length = queue.len(), "fetched drone queue");
        trace!(?queue);
        Ok(queue)
    }
}

impl QueueSource for DroneQueueClient {
    fn fetch_queue(&self) -> BoxFuture<'_, anyhow::Result<Vec<QueueItem>>> {
        Box::pin(self.get_queue())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use drowse_core::QueueStatus;

    async fn queue_handler(headers: HeaderMap) -> Response {
        let authorized = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            == Some("Bearer test-token");
        if !authorized {
            return (StatusCode::UNAUTHORIZED, "bad token").into_response();
        }
        Json(serde_json::json!([
            {"id": 1, "status": "pending", "created": 1700000000},
            {"id": 2, "status": "running"}
        ]))
        .into_response()
    }

    async fn serve() -> String {
        let router = Router::new().route("/api/queue", get(queue_handler));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn config(server: &str, token: &str) -> DroneConfig {
        DroneConfig {
            server: server.to_string(),
            token: token.to_string(),
            ignore_running_for: None,
        }
    }

    #[test]
    fn queue_url_joins_server_and_path() {
        let client = DroneQueueClient::new(&config("http://test-server/", "t")).unwrap();
        assert_eq!(client.queue_url(), "http://test-server/api/queue");
    }

    #[tokio::test]
    async fn fetches_queue_with_bearer_token() {
        let server = serve().await;
        let client = DroneQueueClient::new(&config(&server, "test-token")).unwrap();

        let queue = client.fetch_queue().await.unwrap();
        assert_eq!(queue.len(), 2);
        assert_eq!(queue[0], QueueItem::pending(Some(1_700_000_000)));
        assert_eq!(queue[1].status, QueueStatus::Running);
        assert_eq!(queue[1].created, None);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = serve().await;
        let client = DroneQueueClient::new(&config(&server, "wrong")).unwrap();

        let err = client.get_queue().await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("401"), "{msg}");
        assert!(msg.contains("bad token"), "{msg}");
    }

    #[tokio::test]
    async fn unreachable_server_is_an_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = DroneQueueClient::new(&config(&format!("http://{addr}"), "test-token")).unwrap();
        let err = client.get_queue().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("request to http://{addr}/api/queue failed")
        );
    }
}
