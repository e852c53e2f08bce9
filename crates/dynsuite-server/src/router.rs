// DynamicSuite
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! HTTP adapter around the DynamicSuite kernel

use crate::auth::SessionService;
use crate::error::{ServerError, ServerResult};
use dynsuite_core::{Kernel, Outcome};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{CACHE_CONTROL, CONTENT_TYPE, LOCATION};
use hyper::{Request, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Turns HTTP requests into kernel calls and kernel outcomes into responses
pub struct HttpRouter {
    kernel: Arc<Kernel>,
    sessions: Arc<SessionService>,
    max_body_size: usize,
    request_timeout: Duration,
}

impl HttpRouter {
    pub fn new(kernel: Arc<Kernel>, sessions: Arc<SessionService>, max_body_size: usize, request_timeout: Duration) -> Self {
        Self {
            kernel,
            sessions,
            max_body_size,
            request_timeout,
        }
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Route a request through the kernel.
    ///
    /// The deadline covers reading the body and running the kernel. The
    /// kernel runs on its own task so an overrunning entry cannot hold the
    /// response back; on expiry the task is aborted and a 504 page is sent.
    pub async fn route<B>(&self, req: Request<B>) -> ServerResult<Response<Full<Bytes>>>
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let deadline = Instant::now() + self.request_timeout;
        let method = req.method().as_str().to_string();
        let target = req.uri().path_and_query().map(|pq| pq.as_str()).unwrap_or("/").to_string();
        let session = self.sessions.session_from_headers(req.headers());
        debug!("Routing request: {} {}", method, target);

        let body = match tokio::time::timeout_at(deadline, self.read_body(req.into_body())).await {
            Ok(body) => body?,
            Err(_) => return into_response(self.timed_out(&method, &target)),
        };

        let kernel = self.kernel.clone();
        let (task_method, task_target) = (method.clone(), target.clone());
        let mut task = tokio::spawn(async move { kernel.handle(&task_method, &task_target, &body, &session).await });

        let outcome = match tokio::time::timeout_at(deadline, &mut task).await {
            Ok(Ok(_)) if Instant::now() > deadline => self.timed_out(&method, &target),
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                return Err(ServerError::InternalServerError {
                    message: format!("Request task failed: {}", e),
                });
            }
            Err(_) => {
                task.abort();
                self.timed_out(&method, &target)
            }
        };

        into_response(outcome)
    }

    fn timed_out(&self, method: &str, target: &str) -> Outcome {
        warn!("Request timed out after {:?}: {} {}", self.request_timeout, method, target);
        self.kernel.error_page(504, "Gateway Timeout")
    }

    async fn read_body<B>(&self, body: B) -> ServerResult<Bytes>
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        match Limited::new(body, self.max_body_size).collect().await {
            Ok(collected) => Ok(collected.to_bytes()),
            Err(e) if e.is::<LengthLimitError>() => Err(ServerError::PayloadTooLarge { limit: self.max_body_size }),
            Err(e) => Err(ServerError::BadRequest {
                message: format!("Failed to read request body: {}", e),
            }),
        }
    }
}

/// Render a kernel outcome as an HTTP response
pub fn into_response(outcome: Outcome) -> ServerResult<Response<Full<Bytes>>> {
    let response = match outcome {
        Outcome::Json(response) => Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, "application/json")
            .header(CACHE_CONTROL, "no-cache")
            .body(Full::new(Bytes::from(serde_json::to_vec(&response)?)))?,
        Outcome::Html { status, body } => Response::builder()
            .status(StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR))
            .header(CONTENT_TYPE, "text/html; charset=utf-8")
            .body(Full::new(Bytes::from(body)))?,
        Outcome::Redirect(location) => Response::builder()
            .status(StatusCode::FOUND)
            .header(LOCATION, location)
            .body(Full::new(Bytes::new()))?,
    };
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynsuite_core::Response as ApiResponse;

    #[tokio::test]
    async fn test_outcome_mapping() {
        let response = into_response(Outcome::Json(ApiResponse::empty())).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(&body).unwrap(),
            serde_json::json!({"status": "EMPTY_RESPONSE", "message": "Empty Response", "data": null})
        );

        let response = into_response(Outcome::Redirect("/login?ref=/admin".to_string())).unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/login?ref=/admin");

        let response = into_response(Outcome::Html {
            status: 404,
            body: "<h1>404</h1>".to_string(),
        })
        .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
