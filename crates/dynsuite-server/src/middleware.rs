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

//! Request logging middleware
//!
//! Besides the log line, every request bumps `dynsuite_requests_total` and
//! records `dynsuite_request_duration_seconds`. Both are no-ops until the
//! binary installs a metrics recorder.

use hyper::{Request, Response};
use metrics::{counter, histogram};
use std::time::Instant;
use tower::{Layer, Service};
use tracing::{error, info};

/// Logs every request with its status and duration
#[derive(Clone)]
pub struct LoggingMiddleware<S> {
    inner: S,
}

impl<S> LoggingMiddleware<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for LoggingMiddleware<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = Box<dyn std::error::Error + Send + Sync>;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        // Take the service that was driven to readiness, leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let method = req.method().clone();
        let uri = req.uri().clone();
        let start_time = Instant::now();

        Box::pin(async move {
            let result: Result<Response<ResBody>, Self::Error> = inner.call(req).await.map_err(Into::into);
            let duration = start_time.elapsed();

            match &result {
                Ok(response) => {
                    info!("{} {} - {} in {:?}", method, uri, response.status(), duration);
                    counter!("dynsuite_requests_total", 1, "status" => response.status().as_str().to_string());
                }
                Err(e) => {
                    error!("{} {} - failed in {:?}: {}", method, uri, duration, e);
                    counter!("dynsuite_requests_total", 1, "status" => "error");
                }
            }
            histogram!("dynsuite_request_duration_seconds", duration.as_secs_f64());

            result
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer;

impl LoggingLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = LoggingMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoggingMiddleware::new(inner)
    }
}
