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

//! Error handling for the HTTP front controller
//!
//! Clients only ever see the status line and its reason phrase; details are
//! logged.

use dynsuite_core::ConfigError;
use http_body_util::Full;
use hyper::{Response, StatusCode, body::Bytes};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Payload too large: limit is {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Internal server error: {message}")]
    InternalServerError { message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid bind address {address}: {source}")]
    InvalidBindAddress {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Serde JSON error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    HttpError(String),
}

impl ServerError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ServerError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::JwtError(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convert ServerError to HTTP response
impl From<ServerError> for Response<Full<Bytes>> {
    fn from(error: ServerError) -> Self {
        let status_code = error.status_code();
        error!("Server error: {} - {}", status_code, error);

        let reason = status_code.canonical_reason().unwrap_or("Error");
        Response::builder()
            .status(status_code)
            .header("content-type", "text/plain; charset=utf-8")
            .header("cache-control", "no-cache")
            .body(Full::new(Bytes::from(reason)))
            .unwrap_or_else(|e| {
                error!("Failed to build error response: {}", e);
                let mut response = Response::new(Full::new(Bytes::from("Internal Server Error")));
                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                response
            })
    }
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

impl From<hyper::http::Error> for ServerError {
    fn from(err: hyper::http::Error) -> Self {
        ServerError::HttpError(err.to_string())
    }
}
