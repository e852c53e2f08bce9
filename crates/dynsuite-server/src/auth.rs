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

//! JWT-backed sessions
//!
//! A session token arrives either as `Authorization: Bearer <token>` or in the
//! `ds_session` cookie. A missing, malformed or expired token yields an
//! anonymous session; the caller is never told why.

use crate::error::ServerResult;
use chrono::{Duration, Utc};
use dynsuite_core::Session;
use hyper::header::{AUTHORIZATION, COOKIE, HeaderMap};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Cookie carrying the session token
pub const SESSION_COOKIE: &str = "ds_session";

const ISSUER: &str = "dynsuite";

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    pub iss: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    pub permissions: Vec<String>,
}

impl Claims {
    pub fn new(user_id: impl Into<String>, permissions: Vec<String>, expires_in: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.into(),
            iss: ISSUER.to_string(),
            exp: (now + expires_in).timestamp(),
            iat: now.timestamp(),
            permissions,
        }
    }
}

/// Issues and reads session tokens
pub struct SessionService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    administrator_permission: Option<String>,
}

impl SessionService {
    pub fn new(secret: &str, administrator_permission: Option<String>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
            validation,
            administrator_permission,
        }
    }

    pub fn create_token(&self, claims: &Claims) -> ServerResult<String> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)?)
    }

    /// Validate and decode a token; expiry is checked by the decoder
    pub fn validate_token(&self, token: &str) -> ServerResult<Claims> {
        Ok(decode::<Claims>(token, &self.decoding_key, &self.validation)?.claims)
    }

    pub fn session_for(&self, claims: Claims) -> Session {
        let session = Session::authenticated(claims.sub, claims.permissions);
        match &self.administrator_permission {
            Some(permission) => session.with_administrator_permission(permission.clone()),
            None => session,
        }
    }

    /// The caller's session, anonymous unless a valid token is presented
    pub fn session_from_headers(&self, headers: &HeaderMap) -> Session {
        let Some(token) = token_from_headers(headers) else {
            return Session::anonymous();
        };
        match self.validate_token(&token) {
            Ok(claims) => self.session_for(claims),
            Err(e) => {
                debug!("Ignoring session token: {}", e);
                Session::anonymous()
            }
        }
    }
}

fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(extract_token_from_header);
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|cookies| extract_token_from_cookies(cookies).map(str::to_string))
}

/// Extract JWT token from Authorization header
pub fn extract_token_from_header(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ").map(str::trim).filter(|token| !token.is_empty())
}

/// Extract the session token from a `Cookie` header value
pub fn extract_token_from_cookies(cookie_header: &str) -> Option<&str> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynsuite_core::SessionGate;
    use hyper::header::HeaderValue;

    fn service() -> SessionService {
        SessionService::new("test-secret", Some("dynamicsuite:administrator".to_string()))
    }

    fn headers(name: hyper::header::HeaderName, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_session() {
        let service = service();
        let token = service.create_token(&Claims::new("ada", vec!["blog:write".to_string()], Duration::hours(1))).unwrap();

        let session = service.session_from_headers(&headers(AUTHORIZATION, &format!("Bearer {}", token)));
        assert!(session.is_active());
        assert_eq!(session.user_id(), Some("ada"));
        assert!(session.check_permissions(&["blog:write".to_string()]));
        assert!(!session.check_permissions(&["blog:admin".to_string()]));
    }

    #[test]
    fn test_cookie_token_session() {
        let service = service();
        let token = service.create_token(&Claims::new("ada", vec![], Duration::hours(1))).unwrap();

        let session = service.session_from_headers(&headers(COOKIE, &format!("theme=dark; {}={}", SESSION_COOKIE, token)));
        assert!(session.is_active());
    }

    #[test]
    fn test_administrator_permission_passes_everything() {
        let service = service();
        let token = service
            .create_token(&Claims::new("root", vec!["dynamicsuite:administrator".to_string()], Duration::hours(1)))
            .unwrap();

        let session = service.session_from_headers(&headers(AUTHORIZATION, &format!("Bearer {}", token)));
        assert!(session.check_permissions(&["anything:at-all".to_string()]));
    }

    #[test]
    fn test_bad_tokens_are_anonymous() {
        let service = service();
        let expired = service.create_token(&Claims::new("ada", vec![], Duration::hours(-2))).unwrap();
        let foreign = SessionService::new("other-secret", None)
            .create_token(&Claims::new("ada", vec![], Duration::hours(1)))
            .unwrap();

        for value in [format!("Bearer {}", expired), format!("Bearer {}", foreign), "Bearer garbage".to_string(), "Basic abc".to_string()] {
            assert!(!service.session_from_headers(&headers(AUTHORIZATION, &value)).is_active(), "{}", value);
        }
        assert!(!service.session_from_headers(&HeaderMap::new()).is_active());
    }

    #[test]
    fn test_extract_helpers() {
        assert_eq!(extract_token_from_header("Bearer abc"), Some("abc"));
        assert_eq!(extract_token_from_header("Bearer "), None);
        assert_eq!(extract_token_from_cookies("a=1; ds_session=xyz"), Some("xyz"));
        assert_eq!(extract_token_from_cookies("ds_session_old=xyz"), None);
    }
}
