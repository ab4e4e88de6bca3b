//! Authentication middleware
//!
//! HTTP Basic authentication against a single configured user.

use super::Middleware;
use crate::{Request, Response};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Realm announced in the Basic challenge
pub const REALM: &str = "simpleServerRealm";

/// Credential check against the configured user and password
///
/// Comparison is plain byte equality: no hashing and not constant-time.
#[derive(Clone)]
pub struct AccessGate {
    user: String,
    password: String,
}

impl AccessGate {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    /// True iff both values exactly equal the configured pair
    pub fn authenticate(&self, user: &str, password: &str) -> bool {
        user == self.user && password == self.password
    }
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Basic authentication credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl BasicCredentials {
    /// Parse from Authorization header
    pub fn parse(header: &str) -> Option<Self> {
        let (scheme, encoded) = header.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }
        let decoded = STANDARD.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;

        Some(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// Encode to Authorization header value
    pub fn encode(&self) -> String {
        let combined = format!("{}:{}", self.username, self.password);
        format!("Basic {}", STANDARD.encode(combined))
    }
}

/// Basic authentication middleware
///
/// Any request without valid credentials gets a 401 challenge.
pub struct BasicAuth {
    realm: String,
    gate: AccessGate,
}

impl BasicAuth {
    pub fn new(realm: impl Into<String>, gate: AccessGate) -> Self {
        Self {
            realm: realm.into(),
            gate,
        }
    }

    fn unauthorized_response(&self) -> Response {
        Response::unauthorized(&self.realm)
    }
}

impl Middleware for BasicAuth {
    fn before(&self, req: &Request) -> Option<Response> {
        let creds = match req.authorization().and_then(BasicCredentials::parse) {
            Some(creds) => creds,
            None => {
                tracing::debug!(path = %req.target, "request without usable credentials");
                return Some(self.unauthorized_response());
            }
        };

        if self.gate.authenticate(&creds.username, &creds.password) {
            None
        } else {
            tracing::debug!(user = %creds.username, "credentials rejected");
            Some(self.unauthorized_response())
        }
    }
}
