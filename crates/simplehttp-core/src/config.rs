//! Settings loading
//!
//! Reads the XML settings document into [`ConnectionParameters`] and a
//! [`RouteTable`]. Every leaf is optional while parsing so that a missing
//! or blank element surfaces as [`ConfigError::MissingField`] naming it.
//! Values are otherwise kept verbatim; only the port is trimmed.

use crate::middleware::AccessGate;
use crate::{ConfigError, Route, RouteTable};
use serde::Deserialize;
use std::path::Path;

/// Lowest accepted listening port
pub const MIN_PORT: i64 = 1025;

/// Highest accepted listening port
pub const MAX_PORT: i64 = 65535;

/// `connection.auth` value that opens access to everyone
pub const OPEN_ACCESS: &str = "any";

/// Connection parameters for the listener
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParameters {
    /// Listening port, checked against `MIN_PORT..=MAX_PORT` on initialize
    pub port: i64,
    /// Serve everyone without credentials
    pub open_access: bool,
    /// Required unless `open_access`
    pub user: Option<String>,
    /// Required unless `open_access`
    pub password: Option<String>,
}

impl ConnectionParameters {
    /// Parameters for a server anyone may query
    pub fn open(port: i64) -> Self {
        Self {
            port,
            open_access: true,
            user: None,
            password: None,
        }
    }

    /// Parameters for a server guarded by a single user
    pub fn restricted(port: i64, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            port,
            open_access: false,
            user: Some(user.into()),
            password: Some(password.into()),
        }
    }

    /// The port, if it lies within `MIN_PORT..=MAX_PORT`
    pub fn checked_port(&self) -> Result<u16, ConfigError> {
        if !(MIN_PORT..=MAX_PORT).contains(&self.port) {
            return Err(ConfigError::InvalidPort(self.port.to_string()));
        }
        u16::try_from(self.port).map_err(|_| ConfigError::InvalidPort(self.port.to_string()))
    }

    /// The credential gate to install, `None` for open access
    pub fn access_gate(&self) -> Result<Option<AccessGate>, ConfigError> {
        if self.open_access {
            return Ok(None);
        }
        let user = required(self.user.as_deref(), "connection.user")?;
        let password = required(self.password.as_deref(), "connection.password")?;
        Ok(Some(AccessGate::new(user, password)))
    }
}

/// A fully parsed settings document
#[derive(Debug, Clone)]
pub struct Settings {
    pub connection: ConnectionParameters,
    pub routes: RouteTable,
}

impl Settings {
    /// Parse a settings document
    pub fn from_xml_str(xml: &str) -> Result<Self, ConfigError> {
        let doc: Document = quick_xml::de::from_str(xml)?;

        let conn = doc.connection.unwrap_or_default();
        let port = required(conn.port.as_deref(), "connection.port")?;
        let port = port
            .trim()
            .parse::<i64>()
            .map_err(|_| ConfigError::InvalidPort(port.trim().to_string()))?;
        let auth = required(conn.auth.as_deref(), "connection.auth")?;
        let open_access = auth.trim() == OPEN_ACCESS;

        let connection = ConnectionParameters {
            port,
            open_access,
            user: present(conn.user),
            password: present(conn.password),
        };
        // Credentials are only needed when access is restricted.
        connection.access_gate()?;

        let entries = doc.responses.map(|r| r.response).unwrap_or_default();
        let mut routes = Vec::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            let field = |name: &str| format!("responses.response[{}].{}", i, name);
            let query = required(entry.query.as_deref(), &field("query"))?;
            let kind = required(entry.kind.as_deref(), &field("type"))?;
            let value = required(entry.value.as_deref(), &field("value"))?;
            routes.push((query.to_string(), Route::from_kind(kind, value)));
        }

        Ok(Self {
            connection,
            routes: RouteTable::from_routes(routes)?,
        })
    }

    /// Read and parse a settings file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_xml_str(&xml)
    }

    pub fn into_parts(self) -> (ConnectionParameters, RouteTable) {
        (self.connection, self.routes)
    }
}

/// The value as written, unless it is absent or blank
fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingField(field.to_string())),
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Default, Deserialize)]
struct Document {
    connection: Option<ConnectionSection>,
    responses: Option<ResponsesSection>,
}

#[derive(Debug, Default, Deserialize)]
struct ConnectionSection {
    port: Option<String>,
    auth: Option<String>,
    user: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsesSection {
    #[serde(default)]
    response: Vec<ResponseSection>,
}

#[derive(Debug, Deserialize)]
struct ResponseSection {
    query: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    value: Option<String>,
}
