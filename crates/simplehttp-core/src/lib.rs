//! simplehttp-core: canned-response HTTP server
//!
//! Serves a fixed, configuration-defined set of responses over HTTP/1.1.
//! Each request target maps either to an inline text body or to a file read
//! from disk. Access is open to everyone or gated by HTTP Basic
//! authentication against a single configured user.
//!
//! ```no_run
//! # async fn run() -> simplehttp_core::Result<()> {
//! use simplehttp_core::SimpleServer;
//!
//! let server = SimpleServer::from_settings_file("settings.xml")?;
//! server.start()?;
//! println!("{server}");
//! server.stop()?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod config;
pub mod dispatch;
pub mod error;
pub mod middleware;
pub mod mime;
pub mod request;
pub mod response;
pub mod routes;
pub mod server;

// Re-exports
pub use config::{ConnectionParameters, Settings};
pub use dispatch::Dispatcher;
pub use error::{ConfigError, Error, Result, StateError};
pub use request::{Request, RequestBuilder};
pub use response::{BodyLength, Response, ResponseBody, ResponseBuilder, StatusCode};
pub use routes::{Route, RouteTable};
pub use server::{ServerState, SimpleServer};

// Middleware re-exports
pub use middleware::{AccessGate, BasicAuth, BasicCredentials, Middleware, MiddlewareChain, REALM};
