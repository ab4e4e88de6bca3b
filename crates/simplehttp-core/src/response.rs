//! HTTP Response types

use bytes::Bytes;
use futures_util::stream;
use http::header::{HeaderName, HeaderValue, CONTENT_LENGTH};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::Frame;
use smallvec::SmallVec;
use std::convert::Infallible;

/// Body type handed to hyper
pub type ResponseBody = BoxBody<Bytes, Infallible>;

/// HTTP Status Code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const UNAUTHORIZED: StatusCode = StatusCode(401);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);

    /// Get the numeric code
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Get the reason phrase
    pub fn reason_phrase(&self) -> &'static str {
        match self.0 {
            200 => "OK",
            401 => "Unauthorized",
            500 => "Internal Server Error",
            _ => "Unknown",
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.0, self.reason_phrase())
    }
}

/// How the body length reaches the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyLength {
    /// `Content-Length` is sent ahead of the body
    Declared,
    /// The transport frames the body itself (chunked or close-delimited)
    Streamed,
}

/// HTTP Response
#[derive(Debug, Clone)]
pub struct Response {
    /// Status code
    pub status: StatusCode,
    /// Response headers
    pub headers: SmallVec<[(String, String); 4]>,
    /// Response body
    pub body: Bytes,
    /// Body framing
    pub length: BodyLength,
}

impl Response {
    /// Create a new response with an empty, streamed body
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: SmallVec::new(),
            body: Bytes::new(),
            length: BodyLength::Streamed,
        }
    }

    /// Create a 200 OK text response whose length is left to the transport
    pub fn text(body: impl Into<Bytes>) -> Self {
        ResponseBuilder::new(StatusCode::OK).body(body).build()
    }

    /// Create a 200 OK response carrying file contents with a declared length
    pub fn binary(body: impl Into<Bytes>, content_type: Option<&str>) -> Self {
        let mut builder = ResponseBuilder::new(StatusCode::OK);
        if let Some(content_type) = content_type {
            builder = builder.header("Content-Type", content_type);
        }
        builder.body(body).declared_length().build()
    }

    /// Create a 401 Basic challenge
    pub fn unauthorized(realm: &str) -> Self {
        ResponseBuilder::new(StatusCode::UNAUTHORIZED)
            .header("WWW-Authenticate", format!("Basic realm=\"{}\"", realm))
            .header("Content-Type", "text/plain")
            .body("Unauthorized")
            .declared_length()
            .build()
    }

    /// Create a 500 Internal Server Error response
    pub fn internal_error(message: &str) -> Self {
        ResponseBuilder::new(StatusCode::INTERNAL_SERVER_ERROR)
            .header("Content-Type", "text/plain")
            .body(message.to_string())
            .build()
    }

    /// Get a header value
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get content-type header
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Length announced ahead of the body, if any
    pub fn content_length(&self) -> Option<u64> {
        match self.length {
            BodyLength::Declared => Some(self.body.len() as u64),
            BodyLength::Streamed => None,
        }
    }

    /// Get body as string (if UTF-8)
    pub fn body_string(&self) -> Option<String> {
        std::str::from_utf8(&self.body).ok().map(|s| s.to_string())
    }

    /// Convert to a hyper response
    ///
    /// Declared bodies go out as a single full body with `Content-Length`;
    /// streamed bodies have no size hint, so hyper frames them itself.
    pub fn into_hyper(self) -> hyper::Response<ResponseBody> {
        let Response { status, headers: fields, body, length } = self;
        let body_len = body.len();

        let body = match length {
            BodyLength::Declared => Full::new(body).boxed(),
            BodyLength::Streamed => {
                let frames = stream::iter([Ok::<_, Infallible>(Frame::data(body))]);
                StreamBody::new(frames).boxed()
            }
        };

        let mut res = hyper::Response::new(body);
        *res.status_mut() = http::StatusCode::from_u16(status.as_u16())
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);

        let headers = res.headers_mut();
        for (name, value) in &fields {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => tracing::warn!(header = %name, "dropping header that is not valid HTTP"),
            }
        }
        if length == BodyLength::Declared {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(body_len));
        }

        res
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new(StatusCode::OK)
    }
}

/// Builder for constructing responses
pub struct ResponseBuilder {
    response: Response,
}

impl ResponseBuilder {
    /// Create a new builder
    pub fn new(status: StatusCode) -> Self {
        Self {
            response: Response::new(status),
        }
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.response.headers.push((name.into(), value.into()));
        self
    }

    /// Set body
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.response.body = body.into();
        self
    }

    /// Announce the body length before the body
    pub fn declared_length(mut self) -> Self {
        self.response.length = BodyLength::Declared;
        self
    }

    /// Build the response
    pub fn build(self) -> Response {
        self.response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::body::Body;

    #[test]
    fn test_status_code() {
        assert_eq!(StatusCode::OK.as_u16(), 200);
        assert_eq!(StatusCode::UNAUTHORIZED.to_string(), "401 Unauthorized");
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR.to_string(), "500 Internal Server Error");
    }

    #[test]
    fn test_text_is_streamed() {
        let res = Response::text("Unknown resource.");
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.length, BodyLength::Streamed);
        assert_eq!(res.content_length(), None);
        assert_eq!(res.content_type(), None);
    }

    #[test]
    fn test_binary_declares_length() {
        let res = Response::binary(vec![1u8, 2, 3], Some("image/png"));
        assert_eq!(res.content_length(), Some(3));
        assert_eq!(res.content_type(), Some("image/png"));

        let res = Response::binary(vec![1u8], None);
        assert_eq!(res.content_type(), None);
    }

    #[test]
    fn test_unauthorized_challenge() {
        let res = Response::unauthorized("simpleServerRealm");
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            res.header("www-authenticate"),
            Some("Basic realm=\"simpleServerRealm\"")
        );
    }

    #[tokio::test]
    async fn test_into_hyper_declared() {
        let res = Response::binary("<a/>", Some("application/xml")).into_hyper();
        assert_eq!(res.status(), http::StatusCode::OK);
        assert_eq!(res.headers()["content-length"], "4");
        assert_eq!(res.headers()["content-type"], "application/xml");

        let body = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"<a/>");
    }

    #[tokio::test]
    async fn test_into_hyper_streamed() {
        let res = Response::text("Greetings, Chosen One!").into_hyper();
        assert!(res.headers().get("content-length").is_none());
        assert_eq!(res.body().size_hint().exact(), None);

        let body = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"Greetings, Chosen One!");
    }
}
