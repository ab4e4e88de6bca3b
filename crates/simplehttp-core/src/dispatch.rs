//! Request dispatcher
//!
//! Turns a method and request target into one of the canned responses.
//! Every outcome other than a server-side failure is a 200, including
//! unsupported methods and unknown targets.

use crate::mime;
use crate::{Request, Response, Route, RouteTable};
use std::path::Path;
use std::sync::Arc;

/// Body sent for `GET /`
pub const GREETING: &str = "Greetings, Chosen One!";

/// Body sent for any method other than GET
pub const UNSUPPORTED_METHOD: &str = "Unsupported request type. Only GET requests supported.";

/// Body sent for a target missing from the route table
pub const UNKNOWN_RESOURCE: &str = "Unknown resource.";

/// Body sent when a binary payload cannot be read
pub const UNREADABLE_RESOURCE: &str = "Unable to read resource.";

/// Body sent for a route whose kind is neither inline nor binary
pub const UNSUPPORTED_KIND: &str = "Unsupported response type.";

/// Dispatches requests against a shared, read-only route table
#[derive(Debug, Clone)]
pub struct Dispatcher {
    routes: Arc<RouteTable>,
}

impl Dispatcher {
    pub fn new(routes: Arc<RouteTable>) -> Self {
        Self { routes }
    }

    /// Handle a request
    pub fn handle(&self, req: &Request) -> Response {
        self.dispatch(&req.method, &req.target)
    }

    /// Produce the response for `method` and `path`
    ///
    /// Binary payloads are read synchronously and in full.
    pub fn dispatch(&self, method: &str, path: &str) -> Response {
        if method != "GET" {
            return Response::text(UNSUPPORTED_METHOD);
        }
        if path == "/" {
            return Response::text(GREETING);
        }

        match self.routes.get(path) {
            Some(Route::Inline(text)) => Response::text(text.clone()),
            Some(Route::Binary(file)) => serve_file(path, file),
            Some(Route::Unsupported { kind, .. }) => {
                tracing::warn!(%path, %kind, "no response defined for route type");
                Response::internal_error(UNSUPPORTED_KIND)
            }
            None => Response::text(UNKNOWN_RESOURCE),
        }
    }
}

fn serve_file(path: &str, file: &Path) -> Response {
    match std::fs::read(file) {
        Ok(content) => {
            let content_type = mime::resolve(&file.to_string_lossy());
            Response::binary(content, content_type)
        }
        Err(err) => {
            tracing::error!(
                %path,
                file = %file.display(),
                error = %err,
                "failed to read response file"
            );
            Response::internal_error(UNREADABLE_RESOURCE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BodyLength, RequestBuilder, StatusCode};
    use std::io::Write;
    use std::path::PathBuf;

    fn dispatcher(routes: Vec<(&str, Route)>) -> Dispatcher {
        Dispatcher::new(Arc::new(RouteTable::from_routes(routes).unwrap()))
    }

    #[test]
    fn test_non_get_is_unsupported() {
        let d = dispatcher(vec![("/text", Route::Inline("x".into()))]);

        for method in ["POST", "PUT", "DELETE", "HEAD", "get", "PROPFIND"] {
            let res = d.dispatch(method, "/text");
            assert_eq!(res.status, StatusCode::OK);
            assert_eq!(res.body_string().unwrap(), UNSUPPORTED_METHOD);
        }

        let res = d.dispatch("POST", "/");
        assert_eq!(res.body_string().unwrap(), UNSUPPORTED_METHOD);
    }

    #[test]
    fn test_root_greets() {
        let d = dispatcher(vec![]);
        let res = d.dispatch("GET", "/");
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body_string().unwrap(), GREETING);
        assert_eq!(res.length, BodyLength::Streamed);
    }

    #[test]
    fn test_inline_route() {
        let table = RouteTable::build(&["/text"], &["inplace"], &["<text>text</text>"]).unwrap();
        let d = Dispatcher::new(Arc::new(table));

        let res = d.dispatch("GET", "/text");
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body_string().unwrap(), "<text>text</text>");
        assert_eq!(res.content_length(), None);
        assert_eq!(res.content_type(), None);
    }

    #[test]
    fn test_unknown_resource() {
        let d = dispatcher(vec![("/text", Route::Inline("x".into()))]);
        for path in ["/nope", "/text/", "/TEXT", "/text?x=1", ""] {
            let res = d.dispatch("GET", path);
            assert_eq!(res.status, StatusCode::OK);
            assert_eq!(res.body_string().unwrap(), UNKNOWN_RESOURCE);
        }
    }

    #[test]
    fn test_binary_route() {
        let mut file = tempfile::Builder::new().suffix(".PNG").tempfile().unwrap();
        file.write_all(&[0x89, b'P', b'N', b'G', 0, 1, 2]).unwrap();

        let d = dispatcher(vec![("/image", Route::Binary(file.path().to_path_buf()))]);
        let res = d.dispatch("GET", "/image");

        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(&res.body[..], &[0x89, b'P', b'N', b'G', 0, 1, 2]);
        assert_eq!(res.content_type(), Some("image/png"));
        assert_eq!(res.content_length(), Some(7));
    }

    #[test]
    fn test_binary_without_known_type() {
        let mut file = tempfile::Builder::new().suffix(".bin").tempfile().unwrap();
        file.write_all(b"raw").unwrap();

        let d = dispatcher(vec![("/raw", Route::Binary(file.path().to_path_buf()))]);
        let res = d.dispatch("GET", "/raw");

        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.content_type(), None);
        assert_eq!(res.content_length(), Some(3));
    }

    #[test]
    fn test_unreadable_binary() {
        let d = dispatcher(vec![(
            "/gone",
            Route::Binary(PathBuf::from("testdata/does-not-exist.xml")),
        )]);
        let res = d.dispatch("GET", "/gone");

        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.body_string().unwrap(), UNREADABLE_RESOURCE);
    }

    #[test]
    fn test_unsupported_kind() {
        let d = dispatcher(vec![("/odd", Route::from_kind("stream", "x"))]);
        let res = d.dispatch("GET", "/odd");

        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.body_string().unwrap(), UNSUPPORTED_KIND);
    }

    #[test]
    fn test_handle_uses_request_target() {
        let d = dispatcher(vec![("/text?lang=en", Route::Inline("hello".into()))]);
        let req = RequestBuilder::new("GET", "/text?lang=en").build();
        assert_eq!(d.handle(&req).body_string().unwrap(), "hello");
    }
}
