//! Route table
//!
//! Maps request targets to canned responses. Built once from configuration
//! and read-only afterwards; lookups are exact string matches with no
//! normalisation of case, trailing slashes or query strings.

use crate::ConfigError;
use std::collections::HashMap;
use std::path::PathBuf;

/// Configured kind for a response stored in the settings document
pub const INLINE_KIND: &str = "inplace";

/// Configured kind for a response read from a file
pub const BINARY_KIND: &str = "binary";

/// A canned response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Literal response text
    Inline(String),
    /// File read at request time
    Binary(PathBuf),
    /// Kind that is neither inline nor binary; kept so dispatch can report it
    Unsupported { kind: String, payload: String },
}

impl Route {
    /// Create a route from its configured kind and payload
    pub fn from_kind(kind: &str, payload: impl Into<String>) -> Self {
        let payload = payload.into();
        match kind {
            INLINE_KIND => Route::Inline(payload),
            BINARY_KIND => Route::Binary(PathBuf::from(payload)),
            _ => Route::Unsupported {
                kind: kind.to_string(),
                payload,
            },
        }
    }

    /// The configured kind name
    pub fn kind(&self) -> &str {
        match self {
            Route::Inline(_) => INLINE_KIND,
            Route::Binary(_) => BINARY_KIND,
            Route::Unsupported { kind, .. } => kind,
        }
    }
}

/// Immutable mapping from request target to [`Route`]
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, Route>,
}

impl RouteTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from three parallel lists of paths, kinds and payloads
    ///
    /// Fails with [`ConfigError::ShapeMismatch`] when the lists differ in
    /// length and with [`ConfigError::MissingField`] when any value is empty.
    pub fn build<P, K, V>(paths: &[P], kinds: &[K], payloads: &[V]) -> Result<Self, ConfigError>
    where
        P: AsRef<str>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        if paths.len() != kinds.len() || paths.len() != payloads.len() {
            return Err(ConfigError::ShapeMismatch {
                paths: paths.len(),
                kinds: kinds.len(),
                payloads: payloads.len(),
            });
        }

        let mut routes = Vec::with_capacity(paths.len());
        for (i, ((path, kind), payload)) in paths.iter().zip(kinds).zip(payloads).enumerate() {
            let path = non_empty(path.as_ref(), "paths", i)?;
            let kind = non_empty(kind.as_ref(), "kinds", i)?;
            let payload = non_empty(payload.as_ref(), "payloads", i)?;
            routes.push((path, Route::from_kind(kind, payload)));
        }

        Self::from_routes(routes)
    }

    /// Build from `(path, route)` pairs
    pub fn from_routes<I, S>(routes: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (S, Route)>,
        S: Into<String>,
    {
        let mut table = HashMap::new();

        for (path, route) in routes {
            let path = path.into();
            if !path.starts_with('/') {
                return Err(ConfigError::InvalidPath(path));
            }
            if path == "/" {
                tracing::warn!("route for \"/\" is shadowed by the greeting and never served");
            }
            if let Route::Unsupported { .. } = route {
                tracing::warn!(
                    %path,
                    kind = route.kind(),
                    "route has an unsupported response type"
                );
            }
            if table.contains_key(&path) {
                return Err(ConfigError::DuplicatePath(path));
            }
            table.insert(path, route);
        }

        Ok(Self { routes: table })
    }

    /// Look up the route for an exact request target
    pub fn get(&self, path: &str) -> Option<&Route> {
        self.routes.get(path)
    }

    /// Number of configured routes
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no routes are configured
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn non_empty<'a>(value: &'a str, list: &str, index: usize) -> Result<&'a str, ConfigError> {
    if value.is_empty() {
        Err(ConfigError::MissingField(format!("{}[{}]", list, index)))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_parallel_lists() {
        let table = RouteTable::build(
            &["/text", "/xml1"],
            &["inplace", "binary"],
            &["<text>text</text>", "testdata/xml1.xml"],
        )
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(
            table.get("/text"),
            Some(&Route::Inline("<text>text</text>".to_string()))
        );
        assert_eq!(
            table.get("/xml1"),
            Some(&Route::Binary(PathBuf::from("testdata/xml1.xml")))
        );
    }

    #[test]
    fn test_shape_mismatch() {
        let err = RouteTable::build(&["/a", "/b"], &["inplace"], &["x", "y"]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ShapeMismatch { paths: 2, kinds: 1, payloads: 2 }
        ));

        let err = RouteTable::build(&["/a"], &["inplace"], &[] as &[&str]).unwrap_err();
        assert!(matches!(err, ConfigError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_empty_value_is_missing() {
        let err = RouteTable::build(&["/a", "/b"], &["inplace", ""], &["x", "y"]).unwrap_err();
        match err {
            ConfigError::MissingField(field) => assert_eq!(field, "kinds[1]"),
            other => panic!("unexpected error: {other}"),
        }

        let err = RouteTable::build(&[""], &["inplace"], &["x"]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));

        let err = RouteTable::build(&["/a"], &["inplace"], &[""]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn test_unknown_kind_is_kept() {
        let table = RouteTable::build(&["/odd"], &["stream"], &["payload"]).unwrap();
        let route = table.get("/odd").unwrap();
        assert_eq!(route.kind(), "stream");
        assert!(matches!(route, Route::Unsupported { .. }));
    }

    #[test]
    fn test_path_must_be_absolute() {
        let err = RouteTable::build(&["text"], &["inplace"], &["x"]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPath(p) if p == "text"));
    }

    #[test]
    fn test_duplicate_path_rejected() {
        let err = RouteTable::from_routes([
            ("/a", Route::Inline("one".into())),
            ("/a", Route::Inline("two".into())),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicatePath(p) if p == "/a"));
    }

    #[test]
    fn test_lookup_is_exact() {
        let table = RouteTable::from_routes([("/text", Route::Inline("x".into()))]).unwrap();

        assert!(table.get("/text").is_some());
        assert!(table.get("/text/").is_none());
        assert!(table.get("/TEXT").is_none());
        assert!(table.get("/text?a=1").is_none());
    }

    #[test]
    fn test_route_kind_names() {
        assert_eq!(Route::from_kind("inplace", "x").kind(), INLINE_KIND);
        assert_eq!(Route::from_kind("binary", "f.png").kind(), BINARY_KIND);
    }
}
