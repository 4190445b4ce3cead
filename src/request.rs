//! Incoming HTTP request type, as seen by controller actions.

use bytes::Bytes;
use http::HeaderMap;

use crate::context::RouteMatch;
use crate::method::Method;

/// A routed request.
///
/// `path` is the canonical dispatch path the request was rewritten to; the
/// URL the client asked for is on the [`RouteMatch`] context.
pub struct Request {
    pub(crate) method: Option<Method>,
    pub(crate) path: String,
    pub(crate) query: Option<String>,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) route_match: RouteMatch,
}

impl Request {
    pub(crate) fn new(
        method: Option<Method>,
        path: String,
        query: Option<String>,
        headers: HeaderMap,
        body: Bytes,
        route_match: RouteMatch,
    ) -> Self {
        Self { method, path, query, headers, body, route_match }
    }

    /// `None` for extension verbs.
    pub fn method(&self) -> Option<Method> { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query(&self) -> Option<&str> { self.query.as_deref() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup. Values that are not visible ASCII
    /// read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Returns a route parameter.
    ///
    /// For a route `products/{id}`, `req.param("id")` on `/products/42`
    /// returns `Some("42")`. Route defaults are included.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.route_match.get(key)
    }

    pub fn route_match(&self) -> &RouteMatch {
        &self.route_match
    }
}
