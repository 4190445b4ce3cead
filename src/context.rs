//! Per-request routing input and output.

use std::sync::Arc;

use http::{Extensions, HeaderMap};

use crate::method::Method;
use crate::pattern::Parameters;

/// What the host knows about a request when it asks for a route.
///
/// Headers and extensions are carried through untouched for whatever runs
/// after routing; the engine itself only looks at the verb.
#[derive(Clone, Debug)]
pub struct RouteContext {
    method: Option<Method>,
    path: String,
    query: Option<String>,
    application_path: String,
    headers: HeaderMap,
    extensions: Extensions,
}

impl RouteContext {
    pub fn new(method: impl Into<Option<Method>>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            query: None,
            application_path: "/".to_owned(),
            headers: HeaderMap::new(),
            extensions: Extensions::new(),
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_application_path(mut self, application_path: impl Into<String>) -> Self {
        self.application_path = application_path.into();
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = extensions;
        self
    }

    /// `None` for extension verbs; only routes without a verb list take them.
    pub fn method(&self) -> Option<Method> {
        self.method
    }

    /// The raw request path, before the application path was stripped.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn application_path(&self) -> &str {
        &self.application_path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }
}

/// A successful route lookup.
///
/// Hosts attach it to the request (it is its own extension key) so that
/// whatever dispatches the request can read the resolved controller and
/// action without routing again.
#[derive(Clone, Debug)]
pub struct RouteMatch {
    route: String,
    name: Option<String>,
    parameters: Parameters,
    context: Arc<RouteContext>,
}

impl RouteMatch {
    pub(crate) fn new(
        route: String,
        name: Option<String>,
        parameters: Parameters,
        context: Arc<RouteContext>,
    ) -> Self {
        Self { route, name, parameters, context }
    }

    /// Template of the route that matched.
    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    pub fn area(&self) -> Option<&str> {
        self.get("area")
    }

    pub fn controller(&self) -> Option<&str> {
        self.get("controller")
    }

    pub fn action(&self) -> Option<&str> {
        self.get("action")
    }

    /// The request this match was produced for.
    pub fn context(&self) -> &Arc<RouteContext> {
        &self.context
    }
}
