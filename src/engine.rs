//! The routing engine.
//!
//! Build it once at startup, register every route, then share it behind an
//! `Arc`. After configuration it is only read, so concurrent lookups need no
//! locking. Nothing here is global: tests and embedded hosts each construct
//! their own engine.

use std::sync::Arc;

use tracing::debug;

use crate::context::{RouteContext, RouteMatch};
use crate::error::ConfigurationError;
use crate::pattern::{Parameters, RoutePattern};
use crate::table::RouteTable;

#[derive(Debug, Default)]
pub struct RoutingEngine {
    table: RouteTable,
}

impl RoutingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `pattern` after every route added so far.
    pub fn add(&mut self, pattern: RoutePattern) -> Result<(), ConfigurationError> {
        debug!(template = pattern.template(), name = ?pattern.name(), "route registered");
        self.table.add(pattern)
    }

    /// Chaining form of [`add`](Self::add).
    pub fn route(mut self, pattern: RoutePattern) -> Result<Self, ConfigurationError> {
        self.add(pattern)?;
        Ok(self)
    }

    /// Finds the first route matching `path` for the context's verb.
    ///
    /// `None` is the ordinary "not a routed URL" answer; the caller decides
    /// whether that means a static file or a 404.
    pub fn find_match(&self, path: &str, context: Arc<RouteContext>) -> Option<RouteMatch> {
        let Some((route, parameters)) = self.table.find_first_match(path, context.method()) else {
            debug!(path, method = ?context.method(), "no route matched");
            return None;
        };

        debug!(path, route = route.template(), ?parameters, "route matched");
        Some(RouteMatch::new(
            route.template().to_owned(),
            route.name().map(str::to_owned),
            parameters,
            context,
        ))
    }

    /// Builds a URL from the route registered as `name`.
    pub fn create_url(&self, name: &str, params: &Parameters) -> Result<String, ConfigurationError> {
        self.table
            .get(name)
            .ok_or_else(|| ConfigurationError::UnknownRoute(name.to_owned()))?
            .create_url(params)
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }
}

impl From<RouteTable> for RoutingEngine {
    fn from(table: RouteTable) -> Self {
        Self { table }
    }
}
