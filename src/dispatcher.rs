//! Controller/action dispatch.
//!
//! The routing adapter has already resolved the URL to an area, controller
//! and action; the dispatcher only maps that triple to a handler. Names
//! compare case-insensitively, so `/Products/Show` and `/products/show`
//! reach the same action.

use std::collections::HashMap;
use std::sync::Arc;

use crate::context::RouteMatch;
use crate::handler::{BoxedHandler, Handler};

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
struct ActionKey {
    area: Option<String>,
    controller: String,
    action: String,
}

impl ActionKey {
    fn new(area: Option<&str>, controller: &str, action: &str) -> Self {
        Self {
            area: area.filter(|a| !a.is_empty()).map(str::to_ascii_lowercase),
            controller: controller.to_ascii_lowercase(),
            action: action.to_ascii_lowercase(),
        }
    }
}

/// Handlers keyed by `[area/]controller/action`. Build it once at startup
/// and hand it to [`App`](crate::App); each registration returns `self`.
#[derive(Default)]
pub struct Dispatcher {
    actions: HashMap<ActionKey, BoxedHandler>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `controller/action` outside any area.
    ///
    /// ```rust,no_run
    /// # use switchyard::{Dispatcher, Request, Response};
    /// # async fn list(_: Request) -> Response { Response::text("") }
    /// # async fn show(_: Request) -> Response { Response::text("") }
    /// Dispatcher::new()
    ///     .on("products", "list", list)
    ///     .on("products", "show", show);
    /// ```
    pub fn on(self, controller: &str, action: &str, handler: impl Handler) -> Self {
        self.add(ActionKey::new(None, controller, action), handler)
    }

    /// Registers `handler` for `area/controller/action`.
    pub fn on_area(self, area: &str, controller: &str, action: &str, handler: impl Handler) -> Self {
        self.add(ActionKey::new(Some(area), controller, action), handler)
    }

    fn add(mut self, key: ActionKey, handler: impl Handler) -> Self {
        self.actions.insert(key, handler.into_boxed_handler());
        self
    }

    pub(crate) fn lookup(&self, route_match: &RouteMatch) -> Option<BoxedHandler> {
        let key = ActionKey::new(
            route_match.area(),
            route_match.controller()?,
            route_match.action()?,
        );
        self.actions.get(&key).map(Arc::clone)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
