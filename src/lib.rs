//! # switchyard
//!
//! URL routing for controller/action web applications.
//!
//! Routes are templates such as `{controller}/{action}` or
//! `products/{id}`. The [`RoutingEngine`] matches a request path against
//! them in registration order and yields a [`RouteMatch`]: the parameters
//! that name an area, a controller and an action. The routing adapter then
//! rewrites the request to its canonical form
//! (`~/[area/]controller/action.castle`) and the [`Dispatcher`] runs the
//! action handler.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use switchyard::{
//!     AdapterSettings, App, Dispatcher, Request, Response, RoutePattern, RoutingAdapter,
//!     RoutingEngine, Server,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), switchyard::Error> {
//!     let mut engine = RoutingEngine::new();
//!     engine.add(
//!         RoutePattern::builder("products/{id}")
//!             .default("controller", "products")
//!             .default("action", "show")
//!             .constraint("id", r"\d+")
//!             .build()?,
//!     )?;
//!     engine.add(RoutePattern::builder("{controller}/{action}").build()?)?;
//!
//!     let adapter = RoutingAdapter::new(Arc::new(engine), AdapterSettings::default());
//!     let dispatcher = Dispatcher::new().on("products", "show", show_product);
//!
//!     Server::bind("0.0.0.0:3000").serve(App::new(adapter, dispatcher)).await
//! }
//!
//! async fn show_product(req: Request) -> Response {
//!     Response::text(format!("product {}", req.param("id").unwrap_or("?")))
//! }
//! ```

mod context;
mod dispatcher;
mod engine;
mod error;
mod handler;
mod method;
mod pattern;
mod request;
mod response;
mod server;
mod table;

pub mod config;
pub mod middleware;

pub use context::{RouteContext, RouteMatch};
pub use dispatcher::Dispatcher;
pub use engine::RoutingEngine;
pub use error::{ConfigurationError, Error};
pub use handler::Handler;
pub use method::Method;
pub use middleware::routing::{AdapterSettings, Routing, RoutingAdapter, UrlExtension};
pub use pattern::{CaseSensitivity, Parameters, RoutePattern, RoutePatternBuilder};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use server::{App, Server};
pub use table::RouteTable;
