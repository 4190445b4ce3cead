//! Minimal switchyard application — a product catalogue with an admin area.
//!
//! Run with:
//!   RUST_LOG=switchyard=debug cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/
//!   curl http://localhost:3000/products/42
//!   curl http://localhost:3000/products/abc        # constraint fails → 404
//!   curl http://localhost:3000/admin/users/list
//!   curl -X POST http://localhost:3000/products/create -d 'name=lamp'

use std::sync::Arc;

use http::StatusCode;
use switchyard::{
    AdapterSettings, App, Dispatcher, Method, Request, Response, RoutePattern, RoutingAdapter,
    RoutingEngine, Server,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), switchyard::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Specific routes first: the first match wins.
    let engine = RoutingEngine::new()
        .route(
            RoutePattern::builder("")
                .name("home")
                .default("controller", "home")
                .default("action", "index")
                .build()?,
        )?
        .route(
            RoutePattern::builder("products/{id}")
                .name("product")
                .default("controller", "products")
                .default("action", "show")
                .constraint("id", r"\d+")
                .verbs([Method::Get, Method::Head])
                .build()?,
        )?
        .route(
            RoutePattern::builder("admin/{controller}/{action}")
                .default("area", "admin")
                .build()?,
        )?
        .route(
            RoutePattern::builder("{controller}/{action}")
                .default("action", "index")
                .build()?,
        )?;

    let adapter = RoutingAdapter::new(Arc::new(engine), AdapterSettings::default());
    let dispatcher = Dispatcher::new()
        .on("home", "index", home)
        .on("products", "show", show_product)
        .on("products", "create", create_product)
        .on_area("admin", "users", "list", list_users);

    Server::bind("0.0.0.0:3000")
        .serve(App::new(adapter, dispatcher))
        .await
}

async fn home(_req: Request) -> Response {
    Response::html("<h1>catalogue</h1>")
}

// GET /products/{id} → rewritten to ~/products/show.castle
async fn show_product(req: Request) -> Response {
    let id = req.param("id").unwrap_or("unknown");
    Response::text(format!("product {id} (original url: {})", req.header("x-original-url").unwrap_or("-")))
}

async fn create_product(req: Request) -> Response {
    if req.body().is_empty() {
        return Response::status(StatusCode::BAD_REQUEST);
    }
    Response::builder()
        .status(StatusCode::CREATED)
        .header("location", "/products/99")
        .no_body()
}

async fn list_users(req: Request) -> String {
    format!("users in area {}", req.route_match().area().unwrap_or("-"))
}
