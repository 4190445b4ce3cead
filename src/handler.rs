//! Controller actions and how the dispatcher stores them.
//!
//! [`Dispatcher`](crate::Dispatcher) keys actions by `(area, controller,
//! action)`, the same triple the routing adapter writes into the canonical
//! path `~/[area/]controller/action<extension>`. Actions of different
//! concrete types share that one map, so each `async fn` is wrapped once
//! when it is registered:
//!
//! ```text
//! dispatcher.on_area("admin", "users", "list", list_users)
//!        ↓
//! ("admin", "users", "list") → Arc<ActionFn(list_users)>
//!        ↓ request rewritten to ~/admin/users/list.castle
//! action.call(req)
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// The future an action resolves to once its return value is converted.
#[doc(hidden)]
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// An action with its concrete type erased. Public only because it appears
/// in [`Handler::into_boxed_handler`].
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

/// What the dispatcher hands back for a resolved `(area, controller, action)`.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// A controller action the dispatcher can register:
///
/// ```text
/// async fn show(req: Request) -> impl IntoResponse
/// ```
///
/// The action reads its route values through [`Request::param`] and the
/// resolved controller and action through [`Request::route_match`]. Sealed:
/// only async functions and closures of that shape qualify.
pub trait Handler: sealed::Action + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod sealed {
    pub trait Action {}
}

impl<F, Fut, R> sealed::Action for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(ActionFn(self))
    }
}

struct ActionFn<F>(F);

impl<F, Fut, R> ErasedHandler for ActionFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let action = (self.0)(req);
        Box::pin(async move { action.await.into_response() })
    }
}
