//! Middleware layer.
//!
//! Middleware runs before dispatch and may rewrite the request in place.
//! [`routing`] is the one that matters: it turns a friendly URL into the
//! canonical `[area/]controller/action` path the dispatcher understands.

pub mod routing;
