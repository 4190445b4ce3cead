//! Binds a [`RoutingEngine`] to incoming HTTP requests.
//!
//! For every request the adapter:
//!
//! 1. strips the application base path (requests outside it are left alone),
//! 2. leaves existing static files to the static responder,
//! 3. asks the engine for a route,
//! 4. rewrites the URI to `[area/]controller/action<extension>`, keeping the
//!    query string, and stores the [`RouteMatch`] in the request extensions.
//!
//! When the host can add request headers the original URL is forwarded as
//! `x-original-url` so downstream caches still see what the client asked for.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use http::{HeaderValue, Uri};
use tracing::{debug, warn};

use crate::context::{RouteContext, RouteMatch};
use crate::engine::RoutingEngine;
use crate::error::{ConfigurationError, Error};
use crate::method::Method;
use crate::pattern::split_path;

/// Header carrying the URL as the client sent it, before rewriting.
pub const ORIGINAL_URL_HEADER: &str = "x-original-url";

/// Suffix appended to canonical dispatch paths (`.castle` unless configured).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UrlExtension(String);

impl UrlExtension {
    pub const DEFAULT: &'static str = ".castle";

    pub fn new(extension: impl Into<String>) -> Self {
        Self(extension.into())
    }

    /// Canonical paths end at the action name.
    pub fn none() -> Self {
        Self(String::new())
    }

    /// Reads the extension off a handler mapping: `"*.rails"` gives `.rails`
    /// and `"*"` gives no extension. Any other mapping keeps the default.
    pub fn from_handler_path(handler_path: &str) -> Self {
        if let Some(extension) = handler_path.strip_prefix("*.") {
            Self(format!(".{extension}"))
        } else if handler_path == "*" {
            Self::none()
        } else {
            Self::default()
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UrlExtension {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

#[derive(Clone, Debug)]
pub struct AdapterSettings {
    pub url_extension: UrlExtension,
    /// Base path the application is mounted at. A missing leading `/` is
    /// added when the adapter is built.
    pub application_path: String,
    /// Directory of static assets; files found here bypass routing.
    pub static_root: Option<PathBuf>,
    /// Whether the host lets the adapter add request headers.
    pub supports_custom_request_headers: bool,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            url_extension: UrlExtension::default(),
            application_path: "/".to_owned(),
            static_root: None,
            supports_custom_request_headers: true,
        }
    }
}

/// What the adapter decided for one request.
#[derive(Debug, Eq, PartialEq)]
pub enum Routing {
    /// An existing file under the static root; routing was skipped.
    StaticFile(PathBuf),
    /// No route applies. Fall through to a 404.
    NoMatch,
    /// The request was rewritten to this canonical path (`~/…`).
    Dispatch(String),
}

pub struct RoutingAdapter {
    engine: Arc<RoutingEngine>,
    settings: AdapterSettings,
    forward_original_url: AtomicBool,
}

impl RoutingAdapter {
    pub fn new(engine: Arc<RoutingEngine>, mut settings: AdapterSettings) -> Self {
        if !settings.application_path.starts_with('/') {
            settings.application_path.insert(0, '/');
        }
        Self {
            engine,
            settings,
            forward_original_url: AtomicBool::new(true),
        }
    }

    pub fn engine(&self) -> &Arc<RoutingEngine> {
        &self.engine
    }

    pub fn settings(&self) -> &AdapterSettings {
        &self.settings
    }

    /// `false` once the adapter has given up on `x-original-url`.
    pub fn forwards_original_url(&self) -> bool {
        self.forward_original_url.load(Ordering::Relaxed)
    }

    /// Routes `req`, rewriting it in place on a match.
    ///
    /// A matched route without `controller` or `action` is a broken route
    /// definition and comes back as [`ConfigurationError::MissingParameter`];
    /// the request is left untouched in that case.
    pub async fn route<B>(&self, req: &mut http::Request<B>) -> Result<Routing, Error> {
        let path = req.uri().path().to_owned();
        let Some(relative) = self.strip_application_path(&path) else {
            debug!(path = %path, "outside the application path");
            return Ok(Routing::NoMatch);
        };

        if let Some(file) = self.static_file(relative).await {
            debug!(path = %path, file = %file.display(), "static file, routing skipped");
            return Ok(Routing::StaticFile(file));
        }

        let mut context = RouteContext::new(Method::from_http(req.method()), path.as_str())
            .with_application_path(self.settings.application_path.as_str())
            .with_headers(req.headers().clone())
            .with_extensions(req.extensions().clone());
        if let Some(query) = req.uri().query() {
            context = context.with_query(query);
        }

        let Some(route_match) = self.engine.find_match(relative, Arc::new(context)) else {
            return Ok(Routing::NoMatch);
        };

        let dispatch_path = canonical_path(&route_match, &self.settings.url_extension)?;
        let uri = self.dispatch_uri(&dispatch_path, req.uri().query())?;

        self.forward_original_url(req);
        debug!(from = %req.uri(), to = %uri, "request rewritten");
        *req.uri_mut() = uri;
        req.extensions_mut().insert(route_match);

        Ok(Routing::Dispatch(dispatch_path))
    }

    fn strip_application_path<'a>(&self, path: &'a str) -> Option<&'a str> {
        let base = self.settings.application_path.trim_end_matches('/');
        if base.is_empty() {
            return Some(path);
        }
        path.strip_prefix(base)
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
    }

    async fn static_file(&self, relative: &str) -> Option<PathBuf> {
        let root = self.settings.static_root.as_ref()?;
        let mut file = root.clone();
        let segments = split_path(relative);
        if segments.is_empty() {
            return None;
        }
        for segment in segments {
            let segment = urlencoding::decode(segment).ok()?;
            if matches!(&*segment, "" | "." | "..") || segment.contains(['/', '\\']) {
                return None;
            }
            file.push(&*segment);
        }

        let metadata = tokio::fs::metadata(&file).await.ok()?;
        metadata.is_file().then_some(file)
    }

    fn dispatch_uri(&self, dispatch_path: &str, query: Option<&str>) -> Result<Uri, Error> {
        let base = self.settings.application_path.trim_end_matches('/');
        let path = dispatch_path
            .trim_start_matches('~')
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        let uri = match query.filter(|q| !q.is_empty()) {
            Some(query) => format!("{base}{path}?{query}"),
            None => format!("{base}{path}"),
        };
        Ok(uri.parse()?)
    }

    fn forward_original_url<B>(&self, req: &mut http::Request<B>) {
        if !self.forwards_original_url() {
            return;
        }
        if !self.settings.supports_custom_request_headers {
            self.disable_forwarding("the host does not support custom request headers");
            return;
        }

        let original = req.uri().path_and_query().map_or("/", |pq| pq.as_str()).to_owned();
        let added = HeaderValue::from_str(&original)
            .ok()
            .and_then(|value| req.headers_mut().try_insert(ORIGINAL_URL_HEADER, value).ok());
        if added.is_none() {
            self.disable_forwarding("the original url could not be added as a request header");
        }
    }

    // Racing requests may both warn; that is harmless.
    fn disable_forwarding(&self, reason: &str) {
        if self.forward_original_url.swap(false, Ordering::Relaxed) {
            warn!(reason, "cannot add request headers, {ORIGINAL_URL_HEADER} will not be sent");
        }
    }
}

/// The path a match dispatches to: `~/[area/]controller/action<extension>`.
///
/// `controller` and `action` must be present and non-empty.
pub fn canonical_path(route_match: &RouteMatch, extension: &UrlExtension) -> Result<String, ConfigurationError> {
    let required = move |name: &'static str| {
        route_match
            .get(name)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ConfigurationError::MissingParameter {
                route: route_match.route().to_owned(),
                name,
            })
    };
    let controller = required("controller")?;
    let action = required("action")?;
    let extension = extension.as_str();

    Ok(match route_match.area().filter(|area| !area.is_empty()) {
        Some(area) => format!("~/{area}/{controller}/{action}{extension}"),
        None => format!("~/{controller}/{action}{extension}"),
    })
}
