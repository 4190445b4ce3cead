//! Unified error types.
//!
//! A request that matches no route is not an error: lookups return `None`
//! and the caller decides between a static file and a 404. What ends up here
//! are authoring mistakes in the route configuration and the I/O or parse
//! failures met while loading it.

use thiserror::Error;

/// A route configuration that can never work.
///
/// Raised while compiling templates at startup, and at request time when a
/// matched route fails to produce a controller/action pair. Both cases are
/// bugs in the route definitions, so callers should not try to recover.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("invalid route template `{template}`: {reason}")]
    Template { template: String, reason: String },

    #[error("placeholder `{name}` appears more than once in route template `{template}`")]
    DuplicatePlaceholder { template: String, name: String },

    #[error("constraint `{name}` does not name a placeholder of route template `{template}`")]
    UnknownConstraint { template: String, name: String },

    #[error("invalid constraint for `{name}` in route template `{template}`: {source}")]
    InvalidConstraint {
        template: String,
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("a route named `{0}` is already registered")]
    DuplicateRouteName(String),

    #[error("no route named `{0}` is registered")]
    UnknownRoute(String),

    #[error(
        "parameter `{name}` is not optional; check that route `{route}` adds it to the match"
    )]
    MissingParameter { route: String, name: &'static str },

    #[error("cannot build a url from `{template}`: no value for `{name}`")]
    MissingUrlParameter { template: String, name: String },

    #[error("cannot build a url from `{template}`: `{value}` violates the constraint on `{name}`")]
    UrlConstraintViolation {
        template: String,
        name: String,
        value: String,
    },

    #[error("unknown http method `{0}`")]
    InvalidMethod(String),
}

impl ConfigurationError {
    pub(crate) fn template(template: &str, reason: impl Into<String>) -> Self {
        Self::Template {
            template: template.to_owned(),
            reason: reason.into(),
        }
    }
}

/// The error type returned by switchyard's fallible operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid uri: {0}")]
    Uri(#[from] http::uri::InvalidUri),
}

impl Error {
    /// `true` when the error stems from the route definitions rather than
    /// the environment.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
