//! Route configuration loaded from TOML.
//!
//! ```toml
//! url_extension = ".castle"
//! application_path = "/"
//! static_root = "public"
//! supports_custom_request_headers = true
//! case_sensitive = true
//!
//! [[routes]]
//! name = "product"
//! template = "products/{id}"
//! verbs = ["get"]
//! defaults = { controller = "products", action = "show" }
//! constraints = { id = '\d+' }
//! ```
//!
//! `handler_path = "*.rails"` may stand in for `url_extension`; it is read
//! the way a handler mapping is (`"*"` means no extension).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::engine::RoutingEngine;
use crate::error::Error;
use crate::method::Method;
use crate::middleware::routing::{AdapterSettings, UrlExtension};
use crate::pattern::{CaseSensitivity, RoutePattern};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    pub url_extension: Option<String>,
    pub handler_path: Option<String>,
    #[serde(default = "default_application_path")]
    pub application_path: String,
    pub static_root: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub supports_custom_request_headers: bool,
    #[serde(default = "default_true")]
    pub case_sensitive: bool,
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    pub name: Option<String>,
    pub template: String,
    #[serde(default)]
    pub verbs: Vec<Method>,
    #[serde(default)]
    pub defaults: HashMap<String, String>,
    #[serde(default)]
    pub constraints: HashMap<String, String>,
    /// Overrides the table-wide `case_sensitive` for this route.
    pub case_sensitive: Option<bool>,
}

fn default_application_path() -> String {
    "/".to_owned()
}

fn default_true() -> bool {
    true
}

impl RoutingConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, Error> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!(path = %path.display(), routes = config.routes.len(), "routing config loaded");
        Ok(config)
    }

    /// Compiles every route, in file order, into a fresh engine.
    pub fn build_engine(&self) -> Result<RoutingEngine, Error> {
        let mut engine = RoutingEngine::new();
        for route in &self.routes {
            engine.add(route.compile(self.case_sensitive)?)?;
        }
        Ok(engine)
    }

    pub fn adapter_settings(&self) -> AdapterSettings {
        let url_extension = match (&self.url_extension, &self.handler_path) {
            (Some(extension), _) => UrlExtension::new(extension.as_str()),
            (None, Some(handler_path)) => UrlExtension::from_handler_path(handler_path),
            (None, None) => UrlExtension::default(),
        };

        AdapterSettings {
            url_extension,
            application_path: self.application_path.clone(),
            static_root: self.static_root.clone(),
            supports_custom_request_headers: self.supports_custom_request_headers,
        }
    }
}

impl RouteConfig {
    fn compile(&self, table_case_sensitive: bool) -> Result<RoutePattern, Error> {
        let case = if self.case_sensitive.unwrap_or(table_case_sensitive) {
            CaseSensitivity::Sensitive
        } else {
            CaseSensitivity::Insensitive
        };

        let mut builder = RoutePattern::builder(self.template.as_str())
            .verbs(self.verbs.iter().copied())
            .case_sensitivity(case);
        if let Some(name) = &self.name {
            builder = builder.name(name.as_str());
        }
        for (key, value) in &self.defaults {
            builder = builder.default(key.as_str(), value.as_str());
        }
        for (key, regex) in &self.constraints {
            builder = builder.constraint(key.as_str(), regex.as_str());
        }
        Ok(builder.build()?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::context::RouteContext;
    use crate::error::ConfigurationError;

    const CONFIG: &str = r#"
        handler_path = "*.rails"
        application_path = "/shop"
        supports_custom_request_headers = false
        case_sensitive = false

        [[routes]]
        name = "product"
        template = "Products/{id}"
        verbs = ["get", "HEAD"]
        defaults = { controller = "products", action = "show" }
        constraints = { id = '\d+' }

        [[routes]]
        template = "{controller}/{action}"
        defaults = { action = "index" }
        case_sensitive = true
    "#;

    #[test]
    fn builds_engine_in_file_order() {
        let config = RoutingConfig::from_toml_str(CONFIG).unwrap();
        let engine = config.build_engine().unwrap();
        assert_eq!(engine.table().len(), 2);

        let ctx = Arc::new(RouteContext::new(Method::Get, "/shop/products/7"));
        let matched = engine.find_match("products/7", ctx).unwrap();
        assert_eq!(matched.name(), Some("product"));
        assert_eq!(matched.controller(), Some("products"));
        assert_eq!(matched.get("id"), Some("7"));

        let ctx = Arc::new(RouteContext::new(Method::Post, "/shop/products/7"));
        let matched = engine.find_match("products/7", ctx).unwrap();
        assert_eq!(matched.route(), "{controller}/{action}");
    }

    #[test]
    fn adapter_settings_follow_the_handler_path() {
        let settings = RoutingConfig::from_toml_str(CONFIG).unwrap().adapter_settings();
        assert_eq!(settings.url_extension.as_str(), ".rails");
        assert_eq!(settings.application_path, "/shop");
        assert!(!settings.supports_custom_request_headers);
        assert_eq!(settings.static_root, None);
    }

    #[test]
    fn defaults_apply_when_omitted() {
        let config = RoutingConfig::from_toml_str("").unwrap();
        let settings = config.adapter_settings();
        assert_eq!(settings.url_extension.as_str(), ".castle");
        assert_eq!(settings.application_path, "/");
        assert!(settings.supports_custom_request_headers);
        assert!(config.build_engine().unwrap().table().is_empty());
    }

    #[test]
    fn invalid_templates_fail_the_build() {
        let config = RoutingConfig::from_toml_str(
            r#"
            [[routes]]
            template = "{controller}/{controller}"
            "#,
        )
        .unwrap();
        let err = config.build_engine().unwrap_err();
        assert!(matches!(
            err,
            Error::Configuration(ConfigurationError::DuplicatePlaceholder { .. })
        ));
    }

    #[test]
    fn unknown_verbs_fail_to_parse() {
        let err = RoutingConfig::from_toml_str(
            r#"
            [[routes]]
            template = "x"
            verbs = ["FETCH"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routes.toml");
        std::fs::write(&path, CONFIG).unwrap();

        let config = RoutingConfig::load(&path).unwrap();
        assert_eq!(config.routes.len(), 2);

        let missing = RoutingConfig::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(missing, Error::Io(_)));
    }
}
