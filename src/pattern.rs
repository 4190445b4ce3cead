//! Route templates.
//!
//! A template is a `/`-separated list of segments. Each segment is one of:
//!
//! | Segment      | Matches                                              |
//! |--------------|------------------------------------------------------|
//! | `products`   | exactly that text                                    |
//! | `{id}`       | any one non-empty segment, captured as `id`          |
//! | `{*path}`    | the rest of the path, captured as `path` (last only) |
//!
//! Placeholders may carry a default (which also lets trailing placeholders
//! be left out of the request path) and a regex constraint that the
//! captured value must satisfy in full.

use std::collections::{HashMap, HashSet};

use regex::Regex;

use crate::error::ConfigurationError;
use crate::method::Method;

/// Parameter names mapped to the values a route produced.
pub type Parameters = HashMap<String, String>;

/// How literal segments compare against the request path.
///
/// Placeholders always capture values as written.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CaseSensitivity {
    #[default]
    Sensitive,
    Insensitive,
}

#[derive(Clone, Debug)]
enum Segment {
    Literal(String),
    Placeholder(String),
    Wildcard(String),
}

impl Segment {
    fn placeholder_name(&self) -> Option<&str> {
        match self {
            Self::Literal(_) => None,
            Self::Placeholder(name) | Self::Wildcard(name) => Some(name.as_str()),
        }
    }
}

/// A compiled route template. Immutable once built.
#[derive(Clone, Debug)]
pub struct RoutePattern {
    template: String,
    name: Option<String>,
    segments: Vec<Segment>,
    defaults: Parameters,
    constraints: HashMap<String, Regex>,
    verbs: Vec<Method>,
    case: CaseSensitivity,
}

impl RoutePattern {
    /// Compiles `template` with the given defaults and constraints.
    ///
    /// ```rust
    /// use switchyard::RoutePattern;
    ///
    /// let pattern = RoutePattern::compile(
    ///     "products/{id}",
    ///     [("controller", "products"), ("action", "show")],
    ///     [("id", r"\d+")],
    /// ).unwrap();
    ///
    /// assert!(pattern.try_match("products/42").is_some());
    /// assert!(pattern.try_match("products/abc").is_none());
    /// ```
    pub fn compile<D, C, K, V>(
        template: &str,
        defaults: D,
        constraints: C,
    ) -> Result<Self, ConfigurationError>
    where
        D: IntoIterator<Item = (K, V)>,
        C: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut builder = Self::builder(template);
        for (key, value) in defaults {
            builder = builder.default(key, value);
        }
        for (key, value) in constraints {
            builder = builder.constraint(key, value);
        }
        builder.build()
    }

    pub fn builder(template: impl Into<String>) -> RoutePatternBuilder {
        RoutePatternBuilder {
            template: template.into(),
            name: None,
            defaults: Parameters::new(),
            constraints: Vec::new(),
            verbs: Vec::new(),
            case: CaseSensitivity::default(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn defaults(&self) -> &Parameters {
        &self.defaults
    }

    pub fn case_sensitivity(&self) -> CaseSensitivity {
        self.case
    }

    /// Verbs this route is restricted to. Empty means any verb.
    pub fn verbs(&self) -> &[Method] {
        &self.verbs
    }

    /// Placeholder names in template order.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(Segment::placeholder_name)
    }

    /// The leading literal segment, if the template starts with one.
    pub(crate) fn first_literal(&self) -> Option<&str> {
        match self.segments.first() {
            Some(Segment::Literal(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Whether a request with `method` may use this route. `None` stands for
    /// an extension verb (`PROPFIND`, `PURGE`), which only routes without a
    /// verb list accept.
    pub fn accepts(&self, method: impl Into<Option<Method>>) -> bool {
        match method.into() {
            Some(method) => self.verbs.is_empty() || self.verbs.contains(&method),
            None => self.verbs.is_empty(),
        }
    }

    /// Matches `path` segment by segment.
    ///
    /// Returns the captured placeholders plus every default, or `None` when
    /// the path has a different shape, a literal differs, a constraint is
    /// violated, or a segment is not valid percent-encoded UTF-8. A
    /// placeholder never captures a `/`, encoded or not; only wildcards span
    /// segments.
    pub fn try_match(&self, path: &str) -> Option<Parameters> {
        let parts = split_path(path);
        let ends_with_wildcard = matches!(self.segments.last(), Some(Segment::Wildcard(_)));
        if parts.len() > self.segments.len() && !ends_with_wildcard {
            return None;
        }

        let mut params = Parameters::new();
        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(text) => {
                    let part = decode(parts.get(index)?)?;
                    if !self.literal_eq(text, &part) {
                        return None;
                    }
                }
                Segment::Placeholder(name) => {
                    let value = match parts.get(index) {
                        Some(part) => {
                            let value = decode(part)?;
                            if value.is_empty() || value.contains('/') || !self.satisfies(name, &value) {
                                return None;
                            }
                            value
                        }
                        None => self.defaults.get(name)?.clone(),
                    };
                    params.insert(name.clone(), value);
                }
                Segment::Wildcard(name) => {
                    let value = match parts.get(index..).filter(|rest| !rest.is_empty()) {
                        Some(rest) => {
                            let value = rest
                                .iter()
                                .map(|part| decode(part))
                                .collect::<Option<Vec<_>>>()?
                                .join("/");
                            if value.is_empty() || !self.satisfies(name, &value) {
                                return None;
                            }
                            value
                        }
                        None => self.defaults.get(name)?.clone(),
                    };
                    params.insert(name.clone(), value);
                }
            }
        }

        for (key, value) in &self.defaults {
            params.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Some(params)
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.try_match(path).is_some()
    }

    /// Builds a path (starting with `/`) that this route would match.
    ///
    /// Values come from `params`, falling back to defaults. Trailing
    /// placeholders left at their default are omitted.
    pub fn create_url(&self, params: &Parameters) -> Result<String, ConfigurationError> {
        // (encoded segment, may be dropped from the tail)
        let mut parts: Vec<(String, bool)> = Vec::with_capacity(self.segments.len());

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => parts.push((text.clone(), false)),
                Segment::Placeholder(name) => {
                    let value = self.url_value(name, params)?;
                    parts.push((urlencoding::encode(value).into_owned(), self.is_default(name, value)));
                }
                Segment::Wildcard(name) => {
                    let value = self.url_value(name, params)?;
                    let encoded = value
                        .split('/')
                        .map(|part| urlencoding::encode(part).into_owned())
                        .collect::<Vec<_>>()
                        .join("/");
                    parts.push((encoded, self.is_default(name, value)));
                }
            }
        }

        while parts.last().is_some_and(|(_, omittable)| *omittable) {
            parts.pop();
        }

        let path = parts.into_iter().map(|(part, _)| part).collect::<Vec<_>>().join("/");
        Ok(format!("/{path}"))
    }

    fn url_value<'a>(&'a self, name: &str, params: &'a Parameters) -> Result<&'a str, ConfigurationError> {
        let value = params
            .get(name)
            .or_else(|| self.defaults.get(name))
            .map(String::as_str)
            .filter(|value| !value.is_empty() || self.is_default(name, value))
            .ok_or_else(|| ConfigurationError::MissingUrlParameter {
                template: self.template.clone(),
                name: name.to_owned(),
            })?;

        // Defaults are trusted as written.
        if !self.is_default(name, value) && !self.satisfies(name, value) {
            return Err(ConfigurationError::UrlConstraintViolation {
                template: self.template.clone(),
                name: name.to_owned(),
                value: value.to_owned(),
            });
        }
        Ok(value)
    }

    fn is_default(&self, name: &str, value: &str) -> bool {
        self.defaults.get(name).is_some_and(|default| default == value)
    }

    fn literal_eq(&self, literal: &str, part: &str) -> bool {
        match self.case {
            CaseSensitivity::Sensitive => literal == part,
            CaseSensitivity::Insensitive => literal.eq_ignore_ascii_case(part),
        }
    }

    fn satisfies(&self, name: &str, value: &str) -> bool {
        self.constraints.get(name).is_none_or(|regex| regex.is_match(value))
    }
}

/// Collects the parts of a [`RoutePattern`]. Obtain via [`RoutePattern::builder`].
#[derive(Debug)]
pub struct RoutePatternBuilder {
    template: String,
    name: Option<String>,
    defaults: Parameters,
    constraints: Vec<(String, String)>,
    verbs: Vec<Method>,
    case: CaseSensitivity,
}

impl RoutePatternBuilder {
    /// Names the route so URLs can be generated from it.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn default(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }

    /// Restricts placeholder `key` to values matching `regex` in full.
    pub fn constraint(mut self, key: impl Into<String>, regex: impl Into<String>) -> Self {
        self.constraints.push((key.into(), regex.into()));
        self
    }

    pub fn verbs(mut self, verbs: impl IntoIterator<Item = Method>) -> Self {
        for verb in verbs {
            if !self.verbs.contains(&verb) {
                self.verbs.push(verb);
            }
        }
        self
    }

    pub fn case_sensitivity(mut self, case: CaseSensitivity) -> Self {
        self.case = case;
        self
    }

    pub fn case_insensitive(self) -> Self {
        self.case_sensitivity(CaseSensitivity::Insensitive)
    }

    pub fn build(self) -> Result<RoutePattern, ConfigurationError> {
        let segments = parse_template(&self.template)?;

        let mut constraints = HashMap::with_capacity(self.constraints.len());
        for (name, pattern) in self.constraints {
            if !segments.iter().any(|s| s.placeholder_name() == Some(name.as_str())) {
                return Err(ConfigurationError::UnknownConstraint {
                    template: self.template,
                    name,
                });
            }
            let regex = match Regex::new(&format!("^(?:{pattern})$")) {
                Ok(regex) => regex,
                Err(source) => {
                    return Err(ConfigurationError::InvalidConstraint {
                        template: self.template,
                        name,
                        source,
                    });
                }
            };
            constraints.insert(name, regex);
        }

        Ok(RoutePattern {
            template: self.template,
            name: self.name,
            segments,
            defaults: self.defaults,
            constraints,
            verbs: self.verbs,
            case: self.case,
        })
    }
}

// ── Template parsing ──────────────────────────────────────────────────────────

fn parse_template(template: &str) -> Result<Vec<Segment>, ConfigurationError> {
    let trimmed = template.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let parts: Vec<&str> = trimmed.split('/').collect();
    let last = parts.len() - 1;
    let mut seen = HashSet::new();
    let mut segments = Vec::with_capacity(parts.len());

    for (index, part) in parts.into_iter().enumerate() {
        let segment = parse_segment(template, part)?;
        if matches!(segment, Segment::Wildcard(_)) && index != last {
            return Err(ConfigurationError::template(
                template,
                "a wildcard placeholder must be the last segment",
            ));
        }
        if let Some(name) = segment.placeholder_name() {
            if !seen.insert(name.to_owned()) {
                return Err(ConfigurationError::DuplicatePlaceholder {
                    template: template.to_owned(),
                    name: name.to_owned(),
                });
            }
        }
        segments.push(segment);
    }
    Ok(segments)
}

fn parse_segment(template: &str, part: &str) -> Result<Segment, ConfigurationError> {
    if part.is_empty() {
        return Err(ConfigurationError::template(template, "empty path segment"));
    }

    let opens = part.matches('{').count();
    let closes = part.matches('}').count();
    if opens == 0 && closes == 0 {
        return Ok(Segment::Literal(part.to_owned()));
    }
    if opens != closes {
        return Err(ConfigurationError::template(
            template,
            format!("unbalanced braces in `{part}`"),
        ));
    }
    if opens > 1 {
        return Err(ConfigurationError::template(
            template,
            format!("`{part}` holds more than one placeholder"),
        ));
    }

    let Some(inner) = part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) else {
        return Err(ConfigurationError::template(
            template,
            format!("placeholder `{part}` must span the whole segment"),
        ));
    };

    let (wildcard, name) = match inner.strip_prefix('*') {
        Some(name) => (true, name),
        None => (false, inner),
    };
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ConfigurationError::template(
            template,
            format!("invalid placeholder name `{inner}`"),
        ));
    }

    Ok(if wildcard {
        Segment::Wildcard(name.to_owned())
    } else {
        Segment::Placeholder(name.to_owned())
    })
}

pub(crate) fn split_path(path: &str) -> Vec<&str> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

fn decode(part: &str) -> Option<String> {
    urlencoding::decode(part).ok().map(|value| value.into_owned())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Parameters {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn pattern(template: &str) -> RoutePattern {
        RoutePattern::builder(template).build().unwrap()
    }

    #[test]
    fn captures_controller_and_action() {
        let matched = pattern("{controller}/{action}").try_match("controller2/Action1");
        assert_eq!(
            matched,
            Some(params(&[("controller", "controller2"), ("action", "Action1")]))
        );
    }

    #[test]
    fn captures_area_controller_and_action() {
        let matched = pattern("{area}/{controller}/{action}").try_match("/area/controller1/Index");
        assert_eq!(
            matched,
            Some(params(&[("area", "area"), ("controller", "controller1"), ("action", "Index")]))
        );
    }

    #[test]
    fn literal_segments_must_match_exactly() {
        let p = pattern("blog/{action}");
        assert!(p.is_match("blog/list"));
        assert!(!p.is_match("Blog/list"));
        assert!(!p.is_match("news/list"));
    }

    #[test]
    fn case_insensitive_literals() {
        let p = RoutePattern::builder("blog/{action}").case_insensitive().build().unwrap();
        assert_eq!(p.try_match("BLOG/List"), Some(params(&[("action", "List")])));
    }

    #[test]
    fn segment_count_must_agree() {
        let p = pattern("{controller}/{action}");
        assert!(!p.is_match("home"));
        assert!(!p.is_match("home/index/extra"));
        assert!(!p.is_match(""));
    }

    #[test]
    fn empty_template_matches_root_only() {
        let p = RoutePattern::compile("", [("controller", "home"), ("action", "index")], []).unwrap();
        assert_eq!(
            p.try_match("/"),
            Some(params(&[("controller", "home"), ("action", "index")]))
        );
        assert!(!p.is_match("/home"));
    }

    #[test]
    fn empty_segments_never_fill_a_placeholder() {
        assert!(!pattern("{controller}/{action}").is_match("home//index"));
    }

    #[test]
    fn defaults_fill_omitted_trailing_placeholders() {
        let p = RoutePattern::compile("{controller}/{action}/{id}", [("action", "index"), ("id", "0")], [])
            .unwrap();
        assert_eq!(
            p.try_match("home"),
            Some(params(&[("controller", "home"), ("action", "index"), ("id", "0")]))
        );
        assert_eq!(
            p.try_match("home/edit"),
            Some(params(&[("controller", "home"), ("action", "edit"), ("id", "0")]))
        );
    }

    #[test]
    fn leading_placeholder_without_default_is_required() {
        let p = RoutePattern::compile("{controller}/{action}", [("action", "index")], []).unwrap();
        assert!(!p.is_match("/"));
    }

    #[test]
    fn literals_cannot_be_omitted() {
        let p = RoutePattern::compile("{controller}/{action}/list", [("action", "index")], []).unwrap();
        assert!(!p.is_match("home"));
    }

    #[test]
    fn defaults_outside_the_template_are_added() {
        let p = RoutePattern::compile("products/{id}", [("controller", "products"), ("action", "show")], [])
            .unwrap();
        assert_eq!(
            p.try_match("products/7"),
            Some(params(&[("controller", "products"), ("action", "show"), ("id", "7")]))
        );
    }

    #[test]
    fn captured_values_override_defaults() {
        let p = RoutePattern::compile("{controller}/{action}", [("action", "index")], []).unwrap();
        assert_eq!(p.try_match("home/about").unwrap()["action"], "about");
    }

    #[test]
    fn constraint_violation_is_no_match() {
        let p = RoutePattern::compile("products/{id}", Vec::<(&str, &str)>::new(), [("id", r"\d+")]).unwrap();
        assert!(p.is_match("products/123"));
        assert!(!p.is_match("products/12a"));
        assert!(!p.is_match("products/a12"));
    }

    #[test]
    fn constraints_are_anchored() {
        let p = RoutePattern::compile("{year}", Vec::<(&str, &str)>::new(), [("year", r"\d{4}|now")]).unwrap();
        assert!(p.is_match("2024"));
        assert!(p.is_match("now"));
        assert!(!p.is_match("20245"));
        assert!(!p.is_match("nowhere"));
    }

    #[test]
    fn wildcard_captures_the_remainder() {
        let p = pattern("files/{*path}");
        assert_eq!(
            p.try_match("files/docs/2024/report.pdf"),
            Some(params(&[("path", "docs/2024/report.pdf")]))
        );
        assert_eq!(p.try_match("files/a"), Some(params(&[("path", "a")])));
        assert!(!p.is_match("files"));
    }

    #[test]
    fn wildcard_with_default_may_be_empty() {
        let p = RoutePattern::compile("files/{*path}", [("path", "index")], []).unwrap();
        assert_eq!(p.try_match("files"), Some(params(&[("path", "index")])));
    }

    #[test]
    fn captured_segments_are_percent_decoded() {
        let p = pattern("tags/{tag}");
        assert_eq!(p.try_match("tags/rust%20lang"), Some(params(&[("tag", "rust lang")])));
        assert!(!p.is_match("tags/%FF"));
    }

    #[test]
    fn encoded_slash_does_not_fill_a_placeholder() {
        let p = pattern("{controller}/{action}");
        assert!(!p.is_match("admin%2Fusers/list"));
        assert!(!p.is_match("admin%2fusers/list"));

        let files = pattern("files/{*path}");
        assert_eq!(files.try_match("files/a%2Fb"), Some(params(&[("path", "a/b")])));
    }

    #[test]
    fn verbs_restrict_acceptance() {
        let any = pattern("{controller}");
        assert!(any.accepts(Method::Delete));

        let post_only = RoutePattern::builder("{controller}").verbs([Method::Post]).build().unwrap();
        assert!(post_only.accepts(Method::Post));
        assert!(!post_only.accepts(Method::Get));

        let extension_verb: Option<Method> = None;
        assert!(any.accepts(extension_verb));
        assert!(!post_only.accepts(extension_verb));
    }

    #[test]
    fn rejects_unbalanced_braces() {
        for template in ["{controller/{action}", "{controller}}/x", "home/{action"] {
            assert!(
                matches!(RoutePattern::builder(template).build(), Err(ConfigurationError::Template { .. })),
                "{template}"
            );
        }
    }

    #[test]
    fn rejects_partial_and_nested_placeholders() {
        for template in ["item-{id}", "{id}.html", "{{id}}", "{a}{b}", "}{"] {
            assert!(
                matches!(RoutePattern::builder(template).build(), Err(ConfigurationError::Template { .. })),
                "{template}"
            );
        }
    }

    #[test]
    fn rejects_duplicate_placeholders() {
        let err = RoutePattern::builder("{id}/{action}/{id}").build().unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicatePlaceholder { name, .. } if name == "id"));
    }

    #[test]
    fn rejects_bad_placeholder_names() {
        for template in ["{}", "{*}", "{my-name}", "{a b}"] {
            assert!(RoutePattern::builder(template).build().is_err(), "{template}");
        }
    }

    #[test]
    fn rejects_interior_wildcards_and_empty_segments() {
        assert!(RoutePattern::builder("{*rest}/edit").build().is_err());
        assert!(RoutePattern::builder("a//b").build().is_err());
    }

    #[test]
    fn rejects_constraints_on_unknown_placeholders() {
        let err = RoutePattern::builder("{controller}").constraint("id", r"\d+").build().unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownConstraint { name, .. } if name == "id"));
    }

    #[test]
    fn rejects_invalid_constraint_regex() {
        let err = RoutePattern::builder("{id}").constraint("id", "(").build().unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidConstraint { .. }));
    }

    #[test]
    fn placeholders_in_template_order() {
        let p = pattern("{area}/x/{controller}/{*rest}");
        let names: Vec<_> = p.placeholders().collect();
        assert_eq!(names, vec!["area", "controller", "rest"]);
    }

    #[test]
    fn creates_urls_from_parameters() {
        let p = pattern("{area}/{controller}/{action}");
        let url = p
            .create_url(&params(&[("area", "admin"), ("controller", "users"), ("action", "list")]))
            .unwrap();
        assert_eq!(url, "/admin/users/list");
    }

    #[test]
    fn create_url_drops_trailing_defaults() {
        let p = RoutePattern::compile("{controller}/{action}/{id}", [("action", "index"), ("id", "0")], [])
            .unwrap();
        assert_eq!(p.create_url(&params(&[("controller", "home")])).unwrap(), "/home");
        assert_eq!(
            p.create_url(&params(&[("controller", "home"), ("id", "5")])).unwrap(),
            "/home/index/5"
        );
    }

    #[test]
    fn create_url_encodes_values() {
        let p = pattern("tags/{tag}/{*rest}");
        let url = p.create_url(&params(&[("tag", "a b"), ("rest", "x/y z")])).unwrap();
        assert_eq!(url, "/tags/a%20b/x/y%20z");
    }

    #[test]
    fn create_url_requires_values() {
        let err = pattern("{controller}/{action}")
            .create_url(&params(&[("controller", "home")]))
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingUrlParameter { name, .. } if name == "action"));
    }

    #[test]
    fn create_url_checks_constraints() {
        let p = RoutePattern::compile("products/{id}", Vec::<(&str, &str)>::new(), [("id", r"\d+")]).unwrap();
        let err = p.create_url(&params(&[("id", "abc")])).unwrap_err();
        assert!(matches!(err, ConfigurationError::UrlConstraintViolation { .. }));
    }
}
