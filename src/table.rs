//! Ordered route table.
//!
//! Registration order is priority: the first route that matches wins, so
//! specific routes must be added before general ones. Routes that start with
//! a literal segment are bucketed by it, which keeps lookups from walking
//! every route once the table grows. Candidates from the buckets and the
//! unbucketed routes are merged back into registration order before
//! matching, so the result is always the one a linear scan would give.

use std::collections::HashMap;

use crate::error::ConfigurationError;
use crate::method::Method;
use crate::pattern::{split_path, CaseSensitivity, Parameters, RoutePattern};

#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<RoutePattern>,
    // leading literal → indices into `routes`, ascending
    exact: HashMap<String, Vec<usize>>,
    // lower-cased leading literal of case-insensitive routes
    folded: HashMap<String, Vec<usize>>,
    // routes starting with a placeholder, or with no segments at all
    generic: Vec<usize>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `pattern` with the lowest priority so far.
    pub fn add(&mut self, pattern: RoutePattern) -> Result<(), ConfigurationError> {
        if let Some(name) = pattern.name() {
            if self.get(name).is_some() {
                return Err(ConfigurationError::DuplicateRouteName(name.to_owned()));
            }
        }

        let index = self.routes.len();
        match (pattern.first_literal(), pattern.case_sensitivity()) {
            (Some(literal), CaseSensitivity::Sensitive) => {
                self.exact.entry(literal.to_owned()).or_default().push(index);
            }
            (Some(literal), CaseSensitivity::Insensitive) => {
                self.folded.entry(literal.to_ascii_lowercase()).or_default().push(index);
            }
            (None, _) => self.generic.push(index),
        }
        self.routes.push(pattern);
        Ok(())
    }

    /// Returns the first route, in registration order, that accepts `method`
    /// and matches `path`. Pass `None` for extension verbs.
    pub fn find_first_match(
        &self,
        path: &str,
        method: impl Into<Option<Method>>,
    ) -> Option<(&RoutePattern, Parameters)> {
        let method = method.into();
        self.candidates(path).into_iter().find_map(|index| {
            let route = &self.routes[index];
            if !route.accepts(method) {
                return None;
            }
            route.try_match(path).map(|params| (route, params))
        })
    }

    pub fn get(&self, name: &str) -> Option<&RoutePattern> {
        self.routes.iter().find(|route| route.name() == Some(name))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Routes in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &RoutePattern> {
        self.routes.iter()
    }

    fn candidates(&self, path: &str) -> Vec<usize> {
        let mut candidates = self.generic.clone();

        if let Some(first) = split_path(path).first() {
            // Literals compare against decoded segments.
            let first = urlencoding::decode(first).map(|s| s.into_owned()).unwrap_or_default();
            if let Some(bucket) = self.exact.get(&first) {
                candidates.extend_from_slice(bucket);
            }
            if let Some(bucket) = self.folded.get(&first.to_ascii_lowercase()) {
                candidates.extend_from_slice(bucket);
            }
        }

        candidates.sort_unstable();
        candidates
    }
}

impl FromIterator<RoutePattern> for Result<RouteTable, ConfigurationError> {
    fn from_iter<T: IntoIterator<Item = RoutePattern>>(iter: T) -> Self {
        let mut table = RouteTable::new();
        for pattern in iter {
            table.add(pattern)?;
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn route(template: &str, name: &str) -> RoutePattern {
        RoutePattern::builder(template).name(name).build().unwrap()
    }

    fn first_name<'a>(table: &'a RouteTable, path: &str) -> Option<&'a str> {
        table.find_first_match(path, Method::Get).and_then(|(route, _)| route.name())
    }

    #[test]
    fn first_registered_route_wins() {
        let mut table = RouteTable::new();
        table.add(route("{controller}/{action}", "general")).unwrap();
        table.add(route("blog/{action}", "blog")).unwrap();

        for _ in 0..3 {
            assert_eq!(first_name(&table, "blog/list"), Some("general"));
        }
    }

    #[test]
    fn specific_routes_registered_first_take_precedence() {
        let mut table = RouteTable::new();
        table.add(route("blog/{action}", "blog")).unwrap();
        table.add(route("{controller}/{action}", "general")).unwrap();

        assert_eq!(first_name(&table, "blog/list"), Some("blog"));
        assert_eq!(first_name(&table, "news/list"), Some("general"));
    }

    #[test]
    fn buckets_preserve_registration_order() {
        let mut table = RouteTable::new();
        table.add(route("{a}/{b}/{c}", "three")).unwrap();
        table.add(route("shop/{b}", "shop-literal")).unwrap();
        table.add(route("{a}/{b}", "two")).unwrap();
        table
            .add(RoutePattern::builder("SHOP/{b}").name("shop-folded").case_insensitive().build().unwrap())
            .unwrap();

        assert_eq!(first_name(&table, "shop/cart"), Some("shop-literal"));
        assert_eq!(first_name(&table, "Shop/cart"), Some("two"));
        assert_eq!(first_name(&table, "x/y/z"), Some("three"));
    }

    #[test]
    fn case_insensitive_bucket_lookup() {
        let mut table = RouteTable::new();
        table
            .add(RoutePattern::builder("Admin/{action}").name("admin").case_insensitive().build().unwrap())
            .unwrap();

        assert_eq!(first_name(&table, "admin/users"), Some("admin"));
        assert_eq!(first_name(&table, "ADMIN/users"), Some("admin"));
    }

    #[test]
    fn no_structural_match_is_none() {
        let mut table = RouteTable::new();
        table.add(route("{controller}/{action}", "general")).unwrap();

        assert!(table.find_first_match("a/b/c", Method::Get).is_none());
        assert!(table.find_first_match("", Method::Get).is_none());
        assert!(RouteTable::new().find_first_match("a/b", Method::Get).is_none());
    }

    #[test]
    fn verb_restricted_routes_are_skipped() {
        let mut table = RouteTable::new();
        table
            .add(RoutePattern::builder("{controller}/{action}").name("post").verbs([Method::Post]).build().unwrap())
            .unwrap();
        table.add(route("{controller}/{action}", "any")).unwrap();

        assert_eq!(
            table.find_first_match("a/b", Method::Post).and_then(|(r, _)| r.name()),
            Some("post")
        );
        assert_eq!(first_name(&table, "a/b"), Some("any"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut table = RouteTable::new();
        table.add(route("a", "dup")).unwrap();
        let err = table.add(route("b", "dup")).unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateRouteName(name) if name == "dup"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn collects_from_patterns() {
        let table: Result<RouteTable, _> = vec![route("a", "a"), route("b", "b")].into_iter().collect();
        let table = table.unwrap();
        let names: Vec<_> = table.iter().filter_map(RoutePattern::name).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(table.get("b").is_some());
    }
}
