//! The path matcher.
//!
//! Every HTTP method owns a tree of path segments. A node has literal children keyed by the
//! segment text, at most one `:name` wildcard child and at most one `*name` catch-all leaf.
//! Lookup cost is proportional to the depth of the path, not to the number of routes.

use crate::types::RouteParams;
use crate::Error;
use http::Method;
use std::collections::HashMap;

/// The end of a registered pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Leaf {
    /// Index of the route in the router's route list.
    pub(crate) route: usize,
    /// Wildcard names in the order they appear in the pattern.
    pub(crate) params: Vec<String>,
}

#[derive(Debug, Default)]
struct Node {
    children: HashMap<String, Node>,
    wildcard: Option<Box<Node>>,
    catch_all: Option<Leaf>,
    leaf: Option<Leaf>,
}

/// A successful lookup.
#[derive(Debug)]
pub(crate) struct RouteMatch<'a> {
    pub(crate) leaf: &'a Leaf,
    pub(crate) params: RouteParams,
}

#[derive(Debug)]
pub(crate) enum RouteLookup<'a> {
    Found(RouteMatch<'a>),
    /// The path exists, but only for other methods.
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

enum Segment<'p> {
    Literal(&'p str),
    Wildcard(&'p str),
    CatchAll(&'p str),
}

fn parse_segment(seg: &str) -> Segment<'_> {
    if let Some(name) = seg.strip_prefix(':') {
        Segment::Wildcard(name)
    } else if let Some(name) = seg.strip_prefix('*') {
        Segment::CatchAll(name)
    } else {
        Segment::Literal(seg)
    }
}

pub(crate) fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|seg| !seg.is_empty())
}

/// Returns the wildcard names of a pattern, left to right.
pub(crate) fn pattern_params(pattern: &str) -> Vec<String> {
    split_path(pattern)
        .filter_map(|seg| match parse_segment(seg) {
            Segment::Wildcard(name) | Segment::CatchAll(name) => Some(name.to_owned()),
            Segment::Literal(_) => None,
        })
        .collect()
}

#[derive(Debug, Default)]
pub(crate) struct RouteTree {
    trees: HashMap<Method, Node>,
}

impl RouteTree {
    pub(crate) fn new() -> RouteTree {
        RouteTree::default()
    }

    /// Registers `pattern` for `method` and records `route` at its leaf.
    pub(crate) fn insert(&mut self, method: Method, pattern: &str, route: usize) -> crate::Result<&Leaf> {
        let invalid = |reason: &str| Error::InvalidPattern {
            pattern: pattern.to_owned(),
            reason: reason.to_owned(),
        };

        let segments = split_path(pattern).collect::<Vec<_>>();
        let mut params = Vec::new();
        let mut node = self.trees.entry(method.clone()).or_default();

        for (idx, seg) in segments.iter().enumerate() {
            match parse_segment(seg) {
                Segment::Literal(lit) => {
                    node = node.children.entry(lit.to_owned()).or_default();
                }
                Segment::Wildcard(name) => {
                    if name.is_empty() {
                        return Err(invalid("wildcard segment without a name").into());
                    }
                    params.push(name.to_owned());
                    node = &mut **node.wildcard.get_or_insert_with(Box::default);
                }
                Segment::CatchAll(name) => {
                    if name.is_empty() {
                        return Err(invalid("catch-all segment without a name").into());
                    }
                    if idx + 1 != segments.len() {
                        return Err(invalid("catch-all segment must be the last segment").into());
                    }
                    params.push(name.to_owned());
                    if node.catch_all.is_some() {
                        return Err(duplicate(method, pattern));
                    }
                    return Ok(node.catch_all.insert(Leaf { route, params }));
                }
            }
        }

        if node.leaf.is_some() {
            return Err(duplicate(method, pattern));
        }
        Ok(node.leaf.insert(Leaf { route, params }))
    }

    /// Resolves `method` + the decoded path `segments` to a leaf and its positional parameter
    /// values.
    ///
    /// `HEAD` requests fall back to the `GET` tree. Any other method only sees its own tree;
    /// when the path is registered under different methods the lookup reports them instead of
    /// matching.
    pub(crate) fn find<S: AsRef<str>>(&self, method: &Method, segments: &[S]) -> RouteLookup<'_> {
        let segments = segments.iter().map(AsRef::as_ref).collect::<Vec<&str>>();

        if let Some(found) = self.find_in(method, &segments) {
            return RouteLookup::Found(found);
        }

        if *method == Method::HEAD {
            if let Some(found) = self.find_in(&Method::GET, &segments) {
                return RouteLookup::Found(found);
            }
        }

        let mut allowed = self
            .trees
            .iter()
            .filter(|(m, _)| *m != method)
            .filter(|(_, root)| {
                let mut values = Vec::new();
                walk(root, &segments, &mut values).is_some()
            })
            .map(|(m, _)| m.clone())
            .collect::<Vec<_>>();

        if allowed.is_empty() {
            return RouteLookup::NotFound;
        }

        if allowed.contains(&Method::GET) && !allowed.contains(&Method::HEAD) {
            allowed.push(Method::HEAD);
        }
        allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        RouteLookup::MethodNotAllowed(allowed)
    }

    fn find_in(&self, method: &Method, segments: &[&str]) -> Option<RouteMatch<'_>> {
        let root = self.trees.get(method)?;
        let mut values = Vec::with_capacity(segments.len());
        let leaf = walk(root, segments, &mut values)?;

        let mut params = RouteParams::with_capacity(leaf.params.len());
        for (name, value) in leaf.params.iter().zip(values) {
            params.set(name.as_str(), value);
        }

        Some(RouteMatch { leaf, params })
    }
}

fn duplicate(method: Method, pattern: &str) -> crate::RouteError {
    Error::DuplicateRoute {
        method,
        pattern: pattern.to_owned(),
    }
    .into()
}

// Depth-first walk: literal edge first, then the wildcard edge, then the catch-all leaf.
// Captured values are pushed on `values` and popped again when a branch dead-ends.
fn walk<'n>(node: &'n Node, segments: &[&str], values: &mut Vec<String>) -> Option<&'n Leaf> {
    let Some((seg, rest)) = segments.split_first() else {
        return node.leaf.as_ref();
    };

    if let Some(child) = node.children.get(*seg) {
        if let Some(leaf) = walk(child, rest, values) {
            return Some(leaf);
        }
    }

    if let Some(child) = node.wildcard.as_deref() {
        values.push((*seg).to_owned());
        if let Some(leaf) = walk(child, rest, values) {
            return Some(leaf);
        }
        values.pop();
    }

    if let Some(leaf) = node.catch_all.as_ref() {
        values.push(segments.join("/"));
        return Some(leaf);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(path: &str) -> Vec<&str> {
        split_path(path).collect()
    }

    fn found<'a>(lookup: RouteLookup<'a>) -> RouteMatch<'a> {
        match lookup {
            RouteLookup::Found(m) => m,
            other => panic!("expected a match, got {:?}", other),
        }
    }

    #[test]
    fn should_match_literal_paths_without_params() {
        let mut tree = RouteTree::new();
        tree.insert(Method::GET, "/", 0).unwrap();
        tree.insert(Method::GET, "/about", 1).unwrap();
        tree.insert(Method::GET, "/admin/users", 2).unwrap();

        for (path, route) in [("/", 0), ("/about", 1), ("/admin/users", 2), ("/admin/users/", 2)] {
            let m = found(tree.find(&Method::GET, &segments(path)));
            assert_eq!(m.leaf.route, route);
            assert!(m.params.is_empty());
        }
    }

    #[test]
    fn should_capture_params_in_declaration_order() {
        let mut tree = RouteTree::new();
        let leaf = tree.insert(Method::GET, "/users/:id/:action", 0).unwrap();
        assert_eq!(leaf.params, vec!["id".to_owned(), "action".to_owned()]);

        let m = found(tree.find(&Method::GET, &segments("/users/7/edit")));
        assert_eq!(m.params.iter().collect::<Vec<_>>(), vec![("id", "7"), ("action", "edit")]);
    }

    #[test]
    fn should_prefer_literal_over_wildcard() {
        let mut tree = RouteTree::new();
        tree.insert(Method::GET, "/users/:id", 0).unwrap();
        tree.insert(Method::GET, "/users/new", 1).unwrap();

        assert_eq!(found(tree.find(&Method::GET, &segments("/users/new"))).leaf.route, 1);
        let m = found(tree.find(&Method::GET, &segments("/users/42")));
        assert_eq!(m.leaf.route, 0);
        assert_eq!(m.params.get("id").map(String::as_str), Some("42"));
    }

    #[test]
    fn should_capture_segment_containing_slash() {
        let mut tree = RouteTree::new();
        tree.insert(Method::GET, "/files/:name", 0).unwrap();

        let m = found(tree.find(&Method::GET, &["files", "a/b"]));
        assert_eq!(m.params.get("name").map(String::as_str), Some("a/b"));
    }

    #[test]
    fn should_backtrack_into_wildcard_when_literal_dead_ends() {
        let mut tree = RouteTree::new();
        tree.insert(Method::GET, "/a/b", 0).unwrap();
        tree.insert(Method::GET, "/a/:x/c", 1).unwrap();

        let m = found(tree.find(&Method::GET, &segments("/a/b/c")));
        assert_eq!(m.leaf.route, 1);
        assert_eq!(m.params.get("x").map(String::as_str), Some("b"));
    }

    #[test]
    fn should_keep_wildcard_names_per_leaf() {
        let mut tree = RouteTree::new();
        tree.insert(Method::GET, "/u/:id", 0).unwrap();
        tree.insert(Method::GET, "/u/:name/posts", 1).unwrap();

        assert!(found(tree.find(&Method::GET, &segments("/u/9"))).params.has("id"));
        assert!(found(tree.find(&Method::GET, &segments("/u/bob/posts"))).params.has("name"));
    }

    #[test]
    fn should_not_match_prefixes_or_longer_paths() {
        let mut tree = RouteTree::new();
        tree.insert(Method::GET, "/users/:id", 0).unwrap();

        assert!(matches!(tree.find(&Method::GET, &segments("/users")), RouteLookup::NotFound));
        assert!(matches!(tree.find(&Method::GET, &segments("/users/1/2")), RouteLookup::NotFound));
        assert!(matches!(tree.find(&Method::GET, &segments("/nothing")), RouteLookup::NotFound));
    }

    #[test]
    fn should_match_catch_all_last() {
        let mut tree = RouteTree::new();
        tree.insert(Method::GET, "/public/*file", 0).unwrap();
        tree.insert(Method::GET, "/public/index.html", 1).unwrap();

        assert_eq!(found(tree.find(&Method::GET, &segments("/public/index.html"))).leaf.route, 1);
        let m = found(tree.find(&Method::GET, &segments("/public/css/site.css")));
        assert_eq!(m.leaf.route, 0);
        assert_eq!(m.params.get("file").map(String::as_str), Some("css/site.css"));
        assert!(matches!(tree.find(&Method::GET, &segments("/public")), RouteLookup::NotFound));
    }

    #[test]
    fn should_keep_methods_independent() {
        let mut tree = RouteTree::new();
        tree.insert(Method::GET, "/items/:id", 0).unwrap();
        tree.insert(Method::DELETE, "/items/:id", 1).unwrap();

        assert_eq!(found(tree.find(&Method::GET, &segments("/items/1"))).leaf.route, 0);
        assert_eq!(found(tree.find(&Method::DELETE, &segments("/items/1"))).leaf.route, 1);
    }

    #[test]
    fn should_serve_head_from_get_tree() {
        let mut tree = RouteTree::new();
        tree.insert(Method::GET, "/ping", 0).unwrap();
        assert_eq!(found(tree.find(&Method::HEAD, &segments("/ping"))).leaf.route, 0);
    }

    #[test]
    fn should_not_fall_back_to_get_for_other_methods() {
        let mut tree = RouteTree::new();
        tree.insert(Method::GET, "/ping", 0).unwrap();
        tree.insert(Method::POST, "/ping", 1).unwrap();

        let custom = Method::from_bytes(b"PURGE").unwrap();
        match tree.find(&custom, &segments("/ping")) {
            RouteLookup::MethodNotAllowed(allowed) => {
                assert_eq!(allowed, vec![Method::GET, Method::HEAD, Method::POST]);
            }
            other => panic!("expected 405, got {:?}", other),
        }
        assert!(matches!(tree.find(&Method::PUT, &segments("/missing")), RouteLookup::NotFound));
    }

    #[test]
    fn should_reject_duplicates_and_bad_patterns() {
        let mut tree = RouteTree::new();
        tree.insert(Method::GET, "/a/:id", 0).unwrap();
        assert!(tree.insert(Method::GET, "/a/:other", 1).is_err());
        assert!(tree.insert(Method::POST, "/a/:id", 2).is_ok());
        assert!(tree.insert(Method::GET, "/b/:", 3).is_err());
        assert!(tree.insert(Method::GET, "/c/*rest/d", 4).is_err());
    }

    #[test]
    fn should_handle_thousands_of_routes() {
        let mut tree = RouteTree::new();
        let mut idx = 0;
        for ns in ["admin", "api", "site"] {
            for res in 0..200 {
                tree.insert(Method::GET, &format!("/{}/r{}", ns, res), idx).unwrap();
                tree.insert(Method::PUT, &format!("/{}/r{}/:id", ns, res), idx + 1).unwrap();
                idx += 2;
            }
        }

        let m = found(tree.find(&Method::PUT, &segments("/api/r150/3937")));
        assert_eq!(m.params.get("id").map(String::as_str), Some("3937"));
    }
}
