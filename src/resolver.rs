//! Dependency ordering and version constraint matching

use regex::Regex;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;
use tracing::warn;

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)(?:\.(\d+))?(?:\.(\d+))?").expect("version pattern is valid")
});

/// `(major, minor, patch)` triple used for constraint matching
///
/// This is a reduced semver: no pre-release tags, no `~`, no `||` ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    /// Parse the first dot-delimited integer groups found; missing groups are 0
    pub fn parse(input: &str) -> Self {
        let Some(captures) = VERSION_PATTERN.captures(input) else {
            return Self::default();
        };

        let group = |index: usize| {
            captures
                .get(index)
                .and_then(|m| m.as_str().parse::<u64>().ok())
                .unwrap_or(0)
        };

        Self {
            major: group(1),
            minor: group(2),
            patch: group(3),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Check `actual` against a `>=`, `^` or exact constraint
pub fn satisfies(actual: &str, constraint: &str) -> bool {
    let constraint = constraint.trim();
    let actual = Version::parse(actual);

    if let Some(minimum) = constraint.strip_prefix(">=") {
        return actual.cmp(&Version::parse(minimum)) != Ordering::Less;
    }

    if let Some(base) = constraint.strip_prefix('^') {
        let base = Version::parse(base);
        return actual.major == base.major
            && (actual.minor > base.minor
                || (actual.minor == base.minor && actual.patch >= base.patch));
    }

    actual == Version::parse(constraint)
}

/// One node of the dependency graph: a plugin and the names it depends on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyNode {
    pub name: String,
    pub dependencies: Vec<String>,
}

impl DependencyNode {
    pub fn new(name: impl Into<String>, dependencies: Vec<String>) -> Self {
        Self {
            name: name.into(),
            dependencies,
        }
    }
}

/// Computes boot and shutdown order from declared dependencies
#[derive(Debug, Clone, Default)]
pub struct DependencyResolver {
    nodes: Vec<DependencyNode>,
}

impl DependencyResolver {
    /// Nodes must be given in registration order; ties are broken by it
    pub fn new(nodes: Vec<DependencyNode>) -> Self {
        Self { nodes }
    }

    /// Depth-first post-order over every node.
    ///
    /// Dependencies on unknown names are ignored. An edge that closes a cycle
    /// is dropped with a warning, so the result always covers every node
    /// exactly once.
    pub fn boot_order(&self) -> Vec<String> {
        let index: HashMap<&str, &DependencyNode> = self
            .nodes
            .iter()
            .map(|node| (node.name.as_str(), node))
            .collect();

        let mut visited = HashSet::new();
        let mut ancestors = HashSet::new();
        let mut order = Vec::with_capacity(self.nodes.len());

        for node in &self.nodes {
            Self::visit(node, &index, &mut visited, &mut ancestors, &mut order);
        }

        order
    }

    /// Exact reverse of [`boot_order`](Self::boot_order)
    pub fn shutdown_order(&self) -> Vec<String> {
        let mut order = self.boot_order();
        order.reverse();
        order
    }

    fn visit<'a>(
        node: &'a DependencyNode,
        index: &HashMap<&str, &'a DependencyNode>,
        visited: &mut HashSet<&'a str>,
        ancestors: &mut HashSet<&'a str>,
        order: &mut Vec<String>,
    ) {
        if visited.contains(node.name.as_str()) {
            return;
        }

        ancestors.insert(node.name.as_str());

        for dependency in &node.dependencies {
            let Some(&target) = index.get(dependency.as_str()) else {
                continue;
            };

            if ancestors.contains(target.name.as_str()) {
                warn!(
                    "Circular dependency detected: {} -> {}, ignoring edge",
                    node.name, target.name
                );
                continue;
            }

            Self::visit(target, index, visited, ancestors, order);
        }

        ancestors.remove(node.name.as_str());
        if visited.insert(node.name.as_str()) {
            order.push(node.name.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn node(name: &str, deps: &[&str]) -> DependencyNode {
        DependencyNode::new(name, deps.iter().map(|d| d.to_string()).collect())
    }

    fn position(order: &[String], name: &str) -> usize {
        order.iter().position(|n| n == name).unwrap()
    }

    #[rstest]
    #[case("2.1.0", ">=2.0.0", true)]
    #[case("1.0.0", ">=2.0.0", false)]
    #[case("2.0.0", ">=2.0.0", true)]
    #[case("1.3.0", "^1.2.0", true)]
    #[case("1.2.5", "^1.2.3", true)]
    #[case("1.2.1", "^1.2.3", false)]
    #[case("2.0.0", "^1.2.0", false)]
    #[case("1.1.9", "^1.2.0", false)]
    #[case("1.2.3", "1.2.3", true)]
    #[case("1.2.4", "1.2.3", false)]
    #[case("1.2", "1.2.0", true)]
    #[case("v3.0.1-beta", ">=3", true)]
    fn test_satisfies(#[case] actual: &str, #[case] constraint: &str, #[case] expected: bool) {
        assert_eq!(satisfies(actual, constraint), expected);
    }

    #[test]
    fn test_version_parsing() {
        assert_eq!(
            Version::parse("10.4"),
            Version {
                major: 10,
                minor: 4,
                patch: 0
            }
        );
        assert_eq!(Version::parse("release-7.1.2").to_string(), "7.1.2");
        assert_eq!(Version::parse("none"), Version::default());
    }

    #[test]
    fn test_dependencies_precede_dependents() {
        let resolver = DependencyResolver::new(vec![
            node("comments", &["blog", "auth"]),
            node("blog", &["auth"]),
            node("auth", &[]),
            node("standalone", &[]),
        ]);

        let order = resolver.boot_order();
        assert_eq!(order.len(), 4);
        assert!(position(&order, "auth") < position(&order, "blog"));
        assert!(position(&order, "blog") < position(&order, "comments"));
        assert_eq!(order, vec!["auth", "blog", "comments", "standalone"]);
    }

    #[test]
    fn test_unknown_dependencies_are_ignored() {
        let resolver = DependencyResolver::new(vec![node("blog", &["missing"])]);
        assert_eq!(resolver.boot_order(), vec!["blog"]);
    }

    #[test]
    fn test_cycles_terminate_with_total_order() {
        let resolver = DependencyResolver::new(vec![
            node("a", &["b"]),
            node("b", &["c"]),
            node("c", &["a"]),
            node("d", &["a"]),
        ]);

        let order = resolver.boot_order();
        assert_eq!(order, vec!["c", "b", "a", "d"]);
    }

    #[test]
    fn test_self_dependency_is_tolerated() {
        let resolver = DependencyResolver::new(vec![node("a", &["a"])]);
        assert_eq!(resolver.boot_order(), vec!["a"]);
    }

    #[test]
    fn test_shutdown_order_is_reverse() {
        let resolver =
            DependencyResolver::new(vec![node("p2", &["p1"]), node("p1", &[]), node("p3", &[])]);

        let mut boot = resolver.boot_order();
        let shutdown = resolver.shutdown_order();
        boot.reverse();
        assert_eq!(shutdown, boot);
    }
}
