use std::fmt;

use serde::{Serialize, Serializer};

use super::error::ModelError;

/// How the aggregator decides that one id contains another.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ContainmentRule {
    /// Either id occurs anywhere inside the other. `"ab"` and `"a.ab"` are
    /// treated as related.
    #[default]
    Substring,
    /// One id is the other, or a whole-segment ancestor of it.
    PathPrefix,
}

/// `"a.b.c"` -> `["a", "a.b", "a.b.c"]`.
pub fn ancestor_chain(id: &str, separator: &str) -> Vec<String> {
    let mut chain = Vec::new();
    let mut end = 0;
    for (index, segment) in id.split(separator).enumerate() {
        if index > 0 {
            end += separator.len();
        }
        end += segment.len();
        chain.push(id[..end].to_owned());
    }
    chain
}

pub fn last_segment<'a>(id: &'a str, separator: &str) -> &'a str {
    id.rsplit(separator).next().unwrap_or(id)
}

pub fn is_contained(a: &str, b: &str, separator: &str, rule: ContainmentRule) -> bool {
    match rule {
        ContainmentRule::Substring => a.contains(b) || b.contains(a),
        ContainmentRule::PathPrefix => {
            is_path_prefix(a, b, separator) || is_path_prefix(b, a, separator)
        }
    }
}

fn is_path_prefix(prefix: &str, id: &str, separator: &str) -> bool {
    id == prefix
        || id
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with(separator))
}

/// Longest run of leading segments shared by both ids, or `None` when the
/// first segments already differ.
pub fn common_ancestor(a: &str, b: &str, separator: &str) -> Option<String> {
    let shared = a
        .split(separator)
        .zip(b.split(separator))
        .take_while(|(left, right)| left == right)
        .map(|(segment, _)| segment)
        .collect::<Vec<_>>();

    if shared.is_empty() {
        None
    } else {
        Some(shared.join(separator))
    }
}

pub fn validate_id(id: &str, separator: &str) -> Result<(), ModelError> {
    let invalid = |reason| ModelError::InvalidId {
        id: id.to_owned(),
        reason,
    };

    if id.is_empty() {
        return Err(invalid("id is empty"));
    }
    if separator.is_empty() {
        return Err(invalid("separator is empty"));
    }

    let allowed = |c: char| {
        c.is_alphanumeric() || matches!(c, '_' | '-' | '/' | '.') || separator.contains(c)
    };
    if !id.chars().all(allowed) {
        return Err(invalid("id may only contain word characters, '-', '/' and '.'"));
    }
    if id.split(separator).any(str::is_empty) {
        return Err(invalid("id has an empty path segment"));
    }

    Ok(())
}

/// Canonical key of an edge: the endpoint pair in ascending order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    low: String,
    high: String,
}

impl EdgeKey {
    pub fn new(a: &str, b: &str) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Self {
            low: low.to_owned(),
            high: high.to_owned(),
        }
    }

    pub fn low(&self) -> &str {
        &self.low
    }

    pub fn high(&self) -> &str {
        &self.high
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.low, self.high)
    }
}

impl Serialize for EdgeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_into_ancestor_chain() {
        assert_eq!(ancestor_chain("a.b.c", "."), ["a", "a.b", "a.b.c"]);
        assert_eq!(ancestor_chain("a/b", "/"), ["a", "a/b"]);
        assert_eq!(ancestor_chain("main", "."), ["main"]);
        assert_eq!(ancestor_chain("a::b::c", "::"), ["a", "a::b", "a::b::c"]);
    }

    #[test]
    fn names_are_last_segments() {
        assert_eq!(last_segment("lib.a", "."), "a");
        assert_eq!(last_segment("main", "."), "main");
    }

    #[test]
    fn substring_containment_misfires_on_non_hierarchical_ids() {
        assert!(is_contained("app", "app.test", ".", ContainmentRule::Substring));
        assert!(is_contained("ab", "a.ab", ".", ContainmentRule::Substring));
        assert!(!is_contained("ab", "a.ab", ".", ContainmentRule::PathPrefix));
        assert!(is_contained("app", "app.test", ".", ContainmentRule::PathPrefix));
        assert!(!is_contained("app", "apple", ".", ContainmentRule::PathPrefix));
        assert!(is_contained("app", "app", ".", ContainmentRule::PathPrefix));
    }

    #[test]
    fn finds_common_ancestor() {
        assert_eq!(common_ancestor("lib.a", "lib.b", "."), Some("lib".to_owned()));
        assert_eq!(
            common_ancestor("x.y.a", "x.y.b.c", "."),
            Some("x.y".to_owned())
        );
        assert_eq!(common_ancestor("a.b", "x.y", "."), None);
    }

    #[test]
    fn id_expression() {
        assert!(validate_id("test-fuga", ".").is_ok());
        assert!(validate_id("test_fuga", ".").is_ok());
        assert!(validate_id("test/fuga", ".").is_ok());
        assert!(validate_id("test.fuga", ".").is_ok());
        assert!(validate_id("test fuga", ".").is_err());
        assert!(validate_id("", ".").is_err());
        assert!(validate_id("a..b", ".").is_err());
        assert!(validate_id("a.b.", ".").is_err());
    }

    #[test]
    fn edge_keys_are_order_independent() {
        let key = EdgeKey::new("main", "lib");
        assert_eq!(key, EdgeKey::new("lib", "main"));
        assert_eq!(key.to_string(), "lib-main");
        assert_eq!(EdgeKey::new("lib.b", "lib.a").to_string(), "lib.a-lib.b");
    }
}
