use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use super::path::{ancestor_chain, last_segment};
use super::record::DependencyRecord;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    #[serde(rename = "group")]
    Group,
    #[serde(rename = "plain")]
    Leaf,
}

/// A point in the dotted-path hierarchy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Always empty for leaves.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub include_both_direction: bool,
}

impl PathNode {
    pub fn is_group(&self) -> bool {
        self.kind == NodeKind::Group
    }
}

#[derive(Default)]
struct ProvisionalNode {
    parent: Option<String>,
    children: IndexSet<String>,
}

/// Builds one node per distinct id prefix, keyed by id in first-seen order.
///
/// The first pass only records parent links and child membership; kinds are
/// settled in the second pass, so an id seen as a leaf before one of its
/// descendants shows up still ends up a group.
pub fn build_hierarchy(
    records: &[DependencyRecord],
    separator: &str,
) -> IndexMap<String, PathNode> {
    let mut provisional: IndexMap<String, ProvisionalNode> = IndexMap::new();

    for record in records {
        let mut parent: Option<String> = None;
        for prefix in ancestor_chain(&record.id, separator) {
            let entry = provisional.entry(prefix.clone()).or_default();
            if entry.parent.is_none() {
                entry.parent = parent.clone();
            }

            if let Some(parent_id) = &parent
                && let Some(parent_node) = provisional.get_mut(parent_id)
            {
                parent_node.children.insert(prefix.clone());
            }
            parent = Some(prefix);
        }
    }

    provisional
        .into_iter()
        .map(|(id, node)| {
            let kind = if node.children.is_empty() {
                NodeKind::Leaf
            } else {
                NodeKind::Group
            };
            let path_node = PathNode {
                name: last_segment(&id, separator).to_owned(),
                id: id.clone(),
                kind,
                children: node.children.into_iter().collect(),
                parent: node.parent,
                include_both_direction: false,
            };
            (id, path_node)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind_of(nodes: &IndexMap<String, PathNode>, id: &str) -> NodeKind {
        nodes[id].kind
    }

    #[test]
    fn builds_groups_for_every_prefix() {
        let records = [
            DependencyRecord::new("main", &["lib.a", "lib.b"]),
            DependencyRecord::new("lib.a", &["lib.b"]),
            DependencyRecord::new("lib.b", &["lib.a"]),
        ];
        let nodes = build_hierarchy(&records, ".");

        assert_eq!(nodes.keys().collect::<Vec<_>>(), ["main", "lib", "lib.a", "lib.b"]);
        assert_eq!(kind_of(&nodes, "main"), NodeKind::Leaf);
        assert_eq!(kind_of(&nodes, "lib"), NodeKind::Group);
        assert_eq!(nodes["lib"].children, ["lib.a", "lib.b"]);
        assert_eq!(nodes["lib.a"].name, "a");
        assert_eq!(nodes["lib.a"].parent.as_deref(), Some("lib"));
        assert_eq!(nodes["main"].parent, None);
    }

    #[test]
    fn promotes_leaf_that_later_gains_children() {
        let records = [
            DependencyRecord::new("app", &["app.test"]),
            DependencyRecord::new("app.test", &[]),
        ];
        let nodes = build_hierarchy(&records, ".");

        assert_eq!(kind_of(&nodes, "app"), NodeKind::Group);
        assert_eq!(nodes["app"].children, ["app.test"]);
        assert_eq!(kind_of(&nodes, "app.test"), NodeKind::Leaf);
        assert_eq!(nodes["app.test"].parent.as_deref(), Some("app"));
    }

    #[test]
    fn children_are_unique_in_first_seen_order() {
        let records = [
            DependencyRecord::new("a.z", &[]),
            DependencyRecord::new("a.y.q", &[]),
            DependencyRecord::new("a.z", &[]),
            DependencyRecord::new("a.y.p", &[]),
        ];
        let nodes = build_hierarchy(&records, ".");

        assert_eq!(nodes["a"].children, ["a.z", "a.y"]);
        assert_eq!(nodes["a.y"].children, ["a.y.q", "a.y.p"]);
        assert_eq!(nodes.len(), 5);
    }

    #[test]
    fn honours_custom_separator() {
        let records = [DependencyRecord::new("lib/a", &[])];
        let nodes = build_hierarchy(&records, "/");

        assert_eq!(nodes["lib"].children, ["lib/a"]);
        assert_eq!(nodes["lib/a"].name, "a");
    }
}
