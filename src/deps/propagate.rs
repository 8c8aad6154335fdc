use indexmap::IndexMap;

use super::edges::{Direction, Edge};
use super::error::ModelError;
use super::hierarchy::PathNode;
use super::path::common_ancestor;

/// Flags every node whose subtree holds at least one mutual relationship.
///
/// The nearest common ancestor of each mutual edge is flagged first, then the
/// flag is OR-ed upward in children-before-parent order.
pub fn propagate_both_direction(
    nodes: &mut IndexMap<String, PathNode>,
    edges: &[Edge],
    separator: &str,
) -> Result<(), ModelError> {
    for edge in edges.iter().filter(|edge| edge.direction == Direction::Mutual) {
        let Some(common_id) = common_ancestor(&edge.source, &edge.target, separator) else {
            continue;
        };
        let node = nodes
            .get_mut(&common_id)
            .ok_or_else(|| ModelError::MissingNode(common_id.clone()))?;
        node.include_both_direction = true;
    }

    for id in post_order(nodes)? {
        let Some(node) = nodes.get(&id) else {
            return Err(ModelError::MissingNode(id));
        };
        if node.include_both_direction {
            continue;
        }

        let flagged_child = node
            .children
            .iter()
            .any(|child| nodes.get(child).is_some_and(|child| child.include_both_direction));
        if flagged_child && let Some(node) = nodes.get_mut(&id) {
            node.include_both_direction = true;
        }
    }

    Ok(())
}

/// Ids of every root's subtree, children before their parent.
pub fn post_order(nodes: &IndexMap<String, PathNode>) -> Result<Vec<String>, ModelError> {
    fn visit(
        id: &str,
        nodes: &IndexMap<String, PathNode>,
        order: &mut Vec<String>,
    ) -> Result<(), ModelError> {
        let node = nodes
            .get(id)
            .ok_or_else(|| ModelError::MissingNode(id.to_owned()))?;
        for child in &node.children {
            visit(child, nodes, order)?;
        }
        order.push(node.id.clone());
        Ok(())
    }

    let mut order = Vec::with_capacity(nodes.len());
    for root in nodes.values().filter(|node| node.parent.is_none()) {
        visit(&root.id, nodes, &mut order)?;
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps::edges::aggregate_edges;
    use crate::deps::hierarchy::build_hierarchy;
    use crate::deps::model::ModelOptions;
    use crate::deps::record::DependencyRecord;

    fn propagated(records: &[DependencyRecord]) -> IndexMap<String, PathNode> {
        let options = ModelOptions::default();
        let mut nodes = build_hierarchy(records, &options.separator);
        let edges = aggregate_edges(records, &nodes, &options)
            .expect("edges aggregate")
            .into_edges();
        propagate_both_direction(&mut nodes, &edges, &options.separator).expect("propagates");
        nodes
    }

    #[test]
    fn flags_common_ancestor_and_its_ancestors() {
        let nodes = propagated(&[
            DependencyRecord::new("app.lib.a", &["app.lib.b"]),
            DependencyRecord::new("app.lib.b", &["app.lib.a"]),
            DependencyRecord::new("app.cli", &["app.lib.a"]),
            DependencyRecord::new("tools.x", &[]),
        ]);

        assert!(nodes["app.lib"].include_both_direction);
        assert!(nodes["app"].include_both_direction);
        assert!(!nodes["app.lib.a"].include_both_direction);
        assert!(!nodes["app.cli"].include_both_direction);
        assert!(!nodes["tools"].include_both_direction);
    }

    #[test]
    fn top_level_cycles_flag_no_node_directly() {
        let nodes = propagated(&[
            DependencyRecord::new("a.b", &["x.y"]),
            DependencyRecord::new("x.y", &["a.b"]),
        ]);

        assert!(nodes.values().all(|node| !node.include_both_direction));
    }

    #[test]
    fn post_order_visits_children_first() {
        let nodes = build_hierarchy(
            &[
                DependencyRecord::new("a.b.c", &[]),
                DependencyRecord::new("a.d", &[]),
                DependencyRecord::new("z", &[]),
            ],
            ".",
        );

        assert_eq!(post_order(&nodes).expect("order"), ["a.b.c", "a.b", "a.d", "a", "z"]);
    }
}
