use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use super::edges::{Direction, Edge, aggregate_edges};
use super::error::ModelError;
use super::hierarchy::{PathNode, build_hierarchy};
use super::path::{ContainmentRule, EdgeKey, validate_id};
use super::propagate::propagate_both_direction;
use super::record::DependencyRecord;

/// Id of the synthetic field that holds every top-level node.
pub const ROOT_FIELD_ID: &str = "__root__";

/// What to do with an import whose target is not a known node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExternalImports {
    #[default]
    Reject,
    /// Skip only the pairs whose target is unknown; known ancestors of the
    /// import still get edges.
    Drop,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelOptions {
    pub separator: String,
    pub containment: ContainmentRule,
    pub external_imports: ExternalImports,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            separator: ".".to_owned(),
            containment: ContainmentRule::default(),
            external_imports: ExternalImports::default(),
        }
    }
}

/// The node/edge model. Built once per session and read-only afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DependencyModel {
    #[serde(serialize_with = "serialize_values")]
    nodes: IndexMap<String, PathNode>,
    #[serde(serialize_with = "serialize_values")]
    edges: IndexMap<EdgeKey, Edge>,
}

fn serialize_values<K, V, S>(map: &IndexMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
where
    V: Serialize,
    S: serde::Serializer,
{
    serializer.collect_seq(map.values())
}

impl DependencyModel {
    pub fn build(records: &[DependencyRecord], options: &ModelOptions) -> Result<Self, ModelError> {
        for record in records {
            validate_id(&record.id, &options.separator)?;
            if record.id == ROOT_FIELD_ID {
                return Err(ModelError::ReservedId(record.id.clone()));
            }
            for import in &record.imports {
                validate_id(import, &options.separator)?;
            }
        }

        let mut nodes = build_hierarchy(records, &options.separator);
        let edges = aggregate_edges(records, &nodes, options)?.into_edges();
        propagate_both_direction(&mut nodes, &edges, &options.separator)?;

        let mutual = edges
            .iter()
            .filter(|edge| edge.direction == Direction::Mutual)
            .count();
        debug!(
            records = records.len(),
            nodes = nodes.len(),
            edges = edges.len(),
            mutual,
            "built dependency model"
        );

        Ok(Self {
            nodes,
            edges: edges.into_iter().map(|edge| (edge.id.clone(), edge)).collect(),
        })
    }

    #[cfg(test)]
    pub(crate) fn remove_node(&mut self, id: &str) {
        self.nodes.shift_remove(id);
    }

    pub fn node(&self, id: &str) -> Option<&PathNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &PathNode> {
        self.nodes.values()
    }

    pub fn roots(&self) -> impl Iterator<Item = &PathNode> {
        self.nodes.values().filter(|node| node.parent.is_none())
    }

    pub fn edge_between(&self, a: &str, b: &str) -> Option<&Edge> {
        self.edges.get(&EdgeKey::new(a, b))
    }

    #[cfg(test)]
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Ancestors of `id`, outermost first, excluding `id` itself.
    pub fn ancestors(&self, id: &str) -> Vec<&PathNode> {
        let mut chain = Vec::new();
        let mut cursor = self.nodes.get(id).and_then(|node| node.parent.as_deref());
        while let Some(parent_id) = cursor {
            let Some(parent) = self.nodes.get(parent_id) else {
                break;
            };
            chain.push(parent);
            cursor = parent.parent.as_deref();
        }
        chain.reverse();
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps::hierarchy::NodeKind;

    fn normal_records() -> Vec<DependencyRecord> {
        vec![
            DependencyRecord::new("main", &["lib.a", "lib.b"]),
            DependencyRecord::new("lib.a", &["lib.b"]),
            DependencyRecord::new("lib.b", &["lib.a"]),
        ]
    }

    #[test]
    fn building_twice_is_value_equal() {
        let records = normal_records();
        let first = DependencyModel::build(&records, &ModelOptions::default()).expect("model");
        let second = DependencyModel::build(&records, &ModelOptions::default()).expect("model");
        assert_eq!(first, second);
    }

    #[test]
    fn every_proper_prefix_is_a_group() {
        let records = vec![
            DependencyRecord::new("a.b.c", &["x.y"]),
            DependencyRecord::new("a.b", &[]),
            DependencyRecord::new("x.y", &[]),
            DependencyRecord::new("solo", &[]),
        ];
        let model = DependencyModel::build(&records, &ModelOptions::default()).expect("model");

        for record in &records {
            for ancestor in model.ancestors(&record.id) {
                assert_eq!(ancestor.kind, NodeKind::Group, "{}", ancestor.id);
            }
        }
        assert_eq!(model.node("a.b").map(|node| node.kind), Some(NodeKind::Group));
        assert_eq!(model.node("a.b.c").map(|node| node.kind), Some(NodeKind::Leaf));
        assert_eq!(model.node("solo").map(|node| node.kind), Some(NodeKind::Leaf));
        assert_eq!(
            model.roots().map(|node| node.id.as_str()).collect::<Vec<_>>(),
            ["a", "x", "solo"]
        );
    }

    #[test]
    fn slash_separator_matches_dotted_model() {
        let dotted = DependencyModel::build(&normal_records(), &ModelOptions::default())
            .expect("model");
        let slashed_records = normal_records()
            .into_iter()
            .map(|record| DependencyRecord {
                id: record.id.replace('.', "/"),
                imports: record.imports.iter().map(|id| id.replace('.', "/")).collect(),
            })
            .collect::<Vec<_>>();
        let options = ModelOptions {
            separator: "/".to_owned(),
            ..ModelOptions::default()
        };
        let slashed = DependencyModel::build(&slashed_records, &options).expect("model");

        let dotted_ids = dotted
            .edges()
            .map(|edge| (edge.id.to_string().replace('.', "/"), edge.direction))
            .collect::<Vec<_>>();
        let slashed_ids = slashed
            .edges()
            .map(|edge| (edge.id.to_string(), edge.direction))
            .collect::<Vec<_>>();
        assert_eq!(dotted_ids, slashed_ids);
        assert_eq!(
            slashed.node("lib").map(|node| node.children.clone()),
            Some(vec!["lib/a".to_owned(), "lib/b".to_owned()])
        );
        assert!(slashed.node("lib").is_some_and(|node| node.include_both_direction));
    }

    #[test]
    fn rejects_invalid_and_reserved_ids() {
        let options = ModelOptions::default();
        assert!(matches!(
            DependencyModel::build(&[DependencyRecord::new("bad id", &[])], &options),
            Err(ModelError::InvalidId { .. })
        ));
        assert!(matches!(
            DependencyModel::build(&[DependencyRecord::new("ok", &["also bad"])], &options),
            Err(ModelError::InvalidId { .. })
        ));
        assert!(matches!(
            DependencyModel::build(&[DependencyRecord::new(ROOT_FIELD_ID, &[])], &options),
            Err(ModelError::ReservedId(_))
        ));
    }

    #[test]
    fn serializes_nodes_and_edges_as_sequences() {
        let model = DependencyModel::build(&normal_records(), &ModelOptions::default())
            .expect("model");
        let value = serde_json::to_value(&model).expect("serializes");

        assert_eq!(value["nodes"][1]["id"], "lib");
        assert_eq!(value["nodes"][1]["type"], "group");
        assert_eq!(value["nodes"][1]["includeBothDirection"], true);
        assert_eq!(value["edges"][0]["id"], "lib-main");
        assert_eq!(value["edges"][0]["direction"], "either");
        assert_eq!(value["edges"][0]["origins"][0]["sourceId"], "main");
    }
}
