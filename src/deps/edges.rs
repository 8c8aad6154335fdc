use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use tracing::trace;

use super::error::ModelError;
use super::hierarchy::PathNode;
use super::model::{ExternalImports, ModelOptions};
use super::path::{EdgeKey, ancestor_chain, is_contained};
use super::record::DependencyRecord;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Direction {
    /// Observed one way only; `source` imports `target`.
    #[serde(rename = "either")]
    Either,
    /// Observed both ways; endpoints are stored in ascending order.
    #[serde(rename = "both")]
    Mutual,
}

/// The record import that contributed to an edge.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Origin {
    pub source_id: String,
    pub target_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub id: EdgeKey,
    pub source: String,
    pub target: String,
    pub direction: Direction,
    pub origins: IndexSet<Origin>,
}

impl Edge {
    pub fn either(source: &str, target: &str, origin: Origin) -> Self {
        Self {
            id: EdgeKey::new(source, target),
            source: source.to_owned(),
            target: target.to_owned(),
            direction: Direction::Either,
            origins: IndexSet::from([origin]),
        }
    }

    fn describe(&self) -> String {
        format!("{} -> {} ({:?})", self.source, self.target, self.direction)
    }
}

/// Id-keyed edge set. Each key holds at most one edge; merging is total over
/// absent / same order / reversed order / already mutual and fails on
/// anything else.
#[derive(Clone, Debug, Default)]
pub struct EdgeTable {
    edges: IndexMap<EdgeKey, Edge>,
}

impl EdgeTable {
    pub fn merge(&mut self, incoming: Edge) -> Result<(), ModelError> {
        let Some(previous) = self.edges.get_mut(&incoming.id) else {
            self.edges.insert(incoming.id.clone(), incoming);
            return Ok(());
        };

        let same_order =
            previous.source == incoming.source && previous.target == incoming.target;
        let reversed = previous.source == incoming.target && previous.target == incoming.source;

        if previous.direction == Direction::Mutual
            || (same_order && incoming.direction == Direction::Either)
        {
            previous.origins.extend(incoming.origins);
            return Ok(());
        }

        if reversed || (same_order && incoming.direction == Direction::Mutual) {
            trace!(edge = %previous.id, "edge observed in both directions");
            previous.direction = Direction::Mutual;
            previous.source = previous.id.low().to_owned();
            previous.target = previous.id.high().to_owned();
            previous.origins.extend(incoming.origins);
            return Ok(());
        }

        Err(ModelError::EdgeCollision {
            key: incoming.id.to_string(),
            previous: previous.describe(),
            incoming: incoming.describe(),
        })
    }

    #[cfg(test)]
    pub fn get(&self, key: &EdgeKey) -> Option<&Edge> {
        self.edges.get(key)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn into_edges(self) -> Vec<Edge> {
        self.edges.into_values().collect()
    }
}

/// Relates every ancestor of each record to every ancestor of each of its
/// imports, skipping pairs where one id contains the other.
pub fn aggregate_edges(
    records: &[DependencyRecord],
    nodes: &IndexMap<String, PathNode>,
    options: &ModelOptions,
) -> Result<EdgeTable, ModelError> {
    let separator = options.separator.as_str();
    let mut table = EdgeTable::default();

    for record in records {
        let sources = ancestor_chain(&record.id, separator);

        for import in &record.imports {
            for target in ancestor_chain(import, separator) {
                for source in &sources {
                    if is_contained(source, &target, separator, options.containment) {
                        continue;
                    }

                    if !nodes.contains_key(&target) {
                        match options.external_imports {
                            ExternalImports::Drop => continue,
                            ExternalImports::Reject => {
                                return Err(ModelError::DanglingEdge {
                                    edge: EdgeKey::new(source, &target).to_string(),
                                    missing: target,
                                });
                            }
                        }
                    }

                    table.merge(Edge::either(
                        source,
                        &target,
                        Origin {
                            source_id: record.id.clone(),
                            target_id: import.clone(),
                        },
                    ))?;
                }
            }
        }
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps::hierarchy::build_hierarchy;
    use crate::deps::path::ContainmentRule;

    fn edges_for(records: &[DependencyRecord], options: &ModelOptions) -> Vec<Edge> {
        let nodes = build_hierarchy(records, &options.separator);
        let mut edges = aggregate_edges(records, &nodes, options)
            .expect("edges aggregate")
            .into_edges();
        edges.sort_by(|a, b| a.id.cmp(&b.id));
        edges
    }

    fn summary(edges: &[Edge]) -> Vec<(String, &str, &str, Direction)> {
        edges
            .iter()
            .map(|edge| {
                (
                    edge.id.to_string(),
                    edge.source.as_str(),
                    edge.target.as_str(),
                    edge.direction,
                )
            })
            .collect()
    }

    fn origin(source_id: &str, target_id: &str) -> Origin {
        Origin {
            source_id: source_id.to_owned(),
            target_id: target_id.to_owned(),
        }
    }

    #[test]
    fn normal_records() {
        let records = [
            DependencyRecord::new("main", &["lib.a", "lib.b"]),
            DependencyRecord::new("lib.a", &["lib.b"]),
            DependencyRecord::new("lib.b", &["lib.a"]),
        ];
        let edges = edges_for(&records, &ModelOptions::default());

        assert_eq!(
            summary(&edges),
            [
                ("lib-main".to_owned(), "main", "lib", Direction::Either),
                ("lib.a-lib.b".to_owned(), "lib.a", "lib.b", Direction::Mutual),
                ("lib.a-main".to_owned(), "main", "lib.a", Direction::Either),
                ("lib.b-main".to_owned(), "main", "lib.b", Direction::Either),
            ]
        );

        let lib_main = &edges[0];
        assert_eq!(
            lib_main.origins.iter().cloned().collect::<Vec<_>>(),
            [origin("main", "lib.a"), origin("main", "lib.b")]
        );
    }

    #[test]
    fn deep_links_are_mutual_at_every_level() {
        let records = [
            DependencyRecord::new("a.b", &["x.y"]),
            DependencyRecord::new("x.y", &["a.b"]),
        ];
        let edges = edges_for(&records, &ModelOptions::default());

        assert_eq!(
            summary(&edges),
            [
                ("a-x".to_owned(), "a", "x", Direction::Mutual),
                ("a-x.y".to_owned(), "a", "x.y", Direction::Mutual),
                ("a.b-x".to_owned(), "a.b", "x", Direction::Mutual),
                ("a.b-x.y".to_owned(), "a.b", "x.y", Direction::Mutual),
            ]
        );
    }

    #[test]
    fn deeper_links_cover_every_ancestor_pair() {
        let records = [
            DependencyRecord::new("a.b.c", &["x.y.z"]),
            DependencyRecord::new("x.y.z", &["a.b.c"]),
        ];
        let edges = edges_for(&records, &ModelOptions::default());

        assert_eq!(edges.len(), 9);
        assert!(edges.iter().all(|edge| edge.direction == Direction::Mutual));
        assert!(edges.iter().all(|edge| edge.source < edge.target));
        assert!(edges.iter().any(|edge| edge.id.to_string() == "a.b-x.y.z"));
    }

    #[test]
    fn multi_imports_stay_one_way() {
        let records = [
            DependencyRecord::new("a.b1", &["x", "a.b2"]),
            DependencyRecord::new("a.b2", &[]),
            DependencyRecord::new("x", &[]),
        ];
        let edges = edges_for(&records, &ModelOptions::default());

        assert_eq!(
            summary(&edges),
            [
                ("a-x".to_owned(), "a", "x", Direction::Either),
                ("a.b1-a.b2".to_owned(), "a.b1", "a.b2", Direction::Either),
                ("a.b1-x".to_owned(), "a.b1", "x", Direction::Either),
            ]
        );
    }

    #[test]
    fn never_links_a_node_to_its_ancestor() {
        let records = [
            DependencyRecord::new("app", &["app.test"]),
            DependencyRecord::new("app.test", &["app"]),
        ];
        let edges = edges_for(&records, &ModelOptions::default());
        assert!(edges.is_empty());
    }

    #[test]
    fn path_prefix_rule_keeps_substring_lookalikes() {
        let records = [
            DependencyRecord::new("ab", &["a.ab"]),
            DependencyRecord::new("a.ab", &[]),
        ];

        let substring = edges_for(&records, &ModelOptions::default());
        assert!(substring.is_empty());

        let strict = ModelOptions {
            containment: ContainmentRule::PathPrefix,
            ..ModelOptions::default()
        };
        let edges = edges_for(&records, &strict);
        assert_eq!(
            summary(&edges),
            [
                ("a-ab".to_owned(), "ab", "a", Direction::Either),
                ("a.ab-ab".to_owned(), "ab", "a.ab", Direction::Either),
            ]
        );
    }

    #[test]
    fn origins_grow_and_stay_unique() {
        let mut table = EdgeTable::default();
        table
            .merge(Edge::either("a", "b", origin("a", "b")))
            .expect("insert");
        table
            .merge(Edge::either("a", "b", origin("a", "b")))
            .expect("same order");
        table
            .merge(Edge::either("b", "a", origin("b", "a")))
            .expect("reversed");
        table
            .merge(Edge::either("a", "b", origin("a.x", "b")))
            .expect("already mutual");

        let edge = table.get(&EdgeKey::new("a", "b")).expect("edge exists");
        assert_eq!(edge.direction, Direction::Mutual);
        assert_eq!(edge.origins.len(), 3);
    }

    #[test]
    fn mutual_edges_never_revert() {
        let mut table = EdgeTable::default();
        table
            .merge(Edge::either("b", "a", origin("b", "a")))
            .expect("insert");
        table
            .merge(Edge::either("a", "b", origin("a", "b")))
            .expect("reversed");
        table
            .merge(Edge::either("b", "a", origin("b.x", "a")))
            .expect("merge");

        let edge = table.get(&EdgeKey::new("a", "b")).expect("edge exists");
        assert_eq!(edge.direction, Direction::Mutual);
        assert_eq!((edge.source.as_str(), edge.target.as_str()), ("a", "b"));
    }

    #[test]
    fn mismatched_endpoints_fail_fast() {
        let mut table = EdgeTable::default();
        table
            .merge(Edge::either("a", "b", origin("a", "b")))
            .expect("insert");

        let mut broken = Edge::either("a", "c", origin("a", "c"));
        broken.id = EdgeKey::new("a", "b");
        assert!(matches!(
            table.merge(broken),
            Err(ModelError::EdgeCollision { .. })
        ));
    }

    #[test]
    fn unknown_import_targets_follow_policy() {
        let records = [DependencyRecord::new("main", &["os.path"])];
        let nodes = build_hierarchy(&records, ".");

        let rejected = aggregate_edges(&records, &nodes, &ModelOptions::default());
        assert!(matches!(
            rejected,
            Err(ModelError::DanglingEdge { ref missing, .. }) if missing == "os"
        ));

        let dropping = ModelOptions {
            external_imports: ExternalImports::Drop,
            ..ModelOptions::default()
        };
        let table = aggregate_edges(&records, &nodes, &dropping).expect("dropped");
        assert_eq!(table.len(), 0);
    }
}
