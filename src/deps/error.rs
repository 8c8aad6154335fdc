use thiserror::Error;

/// Failures while turning dependency records into the node/edge model.
///
/// Every variant means the record set (or the builder) is broken; none of
/// them are retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid module id {id:?}: {reason}")]
    InvalidId { id: String, reason: &'static str },

    #[error("module id {0:?} is reserved for the synthetic root field")]
    ReservedId(String),

    #[error("edge {key} cannot merge {incoming} into {previous}")]
    EdgeCollision {
        key: String,
        previous: String,
        incoming: String,
    },

    #[error("edge {edge} references unknown node {missing:?}")]
    DanglingEdge { edge: String, missing: String },

    #[error("node {0:?} is referenced but was never built")]
    MissingNode(String),
}
