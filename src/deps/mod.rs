mod edges;
mod error;
mod hierarchy;
mod model;
mod path;
mod propagate;
mod record;

pub use edges::{Direction, Origin};
pub use error::ModelError;
pub use hierarchy::PathNode;
#[cfg(test)]
pub use hierarchy::NodeKind;
pub use model::{DependencyModel, ExternalImports, ModelOptions, ROOT_FIELD_ID};
pub use path::{ContainmentRule, EdgeKey};
pub use record::load_records;
#[cfg(test)]
pub use record::DependencyRecord;
