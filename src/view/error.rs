use thiserror::Error;

use crate::deps::ModelError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("radius of field {0:?} was read before it was computed")]
    RadiusNotComputed(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ViewError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}
