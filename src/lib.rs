//! Typed configuration models for CFD case setup
//!
//! A case setup is a tree-structured document of named nodes and typed
//! attributes. Domain models — field registration, boundary conditions —
//! each own one subtree of the shared document and expose typed
//! operations over it; a facade composes them into the single API
//! surface a presentation layer talks to.

pub mod case;
pub use case::{AccessStats, Case};

pub mod document;
pub use document::{Document, NodeId, NodePath, Value};

pub mod model;
pub use model::{
    BoundaryConditions, BoundaryConditionsModel, CaseModel, ConditionKind,
    DanglingReferenceError, FieldId, FieldProperties, FieldRegistry, FieldsModel, Phase,
};

/// Versioned load/save of case documents.
pub mod storage;
pub use storage::{LoadError, SaveError};

pub mod vars;
pub use vars::{Choice, InvalidChoiceError};
