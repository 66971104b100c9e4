//! Shared building blocks of the rule-unification engine.
//!
//! This crate defines the pattern model queries and rules are written in,
//! with the values they compare. Answers are made of opaque concepts, and
//! the type hierarchy is read through the [`TypeHierarchy`] interface.
//!
//! Everything in this crate is immutable once built. Patterns are produced
//! by an external parser/normaliser and annotated by an external type
//! inference pass; this crate only gives them a shape.
pub mod concept;
pub mod error;
pub mod label;
pub mod pattern;
pub mod schema;
mod utils;
pub mod value;

pub use concept::{Concept, ConceptMap, Thing};
pub use error::{Error, SchemaError, SemanticError};
pub use label::Label;
pub use pattern::{
	Annotations, Conjunction, Constraint, Has, Isa, Operand, Relation, RolePlayer, ValueConstraint,
	Variable,
};
pub use schema::{Kind, Snapshot, SnapshotBuilder, TypeHierarchy};
pub use utils::*;
pub use value::{Comparison, Predicate, Value};
