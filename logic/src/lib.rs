//! Rule unification.
//!
//! Given the concludables of a query, that is the fragments of the query a
//! rule could conclude, this crate computes the unifiers relating each
//! fragment to the conclusion of each rule. A unifier maps query variables
//! to rule variables and carries the requirements that make the mapping
//! sound. It is then used to push query bounds into the rule, and to pull
//! rule answers back into query answers.
//!
//! Patterns can also be compared structurally, up to variable renaming,
//! with [`AlphaEquals`].
pub mod alpha;
pub mod cache;
pub mod concludable;
pub mod requirement;
pub mod rule;
pub mod unifier;

pub use alpha::{alpha_equals, AlphaEquals, AlphaEquivalence, AlphaEquivalences};
pub use cache::{MemoryCache, NoCache, UnifierCache};
pub use concludable::{
	Concludable, HasConcludable, IsaConcludable, RelationConcludable, Unifiers, ValueConcludable,
};
pub use rule::{Conclusion, HasConclusion, RelationConclusion, Rule};
pub use unifier::{InstanceRequirements, Requirements, RoleRequirement, UnUnified, Unifier};
