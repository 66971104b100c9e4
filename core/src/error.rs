use crate::{Label, Predicate, Variable};

/// Schema lookup or construction error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
	#[error("unknown type `{0}`")]
	UnknownType(Label),

	#[error("unknown role `{0}`")]
	UnknownRole(Label),

	#[error("cyclic type hierarchy through `{0}`")]
	CyclicHierarchy(Label),

	#[error("role `{role}` of `{relation}` overrides no inherited role")]
	UnknownOverriddenRole { relation: Label, role: Label },

	#[error("`{0}` is not an attribute type")]
	NotAnAttributeType(Label),
}

/// Ill-formed pattern, rule or comparison.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SemanticError {
	#[error("cannot compare {lhs} and {rhs} with `{predicate}`")]
	Incomparable {
		lhs: &'static str,
		predicate: Predicate,
		rhs: &'static str,
	},

	#[error("`{0}` has no value")]
	NotAnAttribute(Label),

	#[error("invalid regular expression `{pattern}`: {message}")]
	InvalidRegex { pattern: String, message: String },

	#[error("invalid conclusion for rule `{rule}`: {reason}")]
	InvalidConclusion { rule: String, reason: &'static str },

	#[error("variable `{variable}` in the conclusion of rule `{rule}` is not bound by its body")]
	ConclusionVariableNotInBody { rule: String, variable: Variable },

	#[error("variable `{0}` has more than one isa constraint")]
	MultipleIsa(Variable),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Schema(#[from] SchemaError),

	#[error(transparent)]
	Semantic(#[from] SemanticError),
}
