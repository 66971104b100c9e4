//! Requirement checks on concrete concepts.
use std::collections::BTreeSet;

use concluder_core::{Comparison, Concept, Label, SemanticError, Thing};

/// Checks that a thing has one of the `allowed` exact types.
///
/// Types never satisfy this requirement.
pub fn check_isa_explicit<T: Thing>(concept: &Concept<T>, allowed: &BTreeSet<Label>) -> bool {
	match concept {
		Concept::Thing(t) => allowed.contains(t.type_label()),
		Concept::Type(_) => false,
	}
}

/// Checks that a role type is among the `allowed` roles.
pub fn check_role_label<T>(concept: &Concept<T>, allowed: &BTreeSet<Label>) -> bool {
	match concept {
		Concept::Type(label) => allowed.contains(label),
		Concept::Thing(_) => false,
	}
}

/// Checks that `player` plays at least one of the `allowed` roles in
/// `relation`.
pub fn check_role_type<T: Thing>(relation: &T, player: &T, allowed: &BTreeSet<Label>) -> bool {
	relation
		.role_types(player)
		.iter()
		.any(|role| allowed.contains(role))
}

/// Evaluates a value comparison on an attribute.
///
/// Fails with [`SemanticError::NotAnAttribute`] if the concept has no
/// value, and with [`SemanticError::Incomparable`] if the value cannot be
/// compared with the operand.
pub fn check_predicate<T: Thing>(
	concept: &Concept<T>,
	comparison: &Comparison,
) -> Result<bool, SemanticError> {
	match concept.value() {
		Some(value) => comparison.test(value),
		None => Err(SemanticError::NotAnAttribute(concept.type_label().clone())),
	}
}
