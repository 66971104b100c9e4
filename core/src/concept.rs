use core::{fmt, hash::Hash};

use derivative::Derivative;
use hashbrown::HashMap;

use crate::{Label, Value, Variable};

/// Data instance, provided by the storage layer.
///
/// Things are opaque to the engine: it only needs to compare them, read
/// their type and value, and ask a relation which roles a player plays in
/// it.
pub trait Thing: Clone + Eq + Hash + fmt::Debug {
	/// Exact type of the thing.
	fn type_label(&self) -> &Label;

	/// Value of the thing, if it is an attribute.
	fn value(&self) -> Option<&Value> {
		None
	}

	/// Roles played by `player` in `self`, if `self` is a relation.
	fn role_types(&self, _player: &Self) -> Vec<Label> {
		Vec::new()
	}
}

/// Concept bound to a variable in an answer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Concept<T> {
	/// Schema type, denoted by its label.
	Type(Label),

	/// Data instance.
	Thing(T),
}

impl<T: Thing> Concept<T> {
	/// Label of the concept type: the type itself, or the type of the thing.
	pub fn type_label(&self) -> &Label {
		match self {
			Self::Type(label) => label,
			Self::Thing(t) => t.type_label(),
		}
	}

	pub fn value(&self) -> Option<&Value> {
		match self {
			Self::Type(_) => None,
			Self::Thing(t) => t.value(),
		}
	}
}

impl<T> Concept<T> {
	pub fn is_type(&self) -> bool {
		matches!(self, Self::Type(_))
	}

	pub fn as_type(&self) -> Option<&Label> {
		match self {
			Self::Type(label) => Some(label),
			Self::Thing(_) => None,
		}
	}

	pub fn as_thing(&self) -> Option<&T> {
		match self {
			Self::Thing(t) => Some(t),
			Self::Type(_) => None,
		}
	}
}

/// Partial assignment of concepts to variables.
#[derive(Debug, Clone, PartialEq, Eq, Derivative)]
#[derivative(Default(bound = ""))]
pub struct ConceptMap<T>(HashMap<Variable, Concept<T>>);

impl<T> ConceptMap<T> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, x: &Variable) -> Option<&Concept<T>> {
		self.0.get(x)
	}

	pub fn contains(&self, x: &Variable) -> bool {
		self.0.contains_key(x)
	}

	pub fn insert(&mut self, x: Variable, concept: Concept<T>) -> Option<Concept<T>> {
		self.0.insert(x, concept)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> hashbrown::hash_map::Iter<Variable, Concept<T>> {
		self.0.iter()
	}

	pub fn variables(&self) -> hashbrown::hash_map::Keys<Variable, Concept<T>> {
		self.0.keys()
	}
}

impl<T> FromIterator<(Variable, Concept<T>)> for ConceptMap<T> {
	fn from_iter<I: IntoIterator<Item = (Variable, Concept<T>)>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

impl<T> Extend<(Variable, Concept<T>)> for ConceptMap<T> {
	fn extend<I: IntoIterator<Item = (Variable, Concept<T>)>>(&mut self, iter: I) {
		self.0.extend(iter)
	}
}

impl<T> IntoIterator for ConceptMap<T> {
	type Item = (Variable, Concept<T>);
	type IntoIter = hashbrown::hash_map::IntoIter<Variable, Concept<T>>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

impl<'a, T> IntoIterator for &'a ConceptMap<T> {
	type Item = (&'a Variable, &'a Concept<T>);
	type IntoIter = hashbrown::hash_map::Iter<'a, Variable, Concept<T>>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}
