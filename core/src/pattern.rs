//! Pattern model.
//!
//! A pattern is a conjunction of constraints over variables. Query and rule
//! patterns share the same model.
use core::fmt;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{Label, Predicate, Value};

/// Pattern variable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Variable {
	/// User-named variable, e.g. `$x`.
	Name(String),

	/// System-generated variable standing for an unnamed pattern element.
	Anonymous(u32),

	/// Type or role label used in variable position. Label variables are
	/// constants: they always denote the type with the given label.
	Label(Label),
}

impl Variable {
	pub fn name(name: impl Into<String>) -> Self {
		Self::Name(name.into())
	}

	pub fn label(label: impl Into<Label>) -> Self {
		Self::Label(label.into())
	}

	pub fn role(scope: impl Into<String>, name: impl Into<String>) -> Self {
		Self::Label(Label::scoped(scope, name))
	}

	/// Tells if concepts can be bound to this variable in an answer.
	///
	/// Only label variables are not retrievable.
	pub fn is_retrievable(&self) -> bool {
		!matches!(self, Self::Label(_))
	}

	pub fn is_named(&self) -> bool {
		matches!(self, Self::Name(_))
	}

	pub fn is_anonymous(&self) -> bool {
		matches!(self, Self::Anonymous(_))
	}

	pub fn as_label(&self) -> Option<&Label> {
		match self {
			Self::Label(l) => Some(l),
			_ => None,
		}
	}

	/// Tells if `self` and `other` may stand for each other under a
	/// variable renaming.
	///
	/// Named variables rename to named variables, anonymous variables to
	/// anonymous variables. Labels only stand for themselves.
	pub fn is_renamable_to(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Name(_), Self::Name(_)) => true,
			(Self::Anonymous(_), Self::Anonymous(_)) => true,
			(Self::Label(a), Self::Label(b)) => a == b,
			_ => false,
		}
	}
}

impl fmt::Display for Variable {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Name(name) => write!(f, "${name}"),
			Self::Anonymous(i) => write!(f, "$_{i}"),
			Self::Label(label) => write!(f, "{label}"),
		}
	}
}

/// Right-hand side of a value constraint.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Operand {
	Variable(Variable),
	Constant(Value),
}

impl Operand {
	pub fn as_variable(&self) -> Option<&Variable> {
		match self {
			Self::Variable(x) => Some(x),
			Self::Constant(_) => None,
		}
	}

	pub fn as_constant(&self) -> Option<&Value> {
		match self {
			Self::Constant(v) => Some(v),
			Self::Variable(_) => None,
		}
	}
}

impl fmt::Display for Operand {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Variable(x) => write!(f, "{x}"),
			Self::Constant(v) => write!(f, "{v}"),
		}
	}
}

/// `owner isa ty`, or `owner isa! ty` when `explicit`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Isa {
	pub owner: Variable,
	pub ty: Variable,

	/// Excludes subtypes of `ty`.
	pub explicit: bool,
}

/// `owner has attribute`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Has {
	pub owner: Variable,
	pub attribute: Variable,
}

/// Role binding of a relation constraint.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RolePlayer {
	/// Role placeholder. `None` when no role is specified.
	pub role: Option<Variable>,
	pub player: Variable,
}

impl RolePlayer {
	pub fn new(role: Option<Variable>, player: Variable) -> Self {
		Self { role, player }
	}
}

/// `owner (role: player, ...)`.
///
/// Players are an unordered multiset, kept in the order they were given.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Relation {
	pub owner: Variable,
	pub players: Vec<RolePlayer>,
}

/// `owner <predicate> operand`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ValueConstraint {
	pub owner: Variable,
	pub predicate: Predicate,
	pub operand: Operand,
}

/// Pattern constraint.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Constraint {
	Isa(Isa),
	Has(Has),
	Relation(Relation),
	Value(ValueConstraint),
}

impl Constraint {
	pub fn isa(owner: Variable, ty: Variable) -> Self {
		Self::Isa(Isa {
			owner,
			ty,
			explicit: false,
		})
	}

	pub fn isa_explicit(owner: Variable, ty: Variable) -> Self {
		Self::Isa(Isa {
			owner,
			ty,
			explicit: true,
		})
	}

	pub fn has(owner: Variable, attribute: Variable) -> Self {
		Self::Has(Has { owner, attribute })
	}

	pub fn relation(owner: Variable, players: impl IntoIterator<Item = RolePlayer>) -> Self {
		Self::Relation(Relation {
			owner,
			players: players.into_iter().collect(),
		})
	}

	pub fn value(owner: Variable, predicate: Predicate, operand: Operand) -> Self {
		Self::Value(ValueConstraint {
			owner,
			predicate,
			operand,
		})
	}

	pub fn owner(&self) -> &Variable {
		match self {
			Self::Isa(c) => &c.owner,
			Self::Has(c) => &c.owner,
			Self::Relation(c) => &c.owner,
			Self::Value(c) => &c.owner,
		}
	}

	/// Variables occurring in this constraint, in order of appearance,
	/// possibly repeated.
	pub fn variables(&self) -> Vec<&Variable> {
		match self {
			Self::Isa(c) => vec![&c.owner, &c.ty],
			Self::Has(c) => vec![&c.owner, &c.attribute],
			Self::Relation(c) => {
				let mut result = vec![&c.owner];
				for rp in &c.players {
					result.extend(&rp.role);
					result.push(&rp.player)
				}
				result
			}
			Self::Value(c) => {
				let mut result = vec![&c.owner];
				result.extend(c.operand.as_variable());
				result
			}
		}
	}

	/// Rename every variable of the constraint.
	pub fn map_variables(&self, mut f: impl FnMut(&Variable) -> Variable) -> Self {
		match self {
			Self::Isa(c) => Self::Isa(Isa {
				owner: f(&c.owner),
				ty: f(&c.ty),
				explicit: c.explicit,
			}),
			Self::Has(c) => Self::Has(Has {
				owner: f(&c.owner),
				attribute: f(&c.attribute),
			}),
			Self::Relation(c) => Self::Relation(Relation {
				owner: f(&c.owner),
				players: c
					.players
					.iter()
					.map(|rp| RolePlayer {
						role: rp.role.as_ref().map(&mut f),
						player: f(&rp.player),
					})
					.collect(),
			}),
			Self::Value(c) => Self::Value(ValueConstraint {
				owner: f(&c.owner),
				predicate: c.predicate,
				operand: match &c.operand {
					Operand::Variable(x) => Operand::Variable(f(x)),
					Operand::Constant(v) => Operand::Constant(v.clone()),
				},
			}),
		}
	}
}

impl fmt::Display for Constraint {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Isa(c) => {
				if c.explicit {
					write!(f, "{} isa! {}", c.owner, c.ty)
				} else {
					write!(f, "{} isa {}", c.owner, c.ty)
				}
			}
			Self::Has(c) => write!(f, "{} has {}", c.owner, c.attribute),
			Self::Relation(c) => {
				write!(f, "{} (", c.owner)?;
				for (i, rp) in c.players.iter().enumerate() {
					if i > 0 {
						write!(f, ", ")?
					}

					match &rp.role {
						Some(role) => write!(f, "{role}: {}", rp.player)?,
						None => write!(f, "{}", rp.player)?,
					}
				}
				write!(f, ")")
			}
			Self::Value(c) => write!(f, "{} {} {}", c.owner, c.predicate, c.operand),
		}
	}
}

/// Resolved types of the variables of a pattern.
///
/// An absent or empty entry means the types are unknown, and never prunes
/// anything.
#[derive(
	Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Annotations(BTreeMap<Variable, BTreeSet<Label>>);

impl Annotations {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the known types of `x`, if any.
	pub fn get(&self, x: &Variable) -> Option<&BTreeSet<Label>> {
		self.0.get(x).filter(|labels| !labels.is_empty())
	}

	pub fn insert(&mut self, x: Variable, labels: impl IntoIterator<Item = Label>) {
		self.0.entry(x).or_default().extend(labels)
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&Variable, &BTreeSet<Label>)> {
		self.0.iter()
	}

	/// Restrict the annotations to the given variables.
	pub fn restrict<'a>(&self, variables: impl IntoIterator<Item = &'a Variable>) -> Self {
		let mut result = Self::new();
		for x in variables {
			if let Some(labels) = self.0.get(x) {
				result.0.insert(x.clone(), labels.clone());
			}
		}
		result
	}
}

/// Conjunctive pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Conjunction {
	constraints: Vec<Constraint>,
	annotations: Annotations,
}

impl Conjunction {
	pub fn new(constraints: impl IntoIterator<Item = Constraint>) -> Self {
		Self {
			constraints: constraints.into_iter().collect(),
			annotations: Annotations::new(),
		}
	}

	pub fn constraints(&self) -> &[Constraint] {
		&self.constraints
	}

	pub fn annotations(&self) -> &Annotations {
		&self.annotations
	}

	/// Every variable occurring in the pattern.
	pub fn variables(&self) -> BTreeSet<&Variable> {
		self.constraints.iter().flat_map(Constraint::variables).collect()
	}

	pub fn isa_of<'a>(&'a self, x: &'a Variable) -> impl 'a + Iterator<Item = &'a Isa> {
		self.constraints.iter().filter_map(move |c| match c {
			Constraint::Isa(isa) if isa.owner == *x => Some(isa),
			_ => None,
		})
	}

	pub fn values_of<'a>(
		&'a self,
		x: &'a Variable,
	) -> impl 'a + Iterator<Item = &'a ValueConstraint> {
		self.constraints.iter().filter_map(move |c| match c {
			Constraint::Value(v) if v.owner == *x => Some(v),
			_ => None,
		})
	}

	/// Record the resolved types of `x`.
	pub fn annotate(&mut self, x: Variable, labels: impl IntoIterator<Item = Label>) {
		self.annotations.insert(x, labels)
	}

	pub fn with_annotation(
		mut self,
		x: Variable,
		labels: impl IntoIterator<Item = Label>,
	) -> Self {
		self.annotate(x, labels);
		self
	}

	/// Returns the resolved types of `x`, if known.
	pub fn resolved_types(&self, x: &Variable) -> Option<&BTreeSet<Label>> {
		self.annotations.get(x)
	}
}

impl fmt::Display for Conjunction {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{{ ")?;
		for c in &self.constraints {
			write!(f, "{c}; ")?
		}
		write!(f, "}}")
	}
}
