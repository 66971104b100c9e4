use core::fmt;
use std::collections::BTreeSet;

use concluder_core::{
	Conjunction, Constraint, Has, Label, Operand, Predicate, Relation, SemanticError, Value,
	Variable,
};

/// Deduction rule `when { ... } then { ... }`.
///
/// The conclusion is validated on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
	label: String,
	when: Conjunction,
	then: Conjunction,
	conclusion: Conclusion,
}

/// Relation conclusion, e.g. `(employee: $x) isa employment`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationConclusion {
	/// Relation constraint. Every player has a role.
	pub relation: Relation,

	/// Type of the inferred relation.
	pub ty: Variable,
}

impl RelationConclusion {
	pub fn owner(&self) -> &Variable {
		&self.relation.owner
	}

	/// Role and player of each role binding.
	pub fn role_players(&self) -> impl Iterator<Item = (&Variable, &Variable)> {
		self.relation
			.players
			.iter()
			.filter_map(|rp| rp.role.as_ref().map(|role| (role, &rp.player)))
	}
}

/// Ownership conclusion.
///
/// Either `$x has $a` where `$a` is bound by the rule body, or
/// `$x has age 10` inferring an attribute with an explicit value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HasConclusion {
	pub has: Has,

	/// Attribute type, always present for explicit values.
	pub ty: Option<Variable>,

	/// Explicit value of the inferred attribute.
	pub value: Option<Value>,
}

impl HasConclusion {
	pub fn owner(&self) -> &Variable {
		&self.has.owner
	}

	pub fn attribute(&self) -> &Variable {
		&self.has.attribute
	}

	pub fn is_explicit(&self) -> bool {
		self.value.is_some()
	}
}

/// The single fact a rule concludes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Conclusion {
	Relation(RelationConclusion),
	Has(HasConclusion),
}

impl Conclusion {
	/// Instance created by the conclusion, with its type.
	///
	/// `None` for variable `has` conclusions, which create no instance.
	pub fn isa(&self) -> Option<(&Variable, &Variable)> {
		match self {
			Self::Relation(r) => Some((r.owner(), &r.ty)),
			Self::Has(h) if h.is_explicit() => h.ty.as_ref().map(|ty| (h.attribute(), ty)),
			Self::Has(_) => None,
		}
	}

	/// Inferred attribute with its explicit value.
	pub fn value(&self) -> Option<(&Variable, &Value)> {
		match self {
			Self::Has(h) => h.value.as_ref().map(|v| (h.attribute(), v)),
			Self::Relation(_) => None,
		}
	}

	pub fn as_relation(&self) -> Option<&RelationConclusion> {
		match self {
			Self::Relation(r) => Some(r),
			Self::Has(_) => None,
		}
	}

	pub fn as_has(&self) -> Option<&HasConclusion> {
		match self {
			Self::Has(h) => Some(h),
			Self::Relation(_) => None,
		}
	}
}

impl Rule {
	pub fn new(
		label: impl Into<String>,
		when: Conjunction,
		then: Conjunction,
	) -> Result<Self, SemanticError> {
		let label = label.into();
		let conclusion = parse_conclusion(&label, &then)?;

		let body = when.variables();
		for x in then.variables() {
			if x.is_named() && !body.contains(x) {
				return Err(SemanticError::ConclusionVariableNotInBody {
					rule: label,
					variable: x.clone(),
				});
			}
		}

		log::debug!("registered rule `{label}`");
		Ok(Self {
			label,
			when,
			then,
			conclusion,
		})
	}

	pub fn label(&self) -> &str {
		&self.label
	}

	pub fn when(&self) -> &Conjunction {
		&self.when
	}

	pub fn then(&self) -> &Conjunction {
		&self.then
	}

	pub fn conclusion(&self) -> &Conclusion {
		&self.conclusion
	}

	/// Resolved types of a rule variable.
	///
	/// Conclusion annotations take precedence over body annotations. Label
	/// variables resolve to their own label.
	pub fn resolved_types(&self, x: &Variable) -> Option<BTreeSet<Label>> {
		match x {
			Variable::Label(label) => Some(std::iter::once(label.clone()).collect()),
			x => self
				.then
				.resolved_types(x)
				.or_else(|| self.when.resolved_types(x))
				.cloned(),
		}
	}
}

impl fmt::Display for Rule {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "rule {}: when {} then {}", self.label, self.when, self.then)
	}
}

fn parse_conclusion(rule: &str, then: &Conjunction) -> Result<Conclusion, SemanticError> {
	let invalid = |reason| SemanticError::InvalidConclusion {
		rule: rule.to_owned(),
		reason,
	};

	let mut relations = Vec::new();
	let mut has = Vec::new();
	for c in then.constraints() {
		match c {
			Constraint::Relation(r) => relations.push(r),
			Constraint::Has(h) => has.push(h),
			Constraint::Isa(_) | Constraint::Value(_) => (),
		}
	}

	let single_isa = |x: &Variable| -> Result<Option<Variable>, SemanticError> {
		let mut isa = then.isa_of(x);
		let ty = isa.next().map(|isa| isa.ty.clone());
		if isa.next().is_some() {
			return Err(SemanticError::MultipleIsa(x.clone()));
		}

		Ok(ty)
	};

	match (relations.as_slice(), has.as_slice()) {
		([relation], []) => {
			if relation.players.is_empty() {
				return Err(invalid("relation conclusion without role players"));
			}

			if relation.players.iter().any(|rp| rp.role.is_none()) {
				return Err(invalid("every relation conclusion player needs a role"));
			}

			let ty = single_isa(&relation.owner)?
				.ok_or_else(|| invalid("relation conclusion without type"))?;

			if then.constraints().iter().any(|c| match c {
				Constraint::Isa(isa) => isa.owner != relation.owner,
				Constraint::Value(_) => true,
				_ => false,
			}) {
				return Err(invalid("unexpected constraint in relation conclusion"));
			}

			Ok(Conclusion::Relation(RelationConclusion {
				relation: (*relation).clone(),
				ty,
			}))
		}
		([], [has]) => {
			let ty = single_isa(&has.attribute)?;

			if then.constraints().iter().any(|c| match c {
				Constraint::Isa(isa) => isa.owner != has.attribute,
				Constraint::Value(v) => v.owner != has.attribute,
				_ => false,
			}) {
				return Err(invalid("unexpected constraint in has conclusion"));
			}

			let mut values = then.values_of(&has.attribute);
			let value = match (values.next(), values.next()) {
				(None, _) => None,
				(Some(v), None) => match (&v.predicate, &v.operand) {
					(Predicate::Eq, Operand::Constant(value)) => Some(value.clone()),
					_ => return Err(invalid("attribute value must be a constant equality")),
				},
				(Some(_), Some(_)) => {
					return Err(invalid("attribute value must be a constant equality"))
				}
			};

			if value.is_some() {
				if !has.attribute.is_anonymous() {
					return Err(invalid("explicit attribute value on a named variable"));
				}

				if !matches!(ty, Some(Variable::Label(_))) {
					return Err(invalid("explicit attribute value without attribute type"));
				}
			} else if !has.attribute.is_named() {
				return Err(invalid("inferred attribute needs a value or a body variable"));
			}

			Ok(Conclusion::Has(HasConclusion {
				has: (*has).clone(),
				ty,
				value,
			}))
		}
		_ => Err(invalid(
			"conclusion must be exactly one has or relation constraint",
		)),
	}
}
