//! Concludables: query fragments a rule conclusion may satisfy.
use std::collections::BTreeSet;

use concluder_core::{
	Annotations, Comparison, Conjunction, Constraint, Error, Has, Injections, Isa, IteratorExt,
	Label, Operand, Relation, SchemaError, SemanticError, TypeHierarchy, ValueConstraint,
	Variable,
};
use hashbrown::{HashMap, HashSet};

use crate::{
	alpha::{self, AlphaEquals, AlphaEquivalences},
	rule::{Conclusion, Rule},
	unifier::Unifier,
};

/// `$r (role: $x, ...) isa relation-type`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelationConcludable {
	pub relation: Relation,

	/// Type of the relation, if constrained.
	pub isa: Option<Isa>,

	pub annotations: Annotations,
}

/// `$x has attribute-type $a`, with the value constraints on `$a`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HasConcludable {
	pub has: Has,

	/// Type of the attribute, if constrained.
	pub isa: Option<Isa>,

	pub values: Vec<ValueConstraint>,
	pub annotations: Annotations,
}

/// `$x isa type`, with the value constraints on `$x`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IsaConcludable {
	pub isa: Isa,
	pub values: Vec<ValueConstraint>,
	pub annotations: Annotations,
}

/// Bare value predicate, e.g. `$x > 10`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValueConcludable {
	pub value: ValueConstraint,
	pub annotations: Annotations,
}

/// Query fragment that a rule conclusion could satisfy.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Concludable {
	Relation(RelationConcludable),
	Has(HasConcludable),
	Isa(IsaConcludable),
	Value(ValueConcludable),
}

/// Unifiers of a concludable with a rule.
pub type Unifiers = Box<dyn Iterator<Item = Unifier> + Send>;

impl Concludable {
	/// Splits a conjunction into concludables.
	///
	/// Relations come first, then ownerships, then type constraints not
	/// already attached to a relation or an ownership, then value
	/// constraints not already attached to one of the previous fragments.
	pub fn extract(conjunction: &Conjunction) -> Result<Vec<Self>, SemanticError> {
		let mut isa: HashMap<&Variable, &Isa> = HashMap::new();
		for c in conjunction.constraints() {
			if let Constraint::Isa(i) = c {
				if isa.insert(&i.owner, i).is_some() {
					return Err(SemanticError::MultipleIsa(i.owner.clone()));
				}
			}
		}

		let isa_of = |x: &Variable| isa.get(x).map(|i| (*i).clone());
		let values_of =
			|x: &Variable| -> Vec<ValueConstraint> { conjunction.values_of(x).cloned().collect() };

		let mut result = Vec::new();
		let mut covered: HashSet<&Variable> = HashSet::new();

		for c in conjunction.constraints() {
			if let Constraint::Relation(r) = c {
				covered.insert(&r.owner);
				result.push(Self::Relation(RelationConcludable {
					relation: r.clone(),
					isa: isa_of(&r.owner),
					annotations: Annotations::new(),
				}));
			}
		}

		for c in conjunction.constraints() {
			if let Constraint::Has(h) = c {
				covered.insert(&h.attribute);
				result.push(Self::Has(HasConcludable {
					has: h.clone(),
					isa: isa_of(&h.attribute),
					values: values_of(&h.attribute),
					annotations: Annotations::new(),
				}))
			}
		}

		for c in conjunction.constraints() {
			if let Constraint::Isa(i) = c {
				if !covered.contains(&i.owner) {
					result.push(Self::Isa(IsaConcludable {
						isa: i.clone(),
						values: values_of(&i.owner),
						annotations: Annotations::new(),
					}))
				}
			}
		}

		for c in conjunction.constraints() {
			if let Constraint::Value(v) = c {
				if !covered.contains(&v.owner) && !isa.contains_key(&v.owner) {
					result.push(Self::Value(ValueConcludable {
						value: v.clone(),
						annotations: Annotations::new(),
					}))
				}
			}
		}

		for concludable in &mut result {
			let constraints = concludable.constraints();
			let annotations = conjunction
				.annotations()
				.restrict(constraints.iter().flat_map(Constraint::variables));
			*concludable.annotations_mut() = annotations;
		}

		log::debug!(
			"extracted {} concludable(s) from {conjunction}",
			result.len()
		);
		Ok(result)
	}

	/// Constraints making up the fragment.
	pub fn constraints(&self) -> Vec<Constraint> {
		let mut result = Vec::new();
		match self {
			Self::Relation(c) => {
				result.push(Constraint::Relation(c.relation.clone()));
				result.extend(c.isa.clone().map(Constraint::Isa));
			}
			Self::Has(c) => {
				result.push(Constraint::Has(c.has.clone()));
				result.extend(c.isa.clone().map(Constraint::Isa));
				result.extend(c.values.iter().cloned().map(Constraint::Value));
			}
			Self::Isa(c) => {
				result.push(Constraint::Isa(c.isa.clone()));
				result.extend(c.values.iter().cloned().map(Constraint::Value));
			}
			Self::Value(c) => result.push(Constraint::Value(c.value.clone())),
		}
		result
	}

	pub fn annotations(&self) -> &Annotations {
		match self {
			Self::Relation(c) => &c.annotations,
			Self::Has(c) => &c.annotations,
			Self::Isa(c) => &c.annotations,
			Self::Value(c) => &c.annotations,
		}
	}

	fn annotations_mut(&mut self) -> &mut Annotations {
		match self {
			Self::Relation(c) => &mut c.annotations,
			Self::Has(c) => &mut c.annotations,
			Self::Isa(c) => &mut c.annotations,
			Self::Value(c) => &mut c.annotations,
		}
	}

	fn kind_name(&self) -> &'static str {
		match self {
			Self::Relation(_) => "relation",
			Self::Has(_) => "has",
			Self::Isa(_) => "isa",
			Self::Value(_) => "value",
		}
	}

	/// Computes the unifiers of this concludable with the conclusion of
	/// `rule`.
	///
	/// Schema lookups happen upfront, so that only this call can fail. The
	/// returned unifiers are distinct. Relation unifiers are enumerated
	/// lazily.
	pub fn unify<S: TypeHierarchy + ?Sized>(
		&self,
		rule: &Rule,
		schema: &S,
	) -> Result<Unifiers, Error> {
		log::debug!(
			"unifying {} concludable with rule `{}`",
			self.kind_name(),
			rule.label()
		);

		match self {
			Self::Relation(c) => c.unify(rule, schema),
			Self::Has(c) => Ok(Box::new(c.unify(rule, schema)?.into_iter())),
			Self::Isa(c) => Ok(Box::new(c.unify(rule, schema)?.into_iter())),
			Self::Value(c) => Ok(Box::new(c.unify(rule, schema)?.into_iter())),
		}
	}

	/// Rules that may conclude this fragment, with their unifiers.
	pub fn applicable_rules<'r, S: TypeHierarchy + ?Sized>(
		&'r self,
		rules: &'r [Rule],
		schema: &'r S,
	) -> impl 'r + Iterator<Item = Result<(&'r Rule, Unifier), Error>> {
		rules
			.iter()
			.map(move |rule| self.unify(rule, schema).map(|unifiers| (rule, unifiers)))
			.try_flat_map(|(rule, unifiers)| unifiers.map(move |u| Ok((rule, u))))
	}
}

impl AlphaEquals for Concludable {
	fn alpha_equals(&self, other: &Self) -> AlphaEquivalences {
		if std::mem::discriminant(self) != std::mem::discriminant(other) {
			return AlphaEquivalences::empty();
		}

		alpha::alpha_equals(&self.constraints(), &other.constraints())
	}
}

/// Tells if two type sets may overlap. Unknown sets overlap with anything.
fn overlaps(a: Option<&BTreeSet<Label>>, b: Option<&BTreeSet<Label>>) -> bool {
	match (a, b) {
		(Some(a), Some(b)) => !a.is_disjoint(b),
		_ => true,
	}
}

/// Types a query type variable may denote, closed under subtyping.
///
/// `None` if unknown.
fn query_types<S: TypeHierarchy + ?Sized>(
	ty: &Variable,
	explicit: bool,
	annotations: &Annotations,
	schema: &S,
) -> Result<Option<BTreeSet<Label>>, SchemaError> {
	match ty {
		Variable::Label(label) => {
			if explicit {
				schema.kind(label)?;
				Ok(Some(std::iter::once(label.clone()).collect()))
			} else {
				schema.subtypes(label).map(Some)
			}
		}
		x => match annotations.get(x) {
			Some(labels) => {
				let mut result = BTreeSet::new();
				for label in labels {
					result.extend(schema.subtypes(label)?)
				}
				Ok(Some(result))
			}
			None => Ok(None),
		},
	}
}

/// Types of a rule variable, checked against the schema.
fn rule_types<S: TypeHierarchy + ?Sized>(
	rule: &Rule,
	x: &Variable,
	schema: &S,
) -> Result<Option<BTreeSet<Label>>, SchemaError> {
	let types = rule.resolved_types(x);
	for label in types.iter().flatten() {
		schema.kind(label)?;
	}

	Ok(types)
}

/// Checks the constant comparisons of a fragment against the value a rule
/// infers, if any.
///
/// Only comparisons known to be false prune. Incomparable operands are kept
/// as requirements, and fail when evaluated.
fn values_satisfiable(values: &[ValueConstraint], rule: &Rule) -> bool {
	match rule.conclusion().value() {
		Some((_, inferred)) => values.iter().all(|v| match &v.operand {
			Operand::Constant(c) => !inferred.refutes(v.predicate, c),
			Operand::Variable(_) => true,
		}),
		None => true,
	}
}

fn comparisons(values: &[ValueConstraint]) -> impl '_ + Iterator<Item = Comparison> {
	values.iter().filter_map(|v| {
		v.operand.as_constant().map(|c| Comparison {
			predicate: v.predicate,
			value: c.clone(),
		})
	})
}

impl IsaConcludable {
	fn unify<S: TypeHierarchy + ?Sized>(
		&self,
		rule: &Rule,
		schema: &S,
	) -> Result<Option<Unifier>, Error> {
		let Some((instance, rule_ty)) = rule.conclusion().isa() else {
			return Ok(None);
		};

		let produced = match rule_types(rule, rule_ty, schema)? {
			Some(types) => Some(types),
			None => rule_types(rule, instance, schema)?,
		};
		if !overlaps(self.annotations.get(&self.isa.owner), produced.as_ref()) {
			log::trace!("{} cannot be an instance of the conclusion", self.isa.owner);
			return Ok(None);
		}

		let allowed = query_types(&self.isa.ty, self.isa.explicit, &self.annotations, schema)?;
		if !overlaps(allowed.as_ref(), produced.as_ref()) {
			log::trace!("rule `{}` concludes no {}", rule.label(), self.isa.ty);
			return Ok(None);
		}

		if !self.values.is_empty() && matches!(rule.conclusion(), Conclusion::Relation(_)) {
			log::trace!("relations have no value");
			return Ok(None);
		}

		if !values_satisfiable(&self.values, rule) {
			log::trace!("inferred value of rule `{}` is filtered out", rule.label());
			return Ok(None);
		}

		let mut builder = Unifier::builder(rule);
		builder.map(&self.isa.owner, instance);

		if !matches!(self.isa.ty, Variable::Label(_)) {
			builder.map(&self.isa.ty, rule_ty);
			if let Some(produced) = produced {
				builder.require_isa(instance, produced)
			}
		}

		if let Some(allowed) = allowed {
			builder.require_isa(instance, allowed)
		}

		for comparison in comparisons(&self.values) {
			builder.require_predicate(instance, comparison)
		}

		Ok(Some(builder.build()))
	}
}

impl HasConcludable {
	fn unify<S: TypeHierarchy + ?Sized>(
		&self,
		rule: &Rule,
		schema: &S,
	) -> Result<Option<Unifier>, Error> {
		let Conclusion::Has(conclusion) = rule.conclusion() else {
			return Ok(None);
		};

		let owner_types = rule_types(rule, conclusion.owner(), schema)?;
		if !overlaps(self.annotations.get(&self.has.owner), owner_types.as_ref()) {
			log::trace!("{} cannot own the inferred attribute", self.has.owner);
			return Ok(None);
		}

		let produced = match &conclusion.ty {
			Some(ty) => rule_types(rule, ty, schema)?,
			None => None,
		};
		let produced = match produced {
			Some(types) => Some(types),
			None => rule_types(rule, conclusion.attribute(), schema)?,
		};
		if !overlaps(self.annotations.get(&self.has.attribute), produced.as_ref()) {
			log::trace!("{} cannot be the inferred attribute", self.has.attribute);
			return Ok(None);
		}

		let allowed = match &self.isa {
			Some(isa) => query_types(&isa.ty, isa.explicit, &self.annotations, schema)?,
			None => None,
		};
		if !overlaps(allowed.as_ref(), produced.as_ref()) {
			log::trace!("rule `{}` infers no attribute of the requested type", rule.label());
			return Ok(None);
		}

		if !values_satisfiable(&self.values, rule) {
			log::trace!("inferred value of rule `{}` is filtered out", rule.label());
			return Ok(None);
		}

		let mut builder = Unifier::builder(rule);
		builder.map(&self.has.owner, conclusion.owner());
		builder.map(&self.has.attribute, conclusion.attribute());

		if let (Some(isa), Some(rule_ty)) = (&self.isa, &conclusion.ty) {
			builder.map(&isa.ty, rule_ty)
		}

		if let Some(allowed) = allowed {
			builder.require_isa(conclusion.attribute(), allowed)
		}

		for comparison in comparisons(&self.values) {
			builder.require_predicate(conclusion.attribute(), comparison)
		}

		Ok(Some(builder.build()))
	}
}

impl ValueConcludable {
	fn unify<S: TypeHierarchy + ?Sized>(
		&self,
		rule: &Rule,
		schema: &S,
	) -> Result<Vec<Unifier>, Error> {
		let Some((attribute, inferred)) = rule.conclusion().value() else {
			return Ok(Vec::new());
		};

		let produced = match rule.conclusion().isa() {
			Some((_, ty)) => rule_types(rule, ty, schema)?,
			None => None,
		};
		let may_be_inferred = |x: &Variable| overlaps(self.annotations.get(x), produced.as_ref());

		let mut result = Vec::new();
		match &self.value.operand {
			Operand::Constant(c) => {
				if may_be_inferred(&self.value.owner)
					&& !inferred.refutes(self.value.predicate, c)
				{
					let mut builder = Unifier::builder(rule);
					builder.map(&self.value.owner, attribute);
					builder.require_predicate(
						attribute,
						Comparison {
							predicate: self.value.predicate,
							value: c.clone(),
						},
					);
					result.push(builder.build())
				}
			}
			Operand::Variable(y) => {
				if may_be_inferred(&self.value.owner) {
					let mut builder = Unifier::builder(rule);
					builder.map(&self.value.owner, attribute);
					result.push(builder.build())
				}

				if *y != self.value.owner && may_be_inferred(y) {
					let mut builder = Unifier::builder(rule);
					builder.map(y, attribute);
					result.push(builder.build())
				}
			}
		}

		Ok(result)
	}
}

impl RelationConcludable {
	fn unify<S: TypeHierarchy + ?Sized>(
		&self,
		rule: &Rule,
		schema: &S,
	) -> Result<Unifiers, Error> {
		let Conclusion::Relation(conclusion) = rule.conclusion() else {
			return Ok(Box::new(std::iter::empty()));
		};

		let players = &self.relation.players;
		let rule_players: Vec<(Variable, Variable)> = conclusion
			.role_players()
			.map(|(role, player)| (role.clone(), player.clone()))
			.collect();

		let produced = rule_types(rule, &conclusion.ty, schema)?;
		let mut rule_roles = Vec::with_capacity(rule_players.len());
		let mut rule_player_types = Vec::with_capacity(rule_players.len());
		for (role, player) in &rule_players {
			rule_roles.push(rule_types(rule, role, schema)?);
			rule_player_types.push(rule_types(rule, player, schema)?);
		}

		if players.len() > rule_players.len() {
			log::trace!(
				"rule `{}` concludes fewer role players than requested",
				rule.label()
			);
			return Ok(Box::new(std::iter::empty()));
		}

		let mut builder = Unifier::builder(rule);

		if !self.relation.owner.is_anonymous() {
			if !overlaps(self.annotations.get(&self.relation.owner), produced.as_ref()) {
				log::trace!("{} cannot be the inferred relation", self.relation.owner);
				return Ok(Box::new(std::iter::empty()));
			}

			builder.map(&self.relation.owner, conclusion.owner());
		}

		if let Some(isa) = &self.isa {
			let allowed = query_types(&isa.ty, isa.explicit, &self.annotations, schema)?;
			if !overlaps(allowed.as_ref(), produced.as_ref()) {
				log::trace!("rule `{}` concludes no {}", rule.label(), isa.ty);
				return Ok(Box::new(std::iter::empty()));
			}

			builder.map(&isa.ty, &conclusion.ty);
			if let Some(allowed) = allowed {
				builder.require_isa(conclusion.owner(), allowed)
			}
		}

		let mut query_roles = Vec::with_capacity(players.len());
		for rp in players {
			query_roles.push(match &rp.role {
				Some(role) => query_types(role, false, &self.annotations, schema)?,
				None => None,
			})
		}

		let assignments = Injections::new(players.len(), rule_players.len(), |i, j| {
			overlaps(query_roles[i].as_ref(), rule_roles[j].as_ref())
				&& overlaps(
					self.annotations.get(&players[i].player),
					rule_player_types[j].as_ref(),
				)
		});

		let players = players.clone();
		let relation = conclusion.owner().clone();
		let mut seen = HashSet::new();
		Ok(Box::new(assignments.filter_map(move |assignment| {
			let mut builder = builder.clone();
			for (i, &j) in assignment.iter().enumerate() {
				let (rule_role, rule_player) = &rule_players[j];
				let rp = &players[i];

				if let Some(role) = &rp.role {
					builder.map(role, rule_role);
					if let Some(allowed) = &query_roles[i] {
						builder.require_role(rule_role, &relation, rule_player, allowed.clone())
					}
				}

				builder.map(&rp.player, rule_player);
			}

			let unifier = builder.build();
			if seen.insert(unifier.clone()) {
				Some(unifier)
			} else {
				None
			}
		})))
	}
}
