//! Unifiers between a concludable and a rule conclusion.
//!
//! A unifier translates answers in both directions: query bounds are pushed
//! to the rule side with [`Unifier::unify`], and answers found for the rule
//! are pulled back to the query side with [`Unifier::un_unify`].
use std::collections::{BTreeMap, BTreeSet};

use concluder_core::{
	Comparison, Concept, ConceptMap, Error, Intersect, Label, SemanticError, Thing, Variable,
};
use derivative::Derivative;

use crate::{
	requirement,
	rule::{Conclusion, Rule},
};

/// Role requirement attached to a rule role variable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoleRequirement {
	/// Relation instance variable.
	pub relation: Variable,

	/// Players of the role.
	pub players: BTreeSet<Variable>,

	/// Acceptable role labels.
	pub allowed: BTreeSet<Label>,
}

/// Constraints the concepts bound to rule variables must satisfy, carried
/// over from the query side.
///
/// All maps are keyed by rule variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Requirements {
	isa_explicit: BTreeMap<Variable, BTreeSet<Label>>,
	role_types: BTreeMap<Variable, RoleRequirement>,
	predicates: BTreeMap<Variable, BTreeSet<Comparison>>,
}

impl Requirements {
	/// Exact types allowed for instance variables.
	pub fn isa_explicit(&self) -> &BTreeMap<Variable, BTreeSet<Label>> {
		&self.isa_explicit
	}

	pub fn role_types(&self) -> &BTreeMap<Variable, RoleRequirement> {
		&self.role_types
	}

	/// Value comparisons on attribute variables.
	pub fn predicates(&self) -> &BTreeMap<Variable, BTreeSet<Comparison>> {
		&self.predicates
	}

	pub fn is_empty(&self) -> bool {
		self.isa_explicit.is_empty() && self.role_types.is_empty() && self.predicates.is_empty()
	}

	/// Checks a concept bound to the rule variable `x`.
	pub fn admits<T: Thing>(&self, x: &Variable, concept: &Concept<T>) -> Result<bool, SemanticError> {
		if let Some(types) = self.isa_explicit.get(x) {
			if !requirement::check_isa_explicit(concept, types) {
				return Ok(false);
			}
		}

		if let Some(role) = self.role_types.get(x) {
			if !requirement::check_role_label(concept, &role.allowed) {
				return Ok(false);
			}
		}

		if let Some(comparisons) = self.predicates.get(x) {
			for comparison in comparisons {
				if !requirement::check_predicate(concept, comparison)? {
					return Ok(false);
				}
			}
		}

		Ok(true)
	}

	/// Checks a complete rule answer. Requirements on unbound variables are
	/// skipped.
	fn admits_answer<T: Thing>(&self, answer: &ConceptMap<T>) -> Result<bool, SemanticError> {
		for (x, types) in &self.isa_explicit {
			match answer.get(x) {
				Some(concept) => {
					if !requirement::check_isa_explicit(concept, types) {
						log::trace!("{x} does not have an allowed type");
						return Ok(false);
					}
				}
				None => log::debug!("skipping type requirement of unbound {x}"),
			}
		}

		for (x, comparisons) in &self.predicates {
			match answer.get(x) {
				Some(concept) => {
					for comparison in comparisons {
						if !requirement::check_predicate(concept, comparison)? {
							log::trace!("{x} does not satisfy `{comparison}`");
							return Ok(false);
						}
					}
				}
				None => log::debug!("skipping value requirement of unbound {x}"),
			}
		}

		for (x, role) in &self.role_types {
			let label = match x {
				Variable::Label(label) => Some(Concept::Type(label.clone())),
				x => answer.get(x).cloned(),
			};

			match label {
				Some(concept) => {
					if !requirement::check_role_label(&concept, &role.allowed) {
						log::trace!("{x} is not an allowed role");
						return Ok(false);
					}
				}
				None => match answer.get(&role.relation) {
					Some(Concept::Thing(relation)) => {
						for player in &role.players {
							if let Some(Concept::Thing(player)) = answer.get(player) {
								if !requirement::check_role_type(relation, player, &role.allowed) {
									log::trace!("{player:?} plays no allowed role in {relation:?}");
									return Ok(false);
								}
							}
						}
					}
					_ => log::debug!("skipping role requirement of unbound {x}"),
				},
			}
		}

		Ok(true)
	}
}

/// How rule variables left unbound by an answer derive from bound ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Derivations {
	/// Type variable to the instance it types.
	types: BTreeMap<Variable, Variable>,

	/// Role variable to its relation and players.
	roles: BTreeMap<Variable, (Variable, BTreeSet<Variable>)>,
}

impl Derivations {
	fn new(conclusion: &Conclusion) -> Self {
		let mut result = Self::default();
		match conclusion {
			Conclusion::Relation(r) => {
				if r.ty.is_retrievable() {
					result.types.insert(r.ty.clone(), r.owner().clone());
				}

				for (role, player) in r.role_players() {
					if role.is_retrievable() {
						result
							.roles
							.entry(role.clone())
							.or_insert_with(|| (r.owner().clone(), BTreeSet::new()))
							.1
							.insert(player.clone());
					}
				}
			}
			Conclusion::Has(h) => {
				if let Some(ty) = h.ty.as_ref().filter(|ty| ty.is_retrievable()) {
					result.types.insert(ty.clone(), h.attribute().clone());
				}
			}
		}

		result
	}
}

/// Query bounds as pushed to the rule side.
///
/// Answers pulled back from the rule must agree with them.
#[derive(Debug, Clone, PartialEq, Eq, Derivative)]
#[derivative(Default(bound = ""))]
pub struct InstanceRequirements<T>(ConceptMap<T>);

impl<T: PartialEq> InstanceRequirements<T> {
	pub fn new(bounds: ConceptMap<T>) -> Self {
		Self(bounds)
	}

	pub fn get(&self, x: &Variable) -> Option<&Concept<T>> {
		self.0.get(x)
	}

	pub fn as_concept_map(&self) -> &ConceptMap<T> {
		&self.0
	}
}

/// Variable mapping from query variables to rule variables, with the
/// requirements making it sound.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Unifier {
	mapping: BTreeMap<Variable, BTreeSet<Variable>>,
	requirements: Requirements,
	derivations: Derivations,
}

impl Unifier {
	pub(crate) fn builder(rule: &Rule) -> UnifierBuilder {
		UnifierBuilder {
			mapping: BTreeMap::new(),
			requirements: Requirements::default(),
			derivations: Derivations::new(rule.conclusion()),
		}
	}

	/// Mapping from retrievable query variables to rule variables.
	pub fn mapping(&self) -> &BTreeMap<Variable, BTreeSet<Variable>> {
		&self.mapping
	}

	pub fn get(&self, x: &Variable) -> Option<&BTreeSet<Variable>> {
		self.mapping.get(x)
	}

	pub fn requirements(&self) -> &Requirements {
		&self.requirements
	}

	/// Rule variables to the query variables mapped to them.
	pub fn reverse(&self) -> BTreeMap<&Variable, BTreeSet<&Variable>> {
		let mut result: BTreeMap<_, BTreeSet<_>> = BTreeMap::new();
		for (q, targets) in &self.mapping {
			for r in targets {
				result.entry(r).or_default().insert(q);
			}
		}
		result
	}

	/// Pushes query bounds to the rule side.
	///
	/// Returns `None` when the bounds are inconsistent with the rule, that
	/// is when a bound disagrees with a rule label, violates a requirement,
	/// or when two query variables mapped to the same rule variable carry
	/// different concepts. Otherwise returns the rule-side bounds, with the
	/// pushed bounds the pulled answers must agree with.
	pub fn unify<T: Thing>(
		&self,
		bounds: &ConceptMap<T>,
	) -> Result<Option<(ConceptMap<T>, InstanceRequirements<T>)>, Error> {
		let mut unified = ConceptMap::new();
		let mut instance = ConceptMap::new();

		for (x, concept) in bounds {
			let Some(targets) = self.mapping.get(x) else {
				continue;
			};

			instance.insert(x.clone(), concept.clone());
			for target in targets {
				if let Variable::Label(label) = target {
					if concept.as_type() != Some(label) {
						log::trace!("{x} cannot be bound to {target}");
						return Ok(None);
					}

					continue;
				}

				if !self.requirements.admits(target, concept)? {
					log::trace!("{x} violates the requirements of {target}");
					return Ok(None);
				}

				match unified.get(target) {
					Some(other) if other != concept => {
						log::trace!("conflicting bounds for {target}");
						return Ok(None);
					}
					Some(_) => (),
					None => {
						unified.insert(target.clone(), concept.clone());
					}
				}
			}
		}

		Ok(Some((unified, InstanceRequirements(instance))))
	}

	/// Pulls a rule answer back to the query side.
	///
	/// Rule variables the answer leaves unbound are derived when possible:
	/// label variables denote their label, type variables the type of the
	/// instance they type, and role variables any role the relation
	/// instance gives to their players. This last case may produce several
	/// query answers, enumerated lazily.
	pub fn un_unify<T: Thing>(
		&self,
		answer: &ConceptMap<T>,
		instance: &InstanceRequirements<T>,
	) -> UnUnified<T> {
		match self.pull(answer, instance) {
			Ok(Some((base, choices))) => UnUnified::new(base, choices),
			Ok(None) => UnUnified::empty(),
			Err(e) => UnUnified::error(e.into()),
		}
	}

	#[allow(clippy::type_complexity)]
	fn pull<T: Thing>(
		&self,
		answer: &ConceptMap<T>,
		instance: &InstanceRequirements<T>,
	) -> Result<Option<(ConceptMap<T>, Vec<(Variable, Vec<Concept<T>>)>)>, SemanticError> {
		if !self.requirements.admits_answer(answer)? {
			return Ok(None);
		}

		let mut base = ConceptMap::new();
		let mut choices = Vec::new();

		for (x, targets) in &self.mapping {
			let mut fixed: Option<Concept<T>> = None;
			let mut options: Option<Vec<Concept<T>>> = None;

			for target in targets {
				match self.resolve(target, answer) {
					Resolved::One(concept) => {
						if fixed.as_ref().map_or(false, |other| *other != concept) {
							log::trace!("{x} resolves to more than one concept");
							return Ok(None);
						}

						fixed = Some(concept)
					}
					Resolved::Many(candidates) => {
						options = Some(match options {
							Some(current) => current
								.into_iter()
								.filter(|c| candidates.contains(c))
								.collect(),
							None => candidates,
						})
					}
					Resolved::Unbound => (),
				}
			}

			let required = instance.get(x);
			match (fixed, options) {
				(Some(concept), options) => {
					if options.map_or(false, |options| !options.contains(&concept))
						|| required.map_or(false, |r| *r != concept)
					{
						log::trace!("{x} does not match its pushed bound");
						return Ok(None);
					}

					base.insert(x.clone(), concept);
				}
				(None, Some(mut options)) => {
					if let Some(r) = required {
						options.retain(|c| c == r)
					}

					match options.len() {
						0 => return Ok(None),
						1 => {
							base.extend(options.pop().map(|c| (x.clone(), c)));
						}
						_ => choices.push((x.clone(), options)),
					}
				}
				(None, None) => (),
			}
		}

		Ok(Some((base, choices)))
	}

	fn resolve<T: Thing>(&self, x: &Variable, answer: &ConceptMap<T>) -> Resolved<T> {
		if let Some(concept) = answer.get(x) {
			return Resolved::One(concept.clone());
		}

		if let Variable::Label(label) = x {
			return Resolved::One(Concept::Type(label.clone()));
		}

		if let Some(instance) = self.derivations.types.get(x) {
			if let Some(Concept::Thing(t)) = answer.get(instance) {
				return Resolved::One(Concept::Type(t.type_label().clone()));
			}
		}

		if let Some((relation, players)) = self.derivations.roles.get(x) {
			if let Some(Concept::Thing(relation)) = answer.get(relation) {
				let mut candidates: Option<BTreeSet<Label>> = None;
				for player in players {
					if let Some(Concept::Thing(player)) = answer.get(player) {
						let roles: BTreeSet<_> = relation.role_types(player).into_iter().collect();
						match &mut candidates {
							Some(c) => c.intersect_with(&roles),
							None => candidates = Some(roles),
						}
					}
				}

				if let Some(mut candidates) = candidates {
					if let Some(role) = self.requirements.role_types.get(x) {
						candidates.intersect_with(&role.allowed)
					}

					return Resolved::Many(candidates.into_iter().map(Concept::Type).collect());
				}
			}
		}

		Resolved::Unbound
	}
}

enum Resolved<T> {
	One(Concept<T>),
	Many(Vec<Concept<T>>),
	Unbound,
}

/// Lazy sequence of query answers pulled back from a rule answer.
pub struct UnUnified<T> {
	error: Option<Error>,
	base: ConceptMap<T>,
	choices: Vec<(Variable, Vec<Concept<T>>)>,
	cursor: Vec<usize>,
	done: bool,
}

impl<T> UnUnified<T> {
	fn new(base: ConceptMap<T>, choices: Vec<(Variable, Vec<Concept<T>>)>) -> Self {
		Self {
			error: None,
			base,
			cursor: vec![0; choices.len()],
			choices,
			done: false,
		}
	}

	fn empty() -> Self {
		Self {
			error: None,
			base: ConceptMap::new(),
			choices: Vec::new(),
			cursor: Vec::new(),
			done: true,
		}
	}

	fn error(e: Error) -> Self {
		Self {
			error: Some(e),
			..Self::empty()
		}
	}
}

impl<T: Clone> Iterator for UnUnified<T> {
	type Item = Result<ConceptMap<T>, Error>;

	fn next(&mut self) -> Option<Self::Item> {
		if let Some(e) = self.error.take() {
			return Some(Err(e));
		}

		if self.done {
			return None;
		}

		let mut result = self.base.clone();
		for ((x, options), &i) in self.choices.iter().zip(&self.cursor) {
			result.insert(x.clone(), options[i].clone());
		}

		self.done = true;
		for (k, i) in self.cursor.iter_mut().enumerate().rev() {
			*i += 1;
			if *i < self.choices[k].1.len() {
				self.done = false;
				break;
			}

			*i = 0
		}

		Some(Ok(result))
	}
}

/// Incremental unifier construction.
#[derive(Debug, Clone)]
pub(crate) struct UnifierBuilder {
	mapping: BTreeMap<Variable, BTreeSet<Variable>>,
	requirements: Requirements,
	derivations: Derivations,
}

impl UnifierBuilder {
	/// Map a query variable to a rule variable. Label variables are never
	/// mapped.
	pub fn map(&mut self, query: &Variable, rule: &Variable) {
		if query.is_retrievable() {
			self.mapping
				.entry(query.clone())
				.or_default()
				.insert(rule.clone());
		}
	}

	pub fn require_isa(&mut self, x: &Variable, allowed: BTreeSet<Label>) {
		match self.requirements.isa_explicit.get_mut(x) {
			Some(current) => current.intersect_with(&allowed),
			None => {
				self.requirements.isa_explicit.insert(x.clone(), allowed);
			}
		}
	}

	pub fn require_role(
		&mut self,
		role: &Variable,
		relation: &Variable,
		player: &Variable,
		allowed: BTreeSet<Label>,
	) {
		match self.requirements.role_types.get_mut(role) {
			Some(current) => {
				current.players.insert(player.clone());
				current.allowed.intersect_with(&allowed)
			}
			None => {
				self.requirements.role_types.insert(
					role.clone(),
					RoleRequirement {
						relation: relation.clone(),
						players: std::iter::once(player.clone()).collect(),
						allowed,
					},
				);
			}
		}
	}

	pub fn require_predicate(&mut self, x: &Variable, comparison: Comparison) {
		self.requirements
			.predicates
			.entry(x.clone())
			.or_default()
			.insert(comparison);
	}

	pub fn build(self) -> Unifier {
		Unifier {
			mapping: self.mapping,
			requirements: self.requirements,
			derivations: self.derivations,
		}
	}
}
