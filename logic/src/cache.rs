//! Memoization of unification results.
use concluder_core::{Error, TypeHierarchy};
use hashbrown::HashMap;

use crate::{concludable::Concludable, rule::Rule, unifier::Unifier};

/// Store of unifiers, keyed by concludable and rule.
///
/// Rules are compared structurally, not by label. Unification is a pure
/// function of the concludable, the rule and the schema, so a cache must be
/// dropped whenever the schema changes.
pub trait UnifierCache {
	fn get(&self, concludable: &Concludable, rule: &Rule) -> Option<&[Unifier]>;

	fn insert(&mut self, concludable: Concludable, rule: Rule, unifiers: Vec<Unifier>);
}

/// Cache storing nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl UnifierCache for NoCache {
	fn get(&self, _concludable: &Concludable, _rule: &Rule) -> Option<&[Unifier]> {
		None
	}

	fn insert(&mut self, _concludable: Concludable, _rule: Rule, _unifiers: Vec<Unifier>) {}
}

/// In-memory cache.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
	map: HashMap<Concludable, HashMap<Rule, Vec<Unifier>>>,
}

impl MemoryCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of cached (concludable, rule) pairs.
	pub fn len(&self) -> usize {
		self.map.values().map(HashMap::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn clear(&mut self) {
		self.map.clear()
	}
}

impl UnifierCache for MemoryCache {
	fn get(&self, concludable: &Concludable, rule: &Rule) -> Option<&[Unifier]> {
		self.map
			.get(concludable)
			.and_then(|rules| rules.get(rule))
			.map(Vec::as_slice)
	}

	fn insert(&mut self, concludable: Concludable, rule: Rule, unifiers: Vec<Unifier>) {
		self.map
			.entry(concludable)
			.or_default()
			.insert(rule, unifiers);
	}
}

impl Concludable {
	/// Same as [`Concludable::unify`], going through `cache`.
	pub fn unify_cached<S: TypeHierarchy + ?Sized, C: UnifierCache + ?Sized>(
		&self,
		rule: &Rule,
		schema: &S,
		cache: &mut C,
	) -> Result<Vec<Unifier>, Error> {
		if let Some(unifiers) = cache.get(self, rule) {
			log::trace!("unifiers with rule `{}` found in cache", rule.label());
			return Ok(unifiers.to_vec());
		}

		let unifiers: Vec<_> = self.unify(rule, schema)?.collect();
		cache.insert(self.clone(), rule.clone(), unifiers.clone());
		Ok(unifiers)
	}
}
