//! Structural equivalence of patterns up to variable renaming.
use std::{
	collections::{btree_map, BTreeMap},
	sync::Arc,
};

use concluder_core::{Conjunction, Constraint, Injections, IteratorSearch, Operand, Variable};
use hashbrown::HashSet;

/// Variable bijection under which two patterns are identical.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AlphaEquivalence(BTreeMap<Variable, Variable>);

impl AlphaEquivalence {
	/// Image of a variable of the first pattern.
	pub fn get(&self, x: &Variable) -> Option<&Variable> {
		self.0.get(x)
	}

	pub fn inverse(&self) -> Self {
		Self(self.0.iter().map(|(a, b)| (b.clone(), a.clone())).collect())
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> btree_map::Iter<Variable, Variable> {
		self.0.iter()
	}
}

impl<'a> IntoIterator for &'a AlphaEquivalence {
	type Item = (&'a Variable, &'a Variable);
	type IntoIter = btree_map::Iter<'a, Variable, Variable>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}

/// Patterns that can be compared up to variable renaming.
pub trait AlphaEquals {
	/// Every variable bijection making `self` and `other` identical.
	fn alpha_equals(&self, other: &Self) -> AlphaEquivalences;

	fn is_alpha_equivalent(&self, other: &Self) -> bool {
		self.alpha_equals(other).next().is_some()
	}
}

impl AlphaEquals for Conjunction {
	fn alpha_equals(&self, other: &Self) -> AlphaEquivalences {
		alpha_equals(self.constraints(), other.constraints())
	}
}

/// Lazily enumerates the alpha-equivalences between two lists of
/// constraints, without duplicates.
pub fn alpha_equals(a: &[Constraint], b: &[Constraint]) -> AlphaEquivalences {
	if a.len() != b.len() {
		return AlphaEquivalences::empty();
	}

	let a: Arc<[Constraint]> = a.into();
	let b: Arc<[Constraint]> = b.into();
	let len = a.len();

	let search = (0..len)
		.map(move |i| choices(&a, &b, i))
		.search(Bijection::default(), |state: &Bijection, (j, pairs): (usize, Pairs)| {
			state.extend(j, pairs)
		});

	AlphaEquivalences {
		inner: Box::new(search.map(Bijection::into_equivalence)),
		seen: HashSet::new(),
	}
}

/// Alpha-equivalences between two patterns.
pub struct AlphaEquivalences {
	inner: Box<dyn Iterator<Item = AlphaEquivalence> + Send>,
	seen: HashSet<AlphaEquivalence>,
}

impl AlphaEquivalences {
	pub fn empty() -> Self {
		Self {
			inner: Box::new(std::iter::empty()),
			seen: HashSet::new(),
		}
	}
}

impl Iterator for AlphaEquivalences {
	type Item = AlphaEquivalence;

	fn next(&mut self) -> Option<Self::Item> {
		loop {
			let e = self.inner.next()?;
			if self.seen.insert(e.clone()) {
				break Some(e);
			}
		}
	}
}

type Pairs = Vec<(Variable, Variable)>;

/// Partial bijection, with the constraints of the second pattern already
/// paired.
#[derive(Debug, Clone, Default)]
struct Bijection {
	forward: im::HashMap<Variable, Variable>,
	backward: im::HashMap<Variable, Variable>,
	used: im::HashSet<usize>,
}

impl Bijection {
	fn extend(&self, j: usize, pairs: Pairs) -> Option<Self> {
		if self.used.contains(&j) {
			return None;
		}

		let mut result = self.clone();
		result.used.insert(j);
		for (x, y) in pairs {
			if !result.bind(x, y) {
				return None;
			}
		}

		Some(result)
	}

	fn bind(&mut self, x: Variable, y: Variable) -> bool {
		if !x.is_renamable_to(&y) {
			return false;
		}

		let forward = self.forward.get(&x).cloned();
		let backward = self.backward.get(&y).cloned();
		match (forward, backward) {
			(Some(fx), Some(by)) => fx == y && by == x,
			(None, None) => {
				self.forward.insert(x.clone(), y.clone());
				self.backward.insert(y, x);
				true
			}
			_ => false,
		}
	}

	fn into_equivalence(self) -> AlphaEquivalence {
		AlphaEquivalence(self.forward.into_iter().collect())
	}
}

/// Constraints of `b` that the `i`-th constraint of `a` may pair with, with
/// the variable pairs each pairing implies.
fn choices(
	a: &Arc<[Constraint]>,
	b: &Arc<[Constraint]>,
	i: usize,
) -> Box<dyn Iterator<Item = (usize, Pairs)> + Send> {
	let a = a.clone();
	let b = b.clone();
	Box::new((0..b.len()).flat_map(move |j| pairings(&a[i], &b[j]).map(move |p| (j, p))))
}

fn roles_match(a: &Option<Variable>, b: &Option<Variable>) -> bool {
	match (a, b) {
		(None, None) => true,
		(Some(a), Some(b)) => a.is_renamable_to(b),
		_ => false,
	}
}

fn pairings(a: &Constraint, b: &Constraint) -> Box<dyn Iterator<Item = Pairs> + Send> {
	match (a, b) {
		(Constraint::Isa(a), Constraint::Isa(b)) if a.explicit == b.explicit => {
			Box::new(std::iter::once(vec![
				(a.owner.clone(), b.owner.clone()),
				(a.ty.clone(), b.ty.clone()),
			]))
		}
		(Constraint::Has(a), Constraint::Has(b)) => Box::new(std::iter::once(vec![
			(a.owner.clone(), b.owner.clone()),
			(a.attribute.clone(), b.attribute.clone()),
		])),
		(Constraint::Value(a), Constraint::Value(b)) if a.predicate == b.predicate => {
			let owners = (a.owner.clone(), b.owner.clone());
			match (&a.operand, &b.operand) {
				(Operand::Constant(x), Operand::Constant(y)) if x == y => {
					Box::new(std::iter::once(vec![owners]))
				}
				(Operand::Variable(x), Operand::Variable(y)) => {
					Box::new(std::iter::once(vec![owners, (x.clone(), y.clone())]))
				}
				_ => Box::new(std::iter::empty()),
			}
		}
		(Constraint::Relation(a), Constraint::Relation(b))
			if a.players.len() == b.players.len() =>
		{
			let len = a.players.len();
			let injections = Injections::new(len, len, |i, j| {
				roles_match(&a.players[i].role, &b.players[j].role)
					&& a.players[i]
						.player
						.is_renamable_to(&b.players[j].player)
			});

			let a = a.clone();
			let b = b.clone();
			Box::new(injections.map(move |assignment| {
				let mut pairs = vec![(a.owner.clone(), b.owner.clone())];
				for (i, &j) in assignment.iter().enumerate() {
					let (x, y) = (&a.players[i], &b.players[j]);
					if let (Some(rx), Some(ry)) = (&x.role, &y.role) {
						pairs.push((rx.clone(), ry.clone()))
					}

					pairs.push((x.player.clone(), y.player.clone()))
				}
				pairs
			}))
		}
		_ => Box::new(std::iter::empty()),
	}
}
