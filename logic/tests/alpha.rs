mod common;

use common::*;
use concluder_core::{Constraint, Operand, Predicate, RolePlayer, Value, Variable};
use concluder_logic::{alpha_equals, AlphaEquals, AlphaEquivalence, Concludable};
use proptest::prelude::*;

fn equivalences(a: &[Constraint], b: &[Constraint]) -> Vec<AlphaEquivalence> {
	alpha_equals(a, b).collect()
}

fn is_identity(e: &AlphaEquivalence) -> bool {
	e.iter().all(|(a, b)| a == b)
}

#[test]
fn symmetric_relation() {
	let pattern = [
		relation(
			var("r"),
			&[
				(Some(role("employment", "employee")), var("x")),
				(Some(role("employment", "employee")), var("y")),
			],
		),
		isa(var("r"), label("employment")),
	];

	let result = equivalences(&pattern, &pattern);
	assert_eq!(result.len(), 2);
	assert!(result.iter().any(is_identity));
	assert!(result
		.iter()
		.any(|e| e.get(&var("x")) == Some(&var("y")) && e.get(&var("y")) == Some(&var("x"))))
}

#[test]
fn labels_must_match() {
	assert!(equivalences(
		&[isa(var("x"), label("person"))],
		&[isa(var("y"), label("company"))]
	)
	.is_empty());

	assert!(equivalences(
		&[isa(var("x"), label("person"))],
		&[Constraint::isa_explicit(var("y"), label("person"))]
	)
	.is_empty());

	let result = equivalences(
		&[isa(var("x"), label("person"))],
		&[isa(var("y"), label("person"))],
	);
	assert_eq!(result.len(), 1);
	assert_eq!(result[0].get(&var("x")), Some(&var("y")));
	assert_eq!(result[0].get(&label("person")), Some(&label("person")))
}

#[test]
fn named_and_anonymous() {
	assert!(equivalences(&[has(var("x"), var("y"))], &[has(var("x"), anon(0))]).is_empty());
	assert_eq!(
		equivalences(&[has(var("x"), anon(3))], &[has(var("p"), anon(0))]).len(),
		1
	)
}

#[test]
fn value_constants() {
	assert_eq!(
		equivalences(
			&[value(var("x"), Predicate::Eq, 1i64)],
			&[value(var("y"), Predicate::Eq, 1i64)]
		)
		.len(),
		1
	);
	assert!(equivalences(
		&[value(var("x"), Predicate::Eq, 1i64)],
		&[value(var("y"), Predicate::Eq, 2i64)]
	)
	.is_empty());
	assert!(equivalences(
		&[value(var("x"), Predicate::Eq, 1i64)],
		&[value(var("y"), Predicate::Gt, 1i64)]
	)
	.is_empty());
	assert!(equivalences(
		&[value(var("x"), Predicate::Eq, 1i64)],
		&[compare(var("y"), Predicate::Eq, var("z"))]
	)
	.is_empty());
}

#[test]
fn lengths_differ() {
	assert!(equivalences(
		&[has(var("x"), var("y"))],
		&[has(var("x"), var("y")), has(var("x"), var("z"))]
	)
	.is_empty());

	assert!(equivalences(
		&[relation(var("r"), &[(None, var("x"))])],
		&[relation(var("r"), &[(None, var("x")), (None, var("y"))])]
	)
	.is_empty())
}

#[test]
fn has_mapping() {
	let result = equivalences(
		&[has(var("x"), var("a")), isa(var("a"), label("name"))],
		&[isa(var("b"), label("name")), has(var("p"), var("b"))],
	);
	assert_eq!(result.len(), 1);
	assert_eq!(result[0].get(&var("x")), Some(&var("p")));
	assert_eq!(result[0].get(&var("a")), Some(&var("b")));
	assert_eq!(result[0].inverse().get(&var("b")), Some(&var("a")))
}

#[test]
fn repeated_constraints() {
	let result = equivalences(
		&[has(var("x"), var("y")), has(var("x"), var("y"))],
		&[has(var("a"), var("b")), has(var("a"), var("b"))],
	);
	assert_eq!(result.len(), 1)
}

#[test]
fn inconsistent_renaming() {
	assert!(equivalences(
		&[has(var("x"), var("y")), has(var("y"), var("z"))],
		&[has(var("a"), var("b")), has(var("c"), var("d"))]
	)
	.is_empty())
}

#[test]
fn conjunctions() {
	let a = conjunction([has(var("x"), var("n")), isa(var("n"), label("name"))]);
	let b = conjunction([has(var("y"), var("m")), isa(var("m"), label("name"))]);
	let c = conjunction([has(var("y"), var("m")), isa(var("m"), label("age"))]);
	assert!(a.is_alpha_equivalent(&b));
	assert!(!a.is_alpha_equivalent(&c))
}

#[test]
fn concludables() {
	let has_query = Concludable::extract(&conjunction([has(var("x"), var("n"))])).unwrap();
	let other = Concludable::extract(&conjunction([has(var("y"), var("m"))])).unwrap();
	assert!(has_query[0].is_alpha_equivalent(&other[0]));

	let isa_query = Concludable::extract(&conjunction([isa(var("x"), var("n"))])).unwrap();
	assert!(!has_query[0].is_alpha_equivalent(&isa_query[0]))
}

const NAMES: u32 = 4;

fn variable() -> impl Strategy<Value = Variable> {
	prop_oneof![
		(0..NAMES).prop_map(|i| Variable::name(format!("v{i}"))),
		(0..3u32).prop_map(Variable::Anonymous),
	]
}

fn type_variable() -> impl Strategy<Value = Variable> {
	prop_oneof![
		Just(Variable::label("person")),
		Just(Variable::label("name")),
		variable(),
	]
}

fn role_variable() -> impl Strategy<Value = Option<Variable>> {
	prop::option::of(prop_oneof![
		Just(Variable::role("employment", "employee")),
		Just(Variable::role("employment", "employer")),
		variable(),
	])
}

fn operand() -> impl Strategy<Value = Operand> {
	prop_oneof![
		(0..3i64).prop_map(|i| Operand::Constant(Value::Long(i))),
		variable().prop_map(Operand::Variable),
	]
}

fn constraint() -> impl Strategy<Value = Constraint> {
	prop_oneof![
		(variable(), type_variable(), any::<bool>()).prop_map(|(owner, ty, explicit)| {
			if explicit {
				Constraint::isa_explicit(owner, ty)
			} else {
				Constraint::isa(owner, ty)
			}
		}),
		(variable(), variable()).prop_map(|(owner, attribute)| Constraint::has(owner, attribute)),
		(
			variable(),
			prop::collection::vec((role_variable(), variable()), 1..=3)
		)
			.prop_map(|(owner, players)| {
				Constraint::relation(
					owner,
					players
						.into_iter()
						.map(|(role, player)| RolePlayer::new(role, player)),
				)
			}),
		(
			variable(),
			prop_oneof![Just(Predicate::Eq), Just(Predicate::Gt)],
			operand()
		)
			.prop_map(|(owner, predicate, operand)| Constraint::value(owner, predicate, operand)),
	]
}

/// A pattern with a random renaming of its variables.
fn renamed_pattern() -> impl Strategy<Value = (Vec<Constraint>, Vec<Constraint>)> {
	(
		prop::collection::vec(constraint(), 1..5),
		Just((0..NAMES).collect::<Vec<_>>()).prop_shuffle(),
	)
		.prop_map(|(pattern, permutation)| {
			let renamed = pattern
				.iter()
				.rev()
				.map(|c| c.map_variables(|x| rename(x, &permutation)))
				.collect();
			(pattern, renamed)
		})
}

fn rename(x: &Variable, permutation: &[u32]) -> Variable {
	match x {
		Variable::Name(name) => {
			let i: usize = name[1..].parse().unwrap();
			Variable::name(format!("w{}", permutation[i]))
		}
		Variable::Anonymous(i) => Variable::Anonymous(i + 10),
		Variable::Label(_) => x.clone(),
	}
}

fn apply(e: &AlphaEquivalence, pattern: &[Constraint]) -> Vec<Constraint> {
	pattern
		.iter()
		.map(|c| c.map_variables(|x| e.get(x).cloned().unwrap_or_else(|| x.clone())))
		.collect()
}

/// Sorted constraints, with sorted role players.
fn normalize(mut pattern: Vec<Constraint>) -> Vec<Constraint> {
	for c in &mut pattern {
		if let Constraint::Relation(r) = c {
			r.players.sort()
		}
	}

	pattern.sort();
	pattern
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(64))]

	#[test]
	fn reflexive(pattern in prop::collection::vec(constraint(), 1..5)) {
		prop_assert!(alpha_equals(&pattern, &pattern).any(|e| is_identity(&e)));
	}

	#[test]
	fn renaming_is_found((pattern, renamed) in renamed_pattern()) {
		prop_assert!(alpha_equals(&pattern, &renamed).next().is_some());
	}

	#[test]
	fn sound((pattern, renamed) in renamed_pattern()) {
		let expected = normalize(renamed.clone());
		for e in alpha_equals(&pattern, &renamed) {
			prop_assert_eq!(normalize(apply(&e, &pattern)), expected.clone());
		}
	}

	#[test]
	fn symmetric((pattern, renamed) in renamed_pattern()) {
		let mut forward: Vec<_> = alpha_equals(&pattern, &renamed).map(|e| e.inverse()).collect();
		let mut backward: Vec<_> = alpha_equals(&renamed, &pattern).collect();
		forward.sort();
		backward.sort();
		prop_assert_eq!(forward, backward);
	}
}
