mod common;

use common::*;
use concluder_core::{Predicate, SemanticError};
use concluder_logic::Concludable;

#[test]
fn extraction_order() {
	let query = conjunction([
		compare(var("v"), Predicate::Contains, var("w")),
		isa(var("a"), label("age")),
		value(var("a"), Predicate::Gt, 10i64),
		isa(var("x"), label("person")),
		has(var("x"), var("n")),
		isa(var("n"), label("name")),
		value(var("n"), Predicate::Eq, "bob"),
		relation(var("r"), &[(Some(role("employment", "employee")), var("x"))]),
		isa(var("r"), label("employment")),
	]);

	let concludables = Concludable::extract(&query).unwrap();
	assert_eq!(concludables.len(), 5);

	match &concludables[0] {
		Concludable::Relation(c) => {
			assert_eq!(c.relation.owner, var("r"));
			assert_eq!(c.isa.as_ref().map(|i| &i.ty), Some(&label("employment")))
		}
		other => panic!("expected a relation, found {other:?}"),
	}

	match &concludables[1] {
		Concludable::Has(c) => {
			assert_eq!(c.has.attribute, var("n"));
			assert_eq!(c.isa.as_ref().map(|i| &i.ty), Some(&label("name")));
			assert_eq!(c.values.len(), 1)
		}
		other => panic!("expected an ownership, found {other:?}"),
	}

	let isa: Vec<_> = concludables[2..4]
		.iter()
		.map(|c| match c {
			Concludable::Isa(c) => (c.isa.owner.clone(), c.values.len()),
			other => panic!("expected an isa, found {other:?}"),
		})
		.collect();
	assert_eq!(isa, vec![(var("a"), 1), (var("x"), 0)]);

	assert!(matches!(&concludables[4], Concludable::Value(c) if c.value.owner == var("v")))
}

#[test]
fn attached_constraints_are_not_repeated() {
	let query = conjunction([
		has(var("x"), var("n")),
		value(var("n"), Predicate::Contains, "o"),
		relation(var("r"), &[(None, var("x"))]),
		isa(var("r"), label("friendship")),
	]);

	let concludables = Concludable::extract(&query).unwrap();
	assert_eq!(concludables.len(), 2);
	assert_eq!(
		concludables.iter().map(|c| c.constraints().len()).sum::<usize>(),
		4
	)
}

#[test]
fn multiple_isa() {
	let query = conjunction([
		isa(var("x"), label("person")),
		isa(var("x"), label("company")),
	]);

	assert_eq!(
		Concludable::extract(&query),
		Err(SemanticError::MultipleIsa(var("x")))
	)
}

#[test]
fn annotations_are_restricted() {
	let query = conjunction([
		has(var("x"), var("n")),
		isa(var("y"), label("person")),
	])
	.with_annotation(var("x"), labels(&["person"]))
	.with_annotation(var("y"), labels(&["person"]));

	let concludables = Concludable::extract(&query).unwrap();
	let has = &concludables[0];
	assert_eq!(has.annotations().get(&var("x")), Some(&labels(&["person"])));
	assert_eq!(has.annotations().get(&var("y")), None)
}
