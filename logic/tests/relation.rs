mod common;

use std::collections::BTreeSet;

use common::*;
use concluder_core::{
	Concept, ConceptMap, Conjunction, Error, Label, SchemaError, Snapshot, TypeHierarchy, Variable,
};
use concluder_logic::{Concludable, InstanceRequirements, Rule, Unifier};

fn unifiers_with(schema: &impl TypeHierarchy, query: &Conjunction, rule: &Rule) -> Vec<Unifier> {
	let concludables = Concludable::extract(query).unwrap();
	assert_eq!(concludables.len(), 1);
	concludables[0].unify(rule, schema).unwrap().collect()
}

fn unifiers(query: &Conjunction, rule: &Rule) -> Vec<Unifier> {
	unifiers_with(&schema(), query, rule)
}

fn employee() -> Option<Variable> {
	Some(role("employment", "employee"))
}

fn employees(players: &[&str]) -> Conjunction {
	let players: Vec<_> = players.iter().map(|p| (employee(), var(p))).collect();
	conjunction([relation(var("r"), &players)])
}

#[test]
fn duplicate_rule_players() {
	let rule = employment_rule(&["x", "x"]);

	let result = unifiers(&employees(&["p", "q"]), &rule);
	assert_eq!(result.len(), 1);
	let unifier = &result[0];
	assert_eq!(unifier.get(&var("p")), Some(&vars(&[var("x")])));
	assert_eq!(unifier.get(&var("q")), Some(&vars(&[var("x")])));
	assert_eq!(unifier.get(&var("r")), Some(&vars(&[anon(0)])));

	let requirement = &unifier.requirements().role_types()[&role("employment", "employee")];
	assert_eq!(
		requirement.allowed,
		labels(&["employment:employee", "part-time-employment:part-time-employee"])
	);
	assert_eq!(requirement.players, vars(&[var("x")]));

	assert_eq!(unifiers(&employees(&["p", "p"]), &rule).len(), 1)
}

#[test]
fn duplicate_rule_players_answers() {
	let rule = employment_rule(&["x", "x"]);
	let result = unifiers(&employees(&["p", "q"]), &rule);
	let unifier = &result[0];

	let alice = Instance::new(0, "person");
	let bob = Instance::new(1, "person");
	let bounds: ConceptMap<Instance> = [
		(var("p"), Concept::Thing(alice.clone())),
		(var("q"), Concept::Thing(bob)),
	]
	.into_iter()
	.collect();
	assert_eq!(unifier.unify(&bounds).unwrap(), None);

	let employment = Instance::new(2, "employment")
		.with_player("employment:employee", &alice)
		.with_player("employment:employee", &alice);
	let answer: ConceptMap<Instance> = [
		(var("x"), Concept::Thing(alice.clone())),
		(anon(0), Concept::Thing(employment.clone())),
	]
	.into_iter()
	.collect();
	let pulled: Vec<_> = unifier
		.un_unify(&answer, &InstanceRequirements::default())
		.collect::<Result<_, _>>()
		.unwrap();
	let expected: ConceptMap<Instance> = [
		(var("p"), Concept::Thing(alice.clone())),
		(var("q"), Concept::Thing(alice)),
		(var("r"), Concept::Thing(employment)),
	]
	.into_iter()
	.collect();
	assert_eq!(pulled, vec![expected])
}

#[test]
fn unknown_rule_types() {
	let schema = schema();
	let misspelt = Rule::new(
		"misspelt",
		conjunction([isa(var("x"), label("person"))]),
		conjunction([
			relation(anon(0), &[(employee(), var("x"))]),
			isa(anon(0), label("emplyment")),
		]),
	)
	.unwrap();

	let query = conjunction([isa(var("e"), var("t"))]);
	let concludable = Concludable::extract(&query).unwrap().remove(0);
	assert_eq!(
		concludable.unify(&misspelt, &schema).err(),
		Some(Error::Schema(SchemaError::UnknownType(Label::new("emplyment"))))
	);

	let query = conjunction([relation(var("r"), &[(None, var("p"))])]);
	let concludable = Concludable::extract(&query).unwrap().remove(0);
	assert_eq!(
		concludable.unify(&misspelt, &schema).err(),
		Some(Error::Schema(SchemaError::UnknownType(Label::new("emplyment"))))
	);

	let unknown_role = Rule::new(
		"unknown-role",
		conjunction([isa(var("x"), label("person"))]),
		conjunction([
			relation(anon(0), &[(Some(role("employment", "boss")), var("x"))]),
			isa(anon(0), label("employment")),
		]),
	)
	.unwrap();
	assert_eq!(
		concludable.unify(&unknown_role, &schema).err(),
		Some(Error::Schema(SchemaError::UnknownRole(Label::from(
			"employment:boss"
		))))
	)
}

#[test]
fn unifiers_are_sendable() {
	fn assert_send<T: Send>(_: &T) {}

	let rule = employment_rule(&["x", "y"]);
	let schema = schema();
	let concludable = Concludable::extract(&employees(&["p"])).unwrap().remove(0);
	let unifiers = concludable.unify(&rule, &schema).unwrap();
	assert_send(&unifiers);
	assert_eq!(
		std::thread::spawn(move || unifiers.count()).join().unwrap(),
		2
	)
}

#[test]
fn duplicate_query_players() {
	let rule = employment_rule(&["x", "y"]);

	let result = unifiers(&employees(&["p", "p"]), &rule);
	assert_eq!(result.len(), 1);
	assert_eq!(result[0].get(&var("p")), Some(&vars(&[var("x"), var("y")])));
	assert_eq!(
		result[0].reverse().get(&var("x")),
		Some(&[&var("p")].into_iter().collect::<BTreeSet<_>>())
	)
}

#[test]
fn many_to_many() {
	let rule = employment_rule(&["x", "y", "z"]);
	let result = unifiers(&employees(&["p", "q"]), &rule);
	assert_eq!(result.len(), 6);

	let distinct: BTreeSet<_> = result.iter().map(|u| u.mapping().clone()).collect();
	assert_eq!(distinct.len(), 6)
}

#[test]
fn role_variable() {
	let rule = employment_rule(&["x", "y", "z"]);
	let query = conjunction([relation(var("r"), &[(Some(var("role")), var("p"))])]);

	let result = unifiers(&query, &rule);
	assert_eq!(result.len(), 3);
	for unifier in &result {
		assert_eq!(
			unifier.get(&var("role")),
			Some(&vars(&[role("employment", "employee")]))
		);
		assert!(unifier.requirements().role_types().is_empty())
	}
}

#[test]
fn unspecified_roles() {
	let rule = employment_rule(&["x", "y"]);
	let query = conjunction([relation(var("r"), &[(None, var("a")), (None, var("b"))])]);
	assert_eq!(unifiers(&query, &rule).len(), 2)
}

#[test]
fn too_many_query_players() {
	let rule = employment_rule(&["x", "y"]);
	assert!(unifiers(&employees(&["p", "q", "s"]), &rule).is_empty())
}

#[test]
fn incompatible_role() {
	let rule = employment_rule(&["x"]);

	let employer = conjunction([relation(
		var("r"),
		&[(Some(role("employment", "employer")), var("p"))],
	)]);
	assert!(unifiers(&employer, &rule).is_empty());

	let part_time = conjunction([relation(
		var("r"),
		&[(
			Some(role("part-time-employment", "part-time-employee")),
			var("p"),
		)],
	)]);
	assert!(unifiers(&part_time, &rule).is_empty())
}

#[test]
fn overridden_role() {
	let rule = Rule::new(
		"part-time",
		conjunction([isa(var("x"), label("person"))]),
		conjunction([
			relation(
				anon(0),
				&[(
					Some(role("part-time-employment", "part-time-employee")),
					var("x"),
				)],
			),
			isa(anon(0), label("part-time-employment")),
		]),
	)
	.unwrap();

	let query = conjunction([
		relation(var("r"), &[(employee(), var("p"))]),
		isa(var("r"), label("employment")),
	]);

	let result = unifiers(&query, &rule);
	assert_eq!(result.len(), 1);
	assert_eq!(
		result[0].requirements().isa_explicit().get(&anon(0)),
		Some(&labels(&["employment", "part-time-employment"]))
	)
}

#[test]
fn relation_type() {
	let rule = employment_rule(&["x"]);

	let subtype = conjunction([
		relation(var("r"), &[(employee(), var("p"))]),
		isa(var("r"), label("part-time-employment")),
	]);
	assert!(unifiers(&subtype, &rule).is_empty());

	let variable = conjunction([
		relation(anon(3), &[(employee(), var("p"))]),
		isa(anon(3), var("t")),
	]);
	let result = unifiers(&variable, &rule);
	assert_eq!(result.len(), 1);
	assert_eq!(result[0].get(&var("t")), Some(&vars(&[label("employment")])));
	assert_eq!(result[0].get(&anon(3)), None)
}

#[test]
fn distinct_roles_have_one_unifier() {
	for k in 1..=4usize {
		let mut builder = Snapshot::builder().entity("person").relation("team");
		for i in 0..k {
			builder = builder.relates("team", format!("r{i}"));
		}
		let schema = builder.build().unwrap();

		let rule_players: Vec<_> = (0..k)
			.map(|i| (Some(role("team", &format!("r{i}"))), var(&format!("x{i}"))))
			.collect();
		let rule = Rule::new(
			"team",
			conjunction((0..k).map(|i| isa(var(&format!("x{i}")), label("person")))),
			conjunction([relation(anon(0), &rule_players), isa(anon(0), label("team"))]),
		)
		.unwrap();

		let query_players: Vec<_> = (0..k)
			.rev()
			.map(|i| (Some(role("team", &format!("r{i}"))), var(&format!("p{i}"))))
			.collect();
		let query = conjunction([relation(var("t"), &query_players)]);

		let result = unifiers_with(&schema, &query, &rule);
		assert_eq!(result.len(), 1, "{k} roles");
		for i in 0..k {
			assert_eq!(
				result[0].get(&var(&format!("p{i}"))),
				Some(&vars(&[var(&format!("x{i}"))]))
			)
		}
	}
}

#[test]
fn applicable_rules() {
	let schema = schema();
	let rules = vec![
		first_name_rule("john"),
		employment_rule(&["x", "y"]),
		first_name_rule("bob"),
	];

	let concludables = Concludable::extract(&employees(&["p"])).unwrap();
	let applicable: Vec<_> = concludables[0]
		.applicable_rules(&rules, &schema)
		.map(|r| r.unwrap().0.label().to_owned())
		.collect();
	assert_eq!(applicable, vec!["employment", "employment"])
}
