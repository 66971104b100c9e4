#![allow(dead_code)]
use concluder_core::{
	Conjunction, Constraint, Label, Operand, Predicate, RolePlayer, Snapshot, Thing, Value,
	Variable,
};
use concluder_logic::Rule;

/// Schema shared by the tests.
pub fn schema() -> Snapshot {
	Snapshot::builder()
		.entity("person")
		.entity("company")
		.relation("employment")
		.relates("employment", "employee")
		.relates("employment", "employer")
		.relation("part-time-employment")
		.sub("part-time-employment", "employment")
		.relates_as("part-time-employment", "part-time-employee", "employee")
		.relation("friendship")
		.relates("friendship", "friend")
		.attribute("name")
		.attribute("first-name")
		.sub("first-name", "name")
		.attribute("last-name")
		.sub("last-name", "name")
		.attribute("age")
		.owns("person", "name")
		.owns("person", "age")
		.owns("company", "name")
		.build()
		.unwrap()
}

pub fn var(name: &str) -> Variable {
	Variable::name(name)
}

pub fn anon(i: u32) -> Variable {
	Variable::Anonymous(i)
}

pub fn label(name: &str) -> Variable {
	Variable::label(name)
}

pub fn role(scope: &str, name: &str) -> Variable {
	Variable::role(scope, name)
}

pub fn labels(items: &[&str]) -> std::collections::BTreeSet<Label> {
	items.iter().map(|s| Label::from(*s)).collect()
}

pub fn vars(items: &[Variable]) -> std::collections::BTreeSet<Variable> {
	items.iter().cloned().collect()
}

pub fn isa(owner: Variable, ty: Variable) -> Constraint {
	Constraint::isa(owner, ty)
}

pub fn has(owner: Variable, attribute: Variable) -> Constraint {
	Constraint::has(owner, attribute)
}

pub fn relation(owner: Variable, players: &[(Option<Variable>, Variable)]) -> Constraint {
	Constraint::relation(
		owner,
		players
			.iter()
			.map(|(role, player)| RolePlayer::new(role.clone(), player.clone())),
	)
}

pub fn value(owner: Variable, predicate: Predicate, constant: impl Into<Value>) -> Constraint {
	Constraint::value(owner, predicate, Operand::Constant(constant.into()))
}

pub fn compare(owner: Variable, predicate: Predicate, operand: Variable) -> Constraint {
	Constraint::value(owner, predicate, Operand::Variable(operand))
}

pub fn conjunction(constraints: impl IntoIterator<Item = Constraint>) -> Conjunction {
	Conjunction::new(constraints)
}

/// `when { $x isa person; } then { $x has first-name <value>; }`
pub fn first_name_rule(value: &str) -> Rule {
	Rule::new(
		format!("people-named-{value}"),
		conjunction([isa(var("x"), label("person"))]),
		conjunction([
			has(var("x"), anon(0)),
			isa(anon(0), label("first-name")),
			self::value(anon(0), Predicate::Eq, value),
		]),
	)
	.unwrap()
}

/// `when { $x isa person; $y isa person; } then { (employee: $x, employee: $y) isa employment; }`
pub fn employment_rule(players: &[&str]) -> Rule {
	let mut names = players.to_vec();
	names.sort_unstable();
	names.dedup();
	let when: Vec<_> = names.iter().map(|p| isa(var(p), label("person"))).collect();
	let employee = Some(role("employment", "employee"));
	let role_players: Vec<_> = players
		.iter()
		.map(|p| (employee.clone(), var(p)))
		.collect();
	Rule::new(
		"employment",
		conjunction(when),
		conjunction([
			relation(anon(0), &role_players),
			isa(anon(0), label("employment")),
		]),
	)
	.unwrap()
}

/// Data instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Instance {
	id: u32,
	ty: Label,
	value: Option<Value>,
	roles: Vec<(Label, u32)>,
}

impl Instance {
	pub fn new(id: u32, ty: &str) -> Self {
		Self {
			id,
			ty: Label::new(ty),
			value: None,
			roles: Vec::new(),
		}
	}

	pub fn attribute(id: u32, ty: &str, value: impl Into<Value>) -> Self {
		Self {
			value: Some(value.into()),
			..Self::new(id, ty)
		}
	}

	/// Adds a role player, for relation instances.
	pub fn with_player(mut self, role: &str, player: &Instance) -> Self {
		self.roles.push((Label::from(role), player.id));
		self
	}
}

impl Thing for Instance {
	fn type_label(&self) -> &Label {
		&self.ty
	}

	fn value(&self) -> Option<&Value> {
		self.value.as_ref()
	}

	fn role_types(&self, player: &Self) -> Vec<Label> {
		self.roles
			.iter()
			.filter(|(_, id)| *id == player.id)
			.map(|(role, _)| role.clone())
			.collect()
	}
}
