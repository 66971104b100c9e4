//! Read-only view of the type hierarchy.
use std::collections::BTreeSet;

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use crate::{Label, SchemaError};

/// Kind of schema type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
	Entity,
	Relation,
	Attribute,
	Role,
}

/// Type hierarchy queries needed by unification.
///
/// Role types are denoted by scoped labels.
pub trait TypeHierarchy {
	fn kind(&self, label: &Label) -> Result<Kind, SchemaError>;

	/// The given type and all its transitive subtypes.
	fn subtypes(&self, label: &Label) -> Result<BTreeSet<Label>, SchemaError>;

	/// The given type and all its transitive supertypes.
	fn supertypes(&self, label: &Label) -> Result<BTreeSet<Label>, SchemaError>;

	/// Roles a relation type relates, including inherited roles that are
	/// not overridden.
	fn roles(&self, relation: &Label) -> Result<BTreeSet<Label>, SchemaError>;
}

impl<'a, S: TypeHierarchy + ?Sized> TypeHierarchy for &'a S {
	fn kind(&self, label: &Label) -> Result<Kind, SchemaError> {
		S::kind(*self, label)
	}

	fn subtypes(&self, label: &Label) -> Result<BTreeSet<Label>, SchemaError> {
		S::subtypes(*self, label)
	}

	fn supertypes(&self, label: &Label) -> Result<BTreeSet<Label>, SchemaError> {
		S::supertypes(*self, label)
	}

	fn roles(&self, relation: &Label) -> Result<BTreeSet<Label>, SchemaError> {
		S::roles(*self, relation)
	}
}

fn unknown(label: &Label) -> SchemaError {
	if label.is_scoped() {
		SchemaError::UnknownRole(label.clone())
	} else {
		SchemaError::UnknownType(label.clone())
	}
}

#[derive(Debug, Clone)]
struct TypeInfo {
	kind: Kind,
	supertype: Option<Label>,

	/// Direct subtypes.
	subtypes: BTreeSet<Label>,

	/// Roles declared by a relation type.
	roles: BTreeSet<Label>,

	/// Attribute types declared as owned.
	owns: BTreeSet<Label>,
}

impl TypeInfo {
	fn new(kind: Kind) -> Self {
		Self {
			kind,
			supertype: None,
			subtypes: BTreeSet::new(),
			roles: BTreeSet::new(),
			owns: BTreeSet::new(),
		}
	}
}

/// In-memory schema.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
	types: HashMap<Label, TypeInfo>,
}

impl Snapshot {
	pub fn builder() -> SnapshotBuilder {
		SnapshotBuilder::default()
	}

	fn get(&self, label: &Label) -> Result<&TypeInfo, SchemaError> {
		self.types.get(label).ok_or_else(|| unknown(label))
	}

	pub fn contains(&self, label: &Label) -> bool {
		self.types.contains_key(label)
	}

	pub fn len(&self) -> usize {
		self.types.len()
	}

	pub fn is_empty(&self) -> bool {
		self.types.is_empty()
	}

	/// Attribute types instances of `owner` may own, including the ones
	/// inherited from its supertypes.
	pub fn owned_attributes(&self, owner: &Label) -> Result<BTreeSet<Label>, SchemaError> {
		let mut result = BTreeSet::new();
		for ty in self.supertypes(owner)? {
			result.extend(self.get(&ty)?.owns.iter().cloned())
		}

		Ok(result)
	}

	/// Tells if instances of `owner` may own instances of `attribute`.
	///
	/// Owning an attribute type allows owning its subtypes.
	pub fn owns(&self, owner: &Label, attribute: &Label) -> Result<bool, SchemaError> {
		let owned = self.owned_attributes(owner)?;
		Ok(self
			.supertypes(attribute)?
			.iter()
			.any(|ty| owned.contains(ty)))
	}
}

impl TypeHierarchy for Snapshot {
	fn kind(&self, label: &Label) -> Result<Kind, SchemaError> {
		Ok(self.get(label)?.kind)
	}

	fn subtypes(&self, label: &Label) -> Result<BTreeSet<Label>, SchemaError> {
		self.get(label)?;
		let mut result = BTreeSet::new();
		let mut stack = vec![label.clone()];
		while let Some(current) = stack.pop() {
			let info = self.get(&current)?;
			stack.extend(info.subtypes.iter().cloned());
			result.insert(current);
		}

		Ok(result)
	}

	fn supertypes(&self, label: &Label) -> Result<BTreeSet<Label>, SchemaError> {
		let mut result = BTreeSet::new();
		let mut current = Some(label.clone());
		while let Some(label) = current {
			current = self.get(&label)?.supertype.clone();
			result.insert(label);
		}

		Ok(result)
	}

	fn roles(&self, relation: &Label) -> Result<BTreeSet<Label>, SchemaError> {
		let info = self.get(relation)?;
		let mut result = info.roles.clone();
		if let Some(supertype) = &info.supertype {
			let overridden: BTreeSet<_> = info
				.roles
				.iter()
				.filter_map(|role| self.types.get(role).and_then(|r| r.supertype.clone()))
				.collect();

			for role in self.roles(supertype)? {
				if !overridden.contains(&role) {
					result.insert(role);
				}
			}
		}

		Ok(result)
	}
}

/// Schema builder.
///
/// Declarations can be given in any order, they are checked by
/// [`SnapshotBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct SnapshotBuilder {
	types: Vec<(Label, Kind)>,
	subs: Vec<(Label, Label)>,
	relates: Vec<(Label, String, Option<String>)>,
	owns: Vec<(Label, Label)>,
}

impl SnapshotBuilder {
	pub fn entity(mut self, name: impl Into<String>) -> Self {
		self.types.push((Label::new(name), Kind::Entity));
		self
	}

	pub fn relation(mut self, name: impl Into<String>) -> Self {
		self.types.push((Label::new(name), Kind::Relation));
		self
	}

	pub fn attribute(mut self, name: impl Into<String>) -> Self {
		self.types.push((Label::new(name), Kind::Attribute));
		self
	}

	/// Declare `child` as a direct subtype of `parent`.
	pub fn sub(mut self, child: impl Into<String>, parent: impl Into<String>) -> Self {
		self.subs.push((Label::new(child), Label::new(parent)));
		self
	}

	pub fn relates(mut self, relation: impl Into<String>, role: impl Into<String>) -> Self {
		self.relates
			.push((Label::new(relation), role.into(), None));
		self
	}

	/// Declare a role overriding the role `overridden` inherited from a
	/// supertype of `relation`.
	pub fn relates_as(
		mut self,
		relation: impl Into<String>,
		role: impl Into<String>,
		overridden: impl Into<String>,
	) -> Self {
		self.relates
			.push((Label::new(relation), role.into(), Some(overridden.into())));
		self
	}

	/// Declare that instances of `owner` may own `attribute`s.
	pub fn owns(mut self, owner: impl Into<String>, attribute: impl Into<String>) -> Self {
		self.owns.push((Label::new(owner), Label::new(attribute)));
		self
	}

	pub fn build(self) -> Result<Snapshot, SchemaError> {
		let mut types: HashMap<Label, TypeInfo> = HashMap::new();
		for (label, kind) in self.types {
			types.insert(label, TypeInfo::new(kind));
		}

		for (child, parent) in self.subs {
			if !types.contains_key(&parent) {
				return Err(SchemaError::UnknownType(parent));
			}

			match types.get_mut(&child) {
				Some(info) => info.supertype = Some(parent),
				None => return Err(SchemaError::UnknownType(child)),
			}
		}

		check_acyclic(&types)?;

		let mut overrides = Vec::new();
		for (relation, role, overridden) in self.relates {
			let role_label = Label::scoped(relation.name.clone(), role);
			match types.get_mut(&relation) {
				Some(info) if info.kind == Kind::Relation => {
					info.roles.insert(role_label.clone());
				}
				_ => return Err(SchemaError::UnknownType(relation)),
			}

			types.insert(role_label.clone(), TypeInfo::new(Kind::Role));
			if let Some(overridden) = overridden {
				overrides.push((relation, role_label, overridden))
			}
		}

		for (relation, role, overridden) in overrides {
			let mut found = None;
			let mut current = types.get(&relation).and_then(|info| info.supertype.clone());
			while let Some(ancestor) = current {
				let candidate = Label::scoped(ancestor.name.clone(), overridden.clone());
				if types.contains_key(&candidate) {
					found = Some(candidate);
					break;
				}

				current = types.get(&ancestor).and_then(|info| info.supertype.clone());
			}

			match found {
				Some(parent) => {
					if let Some(info) = types.get_mut(&role) {
						info.supertype = Some(parent)
					}
				}
				None => return Err(SchemaError::UnknownOverriddenRole { relation, role }),
			}
		}

		for (owner, attribute) in self.owns {
			match types.get(&attribute) {
				Some(info) if info.kind == Kind::Attribute => (),
				Some(_) => return Err(SchemaError::NotAnAttributeType(attribute)),
				None => return Err(SchemaError::UnknownType(attribute)),
			}

			match types.get_mut(&owner) {
				Some(info) => {
					info.owns.insert(attribute);
				}
				None => return Err(SchemaError::UnknownType(owner)),
			}
		}

		let links: Vec<_> = types
			.iter()
			.filter_map(|(label, info)| info.supertype.clone().map(|s| (label.clone(), s)))
			.collect();
		for (child, parent) in links {
			if let Some(info) = types.get_mut(&parent) {
				info.subtypes.insert(child);
			}
		}

		log::debug!("built schema snapshot with {} types", types.len());
		Ok(Snapshot { types })
	}
}

fn check_acyclic(types: &HashMap<Label, TypeInfo>) -> Result<(), SchemaError> {
	for label in types.keys() {
		let mut visited = HashSet::new();
		let mut current = Some(label);
		while let Some(label) = current {
			if !visited.insert(label) {
				return Err(SchemaError::CyclicHierarchy(label.clone()));
			}

			current = types.get(label).and_then(|info| info.supertype.as_ref());
		}
	}

	Ok(())
}
