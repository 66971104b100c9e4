use core::fmt;

use serde::{Deserialize, Serialize};

/// Type label.
///
/// Role labels are scoped by the relation type declaring them, e.g.
/// `employment:employee`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Label {
	/// Scope of the label, if any.
	pub scope: Option<String>,

	/// Label name.
	pub name: String,
}

impl Label {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			scope: None,
			name: name.into(),
		}
	}

	pub fn scoped(scope: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			scope: Some(scope.into()),
			name: name.into(),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn scope(&self) -> Option<&str> {
		self.scope.as_deref()
	}

	pub fn is_scoped(&self) -> bool {
		self.scope.is_some()
	}

	/// Scope label, that is the label of the relation type declaring this
	/// role.
	pub fn scope_label(&self) -> Option<Label> {
		self.scope.as_ref().map(|s| Label::new(s.clone()))
	}
}

impl fmt::Display for Label {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match &self.scope {
			Some(scope) => write!(f, "{scope}:{}", self.name),
			None => write!(f, "{}", self.name),
		}
	}
}

impl<'a> From<&'a str> for Label {
	fn from(value: &'a str) -> Self {
		match value.split_once(':') {
			Some((scope, name)) => Self::scoped(scope, name),
			None => Self::new(value),
		}
	}
}
