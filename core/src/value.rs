use core::{cmp::Ordering, fmt, hash::Hash};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::SemanticError;

/// Attribute value.
///
/// Doubles are compared and hashed by their bit pattern, making `Value` a
/// proper key type. Semantic comparisons go through [`Value::compare`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
	Boolean(bool),
	Long(i64),
	Double(f64),
	String(String),
	DateTime(NaiveDateTime),
}

impl Value {
	/// Name of the value type, for diagnostics.
	pub fn kind_name(&self) -> &'static str {
		match self {
			Self::Boolean(_) => "boolean",
			Self::Long(_) => "long",
			Self::Double(_) => "double",
			Self::String(_) => "string",
			Self::DateTime(_) => "datetime",
		}
	}

	fn rank(&self) -> u8 {
		match self {
			Self::Boolean(_) => 0,
			Self::Long(_) => 1,
			Self::Double(_) => 2,
			Self::String(_) => 3,
			Self::DateTime(_) => 4,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(s) => Some(s),
			_ => None,
		}
	}

	/// Evaluates `self <predicate> other`.
	///
	/// Longs and doubles compare with each other. Strings compare
	/// lexicographically and case-sensitively, and are the only values
	/// supporting `contains` and `like`. Booleans only support equality.
	/// Any other combination is [`SemanticError::Incomparable`].
	pub fn compare(&self, predicate: Predicate, other: &Value) -> Result<bool, SemanticError> {
		let incomparable = || SemanticError::Incomparable {
			lhs: self.kind_name(),
			predicate,
			rhs: other.kind_name(),
		};

		match (self, other) {
			(Self::Boolean(a), Self::Boolean(b)) => match predicate {
				Predicate::Eq => Ok(a == b),
				Predicate::Neq => Ok(a != b),
				_ => Err(incomparable()),
			},
			(Self::Long(a), Self::Long(b)) => predicate.holds(a.cmp(b)).ok_or_else(incomparable),
			(Self::String(a), Self::String(b)) => match predicate {
				Predicate::Contains => Ok(a.contains(b.as_str())),
				Predicate::Like => {
					let regex = regex::Regex::new(b).map_err(|e| SemanticError::InvalidRegex {
						pattern: b.clone(),
						message: e.to_string(),
					})?;
					Ok(regex.is_match(a))
				}
				_ => predicate.holds(a.cmp(b)).ok_or_else(incomparable),
			},
			(Self::DateTime(a), Self::DateTime(b)) => {
				predicate.holds(a.cmp(b)).ok_or_else(incomparable)
			}
			(a, b) => {
				let ordering = match (a, b) {
					(Self::Long(n), Self::Double(d)) => cmp_long_double(*n, *d),
					(Self::Double(d), Self::Long(n)) => {
						cmp_long_double(*n, *d).map(Ordering::reverse)
					}
					(Self::Double(a), Self::Double(b)) => a.partial_cmp(b),
					_ => return Err(incomparable()),
				};

				if predicate.is_substring() {
					return Err(incomparable());
				}

				match ordering {
					Some(ordering) => predicate.holds(ordering).ok_or_else(incomparable),
					None => Ok(predicate == Predicate::Neq),
				}
			}
		}
	}

	/// Tells if `self <predicate> other` is known to be false.
	///
	/// Incomparable values are not refuted: the error is raised when the
	/// comparison is evaluated on concrete answers.
	pub fn refutes(&self, predicate: Predicate, other: &Value) -> bool {
		matches!(self.compare(predicate, other), Ok(false))
	}
}

/// Exact ordering of a long and a double. `None` if the double is NaN.
fn cmp_long_double(n: i64, d: f64) -> Option<Ordering> {
	// 2^63, exactly representable.
	const LIMIT: f64 = 9_223_372_036_854_775_808.0;

	if d.is_nan() {
		return None;
	}

	if d >= LIMIT {
		return Some(Ordering::Less);
	}

	if d < -LIMIT {
		return Some(Ordering::Greater);
	}

	let whole = d.trunc();
	let fraction = d - whole;
	Some(
		n.cmp(&(whole as i64))
			.then_with(|| 0f64.partial_cmp(&fraction).unwrap_or(Ordering::Equal)),
	)
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Boolean(a), Self::Boolean(b)) => a == b,
			(Self::Long(a), Self::Long(b)) => a == b,
			(Self::Double(a), Self::Double(b)) => a.to_bits() == b.to_bits(),
			(Self::String(a), Self::String(b)) => a == b,
			(Self::DateTime(a), Self::DateTime(b)) => a == b,
			_ => false,
		}
	}
}

impl Eq for Value {}

impl Hash for Value {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		self.rank().hash(state);
		match self {
			Self::Boolean(b) => b.hash(state),
			Self::Long(n) => n.hash(state),
			Self::Double(d) => d.to_bits().hash(state),
			Self::String(s) => s.hash(state),
			Self::DateTime(d) => d.hash(state),
		}
	}
}

impl PartialOrd for Value {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for Value {
	fn cmp(&self, other: &Self) -> Ordering {
		match (self, other) {
			(Self::Boolean(a), Self::Boolean(b)) => a.cmp(b),
			(Self::Long(a), Self::Long(b)) => a.cmp(b),
			(Self::Double(a), Self::Double(b)) => a.total_cmp(b),
			(Self::String(a), Self::String(b)) => a.cmp(b),
			(Self::DateTime(a), Self::DateTime(b)) => a.cmp(b),
			(a, b) => a.rank().cmp(&b.rank()),
		}
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Boolean(b) => write!(f, "{b}"),
			Self::Long(n) => write!(f, "{n}"),
			Self::Double(d) => write!(f, "{d}"),
			Self::String(s) => write!(f, "{s:?}"),
			Self::DateTime(d) => write!(f, "{}", d.format("%Y-%m-%dT%H:%M:%S%.f")),
		}
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Self::Boolean(value)
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Self::Long(value)
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Self::Double(value)
	}
}

impl<'a> From<&'a str> for Value {
	fn from(value: &'a str) -> Self {
		Self::String(value.to_owned())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Self::String(value)
	}
}

impl From<NaiveDateTime> for Value {
	fn from(value: NaiveDateTime) -> Self {
		Self::DateTime(value)
	}
}

/// Comparison predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Predicate {
	Eq,
	Neq,
	Gt,
	Gte,
	Lt,
	Lte,
	Contains,
	Like,
}

impl Predicate {
	/// Tells if this is a substring predicate (`contains` or `like`).
	pub fn is_substring(&self) -> bool {
		matches!(self, Self::Contains | Self::Like)
	}

	/// Evaluates an ordering predicate. Returns `None` for substring
	/// predicates.
	pub fn holds(&self, ordering: Ordering) -> Option<bool> {
		match self {
			Self::Eq => Some(ordering.is_eq()),
			Self::Neq => Some(ordering.is_ne()),
			Self::Gt => Some(ordering.is_gt()),
			Self::Gte => Some(ordering.is_ge()),
			Self::Lt => Some(ordering.is_lt()),
			Self::Lte => Some(ordering.is_le()),
			Self::Contains | Self::Like => None,
		}
	}
}

impl fmt::Display for Predicate {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Eq => write!(f, "="),
			Self::Neq => write!(f, "!="),
			Self::Gt => write!(f, ">"),
			Self::Gte => write!(f, ">="),
			Self::Lt => write!(f, "<"),
			Self::Lte => write!(f, "<="),
			Self::Contains => write!(f, "contains"),
			Self::Like => write!(f, "like"),
		}
	}
}

/// Predicate applied to a constant operand, e.g. `> 10`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Comparison {
	pub predicate: Predicate,
	pub value: Value,
}

impl Comparison {
	pub fn new(predicate: Predicate, value: impl Into<Value>) -> Self {
		Self {
			predicate,
			value: value.into(),
		}
	}

	/// Evaluates `value <predicate> self.value`.
	pub fn test(&self, value: &Value) -> Result<bool, SemanticError> {
		value.compare(self.predicate, &self.value)
	}
}

impl fmt::Display for Comparison {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{} {}", self.predicate, self.value)
	}
}
