use smallvec::SmallVec;

/// Assignment of sources to targets, indexed by source.
pub type Assignment = SmallVec<[usize; 8]>;

/// Lazy enumeration of the injective assignments of `sources` elements into
/// `targets` elements, restricted by a compatibility relation.
///
/// When `sources == targets` this enumerates bijections. Assignments are
/// produced in lexicographic order.
pub struct Injections {
	sources: usize,
	targets: usize,

	/// `compatible[i * targets + j]` tells if source `i` may be assigned to
	/// target `j`.
	compatible: Vec<bool>,

	/// Current partial assignment.
	assignment: Assignment,
	used: SmallVec<[bool; 8]>,
	started: bool,
	done: bool,
}

impl Injections {
	pub fn new(sources: usize, targets: usize, compatible: impl Fn(usize, usize) -> bool) -> Self {
		let mut matrix = Vec::with_capacity(sources * targets);
		for i in 0..sources {
			for j in 0..targets {
				matrix.push(compatible(i, j))
			}
		}

		Self {
			sources,
			targets,
			compatible: matrix,
			assignment: SmallVec::new(),
			used: std::iter::repeat(false).take(targets).collect(),
			started: false,
			done: sources > targets,
		}
	}

	fn is_compatible(&self, i: usize, j: usize) -> bool {
		self.compatible[i * self.targets + j]
	}

	/// Undo the last assignment and returns the first target to try next
	/// for the same source.
	fn backtrack(&mut self) -> Option<usize> {
		let j = self.assignment.pop()?;
		self.used[j] = false;
		Some(j + 1)
	}
}

impl Iterator for Injections {
	type Item = Assignment;

	fn next(&mut self) -> Option<Self::Item> {
		if self.done {
			return None;
		}

		if self.sources == 0 {
			self.done = true;
			return Some(Assignment::new());
		}

		let mut start = if self.started {
			match self.backtrack() {
				Some(start) => start,
				None => {
					self.done = true;
					return None;
				}
			}
		} else {
			self.started = true;
			0
		};

		loop {
			let i = self.assignment.len();
			match (start..self.targets).find(|&j| !self.used[j] && self.is_compatible(i, j)) {
				Some(j) => {
					self.used[j] = true;
					self.assignment.push(j);

					if self.assignment.len() == self.sources {
						return Some(self.assignment.clone());
					}

					start = 0
				}
				None => match self.backtrack() {
					Some(next) => start = next,
					None => {
						self.done = true;
						return None;
					}
				},
			}
		}
	}
}
