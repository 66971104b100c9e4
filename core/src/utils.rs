mod injection;
mod search;

use std::collections::BTreeSet;

pub use injection::*;
pub use search::*;

/// Set intersection in place.
pub trait Intersect {
	fn intersect_with(&mut self, other: &Self);
}

impl<T: Ord> Intersect for BTreeSet<T> {
	fn intersect_with(&mut self, other: &Self) {
		self.retain(|t| other.contains(t))
	}
}

pub trait IteratorExt: Sized {
	fn try_flat_map<E, J, F, T, U>(self, f: F) -> TryFlatMap<Self, J, F>
	where
		Self: Iterator<Item = Result<T, E>>,
		J: Iterator<Item = Result<U, E>>,
		F: FnMut(T) -> J,
	{
		TryFlatMap {
			inner: self,
			f,
			current: None,
		}
	}
}

impl<I: Iterator> IteratorExt for I {}

pub struct TryFlatMap<I, J, F> {
	inner: I,
	f: F,
	current: Option<J>,
}

impl<T, U, E, I, J, F> Iterator for TryFlatMap<I, J, F>
where
	I: Iterator<Item = Result<T, E>>,
	J: Iterator<Item = Result<U, E>>,
	F: FnMut(T) -> J,
{
	type Item = Result<U, E>;

	fn next(&mut self) -> Option<Self::Item> {
		loop {
			match &mut self.current {
				Some(j) => match j.next() {
					Some(u) => break Some(u),
					None => self.current = None,
				},
				None => match self.inner.next() {
					Some(Ok(t)) => self.current = Some((self.f)(t)),
					Some(Err(e)) => break Some(Err(e)),
					None => break None,
				},
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn try_flat_map_stops_at_error() {
		let items: Vec<Result<u32, &str>> = vec![Ok(1), Err("boom"), Ok(2)];
		let result: Vec<_> = items
			.into_iter()
			.try_flat_map(|n| (0..n).map(Ok))
			.collect();
		assert_eq!(result, vec![Ok(0), Err("boom"), Ok(0), Ok(1)])
	}

	#[test]
	fn intersect() {
		let mut a: BTreeSet<_> = [1, 2, 3].into_iter().collect();
		a.intersect_with(&[2, 3, 4].into_iter().collect());
		assert_eq!(a.into_iter().collect::<Vec<_>>(), vec![2, 3])
	}
}
