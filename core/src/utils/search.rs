/// Lazy depth-first search through a sequence of choice points.
///
/// Each item of the iterator is a choice point: an iterator over the
/// choices available at this depth. The search function `f` extends a
/// partial solution with a choice, or rejects it by returning `None`.
/// Choices are pulled one at a time, so the search never materializes more
/// than the current branch.
pub trait IteratorSearch<T, F>: Sized + Clone + Iterator
where
	Self::Item: Iterator,
	F: Fn(&T, <Self::Item as Iterator>::Item) -> Option<T>,
{
	fn search(self, initial_value: T, f: F) -> Search<Self, T, F>;
}

impl<I, T, F> IteratorSearch<T, F> for I
where
	I: Sized + Clone + Iterator,
	I::Item: Iterator,
	F: Fn(&T, <I::Item as Iterator>::Item) -> Option<T>,
{
	fn search(mut self, initial_value: T, f: F) -> Search<Self, T, F> {
		let choices = self.next();
		Search {
			stack: vec![Frame {
				value: initial_value,
				rest: self,
				choices,
			}],
			f,
		}
	}
}

struct Frame<I: Iterator, T> {
	value: T,

	/// Choice points below this frame.
	rest: I,

	/// Remaining choices of this frame, `None` for a complete solution.
	choices: Option<I::Item>,
}

enum Step<I: Iterator, T> {
	Complete,
	Backtrack,
	Reject,
	Descend(Frame<I, T>),
}

pub struct Search<I: Iterator, T, F> {
	stack: Vec<Frame<I, T>>,
	f: F,
}

impl<I, T, F> Iterator for Search<I, T, F>
where
	I: Clone + Iterator,
	I::Item: Iterator,
	F: Fn(&T, <I::Item as Iterator>::Item) -> Option<T>,
{
	type Item = T;

	fn next(&mut self) -> Option<Self::Item> {
		loop {
			let frame = self.stack.last_mut()?;
			let step = match frame.choices.as_mut() {
				None => Step::Complete,
				Some(choices) => match choices.next() {
					None => Step::Backtrack,
					Some(choice) => match (self.f)(&frame.value, choice) {
						Some(value) => {
							let mut rest = frame.rest.clone();
							let choices = rest.next();
							Step::Descend(Frame {
								value,
								rest,
								choices,
							})
						}
						None => Step::Reject,
					},
				},
			};

			match step {
				Step::Complete => return self.stack.pop().map(|frame| frame.value),
				Step::Backtrack => {
					self.stack.pop();
				}
				Step::Reject => (),
				Step::Descend(frame) => self.stack.push(frame),
			}
		}
	}
}
