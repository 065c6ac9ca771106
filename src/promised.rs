use std::cell::RefCell;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use smallvec::SmallVec;

use crate::WatchError;

/// A single-assignment future: a placeholder for a value that will be
/// produced exactly once.
///
/// Producers call [`resolve`](PromisedValue::resolve) or
/// [`reject`](PromisedValue::reject); any number of clones may be awaited
/// before or after that, and all of them observe the same outcome. There
/// is no cancellation primitive: a holder cancels by discarding the
/// handle and starting a new one.
pub struct PromisedValue<T> {
	body: Rc<PromisedBody<T>>,
}

struct PromisedBody<T> {
	state: RefCell<PromisedState<T>>,
}

enum PromisedState<T> {
	Pending { wakers: SmallVec<[Waker; 2]> },
	Resolved(T),
	Rejected(WatchError),
}

impl<T> Clone for PromisedValue<T> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl<T> Default for PromisedValue<T> {
	fn default() -> Self {
		PromisedValue::new()
	}
}

impl<T> PromisedValue<T> {
	pub fn new() -> Self {
		PromisedValue {
			body: Rc::new(PromisedBody {
				state: RefCell::new(PromisedState::Pending {
					wakers: SmallVec::new_const(),
				}),
			}),
		}
	}

	/// Settle with a value. A no-op when already settled: multiple
	/// asynchronous paths may race to settle and the first one wins.
	pub fn resolve(&self, value: T) {
		self.settle(PromisedState::Resolved(value));
	}

	/// Settle with an error. A no-op when already settled.
	pub fn reject(&self, error: WatchError) {
		self.settle(PromisedState::Rejected(error));
	}

	fn settle(&self, next: PromisedState<T>) {
		let mut state = self.body.state.borrow_mut();
		let PromisedState::Pending { wakers } = &mut *state else {
			return;
		};

		let wakers = std::mem::take(wakers);
		*state = next;
		drop(state);

		for waker in wakers {
			waker.wake();
		}
	}

	pub fn is_settled(&self) -> bool {
		!matches!(&*self.body.state.borrow(), PromisedState::Pending { .. })
	}

	pub fn is_resolved(&self) -> bool {
		matches!(&*self.body.state.borrow(), PromisedState::Resolved(_))
	}

	pub fn is_rejected(&self) -> bool {
		matches!(&*self.body.state.borrow(), PromisedState::Rejected(_))
	}

	/// Peek at the resolved value without waiting.
	pub fn value(&self) -> Option<T>
	where
		T: Clone,
	{
		match &*self.body.state.borrow() {
			PromisedState::Resolved(value) => Some(value.clone()),
			_ => None,
		}
	}
}

impl<T> Future for PromisedValue<T>
where
	T: Clone,
{
	type Output = Result<T, WatchError>;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		let mut state = self.body.state.borrow_mut();
		match &mut *state {
			PromisedState::Pending { wakers } => {
				if !wakers.iter().any(|waker| waker.will_wake(cx.waker())) {
					wakers.push(cx.waker().clone());
				}
				Poll::Pending
			}
			PromisedState::Resolved(value) => Poll::Ready(Ok(value.clone())),
			PromisedState::Rejected(error) => Poll::Ready(Err(error.clone())),
		}
	}
}

impl<T> Debug for PromisedValue<T>
where
	T: Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match &*self.body.state.borrow() {
			PromisedState::Pending { .. } => f.write_str("PromisedValue(pending)"),
			PromisedState::Resolved(value) => write!(f, "PromisedValue({:?})", value),
			PromisedState::Rejected(error) => write!(f, "PromisedValue({:?})", error),
		}
	}
}
