use std::cell::RefCell;
use std::rc::{Rc, Weak};

use futures::stream::{Stream, StreamExt};

use crate::manager::ManagerBody;
use crate::{AsyncComponent, PromisedValue, ReadingStrategy, WatchError};

/// Watches the requests of one page load.
///
/// A watcher mediates between data sources that may emit more than once
/// for one logical request (a value from cache, optionally followed by a
/// value from the network) and a page that wants only semantically
/// meaningful updates. Many watchers may exist over a page's life, but
/// only the one bound to the manager's current generation is allowed to
/// mutate page-visible state.
pub struct LoadWatcher {
	body: Rc<WatcherBody>,
}

pub(crate) struct WatcherBody {
	manager: Weak<ManagerBody>,
	generation: u64,
	first_load: bool,
	update_in_background: bool,
	completion: PromisedValue<()>,
	inner: RefCell<WatcherInner>,
}

struct WatcherInner {
	started: bool,
	ongoing: usize,
	page_ready: bool,
	finished: bool,
	has_changes: bool,
	error: Option<WatchError>,
}

impl Clone for LoadWatcher {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl LoadWatcher {
	pub(crate) fn new(
		manager: Weak<ManagerBody>,
		generation: u64,
		first_load: bool,
		update_in_background: bool,
	) -> Self {
		LoadWatcher {
			body: Rc::new(WatcherBody {
				manager,
				generation,
				first_load,
				update_in_background,
				completion: PromisedValue::new(),
				inner: RefCell::new(WatcherInner {
					started: false,
					ongoing: 0,
					page_ready: false,
					finished: false,
					has_changes: false,
					error: None,
				}),
			}),
		}
	}

	/// The load cycle this watcher belongs to.
	pub fn generation(&self) -> u64 {
		self.body.generation
	}

	/// UI hint: whether this is the very first load of the page. Not
	/// used by the watcher logic itself.
	pub fn is_first_load(&self) -> bool {
		self.body.first_load
	}

	/// Whether this watcher is still the one whose acceptances may reach
	/// page-visible state.
	pub fn is_current(&self) -> bool {
		self.body.accepts()
	}

	/// Whether any subsequent emission was a meaningful change.
	pub fn has_meaningful_changes(&self) -> bool {
		self.body.inner.borrow().has_changes
	}

	/// A failure the source reported after data was already accepted,
	/// if any. The accepted snapshot stays on screen regardless.
	pub fn error(&self) -> Option<WatchError> {
		self.body.inner.borrow().error.clone()
	}

	/// The continuation of this load cycle: resolved once the page is
	/// ready and no requests remain in flight, rejected as soon as any
	/// source of the cycle fails after its data was already accepted.
	/// Pages await this to surface deferred failures as a non-blocking
	/// notice; the accepted snapshot stays on screen either way.
	pub fn completion(&self) -> PromisedValue<()> {
		self.body.completion.clone()
	}

	/// The strategy call sites should hand to their data sources for
	/// this load. The watcher is agnostic to the strategy itself, it
	/// only reacts to how many emissions the strategy produces.
	pub fn reading_strategy(&self) -> Option<ReadingStrategy> {
		self.body
			.update_in_background
			.then_some(ReadingStrategy::CacheThenNetwork)
	}

	/// Watch one request of this load cycle.
	///
	/// The returned [`PromisedValue`] settles with the first emission of
	/// `source`, or with its error when it fails before emitting. Every
	/// later emission is compared to the current snapshot with
	/// `predicate`; a meaningful candidate replaces the snapshot and runs
	/// `apply`, the page-level update path, but only while this watcher
	/// is still the manager's current one. The check happens at
	/// acceptance time, so a request started under an old generation that
	/// resolves after a newer one started is safely ignored.
	///
	/// `predicate` must be total and non-panicking; use
	/// [`predicate::always_changed`](crate::predicate::always_changed)
	/// when every emission should replace the previous one.
	pub fn watch_request<T, S, P, U>(&self, source: S, predicate: P, mut apply: U) -> PromisedValue<T>
	where
		T: Clone + 'static,
		S: Stream<Item = Result<T, WatchError>> + 'static,
		P: Fn(&T, &T) -> bool + 'static,
		U: FnMut(&T) + 'static,
	{
		let promised = PromisedValue::new();
		let Some(manager) = self.body.manager.upgrade() else {
			promised.reject(WatchError::Shutdown);
			return promised;
		};

		{
			let mut inner = self.body.inner.borrow_mut();
			inner.started = true;
			inner.ongoing += 1;
		}

		let body = self.body.clone();
		let spawned = manager.spawn({
			let promised = promised.clone();
			async move {
				let mut source = Box::pin(source);
				let mut current: Option<T> = None;

				while let Some(item) = source.next().await {
					match item {
						Ok(candidate) => match &current {
							None => {
								// The first emission is always accepted.
								if body.accepts() {
									apply(&candidate);
								}
								promised.resolve(candidate.clone());
								current = Some(candidate);
							}
							Some(previous) => {
								// The predicate runs even when superseded,
								// so side-effecting callers can rely on
								// having been evaluated.
								if !predicate(previous, &candidate) {
									continue;
								}
								body.inner.borrow_mut().has_changes = true;
								if body.accepts() {
									apply(&candidate);
								} else {
									tracing::debug!(
										generation = body.generation,
										"meaningful change on a superseded load, not applied"
									);
								}
								current = Some(candidate);
							}
						},
						Err(error) => {
							if current.is_none() {
								promised.reject(error);
							} else {
								// A later failure never clears data that
								// was already good enough to show; the page
								// hears about it through the cycle's
								// continuation.
								tracing::debug!(
									generation = body.generation,
									error = %error,
									"source failed after data was accepted"
								);
								body.completion.reject(error.clone());
								body.inner.borrow_mut().error = Some(error);
							}
							break;
						}
					}
				}

				// No-op when the error path already rejected.
				if current.is_none() {
					promised.reject(WatchError::NoData);
				}

				body.request_finished();
			}
		});

		if spawned.is_err() {
			self.body.inner.borrow_mut().ongoing -= 1;
			promised.reject(WatchError::Shutdown);
		}

		promised
	}

	/// Wait for the page's readiness future and report the load cycle as
	/// finished once no requests remain in flight. Wired automatically by
	/// [`LoadsManager::start_page_load`](crate::LoadsManager::start_page_load).
	pub fn watch_component(&self, page: &dyn AsyncComponent) {
		let Some(manager) = self.body.manager.upgrade() else {
			return;
		};

		// Only the readiness future is kept, never the page itself.
		let ready = page.ready();
		let body = self.body.clone();
		let spawned = manager.spawn(async move {
			// Readiness resolves for failed first loads too; a rejection
			// would be a page bug, treat it as done either way.
			let _ = ready.await;
			body.inner.borrow_mut().page_ready = true;
			body.maybe_finish();
		});

		if spawned.is_err() {
			// A dead spawner means this cycle can never report back; fail
			// where the page can see it instead of stalling silently.
			tracing::debug!(generation = self.body.generation, "spawner rejected readiness watch");
			self.body.completion.reject(WatchError::Shutdown);
			manager.page_loaded(self.body.generation);
		}
	}
}

impl WatcherBody {
	/// The generation check, performed at acceptance time.
	fn accepts(&self) -> bool {
		match self.manager.upgrade() {
			Some(manager) => manager.is_current(self.generation),
			None => false,
		}
	}

	fn request_finished(self: &Rc<Self>) {
		{
			let mut inner = self.inner.borrow_mut();
			inner.ongoing -= 1;
		}
		self.maybe_finish();
	}

	fn maybe_finish(self: &Rc<Self>) {
		{
			let mut inner = self.inner.borrow_mut();
			// A cycle is finishable only once its first request started:
			// on reloads the page's readiness future is already resolved,
			// so readiness alone proves nothing about this cycle.
			if inner.finished || !inner.started || inner.ongoing > 0 || !inner.page_ready {
				return;
			}
			inner.finished = true;
		}

		self.completion.resolve(());
		if let Some(manager) = self.manager.upgrade() {
			manager.page_loaded(self.generation);
		}
	}
}
