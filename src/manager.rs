use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use futures::channel::mpsc;
use futures::task::{LocalSpawn, LocalSpawnExt, SpawnError};

use crate::events::{AppResumed, EventBus, EventObserver, RefreshRequested, SessionId, SiteUpdated};
use crate::{AsyncComponent, LoadWatcher};

/// Owns the sequence of page loads for one page instance.
///
/// Every [`start_page_load`](LoadsManager::start_page_load) call bumps a
/// monotonic generation counter and produces a new [`LoadWatcher`] bound
/// to it; a watcher created under generation G is stale once the counter
/// exceeds G. Superseded watchers are abandoned, not cancelled: their
/// requests still complete, but their acceptances no longer reach the
/// page. The manager also relays external refresh requests to the page,
/// without knowing how the page reloads itself.
pub struct LoadsManager {
	body: Rc<ManagerBody>,
}

pub(crate) struct ManagerBody {
	generation: Cell<u64>,
	update_in_background: Cell<bool>,
	current: RefCell<Option<LoadWatcher>>,
	refresh: RefCell<Vec<mpsc::UnboundedSender<()>>>,
	observers: RefCell<Vec<EventObserver>>,
	spawner: Box<dyn LocalSpawn>,
}

impl Clone for LoadsManager {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl LoadsManager {
	/// `spawner` runs the continuation work of this manager's watchers:
	/// consuming emissions past the first one and waiting on page
	/// readiness. Single-threaded executors are enough, nothing spawned
	/// here is `Send`.
	pub fn new(spawner: impl LocalSpawn + 'static) -> Self {
		LoadsManager {
			body: Rc::new(ManagerBody {
				generation: Cell::new(0),
				update_in_background: Cell::new(true),
				current: RefCell::new(None),
				refresh: RefCell::new(Vec::new()),
				observers: RefCell::new(Vec::new()),
				spawner: Box::new(spawner),
			}),
		}
	}

	/// Start a new page load, superseding any load still in flight.
	///
	/// `first_load` is a UI hint for the page (blocking loading indicator
	/// vs. background refresh indicator), never watcher logic.
	pub fn start_page_load(&self, page: &dyn AsyncComponent, first_load: bool) -> LoadWatcher {
		let generation = self.body.generation.get() + 1;
		self.body.generation.set(generation);
		tracing::trace!(generation, first_load, "page load started");

		let watcher = LoadWatcher::new(
			Rc::downgrade(&self.body),
			generation,
			first_load,
			self.body.update_in_background.get(),
		);
		// Current before wiring: a failing readiness watch clears it again.
		*self.body.current.borrow_mut() = Some(watcher.clone());
		watcher.watch_component(page);

		watcher
	}

	/// Subscribe to refresh requests relayed by this manager. Each call
	/// returns an independent stream; pages subscribe once at
	/// construction and reload themselves in response.
	pub fn on_refresh_page(&self) -> mpsc::UnboundedReceiver<()> {
		let (sender, receiver) = mpsc::unbounded();
		self.body.refresh.borrow_mut().push(sender);
		receiver
	}

	/// External trigger entry: ask the page to reload.
	pub fn refresh_page(&self) {
		self.body.refresh_page();
	}

	/// Relay cross-cutting bus events into the refresh stream. Site
	/// updates are scoped to `session` when one is given; app resume and
	/// explicit refresh requests are always global. Subscriptions are
	/// revoked when the manager drops.
	pub fn attach(&self, bus: &EventBus, session: Option<SessionId>) {
		let body = Rc::downgrade(&self.body);
		let relay = move || {
			if let Some(body) = body.upgrade() {
				body.refresh_page();
			}
		};

		let on_site_updated = {
			let relay = relay.clone();
			move |_: &SiteUpdated| relay()
		};
		let on_app_resumed = {
			let relay = relay.clone();
			move |_: &AppResumed| relay()
		};
		let on_refresh_requested = move |_: &RefreshRequested| relay();

		let mut observers = self.body.observers.borrow_mut();
		observers.push(match session {
			Some(session) => bus.on_scoped(session, on_site_updated),
			None => bus.on(on_site_updated),
		});
		observers.push(bus.on(on_app_resumed));
		observers.push(bus.on(on_refresh_requested));
	}

	/// The generation of the most recently started load.
	pub fn current_generation(&self) -> u64 {
		self.body.generation.get()
	}

	/// Whether a load cycle is still in flight.
	pub fn has_ongoing_load(&self) -> bool {
		self.body.current.borrow().is_some()
	}

	/// Whether watchers should refresh data in the background, which
	/// drives the reading strategy they hand out.
	pub fn set_update_in_background(&self, update: bool) {
		self.body.update_in_background.set(update);
	}
}

impl ManagerBody {
	pub(crate) fn is_current(&self, generation: u64) -> bool {
		self.generation.get() == generation
	}

	pub(crate) fn spawn(
		&self,
		future: impl Future<Output = ()> + 'static,
	) -> Result<(), SpawnError> {
		self.spawner.spawn_local(future)
	}

	pub(crate) fn page_loaded(&self, generation: u64) {
		// A superseded load finishing late is routine.
		if !self.is_current(generation) {
			return;
		}

		tracing::trace!(generation, "page load finished");
		self.current.borrow_mut().take();
	}

	fn refresh_page(&self) {
		self.refresh
			.borrow_mut()
			.retain(|sender| sender.unbounded_send(()).is_ok());
	}
}
