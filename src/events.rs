use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use fxhash::FxHashMap;

/// Marker for bus messages. Each event kind is a plain struct with an
/// explicit payload schema.
pub trait Event: 'static {}

/// Identifies the session a subscription or emission is scoped to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(Rc<str>);

impl SessionId {
	pub fn new(id: impl AsRef<str>) -> Self {
		SessionId(Rc::from(id.as_ref()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<&str> for SessionId {
	fn from(id: &str) -> Self {
		SessionId::new(id)
	}
}

/// A session's cross-cutting configuration changed.
#[derive(Clone, Debug)]
pub struct SiteUpdated {
	pub session: SessionId,
}

impl Event for SiteUpdated {}

/// The application returned to the foreground.
#[derive(Clone, Copy, Debug)]
pub struct AppResumed;

impl Event for AppResumed {}

/// Someone asked the current page to reload.
#[derive(Clone, Copy, Debug)]
pub struct RefreshRequested;

impl Event for RefreshRequested {}

/// A typed publish/subscribe bus.
///
/// Handlers are keyed by event type, optionally scoped to a session. An
/// unscoped handler sees every emission of its event type; a scoped one
/// only sees emissions scoped to the same session. There is no ambient
/// global bus: the composition root owns one and passes it by reference.
pub struct EventBus {
	body: Rc<BusBody>,
}

struct BusBody {
	next_id: Cell<u64>,
	handlers: RefCell<FxHashMap<TypeId, Vec<Handler>>>,
}

struct Handler {
	id: u64,
	scope: Option<SessionId>,
	func: Rc<dyn Fn(&dyn Any)>,
}

impl Clone for EventBus {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl Default for EventBus {
	fn default() -> Self {
		EventBus::new()
	}
}

impl EventBus {
	pub fn new() -> Self {
		EventBus {
			body: Rc::new(BusBody {
				next_id: Cell::new(0),
				handlers: RefCell::new(FxHashMap::default()),
			}),
		}
	}

	pub fn on<E: Event>(&self, handler: impl Fn(&E) + 'static) -> EventObserver {
		self.subscribe(None, handler)
	}

	pub fn on_scoped<E: Event>(
		&self,
		scope: SessionId,
		handler: impl Fn(&E) + 'static,
	) -> EventObserver {
		self.subscribe(Some(scope), handler)
	}

	fn subscribe<E: Event>(
		&self,
		scope: Option<SessionId>,
		handler: impl Fn(&E) + 'static,
	) -> EventObserver {
		let id = self.body.next_id.get();
		self.body.next_id.set(id + 1);

		let func = Rc::new(move |event: &dyn Any| {
			if let Some(event) = event.downcast_ref::<E>() {
				handler(event);
			}
		});

		self.body
			.handlers
			.borrow_mut()
			.entry(TypeId::of::<E>())
			.or_default()
			.push(Handler { id, scope, func });

		EventObserver {
			bus: Rc::downgrade(&self.body),
			type_id: TypeId::of::<E>(),
			id,
		}
	}

	/// Deliver to the unscoped subscribers of `E`.
	pub fn emit<E: Event>(&self, event: E) {
		self.deliver(&event, None);
	}

	/// Deliver to the unscoped subscribers of `E` and to those scoped to
	/// `session`.
	pub fn emit_scoped<E: Event>(&self, event: E, session: &SessionId) {
		self.deliver(&event, Some(session));
	}

	fn deliver<E: Event>(&self, event: &E, session: Option<&SessionId>) {
		// Snapshot first: handlers may subscribe or revoke during
		// delivery.
		let funcs: Vec<Rc<dyn Fn(&dyn Any)>> = {
			let handlers = self.body.handlers.borrow();
			let Some(list) = handlers.get(&TypeId::of::<E>()) else {
				return;
			};

			list.iter()
				.filter(|handler| match (&handler.scope, session) {
					(None, _) => true,
					(Some(scope), Some(session)) => scope == session,
					(Some(_), None) => false,
				})
				.map(|handler| handler.func.clone())
				.collect()
		};

		for func in funcs {
			func(event);
		}
	}
}

/// Revocable subscription handle. Dropping it revokes the subscription,
/// so its lifetime is tied to whoever holds it, not to the bus.
pub struct EventObserver {
	bus: Weak<BusBody>,
	type_id: TypeId,
	id: u64,
}

impl EventObserver {
	/// Stop listening.
	pub fn off(self) {}

	fn revoke(&self) {
		let Some(bus) = self.bus.upgrade() else {
			return;
		};

		let mut handlers = bus.handlers.borrow_mut();
		if let Some(list) = handlers.get_mut(&self.type_id) {
			list.retain(|handler| handler.id != self.id);
		}
	}
}

impl Drop for EventObserver {
	fn drop(&mut self) {
		self.revoke();
	}
}
