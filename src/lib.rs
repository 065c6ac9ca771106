pub mod macros;
pub mod predicate;

mod error;
mod events;
mod manager;
mod promised;
mod registry;
mod watcher;

pub use error::WatchError;
pub use events::{AppResumed, Event, EventBus, EventObserver, RefreshRequested, SessionId, SiteUpdated};
pub use manager::LoadsManager;
pub use promised::PromisedValue;
pub use registry::{BlockKind, HandlerRegistry};
pub use watcher::LoadWatcher;

/// The readiness contract every page implements, consumed by navigation
/// and testing harnesses.
pub trait AsyncComponent: 'static {
	/// Resolved once after the page has completed its very first load
	/// cycle. Success, partial failure with fallback content and
	/// definitive failure all count as done: readiness means "stable
	/// enough to inspect", not "succeeded". Reloads never re-create it.
	fn ready(&self) -> PromisedValue<()>;
}

/// Cache-vs-network preference, passed through opaquely to data sources.
/// The load layer only reacts to how many emissions a strategy produces.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ReadingStrategy {
	CacheOnly,
	CacheThenNetwork,
	NetworkFirst,
	NetworkOnly,
}
