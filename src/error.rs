use std::rc::Rc;

use thiserror::Error;

/// Failure taxonomy for a watched request.
///
/// Clonable, so a single failure can fan out to every waiter of a
/// [`PromisedValue`](crate::PromisedValue). Stale-generation suppression
/// and a predicate returning `false` are routine outcomes, not errors,
/// and never surface through this type.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum WatchError {
	/// The data source failed. The message is opaque to this layer;
	/// the page owns user-visible error presentation.
	#[error("source failed: {0}")]
	Source(Rc<str>),

	/// The data source completed without emitting a single value.
	/// Sources must yield at least one snapshot or an error.
	#[error("source completed without a value")]
	NoData,

	/// The owning loads manager, and with it the spawner, is gone.
	#[error("loads manager is gone")]
	Shutdown,
}

impl WatchError {
	pub fn source(message: impl AsRef<str>) -> Self {
		WatchError::Source(Rc::from(message.as_ref()))
	}
}
