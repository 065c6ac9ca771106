use fxhash::FxHashMap;

/// An explicit capability registry: a mapping from capability name to
/// handler implementation.
///
/// Owned by the composition root and passed by reference to whoever
/// needs lookups, instead of a process-wide mutable singleton.
pub struct HandlerRegistry<H> {
	handlers: FxHashMap<String, H>,
}

impl<H> Default for HandlerRegistry<H> {
	fn default() -> Self {
		HandlerRegistry::new()
	}
}

impl<H> HandlerRegistry<H> {
	pub fn new() -> Self {
		HandlerRegistry {
			handlers: FxHashMap::default(),
		}
	}

	/// Register a handler under `name`, returning the handler it
	/// replaced, if any.
	pub fn register(&mut self, name: impl Into<String>, handler: H) -> Option<H> {
		self.handlers.insert(name.into(), handler)
	}

	pub fn get(&self, name: &str) -> Option<&H> {
		self.handlers.get(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.handlers.contains_key(name)
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.handlers.keys().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.handlers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.handlers.is_empty()
	}
}

/// How a block's display data should be rendered. An explicit tag carried
/// in the handler's returned data, replacing runtime type introspection
/// on the handler itself.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum BlockKind {
	/// A title with the block's content rendered below it.
	Titled,
	/// Markup prepared ahead of time by the handler.
	PreRendered,
	/// The handler renders everything itself.
	Custom,
}
