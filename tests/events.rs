use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::executor::{block_on, LocalPool};
use futures::task::LocalSpawnExt;

use loadwatch::{
	predicate, AppResumed, BlockKind, EventBus, HandlerRegistry, PromisedValue, SessionId,
	SiteUpdated, WatchError,
};

#[test]
fn promised_value_settles_once() {
	let promised = PromisedValue::new();
	assert!(!promised.is_settled());

	promised.resolve(1);
	promised.reject(WatchError::NoData);
	promised.resolve(2);

	assert!(promised.is_resolved());
	assert!(!promised.is_rejected());
	assert_eq!(promised.value(), Some(1));
	assert_eq!(block_on(promised.clone()), Ok(1));
}

#[test]
fn promised_value_wakes_every_waiter() {
	let mut pool = LocalPool::new();
	let spawner = pool.spawner();
	let promised: PromisedValue<u64> = PromisedValue::new();
	let seen: Rc<RefCell<Vec<u64>>> = Rc::new(RefCell::new(Vec::new()));

	for _ in 0..3 {
		spawner
			.spawn_local({
				let promised = promised.clone();
				let seen = seen.clone();
				async move {
					let value = promised.await.unwrap();
					seen.borrow_mut().push(value);
				}
			})
			.unwrap();
	}

	pool.run_until_stalled();
	assert!(seen.borrow().is_empty());

	promised.resolve(7);
	pool.run_until_stalled();
	assert_eq!(*seen.borrow(), vec![7, 7, 7]);

	// Waiters attaching after the transition see the same outcome.
	assert_eq!(block_on(promised.clone()), Ok(7));
}

#[test]
fn rejection_fans_out_to_every_waiter() {
	let promised: PromisedValue<u64> = PromisedValue::new();
	promised.reject(WatchError::source("offline"));

	assert!(promised.is_rejected());
	assert_eq!(promised.value(), None);
	assert_eq!(block_on(promised.clone()), Err(WatchError::source("offline")));
	assert_eq!(block_on(promised.clone()), Err(WatchError::source("offline")));
}

#[test]
fn scoped_handlers_only_see_their_session() {
	let bus = EventBus::new();
	let session = SessionId::new("site-1");
	let other = SessionId::new("site-2");

	let scoped = Rc::new(Cell::new(0u32));
	let unscoped = Rc::new(Cell::new(0u32));

	let _scoped = bus.on_scoped(session.clone(), {
		let scoped = scoped.clone();
		move |_: &SiteUpdated| scoped.set(scoped.get() + 1)
	});
	let _unscoped = bus.on({
		let unscoped = unscoped.clone();
		move |_: &SiteUpdated| unscoped.set(unscoped.get() + 1)
	});

	bus.emit_scoped(SiteUpdated { session: session.clone() }, &session);
	bus.emit_scoped(SiteUpdated { session: other.clone() }, &other);
	bus.emit(SiteUpdated { session: session.clone() });

	assert_eq!(scoped.get(), 1);
	assert_eq!(unscoped.get(), 3);
}

#[test]
fn dropping_the_observer_unsubscribes() {
	let bus = EventBus::new();
	let seen = Rc::new(Cell::new(0u32));

	let observer = bus.on({
		let seen = seen.clone();
		move |_: &AppResumed| seen.set(seen.get() + 1)
	});

	bus.emit(AppResumed);
	observer.off();
	bus.emit(AppResumed);

	assert_eq!(seen.get(), 1);

	{
		let _observer = bus.on({
			let seen = seen.clone();
			move |_: &AppResumed| seen.set(seen.get() + 1)
		});
		bus.emit(AppResumed);
	}

	bus.emit(AppResumed);
	assert_eq!(seen.get(), 2);
}

#[derive(PartialEq, Hash, Debug)]
struct Module {
	id: u64,
	name: String,
	visible: bool,
}

fn module(id: u64, name: &str, visible: bool) -> Module {
	Module {
		id,
		name: name.to_string(),
		visible,
	}
}

#[test]
fn deep_equality_predicates() {
	let a = module(1, "News", true);
	let b = module(1, "News", true);
	let c = module(1, "News", false);

	assert!(!predicate::changed(&a, &b));
	assert!(predicate::changed(&a, &c));
	assert!(!predicate::hash_changed(&a, &b));
	assert!(predicate::hash_changed(&a, &c));
	assert!(predicate::always_changed(&a, &b));
}

#[test]
fn key_set_comparison_ignores_order_and_duplicates() {
	assert!(!predicate::key_set_changed(&[1, 2], &[2, 1]));
	assert!(!predicate::key_set_changed(&[1, 1, 2], &[1, 2]));
	assert!(predicate::key_set_changed(&[1, 2], &[1, 2, 3]));
	assert!(predicate::key_set_changed(&[1], &[]));
	assert!(!predicate::key_set_changed::<u64>(&[], &[]));
}

#[test]
fn sorted_comparison_ignores_order_only() {
	let previous = vec![module(2, "Forum", true), module(1, "News", true)];
	let same = vec![module(1, "News", true), module(2, "Forum", true)];
	let renamed = vec![module(1, "News!", true), module(2, "Forum", true)];

	assert!(!predicate::sorted_changed(&previous, &same, |module| module.id));
	assert!(predicate::sorted_changed(&previous, &renamed, |module| module.id));
	assert!(predicate::sorted_changed(&previous, &[], |module| module.id));
	assert!(!predicate::sorted_changed::<Module, u64, _>(&[], &[], |module| module.id));
}

#[test]
fn absent_previous_value_is_always_a_change() {
	assert!(predicate::option_changed(None, &1, predicate::changed));
	assert!(!predicate::option_changed(Some(&1), &1, predicate::changed));
	assert!(predicate::option_changed(Some(&1), &2, predicate::changed));
}

#[test]
fn registry_lookup_and_replacement() {
	struct BlockHandler {
		kind: BlockKind,
	}

	let mut registry = HandlerRegistry::new();
	assert!(registry.is_empty());

	registry.register("activity_modules", BlockHandler { kind: BlockKind::Titled });
	registry.register("html", BlockHandler { kind: BlockKind::PreRendered });

	assert_eq!(registry.len(), 2);
	assert!(registry.contains("html"));
	assert!(registry.get("timeline").is_none());
	assert_eq!(registry.get("activity_modules").unwrap().kind, BlockKind::Titled);

	let replaced = registry.register("html", BlockHandler { kind: BlockKind::Custom });
	assert_eq!(replaced.unwrap().kind, BlockKind::PreRendered);
	assert_eq!(registry.get("html").unwrap().kind, BlockKind::Custom);

	let mut names: Vec<&str> = registry.names().collect();
	names.sort_unstable();
	assert_eq!(names, vec!["activity_modules", "html"]);
}
