//! Reusable "meaningful change" predicates.
//!
//! A predicate compares the previously accepted snapshot to a new
//! candidate and reports whether the difference warrants a UI update, as
//! opposed to any byte-level difference (a timestamp-only diff should not
//! cause a re-render). Predicates must be pure, deterministic and total,
//! including for empty collections; the absent previous value never
//! reaches a predicate, because first emissions are always accepted.

use std::hash::Hash;

use fxhash::FxHashSet;

/// Treat every emission as meaningful. The default when a call site has
/// no better policy: any new snapshot replaces the previous one.
pub fn always_changed<T>(_previous: &T, _next: &T) -> bool {
	true
}

/// Deep structural comparison of plain data records.
pub fn changed<T>(previous: &T, next: &T) -> bool
where
	T: PartialEq,
{
	previous != next
}

/// Structural comparison by hash. Equivalent to [`changed`] for types
/// whose `Hash` covers everything `PartialEq` does, without requiring a
/// `PartialEq` implementation.
pub fn hash_changed<T>(previous: &T, next: &T) -> bool
where
	T: Hash,
{
	fxhash::hash64(previous) != fxhash::hash64(next)
}

/// Order-insensitive set-of-keys comparison: "did the set of categories
/// change". Duplicates count once, so `[1, 1, 2]` and `[1, 2]` are the
/// same set.
pub fn key_set_changed<K>(previous: &[K], next: &[K]) -> bool
where
	K: Eq + Hash,
{
	let previous: FxHashSet<&K> = previous.iter().collect();
	let next: FxHashSet<&K> = next.iter().collect();

	previous != next
}

/// Item-wise comparison after sorting both lists by `key`: "did the set
/// of items change, ignoring order".
pub fn sorted_changed<T, K, F>(previous: &[T], next: &[T], key: F) -> bool
where
	T: PartialEq,
	K: Ord,
	F: Fn(&T) -> K,
{
	if previous.len() != next.len() {
		return true;
	}

	let mut previous: Vec<&T> = previous.iter().collect();
	let mut next: Vec<&T> = next.iter().collect();
	previous.sort_by(|a, b| key(a).cmp(&key(b)));
	next.sort_by(|a, b| key(a).cmp(&key(b)));

	previous.iter().zip(next.iter()).any(|(a, b)| a != b)
}

/// Lift a predicate over an optional previous value. An absent previous
/// value is always different from any candidate.
pub fn option_changed<T, F>(previous: Option<&T>, next: &T, predicate: F) -> bool
where
	F: Fn(&T, &T) -> bool,
{
	match previous {
		Some(previous) => predicate(previous, next),
		None => true,
	}
}
