//! Reference-counted loading signal shared by the transport and UI consumers.
//!
//! [`LoadingSignal`] keeps a count of tracked in-flight calls and publishes a boolean
//! "is anything loading" value. Subscribers are notified only when that boolean flips, so a
//! second overlapping call (1 → 2) is silent while the final completion (1 → 0) is not.
//! The transport pairs every increment with a [`LoadingGuard`], which performs exactly one
//! decrement when dropped.

// crates.io
use parking_lot::ReentrantMutex;
// self
use crate::_prelude::*;

/// Callback invoked with the new loading state after each boundary crossing.
pub type LoadingListener = Arc<dyn Fn(bool) + Send + Sync>;

/// Handle returned by [`LoadingSignal::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct SignalState {
	count: usize,
	next_id: u64,
	listeners: Vec<(SubscriptionId, LoadingListener)>,
}

/// Observable counter exposing whether any tracked call is in flight.
///
/// Mutations are serialized so listeners observe transitions in the order they happened.
/// Listeners run on the mutating thread after the state lock is released; they may read the
/// signal and may even mutate it from the same thread.
#[derive(Default)]
pub struct LoadingSignal {
	state: Mutex<SignalState>,
	delivery: ReentrantMutex<()>,
}
impl LoadingSignal {
	/// Creates a fresh signal with a zero count.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds one tracked call.
	pub fn increment(&self) {
		self.update(|count| count.saturating_add(1));
	}

	/// Removes one tracked call; the count never drops below zero.
	pub fn decrement(&self) {
		self.update(|count| count.saturating_sub(1));
	}

	/// Forces the count back to zero regardless of history.
	pub fn reset(&self) {
		self.update(|_| 0);
	}

	/// Returns `true` while at least one tracked call is active.
	pub fn is_loading(&self) -> bool {
		self.state.lock().count > 0
	}

	/// Returns the raw reference count.
	pub fn count(&self) -> usize {
		self.state.lock().count
	}

	/// Increments the signal and returns a guard that decrements it once on drop.
	pub fn track(self: &Arc<Self>) -> LoadingGuard {
		self.increment();

		LoadingGuard { signal: Arc::clone(self) }
	}

	/// Registers a listener notified on every transition between idle and loading.
	pub fn subscribe(&self, listener: impl Fn(bool) + Send + Sync + 'static) -> SubscriptionId {
		let mut state = self.state.lock();
		let id = SubscriptionId(state.next_id);

		state.next_id += 1;
		state.listeners.push((id, Arc::new(listener)));

		id
	}

	/// Removes a listener; returns `false` when the handle was unknown.
	pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
		let mut state = self.state.lock();
		let before = state.listeners.len();

		state.listeners.retain(|(existing, _)| *existing != id);

		state.listeners.len() != before
	}

	fn update(&self, apply: impl FnOnce(usize) -> usize) {
		let _delivery = self.delivery.lock();
		let (loading, listeners) = {
			let mut state = self.state.lock();
			let was_loading = state.count > 0;

			state.count = apply(state.count);

			let loading = state.count > 0;

			if loading == was_loading {
				return;
			}

			(loading, state.listeners.iter().map(|(_, l)| Arc::clone(l)).collect::<Vec<_>>())
		};

		#[cfg(feature = "tracing")]
		tracing::debug!(loading, "loading signal changed");

		for listener in listeners {
			listener(loading);
		}
	}
}
impl Debug for LoadingSignal {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.state.lock();

		f.debug_struct("LoadingSignal")
			.field("count", &state.count)
			.field("listeners", &state.listeners.len())
			.finish()
	}
}

/// RAII guard produced by [`LoadingSignal::track`].
#[must_use = "dropping the guard immediately ends the tracked call"]
pub struct LoadingGuard {
	signal: Arc<LoadingSignal>,
}
impl Drop for LoadingGuard {
	fn drop(&mut self) {
		self.signal.decrement();
	}
}
impl Debug for LoadingGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("LoadingGuard(..)")
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;

	fn recorded(signal: &LoadingSignal) -> Arc<Mutex<Vec<bool>>> {
		let seen = Arc::new(Mutex::new(Vec::new()));
		let sink = Arc::clone(&seen);

		signal.subscribe(move |loading| sink.lock().push(loading));

		seen
	}

	#[test]
	fn surplus_decrements_clamp_at_zero() {
		for (increments, decrements) in [(0, 0), (0, 3), (2, 2), (3, 5), (5, 9)] {
			let signal = LoadingSignal::new();

			for _ in 0..increments {
				signal.increment();
			}
			for _ in 0..decrements {
				signal.decrement();

				assert!(signal.count() <= increments);
			}

			assert_eq!(signal.count(), 0, "{increments} up / {decrements} down must settle at 0.");
			assert!(!signal.is_loading());
		}
	}

	#[test]
	fn listeners_fire_only_on_boundary_crossings() {
		let signal = LoadingSignal::new();
		let seen = recorded(&signal);

		signal.increment();
		signal.increment();
		signal.decrement();

		assert_eq!(*seen.lock(), vec![true]);

		signal.decrement();
		signal.decrement();

		assert_eq!(*seen.lock(), vec![true, false]);
	}

	#[test]
	fn reset_forces_idle_and_notifies_once() {
		let signal = LoadingSignal::new();

		signal.increment();
		signal.increment();

		let seen = recorded(&signal);

		signal.reset();
		signal.reset();

		assert!(!signal.is_loading());
		assert_eq!(*seen.lock(), vec![false]);
	}

	#[test]
	fn guard_decrements_exactly_once() {
		let signal = Arc::new(LoadingSignal::new());
		let first = signal.track();
		let second = signal.track();

		assert_eq!(signal.count(), 2);

		drop(first);

		assert!(signal.is_loading());

		drop(second);

		assert_eq!(signal.count(), 0);
	}

	#[test]
	fn unsubscribed_listeners_stop_receiving() {
		let signal = LoadingSignal::new();
		let hits = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&hits);
		let id = signal.subscribe(move |_| {
			counter.fetch_add(1, Ordering::SeqCst);
		});

		signal.increment();

		assert!(signal.unsubscribe(id));
		assert!(!signal.unsubscribe(id));

		signal.decrement();

		assert_eq!(hits.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn listeners_may_read_and_mutate_the_signal() {
		let signal = Arc::new(LoadingSignal::new());
		let observed = Arc::new(Mutex::new(Vec::new()));
		let inner = Arc::clone(&signal);
		let sink = Arc::clone(&observed);

		signal.subscribe(move |loading| {
			sink.lock().push(inner.is_loading());

			if !loading {
				inner.reset();
			}
		});
		signal.increment();
		signal.decrement();

		assert_eq!(*observed.lock(), vec![true, false]);
	}

	#[test]
	fn parallel_guards_settle_at_zero() {
		let signal = Arc::new(LoadingSignal::new());
		let handles = (0..8)
			.map(|_| {
				let signal = Arc::clone(&signal);

				std::thread::spawn(move || {
					for _ in 0..1_000 {
						let _guard = signal.track();
					}
				})
			})
			.collect::<Vec<_>>();

		for handle in handles {
			handle.join().expect("Worker thread should not panic.");
		}

		assert_eq!(signal.count(), 0);
	}
}
