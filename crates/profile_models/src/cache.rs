//! Keyed cache for shared profile precomputations.
//!
//! Building a family's shape-only state is expensive: root solves,
//! kernel tabulation and sampler assembly can take milliseconds to
//! seconds. Instances with the same shape parameters share one
//! [`std::sync::Arc`]-held precomputation through an [`InfoCache`].
//!
//! The cache gives three guarantees under concurrency:
//!
//! - a key is built at most once at a time: callers that race on a
//!   missing key block on a per-key gate while a single builder runs,
//!   and every waiter receives the same shared result,
//! - a failed build is not cached: the error is handed to the builder
//!   and every current waiter, and the key is released so a later call
//!   can retry,
//! - a builder that panics releases its waiters, which retry and may
//!   claim the build themselves.
//!
//! Only the per-key gate blocks; the map lock is held for short map
//! updates, never across a build. When the cache grows past its
//! capacity the least recently used entry is dropped. Entries are
//! never invalidated otherwise, so a held `Arc` stays valid after
//! eviction.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crate::error::ProfileError;

/// Hashable wrapper for an `f64` cache-key component.
///
/// Keys compare bit-exactly, matching the hashing convention of
/// `ProfileParams`: `-0.0` and `0.0` are distinct keys, as are
/// different NaN payloads. Shape parameters reach the cache unchanged
/// from user input, so bit-exact identity is the right notion of
/// "same profile".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FloatKey(u64);

impl From<f64> for FloatKey {
    fn from(value: f64) -> Self {
        Self(value.to_bits())
    }
}

impl FloatKey {
    /// Recovers the floating-point value this key was made from.
    pub fn value(self) -> f64 {
        f64::from_bits(self.0)
    }
}

/// Outcome slot of a single in-flight build.
enum GateState<V> {
    /// The builder is still running.
    Pending,
    /// The builder finished; waiters clone this outcome.
    Done(Result<Arc<V>, ProfileError>),
    /// The builder unwound without producing an outcome.
    Cancelled,
}

/// Per-key rendezvous between one builder and any number of waiters.
struct BuildGate<V> {
    outcome: Mutex<GateState<V>>,
    ready: Condvar,
}

impl<V> BuildGate<V> {
    fn new() -> Self {
        Self {
            outcome: Mutex::new(GateState::Pending),
            ready: Condvar::new(),
        }
    }

    /// Blocks until the builder resolves the gate.
    ///
    /// Returns `None` when the builder was cancelled, in which case the
    /// caller should retry against the cache.
    fn wait_for_outcome(&self) -> Option<Result<Arc<V>, ProfileError>> {
        let mut outcome = lock_recovering(&self.outcome);
        loop {
            match &*outcome {
                GateState::Pending => {
                    outcome = self
                        .ready
                        .wait(outcome)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                GateState::Done(result) => return Some(result.clone()),
                GateState::Cancelled => return None,
            }
        }
    }

    /// Marks an unwound build as cancelled and wakes every waiter.
    fn cancel(&self) {
        {
            let mut outcome = lock_recovering(&self.outcome);
            if matches!(*outcome, GateState::Pending) {
                *outcome = GateState::Cancelled;
            }
        }
        self.ready.notify_all();
    }

    /// Publishes the build outcome and wakes every waiter.
    fn complete(&self, result: Result<Arc<V>, ProfileError>) {
        {
            let mut outcome = lock_recovering(&self.outcome);
            *outcome = GateState::Done(result);
        }
        self.ready.notify_all();
    }
}

/// Map slot: either a finished value or an in-flight build.
enum Slot<V> {
    Ready(Arc<V>),
    Building(Arc<BuildGate<V>>),
}

struct CacheState<K, V> {
    entries: HashMap<K, Slot<V>>,
    /// Keys of `Ready` entries, least recently used first.
    recency: VecDeque<K>,
}

/// Bounded, thread-safe cache of shared precomputations.
///
/// `K` is the full shape key, typically a tuple of [`FloatKey`]-wrapped
/// shape parameters and the accuracy parameter set. `V` is the
/// precomputation itself, handed out as `Arc<V>`.
pub struct InfoCache<K, V> {
    state: Mutex<CacheState<K, V>>,
    capacity: usize,
    name: &'static str,
}

/// Decision taken under the map lock for one lookup round.
enum Claim<V> {
    /// This caller installed the gate and must run the build.
    Build(Arc<BuildGate<V>>),
    /// Another caller is building; wait on its gate.
    Wait(Arc<BuildGate<V>>),
}

/// Removes a claimed-but-unfinished entry if the builder unwinds.
struct BuildCleanup<'a, K: Eq + Hash + Clone, V> {
    cache: &'a InfoCache<K, V>,
    key: &'a K,
    gate: &'a Arc<BuildGate<V>>,
    completed: bool,
}

impl<K: Eq + Hash + Clone, V> Drop for BuildCleanup<'_, K, V> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        {
            let mut guard = self.cache.lock_state();
            if let Some(Slot::Building(current)) = guard.entries.get(self.key) {
                if Arc::ptr_eq(current, self.gate) {
                    guard.entries.remove(self.key);
                }
            }
        }
        self.gate.cancel();
        tracing::debug!(cache = self.cache.name, "profile info build panicked");
    }
}

fn lock_recovering<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A poisoned lock means a thread panicked inside a short map or
    // gate update; the guarded state itself stays structurally sound.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<K: Eq + Hash + Clone, V> InfoCache<K, V> {
    /// Creates an empty cache holding at most `capacity` finished entries.
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                recency: VecDeque::new(),
            }),
            capacity,
            name,
        }
    }

    /// Returns the cached value for `key`, building it if necessary.
    ///
    /// On a hit the shared value is returned immediately. On a miss the
    /// calling thread runs `builder` while concurrent callers for the
    /// same key block and then share the outcome, success or error
    /// alike. Errors are returned to every current caller but are not
    /// cached, so the next call retries the build.
    pub fn get_or_build<F>(&self, key: K, builder: F) -> Result<Arc<V>, ProfileError>
    where
        F: FnOnce() -> Result<V, ProfileError>,
    {
        let gate = loop {
            let claim = {
                let mut guard = self.lock_state();
                let state = &mut *guard;
                match state.entries.get(&key) {
                    Some(Slot::Ready(info)) => {
                        let shared = Arc::clone(info);
                        Self::touch(&mut state.recency, &key);
                        tracing::debug!(cache = self.name, "profile info cache hit");
                        return Ok(shared);
                    }
                    Some(Slot::Building(gate)) => Claim::Wait(Arc::clone(gate)),
                    None => {
                        let gate = Arc::new(BuildGate::new());
                        state
                            .entries
                            .insert(key.clone(), Slot::Building(Arc::clone(&gate)));
                        Claim::Build(gate)
                    }
                }
            };
            match claim {
                Claim::Build(gate) => break gate,
                Claim::Wait(gate) => match gate.wait_for_outcome() {
                    Some(outcome) => return outcome,
                    // The builder unwound; retry, possibly claiming the
                    // build on the next round.
                    None => continue,
                },
            }
        };

        tracing::debug!(cache = self.name, "profile info cache miss, building");
        let built = {
            let mut cleanup = BuildCleanup {
                cache: self,
                key: &key,
                gate: &gate,
                completed: false,
            };
            let result = builder().map(Arc::new);
            cleanup.completed = true;
            result
        };
        self.publish(key, &gate, built)
    }

    /// Number of finished entries currently held.
    pub fn len(&self) -> usize {
        self.lock_state()
            .entries
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    /// True when no finished entry is held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of finished entries kept before eviction.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True when a finished entry for `key` is held.
    pub fn contains(&self, key: &K) -> bool {
        matches!(
            self.lock_state().entries.get(key),
            Some(Slot::Ready(_))
        )
    }

    fn lock_state(&self) -> MutexGuard<'_, CacheState<K, V>> {
        lock_recovering(&self.state)
    }

    fn touch(recency: &mut VecDeque<K>, key: &K) {
        if let Some(pos) = recency.iter().position(|k| k == key) {
            if let Some(entry) = recency.remove(pos) {
                recency.push_back(entry);
            }
        }
    }

    /// Records the build outcome in the map, then resolves the gate.
    ///
    /// The map is updated first so that a caller woken by the gate and
    /// retrying immediately observes the new state.
    fn publish(
        &self,
        key: K,
        gate: &Arc<BuildGate<V>>,
        built: Result<Arc<V>, ProfileError>,
    ) -> Result<Arc<V>, ProfileError> {
        {
            let mut guard = self.lock_state();
            let state = &mut *guard;
            match &built {
                Ok(info) => {
                    state.entries.insert(key.clone(), Slot::Ready(Arc::clone(info)));
                    state.recency.push_back(key);
                    while state.recency.len() > self.capacity {
                        if let Some(oldest) = state.recency.pop_front() {
                            state.entries.remove(&oldest);
                            tracing::debug!(
                                cache = self.name,
                                "evicted least recently used profile info"
                            );
                        }
                    }
                }
                Err(error) => {
                    state.entries.remove(&key);
                    tracing::debug!(
                        cache = self.name,
                        error = %error,
                        "profile info build failed"
                    );
                }
            }
        }
        gate.complete(built.clone());
        built
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn build_error() -> ProfileError {
        ProfileError::ParameterRange {
            name: "test",
            value: -1.0,
            min: 0.0,
            max: 1.0,
        }
    }

    #[test]
    fn repeated_lookup_shares_one_build() {
        let cache: InfoCache<u32, f64> = InfoCache::new("test", 8);
        let builds = AtomicUsize::new(0);

        let first = cache
            .get_or_build(7, || {
                builds.fetch_add(1, Ordering::SeqCst);
                Ok(1.5)
            })
            .unwrap();
        let second = cache
            .get_or_build(7, || {
                builds.fetch_add(1, Ordering::SeqCst);
                Ok(2.5)
            })
            .unwrap();

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*second, 1.5);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_keys_build_separately() {
        let cache: InfoCache<u32, f64> = InfoCache::new("test", 8);
        let a = cache.get_or_build(1, || Ok(1.0)).unwrap();
        let b = cache.get_or_build(2, || Ok(2.0)).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn float_keys_are_bit_exact() {
        assert_eq!(FloatKey::from(0.5), FloatKey::from(0.5));
        assert_ne!(FloatKey::from(0.5), FloatKey::from(0.5 + 1e-12));
        assert_ne!(FloatKey::from(0.0), FloatKey::from(-0.0));
        assert_eq!(FloatKey::from(2.75).value(), 2.75);
    }

    #[test]
    fn capacity_evicts_least_recently_used() {
        let cache: InfoCache<u32, f64> = InfoCache::new("test", 2);
        cache.get_or_build(1, || Ok(1.0)).unwrap();
        cache.get_or_build(2, || Ok(2.0)).unwrap();
        // Touch key 1 so key 2 becomes the eviction candidate.
        cache.get_or_build(1, || Ok(-1.0)).unwrap();
        cache.get_or_build(3, || Ok(3.0)).unwrap();

        assert!(cache.contains(&1));
        assert!(!cache.contains(&2));
        assert!(cache.contains(&3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn evicted_key_rebuilds() {
        let cache: InfoCache<u32, f64> = InfoCache::new("test", 1);
        let first = cache.get_or_build(1, || Ok(1.0)).unwrap();
        cache.get_or_build(2, || Ok(2.0)).unwrap();
        assert!(!cache.contains(&1));

        let rebuilt = cache.get_or_build(1, || Ok(10.0)).unwrap();
        assert!(!Arc::ptr_eq(&first, &rebuilt));
        assert_eq!(*rebuilt, 10.0);
        // The original handle stays valid after eviction.
        assert_eq!(*first, 1.0);
    }

    #[test]
    fn failed_build_is_not_cached() {
        let cache: InfoCache<u32, f64> = InfoCache::new("test", 8);
        let builds = AtomicUsize::new(0);

        let err = cache.get_or_build(5, || {
            builds.fetch_add(1, Ordering::SeqCst);
            Err(build_error())
        });
        assert!(err.is_err());
        assert_eq!(cache.len(), 0);

        let ok = cache
            .get_or_build(5, || {
                builds.fetch_add(1, Ordering::SeqCst);
                Ok(5.0)
            })
            .unwrap();
        assert_eq!(*ok, 5.0);
        assert_eq!(builds.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn concurrent_waiters_share_one_build() {
        let cache: InfoCache<u32, f64> = InfoCache::new("test", 8);
        let builds = AtomicUsize::new(0);

        let results: Vec<Arc<f64>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        cache
                            .get_or_build(9, || {
                                builds.fetch_add(1, Ordering::SeqCst);
                                std::thread::sleep(Duration::from_millis(25));
                                Ok(9.0)
                            })
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        for result in &results {
            assert!(Arc::ptr_eq(result, &results[0]));
        }
    }

    #[test]
    fn failed_build_reaches_every_waiter() {
        let cache: InfoCache<u32, f64> = InfoCache::new("test", 8);
        let builds = AtomicUsize::new(0);

        let outcomes: Vec<Result<Arc<f64>, ProfileError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(|| {
                        cache.get_or_build(3, || {
                            builds.fetch_add(1, Ordering::SeqCst);
                            std::thread::sleep(Duration::from_millis(25));
                            Err(build_error())
                        })
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        // One builder ran; waiters that arrived during the build share
        // its error, late arrivals may have retried and failed again.
        assert!(builds.load(Ordering::SeqCst) >= 1);
        for outcome in &outcomes {
            assert!(outcome.is_err());
        }
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn panicking_builder_releases_the_key() {
        let cache: InfoCache<u32, f64> = InfoCache::new("test", 8);

        let unwound = catch_unwind(AssertUnwindSafe(|| {
            let _ = cache.get_or_build(4, || -> Result<f64, ProfileError> {
                panic!("builder exploded")
            });
        }));
        assert!(unwound.is_err());
        assert_eq!(cache.len(), 0);

        let rebuilt = cache.get_or_build(4, || Ok(4.0)).unwrap();
        assert_eq!(*rebuilt, 4.0);
        assert_eq!(cache.len(), 1);
    }
}
