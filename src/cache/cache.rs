// Keyed, size-bounded, loader-based cache.
// One in-flight record per key: the first caller runs the loader, callers
// arriving while it runs wait for it and receive its outcome, value or
// error. A failed key is dropped from the map once its load has finished,
// so only a later request loads it again. The map lock is never held while
// a loader runs, and a key whose load is running is never evicted.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};

use super::invalidation::AccessOrder;

struct FlightState<V, E> {
    loading: bool,
    /// Bumped each time a load starts.
    generation: u64,
    value: Option<Arc<V>>,
    /// Error of the most recent failed load and the generation that raised it.
    failure: Option<(u64, E)>,
}

struct Flight<V, E> {
    state: Mutex<FlightState<V, E>>,
    done: Condvar,
}

impl<V, E> Flight<V, E> {
    fn new() -> Self {
        Self {
            state: Mutex::new(FlightState {
                loading: false,
                generation: 0,
                value: None,
                failure: None,
            }),
            done: Condvar::new(),
        }
    }

    fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    /// Finished without a value: never loaded, or the last load failed.
    fn is_settled_empty(&self) -> bool {
        let state = self.state.lock();
        !state.loading && state.value.is_none()
    }
}

/// Marks a running load. Publishes the outcome through [`LoadInFlight::finish`];
/// if the loader unwinds instead, dropping the marker clears the loading flag
/// and wakes the waiters so one of them can load.
struct LoadInFlight<'a, V, E> {
    flight: &'a Flight<V, E>,
    generation: u64,
    finished: bool,
}

impl<V, E: Clone> LoadInFlight<'_, V, E> {
    fn finish(mut self, result: &Result<Arc<V>, E>) {
        let mut state = self.flight.state.lock();
        state.loading = false;
        match result {
            Ok(value) => state.value = Some(Arc::clone(value)),
            Err(err) => state.failure = Some((self.generation, err.clone())),
        }
        drop(state);
        self.finished = true;
        self.flight.done.notify_all();
    }
}

impl<V, E> Drop for LoadInFlight<'_, V, E> {
    fn drop(&mut self) {
        if !self.finished {
            self.flight.state.lock().loading = false;
            self.flight.done.notify_all();
        }
    }
}

struct Slot<V, E> {
    flight: Arc<Flight<V, E>>,
    tick: u64,
}

struct CacheState<K, V, E> {
    slots: HashMap<K, Slot<V, E>>,
    order: AccessOrder<K>,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    load_failures: AtomicU64,
    evictions: AtomicU64,
}

/// Point-in-time counters of a [`LoadingCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Loader invocations, successful or not.
    pub loads: u64,
    pub load_failures: u64,
    pub evictions: u64,
    pub size: usize,
    pub capacity: usize,
}

pub struct LoadingCache<K, V, E> {
    name: &'static str,
    capacity: usize,
    state: Mutex<CacheState<K, V, E>>,
    counters: Counters,
}

impl<K, V, E> LoadingCache<K, V, E>
where
    K: Eq + Hash + Clone + Debug,
    E: Clone,
{
    /// `capacity` is clamped to at least one entry.
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            capacity: capacity.max(1),
            state: Mutex::new(CacheState {
                slots: HashMap::new(),
                order: AccessOrder::new(),
            }),
            counters: Counters::default(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Return the cached value for `key`, running `load` if there is none.
    ///
    /// At most one `load` runs per key at a time. Callers that arrive while it
    /// runs get its result, including its error. Errors are not cached: the
    /// first request after a failed load has finished runs `load` again.
    pub fn get_or_try_load<F>(&self, key: &K, load: F) -> Result<Arc<V>, E>
    where
        F: FnOnce(&K) -> Result<V, E>,
    {
        let flight = self.flight_for(key);
        let mut state = flight.state.lock();
        if let Some(value) = &state.value {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(value));
        }
        self.counters.misses.fetch_add(1, Ordering::Relaxed);

        while state.loading {
            let generation = state.generation;
            while state.loading && state.generation == generation {
                flight.done.wait(&mut state);
            }
            if let Some(value) = &state.value {
                return Ok(Arc::clone(value));
            }
            if let Some((failed, err)) = &state.failure {
                if *failed >= generation {
                    return Err(err.clone());
                }
            }
            // The load unwound without an outcome.
        }

        state.loading = true;
        state.generation += 1;
        let in_flight = LoadInFlight {
            flight: &*flight,
            generation: state.generation,
            finished: false,
        };
        drop(state);

        self.counters.loads.fetch_add(1, Ordering::Relaxed);
        let result = load(key).map(Arc::new);
        in_flight.finish(&result);

        if result.is_err() {
            self.counters.load_failures.fetch_add(1, Ordering::Relaxed);
            self.forget_failed(key, &flight);
        }
        result
    }

    /// Cached value for `key` without loading. Counts as an access.
    pub fn get_if_present(&self, key: &K) -> Option<Arc<V>> {
        let mut state = self.state.lock();
        let CacheState { slots, order } = &mut *state;
        let slot = slots.get_mut(key)?;
        let value = slot.flight.state.lock().value.clone()?;
        slot.tick = order.touch(Some(slot.tick), key.clone());
        Some(value)
    }

    /// Drop the entry for `key`. A load already running for it still
    /// completes for its callers but is not kept.
    pub fn invalidate(&self, key: &K) {
        let mut state = self.state.lock();
        if let Some(slot) = state.slots.remove(key) {
            state.order.forget(slot.tick);
        }
    }

    pub fn invalidate_all(&self) {
        let mut state = self.state.lock();
        state.slots.clear();
        state.order.clear();
    }

    /// Number of keys with a slot, loaded or loading.
    pub fn len(&self) -> usize {
        self.state.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            loads: self.counters.loads.load(Ordering::Relaxed),
            load_failures: self.counters.load_failures.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            size: self.len(),
            capacity: self.capacity,
        }
    }

    /// Find or create the in-flight record for `key`, mark it most recently
    /// used and evict down to capacity.
    fn flight_for(&self, key: &K) -> Arc<Flight<V, E>> {
        let mut state = self.state.lock();
        let CacheState { slots, order } = &mut *state;

        if let Some(slot) = slots.get_mut(key) {
            slot.tick = order.touch(Some(slot.tick), key.clone());
            return Arc::clone(&slot.flight);
        }

        let flight = Arc::new(Flight::new());
        let tick = order.touch(None, key.clone());
        slots.insert(
            key.clone(),
            Slot {
                flight: Arc::clone(&flight),
                tick,
            },
        );

        while slots.len() > self.capacity {
            // Oldest key that is neither the one being requested nor loading.
            let victim = order
                .oldest_first()
                .find(|(_, candidate)| {
                    *candidate != key && slots.get(*candidate).map_or(true, |slot| !slot.flight.is_loading())
                })
                .map(|(tick, candidate)| (tick, candidate.clone()));
            let Some((tick, oldest)) = victim else {
                break;
            };
            order.forget(tick);
            slots.remove(&oldest);
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(cache = self.name, key = ?oldest, "evicted least recently used entry");
        }
        debug_assert_eq!(slots.len(), order.len());
        flight
    }

    /// Remove `key` after a failed load, unless a newer load or a value
    /// took its place meanwhile.
    fn forget_failed(&self, key: &K, flight: &Arc<Flight<V, E>>) {
        let mut state = self.state.lock();
        let CacheState { slots, order } = &mut *state;
        let stale = slots
            .get(key)
            .is_some_and(|slot| Arc::ptr_eq(&slot.flight, flight) && slot.flight.is_settled_empty());
        if stale {
            if let Some(slot) = slots.remove(key) {
                order.forget(slot.tick);
            }
        }
    }
}
