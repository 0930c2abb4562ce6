use std::collections::BTreeMap;

/// Recency order of cache keys.
///
/// Every access stamps the key with a fresh tick; the smallest live tick is
/// the least recently used key.
#[derive(Debug)]
pub(crate) struct AccessOrder<K> {
    next_tick: u64,
    by_tick: BTreeMap<u64, K>,
}

impl<K> AccessOrder<K> {
    pub(crate) fn new() -> Self {
        Self {
            next_tick: 0,
            by_tick: BTreeMap::new(),
        }
    }

    /// Stamp `key` as most recently used. `previous` is the tick the key held
    /// before, if any.
    pub(crate) fn touch(&mut self, previous: Option<u64>, key: K) -> u64 {
        if let Some(tick) = previous {
            self.by_tick.remove(&tick);
        }
        let tick = self.next_tick;
        self.next_tick += 1;
        self.by_tick.insert(tick, key);
        tick
    }

    pub(crate) fn forget(&mut self, tick: u64) {
        self.by_tick.remove(&tick);
    }

    /// Keys from least to most recently used, with their ticks.
    pub(crate) fn oldest_first(&self) -> impl Iterator<Item = (u64, &K)> + '_ {
        self.by_tick.iter().map(|(tick, key)| (*tick, key))
    }

    pub(crate) fn clear(&mut self) {
        self.by_tick.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.by_tick.len()
    }
}
