//! Caller-owned memoization.

use std::collections::BTreeMap;

use crate::version::DatasetVersion;

/// Identity of an overlay input: which data, which scenario.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayKey {
    /// Fingerprint of the data directory.
    pub dataset_version: DatasetVersion,
    /// Selected scenario, `None` for the no-hazard baseline.
    pub scenario_id: Option<String>,
}

impl OverlayKey {
    /// Creates a key.
    #[must_use]
    pub fn new(dataset_version: DatasetVersion, scenario_id: Option<&str>) -> Self {
        Self {
            dataset_version,
            scenario_id: scenario_id.map(ToString::to_string),
        }
    }
}

/// Memo of per-scenario results, keyed by [`OverlayKey`].
///
/// Advisory only: a miss always recomputes, and nothing reads from the
/// cache except through [`Self::get_or_compute`] and
/// [`Self::get_or_try_compute`].
#[derive(Debug, Clone)]
pub struct OverlayCache<T> {
    entries: BTreeMap<OverlayKey, T>,
}

impl<T> Default for OverlayCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OverlayCache<T> {
    /// Creates an empty cache.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Returns the cached value for `key`, computing and storing it on a
    /// miss.
    pub fn get_or_compute(&mut self, key: OverlayKey, compute: impl FnOnce() -> T) -> &T {
        self.entries.entry(key).or_insert_with_key(|key| {
            log::debug!(
                "Overlay cache miss for {:?} @ {}",
                key.scenario_id,
                key.dataset_version.short()
            );
            compute()
        })
    }

    /// Like [`Self::get_or_compute`], but nothing is stored when
    /// `compute` fails.
    ///
    /// # Errors
    ///
    /// Returns whatever error `compute` returns.
    pub fn get_or_try_compute<E>(
        &mut self,
        key: OverlayKey,
        compute: impl FnOnce() -> Result<T, E>,
    ) -> Result<&T, E> {
        if !self.entries.contains_key(&key) {
            log::debug!(
                "Overlay cache miss for {:?} @ {}",
                key.scenario_id,
                key.dataset_version.short()
            );
            let value = compute()?;
            self.entries.insert(key.clone(), value);
        }

        Ok(&self.entries[&key])
    }

    /// Drops every entry computed from `version`. Returns how many were
    /// removed.
    pub fn invalidate(&mut self, version: &DatasetVersion) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.dataset_version != *version);
        before - self.entries.len()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
