//! Transactional metric cache between stat collectors and the scrape handler.
//!
//! Producers open a write [`Session`], insert (or, in watch mode, delete) any
//! number of metrics, and commit; the effects of a session become visible to
//! readers atomically at commit. Consumers take a [`Snapshot`], a shared
//! read-only view whose family and metric ordering was fixed at the last
//! commit, so repeated reads with no intervening session are identical.
//!
//! Staleness is handled by one of two policies fixed at construction:
//!
//! - [`Mode::Reset`]: every session re-declares the full current state.
//!   Families and metrics not re-inserted during a session are pruned at its
//!   commit. Pruning is generational: a single `desired_touch` flag flips per
//!   commit, redefining which entries count as current without rewriting
//!   every entry's marker.
//! - [`Mode::Watch`]: entries persist until an explicit [`Session::delete`].
//!
//! The cache performs no I/O and never logs; errors propagate to the caller.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

mod entry;
mod error;
mod hash;

use entry::Family;

pub use entry::{LabelPair, Metric, Value, ValueKind};
pub use error::{CacheError, Result};

/// Staleness policy, fixed when the cache is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Every session re-declares the full state; anything not re-inserted is
    /// pruned at commit.
    Reset,
    /// Entries persist until explicitly deleted.
    Watch,
}

#[derive(Debug)]
struct Inner {
    families: HashMap<String, Family>,
    /// The touch value that means "seen this generation". Flipped once per
    /// committed reset-mode session instead of clearing every entry's flag.
    desired_touch: bool,
}

/// The shared metric store. One writer (an open [`Session`]) excludes all
/// readers; any number of [`Snapshot`] readers may coexist.
#[derive(Debug)]
pub struct Cache {
    inner: RwLock<Inner>,
    mode: Mode,
}

impl Cache {
    pub fn new(mode: Mode) -> Self {
        Self {
            inner: RwLock::new(Inner {
                families: HashMap::new(),
                desired_touch: true,
            }),
            mode,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Opens a write session, blocking until no other session and no
    /// snapshot is live. The exclusive lock is held by the returned guard,
    /// so a second concurrent session is impossible rather than detected.
    ///
    /// Dropping the session commits it; see [`Session::commit`].
    pub fn begin_session(&self) -> Session<'_> {
        Session {
            mode: self.mode,
            inner: self.inner.write(),
            committed: false,
        }
    }

    /// Takes a consistent read-only view of the last committed state,
    /// blocking while a session is open. Concurrent snapshots share the
    /// read lock; the view is released when the snapshot is dropped.
    pub fn gather(&self) -> Snapshot<'_> {
        Snapshot {
            inner: self.inner.read(),
        }
    }
}

/// An exclusive write transaction against the cache.
///
/// The commit algorithm (reset-mode pruning, then rebuild of the cached
/// output order for families whose membership changed) runs exactly once,
/// either through [`Session::commit`] or on drop, so every exit path
/// releases the cache in a consistent state.
pub struct Session<'a> {
    mode: Mode,
    inner: RwLockWriteGuard<'a, Inner>,
    committed: bool,
}

impl Session<'_> {
    /// Inserts or updates one metric.
    ///
    /// `label_names` and `label_values` are parallel arrays; they need not
    /// be pre-sorted, the identity is computed from the name-sorted order.
    /// The family's help text and value kind are overwritten unconditionally
    /// (last write wins). An insert for an existing identity updates the
    /// value and timestamp in place without touching the output order.
    ///
    /// # Errors
    ///
    /// [`CacheError::EmptyFamilyName`] or [`CacheError::LabelMismatch`] on
    /// malformed input; the cache is left unchanged.
    pub fn insert(
        &mut self,
        family_name: &str,
        label_names: &[&str],
        label_values: &[&str],
        help: &str,
        value: Value,
        timestamp_ms: Option<i64>,
    ) -> Result<()> {
        let order = validate(family_name, label_names, label_values)?;
        let hash = hash::identity(family_name, order.iter().map(|&i| label_values[i]));

        let reset = self.mode == Mode::Reset;
        let desired = self.inner.desired_touch;

        let family = self
            .inner
            .families
            .entry(family_name.to_owned())
            .or_insert_with(Family::new);
        help.clone_into(&mut family.help);
        family.kind = value.kind();
        if reset {
            family.touched = desired;
        }

        match family.metrics.entry(hash) {
            Entry::Occupied(mut occupied) => {
                let metric = occupied.get_mut();
                metric.value = value;
                metric.timestamp_ms = timestamp_ms;
                if reset {
                    metric.touched = desired;
                }
            }
            Entry::Vacant(vacant) => {
                let labels = order
                    .iter()
                    .map(|&i| LabelPair::new(label_names[i], label_values[i]))
                    .collect();
                vacant.insert(Metric {
                    labels,
                    value,
                    timestamp_ms,
                    touched: desired,
                });
                // Only membership changes invalidate the cached order.
                family.dirty = true;
            }
        }

        Ok(())
    }

    /// Removes one metric by identity. Watch mode only.
    ///
    /// Deleting an identity that does not exist is a no-op success. If the
    /// removed metric was the family's last, the family goes with it.
    ///
    /// # Errors
    ///
    /// [`CacheError::DeleteInResetMode`] on a reset-mode cache, where
    /// generational pruning owns staleness; otherwise the same input
    /// validation as [`Session::insert`].
    pub fn delete(
        &mut self,
        family_name: &str,
        label_names: &[&str],
        label_values: &[&str],
    ) -> Result<()> {
        if self.mode == Mode::Reset {
            return Err(CacheError::DeleteInResetMode);
        }
        let order = validate(family_name, label_names, label_values)?;
        let hash = hash::identity(family_name, order.iter().map(|&i| label_values[i]));

        let now_empty = match self.inner.families.get_mut(family_name) {
            Some(family) => {
                if family.metrics.remove(&hash).is_none() {
                    return Ok(());
                }
                if family.metrics.is_empty() {
                    true
                } else {
                    family.dirty = true;
                    false
                }
            }
            // Unknown identities are a no-op, deletes are idempotent.
            None => return Ok(()),
        };
        if now_empty {
            self.inner.families.remove(family_name);
        }

        Ok(())
    }

    /// Commits the session: prunes untouched entries (reset mode), rebuilds
    /// the output order of families whose membership changed, and releases
    /// exclusive access. Dropping the session without calling this performs
    /// the same commit, so an early return in a producer cannot leave the
    /// cache locked or half-pruned.
    pub fn commit(mut self) {
        self.run_commit();
        self.committed = true;
    }

    fn run_commit(&mut self) {
        let inner = &mut *self.inner;

        if self.mode == Mode::Reset {
            let desired = inner.desired_touch;
            inner.families.retain(|_, family| {
                if family.touched != desired {
                    // No insert named this family during the session.
                    return false;
                }
                let before = family.metrics.len();
                family.metrics.retain(|_, metric| metric.touched == desired);
                if family.metrics.len() != before {
                    family.dirty = true;
                }
                !family.metrics.is_empty()
            });
            // O(1) generation advance.
            inner.desired_touch = !desired;
        }

        for family in inner.families.values_mut() {
            if family.dirty {
                family.rebuild();
            }
        }
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.run_commit();
        }
    }
}

/// Validates the common insert/delete input and returns the indices of the
/// label arrays sorted by label name.
fn validate(
    family_name: &str,
    label_names: &[&str],
    label_values: &[&str],
) -> Result<Vec<usize>> {
    if family_name.is_empty() {
        return Err(CacheError::EmptyFamilyName);
    }
    if label_names.len() != label_values.len() {
        return Err(CacheError::LabelMismatch {
            names: label_names.len(),
            values: label_values.len(),
        });
    }
    let mut order: Vec<usize> = (0..label_names.len()).collect();
    order.sort_unstable_by_key(|&i| label_names[i]);
    Ok(order)
}

/// A consistent read-only view of the cache as of the last commit.
///
/// Holds the shared lock for its whole lifetime, so a later session cannot
/// mutate anything a reader is still looking at. Dropping the snapshot
/// releases the view.
pub struct Snapshot<'a> {
    inner: RwLockReadGuard<'a, Inner>,
}

impl Snapshot<'_> {
    /// All families owning at least one metric, sorted by family name.
    pub fn families(&self) -> Vec<FamilyRef<'_>> {
        let mut out: Vec<FamilyRef<'_>> = self
            .inner
            .families
            .iter()
            .filter(|(_, family)| !family.metrics.is_empty())
            .map(|(name, family)| FamilyRef {
                name: name.as_str(),
                family,
            })
            .collect();
        out.sort_unstable_by(|a, b| a.name.cmp(b.name));
        out
    }
}

/// One family within a [`Snapshot`].
#[derive(Clone, Copy)]
pub struct FamilyRef<'s> {
    name: &'s str,
    family: &'s Family,
}

impl<'s> FamilyRef<'s> {
    pub fn name(&self) -> &'s str {
        self.name
    }

    pub fn help(&self) -> &'s str {
        &self.family.help
    }

    pub fn kind(&self) -> ValueKind {
        self.family.kind
    }

    /// The family's metrics in the output order fixed at the last commit.
    pub fn metrics(&self) -> impl Iterator<Item = &'s Metric> + use<'s> {
        let family = self.family;
        family.ordered.iter().map(move |hash| &family.metrics[hash])
    }
}
