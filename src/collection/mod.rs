//! Process-wide registry of per-resource views with a derived sorted
//! list and time-based pruning.

pub mod by_res;
pub mod order;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

pub use by_res::{ByRes, ByResState};
pub use order::{LessFn, SortKey};

use crate::event::Event;

/// Entities not refreshed within this many poll intervals are stale.
pub const PRUNE_MULTIPLIER: u32 = 3;

#[derive(Default)]
struct Inner {
    map: HashMap<String, Arc<ByRes>>,
    list: Vec<Arc<ByRes>>,
    order: Vec<LessFn>,
}

/// All known resources, keyed by name.
///
/// Writers (the updater) take the interior lock exclusively; the display
/// takes it shared and then each [`ByRes`] lock shared while rendering.
pub struct ResourceCollection {
    inner: RwLock<Inner>,
    update_interval: Duration,
}

impl ResourceCollection {
    /// A zero `update_interval` disables pruning (file replay mode).
    pub fn new(update_interval: Duration) -> Self {
        Self {
            inner: RwLock::new(Inner {
                map: HashMap::new(),
                list: Vec::new(),
                order: vec![order::name],
            }),
            update_interval,
        }
    }

    /// Replace the composed sort order. Takes effect at the next
    /// [`update_list`](Self::update_list).
    pub fn order_by(&self, order: Vec<LessFn>) {
        self.inner.write().order = order;
    }

    /// Apply one event: prune stale state, then route the event to its
    /// resource's view, creating it on first reference. Events without a
    /// `name` field (sentinels) only trigger the prune.
    pub fn update(&self, e: &Event) {
        let mut inner = self.inner.write();

        if !self.update_interval.is_zero() {
            let window = chrono::Duration::from_std(self.update_interval * PRUNE_MULTIPLIER)
                .unwrap_or_else(|_| chrono::Duration::zero());
            Self::prune_locked(&mut inner, e.timestamp - window);
        }

        let name = e.name();
        if !name.is_empty() {
            let by_res = Arc::clone(
                inner
                    .map
                    .entry(name.to_string())
                    .or_insert_with(|| Arc::new(ByRes::new())),
            );
            by_res.update(e);
        }
    }

    /// Rebuild the sorted list from the current map contents.
    pub fn update_list(&self) {
        let mut inner = self.inner.write();

        let mut keyed: Vec<(SortKey, Arc<ByRes>)> = inner
            .map
            .values()
            .map(|r| (r.sort_key(), Arc::clone(r)))
            .collect();

        let order = inner.order.clone();
        keyed.sort_by(|a, b| order::compare(&order, &a.0, &b.0));

        inner.list = keyed.into_iter().map(|(_, r)| r).collect();
    }

    fn prune_locked(inner: &mut Inner, cutoff: DateTime<Utc>) {
        inner.map.retain(|_, r| {
            let stale = r.last_seen().map_or(true, |seen| seen < cutoff);
            if !stale {
                r.prune(cutoff);
            }
            !stale
        });
    }

    /// The current sorted list, as of the last
    /// [`update_list`](Self::update_list).
    pub fn snapshot(&self) -> Vec<Arc<ByRes>> {
        self.inner.read().list.clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<ByRes>> {
        self.inner.read().map.get(name).map(Arc::clone)
    }

    pub fn len(&self) -> usize {
        self.inner.read().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().map.is_empty()
    }
}
