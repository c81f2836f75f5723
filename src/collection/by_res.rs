//! The per-resource view: one resource, its device, and keyed tables of
//! connections and peer devices, behind a single read-write lock so the
//! display always observes a consistent snapshot.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockReadGuard};

use crate::collection::order::SortKey;
use crate::event::{conn_keys, Event, Target};
use crate::model::{Connection, Device, PeerDevice, Resource};

/// Everything known about one resource.
#[derive(Debug, Default)]
pub struct ByResState {
    pub res: Resource,
    pub connections: BTreeMap<String, Connection>,
    pub device: Device,
    pub peer_devices: BTreeMap<String, PeerDevice>,
    /// Aggregate danger from the resource, its device, and all
    /// connections and peer devices.
    pub danger: u64,
}

impl ByResState {
    fn apply(&mut self, e: &Event) {
        match &e.target {
            Target::Resource => self.res.update(e),
            Target::Device => self.device.update(e),
            Target::Connection => {
                let conn = e.field(conn_keys::CONN_NAME);
                self.connections.entry(conn.to_string()).or_default().update(e);
            }
            Target::PeerDevice => {
                let conn = e.field(conn_keys::CONN_NAME);
                self.peer_devices
                    .entry(conn.to_string())
                    .or_default()
                    .update(e);
            }
            // Everything else leaves the view untouched.
            _ => return,
        }

        self.danger = self.res.danger
            + self.device.danger
            + self.connections.values().map(|c| c.danger).sum::<u64>()
            + self.peer_devices.values().map(|p| p.danger).sum::<u64>();
    }

    fn prune(&mut self, cutoff: DateTime<Utc>) {
        self.connections
            .retain(|_, c| !c.uptimer.stale_before(cutoff));
        self.device
            .volumes
            .retain(|_, v| !v.uptimer.stale_before(cutoff));
        self.peer_devices.retain(|_, p| {
            if p.uptimer.stale_before(cutoff) {
                return false;
            }
            p.volumes.retain(|_, v| !v.uptimer.stale_before(cutoff));
            true
        });
    }

    /// Sum of the local volumes' sizes in KiB.
    pub fn local_size(&self) -> u64 {
        self.device.volumes.values().map(|v| v.size).sum()
    }
}

/// Shared handle to one resource's state.
#[derive(Debug, Default)]
pub struct ByRes {
    state: RwLock<ByResState>,
}

impl ByRes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event under the write lock, then recompute the
    /// composite danger score.
    pub fn update(&self, e: &Event) {
        self.state.write().apply(e);
    }

    /// Drop sub-entities not refreshed since `cutoff`.
    pub fn prune(&self, cutoff: DateTime<Utc>) {
        self.state.write().prune(cutoff);
    }

    /// Read access for the display; holds the read lock for the guard's
    /// lifetime.
    pub fn read(&self) -> RwLockReadGuard<'_, ByResState> {
        self.state.read()
    }

    pub(crate) fn sort_key(&self) -> SortKey {
        let s = self.state.read();
        SortKey {
            name: s.res.name.clone(),
            size: s.local_size(),
            danger: s.danger,
        }
    }

    pub(crate) fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.state.read().res.uptimer.current_time()
    }
}
