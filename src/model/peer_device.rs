//! The remote side's volume set, as seen across one connection.

use std::collections::BTreeMap;

use crate::event::{peer_dev_keys, Event};
use crate::model::danger;
use crate::stats::{MinMaxAvgCurrent, Rate, Uptimer, SAMPLE_CAPACITY};

#[derive(Debug, Clone, Default)]
pub struct PeerDevice {
    pub uptimer: Uptimer,
    pub resource: String,
    pub peer_node_id: String,
    pub connection_name: String,
    pub volumes: BTreeMap<String, PeerDevVol>,
    pub danger: u64,
}

/// A single volume of a peer's virtual block device.
#[derive(Debug, Clone)]
pub struct PeerDevVol {
    pub uptimer: Uptimer,
    pub replication_status: String,
    /// Long-form explanation of `replication_status`.
    pub replication_hint: String,
    pub disk_state: String,
    /// Long-form explanation of `disk_state`.
    pub disk_hint: String,
    pub client: String,
    pub resync_suspended: String,

    pub out_of_sync_kib: MinMaxAvgCurrent,
    pub pending_writes: MinMaxAvgCurrent,
    pub unacked_writes: MinMaxAvgCurrent,

    pub received_kib: Rate,
    pub sent_kib: Rate,
}

impl PeerDevVol {
    pub fn new(capacity: usize) -> Self {
        Self {
            uptimer: Uptimer::default(),
            replication_status: String::new(),
            replication_hint: String::new(),
            disk_state: String::new(),
            disk_hint: String::new(),
            client: String::new(),
            resync_suspended: String::new(),
            out_of_sync_kib: MinMaxAvgCurrent::new(),
            pending_writes: MinMaxAvgCurrent::new(),
            unacked_writes: MinMaxAvgCurrent::new(),
            received_kib: Rate::new(capacity),
            sent_kib: Rate::new(capacity),
        }
    }
}

impl PeerDevice {
    pub fn update(&mut self, e: &Event) {
        self.resource = e.field(peer_dev_keys::NAME).to_string();
        self.peer_node_id = e.field(peer_dev_keys::PEER_NODE_ID).to_string();
        self.connection_name = e.field(peer_dev_keys::CONN_NAME).to_string();
        self.uptimer.update(e.timestamp);

        let resource = self.resource.clone();
        let connection_name = self.connection_name.clone();

        let vol = self
            .volumes
            .entry(e.field(peer_dev_keys::VOLUME).to_string())
            .or_insert_with(|| PeerDevVol::new(SAMPLE_CAPACITY));

        vol.uptimer.update(e.timestamp);

        vol.replication_status = e.field(peer_dev_keys::REPLICATION).to_string();
        vol.replication_hint =
            danger::replication_hint(&vol.replication_status, &resource, &connection_name);
        vol.disk_state = e.field(peer_dev_keys::PEER_DISK).to_string();
        vol.disk_hint = danger::disk_hint(&vol.disk_state).to_string();
        vol.client = e.field(peer_dev_keys::PEER_CLIENT).to_string();
        vol.resync_suspended = e.field(peer_dev_keys::RESYNC_SUSPENDED).to_string();

        vol.out_of_sync_kib
            .calculate(e.field(peer_dev_keys::OUT_OF_SYNC));
        vol.pending_writes.calculate(e.field(peer_dev_keys::PENDING));
        vol.unacked_writes.calculate(e.field(peer_dev_keys::UNACKED));

        let uptime = vol.uptimer.uptime();
        vol.received_kib
            .calculate(uptime, e.field(peer_dev_keys::RECEIVED));
        vol.sent_kib.calculate(uptime, e.field(peer_dev_keys::SENT));

        self.danger = self.score();
    }

    fn score(&self) -> u64 {
        let mut score = 0;
        for v in self.volumes.values() {
            score += danger::disk_score(&v.disk_state);

            // Resources can be up to 1 PiB, so this adds at most 12.
            if v.out_of_sync_kib.current != 0 {
                score += (v.out_of_sync_kib.current as f64).ln() as u64;
            }
        }
        score
    }
}
