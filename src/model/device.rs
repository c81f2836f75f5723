//! The local DRBD virtual block device and its volumes.

use std::collections::BTreeMap;

use crate::event::{dev_keys, Event};
use crate::model::danger;
use crate::stats::{MinMaxAvgCurrent, Rate, Uptimer, SAMPLE_CAPACITY};

#[derive(Debug, Clone, Default)]
pub struct Device {
    pub resource: String,
    pub volumes: BTreeMap<String, DevVolume>,
    pub danger: u64,
}

/// A single volume of the local virtual block device. Created lazily on
/// the first event naming its volume id.
#[derive(Debug, Clone)]
pub struct DevVolume {
    pub uptimer: Uptimer,
    pub minor: String,
    pub disk_state: String,
    /// Long-form explanation of `disk_state`.
    pub disk_hint: String,
    /// "yes" when the volume is intentionally diskless.
    pub client: String,
    /// Size in KiB; retains the previous value when the field fails to
    /// parse.
    pub size: u64,
    pub activity_log_suspended: String,
    pub blocked: String,
    pub quorum: String,
    pub quorum_alert: bool,

    pub read_kib: Rate,
    pub written_kib: Rate,
    pub activity_log_updates: Rate,
    pub bit_map_updates: Rate,

    pub upper_pending: MinMaxAvgCurrent,
    pub lower_pending: MinMaxAvgCurrent,
}

impl DevVolume {
    pub fn new(capacity: usize) -> Self {
        Self {
            uptimer: Uptimer::default(),
            minor: String::new(),
            disk_state: String::new(),
            disk_hint: String::new(),
            client: String::new(),
            size: 0,
            activity_log_suspended: String::new(),
            blocked: String::new(),
            quorum: String::new(),
            quorum_alert: false,
            read_kib: Rate::new(capacity),
            written_kib: Rate::new(capacity),
            activity_log_updates: Rate::new(capacity),
            bit_map_updates: Rate::new(capacity),
            upper_pending: MinMaxAvgCurrent::new(),
            lower_pending: MinMaxAvgCurrent::new(),
        }
    }
}

impl Device {
    pub fn update(&mut self, e: &Event) {
        self.resource = e.field(dev_keys::NAME).to_string();

        let vol = self
            .volumes
            .entry(e.field(dev_keys::VOLUME).to_string())
            .or_insert_with(|| DevVolume::new(SAMPLE_CAPACITY));

        // Times first, so the rates below see the fresh uptime.
        vol.uptimer.update(e.timestamp);
        vol.minor = e.field(dev_keys::MINOR).to_string();
        vol.disk_state = e.field(dev_keys::DISK).to_string();
        vol.client = e.field(dev_keys::CLIENT).to_string();
        vol.disk_hint = danger::disk_hint(&vol.disk_state).to_string();
        vol.activity_log_suspended = e.field(dev_keys::AL_SUSPENDED).to_string();
        vol.blocked = e.field(dev_keys::BLOCKED).to_string();
        vol.quorum = e.field(dev_keys::QUORUM).to_string();
        vol.quorum_alert = vol.quorum == "no";

        // Only update size if the field parses; a dropped field must not
        // zero a known capacity.
        if let Ok(size) = e.field(dev_keys::SIZE).parse::<u64>() {
            vol.size = size;
        }

        let uptime = vol.uptimer.uptime();
        vol.read_kib.calculate(uptime, e.field(dev_keys::READ));
        vol.written_kib.calculate(uptime, e.field(dev_keys::WRITTEN));
        vol.activity_log_updates
            .calculate(uptime, e.field(dev_keys::AL_WRITES));
        vol.bit_map_updates
            .calculate(uptime, e.field(dev_keys::BM_WRITES));
        vol.upper_pending.calculate(e.field(dev_keys::UPPER_PENDING));
        vol.lower_pending.calculate(e.field(dev_keys::LOWER_PENDING));

        self.danger = self.score();
    }

    fn score(&self) -> u64 {
        let mut score = 0;
        for v in self.volumes.values() {
            // Diskless on purpose is a normal state.
            if !(v.disk_state == "Diskless" && v.client == "yes") {
                score += danger::disk_score(&v.disk_state);
            }
            score += danger::quorum_score(&v.quorum);
        }
        score
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const HEALTHY: &str = "2017-03-27T08:28:17.072611-07:00 exists device name:test0 \
         volume:0 minor:0 disk:UpToDate client:no size:4056 read:1340 written:16 \
         al-writes:1 bm-writes:0 upper-pending:0 lower-pending:0 al-suspended:no blocked:no";

    #[test]
    fn test_update_creates_volume() {
        let e = Event::parse(HEALTHY).unwrap();
        let mut dev = Device::default();
        dev.update(&e);

        assert_eq!(dev.resource, "test0");
        let vol = dev.volumes.get("0").unwrap();
        assert_eq!(vol.minor, "0");
        assert_eq!(vol.disk_state, "UpToDate");
        assert_eq!(vol.disk_hint, "normal disk state");
        assert_eq!(vol.size, 4056);
        assert_eq!(vol.read_kib.total, 0, "first sample seeds the baseline");
        assert_eq!(vol.upper_pending.current, 0);
        assert_eq!(dev.danger, 0);
    }

    #[test]
    fn test_size_keeps_previous_value_on_parse_failure() {
        let mut dev = Device::default();
        dev.update(&Event::parse(HEALTHY).unwrap());

        let e = Event::parse(
            "2017-03-27T08:28:19.072611-07:00 exists device name:test0 \
             volume:0 minor:0 disk:UpToDate client:no size:junk read:1400 written:20 \
             al-writes:1 bm-writes:0 upper-pending:0 lower-pending:0 al-suspended:no blocked:no",
        )
        .unwrap();
        dev.update(&e);

        assert_eq!(dev.volumes.get("0").unwrap().size, 4056);
    }

    #[test]
    fn test_intentionally_diskless_scores_zero() {
        let e = Event::parse(
            "2017-03-27T08:28:17.072611-07:00 exists device name:test0 \
             volume:0 minor:0 disk:Diskless client:yes size:4056 read:1340 written:16 \
             al-writes:1 bm-writes:0 upper-pending:0 lower-pending:0 al-suspended:no blocked:no",
        )
        .unwrap();

        let mut dev = Device::default();
        dev.update(&e);

        assert_eq!(dev.danger, 0);
    }

    #[test]
    fn test_unintentionally_diskless_scores_high() {
        let e = Event::parse(
            "2017-03-27T08:28:17.072611-07:00 exists device name:test0 \
             volume:0 minor:0 disk:Diskless client:no size:4056 read:1340 written:16 \
             al-writes:1 bm-writes:0 upper-pending:0 lower-pending:0 al-suspended:no blocked:no",
        )
        .unwrap();

        let mut dev = Device::default();
        dev.update(&e);

        assert_eq!(dev.danger, 16);
    }

    #[test]
    fn test_lost_quorum_raises_danger() {
        let e = Event::parse(
            "2017-03-27T08:28:17.072611-07:00 exists device name:test0 \
             volume:0 minor:0 disk:UpToDate client:no size:4056 read:1340 written:16 \
             al-writes:1 bm-writes:0 upper-pending:0 lower-pending:0 al-suspended:no \
             blocked:no quorum:no",
        )
        .unwrap();

        let mut dev = Device::default();
        dev.update(&e);

        assert_eq!(dev.danger, 30);
        assert!(dev.volumes.get("0").unwrap().quorum_alert);
    }

    #[test]
    fn test_volumes_accumulate_per_id() {
        let mut dev = Device::default();
        dev.update(&Event::parse(HEALTHY).unwrap());

        let e = Event::parse(
            "2017-03-27T08:28:18.072611-07:00 exists device name:test0 \
             volume:1 minor:1 disk:UpToDate client:no size:8192 read:0 written:0 \
             al-writes:0 bm-writes:0 upper-pending:0 lower-pending:0 al-suspended:no blocked:no",
        )
        .unwrap();
        dev.update(&e);

        assert_eq!(dev.volumes.len(), 2);
        assert_eq!(dev.volumes.get("1").unwrap().size, 8192);
    }
}
