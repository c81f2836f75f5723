//! Basic resource info: name, role, suspension, write ordering.

use crate::event::{res_keys, Event};
use crate::model::danger;
use crate::stats::Uptimer;

#[derive(Debug, Clone, Default)]
pub struct Resource {
    pub uptimer: Uptimer,
    pub name: String,
    pub role: String,
    pub suspended: String,
    pub write_ordering: String,
    /// Known to drbdadm but absent from the event stream.
    pub unconfigured: bool,
    pub danger: u64,
}

impl Resource {
    pub fn update(&mut self, e: &Event) {
        self.name = e.field(res_keys::NAME).to_string();
        self.role = e.field(res_keys::ROLE).to_string();
        self.suspended = e.field(res_keys::SUSPENDED).to_string();
        self.write_ordering = e.field(res_keys::WRITE_ORDERING).to_string();
        self.unconfigured = e.has_field(res_keys::UNCONFIGURED);
        self.uptimer.update(e.timestamp);
        self.danger = danger::role_score(&self.role);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_update_populates_fields() {
        let e = Event::parse(
            "2017-02-22T19:53:58.445263-08:00 exists resource \
             name:test3 role:Secondary suspended:no write-ordering:flush",
        )
        .unwrap();

        let mut res = Resource::default();
        res.update(&e);

        assert_eq!(res.name, "test3");
        assert_eq!(res.role, "Secondary");
        assert_eq!(res.suspended, "no");
        assert_eq!(res.write_ordering, "flush");
        assert!(!res.unconfigured);
        assert_eq!(res.danger, 0);
        assert_eq!(res.uptimer.start_time(), Some(e.timestamp));
    }

    #[test]
    fn test_update_refreshes_existing_state() {
        let first = Event::parse(
            "2017-02-22T19:53:58.445263-08:00 exists resource \
             name:test3 role:Secondary suspended:no write-ordering:flush",
        )
        .unwrap();
        let second = Event::parse(
            "2017-02-22T19:54:02.445263-08:00 exists resource \
             name:test3 role:Primary suspended:no write-ordering:drain",
        )
        .unwrap();

        let mut res = Resource::default();
        res.update(&first);
        res.update(&second);

        assert_eq!(res.role, "Primary");
        assert_eq!(res.write_ordering, "drain");
        assert_eq!(
            res.uptimer.start_time(),
            Some(first.timestamp),
            "start_time is pinned to the first event"
        );
        assert_eq!(res.uptimer.current_time(), Some(second.timestamp));
    }

    #[test]
    fn test_unconfigured_resource() {
        let mut res = Resource::default();
        res.update(&Event::unconfigured_resource("r5"));

        assert!(res.unconfigured);
        assert_eq!(res.role, "Down");
        assert_eq!(res.danger, 10);

        // A real event for the same resource clears the marker.
        let e = Event::parse(
            "2017-02-22T19:53:58.445263-08:00 exists resource \
             name:r5 role:Secondary suspended:no write-ordering:flush",
        )
        .unwrap();
        res.update(&e);
        assert!(!res.unconfigured);
        assert_eq!(res.danger, 0);
    }
}
