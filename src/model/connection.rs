//! The link from the local resource to one peer.

use crate::event::{conn_keys, Event};
use crate::model::danger;
use crate::stats::Uptimer;

#[derive(Debug, Clone, Default)]
pub struct Connection {
    pub uptimer: Uptimer,
    pub resource: String,
    pub peer_node_id: String,
    pub name: String,
    pub status: String,
    /// Long-form explanation of `status`.
    pub hint: String,
    pub role: String,
    pub congested: String,
    pub danger: u64,
}

impl Connection {
    pub fn update(&mut self, e: &Event) {
        self.resource = e.field(conn_keys::NAME).to_string();
        self.peer_node_id = e.field(conn_keys::PEER_NODE_ID).to_string();
        self.name = e.field(conn_keys::CONN_NAME).to_string();
        self.status = e.field(conn_keys::CONNECTION).to_string();
        self.role = e.field(conn_keys::ROLE).to_string();
        self.congested = e.field(conn_keys::CONGESTED).to_string();
        self.uptimer.update(e.timestamp);
        self.danger = self.score();
        self.hint = danger::connection_hint(&self.status, &self.name);
    }

    fn score(&self) -> u64 {
        let mut d = danger::connection_score(&self.status);
        d += danger::role_score(&self.role);
        if self.congested != "no" {
            d += 1;
        }
        d
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_update_populates_fields() {
        let e = Event::parse(
            "2017-02-15T14:43:16.688437+00:00 exists connection name:test0 \
             peer-node-id:1 conn-name:bob connection:Connected role:Secondary congested:no",
        )
        .unwrap();

        let mut conn = Connection::default();
        conn.update(&e);

        assert_eq!(conn.resource, "test0");
        assert_eq!(conn.peer_node_id, "1");
        assert_eq!(conn.name, "bob");
        assert_eq!(conn.status, "Connected");
        assert_eq!(conn.role, "Secondary");
        assert_eq!(conn.congested, "no");
        assert_eq!(conn.danger, 0);
        assert_eq!(conn.hint, "connected to bob");
    }

    #[test]
    fn test_standalone_danger() {
        let e = Event::parse(
            "2017-02-15T14:43:16.688437+00:00 exists connection name:test0 \
             conn-name:peer connection:StandAlone role:Secondary congested:no",
        )
        .unwrap();

        let mut conn = Connection::default();
        conn.update(&e);

        assert_eq!(conn.danger, 30);
        assert!(conn.hint.contains("drbdadm connect peer"));
    }

    #[test]
    fn test_unknown_role_and_congestion_danger() {
        let e = Event::parse(
            "2017-02-15T14:43:16.688437+00:00 exists connection name:test0 \
             conn-name:peer connection:Connected role:Unknown congested:yes",
        )
        .unwrap();

        let mut conn = Connection::default();
        conn.update(&e);

        // Connected 0 + Unknown role 1 + congested 1.
        assert_eq!(conn.danger, 2);
    }
}
