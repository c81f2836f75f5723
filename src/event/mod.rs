//! Event records for the DRBD event stream.
//!
//! One line of `drbdsetup events2 --timestamps` output becomes one
//! [`Event`]: a wall-clock instant, an event type, a target kind, and a
//! bag of raw `key:value` fields. Parsing is deliberately shallow; the
//! entity aggregators interpret field values on demand.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Timestamp layout produced by `drbdsetup events2 --timestamps`:
/// microsecond precision with a colon-separated numeric offset.
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f%:z";

/// A valid line carries at least a 32-char timestamp and one more char.
const MIN_LINE_LEN: usize = 33;

/// Field keys of `resource` events.
pub mod res_keys {
    pub const NAME: &str = "name";
    pub const ROLE: &str = "role";
    pub const SUSPENDED: &str = "suspended";
    pub const WRITE_ORDERING: &str = "write-ordering";
    /// Synthetic marker for resources known to drbdadm but absent from
    /// the event stream.
    pub const UNCONFIGURED: &str = "unconfigured";
}

/// Field keys of `connection` events.
pub mod conn_keys {
    pub const NAME: &str = "name";
    pub const PEER_NODE_ID: &str = "peer-node-id";
    pub const CONN_NAME: &str = "conn-name";
    pub const CONNECTION: &str = "connection";
    pub const ROLE: &str = "role";
    pub const CONGESTED: &str = "congested";
}

/// Field keys of `device` events.
pub mod dev_keys {
    pub const NAME: &str = "name";
    pub const VOLUME: &str = "volume";
    pub const MINOR: &str = "minor";
    pub const DISK: &str = "disk";
    pub const CLIENT: &str = "client";
    pub const SIZE: &str = "size";
    pub const READ: &str = "read";
    pub const WRITTEN: &str = "written";
    pub const AL_WRITES: &str = "al-writes";
    pub const BM_WRITES: &str = "bm-writes";
    pub const UPPER_PENDING: &str = "upper-pending";
    pub const LOWER_PENDING: &str = "lower-pending";
    pub const AL_SUSPENDED: &str = "al-suspended";
    pub const BLOCKED: &str = "blocked";
    pub const QUORUM: &str = "quorum";
}

/// Field keys of `peer-device` events.
pub mod peer_dev_keys {
    pub const NAME: &str = "name";
    pub const PEER_NODE_ID: &str = "peer-node-id";
    pub const CONN_NAME: &str = "conn-name";
    pub const VOLUME: &str = "volume";
    pub const REPLICATION: &str = "replication";
    pub const PEER_DISK: &str = "peer-disk";
    pub const PEER_CLIENT: &str = "peer-client";
    pub const RESYNC_SUSPENDED: &str = "resync-suspended";
    pub const RECEIVED: &str = "received";
    pub const SENT: &str = "sent";
    pub const OUT_OF_SYNC: &str = "out-of-sync";
    pub const PENDING: &str = "pending";
    pub const UNACKED: &str = "unacked";
}

/// The kind of state an [`Event`] describes.
///
/// The first four come from the wire; the rest are internal sentinels
/// threaded through the same pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Resource,
    Connection,
    Device,
    PeerDevice,
    /// No further input should be expected.
    Eof,
    /// All events of the current poll have been applied; refresh the view.
    Display,
    /// Sweep stale entities without applying new state.
    Prune,
    /// The bare `-` marker closing an initial state dump.
    None,
    /// Unrecognized target kinds are carried through and ignored.
    Other(String),
}

impl Target {
    fn from_token(s: &str) -> Self {
        match s {
            "resource" => Target::Resource,
            "connection" => Target::Connection,
            "device" => Target::Device,
            "peer-device" => Target::PeerDevice,
            "-" => Target::None,
            other => Target::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Target::Resource => "resource",
            Target::Connection => "connection",
            Target::Device => "device",
            Target::PeerDevice => "peer-device",
            Target::Eof => "EOF",
            Target::Display => "display",
            Target::Prune => "prune",
            Target::None => "-",
            Target::Other(s) => s,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while turning an event line into an [`Event`].
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("event line too short ({len} chars): {line:?}")]
    LineTooShort { line: String, len: usize },

    #[error("bad timestamp {raw:?}: {source}")]
    BadTimestamp {
        raw: String,
        source: chrono::ParseError,
    },

    #[error("missing event type or target in {line:?}")]
    MissingTarget { line: String },

    #[error("field {token:?} has no key:value separator")]
    BadField { token: String },
}

/// One update relayed from the DRBD kernel module, or an internal
/// sentinel sharing the same shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    /// The kind of update: exists, create, change, destroy, call, ...
    pub event_type: String,
    pub target: Target,
    /// Raw field values keyed by their short names.
    pub fields: HashMap<String, String>,
}

impl Event {
    /// Parse one line of `drbdsetup events2` output.
    pub fn parse(line: &str) -> Result<Event, ParseError> {
        let line = line.trim();
        if line.len() < MIN_LINE_LEN {
            return Err(ParseError::LineTooShort {
                line: line.to_string(),
                len: line.len(),
            });
        }

        let mut tokens = line.split_whitespace();

        // The length check above guarantees a first token exists.
        let raw_ts = tokens.next().unwrap_or_default();
        let timestamp = DateTime::parse_from_str(raw_ts, TIME_FORMAT)
            .map_err(|source| ParseError::BadTimestamp {
                raw: raw_ts.to_string(),
                source,
            })?
            .with_timezone(&Utc);

        let missing = || ParseError::MissingTarget {
            line: line.to_string(),
        };
        let event_type = tokens.next().ok_or_else(missing)?.to_string();
        let target = Target::from_token(tokens.next().ok_or_else(missing)?);

        let mut fields = HashMap::new();
        for token in tokens {
            // Split on the first ':' only; values may contain colons.
            let (key, value) = token.split_once(':').ok_or_else(|| ParseError::BadField {
                token: token.to_string(),
            })?;
            fields.insert(key.to_string(), value.to_string());
        }

        Ok(Event {
            timestamp,
            event_type,
            target,
            fields,
        })
    }

    fn sentinel(target: Target) -> Event {
        Event {
            timestamp: Utc::now(),
            event_type: String::new(),
            target,
            fields: HashMap::new(),
        }
    }

    /// End-of-input sentinel: no further events should be expected.
    pub fn eof() -> Event {
        Event::sentinel(Target::Eof)
    }

    /// Display sentinel emitted after each complete poll.
    pub fn display() -> Event {
        Event::sentinel(Target::Display)
    }

    /// Prune sentinel: sweep stale entities without new state.
    pub fn prune() -> Event {
        Event::sentinel(Target::Prune)
    }

    /// Synthetic resource event for a resource that drbdadm knows about
    /// but that produced no events this poll.
    pub fn unconfigured_resource(name: &str) -> Event {
        let mut e = Event::sentinel(Target::Resource);
        e.event_type = "exists".to_string();
        e.fields
            .insert(res_keys::NAME.to_string(), name.to_string());
        e.fields
            .insert(res_keys::ROLE.to_string(), "Down".to_string());
        e.fields
            .insert(res_keys::UNCONFIGURED.to_string(), "true".to_string());
        e
    }

    /// The raw value of `key`, or `""` when absent.
    pub fn field(&self, key: &str) -> &str {
        self.fields.get(key).map(String::as_str).unwrap_or("")
    }

    /// Whether `key` was present on the wire, regardless of its value.
    pub fn has_field(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// The resource name this event belongs to, or `""` for sentinels.
    pub fn name(&self) -> &str {
        self.field("name")
    }
}
