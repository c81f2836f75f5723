//! Danger score tables and operator-facing status hints.
//!
//! Scores are unitless severities summed into a per-resource ranking.
//! Unknown states fall through to a default of 1 so that anything the
//! tables do not recognize still surfaces above a healthy resource.

/// Severity of a connection status.
pub fn connection_score(status: &str) -> u64 {
    match status {
        "Connected" => 0,
        "SyncSource" | "SyncTarget" => 1,
        "StandAlone" => 30,
        _ => 1,
    }
}

/// Severity of a local or peer disk state.
pub fn disk_score(state: &str) -> u64 {
    match state {
        "UpToDate" => 0,
        "Consistent" | "Outdated" => 1,
        "DUnknown" => 2,
        "Diskless" => 16,
        _ => 1,
    }
}

/// Severity of a resource or connection role.
pub fn role_score(role: &str) -> u64 {
    match role {
        "Primary" | "Secondary" => 0,
        "Unknown" => 1,
        "Down" => 10,
        _ => 1,
    }
}

/// Severity of a volume's quorum state. Absent or unrecognized values
/// score 0.
pub fn quorum_score(quorum: &str) -> u64 {
    match quorum {
        "no" => 30,
        _ => 0,
    }
}

/// Short explanation of a connection status.
pub fn connection_hint(status: &str, conn_name: &str) -> String {
    match status {
        "StandAlone" => format!(
            "dropped connection or disconnected manually. \
             try running drbdadm connect {conn_name}"
        ),
        "Disconnecting" => format!("disconnecting from {conn_name}"),
        "Unconnected" => format!("not yet connected to {conn_name}"),
        "Timeout" => format!("connection to {conn_name} dropped after timeout"),
        "BrokenPipe" | "NetworkFailure" | "ProtocolError" => {
            format!("lost connection to {conn_name}")
        }
        "TearDown" => format!("{conn_name} is closing the connection"),
        "Connecting" => format!("establishing connection with {conn_name}"),
        "Connected" => format!("connected to {conn_name}"),
        _ => "unknown connection state!".to_string(),
    }
}

/// Short explanation of a disk state.
pub fn disk_hint(state: &str) -> &'static str {
    match state {
        "Diskless" => "detached from local backing disk",
        "Attaching" => "reading metadata",
        "Failed" => "I/O failure reported by local backing disk",
        "Negotiating" => "communicating with peer...",
        "Inconsistent" => "local data is not accessible or usable until resync is complete",
        "Outdated" => "data is usable, but a peer has newer data",
        "Consistent" => "data is usable, but we have no network connection",
        "UpToDate" => "normal disk state",
        _ => "unknown disk state!",
    }
}

/// Short explanation of a peer volume's replication status.
pub fn replication_hint(status: &str, resource: &str, conn_name: &str) -> String {
    match status {
        "Off" => format!("not replicating to {resource}"),
        "Established" => format!("healthy connection to {conn_name} — mirroring active"),
        "StartingSyncS" => format!("full resync of local data to {conn_name} due to admin"),
        "StartingSyncT" => format!("full resync from {conn_name} due to admin"),
        "WFBitMapS" => format!("resync to {conn_name} starting"),
        "WFBitMapT" | "WFSyncUUID" => format!("resync from {conn_name} starting"),
        "SyncSource" => format!("synchronizing {conn_name} with local data"),
        "SyncTarget" => {
            format!("local volume is being synchronized with data from {conn_name}")
        }
        "VerifyS" => format!("verifying {conn_name} with local data"),
        "VerifyT" => format!("local volume is being verified with data from {conn_name}"),
        "PausedSyncS" => format!("synchronizing {conn_name} with local data is paused"),
        "PausedSyncT" => format!("synchronization with data from {conn_name} is paused"),
        "Ahead" => format!(
            "temporarily disconnected from {conn_name} to preserve local I/O performance"
        ),
        "Behind" => format!(
            "temporarily disconnected from {conn_name} to preserve \
             {conn_name}'s I/O performance"
        ),
        _ => "unknown replication status!".to_string(),
    }
}
