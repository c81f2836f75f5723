//! Plain terminal display: renders the sorted resource list and the most
//! recent errors whenever the updater signals a fresh snapshot.

use std::fmt::Write as _;
use std::io::Write as _;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::collection::{ByResState, ResourceCollection};
use crate::convert::kib_to_human;
use crate::update::DisplaySignal;

/// How many recent errors the footer retains.
const ERROR_WINDOW: usize = 5;

/// Append-with-shift log of the last few errors.
#[derive(Debug, Default)]
pub struct ErrorLog {
    entries: Vec<String>,
}

impl ErrorLog {
    pub fn push(&mut self, entry: String) {
        if self.entries.len() >= ERROR_WINDOW {
            self.entries.remove(0);
        }
        self.entries.push(entry);
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The minimal screen printer: one frame per display signal.
pub struct PlainDisplay {
    collection: Arc<ResourceCollection>,
    errors: ErrorLog,
    /// Redraw in place (clear between frames) instead of appending.
    in_place: bool,
}

impl PlainDisplay {
    pub fn new(collection: Arc<ResourceCollection>, in_place: bool) -> Self {
        Self {
            collection,
            errors: ErrorLog::default(),
            in_place,
        }
    }

    /// Consume display signals until shutdown. Returns cleanly on EOF.
    pub async fn run(
        &mut self,
        mut signal: watch::Receiver<DisplaySignal>,
        mut errors: mpsc::Receiver<anyhow::Error>,
        cancel: CancellationToken,
    ) -> Result<()> {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                changed = signal.changed() => {
                    if changed.is_err() {
                        return Ok(());
                    }
                }
            }

            while let Ok(e) = errors.try_recv() {
                self.errors.push(format!("{e:#}"));
            }

            let shutdown = *signal.borrow_and_update() == DisplaySignal::Shutdown;
            self.render()?;
            if shutdown {
                return Ok(());
            }
        }
    }

    fn render(&self) -> Result<()> {
        let mut frame = String::new();
        if self.in_place {
            // Clear screen, cursor home.
            frame.push_str("\x1b[2J\x1b[H");
        }

        for by_res in self.collection.snapshot() {
            write_by_res(&mut frame, &by_res.read());
        }

        frame.push('\n');
        frame.push_str("Errors:\n");
        for err in self.errors.iter() {
            let _ = writeln!(frame, "{err}");
        }

        let mut stdout = std::io::stdout().lock();
        stdout.write_all(frame.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

fn write_by_res(out: &mut String, s: &ByResState) {
    write_header(out, s);
    out.push('\n');

    // Nothing more to show for a resource that is down.
    if s.res.unconfigured {
        return;
    }

    write_local_disk(out, s);
    out.push('\n');

    for (conn_name, conn) in &s.connections {
        write_connection(out, conn);
        if s.peer_devices.contains_key(conn_name) {
            write_peer_device(out, s, conn_name);
        }
        out.push('\n');
    }
}

fn write_header(out: &mut String, s: &ByResState) {
    let _ = write!(out, "{}: ({}) ", s.res.name, s.danger);
    if s.res.suspended == "yes" {
        out.push_str("(Suspended)");
    }
    if s.res.unconfigured {
        out.push_str("(Down)");
    }
    out.push('\n');
}

fn write_local_disk(out: &mut String, s: &ByResState) {
    let _ = writeln!(out, "\tLocal Disk({}):", s.res.role);

    for (id, v) in &s.device.volumes {
        let _ = write!(out, "\t\tvolume {id} (/dev/drbd{}):", v.minor);

        if v.disk_state != "UpToDate" {
            let _ = write!(out, " {}({})", v.disk_state, v.disk_hint);
        }
        if v.blocked != "no" {
            let _ = write!(out, " Blocked: {} ", v.blocked);
        }
        if v.activity_log_suspended != "no" {
            let _ = write!(out, " Activity Log Suspended: {} ", v.activity_log_suspended);
        }
        if v.quorum_alert {
            out.push_str(" Quorum lost! ");
        }
        out.push('\n');

        let _ = writeln!(
            out,
            "\t\t\tsize: {} total-read:{} read/Sec:{} total-written:{} written/Sec:{} ",
            kib_to_human(v.size as f64),
            kib_to_human(v.read_kib.total as f64),
            kib_to_human(v.read_kib.per_second),
            kib_to_human(v.written_kib.total as f64),
            kib_to_human(v.written_kib.per_second),
        );
    }
}

fn write_connection(out: &mut String, conn: &crate::model::Connection) {
    let _ = write!(out, "\tConnection to {}({}):", conn.name, conn.role);

    if conn.status != "Connected" {
        let _ = write!(out, " {}({})", conn.status, conn.hint);
    }
    if conn.congested != "no" {
        out.push_str(" Congested ");
    }
    out.push('\n');
}

fn write_peer_device(out: &mut String, s: &ByResState, conn_name: &str) {
    let Some(peer) = s.peer_devices.get(conn_name) else {
        return;
    };

    for (id, v) in &peer.volumes {
        let _ = writeln!(out, "\t\tvolume {id}: ");

        if v.resync_suspended != "no" {
            let _ = writeln!(out, "\t\t\tResyncSuspended:{}", v.resync_suspended);
        }

        if v.replication_status != "Established" {
            let _ = write!(
                out,
                "\t\t\tReplication:{}({})",
                v.replication_status, v.replication_hint
            );

            if v.replication_status.starts_with("Sync") {
                if let Some(local) = s.device.volumes.get(id) {
                    if local.size > 0 {
                        let _ = write!(
                            out,
                            " {:.1}% remaining",
                            (v.out_of_sync_kib.current as f64 / local.size as f64) * 100.0
                        );
                    }
                }
            }
            out.push('\n');
        }

        if v.disk_state != "UpToDate" {
            let _ = writeln!(out, "\t\t\t{}({})", v.disk_state, v.disk_hint);
        }

        let _ = writeln!(
            out,
            "\t\t\tSent: total:{} Per/Sec:{}",
            kib_to_human(v.sent_kib.total as f64),
            kib_to_human(v.sent_kib.per_second),
        );
        let _ = writeln!(
            out,
            "\t\t\tReceived: total:{} Per/Sec:{}",
            kib_to_human(v.received_kib.total as f64),
            kib_to_human(v.received_kib.per_second),
        );
        let _ = writeln!(
            out,
            "\t\t\tOutOfSync: current:{} average:{} min:{} max:{}",
            kib_to_human(v.out_of_sync_kib.current as f64),
            kib_to_human(v.out_of_sync_kib.avg),
            kib_to_human(v.out_of_sync_kib.min as f64),
            kib_to_human(v.out_of_sync_kib.max as f64),
        );
        let _ = writeln!(
            out,
            "\t\t\tPendingWrites: current:{} average:{:.1} min:{} max:{}",
            v.pending_writes.current, v.pending_writes.avg, v.pending_writes.min, v.pending_writes.max,
        );
        let _ = writeln!(
            out,
            "\t\t\tUnackedWrites: current:{} average:{:.1} min:{} max:{}",
            v.unacked_writes.current, v.unacked_writes.avg, v.unacked_writes.min, v.unacked_writes.max,
        );
        out.push('\n');
    }
}
