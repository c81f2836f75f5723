//! Event collectors: produce a stream of [`Event`]s on a channel, one
//! display sentinel per complete poll, and an EOF sentinel when the
//! source is exhausted.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::event::{Event, ParseError};

pub type EventSender = mpsc::Sender<Event>;
pub type ErrorSender = mpsc::Sender<anyhow::Error>;

/// Report an error without blocking; the queue is bounded and overflow
/// drops the report.
fn report(errors: &ErrorSender, err: anyhow::Error) {
    let _ = errors.try_send(err);
}

/// Replays newline-delimited events from a capture file.
///
/// Emits one display sentinel after every line so the consumer refreshes
/// at replay granularity, then an EOF sentinel.
pub struct FileCollector {
    pub path: PathBuf,
}

impl FileCollector {
    pub async fn collect(
        &self,
        events: EventSender,
        errors: ErrorSender,
        cancel: CancellationToken,
    ) -> Result<()> {
        let file = match tokio::fs::File::open(&self.path).await {
            Ok(f) => f,
            Err(e) => {
                report(
                    &errors,
                    anyhow::Error::new(e)
                        .context(format!("opening {}", self.path.display())),
                );
                let _ = events.send(Event::eof()).await;
                return Ok(());
            }
        };

        let mut lines = BufReader::new(file).lines();
        loop {
            let line = tokio::select! {
                _ = cancel.cancelled() => break,
                line = lines.next_line() => line.context("reading event file")?,
            };
            let Some(line) = line else { break };

            if line.trim().is_empty() {
                continue;
            }

            match Event::parse(&line) {
                Ok(evt) => {
                    if events.send(evt).await.is_err() {
                        return Ok(());
                    }
                }
                Err(e) => report(&errors, e.into()),
            }
            if events.send(Event::display()).await.is_err() {
                return Ok(());
            }
        }

        let _ = events.send(Event::eof()).await;
        Ok(())
    }
}

/// Polls `drbdsetup events2` at a fixed cadence.
///
/// Each poll emits the parsed events in stream order, one synthetic
/// unconfigured-resource event per administratively known resource that
/// produced nothing, and finally a display sentinel.
pub struct Events2Poll {
    pub interval: Duration,
}

impl Events2Poll {
    pub async fn collect(
        &self,
        events: EventSender,
        errors: ErrorSender,
        cancel: CancellationToken,
    ) -> Result<()> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                _ = ticker.tick() => {}
            }

            let mut known = match known_resources().await {
                Ok(known) => known,
                Err(e) => {
                    report(&errors, e);
                    BTreeSet::new()
                }
            };

            match events2_now().await {
                Ok(output) => {
                    let (parsed, failures) = parse_poll_output(&output, &mut known);
                    for failure in failures {
                        report(&errors, failure.into());
                    }
                    for evt in parsed {
                        if events.send(evt).await.is_err() {
                            return Ok(());
                        }
                    }
                }
                Err(e) => {
                    report(&errors, e);
                    if events.send(Event::eof()).await.is_err() {
                        return Ok(());
                    }
                }
            }

            for res in known {
                debug!(resource = %res, "synthesizing unconfigured resource");
                if events
                    .send(Event::unconfigured_resource(&res))
                    .await
                    .is_err()
                {
                    return Ok(());
                }
            }

            if events.send(Event::display()).await.is_err() {
                return Ok(());
            }
        }
    }
}

/// Parse one poll's worth of output, removing every seen resource name
/// from `known` so the remainder can be reported as unconfigured.
pub fn parse_poll_output(
    output: &str,
    known: &mut BTreeSet<String>,
) -> (Vec<Event>, Vec<ParseError>) {
    let mut parsed = Vec::new();
    let mut failures = Vec::new();

    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match Event::parse(line) {
            Ok(evt) => {
                known.remove(evt.name());
                parsed.push(evt);
            }
            Err(e) => failures.push(e),
        }
    }

    (parsed, failures)
}

async fn events2_now() -> Result<String> {
    let out = Command::new("drbdsetup")
        .args(["events2", "--timestamps", "--statistics", "--now"])
        .output()
        .await
        .context("invoking drbdsetup events2")?;

    if !out.status.success() {
        bail!(
            "drbdsetup events2 failed: {}",
            String::from_utf8_lossy(&out.stderr).trim()
        );
    }

    Ok(String::from_utf8_lossy(&out.stdout).into_owned())
}

/// Enumerate every administratively configured resource via a drbdadm
/// dry run.
async fn known_resources() -> Result<BTreeSet<String>> {
    let out = Command::new("drbdadm")
        .args(["connect", "all", "-d"])
        .output()
        .await
        .context("enumerating resources with drbdadm connect all -d")?;

    let mut combined = String::from_utf8_lossy(&out.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&out.stderr));

    Ok(parse_known_resources(&combined))
}

/// Extract resource names from `drbdadm connect all -d` output. Lines
/// look like `drbdsetup connect <res> <peer-id>` on drbd 9 and
/// `drbdsetup-84 connect <res> <minor> <peer>` on drbd 8.4.
pub fn parse_known_resources(output: &str) -> BTreeSet<String> {
    let mut resources = BTreeSet::new();

    for line in output.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let valid = (fields.len() == 4 && fields[0] == "drbdsetup")
            || (fields.len() == 5 && fields[0] == "drbdsetup-84");
        if valid {
            resources.insert(fields[2].to_string());
        }
    }

    resources
}
