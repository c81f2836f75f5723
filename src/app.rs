//! Pipeline orchestration: wires the collector, updater, and display
//! together and owns shutdown.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::collect::{Events2Poll, FileCollector};
use crate::collection::{order, ResourceCollection};
use crate::config::{Config, TuiMode};
use crate::display::PlainDisplay;
use crate::update::{self, DisplaySignal};

/// Events in flight between the collector and the updater. Small on
/// purpose: the collector blocks rather than outrunning the updater.
const EVENT_QUEUE: usize = 5;

/// Errors awaiting the display. Writers drop on overflow.
const ERROR_QUEUE: usize = 100;

/// Run the monitor until the event source ends or the user interrupts.
pub async fn run(cfg: Config, startup_reports: Vec<anyhow::Error>) -> Result<()> {
    let cancel = CancellationToken::new();

    // Interrupt handling: first signal cancels every task.
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupted, shutting down");
                cancel.cancel();
            }
        });
    }

    let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE);
    let (error_tx, error_rx) = mpsc::channel(ERROR_QUEUE);

    for report in startup_reports {
        let _ = error_tx.try_send(report);
    }

    let collection = Arc::new(ResourceCollection::new(cfg.interval));
    collection.order_by(vec![
        order::danger_reverse,
        order::size_reverse,
        order::name,
    ]);

    // Collector task.
    {
        let events = event_tx.clone();
        let errors = error_tx.clone();
        let cancel = cancel.clone();
        let file = cfg.file.clone();
        let interval = cfg.interval;

        tokio::spawn(async move {
            let result = match file {
                Some(path) => {
                    info!(path = %path.display(), "replaying events from file");
                    FileCollector { path }.collect(events, errors, cancel).await
                }
                None => {
                    info!(?interval, "polling drbdsetup events2");
                    Events2Poll { interval }.collect(events, errors, cancel).await
                }
            };
            if let Err(e) = result {
                error!(error = %e, "collector failed");
            }
        });
    }

    // Updater task.
    let (signal_tx, signal_rx) = watch::channel(DisplaySignal::Refresh);
    {
        let collection = Arc::clone(&collection);
        let cancel = cancel.clone();
        tokio::spawn(update::run(collection, event_rx, signal_tx, cancel));
    }

    // The display runs on this task; its exit ends the program.
    let in_place = cfg.tui == TuiMode::Interactive;
    let mut display = PlainDisplay::new(collection, in_place);
    let result = display.run(signal_rx, error_rx, cancel.clone()).await;

    cancel.cancel();
    result
}
