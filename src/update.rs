//! The updater task: applies events to the collection and tells the
//! display when a consistent snapshot is ready.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::collection::ResourceCollection;
use crate::event::{Event, Target};

/// What the display should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplaySignal {
    /// A fresh sorted list is available.
    Refresh,
    /// The input source is exhausted; render once more and exit.
    Shutdown,
}

/// Drain the event channel into the collection.
///
/// Every event funnels through [`ResourceCollection::update`] (sentinels
/// carry no name, so they only trigger the prune pass). A display
/// sentinel additionally rebuilds the sorted list and wakes the display;
/// EOF does the same and then ends the task.
pub async fn run(
    collection: Arc<ResourceCollection>,
    mut events: mpsc::Receiver<Event>,
    signal: watch::Sender<DisplaySignal>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => return,
            event = events.recv() => event,
        };

        let Some(event) = event else {
            // Collector went away without an EOF; shut the display down
            // rather than leaving it waiting forever.
            let _ = signal.send(DisplaySignal::Shutdown);
            return;
        };

        collection.update(&event);

        match event.target {
            Target::Display => {
                collection.update_list();
                let _ = signal.send(DisplaySignal::Refresh);
            }
            Target::Eof => {
                debug!("event stream ended");
                collection.update_list();
                let _ = signal.send(DisplaySignal::Shutdown);
                return;
            }
            _ => {}
        }
    }
}
