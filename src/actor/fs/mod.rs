//! FileSystem Actor
//!
//! Watches the source tree and sends debounced batches to the BuildActor.
//! Implements the "Watcher-First" pattern for zero event loss.
//!
//! ```text
//! Watcher → Debouncer (timing) → EventClassifier (file-level) → EventRouter → BuildMsg
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use notify::RecommendedWatcher;
use tokio::sync::mpsc;

use super::messages::BuildMsg;
use crate::config::SiteConfig;

// File-level events from raw notify events.
mod classifier;
// Pure timing and deduplication.
mod debouncer;
// File-level events -> ChangeSet.
mod router;
// Shared fs event types.
mod types;
// Watch root attach/re-attach lifecycle.
mod watch_roots;

#[cfg(test)]
mod tests;

use classifier::EventClassifier;
use debouncer::Debouncer;
use router::{EventRouter, log_events};
use watch_roots::WatchRoots;

/// Bridge buffer between the notify thread and the actor.
const EVENT_BUFFER: usize = 64;

/// FileSystem Actor - watches for file changes
pub struct FsActor {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    watcher: RecommendedWatcher,
    watch_roots: WatchRoots,
    build_tx: mpsc::Sender<BuildMsg>,
    debouncer: Debouncer,
    router: EventRouter,
}

impl FsActor {
    /// Create the actor and start watching immediately.
    ///
    /// Events buffer in the notify channel while the caller runs the initial
    /// build, so nothing saved during that build is lost.
    pub fn new(
        paths: Vec<PathBuf>,
        build_tx: mpsc::Sender<BuildMsg>,
        config: Arc<SiteConfig>,
    ) -> notify::Result<Self> {
        // notify has no async API
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        let mut watch_roots = WatchRoots::new(paths);
        watch_roots.attach_existing(&mut watcher)?;

        Ok(Self {
            notify_rx,
            watcher,
            watch_roots,
            build_tx,
            debouncer: Debouncer::new(config.serve.debounce(), config.serve.cooldown()),
            router: EventRouter::new(&config),
        })
    }

    /// Run the actor event loop
    pub async fn run(self) {
        let Self {
            notify_rx,
            mut watcher,
            mut watch_roots,
            build_tx,
            mut debouncer,
            router,
        } = self;

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(EVENT_BUFFER);

        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break; // Receiver dropped
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            tokio::select! {
                biased;
                Some(event) = async_rx.recv() => debouncer.add_event(&event),
                _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                    watch_roots.maintain(&mut watcher);
                    if process_changes(&mut debouncer, &router, &build_tx).await.is_err() {
                        break;
                    }
                }
            }
        }
    }
}

/// Send one batch if the debouncer released any events.
///
/// Returns `Err(())` once the BuildActor is gone.
async fn process_changes(
    debouncer: &mut Debouncer,
    router: &EventRouter,
    build_tx: &mpsc::Sender<BuildMsg>,
) -> Result<(), ()> {
    let Some(raw_events) = debouncer.take_if_ready() else {
        return Ok(());
    };

    let Some(events) = EventClassifier::classify(raw_events) else {
        return Ok(());
    };
    log_events(&events);

    let Some(changes) = router.route(events) else {
        return Ok(());
    };

    build_tx
        .send(BuildMsg::Batch(changes))
        .await
        .map_err(|_| ())
}
