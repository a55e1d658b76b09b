//! Build Actor
//!
//! Owns the pipeline and runs one batch at a time on the blocking pool.
//!
//! ```text
//! FsActor --Batch--> BuildActor --(spawn_blocking)--> Pipeline::process
//!                                                       └── ReloadTransport
//! ```
//!
//! Batches that arrive while a build is running queue in the channel and are
//! folded into a single batch once it finishes.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;

use super::messages::BuildMsg;
use crate::compiler::{BatchReport, ChangeSet, Pipeline};
use crate::logger::{status_error, status_success};
use crate::reload::ReloadTransport;
use crate::utils::plural_count;

pub struct BuildActor {
    rx: mpsc::Receiver<BuildMsg>,
    /// Moved onto the blocking pool while a batch runs
    pipeline: Option<Pipeline>,
    transport: Arc<dyn ReloadTransport>,
}

impl BuildActor {
    pub fn new(
        rx: mpsc::Receiver<BuildMsg>,
        pipeline: Pipeline,
        transport: Arc<dyn ReloadTransport>,
    ) -> Self {
        Self {
            rx,
            pipeline: Some(pipeline),
            transport,
        }
    }

    /// Run the initial full build, then process batches until shutdown.
    pub async fn run(mut self) {
        if !self.blocking(|pipeline, transport| pipeline.full_build(transport)).await {
            return;
        }

        while let Some(msg) = self.rx.recv().await {
            let BuildMsg::Batch(mut changes) = msg else {
                break;
            };
            let shutdown = self.fold_queued(&mut changes);

            if !changes.is_empty()
                && !self
                    .blocking(move |pipeline, transport| pipeline.process(&changes, transport))
                    .await
            {
                break;
            }
            if shutdown {
                break;
            }
        }

        crate::debug!("build"; "stopped");
    }

    /// Merge every batch already waiting in the channel into `changes`.
    ///
    /// Returns true if a shutdown was queued behind them.
    fn fold_queued(&mut self, changes: &mut ChangeSet) -> bool {
        let mut folded = 0;
        let mut shutdown = false;
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                BuildMsg::Batch(more) => {
                    changes.merge(more);
                    folded += 1;
                }
                BuildMsg::Shutdown => {
                    shutdown = true;
                    break;
                }
            }
        }
        if folded > 0 {
            crate::debug!("build"; "folded {} queued", plural_count(folded, "batch"));
        }
        shutdown
    }

    /// Run `job` with the pipeline on the blocking pool and report the result.
    ///
    /// Returns false if the job panicked; the pipeline is lost with it.
    async fn blocking<F>(&mut self, job: F) -> bool
    where
        F: FnOnce(&mut Pipeline, &dyn ReloadTransport) -> BatchReport + Send + 'static,
    {
        let Some(mut pipeline) = self.pipeline.take() else {
            return false;
        };
        let transport = Arc::clone(&self.transport);

        let result = tokio::task::spawn_blocking(move || {
            let report = job(&mut pipeline, transport.as_ref());
            (pipeline, report)
        })
        .await;

        match result {
            Ok((pipeline, report)) => {
                report_batch(&report, pipeline.config().get_root());
                self.pipeline = Some(pipeline);
                true
            }
            Err(e) => {
                crate::log!("build"; "build task failed: {}", e);
                false
            }
        }
    }
}

/// Show a batch outcome on the watch status line.
fn report_batch(report: &BatchReport, root: &Path) {
    if report.results.is_empty() {
        if report.reload.is_some() {
            status_success("reloaded");
        }
        return;
    }

    let elapsed = report.elapsed.as_millis();
    if report.is_success() {
        status_success(&format!(
            "rebuilt {} ({} ms)",
            plural_count(report.succeeded(), "task"),
            elapsed
        ));
    } else {
        status_error(
            &format!(
                "{} of {} failed ({} ms)",
                report.failed(),
                plural_count(report.results.len(), "task"),
                elapsed
            ),
            &report.failure_detail(root),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::testing::{RecordingTransport, TestSite};
    use crate::reload::ReloadKind;

    fn actor(site: &TestSite) -> (mpsc::Sender<BuildMsg>, BuildActor, Arc<RecordingTransport>) {
        let (tx, rx) = mpsc::channel(8);
        let transport = Arc::new(RecordingTransport::default());
        let actor = BuildActor::new(rx, site.pipeline(), transport.clone());
        (tx, actor, transport)
    }

    #[tokio::test]
    async fn test_initial_build_then_shutdown() {
        let site = TestSite::new();
        site.write("src/slim/index.slim", "h1 home");
        let (tx, actor, transport) = actor(&site);

        tx.send(BuildMsg::Shutdown).await.unwrap();
        actor.run().await;

        assert_eq!(site.read("dist/index.html"), "h1 home");
        assert_eq!(transport.take(), vec![ReloadKind::FullReload]);
    }

    #[tokio::test]
    async fn test_queued_batches_fold_into_one() {
        let site = TestSite::new();
        site.write("src/slim/index.slim", "h1 home");
        site.write("src/slim/about.slim", "h1 about");
        let (tx, actor, transport) = actor(&site);

        tx.send(BuildMsg::Batch(site.changes(&["src/slim/index.slim"])))
            .await
            .unwrap();
        tx.send(BuildMsg::Batch(site.changes(&["src/slim/about.slim"])))
            .await
            .unwrap();
        tx.send(BuildMsg::Shutdown).await.unwrap();
        actor.run().await;

        // initial build plus one folded batch
        assert_eq!(transport.take().len(), 2);
        assert_eq!(site.markup_calls("src/slim/index.slim"), 2);
        assert_eq!(site.markup_calls("src/slim/about.slim"), 2);
    }

    #[tokio::test]
    async fn test_failed_batch_keeps_running() {
        let site = TestSite::new();
        site.write("src/slim/index.slim", "h1 home");
        let (tx, actor, _transport) = actor(&site);
        let handle = tokio::spawn(actor.run());

        site.write("src/slim/index.slim", "FAIL");
        tx.send(BuildMsg::Batch(site.changes(&["src/slim/index.slim"])))
            .await
            .unwrap();
        site.write("src/slim/index.slim", "h1 fixed");
        tx.send(BuildMsg::Batch(site.changes(&["src/slim/index.slim"])))
            .await
            .unwrap();
        tx.send(BuildMsg::Shutdown).await.unwrap();
        handle.await.unwrap();

        assert_eq!(site.read("dist/index.html"), "h1 fixed");
    }

    #[tokio::test]
    async fn test_closed_channel_stops_actor() {
        let site = TestSite::new();
        let (tx, actor, _transport) = actor(&site);
        drop(tx);
        actor.run().await;
    }
}
