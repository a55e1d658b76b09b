use std::time::Duration;

use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use crate::actor::build::BuildActor;
use crate::actor::fs::FsActor;
use crate::actor::messages::{BuildMsg, WsMsg};
use crate::actor::ws::WsActor;

/// How long a batch in flight may take to finish after Ctrl+C.
const BUILD_GRACE: Duration = Duration::from_secs(1);

const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

pub(super) struct Actors {
    pub fs: FsActor,
    pub build: BuildActor,
    pub ws: Option<WsActor>,
}

/// Run all actors concurrently until shutdown.
pub(super) async fn run_actors(
    actors: Actors,
    build_tx: mpsc::Sender<BuildMsg>,
    ws_tx: Option<mpsc::Sender<WsMsg>>,
    shutdown_rx: Option<Receiver<()>>,
) {
    let Actors { fs, build, ws } = actors;

    let build_handle = tokio::spawn(build.run());
    let fs_handle = tokio::spawn(fs.run());
    let ws_handle = ws.map(|ws| tokio::spawn(ws.run()));

    loop {
        if shutdown_rx.as_ref().is_some_and(|rx| rx.try_recv().is_ok()) {
            crate::debug!("actor"; "shutdown signal received");
            break;
        }
        if build_handle.is_finished() || fs_handle.is_finished() {
            crate::debug!("actor"; "actor exited, stopping");
            break;
        }
        tokio::time::sleep(SHUTDOWN_POLL).await;
    }

    fs_handle.abort();

    let _ = build_tx.send(BuildMsg::Shutdown).await;
    if tokio::time::timeout(BUILD_GRACE, build_handle).await.is_err() {
        crate::debug!("actor"; "build still running, not waiting");
    }

    if let Some(tx) = ws_tx {
        let _ = tx.send(WsMsg::Shutdown).await;
    }
    if let Some(handle) = ws_handle {
        let _ = tokio::time::timeout(Duration::from_millis(500), handle).await;
    }
}
