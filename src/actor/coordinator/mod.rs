//! Actor Coordinator - Wires up the Watch Loop
//!
//! The Coordinator is a thin orchestrator that:
//! - Starts the watcher before anything is built (no lost events)
//! - Wires the actors together over bounded channels
//! - Runs them until Ctrl+C

mod runtime;
mod watch_paths;

use std::sync::Arc;

use anyhow::Result;
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::build::BuildActor;
use super::fs::FsActor;
use super::messages::{BuildMsg, WsMsg};
use super::ws::WsActor;
use crate::compiler::Pipeline;
use crate::config::SiteConfig;
use crate::reload::{ChannelTransport, NullTransport, ReloadTransport};

const CHANNEL_BUFFER: usize = 32;

/// Coordinator - wires up and runs the actor system.
pub struct Coordinator {
    config: Arc<SiteConfig>,
    pipeline: Pipeline,
    ws_port: Option<u16>,
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    pub fn new(config: Arc<SiteConfig>, pipeline: Pipeline) -> Self {
        Self {
            config,
            pipeline,
            ws_port: None,
            shutdown_rx: None,
        }
    }

    /// Enable live reload on this WebSocket port.
    pub fn with_ws_port(mut self, port: u16) -> Self {
        self.ws_port = Some(port);
        self
    }

    /// Set shutdown signal receiver.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Run the actor system.
    pub async fn run(self) -> Result<()> {
        let (build_tx, build_rx) = mpsc::channel::<BuildMsg>(CHANNEL_BUFFER);

        let watch_paths = watch_paths::collect_watch_paths(&self.config);
        crate::debug!("watch"; "{} roots", watch_paths.len());
        let fs_actor = FsActor::new(watch_paths, build_tx.clone(), Arc::clone(&self.config))
            .map_err(|e| anyhow::anyhow!("watcher failed: {}", e))?;

        let (ws_actor, ws_tx, transport) = match self.ws_port {
            Some(port) => {
                let (ws_tx, ws_rx) = mpsc::channel::<WsMsg>(CHANNEL_BUFFER);
                match crate::reload::server::start_ws_server_with_channel(
                    self.config.serve.interface,
                    port,
                    ws_tx.clone(),
                ) {
                    Ok(actual_port) => crate::cli::serve::set_actual_ws_port(actual_port),
                    Err(e) => crate::log!("actor"; "websocket server failed: {}", e),
                }
                let transport: Arc<dyn ReloadTransport> =
                    Arc::new(ChannelTransport::new(ws_tx.clone()));
                (Some(WsActor::new(ws_rx)), Some(ws_tx), transport)
            }
            None => {
                let transport: Arc<dyn ReloadTransport> = Arc::new(NullTransport);
                (None, None, transport)
            }
        };

        let build_actor = BuildActor::new(build_rx, self.pipeline, transport);

        crate::log!("watch"; "watching for changes, press Ctrl+C to stop");
        crate::debug!("actor"; "start");
        runtime::run_actors(
            runtime::Actors {
                fs: fs_actor,
                build: build_actor,
                ws: ws_actor,
            },
            build_tx,
            ws_tx,
            self.shutdown_rx,
        )
        .await;

        crate::debug!("actor"; "stopped");
        Ok(())
    }
}
