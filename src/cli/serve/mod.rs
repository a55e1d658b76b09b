//! Development server with live reload support.
//!
//! Serves the output root over HTTP and injects the live-reload client into
//! every HTML response. The watch loop runs on its own thread next to the
//! request loop.

mod inject;
mod lifecycle;
mod path;
mod response;

pub use lifecycle::run_actor_system;

use crate::{compiler::Pipeline, config::SiteConfig, log};
use anyhow::{Context, Result};
use crossbeam::channel;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use tiny_http::{Request, Server};

/// Actual WebSocket port (may differ from the configured one if it was in use)
static ACTUAL_WS_PORT: AtomicU16 = AtomicU16::new(0);

/// Worker threads answering HTTP requests.
const REQUEST_THREADS: usize = 4;

/// Update the actual WebSocket port (called by coordinator after binding)
pub fn set_actual_ws_port(port: u16) {
    ACTUAL_WS_PORT.store(port, Ordering::Relaxed);
}

fn get_actual_ws_port() -> u16 {
    ACTUAL_WS_PORT.load(Ordering::Relaxed)
}

/// Serve the output root and run the watch loop until Ctrl+C.
pub fn serve(config: Arc<SiteConfig>, pipeline: Pipeline) -> Result<()> {
    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);
    set_actual_ws_port(config.serve.ws_port);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    lifecycle::register_server_for_shutdown(Arc::clone(&server), shutdown_tx);

    log!("serve"; "http://{}", addr);

    let actor_handle = lifecycle::spawn_actors(
        Arc::clone(&config),
        pipeline,
        Some(config.serve.ws_port),
        shutdown_rx,
    );
    run_request_loop(&server, &config)?;
    lifecycle::wait_for_shutdown(actor_handle);
    Ok(())
}

fn run_request_loop(server: &Server, config: &Arc<SiteConfig>) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(REQUEST_THREADS)
        .thread_name(|i| format!("kiln-http-{i}"))
        .build()
        .context("failed to create request thread pool")?;

    for request in server.incoming_requests() {
        let config = Arc::clone(config);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &config) {
                log!("serve"; "request error: {e}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(request: Request, config: &SiteConfig) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    let ws_port = get_actual_ws_port();
    if request.url() == crate::embed::serve::HOTRELOAD_URL {
        return response::respond_hotreload_js(request, ws_port);
    }

    let ws_port = Some(ws_port);
    match path::resolve_path(request.url(), &config.build.output) {
        Some(path) => response::respond_file(request, &path, ws_port),
        None => response::respond_not_found(request, config, ws_port),
    }
}
