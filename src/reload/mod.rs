//! Live reload.
//!
//! ```text
//! BuildActor --ReloadKind--> ChannelTransport --WsMsg--> WsActor --> Browser
//! ```
//!
//! - `message` - JSON wire format
//! - `server` - WebSocket accept loop

pub mod message;
pub mod server;

use tokio::sync::mpsc;

use crate::actor::messages::WsMsg;

/// What connected browsers should do after a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadKind {
    FullReload,
    /// Only style sheets changed; re-fetch them without reloading the page
    StyleInject,
}

/// Delivers reload notifications to browsers.
pub trait ReloadTransport: Send + Sync {
    fn notify(&self, kind: ReloadKind);
}

/// Transport for one-shot builds: nobody is listening.
pub struct NullTransport;

impl ReloadTransport for NullTransport {
    fn notify(&self, _kind: ReloadKind) {}
}

/// Forwards notifications to the WebSocket actor.
///
/// Must be called from a blocking context (the scheduler thread).
pub struct ChannelTransport {
    tx: mpsc::Sender<WsMsg>,
}

impl ChannelTransport {
    pub fn new(tx: mpsc::Sender<WsMsg>) -> Self {
        Self { tx }
    }
}

impl ReloadTransport for ChannelTransport {
    fn notify(&self, kind: ReloadKind) {
        let msg = match kind {
            ReloadKind::FullReload => WsMsg::Reload {
                reason: "rebuilt".to_string(),
            },
            ReloadKind::StyleInject => WsMsg::Css,
        };
        if self.tx.blocking_send(msg).is_err() {
            crate::debug!("reload"; "ws actor gone, dropping {:?}", kind);
        }
    }
}
