//! Actor Message Definitions
//!
//! ```text
//! FsActor --Batch--> BuildActor --Reload/Css--> WsActor
//! ```

use std::net::TcpStream;

use crate::compiler::ChangeSet;

/// Messages to the Build Actor
#[derive(Debug)]
pub enum BuildMsg {
    /// One debounced group of changes
    Batch(ChangeSet),
    Shutdown,
}

/// Messages to the WebSocket Actor
#[derive(Debug)]
pub enum WsMsg {
    /// Reload every connected page
    Reload { reason: String },
    /// Re-fetch style sheets in place
    Css,
    /// Raw connection from the accept loop, handshake pending
    AddClient(TcpStream),
    Shutdown,
}
