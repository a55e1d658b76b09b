use std::io::ErrorKind;
use std::net::TcpStream;
use std::time::Duration;

use tungstenite::protocol::Message;

use crate::reload::message::HotReloadMessage;

use super::{Clients, WsActor};

const READ_POLL: Duration = Duration::from_millis(100);

impl WsActor {
    /// Handshake a new connection and register it.
    pub(super) fn add_client(&self, stream: TcpStream) {
        // Keep blocking mode during handshake, switch to non-blocking after
        match tungstenite::accept(stream) {
            Ok(mut ws) => {
                let _ = ws.get_ref().set_nonblocking(true);

                let connected = HotReloadMessage::connected();
                if let Err(e) = ws.send(Message::Text(connected.to_json().into())) {
                    crate::log!("ws"; "failed to send connected message: {}", e);
                    return;
                }

                let mut clients = self.clients.lock();
                clients.push(ws);
                crate::debug!("ws"; "client connected (total: {})", clients.len());
            }
            Err(e) => crate::log!("ws"; "handshake failed: {}", e),
        }
    }

    /// Drain incoming frames so pings get answered and closed sockets are
    /// dropped. Clients never send anything the server acts on.
    pub(super) fn client_reader_loop(clients: Clients) {
        while !crate::core::is_shutdown() {
            std::thread::sleep(READ_POLL);

            clients.lock().retain_mut(|client| loop {
                match client.read() {
                    Ok(Message::Close(_)) => break false,
                    Ok(_) => continue,
                    Err(tungstenite::Error::Io(ref e)) if e.kind() == ErrorKind::WouldBlock => {
                        break true;
                    }
                    Err(e) => {
                        crate::debug!("ws"; "client disconnected: {}", e);
                        break false;
                    }
                }
            });
        }
    }
}
