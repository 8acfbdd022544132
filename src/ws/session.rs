//! Per-client session handling: hello on connect, ping/pong, heartbeat
//! timeout, and the axum route that drives it.

use std::time::Instant;

use axum::extract::ws::{Message, WebSocket};
use uuid::Uuid;

use super::message::{ClientMessage, ServerMessage};
use super::{Broadcaster, HEARTBEAT_WINDOW};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub Uuid);

pub struct Session {
    pub id: ClientId,
    last_activity: Instant,
}

impl Session {
    pub fn new(id: ClientId) -> Self {
        Self { id, last_activity: Instant::now() }
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn is_idle(&self) -> bool {
        self.last_activity.elapsed() > HEARTBEAT_WINDOW
    }
}

/// Drives a single client's socket: sends `welcome`, answers `ping` with
/// `pong`, forwards broadcaster messages, and closes on heartbeat timeout.
pub async fn run_session(mut socket: WebSocket, broadcaster: Broadcaster) {
    let (client_id, mut rx) = broadcaster.register();
    let mut session = Session::new(client_id);

    let welcome = serde_json::to_string(&ServerMessage::Welcome { client_id: client_id.0 }).unwrap_or_default();
    if socket.send(Message::Text(welcome.into())).await.is_err() {
        broadcaster.unregister(client_id);
        return;
    }

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        session.touch();
                        if let Ok(ClientMessage::Ping) = serde_json::from_str::<ClientMessage>(&text) {
                            let pong = serde_json::to_string(&ServerMessage::Pong).unwrap_or_default();
                            if socket.send(Message::Text(pong.into())).await.is_err() {
                                break;
                            }
                        }
                        // Other client message kinds are routed to REST-equivalent
                        // handlers by the caller; this loop only owns transport.
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => session.touch(),
                    Some(Err(_)) => break,
                }
            }
            outgoing = rx.recv() => {
                match outgoing {
                    Some(message) => {
                        let text = serde_json::to_string(&message).unwrap_or_default();
                        if socket.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            _ = tokio::time::sleep(HEARTBEAT_WINDOW) => {
                if session.is_idle() {
                    break;
                }
            }
        }
    }

    broadcaster.unregister(client_id);
}
