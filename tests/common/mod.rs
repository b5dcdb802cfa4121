//! Shared helpers for the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use http::{HeaderMap, HeaderValue};

use trellis::connection::websocket::{WebSocketTransport, WsReceiveEvent, WsSendEvent};
use trellis::error::WsError;
use trellis::{Connection, ScopeKind, SessionMap};

/// A secret of the requested length.
pub fn secret(len: usize) -> Vec<u8> {
    (0..len).map(|i| i as u8).collect()
}

/// A session mapping from string pairs.
pub fn session(pairs: &[(&str, &str)]) -> SessionMap {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), serde_json::Value::from(*value)))
        .collect()
}

/// An HTTP connection carrying the given request cookies.
pub fn connection_with_cookies(pairs: &[(&str, &str)]) -> Connection {
    let mut headers = HeaderMap::new();
    if !pairs.is_empty() {
        let header = pairs
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        headers.insert(
            http::header::COOKIE,
            HeaderValue::from_str(&header).unwrap(),
        );
    }
    Connection::new(ScopeKind::Http, "/", headers)
}

/// Extract `(key, value)` pairs from the `Set-Cookie` headers.
pub fn set_cookie_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .get_all(http::header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|header| {
            let first = header.split(';').next()?;
            let (key, value) = first.split_once('=')?;
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

/// Shared log of events a [`ScriptedTransport`] was asked to send.
pub type SentLog = Arc<Mutex<Vec<WsSendEvent>>>;

/// Shared count of receives actually performed by the transport.
pub type ReceiveCount = Arc<AtomicUsize>;

/// A transport that replays a scripted sequence of inbound events and
/// records outbound events.
pub struct ScriptedTransport {
    events: VecDeque<WsReceiveEvent>,
    sent: SentLog,
    receives: ReceiveCount,
}

impl ScriptedTransport {
    pub fn new(events: Vec<WsReceiveEvent>) -> (Self, SentLog, ReceiveCount) {
        let sent: SentLog = Arc::new(Mutex::new(Vec::new()));
        let receives: ReceiveCount = Arc::new(AtomicUsize::new(0));
        (
            Self {
                events: events.into(),
                sent: sent.clone(),
                receives: receives.clone(),
            },
            sent,
            receives,
        )
    }
}

#[async_trait]
impl WebSocketTransport for ScriptedTransport {
    async fn receive(&mut self) -> Result<WsReceiveEvent, WsError> {
        self.receives.fetch_add(1, Ordering::SeqCst);
        self.events
            .pop_front()
            .ok_or_else(|| WsError::Transport("no more scripted events".to_string()))
    }

    async fn send(&mut self, event: WsSendEvent) -> Result<(), WsError> {
        self.sent.lock().unwrap().push(event);
        Ok(())
    }
}

/// A text frame event.
pub fn text_frame(text: &str) -> WsReceiveEvent {
    WsReceiveEvent::Receive {
        text: Some(text.to_string()),
        bytes: None,
    }
}
