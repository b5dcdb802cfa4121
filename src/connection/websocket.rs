//! WebSocket connection lifecycle guard.
//!
//! # Responsibilities
//! - Track the connection state (init, connect, receive, disconnect)
//! - Drive state from inbound event types
//! - Short-circuit sends and receives once disconnected
//! - Perform the accept handshake, lazily on first read if needed
//!
//! # Design Decisions
//! - The underlying duplex transport is a trait; the core never owns
//!   the socket
//! - Disconnect is terminal; a receive in that state fails without
//!   touching the transport (prevents hanging on a closed peer)
//! - A disconnect event surfaces the close code to the caller

use async_trait::async_trait;

use crate::error::WsError;

/// Normal closure close code.
pub const WS_NORMAL_CLOSURE: u16 = 1000;

/// Events delivered by the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum WsReceiveEvent {
    /// The opening handshake.
    Connect,
    /// A data frame; exactly one of `text`/`bytes` is set by transports.
    Receive {
        text: Option<String>,
        bytes: Option<Vec<u8>>,
    },
    /// The peer went away, carrying the close code.
    Disconnect { code: u16 },
}

/// Events emitted to the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum WsSendEvent {
    Accept {
        subprotocol: Option<String>,
        headers: Vec<(String, String)>,
    },
    Send {
        text: Option<String>,
        bytes: Option<Vec<u8>>,
    },
    Close { code: u16, reason: String },
}

/// Duplex event transport the state machine sits on top of.
#[async_trait]
pub trait WebSocketTransport: Send {
    async fn receive(&mut self) -> Result<WsReceiveEvent, WsError>;
    async fn send(&mut self, event: WsSendEvent) -> Result<(), WsError>;
}

/// Connection state. Monotonic except connect ⇄ receive; disconnect is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Init,
    Connect,
    Receive,
    Disconnect,
}

/// A WebSocket connection with lifecycle enforcement.
pub struct WebSocket {
    transport: Box<dyn WebSocketTransport>,
    state: ConnectionState,
}

impl WebSocket {
    pub fn new(transport: Box<dyn WebSocketTransport>) -> Self {
        Self {
            transport,
            state: ConnectionState::Init,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Receive one event, updating the connection state from its type.
    ///
    /// Fails immediately when already disconnected, without performing
    /// the underlying receive.
    pub async fn receive_event(&mut self) -> Result<WsReceiveEvent, WsError> {
        if self.state == ConnectionState::Disconnect {
            return Err(WsError::Disconnected);
        }
        let event = self.transport.receive().await?;
        self.state = match event {
            WsReceiveEvent::Connect => ConnectionState::Connect,
            WsReceiveEvent::Receive { .. } => ConnectionState::Receive,
            WsReceiveEvent::Disconnect { .. } => ConnectionState::Disconnect,
        };
        Ok(event)
    }

    /// Send one event. Rejected once the connection is disconnected.
    pub async fn send_event(&mut self, event: WsSendEvent) -> Result<(), WsError> {
        if self.state == ConnectionState::Disconnect {
            return Err(WsError::Disconnected);
        }
        self.transport.send(event).await
    }

    /// Accept the incoming connection. Performs one receive (the connect
    /// handshake event) before emitting the accept event. A no-op outside
    /// the init state.
    pub async fn accept(
        &mut self,
        subprotocol: Option<String>,
        headers: Vec<(String, String)>,
    ) -> Result<(), WsError> {
        if self.state == ConnectionState::Init {
            let _ = self.receive_event().await?;
            self.send_event(WsSendEvent::Accept {
                subprotocol,
                headers,
            })
            .await?;
        }
        Ok(())
    }

    /// Send a close event.
    pub async fn close(&mut self, code: u16, reason: Option<String>) -> Result<(), WsError> {
        self.send_event(WsSendEvent::Close {
            code,
            reason: reason.unwrap_or_default(),
        })
        .await
    }

    async fn receive_data(&mut self) -> Result<(Option<String>, Option<Vec<u8>>), WsError> {
        // Lazy accept on first read.
        if self.state == ConnectionState::Init {
            self.accept(None, Vec::new()).await?;
        }
        match self.receive_event().await? {
            WsReceiveEvent::Disconnect { code } => Err(WsError::Disconnect { code }),
            WsReceiveEvent::Receive { text, bytes } => Ok((text, bytes)),
            WsReceiveEvent::Connect => Ok((None, None)),
        }
    }

    pub async fn receive_text(&mut self) -> Result<String, WsError> {
        let (text, _) = self.receive_data().await?;
        Ok(text.unwrap_or_default())
    }

    pub async fn receive_bytes(&mut self) -> Result<Vec<u8>, WsError> {
        let (_, bytes) = self.receive_data().await?;
        Ok(bytes.unwrap_or_default())
    }

    pub async fn receive_json(&mut self) -> Result<serde_json::Value, WsError> {
        let text = self.receive_text().await?;
        serde_json::from_str(&text)
            .map_err(|err| WsError::Transport(format!("invalid json frame: {err}")))
    }

    pub async fn send_text(&mut self, data: impl Into<String>) -> Result<(), WsError> {
        self.send_event(WsSendEvent::Send {
            text: Some(data.into()),
            bytes: None,
        })
        .await
    }

    pub async fn send_bytes(&mut self, data: impl Into<Vec<u8>>) -> Result<(), WsError> {
        self.send_event(WsSendEvent::Send {
            text: None,
            bytes: Some(data.into()),
        })
        .await
    }

    pub async fn send_json<T: serde::Serialize>(&mut self, data: &T) -> Result<(), WsError> {
        let text = serde_json::to_string(data)
            .map_err(|err| WsError::Transport(format!("json encoding failed: {err}")))?;
        self.send_text(text).await
    }
}

impl std::fmt::Debug for WebSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocket").field("state", &self.state).finish()
    }
}
