//! WebSocket state machine integration tests.

use std::sync::atomic::Ordering;

use trellis::connection::websocket::{
    ConnectionState, WebSocket, WsReceiveEvent, WsSendEvent,
};
use trellis::error::WsError;

mod common;
use common::{text_frame, ScriptedTransport};

#[tokio::test]
async fn accept_receive_disconnect_then_send_fails() {
    let (transport, sent, _receives) = ScriptedTransport::new(vec![
        WsReceiveEvent::Connect,
        text_frame("hello"),
        WsReceiveEvent::Disconnect { code: 1000 },
    ]);
    let mut socket = WebSocket::new(Box::new(transport));

    socket.accept(None, Vec::new()).await.unwrap();
    assert_eq!(socket.state(), ConnectionState::Connect);

    let text = socket.receive_text().await.unwrap();
    assert_eq!(text, "hello");
    assert_eq!(socket.state(), ConnectionState::Receive);

    let err = socket.receive_text().await.unwrap_err();
    assert!(matches!(err, WsError::Disconnect { code: 1000 }));
    assert_eq!(socket.state(), ConnectionState::Disconnect);

    let err = socket.send_text("too late").await.unwrap_err();
    assert!(matches!(err, WsError::Disconnected));

    // Only the accept event ever reached the transport.
    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(matches!(sent[0], WsSendEvent::Accept { .. }));
}

#[tokio::test]
async fn receive_after_disconnect_never_touches_the_transport() {
    let (transport, _sent, receives) = ScriptedTransport::new(vec![
        WsReceiveEvent::Connect,
        WsReceiveEvent::Disconnect { code: 1001 },
    ]);
    let mut socket = WebSocket::new(Box::new(transport));

    socket.accept(None, Vec::new()).await.unwrap();
    let err = socket.receive_text().await.unwrap_err();
    assert!(matches!(err, WsError::Disconnect { code: 1001 }));

    let receives_before = receives.load(Ordering::SeqCst);
    let err = socket.receive_text().await.unwrap_err();
    assert!(matches!(err, WsError::Disconnected));
    assert_eq!(receives.load(Ordering::SeqCst), receives_before);
}

#[tokio::test]
async fn receiving_implicitly_accepts_from_init() {
    let (transport, sent, receives) =
        ScriptedTransport::new(vec![WsReceiveEvent::Connect, text_frame("first")]);
    let mut socket = WebSocket::new(Box::new(transport));

    // No explicit accept; the first read performs the handshake.
    let text = socket.receive_text().await.unwrap();
    assert_eq!(text, "first");
    assert_eq!(receives.load(Ordering::SeqCst), 2);

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(matches!(sent[0], WsSendEvent::Accept { .. }));
}

#[tokio::test]
async fn accept_forwards_subprotocol_and_headers() {
    let (transport, sent, _receives) =
        ScriptedTransport::new(vec![WsReceiveEvent::Connect]);
    let mut socket = WebSocket::new(Box::new(transport));

    socket
        .accept(
            Some("graphql-ws".to_string()),
            vec![("x-node".to_string(), "a1".to_string())],
        )
        .await
        .unwrap();

    let sent = sent.lock().unwrap();
    let WsSendEvent::Accept {
        subprotocol,
        headers,
    } = &sent[0]
    else {
        panic!("expected an accept event");
    };
    assert_eq!(subprotocol.as_deref(), Some("graphql-ws"));
    assert_eq!(headers[0].0, "x-node");
}

#[tokio::test]
async fn send_and_receive_json_frames() {
    let (transport, sent, _receives) = ScriptedTransport::new(vec![
        WsReceiveEvent::Connect,
        text_frame(r#"{"kind":"ping"}"#),
    ]);
    let mut socket = WebSocket::new(Box::new(transport));

    let value = socket.receive_json().await.unwrap();
    assert_eq!(value["kind"], "ping");

    socket
        .send_json(&serde_json::json!({"kind": "pong"}))
        .await
        .unwrap();
    let sent = sent.lock().unwrap();
    let WsSendEvent::Send { text, .. } = &sent[1] else {
        panic!("expected a send event");
    };
    assert_eq!(text.as_deref(), Some(r#"{"kind":"pong"}"#));
}

#[tokio::test]
async fn close_is_rejected_after_disconnect() {
    let (transport, _sent, _receives) =
        ScriptedTransport::new(vec![WsReceiveEvent::Disconnect { code: 1006 }]);
    let mut socket = WebSocket::new(Box::new(transport));

    // The first receive observes the disconnect directly from init.
    let event = socket.receive_event().await;
    assert!(matches!(
        event,
        Ok(WsReceiveEvent::Disconnect { code: 1006 })
    ));
    assert_eq!(socket.state(), ConnectionState::Disconnect);

    let err = socket.close(1000, None).await.unwrap_err();
    assert!(matches!(err, WsError::Disconnected));
}
