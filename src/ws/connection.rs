//! WebSocket connection loop.
//!
//! Reads protocol events from the client and hands them to the session
//! engine, and writes the events the engine queues for this connection.

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};

use super::messages::decode_frame;
use crate::domain::{ParticipantId, ServerEvent};
use crate::service::EngineHandle;

type WsSink = SplitSink<WebSocket, Message>;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Assigns the connection a [`ParticipantId`] and tells the client.
/// - Forwards decoded client events to the engine.
/// - Writes every event the engine queues for this connection.
/// - Closes the socket if the engine drops the queue, so the client
///   reconnects and re-joins.
/// - Reports the disconnect to the engine when the socket closes.
pub async fn run_connection(socket: WebSocket, engine: EngineHandle) {
    let participant_id = ParticipantId::generate();
    let (mut ws_tx, mut ws_rx) = socket.split();

    let Ok(mut inbox) = engine.connect(participant_id.clone()).await else {
        tracing::warn!(participant_id = %participant_id, "engine unavailable, dropping connection");
        return;
    };
    tracing::debug!(participant_id = %participant_id, "ws connection opened");

    let hello = ServerEvent::Connected {
        id: participant_id.clone(),
    };
    let mut forwarded: u64 = 0;
    if send_event(&mut ws_tx, &hello).await {
        loop {
            tokio::select! {
                // Incoming frame from client
                msg = ws_rx.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if !handle_text_message(text.as_str(), &participant_id, &engine).await {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Err(e)) => {
                            tracing::debug!(participant_id = %participant_id, error = %e, "ws read failed");
                            break;
                        }
                        _ => {}
                    }
                }
                // Event queued by the engine
                queued = inbox.recv() => {
                    match queued {
                        Some(event) => {
                            if !send_event(&mut ws_tx, &event).await {
                                break;
                            }
                            forwarded += 1;
                        }
                        None => {
                            tracing::info!(
                                participant_id = %participant_id,
                                "outbound queue closed by engine, closing socket"
                            );
                            let _ = ws_tx.send(Message::Close(None)).await;
                            break;
                        }
                    }
                }
            }
        }
    }

    if engine.disconnect(participant_id.clone()).await.is_err() {
        tracing::warn!(participant_id = %participant_id, "engine unavailable on disconnect");
    }
    tracing::debug!(participant_id = %participant_id, forwarded, "ws connection closed");
}

/// Decodes a text frame and submits it to the engine.
///
/// Malformed frames are dropped. Returns `false` once the engine is gone
/// and the connection should close.
async fn handle_text_message(
    text: &str,
    participant_id: &ParticipantId,
    engine: &EngineHandle,
) -> bool {
    let event = match decode_frame(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!(participant_id = %participant_id, error = %e, "ignoring frame");
            return true;
        }
    };

    engine.submit(participant_id.clone(), event).await.is_ok()
}

/// Serializes and sends one event. Returns `false` if the socket is gone.
async fn send_event(ws_tx: &mut WsSink, event: &ServerEvent) -> bool {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(event = event.event_name(), error = %e, "failed to encode event");
            return true;
        }
    };
    ws_tx.send(Message::text(json)).await.is_ok()
}
