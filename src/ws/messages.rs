//! WebSocket frame decoding.
//!
//! Every text frame is a JSON object `{"event": <name>, "data": <payload>}`.
//! Inbound events are [`ClientEvent`]s; outbound frames use the same
//! envelope, see [`crate::domain::ServerEvent`].

use crate::domain::ClientEvent;
use crate::error::PokerError;

/// Decodes a text frame into a protocol event.
///
/// # Errors
///
/// Returns [`PokerError::MalformedFrame`] if the frame is not valid JSON,
/// names an unknown event, or carries a payload of the wrong shape.
pub fn decode_frame(text: &str) -> Result<ClientEvent, PokerError> {
    Ok(serde_json::from_str(text)?)
}
