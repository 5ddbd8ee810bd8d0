//! Codec trait and implementations for serializing wire data.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The push stream doesn't care HOW an event is serialized — it just needs
//! something that implements [`Codec`]. Browser observers read JSON, so
//! [`JsonCodec`] is the one the collector uses today.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// - `Send + Sync` → safe to share between request handlers running on
///   different Tokio worker threads.
/// - `'static` → the codec owns everything it needs, so it can live in
///   long-lived server state.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;

    /// Serializes a value into a UTF-8 string.
    ///
    /// Text frames (server-sent events) can't carry arbitrary bytes, so
    /// this fails with [`ProtocolError::NotUtf8`] for binary codecs.
    fn encode_text<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<String, ProtocolError> {
        String::from_utf8(self.encode(value)?)
            .map_err(|_| ProtocolError::NotUtf8)
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use glance_protocol::{Codec, JsonCodec, PresenceEvent, Status};
///
/// let event = PresenceEvent {
///     title: "Firefox".into(),
///     os: "linux".into(),
///     client: "laptop".into(),
///     status: Status::Online,
/// };
///
/// let text = JsonCodec.encode_text(&event).unwrap();
/// let decoded: PresenceEvent = JsonCodec.decode(text.as_bytes()).unwrap();
/// assert_eq!(event, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }

    fn encode_text<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }
}
