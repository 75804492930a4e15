//! Event wire codec
//!
//! The event bus only sees the [`EventCodec`] contract; [`JsonCodec`] is the
//! bundled implementation. Opaque attribute values never cross the wire.

use thiserror::Error;
use tracing::debug;

use super::event::Event;

/// Errors raised by [`JsonCodec`].
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("event '{name}' carries an opaque attribute '{key}'")]
    Opaque { name: String, key: String },

    #[error("failed to encode event: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode event: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("event '{name}' has hash {hash:#018x}, which does not match its name")]
    HashMismatch { name: String, hash: u64 },
}

/// Serializes events to and from bytes.
pub trait EventCodec {
    /// Append the encoding of `event` to `out`. Returns false, leaving `out`
    /// untouched, when the event cannot be encoded.
    fn serialize(
        &self,
        event: &Event,
        out: &mut Vec<u8>,
    ) -> bool;

    /// Decode one event from `bytes`.
    fn deserialize(
        &self,
        bytes: &[u8],
    ) -> Option<Event>;
}

/// JSON encoding through `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indented output.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    pub fn encode(
        &self,
        event: &Event,
    ) -> Result<Vec<u8>, CodecError> {
        if let Some((key, _)) = event.attributes().find(|(_, v)| !v.is_serializable()) {
            return Err(CodecError::Opaque {
                name: event.name().to_string(),
                key: key.to_string(),
            });
        }
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(event)
        } else {
            serde_json::to_vec(event)
        };
        bytes.map_err(CodecError::Encode)
    }

    pub fn decode(
        &self,
        bytes: &[u8],
    ) -> Result<Event, CodecError> {
        let event: Event = serde_json::from_slice(bytes).map_err(CodecError::Decode)?;
        if !event.is_consistent() {
            return Err(CodecError::HashMismatch {
                name: event.name().to_string(),
                hash: event.hash(),
            });
        }
        Ok(event)
    }
}

impl EventCodec for JsonCodec {
    fn serialize(
        &self,
        event: &Event,
        out: &mut Vec<u8>,
    ) -> bool {
        match self.encode(event) {
            Ok(bytes) => {
                out.extend_from_slice(&bytes);
                true
            }
            Err(e) => {
                debug!("{}", e);
                false
            }
        }
    }

    fn deserialize(
        &self,
        bytes: &[u8],
    ) -> Option<Event> {
        self.decode(bytes)
            .map_err(|e| debug!("{}", e))
            .ok()
    }
}
