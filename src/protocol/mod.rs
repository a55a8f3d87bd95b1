//! Wire vocabulary for the two streaming variants
//!
//! The listen (structured encounter) and dictate (free-form) sockets
//! speak the same lifecycle — configuration message, audio chunks,
//! terminal end, incremental items back — but differ in message schema:
//! listen messages are tagged by `object`, dictate messages by `type`.

pub mod messages;

use base64::Engine;

pub use messages::{
    DictateEvent, DictateRequest, ErrorEnvelope, ItemUpdate, ListenEvent, ListenRequest,
    StreamDeclaration, MIC_STREAM_ID, PCM_ENCODING,
};

/// Stream mode: structured encounter listening or free-form dictation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVariant {
    Listen,
    Dictate,
}

/// Options that parameterize the opening configuration message
#[derive(Debug, Clone)]
pub struct StreamOptions {
    pub sample_rate: u32,
    /// BCP 47 tag, e.g. "en-US"
    pub locale: String,
    /// Dictate only: punctuation is spoken rather than inferred
    pub explicit_punctuation: bool,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            locale: "en-US".to_string(),
            explicit_punctuation: false,
        }
    }
}

/// A demultiplexed inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Item(ItemUpdate),
    ServiceError(String),
}

impl ProtocolVariant {
    /// Path under the service websocket base URL
    pub fn ws_path(&self) -> &'static str {
        match self {
            Self::Listen => "listen-ws",
            Self::Dictate => "dictate-ws",
        }
    }

    /// Sub-protocol token negotiated during the websocket handshake
    pub fn subprotocol(&self) -> &'static str {
        match self {
            Self::Listen => "ambient-listen-protocol",
            Self::Dictate => "ambient-dictate-protocol",
        }
    }

    /// First message on the socket, declaring format and locale
    pub fn opening_message(&self, options: &StreamOptions) -> serde_json::Result<String> {
        match self {
            Self::Listen => serde_json::to_string(&ListenRequest::ListenConfig {
                output_objects: vec!["transcript_item".to_string()],
                encoding: PCM_ENCODING.to_string(),
                sample_rate: options.sample_rate,
                language: options.locale.clone(),
                streams: vec![StreamDeclaration {
                    id: MIC_STREAM_ID.to_string(),
                    speaker_type: "unspecified".to_string(),
                }],
            }),
            Self::Dictate => serde_json::to_string(&DictateRequest::DictateConfig {
                encoding: PCM_ENCODING.to_string(),
                sample_rate: options.sample_rate,
                locale: options.locale.clone(),
                dictate_punctuation: options.explicit_punctuation,
            }),
        }
    }

    /// Audio chunk message carrying base64 PCM bytes
    pub fn chunk_message(&self, pcm_bytes: &[u8]) -> serde_json::Result<String> {
        let payload = base64::engine::general_purpose::STANDARD.encode(pcm_bytes);
        match self {
            Self::Listen => serde_json::to_string(&ListenRequest::AudioChunk {
                payload,
                stream_id: MIC_STREAM_ID.to_string(),
            }),
            Self::Dictate => serde_json::to_string(&DictateRequest::AudioChunk { payload }),
        }
    }

    /// Terminal control message that asks the peer to wrap up and close
    pub fn end_message(&self) -> serde_json::Result<String> {
        match self {
            Self::Listen => serde_json::to_string(&ListenRequest::End),
            Self::Dictate => serde_json::to_string(&DictateRequest::End),
        }
    }

    /// Parse one inbound text message into its demultiplexed form.
    ///
    /// Returns `Err` for malformed or unrecognized payloads; the caller
    /// drops those with a warning rather than failing the session.
    pub fn parse_inbound(&self, text: &str) -> serde_json::Result<InboundEvent> {
        match self {
            Self::Listen => serde_json::from_str::<ListenEvent>(text).map(|event| match event {
                ListenEvent::TranscriptItem(item) => InboundEvent::Item(item),
                ListenEvent::ErrorMessage { message } => InboundEvent::ServiceError(message),
            }),
            Self::Dictate => serde_json::from_str::<DictateEvent>(text)
                .map(|DictateEvent::DictationItem(item)| InboundEvent::Item(item))
                .or_else(|err| {
                    // Service errors keep the `object` tag on this socket.
                    serde_json::from_str::<ErrorEnvelope>(text)
                        .map(|ErrorEnvelope::ErrorMessage { message }| {
                            InboundEvent::ServiceError(message)
                        })
                        .map_err(|_| err)
                }),
        }
    }
}
