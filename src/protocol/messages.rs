use serde::{Deserialize, Serialize};

/// PCM encoding advertised in the configuration message
pub const PCM_ENCODING: &str = "pcm_s16le";

/// Stream id declared for the single microphone stream in listen mode
pub const MIC_STREAM_ID: &str = "microphone";

/// One revision of a recognized item as it arrives on the wire.
///
/// The service emits several revisions per `id` while it refines its
/// output; `start_offset_ms`/`end_offset_ms` position the item on the
/// audio timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub id: String,
    pub start_offset_ms: u64,
    #[serde(default)]
    pub end_offset_ms: u64,
    pub text: String,
    pub is_final: bool,
}

/// Declaration of one audio stream in the listen configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamDeclaration {
    pub id: String,
    pub speaker_type: String,
}

/// Outbound vocabulary of the listen (encounter) socket, tagged by `object`
#[derive(Debug, Serialize)]
#[serde(tag = "object", rename_all = "snake_case")]
pub enum ListenRequest {
    ListenConfig {
        output_objects: Vec<String>,
        encoding: String,
        sample_rate: u32,
        language: String,
        streams: Vec<StreamDeclaration>,
    },
    AudioChunk {
        payload: String,
        stream_id: String,
    },
    End,
}

/// Outbound vocabulary of the dictation socket, tagged by `type`
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DictateRequest {
    DictateConfig {
        encoding: String,
        sample_rate: u32,
        locale: String,
        dictate_punctuation: bool,
    },
    AudioChunk {
        payload: String,
    },
    End,
}

/// Inbound vocabulary of the listen socket
#[derive(Debug, Deserialize)]
#[serde(tag = "object", rename_all = "snake_case")]
pub enum ListenEvent {
    TranscriptItem(ItemUpdate),
    ErrorMessage { message: String },
}

/// Inbound vocabulary of the dictation socket
///
/// Error messages arrive `object`-tagged even on this `type`-tagged
/// socket; the parser falls back to `ErrorEnvelope` for them.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DictateEvent {
    DictationItem(ItemUpdate),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "object", rename_all = "snake_case")]
pub enum ErrorEnvelope {
    ErrorMessage { message: String },
}
