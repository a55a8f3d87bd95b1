//! One-shot note endpoints
//!
//! Simple request/response collaborators outside the streaming core:
//! digesting a finished transcript into a structured note, and turning
//! a note into patient instructions.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::reconcile::IncrementalItem;

/// A structured note: ordered sections of title + text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub sections: Vec<NoteSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteSection {
    pub title: String,
    pub text: String,
}

#[derive(Debug, thiserror::Error)]
pub enum NoteError {
    #[error("request failed: {0}")]
    Http(String),
    #[error("service error ({status}): {message}")]
    Service { status: u16, message: String },
}

#[derive(Serialize)]
struct DigestRequest<'a> {
    output_objects: Vec<&'a str>,
    language: &'a str,
    patient_context: &'a str,
    transcript_items: Vec<TranscriptItemPayload<'a>>,
}

#[derive(Serialize)]
struct TranscriptItemPayload<'a> {
    text: &'a str,
    speaker: &'a str,
}

#[derive(Deserialize)]
struct DigestResponse {
    note: Note,
}

#[derive(Serialize)]
struct InstructionsRequest<'a> {
    note: &'a Note,
    note_locale: &'a str,
    instructions_locale: &'a str,
    consultation_type: &'a str,
}

#[derive(Deserialize)]
struct InstructionsResponse {
    instructions: String,
}

#[derive(Deserialize)]
struct ServiceErrorBody {
    message: String,
}

/// Client for the note endpoints, bearer-authenticated
pub struct NoteClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NoteClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Digest reconciled transcript items plus free-text context into a
    /// structured note.
    pub async fn digest(
        &self,
        items: &[IncrementalItem],
        patient_context: &str,
        language: &str,
    ) -> Result<Note, NoteError> {
        let request = DigestRequest {
            output_objects: vec!["note"],
            language,
            patient_context,
            transcript_items: items
                .iter()
                .map(|item| TranscriptItemPayload {
                    text: &item.text,
                    speaker: "unspecified",
                })
                .collect(),
        };

        info!("Digesting {} transcript items into a note", items.len());

        let response: DigestResponse = self.post("digest", &request).await?;
        Ok(response.note)
    }

    /// Generate patient instructions from a structured note.
    pub async fn patient_instructions(
        &self,
        note: &Note,
        note_locale: &str,
        instructions_locale: &str,
    ) -> Result<String, NoteError> {
        let request = InstructionsRequest {
            note,
            note_locale,
            instructions_locale,
            consultation_type: "IN_PERSON",
        };

        let response: InstructionsResponse =
            self.post("generate_patient_instructions", &request).await?;
        Ok(response.instructions)
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, NoteError>
    where
        Req: Serialize,
        Resp: for<'de> Deserialize<'de>,
    {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| NoteError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ServiceErrorBody>()
                .await
                .map(|b| b.message)
                .unwrap_or_else(|_| status.to_string());
            return Err(NoteError::Service {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Resp>()
            .await
            .map_err(|e| NoteError::Http(e.to_string()))
    }
}
