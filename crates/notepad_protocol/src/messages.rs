//! JSON messages exchanged on `/api/note/{slug}`.

use crate::error::{ProtocolError, ProtocolResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `GET /api/note/{slug}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    /// The note slug.
    pub slug: String,
    /// Note content, empty for a note that was never written.
    pub content: String,
    /// Time of the last write, `null` for a note that was never written.
    pub updated_at: Option<DateTime<Utc>>,
}

impl NoteResponse {
    /// The virtual note returned for a slug with no stored row.
    pub fn empty(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            content: String::new(),
            updated_at: None,
        }
    }
}

/// Body of `PUT`/`POST /api/note/{slug}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRequest {
    /// New note content. An empty string clears the note.
    pub content: String,
}

impl SaveRequest {
    /// Creates a save request.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Parses a save body.
    ///
    /// The body must be a JSON object whose `content` field is a string.
    /// Other fields are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidPayload`] for malformed JSON, a
    /// non-object body, or a missing or non-string `content`.
    pub fn from_json(body: &[u8]) -> ProtocolResult<Self> {
        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| ProtocolError::invalid_payload(format!("malformed JSON: {e}")))?;

        match value.get("content") {
            Some(serde_json::Value::String(content)) => Ok(Self::new(content.as_str())),
            Some(other) => Err(ProtocolError::invalid_payload(format!(
                "content must be a string, got {}",
                json_kind(other)
            ))),
            None => Err(ProtocolError::invalid_payload("content is missing")),
        }
    }

    /// Encodes the request as JSON bytes.
    pub fn to_json(&self) -> Vec<u8> {
        // A struct with a single String field always serializes.
        serde_json::to_vec(self).unwrap_or_default()
    }
}

/// Body of a successful save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    /// Always `true` on success.
    pub ok: bool,
    /// Time the write was applied.
    pub updated_at: Option<DateTime<Utc>>,
}

impl SaveResponse {
    /// Creates a successful save response.
    pub fn success(updated_at: DateTime<Utc>) -> Self {
        Self {
            ok: true,
            updated_at: Some(updated_at),
        }
    }
}

/// Body of every `4xx`/`5xx` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human readable message.
    pub error: String,
}

impl ErrorResponse {
    /// Creates an error body.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn note_response_wire_format() {
        let json = serde_json::to_value(NoteResponse::empty("fresh-slug")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"slug": "fresh-slug", "content": "", "updatedAt": null})
        );

        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let response = NoteResponse {
            slug: "a".into(),
            content: "hi".into(),
            updated_at: Some(at),
        };
        let text = serde_json::to_string(&response).unwrap();
        assert!(text.contains("\"updatedAt\":\"2024-05-01T12:30:00Z\""));
        let back: NoteResponse = serde_json::from_str(&text).unwrap();
        assert_eq!(back, response);
    }

    #[test]
    fn save_request_accepts_string_content() {
        let req = SaveRequest::from_json(br#"{"content":"hello"}"#).unwrap();
        assert_eq!(req.content, "hello");

        let req = SaveRequest::from_json(br#"{"content":"","extra":1}"#).unwrap();
        assert_eq!(req.content, "");
    }

    #[test]
    fn save_request_rejects_bad_bodies() {
        let bodies: [&[u8]; 8] = [
            br#"{"content":42}"#,
            br#"{"content":null}"#,
            br#"{"text":"x"}"#,
            br#"{}"#,
            br#"[]"#,
            br#""content""#,
            b"not json",
            b"",
        ];
        for body in bodies {
            assert!(
                matches!(
                    SaveRequest::from_json(body),
                    Err(ProtocolError::InvalidPayload { .. })
                ),
                "{:?} should be rejected",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn save_request_encodes() {
        let body = SaveRequest::new("a\"b").to_json();
        assert_eq!(SaveRequest::from_json(&body).unwrap().content, "a\"b");
    }

    #[test]
    fn save_response_wire_format() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let json = serde_json::to_value(SaveResponse::success(at)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"ok": true, "updatedAt": "2024-01-02T03:04:05Z"})
        );
    }
}
