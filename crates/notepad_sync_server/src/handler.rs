//! Request handlers for the note endpoints.

use crate::config::ServerConfig;
use crate::error::ServerResult;
use notepad_protocol::{NoteResponse, SaveRequest, SaveResponse, Slug};
use notepad_storage::NoteStore;
use std::sync::Arc;

/// Context for request handling.
pub struct HandlerContext {
    /// Server configuration.
    pub config: ServerConfig,
    /// Note store (shared across all handlers).
    pub store: Arc<dyn NoteStore>,
}

impl HandlerContext {
    /// Creates a new handler context.
    pub fn new(config: ServerConfig, store: Arc<dyn NoteStore>) -> Self {
        Self { config, store }
    }
}

/// Handler for note requests.
///
/// Slugs arrive as raw route parameters and are validated here again even
/// though well-behaved clients only send valid ones.
pub struct RequestHandler {
    context: Arc<HandlerContext>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }

    /// Returns the note for `slug`, or the empty note if it was never written.
    pub fn get(&self, slug: &str) -> ServerResult<NoteResponse> {
        let slug = Slug::parse(slug)?;

        let response = match self.context.store.get(&slug)? {
            Some(note) => NoteResponse {
                slug: slug.to_string(),
                content: note.content,
                updated_at: Some(note.updated_at),
            },
            None => NoteResponse::empty(slug.as_str()),
        };

        tracing::debug!(
            slug = %slug,
            len = response.content.len(),
            stored = response.updated_at.is_some(),
            "note read"
        );
        Ok(response)
    }

    /// Replaces the content of `slug` unconditionally.
    pub fn put(&self, slug: &str, content: &str) -> ServerResult<SaveResponse> {
        let slug = Slug::parse(slug)?;
        let note = self.context.store.upsert(&slug, content)?;

        tracing::debug!(slug = %slug, len = content.len(), "note saved");
        Ok(SaveResponse::success(note.updated_at))
    }

    /// Handles a raw save body (`{"content": "..."}`).
    ///
    /// The slug is checked before the body, so a request failing both
    /// reports the slug.
    pub fn handle_save(&self, slug: &str, body: &[u8]) -> ServerResult<SaveResponse> {
        Slug::parse(slug)?;
        let request = SaveRequest::from_json(body)?;
        self.put(slug, &request.content)
    }
}
