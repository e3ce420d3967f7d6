//! Per-user session state.
//!
//! A [`Session`] holds the latest extracted document and the latest chat
//! exchange for one user. The pipeline functions themselves are stateless;
//! hosts (a web handler, the CLI loop) own a `Session` and pass data in and
//! out explicitly.
//!
//! Every mutating method takes `&mut self`, so runs within one session are
//! serialised by the borrow checker. Hosts sharing a session between tasks
//! wrap it in a `tokio::sync::Mutex`.

use crate::config::PipelineConfig;
use crate::error::DocQaError;
use crate::extract::extract;
use crate::output::{ChatExchange, ExtractedDocument};
use crate::pipeline::chat::GroundedChatClient;
use crate::pipeline::input::OcrInput;
use std::time::Instant;
use tracing::info;

/// Latest document and latest answer for one user.
#[derive(Debug)]
pub struct Session {
    config: PipelineConfig,
    client: GroundedChatClient,
    document: Option<ExtractedDocument>,
    exchange: Option<ChatExchange>,
}

impl Session {
    /// Create an empty session. Builds the chat client once so questions
    /// share one connection pool.
    pub fn new(config: PipelineConfig) -> Result<Self, DocQaError> {
        let client = GroundedChatClient::from_config(&config)?;
        Ok(Self {
            config,
            client,
            document: None,
            exchange: None,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The latest successfully extracted document.
    pub fn document(&self) -> Option<&ExtractedDocument> {
        self.document.as_ref()
    }

    /// The latest exchange, successful or not.
    pub fn exchange(&self) -> Option<&ChatExchange> {
        self.exchange.as_ref()
    }

    /// Run OCR on `input` and make the result the current document.
    ///
    /// On success the previous document and exchange are replaced. On
    /// failure the session keeps its previous state.
    pub async fn ingest(&mut self, input: &OcrInput) -> Result<&ExtractedDocument, DocQaError> {
        let document = extract(input, &self.config).await?;
        self.exchange = None;
        Ok(self.document.insert(document))
    }

    /// Replace the current document with one extracted elsewhere.
    pub fn set_document(&mut self, document: ExtractedDocument) {
        self.exchange = None;
        self.document = Some(document);
    }

    /// Ask `question` about the current document.
    ///
    /// Fails with [`DocQaError::NoDocument`] before any document was
    /// ingested. A document with no content is still asked against (the
    /// context is simply empty). Chat failures are recorded as the current
    /// exchange and returned.
    pub async fn ask(&mut self, question: &str) -> Result<String, DocQaError> {
        if question.trim().is_empty() {
            return Err(DocQaError::EmptyQuestion);
        }
        let context = self
            .document
            .as_ref()
            .ok_or(DocQaError::NoDocument)?
            .grounding_context();

        let start = Instant::now();
        let result = self.client.ask(&context, question).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let (answer, error) = match &result {
            Ok(answer) => (Some(answer.clone()), None),
            Err(e) => (None, Some(e.to_string())),
        };
        info!(
            "Exchange finished in {}ms ({})",
            duration_ms,
            if answer.is_some() { "answered" } else { "failed" }
        );

        self.exchange = Some(ChatExchange {
            question: question.to_string(),
            context,
            answer,
            error,
            model: self.client.model().to_string(),
            duration_ms,
        });

        result
    }

    /// Forget the current document and exchange.
    pub fn clear(&mut self) {
        self.document = None;
        self.exchange = None;
    }
}
