//! In-memory email corpus
//!
//! Serves both email collaborator shapes from one set of fixture messages:
//! a date-windowed embedding similarity query (the cached corpus) and a
//! keyword query with a `subject:` filter (standing in for a live mailbox).

use crate::embedding::cosine_similarity;
use crate::StoreError;
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::fmt::Display;
use std::path::Path;
use tally_domain::traits::EmbeddingModel;
use tally_domain::{DateRange, EmailMessage};
use tracing::debug;

/// Fixture shape; side-fields may be JSON arrays or raw (possibly broken) JSON text
#[derive(Debug, Deserialize)]
struct EmailFixture {
    id: String,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    sender_name: String,
    #[serde(default)]
    sender_address: String,
    #[serde(default)]
    received_at: Option<NaiveDateTime>,
    #[serde(default)]
    body: String,
    #[serde(default)]
    has_attachments: bool,
    #[serde(default)]
    extracted_amounts: Option<serde_json::Value>,
    #[serde(default)]
    extracted_companies: Option<serde_json::Value>,
}

fn raw_side_field(value: Option<serde_json::Value>) -> Option<String> {
    match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(raw)) => Some(raw),
        Some(other) => Some(other.to_string()),
    }
}

impl From<EmailFixture> for EmailMessage {
    fn from(fixture: EmailFixture) -> Self {
        EmailMessage {
            id: fixture.id,
            subject: fixture.subject,
            sender_name: fixture.sender_name,
            sender_address: fixture.sender_address,
            received_at: fixture.received_at,
            body: fixture.body,
            has_attachments: fixture.has_attachments,
            similarity: None,
            extracted_amounts_json: raw_side_field(fixture.extracted_amounts),
            extracted_companies_json: raw_side_field(fixture.extracted_companies),
        }
    }
}

/// Cached emails with optional embeddings
pub struct EmailCorpus {
    messages: Vec<EmailMessage>,
    embeddings: Option<Vec<Vec<f32>>>,
}

impl EmailCorpus {
    /// Create a corpus from messages
    pub fn new(messages: Vec<EmailMessage>) -> Self {
        Self {
            messages,
            embeddings: None,
        }
    }

    /// Parse a JSON array of messages
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let fixtures: Vec<EmailFixture> = serde_json::from_str(json)?;
        Ok(Self::new(fixtures.into_iter().map(EmailMessage::from).collect()))
    }

    /// Load a JSON array of messages from a file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if the corpus is empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Embed every message (subject, sender and body)
    pub fn index_embeddings<E>(&mut self, embedder: &E) -> Result<(), StoreError>
    where
        E: EmbeddingModel,
        E::Error: Display,
    {
        let mut embeddings = Vec::with_capacity(self.messages.len());
        for message in &self.messages {
            let text = format!("{} {} {}", message.subject, message.sender_name, message.body);
            let embedding = embedder
                .embed(&text)
                .map_err(|e| StoreError::Embedding(format!("{}: {}", message.id, e)))?;
            embeddings.push(embedding);
        }
        debug!(messages = embeddings.len(), "Built email embeddings");
        self.embeddings = Some(embeddings);
        Ok(())
    }

    /// Most similar messages received inside `range`
    ///
    /// Messages without a received timestamp are never in range.
    pub fn nearest(
        &self,
        query: &[f32],
        range: &DateRange,
        limit: usize,
    ) -> Result<Vec<EmailMessage>, StoreError> {
        let embeddings = self.embeddings.as_ref().ok_or(StoreError::NotIndexed)?;

        let mut hits: Vec<EmailMessage> = self
            .messages
            .iter()
            .zip(embeddings)
            .filter(|(message, _)| in_range(message, range))
            .map(|(message, embedding)| {
                let mut hit = message.clone();
                hit.similarity = Some(f64::from(cosine_similarity(query, embedding)));
                hit
            })
            .collect();

        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);
        Ok(hits)
    }

    /// Keyword query in mailbox syntax, newest first
    ///
    /// Clauses are joined with `AND`; a `subject:` clause matches the subject
    /// only, any other clause matches subject, body or sender. Quotes are
    /// stripped and matching is case-insensitive.
    pub fn keyword_search(&self, query: &str, range: &DateRange, limit: usize) -> Vec<EmailMessage> {
        let clauses = parse_query(query);
        if clauses.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<EmailMessage> = self
            .messages
            .iter()
            .filter(|message| in_range(message, range))
            .filter(|message| clauses.iter().all(|clause| clause.matches(message)))
            .cloned()
            .collect();

        hits.sort_by(|a, b| b.received_at.cmp(&a.received_at));
        hits.truncate(limit);
        hits
    }
}

fn in_range(message: &EmailMessage, range: &DateRange) -> bool {
    message
        .received_at
        .map(|at| range.contains(at.date()))
        .unwrap_or(false)
}

enum Clause {
    Subject(String),
    Anywhere(String),
}

impl Clause {
    fn matches(&self, message: &EmailMessage) -> bool {
        match self {
            Clause::Subject(term) => message.subject.to_lowercase().contains(term),
            Clause::Anywhere(term) => [
                &message.subject,
                &message.body,
                &message.sender_name,
                &message.sender_address,
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(term)),
        }
    }
}

fn parse_query(query: &str) -> Vec<Clause> {
    query
        .split(" AND ")
        .filter_map(|clause| {
            let clause = clause.trim();
            let (is_subject, term) = match clause.to_lowercase().strip_prefix("subject:") {
                Some(rest) => (true, rest.to_string()),
                None => (false, clause.to_lowercase()),
            };
            let term = term.trim().trim_matches('"').trim().to_string();
            if term.is_empty() {
                None
            } else if is_subject {
                Some(Clause::Subject(term))
            } else {
                Some(Clause::Anywhere(term))
            }
        })
        .collect()
}
