//! Email evidence types

use chrono::{Days, NaiveDate, NaiveDateTime};

/// Inclusive calendar window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// First day included
    pub start: NaiveDate,
    /// Last day included
    pub end: NaiveDate,
}

impl DateRange {
    /// Window of `before` days before and `after` days after `center`
    pub fn around(center: NaiveDate, before: u32, after: u32) -> Self {
        let start = center
            .checked_sub_days(Days::new(u64::from(before)))
            .unwrap_or(NaiveDate::MIN);
        let end = center
            .checked_add_days(Days::new(u64::from(after)))
            .unwrap_or(NaiveDate::MAX);
        Self { start, end }
    }

    /// Check if a date falls inside the window
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// A message as returned by an email collaborator
///
/// The side-fields are raw JSON text written by an earlier extraction job;
/// they are parsed leniently by the rankers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmailMessage {
    /// Collaborator-specific message id
    pub id: String,
    /// Subject line
    pub subject: String,
    /// Sender display name
    pub sender_name: String,
    /// Sender address
    pub sender_address: String,
    /// Received timestamp, if known
    pub received_at: Option<NaiveDateTime>,
    /// Plain-text body
    pub body: String,
    /// Whether the message has attachments
    pub has_attachments: bool,
    /// Similarity reported by an embedding-indexed query, if any
    pub similarity: Option<f64>,
    /// Raw JSON array of amounts extracted earlier
    pub extracted_amounts_json: Option<String>,
    /// Raw JSON array of company names extracted earlier
    pub extracted_companies_json: Option<String>,
}

/// A ranked email supporting a payment
#[derive(Debug, Clone, PartialEq)]
pub struct EmailEvidence {
    /// Message id
    pub id: String,
    /// Combined score clamped to [0, 100]
    pub relevance_score: f64,
    /// Vector similarity (0.0 when the source has none)
    pub similarity: f64,
    /// Amounts parsed from the side-field
    pub extracted_amounts: Vec<f64>,
    /// Company names parsed from the side-field
    pub extracted_companies: Vec<String>,
    /// Subject line
    pub subject: String,
    /// Sender, formatted as `name <address>`
    pub sender: String,
    /// Received timestamp, if known
    pub received_at: Option<NaiveDateTime>,
    /// Plain-text body
    pub body: String,
}
