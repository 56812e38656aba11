//! Email relevance scoring
//!
//! Both rankers detect the same signals and differ only in their weight
//! table. The two tables disagree on several identical signals (a company
//! name in the subject is worth 20 in the cached corpus and 50 in a live
//! mailbox); both are kept as-is.

use serde_json::Value;
use tally_domain::{EmailEvidence, EmailMessage};
use tracing::debug;

/// Upper bound of a relevance score
pub const MAX_SCORE: f64 = 100.0;

/// Points per signal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    /// Multiplier applied to vector similarity in `[0, 1]`
    pub similarity: f64,
    /// Company name appears in the subject
    pub company_in_subject: f64,
    /// Company name appears in the body
    pub company_in_body: f64,
    /// Company name matches a previously extracted company
    pub company_in_extracted: f64,
    /// A previously extracted amount is within tolerance of the target
    pub amount_in_extracted: f64,
    /// The formatted amount appears in the subject
    pub amount_in_subject: f64,
    /// The formatted amount appears in the body
    pub amount_in_body: f64,
    /// The message has attachments
    pub has_attachments: f64,
    /// Sender name or address contains the company name
    pub sender_has_company: f64,
}

/// Weights for the cached, embedding-indexed corpus
pub const CACHED_WEIGHTS: ScoreWeights = ScoreWeights {
    similarity: 50.0,
    company_in_subject: 20.0,
    company_in_body: 10.0,
    company_in_extracted: 15.0,
    amount_in_extracted: 20.0,
    amount_in_subject: 0.0,
    amount_in_body: 0.0,
    has_attachments: 0.0,
    sender_has_company: 10.0,
};

/// Weights for a live mailbox, which reports no similarity
pub const LIVE_WEIGHTS: ScoreWeights = ScoreWeights {
    similarity: 0.0,
    company_in_subject: 50.0,
    company_in_body: 30.0,
    company_in_extracted: 0.0,
    amount_in_extracted: 0.0,
    amount_in_subject: 30.0,
    amount_in_body: 20.0,
    has_attachments: 10.0,
    sender_has_company: 20.0,
};

/// Qualifying conditions detected on one message
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Signals {
    /// Vector similarity in `[0, 1]`; zero when unknown
    pub similarity: f64,
    /// See [`ScoreWeights::company_in_subject`]
    pub company_in_subject: bool,
    /// See [`ScoreWeights::company_in_body`]
    pub company_in_body: bool,
    /// See [`ScoreWeights::company_in_extracted`]
    pub company_in_extracted: bool,
    /// See [`ScoreWeights::amount_in_extracted`]
    pub amount_in_extracted: bool,
    /// See [`ScoreWeights::amount_in_subject`]
    pub amount_in_subject: bool,
    /// See [`ScoreWeights::amount_in_body`]
    pub amount_in_body: bool,
    /// See [`ScoreWeights::has_attachments`]
    pub has_attachments: bool,
    /// See [`ScoreWeights::sender_has_company`]
    pub sender_has_company: bool,
}

impl Signals {
    /// Detect every signal for a message
    pub fn detect(
        message: &EmailMessage,
        extracted: &SideFields,
        company: &str,
        amount: Option<f64>,
        tolerance: f64,
    ) -> Self {
        let company = company.trim().to_lowercase();
        let subject = message.subject.to_lowercase();
        let body = message.body.to_lowercase();
        let amount_texts = amount.map(amount_strings).unwrap_or_default();

        Self {
            similarity: message.similarity.unwrap_or(0.0),
            company_in_subject: subject.contains(&company),
            company_in_body: body.contains(&company),
            company_in_extracted: extracted
                .companies
                .iter()
                .any(|name| name.to_lowercase().contains(&company)),
            amount_in_extracted: amount.is_some_and(|target| {
                extracted
                    .amounts
                    .iter()
                    .any(|value| within_tolerance(*value, target, tolerance))
            }),
            amount_in_subject: amount_texts.iter().any(|text| subject.contains(text.as_str())),
            amount_in_body: amount_texts.iter().any(|text| body.contains(text.as_str())),
            has_attachments: message.has_attachments,
            sender_has_company: message.sender_name.to_lowercase().contains(&company)
                || message.sender_address.to_lowercase().contains(&company),
        }
    }

    /// Combined score, clamped to `[0, MAX_SCORE]`
    pub fn score(&self, weights: &ScoreWeights) -> f64 {
        let bonuses = [
            (self.company_in_subject, weights.company_in_subject),
            (self.company_in_body, weights.company_in_body),
            (self.company_in_extracted, weights.company_in_extracted),
            (self.amount_in_extracted, weights.amount_in_extracted),
            (self.amount_in_subject, weights.amount_in_subject),
            (self.amount_in_body, weights.amount_in_body),
            (self.has_attachments, weights.has_attachments),
            (self.sender_has_company, weights.sender_has_company),
        ];

        let base = self.similarity.clamp(0.0, 1.0) * weights.similarity;
        let total = bonuses
            .iter()
            .filter(|(present, _)| *present)
            .fold(base, |acc, (_, points)| acc + points);

        if total.is_nan() {
            0.0
        } else {
            total.clamp(0.0, MAX_SCORE)
        }
    }
}

/// Side-fields parsed from a message's raw JSON
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SideFields {
    /// Previously extracted amounts
    pub amounts: Vec<f64>,
    /// Previously extracted company names
    pub companies: Vec<String>,
}

impl SideFields {
    /// Parse both side-fields of a message; malformed JSON yields empty lists
    pub fn parse(message: &EmailMessage) -> Self {
        Self {
            amounts: parse_amounts(message.extracted_amounts_json.as_deref()),
            companies: parse_companies(message.extracted_companies_json.as_deref()),
        }
    }
}

/// Parse a JSON array of amounts
///
/// Accepts numbers and numeric strings (`"1,250.00"`, `"$99"`); other
/// entries are skipped.
pub fn parse_amounts(raw: Option<&str>) -> Vec<f64> {
    parse_array(raw)
        .iter()
        .filter_map(|value| match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s
                .trim()
                .trim_start_matches('$')
                .replace(',', "")
                .trim()
                .parse::<f64>()
                .ok(),
            _ => None,
        })
        .filter(|amount| amount.is_finite())
        .collect()
}

/// Parse a JSON array of company names; non-strings and blanks are skipped
pub fn parse_companies(raw: Option<&str>) -> Vec<String> {
    parse_array(raw)
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_array(raw: Option<&str>) -> Vec<Value> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Vec::new();
    };

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            debug!("Side-field is not a JSON array, ignoring");
            Vec::new()
        }
        Err(e) => {
            debug!(error = %e, "Malformed side-field JSON, ignoring");
            Vec::new()
        }
    }
}

/// Relative tolerance check
pub fn within_tolerance(value: f64, target: f64, tolerance: f64) -> bool {
    if target == 0.0 {
        return value == 0.0;
    }
    ((value - target) / target).abs() <= tolerance
}

/// Textual forms of an amount searched for in subjects and bodies
///
/// Plain (`1250.00`) and with thousands separators (`1,250.00`).
pub fn amount_strings(amount: f64) -> Vec<String> {
    let plain = format!("{:.2}", amount.abs());
    let (whole, fraction) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let grouped = format!("{}.{}", grouped, fraction);

    if grouped == plain {
        vec![plain]
    } else {
        vec![plain, grouped]
    }
}

/// Build evidence from a scored message
pub fn to_evidence(message: EmailMessage, side_fields: SideFields, relevance_score: f64) -> EmailEvidence {
    let sender = match (message.sender_name.trim(), message.sender_address.trim()) {
        ("", address) => address.to_string(),
        (name, "") => name.to_string(),
        (name, address) => format!("{} <{}>", name, address),
    };

    EmailEvidence {
        id: message.id,
        relevance_score,
        similarity: message.similarity.unwrap_or(0.0),
        extracted_amounts: side_fields.amounts,
        extracted_companies: side_fields.companies,
        subject: message.subject,
        sender,
        received_at: message.received_at,
        body: message.body,
    }
}
