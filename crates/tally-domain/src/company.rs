//! Company-name extraction results

/// Where an extracted company name came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanySource {
    /// Parsed from the `BO1:` segment of the buyer-order line
    Pattern,
    /// Returned by the language model from the full note text
    Llm,
}

impl CompanySource {
    /// Fixed confidence assigned to names from this source
    pub fn confidence_percent(self) -> f64 {
        match self {
            CompanySource::Pattern => 95.0,
            CompanySource::Llm => 90.0,
        }
    }

    /// Stable lowercase label
    pub fn as_str(self) -> &'static str {
        match self {
            CompanySource::Pattern => "pattern",
            CompanySource::Llm => "llm",
        }
    }
}

/// A payer name recovered from the note
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyExtraction {
    /// Cleaned payer name
    pub name: String,

    /// Extraction source
    pub source: CompanySource,

    /// Fixed per source; not derived from text similarity
    pub confidence_percent: f64,
}

impl CompanyExtraction {
    /// Create an extraction with the source's fixed confidence
    pub fn new(name: impl Into<String>, source: CompanySource) -> Self {
        Self {
            name: name.into(),
            source,
            confidence_percent: source.confidence_percent(),
        }
    }
}
