//! Payment-note line classification
//!
//! Splits a raw note into physical lines and types each one against an
//! ordered marker table. Lines are never merged: a wrapped buyer-order name
//! is matched on its own so that later text-similarity scores are not diluted
//! by unrelated fields.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tally_domain::line::{META_AMOUNT, META_DATE, META_TRANSACTION_ID};
use tally_domain::{LineType, ParsedLine};

/// Marker table; first match wins in declaration order
static LINE_PATTERNS: LazyLock<Vec<(LineType, Regex)>> = LazyLock::new(|| {
    [
        (LineType::BuyerOrderPrimary, r"^BO\s*:"),
        (LineType::BuyerOrderName, r"^BO\s*1\s*:"),
        (LineType::BuyerOrderSecondary, r"^BO\s*[23]\s*:"),
        (LineType::OrderReference, r"^(?:ORDER\s*REF(?:ERENCE)?|ORD\s*REF|OREF)\b"),
        (LineType::SendingPerson, r"^(?:SENDER|SENDING\s*PERSON|SND\s*PER)\b"),
        (LineType::Details, r"^(?:DETAILS|DTLS|PMT\s*DETAILS|REMITTANCE)\b"),
        (LineType::TransactionId, r"^(?:TRID|TRN|TXN\s*ID)\s*:"),
        (LineType::OriginatorBank, r"^(?:ORIG\s*BK|OGB|ORIGINATOR\s*BANK)\b"),
        (LineType::BeneficiaryBank, r"^(?:BNF\s*BK|BENEFICIARY\s*BANK|BBK)\b"),
        (LineType::IntermediaryBank, r"^(?:IBK|INTERMEDIARY)\b"),
        (LineType::BankToBankInfo, r"^(?:BBI|B/B\s*INFO)\b"),
        (LineType::RoutingNumber, r"^(?:ABA|RTN|ROUTING)\b"),
        (LineType::AccountNumber, r"^(?:ACCT|ACCOUNT|A/C)\b"),
        (LineType::ValueDate, r"^(?:VALUE\s*DATE|VAL\s*DT|EFF\s*DATE)\b"),
    ]
    .into_iter()
    .map(|(line_type, pattern)| {
        let regex = Regex::new(&format!("(?i){}", pattern)).expect("valid line pattern");
        (line_type, regex)
    })
    .collect()
});

static TRANSACTION_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bTRID\s*:\s*([A-Z0-9-]+)").expect("valid trid pattern"));

static AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\s*([0-9][0-9,]*(?:\.[0-9]{1,2})?)").expect("valid amount pattern")
});

static DATE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{8})\b").expect("valid date pattern"));

/// Classifies payment-note text into typed lines
#[derive(Debug, Clone, Copy, Default)]
pub struct LineClassifier;

impl LineClassifier {
    /// Create a classifier
    pub fn new() -> Self {
        Self
    }

    /// Split and classify a raw payment note
    ///
    /// Line endings are normalized first (literal `\r\n` / `\n` escapes, CRLF
    /// and bare CR all become LF). Empty lines are dropped; line numbers count
    /// only the lines that are kept.
    pub fn classify(&self, raw_text: &str) -> Vec<ParsedLine> {
        normalize_line_endings(raw_text)
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
            .map(|(index, line)| classify_line(index + 1, line))
            .collect()
    }

    /// Type of a single trimmed line
    pub fn line_type(&self, line: &str) -> LineType {
        detect_type(line.trim())
    }
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\\r\\n", "\n")
        .replace("\\n", "\n")
        .replace("\r\n", "\n")
        .replace('\r', "\n")
}

fn detect_type(line: &str) -> LineType {
    LINE_PATTERNS
        .iter()
        .find(|(_, regex)| regex.is_match(line))
        .map(|(line_type, _)| *line_type)
        .unwrap_or(LineType::Other)
}

fn classify_line(line_number: usize, line: &str) -> ParsedLine {
    let line_type = detect_type(line);
    let search_text = line_type.yields_search_text().then(|| line.to_string());

    ParsedLine {
        line_number,
        raw_text: line.to_string(),
        line_type,
        search_text,
        metadata: extract_metadata(line),
    }
}

fn extract_metadata(line: &str) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();

    if let Some(caps) = TRANSACTION_ID.captures(line) {
        metadata.insert(META_TRANSACTION_ID.to_string(), caps[1].to_string());
    }
    if let Some(caps) = AMOUNT.captures(line) {
        metadata.insert(META_AMOUNT.to_string(), caps[1].replace(',', ""));
    }
    if let Some(caps) = DATE_TOKEN.captures(line) {
        metadata.insert(META_DATE.to_string(), caps[1].to_string());
    }

    metadata
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buyer_order_variants() {
        let classifier = LineClassifier::new();
        assert_eq!(classifier.line_type("BO:219062889 BO1:ACME"), LineType::BuyerOrderPrimary);
        assert_eq!(classifier.line_type("bo : 219062889"), LineType::BuyerOrderPrimary);
        assert_eq!(classifier.line_type("BO1:ACME LLC"), LineType::BuyerOrderName);
        assert_eq!(classifier.line_type("BO2:123 MAIN ST"), LineType::BuyerOrderSecondary);
        assert_eq!(classifier.line_type("BO 3: SPRINGFIELD"), LineType::BuyerOrderSecondary);
    }

    #[test]
    fn test_other_markers() {
        let classifier = LineClassifier::new();
        let cases = [
            ("ORDER REF: PO-7781", LineType::OrderReference),
            ("SENDER: JANE DOE", LineType::SendingPerson),
            ("DETAILS: INV 42", LineType::Details),
            ("REMITTANCE INV 42", LineType::Details),
            ("TRID:998877", LineType::TransactionId),
            ("ORIG BK: FIRST NATIONAL", LineType::OriginatorBank),
            ("BNF BK: SECOND BANK", LineType::BeneficiaryBank),
            ("IBK: CORRESPONDENT", LineType::IntermediaryBank),
            ("BBI: /ACC/", LineType::BankToBankInfo),
            ("ABA 021000021", LineType::RoutingNumber),
            ("ACCT 12345678", LineType::AccountNumber),
            ("VALUE DATE 20240115", LineType::ValueDate),
            ("WIRE TRANSFER CREDIT", LineType::Other),
        ];
        for (line, expected) in cases {
            assert_eq!(classifier.line_type(line), expected, "line: {}", line);
        }
    }

    #[test]
    fn test_first_pattern_wins_over_later_keywords() {
        // Starts with a details marker but also mentions an account
        let classifier = LineClassifier::new();
        assert_eq!(classifier.line_type("DETAILS ACCT 99"), LineType::Details);
    }

    #[test]
    fn test_escaped_and_mixed_line_endings() {
        let classifier = LineClassifier::new();
        let lines = classifier.classify("BO1:ACME\\nTRID:1\r\nDETAILS X\rABA 1\\r\\nOTHER");
        let texts: Vec<_> = lines.iter().map(|l| l.raw_text.as_str()).collect();
        assert_eq!(texts, vec!["BO1:ACME", "TRID:1", "DETAILS X", "ABA 1", "OTHER"]);
        let numbers: Vec<_> = lines.iter().map(|l| l.line_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_blank_lines_dropped_and_trimmed() {
        let classifier = LineClassifier::new();
        let lines = classifier.classify("\n\n   BO1:ACME LLC   \n\n\t\n");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].raw_text, "BO1:ACME LLC");
        assert_eq!(lines[0].search_text.as_deref(), Some("BO1:ACME LLC"));
    }

    #[test]
    fn test_empty_input() {
        assert!(LineClassifier::new().classify("").is_empty());
        assert!(LineClassifier::new().classify("\\n\r\n").is_empty());
    }

    #[test]
    fn test_metadata_extraction() {
        let classifier = LineClassifier::new();
        let lines = classifier.classify("DETAILS TRID: AB-12 PAYMENT $12,500.50 ON 20240115");
        let line = &lines[0];
        assert_eq!(line.meta(META_TRANSACTION_ID), Some("AB-12"));
        assert_eq!(line.meta(META_AMOUNT), Some("12500.50"));
        assert_eq!(line.meta(META_DATE), Some("20240115"));
        // Metadata never changes the search text
        assert_eq!(line.search_text.as_deref(), Some(line.raw_text.as_str()));
    }

    #[test]
    fn test_metadata_on_unsearched_line() {
        let lines = LineClassifier::new().classify("VALUE DATE 20240301");
        assert_eq!(lines[0].search_text, None);
        assert_eq!(lines[0].meta(META_DATE), Some("20240301"));
    }

    #[test]
    fn test_classification_is_deterministic() {
        let classifier = LineClassifier::new();
        let text = "BO:1 BO1:ACME\nSENDER: X\nTRID:9\nRANDOM";
        assert_eq!(classifier.classify(text), classifier.classify(text));
    }
}
