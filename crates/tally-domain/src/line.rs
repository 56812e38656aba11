//! Parsed payment-note lines

use std::collections::BTreeMap;
use std::fmt;

/// Type of a payment-note line, decided by its leading marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineType {
    /// `BO:` buyer-order line, usually carrying the payer id and name
    BuyerOrderPrimary,
    /// `BO1:` buyer-order name line
    BuyerOrderName,
    /// `BO2:` / `BO3:` buyer-order address lines
    BuyerOrderSecondary,
    /// Order reference line
    OrderReference,
    /// Sending person marker line
    SendingPerson,
    /// Free-text payment details
    Details,
    /// Transaction id (`TRID:`)
    TransactionId,
    /// Originator bank
    OriginatorBank,
    /// Beneficiary bank
    BeneficiaryBank,
    /// Intermediary bank
    IntermediaryBank,
    /// Bank-to-bank information
    BankToBankInfo,
    /// ABA routing number
    RoutingNumber,
    /// Account number
    AccountNumber,
    /// Value / effective date
    ValueDate,
    /// No pattern matched
    Other,
}

impl LineType {
    /// Whether lines of this type carry match-relevant text
    ///
    /// Composite buyer-order, reference, sender and details lines are
    /// searched whole; bank routing and metadata lines are not searched.
    pub fn yields_search_text(self) -> bool {
        matches!(
            self,
            LineType::BuyerOrderPrimary
                | LineType::BuyerOrderName
                | LineType::BuyerOrderSecondary
                | LineType::OrderReference
                | LineType::SendingPerson
                | LineType::Details
        )
    }

    /// Stable snake_case label
    pub fn as_str(self) -> &'static str {
        match self {
            LineType::BuyerOrderPrimary => "buyer_order_primary",
            LineType::BuyerOrderName => "buyer_order_name",
            LineType::BuyerOrderSecondary => "buyer_order_secondary",
            LineType::OrderReference => "order_reference",
            LineType::SendingPerson => "sending_person",
            LineType::Details => "details",
            LineType::TransactionId => "transaction_id",
            LineType::OriginatorBank => "originator_bank",
            LineType::BeneficiaryBank => "beneficiary_bank",
            LineType::IntermediaryBank => "intermediary_bank",
            LineType::BankToBankInfo => "bank_to_bank_info",
            LineType::RoutingNumber => "routing_number",
            LineType::AccountNumber => "account_number",
            LineType::ValueDate => "value_date",
            LineType::Other => "other",
        }
    }
}

impl fmt::Display for LineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata key for an inline transaction id
pub const META_TRANSACTION_ID: &str = "transaction_id";

/// Metadata key for an inline dollar amount (commas removed)
pub const META_AMOUNT: &str = "amount";

/// Metadata key for an 8-digit date token
pub const META_DATE: &str = "date";

/// One classified line of a payment note
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine {
    /// 1-based position in the note
    pub line_number: usize,

    /// Trimmed line text
    pub raw_text: String,

    /// Classified type
    pub line_type: LineType,

    /// Text to send to the matcher, if any
    pub search_text: Option<String>,

    /// Auxiliary values found in the line; never searched
    pub metadata: BTreeMap<String, String>,
}

impl ParsedLine {
    /// Whether this line should be sent to the matcher
    pub fn is_searchable(&self) -> bool {
        self.search_text.is_some()
    }

    /// Get a metadata value
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}
