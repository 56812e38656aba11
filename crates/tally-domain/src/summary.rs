//! Accounting summary extracted from evidence emails

/// Posting fields read out of the top evidence emails
///
/// Each field is absent when the model reported it as not found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountingSummary {
    /// Cost center
    pub cost_center: Option<String>,
    /// Company code
    pub company_code: Option<String>,
    /// General-ledger account
    pub gl_account: Option<String>,
    /// Invoice number or payment reference
    pub invoice: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
}

impl AccountingSummary {
    /// Whether any structured (non-notes) field is present
    pub fn has_structured_fields(&self) -> bool {
        self.cost_center.is_some()
            || self.company_code.is_some()
            || self.gl_account.is_some()
            || self.invoice.is_some()
    }
}
