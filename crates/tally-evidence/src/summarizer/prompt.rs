//! Prompt construction for accounting summaries

use tally_domain::EmailEvidence;

/// Builds the summary prompt from ranked evidence
pub struct SummaryPromptBuilder<'a> {
    company: &'a str,
    amount: Option<f64>,
    emails: &'a [EmailEvidence],
    body_chars: usize,
}

impl<'a> SummaryPromptBuilder<'a> {
    /// Create a builder for a payer and amount
    pub fn new(company: &'a str, amount: Option<f64>) -> Self {
        Self {
            company,
            amount,
            emails: &[],
            body_chars: 2000,
        }
    }

    /// Emails to include, in the given order
    pub fn with_emails(mut self, emails: &'a [EmailEvidence]) -> Self {
        self.emails = emails;
        self
    }

    /// Maximum body characters kept per email
    pub fn with_body_chars(mut self, body_chars: usize) -> Self {
        self.body_chars = body_chars;
        self
    }

    /// Build the complete prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(SUMMARY_INSTRUCTIONS);
        prompt.push_str("\n\n");

        prompt.push_str(&format!("Payer: {}\n", self.company));
        match self.amount {
            Some(amount) => prompt.push_str(&format!("Payment amount: {:.2}\n\n", amount)),
            None => prompt.push_str("Payment amount: unknown\n\n"),
        }

        for (i, email) in self.emails.iter().enumerate() {
            prompt.push_str(&format!("Email {}:\n", i + 1));
            prompt.push_str(&format!("Subject: {}\n", email.subject));
            prompt.push_str(&format!("From: {}\n", email.sender));
            if let Some(received_at) = email.received_at {
                prompt.push_str(&format!("Date: {}\n", received_at.format("%Y-%m-%d %H:%M")));
            }
            if !email.extracted_amounts.is_empty() {
                let amounts: Vec<String> = email
                    .extracted_amounts
                    .iter()
                    .map(|a| format!("{:.2}", a))
                    .collect();
                prompt.push_str(&format!("Extracted amounts: {}\n", amounts.join(", ")));
            }
            if !email.extracted_companies.is_empty() {
                prompt.push_str(&format!(
                    "Extracted companies: {}\n",
                    email.extracted_companies.join(", ")
                ));
            }
            prompt.push_str("Body:\n---\n");
            prompt.push_str(&truncate_chars(&email.body, self.body_chars));
            prompt.push_str("\n---\n\n");
        }

        prompt.push_str(OUTPUT_FORMAT_REMINDER);
        prompt
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

const SUMMARY_INSTRUCTIONS: &str = r#"You are an accounts-receivable assistant.
The emails below were received around the date of an unidentified incoming payment.
Read them and extract the accounting fields needed to post the payment.
Use only information present in the emails. If a field is not mentioned, write Not found."#;

const OUTPUT_FORMAT_REMINDER: &str = r#"Answer with exactly these five lines and nothing else:
**Cost Center**: <value or Not found>
**Company Code**: <value or Not found>
**GL Account**: <value or Not found>
**Invoice/Reference**: <value or Not found>
**Notes**: <one short sentence or Not found>"#;
