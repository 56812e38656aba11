//! Parse labeled summary responses

use regex::Regex;
use std::sync::LazyLock;
use tally_domain::AccountingSummary;
use tracing::warn;

/// Labels requested from the model, in prompt order
pub const LABELS: [&str; 5] = [
    "Cost Center",
    "Company Code",
    "GL Account",
    "Invoice/Reference",
    "Notes",
];

static LABEL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    LABELS
        .iter()
        .map(|label| {
            Regex::new(&format!(
                r"(?im)^[ \t\-*]*\*\*{}\*\*[ \t]*:[ \t]*(.*?)[ \t]*$",
                regex::escape(label)
            ))
            .expect("valid label pattern")
        })
        .collect()
});

/// Position of the free-text label in [`LABELS`]
const NOTES: usize = 4;

/// Start of any bolded `**Label**:` line
static ANY_LABEL_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t\-*]*\*\*[^*\n]+\*\*[ \t]*:").expect("valid label line pattern"));

/// Parse a `**Label**: value` response
///
/// `Not found`, `-` and empty values become absent fields. Notes may run
/// over several lines; the following lines up to the next label are joined
/// with single spaces. A response that contains none of the labels is kept
/// whole as notes.
pub fn parse_summary(response: &str) -> AccountingSummary {
    let mut matched_any = false;
    let mut values: Vec<Option<String>> = Vec::with_capacity(LABELS.len());

    for (position, pattern) in LABEL_PATTERNS.iter().enumerate() {
        match pattern.captures(response) {
            Some(caps) if position == NOTES => {
                matched_any = true;
                let end = caps.get(0).map_or(response.len(), |m| m.end());
                let mut parts = vec![caps[1].trim()];
                parts.extend(continuation_lines(&response[end..]));
                values.push(normalize_value(&parts.join(" ")));
            }
            Some(caps) => {
                matched_any = true;
                values.push(normalize_value(&caps[1]));
            }
            None => values.push(None),
        }
    }

    if !matched_any {
        warn!("Summary response matched no labels, keeping it as notes");
        let raw = response.trim();
        return AccountingSummary {
            notes: (!raw.is_empty()).then(|| raw.to_string()),
            ..AccountingSummary::default()
        };
    }

    let mut values = values.into_iter();
    AccountingSummary {
        cost_center: values.next().flatten(),
        company_code: values.next().flatten(),
        gl_account: values.next().flatten(),
        invoice: values.next().flatten(),
        notes: values.next().flatten(),
    }
}

/// Non-blank lines before the next label line
fn continuation_lines(rest: &str) -> impl Iterator<Item = &str> {
    rest.lines()
        .take_while(|line| !ANY_LABEL_LINE.is_match(line))
        .map(str::trim)
        .filter(|line| !line.is_empty())
}

fn normalize_value(value: &str) -> Option<String> {
    let value = value.trim().trim_matches('*').trim();
    if value.is_empty() || value == "-" || value.eq_ignore_ascii_case("not found") {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_response() {
        let response = "**Cost Center**: CC-100\n\
                        **Company Code**: 1000\n\
                        **GL Account**: 4000-200\n\
                        **Invoice/Reference**: INV-7781\n\
                        **Notes**: Paid in full";
        let summary = parse_summary(response);
        assert_eq!(summary.cost_center.as_deref(), Some("CC-100"));
        assert_eq!(summary.company_code.as_deref(), Some("1000"));
        assert_eq!(summary.gl_account.as_deref(), Some("4000-200"));
        assert_eq!(summary.invoice.as_deref(), Some("INV-7781"));
        assert_eq!(summary.notes.as_deref(), Some("Paid in full"));
    }

    #[test]
    fn test_not_found_values_are_absent() {
        let response = "**Cost Center**: Not found\n\
                        **Company Code**: -\n\
                        **GL Account**: NOT FOUND\n\
                        **Invoice/Reference**: INV-1\n\
                        **Notes**:";
        let summary = parse_summary(response);
        assert_eq!(summary.cost_center, None);
        assert_eq!(summary.company_code, None);
        assert_eq!(summary.gl_account, None);
        assert_eq!(summary.invoice.as_deref(), Some("INV-1"));
        assert_eq!(summary.notes, None);
    }

    #[test]
    fn test_list_markers_and_preamble_tolerated() {
        let response = "Here is what I found:\n\n- **GL Account**: 4000\n* **Invoice/Reference**: PO 55";
        let summary = parse_summary(response);
        assert_eq!(summary.gl_account.as_deref(), Some("4000"));
        assert_eq!(summary.invoice.as_deref(), Some("PO 55"));
        assert_eq!(summary.cost_center, None);
        assert_eq!(summary.notes, None);
    }

    #[test]
    fn test_unlabeled_response_becomes_notes() {
        let summary = parse_summary("  The emails mention invoice 7781 only.  ");
        assert!(!summary.has_structured_fields());
        assert_eq!(summary.notes.as_deref(), Some("The emails mention invoice 7781 only."));
    }

    #[test]
    fn test_empty_value_does_not_swallow_next_line() {
        let summary = parse_summary("**Cost Center**:\n**Company Code**: 1000");
        assert_eq!(summary.cost_center, None);
        assert_eq!(summary.company_code.as_deref(), Some("1000"));
    }

    #[test]
    fn test_notes_continue_over_following_lines() {
        let response = "**Cost Center**: CC-100\n\
                        **Notes**: Paid in two parts.\n\
                        First half on 03/08,\n\
                        \n\
                        remainder on 03/12.";
        let summary = parse_summary(response);
        assert_eq!(summary.cost_center.as_deref(), Some("CC-100"));
        assert_eq!(
            summary.notes.as_deref(),
            Some("Paid in two parts. First half on 03/08, remainder on 03/12.")
        );
    }

    #[test]
    fn test_notes_stop_at_next_label() {
        let response = "**Notes**: Remittance from Hooli\n\
                        see attached advice\n\
                        **Cost Center**: CC-420";
        let summary = parse_summary(response);
        assert_eq!(summary.notes.as_deref(), Some("Remittance from Hooli see attached advice"));
        assert_eq!(summary.cost_center.as_deref(), Some("CC-420"));
    }

    #[test]
    fn test_notes_value_on_next_line() {
        let summary = parse_summary("**Invoice/Reference**: INV-1\n**Notes**:\n  Partial payment");
        assert_eq!(summary.invoice.as_deref(), Some("INV-1"));
        assert_eq!(summary.notes.as_deref(), Some("Partial payment"));
    }

    #[test]
    fn test_empty_response() {
        assert_eq!(parse_summary("   "), AccountingSummary::default());
    }

    #[test]
    fn test_label_match_is_exact() {
        // Unbolded labels do not count
        let summary = parse_summary("Cost Center: CC-1");
        assert_eq!(summary.cost_center, None);
        assert_eq!(summary.notes.as_deref(), Some("Cost Center: CC-1"));
    }
}
