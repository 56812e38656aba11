//! Confidence normalization
//!
//! Every search backend reports its own raw score. Before candidates from
//! different strategies can be merged they are mapped onto one 0-100 scale.

/// Confidence assigned to a raw score of 0.0
pub const CONFIDENCE_FLOOR: f64 = 60.0;

/// Confidence added between a raw score of 0.0 and 1.0
pub const CONFIDENCE_SPAN: f64 = 35.0;

/// Minimum confidence for a candidate to be reported
pub const MATCH_THRESHOLD: f64 = 85.0;

/// Map a raw similarity or relevance score onto the confidence scale
///
/// `confidence = round(60 + 35 * s, 1 decimal)`, with `s` clamped to
/// `[0, 1]` first so backends that overshoot (or report negative cosine
/// similarity) still land inside `[60, 95]`.
pub fn similarity_to_confidence(score: f64) -> f64 {
    let s = if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };
    round_one_decimal(CONFIDENCE_FLOOR + CONFIDENCE_SPAN * s)
}

/// Round to one decimal place
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
