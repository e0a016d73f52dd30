//! Currency amount normalization.
//!
//! Bank SMS render amounts with grouping commas and a grab-bag of currency
//! markers ("₹1,234", "Rs.500", "INR 2500.00"). A miss here means "this
//! candidate pattern did not match", so the return type is `Option`, never an
//! error: callers fall through to the next matcher.

/// Parse a raw matched substring into a non-negative amount.
pub fn normalize_amount(raw: &str) -> Option<f64> {
    let mut cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    cleaned = cleaned.replace('₹', "");

    // Strip textual currency prefixes, longest first so "Rs." wins over "Rs".
    let lower = cleaned.to_lowercase();
    for prefix in ["rs.", "inr", "rs"] {
        if lower.starts_with(prefix) {
            cleaned = cleaned[prefix.len()..].to_string();
            break;
        }
    }

    let value: f64 = cleaned.parse().ok()?;
    if value.is_sign_negative() || !value.is_finite() {
        return None;
    }
    Some(value)
}
