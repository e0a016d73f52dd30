//! Keyword inference for fields the matcher templates don't capture: bank
//! name, counterparty, and a category suggestion.
//!
//! The category table is ordered and the order is load-bearing: inputs can
//! match several rules ("swiggy salary day") and the first rule wins. The
//! same table backs both the extraction-time suggestion and the later guess
//! over user-edited titles, so the two can never disagree.

use regex::Regex;
use std::sync::LazyLock;

/// Fixed bank-name list, matched case-insensitively in order. Specific names
/// come before the generic "Bank" catch-all.
const BANKS: &[&str] = &["HDFC", "ICICI", "SBI", "Axis", "Kotak", "Bank", "State Bank"];

/// Ordered keyword -> category rules.
const CATEGORY_RULES: &[(&[&str], &str)] = &[
    (&["uber", "ola", "taxi"], "Transport"),
    (&["swiggy", "zomato", "restaurant"], "Food"),
    (&["amazon", "flipkart", "shopping"], "Shopping"),
    (&["netflix", "ott", "subscription"], "Entertainment"),
    (&["salary", "payroll"], "Income"),
    (&["emi", "loan"], "EMI"),
    (&["grocery", "bigbazaar"], "Grocery"),
];

pub const DEFAULT_CATEGORY: &str = "Other";

static TO_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bto\s+([A-Za-z0-9&.\- ]{2,40})").expect("to-name regex"));
static FROM_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bfrom\s+([A-Za-z0-9&.\- ]{2,40})").expect("from-name regex")
});

/// First bank from the fixed list that appears anywhere in the text.
pub fn infer_bank(text: &str) -> Option<&'static str> {
    let low = text.to_lowercase();
    BANKS
        .iter()
        .find(|b| low.contains(&b.to_lowercase()))
        .copied()
}

/// Counterparty name: `to <name>` tried before `from <name>`.
pub fn infer_receiver(text: &str) -> Option<String> {
    for re in [&*TO_NAME_RE, &*FROM_NAME_RE] {
        if let Some(caps) = re.captures(text) {
            return Some(caps[1].trim().to_string());
        }
    }
    None
}

fn category_for(haystack: &str) -> String {
    let low = haystack.to_lowercase();
    for (keywords, category) in CATEGORY_RULES {
        if keywords.iter().any(|k| low.contains(k)) {
            return (*category).to_string();
        }
    }
    DEFAULT_CATEGORY.to_string()
}

/// Category suggestion from the full message plus the receiver hint.
pub fn heuristic_category(text: &str, receiver_hint: &str) -> String {
    category_for(&format!("{} {}", text, receiver_hint))
}

/// Same table, same precedence, applied to arbitrary (possibly user-edited)
/// text. Must agree with [`heuristic_category`] for identical inputs.
pub fn guess_category_from_text(text: &str, receiver_hint: Option<&str>) -> String {
    category_for(&format!("{} {}", text, receiver_hint.unwrap_or("")))
}
