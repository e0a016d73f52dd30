//! Multi-pattern transaction extraction.
//!
//! Matchers are independent pure functions composed via first-success-wins:
//! the first matcher whose anchor fires and whose amount normalizes produces
//! the parse. There is no scoring across matchers and no backtracking into
//! earlier ones. An anchor that fires with an unparseable amount falls
//! through to the next matcher rather than aborting the extraction.
//!
//! New bank templates slot in by adding a function to [`MATCHERS`] without
//! touching the existing ones.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

use crate::amount::normalize_amount;
use crate::dates::{resolve_date, scan_date, to_iso_date};
use crate::idempotency::idempotency_key;
use crate::infer::{heuristic_category, infer_bank, infer_receiver};
use crate::transaction::{Direction, ParsedTransaction};

static SENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)Sent\s+Rs\.?\s*([\d,]+(?:\.\d+)?)[\s,]+From\s+(.+?)\s+A/C\s+\*?(\d+)[\s,]+To\s+(.+?)[\s,]+On\s+(\d{2}/\d{2}/\d{2,4})",
    )
    .expect("sent template regex")
});
static CREDITED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(credited|deposited|paid\s+into|cr\s+by|cr:)\D*([\d,]+(?:\.\d+)?)")
        .expect("credited regex")
});
static DEBITED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(debited|withdrawn|spent|paid|purchase|txn)\D*([\d,]+(?:\.\d+)?)")
        .expect("debited regex")
});
static GENERIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Rs\.?|INR|₹)\s*([\d,]+(?:\.\d+)?)").expect("generic currency regex")
});

/// Broader keyword lists used only to decide direction for the generic
/// currency matcher.
const CREDIT_KEYWORDS: &[&str] = &["credited", "deposit", "salary", "received", "refund", "cr"];
const DEBIT_KEYWORDS: &[&str] = &[
    "debited", "withdrawn", "paid", "purchase", "spent", "txn", "sent", "transfer",
];

/// What to use for the receiver when neither the template nor inference
/// produced a name. Varies per matcher.
#[derive(Debug, Clone, Copy)]
enum ReceiverFallback {
    Sender,
    Literal(&'static str),
}

/// Raw capture of one matcher, before inference fills the gaps.
struct TemplateMatch {
    amount: f64,
    direction: Direction,
    confidence: f64,
    bank: Option<String>,
    account: Option<String>,
    receiver: Option<String>,
    date: Option<NaiveDate>,
    receiver_fallback: ReceiverFallback,
}

/// "Sent Rs X From BANK A/C N To RECEIVER On DATE": everything comes from one
/// template. Always a debit.
fn match_structured_transfer(text: &str) -> Option<TemplateMatch> {
    let caps = SENT_RE.captures(text)?;
    let amount = normalize_amount(&caps[1])?;
    Some(TemplateMatch {
        amount,
        direction: Direction::Debit,
        confidence: 0.95,
        bank: Some(caps[2].trim().to_string()),
        account: Some(caps[3].trim().to_string()),
        receiver: Some(caps[4].trim().to_string()),
        date: to_iso_date(&caps[5]),
        receiver_fallback: ReceiverFallback::Sender,
    })
}

fn match_credited_keyword(text: &str) -> Option<TemplateMatch> {
    let caps = CREDITED_RE.captures(text)?;
    let amount = normalize_amount(&caps[2])?;
    Some(TemplateMatch {
        amount,
        direction: Direction::Credit,
        confidence: 0.85,
        bank: None,
        account: None,
        receiver: None,
        date: None,
        receiver_fallback: ReceiverFallback::Sender,
    })
}

fn match_debited_keyword(text: &str) -> Option<TemplateMatch> {
    let caps = DEBITED_RE.captures(text)?;
    let amount = normalize_amount(&caps[2])?;
    Some(TemplateMatch {
        amount,
        direction: Direction::Debit,
        confidence: 0.85,
        bank: None,
        account: None,
        receiver: None,
        date: None,
        receiver_fallback: ReceiverFallback::Literal("Merchant"),
    })
}

/// Currency marker plus a number with no keyword anchor. Direction comes from
/// scanning the whole message against the broader keyword lists; confidence
/// drops when even those are silent.
fn match_generic_currency(text: &str) -> Option<TemplateMatch> {
    let caps = GENERIC_RE.captures(text)?;
    let amount = normalize_amount(&caps[1])?;
    let direction = decide_direction(text);
    let confidence = if direction == Direction::Unknown { 0.5 } else { 0.7 };
    Some(TemplateMatch {
        amount,
        direction,
        confidence,
        bank: None,
        account: None,
        receiver: None,
        date: None,
        receiver_fallback: ReceiverFallback::Literal("Unknown"),
    })
}

fn decide_direction(text: &str) -> Direction {
    let low = text.to_lowercase();
    if CREDIT_KEYWORDS.iter().any(|k| low.contains(k)) {
        return Direction::Credit;
    }
    if DEBIT_KEYWORDS.iter().any(|k| low.contains(k)) {
        return Direction::Debit;
    }
    Direction::Unknown
}

/// Strict priority order; first success wins.
const MATCHERS: &[fn(&str) -> Option<TemplateMatch>] = &[
    match_structured_transfer,
    match_credited_keyword,
    match_debited_keyword,
    match_generic_currency,
];

/// Extract a transaction from raw SMS text.
///
/// Returns `None` when no matcher fires or no firing matcher yields a
/// normalizable amount. Callers must not synthesize a transaction from
/// partial data.
pub fn extract(
    message: &str,
    sender: &str,
    received_date_hint: Option<NaiveDate>,
) -> Option<ParsedTransaction> {
    let text = message.trim();

    for matcher in MATCHERS {
        let Some(m) = matcher(text) else { continue };

        let date = resolve_date(m.date.or_else(|| scan_date(text)), received_date_hint);
        let bank = m
            .bank
            .or_else(|| infer_bank(text).map(str::to_string))
            .unwrap_or_else(|| sender.to_string());
        let receiver = m
            .receiver
            .or_else(|| infer_receiver(text))
            .unwrap_or_else(|| match m.receiver_fallback {
                ReceiverFallback::Sender => sender.to_string(),
                ReceiverFallback::Literal(s) => s.to_string(),
            });
        let category_suggestion = heuristic_category(text, &receiver);
        let key = idempotency_key(sender, date, m.amount, text);

        return Some(ParsedTransaction {
            amount: m.amount,
            bank,
            account: m.account.unwrap_or_default(),
            receiver,
            date,
            direction: m.direction,
            category_suggestion,
            confidence: m.confidence,
            idempotency_key: key,
        });
    }

    None
}
