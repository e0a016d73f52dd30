//! Transaction types shared across extraction, confirmation, and the ledger
//! boundary.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Whether a transaction increases or decreases the user's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "credit")]
    Credit,
    #[serde(rename = "debit")]
    Debit,
    #[serde(rename = "unknown")]
    Unknown,
}

/// One extraction attempt's result. Amount is magnitude only; the sign is
/// carried by `direction` until commit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedTransaction {
    pub amount: f64,
    /// Empty when the bank could not be determined.
    pub bank: String,
    /// Empty when the message carried no account fragment.
    pub account: String,
    /// Best-effort counterparty name.
    pub receiver: String,
    pub date: NaiveDate,
    pub direction: Direction,
    /// Heuristic guess, defaults to "Other".
    pub category_suggestion: String,
    /// 0.0..=1.0, how certain the matcher pipeline is about this parse.
    pub confidence: f64,
    /// Content-derived fingerprint; identical redeliveries share it.
    pub idempotency_key: String,
}

impl ParsedTransaction {
    /// A parse is worth prompting the user about only when the direction is
    /// known and the amount is a real positive number.
    pub fn is_actionable(&self) -> bool {
        self.amount > 0.0 && self.direction != Direction::Unknown
    }
}

/// The final, user-approved record. This is the only shape handed to the
/// remote ledger and to local consumers.
///
/// Sign convention (uniform everywhere): `signed_amount` is positive for
/// Credit and negative otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommittedTransaction {
    pub amount: f64,
    pub signed_amount: f64,
    pub bank: String,
    pub account: String,
    pub title: String,
    pub category: String,
    pub date: NaiveDate,
    pub direction: Direction,
    pub idempotency_key: String,
}

impl CommittedTransaction {
    pub fn ledger_record(&self) -> LedgerRecord {
        LedgerRecord {
            signed_amount: self.signed_amount,
            bank: self.bank.clone(),
            account: self.account.clone(),
            receiver: self.title.clone(),
            category: self.category.clone(),
            date: self.date,
            idempotency_key: self.idempotency_key.clone(),
        }
    }
}

/// Wire shape accepted by the remote ledger service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub signed_amount: f64,
    pub bank: String,
    pub account: String,
    pub receiver: String,
    pub category: String,
    pub date: NaiveDate,
    pub idempotency_key: String,
}

/// Wire shape returned by the remote ledger service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerReply {
    pub success: bool,
    pub message: Option<String>,
}

/// Event broadcast locally once a transaction is committed. Consumers must
/// dedupe on `idempotency_key`; redelivery is possible at this boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitEvent {
    pub idempotency_key: String,
    /// Unsigned magnitude; pair with `direction` to render a sign.
    pub amount: f64,
    pub title: String,
    pub category: String,
    pub date: NaiveDate,
    pub direction: Direction,
}
