//! Content-derived transaction fingerprint.
//!
//! The key is a hash of the fields that define the underlying event, not a
//! random or monotonic id: however many times the transport redelivers the
//! same SMS, it hashes to the same key, so dedup needs nothing but key
//! equality.

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

/// Characters of the message that participate in the fingerprint.
const SNIPPET_CHARS: usize = 120;

/// Lowercase SHA-256 hex over `(sender, iso date, amount to 2dp, message
/// snippet)`.
pub fn idempotency_key(sender: &str, date: NaiveDate, amount: f64, message: &str) -> String {
    let snippet: String = message.trim().chars().take(SNIPPET_CHARS).collect();
    let raw = format!(
        "{}|{}|{:.2}|{}",
        sender.trim().to_lowercase(),
        date.format("%Y-%m-%d"),
        amount,
        snippet
    );
    let digest = Sha256::digest(raw.as_bytes());
    hex::encode(digest)
}
