//! smsledger-core: pure extraction of structured transactions from bank SMS text.
//!
//! Everything in this crate is synchronous and side-effect free: normalizers,
//! keyword inference, the ordered matcher pipeline, and the idempotency
//! fingerprint. Persistence, networking, and the confirmation flow live in
//! `smsledger-flow`.

pub mod amount;
pub mod dates;
pub mod extract;
pub mod idempotency;
pub mod infer;
pub mod transaction;

pub use amount::normalize_amount;
pub use dates::{resolve_date, scan_date, to_iso_date};
pub use extract::extract;
pub use idempotency::idempotency_key;
pub use infer::{guess_category_from_text, heuristic_category, infer_bank, infer_receiver};
pub use transaction::{
    CommitEvent, CommittedTransaction, Direction, LedgerRecord, LedgerReply, ParsedTransaction,
};
