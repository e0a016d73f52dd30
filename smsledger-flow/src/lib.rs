//! smsledger-flow: the user-confirmation workflow around a parsed SMS
//! transaction.
//!
//! Takes a `ParsedTransaction` from `smsledger-core`, gates it through the
//! idempotency dedup checkpoint, presents it as a prompt, and on user action
//! resolves the final title/category, remembers the category per
//! counterparty, posts to the remote ledger best-effort, and broadcasts a
//! local commit event.

pub mod dedup;
pub mod ledger;
pub mod memory;
pub mod workflow;

pub use dedup::HandledKeys;
pub use ledger::{HttpLedgerClient, LedgerClient, NullLedger};
pub use memory::{CategoryStore, FileCategoryStore, MemoryCategoryStore, normalize_title};
pub use workflow::{ConfirmationWorkflow, TransactionPrompt};
