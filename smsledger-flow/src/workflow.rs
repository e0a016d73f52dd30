//! Confirmation state machine.
//!
//! Per idempotency key: `Pending -> Confirmed | Ignored | Committed`, the
//! latter three terminal. A key is registered `Pending` by
//! [`ConfirmationWorkflow::handle_incoming`]; duplicate deliveries of a key
//! that is pending or already handled are dropped at that checkpoint. The two
//! confirming transitions (inline confirm and the full-review commit) share
//! one finalize path so title/category resolution and the category-memory
//! side effect cannot drift apart between entry points.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use smsledger_core::{
    CommitEvent, CommittedTransaction, Direction, ParsedTransaction, guess_category_from_text,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::dedup::HandledKeys;
use crate::ledger::LedgerClient;
use crate::memory::CategoryStore;

/// Bound on the remote ledger call so a hung network can never stall prompt
/// retirement.
const REMOTE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default quick-pick categories offered alongside the suggestion.
const QUICK_PICK_DEFAULTS: &[&str] = &["Food", "Transport", "Shopping", "Bills", "Grocery", "Other"];
const QUICK_PICK_LIMIT: usize = 3;

/// What the notification/UI layer needs to present a pending transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionPrompt {
    pub transaction: ParsedTransaction,
    /// Suggested category plus up to two alternates, deduplicated.
    pub quick_categories: Vec<String>,
}

pub struct ConfirmationWorkflow<S, L> {
    memory: S,
    ledger: L,
    handled: HandledKeys,
    pending: Mutex<HashMap<String, ParsedTransaction>>,
    events: broadcast::Sender<CommitEvent>,
}

impl<S: CategoryStore, L: LedgerClient> ConfirmationWorkflow<S, L> {
    pub fn new(memory: S, ledger: L, handled: HandledKeys) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            memory,
            ledger,
            handled,
            pending: Mutex::new(HashMap::new()),
            events,
        }
    }

    /// Subscribe to locally committed transactions. Consumers must dedupe on
    /// `idempotency_key`; redelivery is possible at this boundary.
    pub fn subscribe(&self) -> broadcast::Receiver<CommitEvent> {
        self.events.subscribe()
    }

    /// Intake: gate an extraction result through the dedup checkpoint and
    /// register it `Pending`. Returns the prompt to present, or `None` for
    /// non-actionable parses and duplicate deliveries (silent skip).
    pub fn handle_incoming(&self, parsed: ParsedTransaction) -> Option<TransactionPrompt> {
        if !parsed.is_actionable() {
            debug!(
                key = %parsed.idempotency_key,
                amount = parsed.amount,
                "parse not actionable, skipping"
            );
            return None;
        }

        let key = parsed.idempotency_key.clone();
        let mut pending = self.pending.lock().expect("pending lock");
        if pending.contains_key(&key) || self.handled.contains(&key) {
            debug!(key = %key, "duplicate delivery dropped");
            return None;
        }

        let quick_categories = quick_categories(&parsed.category_suggestion);
        pending.insert(key, parsed.clone());
        Some(TransactionPrompt {
            transaction: parsed,
            quick_categories,
        })
    }

    /// `Pending -> Confirmed`: the inline notification action, optionally
    /// with an edited title and a reselected category.
    pub async fn confirm(
        &self,
        key: &str,
        edited_title: Option<&str>,
        chosen_category: Option<&str>,
    ) -> Option<CommittedTransaction> {
        self.finalize(key, edited_title, chosen_category).await
    }

    /// `Pending -> Committed`: the full-review entry point. Same resolution
    /// rules and the same category-memory side effect as [`Self::confirm`].
    pub async fn commit_from_review(
        &self,
        key: &str,
        edited_title: Option<&str>,
        chosen_category: Option<&str>,
    ) -> Option<CommittedTransaction> {
        self.finalize(key, edited_title, chosen_category).await
    }

    /// `Pending -> Ignored`: retire the prompt, forward nothing. Returns
    /// false when the key was not pending.
    pub fn ignore(&self, key: &str) -> bool {
        let removed = self
            .pending
            .lock()
            .expect("pending lock")
            .remove(key)
            .is_some();
        if removed {
            self.handled.mark_if_new(key);
            info!(key = %key, "transaction ignored");
        }
        removed
    }

    async fn finalize(
        &self,
        key: &str,
        edited_title: Option<&str>,
        chosen_category: Option<&str>,
    ) -> Option<CommittedTransaction> {
        // Take the pending entry and mark the key handled before any side
        // effects; the loser of a concurrent race gets None here.
        let parsed = self.pending.lock().expect("pending lock").remove(key)?;
        if !self.handled.mark_if_new(key) {
            debug!(key = %key, "key already handled, dropping transition");
            return None;
        }

        let title = resolve_title(edited_title, &parsed);
        let category = resolve_category(chosen_category, &title, &parsed, &self.memory);

        // Future transactions from this counterparty become sticky even if
        // the user never reselects.
        self.memory.put(&title, &category);

        let signed_amount = match parsed.direction {
            Direction::Credit => parsed.amount,
            Direction::Debit | Direction::Unknown => -parsed.amount,
        };
        let committed = CommittedTransaction {
            amount: parsed.amount,
            signed_amount,
            bank: parsed.bank.clone(),
            account: parsed.account.clone(),
            title,
            category,
            date: parsed.date,
            direction: parsed.direction,
            idempotency_key: parsed.idempotency_key.clone(),
        };

        // Best-effort remote post under a bounded timeout. Local state is the
        // source of truth; failure here never reverts the transition.
        match tokio::time::timeout(
            REMOTE_TIMEOUT,
            self.ledger.post_transaction(&committed.ledger_record()),
        )
        .await
        {
            Err(_) => warn!(key = %key, "ledger call timed out"),
            Ok(Err(e)) => warn!(key = %key, error = %e, "ledger call failed"),
            Ok(Ok(reply)) if !reply.success => {
                warn!(key = %key, message = ?reply.message, "ledger rejected transaction")
            }
            Ok(Ok(_)) => info!(key = %key, amount = committed.signed_amount, "ledger accepted"),
        }

        let _ = self.events.send(CommitEvent {
            idempotency_key: committed.idempotency_key.clone(),
            amount: committed.amount,
            title: committed.title.clone(),
            category: committed.category.clone(),
            date: committed.date,
            direction: committed.direction,
        });

        Some(committed)
    }
}

/// Suggested category first, then the defaults, deduplicated and capped.
fn quick_categories(suggestion: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for cat in std::iter::once(suggestion).chain(QUICK_PICK_DEFAULTS.iter().copied()) {
        if cat.is_empty() || out.iter().any(|c| c == cat) {
            continue;
        }
        out.push(cat.to_string());
        if out.len() == QUICK_PICK_LIMIT {
            break;
        }
    }
    out
}

/// Title precedence: edited title, inferred receiver, category suggestion,
/// then a direction-based literal.
fn resolve_title(edited: Option<&str>, parsed: &ParsedTransaction) -> String {
    if let Some(t) = edited {
        if !t.trim().is_empty() {
            return t.trim().to_string();
        }
    }
    if !parsed.receiver.trim().is_empty() {
        return parsed.receiver.trim().to_string();
    }
    if !parsed.category_suggestion.trim().is_empty() {
        return parsed.category_suggestion.trim().to_string();
    }
    match parsed.direction {
        Direction::Credit => "Income".to_string(),
        _ => "Expense".to_string(),
    }
}

/// Category precedence: an explicit user reselection wins outright; otherwise
/// remembered category, then a non-default guess from the resolved title,
/// then the extraction-time suggestion, then "Other".
fn resolve_category<S: CategoryStore>(
    chosen: Option<&str>,
    title: &str,
    parsed: &ParsedTransaction,
    memory: &S,
) -> String {
    if let Some(c) = chosen {
        if !c.trim().is_empty() {
            return c.trim().to_string();
        }
    }
    if let Some(remembered) = memory.get(title) {
        if !remembered.trim().is_empty() {
            return remembered;
        }
    }
    let guessed = guess_category_from_text(title, None);
    if !guessed.is_empty() && guessed != "Other" {
        return guessed;
    }
    if !parsed.category_suggestion.trim().is_empty() {
        return parsed.category_suggestion.trim().to_string();
    }
    "Other".to_string()
}
