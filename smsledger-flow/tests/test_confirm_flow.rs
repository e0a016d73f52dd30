use std::sync::Mutex;

use anyhow::{Result, bail};
use smsledger_core::{Direction, LedgerRecord, LedgerReply, extract};
use smsledger_flow::{
    CategoryStore, ConfirmationWorkflow, HandledKeys, LedgerClient, MemoryCategoryStore,
};

/// Fake ledger that records every post and can be told to fail.
struct RecordingLedger {
    posts: Mutex<Vec<LedgerRecord>>,
    fail: bool,
}

impl RecordingLedger {
    fn new(fail: bool) -> Self {
        Self {
            posts: Mutex::new(Vec::new()),
            fail,
        }
    }

    fn posts(&self) -> Vec<LedgerRecord> {
        self.posts.lock().unwrap().clone()
    }
}

impl LedgerClient for RecordingLedger {
    async fn post_transaction(&self, record: &LedgerRecord) -> Result<LedgerReply> {
        self.posts.lock().unwrap().push(record.clone());
        if self.fail {
            bail!("backend unreachable");
        }
        Ok(LedgerReply {
            success: true,
            message: None,
        })
    }
}

const STRUCTURED_SMS: &str = "Sent Rs.500 From HDFC A/C 1234 To Sharma Store On 05/01/24";

#[tokio::test]
async fn test_parse_prompt_confirm_pipeline() {
    let ledger = RecordingLedger::new(false);
    let flow = ConfirmationWorkflow::new(MemoryCategoryStore::new(), &ledger, HandledKeys::in_memory());
    let mut events = flow.subscribe();

    let parsed = extract(STRUCTURED_SMS, "HDFC-BANK", None).unwrap();
    let key = parsed.idempotency_key.clone();

    let prompt = flow.handle_incoming(parsed).unwrap();
    assert_eq!(prompt.quick_categories.len(), 3);
    assert_eq!(prompt.transaction.receiver, "Sharma Store");

    let committed = flow.confirm(&key, None, None).await.unwrap();
    assert_eq!(committed.title, "Sharma Store");
    assert_eq!(committed.direction, Direction::Debit);
    // Uniform sign convention: debits are negative everywhere.
    assert_eq!(committed.signed_amount, -500.0);
    assert_eq!(committed.amount, 500.0);

    let posts = ledger.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].signed_amount, -500.0);
    assert_eq!(posts[0].idempotency_key, key);

    // Local broadcast carries the unsigned magnitude plus direction.
    let event = events.recv().await.unwrap();
    assert_eq!(event.idempotency_key, key);
    assert_eq!(event.amount, 500.0);
    assert_eq!(event.direction, Direction::Debit);
}

#[tokio::test]
async fn test_credit_commits_positive() {
    let ledger = RecordingLedger::new(false);
    let flow = ConfirmationWorkflow::new(MemoryCategoryStore::new(), &ledger, HandledKeys::in_memory());

    let parsed = extract("Your a/c is credited with Rs.2,500.00 salary", "SBI", None).unwrap();
    let key = parsed.idempotency_key.clone();
    flow.handle_incoming(parsed).unwrap();

    let committed = flow.confirm(&key, Some("October salary"), None).await.unwrap();
    assert_eq!(committed.signed_amount, 2500.0);
    assert_eq!(committed.title, "October salary");
    assert_eq!(ledger.posts()[0].signed_amount, 2500.0);
}

#[tokio::test]
async fn test_duplicate_delivery_dropped() {
    let ledger = RecordingLedger::new(false);
    let flow = ConfirmationWorkflow::new(MemoryCategoryStore::new(), &ledger, HandledKeys::in_memory());

    let first = extract(STRUCTURED_SMS, "HDFC-BANK", None).unwrap();
    let second = extract(STRUCTURED_SMS, "HDFC-BANK", None).unwrap();
    assert_eq!(first.idempotency_key, second.idempotency_key);
    let key = first.idempotency_key.clone();

    assert!(flow.handle_incoming(first).is_some());
    // Redelivery while pending is recognized as already-seen.
    assert!(flow.handle_incoming(second.clone()).is_none());

    flow.confirm(&key, None, None).await.unwrap();
    // Redelivery after the terminal transition is also dropped, and a second
    // confirm cannot fire.
    assert!(flow.handle_incoming(second).is_none());
    assert!(flow.confirm(&key, None, None).await.is_none());
    assert_eq!(ledger.posts().len(), 1);
}

#[tokio::test]
async fn test_remote_failure_does_not_block_local_commit() {
    let ledger = RecordingLedger::new(true);
    let flow = ConfirmationWorkflow::new(MemoryCategoryStore::new(), &ledger, HandledKeys::in_memory());
    let mut events = flow.subscribe();

    let parsed = extract(STRUCTURED_SMS, "HDFC-BANK", None).unwrap();
    let key = parsed.idempotency_key.clone();
    flow.handle_incoming(parsed).unwrap();

    let committed = flow.commit_from_review(&key, None, Some("Grocery")).await;
    assert!(committed.is_some(), "local commit must survive remote failure");
    // The committed event is still broadcast so user-visible state stays
    // consistent with the local ledger.
    let event = events.recv().await.unwrap();
    assert_eq!(event.category, "Grocery");
    // And the prompt is retired: no second transition.
    assert!(!flow.ignore(&key));
}

#[tokio::test]
async fn test_category_memory_is_sticky_across_transactions() {
    let ledger = RecordingLedger::new(false);
    let memory = MemoryCategoryStore::new();
    let flow = ConfirmationWorkflow::new(&memory, &ledger, HandledKeys::in_memory());

    let first = extract(STRUCTURED_SMS, "HDFC-BANK", None).unwrap();
    let key = first.idempotency_key.clone();
    flow.handle_incoming(first).unwrap();
    // User reselects Grocery for Sharma Store; the choice is remembered.
    flow.confirm(&key, None, Some("Grocery")).await.unwrap();
    assert_eq!(memory.get("Sharma Store"), Some("Grocery".to_string()));

    // A later transfer to the same counterparty resolves to the remembered
    // category without any user input.
    let later = extract(
        "Sent Rs.120 From HDFC A/C 1234 To Sharma Store On 06/01/24",
        "HDFC-BANK",
        None,
    )
    .unwrap();
    let later_key = later.idempotency_key.clone();
    flow.handle_incoming(later).unwrap();
    let committed = flow.confirm(&later_key, None, None).await.unwrap();
    assert_eq!(committed.category, "Grocery");
}

#[tokio::test]
async fn test_ignore_retires_prompt_and_forwards_nothing() {
    let ledger = RecordingLedger::new(false);
    let flow = ConfirmationWorkflow::new(MemoryCategoryStore::new(), &ledger, HandledKeys::in_memory());

    let parsed = extract(STRUCTURED_SMS, "HDFC-BANK", None).unwrap();
    let key = parsed.idempotency_key.clone();
    flow.handle_incoming(parsed.clone()).unwrap();

    assert!(flow.ignore(&key));
    assert!(ledger.posts().is_empty());
    // Ignored is terminal: the key cannot re-enter Pending or be confirmed.
    assert!(flow.handle_incoming(parsed).is_none());
    assert!(flow.confirm(&key, None, None).await.is_none());
}

#[tokio::test]
async fn test_non_actionable_parse_never_prompts() {
    let ledger = RecordingLedger::new(false);
    let flow = ConfirmationWorkflow::new(MemoryCategoryStore::new(), &ledger, HandledKeys::in_memory());

    // Unknown direction: extraction succeeds with low confidence but the
    // intake gate keeps it away from the user.
    let parsed = extract("Rs 99 balance alert", "VK-ALERT", None).unwrap();
    assert_eq!(parsed.direction, Direction::Unknown);
    assert!(flow.handle_incoming(parsed).is_none());
}
