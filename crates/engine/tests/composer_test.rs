//! End-to-end tests for the two-phase submit, voids, and atomicity.

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use cashbook_core::fees::{CashDebitRule, FeeBasis, FeeSchedule, WaiverPolicy};
use cashbook_core::ledger::{
    Decisions, EntryStatus, LegKind, PendingDecision, ShortfallDecision, TransactionRequest,
    TransferLeg,
};
use cashbook_engine::{LedgerStore, MemoryStore, ProposeOutcome, TransactionComposer};
use cashbook_shared::{EngineConfig, EngineError};

fn composer(store: Arc<MemoryStore>) -> TransactionComposer<MemoryStore> {
    TransactionComposer::new(store, FeeSchedule::disabled(), EngineConfig::default()).unwrap()
}

fn flat_fee_schedule(fee: Decimal) -> FeeSchedule {
    let mut schedule = FeeSchedule::disabled();
    schedule.enabled = true;
    schedule.cash_debit = CashDebitRule {
        enabled: true,
        basis: FeeBasis::Flat(fee),
        waiver: WaiverPolicy::AlwaysCharge,
    };
    schedule
}

fn due_date() -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(2026, 12, 1).unwrap()
}

async fn propose_ready(
    composer: &TransactionComposer<MemoryStore>,
    request: TransactionRequest,
) -> cashbook_shared::types::ProposalId {
    match composer.propose(request).await.unwrap() {
        ProposeOutcome::Ready(summary) => summary.proposal_id,
        ProposeOutcome::NeedsDecision { decision, .. } => {
            panic!("unexpected decision request: {decision:?}")
        }
    }
}

#[tokio::test]
async fn test_deposit_commits_and_moves_balance() {
    let store = Arc::new(MemoryStore::new());
    let account = store.insert_account("ACC-1", None, dec!(100)).unwrap();
    let composer = composer(Arc::clone(&store));

    let request = TransactionRequest {
        account_id: account.id,
        credit_cash: dec!(50),
        ..TransactionRequest::default()
    };
    let id = propose_ready(&composer, request).await;
    let receipt = composer.commit(id, Decisions::default()).await.unwrap();

    assert_eq!(receipt.new_balance, dec!(150));
    assert_eq!(receipt.entries.len(), 1);
    assert_eq!(receipt.entries[0].kind, LegKind::Credit);
    assert_eq!(store.account(account.id).await.unwrap().balance, dec!(150));
}

#[tokio::test]
async fn test_commit_is_all_or_nothing() {
    let store = Arc::new(MemoryStore::new());
    let account = store.insert_account("ACC-1", None, dec!(100)).unwrap();
    let composer = composer(Arc::clone(&store));

    let request = TransactionRequest {
        account_id: account.id,
        credit_cash: dec!(40),
        debit_cash: vec![dec!(10)],
        ..TransactionRequest::default()
    };
    let id = propose_ready(&composer, request).await;

    store.fail_next_apply();
    let err = composer.commit(id, Decisions::default()).await.unwrap_err();
    assert!(err.is_retryable());

    // Nothing landed: no entries, balance untouched.
    assert_eq!(store.account(account.id).await.unwrap().balance, dec!(100));
    assert!(
        store
            .entries_for_account(account.id)
            .await
            .unwrap()
            .is_empty()
    );

    // The proposal survives a failed apply; the retry succeeds.
    let receipt = composer.commit(id, Decisions::default()).await.unwrap();
    assert_eq!(receipt.new_balance, dec!(130));
    assert_eq!(
        store
            .entries_for_account(account.id)
            .await
            .unwrap()
            .len(),
        2
    );
}

#[tokio::test]
async fn test_committed_proposal_cannot_commit_twice() {
    let store = Arc::new(MemoryStore::new());
    let account = store.insert_account("ACC-1", None, dec!(100)).unwrap();
    let composer = composer(Arc::clone(&store));

    let request = TransactionRequest {
        account_id: account.id,
        credit_cash: dec!(50),
        ..TransactionRequest::default()
    };
    let id = propose_ready(&composer, request).await;
    composer.commit(id, Decisions::default()).await.unwrap();

    assert!(matches!(
        composer.commit(id, Decisions::default()).await,
        Err(EngineError::NotFound(_))
    ));
    assert_eq!(store.account(account.id).await.unwrap().balance, dec!(150));
}

#[tokio::test]
async fn test_proposal_expires_after_ttl() {
    let store = Arc::new(MemoryStore::new());
    let account = store.insert_account("ACC-1", None, dec!(100)).unwrap();
    let config = EngineConfig {
        proposal_ttl_secs: 1,
        ..EngineConfig::default()
    };
    let composer =
        TransactionComposer::new(Arc::clone(&store), FeeSchedule::disabled(), config).unwrap();

    let request = TransactionRequest {
        account_id: account.id,
        credit_cash: dec!(50),
        ..TransactionRequest::default()
    };
    let id = propose_ready(&composer, request).await;

    tokio::time::sleep(std::time::Duration::from_millis(1200)).await;

    assert!(matches!(
        composer.commit(id, Decisions::default()).await,
        Err(EngineError::NotFound(_))
    ));
    // The expired proposal changed nothing.
    assert_eq!(store.account(account.id).await.unwrap().balance, dec!(100));
}

#[tokio::test]
async fn test_shortfall_decided_at_commit() {
    let store = Arc::new(MemoryStore::new());
    let account = store.insert_account("ACC-1", None, dec!(30)).unwrap();
    let composer = composer(Arc::clone(&store));

    let request = TransactionRequest {
        account_id: account.id,
        debit_cash: vec![dec!(50)],
        ..TransactionRequest::default()
    };

    // Propose reports the gap and parks the request.
    let (id, shortfall) = match composer.propose(request).await.unwrap() {
        ProposeOutcome::NeedsDecision {
            proposal_id,
            decision: PendingDecision::Shortfall { amount },
        } => (proposal_id, amount),
        other => panic!("expected shortfall, got {other:?}"),
    };
    assert_eq!(shortfall, dec!(20));

    // Committing without a decision fails and keeps the proposal alive.
    assert!(matches!(
        composer.commit(id, Decisions::default()).await,
        Err(EngineError::Validation(_))
    ));
    assert_eq!(store.account(account.id).await.unwrap().balance, dec!(30));

    // Commit with the covering loan folds everything into one batch.
    let decisions = Decisions {
        shortfall: Some(ShortfallDecision::CoverWithLoan {
            amount: shortfall,
            due_date: due_date(),
        }),
        ..Decisions::default()
    };
    let receipt = composer.commit(id, decisions).await.unwrap();

    assert_eq!(receipt.new_balance, Decimal::ZERO);
    let loans = store.open_loans(account.id).await.unwrap();
    assert_eq!(loans.len(), 1);
    assert_eq!(loans[0].amount, dec!(20));
    // Disbursement and withdrawal both present, tied together by the commit.
    assert_eq!(receipt.entries.len(), 2);
    assert!(receipt.entries.iter().any(|e| e.related_loan.is_some()));
}

#[tokio::test]
async fn test_transfer_moves_both_balances() {
    let store = Arc::new(MemoryStore::new());
    let source = store.insert_account("ACC-1", None, dec!(100)).unwrap();
    let target = store.insert_account("ACC-2", None, dec!(10)).unwrap();
    let composer = composer(Arc::clone(&store));

    let request = TransactionRequest {
        account_id: source.id,
        transfer: Some(TransferLeg {
            to_account: target.id,
            amount: dec!(25),
        }),
        ..TransactionRequest::default()
    };
    let id = propose_ready(&composer, request).await;
    composer.commit(id, Decisions::default()).await.unwrap();

    assert_eq!(store.account(source.id).await.unwrap().balance, dec!(75));
    assert_eq!(store.account(target.id).await.unwrap().balance, dec!(35));

    let mirrored = store.entries_for_account(target.id).await.unwrap();
    assert_eq!(mirrored.len(), 1);
    assert_eq!(mirrored[0].kind, LegKind::TransferIn);
}

#[tokio::test]
async fn test_fee_charged_and_recorded() {
    let store = Arc::new(MemoryStore::new());
    let account = store.insert_account("ACC-1", None, dec!(100)).unwrap();
    let composer = TransactionComposer::new(
        Arc::clone(&store),
        flat_fee_schedule(dec!(3)),
        EngineConfig::default(),
    )
    .unwrap();

    let request = TransactionRequest {
        account_id: account.id,
        debit_cash: vec![dec!(50)],
        apply_fee: true,
        ..TransactionRequest::default()
    };

    let preview = composer.fee_preview(&request).await.unwrap();
    assert_eq!(preview.total, dec!(3.00));

    let id = propose_ready(&composer, request).await;
    let receipt = composer.commit(id, Decisions::default()).await.unwrap();

    assert_eq!(receipt.new_balance, dec!(47.00));
    let fee_leg = receipt
        .entries
        .iter()
        .find(|e| e.kind == LegKind::Fee)
        .unwrap();
    assert_eq!(fee_leg.amount, dec!(3.00));
    assert!(fee_leg.audit.get("components").is_some());
}

#[tokio::test]
async fn test_reload_schedule_applies_to_new_commits() {
    let store = Arc::new(MemoryStore::new());
    let account = store.insert_account("ACC-1", None, dec!(100)).unwrap();
    let composer = composer(Arc::clone(&store));

    let request = TransactionRequest {
        account_id: account.id,
        debit_cash: vec![dec!(50)],
        apply_fee: true,
        ..TransactionRequest::default()
    };
    assert_eq!(
        composer.fee_preview(&request).await.unwrap().total,
        Decimal::ZERO
    );

    composer.reload_schedule(flat_fee_schedule(dec!(5))).unwrap();
    assert_eq!(
        composer.fee_preview(&request).await.unwrap().total,
        dec!(5.00)
    );
}

#[tokio::test]
async fn test_reload_rejects_malformed_schedule() {
    let store = Arc::new(MemoryStore::new());
    let composer = composer(store);

    let mut bad = FeeSchedule::disabled();
    bad.check_reprint.fee = dec!(-1);
    assert!(matches!(
        composer.reload_schedule(bad),
        Err(EngineError::Configuration(_))
    ));
}

#[tokio::test]
async fn test_void_reverses_and_never_deletes() {
    let store = Arc::new(MemoryStore::new());
    let account = store.insert_account("ACC-1", None, dec!(100)).unwrap();
    let composer = composer(Arc::clone(&store));

    let request = TransactionRequest {
        account_id: account.id,
        credit_cash: dec!(50),
        ..TransactionRequest::default()
    };
    let id = propose_ready(&composer, request).await;
    let receipt = composer.commit(id, Decisions::default()).await.unwrap();
    let entry_id = receipt.entries[0].id;

    let void = composer.void_entry(entry_id).await.unwrap();
    assert_eq!(void.adjustment, dec!(-50));
    assert_eq!(void.new_balance, dec!(100));

    // The entry is still there, marked voided with an audit note.
    let entries = store.entries_for_account(account.id).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, EntryStatus::Voided);
    assert!(entries[0].audit.get("void_note").is_some());

    // A second void must not double-credit.
    assert!(composer.void_entry(entry_id).await.is_err());
    assert_eq!(store.account(account.id).await.unwrap().balance, dec!(100));
}

#[tokio::test]
async fn test_empty_request_rejected_at_propose() {
    let store = Arc::new(MemoryStore::new());
    let account = store.insert_account("ACC-1", None, dec!(100)).unwrap();
    let composer = composer(store);

    let request = TransactionRequest {
        account_id: account.id,
        ..TransactionRequest::default()
    };
    assert!(matches!(
        composer.propose(request).await,
        Err(EngineError::Validation(_))
    ));
}

#[tokio::test]
async fn test_cap_enforced_at_propose() {
    let store = Arc::new(MemoryStore::new());
    let account = store.insert_account("ACC-1", None, dec!(0)).unwrap();
    let composer = composer(store);

    let request = TransactionRequest {
        account_id: account.id,
        credit_cash: dec!(25000.01),
        ..TransactionRequest::default()
    };
    assert!(matches!(
        composer.propose(request).await,
        Err(EngineError::Validation(_))
    ));
}
