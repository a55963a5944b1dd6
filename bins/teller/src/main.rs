//! Cashbook demo teller.
//!
//! Drives the engine end to end against the in-memory store: deposits and
//! withdrawals with fees, a shortfall covered by a loan, a repayment offer,
//! held check releases, and a void.
//!
//! Usage: cargo run --bin teller

use std::sync::Arc;

use rust_decimal_macros::dec;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use cashbook_core::fees::{
    CashDebitRule, FeeBasis, FeeSchedule, ReprintRule, RushRule, Tier, TieredRule, WaiverPolicy,
};
use cashbook_core::ledger::{
    Decisions, PendingDecision, RepaymentDecision, ShortfallDecision, TransactionRequest,
};
use cashbook_engine::{
    CommitReceipt, LedgerStore, MemoryStore, ProposeOutcome, TransactionComposer,
};
use cashbook_shared::EngineConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cashbook=info,teller=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EngineConfig::load().unwrap_or_default();
    info!(cap = %config.transaction_cap, ttl = config.proposal_ttl_secs, "engine configured");

    let store = Arc::new(MemoryStore::new());
    let composer = TransactionComposer::new(Arc::clone(&store), demo_schedule(), config)?;

    let alice = store.insert_account("ACC-1001", None, dec!(0))?;
    let bob = store.insert_account("ACC-1002", None, dec!(250))?;
    info!(alice = %alice.number, bob = %bob.number, "accounts opened");

    // Plain deposit.
    let receipt = submit(
        &composer,
        TransactionRequest {
            account_id: alice.id,
            credit_cash: dec!(300),
            ..TransactionRequest::default()
        },
        Decisions::default(),
    )
    .await?;
    info!(balance = %receipt.new_balance, "alice deposited 300 cash");

    // Cash withdrawal with the fee applied.
    let receipt = submit(
        &composer,
        TransactionRequest {
            account_id: alice.id,
            debit_cash: vec![dec!(120)],
            apply_fee: true,
            ..TransactionRequest::default()
        },
        Decisions::default(),
    )
    .await?;
    info!(balance = %receipt.new_balance, fee = %receipt.fee.total, memo = %receipt.fee.memo, "alice withdrew 120 (fee waived, quiet account)");

    // Second withdrawal: trailing activity now exceeds the waiver
    // threshold, so the fee sticks.
    let receipt = submit(
        &composer,
        TransactionRequest {
            account_id: alice.id,
            debit_cash: vec![dec!(50)],
            apply_fee: true,
            ..TransactionRequest::default()
        },
        Decisions::default(),
    )
    .await?;
    info!(balance = %receipt.new_balance, fee = %receipt.fee.total, memo = %receipt.fee.memo, "alice withdrew 50");

    // Withdrawal past the balance: the engine reports the gap, the teller
    // covers it with a loan.
    let big_withdrawal = TransactionRequest {
        account_id: alice.id,
        debit_cash: vec![dec!(400)],
        ..TransactionRequest::default()
    };
    let outcome = composer.propose(big_withdrawal).await?;
    if let ProposeOutcome::NeedsDecision {
        proposal_id,
        decision: PendingDecision::Shortfall { amount },
    } = outcome
    {
        info!(shortfall = %amount, "withdrawal exceeds balance; covering with a loan");
        let decisions = Decisions {
            shortfall: Some(ShortfallDecision::CoverWithLoan {
                amount,
                due_date: chrono::Utc::now().date_naive() + chrono::Duration::days(30),
            }),
            ..Decisions::default()
        };
        let receipt = composer.commit(proposal_id, decisions).await?;
        info!(balance = %receipt.new_balance, "withdrawal committed with covering loan");
    }

    // A deposit while the loan is open triggers a repayment offer.
    let deposit = TransactionRequest {
        account_id: alice.id,
        credit_cash: dec!(200),
        ..TransactionRequest::default()
    };
    let outcome = composer.propose(deposit).await?;
    if let ProposeOutcome::NeedsDecision {
        proposal_id,
        decision: PendingDecision::RepaymentOffer { loan },
    } = outcome
    {
        info!(loan = %loan.id, owed = %loan.amount, "deposit while a loan is open; repaying it");
        let decisions = Decisions {
            repayment: Some(RepaymentDecision::RepayLoan(loan.id)),
            ..Decisions::default()
        };
        let receipt = composer.commit(proposal_id, decisions).await?;
        info!(balance = %receipt.new_balance, "deposit committed, loan repaid");
    }

    // Held check deposit and a tagged partial release.
    submit(
        &composer,
        TransactionRequest {
            account_id: bob.id,
            credit_checks: vec![cashbook_core::ledger::CheckDeposit {
                amount: dec!(90),
                check_number: "7001".to_string(),
                counterparty_account: Some("ACC-1001".to_string()),
                on_hold: true,
                hold_tags: vec!["payroll".to_string()],
            }],
            ..TransactionRequest::default()
        },
        Decisions::default(),
    )
    .await?;
    info!("bob deposited a 90 check, held under tag 'payroll'");

    // Tag the held check for the quarterly review as well.
    let held = store.checks_for_account(bob.id).await?;
    let check_id = held
        .first()
        .map(|c| c.id)
        .ok_or_else(|| anyhow::anyhow!("held check not found"))?;
    let check = composer
        .place_hold(check_id, vec!["q3-review".to_string()])
        .await?;
    info!(check = %check.check_number, tags = ?check.tags, "hold tags extended");

    let release = composer
        .release_tagged("payroll", Some(dec!(60)))
        .await?;
    info!(
        credited = %release.total_credited(),
        unallocated = %release.unallocated_budget,
        "partial hold release"
    );
    let release = composer.release_holds(&[check_id]).await?;
    info!(credited = %release.total_credited(), "released the remainder");

    // Void the fee leg from alice's withdrawal.
    let entries = store.entries_for_account(alice.id).await?;
    if let Some(fee_leg) = entries
        .iter()
        .find(|e| e.kind == cashbook_core::ledger::LegKind::Fee)
    {
        let void = composer.void_entry(fee_leg.id).await?;
        info!(adjustment = %void.adjustment, balance = %void.new_balance, "fee leg voided");
    }

    let alice = store
        .account_by_number("ACC-1001")
        .await?
        .ok_or_else(|| anyhow::anyhow!("account ACC-1001 missing"))?;
    let bob = store.account(bob.id).await?;
    info!(alice = %alice.balance, bob = %bob.balance, "final balances");

    Ok(())
}

async fn submit(
    composer: &TransactionComposer<MemoryStore>,
    request: TransactionRequest,
    decisions: Decisions,
) -> anyhow::Result<CommitReceipt> {
    let proposal_id = composer.propose(request).await?.proposal_id();
    Ok(composer.commit(proposal_id, decisions).await?)
}

/// The branch fee schedule the demo runs with.
fn demo_schedule() -> FeeSchedule {
    FeeSchedule {
        enabled: true,
        cash_debit: CashDebitRule {
            enabled: true,
            basis: FeeBasis::Percent(dec!(1)),
            waiver: WaiverPolicy::Conditional {
                threshold: dec!(100),
                window_days: 30,
            },
        },
        check_debit: TieredRule {
            enabled: true,
            tiers: vec![
                flat_tier(dec!(1), dec!(5), dec!(10)),
                flat_tier(dec!(6), dec!(10), dec!(20)),
            ],
        },
        missing_account_credit: TieredRule {
            enabled: true,
            tiers: vec![flat_tier(dec!(1), dec!(10), dec!(1.50))],
        },
        check_reprint: ReprintRule {
            enabled: true,
            fee: dec!(2.50),
        },
        rush: RushRule {
            enabled: true,
            overwrite: true,
            cash_tiers: TieredRule {
                enabled: true,
                tiers: vec![flat_tier(dec!(0), dec!(25000), dec!(7.50))],
            },
            check_tiers: TieredRule {
                enabled: true,
                tiers: vec![flat_tier(dec!(1), dec!(10), dec!(5))],
            },
        },
    }
}

fn flat_tier(
    from: rust_decimal::Decimal,
    to: rust_decimal::Decimal,
    fee: rust_decimal::Decimal,
) -> Tier {
    Tier {
        from,
        to,
        fee: FeeBasis::Flat(fee),
    }
}
