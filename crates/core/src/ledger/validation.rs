//! Fail-fast request validation.
//!
//! Validation is effect-free: a rejected request has changed nothing and
//! the caller can fix and resubmit.

use rust_decimal::Decimal;

use cashbook_shared::EngineConfig;
use cashbook_shared::types::AccountId;

use super::error::LedgerError;
use super::types::TransactionRequest;

/// Validates a transaction request against the engine configuration.
///
/// # Errors
///
/// Returns the first violation found: empty request, non-positive leg
/// amount, cap breach, or a self-transfer.
pub fn validate_request(
    request: &TransactionRequest,
    config: &EngineConfig,
) -> Result<(), LedgerError> {
    if request.is_empty() {
        return Err(LedgerError::NothingToDo);
    }

    if request.credit_cash < Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount(request.credit_cash));
    }
    for check in &request.credit_checks {
        ensure_positive(check.amount)?;
    }
    for &amount in &request.debit_cash {
        ensure_positive(amount)?;
    }
    for check in &request.debit_checks {
        ensure_positive(check.amount)?;
    }
    if let Some(transfer) = &request.transfer {
        ensure_positive(transfer.amount)?;
        if transfer.to_account == request.account_id {
            return Err(LedgerError::TransferToSelf);
        }
    }

    let total_credit = request.total_credit();
    if total_credit > config.transaction_cap {
        return Err(LedgerError::CreditCapExceeded {
            total: total_credit,
            cap: config.transaction_cap,
        });
    }
    let total_debit = request.total_debit();
    if total_debit > config.transaction_cap {
        return Err(LedgerError::DebitCapExceeded {
            total: total_debit,
            cap: config.transaction_cap,
        });
    }

    Ok(())
}

fn ensure_positive(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount(amount));
    }
    Ok(())
}

/// Validates a transfer recipient resolved by the caller.
///
/// # Errors
///
/// Returns `TransferTargetNotFound` when the recipient lookup came back
/// empty.
pub fn validate_transfer_target(
    to_account: AccountId,
    found: bool,
) -> Result<(), LedgerError> {
    if found {
        Ok(())
    } else {
        Err(LedgerError::TransferTargetNotFound(to_account))
    }
}
