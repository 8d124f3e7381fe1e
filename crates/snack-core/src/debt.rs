//! # Debt Lifecycle (state machine)
//!
//! ```text
//!            add_payment (amount_paid < amount)
//!               ┌──────┐
//!               ▼      │
//!   create ──► PENDING ─┴── add_payment (amount_paid >= amount) ──► PAID
//!                  │                                                ▲
//!                  ├── mark_as_paid (amount_paid unchanged) ─────────┤
//!                  └── settle (amount_paid = amount) ────────────────┘
//! ```
//!
//! Transitions are computed here on plain values; the database crate applies
//! the result with a conditional `UPDATE ... WHERE status = 'pending'`.

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Debt, DebtStatus, OverpaymentPolicy};
use crate::validation;

/// New balance of a debt after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebtState {
    pub amount_paid: Money,
    pub status: DebtStatus,
}

impl DebtState {
    pub fn remaining(&self, amount: Money) -> Money {
        amount.saturating_remaining(self.amount_paid)
    }
}

/// Status implied by a paid amount.
#[inline]
pub fn status_for(amount: Money, amount_paid: Money) -> DebtStatus {
    if amount_paid >= amount {
        DebtStatus::Paid
    } else {
        DebtStatus::Pending
    }
}

/// Applies a payment.
///
/// ## Rules
/// - payment must be positive
/// - a paid debt accepts no further payments
/// - under `Reject`, a payment above the remaining balance fails with
///   `Overpayment`; under `Allow` it is recorded in full
///
/// ## Example
/// ```rust
/// use snack_core::debt::apply_payment;
/// use snack_core::{Debt, DebtStatus, Money, OverpaymentPolicy};
/// # let now = chrono::Utc::now();
/// # let debt = Debt { id: "d".into(), sale_id: "s".into(), amount_cents: 2000,
/// #     amount_paid_cents: 0, status: DebtStatus::Pending, created_at: now, updated_at: now };
///
/// let next = apply_payment(&debt, Money::from_cents(800), OverpaymentPolicy::Reject).unwrap();
/// assert_eq!(next.amount_paid.cents(), 800);
/// assert_eq!(next.status, DebtStatus::Pending);
/// ```
pub fn apply_payment(
    debt: &Debt,
    payment: Money,
    policy: OverpaymentPolicy,
) -> CoreResult<DebtState> {
    validation::validate_payment_amount(payment.cents())?;

    if debt.is_paid() {
        return Err(CoreError::DebtAlreadyPaid(debt.id.clone()));
    }

    let remaining = debt.remaining();
    if policy == OverpaymentPolicy::Reject && payment > remaining {
        return Err(CoreError::Overpayment {
            remaining,
            requested: payment,
        });
    }

    let amount_paid = debt.amount_paid() + payment;
    Ok(DebtState {
        amount_paid,
        status: status_for(debt.amount(), amount_paid),
    })
}

/// Forces the debt to `Paid` without touching `amount_paid`.
///
/// The remainder of such a debt may still read non-zero; the status wins.
pub fn mark_as_paid(debt: &Debt) -> CoreResult<DebtState> {
    if debt.is_paid() {
        return Err(CoreError::DebtAlreadyPaid(debt.id.clone()));
    }
    Ok(DebtState {
        amount_paid: debt.amount_paid(),
        status: DebtStatus::Paid,
    })
}

/// Settles a debt in full: `amount_paid = amount`, status `Paid`.
pub fn settle(debt: &Debt) -> DebtState {
    DebtState {
        amount_paid: debt.amount(),
        status: DebtStatus::Paid,
    }
}

/// Sum of what is still owed across the pending debts.
pub fn total_outstanding<'a>(debts: impl IntoIterator<Item = &'a Debt>) -> Money {
    debts
        .into_iter()
        .filter(|d| !d.is_paid())
        .map(Debt::remaining)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn debt(amount: i64, paid: i64, status: DebtStatus) -> Debt {
        let now = Utc::now();
        Debt {
            id: "d1".into(),
            sale_id: "s1".into(),
            amount_cents: amount,
            amount_paid_cents: paid,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_partial_then_full_payment() {
        let mut d = debt(2000, 0, DebtStatus::Pending);

        let first = apply_payment(&d, Money::from_cents(800), OverpaymentPolicy::Reject).unwrap();
        assert_eq!(first.amount_paid.cents(), 800);
        assert_eq!(first.remaining(d.amount()).cents(), 1200);
        assert_eq!(first.status, DebtStatus::Pending);

        d.amount_paid_cents = first.amount_paid.cents();
        let second = apply_payment(&d, Money::from_cents(1200), OverpaymentPolicy::Reject).unwrap();
        assert_eq!(second.amount_paid.cents(), 2000);
        assert_eq!(second.remaining(d.amount()).cents(), 0);
        assert_eq!(second.status, DebtStatus::Paid);
    }

    #[test]
    fn test_overpayment_policy() {
        let d = debt(2000, 800, DebtStatus::Pending);

        let err = apply_payment(&d, Money::from_cents(1500), OverpaymentPolicy::Reject).unwrap_err();
        match err {
            CoreError::Overpayment { remaining, requested } => {
                assert_eq!(remaining.cents(), 1200);
                assert_eq!(requested.cents(), 1500);
            }
            other => panic!("expected Overpayment, got {other:?}"),
        }

        let allowed = apply_payment(&d, Money::from_cents(1500), OverpaymentPolicy::Allow).unwrap();
        assert_eq!(allowed.amount_paid.cents(), 2300);
        assert_eq!(allowed.status, DebtStatus::Paid);
        assert_eq!(allowed.remaining(d.amount()).cents(), 0);
    }

    #[test]
    fn test_non_positive_payment_rejected() {
        let d = debt(2000, 0, DebtStatus::Pending);
        assert!(matches!(
            apply_payment(&d, Money::zero(), OverpaymentPolicy::Allow),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_paid_debt_rejects_payment_and_mark() {
        let d = debt(2000, 2000, DebtStatus::Paid);
        assert!(matches!(
            apply_payment(&d, Money::from_cents(1), OverpaymentPolicy::Allow),
            Err(CoreError::DebtAlreadyPaid(_))
        ));
        assert!(matches!(mark_as_paid(&d), Err(CoreError::DebtAlreadyPaid(_))));
    }

    #[test]
    fn test_mark_as_paid_keeps_amount_paid() {
        let d = debt(2000, 500, DebtStatus::Pending);
        let state = mark_as_paid(&d).unwrap();
        assert_eq!(state.status, DebtStatus::Paid);
        assert_eq!(state.amount_paid.cents(), 500);
        // phantom remainder survives, status is authoritative
        assert_eq!(state.remaining(d.amount()).cents(), 1500);
    }

    #[test]
    fn test_settle_and_outstanding() {
        let a = debt(2000, 500, DebtStatus::Pending);
        let b = debt(1000, 0, DebtStatus::Pending);
        let c = debt(3000, 0, DebtStatus::Paid);
        assert_eq!(total_outstanding([&a, &b, &c]).cents(), 2500);

        let settled = settle(&a);
        assert_eq!(settled.amount_paid.cents(), 2000);
        assert_eq!(settled.status, DebtStatus::Paid);
    }
}
