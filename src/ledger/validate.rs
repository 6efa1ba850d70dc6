use chrono::NaiveDate;

use super::model::{Invoice, InvoiceStatus, MethodKind, PaymentIntent};
use super::policy::ReconPolicy;
use crate::error::PaymentRejection;

/// A payment amount the ledger has agreed to apply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatedPayment {
    pub accepted_amount: f64,
    /// Balance owed before this payment.
    pub outstanding: f64,
    pub method_kind: MethodKind,
    /// True when the proposed amount was within tolerance of the balance and
    /// was replaced by the exact balance.
    pub snapped: bool,
}

/// Check a proposed payment against the invoice's balance. Pure; nothing is
/// written.
pub fn validate(
    invoice: &Invoice,
    intent: &PaymentIntent,
    today: NaiveDate,
    policy: &ReconPolicy,
) -> Result<ValidatedPayment, PaymentRejection> {
    match invoice.classify(today, policy) {
        InvoiceStatus::Paid => {
            return Err(PaymentRejection::AlreadyPaid {
                invoice: invoice.id.clone(),
            })
        }
        InvoiceStatus::Cancelled => {
            return Err(PaymentRejection::InvoiceCancelled {
                invoice: invoice.id.clone(),
            })
        }
        _ => {}
    }

    if !intent.amount.is_finite() || intent.amount <= 0.0 {
        return Err(PaymentRejection::InvalidAmount);
    }

    // The stored remaining amount may be stale; the balance is always derived.
    let outstanding = invoice.outstanding();
    if intent.amount > outstanding + policy.tolerance {
        return Err(PaymentRejection::AmountExceedsOutstanding { outstanding });
    }

    let snapped = (intent.amount - outstanding).abs() < policy.tolerance;
    let accepted_amount = if snapped { outstanding } else { intent.amount };
    if accepted_amount <= 0.0 {
        return Err(PaymentRejection::InvalidAmount);
    }
    if snapped && intent.amount != outstanding {
        tracing::debug!(
            invoice = %invoice.id,
            proposed = intent.amount,
            outstanding,
            "snapping payment to outstanding balance"
        );
    }

    let method_kind = intent.method.kind(policy);
    if method_kind == MethodKind::CashLike {
        let received = intent.amount_received.unwrap_or(accepted_amount);
        if !received.is_finite() || received < accepted_amount {
            let shortfall = if received.is_finite() {
                accepted_amount - received
            } else {
                accepted_amount
            };
            return Err(PaymentRejection::InsufficientAmountReceived { shortfall });
        }
    }

    Ok(ValidatedPayment {
        accepted_amount,
        outstanding,
        method_kind,
        snapped,
    })
}
