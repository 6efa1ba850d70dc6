use chrono::NaiveDate;
use uuid::Uuid;

use super::model::{Invoice, InvoiceStatus, MethodKind, PaymentIntent, PaymentRecord};
use super::policy::ReconPolicy;
use super::validate::ValidatedPayment;
use crate::error::PaymentRejection;

/// Result of applying a payment. `invoice` is a new snapshot; the caller
/// persists it.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOutcome {
    pub invoice: Invoice,
    pub status: InvoiceStatus,
    /// Change owed back for cash-like payments; not stored on the invoice.
    pub change: Option<f64>,
}

impl PaymentOutcome {
    pub fn is_fully_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }
}

/// Generate a transaction reference for payments submitted without one.
pub fn generate_reference() -> String {
    format!("TXN-{}", Uuid::new_v4().simple())
}

/// Apply an already validated payment to `invoice`.
///
/// Not idempotent: calling it twice records the payment twice.
pub fn apply_payment(
    invoice: &Invoice,
    payment: &ValidatedPayment,
    intent: &PaymentIntent,
    paid_on: NaiveDate,
    policy: &ReconPolicy,
) -> PaymentOutcome {
    let mut updated = invoice.clone();

    let paid_amount = (invoice.paid_amount + payment.accepted_amount).min(invoice.amount);
    let remaining_amount = (invoice.amount - paid_amount).max(0.0);
    let fully_paid = remaining_amount <= policy.tolerance;

    // A payment that leaves only drift behind settles the exact balance, so the
    // history always sums to the paid amount.
    let amount = if fully_paid {
        invoice.outstanding()
    } else {
        payment.accepted_amount
    };
    if amount != payment.accepted_amount {
        tracing::debug!(
            invoice = %invoice.id,
            accepted = payment.accepted_amount,
            recorded = amount,
            "recording settled balance"
        );
    }

    if fully_paid && intent.is_partial {
        tracing::debug!(
            invoice = %invoice.id,
            "partial payment settles the balance; marking paid"
        );
    }

    updated.paid_amount = if fully_paid { invoice.amount } else { paid_amount };
    updated.remaining_amount = if fully_paid { 0.0 } else { remaining_amount };
    updated.status = if fully_paid {
        InvoiceStatus::Paid
    } else {
        InvoiceStatus::Partial
    };
    if fully_paid {
        updated.payment_date = Some(paid_on);
    }

    let reference = intent
        .reference
        .clone()
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(generate_reference);
    updated.payments.push(PaymentRecord {
        amount,
        date: paid_on,
        method: intent.method.clone(),
        reference,
    });

    let change = match payment.method_kind {
        MethodKind::CashLike => {
            let received = intent.amount_received.unwrap_or(amount);
            Some((received - amount).max(0.0))
        }
        MethodKind::Other => None,
    };

    tracing::info!(
        invoice = %updated.id,
        amount,
        status = %updated.status,
        remaining = updated.remaining_amount,
        "payment applied"
    );

    PaymentOutcome {
        status: updated.status,
        invoice: updated,
        change,
    }
}

/// Move an unpaid invoice to CANCELLED. Invoices that already took money stay
/// as they are; cancelling twice is a no-op.
pub fn cancel(
    invoice: &Invoice,
    today: NaiveDate,
    policy: &ReconPolicy,
) -> Result<Invoice, PaymentRejection> {
    match invoice.classify(today, policy) {
        InvoiceStatus::Cancelled => return Ok(invoice.clone()),
        InvoiceStatus::Paid => {
            return Err(PaymentRejection::AlreadyPaid {
                invoice: invoice.id.clone(),
            })
        }
        _ => {}
    }

    if !invoice.payments.is_empty() || invoice.paid_amount > 0.0 {
        return Err(PaymentRejection::HasPayments {
            invoice: invoice.id.clone(),
            count: invoice.payments.len(),
        });
    }

    let mut updated = invoice.clone();
    updated.status = InvoiceStatus::Cancelled;
    tracing::info!(invoice = %updated.id, "invoice cancelled");
    Ok(updated)
}
