use chrono::NaiveDate;

use super::apply::{apply_payment, PaymentOutcome};
use super::model::{Invoice, PaymentIntent};
use super::policy::ReconPolicy;
use super::validate::validate;
use crate::error::PaymentRejection;

/// Validate and apply a payment, then re-derive the status of the result.
///
/// `today` drives classification; `paid_on` is only written to the payment
/// history, so a backdated payment is still checked against today's state.
/// `invoice` must be a fresh read; concurrent submissions against the same
/// invoice have to be serialized by the caller.
pub fn submit_payment(
    invoice: &Invoice,
    intent: &PaymentIntent,
    today: NaiveDate,
    paid_on: NaiveDate,
    policy: &ReconPolicy,
) -> Result<PaymentOutcome, PaymentRejection> {
    let validated = validate(invoice, intent, today, policy)?;
    let mut outcome = apply_payment(invoice, &validated, intent, paid_on, policy);

    let status = outcome.invoice.classify(today, policy);
    if status != outcome.status {
        tracing::warn!(
            invoice = %outcome.invoice.id,
            applied = %outcome.status,
            derived = %status,
            "status disagreement after payment"
        );
        outcome.invoice.status = status;
        outcome.status = status;
    }

    Ok(outcome)
}
