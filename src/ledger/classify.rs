use chrono::{Duration, NaiveDate};

use super::model::{Invoice, InvoiceStatus};
use super::policy::ReconPolicy;

/// The status-bearing fields of an invoice as an upstream source may report
/// them. Several of these overlap and can disagree; `classify` resolves them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusSignals<'a> {
    pub status: Option<&'a str>,
    pub invoice_status: Option<&'a str>,
    pub payment_status: Option<&'a str>,
    pub is_paid: Option<bool>,
    pub payment_date: Option<NaiveDate>,
    pub amount: f64,
    pub paid_amount: f64,
    /// Sum of the recorded payment history; zero when there is none.
    pub history_paid: f64,
    pub due_date: Option<NaiveDate>,
    pub issue_date: Option<NaiveDate>,
}

impl StatusSignals<'_> {
    /// Money received, taking the larger of the reported figure and the history.
    pub fn paid(&self) -> f64 {
        self.paid_amount.max(self.history_paid).max(0.0)
    }

    fn remaining(&self) -> f64 {
        (self.amount - self.paid()).max(0.0)
    }

    fn any_label(&self, matches: fn(&str) -> bool) -> bool {
        [self.status, self.invoice_status, self.payment_status]
            .into_iter()
            .flatten()
            .any(|label| matches(label.trim()))
    }
}

fn is_paid_label(label: &str) -> bool {
    label.eq_ignore_ascii_case("paid") || label.eq_ignore_ascii_case("pagado")
}

fn is_partial_label(label: &str) -> bool {
    label.eq_ignore_ascii_case("partial") || label.eq_ignore_ascii_case("parcial")
}

fn is_cancelled_label(label: &str) -> bool {
    ["cancelled", "canceled", "anulado", "cancelado"]
        .iter()
        .any(|l| label.eq_ignore_ascii_case(l))
}

/// Derive the canonical status from possibly conflicting signals.
///
/// Precedence, highest first:
/// 1. money received with a balance still open is PARTIAL, whatever the flags say
/// 2. an explicit cancellation is CANCELLED
/// 3. any paid marker (label, `is_paid`, settled balance) is PAID; a
///    `payment_date` only counts when nothing says PARTIAL
/// 4. past the effective due date is OVERDUE
/// 5. otherwise PENDING
///
/// Money received is the larger of the reported paid amount and the payment
/// history. A PARTIAL label alone never outweighs the amounts: on an invoice
/// with nothing paid it falls through to the overdue and pending rules.
pub fn classify(signals: &StatusSignals<'_>, today: NaiveDate, policy: &ReconPolicy) -> InvoiceStatus {
    let paid = signals.paid();
    let remaining = signals.remaining();

    if paid > 0.0 && remaining > policy.tolerance {
        return InvoiceStatus::Partial;
    }

    if signals.any_label(is_cancelled_label) {
        return InvoiceStatus::Cancelled;
    }

    // Nothing owed on a zero-value invoice either
    let settled =
        remaining <= policy.tolerance && (paid > 0.0 || signals.amount <= policy.tolerance);
    let dated = signals.payment_date.is_some() && !signals.any_label(is_partial_label);
    if settled || dated || signals.is_paid == Some(true) || signals.any_label(is_paid_label)
    {
        return InvoiceStatus::Paid;
    }

    match effective_due_date(signals.due_date, signals.issue_date, policy) {
        Some(due) if due < today => InvoiceStatus::Overdue,
        _ => InvoiceStatus::Pending,
    }
}

/// The due date, or the issue date plus the overdue fallback when none was set.
pub fn effective_due_date(
    due_date: Option<NaiveDate>,
    issue_date: Option<NaiveDate>,
    policy: &ReconPolicy,
) -> Option<NaiveDate> {
    due_date.or_else(|| {
        issue_date.and_then(|d| d.checked_add_signed(Duration::days(policy.overdue_after_days)))
    })
}

/// Whole days past the effective due date; 0 when not yet due.
pub fn days_overdue(invoice: &Invoice, today: NaiveDate, policy: &ReconPolicy) -> i64 {
    effective_due_date(invoice.due_date, Some(invoice.date), policy)
        .map(|due| (today - due).num_days().max(0))
        .unwrap_or(0)
}

impl Invoice {
    pub fn signals(&self) -> StatusSignals<'_> {
        StatusSignals {
            status: Some(self.status.label()),
            invoice_status: None,
            payment_status: None,
            is_paid: None,
            payment_date: self.payment_date,
            amount: self.amount,
            paid_amount: self.paid_amount,
            history_paid: self.payments.iter().map(|p| p.amount).sum(),
            due_date: self.due_date,
            issue_date: Some(self.date),
        }
    }

    pub fn classify(&self, today: NaiveDate, policy: &ReconPolicy) -> InvoiceStatus {
        classify(&self.signals(), today, policy)
    }
}
