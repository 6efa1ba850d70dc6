use chrono::NaiveDate;
use std::cmp::Ordering;

use super::classify::days_overdue;
use super::model::{Invoice, InvoiceStatus};
use super::policy::ReconPolicy;

/// One row of the pending-invoices view.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEntry {
    pub client: String,
    pub invoice: Invoice,
    pub status: InvoiceStatus,
    pub days_overdue: i64,
}

impl PendingEntry {
    fn new(invoice: &Invoice, today: NaiveDate, policy: &ReconPolicy) -> Self {
        Self {
            client: invoice.client.clone(),
            status: invoice.classify(today, policy),
            days_overdue: days_overdue(invoice, today, policy),
            invoice: invoice.clone(),
        }
    }
}

/// Most overdue first, ties by invoice id.
fn view_order(a: &PendingEntry, b: &PendingEntry) -> Ordering {
    b.days_overdue
        .cmp(&a.days_overdue)
        .then_with(|| a.invoice.id.cmp(&b.invoice.id))
}

/// Invoices that still expect money, most overdue first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingInvoices {
    entries: Vec<PendingEntry>,
}

impl PendingInvoices {
    pub fn build<'a>(
        invoices: impl IntoIterator<Item = &'a Invoice>,
        today: NaiveDate,
        policy: &ReconPolicy,
    ) -> Self {
        let mut entries: Vec<PendingEntry> = invoices
            .into_iter()
            .map(|invoice| PendingEntry::new(invoice, today, policy))
            .filter(|entry| entry.status.is_open())
            .collect();
        entries.sort_by(view_order);
        Self { entries }
    }

    pub fn entries(&self) -> &[PendingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&PendingEntry> {
        self.entries.iter().find(|e| e.invoice.id == id)
    }

    /// Fold an updated invoice into the view. Settled or cancelled invoices
    /// leave it; open ones are refreshed where they stand.
    pub fn merge(&mut self, updated: &Invoice, today: NaiveDate, policy: &ReconPolicy) {
        let entry = PendingEntry::new(updated, today, policy);
        let position = self.entries.iter().position(|e| e.invoice.id == updated.id);

        match (position, entry.status.is_open()) {
            (Some(idx), true) => self.entries[idx] = entry,
            (Some(idx), false) => {
                self.entries.remove(idx);
            }
            (None, true) => {
                let idx = self
                    .entries
                    .partition_point(|e| view_order(e, &entry) == Ordering::Less);
                self.entries.insert(idx, entry);
            }
            (None, false) => {}
        }
    }

    pub fn outstanding_total(&self) -> f64 {
        self.entries.iter().map(|e| e.invoice.outstanding()).sum()
    }

    pub fn overdue_total(&self) -> f64 {
        self.entries
            .iter()
            .filter(|e| e.status == InvoiceStatus::Overdue)
            .map(|e| e.invoice.outstanding())
            .sum()
    }
}
