use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::policy::ReconPolicy;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceStatus {
    Pending,
    Partial,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "PENDING",
            InvoiceStatus::Partial => "PARTIAL",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Overdue => "OVERDUE",
            InvoiceStatus::Cancelled => "CANCELLED",
        }
    }

    /// Open invoices still expect money and belong in the pending view.
    pub fn is_open(&self) -> bool {
        !matches!(self, InvoiceStatus::Paid | InvoiceStatus::Cancelled)
    }

    /// Parse a status filter as typed on the command line.
    pub fn parse_filter(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "pending" => Some(InvoiceStatus::Pending),
            "partial" => Some(InvoiceStatus::Partial),
            "paid" => Some(InvoiceStatus::Paid),
            "overdue" => Some(InvoiceStatus::Overdue),
            "cancelled" | "canceled" => Some(InvoiceStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Payment method identifier as entered by the user or upstream system.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct PaymentMethod(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// Money handed over physically; needs an amount received and change.
    CashLike,
    Other,
}

impl PaymentMethod {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self, policy: &ReconPolicy) -> MethodKind {
        if policy
            .cash_methods
            .iter()
            .any(|m| m.eq_ignore_ascii_case(self.0.trim()))
        {
            MethodKind::CashLike
        } else {
            MethodKind::Other
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One applied payment. Entries are only ever appended.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PaymentRecord {
    pub amount: f64,
    pub date: NaiveDate,
    pub method: PaymentMethod,
    pub reference: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Invoice {
    pub id: String,
    pub client: String,
    /// Issue date
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub amount: f64,
    #[serde(default)]
    pub paid_amount: f64,
    #[serde(default)]
    pub remaining_amount: f64,
    pub status: InvoiceStatus,
    /// Set when the invoice becomes PAID; kept for consumers that only look at this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub payments: Vec<PaymentRecord>,
}

impl Invoice {
    /// A freshly issued invoice with nothing paid.
    pub fn new(
        id: impl Into<String>,
        client: impl Into<String>,
        date: NaiveDate,
        due_date: Option<NaiveDate>,
        amount: f64,
    ) -> Self {
        Self {
            id: id.into(),
            client: client.into(),
            date,
            due_date,
            amount,
            paid_amount: 0.0,
            remaining_amount: amount,
            status: InvoiceStatus::Pending,
            payment_date: None,
            payments: Vec::new(),
        }
    }

    /// Balance still owed, recomputed from the ledger fields.
    pub fn outstanding(&self) -> f64 {
        (self.amount - self.paid_amount).max(0.0)
    }
}

/// A proposed payment against one invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntent {
    pub amount: f64,
    pub method: PaymentMethod,
    pub is_partial: bool,
    /// Only meaningful for cash-like methods.
    pub amount_received: Option<f64>,
    pub reference: Option<String>,
}

impl PaymentIntent {
    pub fn new(amount: f64, method: impl Into<String>) -> Self {
        Self {
            amount,
            method: PaymentMethod::new(method),
            is_partial: false,
            amount_received: None,
            reference: None,
        }
    }

    /// Intent to settle the whole outstanding balance of `invoice`.
    pub fn settle(invoice: &Invoice, method: impl Into<String>) -> Self {
        Self::new(invoice.outstanding(), method)
    }

    pub fn partial(mut self) -> Self {
        self.is_partial = true;
        self
    }

    pub fn with_received(mut self, received: f64) -> Self {
        self.amount_received = Some(received);
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}
