use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};

use super::classify::{classify, StatusSignals};
use super::model::{Invoice, InvoiceStatus, PaymentMethod, PaymentRecord};
use super::policy::ReconPolicy;
use crate::error::{LedgerError, Result};

/// An invoice as delivered by an upstream billing source. Field names vary
/// between sources, so both snake_case and camelCase spellings are accepted.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RawInvoice {
    #[serde(alias = "_id", alias = "invoiceId", alias = "number")]
    pub id: String,
    #[serde(default, alias = "clientId", alias = "client_id", alias = "clientName")]
    pub client: String,
    #[serde(
        default,
        alias = "issueDate",
        alias = "issue_date",
        alias = "createdAt",
        deserialize_with = "de_opt_date"
    )]
    pub date: Option<NaiveDate>,
    #[serde(default, alias = "dueDate", deserialize_with = "de_opt_date")]
    pub due_date: Option<NaiveDate>,
    #[serde(alias = "total", alias = "totalAmount")]
    pub amount: f64,
    #[serde(default, alias = "paidAmount")]
    pub paid_amount: Option<f64>,
    #[serde(default, alias = "remainingAmount")]
    pub remaining_amount: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "invoiceStatus")]
    pub invoice_status: Option<String>,
    #[serde(default, alias = "paymentStatus")]
    pub payment_status: Option<String>,
    #[serde(default, alias = "isPaid")]
    pub is_paid: Option<bool>,
    #[serde(default, alias = "paymentDate", deserialize_with = "de_opt_date")]
    pub payment_date: Option<NaiveDate>,
    #[serde(default, alias = "paymentHistory", alias = "payments")]
    pub payment_history: Vec<RawPayment>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawPayment {
    pub amount: f64,
    #[serde(deserialize_with = "de_date")]
    pub date: NaiveDate,
    #[serde(default = "unknown_method", alias = "paymentMethod")]
    pub method: String,
    #[serde(default, alias = "transactionId", alias = "transaction_id")]
    pub reference: String,
}

fn unknown_method() -> String {
    "unknown".to_string()
}

/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and naive `YYYY-MM-DDTHH:MM:SS`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
}

fn de_date<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date '{raw}'")))
}

fn de_opt_date<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_date(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{raw}'"))),
    }
}

impl RawInvoice {
    /// The paid amount as reported, else whatever the reported remaining
    /// balance implies.
    fn reported_paid(&self) -> f64 {
        self.paid_amount
            .or_else(|| self.remaining_amount.map(|remaining| self.amount - remaining))
            .unwrap_or(0.0)
    }

    fn history_paid(&self) -> f64 {
        self.payment_history.iter().map(|p| p.amount).sum()
    }

    pub fn signals(&self) -> StatusSignals<'_> {
        StatusSignals {
            status: self.status.as_deref(),
            invoice_status: self.invoice_status.as_deref(),
            payment_status: self.payment_status.as_deref(),
            is_paid: self.is_paid,
            payment_date: self.payment_date,
            amount: self.amount,
            paid_amount: self.reported_paid(),
            history_paid: self.history_paid(),
            due_date: self.due_date,
            issue_date: self.date,
        }
    }
}

/// Turn an upstream record into a canonical invoice. The redundant status
/// fields are read here once and never carried further.
pub fn ingest(raw: &RawInvoice, today: NaiveDate, policy: &ReconPolicy) -> Result<Invoice> {
    if !raw.amount.is_finite() || raw.amount <= 0.0 {
        return Err(LedgerError::InvalidInvoiceAmount);
    }

    let signals = raw.signals();
    let status = classify(&signals, today, policy);

    // A history that outgrew the reported figure wins, and a bare paid flag
    // carries no amounts: it means the whole invoice was settled.
    let paid_amount = match status {
        InvoiceStatus::Paid => raw.amount,
        _ => signals.paid().min(raw.amount),
    };
    if signals.history_paid > signals.paid_amount + policy.tolerance {
        tracing::debug!(
            invoice = %raw.id,
            reported = signals.paid_amount,
            history = signals.history_paid,
            "paid amount behind payment history"
        );
    }

    let remaining_amount = (raw.amount - paid_amount).max(0.0);
    if let Some(reported) = raw.remaining_amount {
        if (reported - remaining_amount).abs() >= policy.tolerance {
            tracing::debug!(
                invoice = %raw.id,
                reported,
                recomputed = remaining_amount,
                "replacing stale remaining amount"
            );
        }
    }

    let payment_date = match status {
        InvoiceStatus::Paid => raw
            .payment_date
            .or_else(|| raw.payment_history.last().map(|p| p.date)),
        InvoiceStatus::Partial => raw.payment_date,
        // An unpaid invoice has no payment date to keep
        _ => None,
    };

    Ok(Invoice {
        id: raw.id.clone(),
        client: raw.client.clone(),
        date: raw.date.unwrap_or(today),
        due_date: raw.due_date,
        amount: raw.amount,
        paid_amount,
        remaining_amount,
        status,
        payment_date,
        payments: raw
            .payment_history
            .iter()
            .map(|p| PaymentRecord {
                amount: p.amount,
                date: p.date,
                method: PaymentMethod::new(p.method.clone()),
                reference: p.reference.clone(),
            })
            .collect(),
    })
}
