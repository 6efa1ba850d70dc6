pub mod config;
pub mod error;
pub mod ledger;

pub use config::{Client, Company, Config, State};
pub use error::{LedgerError, PaymentRejection, Result};
pub use ledger::{
    apply_payment, cancel, classify, ingest, submit_payment, validate, Invoice, InvoiceStatus,
    PaymentIntent, PaymentOutcome, PendingInvoices, ReconPolicy, TOLERANCE,
};
