mod apply;
mod classify;
mod model;
mod pending;
mod policy;
mod signals;
mod validate;
mod workflow;

pub use apply::{apply_payment, cancel, generate_reference, PaymentOutcome};
pub use classify::{classify, days_overdue, effective_due_date, StatusSignals};
pub use model::{
    Invoice, InvoiceStatus, MethodKind, PaymentIntent, PaymentMethod, PaymentRecord,
};
pub use pending::{PendingEntry, PendingInvoices};
pub use policy::{ReconPolicy, OVERDUE_AFTER_DAYS, TOLERANCE};
pub use signals::{ingest, parse_date, RawInvoice, RawPayment};
pub use validate::{validate, ValidatedPayment};
pub use workflow::submit_payment;
