use std::path::PathBuf;
use thiserror::Error;

/// Reasons a payment (or cancellation) is refused by the ledger.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PaymentRejection {
    #[error("Invoice {invoice} is already paid")]
    AlreadyPaid { invoice: String },

    #[error("Invoice {invoice} is cancelled")]
    InvoiceCancelled { invoice: String },

    #[error("Payment amount must be a finite number greater than zero")]
    InvalidAmount,

    #[error("Payment would exceed invoice balance (max {outstanding:.2} outstanding)")]
    AmountExceedsOutstanding { outstanding: f64 },

    #[error("Amount received is short by {shortfall:.2}")]
    InsufficientAmountReceived { shortfall: f64 },

    #[error("Invoice {invoice} has {count} payment(s) applied and cannot be cancelled")]
    HasPayments { invoice: String, count: usize },
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Config directory not found at {0}. Run 'ledgerline init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write {path}: {source}")]
    StateWrite {
        path: PathBuf,
        #[source]
        source: toml::ser::Error,
    },

    #[error("Failed to parse import file {path}: {source}")]
    ImportParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Client '{0}' not found in clients.toml")]
    ClientNotFound(String),

    #[error("Invoice '{0}' not found")]
    InvoiceNotFound(String),

    #[error("Invoice '{0}' already exists")]
    DuplicateInvoice(String),

    #[error("Invalid invoice index '{0}'. Use 'ledgerline list' to see available invoices.")]
    InvalidInvoiceIndex(String),

    #[error("Invalid {field} value: '{value}'")]
    InvalidArgument { field: &'static str, value: String },

    #[error("Invoice amount must be a finite number greater than zero")]
    InvalidInvoiceAmount,

    #[error(transparent)]
    Rejected(#[from] PaymentRejection),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
