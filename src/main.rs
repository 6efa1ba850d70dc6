use chrono::{Datelike, Duration, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tabled::{settings::Style, Table, Tabled};
use tracing_subscriber::EnvFilter;

use ledgerline::config::{
    config_dir, load_clients, load_config, load_state, save_state, State, CLIENTS_TEMPLATE,
    CONFIG_TEMPLATE,
};
use ledgerline::error::{LedgerError, Result};
use ledgerline::ledger::{
    cancel, days_overdue, ingest, parse_date, submit_payment, Invoice, InvoiceStatus,
    PaymentIntent, PendingInvoices, RawInvoice,
};

#[derive(Parser)]
#[command(name = "ledgerline")]
#[command(version, about = "Invoice payment reconciliation and status tracking", long_about = None)]
struct Cli {
    /// Path to config directory (default: ~/.ledgerline or XDG config)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with template files
    Init,

    /// Show a summary of invoices by status
    Status,

    /// Record a new invoice
    Add {
        /// Client identifier from clients.toml
        #[arg(short, long)]
        client: String,

        /// Invoice total
        #[arg(short, long)]
        amount: f64,

        /// Issue date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,

        /// Due date (YYYY-MM-DD, default: issue date + due_days)
        #[arg(long)]
        due: Option<String>,
    },

    /// Import invoices exported by another billing system (JSON array)
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },

    /// List invoices
    List {
        /// Number of invoices to show (default: all)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Filter by status (pending, partial, paid, overdue, cancelled)
        #[arg(long)]
        status: Option<String>,
    },

    /// Record a payment against an invoice
    Pay {
        /// Invoice number or index from 'list' (e.g., 1 or INV-2026-0001)
        invoice: String,

        /// Payment amount
        amount: f64,

        /// Payment method (e.g., cash, card, transfer)
        #[arg(short, long, default_value = "transfer")]
        method: String,

        /// Amount handed over, for cash payments
        #[arg(long)]
        received: Option<f64>,

        /// Mark as a partial payment
        #[arg(long)]
        partial: bool,

        /// Transaction reference (default: generated)
        #[arg(long)]
        reference: Option<String>,

        /// Payment date (default: today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Pay the full outstanding balance of an invoice
    Settle {
        /// Invoice number or index from 'list'
        invoice: String,

        /// Payment method (e.g., cash, card, transfer)
        #[arg(short, long, default_value = "transfer")]
        method: String,

        /// Amount handed over, for cash payments
        #[arg(long)]
        received: Option<f64>,

        /// Payment date (default: today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Show payment history for an invoice
    Payments {
        /// Invoice number or index from 'list'
        invoice: String,
    },

    /// Show invoices still awaiting payment
    Pending {
        /// Only show invoices for this client
        #[arg(short, long)]
        client: Option<String>,
    },

    /// Cancel an invoice that has no payments
    Cancel {
        /// Invoice number or index from 'list'
        invoice: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("LEDGERLINE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Determine config directory
    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };

    if !matches!(cli.command, Commands::Init) && !cfg_dir.exists() {
        return Err(LedgerError::ConfigNotFound(cfg_dir));
    }

    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::Status => cmd_status(&cfg_dir),
        Commands::Add {
            client,
            amount,
            date,
            due,
        } => cmd_add(&cfg_dir, &client, amount, date, due),
        Commands::Import { file } => cmd_import(&cfg_dir, &file),
        Commands::List { limit, status } => cmd_list(&cfg_dir, limit, status),
        Commands::Pay {
            invoice,
            amount,
            method,
            received,
            partial,
            reference,
            date,
        } => {
            let mut intent = PaymentIntent::new(amount, method);
            intent.is_partial = partial;
            intent.amount_received = received;
            intent.reference = reference;
            cmd_pay(&cfg_dir, &invoice, intent, date)
        }
        Commands::Settle {
            invoice,
            method,
            received,
            date,
        } => cmd_settle(&cfg_dir, &invoice, method, received, date),
        Commands::Payments { invoice } => cmd_payments(&cfg_dir, &invoice),
        Commands::Pending { client } => cmd_pending(&cfg_dir, client),
        Commands::Cancel { invoice } => cmd_cancel(&cfg_dir, &invoice),
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn parse_date_arg(field: &'static str, value: Option<String>) -> Result<Option<NaiveDate>> {
    value
        .map(|s| parse_date(&s).ok_or(LedgerError::InvalidArgument { field, value: s }))
        .transpose()
}

/// Initialize config directory with template files
fn cmd_init(cfg_dir: &PathBuf) -> Result<()> {
    use std::fs;

    if cfg_dir.exists() {
        return Err(LedgerError::AlreadyInitialized(cfg_dir.clone()));
    }

    fs::create_dir_all(cfg_dir)?;
    fs::write(cfg_dir.join("config.toml"), CONFIG_TEMPLATE)?;
    fs::write(cfg_dir.join("clients.toml"), CLIENTS_TEMPLATE)?;

    println!("Initialized ledgerline config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Edit your company details:  $EDITOR {}/config.toml",
        cfg_dir.display()
    );
    println!(
        "  2. Add your clients:           $EDITOR {}/clients.toml",
        cfg_dir.display()
    );
    println!();
    println!("Then record your first invoice:");
    println!("  ledgerline add --client <client-id> --amount <total>");

    Ok(())
}

// Table row structs for tabled
#[derive(Tabled)]
struct InvoiceRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "NUMBER")]
    number: String,
    #[tabled(rename = "DATE")]
    date: String,
    #[tabled(rename = "TOTAL")]
    total: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "CLIENT")]
    client: String,
}

#[derive(Tabled)]
struct PaymentRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "DATE")]
    date: String,
    #[tabled(rename = "AMOUNT")]
    amount: String,
    #[tabled(rename = "METHOD")]
    method: String,
    #[tabled(rename = "REFERENCE")]
    reference: String,
}

#[derive(Tabled)]
struct PendingRow {
    #[tabled(rename = "NUMBER")]
    number: String,
    #[tabled(rename = "CLIENT")]
    client: String,
    #[tabled(rename = "DUE")]
    due: String,
    #[tabled(rename = "OUTSTANDING")]
    outstanding: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "DAYS OVERDUE")]
    days_overdue: i64,
}

/// Two decimals with thousands separators, e.g. `$1,250.00`
fn format_money(value: f64, currency_symbol: &str) -> String {
    let cents = (value * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();

    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}{currency_symbol}{grouped}.{:02}", cents % 100)
}

/// Append summary rows under a rounded table, lined up with the column at
/// `value_col`. Columns left of it merge into the label cell, columns right of
/// it are closed off.
fn add_summary_footer(table: &str, value_col: usize, rows: &[(&str, String)]) -> String {
    let lines: Vec<&str> = table.lines().collect();
    let Some(inner) = lines
        .first()
        .and_then(|top| top.strip_prefix('╭'))
        .and_then(|s| s.strip_suffix('╮'))
    else {
        return table.to_string();
    };

    let widths: Vec<usize> = inner.split('┬').map(|p| p.chars().count()).collect();
    if rows.is_empty() || lines.len() < 4 || value_col == 0 || value_col >= widths.len() {
        return table.to_string();
    }

    let bar = |width: usize| "─".repeat(width);
    let join = |cols: &[usize]| cols.iter().map(|w| bar(*w)).collect::<Vec<_>>().join("┴");
    let label_width = widths[..value_col].iter().sum::<usize>() + value_col - 1;
    let value_width = widths[value_col];

    let trailing = &widths[value_col + 1..];
    let joint = if trailing.is_empty() {
        format!("├{}┼{}┤", join(&widths[..value_col]), bar(value_width))
    } else {
        format!(
            "├{}┼{}┼{}╯",
            join(&widths[..value_col]),
            bar(value_width),
            join(trailing)
        )
    };

    // Drop the original bottom border
    let mut out: Vec<String> = lines[..lines.len() - 1]
        .iter()
        .map(|line| line.to_string())
        .collect();
    out.push(joint);

    for (idx, (label, value)) in rows.iter().enumerate() {
        if idx > 0 {
            out.push(format!("├{}┼{}┤", bar(label_width), bar(value_width)));
        }
        out.push(format!(
            "│ {:>lw$} │ {:>vw$} │",
            label,
            value,
            lw = label_width - 2,
            vw = value_width - 2
        ));
    }
    out.push(format!("╰{}┴{}╯", bar(label_width), bar(value_width)));

    out.join("\n")
}

/// Format invoice number from template
fn format_invoice_number(format: &str, year: u32, seq: u32) -> String {
    format
        .replace("{year}", &year.to_string())
        .replace("{seq:04}", &format!("{:04}", seq))
        .replace("{seq:05}", &format!("{:05}", seq))
        .replace("{seq:03}", &format!("{:03}", seq))
}

/// Resolve an invoice reference to the actual invoice number.
/// Accepts either an index (1-based) from 'list' or the full invoice number.
fn resolve_invoice_number(state: &State, reference: &str) -> Result<String> {
    if let Ok(idx) = reference.parse::<usize>() {
        if idx == 0 {
            return Err(LedgerError::InvalidInvoiceIndex(reference.to_string()));
        }
        // Invoices are listed newest first, 1-indexed
        return state
            .invoices
            .iter()
            .rev()
            .nth(idx - 1)
            .map(|inv| inv.id.clone())
            .ok_or_else(|| LedgerError::InvalidInvoiceIndex(reference.to_string()));
    }

    if state.find(reference).is_some() {
        Ok(reference.to_string())
    } else {
        Err(LedgerError::InvoiceNotFound(reference.to_string()))
    }
}

fn find_invoice<'a>(state: &'a State, reference: &str) -> Result<&'a Invoice> {
    let number = resolve_invoice_number(state, reference)?;
    state
        .find(&number)
        .ok_or(LedgerError::InvoiceNotFound(number))
}

/// Show invoice summary
fn cmd_status(cfg_dir: &PathBuf) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let clients = load_clients(cfg_dir)?;
    let state = load_state(cfg_dir)?;
    let policy = &config.reconciliation;
    let symbol = &config.billing.currency_symbol;
    let today = today();

    let current_year = today.year() as u32;
    let next_number = format_invoice_number(
        &config.billing.number_format,
        current_year,
        state.next_sequence(current_year),
    );

    let count = |status: InvoiceStatus| {
        state
            .invoices
            .iter()
            .filter(|inv| inv.classify(today, policy) == status)
            .count()
    };
    let pending = PendingInvoices::build(&state.invoices, today, policy);

    println!("Ledger Status");
    println!("{}", "-".repeat(50));
    println!("Config directory: {}", cfg_dir.display());
    println!("Company:          {}", config.company.name);
    println!("Clients:          {}", clients.len());
    println!("Invoices:         {}", state.invoices.len());
    println!("  Pending:        {}", count(InvoiceStatus::Pending));
    println!("  Partial:        {}", count(InvoiceStatus::Partial));
    println!("  Overdue:        {}", count(InvoiceStatus::Overdue));
    println!("  Paid:           {}", count(InvoiceStatus::Paid));
    println!("  Cancelled:      {}", count(InvoiceStatus::Cancelled));
    println!(
        "Outstanding:      {}",
        format_money(pending.outstanding_total(), symbol)
    );
    println!("Next invoice:     {}", next_number);

    Ok(())
}

/// Record a new invoice
fn cmd_add(
    cfg_dir: &PathBuf,
    client_id: &str,
    amount: f64,
    date: Option<String>,
    due: Option<String>,
) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(LedgerError::InvalidInvoiceAmount);
    }

    let config = load_config(cfg_dir)?;
    let clients = load_clients(cfg_dir)?;
    let mut state = load_state(cfg_dir)?;

    let client = clients
        .get(client_id)
        .ok_or_else(|| LedgerError::ClientNotFound(client_id.to_string()))?;

    let issue_date = parse_date_arg("--date", date)?.unwrap_or_else(today);
    let due_date = match parse_date_arg("--due", due)? {
        Some(d) => d,
        None => issue_date
            .checked_add_signed(Duration::days(config.billing.due_days as i64))
            .unwrap_or(issue_date),
    };

    let year = issue_date.year() as u32;
    let seq = state.next_sequence(year);
    let number = format_invoice_number(&config.billing.number_format, year, seq);
    if state.find(&number).is_some() {
        return Err(LedgerError::DuplicateInvoice(number));
    }

    state
        .invoices
        .push(Invoice::new(&number, client_id, issue_date, Some(due_date), amount));
    state.counter.last_number = seq;
    state.counter.last_year = year;
    save_state(cfg_dir, &state)?;

    println!("Recorded {}", number);
    println!("  Client: {}", client.name);
    println!(
        "  Total:  {}",
        format_money(amount, &config.billing.currency_symbol)
    );
    println!("  Due:    {}", due_date);

    Ok(())
}

/// Import invoices from an upstream JSON export
fn cmd_import(cfg_dir: &PathBuf, file: &PathBuf) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let mut state = load_state(cfg_dir)?;
    let policy = &config.reconciliation;
    let today = today();

    let content = std::fs::read_to_string(file)?;
    let records: Vec<RawInvoice> =
        serde_json::from_str(&content).map_err(|e| LedgerError::ImportParse {
            path: file.clone(),
            source: e,
        })?;

    // Ingest everything before touching state so a bad record imports nothing
    let mut imported = Vec::with_capacity(records.len());
    for raw in &records {
        if state.find(&raw.id).is_some() || imported.iter().any(|i: &Invoice| i.id == raw.id) {
            return Err(LedgerError::DuplicateInvoice(raw.id.clone()));
        }
        imported.push(ingest(raw, today, policy)?);
    }

    for invoice in &imported {
        println!("  {} - {} - {}", invoice.id, invoice.client, invoice.status);
    }
    let count = imported.len();
    state.invoices.extend(imported);
    save_state(cfg_dir, &state)?;

    println!("Imported {} invoice(s)", count);
    Ok(())
}

/// List invoices with derived status
fn cmd_list(cfg_dir: &PathBuf, limit: Option<usize>, status: Option<String>) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let state = load_state(cfg_dir)?;
    let policy = &config.reconciliation;
    let symbol = &config.billing.currency_symbol;
    let today = today();

    let status_filter = match status {
        Some(s) => Some(InvoiceStatus::parse_filter(&s).ok_or(LedgerError::InvalidArgument {
            field: "--status",
            value: s,
        })?),
        None => None,
    };

    if state.invoices.is_empty() {
        println!("No invoices recorded yet.");
        return Ok(());
    }

    let invoices: Vec<_> = state
        .invoices
        .iter()
        .rev()
        .enumerate()
        .map(|(idx, inv)| (idx, inv, inv.classify(today, policy)))
        .filter(|(_, _, derived)| status_filter.map_or(true, |f| *derived == f))
        .collect();
    let invoices = match limit {
        Some(n) => &invoices[..n.min(invoices.len())],
        None => &invoices[..],
    };

    if invoices.is_empty() {
        println!("No invoices match the given filters.");
        return Ok(());
    }

    let shown_total: f64 = invoices
        .iter()
        .filter(|(_, _, derived)| *derived != InvoiceStatus::Cancelled)
        .map(|(_, inv, _)| inv.amount)
        .sum();
    let shown_paid: f64 = invoices.iter().map(|(_, inv, _)| inv.paid_amount).sum();
    let summary = [
        ("TOTAL", format_money(shown_total, symbol)),
        ("(-) PAID", format_money(shown_paid, symbol)),
        (
            "(=) OUTSTANDING",
            format_money((shown_total - shown_paid).max(0.0), symbol),
        ),
    ];
    // Row totals are padded so the summary figures fit the same column
    let width = summary
        .iter()
        .map(|(_, v)| v.chars().count())
        .max()
        .unwrap_or(0);

    let rows: Vec<InvoiceRow> = invoices
        .iter()
        .map(|(idx, inv, derived)| InvoiceRow {
            index: idx + 1,
            number: inv.id.clone(),
            date: inv.date.to_string(),
            total: format!("{:>width$}", format_money(inv.amount, symbol)),
            status: derived.to_string(),
            client: inv.client.clone(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    let table = add_summary_footer(&table, 3, &summary);

    println!("{table}");
    println!();
    println!("Total: {} invoices", state.invoices.len());
    println!("Use index number with pay/settle/payments/cancel (e.g., 'ledgerline pay 1 100')");

    Ok(())
}

/// Record a payment against an invoice
fn cmd_pay(
    cfg_dir: &PathBuf,
    invoice_ref: &str,
    intent: PaymentIntent,
    date: Option<String>,
) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let mut state = load_state(cfg_dir)?;
    let policy = &config.reconciliation;
    let symbol = &config.billing.currency_symbol;
    let paid_on = parse_date_arg("--date", date)?.unwrap_or_else(today);

    let invoice = find_invoice(&state, invoice_ref)?;
    let outcome = submit_payment(invoice, &intent, today(), paid_on, policy)?;
    let applied = outcome
        .invoice
        .payments
        .last()
        .map(|p| p.amount)
        .unwrap_or(intent.amount);

    if outcome.is_fully_paid() {
        println!(
            "Recorded {} payment for {} (fully paid)",
            format_money(applied, symbol),
            outcome.invoice.id
        );
    } else {
        println!(
            "Recorded {} payment for {} ({} remaining)",
            format_money(applied, symbol),
            outcome.invoice.id,
            format_money(outcome.invoice.remaining_amount, symbol)
        );
    }
    if let Some(change) = outcome.change {
        println!("Change due: {}", format_money(change, symbol));
    }

    state.replace(outcome.invoice);
    save_state(cfg_dir, &state)?;

    Ok(())
}

fn cmd_settle(
    cfg_dir: &PathBuf,
    invoice_ref: &str,
    method: String,
    received: Option<f64>,
    date: Option<String>,
) -> Result<()> {
    let state = load_state(cfg_dir)?;
    let invoice = find_invoice(&state, invoice_ref)?;

    let mut intent = PaymentIntent::settle(invoice, method);
    intent.amount_received = received;
    let number = invoice.id.clone();
    cmd_pay(cfg_dir, &number, intent, date)
}

/// Show payment history for an invoice
fn cmd_payments(cfg_dir: &PathBuf, invoice_ref: &str) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let state = load_state(cfg_dir)?;
    let symbol = &config.billing.currency_symbol;
    let invoice = find_invoice(&state, invoice_ref)?;

    println!("Payments for {}", invoice.id);

    if invoice.payments.is_empty() {
        println!("  No payments recorded.");
    } else {
        let rows: Vec<PaymentRow> = invoice
            .payments
            .iter()
            .enumerate()
            .map(|(idx, p)| PaymentRow {
                index: idx + 1,
                date: p.date.to_string(),
                amount: format_money(p.amount, symbol),
                method: p.method.to_string(),
                reference: p.reference.clone(),
            })
            .collect();

        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("{table}");
    }

    println!(
        "Total paid: {} / {} (Status: {})",
        format_money(invoice.paid_amount, symbol),
        format_money(invoice.amount, symbol),
        invoice.classify(today(), &config.reconciliation)
    );

    Ok(())
}

/// Show invoices still awaiting payment
fn cmd_pending(cfg_dir: &PathBuf, client: Option<String>) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let state = load_state(cfg_dir)?;
    let policy = &config.reconciliation;
    let symbol = &config.billing.currency_symbol;
    let today = today();

    let pending = PendingInvoices::build(
        state
            .invoices
            .iter()
            .filter(|inv| client.as_deref().map_or(true, |c| inv.client == c)),
        today,
        policy,
    );

    if pending.is_empty() {
        println!("No pending invoices.");
        return Ok(());
    }

    let rows: Vec<PendingRow> = pending
        .entries()
        .iter()
        .map(|entry| PendingRow {
            number: entry.invoice.id.clone(),
            client: entry.client.clone(),
            due: entry
                .invoice
                .due_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
            outstanding: format_money(entry.invoice.outstanding(), symbol),
            status: entry.status.to_string(),
            days_overdue: days_overdue(&entry.invoice, today, policy),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
    println!();
    println!(
        "Outstanding: {} ({} overdue)",
        format_money(pending.outstanding_total(), symbol),
        format_money(pending.overdue_total(), symbol)
    );

    Ok(())
}

/// Cancel an invoice
fn cmd_cancel(cfg_dir: &PathBuf, invoice_ref: &str) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let mut state = load_state(cfg_dir)?;
    let invoice = find_invoice(&state, invoice_ref)?;

    let cancelled = cancel(invoice, today(), &config.reconciliation)?;
    println!("Cancelled {}", cancelled.id);

    state.replace(cancelled);
    save_state(cfg_dir, &state)?;

    Ok(())
}
