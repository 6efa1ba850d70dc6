mod client;
mod settings;
mod state;

pub use client::Client;
pub use settings::{BillingSettings, Company, Config};
pub use state::{Counter, State};

use crate::error::{LedgerError, Result};
use directories::ProjectDirs;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Get the config directory path (~/.ledgerline/)
pub fn config_dir() -> Result<PathBuf> {
    // First try XDG-style directories
    if let Some(proj_dirs) = ProjectDirs::from("", "", "ledgerline") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    // Fallback to ~/.ledgerline/
    let home = std::env::var_os("HOME").map(PathBuf::from).ok_or_else(|| {
        LedgerError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".ledgerline"))
}

/// Load the main config.toml
pub fn load_config(config_dir: &PathBuf) -> Result<Config> {
    let path = config_dir.join("config.toml");
    if !path.exists() {
        return Err(LedgerError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| LedgerError::ConfigParse { path, source: e })
}

/// Load clients.toml as a HashMap
pub fn load_clients(config_dir: &PathBuf) -> Result<HashMap<String, Client>> {
    let path = config_dir.join("clients.toml");
    if !path.exists() {
        return Err(LedgerError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| LedgerError::ConfigParse { path, source: e })
}

/// Load state.toml (creates default if missing)
pub fn load_state(config_dir: &PathBuf) -> Result<State> {
    let path = config_dir.join("state.toml");
    if !path.exists() {
        return Ok(State::default());
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| LedgerError::ConfigParse { path, source: e })
}

/// Save state.toml
pub fn save_state(config_dir: &PathBuf, state: &State) -> Result<()> {
    let path = config_dir.join("state.toml");
    let content = toml::to_string_pretty(state)
        .map_err(|e| LedgerError::StateWrite { path: path.clone(), source: e })?;
    fs::write(path, content)?;
    Ok(())
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[company]
name = "Your Company Name"
email = "billing@yourcompany.com"

[billing]
number_format = "INV-{year}-{seq:04}"  # e.g., INV-2026-0001
currency_symbol = "$"
due_days = 30

[reconciliation]
tolerance = 0.001          # amounts closer than this are treated as equal
overdue_after_days = 30    # used when an invoice has no due date
cash_methods = ["cash", "efectivo"]
"#;

/// Template content for clients.toml
pub const CLIENTS_TEMPLATE: &str = r#"# Define your clients here. The table name (e.g., [acme]) is used
# as the client identifier in the add command.
#
# Example:
#   ledgerline add --client acme --amount 1200

[example-client]
name = "Example Client Inc."
email = "jane@example.com"   # optional
"#;
