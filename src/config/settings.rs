use serde::{Deserialize, Serialize};

use crate::ledger::ReconPolicy;

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub company: Company,
    pub billing: BillingSettings,
    #[serde(default)]
    pub reconciliation: ReconPolicy,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Company {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct BillingSettings {
    pub number_format: String,
    pub currency_symbol: String,
    pub due_days: u32,
}
