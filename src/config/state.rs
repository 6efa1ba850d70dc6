use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::ledger::Invoice;

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct State {
    pub counter: Counter,
    #[serde(default)]
    pub invoices: Vec<Invoice>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Counter {
    pub last_number: u32,
    pub last_year: u32,
}

impl Default for Counter {
    fn default() -> Self {
        Self {
            last_number: 0,
            last_year: chrono::Utc::now().year() as u32,
        }
    }
}

impl State {
    pub fn find(&self, id: &str) -> Option<&Invoice> {
        self.invoices.iter().find(|i| i.id == id)
    }

    /// Replace the stored invoice with the same id.
    pub fn replace(&mut self, invoice: Invoice) -> bool {
        match self.invoices.iter_mut().find(|i| i.id == invoice.id) {
            Some(slot) => {
                *slot = invoice;
                true
            }
            None => false,
        }
    }

    /// Next sequence number for `year`; the counter restarts every year.
    pub fn next_sequence(&self, year: u32) -> u32 {
        if self.counter.last_year == year {
            self.counter.last_number + 1
        } else {
            1
        }
    }
}
