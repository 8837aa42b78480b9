// 🧾 Transaction - normalized, bank-agnostic record

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Signed amount in minor currency units (pence, cents)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    pub minor_units: i64,
    pub currency: String,
}

impl Money {
    pub fn new(minor_units: i64, currency: impl Into<String>) -> Self {
        Money {
            minor_units,
            currency: currency.into(),
        }
    }

    /// Human-readable form: `£25.50`, `-£100.00`, `12.34 CHF`
    pub fn display(&self) -> String {
        let sign = if self.minor_units < 0 { "-" } else { "" };
        let abs = self.minor_units.unsigned_abs();
        let value = format!("{}.{:02}", abs / 100, abs % 100);

        match self.currency.as_str() {
            "GBP" => format!("{sign}£{value}"),
            "USD" => format!("{sign}${value}"),
            "EUR" => format!("{sign}€{value}"),
            code => format!("{sign}{value} {code}"),
        }
    }

    pub fn is_outflow(&self) -> bool {
        self.minor_units < 0
    }
}

/// Normalized transaction produced by the mapper.
///
/// Negative amounts are money out, positive amounts money in. `bank` is the
/// identifier of the parser that read the row (`"amex"`, `"nationwide"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: Money,
    pub bank: String,
    pub category: Option<String>,
}
