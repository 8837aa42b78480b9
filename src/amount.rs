// 💷 Amount Parser
// Locale-formatted money strings -> integer minor units (pence)

use crate::error::AmountError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Parse a statement amount such as `"£1,234.56"` or `"-£100.00"` into minor units.
///
/// Everything except ASCII digits, `.` and `-` is dropped first, which removes
/// currency symbols in any encoding (`£`, Latin-1 `£`, mojibake `Â£`) and
/// thousands separators. The remaining text must be a plain decimal.
///
/// The value is parsed as a `Decimal`, so up to two fractional digits convert
/// exactly. Longer fractions are rounded half away from zero to the penny
/// (`1.005` -> `101`, `2.00499` -> `200`).
pub fn parse_amount(raw: &str) -> Result<i64, AmountError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    if cleaned.is_empty() {
        return Err(AmountError::Empty {
            raw: raw.to_string(),
        });
    }

    to_minor_units(&cleaned).ok_or_else(|| AmountError::Malformed {
        raw: raw.to_string(),
    })
}

fn to_minor_units(cleaned: &str) -> Option<i64> {
    // A sign is only valid in front; digits must be present
    if cleaned.rfind('-').is_some_and(|i| i > 0) || !cleaned.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }

    let amount: Decimal = cleaned.parse().ok()?;
    amount
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .checked_mul(Decimal::ONE_HUNDRED)?
        .to_i64()
}
