//! Parsing of monetary amounts sent by clients.
//!
//! Amounts travel as decimal strings and are held as `rust_decimal::Decimal`,
//! never as binary floating point. Both `.` and `,` are accepted as the
//! decimal separator.
//!
//! Magnitudes are capped at [`MAX_MAGNITUDE`] so balances and period totals
//! stay far inside the range `Decimal` can represent.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::AppError;

/// Largest accepted amount or balance magnitude: one quadrillion.
pub const MAX_MAGNITUDE: i64 = 1_000_000_000_000_000;

fn parse_decimal(input: &str) -> Option<Decimal> {
    let normalized = input.trim().replace(',', ".");
    if normalized.is_empty() {
        return None;
    }
    Decimal::from_str(&normalized).ok()
}

/// Parse a transaction amount: a strictly positive magnitude.
pub fn parse_amount(input: &str) -> Result<Decimal, AppError> {
    let amount = parse_decimal(input)
        .ok_or_else(|| AppError::invalid(format!("malformed amount: {input:?}")))?;

    if amount <= Decimal::ZERO {
        return Err(AppError::invalid("amount must be positive"));
    }

    within_bounds(amount, "amount")
}

/// Parse an account balance. Empty input means zero; negative balances are allowed.
pub fn parse_balance(input: Option<&str>) -> Result<Decimal, AppError> {
    match input.map(str::trim) {
        None | Some("") => Ok(Decimal::ZERO),
        Some(raw) => {
            let balance = parse_decimal(raw)
                .ok_or_else(|| AppError::invalid(format!("malformed balance: {raw:?}")))?;
            within_bounds(balance, "balance")
        }
    }
}

fn within_bounds(value: Decimal, what: &str) -> Result<Decimal, AppError> {
    if value.abs() > Decimal::from(MAX_MAGNITUDE) {
        return Err(AppError::invalid(format!(
            "{what} must not exceed {MAX_MAGNITUDE} in magnitude"
        )));
    }
    Ok(value)
}
