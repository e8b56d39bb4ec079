//! Number parsing and currency formatting helpers
//!
//! Text coming from input fields never errors: parsing strips everything
//! non-numeric and falls back to 0, so the UI stays responsive and a field
//! never enters an error state. Currency formatting goes through
//! `rust_decimal` so display values are rounded to 2 decimal places with a
//! half-up strategy rather than whatever binary float printing produces.

use rust_decimal::prelude::*;

/// Decimal places for monetary display values
const DECIMAL_PLACES: u32 = 2;

/// Permissively parse free-form numeric text.
///
/// Accepts comma or dot as the decimal separator, ignores currency symbols
/// and other noise, and returns 0 for anything unparseable.
pub fn parse_loose_number(text: &str) -> f64 {
    if text.is_empty() {
        return 0.0;
    }
    let normalized: String = text
        .replace(',', ".")
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    normalized
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

/// Convert a currency amount to integer cents, rounded half-up at 2 decimal
/// places. Non-finite input maps to 0; degenerate pricing values are
/// displayed as a zero-derived amount, never persisted as currency.
pub fn to_cents(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    let rounded = Decimal::from_f64(value)
        .unwrap_or_default()
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
    (rounded * Decimal::ONE_HUNDRED).to_i64().unwrap_or(0)
}

/// Format a currency amount the way the receipt portal displays money:
/// `R$ 1.234,56`. Non-finite input renders as `R$ 0,00`.
pub fn format_brl(value: f64) -> String {
    let cents = to_cents(value);
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let reais = (abs / 100).to_string();
    let frac = abs % 100;

    let mut grouped = String::with_capacity(reais.len() + reais.len() / 3);
    for (i, ch) in reais.chars().enumerate() {
        if i > 0 && (reais.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("{sign}R$ {grouped},{frac:02}")
}
