//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use candela_core::Price;

/// Format a whole-peso amount the way prices are shown everywhere: `$ 45.000`.
///
/// Usage in templates: `{{ product.price|cop }}`
#[askama::filter_fn]
pub fn cop(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let raw = value.to_string();
    Ok(raw
        .trim()
        .parse::<i64>()
        .map_or(raw, |pesos| Price::from_pesos(pesos).to_string()))
}

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}
