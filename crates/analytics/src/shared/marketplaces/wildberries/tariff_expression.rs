//! Разбор тарифных выражений Wildberries.
//!
//! Тариф приходит строкой "48*1" (фиксированная база) или "5*x" (ставка за
//! каждый литр); нужна только числовая часть до `*`, в рублях.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static TARIFF_EXPRESSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+(?:[.,]\d+)?)\s*\*").expect("tariff expression pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TariffExpressionError {
    #[error("empty tariff expression")]
    Empty,
    #[error("tariff expression is not a string")]
    NotAString,
    #[error("unsupported tariff expression: {0:?}")]
    Malformed(String),
}

/// Числовая часть выражения до `*`
pub fn try_parse_tariff_expression(expr: &str) -> Result<f64, TariffExpressionError> {
    if expr.trim().is_empty() {
        return Err(TariffExpressionError::Empty);
    }
    let caps = TARIFF_EXPRESSION
        .captures(expr)
        .ok_or_else(|| TariffExpressionError::Malformed(expr.to_string()))?;
    caps[1]
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| TariffExpressionError::Malformed(expr.to_string()))
}

/// Как `try_parse_tariff_expression`, но любая ошибка даёт 0.
pub fn parse_tariff_expression(expr: &str) -> f64 {
    try_parse_tariff_expression(expr).unwrap_or(0.0)
}

/// Тарифное поле из JSON; нестроковые значения не поддерживаются.
pub fn try_parse_tariff_value(value: &serde_json::Value) -> Result<f64, TariffExpressionError> {
    match value {
        serde_json::Value::String(s) => try_parse_tariff_expression(s),
        _ => Err(TariffExpressionError::NotAString),
    }
}

/// Как `try_parse_tariff_value`, но любая ошибка даёт 0.
pub fn parse_tariff_value(value: &serde_json::Value) -> f64 {
    try_parse_tariff_value(value).unwrap_or(0.0)
}
