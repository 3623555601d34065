use contracts::shared::indicators::{
    ChangeKind, IndicatorId, IndicatorStatus, IndicatorValue, ValueFormat,
};
use serde::{Deserialize, Serialize};

use super::averages::{safe_divide, PeriodTotals};

pub const BUYOUT_RATE_ID: &str = "buyout_rate";

/// Цвет карточки процента выкупа
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuyoutColor {
    Green,
    Yellow,
    Red,
}

impl BuyoutColor {
    pub fn for_rate(rate: f64) -> Self {
        if rate >= 80.0 {
            BuyoutColor::Green
        } else if rate >= 60.0 {
            BuyoutColor::Yellow
        } else {
            BuyoutColor::Red
        }
    }

    fn status(self) -> IndicatorStatus {
        match self {
            BuyoutColor::Green => IndicatorStatus::Good,
            BuyoutColor::Yellow => IndicatorStatus::Warning,
            BuyoutColor::Red => IndicatorStatus::Bad,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyoutRateCard {
    pub indicator: IndicatorValue,
    pub color: Option<BuyoutColor>,
}

/// Процент выкупа: продажи / заказы * 100
pub fn calculate_buyout_rate(sales_count: Option<f64>, orders_count: Option<f64>) -> Option<f64> {
    safe_divide(sales_count, orders_count).map(|ratio| ratio * 100.0)
}

/// Разница двух процентов в процентных пунктах
pub fn pp_delta(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    Some(current? - previous?)
}

/// Карточка выкупа; сравнение с прошлым периодом в п.п., а не в %
pub fn buyout_rate_card(current: &PeriodTotals, previous: Option<&PeriodTotals>) -> BuyoutRateCard {
    let rate = calculate_buyout_rate(current.sales_count, current.orders_count);
    let previous_rate = previous.and_then(|p| calculate_buyout_rate(p.sales_count, p.orders_count));
    let color = rate.map(BuyoutColor::for_rate);

    BuyoutRateCard {
        indicator: IndicatorValue {
            id: IndicatorId::new(BUYOUT_RATE_ID),
            label: "Процент выкупа".to_string(),
            format: ValueFormat::Percent { decimals: 1 },
            value: rate,
            previous_value: previous_rate,
            change: pp_delta(rate, previous_rate),
            change_kind: ChangeKind::PercentagePoints,
            status: color.map_or(IndicatorStatus::Neutral, BuyoutColor::status),
            hint: None,
        },
        color,
    }
}
