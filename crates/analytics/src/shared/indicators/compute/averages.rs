//! Средние показатели за период в расчёте на проданную единицу.

use contracts::shared::indicators::{ChangeKind, IndicatorId, IndicatorValue, ValueFormat};
use serde::{Deserialize, Serialize};

use super::{pct_change, status_by_change};

/// Подсказка вместо значения прибыли, когда себестоимость не заполнена
pub const FILL_COGS_HINT: &str = "Заполните себестоимость";

pub mod ids {
    pub const AVG_PRICE_BEFORE_DISCOUNT: &str = "avg_price_before_discount";
    pub const AVG_SALE_PRICE: &str = "avg_sale_price";
    pub const LOGISTICS_PER_UNIT: &str = "logistics_per_unit";
    pub const PROFIT_PER_UNIT: &str = "profit_per_unit";
}

/// Итоги периода, из которых считаются средние
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodTotals {
    /// Сумма цен до скидки продавца
    pub revenue_before_discount: Option<f64>,
    /// Сумма фактических цен продажи
    pub revenue: Option<f64>,
    pub sales_count: Option<f64>,
    pub orders_count: Option<f64>,
    pub logistics: Option<f64>,
    /// Валовая прибыль; `None`, если себестоимость не заполнена
    pub gross_profit: Option<f64>,
}

/// Деление без `NaN`/`Infinity`: `None`, если операнда нет или делитель 0.
pub fn safe_divide(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let (n, d) = (numerator?, denominator?);
    if d == 0.0 {
        return None;
    }
    let q = n / d;
    q.is_finite().then_some(q)
}

struct AverageDef {
    id: &'static str,
    label: &'static str,
    higher_is_good: bool,
    numerator: fn(&PeriodTotals) -> Option<f64>,
}

const AVERAGES: [AverageDef; 4] = [
    AverageDef {
        id: ids::AVG_PRICE_BEFORE_DISCOUNT,
        label: "Средняя цена до скидки",
        higher_is_good: true,
        numerator: |t| t.revenue_before_discount,
    },
    AverageDef {
        id: ids::AVG_SALE_PRICE,
        label: "Средняя цена продажи",
        higher_is_good: true,
        numerator: |t| t.revenue,
    },
    AverageDef {
        id: ids::LOGISTICS_PER_UNIT,
        label: "Логистика на единицу",
        higher_is_good: false,
        numerator: |t| t.logistics,
    },
    AverageDef {
        id: ids::PROFIT_PER_UNIT,
        label: "Прибыль на единицу",
        higher_is_good: true,
        numerator: |t| t.gross_profit,
    },
];

fn per_unit(totals: &PeriodTotals, def: &AverageDef) -> Option<f64> {
    safe_divide((def.numerator)(totals), totals.sales_count)
}

/// Карточки блока средних с относительным изменением к прошлому периоду
pub fn compute_averages(current: &PeriodTotals, previous: Option<&PeriodTotals>) -> Vec<IndicatorValue> {
    AVERAGES
        .iter()
        .map(|def| {
            let value = per_unit(current, def);
            let previous_value = previous.and_then(|p| per_unit(p, def));
            let change = match (value, previous_value) {
                (Some(cur), Some(prev)) => pct_change(cur, prev),
                _ => None,
            };

            // Отсутствие прибыли из-за незаполненной COGS — это не "нет данных"
            let hint = (def.id == ids::PROFIT_PER_UNIT && current.gross_profit.is_none())
                .then(|| FILL_COGS_HINT.to_string());

            IndicatorValue {
                id: IndicatorId::new(def.id),
                label: def.label.to_string(),
                format: ValueFormat::Money {
                    currency: "RUB".to_string(),
                },
                value,
                previous_value,
                change,
                change_kind: ChangeKind::Percent,
                status: status_by_change(change, def.higher_is_good),
                hint,
            }
        })
        .collect()
}
