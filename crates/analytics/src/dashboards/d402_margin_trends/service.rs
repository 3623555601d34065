use contracts::dashboards::d402_margin_trends::WeeklyFinanceRow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::shared::indicators::compute::averages::safe_divide;
use crate::shared::indicators::compute::buyout::pp_delta;
use crate::shared::periods::{format_week_label, month_from_week, MonthId, WeekId};

/// Точка недельного графика маржи
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginPoint {
    pub week: WeekId,
    pub label: String,
    pub revenue: f64,
    /// `None`, если себестоимость за неделю не заполнена
    pub profit: Option<f64>,
    pub margin_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyMarginPoint {
    pub month: MonthId,
    pub label: String,
    pub revenue: f64,
    pub profit: Option<f64>,
    pub margin_pct: Option<f64>,
    pub weeks: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarginTrends {
    /// По возрастанию недель
    pub weekly: Vec<MarginPoint>,
    pub monthly: Vec<MonthlyMarginPoint>,
    /// Маржа последней недели минус предпоследней, п.п.
    pub last_delta_pp: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Totals {
    revenue: f64,
    cogs: Option<f64>,
    expenses: f64,
    weeks: usize,
}

impl Totals {
    fn add(&mut self, revenue: f64, cogs: Option<f64>, expenses: f64) {
        // Неделя без COGS делает неизвестной и сумму
        self.cogs = if self.weeks == 0 {
            cogs
        } else {
            self.cogs.zip(cogs).map(|(a, b)| a + b)
        };
        self.revenue += revenue;
        self.expenses += expenses;
        self.weeks += 1;
    }

    fn profit(&self) -> Option<f64> {
        self.cogs.map(|cogs| self.revenue - cogs - self.expenses)
    }

    fn margin_pct(&self) -> Option<f64> {
        safe_divide(self.profit().map(|p| p * 100.0), Some(self.revenue))
    }
}

/// Недельные строки бэкенда -> график маржи по неделям и месяцам.
///
/// Повторы одной недели суммируются, строки с некорректной неделей пропускаются.
pub fn build_margin_trends(rows: &[WeeklyFinanceRow]) -> MarginTrends {
    let mut by_week: BTreeMap<WeekId, Totals> = BTreeMap::new();
    for row in rows {
        let Ok(week) = row.week.parse::<WeekId>() else {
            tracing::warn!("Skipping margin row with malformed week {:?}", row.week);
            continue;
        };
        by_week
            .entry(week)
            .or_default()
            .add(row.revenue, row.cogs, row.expenses);
    }

    let weekly: Vec<MarginPoint> = by_week
        .iter()
        .map(|(week, totals)| MarginPoint {
            week: *week,
            label: format_week_label(&week.to_string()),
            revenue: totals.revenue,
            profit: totals.profit(),
            margin_pct: totals.margin_pct(),
        })
        .collect();

    let mut by_month: BTreeMap<MonthId, Totals> = BTreeMap::new();
    for (week, totals) in &by_week {
        by_month
            .entry(month_from_week(*week))
            .or_default()
            .add(totals.revenue, totals.cogs, totals.expenses);
    }

    let monthly = by_month
        .iter()
        .map(|(month, totals)| MonthlyMarginPoint {
            month: *month,
            label: month.label(),
            revenue: totals.revenue,
            profit: totals.profit(),
            margin_pct: totals.margin_pct(),
            weeks: totals.weeks,
        })
        .collect();

    let last_delta_pp = match weekly.as_slice() {
        [.., previous, last] => pp_delta(last.margin_pct, previous.margin_pct),
        _ => None,
    };

    MarginTrends {
        weekly,
        monthly,
        last_delta_pp,
    }
}
