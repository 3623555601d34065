use serde::{Deserialize, Serialize};

/// Недельные финансовые итоги кабинета, как их отдаёт бэкенд
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyFinanceRow {
    /// Неделя в формате "YYYY-Www"
    pub week: String,
    /// Выручка после скидок
    #[serde(default)]
    pub revenue: f64,
    /// Себестоимость проданных единиц; `None`, если COGS не заполнена
    #[serde(default)]
    pub cogs: Option<f64>,
    /// Расходы маркетплейса (комиссия, логистика, хранение, реклама)
    #[serde(default)]
    pub expenses: f64,
}

/// Response for the margin trends endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarginTrendsResponse {
    #[serde(default)]
    pub rows: Vec<WeeklyFinanceRow>,
}
