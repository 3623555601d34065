//! Периоды дашборда: недели, месяцы и их подписи.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::iso_week::{WeekId, WeekIdError};

static MONTH_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})$").expect("month id pattern is valid"));

const MONTH_NAMES: [&str; 12] = [
    "Январь",
    "Февраль",
    "Март",
    "Апрель",
    "Май",
    "Июнь",
    "Июль",
    "Август",
    "Сентябрь",
    "Октябрь",
    "Ноябрь",
    "Декабрь",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodError {
    #[error("malformed month id: {0:?} (expected YYYY-MM)")]
    MalformedMonth(String),
    #[error("malformed period: {0:?}")]
    MalformedPeriod(String),
    #[error(transparent)]
    Week(#[from] WeekIdError),
}

/// Месяц "YYYY-MM"
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthId {
    year: i32,
    month: u32,
}

impl MonthId {
    pub fn new(year: i32, month: u32) -> Result<Self, PeriodError> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(PeriodError::MalformedMonth(format!("{:04}-{:02}", year, month)));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn last_day(&self) -> NaiveDate {
        let (y, m) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(y, m, 1)
            .and_then(|d| d.pred_opt())
            .unwrap_or_default()
    }

    /// "Январь 2026"
    pub fn label(&self) -> String {
        format!("{} {}", MONTH_NAMES[(self.month - 1) as usize], self.year)
    }
}

impl fmt::Display for MonthId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthId {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = MONTH_ID_PATTERN
            .captures(s)
            .ok_or_else(|| PeriodError::MalformedMonth(s.to_string()))?;
        let year: i32 = caps[1]
            .parse()
            .map_err(|_| PeriodError::MalformedMonth(s.to_string()))?;
        let month: u32 = caps[2]
            .parse()
            .map_err(|_| PeriodError::MalformedMonth(s.to_string()))?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for MonthId {
    type Error = PeriodError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthId> for String {
    fn from(value: MonthId) -> Self {
        value.to_string()
    }
}

/// Канонический месяц недели — месяц её четверга.
pub fn month_from_week(week: WeekId) -> MonthId {
    let thursday = week.thursday();
    MonthId {
        year: thursday.year(),
        month: thursday.month(),
    }
}

/// Уникальные месяцы в порядке первого появления; некорректные недели
/// пропускаются.
pub fn get_unique_months(weeks: &[String]) -> Vec<String> {
    let mut months: Vec<String> = Vec::new();
    for week in weeks {
        let Ok(week) = week.parse::<WeekId>() else {
            continue;
        };
        let month = month_from_week(week).to_string();
        if !months.contains(&month) {
            months.push(month);
        }
    }
    months
}

/// Недели списка, канонический месяц которых равен `month`
pub fn weeks_of_month(weeks: &[String], month: &str) -> Vec<String> {
    let Ok(month) = month.parse::<MonthId>() else {
        return Vec::new();
    };
    weeks
        .iter()
        .filter(|w| {
            w.parse::<WeekId>()
                .map(|week| month_from_week(week) == month)
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

/// "2026-W02" -> "02 нед. (05.01 – 11.01.2026)"; некорректный ввод
/// возвращается как есть.
pub fn format_week_label(week: &str) -> String {
    match week.parse::<WeekId>() {
        Ok(w) => format!(
            "{:02} нед. ({} – {})",
            w.week(),
            w.monday().format("%d.%m"),
            w.sunday().format("%d.%m.%Y")
        ),
        Err(_) => week.to_string(),
    }
}

/// "2026-01" -> "Январь 2026"; некорректный ввод возвращается как есть.
pub fn format_month_label(month: &str) -> String {
    match month.parse::<MonthId>() {
        Ok(m) => m.label(),
        Err(_) => month.to_string(),
    }
}

/// Выбранный в дашборде период
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum PeriodSelection {
    Week(WeekId),
    Month(MonthId),
}

impl PeriodSelection {
    /// Границы периода включительно
    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        match self {
            PeriodSelection::Week(w) => (w.monday(), w.sunday()),
            PeriodSelection::Month(m) => (m.first_day(), m.last_day()),
        }
    }

    pub fn label(&self) -> String {
        match self {
            PeriodSelection::Week(w) => format_week_label(&w.to_string()),
            PeriodSelection::Month(m) => m.label(),
        }
    }
}

impl FromStr for PeriodSelection {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains("-W") {
            return Ok(PeriodSelection::Week(s.parse()?));
        }
        s.parse::<MonthId>()
            .map(PeriodSelection::Month)
            .map_err(|_| PeriodError::MalformedPeriod(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodKind {
    Week,
    Month,
}

/// Пункт выпадающего списка периодов
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodOption {
    pub value: String,
    pub label: String,
    pub kind: PeriodKind,
}

/// Пункты селектора периода: сначала недели, затем уникальные месяцы.
pub fn period_options(weeks: &[String]) -> Vec<PeriodOption> {
    let mut options: Vec<PeriodOption> = weeks
        .iter()
        .filter(|w| w.parse::<WeekId>().is_ok())
        .map(|w| PeriodOption {
            value: w.clone(),
            label: format_week_label(w),
            kind: PeriodKind::Week,
        })
        .collect();

    options.extend(get_unique_months(weeks).into_iter().map(|m| PeriodOption {
        label: format_month_label(&m),
        value: m,
        kind: PeriodKind::Month,
    }));
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::periods::iso_week::generate_weeks;

    fn week(s: &str) -> WeekId {
        s.parse().unwrap()
    }

    #[test]
    fn test_month_from_week_uses_thursday() {
        // Mon Mar 30 – Sun Apr 5, Thursday is Apr 2
        assert_eq!(month_from_week(week("2026-W14")).to_string(), "2026-04");
        // Mon Dec 29 2025 – Sun Jan 4 2026
        assert_eq!(month_from_week(week("2026-W01")).to_string(), "2026-01");
        assert_eq!(month_from_week(week("2026-W53")).to_string(), "2026-12");
    }

    #[test]
    fn test_get_unique_months() {
        let weeks = generate_weeks("2026-W02");
        assert_eq!(
            get_unique_months(&weeks),
            vec!["2026-01", "2025-12", "2025-11", "2025-10"]
        );

        let with_garbage = vec!["oops".to_string(), "2026-W05".to_string()];
        assert_eq!(get_unique_months(&with_garbage), vec!["2026-01"]);
    }

    #[test]
    fn test_weeks_of_month() {
        let weeks = generate_weeks("2026-W02");
        assert_eq!(weeks_of_month(&weeks, "2026-01"), vec!["2026-W02", "2026-W01"]);
        assert_eq!(weeks_of_month(&weeks, "2025-12").len(), 4);
        assert!(weeks_of_month(&weeks, "December").is_empty());
    }

    #[test]
    fn test_format_labels() {
        assert_eq!(format_week_label("2026-W02"), "02 нед. (05.01 – 11.01.2026)");
        assert_eq!(format_week_label("2026-W01"), "01 нед. (29.12 – 04.01.2026)");
        assert_eq!(format_week_label("week"), "week");
        assert_eq!(format_month_label("2026-01"), "Январь 2026");
        assert_eq!(format_month_label("2026-12"), "Декабрь 2026");
        assert_eq!(format_month_label("2026-13"), "2026-13");
    }

    #[test]
    fn test_period_selection_ranges() {
        let period: PeriodSelection = "2026-W02".parse().unwrap();
        assert_eq!(
            period.date_range(),
            (
                NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
                NaiveDate::from_ymd_opt(2026, 1, 11).unwrap()
            )
        );

        let period: PeriodSelection = "2028-02".parse().unwrap();
        assert_eq!(
            period.date_range(),
            (
                NaiveDate::from_ymd_opt(2028, 2, 1).unwrap(),
                NaiveDate::from_ymd_opt(2028, 2, 29).unwrap()
            )
        );

        let period: PeriodSelection = "2025-12".parse().unwrap();
        assert_eq!(period.date_range().1, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());

        assert!("2025-W60".parse::<PeriodSelection>().is_err());
        assert!("last week".parse::<PeriodSelection>().is_err());
    }

    #[test]
    fn test_period_options() {
        let weeks = vec!["2026-W02".to_string(), "2026-W01".to_string(), "2025-W52".to_string()];
        let options = period_options(&weeks);
        assert_eq!(options.len(), 5);
        assert_eq!(options[0].kind, PeriodKind::Week);
        assert_eq!(options[3].value, "2026-01");
        assert_eq!(options[3].label, "Январь 2026");
        assert_eq!(options[4].value, "2025-12");
    }
}
