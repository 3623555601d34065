//! Арифметика недель ISO-8601 ("YYYY-Www").
//!
//! Неделя начинается в понедельник, первая неделя года содержит первый
//! четверг. В году 52 или 53 недели.

use chrono::{Datelike, NaiveDate, Utc, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Сколько недель отдаёт селектор периода
pub const GENERATED_WEEKS_COUNT: usize = 12;

/// Предел досинтезированных недель в `ensure_current_week_first`
pub const MAX_SYNTHESIZED_WEEKS: usize = 60;

static WEEK_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-W(\d{2})$").expect("week id pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeekIdError {
    #[error("malformed week id: {0:?} (expected YYYY-Www)")]
    Malformed(String),
    #[error("week {week} is out of range for {year} ({max} weeks)")]
    OutOfRange { year: i32, week: u32, max: u32 },
}

/// ISO week identifier. Ordering follows calendar order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WeekId {
    year: i32,
    week: u32,
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of ISO weeks in `year`: 53 when Jan 1 is a Thursday, or the year
/// is leap and Jan 1 is a Wednesday; 52 otherwise.
pub fn iso_weeks_in_year(year: i32) -> u32 {
    let Some(jan1) = NaiveDate::from_ymd_opt(year, 1, 1) else {
        return 52;
    };
    match jan1.weekday() {
        Weekday::Thu => 53,
        Weekday::Wed if is_leap_year(year) => 53,
        _ => 52,
    }
}

impl WeekId {
    pub fn new(year: i32, week: u32) -> Result<Self, WeekIdError> {
        let max = iso_weeks_in_year(year);
        if week == 0 || week > max || NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).is_none() {
            return Err(WeekIdError::OutOfRange { year, week, max });
        }
        Ok(Self { year, week })
    }

    /// Неделя, в которую попадает дата
    pub fn from_date(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }

    /// Текущая неделя (UTC)
    pub fn current() -> Self {
        Self::from_date(Utc::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn week(&self) -> u32 {
        self.week
    }

    /// Предыдущая неделя; при переходе через 1 берётся последняя неделя
    /// предыдущего года (52 или 53).
    pub fn previous(&self) -> Self {
        if self.week > 1 {
            Self {
                year: self.year,
                week: self.week - 1,
            }
        } else {
            let year = self.year - 1;
            Self {
                year,
                week: iso_weeks_in_year(year),
            }
        }
    }

    pub fn next(&self) -> Self {
        if self.week < iso_weeks_in_year(self.year) {
            Self {
                year: self.year,
                week: self.week + 1,
            }
        } else {
            Self {
                year: self.year + 1,
                week: 1,
            }
        }
    }

    pub fn monday(&self) -> NaiveDate {
        self.day(Weekday::Mon)
    }

    /// Четверг недели определяет её год и месяц
    pub fn thursday(&self) -> NaiveDate {
        self.day(Weekday::Thu)
    }

    pub fn sunday(&self) -> NaiveDate {
        self.day(Weekday::Sun)
    }

    fn day(&self, weekday: Weekday) -> NaiveDate {
        // ids are validated on construction, the default is never hit
        NaiveDate::from_isoywd_opt(self.year, self.week, weekday).unwrap_or_default()
    }
}

impl fmt::Display for WeekId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-W{:02}", self.year, self.week)
    }
}

impl FromStr for WeekId {
    type Err = WeekIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = WEEK_ID_PATTERN
            .captures(s)
            .ok_or_else(|| WeekIdError::Malformed(s.to_string()))?;
        let year: i32 = caps[1]
            .parse()
            .map_err(|_| WeekIdError::Malformed(s.to_string()))?;
        let week: u32 = caps[2]
            .parse()
            .map_err(|_| WeekIdError::Malformed(s.to_string()))?;
        Self::new(year, week)
    }
}

impl TryFrom<String> for WeekId {
    type Error = WeekIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WeekId> for String {
    fn from(value: WeekId) -> Self {
        value.to_string()
    }
}

/// `count` недель по убыванию, начиная с `start` включительно
pub fn generate_weeks_from(start: WeekId, count: usize) -> Vec<WeekId> {
    let mut weeks = Vec::with_capacity(count);
    let mut cursor = start;
    for _ in 0..count {
        weeks.push(cursor);
        cursor = cursor.previous();
    }
    weeks
}

/// Список из 12 недель для селектора, по убыванию от выбранной.
///
/// Некорректный идентификатор даёт пустой список.
pub fn generate_weeks(selected: &str) -> Vec<String> {
    match selected.parse::<WeekId>() {
        Ok(start) => generate_weeks_from(start, GENERATED_WEEKS_COUNT)
            .into_iter()
            .map(|w| w.to_string())
            .collect(),
        Err(e) => {
            tracing::debug!("generate_weeks: {}", e);
            Vec::new()
        }
    }
}

/// Гарантирует, что список недель начинается с текущей.
///
/// Недостающие недели между `current` и первым элементом списка
/// досинтезируются (не более `MAX_SYNTHESIZED_WEEKS`). Если первый элемент
/// не парсится, текущая неделя просто ставится в начало, а её дубликаты из
/// исходного списка убираются.
pub fn ensure_current_week_first(weeks: &[String], current: WeekId) -> Vec<String> {
    let current_id = current.to_string();

    let Some(first) = weeks.first() else {
        return vec![current_id];
    };

    let first_week = match first.parse::<WeekId>() {
        Ok(w) => w,
        Err(e) => {
            tracing::debug!("ensure_current_week_first: {}, keeping list as is", e);
            let mut result = Vec::with_capacity(weeks.len() + 1);
            result.push(current_id.clone());
            result.extend(weeks.iter().filter(|w| **w != current_id).cloned());
            return result;
        }
    };

    if first_week >= current {
        return weeks.to_vec();
    }

    let mut result = Vec::with_capacity(weeks.len() + MAX_SYNTHESIZED_WEEKS);
    let mut cursor = current;
    while cursor > first_week && result.len() < MAX_SYNTHESIZED_WEEKS {
        result.push(cursor.to_string());
        cursor = cursor.previous();
    }
    result.extend(weeks.iter().cloned());
    result
}
