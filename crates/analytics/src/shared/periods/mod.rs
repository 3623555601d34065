pub mod iso_week;
pub mod period_selector;

pub use iso_week::{
    ensure_current_week_first, generate_weeks, iso_weeks_in_year, WeekId, WeekIdError,
};
pub use period_selector::{
    format_month_label, format_week_label, get_unique_months, month_from_week, MonthId,
    PeriodSelection,
};
