pub mod dto;

pub use dto::{MarginTrendsResponse, WeeklyFinanceRow};
