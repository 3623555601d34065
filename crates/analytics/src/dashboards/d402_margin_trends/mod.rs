pub mod repository;
pub mod service;

pub use repository::{margin_trends_policy, MarginTrendsQuery, MarginTrendsSource};
pub use service::{build_margin_trends, MarginPoint, MarginTrends, MonthlyMarginPoint};
