use async_trait::async_trait;
use chrono::Duration;
use contracts::dashboards::d402_margin_trends::{MarginTrendsResponse, WeeklyFinanceRow};
use std::sync::Arc;

use super::service::{build_margin_trends, MarginTrends};
use crate::shared::api_client::{AnalyticsApiClient, ApiError};
use crate::shared::cache::{Clock, Query, QueryPolicy, QueryState};
use crate::shared::periods::{generate_weeks, WeekId};

pub const MARGIN_TRENDS_PATH: &str = "/api/v1/analytics/margin-trends";

/// Источник недельных финансовых итогов кабинета
#[async_trait]
pub trait MarginTrendsSource: Send + Sync {
    async fn fetch_weekly_rows(
        &self,
        cabinet_id: &str,
        week_from: WeekId,
        week_to: WeekId,
    ) -> Result<Vec<WeeklyFinanceRow>, ApiError>;
}

#[async_trait]
impl MarginTrendsSource for AnalyticsApiClient {
    async fn fetch_weekly_rows(
        &self,
        cabinet_id: &str,
        week_from: WeekId,
        week_to: WeekId,
    ) -> Result<Vec<WeeklyFinanceRow>, ApiError> {
        let response: MarginTrendsResponse = self
            .get_json(
                MARGIN_TRENDS_PATH,
                &[
                    ("cabinetId", cabinet_id.to_string()),
                    ("weekFrom", week_from.to_string()),
                    ("weekTo", week_to.to_string()),
                ],
            )
            .await?;
        Ok(response.rows)
    }
}

/// Тренды обновляются чаще тарифов
pub fn margin_trends_policy() -> QueryPolicy {
    QueryPolicy {
        stale_time: Duration::minutes(5),
        gc_time: Duration::minutes(30),
        retry: 1,
        refetch_on_window_focus: false,
    }
}

/// Тренды маржи за 12 недель, заканчивающихся выбранной
pub struct MarginTrendsQuery {
    source: Arc<dyn MarginTrendsSource>,
    query: Query<Arc<MarginTrends>>,
}

impl MarginTrendsQuery {
    pub fn new(source: Arc<dyn MarginTrendsSource>, clock: Arc<dyn Clock>) -> Self {
        Self::with_policy(source, clock, margin_trends_policy())
    }

    pub fn with_policy(source: Arc<dyn MarginTrendsSource>, clock: Arc<dyn Clock>, policy: QueryPolicy) -> Self {
        Self {
            source,
            query: Query::new("margin trends", clock, policy),
        }
    }

    fn key(cabinet_id: &str, week: &str) -> String {
        format!("{}:{}", cabinet_id, week)
    }

    /// Некорректная неделя даёт пустые тренды без обращения к бэкенду
    pub async fn fetch(&self, cabinet_id: &str, selected_week: &str) -> Result<Arc<MarginTrends>, ApiError> {
        let weeks = generate_weeks(selected_week);
        let range = match (weeks.last(), weeks.first()) {
            (Some(from), Some(to)) => from.parse::<WeekId>().ok().zip(to.parse::<WeekId>().ok()),
            _ => None,
        };
        let Some((week_from, week_to)) = range else {
            tracing::warn!("Margin trends requested for malformed week {:?}", selected_week);
            return Ok(Arc::new(MarginTrends::default()));
        };

        let source = self.source.clone();
        self.query
            .fetch(&Self::key(cabinet_id, selected_week), || {
                let source = source.clone();
                async move {
                    let rows = source.fetch_weekly_rows(cabinet_id, week_from, week_to).await?;
                    Ok::<_, ApiError>(Arc::new(build_margin_trends(&rows)))
                }
            })
            .await
    }

    pub fn state(&self, cabinet_id: &str, selected_week: &str) -> QueryState<Arc<MarginTrends>> {
        self.query.state(&Self::key(cabinet_id, selected_week))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::cache::ManualClock;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubSource {
        requests: Mutex<Vec<(String, String, String)>>,
    }

    #[async_trait]
    impl MarginTrendsSource for StubSource {
        async fn fetch_weekly_rows(
            &self,
            cabinet_id: &str,
            week_from: WeekId,
            week_to: WeekId,
        ) -> Result<Vec<WeeklyFinanceRow>, ApiError> {
            self.requests.lock().unwrap().push((
                cabinet_id.to_string(),
                week_from.to_string(),
                week_to.to_string(),
            ));
            Ok(vec![
                WeeklyFinanceRow {
                    week: week_from.to_string(),
                    revenue: 1000.0,
                    cogs: Some(500.0),
                    expenses: 300.0,
                },
                WeeklyFinanceRow {
                    week: week_to.to_string(),
                    revenue: 1000.0,
                    cogs: Some(500.0),
                    expenses: 200.0,
                },
            ])
        }
    }

    fn setup() -> (Arc<StubSource>, Arc<ManualClock>, MarginTrendsQuery) {
        let source = Arc::new(StubSource::default());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        ));
        let query = MarginTrendsQuery::new(source.clone(), clock.clone());
        (source, clock, query)
    }

    #[tokio::test]
    async fn test_requests_twelve_week_window() {
        let (source, _, query) = setup();
        let trends = query.fetch("cab-1", "2026-W03").await.unwrap();

        let requests = source.requests.lock().unwrap().clone();
        assert_eq!(
            requests,
            vec![(
                "cab-1".to_string(),
                "2025-W44".to_string(),
                "2026-W03".to_string()
            )]
        );
        assert_eq!(trends.weekly.len(), 2);
        let delta = trends.last_delta_pp.unwrap();
        assert!((delta - 10.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_cached_for_five_minutes() {
        let (source, clock, query) = setup();
        query.fetch("cab-1", "2026-W10").await.unwrap();
        clock.advance(Duration::minutes(4));
        query.fetch("cab-1", "2026-W10").await.unwrap();
        assert_eq!(source.requests.lock().unwrap().len(), 1);

        query.fetch("cab-1", "2026-W09").await.unwrap();
        assert_eq!(source.requests.lock().unwrap().len(), 2);

        clock.advance(Duration::minutes(2));
        query.fetch("cab-1", "2026-W10").await.unwrap();
        assert_eq!(source.requests.lock().unwrap().len(), 3);

        clock.advance(Duration::minutes(31));
        assert!(query.state("cab-1", "2026-W10").data.is_none());
    }

    #[tokio::test]
    async fn test_malformed_week_skips_backend() {
        let (source, _, query) = setup();
        let trends = query.fetch("cab-1", "2026-13").await.unwrap();
        assert!(trends.weekly.is_empty());
        assert!(source.requests.lock().unwrap().is_empty());
    }
}
