//! Загрузка коэффициентов приёмки кабинета с кэшированием.

use async_trait::async_trait;
use contracts::usecases::u508_price_calculator::{
    AcceptanceCoefficientsResponse, WarehouseCoefficientDto,
};
use std::sync::Arc;

use super::supply_tariffs::SupplyTariffs;
use crate::shared::api_client::{AnalyticsApiClient, ApiError};
use crate::shared::cache::{Clock, Query, QueryPolicy, QueryState};

pub const ACCEPTANCE_COEFFICIENTS_PATH: &str = "/api/v1/tariffs/acceptance-coefficients";

/// Источник коэффициентов приёмки
#[async_trait]
pub trait CoefficientsSource: Send + Sync {
    async fn fetch_coefficients(&self, cabinet_id: &str) -> Result<Vec<WarehouseCoefficientDto>, ApiError>;
}

#[async_trait]
impl CoefficientsSource for AnalyticsApiClient {
    async fn fetch_coefficients(&self, cabinet_id: &str) -> Result<Vec<WarehouseCoefficientDto>, ApiError> {
        let response: AcceptanceCoefficientsResponse = self
            .get_json(
                ACCEPTANCE_COEFFICIENTS_PATH,
                &[("cabinetId", cabinet_id.to_string())],
            )
            .await?;
        tracing::info!(
            "Loaded {} acceptance coefficients for cabinet {}",
            response.coefficients.len(),
            cabinet_id
        );
        Ok(response.coefficients)
    }
}

/// Тарифы кабинета: снимок живёт в кэше под ключом кабинета
pub struct SupplyTariffsQuery {
    source: Arc<dyn CoefficientsSource>,
    query: Query<Arc<SupplyTariffs>>,
}

impl SupplyTariffsQuery {
    pub fn new(source: Arc<dyn CoefficientsSource>, clock: Arc<dyn Clock>, policy: QueryPolicy) -> Self {
        Self {
            source,
            query: Query::new("supply tariffs", clock, policy),
        }
    }

    pub async fn fetch(&self, cabinet_id: &str) -> Result<Arc<SupplyTariffs>, ApiError> {
        let source = self.source.clone();
        self.query
            .fetch(cabinet_id, || load(source.clone(), cabinet_id))
            .await
    }

    pub async fn refetch(&self, cabinet_id: &str) -> Result<Arc<SupplyTariffs>, ApiError> {
        let source = self.source.clone();
        self.query
            .refetch(cabinet_id, || load(source.clone(), cabinet_id))
            .await
    }

    pub fn state(&self, cabinet_id: &str) -> QueryState<Arc<SupplyTariffs>> {
        self.query.state(cabinet_id)
    }

    pub fn should_refetch_on_focus(&self, cabinet_id: &str) -> bool {
        self.query.should_refetch_on_focus(cabinet_id)
    }
}

async fn load(source: Arc<dyn CoefficientsSource>, cabinet_id: &str) -> Result<Arc<SupplyTariffs>, ApiError> {
    let dtos = source.fetch_coefficients(cabinet_id).await?;
    Ok(Arc::new(SupplyTariffs::from_dtos(&dtos)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::cache::ManualClock;
    use crate::shared::config::CacheConfig;
    use chrono::{Duration, TimeZone, Utc};
    use contracts::usecases::u508_price_calculator::TariffRatesDto;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct StubSource {
        calls: AtomicU32,
        failures_left: AtomicU32,
    }

    impl StubSource {
        fn new(failures: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                failures_left: AtomicU32::new(failures),
            }
        }
    }

    #[async_trait]
    impl CoefficientsSource for StubSource {
        async fn fetch_coefficients(&self, _cabinet_id: &str) -> Result<Vec<WarehouseCoefficientDto>, ApiError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err(ApiError::Status {
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            Ok(vec![WarehouseCoefficientDto {
                warehouse_id: 507,
                warehouse_name: "Коледино".to_string(),
                date: "2026-03-01".to_string(),
                box_type_id: 2,
                box_type_name: "Короба".to_string(),
                coefficient: call as f64,
                is_available: true,
                allow_unload: true,
                is_sorting_center: false,
                delivery: TariffRatesDto::default(),
                storage: TariffRatesDto::default(),
            }])
        }
    }

    fn setup(failures: u32) -> (Arc<StubSource>, Arc<ManualClock>, SupplyTariffsQuery) {
        let source = Arc::new(StubSource::new(failures));
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        ));
        let query = SupplyTariffsQuery::new(
            source.clone(),
            clock.clone(),
            QueryPolicy::from_config(&CacheConfig::default()),
        );
        (source, clock, query)
    }

    #[tokio::test]
    async fn test_cached_for_an_hour() {
        let (source, clock, query) = setup(0);

        let first = query.fetch("cab-1").await.unwrap();
        assert_eq!(first.coefficients().len(), 1);
        clock.advance(Duration::minutes(59));
        let second = query.fetch("cab-1").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::minutes(2));
        let third = query.fetch("cab-1").await.unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        // Старый снимок не меняется при перезагрузке
        assert_eq!(first.coefficients()[0].coefficient, 0.0);
        assert_eq!(third.coefficients()[0].coefficient, 1.0);
    }

    #[tokio::test]
    async fn test_cabinets_cached_separately() {
        let (source, _, query) = setup(0);
        query.fetch("cab-1").await.unwrap();
        query.fetch("cab-2").await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert!(query.state("cab-3").data.is_none());
    }

    #[tokio::test]
    async fn test_retries_twice_then_succeeds() {
        let (source, _, query) = setup(2);
        let tariffs = query.fetch("cab-1").await.unwrap();
        assert!(!tariffs.is_empty());
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        assert!(query.state("cab-1").error.is_none());
    }

    #[tokio::test]
    async fn test_error_surfaces_in_state() {
        let (source, _, query) = setup(5);
        let result = query.fetch("cab-1").await;
        assert!(matches!(result, Err(ApiError::Status { status: 503, .. })));
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);

        let state = query.state("cab-1");
        assert!(state.data.is_none());
        assert!(!state.is_loading);
        assert!(state.error.unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_collected_after_two_hours() {
        let (_, clock, query) = setup(0);
        query.fetch("cab-1").await.unwrap();
        clock.advance(Duration::minutes(121));
        assert!(query.state("cab-1").data.is_none());
        assert!(!query.should_refetch_on_focus("cab-1"));
    }
}
