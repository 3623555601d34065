use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Acceptance coefficients (склад × дата × тип поставки)
// ============================================================================

/// Ответ эндпоинта коэффициентов приёмки
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcceptanceCoefficientsResponse {
    #[serde(default)]
    pub coefficients: Vec<WarehouseCoefficientDto>,
}

/// Тариф склада на конкретную дату и тип поставки
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseCoefficientDto {
    pub warehouse_id: i64,
    #[serde(default)]
    pub warehouse_name: String,
    /// Дата в формате "YYYY-MM-DD", иногда с временем ("2026-03-01T00:00:00Z")
    #[serde(default)]
    pub date: String,
    /// 2 — короба, 5 — монопаллеты, 6 — суперсейф
    #[serde(default)]
    pub box_type_id: i32,
    #[serde(default)]
    pub box_type_name: String,
    /// Коэффициент приёмки
    #[serde(default)]
    pub coefficient: f64,
    #[serde(default)]
    pub is_available: bool,
    #[serde(default)]
    pub allow_unload: bool,
    #[serde(default)]
    pub is_sorting_center: bool,
    #[serde(default)]
    pub delivery: TariffRatesDto,
    #[serde(default)]
    pub storage: TariffRatesDto,
}

/// Ставки логистики или хранения, руб. за литр
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TariffRatesDto {
    #[serde(default)]
    pub coefficient: f64,
    #[serde(default)]
    pub base_liter_rub: f64,
    #[serde(default)]
    pub additional_liter_rub: f64,
}

// ============================================================================
// Warehouse lists
// ============================================================================

/// Склад из фида тарифов коробов Wildberries (`/api/v1/tariffs/box`).
///
/// Тарифы приходят строками-выражениями вида "48*1" (база) или "5*x"
/// (множитель на литр); нестроковые значения тоже встречаются, поэтому
/// поля хранятся как `serde_json::Value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WbBoxTariffWarehouseDto {
    /// `None`, если id нет или он `null`; такие записи отбрасываются при разборе
    #[serde(rename = "warehouseID", default)]
    pub warehouse_id: Option<i64>,
    #[serde(rename = "warehouseName", default)]
    pub warehouse_name: String,
    #[serde(rename = "boxDeliveryBase", default)]
    pub box_delivery_base: serde_json::Value,
    #[serde(rename = "boxDeliveryLiter", default)]
    pub box_delivery_liter: serde_json::Value,
    #[serde(rename = "boxStorageBase", default)]
    pub box_storage_base: serde_json::Value,
    #[serde(rename = "boxStorageLiter", default)]
    pub box_storage_liter: serde_json::Value,
}

/// Склад из справочника кабинета на бэкенде дашборда (`/api/v1/warehouses`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CabinetWarehouseDto {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub delivery_base: serde_json::Value,
    #[serde(default)]
    pub delivery_liter: serde_json::Value,
    #[serde(default)]
    pub storage_base: serde_json::Value,
    #[serde(default)]
    pub storage_liter: serde_json::Value,
}

/// Склад в любом из двух форматов источников.
///
/// Формат определяется по ключам `warehouseID`/`warehouseName`, а не перебором
/// вариантов, поэтому запись без id не ломает разбор всего списка.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawWarehouseDto {
    WbBoxTariff(WbBoxTariffWarehouseDto),
    Cabinet(CabinetWarehouseDto),
}

impl<'de> Deserialize<'de> for RawWarehouseDto {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let is_wb_feed = value.get("warehouseID").is_some() || value.get("warehouseName").is_some();
        if is_wb_feed {
            serde_json::from_value(value)
                .map(RawWarehouseDto::WbBoxTariff)
                .map_err(D::Error::custom)
        } else {
            serde_json::from_value(value)
                .map(RawWarehouseDto::Cabinet)
                .map_err(D::Error::custom)
        }
    }
}
