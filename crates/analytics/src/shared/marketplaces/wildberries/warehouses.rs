use contracts::usecases::u508_price_calculator::RawWarehouseDto;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::tariff_expression::parse_tariff_value;

/// Склады, которые показываются в начале выпадающего списка
pub static POPULAR_WAREHOUSE_IDS: Lazy<HashSet<i64>> = Lazy::new(|| {
    maplit::hashset![
        507,    // Коледино
        117986, // Казань
        1733,   // Екатеринбург
        686,    // Новосибирск
        206348, // Тула
        120762, // Электросталь
        2737,   // Санкт-Петербург
        130744, // Краснодар
        208277, // Невинномысск
        301983, // Волгоград
    ]
});

/// Склад с тарифами в рублях
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: i64,
    pub name: String,
    pub delivery_base: f64,
    pub delivery_liter: f64,
    pub storage_base: f64,
    pub storage_liter: f64,
}

/// Что нужно поиску и разбивке списка складов
pub trait WarehouseEntry {
    fn warehouse_id(&self) -> i64;
    fn warehouse_name(&self) -> &str;
}

impl WarehouseEntry for Warehouse {
    fn warehouse_id(&self) -> i64 {
        self.id
    }

    fn warehouse_name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeparatedWarehouses<T = Warehouse> {
    pub popular: Vec<T>,
    pub other: Vec<T>,
}

impl<T> Default for SeparatedWarehouses<T> {
    fn default() -> Self {
        Self {
            popular: Vec::new(),
            other: Vec::new(),
        }
    }
}

/// Приводит склад из любого источника к `Warehouse`
pub fn parse_warehouse(raw: &RawWarehouseDto) -> Warehouse {
    match raw {
        RawWarehouseDto::WbBoxTariff(dto) => Warehouse {
            id: dto.warehouse_id.unwrap_or(0),
            name: dto.warehouse_name.trim().to_string(),
            delivery_base: parse_tariff_value(&dto.box_delivery_base),
            delivery_liter: parse_tariff_value(&dto.box_delivery_liter),
            storage_base: parse_tariff_value(&dto.box_storage_base),
            storage_liter: parse_tariff_value(&dto.box_storage_liter),
        },
        RawWarehouseDto::Cabinet(dto) => Warehouse {
            id: dto.id.unwrap_or(0),
            name: dto.name.trim().to_string(),
            delivery_base: parse_tariff_value(&dto.delivery_base),
            delivery_liter: parse_tariff_value(&dto.delivery_liter),
            storage_base: parse_tariff_value(&dto.storage_base),
            storage_liter: parse_tariff_value(&dto.storage_liter),
        },
    }
}

/// Разбирает список складов, отбрасывая записи с `id <= 0`
pub fn parse_warehouses(list: &[RawWarehouseDto]) -> Vec<Warehouse> {
    let parsed: Vec<Warehouse> = list
        .iter()
        .map(parse_warehouse)
        .filter(|w| w.id > 0)
        .collect();
    if parsed.len() < list.len() {
        tracing::warn!(
            "Dropped {} warehouse records with invalid id",
            list.len() - parsed.len()
        );
    }
    parsed
}

/// Разбирает JSON-массив складов по одной записи: запись, которая не
/// разбирается, отбрасывается вместе с записями с `id <= 0`
pub fn parse_warehouses_json(value: &serde_json::Value) -> Vec<Warehouse> {
    let Some(items) = value.as_array() else {
        tracing::warn!("Warehouse list is not a JSON array");
        return Vec::new();
    };
    let raw: Vec<RawWarehouseDto> = items
        .iter()
        .filter_map(|item| match RawWarehouseDto::deserialize(item) {
            Ok(dto) => Some(dto),
            Err(e) => {
                tracing::warn!("Skipping malformed warehouse record: {}", e);
                None
            }
        })
        .collect();
    parse_warehouses(&raw)
}

/// Поиск по подстроке в названии (без учёта регистра) или в ID
pub fn filter_warehouses<T: WarehouseEntry + Clone>(list: &[T], query: &str) -> Vec<T> {
    let query = query.trim().to_lowercase();
    list.iter()
        .filter(|w| w.warehouse_id() > 0)
        .filter(|w| {
            query.is_empty()
                || w.warehouse_name().to_lowercase().contains(&query)
                || w.warehouse_id().to_string().contains(&query)
        })
        .cloned()
        .collect()
}

/// Делит список на популярные и остальные склады, сохраняя порядок
pub fn separate_warehouses<T: WarehouseEntry + Clone>(list: &[T]) -> SeparatedWarehouses<T> {
    let (popular, other): (Vec<T>, Vec<T>) = list
        .iter()
        .cloned()
        .partition(|w| POPULAR_WAREHOUSE_IDS.contains(&w.warehouse_id()));
    SeparatedWarehouses { popular, other }
}
