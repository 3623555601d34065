//! Снимок тарифов складов (коэффициенты приёмки) и поиск по нему.

use chrono::NaiveDate;
use contracts::usecases::u508_price_calculator::{TariffRatesDto, WarehouseCoefficientDto};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::shared::marketplaces::wildberries::{
    filter_warehouses, separate_warehouses, SeparatedWarehouses, WarehouseEntry,
};

/// Тип поставки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoxType {
    Boxes,
    Pallets,
    Supersafe,
    Other(i32),
}

impl BoxType {
    pub fn from_id(id: i32) -> Self {
        match id {
            2 => BoxType::Boxes,
            5 => BoxType::Pallets,
            6 => BoxType::Supersafe,
            other => BoxType::Other(other),
        }
    }

    pub fn id(self) -> i32 {
        match self {
            BoxType::Boxes => 2,
            BoxType::Pallets => 5,
            BoxType::Supersafe => 6,
            BoxType::Other(id) => id,
        }
    }
}

/// Ставки за литр; коэффициент склада в них уже учтён
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TariffRates {
    pub coefficient: f64,
    pub base_liter_rub: f64,
    pub additional_liter_rub: f64,
}

impl From<TariffRatesDto> for TariffRates {
    fn from(dto: TariffRatesDto) -> Self {
        Self {
            coefficient: dto.coefficient,
            base_liter_rub: dto.base_liter_rub,
            additional_liter_rub: dto.additional_liter_rub,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseCoefficient {
    pub warehouse_id: i64,
    pub warehouse_name: String,
    /// `None`, если дата от бэкенда не разобралась
    pub date: Option<NaiveDate>,
    pub box_type: BoxType,
    pub box_type_name: String,
    pub coefficient: f64,
    pub is_available: bool,
    pub allow_unload: bool,
    pub is_sorting_center: bool,
    pub delivery: TariffRates,
    pub storage: TariffRates,
}

impl From<&WarehouseCoefficientDto> for WarehouseCoefficient {
    fn from(dto: &WarehouseCoefficientDto) -> Self {
        Self {
            warehouse_id: dto.warehouse_id,
            warehouse_name: dto.warehouse_name.clone(),
            date: normalize_date(&dto.date),
            box_type: BoxType::from_id(dto.box_type_id),
            box_type_name: dto.box_type_name.clone(),
            coefficient: dto.coefficient,
            is_available: dto.is_available,
            allow_unload: dto.allow_unload,
            is_sorting_center: dto.is_sorting_center,
            delivery: dto.delivery.into(),
            storage: dto.storage.into(),
        }
    }
}

/// Склад для выпадающего списка
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseSummary {
    pub id: i64,
    pub name: String,
    pub delivery: TariffRates,
    pub storage: TariffRates,
}

impl WarehouseEntry for WarehouseSummary {
    fn warehouse_id(&self) -> i64 {
        self.id
    }

    fn warehouse_name(&self) -> &str {
        &self.name
    }
}

/// Тариф склада для одного типа поставки
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxTypeTariff {
    pub box_type: BoxType,
    pub box_type_name: String,
    pub coefficient: f64,
    pub delivery: TariffRates,
    pub storage: TariffRates,
    /// Хранение монопаллет считается за паллету, а не за литр
    pub is_fixed_storage: bool,
}

/// "2026-03-01T00:00:00Z" -> 2026-03-01; всё, что не начинается с YYYY-MM-DD, отбрасывается
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let prefix = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Неизменяемый снимок коэффициентов кабинета
#[derive(Debug, Clone, Default)]
pub struct SupplyTariffs {
    coefficients: Vec<WarehouseCoefficient>,
    warehouses: Vec<WarehouseSummary>,
}

impl SupplyTariffs {
    pub fn from_dtos(dtos: &[WarehouseCoefficientDto]) -> Self {
        Self::new(dtos.iter().map(WarehouseCoefficient::from).collect())
    }

    pub fn new(coefficients: Vec<WarehouseCoefficient>) -> Self {
        let warehouses = summarize_warehouses(&coefficients);
        Self {
            coefficients,
            warehouses,
        }
    }

    pub fn coefficients(&self) -> &[WarehouseCoefficient] {
        &self.coefficients
    }

    /// Уникальные склады, отсортированные по имени без учёта регистра
    pub fn warehouses(&self) -> &[WarehouseSummary] {
        &self.warehouses
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// Выпадающий список: поиск по имени или id, популярные склады отдельно
    pub fn search_warehouses(&self, query: &str) -> SeparatedWarehouses<WarehouseSummary> {
        separate_warehouses(&filter_warehouses(&self.warehouses, query))
    }

    /// Тариф склада на дату: сначала короба, затем любой тип поставки.
    pub fn find_tariffs_for_date(&self, warehouse_id: i64, date: &str) -> Option<&WarehouseCoefficient> {
        let date = normalize_date(date)?;
        let same_day: Vec<&WarehouseCoefficient> = self
            .coefficients
            .iter()
            .filter(|c| c.warehouse_id == warehouse_id && c.date == Some(date))
            .collect();

        same_day
            .iter()
            .find(|c| c.box_type == BoxType::Boxes)
            .or_else(|| same_day.first())
            .copied()
    }

    /// Поиск по имени склада среди тарифов коробов на дату.
    ///
    /// Уровни совпадения: полное, по началу имени, по подстроке.
    /// Внутри уровня побеждает первая запись в порядке коллекции.
    pub fn find_tariffs_by_name_and_date(&self, name: &str, date: &str) -> Option<&WarehouseCoefficient> {
        let target = normalize_name(name);
        if target.is_empty() {
            return None;
        }
        let date = normalize_date(date)?;

        let candidates: Vec<(&WarehouseCoefficient, String)> = self
            .coefficients
            .iter()
            .filter(|c| c.date == Some(date) && c.box_type == BoxType::Boxes)
            .map(|c| (c, normalize_name(&c.warehouse_name)))
            .collect();

        let tiers: [fn(&str, &str) -> bool; 3] = [
            |candidate, target| candidate == target,
            |candidate, target| candidate.starts_with(target),
            |candidate, target| candidate.contains(target),
        ];

        tiers.iter().find_map(|matches| {
            candidates
                .iter()
                .find(|(_, candidate)| matches(candidate, &target))
                .map(|(c, _)| *c)
        })
    }

    /// По одному тарифу на тип поставки, в порядке первого появления
    pub fn get_tariffs_by_box_type(&self, warehouse_id: i64) -> Vec<BoxTypeTariff> {
        let mut result: Vec<BoxTypeTariff> = Vec::new();
        for c in self.coefficients.iter().filter(|c| c.warehouse_id == warehouse_id) {
            if result.iter().any(|t| t.box_type == c.box_type) {
                continue;
            }
            result.push(BoxTypeTariff {
                box_type: c.box_type,
                box_type_name: c.box_type_name.clone(),
                coefficient: c.coefficient,
                delivery: c.delivery,
                storage: c.storage,
                is_fixed_storage: c.box_type == BoxType::Pallets,
            });
        }
        result
    }
}

fn summarize_warehouses(coefficients: &[WarehouseCoefficient]) -> Vec<WarehouseSummary> {
    let mut order: Vec<i64> = Vec::new();
    let mut by_id: HashMap<i64, (&WarehouseCoefficient, bool)> = HashMap::new();

    for c in coefficients {
        let is_boxes = c.box_type == BoxType::Boxes;
        match by_id.get_mut(&c.warehouse_id) {
            None => {
                order.push(c.warehouse_id);
                by_id.insert(c.warehouse_id, (c, is_boxes));
            }
            // Первая запись коробов вытесняет запись другого типа
            Some(entry) if !entry.1 && is_boxes => *entry = (c, true),
            Some(_) => {}
        }
    }

    let mut summaries: Vec<WarehouseSummary> = order
        .iter()
        .filter_map(|id| by_id.get(id))
        .map(|(c, _)| WarehouseSummary {
            id: c.warehouse_id,
            name: c.warehouse_name.clone(),
            delivery: c.delivery,
            storage: c.storage,
        })
        .collect();
    summaries.sort_by_key(|w| w.name.to_lowercase());
    summaries
}
