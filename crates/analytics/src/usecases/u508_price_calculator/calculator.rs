//! Калькулятор цены: юнит-экономика одной проданной единицы на складе WB.
//!
//! Все суммы в рублях на одну выкупленную единицу. Ставки логистики и
//! хранения берутся из снимка коэффициентов приёмки (`SupplyTariffs`).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::supply_tariffs::{SupplyTariffs, TariffRates, WarehouseCoefficient};
use super::tariff_extraction::{
    extract_delivery_tariffs, extract_storage_tariffs, StorageFallback, StorageTariffs,
};
use crate::shared::config::TariffsConfig;
use crate::shared::indicators::compute::averages::safe_divide;

#[derive(Debug, Error, PartialEq)]
pub enum PriceCalculatorError {
    #[error("No tariffs for warehouse {warehouse} on {date}")]
    TariffsNotFound { warehouse: String, date: String },
    #[error("Warehouse is not selected")]
    NoWarehouse,
}

/// Параметры товара, введённые продавцом
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceCalculatorInput {
    /// Себестоимость единицы
    pub cogs: f64,
    pub price_before_discount: f64,
    pub seller_discount_pct: f64,
    pub commission_pct: f64,
    pub volume_liters: f64,
    pub storage_days: f64,
    /// Только для монопаллет
    pub units_per_pallet: Option<f64>,
    pub tax_pct: f64,
    pub advertising_pct: f64,
    /// `None` или <= 0 считается как 100%
    pub buyout_pct: Option<f64>,
}

impl Default for PriceCalculatorInput {
    fn default() -> Self {
        Self {
            cogs: 0.0,
            price_before_discount: 0.0,
            seller_discount_pct: 0.0,
            commission_pct: 0.0,
            volume_liters: 1.0,
            storage_days: 30.0,
            units_per_pallet: None,
            tax_pct: 0.0,
            advertising_pct: 0.0,
            buyout_pct: None,
        }
    }
}

/// Какой склад и на какую дату считать
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TariffSelection {
    pub warehouse_id: Option<i64>,
    pub warehouse_name: Option<String>,
    pub date: String,
}

/// Тарифы выбранного склада
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTariffs {
    pub warehouse_id: i64,
    pub warehouse_name: String,
    pub delivery: TariffRates,
    pub storage: StorageTariffs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceCalculation {
    pub price_after_discount: f64,
    pub commission: f64,
    /// Доставка до покупателя плюс обратная логистика невыкупов
    pub logistics: f64,
    pub storage: f64,
    pub tax: f64,
    pub advertising: f64,
    /// К перечислению продавцу: цена минус комиссия, логистика и хранение
    pub payout: f64,
    pub profit: f64,
    pub margin_pct: Option<f64>,
    pub roi_pct: Option<f64>,
    pub using_storage_fallback: bool,
}

fn extra_liters(volume: f64) -> f64 {
    (volume - 1.0).max(0.0)
}

fn buyout_share(buyout_pct: Option<f64>) -> f64 {
    match buyout_pct {
        Some(pct) if pct > 0.0 => (pct / 100.0).min(1.0),
        _ => 1.0,
    }
}

/// Логистика на выкупленную единицу.
///
/// На одну продажу приходится `1 / выкуп` отправок, а невыкупленные едут обратно.
pub fn logistics_cost(
    delivery: &TariffRates,
    volume_liters: f64,
    buyout_pct: Option<f64>,
    return_logistics_rub: f64,
) -> f64 {
    let one_way = delivery.base_liter_rub + delivery.additional_liter_rub * extra_liters(volume_liters);
    let share = buyout_share(buyout_pct);
    one_way / share + return_logistics_rub * (1.0 - share) / share
}

pub fn storage_cost(
    storage: &StorageTariffs,
    volume_liters: f64,
    days: f64,
    units_per_pallet: Option<f64>,
) -> f64 {
    let days = days.max(0.0);
    if storage.is_fixed {
        let units = units_per_pallet.filter(|u| *u >= 1.0).unwrap_or(1.0);
        return storage.base_liter_rub * days / units;
    }
    (storage.base_liter_rub + storage.additional_liter_rub * extra_liters(volume_liters)) * days
}

pub fn calculate_price(
    input: &PriceCalculatorInput,
    tariffs: &ResolvedTariffs,
    return_logistics_rub: f64,
) -> PriceCalculation {
    let price_after_discount = input.price_before_discount * (1.0 - input.seller_discount_pct / 100.0);
    let commission = price_after_discount * input.commission_pct / 100.0;
    let logistics = logistics_cost(
        &tariffs.delivery,
        input.volume_liters,
        input.buyout_pct,
        return_logistics_rub,
    );
    let storage = storage_cost(
        &tariffs.storage,
        input.volume_liters,
        input.storage_days,
        input.units_per_pallet,
    );
    let tax = price_after_discount * input.tax_pct / 100.0;
    let advertising = price_after_discount * input.advertising_pct / 100.0;

    let payout = price_after_discount - commission - logistics - storage;
    let profit = payout - tax - advertising - input.cogs;

    PriceCalculation {
        price_after_discount,
        commission,
        logistics,
        storage,
        tax,
        advertising,
        payout,
        profit,
        margin_pct: safe_divide(Some(profit), Some(price_after_discount)).map(|m| m * 100.0),
        roi_pct: safe_divide(Some(profit), Some(input.cogs)).map(|r| r * 100.0),
        using_storage_fallback: tariffs.storage.using_fallback,
    }
}

/// Цена до скидки, при которой маржа равна `target_margin_pct`.
///
/// `None`, если процентные удержания съедают всю цену или скидка 100%.
pub fn price_for_target_margin(
    input: &PriceCalculatorInput,
    tariffs: &ResolvedTariffs,
    return_logistics_rub: f64,
    target_margin_pct: f64,
) -> Option<f64> {
    let fixed = logistics_cost(
        &tariffs.delivery,
        input.volume_liters,
        input.buyout_pct,
        return_logistics_rub,
    ) + storage_cost(
        &tariffs.storage,
        input.volume_liters,
        input.storage_days,
        input.units_per_pallet,
    ) + input.cogs;

    let variable_share =
        1.0 - (input.commission_pct + input.tax_pct + input.advertising_pct) / 100.0;
    let denominator = variable_share - target_margin_pct / 100.0;
    if denominator <= 0.0 {
        return None;
    }
    let price_after_discount = fixed / denominator;

    let discount_share = 1.0 - input.seller_discount_pct / 100.0;
    if discount_share <= 0.0 {
        return None;
    }
    let price = price_after_discount / discount_share;
    price.is_finite().then_some(price)
}

/// Калькулятор с настройками тарифов из конфигурации
#[derive(Debug, Clone, PartialEq)]
pub struct PriceCalculator {
    fallback: StorageFallback,
    return_logistics_rub: f64,
}

impl PriceCalculator {
    pub fn new(config: &TariffsConfig) -> Self {
        Self {
            fallback: StorageFallback::from_config(config),
            return_logistics_rub: config.return_logistics_rub,
        }
    }

    /// Склад по id, а если id не задан, то по имени
    pub fn resolve(
        &self,
        tariffs: &SupplyTariffs,
        selection: &TariffSelection,
    ) -> Result<ResolvedTariffs, PriceCalculatorError> {
        let (found, warehouse): (Option<&WarehouseCoefficient>, String) =
            match (&selection.warehouse_id, &selection.warehouse_name) {
                (Some(id), _) => (
                    tariffs.find_tariffs_for_date(*id, &selection.date),
                    id.to_string(),
                ),
                (None, Some(name)) if !name.trim().is_empty() => (
                    tariffs.find_tariffs_by_name_and_date(name, &selection.date),
                    name.clone(),
                ),
                _ => return Err(PriceCalculatorError::NoWarehouse),
            };

        let coefficient = found.ok_or_else(|| {
            tracing::warn!("No tariffs for warehouse {} on {}", warehouse, selection.date);
            PriceCalculatorError::TariffsNotFound {
                warehouse,
                date: selection.date.clone(),
            }
        })?;

        Ok(ResolvedTariffs {
            warehouse_id: coefficient.warehouse_id,
            warehouse_name: coefficient.warehouse_name.clone(),
            delivery: extract_delivery_tariffs(coefficient),
            storage: extract_storage_tariffs(coefficient, &self.fallback),
        })
    }

    pub fn calculate(
        &self,
        tariffs: &SupplyTariffs,
        selection: &TariffSelection,
        input: &PriceCalculatorInput,
    ) -> Result<PriceCalculation, PriceCalculatorError> {
        let resolved = self.resolve(tariffs, selection)?;
        Ok(calculate_price(input, &resolved, self.return_logistics_rub))
    }

    pub fn target_price(
        &self,
        tariffs: &SupplyTariffs,
        selection: &TariffSelection,
        input: &PriceCalculatorInput,
        target_margin_pct: f64,
    ) -> Result<Option<f64>, PriceCalculatorError> {
        let resolved = self.resolve(tariffs, selection)?;
        Ok(price_for_target_margin(
            input,
            &resolved,
            self.return_logistics_rub,
            target_margin_pct,
        ))
    }
}
