use serde::{Deserialize, Serialize};

use super::supply_tariffs::{BoxType, TariffRates, WarehouseCoefficient};
use crate::shared::config::TariffsConfig;

/// Тарифы хранения по умолчанию для складов, не приславших свои
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StorageFallback {
    pub base_liter_rub: f64,
    pub additional_liter_rub: f64,
}

impl StorageFallback {
    pub fn from_config(config: &TariffsConfig) -> Self {
        Self {
            base_liter_rub: config.storage_fallback_base_liter_rub,
            additional_liter_rub: config.storage_fallback_additional_liter_rub,
        }
    }
}

impl Default for StorageFallback {
    fn default() -> Self {
        Self::from_config(&TariffsConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StorageTariffs {
    pub coefficient: f64,
    pub base_liter_rub: f64,
    pub additional_liter_rub: f64,
    /// Монопаллеты: ставка за паллету в день
    pub is_fixed: bool,
    pub using_fallback: bool,
}

pub fn extract_delivery_tariffs(coefficient: &WarehouseCoefficient) -> TariffRates {
    coefficient.delivery
}

/// Тарифы хранения; нулевая базовая ставка у коробов заменяется значением по умолчанию.
///
/// У монопаллет ставка берётся как есть: нулевой `additional_liter_rub` для них норма.
pub fn extract_storage_tariffs(
    coefficient: &WarehouseCoefficient,
    fallback: &StorageFallback,
) -> StorageTariffs {
    let storage = coefficient.storage;
    let is_fixed = coefficient.box_type == BoxType::Pallets;

    if !is_fixed && storage.base_liter_rub == 0.0 {
        tracing::debug!(
            "Warehouse {} ({}) has no storage tariff, using fallback",
            coefficient.warehouse_id,
            coefficient.warehouse_name
        );
        return StorageTariffs {
            coefficient: storage.coefficient,
            base_liter_rub: fallback.base_liter_rub,
            additional_liter_rub: fallback.additional_liter_rub,
            is_fixed,
            using_fallback: true,
        };
    }

    StorageTariffs {
        coefficient: storage.coefficient,
        base_liter_rub: storage.base_liter_rub,
        additional_liter_rub: storage.additional_liter_rub,
        is_fixed,
        using_fallback: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coefficient(box_type: BoxType, storage: TariffRates) -> WarehouseCoefficient {
        WarehouseCoefficient {
            warehouse_id: 507,
            warehouse_name: "Коледино".to_string(),
            date: None,
            box_type,
            box_type_name: String::new(),
            coefficient: 1.0,
            is_available: true,
            allow_unload: true,
            is_sorting_center: false,
            delivery: TariffRates {
                coefficient: 150.0,
                base_liter_rub: 69.0,
                additional_liter_rub: 21.0,
            },
            storage,
        }
    }

    #[test]
    fn test_storage_fallback_for_boxes() {
        let c = coefficient(
            BoxType::Boxes,
            TariffRates {
                coefficient: 100.0,
                base_liter_rub: 0.0,
                additional_liter_rub: 0.0,
            },
        );
        let storage = extract_storage_tariffs(&c, &StorageFallback::default());
        assert!(storage.using_fallback);
        assert!(!storage.is_fixed);
        assert_eq!(storage.base_liter_rub, 0.08);
        assert_eq!(storage.additional_liter_rub, 0.08);
    }

    #[test]
    fn test_pallets_taken_literally() {
        let c = coefficient(
            BoxType::Pallets,
            TariffRates {
                coefficient: 100.0,
                base_liter_rub: 0.0,
                additional_liter_rub: 0.0,
            },
        );
        let storage = extract_storage_tariffs(&c, &StorageFallback::default());
        assert!(!storage.using_fallback);
        assert!(storage.is_fixed);
        assert_eq!(storage.base_liter_rub, 0.0);

        let c = coefficient(
            BoxType::Pallets,
            TariffRates {
                coefficient: 100.0,
                base_liter_rub: 35.0,
                additional_liter_rub: 0.0,
            },
        );
        let storage = extract_storage_tariffs(&c, &StorageFallback::default());
        assert_eq!(storage.base_liter_rub, 35.0);
        assert_eq!(storage.additional_liter_rub, 0.0);
    }

    #[test]
    fn test_own_storage_tariff_kept() {
        let c = coefficient(
            BoxType::Boxes,
            TariffRates {
                coefficient: 120.0,
                base_liter_rub: 0.12,
                additional_liter_rub: 0.1,
            },
        );
        let storage = extract_storage_tariffs(&c, &StorageFallback::default());
        assert!(!storage.using_fallback);
        assert_eq!(storage.base_liter_rub, 0.12);
        assert_eq!(extract_delivery_tariffs(&c).base_liter_rub, 69.0);
    }
}
