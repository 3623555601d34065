pub mod calculator;
pub mod supply_tariffs;
pub mod supply_tariffs_query;
pub mod tariff_extraction;

pub use calculator::{
    calculate_price, price_for_target_margin, PriceCalculation, PriceCalculator,
    PriceCalculatorError, PriceCalculatorInput, ResolvedTariffs, TariffSelection,
};
pub use supply_tariffs::{BoxType, BoxTypeTariff, SupplyTariffs, WarehouseCoefficient, WarehouseSummary};
pub use supply_tariffs_query::{CoefficientsSource, SupplyTariffsQuery};
pub use tariff_extraction::{extract_delivery_tariffs, extract_storage_tariffs, StorageFallback, StorageTariffs};
