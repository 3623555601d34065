//! Wildberries-specific wire formats: tariff expressions and warehouse lists.

pub mod tariff_expression;
pub mod warehouses;

pub use tariff_expression::{
    parse_tariff_expression, parse_tariff_value, try_parse_tariff_expression,
    TariffExpressionError,
};
pub use warehouses::{
    filter_warehouses, parse_warehouse, parse_warehouses, parse_warehouses_json,
    separate_warehouses, SeparatedWarehouses, Warehouse, WarehouseEntry,
};
