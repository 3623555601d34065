pub mod dto;

pub use dto::{
    AcceptanceCoefficientsResponse, CabinetWarehouseDto, RawWarehouseDto, TariffRatesDto,
    WarehouseCoefficientDto, WbBoxTariffWarehouseDto,
};
