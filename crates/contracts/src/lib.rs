//! Wire contracts shared between the analytics core and the REST backend.

pub mod dashboards;
pub mod shared;
pub mod usecases;
