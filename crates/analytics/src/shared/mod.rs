pub mod api_client;
pub mod cache;
pub mod config;
pub mod format;
pub mod indicators;
pub mod logger;
pub mod marketplaces;
pub mod periods;
pub mod selection;
