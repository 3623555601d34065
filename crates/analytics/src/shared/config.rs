use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Переменная окружения с путём к config.toml
pub const CONFIG_ENV_VAR: &str = "WB_ANALYTICS_CONFIG";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub tariffs: TariffsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    #[serde(default = "default_stale_time_secs")]
    pub stale_time_secs: u64,
    #[serde(default = "default_gc_time_secs")]
    pub gc_time_secs: u64,
    #[serde(default = "default_retry")]
    pub retry: u32,
    #[serde(default)]
    pub refetch_on_window_focus: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TariffsConfig {
    /// Тариф хранения, если склад не прислал свой (руб. за первый литр в день)
    #[serde(default = "default_storage_base")]
    pub storage_fallback_base_liter_rub: f64,
    /// То же, за каждый дополнительный литр
    #[serde(default = "default_storage_additional")]
    pub storage_fallback_additional_liter_rub: f64,
    /// Обратная логистика за невыкупленную единицу, руб.
    #[serde(default = "default_return_logistics")]
    pub return_logistics_rub: f64,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_stale_time_secs() -> u64 {
    60 * 60
}

fn default_gc_time_secs() -> u64 {
    2 * 60 * 60
}

fn default_retry() -> u32 {
    2
}

fn default_storage_base() -> f64 {
    0.08
}

fn default_storage_additional() -> f64 {
    0.08
}

fn default_return_logistics() -> f64 {
    50.0
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time_secs: default_stale_time_secs(),
            gc_time_secs: default_gc_time_secs(),
            retry: default_retry(),
            refetch_on_window_focus: false,
        }
    }
}

impl Default for TariffsConfig {
    fn default() -> Self {
        Self {
            storage_fallback_base_liter_rub: default_storage_base(),
            storage_fallback_additional_liter_rub: default_storage_additional(),
            return_logistics_rub: default_return_logistics(),
        }
    }
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[api]
base_url = "http://localhost:3000"
timeout_secs = 30

[cache]
stale_time_secs = 3600
gc_time_secs = 7200
retry = 2
refetch_on_window_focus = false

[tariffs]
storage_fallback_base_liter_rub = 0.08
storage_fallback_additional_liter_rub = 0.08
return_logistics_rub = 50.0
"#;

/// Load configuration from config.toml
///
/// Search order:
/// 1. Path from `WB_ANALYTICS_CONFIG`
/// 2. Next to the executable
/// 3. Falls back to embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        tracing::info!("Loading config from {}: {}", CONFIG_ENV_VAR, path);
        return load_config_from_path(Path::new(&path));
    }

    if let Some(config_path) = config_next_to_executable() {
        if config_path.exists() {
            tracing::info!("Loading config from: {}", config_path.display());
            return load_config_from_path(&config_path);
        }
        tracing::warn!("config.toml not found at: {}", config_path.display());
    }

    tracing::info!("Using default embedded configuration");
    load_config_from_str(DEFAULT_CONFIG)
}

pub fn load_config_from_path(path: &Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)?;
    load_config_from_str(&contents)
}

pub fn load_config_from_str(contents: &str) -> anyhow::Result<Config> {
    let config: Config = toml::from_str(contents)?;
    if config.cache.gc_time_secs < config.cache.stale_time_secs {
        anyhow::bail!(
            "cache.gc_time_secs ({}) must not be less than cache.stale_time_secs ({})",
            config.cache.gc_time_secs,
            config.cache.stale_time_secs
        );
    }
    Ok(config)
}

fn config_next_to_executable() -> Option<PathBuf> {
    let exe_path = std::env::current_exe().ok()?;
    exe_path.parent().map(|dir| dir.join("config.toml"))
}
