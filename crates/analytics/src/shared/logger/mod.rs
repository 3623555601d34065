//! Инициализация логирования для приложения, встраивающего аналитику.

use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Фильтр по умолчанию, если `RUST_LOG` не задан
pub const DEFAULT_FILTER: &str = "info,reqwest=warn,hyper=warn";

/// Подключает консольный вывод и, если задан `log_dir`, файл `analytics.log`.
///
/// Повторный вызов не падает: если подписчик уже установлен, вернётся
/// `Ok(false)`.
pub fn init_tracing(default_filter: &str, log_dir: Option<&Path>) -> anyhow::Result<bool> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let log_file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join("analytics.log"))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::sync::Arc::new(log_file))
                    .with_ansi(false),
            )
        }
        None => None,
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("Logging initialized");
    }
    Ok(installed)
}
