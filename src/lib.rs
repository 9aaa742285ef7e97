pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;

use crate::infrastructure::config::ToolConfig;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins over the configured filter.
pub fn init_tracing(config: &ToolConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
