//! # Stockroom Backoffice
//!
//! The operation surface handed to an external transport layer (HTTP
//! handlers, IPC commands, a CLI). Each command checks the caller's role,
//! parses the loosely typed JSON payload, and delegates to `stockroom-db`.
//!
//! ## Module Organization
//! ```text
//! stockroom_backoffice/
//! ├── lib.rs          ◄─── You are here (startup: tracing, config, connect)
//! ├── config.rs       ◄─── TOML file + STOCKROOM_* environment
//! ├── commands/
//! │   ├── mod.rs      ◄─── Command exports
//! │   ├── quotation.rs◄─── Quotation create/update/read/delete
//! │   ├── sale.rs     ◄─── Sale commit and reads
//! │   ├── restock.rs  ◄─── Restock batches
//! │   └── margin.rs   ◄─── Margin range table
//! └── error.rs        ◄─── ApiError {kind, message, context}
//! ```
//!
//! ## Startup Sequence
//! ```rust,ignore
//! let config = BackofficeConfig::load(None)?;
//! stockroom_backoffice::init_tracing(&config.logging.filter);
//! let db = stockroom_backoffice::connect(&config).await?;
//!
//! let receipt = commands::sale::commit_sale(&db, Some(&identity), &payload).await?;
//! ```

pub mod commands;
pub mod config;
pub mod error;

pub use config::{BackofficeConfig, ConfigError};
pub use error::{ApiError, ErrorKind};

use stockroom_db::{Database, DbError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Failures while bringing the backoffice up.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to create data directory: {0}")]
    DataDir(#[from] std::io::Error),

    #[error(transparent)]
    Database(#[from] DbError),
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG` wins when set
/// - otherwise `filter` (from `STOCKROOM_LOG` or the config file)
///
/// Calling it twice keeps the first subscriber.
pub fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Opens the database described by `config` and applies pending migrations.
pub async fn connect(config: &BackofficeConfig) -> Result<Database, StartupError> {
    let db_config = config.to_db_config()?;

    if let Some(parent) = db_config.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    info!(path = ?db_config.database_path, "Connecting to database");
    let db = Database::new(db_config).await?;
    info!("Database connected and migrations applied");

    Ok(db)
}
