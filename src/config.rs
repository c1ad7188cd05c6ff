use std::env;

use anyhow::Context;
use dotenvy::dotenv;
use validator::Validate;

#[derive(Debug, Clone, Validate)]
pub struct Config {
    /// Required only when `use_postgres` is set.
    pub database_url: Option<String>,
    /// `STORE_BACKEND=postgres` selects the durable metadata store;
    /// anything else keeps the in-memory one.
    pub use_postgres: bool,
    /// Base directory of the local blob store.
    pub upload_dir: String,
    #[validate(range(min = 1, max = 104857600))] // Max 100MiB
    pub max_file_size: u64,
    pub allowed_extensions: Vec<String>,
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load environment variables from `.env` file (if it exists)
        dotenv().ok();

        let allowed_extensions = env::var("ALLOWED_EXTENSIONS")
            .unwrap_or_else(|_| "jpg,jpeg,png,gif,webp,pdf,doc,docx,txt,md,zip,mp4".to_string())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .collect();

        let config = Config {
            database_url: env::var("DATABASE_URL").ok(),
            use_postgres: env::var("STORE_BACKEND")
                .map(|v| v.eq_ignore_ascii_case("postgres"))
                .unwrap_or(false),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            max_file_size: env::var("MAX_FILE_SIZE")
                .unwrap_or_else(|_| "104857600".to_string())
                .parse()
                .unwrap_or(104_857_600),
            allowed_extensions,
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
        };

        // Validate configuration values (e.g. file size range)
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}
