use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use std::env;
use std::path::PathBuf;
use tracing::debug;
pub mod models;
pub use models::*;

/// Prefix for environment overrides, e.g. `CARECAL__SERVER__PORT=9000`.
pub const DEFAULT_PREFIX: &str = "CARECAL";

/// Separator between nested keys in environment overrides.
pub const CONFIG_SEPARATOR: &str = "__";

/// Loads the layered application configuration.
///
/// Sources, later ones winning:
/// 1. `{CONFIG_DIR}/default.*`
/// 2. `{CONFIG_DIR}/{RUN_ENV}.*`
/// 3. environment variables prefixed with `PREFIX` (default `CARECAL`)
///
/// `CONFIG_DIR` defaults to `config` relative to the working directory and
/// `RUN_ENV` to `debug`. Missing files are not an error.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    let prefix = env::var("PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string());
    let config_dir = PathBuf::from(env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string()));

    let default_path = config_dir.join("default");
    let env_path = config_dir.join(&run_env);
    debug!(
        "Loading config from {} and {}",
        default_path.display(),
        env_path.display()
    );

    let builder = Config::builder()
        .add_source(File::from(default_path).required(false))
        .add_source(File::from(env_path).required(false))
        .add_source(
            Environment::with_prefix(&prefix)
                .prefix_separator(CONFIG_SEPARATOR)
                .separator(CONFIG_SEPARATOR),
        );

    builder.build()?.try_deserialize()
}

/// Builds configuration from an in-memory TOML document, bypassing files and
/// environment. Used by tests and embedding callers.
pub fn config_from_toml(source: &str) -> Result<AppConfig, ConfigError> {
    Config::builder()
        .add_source(File::from_str(source, config::FileFormat::Toml))
        .build()?
        .try_deserialize()
}

static INIT_DOTENV: OnceCell<String> = OnceCell::new();

/// Ensures that the dotenv file is loaded into the environment variables.
///
/// The file name comes from `DOTENV_OVERRIDE` and falls back to `.env`. The
/// file is read at most once per process; a missing file is ignored.
/// Returns the path that was used.
pub fn ensure_dotenv_loaded() -> String {
    INIT_DOTENV
        .get_or_init(|| {
            let dotenv_path =
                env::var("DOTENV_OVERRIDE").unwrap_or_else(|_| ".env".to_string());
            dotenv::from_filename(&dotenv_path).ok();
            dotenv_path
        })
        .clone()
}
