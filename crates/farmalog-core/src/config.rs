use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

const DEFAULT_SECRETS_PATH: &str = "./config/secrets.toml";

/// Key names consulted for the Maps credential, in precedence order.
const API_KEY_NAMES: [&str; 2] = ["GOOGLE_API_KEY", "GOOGLE_MAPS_API_KEY"];

/// Top-level string entries of the secrets file.
pub type Secrets = HashMap<String, String>;

/// Load application configuration from environment variables and the secrets file.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if the API key cannot be resolved, the secrets file is
/// malformed, or a value is invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if the API key cannot be resolved, the secrets file is
/// malformed, or a value is invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    let secrets_path = std::env::var("FARMALOG_SECRETS_PATH")
        .unwrap_or_else(|_| DEFAULT_SECRETS_PATH.to_string());
    let secrets = load_secrets(Path::new(&secrets_path))?;
    build_app_config(|key| std::env::var(key), &secrets)
}

/// Read the secrets file. A missing file yields an empty set; non-string
/// values are ignored.
///
/// # Errors
///
/// Returns `ConfigError::FileIo` when the file exists but cannot be read and
/// `ConfigError::SecretsParse` when it is not valid TOML.
pub fn load_secrets(path: &Path) -> Result<Secrets, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no secrets file; using environment only");
            return Ok(Secrets::new());
        }
        Err(e) => {
            return Err(ConfigError::FileIo {
                path: path.display().to_string(),
                source: e,
            })
        }
    };

    let table: toml::Table = content.parse().map_err(|e| ConfigError::SecretsParse {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(table
        .into_iter()
        .filter_map(|(k, v)| match v {
            toml::Value::String(s) => Some((k, s)),
            _ => None,
        })
        .collect())
}

/// Resolve the Maps credential: secrets file first (primary name, then
/// secondary), then the environment in the same name order. Blank values are
/// skipped.
///
/// # Errors
///
/// Returns `ConfigError::MissingApiKey` when no source provides a value.
pub fn resolve_api_key<F>(secrets: &Secrets, lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let from_secrets = API_KEY_NAMES
        .iter()
        .filter_map(|name| secrets.get(*name).cloned());
    let from_env = API_KEY_NAMES.iter().filter_map(|name| lookup(*name).ok());

    from_secrets
        .chain(from_env)
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
        .ok_or(ConfigError::MissingApiKey)
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a pure
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F, secrets: &Secrets) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let env = parse_environment(&or_default("FARMALOG_ENV", "development"));
    let bind_addr = parse_addr("FARMALOG_BIND_ADDR", "0.0.0.0:8501")?;
    let log_level = or_default("FARMALOG_LOG_LEVEL", "info");
    let registry_path = PathBuf::from(or_default(
        "FARMALOG_REGISTRY_PATH",
        "./data/direccion_pdv.csv",
    ));
    let columns_path = PathBuf::from(or_default("FARMALOG_COLUMNS_PATH", "./config/columns.yaml"));
    let secrets_path = PathBuf::from(or_default("FARMALOG_SECRETS_PATH", DEFAULT_SECRETS_PATH));
    let google_api_key = resolve_api_key(secrets, &lookup)?;
    let maps_base_url = or_default(
        "FARMALOG_MAPS_BASE_URL",
        "https://maps.googleapis.com/maps/api/",
    );
    let maps_timeout_secs = parse_u64("FARMALOG_MAPS_TIMEOUT_SECS", "30")?;
    let maps_country = or_default("FARMALOG_MAPS_COUNTRY", "ec").to_lowercase();

    if maps_country.len() != 2 || !maps_country.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ConfigError::InvalidEnvVar {
            var: "FARMALOG_MAPS_COUNTRY".to_string(),
            reason: format!("expected a two-letter country code, got '{maps_country}'"),
        });
    }

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        registry_path,
        columns_path,
        secrets_path,
        google_api_key,
        maps_base_url,
        maps_timeout_secs,
        maps_country,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
