use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// CSV export of the point-of-sale spreadsheet.
    pub registry_path: PathBuf,
    /// YAML file mapping registry fields to CSV headers.
    pub columns_path: PathBuf,
    pub secrets_path: PathBuf,
    pub google_api_key: String,
    pub maps_base_url: String,
    pub maps_timeout_secs: u64,
    /// ISO 3166-1 alpha-2 code used to restrict address autocomplete.
    pub maps_country: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("registry_path", &self.registry_path)
            .field("columns_path", &self.columns_path)
            .field("secrets_path", &self.secrets_path)
            .field("google_api_key", &"[redacted]")
            .field("maps_base_url", &self.maps_base_url)
            .field("maps_timeout_secs", &self.maps_timeout_secs)
            .field("maps_country", &self.maps_country)
            .finish()
    }
}
