use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    pub server: ServerConfig,
    pub geo: GeoConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoConfig {
    /// IP-geolocation JSON endpoint queried per visit
    pub endpoint: String,
    /// Lookup timeout in milliseconds
    pub timeout_ms: u64,
}

impl GeoConfig {
    const fn default_timeout_ms() -> u64 {
        2000
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend_str = std::env::var("STORE_BACKEND").unwrap_or_else(|_| "memory".to_string());

        let backend = match backend_str.to_lowercase().as_str() {
            "sqlite" => StoreBackend::Sqlite,
            "memory" => StoreBackend::Memory,
            other => {
                tracing::warn!(
                    "Unknown STORE_BACKEND '{other}', falling back to 'memory'. Supported values: memory, sqlite"
                );
                StoreBackend::Memory
            }
        };

        let store_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./warp-analytics.db".to_string());

        let host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let geo_endpoint =
            std::env::var("GEO_ENDPOINT").unwrap_or_else(|_| "https://ipapi.co/json/".to_string());
        let geo_timeout_ms = std::env::var("GEO_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or_else(GeoConfig::default_timeout_ms);

        Ok(Config {
            store: StoreConfig {
                backend,
                url: store_url,
            },
            server: ServerConfig { host, port },
            geo: GeoConfig {
                endpoint: geo_endpoint,
                timeout_ms: geo_timeout_ms,
            },
        })
    }
}
