use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub jwt_secret: String,

    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_page_size")]
    pub page_size: u64,

    /// Allowed CORS origin; any origin when unset.
    #[serde(default)]
    pub cors_origin: Option<String>,

    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialServerConfig {
    database_url: Option<String>,
    jwt_secret: Option<String>,
    listen_addr: Option<String>,
    log_dir: Option<String>,
    max_connections: Option<u32>,
    page_size: Option<u64>,
    cors_origin: Option<String>,
    bcrypt_cost: Option<u32>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_page_size() -> u64 {
    6
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl ServerConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self, String> {
        dotenv::dotenv().ok();

        // 1. Load from file (optional)
        let file_config: PartialServerConfig = match config_path.map(Path::new) {
            Some(path) if path.exists() => {
                let contents = fs::read_to_string(path)
                    .map_err(|e| format!("Failed to read config file at {path:?}: {e}"))?;
                toml::from_str(&contents)
                    .map_err(|e| format!("Failed to parse TOML from config file at {path:?}: {e}"))?
            }
            _ => PartialServerConfig::default(),
        };

        // 2. Load from environment variables
        let env_config: PartialServerConfig = envy::from_env::<PartialServerConfig>()
            .map_err(|e| format!("Failed to load config from environment: {e}"))?;

        // 3. Merge: environment overrides file
        merge(env_config, file_config)
    }
}

fn merge(env: PartialServerConfig, file: PartialServerConfig) -> Result<ServerConfig, String> {
    Ok(ServerConfig {
        database_url: env
            .database_url
            .or(file.database_url)
            .ok_or("DATABASE_URL is required")?,
        jwt_secret: env
            .jwt_secret
            .or(file.jwt_secret)
            .ok_or("JWT_SECRET is required")?,
        listen_addr: env
            .listen_addr
            .or(file.listen_addr)
            .unwrap_or_else(default_listen_addr),
        log_dir: env.log_dir.or(file.log_dir).unwrap_or_else(default_log_dir),
        max_connections: env
            .max_connections
            .or(file.max_connections)
            .unwrap_or_else(default_max_connections),
        page_size: env
            .page_size
            .or(file.page_size)
            .unwrap_or_else(default_page_size),
        cors_origin: env.cors_origin.or(file.cors_origin),
        bcrypt_cost: env
            .bcrypt_cost
            .or(file.bcrypt_cost)
            .unwrap_or_else(default_bcrypt_cost),
    })
}
