//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroU64},
    path::PathBuf,
    str::FromStr,
};

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

mod cli;

pub use cli::{CliArgs, Command, ServeArgs, ServeOverrides, load_with_cli};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "vitrina";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PUBLIC_PORT: u16 = 3000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_PRODUCTS_TTL_SECS: u64 = 300;
const DEFAULT_CATEGORIES_TTL_SECS: u64 = 600;
const DEFAULT_RATES_TTL_SECS: u64 = 300;
const DEFAULT_RESPONSE_CACHE_LIMIT: usize = 200;
const DEFAULT_PAGE_SIZE: u32 = 20;
const DEFAULT_MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Read(#[from] config::ConfigError),
    #[error("invalid configuration value for `{field}`: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// Fully resolved application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
    pub cache: CacheSettings,
    pub catalog: CatalogSettings,
    pub security: SecuritySettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub public_addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

/// Cache tuning knobs, bridged into `cache::CacheConfig` at startup.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub products_ttl_secs: NonZeroU64,
    pub categories_ttl_secs: NonZeroU64,
    pub rates_ttl_secs: NonZeroU64,
    pub enable_response_cache: bool,
    pub response_cache_limit: usize,
}

#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub default_page_size: NonZeroU32,
    pub max_page_size: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct SecuritySettings {
    /// Shared secret accepted in the `x-invalidate-token` header.
    /// When unset, only session authorization can trigger invalidation.
    pub invalidate_token: Option<String>,
}

/// Raw deserialized settings before validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSettings {
    server: RawServer,
    database: RawDatabase,
    logging: RawLogging,
    cache: RawCache,
    catalog: RawCatalog,
    security: RawSecurity,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawServer {
    host: Option<String>,
    public_port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDatabase {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawLogging {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCache {
    products_ttl_secs: Option<u64>,
    categories_ttl_secs: Option<u64>,
    rates_ttl_secs: Option<u64>,
    enable_response_cache: Option<bool>,
    response_cache_limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCatalog {
    default_page_size: Option<u32>,
    max_page_size: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSecurity {
    invalidate_token: Option<String>,
}

/// Load settings from the default file, an optional local file, the
/// environment (`VITRINA_*`), and CLI overrides, in that precedence order.
pub fn load(
    config_file: Option<&PathBuf>,
    overrides: &ServeOverrides,
) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = config_file {
        builder = builder.add_source(File::from(path.clone()));
    }

    let raw: RawSettings = builder
        .add_source(Environment::with_prefix("VITRINA").separator("__"))
        .build()?
        .try_deserialize()?;

    resolve(raw, overrides)
}

fn resolve(raw: RawSettings, overrides: &ServeOverrides) -> Result<Settings, ConfigError> {
    let host = overrides
        .server_host
        .clone()
        .or(raw.server.host)
        .unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = overrides
        .public_port
        .or(raw.server.public_port)
        .unwrap_or(DEFAULT_PUBLIC_PORT);
    let public_addr = SocketAddr::from_str(&format!("{host}:{port}"))
        .map_err(|err| ConfigError::invalid("server.host", err.to_string()))?;

    let level = match overrides
        .log_level
        .as_deref()
        .or(raw.logging.level.as_deref())
    {
        Some(raw_level) => LevelFilter::from_str(raw_level).map_err(|_| {
            ConfigError::invalid("logging.level", format!("`{raw_level}` is not a log level"))
        })?,
        None => LevelFilter::INFO,
    };
    let format = match overrides.log_json.or(raw.logging.json) {
        Some(true) => LogFormat::Json,
        _ => LogFormat::Compact,
    };

    let database = DatabaseSettings {
        url: overrides.database_url.clone().or(raw.database.url),
        max_connections: non_zero_u32(
            "database.max_connections",
            raw.database
                .max_connections
                .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS),
        )?,
    };

    let cache = CacheSettings {
        products_ttl_secs: non_zero_u64(
            "cache.products_ttl_secs",
            raw.cache
                .products_ttl_secs
                .unwrap_or(DEFAULT_PRODUCTS_TTL_SECS),
        )?,
        categories_ttl_secs: non_zero_u64(
            "cache.categories_ttl_secs",
            raw.cache
                .categories_ttl_secs
                .unwrap_or(DEFAULT_CATEGORIES_TTL_SECS),
        )?,
        rates_ttl_secs: non_zero_u64(
            "cache.rates_ttl_secs",
            raw.cache.rates_ttl_secs.unwrap_or(DEFAULT_RATES_TTL_SECS),
        )?,
        enable_response_cache: raw.cache.enable_response_cache.unwrap_or(true),
        response_cache_limit: raw
            .cache
            .response_cache_limit
            .unwrap_or(DEFAULT_RESPONSE_CACHE_LIMIT),
    };

    let default_page_size = non_zero_u32(
        "catalog.default_page_size",
        raw.catalog.default_page_size.unwrap_or(DEFAULT_PAGE_SIZE),
    )?;
    let max_page_size = non_zero_u32(
        "catalog.max_page_size",
        raw.catalog.max_page_size.unwrap_or(DEFAULT_MAX_PAGE_SIZE),
    )?;
    if default_page_size > max_page_size {
        return Err(ConfigError::invalid(
            "catalog.default_page_size",
            "default page size exceeds the configured maximum",
        ));
    }

    let invalidate_token = overrides
        .invalidate_token
        .clone()
        .or(raw.security.invalidate_token)
        .filter(|token| !token.is_empty());

    Ok(Settings {
        server: ServerSettings { public_addr },
        database,
        logging: LoggingSettings { level, format },
        cache,
        catalog: CatalogSettings {
            default_page_size,
            max_page_size,
        },
        security: SecuritySettings { invalidate_token },
    })
}

fn non_zero_u32(field: &'static str, value: u32) -> Result<NonZeroU32, ConfigError> {
    NonZeroU32::new(value).ok_or_else(|| ConfigError::invalid(field, "value must be non-zero"))
}

fn non_zero_u64(field: &'static str, value: u64) -> Result<NonZeroU64, ConfigError> {
    NonZeroU64::new(value).ok_or_else(|| ConfigError::invalid(field, "value must be non-zero"))
}
