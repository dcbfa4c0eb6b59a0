//! Configuration structures for every wrapped integration.
//!
//! Each struct loads from prefixed environment variables (after reading a
//! `.env` file, if any) and falls back to the defaults in [`crate::constants`].

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::*;

const REDACTED: &str = "[REDACTED]";

fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn var_or(key: &str, default: &str) -> String {
    var(key).unwrap_or_else(|| default.to_string())
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    var(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn flag_or(key: &str, default: bool) -> bool {
    var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

/// Relational database configuration.
#[derive(Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_seconds: u64,
    /// Log every statement through sqlx
    pub sqlx_logging: bool,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &REDACTED)
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("connect_timeout_seconds", &self.connect_timeout_seconds)
            .field("sqlx_logging", &self.sqlx_logging)
            .finish()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            min_connections: DEFAULT_DB_MIN_CONNECTIONS,
            connect_timeout_seconds: DEFAULT_DB_CONNECT_TIMEOUT_SECONDS,
            sqlx_logging: false,
        }
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Self {
        load_dotenv();
        Self {
            url: var_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            max_connections: parse_or("DATABASE_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            min_connections: parse_or("DATABASE_MIN_CONNECTIONS", DEFAULT_DB_MIN_CONNECTIONS),
            connect_timeout_seconds: parse_or(
                "DATABASE_CONNECT_TIMEOUT",
                DEFAULT_DB_CONNECT_TIMEOUT_SECONDS,
            ),
            sqlx_logging: flag_or("DATABASE_SQL_LOGGING", false),
        }
    }
}

/// Document database (MongoDB) configuration.
#[derive(Clone, Deserialize, Serialize)]
pub struct DocumentConfig {
    pub uri: String,
    pub database: String,
    pub app_name: Option<String>,
}

impl std::fmt::Debug for DocumentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentConfig")
            .field("uri", &REDACTED)
            .field("database", &self.database)
            .field("app_name", &self.app_name)
            .finish()
    }
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_MONGO_URI.to_string(),
            database: DEFAULT_MONGO_DATABASE.to_string(),
            app_name: None,
        }
    }
}

impl DocumentConfig {
    pub fn from_env() -> Self {
        load_dotenv();
        Self {
            uri: var_or("MONGO_URI", DEFAULT_MONGO_URI),
            database: var_or("MONGO_DATABASE", DEFAULT_MONGO_DATABASE),
            app_name: var("MONGO_APP_NAME"),
        }
    }
}

/// Distributed cache configuration.
#[derive(Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Redis URL; `None` selects the in-memory store
    pub url: Option<String>,
    /// Prefix prepended to every key (e.g. "app:")
    pub key_prefix: String,
    pub default_ttl_seconds: u64,
    /// Capacity of the in-memory store
    pub memory_capacity: u64,
}

impl std::fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheConfig")
            .field("url", &self.url.as_ref().map(|_| REDACTED))
            .field("key_prefix", &self.key_prefix)
            .field("default_ttl_seconds", &self.default_ttl_seconds)
            .field("memory_capacity", &self.memory_capacity)
            .finish()
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: None,
            key_prefix: String::new(),
            default_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            memory_capacity: DEFAULT_MEMORY_CACHE_CAPACITY,
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Self {
        load_dotenv();
        Self {
            url: var("REDIS_URL"),
            key_prefix: var_or("REDIS_KEY_PREFIX", ""),
            default_ttl_seconds: parse_or("REDIS_DEFAULT_TTL", DEFAULT_CACHE_TTL_SECONDS),
            memory_capacity: parse_or("CACHE_MEMORY_CAPACITY", DEFAULT_MEMORY_CACHE_CAPACITY),
        }
    }

    /// Redis URL or the development default.
    pub fn redis_url(&self) -> &str {
        self.url.as_deref().unwrap_or(DEFAULT_REDIS_URL)
    }
}

/// S3 object storage configuration.
#[derive(Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint (MinIO, R2, LocalStack); `None` uses AWS
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    #[serde(skip_serializing)]
    pub secret_access_key: Option<String>,
    /// Allow plain HTTP endpoints
    pub allow_http: bool,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &self.secret_access_key.as_ref().map(|_| REDACTED))
            .field("allow_http", &self.allow_http)
            .finish()
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: DEFAULT_S3_REGION.to_string(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            allow_http: false,
        }
    }
}

impl StorageConfig {
    pub fn from_env() -> Self {
        load_dotenv();
        Self {
            bucket: var_or("S3_BUCKET", ""),
            region: var_or("S3_REGION", DEFAULT_S3_REGION),
            endpoint: var("S3_ENDPOINT"),
            access_key_id: var("S3_ACCESS_KEY_ID"),
            secret_access_key: var("S3_SECRET_ACCESS_KEY"),
            allow_http: flag_or("S3_ALLOW_HTTP", false),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.bucket.is_empty()
    }
}

/// SMTP configuration.
#[derive(Clone, Deserialize, Serialize)]
pub struct SmtpConfig {
    /// `None` selects the logging sender (development mode)
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub from: String,
    /// Upgrade with STARTTLS (otherwise plain, for local relays)
    pub tls: bool,
    pub timeout_seconds: u64,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| REDACTED))
            .field("from", &self.from)
            .field("tls", &self.tls)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: DEFAULT_SMTP_PORT,
            username: None,
            password: None,
            from: DEFAULT_SMTP_FROM.to_string(),
            tls: true,
            timeout_seconds: DEFAULT_SMTP_TIMEOUT_SECONDS,
        }
    }
}

impl SmtpConfig {
    pub fn from_env() -> Self {
        load_dotenv();
        Self {
            host: var("SMTP_HOST"),
            port: parse_or("SMTP_PORT", DEFAULT_SMTP_PORT),
            username: var("SMTP_USER"),
            password: var("SMTP_PASS"),
            from: var_or("SMTP_FROM", DEFAULT_SMTP_FROM),
            tls: flag_or("SMTP_TLS", true),
            timeout_seconds: parse_or("SMTP_TIMEOUT", DEFAULT_SMTP_TIMEOUT_SECONDS),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.host.is_some()
    }
}

/// SMS (Twilio) configuration.
#[derive(Clone, Deserialize, Serialize)]
pub struct SmsConfig {
    pub account_sid: String,
    #[serde(skip_serializing)]
    pub auth_token: String,
    /// Default sender number (E.164)
    pub from: Option<String>,
    pub base_url: String,
}

impl std::fmt::Debug for SmsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &REDACTED)
            .field("from", &self.from)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            from: None,
            base_url: DEFAULT_TWILIO_BASE_URL.to_string(),
        }
    }
}

impl SmsConfig {
    pub fn from_env() -> Self {
        load_dotenv();
        Self {
            account_sid: var_or("TWILIO_ACCOUNT_SID", ""),
            auth_token: var_or("TWILIO_AUTH_TOKEN", ""),
            from: var("TWILIO_FROM"),
            base_url: var_or("TWILIO_BASE_URL", DEFAULT_TWILIO_BASE_URL),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.account_sid.is_empty() && !self.auth_token.is_empty()
    }
}

/// Argon2 password hashing parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: DEFAULT_ARGON2_MEMORY_KIB,
            iterations: DEFAULT_ARGON2_ITERATIONS,
            parallelism: DEFAULT_ARGON2_PARALLELISM,
        }
    }
}

impl HashingConfig {
    pub fn from_env() -> Self {
        load_dotenv();
        Self {
            memory_kib: parse_or("ARGON2_MEMORY_KIB", DEFAULT_ARGON2_MEMORY_KIB),
            iterations: parse_or("ARGON2_ITERATIONS", DEFAULT_ARGON2_ITERATIONS),
            parallelism: parse_or("ARGON2_PARALLELISM", DEFAULT_ARGON2_PARALLELISM),
        }
    }
}

/// Symmetric cipher configuration.
#[derive(Clone, Deserialize, Serialize)]
pub struct CipherConfig {
    #[serde(skip_serializing)]
    pub passphrase: Option<String>,
    pub salt: String,
}

impl std::fmt::Debug for CipherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherConfig")
            .field("passphrase", &self.passphrase.as_ref().map(|_| REDACTED))
            .field("salt", &self.salt)
            .finish()
    }
}

impl Default for CipherConfig {
    fn default() -> Self {
        Self {
            passphrase: None,
            salt: DEFAULT_CIPHER_SALT.to_string(),
        }
    }
}

impl CipherConfig {
    pub fn from_env() -> Self {
        load_dotenv();
        Self {
            passphrase: var("CIPHER_PASSPHRASE"),
            salt: var_or("CIPHER_SALT", DEFAULT_CIPHER_SALT),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.passphrase.is_some()
    }
}

/// Aggregate of every integration's configuration.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// `None` when no `DATABASE_URL` is set
    pub database: Option<DatabaseConfig>,
    /// `None` when no `MONGO_URI` is set
    pub documents: Option<DocumentConfig>,
    pub cache: CacheConfig,
    pub storage: StorageConfig,
    pub smtp: SmtpConfig,
    pub sms: SmsConfig,
    pub hashing: HashingConfig,
    pub cipher: CipherConfig,
}

impl Settings {
    /// Load every section from the environment.
    pub fn from_env() -> Self {
        load_dotenv();
        Self {
            database: var("DATABASE_URL").map(|_| DatabaseConfig::from_env()),
            documents: var("MONGO_URI").map(|_| DocumentConfig::from_env()),
            cache: CacheConfig::from_env(),
            storage: StorageConfig::from_env(),
            smtp: SmtpConfig::from_env(),
            sms: SmsConfig::from_env(),
            hashing: HashingConfig::from_env(),
            cipher: CipherConfig::from_env(),
        }
    }
}
