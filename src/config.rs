use std::env;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    // InfluxDB
    pub influx_host: String,
    pub influx_token: Option<String>,
    pub influx_organization: Option<String>,
    pub influx_organization_id: Option<String>,
    pub influx_bucket: Option<String>,
    pub influx_timeout_seconds: u64,

    // Login store (IoT app)
    pub login_database_url: String,

    // API settings
    pub api_host: String,
    pub api_port: u16,

    // Rate limiting
    pub disable_rate_limiting: bool,
    pub rate_limit_replenish_seconds: u64,
    pub rate_limit_burst: u32,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Only `INFLUXDB_HOST` is required here. Each program asks for the
    /// remaining InfluxDB settings it needs through the accessor methods.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `INFLUXDB_HOST` is not set and
    /// `ConfigError::InvalidHost` if it cannot be turned into a URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let raw_host =
            env::var("INFLUXDB_HOST").map_err(|_| ConfigError::Missing("INFLUXDB_HOST"))?;

        Ok(Self {
            // InfluxDB
            influx_host: normalize_host(&raw_host)?,
            influx_token: optional("INFLUXDB_TOKEN"),
            influx_organization: optional("INFLUXDB_ORGANIZATION"),
            influx_organization_id: optional("INFLUXDB_ORGANIZATION_ID"),
            influx_bucket: optional("INFLUXDB_BUCKET").or_else(|| optional("INFLUX_BUCKET")),
            influx_timeout_seconds: env_or("INFLUXDB_TIMEOUT_SECONDS", 30),

            // Login store
            login_database_url: env::var("LOGIN_DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://logins.db?mode=rwc".to_string()),

            // API settings
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: env_or("API_PORT", 8080),

            // Rate limiting
            disable_rate_limiting: env_or("DISABLE_RATE_LIMITING", false),
            rate_limit_replenish_seconds: env_or("RATE_LIMIT_REPLENISH_SECONDS", 1),
            rate_limit_burst: env_or("RATE_LIMIT_BURST", 60),
        })
    }

    /// Configuration pointing at `influx_host` with everything else defaulted.
    /// Used by tests and by programs that build their config by hand.
    #[must_use]
    pub fn for_host(influx_host: impl Into<String>) -> Self {
        Self {
            influx_host: influx_host.into(),
            influx_token: None,
            influx_organization: None,
            influx_organization_id: None,
            influx_bucket: None,
            influx_timeout_seconds: 30,
            login_database_url: "sqlite::memory:".to_string(),
            api_host: "127.0.0.1".to_string(),
            api_port: 8080,
            disable_rate_limiting: true,
            rate_limit_replenish_seconds: 1,
            rate_limit_burst: 60,
        }
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `INFLUXDB_TOKEN` is not set.
    pub fn token(&self) -> Result<&str, ConfigError> {
        required(self.influx_token.as_deref(), "INFLUXDB_TOKEN")
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `INFLUXDB_ORGANIZATION` is not set.
    pub fn organization(&self) -> Result<&str, ConfigError> {
        required(self.influx_organization.as_deref(), "INFLUXDB_ORGANIZATION")
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `INFLUXDB_ORGANIZATION_ID` is not set.
    pub fn organization_id(&self) -> Result<&str, ConfigError> {
        required(
            self.influx_organization_id.as_deref(),
            "INFLUXDB_ORGANIZATION_ID",
        )
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if neither `INFLUXDB_BUCKET` nor
    /// `INFLUX_BUCKET` is set.
    pub fn bucket(&self) -> Result<&str, ConfigError> {
        required(self.influx_bucket.as_deref(), "INFLUXDB_BUCKET")
    }

    #[must_use]
    pub fn influx_timeout(&self) -> Duration {
        Duration::from_secs(self.influx_timeout_seconds)
    }

    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

/// Parse `key` from the environment, using `default` when it is unset or unparseable.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    parse_or(env::var(key).ok().as_deref(), default)
}

fn parse_or<T: FromStr>(raw: Option<&str>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn required<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, ConfigError> {
    value.ok_or(ConfigError::Missing(name))
}

/// Make sure the host URL has a scheme, defaulting to https.
///
/// Cloud hosts are often pasted without a scheme (`us-east-1-1.aws.cloud2.influxdata.com`),
/// and anything that is not http or https is replaced with https.
///
/// # Errors
///
/// Returns `ConfigError::InvalidHost` if the result has no host component.
pub fn normalize_host(raw: &str) -> Result<String, ConfigError> {
    let raw = raw.trim();
    let without_scheme = match raw.split_once("://") {
        Some((scheme, rest))
            if scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https") =>
        {
            return parse_host(&format!("{}://{rest}", scheme.to_ascii_lowercase()), raw);
        }
        Some((_, rest)) => rest,
        None => raw,
    };

    parse_host(&format!("https://{without_scheme}"), raw)
}

fn parse_host(candidate: &str, raw: &str) -> Result<String, ConfigError> {
    let url = Url::parse(candidate).map_err(|_| ConfigError::InvalidHost(raw.to_string()))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::InvalidHost(raw.to_string()));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Host URL is not valid: {0}")]
    InvalidHost(String),
}
