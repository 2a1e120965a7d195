use std::env;
use std::time::Duration;

use crate::error::AppError;

pub const DEFAULT_RATES_API_URL: &str = "https://api.exchangerate-api.com/v4";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub host: String,
    pub app_env: AppEnv,
    pub rates_api_url: String,
    pub rates_timeout: Duration,
    pub request_timeout: Duration,
    pub currencies_base: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppEnv {
    Development,
    Production,
    Test,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            host: "0.0.0.0".into(),
            app_env: AppEnv::Development,
            rates_api_url: DEFAULT_RATES_API_URL.into(),
            rates_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            currencies_base: "USD".into(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // Server config
        let port = match lookup("PORT") {
            Some(port) => port
                .parse::<u16>()
                .map_err(|_| AppError::ConfigError("Invalid PORT".into()))?,
            None => defaults.port,
        };

        let host = lookup("HOST").unwrap_or(defaults.host);

        let app_env_str = lookup("APP_ENV").unwrap_or_else(|| "development".into());
        let app_env = match app_env_str.to_lowercase().as_str() {
            "production" => AppEnv::Production,
            "test" => AppEnv::Test,
            _ => AppEnv::Development,
        };

        // Rate provider config
        let rates_api_url = lookup("RATES_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.rates_api_url);
        if rates_api_url.is_empty() {
            return Err(AppError::ConfigError("RATES_API_URL must not be empty".into()));
        }

        let rates_timeout = match lookup("RATES_TIMEOUT_SECS") {
            Some(value) => parse_duration(&value)
                .map_err(|_| AppError::ConfigError("Invalid RATES_TIMEOUT_SECS format".into()))?,
            None => defaults.rates_timeout,
        };

        let request_timeout = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(value) => parse_duration(&value)
                .map_err(|_| AppError::ConfigError("Invalid REQUEST_TIMEOUT_SECS format".into()))?,
            None => defaults.request_timeout,
        };

        let currencies_base = lookup("CURRENCIES_BASE")
            .map(|base| base.trim().to_uppercase())
            .filter(|base| !base.is_empty())
            .unwrap_or(defaults.currencies_base);

        Ok(Self {
            port,
            host,
            app_env,
            rates_api_url,
            rates_timeout,
            request_timeout,
            currencies_base,
        })
    }
}

fn parse_duration(duration_str: &str) -> Result<Duration, &'static str> {
    let duration_str = duration_str.trim();

    if duration_str.is_empty() {
        return Err("Duration string is empty");
    }

    // Extract the number and unit parts
    let len = duration_str.len();
    let (num_part, unit_part) = duration_str.split_at(
        duration_str
            .chars()
            .position(|c| !c.is_ascii_digit())
            .unwrap_or(len),
    );

    let num = num_part.parse::<u64>().map_err(|_| "Invalid number")?;
    if num == 0 {
        return Err("Duration must be positive");
    }

    match unit_part {
        "" | "s" => Ok(Duration::from_secs(num)),
        "m" => Ok(Duration::from_secs(num * 60)),
        "h" => Ok(Duration::from_secs(num * 60 * 60)),
        _ => Err("Unknown time unit, use s, m, or h"),
    }
}
