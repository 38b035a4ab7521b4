/*
 * Responsibility
 * - 環境変数や設定の読み込み (PORT, PUBLIC_BASE_URL, DPoP ポリシーなど)
 * - 設定値のバリデーション (不正なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;

use crate::services::dpop::{DEFAULT_CLOCK_SKEW_SECONDS, SUPPORTED_ALGORITHMS, ValidatorConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn parse(value: Option<&str>) -> Self {
        match value.unwrap_or("development").to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    // e.g. https://api.example.com ; used to rebuild htu behind a proxy
    pub public_base_url: Option<String>,
    pub request_timeout: Duration,

    pub dpop: ValidatorConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `get` instead of the process env.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port: u16 = match get("PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(get("APP_ENV").as_deref());

        let public_base_url = match get("PUBLIC_BASE_URL").filter(|s| !s.trim().is_empty()) {
            Some(base) => {
                let parsed =
                    url::Url::parse(&base).map_err(|_| ConfigError::Invalid("PUBLIC_BASE_URL"))?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(ConfigError::Invalid("PUBLIC_BASE_URL"));
                }
                Some(base.trim_end_matches('/').to_string())
            }
            None => None,
        };

        let request_timeout = get("REQUEST_TIMEOUT_SECONDS")
            .map(|v| v.parse::<u64>().map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECONDS")))
            .transpose()?
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));

        let clock_skew_seconds = get("DPOP_CLOCK_SKEW_SECONDS")
            .map(|v| v.parse::<u64>().map_err(|_| ConfigError::Invalid("DPOP_CLOCK_SKEW_SECONDS")))
            .transpose()?
            .unwrap_or(DEFAULT_CLOCK_SKEW_SECONDS);

        let allowed_algorithms = match get("DPOP_ALLOWED_ALGS") {
            Some(list) => parse_algorithms(&list)?,
            None => ValidatorConfig::default().allowed_algorithms,
        };

        Ok(Self {
            addr,
            app_env,
            public_base_url,
            request_timeout,
            dpop: ValidatorConfig {
                allowed_algorithms,
                clock_skew_seconds,
            },
        })
    }
}

fn parse_algorithms(list: &str) -> Result<Vec<Algorithm>, ConfigError> {
    let algs = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|name| {
            Algorithm::from_str(name)
                .ok()
                .filter(|alg| SUPPORTED_ALGORITHMS.contains(alg))
                .ok_or(ConfigError::Invalid("DPOP_ALLOWED_ALGS"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if algs.is_empty() {
        return Err(ConfigError::Invalid("DPOP_ALLOWED_ALGS"));
    }
    Ok(algs)
}
