//! Carga y gestión de configuración de la aplicación (CMS + servidor gateway).

use std::env;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use url::Url;

/// Host del CMS en producción cuando no se define `CMS_BASE_URL`.
pub const PRODUCTION_BASE_URL: &str = "https://api.bqlkkt.vn";
/// Proxy local que sustituye al "mismo origen" del front-end en desarrollo.
pub const DEVELOPMENT_BASE_URL: &str = "http://127.0.0.1:8080";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(anyhow!("Entorno no soportado: {other}")),
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            Self::Development => DEVELOPMENT_BASE_URL,
            Self::Production => PRODUCTION_BASE_URL,
        }
    }
}

/// Configuración completa de la aplicación.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub environment: Environment,
    pub cms_base_url: String,
    pub cms_timeout: Duration,
    pub server_addr: String,

    pub retry_max_attempts: u32,
    pub cache_sweep_interval: Duration,
}

impl AppConfig {
    /// Configuración mínima para apuntar a un CMS concreto (tests, herramientas).
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        Self {
            environment: Environment::Development,
            cms_base_url: normalize_base_url(&base_url.into()),
            cms_timeout: Duration::from_secs(20),
            server_addr: "127.0.0.1:3322".to_string(),
            retry_max_attempts: 3,
            cache_sweep_interval: Duration::from_secs(60),
        }
    }

    /// Carga la configuración desde variables de entorno (usando .env si existe).
    pub fn from_env() -> Result<Self> {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let environment = Environment::from_str(&env_str)?;

        let raw_base = env::var("CMS_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| environment.default_base_url().to_string());
        Url::parse(&raw_base).with_context(|| format!("CMS_BASE_URL no es una URL válida: {raw_base}"))?;
        let cms_base_url = normalize_base_url(&raw_base);

        let cms_timeout = Duration::from_secs(parse_var("CMS_TIMEOUT_SECS", 20)?);
        let server_addr =
            env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:3322".to_string());

        let retry_max_attempts = parse_var("RETRY_MAX_ATTEMPTS", 3)? as u32;
        if retry_max_attempts == 0 {
            return Err(anyhow!("RETRY_MAX_ATTEMPTS debe ser al menos 1"));
        }
        let cache_sweep_interval = Duration::from_secs(parse_var("CACHE_SWEEP_SECS", 60)?);

        Ok(Self {
            environment,
            cms_base_url,
            cms_timeout,
            server_addr,
            retry_max_attempts,
            cache_sweep_interval,
        })
    }
}

fn parse_var(name: &str, default: u64) -> Result<u64> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{name} debe ser un entero positivo, recibido '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}
