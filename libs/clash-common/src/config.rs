// Sandbox and proxy configuration, read from the environment once at startup
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_SANDBOX_URL: &str = "https://judge0-ce.p.rapidapi.com";
pub const DEFAULT_SANDBOX_HOST: &str = "judge0-ce.p.rapidapi.com";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("SANDBOX_API_KEY is not set; the proxy cannot authenticate with the sandbox")]
    MissingApiKey,
    #[error("invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// How the client waits for a submission to finish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStrategy {
    /// `wait=true`: the sandbox blocks until the run completes
    Wait,
    /// Submit, then fetch by token until the status leaves the queue
    Poll {
        interval: Duration,
        max_attempts: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SandboxConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub api_host: String,
    pub strategy: SubmissionStrategy,
    /// Seconds of CPU time per submission
    pub cpu_time_limit: f64,
    /// Kilobytes
    pub memory_limit_kb: u64,
    pub request_timeout: Duration,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SANDBOX_URL.to_string(),
            api_key: None,
            api_host: DEFAULT_SANDBOX_HOST.to_string(),
            strategy: SubmissionStrategy::Wait,
            cpu_time_limit: 5.0,
            memory_limit_kb: 128_000,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl SandboxConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source; unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let strategy = match get("SANDBOX_STRATEGY").as_deref().map(str::trim) {
            None | Some("wait") => SubmissionStrategy::Wait,
            Some("poll") => SubmissionStrategy::Poll {
                interval: Duration::from_millis(parse_or("SANDBOX_POLL_INTERVAL_MS", get("SANDBOX_POLL_INTERVAL_MS"), 1000)?),
                max_attempts: parse_or("SANDBOX_MAX_POLL_ATTEMPTS", get("SANDBOX_MAX_POLL_ATTEMPTS"), 10)?,
            },
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "SANDBOX_STRATEGY",
                    value: other.to_string(),
                    reason: "expected 'wait' or 'poll'".to_string(),
                })
            }
        };

        Ok(Self {
            base_url: get("SANDBOX_URL")
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            api_key: get("SANDBOX_API_KEY").map(|k| k.trim().to_string()),
            api_host: get("SANDBOX_API_HOST").unwrap_or(defaults.api_host),
            strategy,
            cpu_time_limit: parse_or("SANDBOX_CPU_TIME_LIMIT", get("SANDBOX_CPU_TIME_LIMIT"), defaults.cpu_time_limit)?,
            memory_limit_kb: parse_or("SANDBOX_MEMORY_LIMIT_KB", get("SANDBOX_MEMORY_LIMIT_KB"), defaults.memory_limit_kb)?,
            request_timeout: Duration::from_millis(parse_or(
                "SANDBOX_REQUEST_TIMEOUT_MS",
                get("SANDBOX_REQUEST_TIMEOUT_MS"),
                defaults.request_timeout.as_millis() as u64,
            )?),
        })
    }
}

/// Proxy settings. Unlike clients, the proxy refuses to start without a key.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyConfig {
    pub listen_addr: SocketAddr,
    pub upstream: SandboxConfig,
    pub api_key: String,
}

impl ProxyConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let upstream = SandboxConfig::from_lookup(&lookup)?;
        let api_key = upstream.api_key.clone().ok_or(ConfigError::MissingApiKey)?;

        let addr = lookup("PROXY_LISTEN_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let listen_addr = addr.trim().parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::InvalidValue {
                name: "PROXY_LISTEN_ADDR",
                value: addr.clone(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            listen_addr,
            upstream,
            api_key,
        })
    }
}

fn parse_or<T>(name: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            name,
            value: raw,
            reason: e.to_string(),
        }),
    }
}
