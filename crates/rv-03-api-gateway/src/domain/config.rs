//! Gateway configuration. Every section has defaults; `validate` runs once
//! at startup.

use serde::{Deserialize, Serialize};
use shared_types::{CountryCode, ResolvedIdentity, Role, UserId};
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Upper bound accepted for `limits.max_batch_size`.
pub const MAX_BATCH_SIZE_CEILING: usize = 10_000;

/// `[http]`, `[websocket]`, `[limits]`, `[timeouts]`, `[cors]`, `[auth]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub http: HttpConfig,
    pub websocket: WebSocketConfig,
    pub limits: LimitsConfig,
    pub timeouts: TimeoutConfig,
    pub cors: CorsConfig,
    /// Static bearer tokens
    pub auth: AuthConfig,
}

impl GatewayConfig {
    /// Reject settings the gateway cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_body_size == 0 {
            return Err(ConfigError::InvalidLimit("max_body_size cannot be 0".into()));
        }

        if self.limits.max_batch_size == 0 || self.limits.max_batch_size > MAX_BATCH_SIZE_CEILING
        {
            return Err(ConfigError::InvalidLimit(format!(
                "max_batch_size must be between 1 and {}",
                MAX_BATCH_SIZE_CEILING
            )));
        }

        if self.websocket.queue_capacity == 0 {
            return Err(ConfigError::InvalidLimit(
                "websocket queue_capacity cannot be 0".into(),
            ));
        }

        if self.timeouts.request.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "request timeout cannot be 0".into(),
            ));
        }

        if self.websocket.handshake_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "handshake_timeout cannot be 0".into(),
            ));
        }

        let mut seen = HashSet::new();
        for entry in &self.auth.tokens {
            if entry.token.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "empty token configured for user {}",
                    entry.user_id
                )));
            }
            if !seen.insert(entry.token.as_str()) {
                return Err(ConfigError::DuplicateToken(entry.user_id.to_string()));
            }
        }

        Ok(())
    }

    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSocketConfig {
    /// Window in which a client must present a valid credential
    #[serde(with = "humantime_serde")]
    pub handshake_timeout: Duration,
    /// Outbound frames buffered per connection before drops start
    pub queue_capacity: usize,
    /// Largest inbound frame accepted
    pub max_message_size: usize,
    /// Server ping interval
    #[serde(with = "humantime_serde")]
    pub ping_interval: Duration,
    /// Close connections silent for this long
    #[serde(with = "humantime_serde")]
    pub idle_timeout: Duration,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(10),
            queue_capacity: rv_02_realtime::DEFAULT_QUEUE_CAPACITY,
            max_message_size: 64 * 1024,
            ping_interval: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Bytes; larger bodies get 413.
    pub max_body_size: usize,
    /// Max ids in one batch transition
    pub max_batch_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 1 << 20,
            max_batch_size: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Whole-request timeout for REST routes
    #[serde(with = "humantime_serde")]
    pub request: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(10),
        }
    }
}

/// Browser access. Credentials are only honoured with explicit origins
/// and headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,
    /// `"*"` allows any origin.
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    /// Preflight cache lifetime in seconds.
    pub max_age: u64,
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
            allowed_methods: ["GET", "POST", "PATCH", "DELETE", "OPTIONS"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            allowed_headers: ["Content-Type", "Authorization"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
            max_age: 24 * 60 * 60,
            allow_credentials: false,
        }
    }
}

/// Static bearer tokens standing in for an external identity provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub tokens: Vec<TokenEntry>,
}

/// One `[[auth.tokens]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenEntry {
    pub token: String,
    pub user_id: UserId,
    pub role: Role,
    pub country: CountryCode,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl TokenEntry {
    pub fn identity(&self) -> ResolvedIdentity {
        ResolvedIdentity {
            user_id: self.user_id.clone(),
            role: self.role,
            country: self.country,
            is_active: self.active,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    /// Two users share one bearer token
    #[error("duplicate token configured (user {0})")]
    DuplicateToken(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Durations as `"500ms"`, `"10s"`, `"2m"` or a bare number of seconds.
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let text = match duration.subsec_millis() {
            0 => format!("{}s", duration.as_secs()),
            _ => format!("{}ms", duration.as_millis()),
        };
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_duration(&text).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse_duration(text: &str) -> Result<Duration, String> {
        let text = text.trim();
        // Longest suffix first: "ms" also ends in "s".
        let (digits, millis_per_unit) = [("ms", 1), ("s", 1_000), ("m", 60_000)]
            .into_iter()
            .find_map(|(suffix, unit)| text.strip_suffix(suffix).map(|d| (d.trim(), unit)))
            .unwrap_or((text, 1_000));

        digits
            .parse::<u64>()
            .ok()
            .and_then(|n| n.checked_mul(millis_per_unit))
            .map(Duration::from_millis)
            .ok_or_else(|| format!("invalid duration {:?}", text))
    }
}
