use std::env;
use std::time::Duration;
use uuid::Uuid;

/// Longest token lifetime accepted from the environment (one year)
pub const MAX_JWT_EXPIRY_MINUTES: i64 = 60 * 24 * 365;

#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_expiry_minutes: i64,
    pub cache_ttl_seconds: u64,
    /// Directory for the JSON collection files. `None` keeps everything in memory.
    pub data_dir: Option<String>,
    pub bcrypt_cost: u32,
    pub cors_origins: Vec<String>,
    pub request_timeout_seconds: u64,
    pub max_body_bytes: usize,
    pub rate_limit_max_requests: usize,
    pub rate_limit_window_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            jwt_secret: random_secret(),
            jwt_expiry_minutes: 30,
            cache_ttl_seconds: 60,
            data_dir: None,
            bcrypt_cost: 12,
            cors_origins: vec!["*".to_string()],
            request_timeout_seconds: 30,
            max_body_bytes: 10 * 1024, // 10KB
            rate_limit_max_requests: 1000,
            rate_limit_window_seconds: 3600,
        }
    }
}

// The secret is redacted so the config can be logged at startup
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("jwt_secret", &"<redacted>")
            .field("jwt_expiry_minutes", &self.jwt_expiry_minutes)
            .field("cache_ttl_seconds", &self.cache_ttl_seconds)
            .field("data_dir", &self.data_dir)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("cors_origins", &self.cors_origins)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("rate_limit_max_requests", &self.rate_limit_max_requests)
            .field("rate_limit_window_seconds", &self.rate_limit_window_seconds)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = env::var("HOST") {
            config.host = host;
        }

        if let Ok(port) = env::var("PORT") {
            if let Ok(port_num) = port.parse::<u16>() {
                config.port = port_num;
            }
        }

        match env::var("JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => config.jwt_secret = secret,
            _ => tracing::warn!(
                "JWT_SECRET is not set; using a random secret, tokens will not survive a restart"
            ),
        }

        if let Ok(expiry) = env::var("JWT_EXPIRY_MINUTES") {
            if let Some(minutes) = parse_expiry_minutes(&expiry) {
                config.jwt_expiry_minutes = minutes;
            }
        }

        if let Ok(ttl) = env::var("CACHE_TTL_SECONDS") {
            if let Ok(seconds) = ttl.parse::<u64>() {
                config.cache_ttl_seconds = seconds;
            }
        }

        if let Ok(data_dir) = env::var("DATA_DIR") {
            if !data_dir.trim().is_empty() {
                config.data_dir = Some(data_dir);
            }
        }

        if let Ok(cost) = env::var("BCRYPT_COST") {
            if let Ok(cost_num) = cost.parse::<u32>() {
                // bcrypt only accepts 4..=31
                config.bcrypt_cost = cost_num.clamp(4, 31);
            }
        }

        if let Ok(origins) = env::var("CORS_ORIGINS") {
            config.cors_origins = origins.split(',').map(|s| s.trim().to_string()).collect();
        }

        if let Ok(timeout) = env::var("REQUEST_TIMEOUT_SECONDS") {
            if let Ok(timeout_num) = timeout.parse::<u64>() {
                config.request_timeout_seconds = timeout_num;
            }
        }

        if let Ok(max_body) = env::var("MAX_BODY_BYTES") {
            if let Ok(bytes) = max_body.parse::<usize>() {
                config.max_body_bytes = bytes;
            }
        }

        if let Ok(max_requests) = env::var("RATE_LIMIT_MAX_REQUESTS") {
            if let Ok(max) = max_requests.parse::<usize>() {
                config.rate_limit_max_requests = max;
            }
        }

        if let Ok(window) = env::var("RATE_LIMIT_WINDOW_SECONDS") {
            if let Ok(seconds) = window.parse::<u64>() {
                config.rate_limit_window_seconds = seconds;
            }
        }

        config
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_seconds)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|origin| origin == "*")
    }
}

/// Positive minute counts, capped at `MAX_JWT_EXPIRY_MINUTES`
fn parse_expiry_minutes(raw: &str) -> Option<i64> {
    let minutes = raw.trim().parse::<i64>().ok().filter(|m| *m > 0)?;

    if minutes > MAX_JWT_EXPIRY_MINUTES {
        tracing::warn!(
            "JWT_EXPIRY_MINUTES={} exceeds the maximum, using {}",
            minutes,
            MAX_JWT_EXPIRY_MINUTES
        );
        return Some(MAX_JWT_EXPIRY_MINUTES);
    }

    Some(minutes)
}

fn random_secret() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}
