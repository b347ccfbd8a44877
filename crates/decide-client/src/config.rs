//! Client configuration, read from the environment by default.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const BASE_URL_ENV: &str = "DECIDE_API_BASE_URL";
pub const USER_ID_ENV: &str = "DECIDE_USER_ID";

pub const DEFAULT_BASE_URL: &str = "https://decide-api.glowme.kr";
pub const DEFAULT_USER_ID: &str = "person-staff-720";

/// Header carrying the caller's identity on every request.
pub const USER_HEADER: &str = "X-User-ID";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend origin, without a trailing slash.
    pub base_url: String,
    /// Sent as `X-User-ID`.
    pub user_id: String,
    /// Connect timeout. Streams have no overall timeout.
    #[serde(with = "secs")]
    pub connect_timeout: Duration,
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: std::env::var(BASE_URL_ENV)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(|v| trim_base(&v))
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            user_id: std::env::var(USER_ID_ENV)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_USER_ID.to_string()),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

fn trim_base(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

impl ClientConfig {
    /// Configuration from `DECIDE_API_BASE_URL` and `DECIDE_USER_ID`.
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Configuration for a specific backend, with the default identity.
    pub fn new(base_url: &str) -> Self {
        ClientConfig {
            base_url: trim_base(base_url),
            user_id: DEFAULT_USER_ID.to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_user(mut self, user_id: &str) -> Self {
        self.user_id = user_id.to_string();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Absolute URL for `path`. Paths that are already absolute pass through.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }
}
