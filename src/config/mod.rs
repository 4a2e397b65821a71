use crate::error::{IntakeError, Result};
use crate::rate_limit::types::EndpointPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main intake service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitSettings,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    /// Enable rate limiting
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Redis configuration for the shared counter store.
    /// When absent the service runs without enforcement (fail open).
    #[serde(default)]
    pub redis: Option<RedisConfig>,
    /// Upper bound for a single counter store operation, in milliseconds.
    /// Store calls that exceed it are treated as store failures (fail open).
    #[serde(default = "default_store_op_timeout_ms")]
    pub store_op_timeout_ms: u64,
    /// Per-endpoint policies (endpoint name -> limits)
    #[serde(default = "default_policies")]
    pub policies: Vec<EndpointPolicy>,
}

/// Redis configuration for the counter store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL
    pub url: String,
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout() -> u64 {
    30
}

fn default_store_op_timeout_ms() -> u64 {
    500
}

/// Default policies match the two intake endpoints: a low-frequency write
/// endpoint and a higher-frequency read endpoint.
fn default_policies() -> Vec<EndpointPolicy> {
    vec![
        EndpointPolicy {
            endpoint: "postIssue".to_string(),
            max_requests: 10,
            window_secs: 60,
            block_secs: 300,
        },
        EndpointPolicy {
            endpoint: "getIssues".to_string(),
            max_requests: 60,
            window_secs: 60,
            block_secs: 60,
        },
    ]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            redis: None,
            store_op_timeout_ms: default_store_op_timeout_ms(),
            policies: default_policies(),
        }
    }
}

impl IntakeConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| IntakeError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| IntakeError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();

        for policy in &self.rate_limiting.policies {
            if policy.endpoint.is_empty() {
                return Err(IntakeError::Config(
                    "Rate limit endpoint name cannot be empty".to_string(),
                ));
            }

            if policy.max_requests == 0 {
                return Err(IntakeError::Config(format!(
                    "Rate limit max_requests must be > 0 for endpoint: {}",
                    policy.endpoint
                )));
            }

            if policy.window_secs == 0 {
                return Err(IntakeError::Config(format!(
                    "Rate limit window must be > 0 for endpoint: {}",
                    policy.endpoint
                )));
            }

            if !seen.insert(policy.endpoint.as_str()) {
                return Err(IntakeError::Config(format!(
                    "Duplicate rate limit policy for endpoint: {}",
                    policy.endpoint
                )));
            }
        }

        if let Some(redis) = &self.rate_limiting.redis {
            if !redis.url.starts_with("redis://") && !redis.url.starts_with("rediss://") {
                return Err(IntakeError::Config(format!(
                    "Redis URL must start with redis:// or rediss://: {}",
                    redis.url
                )));
            }
        }

        Ok(())
    }

    /// Create a default configuration for testing
    pub fn default_config() -> Self {
        Self {
            server: ServerConfig::default(),
            rate_limiting: RateLimitSettings::default(),
        }
    }
}
