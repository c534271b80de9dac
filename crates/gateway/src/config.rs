//! Gateway configuration.

use std::env;

/// Default request body limit (10 MiB), shared with the document intake.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// HS256 secret shared with the identity provider
    pub jwt_secret: String,
    /// Largest accepted request body in bytes
    pub max_upload_bytes: usize,
    /// Origins allowed by CORS; empty means any
    pub allowed_origins: Vec<String>,
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: env::var("GATEWAY_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("GATEWAY_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            jwt_secret: env::var("IDENTITY_JWT_SECRET")
                .unwrap_or_else(|_| "change-me-in-production".to_string()),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// Upload limit plus room for base64 expansion and the JSON envelope.
    pub fn body_limit(&self) -> usize {
        self.max_upload_bytes / 3 * 4 + 64 * 1024
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            jwt_secret: "change-me-in-production".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_origins: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_limit_covers_base64_payload() {
        let config = GatewayConfig {
            max_upload_bytes: 3 * 1024,
            ..Default::default()
        };
        assert!(config.body_limit() > 4 * 1024);
    }
}
