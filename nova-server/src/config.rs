//! Server configuration

use crate::error::BoxError;

/// Default upload limit (5 MiB)
const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Server configuration, loaded from the environment (and `.env`)
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// HS256 signing secret
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    /// Directory holding uploaded images
    pub upload_dir: String,
    /// Allowed CORS origins; empty means any origin
    pub cors_allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: parse_env("HTTP_PORT").unwrap_or(8080),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            jwt_expiry_hours: parse_env("JWT_EXPIRY_HOURS").unwrap_or(24),
            upload_dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into()),
            cors_allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                .map(|v| parse_origins(&v))
                .unwrap_or_default(),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES").unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            environment,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Configuration for tests and local tooling
    pub fn for_tests(upload_dir: &str) -> Self {
        Self {
            database_url: "postgres://localhost/nova_test".into(),
            http_port: 0,
            environment: "development".into(),
            jwt_secret: "test-secret-with-enough-entropy-0123456789".into(),
            jwt_expiry_hours: 24,
            upload_dir: upload_dir.into(),
            cors_allowed_origins: Vec::new(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "*")
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_wildcard_ignored() {
        assert_eq!(
            parse_origins(" https://app.luanova.com.br, http://localhost:3000 ,,"),
            vec!["https://app.luanova.com.br", "http://localhost:3000"]
        );
        assert!(parse_origins("*").is_empty());
    }
}
