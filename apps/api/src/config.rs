use anyhow::{bail, Context, Result};

/// Application configuration loaded from environment variables.
/// Everything has a default except the S3 group, which is all-or-nothing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. When unset the API runs on the in-memory store.
    pub database_url: Option<String>,
    pub upload_dir: String,
    pub s3: Option<S3Config>,
    /// Comma-separated allowed origins; permissive CORS when unset.
    pub cors_allow_origin: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub endpoint: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            upload_dir: optional_env("UPLOAD_DIR").unwrap_or_else(|| "./uploads".to_string()),
            s3: S3Config::from_env()?,
            cors_allow_origin: optional_env("CORS_ALLOW_ORIGIN"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

impl S3Config {
    /// `None` when `S3_BUCKET` is unset; an error when it is set without the rest.
    fn from_env() -> Result<Option<Self>> {
        let Some(bucket) = optional_env("S3_BUCKET") else {
            return Ok(None);
        };
        let endpoint = require_env("S3_ENDPOINT")?;
        let access_key_id = require_env("AWS_ACCESS_KEY_ID")?;
        let secret_access_key = require_env("AWS_SECRET_ACCESS_KEY")?;
        if endpoint.is_empty() {
            bail!("S3_ENDPOINT cannot be empty when S3_BUCKET is set");
        }
        Ok(Some(S3Config {
            bucket,
            endpoint,
            region: optional_env("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            access_key_id,
            secret_access_key,
        }))
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
