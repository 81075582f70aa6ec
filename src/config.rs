use crate::{models::bucket::BucketRef, services::storage_service::DEFAULT_UPLOAD_DEADLINE};
use anyhow::{Context, Result};
use clap::Parser;
use std::{env, str::FromStr, time::Duration};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Centralized application configuration.
/// Combines environment variables (optionally from `.env`) and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub bucket: BucketRef,
    pub upload_timeout: Duration,
    pub max_upload_bytes: usize,
    pub in_memory: bool,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(
    author,
    version,
    about = "Upload a file over HTTP and get back its public Cloud Storage URL"
)]
pub struct Args {
    /// Host to bind to (overrides UPLOADER_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides UPLOADER_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Destination bucket (overrides BUCKET_NAME)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Deadline for writing and committing one object (overrides UPLOAD_TIMEOUT_SECS)
    #[arg(long)]
    pub upload_timeout_secs: Option<u64>,

    /// Largest accepted request body (overrides UPLOADER_MAX_UPLOAD_BYTES)
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,

    /// Keep objects in process memory instead of Cloud Storage
    #[arg(long)]
    pub in_memory: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::resolve(Args::parse(), |key| env::var(key).ok())
    }

    fn resolve(args: Args, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bucket_name = args.bucket.or_else(|| env("BUCKET_NAME")).unwrap_or_default();
        let bucket = BucketRef::new(bucket_name)
            .context("BUCKET_NAME is required (environment, .env or --bucket)")?;

        let port = match args.port {
            Some(port) => port,
            None => parse_var(&env, "UPLOADER_PORT", 8080)?,
        };
        let timeout_secs = match args.upload_timeout_secs {
            Some(secs) => secs,
            None => parse_var(&env, "UPLOAD_TIMEOUT_SECS", DEFAULT_UPLOAD_DEADLINE.as_secs())?,
        };
        if timeout_secs == 0 {
            anyhow::bail!("upload timeout must be at least one second");
        }
        let max_upload_bytes = match args.max_upload_bytes {
            Some(max) => max,
            None => parse_var(&env, "UPLOADER_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        };

        Ok(Self {
            host: args
                .host
                .or_else(|| env("UPLOADER_HOST"))
                .unwrap_or_else(|| "0.0.0.0".into()),
            port,
            bucket,
            upload_timeout: Duration::from_secs(timeout_secs),
            max_upload_bytes,
            in_memory: args.in_memory,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(env: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env(key) {
        Some(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", key, value)),
        None => Ok(default),
    }
}
