//! Configuration module
//!
//! Environment-driven configuration for the API and background services.
//! Operational tuning parameters (credential expiries, orphan grace window,
//! storage retry budget, draft conflict policy) are configuration here rather
//! than constants in the code paths that use them.

use std::env;

const DB_MAX_CONNECTIONS: u32 = 20;
const DB_TIMEOUT_SECS: u64 = 30;
const UPLOAD_URL_EXPIRY_SECS: u64 = 900;
const DOWNLOAD_URL_EXPIRY_SECS: u64 = 300;
const ORPHAN_GRACE_MINUTES: i64 = 60;
const SWEEP_INTERVAL_SECS: u64 = 900;
const STORAGE_RETRY_MAX_ATTEMPTS: u32 = 3;
const STORAGE_RETRY_BASE_DELAY_MS: u64 = 200;
const MAX_EVIDENCE_SIZE_MB: usize = 25;

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    S3,
    Local,
}

/// Policy when a second active draft is attempted for the same
/// (user, report type) slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftConflictPolicy {
    /// Upsert into the single active slot (last writer wins). Default.
    Replace,
    /// Surface a conflict instead of touching the existing draft.
    Reject,
}

/// Application configuration, loaded once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub local_storage_path: Option<String>,
    // Presign / lifecycle tuning
    pub upload_url_expiry_secs: u64,
    pub download_url_expiry_secs: u64,
    pub orphan_grace_minutes: i64,
    pub sweep_interval_secs: u64,
    pub storage_retry_max_attempts: u32,
    pub storage_retry_base_delay_ms: u64,
    // Draft autosave
    pub draft_conflict_policy: DraftConflictPolicy,
    // Upload validation
    pub max_evidence_size_bytes: usize,
    pub allowed_content_types: Vec<String>,
}

impl Config {
    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production = {
            let env = environment.to_lowercase();
            env == "production" || env == "prod"
        };
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let storage_backend = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "s3".to_string())
            .to_lowercase()
            .as_str()
        {
            "s3" => StorageBackend::S3,
            "local" => StorageBackend::Local,
            other => {
                return Err(anyhow::anyhow!(
                    "STORAGE_BACKEND must be 's3' or 'local', got '{}'",
                    other
                ))
            }
        };

        let draft_conflict_policy = match env::var("DRAFT_CONFLICT_POLICY")
            .unwrap_or_else(|_| "replace".to_string())
            .to_lowercase()
            .as_str()
        {
            "replace" => DraftConflictPolicy::Replace,
            "reject" => DraftConflictPolicy::Reject,
            other => {
                return Err(anyhow::anyhow!(
                    "DRAFT_CONFLICT_POLICY must be 'replace' or 'reject', got '{}'",
                    other
                ))
            }
        };

        let max_evidence_size_mb = env::var("MAX_EVIDENCE_SIZE_MB")
            .unwrap_or_else(|_| MAX_EVIDENCE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_EVIDENCE_SIZE_MB);

        let allowed_content_types = env::var("ALLOWED_CONTENT_TYPES")
            .unwrap_or_else(|_| "image/jpeg,image/png,image/webp,application/pdf".to_string())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let config = Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            cors_origins,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| DB_MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(DB_MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| DB_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(DB_TIMEOUT_SECS),
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            upload_url_expiry_secs: env::var("UPLOAD_URL_EXPIRY_SECS")
                .unwrap_or_else(|_| UPLOAD_URL_EXPIRY_SECS.to_string())
                .parse()
                .unwrap_or(UPLOAD_URL_EXPIRY_SECS),
            download_url_expiry_secs: env::var("DOWNLOAD_URL_EXPIRY_SECS")
                .unwrap_or_else(|_| DOWNLOAD_URL_EXPIRY_SECS.to_string())
                .parse()
                .unwrap_or(DOWNLOAD_URL_EXPIRY_SECS),
            orphan_grace_minutes: env::var("ORPHAN_GRACE_MINUTES")
                .unwrap_or_else(|_| ORPHAN_GRACE_MINUTES.to_string())
                .parse()
                .unwrap_or(ORPHAN_GRACE_MINUTES),
            sweep_interval_secs: env::var("SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|_| SWEEP_INTERVAL_SECS.to_string())
                .parse()
                .unwrap_or(SWEEP_INTERVAL_SECS),
            storage_retry_max_attempts: env::var("STORAGE_RETRY_MAX_ATTEMPTS")
                .unwrap_or_else(|_| STORAGE_RETRY_MAX_ATTEMPTS.to_string())
                .parse()
                .unwrap_or(STORAGE_RETRY_MAX_ATTEMPTS),
            storage_retry_base_delay_ms: env::var("STORAGE_RETRY_BASE_DELAY_MS")
                .unwrap_or_else(|_| STORAGE_RETRY_BASE_DELAY_MS.to_string())
                .parse()
                .unwrap_or(STORAGE_RETRY_BASE_DELAY_MS),
            draft_conflict_policy,
            max_evidence_size_bytes: max_evidence_size_mb * 1024 * 1024,
            allowed_content_types,
        };

        config.validate()?;
        Ok(config)
    }

    /// Cross-field validation that from_env alone cannot express.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() || self.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET and S3_REGION must be set when STORAGE_BACKEND=s3"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when STORAGE_BACKEND=local"
                    ));
                }
            }
        }
        if self.upload_url_expiry_secs == 0 {
            return Err(anyhow::anyhow!("UPLOAD_URL_EXPIRY_SECS must be positive"));
        }
        if self.orphan_grace_minutes <= 0 {
            return Err(anyhow::anyhow!("ORPHAN_GRACE_MINUTES must be positive"));
        }
        Ok(())
    }

    /// Upload validation limits derived from configuration.
    pub fn upload_limits(&self) -> crate::validation::UploadLimits {
        crate::validation::UploadLimits {
            max_size_bytes: self.max_evidence_size_bytes,
            allowed_content_types: self.allowed_content_types.clone(),
        }
    }

    /// Bucket name as exposed in presign responses. Local/dev backends report
    /// a pseudo-bucket so the response shape stays stable.
    pub fn bucket_name(&self) -> String {
        self.s3_bucket
            .clone()
            .unwrap_or_else(|| "local".to_string())
    }
}

impl Default for DraftConflictPolicy {
    fn default() -> Self {
        DraftConflictPolicy::Replace
    }
}
