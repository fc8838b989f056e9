//! Shared constants and invariants

pub const DEFAULT_REFRESH_THRESHOLD: f64 = 0.85;
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5000;

/// The refresh threshold must lie strictly inside this interval.
pub const REFRESH_THRESHOLD_MIN: f64 = 0.1;
pub const REFRESH_THRESHOLD_MAX: f64 = 1.0;

// Environment overrides
pub const ENV_REFRESH_THRESHOLD: &str = "IAM_TOKEN_REFRESH_THRESHOLD";
pub const ENV_HTTP_TIMEOUT_MS: &str = "IAM_TOKEN_HTTP_TIMEOUT_MS";

// Wire protocol of the token endpoint
pub const TOKEN_PATH: &str = "/identity/token";
pub const GRANT_TYPE_APIKEY: &str = "urn:ibm:params:oauth:grant-type:apikey";
pub const RESPONSE_TYPE_CLOUD_IAM: &str = "cloud_iam";

/// Error-response bodies are truncated to this many bytes in diagnostics.
pub const BODY_SNIPPET_MAX: usize = 2048;
