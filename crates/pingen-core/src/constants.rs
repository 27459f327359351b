/// Client-wide constants

/// A cached token is only reused while it has more than this many seconds left
pub const TOKEN_EXPIRY_SKEW_SECS: i64 = 30;

/// File uploads never use a timeout shorter than this
pub const MIN_UPLOAD_TIMEOUT_SECS: u64 = 60;

/// Default per-request HTTP timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Scope requested when a token is obtained implicitly
pub const DEFAULT_SCOPE: &str = "letter batch webhook organisation_read";

pub const USER_AGENT: &str = concat!("pingen-cli/", env!("CARGO_PKG_VERSION"));

pub const JSON_API_CONTENT_TYPE: &str = "application/vnd.api+json";

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

pub const FALLBACK_FILE_NAME: &str = "document.pdf";

// Default service hosts per environment
pub const STAGING_API_BASE: &str = "https://api-staging.pingen.com";
pub const STAGING_IDENTITY_BASE: &str = "https://identity-staging.pingen.com";
pub const PRODUCTION_API_BASE: &str = "https://api.pingen.com";
pub const PRODUCTION_IDENTITY_BASE: &str = "https://identity.pingen.com";
