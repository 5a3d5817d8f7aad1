//! Server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Which payment gateway issues checkout invoices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayKind {
    Xendit,
    Midtrans,
}

impl GatewayKind {
    fn parse(s: &str) -> Result<Self, BoxError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xendit" => Ok(Self::Xendit),
            "midtrans" => Ok(Self::Midtrans),
            other => Err(format!("PAYMENT_GATEWAY must be xendit or midtrans, got {other}").into()),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// HS256 signing secret
    pub jwt_secret: String,
    pub jwt_access_ttl_minutes: i64,
    pub jwt_refresh_ttl_days: i64,
    /// GoTrue-compatible identity provider base URL
    pub identity_url: String,
    pub identity_api_key: String,
    /// S3 bucket for leave attachments
    pub storage_bucket: String,
    /// Public base URL for stored objects (CDN or bucket website)
    pub storage_public_base_url: String,
    /// SES sender email address
    pub ses_from_email: String,
    pub payment_gateway: GatewayKind,
    pub xendit_secret_key: String,
    /// Xendit callback verification key (webhook HMAC)
    pub xendit_callback_token: String,
    pub midtrans_server_key: String,
    pub midtrans_production: bool,
    /// Redirect after a successful checkout
    pub checkout_success_url: String,
    /// Redirect after a failed checkout
    pub checkout_failure_url: String,
    /// `json` for JSON log lines, anything else for human-readable output
    pub log_format: String,
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

    fn env_or(name: &str, default: &str) -> String {
        std::env::var(name).unwrap_or_else(|_| default.into())
    }

    fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
        std::env::var(name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = Self::env_or("ENVIRONMENT", "development");
        let payment_gateway = GatewayKind::parse(&Self::env_or("PAYMENT_GATEWAY", "xendit"))?;

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: Self::env_parse("HTTP_PORT", 8080),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            jwt_access_ttl_minutes: Self::env_parse("JWT_ACCESS_TTL_MINUTES", 60),
            jwt_refresh_ttl_days: Self::env_parse("JWT_REFRESH_TTL_DAYS", 7),
            identity_url: Self::env_or("IDENTITY_URL", "http://localhost:9999"),
            identity_api_key: Self::require_secret("IDENTITY_API_KEY", &environment)?,
            storage_bucket: Self::env_or("STORAGE_BUCKET", "hris-attachments"),
            storage_public_base_url: Self::env_or(
                "STORAGE_PUBLIC_BASE_URL",
                "https://hris-attachments.s3.amazonaws.com",
            ),
            ses_from_email: Self::env_or("SES_FROM_EMAIL", "noreply@hris.local"),
            payment_gateway,
            xendit_secret_key: Self::require_secret("XENDIT_SECRET_KEY", &environment)?,
            xendit_callback_token: Self::require_secret("XENDIT_CALLBACK_TOKEN", &environment)?,
            midtrans_server_key: if payment_gateway == GatewayKind::Midtrans {
                Self::require_secret("MIDTRANS_SERVER_KEY", &environment)?
            } else {
                Self::env_or("MIDTRANS_SERVER_KEY", "")
            },
            midtrans_production: Self::env_parse("MIDTRANS_PRODUCTION", false),
            checkout_success_url: Self::env_or(
                "CHECKOUT_SUCCESS_URL",
                "http://localhost:3000/subscription/success",
            ),
            checkout_failure_url: Self::env_or(
                "CHECKOUT_FAILURE_URL",
                "http://localhost:3000/subscription/failed",
            ),
            log_format: Self::env_or("LOG_FORMAT", "text"),
            environment,
        })
    }
}
