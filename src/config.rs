use std::env;

#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Base URL of the provider API. Payments are disabled when unset.
    pub api_url: Option<String>,
    pub api_key: String,
    pub webhook_secret: String,
    pub currency: String,
    pub return_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub email_token_ttl_hours: i64,
    pub public_base_url: String,
    pub cors_origin: Option<String>,
    pub payment: PaymentConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"));

        let payment = PaymentConfig {
            api_url: env::var("PAYMENT_API_URL").ok().filter(|v| !v.is_empty()),
            api_key: env::var("PAYMENT_API_KEY").unwrap_or_default(),
            webhook_secret: env::var("PAYMENT_WEBHOOK_SECRET").unwrap_or_default(),
            currency: env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "USD".to_string()),
            return_url: env::var("PAYMENT_RETURN_URL")
                .unwrap_or_else(|_| format!("{public_base_url}/orders")),
        };

        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            jwt_ttl_hours: parse_hours("JWT_TTL_HOURS", 24),
            email_token_ttl_hours: parse_hours("EMAIL_TOKEN_TTL_HOURS", 24),
            public_base_url,
            cors_origin: env::var("CORS_ORIGIN").ok().filter(|v| !v.is_empty()),
            payment,
        })
    }
}

/// Token lifetimes are capped at one year.
pub const MAX_TTL_HOURS: i64 = 24 * 366;

fn parse_hours(key: &str, default: i64) -> i64 {
    match env::var(key) {
        Ok(raw) => valid_hours(&raw).unwrap_or_else(|| {
            tracing::warn!(key, value = %raw, "invalid number of hours, using default {default}");
            default
        }),
        Err(_) => default,
    }
}

fn valid_hours(raw: &str) -> Option<i64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|hours| (1..=MAX_TTL_HOURS).contains(hours))
}
