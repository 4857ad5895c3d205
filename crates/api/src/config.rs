use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// Every field except the JWT secret has a development default.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    pub jwt: JwtConfig,
    /// Account that bypasses the publication gate. `None` disables the bypass.
    pub super_admin_email: Option<String>,
    /// Directory the local storage provider writes uploads into.
    pub storage_root: String,
    /// Public origin of this server, used for upload and canonical URLs.
    pub public_base_url: String,
    /// Support WhatsApp number offered on the payment pages.
    pub whatsapp_number: Option<String>,
    pub contact_email: Option<String>,
    pub paypal_handle: Option<String>,
    pub binance_pay_id: Option<String>,
}

/// Read an optional variable, treating blank values as unset.
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SUPER_ADMIN_EMAIL`    | unset                      |
    /// | `STORAGE_ROOT`         | `storage`                  |
    /// | `PUBLIC_BASE_URL`      | `http://localhost:3000`    |
    /// | `WHATSAPP_NUMBER`      | unset                      |
    /// | `CONTACT_EMAIL`        | unset                      |
    /// | `PAYPAL_HANDLE`        | unset                      |
    /// | `BINANCE_PAY_ID`       | unset                      |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            super_admin_email: optional_var("SUPER_ADMIN_EMAIL"),
            storage_root: std::env::var("STORAGE_ROOT").unwrap_or_else(|_| "storage".into()),
            public_base_url,
            whatsapp_number: optional_var("WHATSAPP_NUMBER"),
            contact_email: optional_var("CONTACT_EMAIL"),
            paypal_handle: optional_var("PAYPAL_HANDLE"),
            binance_pay_id: optional_var("BINANCE_PAY_ID"),
        }
    }
}
