use std::env;
use anyhow::{Context, Result};
use zeroize::Zeroizing;

/// The default HTTP port when `PORT` is not set.
const DEFAULT_PORT: u16 = 4000;

/// The application's configuration.
///
/// Loaded once at process start. Missing admin credentials are a fatal boot
/// error (fail fast), never discovered on first use.
#[derive(Clone)]
pub struct Config {
    /// The HMAC-SHA256 key used to sign session tokens.
    pub session_secret: Zeroizing<String>,
    /// The single configured administrator email (superadmin).
    pub admin_email: String,
    /// The administrator login credential.
    pub admin_password: Zeroizing<String>,
    /// Display name returned by a successful login.
    pub admin_name: String,
    /// Additional admin emails accepted at verification time (role `admin`).
    pub allowlist: Vec<String>,
    /// Whether the process runs in production (controls the `Secure` cookie attribute).
    pub is_production: bool,
    /// The port the HTTP listener binds to.
    pub port: u16,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let session_secret = env::var("ADMIN_JWT_SECRET")
            .context("ADMIN_JWT_SECRET must be set (generate with: openssl rand -base64 48)")?;
        if session_secret.is_empty() {
            anyhow::bail!("ADMIN_JWT_SECRET must not be empty");
        }

        let admin_email = env::var("ADMIN_EMAIL").context("ADMIN_EMAIL must be set")?;
        if admin_email.is_empty() {
            anyhow::bail!("ADMIN_EMAIL must not be empty");
        }

        let admin_password = env::var("ADMIN_PASSWORD").context("ADMIN_PASSWORD must be set")?;
        if admin_password.is_empty() {
            anyhow::bail!("ADMIN_PASSWORD must not be empty");
        }

        let allowlist = env::var("ADMIN_ALLOWLIST")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .collect();

        let is_production =
            env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()) == "production";

        let port = env::var("PORT")
            .unwrap_or_else(|_| DEFAULT_PORT.to_string())
            .parse()
            .context("Invalid PORT")?;

        Ok(Self {
            session_secret: Zeroizing::new(session_secret),
            admin_email,
            admin_password: Zeroizing::new(admin_password),
            admin_name: env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string()),
            allowlist,
            is_production,
            port,
        })
    }

    /// Returns the HMAC key bytes for the token codec.
    pub fn secret_bytes(&self) -> &[u8] {
        self.session_secret.as_bytes()
    }

    /// Returns the configured login credentials, or `None` when either half
    /// is absent.
    ///
    /// `from_env` refuses to boot without them; this accessor keeps the login
    /// route's `500 missing_env` contract honest for configurations built by
    /// other means.
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        if self.admin_email.is_empty() || self.admin_password.is_empty() {
            return None;
        }
        Some((&self.admin_email, &self.admin_password))
    }
}
