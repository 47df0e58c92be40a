use std::fmt;
use std::str::FromStr;

use crate::auth::jwt::JwtConfig;

/// Deployment environment, from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
    Test,
}

impl AppEnv {
    /// Development relaxes cookie security, sandboxes Resend, and skips rate limits.
    pub fn is_development(self) -> bool {
        self == AppEnv::Development
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AppEnv::Development => "development",
            AppEnv::Production => "production",
            AppEnv::Test => "test",
        }
    }
}

impl fmt::Display for AppEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppEnv {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(AppEnv::Development),
            "production" | "prod" => Ok(AppEnv::Production),
            "test" => Ok(AppEnv::Test),
            other => Err(format!(
                "unknown APP_ENV '{other}' (expected development, production, or test)"
            )),
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secrets have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    pub app_env: AppEnv,
    /// Front-end origin. The only CORS origin allowed, and the base of every
    /// link placed in outgoing email.
    pub app_origin: String,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Seconds between expired-row sweeps (default: `300`).
    pub expiry_sweep_interval_secs: u64,
    /// JWT signing configuration (secrets, expiry durations).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                 |
    /// |------------------------------|-------------------------|
    /// | `HOST`                       | `0.0.0.0`               |
    /// | `PORT`                       | `3000`                  |
    /// | `APP_ENV`                    | `development`           |
    /// | `APP_ORIGIN`                 | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`       | `30`                    |
    /// | `EXPIRY_SWEEP_INTERVAL_SECS` | `300`                   |
    ///
    /// # Panics
    ///
    /// Panics on unparsable values, and when the JWT secrets are missing
    /// (see [`JwtConfig::from_env`]).
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let app_env: AppEnv = std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".into())
            .parse()
            .unwrap_or_else(|e| panic!("{e}"));

        let app_origin = std::env::var("APP_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .trim_end_matches('/')
            .to_string();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let expiry_sweep_interval_secs: u64 = std::env::var("EXPIRY_SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("EXPIRY_SWEEP_INTERVAL_SECS must be a valid u64");
        assert!(
            expiry_sweep_interval_secs > 0,
            "EXPIRY_SWEEP_INTERVAL_SECS must be greater than zero"
        );

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            app_env,
            app_origin,
            request_timeout_secs,
            expiry_sweep_interval_secs,
            jwt,
        }
    }

    /// Whether auth cookies carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        !self.app_env.is_development()
    }

    /// Link a user follows to verify their email address.
    pub fn email_verification_url(&self, code: impl fmt::Display) -> String {
        format!("{}/auth/email/verify/{code}", self.app_origin)
    }

    /// Link a user follows to choose a new password.
    pub fn password_reset_url(&self, code: impl fmt::Display) -> String {
        format!("{}/auth/password/reset?code={code}", self.app_origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(app_env: AppEnv) -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            app_env,
            app_origin: "https://app.example.com".into(),
            request_timeout_secs: 30,
            expiry_sweep_interval_secs: 300,
            jwt: JwtConfig {
                secret: "access".into(),
                refresh_secret: "refresh".into(),
                access_token_expiry_mins: 30,
                refresh_token_expiry_days: 30,
            },
        }
    }

    #[test]
    fn app_env_parses_known_values() {
        assert_eq!("development".parse::<AppEnv>().unwrap(), AppEnv::Development);
        assert_eq!("PRODUCTION".parse::<AppEnv>().unwrap(), AppEnv::Production);
        assert_eq!("test".parse::<AppEnv>().unwrap(), AppEnv::Test);
        assert!("staging".parse::<AppEnv>().is_err());
    }

    #[test]
    fn cookies_are_secure_outside_development() {
        assert!(!config(AppEnv::Development).secure_cookies());
        assert!(config(AppEnv::Production).secure_cookies());
        assert!(config(AppEnv::Test).secure_cookies());
    }

    #[test]
    fn links_carry_only_the_code() {
        let cfg = config(AppEnv::Production);
        assert_eq!(
            cfg.email_verification_url("abc"),
            "https://app.example.com/auth/email/verify/abc"
        );
        assert_eq!(
            cfg.password_reset_url("abc"),
            "https://app.example.com/auth/password/reset?code=abc"
        );
    }
}
