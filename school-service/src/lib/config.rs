use std::env;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub email: EmailConfig,
    pub bootstrap_admin: Option<BootstrapAdminConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

/// Without a `url` the service keeps users in process memory.
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    #[serde(default = "default_access_token_expire_minutes")]
    pub access_token_expire_minutes: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    #[serde(default = "default_reset_token_ttl_minutes")]
    pub reset_token_ttl_minutes: i64,
    #[serde(default = "default_open_student_registration")]
    pub open_student_registration: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            reset_token_ttl_minutes: default_reset_token_ttl_minutes(),
            open_student_registration: default_open_student_registration(),
        }
    }
}

/// Reset emails go through SMTP once `smtp_host` is set. Otherwise the
/// token is only logged.
#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    #[serde(default = "default_from_address")]
    pub from_address: String,
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            from_address: default_from_address(),
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BootstrapAdminConfig {
    pub email: String,
    pub password: String,
    #[serde(default = "default_admin_full_name")]
    pub full_name: String,
    #[serde(default)]
    pub mobile: String,
}

fn default_max_connections() -> u32 {
    5
}

fn default_algorithm() -> String {
    "HS256".to_string()
}

fn default_access_token_expire_minutes() -> i64 {
    30
}

fn default_reset_token_ttl_minutes() -> i64 {
    60
}

fn default_open_student_registration() -> bool {
    true
}

fn default_from_address() -> String {
    "noreply@school.local".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_admin_full_name() -> String {
    "System Administrator".to_string()
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (JWT__SECRET, DATABASE__URL, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(Environment::default().separator("__"))
            .build()?;

        configuration.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn from_toml(source: &str) -> Result<Config, ConfigError> {
        ConfigBuilder::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = from_toml(
            r#"
            [server]
            http_port = 8000

            [jwt]
            secret = "dev-secret"
            "#,
        )
        .unwrap();

        assert!(config.database.url.is_none());
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.jwt.algorithm, "HS256");
        assert_eq!(config.jwt.access_token_expire_minutes, 30);
        assert_eq!(config.auth.reset_token_ttl_minutes, 60);
        assert!(config.auth.open_student_registration);
        assert!(config.bootstrap_admin.is_none());
        assert!(config.email.smtp_host.is_none());
        assert_eq!(config.email.smtp_port, 587);
    }

    #[test]
    fn test_environment_overrides_files() {
        env::set_var("JWT__SECRET", "secret-from-environment");
        env::set_var("SERVER__HTTP_PORT", "9999");
        env::set_var("EMAIL__SMTP_HOST", "smtp.school.local");

        let result = Config::load();

        env::remove_var("JWT__SECRET");
        env::remove_var("SERVER__HTTP_PORT");
        env::remove_var("EMAIL__SMTP_HOST");

        let config = result.unwrap();
        assert_eq!(config.jwt.secret, "secret-from-environment");
        assert_eq!(config.server.http_port, 9999);
        assert_eq!(config.email.smtp_host.as_deref(), Some("smtp.school.local"));
        assert_eq!(config.jwt.algorithm, "HS256");
    }

    #[test]
    fn test_bootstrap_admin_section() {
        let config = from_toml(
            r#"
            [server]
            http_port = 8000

            [jwt]
            secret = "dev-secret"

            [bootstrap_admin]
            email = "admin@school.com"
            password = "admin123"
            "#,
        )
        .unwrap();

        let admin = config.bootstrap_admin.unwrap();
        assert_eq!(admin.email, "admin@school.com");
        assert_eq!(admin.full_name, "System Administrator");
        assert_eq!(admin.mobile, "");
    }

    #[test]
    fn test_missing_jwt_secret_is_an_error() {
        let result = from_toml(
            r#"
            [server]
            http_port = 8000
            "#,
        );
        assert!(result.is_err());
    }
}
