use crate::types::{AppConfig, StartupError};
use config::{Config, Environment, File};
use std::env;

const SUPPORTED_SCHEMES: [&str; 2] = ["md5", "argon2"];

/// Ten years
pub const MAX_EXPIRATION_HOURS: i64 = 24 * 365 * 10;

/// Load the app configuration.
///
/// Layers, lowest precedence first: built-in defaults, `config/default.toml`
/// (optional), `APP__SECTION__KEY` environment variables, then the
/// conventional `DATABASE_URL` and `JWT_SECRET` variables.
pub fn load_config() -> Result<AppConfig, StartupError> {
    let defaults = AppConfig::default();

    let settings = Config::builder()
        .set_default("server.host", defaults.server.host)?
        .set_default("server.port", defaults.server.port as i64)?
        .set_default("server.workers", defaults.server.workers as i64)?
        .set_default("server.cors_origins", defaults.server.cors_origins)?
        .set_default("database.url", defaults.database.url)?
        .set_default("database.max_connections", defaults.database.max_connections as i64)?
        .set_default("database.connect_timeout_secs", defaults.database.connect_timeout_secs as i64)?
        .set_default("database.auto_migrate", defaults.database.auto_migrate)?
        .set_default("jwt.secret", defaults.jwt.secret)?
        .set_default("jwt.expiration_hours", defaults.jwt.expiration_hours)?
        .set_default("password.scheme", defaults.password.scheme)?
        .set_default("password.salt", defaults.password.salt)?
        .set_default("password.reset_default", defaults.password.reset_default)?
        .set_default("mail.from", defaults.mail.from)?
        .set_default("log.level", defaults.log.level)?
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("server.cors_origins")
                .try_parsing(true),
        )
        .set_override_option("database.url", env::var("DATABASE_URL").ok())?
        .set_override_option("jwt.secret", env::var("JWT_SECRET").ok())?
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &AppConfig) -> Result<(), StartupError> {
    if config.database.url.is_empty() {
        return Err(StartupError::Config("Database URL can't be empty".to_string()));
    }

    if config.jwt.secret.is_empty() {
        return Err(StartupError::Config("JWT secret can't be empty".to_string()));
    }

    if config.jwt.expiration_hours <= 0 || config.jwt.expiration_hours > MAX_EXPIRATION_HOURS {
        return Err(StartupError::Config(format!(
            "JWT expiration must be between 1 and {} hours",
            MAX_EXPIRATION_HOURS
        )));
    }

    if config.password.reset_default.is_empty() {
        return Err(StartupError::Config("Reset password can't be empty".to_string()));
    }

    if !SUPPORTED_SCHEMES.contains(&config.password.scheme.as_str()) {
        return Err(StartupError::Config(format!(
            "Unknown password scheme '{}', expected one of {:?}",
            config.password.scheme, SUPPORTED_SCHEMES
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_empty_secret() {
        let mut config = AppConfig::default();
        config.jwt.secret = String::new();

        assert!(matches!(validate_config(&config), Err(StartupError::Config(_))));
    }

    #[test]
    fn test_rejects_unknown_scheme() {
        let mut config = AppConfig::default();
        config.password.scheme = "sha1".to_string();

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("sha1"));
    }

    #[test]
    fn test_rejects_out_of_range_expiration() {
        let mut config = AppConfig::default();

        for hours in [0, -1, MAX_EXPIRATION_HOURS + 1, i64::MAX] {
            config.jwt.expiration_hours = hours;
            assert!(validate_config(&config).is_err(), "accepted {} hours", hours);
        }

        config.jwt.expiration_hours = MAX_EXPIRATION_HOURS;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_rejects_empty_reset_password() {
        let mut config = AppConfig::default();
        config.password.reset_default = String::new();

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("Reset password"));
    }
}
