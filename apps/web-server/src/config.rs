//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

use inkpost_infra::database::DatabaseConfig;
use inkpost_infra::{InMemoryJobQueueConfig, JwtConfig, MailSettings};

const DEV_JWT_SECRET: &str = "change-me-in-production";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs the server on the in-memory store.
    pub database: Option<DatabaseConfig>,
    /// Where anonymous visitors of protected pages are sent.
    pub login_url: String,
    pub mail: MailSettings,
    /// HTTP mail relay; mail is only logged when unset.
    pub mail_webhook_url: Option<String>,
    pub notify_queue: InMemoryJobQueueConfig,
    pub jwt: JwtConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let parse = |key: &str| get(key).and_then(|v| v.trim().parse().ok());

        let database = get("DATABASE_URL").map(|url| {
            let mut config = DatabaseConfig::new(url);
            config.max_connections = parse_or(&get, "DB_MAX_CONNECTIONS", config.max_connections);
            config.min_connections = parse_or(&get, "DB_MIN_CONNECTIONS", config.min_connections);
            config
        });

        let queue_defaults = InMemoryJobQueueConfig::default();
        let notify_queue = InMemoryJobQueueConfig {
            max_size: parse("NOTIFY_QUEUE_MAX_SIZE").unwrap_or(queue_defaults.max_size),
            workers: parse("NOTIFY_QUEUE_WORKERS").unwrap_or(queue_defaults.workers),
            ..queue_defaults
        };

        let mail_defaults = MailSettings::default();
        let mail = MailSettings {
            site_url: get("SITE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(mail_defaults.site_url),
            from: get("MAIL_FROM").unwrap_or(mail_defaults.from),
        };

        let jwt_defaults = JwtConfig::default();
        let jwt = JwtConfig {
            secret: get("JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string()),
            expiration_hours: parse_or(&get, "JWT_EXPIRATION_HOURS", jwt_defaults.expiration_hours),
            issuer: get("JWT_ISSUER").unwrap_or(jwt_defaults.issuer),
        };

        Self {
            host: get("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&get, "PORT", 8080),
            database,
            login_url: get("LOGIN_URL").unwrap_or_else(|| "/auth/login/".to_string()),
            mail,
            mail_webhook_url: get("MAIL_WEBHOOK_URL").filter(|url| !url.is_empty()),
            notify_queue,
            jwt,
        }
    }

    /// Log a warning when running with the development token secret.
    pub fn warn_insecure_defaults(&self, production: bool) {
        if self.jwt.secret != DEV_JWT_SECRET {
            return;
        }
        if production {
            tracing::error!(
                "SECURITY: Using default JWT secret in production! Set JWT_SECRET environment variable."
            );
        } else {
            tracing::warn!("Using default JWT secret. Set JWT_SECRET for production use.");
        }
    }
}

fn parse_or<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    get(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert!(config.database.is_none());
        assert_eq!(config.login_url, "/auth/login/");
        assert_eq!(config.mail.from, "from@example.com");
        assert!(config.mail_webhook_url.is_none());
        assert_eq!(config.notify_queue.max_size, 1000);
        assert_eq!(config.notify_queue.workers, 2);
    }

    #[test]
    fn test_database_pool_sizes() {
        let config = config(&[
            ("DATABASE_URL", "postgres://localhost/inkpost"),
            ("DB_MAX_CONNECTIONS", "20"),
            ("DB_MIN_CONNECTIONS", "oops"),
        ]);

        let database = config.database.unwrap();
        assert_eq!(database.url, "postgres://localhost/inkpost");
        assert_eq!(database.max_connections, 20);
        assert_eq!(database.min_connections, 10);
    }

    #[test]
    fn test_notification_queue_settings() {
        let tuned = config(&[
            ("NOTIFY_QUEUE_MAX_SIZE", "50"),
            ("NOTIFY_QUEUE_WORKERS", " 4 "),
        ]);
        assert_eq!(tuned.notify_queue.max_size, 50);
        assert_eq!(tuned.notify_queue.workers, 4);

        let garbled = config(&[("NOTIFY_QUEUE_WORKERS", "many")]);
        assert_eq!(garbled.notify_queue.workers, 2);
    }

    #[test]
    fn test_site_url_loses_trailing_slash() {
        let config = config(&[("SITE_URL", "https://blog.example.com/"), ("PORT", "9000")]);

        assert_eq!(config.mail.site_url, "https://blog.example.com");
        assert_eq!(config.port, 9000);
    }
}
