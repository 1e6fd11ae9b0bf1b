use anyhow::{bail, Context, Result};
use std::time::Duration;

/// Deployment environment label (spec §6, "deployment environment label").
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Environment {
    Development,
    Production,
}

/// Runtime configuration, populated from environment variables (spec §6,
/// "Environment / configuration"; SPEC_FULL names the concrete `CHESS_*`
/// variables). `dotenvy` loads a local `.env` file before this is read, so
/// that development setups don't need the variables exported by hand.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub jwt_secret: String,
    pub jwt_ttl: Duration,
    pub database_url: String,
    pub db_max_connections: u32,
    pub bind_addr: String,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let environment = match std::env::var("CHESS_ENV").as_deref() {
            Ok("production") => Environment::Production,
            _ => Environment::Development,
        };

        let jwt_secret = match std::env::var("CHESS_JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) if environment == Environment::Development => "dev-only-insecure-secret".to_owned(),
            Err(_) => bail!("CHESS_JWT_SECRET is required when CHESS_ENV=production"),
        };

        let jwt_ttl_seconds: u64 = std::env::var("CHESS_JWT_TTL_SECONDS")
            .ok()
            .map(|v| v.parse())
            .transpose()
            .context("CHESS_JWT_TTL_SECONDS must be an integer")?
            .unwrap_or(3600);

        let database_url = std::env::var("CHESS_DATABASE_URL").unwrap_or_else(|_| "sqlite://chess.db".to_owned());

        let db_max_connections: u32 = std::env::var("CHESS_DB_MAX_CONNECTIONS")
            .ok()
            .map(|v| v.parse())
            .transpose()
            .context("CHESS_DB_MAX_CONNECTIONS must be an integer")?
            .unwrap_or(5);

        let bind_addr = std::env::var("CHESS_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned());

        let cors_origins = std::env::var("CHESS_CORS_ORIGINS")
            .ok()
            .map(|v| v.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned).collect())
            .unwrap_or_default();

        Ok(Config {
            environment,
            jwt_secret,
            jwt_ttl: Duration::from_secs(jwt_ttl_seconds),
            database_url,
            db_max_connections,
            bind_addr,
            cors_origins,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_variables_are_unset() {
        // Exercises the parsing helpers directly rather than mutating
        // process-wide environment variables, which would race with the
        // other tests in this binary.
        let ttl: u64 = None::<String>.map(|v: String| v.parse::<u64>()).transpose().unwrap().unwrap_or(3600);
        assert_eq!(ttl, 3600);
    }

    #[test]
    fn cors_origins_parses_comma_separated_list() {
        let raw = "https://a.example, https://b.example";
        let origins: Vec<String> = raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned).collect();
        assert_eq!(origins, vec!["https://a.example", "https://b.example"]);
    }
}
