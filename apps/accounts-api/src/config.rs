use axum_helpers::JwtConfig;
use core_config::{AppInfo, FromEnv, app_info, server::ServerConfig};
use database::mongodb::MongoConfig;
use domain_users::HasherConfig;

pub use core_config::Environment;

/// Application configuration, composed from the shared `FromEnv` components
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub mongodb: MongoConfig,
    pub jwt: JwtConfig,
    pub hasher: HasherConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?;
        let mongodb = MongoConfig::from_env()?.with_app_name(env!("CARGO_PKG_NAME"));
        let jwt = JwtConfig::from_env()?;
        let hasher = HasherConfig::from_env()?;

        Ok(Self {
            app: app_info!(),
            environment,
            server,
            mongodb,
            jwt,
            hasher,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "an-adequately-long-signing-secret-for-tests";

    #[test]
    fn test_from_env_composes_all_sections() {
        temp_env::with_vars(
            [
                ("APP_ENV", Some("production")),
                ("PORT", Some("9090")),
                ("MONGODB_URL", Some("mongodb://localhost:27017")),
                ("MONGO_URL", None),
                ("MONGODB_DATABASE", Some("accounts_test")),
                ("JWT_SECRET", Some(SECRET)),
                ("PASSWORD_HASH_TIME_COST", Some("3")),
            ],
            || {
                let config = Config::from_env().unwrap();

                assert_eq!(config.app.name, "accounts_api");
                assert!(config.environment.is_production());
                assert_eq!(config.server.port, 9090);
                assert_eq!(config.mongodb.database(), "accounts_test");
                assert_eq!(config.hasher.time_cost, 3);
            },
        );
    }

    #[test]
    fn test_from_env_requires_jwt_secret() {
        temp_env::with_vars(
            [
                ("MONGODB_URL", Some("mongodb://localhost:27017")),
                ("JWT_SECRET", None),
            ],
            || {
                let err = Config::from_env().unwrap_err();
                assert!(err.to_string().contains("JWT_SECRET"));
            },
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        temp_env::with_vars(
            [
                ("MONGODB_URL", Some("mongodb://localhost:27017")),
                ("JWT_SECRET", Some(SECRET)),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert!(!format!("{config:?}").contains(SECRET));
            },
        );
    }
}
