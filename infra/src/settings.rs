//! Layered configuration loading
//!
//! Precedence, lowest first:
//! 1. Built-in defaults for the environment named by `APP__ENVIRONMENT`
//! 2. Optional `config.<environment>.toml` file
//! 3. `APP__SECTION__KEY` environment variables
//! 4. `DATABASE_URL` / `REDIS_URL`

use config::{Config, File};

use otp_shared::config::{AppConfig, Environment};

use crate::InfrastructureError;

const ENV_PREFIX: &str = "APP";

/// Same key the env layer maps onto `AppConfig::environment`
const ENVIRONMENT_VAR: &str = "APP__ENVIRONMENT";

/// Load the application configuration
///
/// Reads `.env` (and `.env.<environment>`) first so their variables take
/// part in every later layer.
pub fn load_config() -> Result<AppConfig, InfrastructureError> {
    dotenvy::dotenv().ok();
    let environment = parse_environment(std::env::var(ENVIRONMENT_VAR).ok())?;
    dotenvy::from_filename(environment.env_file()).ok();

    let mut app = layered(environment, &environment.config_file(), ENV_PREFIX)?;
    apply_url_overrides(&mut app);

    tracing::debug!(
        environment = %app.environment,
        backend = %app.storage.backend,
        "Configuration loaded"
    );

    Ok(app)
}

/// Unset means development; a typo is an error rather than a silent fallback
fn parse_environment(value: Option<String>) -> Result<Environment, InfrastructureError> {
    match value {
        None => Ok(Environment::default()),
        Some(name) => name.parse().map_err(InfrastructureError::Config),
    }
}

fn layered(
    environment: Environment,
    file: &str,
    env_prefix: &str,
) -> Result<AppConfig, InfrastructureError> {
    let defaults = AppConfig::for_environment(environment);

    let settings = Config::builder()
        .add_source(Config::try_from(&defaults)?)
        .add_source(File::with_name(file).required(false))
        .add_source(
            config::Environment::with_prefix(env_prefix)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app: AppConfig = settings.try_deserialize()?;
    app.validate()
        .map_err(|e| InfrastructureError::Config(format!("Invalid configuration: {}", e)))?;

    Ok(app)
}

fn apply_url_overrides(app: &mut AppConfig) {
    if let Ok(url) = std::env::var("DATABASE_URL") {
        app.database.url = url;
    }
    if let Ok(url) = std::env::var("REDIS_URL") {
        app.cache.url = url;
    }
}
