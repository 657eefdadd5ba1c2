use secrecy::Secret;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub application: ApplicationConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    #[serde(default)]
    pub referral: ReferralConfig,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApplicationConfig {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    /// Fallback `EnvFilter` directive when `RUST_LOG` is not set.
    pub log_level: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    pub uri: Secret<String>,
    pub name: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn is_permissive(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == "*")
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct ReferralConfig {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub starting_balance: f64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub bonus_amount: f64,
}

impl Default for ReferralConfig {
    fn default() -> Self {
        Self {
            starting_balance: 5000.0,
            bonus_amount: 500.0,
        }
    }
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

/// Layers `configuration/base.yaml`, the environment file picked by
/// `APP_ENVIRONMENT`, and `APP_*` variables (`APP_DATABASE__URI`, ...).
/// `APP_CORS__ALLOWED_ORIGINS` takes a comma-separated list.
pub fn get_config() -> Result<Config, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(e.to_string()))?;
    let config_dir = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(config_dir.join("base.yaml")))
        .add_source(config::File::from(config_dir.join(environment_filename)))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("cors.allowed_origins"),
        )
        .build()?;

    settings.try_deserialize::<Config>()
}
