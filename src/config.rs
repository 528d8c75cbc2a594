use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_COST_PRECISION: u32 = 2;
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 100;
const CONFIG_DIR: &str = "config";
const ENV_PREFIX: &str = "POS";

/// Costing behaviour knobs.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct CostingConfig {
    /// Decimal precision for rounded cost/price results.
    #[serde(default = "default_cost_precision")]
    #[validate(range(max = 8))]
    pub precision: u32,
}

impl Default for CostingConfig {
    fn default() -> Self {
        Self {
            precision: default_cost_precision(),
        }
    }
}

/// Domain event channel configuration.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct EventConfig {
    #[serde(default = "default_event_channel_capacity")]
    #[validate(range(min = 1))]
    pub channel_capacity: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_event_channel_capacity(),
        }
    }
}

/// Application configuration, layered from defaults, an optional
/// `config/{environment}` file and `POS__`-prefixed environment variables.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    #[validate]
    pub costing: CostingConfig,

    #[serde(default)]
    #[validate]
    pub events: EventConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            log_level: default_log_level(),
            costing: CostingConfig::default(),
            events: EventConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration for the environment named by `POS_ENV`
    /// (default "development").
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var(format!("{ENV_PREFIX}_ENV"))
            .unwrap_or_else(|_| DEFAULT_ENV.to_string());

        let config = Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("log_level", DEFAULT_LOG_LEVEL)?
            .add_source(File::with_name(&format!("{CONFIG_DIR}/default")).required(false))
            .add_source(File::with_name(&format!("{CONFIG_DIR}/{environment}")).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        app_config
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        Ok(app_config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_cost_precision() -> u32 {
    DEFAULT_COST_PRECISION
}

fn default_event_channel_capacity() -> usize {
    DEFAULT_EVENT_CHANNEL_CAPACITY
}
