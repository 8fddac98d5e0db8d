use core::fmt::{Debug, Display};

use chrono::NaiveDate;
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "roster.toml";
pub const ENV_PREFIX: &str = "ROSTER_";

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Base url of the staffing back end, e.g. `https://staffing.example.org`.
    pub api_url: String,
    /// cuid of the project whose roster is shown.
    pub project_id: String,
    #[serde(default)]
    pub bearer_token: Option<String>,
    /// Used when the project itself carries no start date.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub offset: i32,
    /// Upper bound for one request to the back end, connecting included.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_timeout_secs() -> u64 {
    30
}

#[derive(thiserror::Error)]
pub enum ConfigError {
    #[error("config error: {0}")]
    Figment(#[from] Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(value: figment::Error) -> Self {
        Self::Figment(Box::new(value))
    }
}

impl Debug for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

/// `roster.toml` overridden by `ROSTER_*` variables, nested keys separated by `__`.
#[must_use]
pub fn figment() -> Figment {
    Figment::new()
        .merge(Toml::file(CONFIG_FILE))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

pub fn get_config() -> Result<Config, ConfigError> {
    Ok(figment().extract()?)
}
