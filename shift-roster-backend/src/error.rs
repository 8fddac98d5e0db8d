use shift_roster_client::error::ClientError;
use shift_roster_config::ConfigError;
use shift_roster_core::RosterError;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("roster error: {0}")]
    Roster(#[from] RosterError),
    #[error("client error: {0}")]
    Client(#[from] ClientError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("fetching the roster failed: {0}")]
    FetchFailed(String),
}
