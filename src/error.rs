use thiserror::Error;

use blueprint_ephemeris::EphemerisError;

pub type Result<T> = std::result::Result<T, BlueprintError>;

#[derive(Debug, Error)]
pub enum BlueprintError {
    #[error("invalid birth data: {0}")]
    InvalidBirthData(String),

    #[error("unknown timezone '{0}'")]
    UnknownTimezone(String),

    #[error("local time {time} does not exist in {timezone}")]
    NonexistentLocalTime { time: String, timezone: String },

    #[error("unknown house system '{0}'")]
    UnknownHouseSystem(String),

    #[error("ephemeris error: {0}")]
    Ephemeris(#[from] EphemerisError),

    #[error("ephemeris table error: {0}")]
    Table(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("table codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
