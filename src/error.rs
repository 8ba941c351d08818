use std::{env::VarError, error::Error, num::ParseIntError};

use thiserror::Error;

use crate::subsystems::SubsystemError;

/// Everything that can go wrong while tracking clans
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Database (diesel) error")]
    DbError (#[from] diesel::result::Error),

    #[error("Error connecting to database")]
    DbConnError (#[from] diesel::ConnectionError),

    #[error("Discord (serenity) error")]
    DiscordError (#[from] serenity::Error),

    #[error("Clash of Clans API request failed")]
    HttpError (#[from] reqwest::Error),

    #[error("Clash of Clans API returned {status}: {reason}")]
    CocApiError {
        status: u16,
        reason: String,
    },

    #[error("Clan or player `{0}` not found")]
    CocNotFoundError (String),

    #[error("Image error")]
    ImageError (#[from] image::ImageError),

    #[error("Unable to load board font")]
    FontError (#[from] ab_glyph::InvalidFont),

    #[error("IO error")]
    IoError (#[from] std::io::Error),

    #[error("Blocking task failed")]
    JoinError (#[from] tokio::task::JoinError),

    #[error("Error retrieving environment variable `{key}`")]
    EnvVarError {
        key: String,
        #[source]
        source: VarError
    },

    #[error("Unable to convert `{snowflake}` into snowflake")]
    SnowflakeParseError {
        snowflake: String,
        source: ParseIntError,
    },

    #[error("Invalid value `{value}` for `{key}`")]
    ConfigError {
        key: String,
        value: String,
    },

    #[error("Subsystem error: {0}")]
    SubsystemError(#[from] SubsystemError),

    #[error("Global data does not have key {0}")]
    TypeMapMissingKeyError(String),

    #[error("Board {id} has an invalid {field}: `{value}`")]
    InvalidBoardConfig {
        id: i32,
        field: &'static str,
        value: String,
    },

    #[error("No season has been recorded yet")]
    NoSeasonError,

    #[error("Migration error")]
    MigrationError(Box<dyn Error + Send + Sync + 'static>),

    #[error("Other: {0}")]
    Other(String),
}

pub type Result<T> = core::result::Result<T, TrackerError>;
