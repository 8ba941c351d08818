use std::path::PathBuf;
use std::time::Duration;

use serenity::all::{ChannelId, GuildId, UserId};

use crate::error::Result;
use crate::{env_or, env_snowflake_opt, env_str};

pub const DEFAULT_COC_API_URL: &str = "https://api.clashofclans.com/v1";
pub const DEFAULT_FONT_PATH: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

/// Runtime settings, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub coc_token: String,
    pub coc_url: String,
    pub prefix: String,
    pub owner: Option<UserId>,
    /// Register slash commands in this guild only (faster during development)
    pub dev_guild: Option<GuildId>,
    pub global_board_channel: Option<ChannelId>,
    pub font_path: PathBuf,
    pub sync_interval: Duration,
    pub board_interval: Duration,
    pub global_board_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            bot_token: env_str("BOT_TOKEN")?,
            coc_token: env_str("COC_API_TOKEN")?,
            coc_url: env_or("COC_API_URL", DEFAULT_COC_API_URL.to_string())?,
            prefix: env_or("COMMAND_PREFIX", "+".to_string())?,
            owner: env_snowflake_opt("OWNER_ID")?,
            dev_guild: env_snowflake_opt("DEV_GUILD_ID")?,
            global_board_channel: env_snowflake_opt("GLOBAL_BOARD_CHANNEL_ID")?,
            font_path: env_or("BOARD_FONT_PATH", PathBuf::from(DEFAULT_FONT_PATH))?,
            sync_interval: Duration::from_secs(env_or("SYNC_INTERVAL_SECS", 300)?),
            board_interval: Duration::from_secs(env_or("BOARD_INTERVAL_SECS", 60)?),
            global_board_interval: Duration::from_secs(env_or("GLOBAL_BOARD_INTERVAL_SECS", 3600)?),
        })
    }

    pub fn is_global_board(&self, channel_id: ChannelId) -> bool {
        self.global_board_channel == Some(channel_id)
    }
}
