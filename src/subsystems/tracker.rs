use std::sync::Arc;
use std::time::Duration;

use ab_glyph::FontArc;
use serenity::prelude::*;
use tracing::warn;

use crate::board::image::load_font;
use crate::coc::CocClient;
use crate::config::Config;
use crate::error::{TrackerError, Result};

/// Upper bound on any one request to the game API or an icon host.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn client_builder(timeout: Duration) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
}

/// Shared HTTP client. Every request gives up after `timeout`.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    client_builder(timeout)
        .build()
        .map_err(TrackerError::from)
}

/// Long-lived handles every task and handler needs.
pub struct TrackerState {
    pub config: Config,
    pub coc: CocClient,
    pub http: reqwest::Client,
    /// Board text font; boards render without text when it failed to load
    pub font: Option<FontArc>,
}

impl TrackerState {
    pub fn new(config: Config) -> Result<Self> {
        let http = http_client(HTTP_TIMEOUT)?;
        let coc = CocClient::new(http.clone(), &config.coc_url, &config.coc_token);

        let font = match load_font(&config.font_path) {
            Ok(font) => Some(font),
            Err(e) => {
                warn!("Unable to load font {}: {}. Boards will have no text", config.font_path.display(), e);
                None
            }
        };

        Ok(Self { config, coc, http, font })
    }
}

pub struct Tracker;
impl TypeMapKey for Tracker {
    type Value = Arc<TrackerState>;
}

impl Tracker {
    pub async fn get(ctx: &Context) -> Result<Arc<TrackerState>> {
        ctx.data.read().await.get::<Self>()
            .cloned()
            .ok_or_else(|| TrackerError::TypeMapMissingKeyError("Tracker".to_string()))
    }
}
