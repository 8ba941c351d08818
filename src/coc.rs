//! A small client for the Clash of Clans REST API.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{TrackerError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clan {
    pub tag: String,
    pub name: String,
    #[serde(default)]
    pub badge_urls: Option<BadgeUrls>,
    #[serde(default)]
    pub member_list: Vec<ClanMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BadgeUrls {
    pub small: String,
    pub medium: String,
    pub large: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClanMember {
    pub tag: String,
    pub name: String,
    pub trophies: i32,
    pub donations: i32,
    pub donations_received: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub tag: String,
    pub name: String,
    pub trophies: i32,
    pub attack_wins: i32,
    pub defense_wins: i32,
    #[serde(default)]
    pub donations: i32,
    #[serde(default)]
    pub donations_received: i32,
    #[serde(default)]
    pub clan: Option<PlayerClan>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerClan {
    pub tag: String,
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(default)]
    reason: String,
    #[serde(default)]
    message: Option<String>,
}

/// Normalises a user-typed tag: `#`, uppercase, and `O` read as `0`.
pub fn correct_tag(tag: &str) -> String {
    let tag = tag.trim().trim_start_matches('#').to_uppercase().replace('O', "0");
    format!("#{}", tag)
}

fn encode_tag(tag: &str) -> String {
    correct_tag(tag).replace('#', "%23")
}

#[derive(Debug, Clone)]
pub struct CocClient {
    client: Client,
    base_url: String,
    token: String,
}

impl CocClient {
    pub fn new(client: Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    pub async fn get_clan(&self, tag: &str) -> Result<Clan> {
        self.get(&format!("clans/{}", encode_tag(tag)), tag).await
    }

    pub async fn get_player(&self, tag: &str) -> Result<Player> {
        self.get(&format!("players/{}", encode_tag(tag)), tag).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, tag: &str) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self.client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(TrackerError::CocNotFoundError(correct_tag(tag)))
        }
        if !status.is_success() {
            let body: ApiError = response.json().await.unwrap_or_default();
            warn!(status = %status, reason = %body.reason, "Clash of Clans API returned error");
            return Err(TrackerError::CocApiError {
                status: status.as_u16(),
                reason: body.message.unwrap_or(body.reason),
            })
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_corrected() {
        assert_eq!(correct_tag("p0lyjc8c"), "#P0LYJC8C");
        assert_eq!(correct_tag("  #POLYJC8C "), "#P0LYJC8C");
        assert_eq!(correct_tag("##2Y"), "#2Y");
        assert_eq!(encode_tag("#JY9J2Y99"), "%23JY9J2Y99");
    }

    #[test]
    fn clan_deserializes() {
        let json = r##"{
            "tag": "#P0LYJC8C",
            "name": "Reddit Zulu",
            "clanLevel": 18,
            "badgeUrls": {
                "small": "https://api-assets.clashofclans.com/badges/70/a.png",
                "medium": "https://api-assets.clashofclans.com/badges/200/a.png",
                "large": "https://api-assets.clashofclans.com/badges/512/a.png"
            },
            "memberList": [
                {"tag": "#2PP", "name": "mathsman", "role": "leader", "trophies": 5100,
                 "donations": 1200, "donationsReceived": 800}
            ]
        }"##;

        let clan: Clan = serde_json::from_str(json).unwrap();
        assert_eq!(clan.name, "Reddit Zulu");
        assert_eq!(clan.member_list.len(), 1);
        assert_eq!(clan.member_list[0].donations_received, 800);
        assert!(clan.badge_urls.unwrap().large.ends_with("512/a.png"));
    }

    #[test]
    fn player_deserializes_without_clan() {
        let json = r##"{
            "tag": "#2PP", "name": "mathsman", "trophies": 5100,
            "attackWins": 40, "defenseWins": 3
        }"##;

        let player: Player = serde_json::from_str(json).unwrap();
        assert_eq!(player.attack_wins, 40);
        assert_eq!(player.donations, 0);
        assert!(player.clan.is_none());
    }

    #[test]
    fn api_errors_deserialize() {
        let body: ApiError = serde_json::from_str(
            r#"{"reason": "accessDenied.invalidIp", "message": "Invalid authorization"}"#
        ).unwrap();
        assert_eq!(body.reason, "accessDenied.invalidIp");
        assert_eq!(body.message.as_deref(), Some("Invalid authorization"));
    }
}
