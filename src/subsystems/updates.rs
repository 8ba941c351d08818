use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serenity::all::ChannelId;
use serenity::prelude::*;

use crate::error::Result;
use super::subsystem::{Subsystem, SyncRwLock};

/// Clans whose stats changed since the last board pass, plus
/// when each clan and board channel was last refreshed.
#[derive(Debug, Clone, Default)]
pub struct UpdateData {
    pending: HashSet<String>,
    tag_updated: HashMap<String, DateTime<Utc>>,
    channel_updated: HashMap<ChannelId, DateTime<Utc>>,
}

impl UpdateData {
    pub fn push(&mut self, tag: String) {
        self.pending.insert(tag);
    }

    /// Empties the buffer, stamping every drained tag with `now`.
    pub fn drain(&mut self, now: DateTime<Utc>) -> Vec<String> {
        let mut tags: Vec<String> = self.pending.drain().collect();
        tags.sort();
        for tag in &tags {
            self.tag_updated.insert(tag.clone(), now);
        }
        tags
    }

    pub fn mark_channel(&mut self, channel: ChannelId, now: DateTime<Utc>) {
        self.channel_updated.insert(channel, now);
    }

    pub fn tag_updated(&self, tag: &str) -> Option<DateTime<Utc>> {
        self.tag_updated.get(tag).copied()
    }

    pub fn channel_updated(&self, channel: ChannelId) -> Option<DateTime<Utc>> {
        self.channel_updated.get(&channel).copied()
    }

    pub fn forget_channel(&mut self, channel: ChannelId) {
        self.channel_updated.remove(&channel);
    }
}

type UpdateLock = SyncRwLock<UpdateData>;

pub struct BoardUpdates;
impl TypeMapKey for BoardUpdates {
    type Value = UpdateLock;
}
impl Subsystem for BoardUpdates {
    type Data = UpdateData;

    fn name() -> &'static str {
        "BoardUpdates"
    }
}

impl BoardUpdates {

    pub async fn push(ctx: &Context, tags: impl IntoIterator<Item = String>) -> Result<()> {
        let lock = Self::lock(ctx).await?;
        let mut write_lock = lock.write()?;
        for tag in tags {
            write_lock.push(tag);
        }
        Ok(())
    }

    pub async fn drain(ctx: &Context) -> Result<Vec<String>> {
        let lock = Self::lock(ctx).await?;
        let mut write_lock = lock.write()?;
        Ok(write_lock.drain(Utc::now()))
    }

    pub async fn mark_channel(ctx: &Context, channel: ChannelId) -> Result<()> {
        let lock = Self::lock(ctx).await?;
        let mut write_lock = lock.write()?;
        write_lock.mark_channel(channel, Utc::now());
        Ok(())
    }

    pub async fn forget_channel(ctx: &Context, channel: ChannelId) -> Result<()> {
        let lock = Self::lock(ctx).await?;
        let mut write_lock = lock.write()?;
        write_lock.forget_channel(channel);
        Ok(())
    }

    pub async fn tag_updated(ctx: &Context, tag: &str) -> Result<Option<DateTime<Utc>>> {
        let lock = Self::lock(ctx).await?;
        let read_lock = lock.read()?;
        Ok(read_lock.tag_updated(tag))
    }

    pub async fn channel_updated(ctx: &Context, channel: ChannelId) -> Result<Option<DateTime<Utc>>> {
        let lock = Self::lock(ctx).await?;
        let read_lock = lock.read()?;
        Ok(read_lock.channel_updated(channel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn drain_empties_and_stamps() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let mut data = UpdateData::default();
        data.push("#B".to_string());
        data.push("#A".to_string());
        data.push("#A".to_string());

        assert_eq!(data.drain(now), ["#A", "#B"]);
        assert!(data.drain(now).is_empty());
        assert_eq!(data.tag_updated("#A"), Some(now));
        assert_eq!(data.tag_updated("#C"), None);
    }

    #[test]
    fn channel_stamps() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let channel = ChannelId::new(663683345108172830);
        let mut data = UpdateData::default();

        data.mark_channel(channel, now);
        assert_eq!(data.channel_updated(channel), Some(now));
        data.forget_channel(channel);
        assert_eq!(data.channel_updated(channel), None);
    }
}
