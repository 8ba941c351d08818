use std::collections::HashSet;

use serenity::all::MessageId;
use serenity::prelude::*;

use crate::error::Result;
use super::subsystem::{Subsystem, SyncRwLock};

/// Messages the bot is deleting itself, so the delete event
/// doesn't try to replace them.
pub struct PendingDeletes;
impl TypeMapKey for PendingDeletes {
    type Value = SyncRwLock<HashSet<MessageId>>;
}
impl Subsystem for PendingDeletes {
    type Data = HashSet<MessageId>;

    fn name() -> &'static str {
        "PendingDeletes"
    }
}

impl PendingDeletes {

    pub async fn mark(ctx: &Context, message: MessageId) -> Result<()> {
        let lock = Self::lock(ctx).await?;
        lock.write()?.insert(message);
        Ok(())
    }

    /// Returns whether `message` was ours, forgetting it.
    pub async fn take(ctx: &Context, message: MessageId) -> Result<bool> {
        let lock = Self::lock(ctx).await?;
        let removed = lock.write()?.remove(&message);
        Ok(removed)
    }
}
