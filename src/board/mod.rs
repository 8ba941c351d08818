//! Leaderboards: a rendered image per channel, paged with reactions.

pub mod config;
pub mod cursor;
pub mod image;
mod kind;
pub mod query;
pub mod reaction;
pub mod updater;

pub use config::BoardConfig;
pub use cursor::{Navigation, PageCursor};
pub use kind::{BoardType, SortKey};
pub use query::{BoardPlayer, BoardScope, LeaderboardQuery};
pub use reaction::BoardReaction;
pub use updater::{handle_reaction, refresh_channel, update_board};
