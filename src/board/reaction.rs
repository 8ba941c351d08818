use serenity::all::ReactionType;
use strum::IntoEnumIterator;

use super::cursor::Navigation;
use super::{BoardType, SortKey};

/// The controls added under every board message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumIter)]
pub enum BoardReaction {
    Refresh,
    Left,
    Right,
    Percentage,
    Gain,
    LastOnline,
    Historical,
}

/// What a reaction asks the board to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardAction {
    pub sort: Option<SortKey>,
    pub nav: Navigation,
}

impl BoardReaction {
    pub fn emoji(self) -> &'static str {
        match self {
            BoardReaction::Refresh => "\u{1F504}",
            BoardReaction::Left => "\u{25C0}\u{FE0F}",
            BoardReaction::Right => "\u{25B6}\u{FE0F}",
            BoardReaction::Percentage => "\u{1F4AF}",
            BoardReaction::Gain => "\u{1F4C8}",
            BoardReaction::LastOnline => "\u{1F552}",
            BoardReaction::Historical => "\u{1F4DC}",
        }
    }

    pub fn reaction_type(self) -> ReactionType {
        ReactionType::Unicode(self.emoji().to_string())
    }

    pub fn from_reaction(emoji: &ReactionType) -> Option<Self> {
        let ReactionType::Unicode(name) = emoji else { return None };

        // Some clients drop the variation selector
        let name = name.trim_end_matches('\u{FE0F}');
        Self::iter().find(|r| r.emoji().trim_end_matches('\u{FE0F}') == name)
    }

    /// Reactions added to a fresh board message, in order.
    pub fn controls(board_type: BoardType) -> [Self; 6] {
        let sort = match board_type {
            BoardType::Donation => BoardReaction::Percentage,
            BoardType::Trophy => BoardReaction::Gain,
        };
        [
            BoardReaction::Refresh,
            BoardReaction::Left,
            BoardReaction::Right,
            sort,
            BoardReaction::LastOnline,
            BoardReaction::Historical,
        ]
    }

    pub fn action(self, board_type: BoardType) -> BoardAction {
        let (sort, nav) = match self {
            BoardReaction::Refresh => (Some(board_type.default_sort()), Navigation::RESET),
            BoardReaction::Left => (None, Navigation::pages(-1)),
            BoardReaction::Right => (None, Navigation::pages(1)),
            BoardReaction::Percentage => (Some(SortKey::Ratio), Navigation::STAY),
            BoardReaction::Gain => (Some(SortKey::Gain), Navigation::STAY),
            BoardReaction::LastOnline => (Some(SortKey::LastOnline), Navigation::STAY),
            BoardReaction::Historical => (None, Navigation::seasons(-1)),
        };
        BoardAction { sort, nav }
    }
}
