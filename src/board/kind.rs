use serenity::all::Colour;

/// What a board ranks players by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum BoardType {
    Donation,
    Trophy,
}

/// The fixed set of columns a board can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::EnumIter)]
pub enum SortKey {
    #[strum(to_string = "donations", serialize = "donation")]
    Donations,
    #[strum(to_string = "trophies")]
    Trophies,
    #[strum(to_string = "ratio")]
    Ratio,
    #[strum(to_string = "gain")]
    Gain,
    #[strum(to_string = "last_online")]
    LastOnline,
}

const GREEN: Colour = Colour::new(0x2ECC71);

impl BoardType {
    pub fn default_sort(self) -> SortKey {
        match self {
            BoardType::Donation => SortKey::Donations,
            BoardType::Trophy => SortKey::Trophies,
        }
    }

    pub fn default_title(self) -> &'static str {
        match self {
            BoardType::Donation => "Donation Leaderboard",
            BoardType::Trophy => "Trophy Leaderboard",
        }
    }

    /// Embed colour; boards change colour while a guild event is running.
    pub fn colour(self, in_event: bool) -> Colour {
        match (self, in_event) {
            (BoardType::Donation, false) => Colour::BLUE,
            (BoardType::Donation, true) => Colour::GOLD,
            (BoardType::Trophy, false) => GREEN,
            (BoardType::Trophy, true) => Colour::PURPLE,
        }
    }

    pub fn file_name(self) -> String {
        format!("{}board.png", self)
    }
}

impl SortKey {
    /// `ORDER BY` body for the leaderboard query. Only ever built
    /// from this enum, never from user text.
    pub fn order_clause(self) -> &'static str {
        match self {
            SortKey::Donations => "donations DESC NULLS LAST",
            SortKey::Trophies => "trophies DESC NULLS LAST",
            SortKey::Ratio => "ratio DESC NULLS LAST",
            SortKey::Gain => "gain DESC NULLS LAST",
            SortKey::LastOnline => "last_online ASC NULLS LAST, player_name",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn stored_names_round_trip() {
        for kind in BoardType::iter() {
            assert_eq!(BoardType::from_str(&kind.to_string()).unwrap(), kind);
        }
        for sort in SortKey::iter() {
            assert_eq!(SortKey::from_str(&sort.to_string()).unwrap(), sort);
        }
        assert_eq!(BoardType::Donation.to_string(), "donation");
        assert_eq!(SortKey::LastOnline.to_string(), "last_online");
    }

    #[test]
    fn legacy_donation_sort_is_accepted() {
        assert_eq!(SortKey::from_str("donation").unwrap(), SortKey::Donations);
        assert!(SortKey::from_str("received; DROP TABLE players").is_err());
    }

    #[test]
    fn board_defaults() {
        assert_eq!(BoardType::Donation.default_sort(), SortKey::Donations);
        assert_eq!(BoardType::Trophy.default_sort(), SortKey::Trophies);
        assert_eq!(BoardType::Trophy.file_name(), "trophyboard.png");
        assert_eq!(BoardType::Donation.colour(true), Colour::GOLD);
        assert_ne!(BoardType::Trophy.colour(false), BoardType::Trophy.colour(true));
    }
}
