//! Board pagination state.
//!
//! There is no stored cursor: the page number and season id live in the
//! footer of the board message itself, as `Page {page};Season {season};`,
//! and are parsed back out on the next interaction.

use std::fmt;

/// Page sizes when a board has no fixed page size: the first pages
/// are short so the top of the board stays readable.
const GROWING_PAGES: [i64; 5] = [15, 15, 20, 25, 25];
const GROWING_PAGE_TAIL: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub page: i64,
    pub season: i32,
}

/// A requested move relative to the current cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Navigation {
    pub pages: i64,
    pub seasons: i32,
    /// Back to page 1 of the current season
    pub reset: bool,
}

/// Where the next render reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub cursor: PageCursor,
    pub limit: i64,
    pub offset: i64,
}

impl Navigation {
    pub const STAY: Navigation = Navigation { pages: 0, seasons: 0, reset: false };
    pub const RESET: Navigation = Navigation { pages: 0, seasons: 0, reset: true };

    pub fn pages(pages: i64) -> Self {
        Self { pages, ..Self::STAY }
    }

    pub fn seasons(seasons: i32) -> Self {
        Self { seasons, ..Self::STAY }
    }

    /// A plain refresh: no paging, no season change, no reset.
    pub fn is_passive(&self) -> bool {
        *self == Self::STAY
    }
}

/// Rows on `page`. A `configured` size of 0 means growing pages.
pub fn per_page(page: i64, configured: i32) -> i64 {
    if configured > 0 {
        return configured as i64
    }
    match page {
        1..=5 => GROWING_PAGES[(page - 1) as usize],
        _ => GROWING_PAGE_TAIL,
    }
}

/// Rows before `page`.
pub fn offset(page: i64, configured: i32) -> i64 {
    (1..page).map(|p| per_page(p, configured)).sum()
}

impl PageCursor {
    pub fn first(season: i32) -> Self {
        Self { page: 1, season }
    }

    /// Parses a board footer. Anything unexpected is `None`.
    pub fn decode(text: &str) -> Option<Self> {
        let mut parts = text.split(';');
        let page = parts.next()?.split(' ').nth(1)?.parse::<i64>().ok()?;
        let season = parts.next()?.split(' ').nth(1)?.parse::<i32>().ok()?;
        Some(Self { page, season })
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Applies `nav`. `None` when the move would go before page 1.
    pub fn advance(self, nav: Navigation, configured: i32, current_season: i32) -> Option<PageWindow> {
        let target = self.page + nav.pages;
        if target < 1 {
            return None
        }

        let (page, season, offset) = if nav.reset {
            (1, current_season, 0)
        } else {
            (target, self.season + nav.seasons, offset(target, configured))
        };

        let season = if season < 1 { current_season } else { season };

        Some(PageWindow {
            cursor: PageCursor { page, season },
            limit: per_page(page, configured),
            offset: offset.max(0),
        })
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page {};Season {};", self.page, self.season)
    }
}
