//! Board image rendering.
//!
//! Layout, top to bottom: a header with the optional clan icon, the
//! board title and the season dates; a column header row; one row per
//! player with alternating backgrounds.

use std::io::Cursor;
use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use chrono::NaiveDateTime;
use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::ago;
use crate::error::Result;

use super::query::BoardPlayer;
use super::BoardType;

pub const ICON_SIZE: u32 = 180;

const WIDTH: u32 = 1400;
const MARGIN: i32 = 40;
const HEADER_HEIGHT: u32 = 220;
const COLUMN_HEADER_HEIGHT: u32 = 60;
const ROW_HEIGHT: u32 = 56;
const BOTTOM_PADDING: u32 = 20;
const MAX_NAME_CHARS: usize = 20;

const TITLE_SCALE: f32 = 72.0;
const SEASON_SCALE: f32 = 40.0;
const CELL_SCALE: f32 = 36.0;

const BACKGROUND: Rgba<u8> = Rgba([44, 47, 51, 255]);
const ROW_EVEN: Rgba<u8> = Rgba([54, 57, 63, 255]);
const ROW_ODD: Rgba<u8> = Rgba([47, 49, 54, 255]);
const TEXT: Rgba<u8> = Rgba([255, 255, 255, 255]);
const SUBTLE_TEXT: Rgba<u8> = Rgba([185, 187, 190, 255]);
const DONATION_ACCENT: Rgba<u8> = Rgba([52, 152, 219, 255]);
const TROPHY_ACCENT: Rgba<u8> = Rgba([46, 204, 113, 255]);

struct Column {
    header: &'static str,
    x: i32,
}

const DONATION_COLUMNS: [Column; 6] = [
    Column { header: "#", x: MARGIN },
    Column { header: "Player", x: 140 },
    Column { header: "Donated", x: 620 },
    Column { header: "Received", x: 820 },
    Column { header: "Ratio", x: 1030 },
    Column { header: "Last On", x: 1190 },
];

const TROPHY_COLUMNS: [Column; 5] = [
    Column { header: "#", x: MARGIN },
    Column { header: "Player", x: 140 },
    Column { header: "Trophies", x: 640 },
    Column { header: "Gain", x: 880 },
    Column { header: "Last On", x: 1120 },
];

fn columns(board_type: BoardType) -> &'static [Column] {
    match board_type {
        BoardType::Donation => &DONATION_COLUMNS,
        BoardType::Trophy => &TROPHY_COLUMNS,
    }
}

fn accent(board_type: BoardType) -> Rgba<u8> {
    match board_type {
        BoardType::Donation => DONATION_ACCENT,
        BoardType::Trophy => TROPHY_ACCENT,
    }
}

fn short_name(name: &str) -> String {
    if name.chars().count() <= MAX_NAME_CHARS {
        return name.to_string()
    }
    let mut short: String = name.chars().take(MAX_NAME_CHARS - 1).collect();
    short.push('\u{2026}');
    short
}

/// The text of each cell in a player's row, in column order.
pub fn cells(board_type: BoardType, player: &BoardPlayer) -> Vec<String> {
    match board_type {
        BoardType::Donation => vec![
            player.rank.to_string(),
            short_name(&player.name),
            player.donations.to_string(),
            player.received.to_string(),
            player.ratio.map_or_else(|| "-".to_string(), |r| format!("{:.2}", r)),
            ago(player.last_online),
        ],
        BoardType::Trophy => vec![
            player.rank.to_string(),
            short_name(&player.name),
            player.trophies.to_string(),
            format!("{:+}", player.gain),
            ago(player.last_online),
        ],
    }
}

/// Decodes a clan icon and scales it to fit the header.
pub fn load_icon(bytes: &[u8]) -> Result<RgbaImage> {
    let icon = image::load_from_memory(bytes)?.to_rgba8();
    Ok(imageops::resize(&icon, ICON_SIZE, ICON_SIZE, FilterType::Lanczos3))
}

pub fn load_font(path: &Path) -> Result<FontArc> {
    let bytes = std::fs::read(path)?;
    Ok(FontArc::try_from_vec(bytes)?)
}

pub struct BoardImage {
    board_type: BoardType,
    title: String,
    icon: Option<RgbaImage>,
    season: String,
    players: Vec<BoardPlayer>,
}

impl BoardImage {
    pub fn new(
        board_type: BoardType,
        title: impl Into<String>,
        icon: Option<RgbaImage>,
        season_start: NaiveDateTime,
        season_finish: NaiveDateTime,
    ) -> Self {
        Self {
            board_type,
            title: title.into(),
            icon,
            season: format!(
                "{} to {}",
                season_start.format("%d-%b-%Y"),
                season_finish.format("%d-%b-%Y"),
            ),
            players: vec![],
        }
    }

    pub fn add_players(&mut self, players: impl IntoIterator<Item = BoardPlayer>) {
        self.players.extend(players);
    }

    pub fn dimensions(&self) -> (u32, u32) {
        let rows = self.players.len() as u32;
        (WIDTH, HEADER_HEIGHT + COLUMN_HEADER_HEIGHT + rows * ROW_HEIGHT + BOTTOM_PADDING)
    }

    /// Renders to PNG. Without a font only the layout is drawn.
    pub fn render(&self, font: Option<&FontArc>) -> Result<Vec<u8>> {
        let (width, height) = self.dimensions();
        let mut canvas = RgbaImage::from_pixel(width, height, BACKGROUND);

        self.draw_header(&mut canvas, font);
        self.draw_rows(&mut canvas, font);

        let mut png = Vec::new();
        canvas.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(png)
    }

    fn draw_header(&self, canvas: &mut RgbaImage, font: Option<&FontArc>) {
        let mut text_x = MARGIN;
        if let Some(icon) = &self.icon {
            imageops::overlay(canvas, icon, MARGIN as i64, 20);
            text_x += ICON_SIZE as i32 + MARGIN;
        }

        let column_top = HEADER_HEIGHT as i32;
        draw_filled_rect_mut(
            canvas,
            Rect::at(0, column_top).of_size(WIDTH, COLUMN_HEADER_HEIGHT),
            accent(self.board_type),
        );

        let Some(font) = font else { return };

        draw_text_mut(canvas, TEXT, text_x, 40, PxScale::from(TITLE_SCALE), font, &self.title);
        draw_text_mut(canvas, SUBTLE_TEXT, text_x, 130, PxScale::from(SEASON_SCALE), font, &self.season);

        let scale = PxScale::from(CELL_SCALE);
        let (_, text_height) = text_size(scale, font, "Player");
        let y = column_top + (COLUMN_HEADER_HEIGHT as i32 - text_height as i32) / 2;
        for column in columns(self.board_type) {
            draw_text_mut(canvas, TEXT, column.x, y, scale, font, column.header);
        }
    }

    fn draw_rows(&self, canvas: &mut RgbaImage, font: Option<&FontArc>) {
        let scale = PxScale::from(CELL_SCALE);
        let top = (HEADER_HEIGHT + COLUMN_HEADER_HEIGHT) as i32;

        for (i, player) in self.players.iter().enumerate() {
            let y = top + (i as u32 * ROW_HEIGHT) as i32;
            let background = if i % 2 == 0 { ROW_EVEN } else { ROW_ODD };
            draw_filled_rect_mut(canvas, Rect::at(0, y).of_size(WIDTH, ROW_HEIGHT), background);

            let Some(font) = font else { continue };

            let (_, text_height) = text_size(scale, font, &player.name);
            let text_y = y + (ROW_HEIGHT as i32 - text_height as i32) / 2;
            for (column, cell) in columns(self.board_type).iter().zip(cells(self.board_type, player)) {
                draw_text_mut(canvas, TEXT, column.x, text_y, scale, font, &cell);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn player(rank: i64, name: &str) -> BoardPlayer {
        BoardPlayer {
            rank,
            name: name.to_string(),
            donations: 1200,
            received: 800,
            trophies: 5100,
            last_online: 2 * 3600 + 60,
            ratio: Some(1.5),
            gain: -40,
        }
    }

    fn board(board_type: BoardType, icon: Option<RgbaImage>) -> BoardImage {
        let start = NaiveDate::from_ymd_opt(2024, 5, 27).unwrap().and_hms_opt(5, 0, 0).unwrap();
        let finish = NaiveDate::from_ymd_opt(2024, 6, 24).unwrap().and_hms_opt(5, 0, 0).unwrap();
        BoardImage::new(board_type, "Reddit Zulu", icon, start, finish)
    }

    #[test]
    fn height_follows_player_count() {
        let mut image = board(BoardType::Donation, None);
        let (_, empty) = image.dimensions();

        image.add_players((1..=15).map(|rank| player(rank, "mathsman")));
        let (width, height) = image.dimensions();
        assert_eq!(width, WIDTH);
        assert_eq!(height, empty + 15 * ROW_HEIGHT);
    }

    #[test]
    fn renders_a_png_of_the_expected_size() {
        let mut image = board(BoardType::Trophy, Some(RgbaImage::new(ICON_SIZE, ICON_SIZE)));
        image.add_players([player(1, "a"), player(2, "b")]);

        let png = image.render(None).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), image.dimensions());
        assert_eq!(image.season, "27-May-2024 to 24-Jun-2024");
    }

    #[test]
    fn donation_and_trophy_cells() {
        let p = player(3, "mathsman");
        assert_eq!(
            cells(BoardType::Donation, &p),
            ["3", "mathsman", "1200", "800", "1.50", "2h 1m"]
        );
        assert_eq!(cells(BoardType::Trophy, &p), ["3", "mathsman", "5100", "-40", "2h 1m"]);

        let no_ratio = BoardPlayer { ratio: None, gain: 12, ..p };
        assert_eq!(cells(BoardType::Donation, &no_ratio)[4], "-");
        assert_eq!(cells(BoardType::Trophy, &no_ratio)[3], "+12");
    }

    #[test]
    fn long_names_are_truncated() {
        let name = "abcdefghijklmnopqrstuvwxyz";
        let short = short_name(name);
        assert_eq!(short.chars().count(), MAX_NAME_CHARS);
        assert!(short.ends_with('\u{2026}'));
        assert_eq!(short_name("short"), "short");
    }

    #[test]
    fn icons_are_resized_and_garbage_rejected() {
        let mut png = Vec::new();
        RgbaImage::from_pixel(64, 32, Rgba([255, 0, 0, 255]))
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();

        let icon = load_icon(&png).unwrap();
        assert_eq!(icon.dimensions(), (ICON_SIZE, ICON_SIZE));
        assert!(load_icon(b"<html>not an image</html>").is_err());
    }
}
