// Board glyphs and colors
// Picks Windows Terminal (Campbell) shades for the detected color depth so the board looks the same everywhere

use ratatui::style::{Color, Modifier, Style};
use term_color_support::ColorSupport;

use crate::xtm_game::{CellView, GameStatus};

/// Terminal color capability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorDepth {
    TrueColor,
    Ansi256,
    Basic,
}

impl ColorDepth {
    pub fn detect() -> Self {
        let support = ColorSupport::stdout();
        if support.has_16m {
            ColorDepth::TrueColor
        } else if support.has_256 {
            ColorDepth::Ansi256
        } else {
            ColorDepth::Basic
        }
    }

    /// Map an ANSI 16 color to its Campbell RGB value or a stable 256-color index
    /// Colors outside the ANSI 16 set are returned unchanged
    pub fn tune(self, color: Color) -> Color {
        let mapping = match color {
            Color::Black => Some(((12, 12, 12), 232)),
            Color::Red => Some(((197, 15, 31), 160)),
            Color::Green => Some(((19, 161, 14), 28)),
            Color::Yellow => Some(((193, 156, 0), 178)),
            Color::Blue => Some(((0, 55, 218), 20)),
            Color::Magenta => Some(((136, 23, 152), 90)),
            Color::Cyan => Some(((58, 150, 221), 38)),
            Color::Gray => Some(((204, 204, 204), 250)),
            Color::DarkGray => Some(((118, 118, 118), 243)),
            Color::LightRed => Some(((231, 72, 86), 203)),
            Color::LightGreen => Some(((22, 198, 12), 46)),
            Color::LightBlue => Some(((59, 120, 255), 63)),
            Color::White => Some(((242, 242, 242), 255)),
            _ => None,
        };
        match (self, mapping) {
            (ColorDepth::TrueColor, Some(((r, g, b), _))) => Color::Rgb(r, g, b),
            (ColorDepth::Ansi256, Some((_, index))) => Color::Indexed(index),
            _ => color,
        }
    }
}

/// Glyphs and colors for everything drawn on the board
#[derive(Debug, Clone)]
pub struct Theme {
    pub board_bg: Color,
    pub cursor_bg: Color,
    pub flash_bg: Color,
    pub key_fg: Color,
    hidden: (&'static str, Color),
    flag: (&'static str, Color),
    question: (&'static str, Color),
    mine: (&'static str, Color),
    wrong_flag: (&'static str, Color),
    exploded_bg: Color,
    numbers: [Color; 8],
    faces: [&'static str; 3], // playing, won, lost
}

impl Theme {
    pub fn new(ascii: bool) -> Self {
        Theme::with_depth(ascii, ColorDepth::detect())
    }

    pub fn with_depth(ascii: bool, depth: ColorDepth) -> Self {
        let t = |c| depth.tune(c);
        Theme {
            board_bg: t(Color::DarkGray),
            cursor_bg: t(Color::LightBlue),
            flash_bg: t(Color::Red),
            key_fg: t(Color::Yellow),
            hidden: (if ascii { "." } else { "■" }, t(Color::Gray)),
            flag: (if ascii { "F" } else { "⚑" }, t(Color::Red)),
            question: ("?", t(Color::Yellow)),
            mine: (if ascii { "*" } else { "☼" }, t(Color::Black)),
            wrong_flag: ("X", t(Color::Red)),
            exploded_bg: t(Color::Red),
            // classic number colors 1..8
            numbers: [
                t(Color::Blue),
                t(Color::Green),
                t(Color::LightRed),
                t(Color::Magenta),
                t(Color::Red),
                t(Color::Cyan),
                t(Color::Black),
                t(Color::White),
            ],
            faces: if ascii {
                [":)", "B)", ":("]
            } else {
                ["☺", "☻", "☹"]
            },
        }
    }

    /// Glyph and style for one cell, on top of the board background
    pub fn cell(&self, view: CellView) -> (&'static str, Style) {
        let base = Style::default().bg(self.board_bg);
        match view {
            CellView::Hidden => (self.hidden.0, base.fg(self.hidden.1)),
            CellView::Flagged => (self.flag.0, base.fg(self.flag.1)),
            CellView::Questioned => (self.question.0, base.fg(self.question.1)),
            CellView::Open(0) => (" ", base),
            CellView::Open(n) => {
                let i = (n as usize).clamp(1, 8) - 1;
                (DIGITS[i], base.fg(self.numbers[i]).add_modifier(Modifier::BOLD))
            }
            CellView::Mine => (self.mine.0, base.fg(self.mine.1)),
            CellView::Exploded => (self.mine.0, base.fg(self.mine.1).bg(self.exploded_bg)),
            CellView::WrongFlag => (self.wrong_flag.0, base.fg(self.wrong_flag.1).add_modifier(Modifier::BOLD)),
        }
    }

    /// Smiley shown in the status bar
    pub fn face(&self, status: GameStatus) -> &'static str {
        match status {
            GameStatus::Ready | GameStatus::Playing => self.faces[0],
            GameStatus::Won => self.faces[1],
            GameStatus::Lost => self.faces[2],
        }
    }
}

const DIGITS: [&str; 8] = ["1", "2", "3", "4", "5", "6", "7", "8"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tune_by_depth() {
        assert_eq!(ColorDepth::TrueColor.tune(Color::Red), Color::Rgb(197, 15, 31));
        assert_eq!(ColorDepth::Ansi256.tune(Color::Red), Color::Indexed(160));
        assert_eq!(ColorDepth::Basic.tune(Color::Red), Color::Red);
        assert_eq!(ColorDepth::TrueColor.tune(Color::Rgb(1, 2, 3)), Color::Rgb(1, 2, 3));
    }

    #[test]
    fn ascii_glyphs() {
        let theme = Theme::with_depth(true, ColorDepth::Basic);
        assert_eq!(theme.cell(CellView::Hidden).0, ".");
        assert_eq!(theme.cell(CellView::Flagged).0, "F");
        assert_eq!(theme.cell(CellView::Mine).0, "*");
        assert_eq!(theme.cell(CellView::Open(0)).0, " ");
        assert_eq!(theme.cell(CellView::Open(3)).0, "3");
        assert_eq!(theme.face(GameStatus::Lost), ":(");
    }

    #[test]
    fn numbers_use_distinct_colors() {
        let theme = Theme::with_depth(false, ColorDepth::Basic);
        let one = theme.cell(CellView::Open(1)).1;
        let two = theme.cell(CellView::Open(2)).1;
        assert_eq!(one.fg, Some(Color::Blue));
        assert_eq!(two.fg, Some(Color::Green));
        assert_eq!(theme.cell(CellView::Exploded).1.bg, Some(Color::Red));
    }
}
