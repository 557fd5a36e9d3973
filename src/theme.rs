// Centralized appearance settings. Everything here is compiled in; edit and
// rebuild to change the look.

use crate::error::FrameError;

pub const FONT: &str = "-*-fixed-medium-r-*-*-13-*-*-*-*-*-*-*";
pub const FALLBACK_FONT: &str = "fixed";

pub const NORMAL_BG: &str = "#202020";
pub const NORMAL_FG: &str = "#c0c0c0";
pub const SELECTED_BG: &str = "#884400";
pub const SELECTED_FG: &str = "#f0f0f0";

/// Fixed width of one tab in pixels.
pub const TAB_WIDTH: u32 = 200;

pub const MORE_BEFORE: &str = "<";
pub const MORE_AFTER: &str = ">";

/// Command run by the spawn bindings. It must print its window id on stdout.
pub const SPAWN_COMMAND: &str = "surf -x";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScheme {
    Normal,
    Selected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub font: String,
    pub fallback_font: String,
    pub normal_bg: String,
    pub normal_fg: String,
    pub selected_bg: String,
    pub selected_fg: String,
    pub tab_width: u32,
    pub more_before: String,
    pub more_after: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            font: FONT.to_string(),
            fallback_font: FALLBACK_FONT.to_string(),
            normal_bg: NORMAL_BG.to_string(),
            normal_fg: NORMAL_FG.to_string(),
            selected_bg: SELECTED_BG.to_string(),
            selected_fg: SELECTED_FG.to_string(),
            tab_width: TAB_WIDTH,
            more_before: MORE_BEFORE.to_string(),
            more_after: MORE_AFTER.to_string(),
        }
    }
}

impl Theme {
    /// Returns `(background, foreground)` color specs for a scheme.
    pub fn colors(&self, scheme: ColorScheme) -> (&str, &str) {
        match scheme {
            ColorScheme::Normal => (&self.normal_bg, &self.normal_fg),
            ColorScheme::Selected => (&self.selected_bg, &self.selected_fg),
        }
    }
}

/// Parse a `#rrggbb` spec into 16-bit X color channels.
///
/// Returns `Ok(None)` for anything that is not a hex spec so the caller can
/// fall back to a named color lookup.
pub fn parse_hex_color(spec: &str) -> Result<Option<(u16, u16, u16)>, FrameError> {
    let Some(hex) = spec.strip_prefix('#') else {
        return Ok(None);
    };
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(FrameError::Color(spec.to_string()));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16)
            .map(|v| u16::from(v) * 0x101)
            .map_err(|_| FrameError::Color(spec.to_string()))
    };
    Ok(Some((channel(0..2)?, channel(2..4)?, channel(4..6)?)))
}
