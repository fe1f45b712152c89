//! crates/logging/src/style.rs
//! Per-level text styles, color modes, and the 16-color fallback table.
//!
//! A [`StyleTable`] owns one [`TextStyle`] per [`Level`] behind its own lock.
//! Styles are validated against the active [`ColorMode`] when installed, and
//! degraded through fixed tables when resolved under a narrower mode.

use std::fmt::{self, Write as _};
use std::sync::{Mutex, PoisonError};

use crate::error::{Error, Result};
use crate::levels::Level;

/// Text attribute applied to the whole styled span.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum TextAttr {
    /// Plain text.
    #[default]
    Normal = 0,
    /// Bold or increased intensity.
    Bold = 1,
    /// Faint or decreased intensity.
    Dim = 2,
    /// Italic.
    Emphasis = 3,
    /// Underlined.
    Underline = 4,
}

impl TextAttr {
    /// Validates a raw attribute value.
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Normal),
            1 => Ok(Self::Bold),
            2 => Ok(Self::Dim),
            3 => Ok(Self::Emphasis),
            4 => Ok(Self::Underline),
            other => Err(Error::InvalidTextAttr(other)),
        }
    }
}

/// Foreground or background color.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextColor {
    /// The terminal's own default.
    #[default]
    Default,
    /// Palette index; 0..=15 are the named colors, 16..=255 need 256-color mode.
    Indexed(u8),
    /// 24-bit color; needs RGB mode.
    Rgb(u8, u8, u8),
}

impl TextColor {
    /// Black.
    pub const BLACK: Self = Self::Indexed(0);
    /// Red.
    pub const RED: Self = Self::Indexed(1);
    /// Green.
    pub const GREEN: Self = Self::Indexed(2);
    /// Yellow.
    pub const YELLOW: Self = Self::Indexed(3);
    /// Blue.
    pub const BLUE: Self = Self::Indexed(4);
    /// Magenta.
    pub const MAGENTA: Self = Self::Indexed(5);
    /// Cyan.
    pub const CYAN: Self = Self::Indexed(6);
    /// Light gray.
    pub const LIGHT_GRAY: Self = Self::Indexed(7);
    /// Dark gray.
    pub const DARK_GRAY: Self = Self::Indexed(8);
    /// Light red.
    pub const LIGHT_RED: Self = Self::Indexed(9);
    /// Light green.
    pub const LIGHT_GREEN: Self = Self::Indexed(10);
    /// Light yellow.
    pub const LIGHT_YELLOW: Self = Self::Indexed(11);
    /// Light blue.
    pub const LIGHT_BLUE: Self = Self::Indexed(12);
    /// Light magenta.
    pub const LIGHT_MAGENTA: Self = Self::Indexed(13);
    /// Light cyan.
    pub const LIGHT_CYAN: Self = Self::Indexed(14);
    /// White.
    pub const WHITE: Self = Self::Indexed(15);

    /// Returns `true` if the color can be emitted in `mode` without degrading.
    pub const fn is_valid_for(self, mode: ColorMode) -> bool {
        match (self, mode) {
            (Self::Default, _) | (_, ColorMode::Rgb) | (Self::Indexed(_), ColorMode::Ansi256) => {
                true
            }
            (Self::Indexed(n), ColorMode::Ansi16) => n < 16,
            (Self::Rgb(..), _) => false,
        }
    }

    /// Maps the color into the palette of `mode`.
    pub fn degrade(self, mode: ColorMode) -> Self {
        match (self, mode) {
            (Self::Default, _) | (_, ColorMode::Rgb) => self,
            (Self::Indexed(n), ColorMode::Ansi16) if n < 16 => self,
            (Self::Indexed(n), ColorMode::Ansi16) => {
                let (r, g, b) = index_to_rgb(n);
                Self::Indexed(nearest_palette16(r, g, b))
            }
            (Self::Rgb(r, g, b), ColorMode::Ansi16) => Self::Indexed(nearest_palette16(r, g, b)),
            (Self::Indexed(_), ColorMode::Ansi256) => self,
            (Self::Rgb(r, g, b), ColorMode::Ansi256) => Self::Indexed(rgb_to_index256(r, g, b)),
        }
    }

    fn write_sgr(self, out: &mut String, mode: ColorMode, background: bool) {
        let base: u16 = if background { 40 } else { 30 };
        let extended = if background { 48 } else { 38 };
        let _ = match self.degrade(mode) {
            Self::Default => write!(out, "{}", base + 9),
            Self::Indexed(n) if mode == ColorMode::Ansi16 && n < 8 => {
                write!(out, "{}", base + u16::from(n))
            }
            Self::Indexed(n) if mode == ColorMode::Ansi16 => {
                write!(out, "{}", base + 60 + u16::from(n - 8))
            }
            Self::Indexed(n) => write!(out, "{extended};5;{n}"),
            Self::Rgb(r, g, b) => write!(out, "{extended};2;{r};{g};{b}"),
        };
    }
}

impl fmt::Display for TextColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default"),
            Self::Indexed(n) => write!(f, "{n}"),
            Self::Rgb(r, g, b) => write!(f, "#{r:02x}{g:02x}{b:02x}"),
        }
    }
}

/// Palette width the terminal is driven with.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ColorMode {
    /// 4-bit, 16 named colors.
    #[default]
    Ansi16 = 0,
    /// 8-bit indexed palette.
    Ansi256 = 1,
    /// 24-bit true color.
    Rgb = 2,
}

impl ColorMode {
    /// Validates a raw mode value.
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Ansi16),
            1 => Ok(Self::Ansi256),
            2 => Ok(Self::Rgb),
            other => Err(Error::InvalidColorMode(other)),
        }
    }
}

/// Attribute plus foreground and background color.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextStyle {
    /// Attribute.
    pub attr: TextAttr,
    /// Foreground color.
    pub fg: TextColor,
    /// Background color.
    pub bg: TextColor,
}

impl TextStyle {
    /// Builds a style.
    pub const fn new(attr: TextAttr, fg: TextColor, bg: TextColor) -> Self {
        Self { attr, fg, bg }
    }

    /// Checks the style can be installed while `mode` is active.
    pub fn validate(&self, mode: ColorMode) -> Result<()> {
        for color in [self.fg, self.bg] {
            if !color.is_valid_for(mode) {
                return Err(Error::InvalidTextColor(format!(
                    "{color} is not available in {mode:?} mode"
                )));
            }
        }
        if self.fg != TextColor::Default && self.fg == self.bg {
            return Err(Error::InvalidTextStyle(format!(
                "foreground and background are both {}",
                self.fg
            )));
        }
        Ok(())
    }

    /// Renders the SGR escape sequence selecting this style in `mode`.
    pub fn ansi_sequence(&self, mode: ColorMode) -> String {
        let mut out = String::with_capacity(24);
        let _ = write!(out, "\x1b[{};", self.attr as u8);
        self.fg.write_sgr(&mut out, mode, false);
        out.push(';');
        self.bg.write_sgr(&mut out, mode, true);
        out.push('m');
        out
    }
}

/// SGR sequence restoring the terminal's default style.
pub const ANSI_RESET: &str = "\x1b[0m";

/// A level paired with its style resolved for one color mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StyleEntry {
    /// The level.
    pub level: Level,
    /// The resolved style.
    pub style: TextStyle,
}

impl StyleEntry {
    /// Wraps `text` in this entry's escape sequences.
    pub fn paint(&self, text: &str, mode: ColorMode) -> String {
        let mut out = self.style.ansi_sequence(mode);
        out.push_str(text);
        out.push_str(ANSI_RESET);
        out
    }
}

/// Built-in style for each level, most urgent first.
pub const DEFAULT_STYLES: [TextStyle; 8] = [
    TextStyle::new(TextAttr::Bold, TextColor::LIGHT_YELLOW, TextColor::RED),
    TextStyle::new(TextAttr::Bold, TextColor::BLACK, TextColor::LIGHT_YELLOW),
    TextStyle::new(TextAttr::Bold, TextColor::RED, TextColor::Default),
    TextStyle::new(TextAttr::Normal, TextColor::RED, TextColor::Default),
    TextStyle::new(TextAttr::Normal, TextColor::YELLOW, TextColor::Default),
    TextStyle::new(TextAttr::Normal, TextColor::CYAN, TextColor::Default),
    TextStyle::new(TextAttr::Normal, TextColor::Default, TextColor::Default),
    TextStyle::new(TextAttr::Dim, TextColor::DARK_GRAY, TextColor::Default),
];

/// RGB values of the 16 named colors.
const PALETTE16: [(u8, u8, u8); 16] = [
    (0, 0, 0),
    (128, 0, 0),
    (0, 128, 0),
    (128, 128, 0),
    (0, 0, 128),
    (128, 0, 128),
    (0, 128, 128),
    (192, 192, 192),
    (128, 128, 128),
    (255, 0, 0),
    (0, 255, 0),
    (255, 255, 0),
    (0, 0, 255),
    (255, 0, 255),
    (0, 255, 255),
    (255, 255, 255),
];

const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

fn index_to_rgb(n: u8) -> (u8, u8, u8) {
    match n {
        0..=15 => PALETTE16[usize::from(n)],
        16..=231 => {
            let i = n - 16;
            (
                CUBE_LEVELS[usize::from(i / 36)],
                CUBE_LEVELS[usize::from((i / 6) % 6)],
                CUBE_LEVELS[usize::from(i % 6)],
            )
        }
        _ => {
            let v = 8 + (n - 232) * 10;
            (v, v, v)
        }
    }
}

fn distance(a: (u8, u8, u8), b: (u8, u8, u8)) -> u32 {
    let d = |x: u8, y: u8| {
        let diff = i32::from(x) - i32::from(y);
        (diff * diff) as u32
    };
    d(a.0, b.0) + d(a.1, b.1) + d(a.2, b.2)
}

fn nearest_palette16(r: u8, g: u8, b: u8) -> u8 {
    let mut best = 0u8;
    let mut best_distance = u32::MAX;
    for (i, entry) in PALETTE16.iter().enumerate() {
        let dist = distance((r, g, b), *entry);
        if dist < best_distance {
            best = i as u8;
            best_distance = dist;
        }
    }
    best
}

fn nearest_cube_step(v: u8) -> u8 {
    let mut best = 0u8;
    for (i, level) in CUBE_LEVELS.iter().enumerate() {
        if v.abs_diff(*level) < v.abs_diff(CUBE_LEVELS[usize::from(best)]) {
            best = i as u8;
        }
    }
    best
}

fn rgb_to_index256(r: u8, g: u8, b: u8) -> u8 {
    let (ri, gi, bi) = (nearest_cube_step(r), nearest_cube_step(g), nearest_cube_step(b));
    let cube = 16 + 36 * ri + 6 * gi + bi;

    let avg = ((u16::from(r) + u16::from(g) + u16::from(b)) / 3) as u8;
    let gray_step = if avg < 8 { 0 } else { ((avg - 8) / 10).min(23) };
    let gray = 232 + gray_step;

    if distance((r, g, b), index_to_rgb(gray)) < distance((r, g, b), index_to_rgb(cube)) {
        gray
    } else {
        cube
    }
}

#[derive(Debug)]
struct StyleState {
    mode: ColorMode,
    styles: [TextStyle; 8],
}

/// Per-level style table guarded by its own lock.
#[derive(Debug)]
pub struct StyleTable {
    state: Mutex<StyleState>,
}

impl StyleTable {
    /// Creates a table seeded with [`DEFAULT_STYLES`].
    pub fn new(mode: ColorMode) -> Self {
        Self {
            state: Mutex::new(StyleState {
                mode,
                styles: DEFAULT_STYLES,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StyleState> {
        // Plain-data table; a panic elsewhere cannot leave it half-written.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Active color mode.
    pub fn mode(&self) -> ColorMode {
        self.lock().mode
    }

    /// Switches the active color mode.
    ///
    /// Installed styles are degraded into the new palette. A style that is
    /// no longer valid afterwards, such as one whose colors collapse onto
    /// the same palette entry, falls back to its level's default.
    pub fn set_color_mode(&self, mode: ColorMode) {
        let mut state = self.lock();
        state.mode = mode;
        for (style, fallback) in state.styles.iter_mut().zip(DEFAULT_STYLES) {
            let degraded = TextStyle {
                attr: style.attr,
                fg: style.fg.degrade(mode),
                bg: style.bg.degrade(mode),
            };
            *style = if degraded.validate(mode).is_ok() {
                degraded
            } else {
                fallback
            };
        }
    }

    /// Installs `style` for `level` after validating it for the active mode.
    pub fn set_style(&self, level: Level, style: TextStyle) -> Result<()> {
        let mut state = self.lock();
        style.validate(state.mode)?;
        state.styles[level.index()] = style;
        Ok(())
    }

    /// Restores [`DEFAULT_STYLES`].
    pub fn reset_styles(&self) {
        self.lock().styles = DEFAULT_STYLES;
    }

    /// Resolves the style for `level` under `mode`.
    pub fn resolve(&self, level: Level, mode: ColorMode) -> StyleEntry {
        let style = self.lock().styles[level.index()];
        StyleEntry {
            level,
            style: TextStyle {
                attr: style.attr,
                fg: style.fg.degrade(mode),
                bg: style.bg.degrade(mode),
            },
        }
    }

    /// Resolves the style for `level` under the active mode.
    pub fn resolve_active(&self, level: Level) -> (StyleEntry, ColorMode) {
        let (style, mode) = {
            let state = self.lock();
            (state.styles[level.index()], state.mode)
        };
        let entry = StyleEntry {
            level,
            style: TextStyle {
                attr: style.attr,
                fg: style.fg.degrade(mode),
                bg: style.bg.degrade(mode),
            },
        };
        (entry, mode)
    }
}

impl Default for StyleTable {
    fn default() -> Self {
        Self::new(ColorMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid_in_every_mode() {
        for style in DEFAULT_STYLES {
            for mode in [ColorMode::Ansi16, ColorMode::Ansi256, ColorMode::Rgb] {
                style.validate(mode).unwrap();
            }
        }
    }

    #[test]
    fn rgb_rejected_outside_rgb_mode() {
        let style = TextStyle::new(TextAttr::Normal, TextColor::Rgb(1, 2, 3), TextColor::Default);
        assert!(matches!(
            style.validate(ColorMode::Ansi256),
            Err(Error::InvalidTextColor(_))
        ));
        assert!(style.validate(ColorMode::Rgb).is_ok());
    }

    #[test]
    fn identical_fg_and_bg_rejected() {
        let style = TextStyle::new(TextAttr::Bold, TextColor::RED, TextColor::RED);
        assert!(matches!(
            style.validate(ColorMode::Ansi16),
            Err(Error::InvalidTextStyle(_))
        ));
    }

    #[test]
    fn sixteen_color_mode_degrades_extended_colors() {
        assert_eq!(TextColor::Indexed(196).degrade(ColorMode::Ansi16), TextColor::LIGHT_RED);
        assert_eq!(TextColor::Rgb(250, 250, 250).degrade(ColorMode::Ansi16), TextColor::WHITE);
        assert_eq!(TextColor::Indexed(232).degrade(ColorMode::Ansi16), TextColor::BLACK);
        assert_eq!(TextColor::CYAN.degrade(ColorMode::Ansi16), TextColor::CYAN);
    }

    #[test]
    fn rgb_degrades_into_cube_or_gray_ramp() {
        assert_eq!(TextColor::Rgb(255, 0, 0).degrade(ColorMode::Ansi256), TextColor::Indexed(196));
        assert_eq!(TextColor::Rgb(128, 128, 128).degrade(ColorMode::Ansi256), TextColor::Indexed(244));
    }

    #[test]
    fn resolve_degrades_styles_installed_under_wider_mode() {
        let table = StyleTable::new(ColorMode::Rgb);
        table
            .set_style(
                Level::Info,
                TextStyle::new(TextAttr::Normal, TextColor::Rgb(0, 0, 250), TextColor::Default),
            )
            .unwrap();
        table.set_color_mode(ColorMode::Ansi16);
        let (entry, mode) = table.resolve_active(Level::Info);
        assert_eq!(mode, ColorMode::Ansi16);
        assert_eq!(entry.style.fg, TextColor::LIGHT_BLUE);
    }

    #[test]
    fn mode_switch_rewrites_installed_styles() {
        let table = StyleTable::new(ColorMode::Rgb);
        table
            .set_style(
                Level::Warning,
                TextStyle::new(TextAttr::Normal, TextColor::Rgb(0, 0, 250), TextColor::Default),
            )
            .unwrap();
        table
            .set_style(
                Level::Error,
                TextStyle::new(TextAttr::Bold, TextColor::Indexed(196), TextColor::LIGHT_RED),
            )
            .unwrap();

        table.set_color_mode(ColorMode::Ansi16);
        table.set_color_mode(ColorMode::Rgb);

        let warning = table.resolve(Level::Warning, ColorMode::Rgb);
        assert_eq!(warning.style.fg, TextColor::LIGHT_BLUE);
        let error = table.resolve(Level::Error, ColorMode::Rgb);
        assert_eq!(error.style, DEFAULT_STYLES[Level::Error.index()]);
    }

    #[test]
    fn reset_restores_defaults() {
        let table = StyleTable::default();
        table
            .set_style(Level::Debug, TextStyle::new(TextAttr::Bold, TextColor::GREEN, TextColor::Default))
            .unwrap();
        table.reset_styles();
        let entry = table.resolve(Level::Debug, ColorMode::Ansi16);
        assert_eq!(entry.style, DEFAULT_STYLES[Level::Debug.index()]);
    }

    #[test]
    fn ansi_sequences_per_mode() {
        let style = TextStyle::new(TextAttr::Bold, TextColor::LIGHT_RED, TextColor::BLUE);
        assert_eq!(style.ansi_sequence(ColorMode::Ansi16), "\x1b[1;91;44m");
        assert_eq!(style.ansi_sequence(ColorMode::Ansi256), "\x1b[1;38;5;9;48;5;4m");
        let rgb = TextStyle::new(TextAttr::Normal, TextColor::Rgb(1, 2, 3), TextColor::Default);
        assert_eq!(rgb.ansi_sequence(ColorMode::Rgb), "\x1b[0;38;2;1;2;3;49m");
    }

    #[test]
    fn raw_value_validation() {
        assert!(matches!(TextAttr::from_u8(9), Err(Error::InvalidTextAttr(9))));
        assert!(matches!(ColorMode::from_u8(3), Err(Error::InvalidColorMode(3))));
        assert_eq!(ColorMode::from_u8(2).unwrap(), ColorMode::Rgb);
    }
}
