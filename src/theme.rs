//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::piece::PieceKind;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Block, border and text colours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Per-kind block colour, in catalog order (O, I, L, J, S, Z, T).
    pub blocks: [Color; 7],
    pub border: Color,
    /// Empty cells.
    pub bg: Color,
    /// Score and line counters.
    pub score: Color,
    /// Labels and overlay titles.
    pub title: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::ansi_default()
    }
}

const BLOCK_KEYS: [&str; 7] = [
    "block_o", "block_i", "block_l", "block_j", "block_s", "block_z", "block_t",
];

impl Theme {
    /// Plain ANSI background colours.
    pub fn ansi_default() -> Self {
        Self {
            blocks: [
                Color::Blue,
                Color::Red,
                Color::Magenta,
                Color::Gray,
                Color::Green,
                Color::Cyan,
                Color::Yellow,
            ],
            border: Color::Gray,
            bg: Color::Reset,
            score: Color::White,
            title: Color::Reset,
        }
    }

    /// Load theme from a btop-style file. Falls back to the ANSI defaults if path is None or the
    /// file is missing; keys absent from the file keep their default.
    pub fn load(path: Option<&Path>) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default()),
        };
        let s = std::fs::read_to_string(path)?;
        Self::from_map(&parse_theme_file(&s))
    }

    fn from_map(map: &HashMap<String, String>) -> Result<Self, ThemeError> {
        let mut theme = Self::default();
        let get = |key: &str| map.get(key).map(|v| parse_hex(v)).transpose();
        for (slot, key) in theme.blocks.iter_mut().zip(BLOCK_KEYS) {
            if let Some(c) = get(key)? {
                *slot = c;
            }
        }
        if let Some(c) = get("border")? {
            theme.border = c;
        }
        if let Some(c) = get("background")? {
            theme.bg = c;
        }
        if let Some(c) = get("score")? {
            theme.score = c;
        }
        if let Some(c) = get("title")? {
            theme.title = c;
        }
        Ok(theme)
    }

    #[inline]
    pub fn block_color(&self, kind: PieceKind) -> Color {
        self.blocks[kind.index()]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(stripped) = line.strip_prefix("theme[") {
            if let Some(end) = stripped.find(']') {
                let key = stripped[..end].trim();
                let rest = stripped[end + 1..].trim();
                if let Some(eq) = rest.find('=') {
                    let value = rest[eq + 1..]
                        .trim()
                        .trim_matches('"')
                        .trim_matches('\'')
                        .to_string();
                    if !value.is_empty() {
                        map.insert(key.to_string(), value);
                    }
                }
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(|| ThemeError::InvalidHex(s.to_string()))
    };
    let (r, g, b) = match s.len() {
        6 => (channel(0..2)?, channel(2..4)?, channel(4..6)?),
        3 => (channel(0..1)? * 17, channel(1..2)? * 17, channel(2..3)? * 17),
        _ => return Err(ThemeError::InvalidHex(s.to_string())),
    };
    Ok(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#98C379").unwrap();
        assert!(matches!(c, Color::Rgb(0x98, 0xC3, 0x79)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(matches!(parse_hex("#12"), Err(ThemeError::InvalidHex(_))));
        assert!(matches!(parse_hex("#GG0000"), Err(ThemeError::InvalidHex(_))));
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[border]="#31353F""##);
        assert_eq!(map.get("border"), Some(&"#31353F".to_string()));
    }

    #[test]
    fn test_partial_theme_keeps_defaults() {
        let map = parse_theme_file(
            r##"
# comment
theme[block_t]="#C678DD"
theme[score]='#E5C07B'
"##,
        );
        let theme = Theme::from_map(&map).unwrap();
        assert_eq!(theme.block_color(PieceKind::T), Color::Rgb(0xC6, 0x78, 0xDD));
        assert_eq!(theme.score, Color::Rgb(0xE5, 0xC0, 0x7B));
        assert_eq!(theme.block_color(PieceKind::O), Color::Blue);
        assert_eq!(theme.border, Theme::default().border);
    }

    #[test]
    fn test_bad_colour_in_file_is_an_error() {
        let map = parse_theme_file(r#"theme[block_o]="blue""#);
        assert!(Theme::from_map(&map).is_err());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let theme = Theme::load(Some(Path::new("/nonexistent/termtris.theme"))).unwrap();
        assert_eq!(theme, Theme::default());
    }
}
