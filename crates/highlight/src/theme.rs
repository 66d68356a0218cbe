use crate::markup::HighlightKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightStyle {
    pub foreground: Color,
    pub bold: bool,
    pub italic: bool,
}

impl HighlightStyle {
    pub const fn plain(foreground: Color) -> Self {
        Self {
            foreground,
            bold: false,
            italic: false,
        }
    }
}

/// Per-category styles used when rendering highlight spans.
/// （渲染上色區段時各分類所使用的樣式。）
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HighlightPalette {
    tag: Option<HighlightStyle>,
    attribute: Option<HighlightStyle>,
    string: Option<HighlightStyle>,
}

impl HighlightPalette {
    /// Dark editor palette shipped with the studio.
    /// （工作室預設的深色色盤。）
    pub fn default_dark() -> Self {
        Self {
            tag: Some(HighlightStyle::plain(Color::rgb(0x56, 0x9C, 0xD6))),
            attribute: Some(HighlightStyle::plain(Color::rgb(0x9C, 0xDC, 0xFE))),
            string: Some(HighlightStyle::plain(Color::rgb(0xCE, 0x91, 0x78))),
        }
    }

    pub fn style_for(&self, kind: HighlightKind) -> Option<&HighlightStyle> {
        match kind {
            HighlightKind::Tag => self.tag.as_ref(),
            HighlightKind::Attribute => self.attribute.as_ref(),
            HighlightKind::String => self.string.as_ref(),
        }
    }

    pub fn insert(&mut self, kind: HighlightKind, style: HighlightStyle) {
        let slot = match kind {
            HighlightKind::Tag => &mut self.tag,
            HighlightKind::Attribute => &mut self.attribute,
            HighlightKind::String => &mut self.string,
        };
        *slot = Some(style);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ThemeParseError {
    #[error("palette must be a JSON object")]
    InvalidPalette,
    #[error("unknown highlight category '{0}'")]
    UnknownCategory(String),
    #[error("invalid color '{value}': {reason}")]
    InvalidColor {
        value: String,
        reason: ColorParseError,
    },
    #[error("entries must contain foreground color")]
    MissingForeground,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorParseError {
    MissingHash,
    InvalidLength,
    InvalidHex,
}

impl std::fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorParseError::MissingHash => write!(f, "missing leading '#'"),
            ColorParseError::InvalidLength => write!(f, "expected 6 or 8 hex digits"),
            ColorParseError::InvalidHex => write!(f, "contains non-hex digits"),
        }
    }
}

/// Builds a palette from `{"tag": {"foreground": "#RRGGBB"}, ...}`, starting
/// from [`HighlightPalette::default_dark`] so omitted categories keep their colour.
pub fn parse_highlight_palette(
    value: &serde_json::Value,
) -> Result<HighlightPalette, ThemeParseError> {
    let map = value.as_object().ok_or(ThemeParseError::InvalidPalette)?;
    let mut palette = HighlightPalette::default_dark();
    for (name, entry) in map {
        let kind = HighlightKind::from_name(name)
            .ok_or_else(|| ThemeParseError::UnknownCategory(name.clone()))?;
        palette.insert(kind, parse_style(entry)?);
    }
    Ok(palette)
}

fn parse_style(value: &serde_json::Value) -> Result<HighlightStyle, ThemeParseError> {
    let map = value.as_object().ok_or(ThemeParseError::InvalidPalette)?;

    let foreground = map
        .get("foreground")
        .and_then(|value| value.as_str())
        .ok_or(ThemeParseError::MissingForeground)?;
    let foreground = parse_color(foreground).map_err(|reason| ThemeParseError::InvalidColor {
        value: foreground.to_string(),
        reason,
    })?;

    let flag = |key: &str| map.get(key).and_then(|value| value.as_bool()).unwrap_or(false);

    Ok(HighlightStyle {
        foreground,
        bold: flag("bold"),
        italic: flag("italic"),
    })
}

fn parse_color(input: &str) -> Result<Color, ColorParseError> {
    let hex = input
        .trim()
        .strip_prefix('#')
        .ok_or(ColorParseError::MissingHash)?;
    if hex.len() != 6 && hex.len() != 8 {
        return Err(ColorParseError::InvalidLength);
    }
    let mut components = [0u8, 0, 0, 255];
    for (index, component) in components.iter_mut().take(hex.len() / 2).enumerate() {
        let slice = hex
            .get(index * 2..index * 2 + 2)
            .ok_or(ColorParseError::InvalidHex)?;
        *component = u8::from_str_radix(slice, 16).map_err(|_| ColorParseError::InvalidHex)?;
    }
    let [r, g, b, a] = components;
    Ok(Color { r, g, b, a })
}
