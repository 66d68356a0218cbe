//! Lexical highlighting for the markup edited inside a site project.
//! 網站專案中標記語言的詞彙上色模組。

mod markup;
mod theme;

pub use markup::{highlight, layer, HighlightKind, HighlightSpan, StyledRun, SyntaxHighlighter};
pub use theme::{
    parse_highlight_palette, Color, ColorParseError, HighlightPalette, HighlightStyle,
    ThemeParseError,
};
