use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::theme::{HighlightPalette, HighlightStyle};

/// Category assigned to a highlighted region.
/// （上色區段的分類。）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightKind {
    Tag,
    Attribute,
    String,
}

impl HighlightKind {
    pub const ALL: [HighlightKind; 3] = [
        HighlightKind::Tag,
        HighlightKind::Attribute,
        HighlightKind::String,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HighlightKind::Tag => "tag",
            HighlightKind::Attribute => "attribute",
            HighlightKind::String => "string",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl std::fmt::Display for HighlightKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A byte range of the input tagged with a category.
/// （以位元組範圍標記分類的區段。）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightSpan {
    pub range: Range<usize>,
    pub kind: HighlightKind,
}

impl HighlightSpan {
    pub fn start(&self) -> usize {
        self.range.start
    }

    pub fn end(&self) -> usize {
        self.range.end
    }

    /// Returns the covered slice of `text`, or `None` if the span does not fit it.
    pub fn text<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.range.clone())
    }
}

struct MarkupRule {
    regex: Regex,
    group: usize,
    kind: HighlightKind,
}

impl MarkupRule {
    fn new(pattern: &str, group: usize, kind: HighlightKind) -> Self {
        let regex = Regex::new(pattern).expect("built-in markup pattern must compile");
        Self { regex, group, kind }
    }
}

// Application order matters: hosts layering spans in sequence get last-rule-wins.
static RULES: Lazy<Vec<MarkupRule>> = Lazy::new(|| {
    vec![
        MarkupRule::new(r"<[/?!]?\w+", 0, HighlightKind::Tag),
        MarkupRule::new(r">", 0, HighlightKind::Tag),
        // `regex` has no look-ahead; the capture excludes the `=`.
        MarkupRule::new(r"\b(\w+)=", 1, HighlightKind::Attribute),
        MarkupRule::new(r#""[^"]*""#, 0, HighlightKind::String),
        MarkupRule::new(r"'[^']*'", 0, HighlightKind::String),
    ]
});

/// Tags every rule match in `text`, in rule order then position order.
/// （依規則順序與位置順序回傳所有符合的區段。）
///
/// Overlapping matches from different rules are all kept. Offsets are byte
/// offsets into `text`.
pub fn highlight(text: &str) -> Vec<HighlightSpan> {
    let mut spans = Vec::new();
    if text.is_empty() {
        return spans;
    }
    for rule in RULES.iter() {
        for captures in rule.regex.captures_iter(text) {
            if let Some(found) = captures.get(rule.group) {
                spans.push(HighlightSpan {
                    range: found.start()..found.end(),
                    kind: rule.kind,
                });
            }
        }
    }
    spans
}

/// Flattens overlapping spans into ordered, non-overlapping runs.
/// （將重疊區段攤平成不重疊的連續區段，後套用者優先。）
///
/// Later spans in `spans` overwrite earlier ones where they overlap. Ranges
/// past `len` are clipped.
pub fn layer(len: usize, spans: &[HighlightSpan]) -> Vec<HighlightSpan> {
    let mut painted: Vec<Option<HighlightKind>> = vec![None; len];
    for span in spans {
        let start = span.range.start.min(len);
        let end = span.range.end.min(len);
        for slot in &mut painted[start..end] {
            *slot = Some(span.kind);
        }
    }

    let mut runs: Vec<HighlightSpan> = Vec::new();
    for (index, slot) in painted.into_iter().enumerate() {
        let Some(kind) = slot else {
            continue;
        };
        match runs.last_mut() {
            Some(last) if last.kind == kind && last.range.end == index => {
                last.range.end = index + 1;
            }
            _ => runs.push(HighlightSpan {
                range: index..index + 1,
                kind,
            }),
        }
    }
    runs
}

/// A flattened run resolved against a palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledRun {
    pub span: HighlightSpan,
    pub style: Option<HighlightStyle>,
}

/// Highlighter bound to a colour palette.
/// （綁定色盤的上色器。）
#[derive(Debug, Clone)]
pub struct SyntaxHighlighter {
    palette: HighlightPalette,
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new(HighlightPalette::default_dark())
    }
}

impl SyntaxHighlighter {
    pub fn new(palette: HighlightPalette) -> Self {
        Self { palette }
    }

    pub fn palette(&self) -> &HighlightPalette {
        &self.palette
    }

    pub fn highlight(&self, text: &str) -> Vec<HighlightSpan> {
        highlight(text)
    }

    /// Full pass followed by layering and palette lookup.
    pub fn styled(&self, text: &str) -> Vec<StyledRun> {
        layer(text.len(), &highlight(text))
            .into_iter()
            .map(|span| StyledRun {
                style: self.palette.style_for(span.kind).cloned(),
                span,
            })
            .collect()
    }
}
