use serde::{Deserialize, Serialize};

/// Terminal palette addressable through SGR codes 30–37 / 40–47,
/// plus the bright variants selected by the `1;3x` compound form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    BrightBlack,
    BrightRed,
    BrightGreen,
    BrightYellow,
    BrightBlue,
    BrightMagenta,
    BrightCyan,
    BrightWhite,
}

const STANDARD: [Color; 8] = [
    Color::Black,
    Color::Red,
    Color::Green,
    Color::Yellow,
    Color::Blue,
    Color::Magenta,
    Color::Cyan,
    Color::White,
];

const BRIGHT: [Color; 8] = [
    Color::BrightBlack,
    Color::BrightRed,
    Color::BrightGreen,
    Color::BrightYellow,
    Color::BrightBlue,
    Color::BrightMagenta,
    Color::BrightCyan,
    Color::BrightWhite,
];

impl Color {
    /// Standard color for a palette offset (0 = black … 7 = white).
    pub fn standard(offset: u16) -> Option<Self> {
        STANDARD.get(usize::from(offset)).copied()
    }

    /// Bright color for a palette offset (0 = bright black … 7 = bright white).
    pub fn bright(offset: u16) -> Option<Self> {
        BRIGHT.get(usize::from(offset)).copied()
    }

    pub fn is_bright(&self) -> bool {
        BRIGHT.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Black => "black",
            Color::Red => "red",
            Color::Green => "green",
            Color::Yellow => "yellow",
            Color::Blue => "blue",
            Color::Magenta => "magenta",
            Color::Cyan => "cyan",
            Color::White => "white",
            Color::BrightBlack => "bright-black",
            Color::BrightRed => "bright-red",
            Color::BrightGreen => "bright-green",
            Color::BrightYellow => "bright-yellow",
            Color::BrightBlue => "bright-blue",
            Color::BrightMagenta => "bright-magenta",
            Color::BrightCyan => "bright-cyan",
            Color::BrightWhite => "bright-white",
        }
    }
}

/// Running SGR state. `Style::default()` is plain, unstyled text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Style {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub foreground: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub background: Option<Color>,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub reversed: bool,
}

impl Style {
    pub fn is_plain(&self) -> bool {
        *self == Style::default()
    }
}

/// A run of text sharing one style snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledSegment {
    pub text: String,
    #[serde(flatten)]
    pub style: Style,
}

impl StyledSegment {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Style::default())
    }
}

/// Segments belonging to one `\n`-delimited input line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedLine {
    pub segments: Vec<StyledSegment>,
}

impl ParsedLine {
    /// Line text with all styling dropped.
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Joins the plain text of every line back together with `\n`.
pub fn plain_text(lines: &[ParsedLine]) -> String {
    lines
        .iter()
        .map(ParsedLine::text)
        .collect::<Vec<_>>()
        .join("\n")
}
