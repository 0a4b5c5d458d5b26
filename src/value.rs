use core::fmt;

/// What a function yields when it finishes without an explicit `return`.
pub const NONE_LITERAL: &str = "\"None\"";

const QUOTE: char = '"';

/// Reads text as a number the way the language does: surrounding whitespace
/// is ignored, `Infinity` and `NaN` are accepted, other words are not.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let unsigned = trimmed.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(trimmed);

    match unsigned {
        "Infinity" => trimmed.replace("Infinity", "inf").parse().ok(),
        "NaN" => Some(f64::NAN),
        _ if unsigned.chars().any(|c| c.is_alphabetic() && c != 'e' && c != 'E') => None,
        _ => trimmed.parse().ok(),
    }
}

/// Canonical text of a number: integral values carry no fraction.
pub fn render_number(number: f64) -> String {
    if number.is_nan() {
        "NaN".to_owned()
    } else if number.is_infinite() {
        if number > 0.0 { "Infinity".to_owned() } else { "-Infinity".to_owned() }
    } else if number == 0.0 {
        "0".to_owned()
    } else {
        format!("{}", number)
    }
}

fn strip_ends(text: &str) -> &str {
    let mut chars = text.chars();
    chars.next();
    chars.next_back();
    chars.as_str()
}

/// A runtime value. Text keeps its delimiting quotes when it came from a
/// literal; they are removed only when the value is observed.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    /// Classifies text coming from outside the number/literal grammar
    /// (input lines, concatenations): numeric text becomes a number.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        match parse_number(&text) {
            Some(number) if !text.starts_with(QUOTE) => Self::Number(number),
            _ => Self::Text(text),
        }
    }

    pub fn none() -> Self {
        Self::Text(NONE_LITERAL.to_owned())
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Text(text) if text.starts_with(QUOTE))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            Self::Text(text) => parse_number(text),
        }
    }

    /// The value as a program's output shows it.
    pub fn observed(&self) -> String {
        match self {
            Self::Number(number) => render_number(*number),
            Self::Text(text) if self.is_literal() => strip_ends(text).to_owned(),
            Self::Text(text) => text.clone(),
        }
    }

    /// `+` adds when both sides are numbers and concatenates otherwise.
    pub fn add(&self, other: &Self) -> Self {
        match (self.as_number(), other.as_number()) {
            (Some(left), Some(right)) => Self::Number(left + right),
            _ => Self::from_text(self.observed() + &other.observed()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{}", render_number(*number)),
            Self::Text(text) => write!(f, "{}", text),
        }
    }
}
