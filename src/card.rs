//! Core card data structures for the memorize application.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Subject theme assigned to a card after generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Math,
    Science,
    History,
    Languages,
    Arts,
    #[default]
    #[serde(other)]
    Default,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Math => "math",
            Theme::Science => "science",
            Theme::History => "history",
            Theme::Languages => "languages",
            Theme::Arts => "arts",
            Theme::Default => "default",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a single question/answer card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Question shown on the front
    pub question: String,
    /// Answer shown on the back
    pub answer: String,
    /// Subject theme, `default` until themes are applied
    #[serde(default)]
    pub theme: Theme,
}

impl Card {
    /// Creates an unthemed card from a question and an answer
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Card {
            question: question.into(),
            answer: answer.into(),
            theme: Theme::Default,
        }
    }

    /// Returns the same card carrying the given theme
    pub fn with_theme(self, theme: Theme) -> Self {
        Card { theme, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_serializes_lowercase() {
        let card = Card::new("Q", "A").with_theme(Theme::Languages);
        let json = serde_json::to_string(&card).unwrap();
        assert!(json.contains(r#""theme":"languages""#));
    }

    #[test]
    fn missing_or_unknown_theme_is_default() {
        let card: Card = serde_json::from_str(r#"{"question":"Q","answer":"A"}"#).unwrap();
        assert_eq!(card.theme, Theme::Default);

        let card: Card =
            serde_json::from_str(r#"{"question":"Q","answer":"A","theme":"geography"}"#).unwrap();
        assert_eq!(card.theme, Theme::Default);
    }
}
