//! Subject detection for generated cards.
use log::trace;

use crate::{Card, Theme};

/// Subject keyword table, in match priority order.
const SUBJECT_KEYWORDS: [(Theme, &[&str]); 5] = [
    (
        Theme::Math,
        &["math", "equation", "calculate", "number", "formula", "geometry", "algebra"],
    ),
    (
        Theme::Science,
        &["science", "biology", "chemistry", "physics", "experiment", "theory", "scientific"],
    ),
    (
        Theme::History,
        &["history", "past", "ancient", "century", "war", "civilization", "historical"],
    ),
    (
        Theme::Languages,
        &["language", "word", "grammar", "vocabulary", "speak", "write", "meaning"],
    ),
    (
        Theme::Arts,
        &["art", "music", "paint", "draw", "creative", "design", "color"],
    ),
];

/// Detects the subject of a question/answer pair.
///
/// Keywords are matched as substrings of the lower-cased `question + " " +
/// answer`, so "warm" counts as "war". The first subject with any hit wins.
pub fn detect_theme(question: &str, answer: &str) -> Theme {
    let combined = format!("{} {}", question, answer).to_lowercase();

    SUBJECT_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| combined.contains(k)))
        .map(|(theme, _)| *theme)
        .unwrap_or(Theme::Default)
}

/// Assigns a theme to every card, replacing whatever theme it carried.
pub fn apply_themes(cards: Vec<Card>) -> Vec<Card> {
    cards
        .into_iter()
        .map(|card| {
            let theme = detect_theme(&card.question, &card.answer);
            trace!("Card {:?} themed as {}", card.question, theme);
            card.with_theme(theme)
        })
        .collect()
}
