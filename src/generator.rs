//! Card generation from raw text.
//!
//! The remote service is tried first. When it fails the cards are built
//! locally by turning sentences into definition-style questions about one of
//! their longer words.
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use crate::{
    apply_themes, Card, DeckRemote, Generation, GenerationSource, MemoError, Result,
};

/// At most this many sentences are turned into cards by the local heuristic
pub const MAX_FALLBACK_SENTENCES: usize = 10;

/// Sentences with fewer words are skipped
const MIN_SENTENCE_WORDS: usize = 5;

/// Only words longer than this are key-term candidates
const MIN_KEY_TERM_LEN: usize = 5;

const TERM_PUNCTUATION: &[char] = &[',', '.', ';', ':', '?', '!', '"', '\''];

/// `{term}` is replaced by the chosen key term
const QUESTION_TEMPLATES: [&str; 5] = [
    "What does \"{term}\" refer to in this context?",
    "Explain the concept of {term}.",
    "What is meant by \"{term}\"?",
    "Define {term}.",
    "Describe what {term} means.",
];

/// Turns text into themed cards
pub struct CardGenerator {
    remote: Arc<dyn DeckRemote>,
    rng: Mutex<StdRng>,
}

impl CardGenerator {
    pub fn new(remote: Arc<dyn DeckRemote>) -> Self {
        Self {
            remote,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Generator whose local fallback is reproducible
    pub fn with_seed(remote: Arc<dyn DeckRemote>, seed: u64) -> Self {
        Self {
            remote,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Generates themed cards from `text`.
    ///
    /// Blank text fails with [`MemoError::EmptyInput`] before anything is
    /// sent. An unreachable remote switches to the local heuristic, any other
    /// error is returned as is. When neither
    /// path yields a card the result is [`MemoError::NoContentGenerated`].
    pub async fn generate(&self, text: &str) -> Result<Generation> {
        let text = text.trim();
        if text.is_empty() {
            return Err(MemoError::EmptyInput);
        }

        let (cards, source) = match self.remote.generate_flashcards(text).await {
            Ok(cards) => {
                info!("Remote service generated {} cards", cards.len());
                (cards, GenerationSource::Remote)
            }
            Err(e) if e.is_remote() => {
                warn!("Error generating flashcards remotely, using local generation: {}", e);
                let cards = self.generate_locally(text)?;
                (cards, GenerationSource::LocalFallback)
            }
            Err(e) => return Err(e),
        };

        if cards.is_empty() {
            return Err(MemoError::NoContentGenerated);
        }

        Ok(Generation {
            cards: apply_themes(cards),
            source,
        })
    }

    fn generate_locally(&self, text: &str) -> Result<Vec<Card>> {
        let mut rng = self.rng.lock().map_err(|_| MemoError::LockAcquisitionFailed {
            message: "Failed to acquire lock on generator rng".to_string(),
        })?;
        Ok(local_flashcards(text, &mut *rng))
    }
}

/// Splits text into sentences ending in `.`, `!` or `?`.
///
/// A run of terminators stays with its sentence ("Really?!"). Trailing text
/// without a terminator is not a sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start: Option<usize> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_terminator(c) {
            start.get_or_insert(i);
            continue;
        }

        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if !is_terminator(next) {
                break;
            }
            end = j + next.len_utf8();
            chars.next();
        }

        if let Some(s) = start.take() {
            sentences.push(&text[s..end]);
        }
    }

    sentences
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Words of a sentence that make good question subjects
fn key_terms(sentence: &str) -> Vec<String> {
    sentence
        .split_whitespace()
        .filter(|word| word.chars().count() > MIN_KEY_TERM_LEN)
        .map(|word| word.replace(TERM_PUNCTUATION, ""))
        .filter(|term| !term.is_empty())
        .collect()
}

/// Local fallback heuristic: one card per qualifying sentence among the
/// first [`MAX_FALLBACK_SENTENCES`], in text order.
pub fn local_flashcards<R: Rng + ?Sized>(text: &str, rng: &mut R) -> Vec<Card> {
    let cards: Vec<Card> = split_sentences(text)
        .into_iter()
        .take(MAX_FALLBACK_SENTENCES)
        .filter_map(|sentence| {
            let sentence = sentence.trim();
            if sentence.split_whitespace().count() < MIN_SENTENCE_WORDS {
                return None;
            }

            let terms = key_terms(sentence);
            let term = terms.choose(&mut *rng)?;
            let template = QUESTION_TEMPLATES.choose(&mut *rng)?;

            Some(Card::new(template.replace("{term}", term), sentence))
        })
        .collect();

    debug!("Local generation produced {} cards", cards.len());
    cards
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRemote;
    use crate::Theme;

    const TEXT: &str = "Physics explains how sunlight becomes chemical energy. \
        Plants are green. \
        The mitochondria produces energy for every living cell! \
        Why do leaves change their colour in autumn?";

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn splits_on_terminators_and_drops_unterminated_tail() {
        let sentences = split_sentences("One two. Three?! Four! trailing words");
        assert_eq!(sentences, vec!["One two.", " Three?!", " Four!"]);
    }

    #[test]
    fn leading_terminators_do_not_form_a_sentence() {
        assert_eq!(split_sentences("... Hello there."), vec![" Hello there."]);
        assert!(split_sentences("no terminator at all").is_empty());
    }

    #[test]
    fn key_terms_are_long_words_without_punctuation() {
        assert_eq!(
            key_terms("The \"quantum\" state, observed carefully."),
            vec!["quantum", "state", "observed", "carefully"]
        );
    }

    #[test]
    fn local_generation_skips_short_sentences() {
        let cards = local_flashcards(TEXT, &mut rng());

        // "Plants are green." has fewer than five words
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0].answer, "Physics explains how sunlight becomes chemical energy.");
        assert_eq!(cards[1].answer, "The mitochondria produces energy for every living cell!");
        assert_eq!(cards[2].answer, "Why do leaves change their colour in autumn?");
        for card in &cards {
            assert!(!card.question.is_empty());
        }
    }

    #[test]
    fn question_mentions_a_key_term_of_its_sentence() {
        let cards = local_flashcards(TEXT, &mut rng());
        for card in &cards {
            let terms = key_terms(&card.answer);
            assert!(terms.iter().any(|t| card.question.contains(t.as_str())));
        }
    }

    #[test]
    fn sentence_without_long_words_is_skipped() {
        let cards = local_flashcards("I am a cat and he is a dog.", &mut rng());
        assert!(cards.is_empty());
    }

    #[test]
    fn local_generation_is_capped_at_ten_cards() {
        let text = "Elephants remember their family members for decades. ".repeat(25);
        let cards = local_flashcards(&text, &mut rng());
        assert_eq!(cards.len(), MAX_FALLBACK_SENTENCES);
    }

    #[tokio::test]
    async fn blank_input_fails_without_remote_call() {
        let remote = Arc::new(FakeRemote::new());
        let generator = CardGenerator::with_seed(remote.clone(), 1);

        for text in ["", "   ", "\n\t"] {
            let err = generator.generate(text).await.unwrap_err();
            assert!(matches!(err, MemoError::EmptyInput));
        }
        assert_eq!(remote.calls(), 0);
    }

    #[tokio::test]
    async fn remote_cards_are_returned_in_order_and_themed() {
        let remote = Arc::new(FakeRemote::new().with_generated(vec![
            Card::new("What is algebra?", "A branch of mathematics."),
            Card::new("Who?", "Nobody."),
        ]));
        let generator = CardGenerator::with_seed(remote.clone(), 1);

        let generation = generator.generate("some text").await.unwrap();
        assert_eq!(generation.source, GenerationSource::Remote);
        assert_eq!(generation.cards[0].question, "What is algebra?");
        assert_eq!(generation.cards[0].theme, Theme::Math);
        assert_eq!(generation.cards[1].theme, Theme::Default);
        assert_eq!(remote.calls(), 1);
    }

    #[tokio::test]
    async fn remote_failure_falls_back_to_local_heuristic() {
        let remote = Arc::new(FakeRemote::new());
        remote.set_failing(true);
        let generator = CardGenerator::with_seed(remote, 3);

        let generation = generator.generate(TEXT).await.unwrap();
        assert_eq!(generation.source, GenerationSource::LocalFallback);
        assert_eq!(generation.cards.len(), 3);
        // "physics" in the first answer
        assert_eq!(generation.cards[0].theme, Theme::Science);
    }

    #[tokio::test]
    async fn nothing_generated_is_reported() {
        let remote = Arc::new(FakeRemote::new());
        remote.set_failing(true);
        let generator = CardGenerator::with_seed(remote, 3);

        let err = generator.generate("Too short. Tiny!").await.unwrap_err();
        assert!(matches!(err, MemoError::NoContentGenerated));
    }

    #[tokio::test]
    async fn empty_remote_result_is_reported() {
        let remote = Arc::new(FakeRemote::new().with_generated(Vec::new()));
        let generator = CardGenerator::with_seed(remote, 3);

        let err = generator.generate("Anything at all here.").await.unwrap_err();
        assert!(matches!(err, MemoError::NoContentGenerated));
    }
}
