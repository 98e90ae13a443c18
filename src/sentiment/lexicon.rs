use super::{ScorerError, SentimentScore, SentimentScorer};

/// Polarity multiplier applied to a word preceded by a negation.
const NEGATION_FACTOR: f64 = -0.5;
/// Polarity multiplier for a word directly followed by `!`.
const EXCLAMATION_FACTOR: f64 = 1.25;

/// Lexicon-based scorer.
///
/// Every known opinion word contributes a (polarity, subjectivity) pair.
/// Intensifiers scale the next opinion word, negations flip and damp it, and
/// the result is the mean over all opinion words in the text. Text without
/// any opinion word scores `(0.0, 0.0)`.
#[derive(Debug, Clone, Default)]
pub struct LexiconScorer;

#[derive(Debug, PartialEq)]
struct Token<'a> {
    word: &'a str,
    exclaimed: bool,
    ends_sentence: bool,
}

impl SentimentScorer for LexiconScorer {
    fn score(&self, text: &str) -> Result<SentimentScore, ScorerError> {
        let lowered = text.to_lowercase();
        let mut intensity: Option<f64> = None;
        let mut negated = false;
        let mut polarities = Vec::new();
        let mut subjectivities = Vec::new();

        for token in tokenize(&lowered) {
            if is_negation(token.word) {
                negated = true;
            } else if let Some(factor) = intensifier(token.word) {
                intensity = Some(intensity.unwrap_or(1.0) * factor);
            } else if let Some((polarity, subjectivity)) = opinion(token.word) {
                let factor = intensity.take().unwrap_or(1.0);
                let mut polarity = polarity * factor;
                let subjectivity = subjectivity * factor;
                if negated {
                    polarity *= NEGATION_FACTOR;
                    negated = false;
                }
                if token.exclaimed {
                    polarity *= EXCLAMATION_FACTOR;
                }
                polarities.push(polarity.clamp(-1.0, 1.0));
                subjectivities.push(subjectivity.clamp(0.0, 1.0));
            } else {
                // Intensifiers only reach the word right after them.
                intensity = None;
            }

            if token.ends_sentence {
                intensity = None;
                negated = false;
            }
        }

        Ok(SentimentScore {
            polarity: mean(&polarities).clamp(-1.0, 1.0),
            subjectivity: mean(&subjectivities).clamp(0.0, 1.0),
        })
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens: Vec<Token<'_>> = Vec::new();
    let mut start: Option<usize> = None;

    for (idx, ch) in text.char_indices() {
        if ch.is_alphabetic() || (ch == '\'' && start.is_some()) {
            start.get_or_insert(idx);
            continue;
        }
        if let Some(begin) = start.take() {
            tokens.push(Token {
                word: text[begin..idx].trim_end_matches('\''),
                exclaimed: false,
                ends_sentence: false,
            });
        }
        if matches!(ch, '!' | '.' | '?' | ';') {
            if let Some(last) = tokens.last_mut() {
                last.ends_sentence = true;
                if ch == '!' {
                    last.exclaimed = true;
                }
            }
        }
    }
    if let Some(begin) = start {
        tokens.push(Token {
            word: text[begin..].trim_end_matches('\''),
            exclaimed: false,
            ends_sentence: true,
        });
    }
    tokens
}

fn is_negation(word: &str) -> bool {
    matches!(
        word,
        "not" | "no" | "never" | "nothing" | "none" | "nor" | "neither" | "without" | "cannot"
            | "dont" | "cant" | "wont" | "isnt" | "wasnt" | "didnt" | "doesnt"
    ) || word.ends_with("n't")
}

fn intensifier(word: &str) -> Option<f64> {
    let factor = match word {
        "very" | "really" | "so" | "too" => 1.3,
        "extremely" | "incredibly" | "absolutely" | "totally" | "completely" => 1.5,
        "highly" | "super" | "truly" => 1.4,
        "quite" | "pretty" => 1.1,
        "somewhat" | "slightly" | "fairly" | "kind" | "bit" => 0.7,
        _ => return None,
    };
    Some(factor)
}

/// (polarity, subjectivity) of known opinion words.
fn opinion(word: &str) -> Option<(f64, f64)> {
    let entry = match word {
        // positive
        "amazing" => (0.6, 0.9),
        "awesome" => (1.0, 1.0),
        "best" => (1.0, 0.3),
        "brilliant" => (0.9, 1.0),
        "excellent" => (1.0, 1.0),
        "fantastic" => (0.4, 0.9),
        "fast" => (0.2, 0.6),
        "fine" => (0.4, 0.5),
        "good" => (0.7, 0.6),
        "great" => (0.8, 0.75),
        "happy" => (0.8, 1.0),
        "helpful" => (0.5, 0.5),
        "impressive" => (1.0, 1.0),
        "love" | "loved" | "loves" => (0.5, 0.6),
        "nice" => (0.6, 1.0),
        "okay" | "ok" => (0.5, 0.5),
        "perfect" => (1.0, 1.0),
        "pleased" => (0.5, 0.8),
        "quick" => (0.33, 0.5),
        "recommend" | "recommended" => (0.5, 0.5),
        "reliable" => (0.6, 0.6),
        "satisfied" => (0.5, 1.0),
        "special" => (0.36, 0.57),
        "superb" => (1.0, 1.0),
        "wonderful" => (1.0, 1.0),
        "worth" => (0.3, 0.1),
        // negative
        "angry" => (-0.5, 1.0),
        "annoying" => (-0.8, 0.9),
        "awful" => (-1.0, 1.0),
        "bad" => (-0.7, 0.67),
        "broke" | "broken" => (-0.4, 0.4),
        "cheap" => (-0.4, 0.7),
        "damaged" => (-0.5, 0.5),
        "defective" => (-0.6, 0.6),
        "disappointed" => (-0.75, 0.75),
        "disappointing" => (-0.6, 0.7),
        "disgusting" => (-1.0, 1.0),
        "faulty" => (-0.5, 0.5),
        "hate" | "hated" => (-0.8, 0.9),
        "horrible" => (-1.0, 1.0),
        "late" => (-0.3, 0.6),
        "poor" => (-0.4, 0.6),
        "rude" => (-0.3, 0.6),
        "slow" => (-0.3, 0.39),
        "terrible" => (-1.0, 1.0),
        "unhappy" => (-0.6, 0.9),
        "useless" => (-0.5, 0.0),
        "waste" => (-0.2, 0.3),
        "worse" => (-0.4, 0.6),
        "worst" => (-1.0, 1.0),
        "wrong" => (-0.5, 0.9),
        _ => return None,
    };
    Some(entry)
}
