//! Flesch Reading Ease.
//!
//! `206.835 - 1.015 * (words / sentences) - 84.6 * (syllables / words)`
//!
//! Raw values fall outside [0, 100] for very short or unusual text. This
//! module returns the raw value; the scoring engine clamps it.

/// A readability capability: higher means easier to read.
pub trait Readability: Send + Sync {
    fn score(&self, text: &str) -> f64;
}

/// Flesch Reading Ease with a vowel-group syllable heuristic.
#[derive(Debug, Clone, Copy, Default)]
pub struct FleschReadability;

impl Readability for FleschReadability {
    fn score(&self, text: &str) -> f64 {
        let words: Vec<&str> = words(text).collect();
        if words.is_empty() {
            return 0.0;
        }

        let word_count = words.len() as f64;
        let sentence_count = count_sentences(text).max(1) as f64;
        let syllable_count: usize = words.iter().map(|w| count_syllables(w)).sum();

        206.835 - 1.015 * (word_count / sentence_count) - 84.6 * (syllable_count as f64 / word_count)
    }
}

/// Whitespace-separated tokens with surrounding punctuation removed.
fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| w.chars().any(|c| c.is_alphanumeric()))
}

/// Runs of `.`, `!` or `?` each close one sentence; trailing text without a
/// terminator counts as a sentence too.
fn count_sentences(text: &str) -> usize {
    let mut sentences = 0;
    let mut in_terminator = false;
    let mut pending_words = false;

    for c in text.chars() {
        if matches!(c, '.' | '!' | '?') {
            if !in_terminator && pending_words {
                sentences += 1;
                pending_words = false;
            }
            in_terminator = true;
        } else {
            in_terminator = false;
            if c.is_alphanumeric() {
                pending_words = true;
            }
        }
    }

    if pending_words {
        sentences += 1;
    }
    sentences
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
}

/// Counts vowel groups, dropping a silent trailing `e` (but not `-le`).
/// Every word has at least one syllable.
pub fn count_syllables(word: &str) -> usize {
    let letters: Vec<char> = word
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect();

    if letters.is_empty() {
        return 1;
    }

    let mut groups = 0;
    let mut previous_vowel = false;
    for &c in &letters {
        let vowel = is_vowel(c);
        if vowel && !previous_vowel {
            groups += 1;
        }
        previous_vowel = vowel;
    }

    let n = letters.len();
    let silent_e = n > 2
        && letters[n - 1] == 'e'
        && !is_vowel(letters[n - 2])
        && !(letters[n - 2] == 'l' && !is_vowel(letters[n - 3]));
    if silent_e && groups > 1 {
        groups -= 1;
    }

    groups.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syllable_counts() {
        assert_eq!(count_syllables("cat"), 1);
        assert_eq!(count_syllables("make"), 1);
        assert_eq!(count_syllables("table"), 2);
        assert_eq!(count_syllables("readability"), 5);
        assert_eq!(count_syllables("rhythm"), 1);
        assert_eq!(count_syllables("42"), 1);
    }

    #[test]
    fn test_sentence_counting() {
        assert_eq!(count_sentences("One. Two! Three?"), 3);
        assert_eq!(count_sentences("Wait... what?!"), 2);
        assert_eq!(count_sentences("no terminator"), 1);
        assert_eq!(count_sentences("..."), 0);
    }

    #[test]
    fn test_simple_text_scores_high() {
        let score = FleschReadability.score("The cat sat on the mat. The dog ran.");
        assert!(score > 90.0, "score was {score}");
    }

    #[test]
    fn test_dense_text_scores_low() {
        let text = "Institutional interoperability necessitates comprehensive organizational \
                    standardization, particularly regarding infrastructural documentation \
                    methodologies and administrative responsibilities.";
        let score = FleschReadability.score(text);
        assert!(score < 0.0, "score was {score}");
    }

    #[test]
    fn test_text_without_words_scores_zero() {
        assert_eq!(FleschReadability.score(""), 0.0);
        assert_eq!(FleschReadability.score("?! ..."), 0.0);
    }
}
