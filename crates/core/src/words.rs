//! Sentence handling shared by mnemonic dictionary implementations.
//!
//! This module is not a dictionary. It provides the delimiter, join, split,
//! and normalization behavior that the BIP39 and Electrum dictionaries have
//! in common, so that wordlist crates need only supply words.

use unicode_normalization::UnicodeNormalization;

/// The ASCII space delimiter used by every language but Japanese.
pub const ASCII_SPACE: char = ' ';

/// The U+3000 ideographic space delimiter used by Japanese sentences.
pub const IDEOGRAPHIC_SPACE: char = '\u{3000}';

/// A mnemonic dictionary language.
#[derive(serde::Serialize, serde::Deserialize, Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Lingo {
    /// Chinese (simplified)
    ChineseSimplified,
    /// Chinese (traditional)
    ChineseTraditional,
    /// Czech
    Czech,
    /// English
    English,
    /// French
    French,
    /// Italian
    Italian,
    /// Japanese
    Japanese,
    /// Korean
    Korean,
    /// Portuguese
    Portuguese,
    /// Spanish
    Spanish,
}

/// The delimiter a sentence in the given language is joined with:
/// ideographic space for Japanese, ASCII space otherwise.
pub fn to_delimiter(lingo: Lingo) -> char {
    match lingo {
        Lingo::Japanese => IDEOGRAPHIC_SPACE,
        _ => ASCII_SPACE,
    }
}

/// Join words into a sentence with the language's delimiter.
pub fn join<S: AsRef<str>>(words: &[S], lingo: Lingo) -> String {
    let delimiter = to_delimiter(lingo).to_string();
    words
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(&delimiter)
}

/// Split a sentence into words. Japanese splits on every Unicode separator;
/// all other languages split on ASCII space only. Empty tokens are retained,
/// matching the inverse of `join`.
pub fn split(sentence: &str, lingo: Lingo) -> Vec<String> {
    match lingo {
        Lingo::Japanese => sentence
            .split(char::is_whitespace)
            .map(ToOwned::to_owned)
            .collect(),
        _ => sentence
            .split(ASCII_SPACE)
            .map(ToOwned::to_owned)
            .collect(),
    }
}

/// Normalize words for dictionary lookup: trim ASCII whitespace, lowercase,
/// and apply Unicode NFKD decomposition.
pub fn try_normalize<S: AsRef<str>>(words: &[S]) -> Vec<String> {
    words
        .iter()
        .map(|word| {
            word.as_ref()
                .trim_matches(|c: char| c.is_ascii_whitespace())
                .to_lowercase()
                .nfkd()
                .collect::<String>()
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_selects_delimiters() {
        assert_eq!(to_delimiter(Lingo::English), ASCII_SPACE);
        assert_eq!(to_delimiter(Lingo::Korean), ASCII_SPACE);
        assert_eq!(to_delimiter(Lingo::ChineseSimplified), ASCII_SPACE);
        assert_eq!(to_delimiter(Lingo::Japanese), IDEOGRAPHIC_SPACE);
    }

    #[test]
    fn it_joins_with_the_language_delimiter() {
        let words = ["abandon", "ability", "able"];
        assert_eq!(join(&words, Lingo::English), "abandon ability able");
        assert_eq!(
            join(&words, Lingo::Japanese),
            "abandon\u{3000}ability\u{3000}able"
        );
    }

    #[test]
    fn it_splits_ascii_space_only_for_non_japanese() {
        let sentence = "uno dos\u{3000}tres";
        assert_eq!(split(sentence, Lingo::Spanish), vec!["uno", "dos\u{3000}tres"]);
    }

    #[test]
    fn it_splits_all_separators_for_japanese() {
        let sentence = "\u{3042}\u{3000}\u{3044} \u{3046}";
        assert_eq!(
            split(sentence, Lingo::Japanese),
            vec!["\u{3042}", "\u{3044}", "\u{3046}"]
        );
    }

    #[test]
    fn it_round_trips_join_and_split() {
        let words = vec!["alpha".to_owned(), "beta".to_owned(), "gamma".to_owned()];
        for lingo in [Lingo::English, Lingo::Japanese] {
            assert_eq!(split(&join(&words, lingo), lingo), words);
        }
    }

    #[test]
    fn it_normalizes_words() {
        assert_eq!(try_normalize::<&str>(&[]), Vec::<String>::new());
        assert_eq!(try_normalize(&["abandon"]), vec!["abandon"]);
        assert_eq!(try_normalize(&["AbAnDoN", " trimmed\t"]), vec!["abandon", "trimmed"]);
        // NFKD decomposes the precomposed e-acute into e + combining acute.
        assert_eq!(try_normalize(&["caf\u{e9}"]), vec!["cafe\u{301}"]);
    }
}
