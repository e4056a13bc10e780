//! Text normalisation applied to every raw address before anything else.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lowercase the input, turn punctuation into spaces, collapse whitespace runs and trim.
///
/// Letters and digits from any script are kept, as is the underscore; everything
/// else that is not whitespace counts as punctuation. The input is composed (NFC)
/// first; combining marks that remain afterwards, like the dot that lowercasing
/// leaves on `İ`, are dropped without splitting the word.
pub fn normalize(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut pending_space = false;
    for c in input.nfc().flat_map(char::to_lowercase) {
        if is_combining_mark(c) {
            continue;
        } else if c.is_alphanumeric() || c == '_' {
            if pending_space && !result.is_empty() {
                result.push(' ');
            }
            pending_space = false;
            result.push(c);
        } else {
            //whitespace and punctuation both act as separators
            pending_space = true;
        }
    }
    result
}

/// Whitespace tokens of an (already normalised) string
pub fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_punctuation_and_case() {
        assert_eq!(normalize("Jl. Mawar No.5, RT 01/RW 02"), "jl mawar no 5 rt 01 rw 02");
    }

    #[test]
    fn normalize_whitespace() {
        assert_eq!(normalize("  Kebon   Melati\t\nTanah Abang  "), "kebon melati tanah abang");
    }

    #[test]
    fn normalize_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" ,.;- "), "");
    }

    #[test]
    fn normalize_combining_marks() {
        //lowercase of U+0130 is "i" followed by U+0307
        assert_eq!(normalize("İSTANBUL"), "istanbul");
        assert_eq!(normalize("Jl. İnpres"), "jl inpres");
        //decomposed input is composed, not split at the accent
        assert_eq!(normalize("Cafe\u{301} Mawar"), "caf\u{e9} mawar");
        assert_eq!(normalize("\u{301}Bogor"), "bogor");
    }

    #[test]
    fn normalize_keeps_underscore_and_digits() {
        assert_eq!(normalize("blok_A-12"), "blok_a 12");
    }
}
