use std::cmp::Ordering;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Compare two strings the way a user-facing sorted list expects.
///
/// Comparison runs in tiers:
/// 1. base letters, ignoring accents and case (`"Éclair" < "Zebra"`)
/// 2. accents, unaccented first (`"resume" < "résumé"`)
/// 3. case, lowercase first (`"apple" < "Apple"`)
/// 4. code points, so the ordering is total
#[must_use]
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    primary(a, b)
        .then_with(|| secondary(a, b))
        .then_with(|| tertiary(a, b))
        .then_with(|| a.cmp(b))
}

fn primary(a: &str, b: &str) -> Ordering {
    let base = |s: &str| {
        s.nfd()
            .filter(|c| !is_combining_mark(*c))
            .flat_map(char::to_lowercase)
            .collect::<Vec<_>>()
    };
    base(a).cmp(&base(b))
}

fn secondary(a: &str, b: &str) -> Ordering {
    let lhs = a.nfd().flat_map(char::to_lowercase);
    let rhs = b.nfd().flat_map(char::to_lowercase);
    lhs.cmp(rhs)
}

fn tertiary(a: &str, b: &str) -> Ordering {
    let lhs = a.nfd().map(char::is_uppercase);
    let rhs = b.nfd().map(char::is_uppercase);
    lhs.cmp(rhs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_does_not_dominate_ordering() {
        let mut words = vec!["banana", "Apple", "cherry", "apricot"];
        words.sort_by(|a, b| locale_cmp(a, b));
        assert_eq!(words, ["Apple", "apricot", "banana", "cherry"]);
    }

    #[test]
    fn accented_letters_sort_with_their_base_letter() {
        let mut words = vec!["Zebra", "Éclair", "apple"];
        words.sort_by(|a, b| locale_cmp(a, b));
        assert_eq!(words, ["apple", "Éclair", "Zebra"]);

        let mut words = vec!["résumé", "Resume", "resume", "rester"];
        words.sort_by(|a, b| locale_cmp(a, b));
        assert_eq!(words, ["rester", "resume", "Resume", "résumé"]);
    }

    #[test]
    fn composed_and_decomposed_forms_tie_until_code_points() {
        let composed = "caf\u{e9}";
        let decomposed = "cafe\u{301}";
        assert_eq!(primary(composed, decomposed), Ordering::Equal);
        assert_eq!(secondary(composed, decomposed), Ordering::Equal);
        assert_ne!(locale_cmp(composed, decomposed), Ordering::Equal);
    }

    #[test]
    fn lowercase_precedes_uppercase_on_ties() {
        assert_eq!(locale_cmp("apple", "Apple"), Ordering::Less);
        assert_eq!(locale_cmp("Apple", "apple"), Ordering::Greater);
        assert_eq!(locale_cmp("same", "same"), Ordering::Equal);
    }

    #[test]
    fn prefixes_sort_first() {
        assert_eq!(locale_cmp("Work", "Workout"), Ordering::Less);
        assert_eq!(locale_cmp("", "a"), Ordering::Less);
    }
}
