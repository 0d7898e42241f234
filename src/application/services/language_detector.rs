use crate::domain::Language;

/// Script fallback for the Devanagari block when no Marathi marker is found,
/// and the overall fallback for text no rule classifies.
const DEFAULT_LANGUAGE: Language = Language::Hindi;

/// Words that mark Devanagari text as Marathi rather than Hindi. First match
/// wins.
const MARATHI_MARKERS: [&str; 6] = ["आहे", "होते", "करतो", "करते", "मला", "तुला"];

/// Fixed stop-word list for Latin-script classification. Three or more
/// distinct hits among the first 500 characters classifies as English.
const ENGLISH_STOP_WORDS: [&str; 10] = [
    "the", "and", "is", "to", "of", "a", "you", "are", "it", "how",
];

const ENGLISH_HITS_THRESHOLD: usize = 3;
const CLASSIFY_WINDOW_CHARS: usize = 500;
const MIN_CLASSIFIABLE_CHARS: usize = 10;

/// Classify transcript text into one of the nine supported languages.
///
/// Pure and deterministic: Unicode-block membership first (the eight
/// non-Latin languages map to disjoint ranges, with Devanagari disambiguated
/// Hindi/Marathi by keyword), then English stop-word counting, then the
/// default. Short or empty input classifies as the default.
pub fn detect(text: &str) -> Language {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_CLASSIFIABLE_CHARS {
        return DEFAULT_LANGUAGE;
    }

    if trimmed.chars().any(is_devanagari) {
        if MARATHI_MARKERS.iter().any(|word| trimmed.contains(word)) {
            return Language::Marathi;
        }
        return Language::Hindi;
    }

    for (range_check, language) in [
        (is_tamil as fn(char) -> bool, Language::Tamil),
        (is_telugu, Language::Telugu),
        (is_bengali, Language::Bengali),
        (is_gujarati, Language::Gujarati),
        (is_kannada, Language::Kannada),
        (is_gurmukhi, Language::Punjabi),
    ] {
        if trimmed.chars().any(range_check) {
            return language;
        }
    }

    let window: String = trimmed
        .chars()
        .take(CLASSIFY_WINDOW_CHARS)
        .collect::<String>()
        .to_lowercase();
    let distinct_hits = ENGLISH_STOP_WORDS
        .iter()
        .filter(|word| {
            window
                .split(|c: char| !c.is_alphabetic())
                .any(|token| token == **word)
        })
        .count();

    if distinct_hits >= ENGLISH_HITS_THRESHOLD {
        return Language::English;
    }

    DEFAULT_LANGUAGE
}

fn is_devanagari(c: char) -> bool {
    ('\u{0900}'..='\u{097F}').contains(&c)
}

fn is_tamil(c: char) -> bool {
    ('\u{0B80}'..='\u{0BFF}').contains(&c)
}

fn is_telugu(c: char) -> bool {
    ('\u{0C00}'..='\u{0C7F}').contains(&c)
}

fn is_bengali(c: char) -> bool {
    ('\u{0980}'..='\u{09FF}').contains(&c)
}

fn is_gujarati(c: char) -> bool {
    ('\u{0A80}'..='\u{0AFF}').contains(&c)
}

fn is_kannada(c: char) -> bool {
    ('\u{0C80}'..='\u{0CFF}').contains(&c)
}

fn is_gurmukhi(c: char) -> bool {
    ('\u{0A00}'..='\u{0A7F}').contains(&c)
}
