//! Conversions between written identifiers and their radio telephony.

pub const DIGIT_WORDS: [&str; 10] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "niner",
];

const NATO_WORDS: [&str; 26] = [
    "alpha", "bravo", "charlie", "delta", "echo", "foxtrot", "golf", "hotel", "india", "juliet",
    "kilo", "lima", "mike", "november", "oscar", "papa", "quebec", "romeo", "sierra", "tango",
    "uniform", "victor", "whiskey", "xray", "yankee", "zulu",
];

/// NATO word for a letter (`'b'` → `"bravo"`), case-insensitive.
pub fn nato_word(letter: char) -> Option<&'static str> {
    let letter = letter.to_ascii_lowercase();
    letter
        .is_ascii_lowercase()
        .then(|| NATO_WORDS[(letter as u8 - b'a') as usize])
}

/// Letter for a canonical NATO word (`"bravo"` → `'b'`).
pub fn nato_letter(word: &str) -> Option<char> {
    NATO_WORDS
        .iter()
        .position(|w| *w == word)
        .map(|idx| (b'a' + idx as u8) as char)
}

/// Spoken digit-by-digit form of a number: `22` → `"two two"`.
pub fn spoken_digits(n: u32) -> String {
    n.to_string()
        .chars()
        .filter_map(|c| c.to_digit(10))
        .map(|d| DIGIT_WORDS[d as usize])
        .collect::<Vec<_>>()
        .join(" ")
}

/// Spoken form of an identifier, one word per character: digits as digit
/// words, letters as NATO words. Other characters are dropped.
pub fn spoken_characters(s: &str) -> String {
    s.chars()
        .filter_map(|c| match c.to_digit(10) {
            Some(d) => Some(DIGIT_WORDS[d as usize]),
            None => nato_word(c),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Spoken form of a runway designator: `"31L"` → `"three one left"`.
pub fn spoken_runway(runway: &str) -> String {
    runway
        .chars()
        .filter_map(|c| match c.to_ascii_uppercase() {
            'L' => Some("left"),
            'R' => Some("right"),
            'C' => Some("center"),
            c => c.to_digit(10).map(|d| DIGIT_WORDS[d as usize]),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Spoken form of a procedure name: alphabetic stem lowercased, trailing
/// digits spoken (`"KENNEDY5"` → `"kennedy five"`).
pub fn spoken_procedure(name: &str) -> String {
    let stem_len = name
        .char_indices()
        .find(|(_, c)| c.is_ascii_digit())
        .map_or(name.len(), |(idx, _)| idx);
    let (stem, digits) = name.split_at(stem_len);
    let mut parts = vec![stem.to_lowercase()];
    parts.extend(
        digits
            .chars()
            .filter_map(|c| c.to_digit(10))
            .map(|d| DIGIT_WORDS[d as usize].to_string()),
    );
    parts.retain(|p| !p.is_empty());
    parts.join(" ")
}
