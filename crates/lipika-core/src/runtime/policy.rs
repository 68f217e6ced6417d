//! Mix-mode retention heuristic.

/// Latin-script words users expect to see unchanged.
pub const KEEP_LIST: &[&str] = &[
    "hyderabad",
    "bangalore",
    "mumbai",
    "delhi",
    "college",
    "school",
    "office",
    "instagram",
    "facebook",
    "whatsapp",
    "java",
    "python",
    "c++",
    "btech",
    "mtech",
    "email",
];

const RETAIN_PUNCTUATION: &[char] = &['@', '#', '&', '/', '.', '_', '-'];

/// Whether a token should stay in Latin script in mix mode.
pub fn should_keep_latin(token: &str) -> bool {
    let Some(first) = token.chars().next() else {
        return true;
    };

    let lower = token.to_lowercase();
    KEEP_LIST.contains(&lower.as_str())
        || token.chars().any(|ch| ch.is_ascii_digit())
        || token.contains(RETAIN_PUNCTUATION)
        || first.is_uppercase()
}
