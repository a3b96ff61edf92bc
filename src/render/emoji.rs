use regex::Regex;
use std::sync::OnceLock;

// Emoticons, pictographs, transport, flags and enclosed alphanumerics, plus
// the arrows, clocks and weather glyphs the prompt templates tend to echo back.
const EMOJI_CLASS: &str = concat!(
    "[",
    r"\x{1F600}-\x{1F64F}",
    r"\x{1F300}-\x{1F5FF}",
    r"\x{1F680}-\x{1F6FF}",
    r"\x{1F100}-\x{1F2FF}",
    r"\x{1F900}-\x{1F9FF}",
    r"\x{1FA70}-\x{1FAFF}",
    r"\x{2600}-\x{26FF}",
    r"\x{2700}-\x{27BF}",
    r"\x{2460}-\x{24FF}",
    r"\x{2190}-\x{21FF}",
    r"\x{2B05}-\x{2B07}\x{2B1B}\x{2B1C}\x{2B50}\x{2B55}",
    r"\x{231A}\x{231B}\x{23E9}-\x{23FA}",
    r"\x{FE0E}\x{FE0F}\x{200D}\x{20E3}",
    "]+"
);

fn emoji_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(EMOJI_CLASS).expect("emoji class is a valid regex"))
}

/// Remove emoji code points and tidy the whitespace they leave behind.
pub fn strip_emoji(text: &str) -> String {
    emoji_pattern()
        .replace_all(text, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// True if `text` contains any code point the filter would remove.
pub fn contains_emoji(text: &str) -> bool {
    emoji_pattern().is_match(text)
}
