/// Normalize header text for marker matching.
///
/// Lower-cases, strips zero-width characters, drops brackets and periods,
/// maps `_` and `-` to spaces and collapses whitespace.
pub fn normalize_header(text: &str) -> String {
    let mapped: String = text
        .chars()
        .filter(|c| !matches!(c, '\u{200B}'..='\u{200D}' | '\u{FEFF}'))
        .filter(|c| !matches!(c, '[' | ']' | '(' | ')' | '.'))
        .map(|c| if c == '_' || c == '-' { ' ' } else { c })
        .collect();
    mapped
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
