//! String utilities for the domain layer.

/// Truncate a string to at most `max_chars` characters, appending `...`
/// when anything was cut.
///
/// Counts characters rather than bytes so Japanese titles get the same
/// visible length as ASCII ones.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((end, _)) => format!("{}...", &s[..end]),
    }
}
