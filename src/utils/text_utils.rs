/// Marker appended to text cut short for display.
pub const TRUNCATION_MARKER: &str = "...";

/// Keep the first `max_chars` characters of `text`, appending
/// [`TRUNCATION_MARKER`] when anything was cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}{}", &text[..byte_index], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

/// Collapse line breaks so multi-line content fits on one rendered line.
pub fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
