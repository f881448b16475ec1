//! Bounded rendering helpers for terminal and table output.

/// One-line form of a message: whitespace runs become single spaces, and
/// anything past `max_chars` characters is replaced by `...`.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let words = input.split_whitespace().collect::<Vec<_>>().join(" ");
    match words.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &words[..cut]),
        None => words,
    }
}

/// Up to `max_items` compacted entries joined by ` | `, with a count of the rest.
pub fn preview_messages(messages: &[String], max_items: usize, max_chars: usize) -> String {
    let shown = messages
        .iter()
        .take(max_items)
        .map(|m| compact_line(m, max_chars))
        .collect::<Vec<_>>()
        .join(" | ");
    match messages.len().saturating_sub(max_items) {
        0 => shown,
        rest => format!("{} (+{} more)", shown, rest),
    }
}

/// Escape a value for a Markdown table cell.
pub fn table_cell(input: &str, max_chars: usize) -> String {
    compact_line(input, max_chars).replace('|', "\\|")
}
