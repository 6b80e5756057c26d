/// Truncate `text` to at most `max_chars` characters, counting Unicode
/// scalar values rather than bytes so multi-byte text never splits mid-char.
/// Returns the original slice unchanged when it is already short enough.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
