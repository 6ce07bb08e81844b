//! Splitting long texts into Bot API sized messages.

/// Telegram message size limit, in bytes of UTF-8.
pub const TELEGRAM_MAX_MESSAGE_LEN: usize = 4096;

/// Split `text` into pieces of at most `max_len` bytes.
///
/// Cuts prefer the last newline, then the last space, inside the window;
/// the separator at a cut is dropped. A window without either is cut at the
/// last char boundary.
#[must_use]
pub fn chunk_message(text: &str, max_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    if max_len == 0 {
        return chunks;
    }

    let mut rest = text;
    while rest.len() > max_len {
        let mut window = rest.floor_char_boundary(max_len);
        if window == 0 {
            window = rest.chars().next().map_or(rest.len(), char::len_utf8);
        }
        let head = &rest[..window];
        let cut = head
            .rfind('\n')
            .or_else(|| head.rfind(' '))
            .filter(|&at| at > 0);

        match cut {
            Some(at) => {
                chunks.push(rest[..at].to_string());
                // Separators are single-byte.
                rest = &rest[at + 1..];
            },
            None => {
                chunks.push(head.to_string());
                rest = &rest[window..];
            },
        }
    }
    if !rest.is_empty() || chunks.is_empty() {
        chunks.push(rest.to_string());
    }
    chunks
}
