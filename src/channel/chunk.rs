//! Splitting long replies for transports with a message size limit.

/// Telegram hard limit for text messages, in characters.
pub const TELEGRAM_MAX_LEN: usize = 4096;

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Cuts prefer the last paragraph break (`\n\n`), then the last line break,
/// then fall back to a hard cut on a character boundary. Newlines at a cut
/// are dropped. Empty text yields no chunks.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        let Some((window_end, _)) = remaining.char_indices().nth(max_chars) else {
            chunks.push(remaining.to_string());
            break;
        };

        let window = &remaining[..window_end];
        let split_at = window
            .rfind("\n\n")
            .filter(|&pos| pos > 0)
            .or_else(|| window.rfind('\n').filter(|&pos| pos > 0))
            .unwrap_or(window_end);

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start_matches('\n');
    }

    chunks
}
