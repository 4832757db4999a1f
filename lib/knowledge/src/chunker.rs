//! Fixed-size text chunking.
//!
//! Chunks are measured in characters, not bytes, so multi-byte text never
//! splits inside a code point. No overlap between chunks.

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Splits `text` into consecutive chunks of at most `chunk_size` characters.
///
/// Empty input produces no chunks. A `chunk_size` of zero is treated as the
/// default.
#[must_use]
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<String> {
    let chunk_size = if chunk_size == 0 {
        DEFAULT_CHUNK_SIZE
    } else {
        chunk_size
    };

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == chunk_size {
            chunks.push(text[start..idx].to_owned());
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        chunks.push(text[start..].to_owned());
    }

    chunks
}
