//! Byte-level helpers for dictionary scanning
//!
//! Splits a memory-mapped file into line-aligned chunks and decodes each chunk
//! permissively: invalid UTF-8 sequences are dropped, never fatal.

use bstr::ByteSlice;

/// Target chunk size for parallel scanning (1MB)
pub const CHUNK_SIZE: usize = 1024 * 1024;

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Skip a leading UTF-8 byte order mark
pub fn strip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(&UTF8_BOM[..]).unwrap_or(data)
}

/// Split `data` into chunks of roughly `chunk_size` bytes
///
/// Each boundary is pushed forward past the next `\n`, so no line is cut in
/// two. The chunks cover `data` exactly.
pub fn split_chunks(data: &[u8], chunk_size: usize) -> Vec<&[u8]> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::with_capacity(data.len() / chunk_size + 1);
    let mut start = 0;

    while start < data.len() {
        let tentative = (start + chunk_size).min(data.len());
        let end = if tentative == data.len() {
            tentative
        } else {
            memchr::memchr(b'\n', &data[tentative..])
                .map(|i| tentative + i + 1)
                .unwrap_or(data.len())
        };

        chunks.push(&data[start..end]);
        start = end;
    }

    chunks
}

/// Decode bytes as UTF-8, removing invalid sequences
pub fn decode_dropping_invalid(bytes: &[u8]) -> String {
    let mut decoded = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        decoded.push_str(chunk.valid());
    }
    decoded
}

/// Call `f` with every trimmed, non-empty line of `chunk`
pub fn for_each_entry<F>(chunk: &[u8], mut f: F)
where
    F: FnMut(&str),
{
    for line in chunk.lines() {
        let decoded;
        let text = match std::str::from_utf8(line) {
            Ok(s) => s,
            Err(_) => {
                decoded = decode_dropping_invalid(line);
                decoded.as_str()
            }
        };

        let entry = text.trim();
        if !entry.is_empty() {
            f(entry);
        }
    }
}
