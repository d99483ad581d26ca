//! Content hashing with line-ending normalisation

use sha2::{Digest, Sha256};

/// Compute the SHA-256 digest of `content` as 64 lowercase hex chars.
///
/// CRLF and stray CR line endings are rewritten to LF before hashing so
/// the same logical content hashes identically across platforms.
pub fn digest(content: &str) -> String {
    hex_encode(&Sha256::digest(normalize_endings(content).as_bytes()))
}

/// Compute the SHA-256 digest of an inclusive 1-based line range.
///
/// `start_line` is clamped up to 1 and `end_line` down to the line count.
/// A range that is empty after clamping hashes the empty string. Extracted
/// lines are joined with LF and carry no trailing newline.
pub fn digest_range(content: &str, start_line: u32, end_line: u32) -> String {
    let normalized = normalize_endings(content);
    let lines: Vec<&str> = normalized.split('\n').collect();

    let start = start_line.max(1);
    let end = end_line.min(lines.len() as u32);
    if start > end {
        return digest("");
    }

    let slice = lines[(start - 1) as usize..end as usize].join("\n");
    hex_encode(&Sha256::digest(slice.as_bytes()))
}

fn normalize_endings(content: &str) -> String {
    content.replace("\r\n", "\n").replace('\r', "\n")
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
