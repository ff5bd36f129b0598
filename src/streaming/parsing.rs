//! Zero-allocation line parsing for BED-like track files.
//!
//! Track readers call these on every line, so they work on raw bytes and
//! report failure as `None`; the reader attaches line context to the error.

use memchr::memchr;

/// Fast u64 parsing - no allocation, no error formatting.
///
/// Returns None if the input is empty or contains non-digit characters.
#[inline(always)]
pub fn parse_u64_fast(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() {
        return None;
    }
    let mut n: u64 = 0;
    for &b in bytes {
        let d = b.wrapping_sub(b'0');
        if d > 9 {
            return None;
        }
        n = n.checked_mul(10)?.checked_add(d as u64)?;
    }
    Some(n)
}

/// Parse the leading chrom/start/end fields of a line.
///
/// Returns `(chrom, start, end, rest_start)` where `rest_start` is the byte
/// offset just past the end field (pointing at a tab, or at the end of line).
#[inline]
pub fn parse_bed3_bytes(line: &[u8]) -> Option<(&[u8], u64, u64, usize)> {
    let tab1 = memchr(b'\t', line)?;
    let chrom = &line[..tab1];
    if chrom.is_empty() {
        return None;
    }

    let rest1 = &line[tab1 + 1..];
    let tab2 = memchr(b'\t', rest1)?;
    let start = parse_u64_fast(&rest1[..tab2])?;

    let rest2 = &rest1[tab2 + 1..];
    let end_len = memchr(b'\t', rest2).unwrap_or(rest2.len());
    let end = parse_u64_fast(trim_eol(&rest2[..end_len]))?;

    Some((chrom, start, end, tab1 + 1 + tab2 + 1 + end_len))
}

/// Extract the column following `rest_start` (the fourth column of a line).
///
/// Returns None when the line has no further column.
#[inline]
pub fn fourth_field(line: &[u8], rest_start: usize) -> Option<&[u8]> {
    let rest = line.get(rest_start..)?;
    if rest.first() != Some(&b'\t') {
        return None;
    }
    let rest = &rest[1..];
    let len = memchr(b'\t', rest).unwrap_or(rest.len());
    let field = trim_eol(&rest[..len]);
    if field.is_empty() {
        None
    } else {
        Some(field)
    }
}

/// Check if a line should be skipped (empty, comment, or header).
#[inline(always)]
pub fn should_skip_line(line: &[u8]) -> bool {
    line.is_empty() || line[0] == b'#' || line.starts_with(b"track") || line.starts_with(b"browser")
}

#[inline(always)]
fn trim_eol(bytes: &[u8]) -> &[u8] {
    let mut end = bytes.len();
    while end > 0 && (bytes[end - 1] == b'\n' || bytes[end - 1] == b'\r') {
        end -= 1;
    }
    &bytes[..end]
}
