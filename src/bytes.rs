//! Byte-level helpers for tab-separated treebank rows

use atoi::FromRadix10Checked;
use bstr::ByteSlice;
use memchr::{memchr_iter, memchr2};

/// Columns a row needs before HEAD and DEPREL can be read
pub const MIN_COLUMNS: usize = 8;

pub const ID: usize = 0;
pub const FORM: usize = 1;
pub const UPOS: usize = 3;
pub const FEATS: usize = 5;
pub const HEAD: usize = 6;
pub const DEPREL: usize = 7;

/// Strip the line terminator, leaving interior tabs alone
#[inline]
pub fn chomp(line: &[u8]) -> &[u8] {
    line.trim_end_with(|c| c == '\n' || c == '\r')
}

/// True for blank separator lines
#[inline]
pub fn is_blank(line: &[u8]) -> bool {
    line.trim().is_empty()
}

#[inline]
pub fn is_comment(line: &[u8]) -> bool {
    line.first() == Some(&b'#')
}

/// Split a row on tabs
pub fn split_fields(line: &[u8]) -> Vec<&[u8]> {
    let mut fields = Vec::with_capacity(10);
    let mut start = 0;
    for tab in memchr_iter(b'\t', line) {
        fields.push(&line[start..tab]);
        start = tab + 1;
    }
    fields.push(&line[start..]);
    fields
}

/// Multiword ranges (`3-4`) and empty nodes (`3.1`) carry `-` or `.` in the ID
#[inline]
pub fn is_excluded_id(id: &[u8]) -> bool {
    memchr2(b'-', b'.', id).is_some()
}

/// Parse a whole field as an unsigned integer
///
/// Unlike a bare `atoi`, trailing garbage and empty input are rejected.
#[inline]
pub fn parse_usize(bytes: &[u8]) -> Option<usize> {
    if bytes.is_empty() {
        return None;
    }
    match usize::from_radix_10_checked(bytes) {
        (Some(n), used) if used == bytes.len() => Some(n),
        _ => None,
    }
}

/// Divide a bytestring into two at delim
#[inline]
pub fn bs_split_once(bytes: &[u8], delim: u8) -> Option<(&[u8], &[u8])> {
    let pos = memchr::memchr(delim, bytes)?;
    Some((&bytes[..pos], &bytes[pos + 1..]))
}
