//! Header decoding for instrument files.
//!
//! Three conventions are supported: scan to a sentinel line (DTA, info
//! files), a fixed number of lines (Greenlight), and a length declared on a
//! fixed line (EC-Lab). Each returns the header mapping and the number of
//! lines it consumed, which locates the column header rows of the body.

use crate::constants::{COMMENT_MARKER, eclab};
use crate::error::{EchemError, Result};
use crate::models::RawHeader;
use std::path::Path;
use tracing::{debug, warn};

/// Consume lines up to and including the first one containing `sentinel`.
///
/// Blank and `#` lines count toward the consumed total but are not stored.
/// When the sentinel never appears the whole input is treated as header.
pub fn decode_until_sentinel(
    lines: &[String],
    sentinel: &str,
    delimiter: char,
) -> (RawHeader, usize) {
    let mut header = RawHeader::new();
    let mut consumed = 0;
    let mut found = false;

    for line in lines {
        consumed += 1;
        insert_delimited(&mut header, line.trim(), delimiter);
        if line.contains(sentinel) {
            found = true;
            break;
        }
    }

    if !found {
        warn!(
            "Header sentinel '{}' not found; all {} lines taken as header",
            sentinel, consumed
        );
    }
    debug!("Decoded {} header keys from {} lines", header.len(), consumed);

    (header, consumed)
}

/// Take exactly `length` leading lines as header (fewer if the input is short)
pub fn decode_fixed_length(lines: &[String], length: usize, delimiter: char) -> (RawHeader, usize) {
    let mut header = RawHeader::new();
    let consumed = length.min(lines.len());
    for line in &lines[..consumed] {
        insert_delimited(&mut header, line.trim(), delimiter);
    }
    (header, consumed)
}

/// Decode an EC-Lab header whose length is declared as `Nb header lines : N`.
///
/// The returned length is `N - 1`: the last declared line is the column
/// title row, which the body decoder reads at that index.
pub fn decode_declared_length(lines: &[String], path: &Path) -> Result<(RawHeader, usize)> {
    let declared = read_declared_length(lines, path)?;
    let length = declared
        .checked_sub(eclab::HEADER_LENGTH_OFFSET)
        .ok_or_else(|| EchemError::decode(path, "declared header length is zero"))?;

    if length > lines.len() {
        return Err(EchemError::decode(
            path,
            format!(
                "declared header length {} exceeds the {} lines in the file",
                declared,
                lines.len()
            ),
        ));
    }

    let mut header = RawHeader::new();
    for line in &lines[..length] {
        let line = line.trim();
        if line.is_empty() || line.starts_with(COMMENT_MARKER) {
            continue;
        }
        let pair = line
            .split_once(eclab::HEADER_LENGTH_SEPARATOR)
            .or_else(|| line.split_once("  "));
        if let Some((key, value)) = pair {
            header.insert(key.trim(), vec![value.trim().to_string()]);
        }
    }

    debug!(
        "Decoded EC-Lab header: {} keys, declared length {}",
        header.len(),
        declared
    );
    Ok((header, length))
}

fn read_declared_length(lines: &[String], path: &Path) -> Result<usize> {
    let line = lines
        .get(eclab::HEADER_LENGTH_LINE - 1)
        .ok_or_else(|| EchemError::decode(path, "file too short to hold a header length"))?;

    line.split(eclab::HEADER_LENGTH_SEPARATOR)
        .nth(1)
        .and_then(|value| value.trim().parse::<usize>().ok())
        .ok_or_else(|| {
            EchemError::decode(
                path,
                format!(
                    "line {} does not declare a header length: '{}'",
                    eclab::HEADER_LENGTH_LINE,
                    line.trim()
                ),
            )
        })
}

fn insert_delimited(header: &mut RawHeader, line: &str, delimiter: char) {
    if line.is_empty() || line.starts_with(COMMENT_MARKER) {
        return;
    }
    let mut fields = line.split(delimiter).map(str::to_string);
    if let Some(key) = fields.next() {
        header.insert(key, fields.collect());
    }
}
