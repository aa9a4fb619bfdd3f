//! Line reader for instrument files.
//!
//! Turns a path or an in-memory list of lines into the ordered raw lines the
//! header and body decoders work on, using the text encoding of the format.

use crate::error::{EchemError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Text encoding of an instrument file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// UTF-8, invalid sequences replaced
    Utf8,
    /// ISO-8859-1, every byte is one character
    Latin1,
}

impl TextEncoding {
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            TextEncoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
        }
    }
}

/// Where the raw lines of an instrument file come from
#[derive(Debug, Clone)]
pub enum LineSource {
    Path(PathBuf),
    /// Already-split content, labelled with the name used as file identity
    Lines { label: PathBuf, lines: Vec<String> },
}

impl LineSource {
    pub fn from_lines<S: Into<String>>(
        label: impl Into<PathBuf>,
        lines: impl IntoIterator<Item = S>,
    ) -> Self {
        LineSource::Lines {
            label: label.into(),
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Path used for identity and error messages
    pub fn path(&self) -> &Path {
        match self {
            LineSource::Path(path) => path,
            LineSource::Lines { label, .. } => label,
        }
    }
}

impl From<PathBuf> for LineSource {
    fn from(path: PathBuf) -> Self {
        LineSource::Path(path)
    }
}

impl From<&Path> for LineSource {
    fn from(path: &Path) -> Self {
        LineSource::Path(path.to_path_buf())
    }
}

/// Read all lines of `source`, without line terminators
pub fn read_lines(source: &LineSource, encoding: TextEncoding) -> Result<Vec<String>> {
    match source {
        LineSource::Path(path) => {
            if !path.exists() {
                return Err(EchemError::NotFound { path: path.clone() });
            }
            let bytes = fs::read(path)?;
            let text = encoding.decode(&bytes);
            let lines: Vec<String> = text.lines().map(str::to_string).collect();
            debug!("Read {} lines from {}", lines.len(), path.display());
            Ok(lines)
        }
        LineSource::Lines { lines, .. } => Ok(lines
            .iter()
            .map(|line| line.trim_end_matches(['\r', '\n']).to_string())
            .collect()),
    }
}
