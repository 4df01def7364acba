use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::IndexError;

/// One non-blank line of the prompt corpus, stored trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PromptEntry(String);

impl PromptEntry {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PromptEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Split corpus text into entries, dropping lines that are blank after trimming.
pub fn parse_prompts(text: &str) -> Vec<PromptEntry> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PromptEntry::new)
        .collect()
}

/// Read a newline-delimited prompt file.
///
/// A missing path is reported as [`IndexError::NotFound`] before the file is
/// opened, so callers never see a bare I/O error for that case.
pub fn load_prompts(path: impl AsRef<Path>) -> Result<Vec<PromptEntry>, IndexError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(IndexError::NotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path).map_err(|source| IndexError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let entries = parse_prompts(&text);
    tracing::debug!(path = %path.display(), entries = entries.len(), "loaded prompt corpus");
    Ok(entries)
}
