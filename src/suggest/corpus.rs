//! Candidate corpus: the fixed set of phrases eligible as suggestions

use crate::core::config::SuggestionsConfig;
use crate::core::error::{AutocompleteError, Result};
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;

/// Phrases served when no corpus is configured
pub const DEFAULT_CORPUS: &[&str] = &[
    "MRI LUMBO-SACRAL SPINE",
    "Sagittal and Axial T1 and T2 W sequences",
    "Coronal and Sagittal STIR sequences",
    "Screening sagittal T1W sequence through cervico-dorsal spine",
    "Anterior wedge compression of L1 vertebral body noted with loss of up to 40% height",
    "Marginal osteophytes are noted at multiple levels",
    "Fecalarthropathy noted with ligamentum flavum thickening of lower lumbar levels",
];

/// Immutable, ordered, non-empty list of candidate phrases
///
/// Cloning shares the underlying storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corpus {
    phrases: Arc<[String]>,
}

impl Corpus {
    /// Build a corpus from phrases, keeping their order
    pub fn new<I, S>(phrases: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let phrases: Vec<String> = phrases
            .into_iter()
            .map(Into::into)
            .filter(|p| !p.trim().is_empty())
            .collect();

        if phrases.is_empty() {
            return Err(AutocompleteError::InitializationError(
                "suggestion corpus is empty".to_string(),
            ));
        }

        Ok(Self { phrases: phrases.into() })
    }

    /// Parse a corpus file: one phrase per line, blank lines and `#` comments skipped
    pub fn from_lines(text: &str) -> Result<Self> {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.starts_with('#')),
        )
    }

    /// Read a corpus file from disk
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AutocompleteError::InitializationError(format!(
                "failed to read corpus file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_lines(&text)
    }

    /// Load the corpus described by configuration; a corpus file wins over the inline list
    pub fn load(config: &SuggestionsConfig) -> Result<Self> {
        match &config.corpus_file {
            Some(path) => Self::from_file(path),
            None => Self::new(config.corpus.iter().cloned()),
        }
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}

impl Default for Corpus {
    fn default() -> Self {
        Self {
            phrases: DEFAULT_CORPUS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Deref for Corpus {
    type Target = [String];

    fn deref(&self) -> &[String] {
        &self.phrases
    }
}
