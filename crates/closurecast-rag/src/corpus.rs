//! Static knowledge corpus
//!
//! Two on-disk formats are accepted:
//!
//! - Text: blocks separated by a line containing only `---`. The first
//!   non-blank line of each block is a `keywords:` header with a
//!   comma-separated list; the remaining lines are the body.
//! - YAML (`.yaml` / `.yml`): a list of `{keywords: [...], text: "..."}`.

use closurecast_core::{DocumentEntry, Error, Result};
use std::path::Path;
use tracing::info;

const BLOCK_SEPARATOR: &str = "---";
const KEYWORD_HEADERS: [&str; 2] = ["keywords:", "키워드:"];

/// Immutable, ordered set of knowledge snippets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    entries: Vec<DocumentEntry>,
}

impl Corpus {
    pub fn new(entries: Vec<DocumentEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[DocumentEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First `n` entries, or all of them when the corpus is smaller
    pub fn head(&self, n: usize) -> &[DocumentEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    /// Parse the text block format
    pub fn parse_text(content: &str) -> Result<Self> {
        let mut entries = Vec::new();
        let mut block: Vec<&str> = Vec::new();
        let mut block_no = 1;

        for line in content.lines().chain(std::iter::once(BLOCK_SEPARATOR)) {
            if line.trim() == BLOCK_SEPARATOR {
                if let Some(entry) = parse_block(&block, block_no)? {
                    entries.push(entry);
                }
                block.clear();
                block_no += 1;
            } else {
                block.push(line);
            }
        }

        Ok(Self::new(entries))
    }

    /// Parse the YAML list format
    pub fn parse_yaml(content: &str) -> Result<Self> {
        let raw: Vec<DocumentEntry> = serde_yaml::from_str(content)
            .map_err(|e| Error::config(format!("Invalid corpus YAML: {}", e)))?;

        let entries = raw
            .into_iter()
            .map(|entry| DocumentEntry::new(entry.text.trim(), entry.keywords))
            .collect();

        Ok(Self::new(entries))
    }

    /// Load a corpus file, choosing the format by extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read corpus {}: {}", path.display(), e))
        })?;

        let corpus = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::parse_yaml(&content)?,
            _ => Self::parse_text(&content)?,
        };

        info!(
            path = %path.display(),
            entries = corpus.len(),
            chars = corpus.entries.iter().map(|e| e.text.chars().count()).sum::<usize>(),
            "Corpus loaded"
        );

        Ok(corpus)
    }
}

impl From<Vec<DocumentEntry>> for Corpus {
    fn from(entries: Vec<DocumentEntry>) -> Self {
        Self::new(entries)
    }
}

fn parse_block(lines: &[&str], block_no: usize) -> Result<Option<DocumentEntry>> {
    let mut lines = lines.iter().skip_while(|l| l.trim().is_empty());

    let Some(header) = lines.next() else {
        return Ok(None);
    };

    let header = header.trim();
    let keywords = KEYWORD_HEADERS
        .iter()
        .find_map(|prefix| strip_prefix_ignore_case(header, prefix))
        .ok_or_else(|| {
            Error::config(format!(
                "corpus block {} must start with a 'keywords:' line, found '{}'",
                block_no, header
            ))
        })?;

    let body = lines.copied().collect::<Vec<_>>().join("\n");
    let body = body.trim();
    if body.is_empty() {
        return Err(Error::config(format!("corpus block {} has no body", block_no)));
    }

    Ok(Some(DocumentEntry::new(body, keywords.split(','))))
}

fn strip_prefix_ignore_case<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&line[prefix.len()..])
    } else {
        None
    }
}
