//! Lexical keyword/substring overlap retriever

use crate::corpus::Corpus;
use crate::retriever::{Retriever, DEFAULT_TOP_K};
use aho_corasick::AhoCorasick;
use async_trait::async_trait;
use closurecast_core::{Error, Result, ScoredDocument};
use std::sync::Arc;
use tracing::debug;

/// Points for each entry keyword found in the query
pub const KEYWORD_WEIGHT: u32 = 2;

/// Points for each query token found in the entry text
pub const TOKEN_WEIGHT: u32 = 1;

struct IndexedEntry {
    text_lower: String,
    keywords: Option<AhoCorasick>,
    keyword_count: usize,
}

/// Deterministic lexical scorer over a fixed corpus.
///
/// An entry scores [`KEYWORD_WEIGHT`] for every one of its keywords that
/// occurs (case-insensitively) anywhere in the query, plus [`TOKEN_WEIGHT`]
/// for every whitespace-delimited query token longer than one character
/// that occurs in the entry text.
pub struct LexicalIndex {
    corpus: Arc<Corpus>,
    entries: Vec<IndexedEntry>,
    top_k: usize,
}

impl LexicalIndex {
    /// Index a corpus
    pub fn new(corpus: Arc<Corpus>) -> Result<Self> {
        let mut entries = Vec::with_capacity(corpus.len());

        for entry in corpus.entries() {
            let patterns: Vec<String> = entry.keywords.iter().map(|k| k.to_lowercase()).collect();

            let keywords = if patterns.is_empty() {
                None
            } else {
                Some(AhoCorasick::new(&patterns).map_err(|e| {
                    Error::config(format!("Failed to build keyword matcher: {}", e))
                })?)
            };

            entries.push(IndexedEntry {
                text_lower: entry.text.to_lowercase(),
                keywords,
                keyword_count: patterns.len(),
            });
        }

        Ok(Self {
            corpus,
            entries,
            top_k: DEFAULT_TOP_K,
        })
    }

    /// Override how many documents `rank` returns
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Score of every corpus entry against `query`, in corpus order
    pub fn scores(&self, query: &str) -> Vec<u32> {
        let query_lower = query.to_lowercase();
        let tokens: Vec<&str> = query_lower
            .split_whitespace()
            .filter(|t| t.chars().count() > 1)
            .collect();

        self.entries
            .iter()
            .map(|entry| Self::score_entry(entry, &query_lower, &tokens))
            .collect()
    }

    fn score_entry(entry: &IndexedEntry, query_lower: &str, tokens: &[&str]) -> u32 {
        let mut score = 0;

        if let Some(matcher) = &entry.keywords {
            let mut matched = vec![false; entry.keyword_count];
            for m in matcher.find_overlapping_iter(query_lower) {
                matched[m.pattern().as_usize()] = true;
            }
            score += KEYWORD_WEIGHT * matched.iter().filter(|hit| **hit).count() as u32;
        }

        score += TOKEN_WEIGHT
            * tokens
                .iter()
                .filter(|token| entry.text_lower.contains(**token))
                .count() as u32;

        score
    }

    /// Top-k entries with a positive score, highest first; ties keep corpus order
    pub fn search(&self, query: &str) -> Vec<ScoredDocument> {
        let mut ranked: Vec<(usize, u32)> = self
            .scores(query)
            .into_iter()
            .enumerate()
            .filter(|(_, score)| *score > 0)
            .collect();

        // stable sort keeps corpus order among equal scores
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(self.top_k);

        debug!(query, matches = ranked.len(), "Lexical search complete");

        ranked
            .into_iter()
            .map(|(idx, score)| ScoredDocument::new(self.corpus.entries()[idx].clone(), score))
            .collect()
    }
}

#[async_trait]
impl Retriever for LexicalIndex {
    async fn rank(&self, query: &str) -> Result<Vec<ScoredDocument>> {
        Ok(self.search(query))
    }

    fn name(&self) -> &str {
        "lexical"
    }
}
