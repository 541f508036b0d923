// src/ingest/extract.rs
use scraper::{Html, Selector};
use std::collections::HashSet;

use crate::error::{ExtractionFailed, FetchError, HarvestError};
use crate::ingest::normalize_text;
use crate::ingest::sources::SourceSpec;
use crate::ingest::types::ProgramRecord;
use crate::tags::TagRules;

/// Records produced for one source in one refresh, plus why the placeholder
/// was used (if it was).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Harvest {
    pub records: Vec<ProgramRecord>,
    pub failure: Option<HarvestError>,
}

impl Harvest {
    pub fn is_placeholder(&self) -> bool {
        self.failure.is_some()
    }
}

/// Shared extraction logic; the `SourceSpec` is the only per-source input.
pub struct SourceExtractor<'a> {
    spec: &'a SourceSpec,
    rules: &'a TagRules,
}

impl<'a> SourceExtractor<'a> {
    pub fn new(spec: &'a SourceSpec, rules: &'a TagRules) -> Self {
        Self { spec, rules }
    }

    /// Normalized texts of the first selector strategy that matches anything.
    /// `None` when no strategy matched a single element.
    pub fn select_titles(&self, document: &Html) -> Option<Vec<String>> {
        for raw in &self.spec.selectors {
            let selector = match Selector::parse(raw) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(
                        source = %self.spec.source,
                        selector = %raw,
                        error = %e,
                        "invalid selector; skipping strategy"
                    );
                    continue;
                }
            };
            let texts: Vec<String> = document
                .select(&selector)
                .map(|el| normalize_text(&el.text().collect::<String>()))
                .collect();
            if !texts.is_empty() {
                tracing::debug!(
                    source = %self.spec.source,
                    selector = %raw,
                    matched = texts.len(),
                    "selector strategy matched"
                );
                return Some(texts);
            }
        }
        None
    }

    /// Unique, non-empty titles in first-seen order, each tagged.
    ///
    /// Elements that matched but carry no text do not count: a page that
    /// yields no usable title is treated as a failed extraction.
    pub fn extract(&self, document: &Html) -> Result<Vec<ProgramRecord>, ExtractionFailed> {
        let failed = || ExtractionFailed {
            source_id: self.spec.source,
        };
        let texts = self.select_titles(document).ok_or_else(failed)?;

        let mut seen: HashSet<String> = HashSet::new();
        let mut out = Vec::with_capacity(texts.len());
        for title in texts {
            if title.is_empty() || !seen.insert(title.clone()) {
                continue;
            }
            let tags = self.rules.infer(&title);
            out.push(ProgramRecord {
                source: self.spec.source,
                title,
                tags,
            });
        }

        if out.is_empty() {
            return Err(failed());
        }
        Ok(out)
    }

    pub fn extract_body(&self, body: &str) -> Result<Vec<ProgramRecord>, ExtractionFailed> {
        let document = Html::parse_document(body);
        self.extract(&document)
    }

    /// Never fails: any fetch or extraction error becomes the source's
    /// placeholder record.
    pub fn harvest(&self, fetched: Result<String, FetchError>) -> Harvest {
        let result = fetched
            .map_err(HarvestError::from)
            .and_then(|body| self.extract_body(&body).map_err(HarvestError::from));

        match result {
            Ok(records) => {
                tracing::info!(
                    source = %self.spec.source,
                    records = records.len(),
                    "source harvested"
                );
                Harvest {
                    records,
                    failure: None,
                }
            }
            Err(e) => {
                tracing::warn!(
                    source = %self.spec.source,
                    error = %e,
                    "source failed; substituting placeholder"
                );
                Harvest {
                    records: vec![self.spec.placeholder()],
                    failure: Some(e),
                }
            }
        }
    }
}
