//! # Recommendation Engine
//! Pure ranking of catalog records by tag overlap with a query. No I/O.
//!
//! Score = number of distinct query tags the record carries. Zero-score
//! records are dropped; the rest are ordered by descending score, and equal
//! scores keep their catalog order.

use std::collections::HashSet;

use crate::ingest::types::ProgramRecord;

/// Distinct query tags present on `record`.
pub fn score(query: &HashSet<&str>, record: &ProgramRecord) -> usize {
    query.iter().filter(|t| record.tags.contains(**t)).count()
}

pub fn recommend<'a, S: AsRef<str>>(
    query: &[S],
    catalog: &'a [ProgramRecord],
) -> Vec<&'a ProgramRecord> {
    let wanted: HashSet<&str> = query.iter().map(AsRef::as_ref).collect();
    if wanted.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(usize, &ProgramRecord)> = catalog
        .iter()
        .filter_map(|rec| match score(&wanted, rec) {
            0 => None,
            s => Some((s, rec)),
        })
        .collect();

    // `sort_by` is stable: ties keep catalog order.
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, rec)| rec).collect()
}
