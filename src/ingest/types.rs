// src/ingest/types.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{FetchError, UnknownSource};

/// The five broadcasters the catalog is built from. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
pub enum SourceId {
    Cbs,
    Cts,
    Cgntv,
    GoodTv,
    CChannel,
}

impl SourceId {
    /// Fixed refresh order.
    pub const ALL: [SourceId; 5] = [
        SourceId::Cbs,
        SourceId::Cts,
        SourceId::Cgntv,
        SourceId::GoodTv,
        SourceId::CChannel,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            SourceId::Cbs => "CBS",
            SourceId::Cts => "CTS",
            SourceId::Cgntv => "CGNTV",
            SourceId::GoodTv => "GoodTV",
            SourceId::CChannel => "C Channel",
        }
    }

    /// Lowercase key used in config files and metric labels.
    pub fn key(self) -> &'static str {
        match self {
            SourceId::Cbs => "cbs",
            SourceId::Cts => "cts",
            SourceId::Cgntv => "cgntv",
            SourceId::GoodTv => "goodtv",
            SourceId::CChannel => "cchannel",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for SourceId {
    type Err = UnknownSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        SourceId::ALL
            .into_iter()
            .find(|id| id.key().eq_ignore_ascii_case(t) || id.display_name().eq_ignore_ascii_case(t))
            .ok_or_else(|| UnknownSource(t.to_string()))
    }
}

impl From<SourceId> for &'static str {
    fn from(id: SourceId) -> Self {
        id.display_name()
    }
}

impl TryFrom<String> for SourceId {
    type Error = UnknownSource;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// One harvested program. Identity within a refresh is `(source, title)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramRecord {
    pub source: SourceId,
    pub title: String,
    pub tags: BTreeSet<String>,
}

impl ProgramRecord {
    pub fn new<I, T>(source: SourceId, title: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            source,
            title: title.into(),
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// Per-source outcome of one refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceOutcome {
    pub source: SourceId,
    pub records: usize,
    pub placeholder: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    pub sources: Vec<SourceOutcome>,
    pub duration_ms: u64,
}

impl RefreshReport {
    pub fn placeholder_count(&self) -> usize {
        self.sources.iter().filter(|s| s.placeholder).count()
    }
}

/// "Fetch URL, return body or error". Implementations must not apply their
/// own retry; the next scheduled refresh is the retry.
#[async_trait::async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_id_parses_key_and_display_name() {
        assert_eq!("cchannel".parse::<SourceId>().unwrap(), SourceId::CChannel);
        assert_eq!("C Channel".parse::<SourceId>().unwrap(), SourceId::CChannel);
        assert_eq!(" GOODTV ".parse::<SourceId>().unwrap(), SourceId::GoodTv);
        assert!("kbs".parse::<SourceId>().is_err());
    }

    #[test]
    fn record_serializes_with_display_source() {
        let r = ProgramRecord::new(SourceId::GoodTv, "다니엘 기도회", ["#기도"]);
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["source"], "GoodTV");
        assert_eq!(v["title"], "다니엘 기도회");
        assert_eq!(v["tags"], serde_json::json!(["#기도"]));

        let back: ProgramRecord = serde_json::from_value(v).unwrap();
        assert_eq!(back, r);
    }
}
