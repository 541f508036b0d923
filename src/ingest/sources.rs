// src/ingest/sources.rs
//! Built-in per-broadcaster table: listing URL, ordered selector strategies,
//! and the fixed placeholder used when the page yields nothing.
//!
//! Only the CBS selectors have a known fallback. The others are best guesses
//! at each site's markup; override them via `SOURCES_CONFIG_PATH` when a live
//! site disagrees.

use crate::ingest::types::{ProgramRecord, SourceId};

struct Row {
    url: &'static str,
    selectors: &'static [&'static str],
    placeholder_title: &'static str,
    placeholder_tags: &'static [&'static str],
}

const CBS: Row = Row {
    url: "https://www.cbs.co.kr/tv/program",
    selectors: &[
        "ul.pro_list li a strong.title",
        "div.program_list ul li a strong.pr_title",
    ],
    placeholder_title: "새롭게 하소서 (시뮬레이션)",
    placeholder_tags: &["#간증", "#삶의이야기", "#힐링토크"],
};

const CTS: Row = Row {
    url: "https://www.cts.tv/program/list",
    selectors: &["div.program-list-box li a strong"],
    placeholder_title: "내가 매일 기쁘게 (시뮬레이션)",
    placeholder_tags: &["#간증", "#삶의이야기", "#유명인"],
};

const CGNTV: Row = Row {
    url: "https://www.cgnf.net/program/program_list.asp",
    selectors: &["ul.program_list li a div.pro_title"],
    placeholder_title: "생명의 삶 (QT) (시뮬레이션)",
    placeholder_tags: &["#말씀묵상", "#매일", "#조용한"],
};

const GOODTV: Row = Row {
    url: "https://www.goodtv.co.kr/program-list/",
    selectors: &["div.program_txt_wrap strong.tit"],
    placeholder_title: "다니엘 기도회 (시뮬레이션)",
    placeholder_tags: &["#예배실황", "#뜨거운찬양", "#기도", "#연합"],
};

const CCHANNEL: Row = Row {
    url: "https://www.cchannel.com/program",
    selectors: &["div.program-list-box li .pro-title-box span.title"],
    placeholder_title: "성지가 좋다 (시뮬레이션)",
    placeholder_tags: &["#성경공부", "#시사교양", "#성지순례"],
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub source: SourceId,
    pub url: String,
    /// CSS selectors, tried in order; the first with any match wins.
    pub selectors: Vec<String>,
    placeholder_title: &'static str,
    placeholder_tags: &'static [&'static str],
}

impl SourceSpec {
    pub fn builtin(source: SourceId) -> Self {
        let row = match source {
            SourceId::Cbs => &CBS,
            SourceId::Cts => &CTS,
            SourceId::Cgntv => &CGNTV,
            SourceId::GoodTv => &GOODTV,
            SourceId::CChannel => &CCHANNEL,
        };
        Self {
            source,
            url: row.url.to_string(),
            selectors: row.selectors.iter().map(|s| s.to_string()).collect(),
            placeholder_title: row.placeholder_title,
            placeholder_tags: row.placeholder_tags,
        }
    }

    /// The fixed record substituted when fetching or extraction fails.
    /// Its tags are hand-picked, not inferred.
    pub fn placeholder(&self) -> ProgramRecord {
        ProgramRecord::new(
            self.source,
            self.placeholder_title,
            self.placeholder_tags.iter().copied(),
        )
    }
}

/// All five sources in refresh order.
pub fn builtin_sources() -> Vec<SourceSpec> {
    SourceId::ALL.into_iter().map(SourceSpec::builtin).collect()
}
