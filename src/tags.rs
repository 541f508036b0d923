//! Keyword tag inference for program titles.
//!
//! A rule is `(triggers, tags)`: if ANY trigger is a substring of the
//! lowercased title, ALL of the rule's tags are added. Rules are evaluated in
//! order, independently, and never exclude each other. A title that matches
//! nothing gets [`FALLBACK_TAG`].
//!
//! Rule file format (JSON or TOML, set via `TAG_RULES_PATH`):
//!
//! ```toml
//! [[rules]]
//! name = "prayer"
//! triggers = ["기도", "calling"]
//! tags = ["#기도"]
//! ```

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::config::read_structured;
use crate::error::ConfigError;

pub const TAG_MARKER: char = '#';
pub const FALLBACK_TAG: &str = "#기타";

const ENV_PATH: &str = "TAG_RULES_PATH";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TagRule {
    #[serde(default)]
    pub name: Option<String>,
    pub triggers: Vec<String>,
    pub tags: Vec<String>,
}

impl TagRule {
    fn new(name: &str, triggers: &[&str], tags: &[&str]) -> Self {
        Self {
            name: Some(name.to_string()),
            triggers: triggers.iter().map(|s| s.to_string()).collect(),
            tags: tags.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// `lowered` must already be case-folded.
    fn matches(&self, lowered: &str) -> bool {
        self.triggers.iter().any(|t| lowered.contains(t.as_str()))
    }

    fn label(&self, idx: usize) -> String {
        self.name.clone().unwrap_or_else(|| format!("rule #{idx}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRules {
    rules: Vec<TagRule>,
}

#[derive(Deserialize)]
struct RuleFile {
    rules: Vec<TagRule>,
}

impl Default for TagRules {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TagRules {
    pub fn builtin() -> Self {
        Self {
            rules: vec![
                TagRule::new(
                    "bible",
                    &["성서", "바이블", "말씀", "큐티", "qt", "성경"],
                    &["#성경공부", "#말씀묵상"],
                ),
                TagRule::new(
                    "testimony",
                    &["새롭게 하소서", "간증", "힐링", "이야기"],
                    &["#간증", "#힐링토크", "#삶의이야기"],
                ),
                TagRule::new(
                    "worship",
                    &["찬양", "예배", "워십", "worship"],
                    &["#찬양", "#예배실황"],
                ),
                TagRule::new("prayer", &["기도", "calling"], &["#기도"]),
                TagRule::new(
                    "current_affairs",
                    &["시사", "뉴스", "특강", "세바시"],
                    &["#시사교양", "#강연"],
                ),
                TagRule::new(
                    "next_generation",
                    &["어린이", "키즈", "kids", "세대"],
                    &["#다음세대", "#어린이"],
                ),
            ],
        }
    }

    /// Validate and case-fold a custom rule list.
    pub fn from_rules(rules: Vec<TagRule>) -> Result<Self, ConfigError> {
        let mut out = Vec::with_capacity(rules.len());
        for (idx, mut rule) in rules.into_iter().enumerate() {
            rule.triggers = rule
                .triggers
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect();
            if rule.triggers.is_empty() {
                return Err(ConfigError::EmptyTriggers {
                    rule: rule.label(idx),
                });
            }
            if let Some(bad) = rule.tags.iter().find(|t| !t.starts_with(TAG_MARKER)) {
                return Err(ConfigError::UnmarkedTag {
                    rule: rule.label(idx),
                    tag: bad.clone(),
                });
            }
            out.push(rule);
        }
        Ok(Self { rules: out })
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let file: RuleFile = read_structured(path)?;
        Self::from_rules(file.rules)
    }

    /// `$TAG_RULES_PATH` if set, otherwise the built-in table.
    pub fn load_default() -> Result<Self, ConfigError> {
        match std::env::var(ENV_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(p);
                if !pb.exists() {
                    return Err(ConfigError::MissingPath {
                        env: ENV_PATH,
                        path: pb,
                    });
                }
                Self::load_from(&pb)
            }
            Err(_) => Ok(Self::builtin()),
        }
    }

    pub fn rules(&self) -> &[TagRule] {
        &self.rules
    }

    /// Total: the result is never empty.
    pub fn infer(&self, title: &str) -> BTreeSet<String> {
        let lowered = title.to_lowercase();
        let mut tags = BTreeSet::new();
        for rule in &self.rules {
            if rule.matches(&lowered) {
                tags.extend(rule.tags.iter().cloned());
            }
        }
        if tags.is_empty() {
            tags.insert(FALLBACK_TAG.to_string());
        }
        tags
    }
}

static BUILTIN: Lazy<TagRules> = Lazy::new(TagRules::builtin);

/// Infer tags with the built-in rule table.
pub fn infer_tags(title: &str) -> BTreeSet<String> {
    BUILTIN.infer(title)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn prayer_title_gets_only_prayer_tag() {
        assert_eq!(infer_tags("다니엘 기도회 특별새벽기도"), set(&["#기도"]));
    }

    #[test]
    fn empty_and_unmatched_titles_get_fallback() {
        assert_eq!(infer_tags(""), set(&[FALLBACK_TAG]));
        assert_eq!(infer_tags("성지가 좋다"), set(&[FALLBACK_TAG]));
    }

    #[test]
    fn rules_accumulate_across_matches() {
        let tags = infer_tags("어린이 찬양 예배");
        assert_eq!(
            tags,
            set(&["#찬양", "#예배실황", "#다음세대", "#어린이"])
        );
    }

    #[test]
    fn matching_is_case_folded_substring() {
        // "qt" inside a longer token, upper-cased in the title
        assert!(infer_tags("생명의 삶 QT").contains("#말씀묵상"));
        assert!(infer_tags("WorshipNight").contains("#찬양"));
        assert!(infer_tags("The Calling").contains("#기도"));
    }

    #[test]
    fn every_builtin_rule_is_monotonic() {
        let rules = TagRules::builtin();
        for rule in rules.rules() {
            for trig in &rule.triggers {
                let title = format!("아무 제목 {trig} 그리고 찬양 어린이 뉴스");
                let got = rules.infer(&title);
                for tag in &rule.tags {
                    assert!(got.contains(tag), "{title:?} missing {tag}");
                }
                assert!(!got.contains(FALLBACK_TAG));
            }
        }
    }

    #[test]
    fn custom_rules_are_validated_and_folded() {
        let rules = TagRules::from_rules(vec![TagRule {
            name: None,
            triggers: vec!["  Mission ".into(), "".into()],
            tags: vec!["#선교".into()],
        }])
        .unwrap();
        assert_eq!(rules.rules()[0].triggers, vec!["mission".to_string()]);
        assert_eq!(rules.infer("MISSION 2025"), set(&["#선교"]));

        let err = TagRules::from_rules(vec![TagRule {
            name: Some("bad".into()),
            triggers: vec!["x".into()],
            tags: vec!["선교".into()],
        }])
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnmarkedTag { .. }));

        let err = TagRules::from_rules(vec![TagRule {
            name: None,
            triggers: vec!["   ".into()],
            tags: vec!["#a".into()],
        }])
        .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyTriggers { ref rule } if rule == "rule #0"));
    }
}
