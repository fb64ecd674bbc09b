use super::{DetectorError, PatternMatch, PatternMatcher};
use crate::config::ConfigError;
use crate::text::CharIndex;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One named pattern definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternDef {
    pub expression: String,
    /// Category reported for matches; defaults to the pattern name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl PatternDef {
    pub fn new(expression: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            label: Some(label.into()),
        }
    }
}

/// A named set of patterns, keyed by pattern name.
///
/// Sets are plain configuration values; several can coexist, e.g. one per
/// domain vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternSet(BTreeMap<String, PatternDef>);

impl PatternSet {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with_pattern(mut self, name: impl Into<String>, def: PatternDef) -> Self {
        self.0.insert(name.into(), def);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, def: PatternDef) -> Option<PatternDef> {
        self.0.insert(name.into(), def)
    }

    pub fn get(&self, name: &str) -> Option<&PatternDef> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Compile every expression, case-insensitively.
    pub fn compile(&self) -> Result<RegexPatternMatcher, ConfigError> {
        let patterns = self
            .0
            .iter()
            .map(|(name, def)| -> Result<CompiledPattern, ConfigError> {
                let regex = RegexBuilder::new(&def.expression)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| ConfigError::InvalidPattern {
                        name: name.clone(),
                        source,
                    })?;
                Ok(CompiledPattern {
                    name: name.clone(),
                    label: def.label.clone().unwrap_or_else(|| name.clone()),
                    regex,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RegexPatternMatcher { patterns })
    }
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::empty()
            .with_pattern(
                "ssn",
                PatternDef::new(r"\b\d{3}-\d{2}-\d{4}\b", "Social Security Number"),
            )
            .with_pattern(
                "credit_card",
                PatternDef::new(r"\b\d{4}[\s-]?\d{4}[\s-]?\d{4}[\s-]?\d{4}\b", "Credit Card"),
            )
            .with_pattern(
                "phone",
                PatternDef::new(
                    r"\b(?:\+?1[-.]?)?\(?[0-9]{3}\)?[-.]?[0-9]{3}[-.]?[0-9]{4}\b",
                    "Phone Number",
                ),
            )
            .with_pattern(
                "email",
                PatternDef::new(
                    r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b",
                    "Email Address",
                ),
            )
            .with_pattern(
                "ip_address",
                PatternDef::new(r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b", "IP Address"),
            )
    }
}

#[derive(Debug, Clone)]
struct CompiledPattern {
    name: String,
    label: String,
    regex: Regex,
}

/// Pattern matcher backed by a compiled [`PatternSet`].
#[derive(Debug, Clone)]
pub struct RegexPatternMatcher {
    patterns: Vec<CompiledPattern>,
}

impl RegexPatternMatcher {
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}

impl PatternMatcher for RegexPatternMatcher {
    fn name(&self) -> &str {
        "regex"
    }

    fn match_patterns(&self, text: &str) -> Result<Vec<PatternMatch>, DetectorError> {
        let index = CharIndex::new(text);
        let mut matches = Vec::new();

        for pattern in &self.patterns {
            for m in pattern.regex.find_iter(text) {
                // Regex matches always fall on char boundaries
                let (Some(start), Some(end)) = (index.to_char(m.start()), index.to_char(m.end()))
                else {
                    continue;
                };
                matches.push(PatternMatch {
                    text: m.as_str().to_string(),
                    pattern_name: pattern.name.clone(),
                    label: pattern.label.clone(),
                    start: start as i64,
                    end: end as i64,
                });
            }
        }

        Ok(matches)
    }
}
