use crate::error::InvalidArgument;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// How a name is tested against the pattern text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Prefix,
    Suffix,
    Contain,
    Regex,
}

impl FromStr for MatchKind {
    type Err = InvalidArgument;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prefix" => Ok(Self::Prefix),
            "suffix" => Ok(Self::Suffix),
            "contain" => Ok(Self::Contain),
            "regex" => Ok(Self::Regex),
            other => Err(InvalidArgument::MatchType(other.to_string())),
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Prefix => "prefix",
            Self::Suffix => "suffix",
            Self::Contain => "contain",
            Self::Regex => "regex",
        };
        f.write_str(name)
    }
}

/// A parsed `type:pattern` match expression
#[derive(Debug, Clone)]
pub struct MatchPattern {
    pub kind: MatchKind,
    pub text: String,
    regex: Option<Regex>,
}

impl MatchPattern {
    /// Parse `type:pattern`, splitting at the first colon
    pub fn parse(spec: &str) -> Result<Self, InvalidArgument> {
        let (kind, text) = spec
            .split_once(':')
            .ok_or_else(|| InvalidArgument::MatchFormat(spec.to_string()))?;
        let kind: MatchKind = kind.parse()?;

        // Regex matches are anchored at the start of the name only
        let regex = if kind == MatchKind::Regex {
            let anchored = format!("^(?:{text})");
            Some(Regex::new(&anchored).map_err(|e| InvalidArgument::Regex {
                pattern: text.to_string(),
                message: e.to_string(),
            })?)
        } else {
            None
        };

        Ok(Self {
            kind,
            text: text.to_string(),
            regex,
        })
    }

    pub fn is_match(&self, name: &str) -> bool {
        match self.kind {
            MatchKind::Prefix => name.starts_with(&self.text),
            MatchKind::Suffix => name.ends_with(&self.text),
            MatchKind::Contain => name.contains(&self.text),
            MatchKind::Regex => self.regex.as_ref().is_some_and(|re| re.is_match(name)),
        }
    }
}

impl fmt::Display for MatchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.text)
    }
}

/// Exclusions are plain substring tests
pub fn is_excluded(name: &str, excludes: &[String]) -> bool {
    excludes
        .iter()
        .any(|ex| !ex.is_empty() && name.contains(ex.as_str()))
}
