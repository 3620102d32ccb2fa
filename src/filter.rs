use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::extract_domain;
use crate::error::ConfigError;

/// `http://`, `https://` or `//` up to the first whitespace or quoting character.
static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?:https?://|//)[^\s"'<>]+"#).expect("URL pattern is valid"));

/// Which substrings of a fragment the filter regex is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Matches of the filter regex itself
    #[default]
    RawRegex,
    /// URLs found in the fragment that match the filter regex
    UrlExtract,
    /// Hosts of URLs found in the fragment that match the filter regex
    DomainExtract,
}

impl FromStr for MatchMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(MatchMode::RawRegex),
            "urls" => Ok(MatchMode::UrlExtract),
            "domains" => Ok(MatchMode::DomainExtract),
            other => Err(ConfigError::InvalidMode(other.to_string())),
        }
    }
}

/// A compiled filter regex paired with the extraction mode it runs in.
#[derive(Debug, Clone)]
pub struct FragmentFilter {
    pattern: Regex,
    mode: MatchMode,
}

impl FragmentFilter {
    pub fn new(pattern: &str, mode: MatchMode) -> Result<Self, ConfigError> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            mode,
        })
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Extract every matching string from one fragment, in order of appearance.
    /// Duplicates are kept.
    pub fn extract(&self, fragment: &str) -> Vec<String> {
        match self.mode {
            MatchMode::RawRegex => self
                .pattern
                .find_iter(fragment)
                .map(|m| m.as_str().to_string())
                .collect(),
            MatchMode::UrlExtract => URL_PATTERN
                .find_iter(fragment)
                .map(|m| m.as_str())
                .filter(|url| self.pattern.is_match(url))
                .map(str::to_string)
                .collect(),
            MatchMode::DomainExtract => URL_PATTERN
                .find_iter(fragment)
                .map(|m| extract_domain(m.as_str()))
                .filter(|domain| !domain.is_empty() && self.pattern.is_match(domain))
                .collect(),
        }
    }
}
