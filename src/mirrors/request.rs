use serde::Deserialize;
use std::fmt;
use std::ops::RangeInclusive;
use thiserror::Error;

pub const MAX_MIRRORS_RANGE: RangeInclusive<u32> = 1..=20;
pub const TIMEOUT_RANGE: RangeInclusive<u32> = 5..=60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Https,
    Http,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Https => "https",
            Protocol::Http => "http",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordering applied by the refresh tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Rate,
    Age,
    Score,
    Delay,
    Country,
}

impl SortKey {
    pub const ALL: [SortKey; 5] = [
        SortKey::Rate,
        SortKey::Age,
        SortKey::Score,
        SortKey::Delay,
        SortKey::Country,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Rate => "rate",
            SortKey::Age => "age",
            SortKey::Score => "score",
            SortKey::Delay => "delay",
            SortKey::Country => "country",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|k| *k == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|k| *k == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunRejected {
    #[error("a mirror refresh is already running")]
    AlreadyRunning,

    #[error("no countries selected")]
    NoCountries,

    #[error("max mirrors must be between 1 and 20, got {0}")]
    MaxMirrorsOutOfRange(u32),

    #[error("download timeout must be between 5 and 60 seconds, got {0}")]
    TimeoutOutOfRange(u32),
}

/// One mirror refresh run.
///
/// Countries and protocols are de-duplicated keeping first-seen order so the
/// emitted command is reproducible. An empty protocol set means https.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    countries: Vec<String>,
    protocols: Vec<Protocol>,
    max_mirrors: u32,
    timeout_secs: u32,
    sort: SortKey,
}

impl UpdateRequest {
    pub fn new<I, S>(countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for country in countries {
            let country = country.into();
            let country = country.trim();
            if !country.is_empty() && !unique.iter().any(|c| c == country) {
                unique.push(country.to_string());
            }
        }

        Self {
            countries: unique,
            protocols: vec![Protocol::Https],
            max_mirrors: 5,
            timeout_secs: 10,
            sort: SortKey::Rate,
        }
    }

    pub fn with_protocols<I>(mut self, protocols: I) -> Self
    where
        I: IntoIterator<Item = Protocol>,
    {
        let mut unique = Vec::new();
        for protocol in protocols {
            if !unique.contains(&protocol) {
                unique.push(protocol);
            }
        }
        if unique.is_empty() {
            unique.push(Protocol::Https);
        }
        self.protocols = unique;
        self
    }

    pub fn with_max_mirrors(mut self, max_mirrors: u32) -> Self {
        self.max_mirrors = max_mirrors;
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u32) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    pub fn protocols(&self) -> &[Protocol] {
        &self.protocols
    }

    pub fn max_mirrors(&self) -> u32 {
        self.max_mirrors
    }

    pub fn timeout_secs(&self) -> u32 {
        self.timeout_secs
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    pub fn validate(&self) -> Result<(), RunRejected> {
        if self.countries.is_empty() {
            return Err(RunRejected::NoCountries);
        }
        if !MAX_MIRRORS_RANGE.contains(&self.max_mirrors) {
            return Err(RunRejected::MaxMirrorsOutOfRange(self.max_mirrors));
        }
        if !TIMEOUT_RANGE.contains(&self.timeout_secs) {
            return Err(RunRejected::TimeoutOutOfRange(self.timeout_secs));
        }
        Ok(())
    }

    /// Arguments for the refresh tool, writing the result to `mirrorlist_path`.
    pub fn to_args(&self, mirrorlist_path: &str) -> Vec<String> {
        let protocols: Vec<&str> = self.protocols.iter().map(Protocol::as_str).collect();

        vec![
            "--country".to_string(),
            self.countries.join(","),
            "--protocol".to_string(),
            protocols.join(","),
            "--latest".to_string(),
            self.max_mirrors.to_string(),
            "--sort".to_string(),
            self.sort.to_string(),
            "--download-timeout".to_string(),
            self.timeout_secs.to_string(),
            "--save".to_string(),
            mirrorlist_path.to_string(),
            "--verbose".to_string(),
        ]
    }
}
