// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

/// Environment variable naming an optional YAML settings file.
pub const CONFIG_ENV: &str = "EDLISTS_CONFIG";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
pub const DEFAULT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Combined row floor across all three lists in the brick.
pub const TOTAL_MIN_ROWS: usize = 150;

/// The three published EDLists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdList {
    /// Substances identified as endocrine disruptors at EU level.
    I,
    /// Substances under EU investigation.
    II,
    /// Substances identified by participating national authorities.
    III,
}

impl EdList {
    pub const ALL: [EdList; 3] = [EdList::I, EdList::II, EdList::III];

    pub fn name(self) -> &'static str {
        match self {
            EdList::I => "list_i_eu_identified",
            EdList::II => "list_ii_under_evaluation",
            EdList::III => "list_iii_national_authority",
        }
    }

    /// February 2024 Wayback Machine snapshot; edlists.org itself sits behind
    /// bot protection.
    pub fn archive_url(self) -> &'static str {
        match self {
            EdList::I => "https://web.archive.org/web/20240203050304/https://edlists.org/the-ed-lists/list-i-substances-identified-as-endocrine-disruptors-by-the-eu",
            EdList::II => "https://web.archive.org/web/20240203050308/https://edlists.org/the-ed-lists/list-ii-substances-under-eu-investigation-endocrine-disruption",
            EdList::III => "https://web.archive.org/web/20240203050312/https://edlists.org/the-ed-lists/list-iii-substances-identified-as-endocrine-disruptors-by-participating-national-authorities",
        }
    }

    pub fn live_url(self) -> &'static str {
        match self {
            EdList::I => "https://edlists.org/the-ed-lists/list-i-substances-identified-as-endocrine-disruptors-by-the-eu",
            EdList::II => "https://edlists.org/the-ed-lists/list-ii-substances-under-eu-investigation-endocrine-disruption",
            EdList::III => "https://edlists.org/the-ed-lists/list-iii-substances-identified-as-endocrine-disruptors-by-participating-national-authorities",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            EdList::I => "Substances identified as endocrine disruptors at EU level",
            EdList::II => "Substances under EU investigation for endocrine disruption",
            EdList::III => "Substances identified by national authorities as having ED properties",
        }
    }

    /// Minimum row count expected in the brick (~109 / ~71 / ~3 published).
    pub fn min_rows(self) -> usize {
        match self {
            EdList::I => 100,
            EdList::II => 50,
            EdList::III => 1,
        }
    }

    pub fn parquet_file_name(self) -> String {
        format!("{}.parquet", self.name())
    }

    pub fn archive_source(self) -> SourceDescriptor {
        SourceDescriptor {
            name: self.name().to_string(),
            url: self.archive_url().to_string(),
            description: self.description().to_string(),
        }
    }

    pub fn live_source(self) -> SourceDescriptor {
        SourceDescriptor {
            name: self.name().to_string(),
            url: self.live_url().to_string(),
            description: self.description().to_string(),
        }
    }
}

/// One named list to download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub name: String,
    pub url: String,
    pub description: String,
}

/// Runtime settings. Every field has a built-in default; a YAML file named by
/// `EDLISTS_CONFIG` may override any of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub accept: String,
    pub sources: Vec<SourceDescriptor>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
            sources: EdList::ALL.iter().map(|l| l.archive_source()).collect(),
        }
    }
}

impl Settings {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("parsing settings YAML")
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Defaults, or the file named by `EDLISTS_CONFIG` when set.
    pub fn load() -> Result<Self> {
        match env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_yaml_file(path.trim()),
            _ => Ok(Self::default()),
        }
    }

    /// Same settings, but pointed at the live site instead of the archive.
    pub fn with_live_sources(mut self) -> Self {
        self.sources = EdList::ALL.iter().map(|l| l.live_source()).collect();
        self
    }
}
