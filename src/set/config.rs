//! PrefixSet configuration files.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::PrefixSet;
use crate::error::{Error, Result};

/// On-disk description of a [`PrefixSet`].
///
/// ```yaml
/// name: trusted
/// entries:
///   - 10.0.0.0/8
///   - "!10.0.1.0/24"
///   - 192.168.0.0/16, 2001:db8::/32
/// ```
///
/// Each entry may itself be a list separated by commas, spaces or tabs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixSetConfig {
    /// Name used in log messages
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub entries: Vec<String>,
}

impl PrefixSetConfig {
    /// Create a configuration from a name and entries.
    pub fn new<I, S>(name: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a configuration file.
    ///
    /// Files ending in `.json` are read as JSON, everything else as YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Self::from_json_str(&content),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            other => {
                log::warn!(
                    "Unknown config extension {:?} for {:?}, reading as YAML",
                    other,
                    path
                );
                Self::from_yaml_str(&content)
            }
        }
    }

    /// Save the configuration, as JSON for `.json` paths and YAML otherwise.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));

        let content = if is_json {
            serde_json::to_string_pretty(self)?
        } else {
            serde_yaml::to_string(self)?
        };
        fs::write(path, content)?;
        Ok(())
    }

    /// Build the set. Any malformed entry fails the whole build.
    pub fn build(&self) -> Result<PrefixSet> {
        let mut set = PrefixSet::new();
        for entry in &self.entries {
            set.add_list(entry)
                .map_err(|e| Error::Config(format!("{}: entry '{}': {}", self.display_name(), entry, e)))?;
        }
        log::debug!("Built prefix set {} with {} entries", self.display_name(), set.len());
        Ok(set)
    }

    fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "<unnamed>"
        } else {
            &self.name
        }
    }
}

impl From<&PrefixSet> for PrefixSetConfig {
    fn from(set: &PrefixSet) -> Self {
        Self {
            name: String::new(),
            entries: set.to_string_vec(),
        }
    }
}
