//! Attribute conventions and per-project context.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::error::ConfigError;

/// Names of the attributes that mark tests, in simple form (`Fact`, not
/// `FactAttribute`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conventions {
    pub fact_attributes: Vec<String>,
    pub theory_attributes: Vec<String>,
    pub trait_attributes: Vec<String>,
    pub runner_attributes: Vec<String>,
    pub skip_argument: String,
}

impl Default for Conventions {
    fn default() -> Self {
        Self {
            fact_attributes: vec!["Fact".to_string()],
            theory_attributes: vec!["Theory".to_string()],
            trait_attributes: vec!["Trait".to_string()],
            runner_attributes: vec!["RunWith".to_string()],
            skip_argument: "Skip".to_string(),
        }
    }
}

impl Conventions {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading conventions");

        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::read_error(path, e.to_string()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let conventions: Conventions = match extension {
            "json" => serde_json::from_str(&content)
                .map_err(|e| ConfigError::parse_error(path, e.to_string()))?,
            "yaml" | "yml" => serde_yaml::from_str(&content)
                .map_err(|e| ConfigError::parse_error(path, e.to_string()))?,
            _ => return Err(ConfigError::unsupported_format(extension)),
        };

        conventions.validate()?;
        trace!(?conventions, "conventions loaded");
        Ok(conventions)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fact_attributes.is_empty() && self.theory_attributes.is_empty() {
            return Err(ConfigError::missing_attribute("fact or theory"));
        }
        Ok(())
    }

    pub fn test_attributes(&self) -> impl Iterator<Item = &str> {
        self.fact_attributes
            .iter()
            .chain(&self.theory_attributes)
            .map(String::as_str)
    }
}

/// The project a scan session belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectContext {
    pub name: String,
    pub root: PathBuf,
    pub assembly_location: PathBuf,
}

impl ProjectContext {
    /// Without an explicit assembly the output is assumed at `<dir>/bin/<name>.dll`,
    /// where `dir` is the root or, for a single-file root, its parent.
    pub fn for_root(root: impl Into<PathBuf>, assembly: Option<PathBuf>) -> Self {
        let root = root.into();
        let dir = if root.is_file() {
            root.parent().unwrap_or(Path::new("")).to_path_buf()
        } else {
            root.clone()
        };
        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .unwrap_or("Tests")
            .to_string();
        let assembly_location =
            assembly.unwrap_or_else(|| dir.join("bin").join(format!("{name}.dll")));

        Self {
            name,
            root,
            assembly_location,
        }
    }
}
