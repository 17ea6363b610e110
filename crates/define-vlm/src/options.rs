//! Pipeline options, loadable from TOML.
//!
//! ```toml
//! stratification_variables = ["DTYPE", "PARCAT", "PARCAT1", "PARCAT2"]
//! missing_detail_limit = 5
//! synthesize_parameter_variables = true
//! ```
//!
//! Every key is optional; omitted keys keep their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VlmError};

const DEFAULT_STRATIFICATION: [&str; 4] = ["DTYPE", "PARCAT", "PARCAT1", "PARCAT2"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VlmOptions {
    /// Where-clause variables recorded as stratification rather than special variables.
    pub stratification_variables: Vec<String>,
    /// How many missing parameter codes a coverage warning lists.
    pub missing_detail_limit: usize,
    /// Add PARAM/PARAMCD variables from the parameter mapping when absent.
    pub synthesize_parameter_variables: bool,
}

impl Default for VlmOptions {
    fn default() -> Self {
        Self {
            stratification_variables: DEFAULT_STRATIFICATION
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
            missing_detail_limit: 5,
            synthesize_parameter_variables: true,
        }
    }
}

impl VlmOptions {
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|source| VlmError::Toml {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| VlmError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let options = Self::from_toml_str(&text, path)?;
        tracing::debug!(path = %path.display(), ?options, "Loaded VLM options");
        Ok(options)
    }

    pub fn is_stratification(&self, variable: &str) -> bool {
        self.stratification_variables.iter().any(|v| v == variable)
    }
}
