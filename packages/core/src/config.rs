//! Configuration for the tree services

use crate::validation::compile_separator;
use serde::{Deserialize, Serialize};

/// Hard ceiling for `max_depth`; parent walks and cascades never go deeper
const MAX_SUPPORTED_DEPTH: usize = 1024;

fn default_category_separator() -> String {
    ">".to_string()
}

fn default_location_separator() -> String {
    crate::models::DEFAULT_LOCATION_SEPARATOR.to_string()
}

fn default_max_depth() -> usize {
    64
}

/// Separators and limits shared by the category and location services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Separator used in category paths
    #[serde(default = "default_category_separator")]
    pub category_separator: String,

    /// Separator given to new location defaults when none is supplied
    #[serde(default = "default_location_separator")]
    pub location_separator: String,

    /// Deepest tree the engine will walk before reporting a corrupt hierarchy
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            category_separator: default_category_separator(),
            location_separator: default_location_separator(),
            max_depth: default_max_depth(),
        }
    }
}

impl TreeConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        compile_separator(&self.category_separator)
            .map_err(|e| format!("category_separator: {}", e))?;
        compile_separator(&self.location_separator)
            .map_err(|e| format!("location_separator: {}", e))?;

        if self.max_depth == 0 {
            return Err("max_depth must be greater than 0".to_string());
        }

        if self.max_depth > MAX_SUPPORTED_DEPTH {
            return Err(format!(
                "max_depth cannot exceed {}",
                MAX_SUPPORTED_DEPTH
            ));
        }

        Ok(())
    }
}
