use crate::error::{FacetError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_NEW_PRODUCT_DAYS: u32 = 20;
pub const DEFAULT_BEST_SALES_MIN_SOLD: i64 = 5;

fn default_new_product_days() -> u32 {
    DEFAULT_NEW_PRODUCT_DAYS
}

fn default_best_sales_min_sold() -> i64 {
    DEFAULT_BEST_SALES_MIN_SOLD
}

fn default_search_fields() -> Vec<String> {
    ["name^3", "description_short", "description", "reference"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Compiler settings. Every field has a default, so `{}` is a valid file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompilerConfig {
    /// How many days a product counts as new. 0 falls back to the default.
    #[serde(default = "default_new_product_days")]
    pub new_product_days: u32,
    /// Best sellers are products sold strictly more often than this.
    #[serde(default = "default_best_sales_min_sold")]
    pub best_sales_min_sold: i64,
    /// Logical filter name -> index field name overrides.
    #[serde(default)]
    pub field_names: IndexMap<String, String>,
    #[serde(default = "default_search_fields")]
    pub search_fields: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            new_product_days: DEFAULT_NEW_PRODUCT_DAYS,
            best_sales_min_sold: DEFAULT_BEST_SALES_MIN_SOLD,
            field_names: IndexMap::new(),
            search_fields: default_search_fields(),
        }
    }
}

impl CompilerConfig {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("[CONFIG] {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|e| {
            FacetError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
            .map_err(|e| FacetError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: CompilerConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some((name, _)) = self.field_names.iter().find(|(_, f)| f.trim().is_empty()) {
            return Err(FacetError::Config(format!(
                "empty index field name for filter '{}'",
                name
            )));
        }
        if self.search_fields.is_empty() {
            return Err(FacetError::Config("searchFields must not be empty".into()));
        }
        Ok(())
    }

    pub fn effective_new_product_days(&self) -> u32 {
        if self.new_product_days == 0 {
            DEFAULT_NEW_PRODUCT_DAYS
        } else {
            self.new_product_days
        }
    }
}
