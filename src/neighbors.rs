//! Interconnection configuration: the home control area and the neighbors
//! whose flows are fetched.
//!
//! Stored as a plain JSON object on disk when overriding the built-in table:
//! ```json
//! {
//!   "home_domain": "10Y1001C--00100H",
//!   "neighbors": [
//!     { "code": "10YAL-KESH-----5", "label": "Albania" },
//!     { "code": "10YXX-EXAMPLE--1", "label": "Example", "key": "ex" }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::slug::neighbor_key;

/// KOSTT, the Kosovo control area.
pub const DEFAULT_HOME_DOMAIN: &str = "10Y1001C--00100H";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Neighbor {
    pub code: String,
    pub label: String,
    /// Explicit dataset key; derived from the code or label when absent.
    #[serde(default)]
    pub key: Option<String>,
}

impl Neighbor {
    pub fn new(code: &str, label: &str) -> Self {
        Self {
            code: code.to_string(),
            label: label.to_string(),
            key: None,
        }
    }

    pub fn key(&self) -> String {
        match &self.key {
            Some(key) => crate::slug::slugify(key),
            None => neighbor_key(&self.code, &self.label),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawConfig {
    #[serde(default)]
    home_domain: Option<String>,
    neighbors: Vec<Neighbor>,
}

/// Validated, immutable neighbor table.
#[derive(Debug, Clone)]
pub struct NeighborConfig {
    home_domain: String,
    neighbors: Vec<Neighbor>,
}

impl NeighborConfig {
    /// Rejects an empty table and neighbors that would share a dataset key.
    pub fn new(home_domain: impl Into<String>, neighbors: Vec<Neighbor>) -> Result<Self> {
        let home_domain = home_domain.into();
        if home_domain.trim().is_empty() {
            bail!("home domain must not be empty");
        }
        if neighbors.is_empty() {
            bail!("at least one neighbor must be configured");
        }

        let mut seen = HashSet::new();
        for neighbor in &neighbors {
            let key = neighbor.key();
            if !seen.insert(key.clone()) {
                bail!(
                    "neighbor {} ({}) resolves to key `{key}` which is already in use",
                    neighbor.label,
                    neighbor.code
                );
            }
        }

        Ok(Self {
            home_domain,
            neighbors,
        })
    }

    /// Loads the table from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading neighbor config {}", path.display()))?;
        let raw: RawConfig = serde_json::from_str(&content)
            .with_context(|| format!("parsing neighbor config {}", path.display()))?;
        Self::new(
            raw.home_domain
                .unwrap_or_else(|| DEFAULT_HOME_DOMAIN.to_string()),
            raw.neighbors,
        )
    }

    pub fn home_domain(&self) -> &str {
        &self.home_domain
    }

    pub fn neighbors(&self) -> &[Neighbor] {
        &self.neighbors
    }

    /// Dataset key for a neighbor reference read back from disk. A configured
    /// neighbor's code, label or key (case-insensitive) resolves to that
    /// neighbor's key; anything else is slugified.
    pub fn resolve_key(&self, reference: &str) -> String {
        let reference = reference.trim();
        let lowered = reference.to_lowercase();
        self.neighbors
            .iter()
            .find(|n| {
                n.code.eq_ignore_ascii_case(reference)
                    || n.label.to_lowercase() == lowered
                    || n.key() == lowered
            })
            .map(Neighbor::key)
            .unwrap_or_else(|| neighbor_key(reference, reference))
    }

    /// Display label for a dataset key, if a configured neighbor owns it.
    pub fn label_for_key(&self, key: &str) -> Option<&str> {
        self.neighbors
            .iter()
            .find(|n| n.key() == key)
            .map(|n| n.label.as_str())
    }
}

impl Default for NeighborConfig {
    fn default() -> Self {
        Self {
            home_domain: DEFAULT_HOME_DOMAIN.to_string(),
            neighbors: vec![
                Neighbor::new("10YAL-KESH-----5", "Albania"),
                Neighbor::new("10YMK-MEPSO----8", "North Macedonia"),
                Neighbor::new("10YCS-CG-TSO---S", "Montenegro"),
                Neighbor::new("10YCS-SERBIATSOV", "Serbia"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_is_valid() {
        let config = NeighborConfig::default();
        let keys: Vec<String> = config.neighbors().iter().map(Neighbor::key).collect();
        assert_eq!(keys, vec!["al", "mk", "me", "rs"]);
        assert!(NeighborConfig::new(DEFAULT_HOME_DOMAIN, config.neighbors().to_vec()).is_ok());
    }

    #[test]
    fn test_rejects_colliding_keys() {
        let result = NeighborConfig::new(
            DEFAULT_HOME_DOMAIN,
            vec![
                Neighbor::new("10YXX-A--------1", "Foo Bar"),
                Neighbor::new("10YXX-B--------2", "foo-bar"),
            ],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_empty_table() {
        assert!(NeighborConfig::new(DEFAULT_HOME_DOMAIN, vec![]).is_err());
    }

    #[test]
    fn test_explicit_key_wins() {
        let mut neighbor = Neighbor::new("10YAL-KESH-----5", "Albania");
        neighbor.key = Some("Albania Grid".to_string());
        assert_eq!(neighbor.key(), "albania_grid");
    }

    #[test]
    fn test_resolve_key_prefers_configured_neighbor() {
        let config = NeighborConfig::new(
            DEFAULT_HOME_DOMAIN,
            vec![
                Neighbor::new("10YAL-KESH-----5", "Albania"),
                Neighbor {
                    code: "10YGR-HTSO-----Y".to_string(),
                    label: "Greece".to_string(),
                    key: Some("gr".to_string()),
                },
            ],
        )
        .unwrap();

        assert_eq!(config.resolve_key("Albania"), "al");
        assert_eq!(config.resolve_key("  ALBANIA "), "al");
        assert_eq!(config.resolve_key("10yal-kesh-----5"), "al");
        assert_eq!(config.resolve_key("Greece"), "gr");
        assert_eq!(config.resolve_key("gr"), "gr");
        assert_eq!(config.resolve_key("North Macedonia"), "north_macedonia");
        assert_eq!(config.resolve_key("10YCS-SERBIATSOV"), "rs");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("neighbors.json");
        std::fs::write(
            &path,
            r#"{"neighbors": [{"code": "10YGR-HTSO-----Y", "label": "Greece"}]}"#,
        )
        .unwrap();

        let config = NeighborConfig::load(&path).unwrap();
        assert_eq!(config.home_domain(), DEFAULT_HOME_DOMAIN);
        assert_eq!(config.neighbors().len(), 1);
        assert_eq!(config.label_for_key("greece"), Some("Greece"));
    }
}
