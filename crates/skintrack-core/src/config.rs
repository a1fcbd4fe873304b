//! Core configuration.

use serde::{Deserialize, Serialize};

use crate::models::AssetKind;

/// Application-level constants
pub const APP_NAME: &str = "SkinTrack";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default `tracing` filter when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "skintrack_core=info";

/// Settings supplied by the host app. Every field has a default, so a
/// partial JSON object (or `{}`) is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoreConfig {
    /// SQLite file for local state; `None` keeps everything in memory
    pub database_path: Option<String>,
    /// Remote path listing the patient records
    pub records_path: String,
    /// Region used as the directory thumbnail
    pub thumbnail_asset: AssetKind,
    /// Regions shown in a patient's gallery, in order
    pub gallery_assets: Vec<AssetKind>,
    /// Local key holding the serialized appointment list
    pub appointments_key: String,
    /// Prefix of per-patient annotation keys
    pub annotation_prefix: String,
    /// Collapse queued writes to the same key into the newest value
    pub coalesce_writes: bool,
    pub log_filter: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            records_path: "patientData".to_string(),
            thumbnail_asset: AssetKind::Forehead,
            gallery_assets: AssetKind::GALLERY.to_vec(),
            appointments_key: "appointments".to_string(),
            annotation_prefix: "annotation:".to_string(),
            coalesce_writes: false,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl CoreConfig {
    /// Parse a (possibly partial) JSON object over the defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoreConfig::default();
        assert_eq!(config.records_path, "patientData");
        assert_eq!(config.thumbnail_asset, AssetKind::Forehead);
        assert_eq!(config.gallery_assets.len(), 4);
        assert_eq!(config.appointments_key, "appointments");
        assert_eq!(config.annotation_prefix, "annotation:");
        assert!(!config.coalesce_writes);
    }

    #[test]
    fn test_partial_json() {
        let config =
            CoreConfig::from_json(r#"{"database_path": "/tmp/st.db", "coalesce_writes": true}"#)
                .unwrap();
        assert_eq!(config.database_path, Some("/tmp/st.db".into()));
        assert!(config.coalesce_writes);
        assert_eq!(config.records_path, "patientData");
    }

    #[test]
    fn test_empty_input_is_default() {
        assert_eq!(CoreConfig::from_json("").unwrap(), CoreConfig::default());
        assert_eq!(CoreConfig::from_json("{}").unwrap(), CoreConfig::default());
    }

    #[test]
    fn test_unknown_asset_rejected() {
        assert!(CoreConfig::from_json(r#"{"thumbnail_asset": "Ear"}"#).is_err());
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
