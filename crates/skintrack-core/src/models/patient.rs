//! Patient directory models.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// URI rendered in place of an image that is still loading or failed to resolve.
pub const PLACEHOLDER_IMAGE_URI: &str = "default-placeholder-image-uri";

/// Severity category reported by the remote record source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
    VerySevere,
    /// Numeric score instead of a category
    Score(f64),
    /// Label the client does not recognise, kept verbatim
    Other(String),
    /// No `severity` field on the record
    Unknown,
}

impl Severity {
    /// Categories in dashboard order.
    pub const CATEGORIES: [Severity; 4] = [
        Severity::Mild,
        Severity::Moderate,
        Severity::Severe,
        Severity::VerySevere,
    ];

    /// Parse a severity label (case-insensitive, tolerant of `_`/`-` separators).
    pub fn from_label(label: &str) -> Self {
        let canonical: String = label
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();

        match canonical.as_str() {
            "mild" => Severity::Mild,
            "moderate" => Severity::Moderate,
            "severe" => Severity::Severe,
            "verysevere" => Severity::VerySevere,
            _ => Severity::Other(label.to_string()),
        }
    }

    /// Interpret the raw `severity` field of a remote record.
    pub fn from_field(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Severity::Unknown,
            Some(Value::String(s)) => Self::from_label(s),
            Some(Value::Number(n)) => n
                .as_f64()
                .map(Severity::Score)
                .unwrap_or_else(|| Severity::Other(n.to_string())),
            Some(other) => Severity::Other(other.to_string()),
        }
    }

    /// Whether this is one of the four dashboard categories.
    pub fn is_category(&self) -> bool {
        matches!(
            self,
            Severity::Mild | Severity::Moderate | Severity::Severe | Severity::VerySevere
        )
    }

    /// Human-readable label.
    pub fn label(&self) -> String {
        match self {
            Severity::Mild => "Mild".to_string(),
            Severity::Moderate => "Moderate".to_string(),
            Severity::Severe => "Severe".to_string(),
            Severity::VerySevere => "Very Severe".to_string(),
            Severity::Score(score) => score.to_string(),
            Severity::Other(label) => label.clone(),
            Severity::Unknown => "Unknown".to_string(),
        }
    }
}

/// Resolution state of a record's thumbnail asset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum AssetState {
    /// Lookup requested, no result yet
    Pending,
    /// Lookup succeeded
    Resolved(String),
    /// Lookup failed; the record renders with a placeholder
    Unavailable,
}

impl AssetState {
    pub fn is_resolved(&self) -> bool {
        matches!(self, AssetState::Resolved(_))
    }

    /// URI to render: the resolved URL or the placeholder.
    pub fn display_uri(&self) -> &str {
        match self {
            AssetState::Resolved(url) => url,
            AssetState::Pending | AssetState::Unavailable => PLACEHOLDER_IMAGE_URI,
        }
    }
}

/// A patient as shown in the directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientRecord {
    /// Server-assigned identifier
    pub id: String,
    /// Derived from `id`, see [`display_name_for`]
    pub display_name: String,
    pub severity: Severity,
    pub asset: AssetState,
}

impl PatientRecord {
    /// Create a record with a pending asset.
    pub fn new(id: String, severity: Severity) -> Self {
        Self {
            display_name: display_name_for(&id),
            id,
            severity,
            asset: AssetState::Pending,
        }
    }

    /// Case-insensitive substring match on the display name.
    pub fn matches(&self, query: &str) -> bool {
        query.is_empty()
            || self
                .display_name
                .to_lowercase()
                .contains(&query.to_lowercase())
    }
}

/// Display name derived from a patient id.
pub fn display_name_for(id: &str) -> String {
    format!("Patient No. {}", id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_record() {
        let record = PatientRecord::new("7".into(), Severity::Mild);
        assert_eq!(record.display_name, "Patient No. 7");
        assert_eq!(record.asset, AssetState::Pending);
        assert_eq!(record.asset.display_uri(), PLACEHOLDER_IMAGE_URI);
    }

    #[test]
    fn test_severity_labels() {
        assert_eq!(Severity::from_label("mild"), Severity::Mild);
        assert_eq!(Severity::from_label("Very Severe"), Severity::VerySevere);
        assert_eq!(Severity::from_label("very_severe"), Severity::VerySevere);
        assert_eq!(
            Severity::from_label("Extreme"),
            Severity::Other("Extreme".into())
        );
    }

    #[test]
    fn test_severity_from_field() {
        assert_eq!(Severity::from_field(None), Severity::Unknown);
        assert_eq!(Severity::from_field(Some(&json!(null))), Severity::Unknown);
        assert_eq!(Severity::from_field(Some(&json!("Severe"))), Severity::Severe);
        assert_eq!(Severity::from_field(Some(&json!(3))), Severity::Score(3.0));
        assert_eq!(Severity::from_field(Some(&json!(0.5))), Severity::Score(0.5));
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let record = PatientRecord::new("AB12".into(), Severity::Unknown);
        assert!(record.matches("patient no. ab"));
        assert!(record.matches("B12"));
        assert!(record.matches(""));
        assert!(!record.matches("C"));
    }

    #[test]
    fn test_resolved_display_uri() {
        let asset = AssetState::Resolved("https://cdn/x.jpeg".into());
        assert!(asset.is_resolved());
        assert_eq!(asset.display_uri(), "https://cdn/x.jpeg");
    }
}
