//! Severity histogram for the dashboard.

use serde::{Deserialize, Serialize};

use crate::models::{PatientRecord, Severity};

/// Number of patients per severity category.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeverityCounts {
    pub mild: u32,
    pub moderate: u32,
    pub severe: u32,
    pub very_severe: u32,
    /// Scores, unrecognised labels, and missing severities
    pub uncategorized: u32,
}

impl SeverityCounts {
    pub fn from_records(records: &[PatientRecord]) -> Self {
        let mut counts = Self::default();
        for record in records {
            counts.add(&record.severity);
        }
        counts
    }

    pub fn add(&mut self, severity: &Severity) {
        match severity {
            Severity::Mild => self.mild += 1,
            Severity::Moderate => self.moderate += 1,
            Severity::Severe => self.severe += 1,
            Severity::VerySevere => self.very_severe += 1,
            Severity::Score(_) | Severity::Other(_) | Severity::Unknown => {
                self.uncategorized += 1
            }
        }
    }

    /// `(label, count)` for each category in chart order, zeros included.
    pub fn labeled(&self) -> Vec<(String, u32)> {
        Severity::CATEGORIES
            .iter()
            .map(|category| (category.label(), self.count(category)))
            .collect()
    }

    fn count(&self, severity: &Severity) -> u32 {
        match severity {
            Severity::Mild => self.mild,
            Severity::Moderate => self.moderate,
            Severity::Severe => self.severe,
            Severity::VerySevere => self.very_severe,
            Severity::Score(_) | Severity::Other(_) | Severity::Unknown => self.uncategorized,
        }
    }

    pub fn total(&self) -> u32 {
        self.mild + self.moderate + self.severe + self.very_severe + self.uncategorized
    }
}
