//! Appointment models.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// A scheduled appointment.
///
/// Ids are decimal strings assigned by [`next_appointment_id`]. Display
/// fields are free text and never validated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
}

/// Appointment fields entered by the user, before an id is assigned.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewAppointment {
    pub title: String,
    pub detail: String,
    pub date: String,
    pub time: String,
}

impl NewAppointment {
    pub fn new(title: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            date: date.into(),
            ..Default::default()
        }
    }

    /// Attach an id, producing the stored entry.
    pub fn with_id(self, id: String) -> Appointment {
        Appointment {
            id,
            title: self.title,
            detail: self.detail,
            date: self.date,
            time: self.time,
        }
    }
}

impl Appointment {
    /// Numeric value of the id, if it is one.
    pub fn numeric_id(&self) -> Option<u64> {
        self.id.trim().parse().ok()
    }

    /// The date as `YYYY-MM-DD`, if it parses.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok()
    }
}

/// Next id for a collection: highest numeric id plus one, `1` when none.
///
/// When the highest id is `u64::MAX` the lowest unused id is taken instead.
pub fn next_appointment_id(entries: &[Appointment]) -> String {
    let taken: HashSet<u64> = entries.iter().filter_map(Appointment::numeric_id).collect();
    let next = match taken.iter().max() {
        None => 1,
        Some(max) => match max.checked_add(1) {
            Some(next) => next,
            None => (1..=u64::MAX).find(|id| !taken.contains(id)).unwrap_or(0),
        },
    };
    next.to_string()
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}
