//! Patient image assets held in remote storage.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Facial region captured by the device for each patient.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Forehead,
    Chin,
    LeftCheeks,
    RightCheeks,
    Nose,
}

impl AssetKind {
    /// Regions shown in a patient's gallery, in display order.
    pub const GALLERY: [AssetKind; 4] = [
        AssetKind::Chin,
        AssetKind::LeftCheeks,
        AssetKind::RightCheeks,
        AssetKind::Nose,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Forehead => "Forehead",
            AssetKind::Chin => "Chin",
            AssetKind::LeftCheeks => "LeftCheeks",
            AssetKind::RightCheeks => "RightCheeks",
            AssetKind::Nose => "Nose",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Forehead" => Ok(AssetKind::Forehead),
            "Chin" => Ok(AssetKind::Chin),
            "LeftCheeks" => Ok(AssetKind::LeftCheeks),
            "RightCheeks" => Ok(AssetKind::RightCheeks),
            "Nose" => Ok(AssetKind::Nose),
            other => Err(format!("unknown asset kind: {}", other)),
        }
    }
}

/// Storage path of one asset: `patients/{name}/{name}_{kind}.jpeg`.
pub fn asset_path(display_name: &str, kind: AssetKind) -> String {
    format!("patients/{0}/{0}_{1}.jpeg", display_name, kind)
}
