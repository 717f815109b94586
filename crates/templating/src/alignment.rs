//! Package alignment classification

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ownership model of a package
///
/// The string form doubles as the directory marker segment
/// (`packages/domains/source-aligned/...`) and as the catalog variant key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Alignment {
    #[serde(rename = "source-aligned")]
    SourceAligned,
    #[serde(rename = "consumer-aligned")]
    ConsumerAligned,
    #[serde(rename = "utils", alias = "utility")]
    Utility,
}

impl Alignment {
    /// All alignments, in path-marker priority order
    pub const ALL: [Self; 3] = [Self::SourceAligned, Self::ConsumerAligned, Self::Utility];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SourceAligned => "source-aligned",
            Self::ConsumerAligned => "consumer-aligned",
            Self::Utility => "utils",
        }
    }

    /// Name of the parameter taken from the path segment after the marker
    pub fn primary_parameter(&self) -> Option<&'static str> {
        match self {
            Self::SourceAligned => Some("source_system"),
            Self::ConsumerAligned => Some("business_area"),
            Self::Utility => None,
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Alignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "source-aligned" => Ok(Self::SourceAligned),
            "consumer-aligned" => Ok(Self::ConsumerAligned),
            "utils" | "utility" => Ok(Self::Utility),
            other => Err(format!(
                "unknown alignment '{other}' (expected source-aligned, consumer-aligned or utils)"
            )),
        }
    }
}
