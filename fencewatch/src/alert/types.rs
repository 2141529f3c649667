//! Alert record types and their wire format.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Ordered alert severity grades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// All grades, lowest first.
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    /// Position in [`Severity::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Shift by `offset` grades, clamping at both ends.
    pub fn shifted(self, offset: i32) -> Severity {
        let max = (Self::ALL.len() - 1) as i32;
        let idx = (self.index() as i32 + offset).clamp(0, max);
        Self::ALL[idx as usize]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a severity name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSeverity(pub String);

impl fmt::Display for UnknownSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown severity '{}' (expected low, medium, high or critical)",
            self.0
        )
    }
}

impl std::error::Error for UnknownSeverity {}

impl FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(UnknownSeverity(s.to_string())),
        }
    }
}

/// Where the camera is deployed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub zone: String,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            latitude: 40.7128,
            longitude: -74.006,
            zone: "North Pasture".to_string(),
        }
    }
}

/// Source of an alert. Only camera detections exist today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionType {
    Camera,
}

/// A graded alert record as sent to the collector.
///
/// Built once by the synthesizer and handed to the dispatcher by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEvent {
    pub location: Location,
    pub detection_type: DetectionType,
    /// UTC, millisecond precision, `Z` suffix.
    pub timestamp: String,
    pub severity: Severity,
    pub animal_type: String,
    /// Percentage with one decimal place.
    pub confidence: f64,
    pub resolved: bool,
}
