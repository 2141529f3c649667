//! Monitored labels and their severity/confidence tables.

use std::collections::{HashMap, HashSet};

use super::types::Severity;

/// Severity used when a monitored label has no profile.
pub const DEFAULT_SEVERITY: Severity = Severity::Medium;

/// Remap range used when a monitored label has no custom range.
pub const DEFAULT_CONFIDENCE_RANGE: ConfidenceRange = ConfidenceRange {
    low: 0.5,
    high: 0.9,
};

/// Target interval that raw classifier confidence is stretched onto.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceRange {
    pub low: f64,
    pub high: f64,
}

impl ConfidenceRange {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Linear map of `raw` in `[0, 1]` onto `[low, high]`.
    pub fn map(&self, raw: f64) -> f64 {
        self.low + (self.high - self.low) * raw
    }
}

/// Per-label grading profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelProfile {
    pub severity: Severity,
    pub confidence: Option<ConfidenceRange>,
}

/// Allow-list plus grading tables for monitored labels.
///
/// Labels are compared case-insensitively; keys are stored lowercase.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPolicy {
    monitored: HashSet<String>,
    profiles: HashMap<String, LabelProfile>,
}

impl LabelPolicy {
    /// Empty policy; nothing is monitored.
    pub fn empty() -> Self {
        Self {
            monitored: HashSet::new(),
            profiles: HashMap::new(),
        }
    }

    /// Add `label` to the allow-list.
    pub fn monitor(mut self, label: &str) -> Self {
        self.monitored.insert(normalize(label));
        self
    }

    /// Set the grading profile for `label` (does not monitor it).
    pub fn with_profile(mut self, label: &str, profile: LabelProfile) -> Self {
        self.set_profile(label, profile);
        self
    }

    pub fn set_profile(&mut self, label: &str, profile: LabelProfile) {
        self.profiles.insert(normalize(label), profile);
    }

    /// Replace the allow-list, keeping all profiles.
    pub fn set_monitored<'a>(&mut self, labels: impl IntoIterator<Item = &'a str>) {
        self.monitored = labels
            .into_iter()
            .map(normalize)
            .filter(|l| !l.is_empty())
            .collect();
    }

    /// Profile for `label`, if one is configured.
    pub fn profile(&self, label: &str) -> Option<LabelProfile> {
        self.profiles.get(&normalize(label)).copied()
    }

    /// All configured profiles, sorted by label.
    pub fn profiles(&self) -> Vec<(String, LabelProfile)> {
        let mut profiles: Vec<(String, LabelProfile)> = self
            .profiles
            .iter()
            .map(|(label, profile)| (label.clone(), *profile))
            .collect();
        profiles.sort_by(|a, b| a.0.cmp(&b.0));
        profiles
    }

    /// Whether detections of `label` may become alerts.
    pub fn is_monitored(&self, label: &str) -> bool {
        self.monitored.contains(&normalize(label))
    }

    /// Base severity for `label`, falling back to [`DEFAULT_SEVERITY`].
    pub fn base_severity(&self, label: &str) -> Severity {
        self.profiles
            .get(&normalize(label))
            .map(|p| p.severity)
            .unwrap_or(DEFAULT_SEVERITY)
    }

    /// Remap range for `label`, falling back to [`DEFAULT_CONFIDENCE_RANGE`].
    pub fn confidence_range(&self, label: &str) -> ConfidenceRange {
        self.profiles
            .get(&normalize(label))
            .and_then(|p| p.confidence)
            .unwrap_or(DEFAULT_CONFIDENCE_RANGE)
    }

    /// Monitored labels, sorted.
    pub fn monitored_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.monitored.iter().cloned().collect();
        labels.sort();
        labels
    }
}

impl Default for LabelPolicy {
    /// The pasture deployment table.
    fn default() -> Self {
        const TABLE: &[(&str, Severity, f64, f64)] = &[
            ("bird", Severity::Low, 0.4, 0.75),
            ("rat", Severity::Low, 0.4, 0.7),
            ("cat", Severity::Medium, 0.6, 0.9),
            ("dog", Severity::Medium, 0.6, 0.9),
            ("sheep", Severity::Medium, 0.6, 0.9),
            ("horse", Severity::High, 0.7, 0.95),
            ("cow", Severity::High, 0.7, 0.95),
            ("zebra", Severity::High, 0.7, 0.95),
            ("giraffe", Severity::High, 0.7, 0.95),
            ("bear", Severity::High, 0.8, 1.0),
            ("elephant", Severity::Critical, 0.8, 1.0),
        ];

        TABLE
            .iter()
            .fold(Self::empty(), |policy, &(label, severity, low, high)| {
                policy.monitor(label).with_profile(
                    label,
                    LabelProfile {
                        severity,
                        confidence: Some(ConfidenceRange::new(low, high)),
                    },
                )
            })
    }
}

fn normalize(label: &str) -> String {
    label.trim().to_lowercase()
}
