//! Capability type taxonomy.
//!
//! Every manifest declares exactly one [`CapabilityType`], which registries
//! use for semantic matching. The taxonomy is closed: raw text outside it is
//! rejected at construction rather than mapped to a fallback.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The kind of work a capability performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityType {
    DataProcessing,
    ModelTraining,
    ApiIntegration,
    Storage,
    Compute,
    Monitoring,
    Validation,
    Transformation,
}

impl CapabilityType {
    /// Every capability type, in declaration order.
    pub const ALL: [CapabilityType; 8] = [
        CapabilityType::DataProcessing,
        CapabilityType::ModelTraining,
        CapabilityType::ApiIntegration,
        CapabilityType::Storage,
        CapabilityType::Compute,
        CapabilityType::Monitoring,
        CapabilityType::Validation,
        CapabilityType::Transformation,
    ];

    /// The wire tag, e.g. `"data_processing"`.
    pub fn as_str(self) -> &'static str {
        match self {
            CapabilityType::DataProcessing => "data_processing",
            CapabilityType::ModelTraining => "model_training",
            CapabilityType::ApiIntegration => "api_integration",
            CapabilityType::Storage => "storage",
            CapabilityType::Compute => "compute",
            CapabilityType::Monitoring => "monitoring",
            CapabilityType::Validation => "validation",
            CapabilityType::Transformation => "transformation",
        }
    }
}

impl fmt::Display for CapabilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw capability type text outside the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown capability type '{value}'. Supported types: [{supported}]")]
pub struct UnknownCapabilityType {
    pub value: String,
    pub supported: String,
}

impl FromStr for CapabilityType {
    type Err = UnknownCapabilityType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CapabilityType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| UnknownCapabilityType {
                value: s.to_owned(),
                supported: CapabilityType::ALL
                    .iter()
                    .map(|ty| ty.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}
