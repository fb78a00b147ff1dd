//! AI model registry status values.
//!
//! Status is freely settable by an admin; there is no transition graph.
//! Must match the `ck_ai_models_status` check constraint.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    Active,
    Inactive,
    Training,
    Deployed,
    Maintenance,
}

impl ModelStatus {
    pub const ALL: [ModelStatus; 5] = [
        ModelStatus::Active,
        ModelStatus::Inactive,
        ModelStatus::Training,
        ModelStatus::Deployed,
        ModelStatus::Maintenance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelStatus::Active => "active",
            ModelStatus::Inactive => "inactive",
            ModelStatus::Training => "training",
            ModelStatus::Deployed => "deployed",
            ModelStatus::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown model status '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_status_parses_back() {
        for status in ModelStatus::ALL {
            assert_eq!(status.as_str().parse::<ModelStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_rejected() {
        assert!("retired".parse::<ModelStatus>().is_err());
    }
}
