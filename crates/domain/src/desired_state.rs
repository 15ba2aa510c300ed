use std::fmt::{Display, Formatter};
use std::str::FromStr;

use edgelimit_core::AppError;
use serde::{Deserialize, Serialize};

/// Whether a rule should exist in its zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesiredState {
    /// The rule must exist with the desired definition.
    #[default]
    Present,
    /// The rule must not exist. Accepted for compatibility; removal is not supported.
    Absent,
}

impl DesiredState {
    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
        }
    }
}

impl Display for DesiredState {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for DesiredState {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            _ => Err(AppError::Validation(format!(
                "state must be 'present' or 'absent', got '{value}'"
            ))),
        }
    }
}
