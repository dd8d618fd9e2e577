//! Coarse project phases.

use super::ParseStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of a project, ordered from first to last.
///
/// The derived ordering is the advancement order; a project's phase never
/// moves backwards.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ProjectPhase {
    /// Requirements are being analysed.
    #[default]
    Requirements,
    /// The system is being designed.
    Design,
    /// Code is being written.
    Implementation,
    /// Tests are being written.
    Testing,
    /// Deployment and documentation are being prepared.
    Deployment,
    /// Every task has settled.
    Completed,
}

impl ProjectPhase {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Requirements => "requirements",
            Self::Design => "design",
            Self::Implementation => "implementation",
            Self::Testing => "testing",
            Self::Deployment => "deployment",
            Self::Completed => "completed",
        }
    }
}

impl TryFrom<&str> for ProjectPhase {
    type Error = ParseStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "requirements" => Ok(Self::Requirements),
            "design" => Ok(Self::Design),
            "implementation" => Ok(Self::Implementation),
            "testing" => Ok(Self::Testing),
            "deployment" => Ok(Self::Deployment),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for ProjectPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
