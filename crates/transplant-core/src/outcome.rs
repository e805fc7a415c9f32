use std::path::PathBuf;

use serde::Serialize;
use transplant_error::RelocationError;
use transplant_utils::TargetPaths;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppliedStrategy {
    OverrideFiles,
    InPlace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelocationOutcome {
    /// Both defaults were overridden; `files` lists everything written.
    Relocated {
        paths: TargetPaths,
        strategy: AppliedStrategy,
        files: Vec<PathBuf>,
    },
    /// The package is not the relocation target; nothing was touched.
    NotApplicable { package: String },
    Failed(RelocationError),
}

impl RelocationOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }

    #[must_use]
    pub const fn error(&self) -> Option<&RelocationError> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }

    #[must_use]
    pub fn report(&self) -> OutcomeReport {
        match self {
            Self::Relocated {
                paths,
                strategy,
                files,
            } => OutcomeReport {
                status: "relocated",
                strategy: Some(*strategy),
                paths: Some(paths.clone()),
                files: files.clone(),
                ..OutcomeReport::default()
            },
            Self::NotApplicable { package } => OutcomeReport {
                status: "not-applicable",
                package: Some(package.clone()),
                ..OutcomeReport::default()
            },
            Self::Failed(e) => OutcomeReport {
                status: "failed",
                kind: Some(e.kind()),
                reason: Some(e.to_string()),
                ..OutcomeReport::default()
            },
        }
    }
}

impl From<RelocationError> for RelocationOutcome {
    fn from(err: RelocationError) -> Self {
        Self::Failed(err)
    }
}

/// Flat, serialisable view of an outcome.
#[derive(Debug, Default, Serialize)]
pub struct OutcomeReport {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<AppliedStrategy>,
    #[serde(flatten)]
    pub paths: Option<TargetPaths>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
