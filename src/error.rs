use std::path::PathBuf;

use itertools::Itertools;
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarnessError>;

/// Everything that can make a single scenario fail.
///
/// The variants are kept apart so that a report can tell a crashing caller
/// from one that exits cleanly but forgets to write its outputs, or writes
/// the wrong thing into them.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {}: {}", describe_code(.code), .stderr.trim())]
    Invocation {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{program} did not finish within {seconds}s and was killed")]
    Timeout { program: String, seconds: u64 },

    #[error("expected output missing: {}", .missing.iter().map(|p| p.display()).join(", "))]
    MissingArtifact { missing: Vec<PathBuf> },

    #[error("{check}: {detail}")]
    ContentMismatch { check: &'static str, detail: String },

    #[error("failed to read {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("failed to set up the run: {0}")]
    Setup(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Coarse classification used in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Invocation,
    Timeout,
    MissingArtifact,
    ContentMismatch,
    Io,
}

impl HarnessError {
    pub fn mismatch(check: &'static str, detail: impl Into<String>) -> Self {
        HarnessError::ContentMismatch {
            check,
            detail: detail.into(),
        }
    }

    pub fn decode(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        HarnessError::Decode {
            path: path.into(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, reason.into()),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            HarnessError::Spawn { .. } | HarnessError::Invocation { .. } => FailureKind::Invocation,
            HarnessError::Timeout { .. } => FailureKind::Timeout,
            HarnessError::MissingArtifact { .. } => FailureKind::MissingArtifact,
            HarnessError::ContentMismatch { .. } => FailureKind::ContentMismatch,
            HarnessError::Decode { .. }
            | HarnessError::UnknownScenario(_)
            | HarnessError::Setup(_)
            | HarnessError::Io(_) => FailureKind::Io,
        }
    }
}
