//! Structured error types shared across plate crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`PlateError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (well labels, bucket names, counts).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the operator resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for plate workflows.
///
/// `MalformedRow` and `UnresolvedReplicateGrouping` describe recoverable
/// conditions. The engines collect them into their reports instead of
/// returning them, so callers only see them as `Err` when they build them
/// explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum PlateError {
    /// Bad well label or out-of-range row/column.
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(ErrorInfo),
    /// Matrix access or layout outside the configured plate shape.
    #[error("out of bounds: {0}")]
    OutOfBounds(ErrorInfo),
    /// A measurement row that could not be used.
    #[error("malformed row: {0}")]
    MalformedRow(ErrorInfo),
    /// An averaging bucket, regression or ratio with no defined value.
    #[error("division by zero: {0}")]
    DivisionByZero(ErrorInfo),
    /// Selected wells do not divide evenly into replicate groups.
    #[error("unresolved replicate grouping: {0}")]
    UnresolvedReplicateGrouping(ErrorInfo),
    /// A culture volume outside the pipettable range under a rejecting policy.
    #[error("volume out of range: {0}")]
    VolumeOutOfRange(ErrorInfo),
    /// Serialization and schema errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
    /// Association store errors.
    #[error("store error: {0}")]
    Store(ErrorInfo),
    /// Filesystem errors.
    #[error("io error: {0}")]
    Io(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl PlateError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            PlateError::InvalidCoordinate(info)
            | PlateError::OutOfBounds(info)
            | PlateError::MalformedRow(info)
            | PlateError::DivisionByZero(info)
            | PlateError::UnresolvedReplicateGrouping(info)
            | PlateError::VolumeOutOfRange(info)
            | PlateError::Serde(info)
            | PlateError::Store(info)
            | PlateError::Io(info) => info,
        }
    }

    /// Whether the error is absorbed locally rather than aborting a run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PlateError::MalformedRow(_) | PlateError::UnresolvedReplicateGrouping(_)
        )
    }
}
