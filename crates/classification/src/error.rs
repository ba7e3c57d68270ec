//! Error types for classification and configuration.

use grid_processor::GridProcessorError;
use std::fmt;
use thiserror::Error;

/// Errors raised while building tables or classifying rasters.
#[derive(Error, Debug)]
pub enum ClassificationError {
    /// A range table breaks its structural rules.
    #[error("invalid classification table for {parameter}: {reason}")]
    InvalidTable { parameter: String, reason: String },

    /// Reading or writing a raster failed.
    #[error(transparent)]
    Raster(#[from] GridProcessorError),

    /// Configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ClassificationError {
    pub fn invalid_table(parameter: impl fmt::Display, reason: impl Into<String>) -> Self {
        Self::InvalidTable {
            parameter: parameter.to_string(),
            reason: reason.into(),
        }
    }
}

/// A configuration object failed validation.
///
/// Carries every violation found, not just the first.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid {subject}: {}", .violations.join("; "))]
pub struct ConfigError {
    pub subject: String,
    pub violations: Vec<String>,
}

impl ConfigError {
    pub fn new(subject: impl Into<String>, violations: Vec<String>) -> Self {
        Self {
            subject: subject.into(),
            violations,
        }
    }

    /// `Ok` when nothing was violated.
    pub fn check(
        subject: impl Into<String>,
        violations: Vec<String>,
    ) -> std::result::Result<(), ConfigError> {
        if violations.is_empty() {
            Ok(())
        } else {
            Err(Self::new(subject, violations))
        }
    }
}

/// Result type for classification operations.
pub type Result<T> = std::result::Result<T, ClassificationError>;
