//! Exit codes for the CLI

use vigil_core::VigilError;
use vigil_tasks::TaskError;

/// General error
pub const ERROR: i32 = 1;

/// Configuration error
pub const CONFIG_ERROR: i32 = 2;

/// Variant manifest could not be read
pub const MANIFEST_ERROR: i32 = 3;

/// Task graph could not be built or realised
pub const TASK_ERROR: i32 = 4;

/// Validation found problems
pub const VALIDATION_ERROR: i32 = 5;

/// Map an error chain to the most specific exit code
pub fn for_error(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(vigil) = cause.downcast_ref::<VigilError>() {
            return match vigil {
                VigilError::Config(_) => CONFIG_ERROR,
                VigilError::Manifest(_) => MANIFEST_ERROR,
                VigilError::Io(_) | VigilError::Other(_) => ERROR,
            };
        }
        if cause.downcast_ref::<TaskError>().is_some() {
            return TASK_ERROR;
        }
        if cause.downcast_ref::<ValidationFailed>().is_some() {
            return VALIDATION_ERROR;
        }
    }
    ERROR
}

/// Raised by commands whose checks completed but reported problems
#[derive(Debug)]
pub struct ValidationFailed(pub usize);

impl std::fmt::Display for ValidationFailed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed with {} error(s)", self.0)
    }
}

impl std::error::Error for ValidationFailed {}
