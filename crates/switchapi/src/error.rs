//! Switch API status codes and error handling.
//!
//! The engine reports failures as raw `switch_status_t` codes. This module
//! converts them into a Rust `Result` so callers can use `?`.

use std::fmt;
use thiserror::Error;

/// Status codes returned by the switch API engine.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitchStatus {
    Success = 0,
    Failure = 1,
    NotSupported = 2,
    NoMemory = 3,
    InsufficientResources = 4,
    InvalidParameter = 5,
    ItemAlreadyExists = 6,
    ItemNotFound = 7,
    InvalidHandle = 8,
    ResourceInUse = 9,
    TableFull = 10,
    HwFailure = 11,
}

impl SwitchStatus {
    /// Returns the raw engine code.
    pub fn as_raw(self) -> i32 {
        self as i32
    }

    /// Returns true if the status indicates success.
    pub fn is_success(&self) -> bool {
        *self == SwitchStatus::Success
    }

    /// Converts to a Result, returning Ok(()) for success.
    pub fn into_result(self) -> SwitchResult<()> {
        if self.is_success() {
            Ok(())
        } else {
            Err(SwitchError::from_status(self))
        }
    }
}

impl fmt::Display for SwitchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SwitchStatus::Success => "SWITCH_STATUS_SUCCESS",
            SwitchStatus::Failure => "SWITCH_STATUS_FAILURE",
            SwitchStatus::NotSupported => "SWITCH_STATUS_NOT_SUPPORTED",
            SwitchStatus::NoMemory => "SWITCH_STATUS_NO_MEMORY",
            SwitchStatus::InsufficientResources => "SWITCH_STATUS_INSUFFICIENT_RESOURCES",
            SwitchStatus::InvalidParameter => "SWITCH_STATUS_INVALID_PARAMETER",
            SwitchStatus::ItemAlreadyExists => "SWITCH_STATUS_ITEM_ALREADY_EXISTS",
            SwitchStatus::ItemNotFound => "SWITCH_STATUS_ITEM_NOT_FOUND",
            SwitchStatus::InvalidHandle => "SWITCH_STATUS_INVALID_HANDLE",
            SwitchStatus::ResourceInUse => "SWITCH_STATUS_RESOURCE_IN_USE",
            SwitchStatus::TableFull => "SWITCH_STATUS_TABLE_FULL",
            SwitchStatus::HwFailure => "SWITCH_STATUS_HW_FAILURE",
        };
        write!(f, "{}", s)
    }
}

/// Error type for switch API operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwitchError {
    /// The engine returned an error status.
    #[error("switch API call failed: {status}")]
    Status { status: SwitchStatus },

    /// A handle did not refer to a live object.
    #[error("invalid handle: 0x{handle:x}")]
    InvalidHandle { handle: u64 },

    /// The engine rejected a parameter.
    #[error("invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// The engine table backing an object is full.
    #[error("table full: {table}")]
    TableFull { table: String },

    /// The object is still referenced and cannot be removed.
    #[error("resource in use: {object}")]
    ResourceInUse { object: String },
}

impl SwitchError {
    /// Creates an error from an engine status code.
    pub fn from_status(status: SwitchStatus) -> Self {
        match status {
            SwitchStatus::InvalidParameter => SwitchError::InvalidParameter {
                message: format!("engine returned {}", status),
            },
            SwitchStatus::TableFull => SwitchError::TableFull {
                table: "unknown".to_string(),
            },
            SwitchStatus::ResourceInUse => SwitchError::ResourceInUse {
                object: "unknown".to_string(),
            },
            _ => SwitchError::Status { status },
        }
    }

    /// Creates an invalid handle error.
    pub fn invalid_handle(handle: u64) -> Self {
        SwitchError::InvalidHandle { handle }
    }

    /// Creates an invalid parameter error with a message.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        SwitchError::InvalidParameter {
            message: message.into(),
        }
    }

    /// Creates a resource in use error.
    pub fn resource_in_use(object: impl Into<String>) -> Self {
        SwitchError::ResourceInUse {
            object: object.into(),
        }
    }

    /// Returns the closest engine status code for this error.
    pub fn status(&self) -> SwitchStatus {
        match self {
            SwitchError::Status { status } => *status,
            SwitchError::InvalidHandle { .. } => SwitchStatus::InvalidHandle,
            SwitchError::InvalidParameter { .. } => SwitchStatus::InvalidParameter,
            SwitchError::TableFull { .. } => SwitchStatus::TableFull,
            SwitchError::ResourceInUse { .. } => SwitchStatus::ResourceInUse,
        }
    }
}

/// Result type for switch API operations.
pub type SwitchResult<T> = Result<T, SwitchError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_into_result() {
        assert!(SwitchStatus::Success.into_result().is_ok());
        let err = SwitchStatus::TableFull.into_result().unwrap_err();
        assert!(matches!(err, SwitchError::TableFull { .. }));
    }

    #[test]
    fn test_error_status_roundtrip() {
        for status in [
            SwitchStatus::Failure,
            SwitchStatus::InvalidParameter,
            SwitchStatus::TableFull,
            SwitchStatus::ResourceInUse,
            SwitchStatus::NoMemory,
        ] {
            assert_eq!(SwitchError::from_status(status).status(), status);
        }
        assert_eq!(
            SwitchError::invalid_handle(0x10).status(),
            SwitchStatus::InvalidHandle
        );
    }
}
