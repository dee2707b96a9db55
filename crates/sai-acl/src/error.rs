//! Error and status types of the ACL translation layer.

use std::fmt;
use switchapi::{AclTableHandle, NativeField, SwitchError, SwitchStatus};
use thiserror::Error;

use crate::capability::TableShape;
use crate::qualifier::AclQualifier;

/// SAI status codes reported to callers of the ACL API.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaiStatus {
    Success = 0,
    Failure = -1,
    NotSupported = -2,
    NoMemory = -3,
    InsufficientResources = -4,
    InvalidParameter = -5,
    ItemAlreadyExists = -6,
    ItemNotFound = -7,
    TableFull = -13,
    MandatoryAttributeMissing = -14,
    ObjectInUse = -17,
    InvalidObjectId = -19,
    InvalidAttribute = -24,
}

impl SaiStatus {
    /// Returns the raw SAI code.
    pub fn as_raw(self) -> i32 {
        self as i32
    }

    pub fn is_success(&self) -> bool {
        *self == SaiStatus::Success
    }
}

impl From<SwitchStatus> for SaiStatus {
    fn from(status: SwitchStatus) -> Self {
        match status {
            SwitchStatus::Success => SaiStatus::Success,
            SwitchStatus::Failure | SwitchStatus::HwFailure => SaiStatus::Failure,
            SwitchStatus::NotSupported => SaiStatus::NotSupported,
            SwitchStatus::NoMemory => SaiStatus::NoMemory,
            SwitchStatus::InsufficientResources => SaiStatus::InsufficientResources,
            SwitchStatus::InvalidParameter => SaiStatus::InvalidParameter,
            SwitchStatus::ItemAlreadyExists => SaiStatus::ItemAlreadyExists,
            SwitchStatus::ItemNotFound => SaiStatus::ItemNotFound,
            SwitchStatus::InvalidHandle => SaiStatus::InvalidObjectId,
            SwitchStatus::ResourceInUse => SaiStatus::ObjectInUse,
            SwitchStatus::TableFull => SaiStatus::TableFull,
        }
    }
}

impl fmt::Display for SaiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SaiStatus::Success => "SAI_STATUS_SUCCESS",
            SaiStatus::Failure => "SAI_STATUS_FAILURE",
            SaiStatus::NotSupported => "SAI_STATUS_NOT_SUPPORTED",
            SaiStatus::NoMemory => "SAI_STATUS_NO_MEMORY",
            SaiStatus::InsufficientResources => "SAI_STATUS_INSUFFICIENT_RESOURCES",
            SaiStatus::InvalidParameter => "SAI_STATUS_INVALID_PARAMETER",
            SaiStatus::ItemAlreadyExists => "SAI_STATUS_ITEM_ALREADY_EXISTS",
            SaiStatus::ItemNotFound => "SAI_STATUS_ITEM_NOT_FOUND",
            SaiStatus::TableFull => "SAI_STATUS_TABLE_FULL",
            SaiStatus::MandatoryAttributeMissing => "SAI_STATUS_MANDATORY_ATTRIBUTE_MISSING",
            SaiStatus::ObjectInUse => "SAI_STATUS_OBJECT_IN_USE",
            SaiStatus::InvalidObjectId => "SAI_STATUS_INVALID_OBJECT_ID",
            SaiStatus::InvalidAttribute => "SAI_STATUS_INVALID_ATTRIBUTE",
        };
        write!(f, "{}", s)
    }
}

/// Error type for ACL table and rule operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AclError {
    /// No table shape supports every requested qualifier.
    #[error("No ACL table shape supports qualifiers {qualifiers:?}")]
    NoMatchingShape { qualifiers: Vec<AclQualifier> },

    /// The rule has no (or a null) table attribute.
    #[error("ACL rule has no table")]
    MissingTable,

    /// The table handle does not resolve to an engine table.
    #[error("Invalid ACL table reference {table}: {source}")]
    InvalidTableReference {
        table: AclTableHandle,
        source: SwitchError,
    },

    /// The qualifier cannot be used in a rule on a table of this shape.
    #[error("Qualifier {qualifier} is not supported by {shape} tables")]
    UnsupportedQualifierForShape {
        qualifier: AclQualifier,
        shape: TableShape,
    },

    /// A field value has the wrong kind for its native field.
    #[error("Invalid data for {field}: expected {expected}")]
    InvalidFieldData { field: String, expected: &'static str },

    /// The rule would match every packet and the policy forbids that.
    #[error("ACL rule has no match fields")]
    NoMatchFields,

    /// Building the rule ran out of room.
    #[error("Allocation failure: {0}")]
    AllocationFailure(String),

    /// The engine rejected the call.
    #[error("Switch API error: {0}")]
    Engine(#[from] SwitchError),
}

impl AclError {
    pub(crate) fn invalid_native_data(field: NativeField, expected: &'static str) -> Self {
        AclError::InvalidFieldData {
            field: field.to_string(),
            expected,
        }
    }

    pub(crate) fn invalid_reference_data(qualifier: AclQualifier, expected: &'static str) -> Self {
        AclError::InvalidFieldData {
            field: qualifier.to_string(),
            expected,
        }
    }

    /// Returns the SAI status reported for this error.
    pub fn status(&self) -> SaiStatus {
        match self {
            AclError::NoMatchingShape { .. } => SaiStatus::InvalidParameter,
            AclError::MissingTable => SaiStatus::MandatoryAttributeMissing,
            AclError::InvalidTableReference { .. } => SaiStatus::InvalidObjectId,
            AclError::UnsupportedQualifierForShape { .. } => SaiStatus::NotSupported,
            AclError::InvalidFieldData { .. } => SaiStatus::InvalidAttribute,
            AclError::NoMatchFields => SaiStatus::InvalidParameter,
            AclError::AllocationFailure(_) => SaiStatus::NoMemory,
            AclError::Engine(e) => SaiStatus::from(e.status()),
        }
    }
}

/// Result type for ACL operations.
pub type Result<T> = std::result::Result<T, AclError>;
