//! Type-safe switch API handles.
//!
//! The engine hands out opaque 64-bit handles for every object it stores.
//! Wrapping them in a kind-tagged type keeps an ACL table handle from being
//! passed where a rule handle is expected.

use serde::{Serialize, Serializer};
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

/// Raw engine handle (matches `switch_handle_t`).
pub type RawHandle = u64;

/// Handle of an object an ACL can be bound to (port, LAG, VLAN).
///
/// These arrive from the SAI layer as untyped object ids, so they stay raw.
pub type ObjectHandle = RawHandle;

/// Marker trait for handle kinds.
pub trait HandleKind: Send + Sync + 'static {
    /// Returns the object kind name for debugging.
    fn type_name() -> &'static str;
}

/// A kind-tagged engine handle.
///
/// # Examples
///
/// ```
/// use switchapi::{AclRuleHandle, AclTableHandle};
///
/// let table = AclTableHandle::from_raw(0x20).unwrap();
/// assert_eq!(table.as_raw(), 0x20);
/// assert!(AclRuleHandle::from_raw(0).is_none());
/// ```
#[derive(Clone, Copy)]
pub struct Handle<T: HandleKind> {
    raw: RawHandle,
    _marker: PhantomData<T>,
}

impl<T: HandleKind> Handle<T> {
    /// Creates a handle from a raw value. Returns `None` for the null handle.
    pub fn from_raw(raw: RawHandle) -> Option<Self> {
        if raw == 0 {
            None
        } else {
            Some(Self::from_raw_unchecked(raw))
        }
    }

    /// Creates a handle from a raw value, including null.
    pub const fn from_raw_unchecked(raw: RawHandle) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    /// Returns the raw handle value.
    pub const fn as_raw(&self) -> RawHandle {
        self.raw
    }
}

impl<T: HandleKind> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:x})", T::type_name(), self.raw)
    }
}

impl<T: HandleKind> fmt::Display for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.raw)
    }
}

impl<T: HandleKind> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T: HandleKind> Eq for Handle<T> {}

impl<T: HandleKind> Hash for Handle<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T: HandleKind> Serialize for Handle<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.raw)
    }
}

macro_rules! define_handle_kind {
    ($name:ident, $type_name:literal, $alias:ident) => {
        #[doc = concat!("Marker type for ", $type_name, " handles.")]
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl HandleKind for $name {
            fn type_name() -> &'static str {
                $type_name
            }
        }

        #[doc = concat!("Handle of an engine ", $type_name, ".")]
        pub type $alias = Handle<$name>;
    };
}

define_handle_kind!(AclTableKind, "AclTable", AclTableHandle);
define_handle_kind!(AclRuleKind, "AclRule", AclRuleHandle);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_null_handle() {
        assert!(AclTableHandle::from_raw(0).is_none());
        assert_eq!(AclTableHandle::from_raw(1).unwrap().as_raw(), 1);
        assert_eq!(AclTableHandle::from_raw_unchecked(0).as_raw(), 0);
    }

    #[test]
    fn test_handle_debug_names_kind() {
        let rule = AclRuleHandle::from_raw(0x2a).unwrap();
        assert_eq!(format!("{:?}", rule), "AclRule(0x2a)");
        assert_eq!(rule.to_string(), "0x2a");
    }
}
