//! Typed boundary to the P4 switch API ACL engine.
//!
//! The engine stores ACL lists and rules in the forwarding pipeline. This
//! crate describes what it accepts and returns, so the SAI translation layer
//! above it never handles raw handles or status codes:
//!
//! - [`acl`]: native ACL list types, per-type field ids, key/value pairs, actions
//! - [`handle`]: kind-tagged engine handles
//! - [`error`]: status codes and the [`SwitchError`] type
//! - [`api`]: the [`SwitchAclApi`] trait the engine implements
//! - [`memory`]: [`MemorySwitch`], an in-memory engine
//!
//! # Example
//!
//! ```
//! use switchapi::{AclType, MemorySwitch, SwitchAclApi};
//!
//! let switch = MemorySwitch::new();
//! let table = switch.create_table(AclType::Ip).unwrap();
//! assert_eq!(switch.table_type(table).unwrap(), AclType::Ip);
//! ```

pub mod acl;
pub mod api;
pub mod error;
pub mod handle;
pub mod memory;

pub use acl::{
    AclAction, AclActionParams, AclType, FieldValue, IpField, Ipv6Field, KeyValuePair, MacField,
    NativeField,
};
pub use api::SwitchAclApi;
pub use error::{SwitchError, SwitchResult, SwitchStatus};
pub use handle::{AclRuleHandle, AclTableHandle, Handle, HandleKind, ObjectHandle, RawHandle};
pub use memory::{InstalledRule, MemorySwitch, SwitchOp};
