//! SAI ACL translation over the P4 switch API.
//!
//! SAI describes ACL tables by an open set of match qualifiers, while the
//! switch API engine only knows three fixed table types. This crate bridges
//! the two:
//!
//! - [`capability`]: which qualifier slots each table shape supports
//! - [`classify`]: picks a shape for a requested qualifier set
//! - [`xform`]: converts a field value/mask into the engine's encoding
//! - [`rule`]: assembles keys, action and port/VLAN bindings for a rule
//! - [`api`]: [`AclApi`], the table and rule entry points
//! - [`scenario`]: JSON driver used by the `acl-xlate` binary
//!
//! # Example
//!
//! ```
//! use std::net::Ipv4Addr;
//! use std::sync::Arc;
//! use sai_acl::{AclApi, AclConfig, AclEntryAttr, AclFieldData, AclPacketAction, AclQualifier};
//! use switchapi::{AclAction, MemorySwitch};
//!
//! let api = AclApi::new(Arc::new(MemorySwitch::new()), AclConfig::default());
//! let table = api.create_acl_table(&[AclQualifier::DstIp]).unwrap();
//!
//! let rule = api
//!     .create_acl_rule(&[
//!         AclEntryAttr::TableId(table.as_raw()),
//!         AclEntryAttr::Priority(10),
//!         AclEntryAttr::field(
//!             AclQualifier::DstIp,
//!             AclFieldData::ipv4_prefix(Ipv4Addr::new(10, 0, 0, 1), 32),
//!         ),
//!         AclEntryAttr::PacketAction(AclPacketAction::Drop),
//!     ])
//!     .unwrap();
//!
//! assert_eq!(api.engine().rule(rule).unwrap().action, AclAction::Drop);
//! ```

pub mod api;
pub mod capability;
pub mod classify;
pub mod config;
pub mod error;
pub mod qualifier;
pub mod rule;
pub mod scenario;
pub mod xform;

pub use api::AclApi;
pub use capability::{Capability, CapabilityTable, TableShape};
pub use classify::classify;
pub use config::{AclConfig, ConfigError, EmptyMatchPolicy, DEFAULT_EMPTY_MATCH_POLICY};
pub use error::{AclError, Result, SaiStatus};
pub use qualifier::{AclEntryAttr, AclFieldData, AclPacketAction, AclQualifier, AclValue};
pub use rule::{assemble, AssembledRule, ReferenceTracker};
pub use scenario::{run, Scenario, ScenarioError, ScenarioReport};
pub use xform::transform;
