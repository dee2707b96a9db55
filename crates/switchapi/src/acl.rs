//! Native ACL model of the switch API engine.
//!
//! Every ACL list in the engine has a type (IP, IPv6 or MAC) and each type
//! has its own field namespace. A rule is a list of key/value pairs over the
//! fields of its list's type, one action, and the action's parameters.

use serde::Serialize;
use std::fmt;

use crate::handle::ObjectHandle;

/// Engine ACL list type (`switch_acl_type_t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AclType {
    Ip,
    Ipv6,
    Mac,
}

impl fmt::Display for AclType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ip => write!(f, "IP"),
            Self::Ipv6 => write!(f, "IPV6"),
            Self::Mac => write!(f, "MAC"),
        }
    }
}

/// Fields of an IP (IPv4) ACL list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IpField {
    Ipv4Src,
    Ipv4Dest,
    IpProto,
    L4SourcePort,
    L4DestPort,
    IcmpType,
    IcmpCode,
    TcpFlags,
    Ttl,
    EthType,
    Dscp,
    IpFlags,
    Tos,
    IpFragment,
}

/// Fields of an IPv6 ACL list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Ipv6Field {
    Ipv6Src,
    Ipv6Dest,
    IpProto,
    L4SourcePort,
    L4DestPort,
    IcmpType,
    IcmpCode,
    TcpFlags,
    Ttl,
    EthType,
    Tos,
    FlowLabel,
}

/// Fields of a MAC ACL list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MacField {
    EthType,
    SourceMac,
    DestMac,
    VlanPri,
    VlanCfi,
}

/// A native field id, tagged with the list type that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "field", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NativeField {
    Ip(IpField),
    Ipv6(Ipv6Field),
    Mac(MacField),
}

impl NativeField {
    /// Returns the list type this field belongs to.
    pub const fn acl_type(&self) -> AclType {
        match self {
            Self::Ip(_) => AclType::Ip,
            Self::Ipv6(_) => AclType::Ipv6,
            Self::Mac(_) => AclType::Mac,
        }
    }
}

impl fmt::Display for NativeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ip(field) => write!(f, "IP:{:?}", field),
            Self::Ipv6(field) => write!(f, "IPV6:{:?}", field),
            Self::Mac(field) => write!(f, "MAC:{:?}", field),
        }
    }
}

/// Value or mask of one key, at the field's native width.
///
/// IPv4 addresses are host-order integers; IPv6 and MAC addresses are byte
/// arrays in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    U8(u8),
    U16(u16),
    U32(u32),
    Mac([u8; 6]),
    Ipv6([u8; 16]),
}

/// One key of a rule: native field, value and mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct KeyValuePair {
    pub field: NativeField,
    pub value: FieldValue,
    pub mask: FieldValue,
}

impl KeyValuePair {
    /// Creates a key/value pair.
    pub fn new(field: NativeField, value: FieldValue, mask: FieldValue) -> Self {
        Self { field, value, mask }
    }
}

/// Engine ACL action (`switch_acl_action_t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AclAction {
    #[default]
    Nop,
    Drop,
    Permit,
    Redirect,
    RedirectToCpu,
    CopyToCpu,
    FloodToVlan,
}

impl fmt::Display for AclAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nop => write!(f, "NOP"),
            Self::Drop => write!(f, "DROP"),
            Self::Permit => write!(f, "PERMIT"),
            Self::Redirect => write!(f, "REDIRECT"),
            Self::RedirectToCpu => write!(f, "REDIRECT_TO_CPU"),
            Self::CopyToCpu => write!(f, "COPY_TO_CPU"),
            Self::FloodToVlan => write!(f, "FLOOD_TO_VLAN"),
        }
    }
}

/// Parameters accompanying an [`AclAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AclActionParams {
    /// Redirect target for [`AclAction::Redirect`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<ObjectHandle>,
}

impl AclActionParams {
    /// Parameters for a redirect to `handle`.
    pub fn redirect(handle: ObjectHandle) -> Self {
        Self {
            redirect: Some(handle),
        }
    }
}
