//! Qualifier capability tables.
//!
//! Each engine table type (shape) supports a fixed subset of the generic
//! qualifier slots. The tables below say, per slot, whether the shape
//! rejects it, treats it as a port/VLAN binding, or maps it to one of its
//! native key fields.

use serde::Serialize;
use std::fmt;

use switchapi::{AclType, IpField, Ipv6Field, MacField, NativeField};

use crate::qualifier::AclQualifier;

/// What a shape does with one qualifier slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Unsupported,
    PortOrVlanReference,
    Native(NativeField),
}

/// Capability per qualifier slot, indexed by [`AclQualifier::index`].
pub type CapabilityTable = [Capability; AclQualifier::COUNT];

/// Table shapes supported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableShape {
    Ipv4,
    Ipv6,
    Mac,
}

impl TableShape {
    /// Classification order: the first shape that fits wins.
    pub const PRIORITY_ORDER: [TableShape; 3] =
        [TableShape::Ipv4, TableShape::Ipv6, TableShape::Mac];

    pub const fn capabilities(self) -> &'static CapabilityTable {
        match self {
            TableShape::Ipv4 => &IPV4_CAPABILITIES,
            TableShape::Ipv6 => &IPV6_CAPABILITIES,
            TableShape::Mac => &MAC_CAPABILITIES,
        }
    }

    /// Looks up the capability of one slot.
    pub const fn capability(self, qualifier: AclQualifier) -> Capability {
        self.capabilities()[qualifier.index()]
    }

    /// Returns the engine table type backing this shape.
    pub const fn acl_type(self) -> AclType {
        match self {
            TableShape::Ipv4 => AclType::Ip,
            TableShape::Ipv6 => AclType::Ipv6,
            TableShape::Mac => AclType::Mac,
        }
    }

    pub const fn from_acl_type(acl_type: AclType) -> Self {
        match acl_type {
            AclType::Ip => TableShape::Ipv4,
            AclType::Ipv6 => TableShape::Ipv6,
            AclType::Mac => TableShape::Mac,
        }
    }
}

impl fmt::Display for TableShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableShape::Ipv4 => write!(f, "IPV4"),
            TableShape::Ipv6 => write!(f, "IPV6"),
            TableShape::Mac => write!(f, "MAC"),
        }
    }
}

const NO: Capability = Capability::Unsupported;
const REF: Capability = Capability::PortOrVlanReference;

const fn ip(field: IpField) -> Capability {
    Capability::Native(NativeField::Ip(field))
}

const fn ipv6(field: Ipv6Field) -> Capability {
    Capability::Native(NativeField::Ipv6(field))
}

const fn mac(field: MacField) -> Capability {
    Capability::Native(NativeField::Mac(field))
}

#[rustfmt::skip]
const IPV4_CAPABILITIES: CapabilityTable = [
    NO,                         // SRC_IPV6
    NO,                         // DST_IPV6
    NO,                         // SRC_MAC
    NO,                         // DST_MAC
    ip(IpField::Ipv4Src),       // SRC_IP
    ip(IpField::Ipv4Dest),      // DST_IP
    REF,                        // IN_PORTS
    REF,                        // OUT_PORTS
    REF,                        // IN_PORT
    REF,                        // OUT_PORT
    REF,                        // OUTER_VLAN_ID
    NO,                         // OUTER_VLAN_PRI
    NO,                         // OUTER_VLAN_CFI
    REF,                        // INNER_VLAN_ID
    NO,                         // INNER_VLAN_PRI
    NO,                         // INNER_VLAN_CFI
    ip(IpField::L4SourcePort),  // L4_SRC_PORT
    ip(IpField::L4DestPort),    // L4_DST_PORT
    ip(IpField::EthType),       // ETHER_TYPE
    ip(IpField::IpProto),       // IP_PROTOCOL
    ip(IpField::Dscp),          // DSCP
    NO,                         // ECN
    ip(IpField::Ttl),           // TTL
    ip(IpField::Tos),           // TOS
    ip(IpField::IpFlags),       // IP_FLAGS
    ip(IpField::TcpFlags),      // TCP_FLAGS
    NO,                         // IP_TYPE
    NO,                         // IP_FRAG
    NO,                         // IPV6_FLOW_LABEL
    NO,                         // TC
];

#[rustfmt::skip]
const IPV6_CAPABILITIES: CapabilityTable = [
    ipv6(Ipv6Field::Ipv6Src),       // SRC_IPV6
    ipv6(Ipv6Field::Ipv6Dest),      // DST_IPV6
    NO,                             // SRC_MAC
    NO,                             // DST_MAC
    NO,                             // SRC_IP
    NO,                             // DST_IP
    REF,                            // IN_PORTS
    REF,                            // OUT_PORTS
    REF,                            // IN_PORT
    REF,                            // OUT_PORT
    REF,                            // OUTER_VLAN_ID
    NO,                             // OUTER_VLAN_PRI
    NO,                             // OUTER_VLAN_CFI
    REF,                            // INNER_VLAN_ID
    NO,                             // INNER_VLAN_PRI
    NO,                             // INNER_VLAN_CFI
    ipv6(Ipv6Field::L4SourcePort),  // L4_SRC_PORT
    ipv6(Ipv6Field::L4DestPort),    // L4_DST_PORT
    ipv6(Ipv6Field::EthType),       // ETHER_TYPE
    ipv6(Ipv6Field::IpProto),       // IP_PROTOCOL
    NO,                             // DSCP
    NO,                             // ECN
    ipv6(Ipv6Field::Ttl),           // TTL
    ipv6(Ipv6Field::Tos),           // TOS
    NO,                             // IP_FLAGS
    ipv6(Ipv6Field::TcpFlags),      // TCP_FLAGS
    NO,                             // IP_TYPE
    NO,                             // IP_FRAG
    ipv6(Ipv6Field::FlowLabel),     // IPV6_FLOW_LABEL
    NO,                             // TC
];

#[rustfmt::skip]
const MAC_CAPABILITIES: CapabilityTable = [
    NO,                         // SRC_IPV6
    NO,                         // DST_IPV6
    mac(MacField::SourceMac),   // SRC_MAC
    mac(MacField::DestMac),     // DST_MAC
    NO,                         // SRC_IP
    NO,                         // DST_IP
    REF,                        // IN_PORTS
    REF,                        // OUT_PORTS
    REF,                        // IN_PORT
    REF,                        // OUT_PORT
    REF,                        // OUTER_VLAN_ID
    mac(MacField::VlanPri),     // OUTER_VLAN_PRI
    mac(MacField::VlanCfi),     // OUTER_VLAN_CFI
    REF,                        // INNER_VLAN_ID
    NO,                         // INNER_VLAN_PRI
    NO,                         // INNER_VLAN_CFI
    NO,                         // L4_SRC_PORT
    NO,                         // L4_DST_PORT
    mac(MacField::EthType),     // ETHER_TYPE
    NO,                         // IP_PROTOCOL
    NO,                         // DSCP
    NO,                         // ECN
    NO,                         // TTL
    NO,                         // TOS
    NO,                         // IP_FLAGS
    NO,                         // TCP_FLAGS
    NO,                         // IP_TYPE
    NO,                         // IP_FRAG
    NO,                         // IPV6_FLOW_LABEL
    NO,                         // TC
];
