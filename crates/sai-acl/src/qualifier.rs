//! SAI-side ACL attribute model.
//!
//! Callers describe tables by a set of [`AclQualifier`] slots and rules by a
//! list of [`AclEntryAttr`]s. Field attributes carry an [`AclFieldData`]
//! (value plus mask), mirroring `sai_acl_field_data_t`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use switchapi::{ObjectHandle, RawHandle};

/// Generic ACL qualifier slot.
///
/// The discriminant is the slot index; the order matches the SAI table
/// field attribute range and must not change, because every capability
/// table is indexed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
#[repr(usize)]
pub enum AclQualifier {
    SrcIpv6,
    DstIpv6,
    SrcMac,
    DstMac,
    SrcIp,
    DstIp,
    InPorts,
    OutPorts,
    InPort,
    OutPort,
    OuterVlanId,
    OuterVlanPri,
    OuterVlanCfi,
    InnerVlanId,
    InnerVlanPri,
    InnerVlanCfi,
    L4SrcPort,
    L4DstPort,
    EtherType,
    IpProtocol,
    Dscp,
    Ecn,
    Ttl,
    Tos,
    IpFlags,
    TcpFlags,
    IpType,
    IpFrag,
    Ipv6FlowLabel,
    Tc,
}

impl AclQualifier {
    /// Number of qualifier slots.
    pub const COUNT: usize = 30;

    /// All slots in index order.
    pub const ALL: [AclQualifier; Self::COUNT] = [
        Self::SrcIpv6,
        Self::DstIpv6,
        Self::SrcMac,
        Self::DstMac,
        Self::SrcIp,
        Self::DstIp,
        Self::InPorts,
        Self::OutPorts,
        Self::InPort,
        Self::OutPort,
        Self::OuterVlanId,
        Self::OuterVlanPri,
        Self::OuterVlanCfi,
        Self::InnerVlanId,
        Self::InnerVlanPri,
        Self::InnerVlanCfi,
        Self::L4SrcPort,
        Self::L4DstPort,
        Self::EtherType,
        Self::IpProtocol,
        Self::Dscp,
        Self::Ecn,
        Self::Ttl,
        Self::Tos,
        Self::IpFlags,
        Self::TcpFlags,
        Self::IpType,
        Self::IpFrag,
        Self::Ipv6FlowLabel,
        Self::Tc,
    ];

    /// Returns the slot index.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns true for port and VLAN slots, which bind the table to an
    /// object instead of producing a key.
    pub const fn is_reference(self) -> bool {
        matches!(
            self,
            Self::InPorts
                | Self::OutPorts
                | Self::InPort
                | Self::OutPort
                | Self::OuterVlanId
                | Self::InnerVlanId
        )
    }

    /// Returns the SAI-style name of the slot.
    pub const fn name(self) -> &'static str {
        match self {
            Self::SrcIpv6 => "SRC_IPV6",
            Self::DstIpv6 => "DST_IPV6",
            Self::SrcMac => "SRC_MAC",
            Self::DstMac => "DST_MAC",
            Self::SrcIp => "SRC_IP",
            Self::DstIp => "DST_IP",
            Self::InPorts => "IN_PORTS",
            Self::OutPorts => "OUT_PORTS",
            Self::InPort => "IN_PORT",
            Self::OutPort => "OUT_PORT",
            Self::OuterVlanId => "OUTER_VLAN_ID",
            Self::OuterVlanPri => "OUTER_VLAN_PRI",
            Self::OuterVlanCfi => "OUTER_VLAN_CFI",
            Self::InnerVlanId => "INNER_VLAN_ID",
            Self::InnerVlanPri => "INNER_VLAN_PRI",
            Self::InnerVlanCfi => "INNER_VLAN_CFI",
            Self::L4SrcPort => "L4_SRC_PORT",
            Self::L4DstPort => "L4_DST_PORT",
            Self::EtherType => "ETHER_TYPE",
            Self::IpProtocol => "IP_PROTOCOL",
            Self::Dscp => "DSCP",
            Self::Ecn => "ECN",
            Self::Ttl => "TTL",
            Self::Tos => "TOS",
            Self::IpFlags => "IP_FLAGS",
            Self::TcpFlags => "TCP_FLAGS",
            Self::IpType => "IP_TYPE",
            Self::IpFrag => "IP_FRAG",
            Self::Ipv6FlowLabel => "IPV6_FLOW_LABEL",
            Self::Tc => "TC",
        }
    }
}

impl fmt::Display for AclQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for AclQualifier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|q| q.name() == upper)
            .ok_or_else(|| format!("Unknown ACL qualifier: {}", s))
    }
}

impl TryFrom<String> for AclQualifier {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<AclQualifier> for String {
    fn from(q: AclQualifier) -> String {
        q.name().to_string()
    }
}

/// One side (value or mask) of a field attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AclValue {
    U8(u8),
    U16(u16),
    U32(u32),
    /// IPv4 address in network byte order, as SAI carries it.
    Ip4(u32),
    Ip6([u8; 16]),
    Mac([u8; 6]),
    Oid(RawHandle),
    ObjList(Vec<RawHandle>),
}

impl AclValue {
    /// Builds a network-order IPv4 value from an address.
    pub fn ipv4(addr: Ipv4Addr) -> Self {
        Self::Ip4(u32::from_ne_bytes(addr.octets()))
    }

    /// Builds an IPv6 value from an address.
    pub fn ipv6(addr: Ipv6Addr) -> Self {
        Self::Ip6(addr.octets())
    }

    /// Reads a scalar at 8-bit width, truncating wider scalars.
    pub fn as_u8(&self) -> Option<u8> {
        self.as_u32().map(|v| v as u8)
    }

    /// Reads a scalar at 16-bit width, truncating wider scalars.
    pub fn as_u16(&self) -> Option<u16> {
        self.as_u32().map(|v| v as u16)
    }

    /// Reads a scalar at 32-bit width.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::U8(v) => Some(u32::from(*v)),
            Self::U16(v) => Some(u32::from(*v)),
            Self::U32(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the raw network-order IPv4 value.
    pub fn as_ip4(&self) -> Option<u32> {
        match self {
            Self::Ip4(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_ip6(&self) -> Option<[u8; 16]> {
        match self {
            Self::Ip6(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_mac(&self) -> Option<[u8; 6]> {
        match self {
            Self::Mac(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_oid(&self) -> Option<RawHandle> {
        match self {
            Self::Oid(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_obj_list(&self) -> Option<&[RawHandle]> {
        match self {
            Self::ObjList(v) => Some(v),
            _ => None,
        }
    }
}

/// Value and mask of one field attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclFieldData {
    pub data: AclValue,
    pub mask: AclValue,
}

impl AclFieldData {
    /// Creates field data from a value and a mask.
    pub fn new(data: AclValue, mask: AclValue) -> Self {
        Self { data, mask }
    }

    /// IPv4 address with an explicit mask.
    pub fn ipv4(addr: Ipv4Addr, mask: Ipv4Addr) -> Self {
        Self::new(AclValue::ipv4(addr), AclValue::ipv4(mask))
    }

    /// IPv4 prefix, e.g. `10.0.0.0/8`. Lengths above 32 are clamped.
    pub fn ipv4_prefix(addr: Ipv4Addr, prefix_len: u8) -> Self {
        let bits = u32::from(prefix_len.min(32));
        let mask = u32::MAX.checked_shl(32 - bits).unwrap_or(0);
        Self::ipv4(addr, Ipv4Addr::from(mask))
    }

    /// IPv6 address with an explicit mask.
    pub fn ipv6(addr: Ipv6Addr, mask: Ipv6Addr) -> Self {
        Self::new(AclValue::ipv6(addr), AclValue::ipv6(mask))
    }

    /// MAC address with an explicit mask.
    pub fn mac(addr: [u8; 6], mask: [u8; 6]) -> Self {
        Self::new(AclValue::Mac(addr), AclValue::Mac(mask))
    }

    /// Exact match on an 8-bit field.
    pub fn exact_u8(value: u8) -> Self {
        Self::new(AclValue::U8(value), AclValue::U8(u8::MAX))
    }

    /// Exact match on a 16-bit field.
    pub fn exact_u16(value: u16) -> Self {
        Self::new(AclValue::U16(value), AclValue::U16(u16::MAX))
    }

    /// Single object reference (IN_PORT, OUTER_VLAN_ID).
    pub fn object(handle: ObjectHandle) -> Self {
        Self::new(AclValue::Oid(handle), AclValue::Oid(0))
    }

    /// Object list reference (IN_PORTS).
    pub fn objects(handles: Vec<ObjectHandle>) -> Self {
        Self::new(AclValue::ObjList(handles), AclValue::ObjList(Vec::new()))
    }
}

/// SAI packet action values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AclPacketAction {
    Forward,
    Drop,
    Copy,
    Trap,
    Log,
    Deny,
}

impl fmt::Display for AclPacketAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => write!(f, "FORWARD"),
            Self::Drop => write!(f, "DROP"),
            Self::Copy => write!(f, "COPY"),
            Self::Trap => write!(f, "TRAP"),
            Self::Log => write!(f, "LOG"),
            Self::Deny => write!(f, "DENY"),
        }
    }
}

impl FromStr for AclPacketAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "FORWARD" => Ok(Self::Forward),
            "DROP" => Ok(Self::Drop),
            "COPY" => Ok(Self::Copy),
            "TRAP" => Ok(Self::Trap),
            "LOG" => Ok(Self::Log),
            "DENY" => Ok(Self::Deny),
            _ => Err(format!("Unknown packet action: {}", s)),
        }
    }
}

impl TryFrom<String> for AclPacketAction {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<AclPacketAction> for String {
    fn from(action: AclPacketAction) -> String {
        action.to_string()
    }
}

/// One attribute of an ACL entry (rule).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AclEntryAttr {
    /// Table the rule belongs to.
    TableId(RawHandle),
    /// Rule priority.
    Priority(u32),
    /// Match field or port/VLAN reference.
    Field(AclQualifier, AclFieldData),
    /// Packet action.
    PacketAction(AclPacketAction),
    /// Redirect to a port, LAG or next hop.
    Redirect(ObjectHandle),
    /// Flood within the ingress VLAN.
    Flood,
}

impl AclEntryAttr {
    /// Shorthand for a field attribute.
    pub fn field(qualifier: AclQualifier, data: AclFieldData) -> Self {
        Self::Field(qualifier, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_slot_index_matches_order() {
        for (i, q) in AclQualifier::ALL.iter().enumerate() {
            assert_eq!(q.index(), i);
        }
        assert_eq!(AclQualifier::Tc.index(), AclQualifier::COUNT - 1);
    }

    #[test]
    fn test_qualifier_parse() {
        assert_eq!(
            "L4_SRC_PORT".parse::<AclQualifier>().unwrap(),
            AclQualifier::L4SrcPort
        );
        assert_eq!(
            "dst_ipv6".parse::<AclQualifier>().unwrap(),
            AclQualifier::DstIpv6
        );
        assert!("NOT_A_FIELD".parse::<AclQualifier>().is_err());
    }

    #[test]
    fn test_reference_slots() {
        let refs: Vec<_> = AclQualifier::ALL
            .iter()
            .copied()
            .filter(|q| q.is_reference())
            .collect();
        assert_eq!(
            refs,
            vec![
                AclQualifier::InPorts,
                AclQualifier::OutPorts,
                AclQualifier::InPort,
                AclQualifier::OutPort,
                AclQualifier::OuterVlanId,
                AclQualifier::InnerVlanId,
            ]
        );
    }

    #[test]
    fn test_scalar_width() {
        let v = AclValue::U32(0x1234_5678);
        assert_eq!(v.as_u16(), Some(0x5678));
        assert_eq!(v.as_u8(), Some(0x78));
        assert_eq!(AclValue::Mac([0; 6]).as_u8(), None);
    }

    #[test]
    fn test_ipv4_prefix_mask() {
        let data = AclFieldData::ipv4_prefix(Ipv4Addr::new(10, 0, 0, 0), 8);
        assert_eq!(data.mask, AclValue::ipv4(Ipv4Addr::new(255, 0, 0, 0)));

        let any = AclFieldData::ipv4_prefix(Ipv4Addr::UNSPECIFIED, 0);
        assert_eq!(any.mask, AclValue::Ip4(0));
    }

    #[test]
    fn test_packet_action_parse() {
        assert_eq!(
            "drop".parse::<AclPacketAction>().unwrap(),
            AclPacketAction::Drop
        );
        assert!("EXPLODE".parse::<AclPacketAction>().is_err());
    }
}
