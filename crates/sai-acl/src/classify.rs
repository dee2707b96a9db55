//! Table shape inference.

use log::debug;

use crate::capability::{Capability, TableShape};
use crate::error::{AclError, Result};
use crate::qualifier::AclQualifier;

/// Returns true if `shape` can hold every qualifier in `qualifiers`.
///
/// Port and VLAN references bind the table instead of keying it, so they
/// never disqualify a shape.
pub fn shape_supports(shape: TableShape, qualifiers: &[AclQualifier]) -> bool {
    qualifiers.iter().all(|&q| match shape.capability(q) {
        Capability::Native(_) | Capability::PortOrVlanReference => true,
        Capability::Unsupported => false,
    })
}

/// Picks the first shape, in [`TableShape::PRIORITY_ORDER`], that supports
/// all requested qualifiers.
pub fn classify(qualifiers: &[AclQualifier]) -> Result<TableShape> {
    let shape = TableShape::PRIORITY_ORDER
        .into_iter()
        .find(|&shape| shape_supports(shape, qualifiers))
        .ok_or_else(|| AclError::NoMatchingShape {
            qualifiers: qualifiers.to_vec(),
        })?;

    debug!("Classified qualifiers {:?} as {} table", qualifiers, shape);
    Ok(shape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use AclQualifier::*;

    #[test]
    fn test_l4_and_source_ip_is_ipv4() {
        assert_eq!(
            classify(&[L4SrcPort, L4DstPort, SrcIp]).unwrap(),
            TableShape::Ipv4
        );
    }

    #[test]
    fn test_ipv6_source_with_ttl_is_ipv6() {
        assert_eq!(classify(&[SrcIpv6, Ttl]).unwrap(), TableShape::Ipv6);
    }

    #[test]
    fn test_mac_fields_are_mac() {
        assert_eq!(
            classify(&[SrcMac, EtherType, OuterVlanPri]).unwrap(),
            TableShape::Mac
        );
    }

    #[test]
    fn test_shared_fields_prefer_ipv4() {
        assert_eq!(classify(&[EtherType]).unwrap(), TableShape::Ipv4);
        assert_eq!(classify(&[Ttl, TcpFlags]).unwrap(), TableShape::Ipv4);
    }

    #[test]
    fn test_mixed_families_fail() {
        let err = classify(&[SrcIp, DstIpv6]).unwrap_err();
        assert_eq!(
            err,
            AclError::NoMatchingShape {
                qualifiers: vec![SrcIp, DstIpv6]
            }
        );
        assert!(classify(&[SrcIpv6, SrcMac]).is_err());
        assert!(classify(&[Ecn]).is_err());
    }

    #[test]
    fn test_references_do_not_change_outcome() {
        let refs = [InPorts, OutPorts, InPort, OutPort, OuterVlanId, InnerVlanId];
        let bases: [&[AclQualifier]; 4] = [
            &[SrcIp, L4DstPort],
            &[DstIpv6],
            &[DstMac],
            &[SrcIp, SrcMac],
        ];

        for base in bases {
            let mut with_refs = base.to_vec();
            with_refs.extend_from_slice(&refs);
            assert_eq!(
                classify(base).ok(),
                classify(&with_refs).ok(),
                "{:?}",
                base
            );
        }
    }

    #[test]
    fn test_empty_set_is_ipv4() {
        assert_eq!(classify(&[]).unwrap(), TableShape::Ipv4);
        assert_eq!(classify(&[InPorts]).unwrap(), TableShape::Ipv4);
    }
}
