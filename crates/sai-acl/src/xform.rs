//! Field value transformation.
//!
//! Converts a generic value/mask pair into the key/value pair the engine
//! expects for a native field: scalars are narrowed to the field width,
//! IPv4 addresses move from network to host byte order, and IPv6 and MAC
//! addresses are copied byte for byte.

use log::debug;
use switchapi::{FieldValue, IpField, Ipv6Field, KeyValuePair, MacField, NativeField};

use crate::capability::TableShape;
use crate::error::{AclError, Result};
use crate::qualifier::AclFieldData;

/// Converts a network-order IPv4 value to host order.
pub fn ipv4_to_host(network: u32) -> u32 {
    u32::from_be(network)
}

/// Converts a host-order IPv4 value to network order.
pub fn ipv4_to_network(host: u32) -> u32 {
    host.to_be()
}

/// Builds the key/value pair for `field` on a table of `shape`.
///
/// Returns `Ok(None)` when the field does not belong to the shape; such
/// fields are skipped.
pub fn transform(
    shape: TableShape,
    field: NativeField,
    data: &AclFieldData,
) -> Result<Option<KeyValuePair>> {
    let kvp = match (shape, field) {
        (TableShape::Ipv4, NativeField::Ip(f)) => transform_ip(f, data)?,
        (TableShape::Ipv6, NativeField::Ipv6(f)) => transform_ipv6(f, data)?,
        (TableShape::Mac, NativeField::Mac(f)) => transform_mac(f, data)?,
        _ => {
            debug!("Skipping field {} on {} table", field, shape);
            return Ok(None);
        }
    };
    Ok(Some(kvp))
}

fn transform_ip(field: IpField, data: &AclFieldData) -> Result<KeyValuePair> {
    let native = NativeField::Ip(field);
    let (value, mask) = match field {
        IpField::Ipv4Src | IpField::Ipv4Dest => {
            let (value, mask) = read_ip4(native, data)?;
            (
                FieldValue::U32(ipv4_to_host(value)),
                FieldValue::U32(ipv4_to_host(mask)),
            )
        }
        IpField::IpProto | IpField::L4SourcePort | IpField::L4DestPort | IpField::EthType => {
            read_u16(native, data)?
        }
        // ICMP type/code and TCP flags use TTL's 8-bit value slot. Each still
        // emits its own key; only the low byte of the SAI value is kept.
        IpField::IcmpType | IpField::IcmpCode | IpField::TcpFlags | IpField::Ttl => {
            read_u8(native, data)?
        }
        IpField::Dscp | IpField::IpFlags | IpField::Tos | IpField::IpFragment => {
            read_u8(native, data)?
        }
    };
    Ok(KeyValuePair::new(native, value, mask))
}

fn transform_ipv6(field: Ipv6Field, data: &AclFieldData) -> Result<KeyValuePair> {
    let native = NativeField::Ipv6(field);
    let (value, mask) = match field {
        Ipv6Field::Ipv6Src | Ipv6Field::Ipv6Dest => {
            let value = data
                .data
                .as_ip6()
                .ok_or_else(|| AclError::invalid_native_data(native, "IPv6 address"))?;
            let mask = data
                .mask
                .as_ip6()
                .ok_or_else(|| AclError::invalid_native_data(native, "IPv6 mask"))?;
            (FieldValue::Ipv6(value), FieldValue::Ipv6(mask))
        }
        Ipv6Field::IpProto
        | Ipv6Field::L4SourcePort
        | Ipv6Field::L4DestPort
        | Ipv6Field::EthType => read_u16(native, data)?,
        // 8-bit slot shared with TTL, as on IPv4 tables.
        Ipv6Field::IcmpType | Ipv6Field::IcmpCode | Ipv6Field::TcpFlags | Ipv6Field::Ttl => {
            read_u8(native, data)?
        }
        Ipv6Field::Tos => read_u8(native, data)?,
        Ipv6Field::FlowLabel => {
            let value = data
                .data
                .as_u32()
                .ok_or_else(|| AclError::invalid_native_data(native, "32-bit value"))?;
            let mask = data
                .mask
                .as_u32()
                .ok_or_else(|| AclError::invalid_native_data(native, "32-bit mask"))?;
            (FieldValue::U32(value), FieldValue::U32(mask))
        }
    };
    Ok(KeyValuePair::new(native, value, mask))
}

fn transform_mac(field: MacField, data: &AclFieldData) -> Result<KeyValuePair> {
    let native = NativeField::Mac(field);
    let (value, mask) = match field {
        MacField::SourceMac | MacField::DestMac => {
            let value = data
                .data
                .as_mac()
                .ok_or_else(|| AclError::invalid_native_data(native, "MAC address"))?;
            let mask = data
                .mask
                .as_mac()
                .ok_or_else(|| AclError::invalid_native_data(native, "MAC mask"))?;
            (FieldValue::Mac(value), FieldValue::Mac(mask))
        }
        MacField::EthType => read_u16(native, data)?,
        // The engine keys VLAN priority and CFI as 8-bit values under a
        // 16-bit mask.
        MacField::VlanPri | MacField::VlanCfi => {
            let (value, mask) = read_u8(native, data)?;
            let mask = match mask {
                FieldValue::U8(m) => FieldValue::U16(u16::from(m)),
                other => other,
            };
            (value, mask)
        }
    };
    Ok(KeyValuePair::new(native, value, mask))
}

fn read_ip4(native: NativeField, data: &AclFieldData) -> Result<(u32, u32)> {
    let value = data
        .data
        .as_ip4()
        .ok_or_else(|| AclError::invalid_native_data(native, "IPv4 address"))?;
    let mask = data
        .mask
        .as_ip4()
        .ok_or_else(|| AclError::invalid_native_data(native, "IPv4 mask"))?;
    Ok((value, mask))
}

fn read_u8(native: NativeField, data: &AclFieldData) -> Result<(FieldValue, FieldValue)> {
    let value = data
        .data
        .as_u8()
        .ok_or_else(|| AclError::invalid_native_data(native, "8-bit value"))?;
    let mask = data
        .mask
        .as_u8()
        .ok_or_else(|| AclError::invalid_native_data(native, "8-bit mask"))?;
    Ok((FieldValue::U8(value), FieldValue::U8(mask)))
}

fn read_u16(native: NativeField, data: &AclFieldData) -> Result<(FieldValue, FieldValue)> {
    let value = data
        .data
        .as_u16()
        .ok_or_else(|| AclError::invalid_native_data(native, "16-bit value"))?;
    let mask = data
        .mask
        .as_u16()
        .ok_or_else(|| AclError::invalid_native_data(native, "16-bit mask"))?;
    Ok((FieldValue::U16(value), FieldValue::U16(mask)))
}
