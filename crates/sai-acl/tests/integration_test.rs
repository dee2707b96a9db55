//! Integration tests for the ACL translation layer against switch engines.
//!
//! `RecordingSwitch` wraps the in-memory engine and logs every call, so the
//! tests can check both what was installed and the order of engine calls.

use pretty_assertions::assert_eq;
use sai_acl::scenario::{self, Scenario};
use sai_acl::{
    AclApi, AclConfig, AclEntryAttr, AclError, AclFieldData, AclPacketAction, AclQualifier,
    EmptyMatchPolicy, TableShape,
};
use std::io::Write;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};
use switchapi::{
    AclAction, AclActionParams, AclRuleHandle, AclTableHandle, AclType, FieldValue, IpField,
    KeyValuePair, MemorySwitch, NativeField, ObjectHandle, SwitchAclApi, SwitchOp, SwitchResult,
    SwitchStatus,
};
use tempfile::NamedTempFile;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    CreateTable(AclType),
    DeleteTable,
    TableType,
    CreateRule { keys: usize, action: AclAction },
    DeleteRule,
    Bind(ObjectHandle),
}

/// Engine that records calls before forwarding them to a `MemorySwitch`.
#[derive(Default)]
struct RecordingSwitch {
    inner: MemorySwitch,
    calls: Mutex<Vec<Call>>,
}

impl RecordingSwitch {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl SwitchAclApi for RecordingSwitch {
    fn create_table(&self, acl_type: AclType) -> SwitchResult<AclTableHandle> {
        self.record(Call::CreateTable(acl_type));
        self.inner.create_table(acl_type)
    }

    fn delete_table(&self, table: AclTableHandle) -> SwitchResult<()> {
        self.record(Call::DeleteTable);
        self.inner.delete_table(table)
    }

    fn table_type(&self, table: AclTableHandle) -> SwitchResult<AclType> {
        self.record(Call::TableType);
        self.inner.table_type(table)
    }

    fn create_rule(
        &self,
        table: AclTableHandle,
        priority: u32,
        keys: &[KeyValuePair],
        action: AclAction,
        params: &AclActionParams,
    ) -> SwitchResult<AclRuleHandle> {
        self.record(Call::CreateRule {
            keys: keys.len(),
            action,
        });
        self.inner.create_rule(table, priority, keys, action, params)
    }

    fn delete_rule(&self, rule: AclRuleHandle) -> SwitchResult<()> {
        self.record(Call::DeleteRule);
        self.inner.delete_rule(rule)
    }

    fn bind_reference(&self, table: AclTableHandle, object: ObjectHandle) -> SwitchResult<()> {
        self.record(Call::Bind(object));
        self.inner.bind_reference(table, object)
    }
}

fn recording_api(config: AclConfig) -> AclApi<RecordingSwitch> {
    AclApi::new(Arc::new(RecordingSwitch::default()), config)
}

fn dst_ip(addr: Ipv4Addr, prefix_len: u8) -> AclEntryAttr {
    AclEntryAttr::field(AclQualifier::DstIp, AclFieldData::ipv4_prefix(addr, prefix_len))
}

#[test]
fn test_drop_rule_end_to_end() {
    let api = recording_api(AclConfig::default());
    let table = api
        .create_acl_table(&[
            AclQualifier::L4SrcPort,
            AclQualifier::L4DstPort,
            AclQualifier::SrcIp,
            AclQualifier::DstIp,
        ])
        .unwrap();
    assert_eq!(api.table_shape(table).unwrap(), TableShape::Ipv4);

    let rule = api
        .create_acl_rule(&[
            AclEntryAttr::TableId(table.as_raw()),
            AclEntryAttr::Priority(10),
            dst_ip(Ipv4Addr::new(10, 0, 0, 1), 32),
            AclEntryAttr::PacketAction(AclPacketAction::Drop),
        ])
        .unwrap();

    let installed = api.engine().inner.rule(rule).unwrap();
    assert_eq!(installed.table, table);
    assert_eq!(installed.priority, 10);
    assert_eq!(
        installed.keys,
        vec![KeyValuePair::new(
            NativeField::Ip(IpField::Ipv4Dest),
            FieldValue::U32(0x0A00_0001),
            FieldValue::U32(0xFFFF_FFFF),
        )]
    );
    assert_eq!(installed.action, AclAction::Drop);
    assert!(api.engine().inner.references(table).is_empty());
}

#[test]
fn test_bindings_follow_rule_creation_most_recent_first() {
    let api = recording_api(AclConfig::default());
    let table = api
        .create_acl_table(&[AclQualifier::DstIp, AclQualifier::InPorts, AclQualifier::OuterVlanId])
        .unwrap();

    api.create_acl_rule(&[
        AclEntryAttr::TableId(table.as_raw()),
        AclEntryAttr::field(AclQualifier::InPorts, AclFieldData::objects(vec![0x101, 0x102])),
        dst_ip(Ipv4Addr::new(192, 168, 0, 0), 16),
        AclEntryAttr::field(AclQualifier::OuterVlanId, AclFieldData::object(0x264)),
        AclEntryAttr::Redirect(0x505),
    ])
    .unwrap();

    assert_eq!(
        api.engine().calls(),
        vec![
            Call::CreateTable(AclType::Ip),
            Call::TableType,
            Call::CreateRule {
                keys: 1,
                action: AclAction::Redirect
            },
            Call::Bind(0x264),
            Call::Bind(0x102),
            Call::Bind(0x101),
        ]
    );
    assert_eq!(
        api.engine().inner.references(table),
        vec![0x264, 0x102, 0x101]
    );
}

#[test]
fn test_translation_errors_never_reach_rule_creation() {
    let api = recording_api(AclConfig::default());
    let table = api.create_acl_table(&[AclQualifier::SrcMac]).unwrap();
    assert_eq!(api.table_shape(table).unwrap(), TableShape::Mac);

    let failures = vec![
        // no table attribute
        vec![dst_ip(Ipv4Addr::LOCALHOST, 32)],
        // IPv4 field on a MAC table
        vec![
            AclEntryAttr::TableId(table.as_raw()),
            dst_ip(Ipv4Addr::LOCALHOST, 32),
        ],
        // egress port
        vec![
            AclEntryAttr::TableId(table.as_raw()),
            AclEntryAttr::field(AclQualifier::SrcMac, AclFieldData::mac([2; 6], [0xff; 6])),
            AclEntryAttr::field(AclQualifier::OutPort, AclFieldData::object(0x9)),
        ],
        // no match fields
        vec![
            AclEntryAttr::TableId(table.as_raw()),
            AclEntryAttr::PacketAction(AclPacketAction::Trap),
        ],
    ];

    for attrs in failures {
        assert!(api.create_acl_rule(&attrs).is_err(), "{:?}", attrs);
    }

    assert!(api
        .engine()
        .calls()
        .iter()
        .all(|c| !matches!(c, Call::CreateRule { .. } | Call::Bind(_))));
    assert_eq!(api.engine().inner.rule_count(), 0);
}

#[test]
fn test_wildcard_rule_with_policy() {
    let attrs = |table: AclTableHandle| {
        vec![
            AclEntryAttr::TableId(table.as_raw()),
            AclEntryAttr::field(AclQualifier::InPort, AclFieldData::object(0x44)),
            AclEntryAttr::Flood,
        ]
    };

    let strict = recording_api(AclConfig::default());
    let table = strict.create_acl_table(&[AclQualifier::InPort]).unwrap();
    assert_eq!(
        strict.create_acl_rule(&attrs(table)).unwrap_err(),
        AclError::NoMatchFields
    );

    let lenient =
        recording_api(AclConfig::default().with_empty_match_policy(EmptyMatchPolicy::AllowWildcard));
    let table = lenient.create_acl_table(&[AclQualifier::InPort]).unwrap();
    let rule = lenient.create_acl_rule(&attrs(table)).unwrap();

    let installed = lenient.engine().inner.rule(rule).unwrap();
    assert!(installed.keys.is_empty());
    assert_eq!(installed.action, AclAction::FloodToVlan);
    assert_eq!(lenient.engine().inner.references(table), vec![0x44]);
}

#[test]
fn test_engine_failure_is_reported() {
    let api = recording_api(AclConfig::default());
    api.engine()
        .inner
        .fail_next(SwitchOp::CreateTable, SwitchStatus::TableFull);

    let err = api.create_acl_table(&[AclQualifier::DstIpv6]).unwrap_err();
    assert_eq!(err.status().to_string(), "SAI_STATUS_TABLE_FULL");
    assert_eq!(api.engine().inner.table_count(), 0);
}

#[test]
fn test_table_with_rules_cannot_be_deleted() {
    let api = AclApi::new(Arc::new(MemorySwitch::new()), AclConfig::default());
    let table = api.create_acl_table(&[AclQualifier::Ttl]).unwrap();
    let rule = api
        .create_acl_rule(&[
            AclEntryAttr::TableId(table.as_raw()),
            AclEntryAttr::field(AclQualifier::Ttl, AclFieldData::exact_u8(1)),
            AclEntryAttr::PacketAction(AclPacketAction::Trap),
        ])
        .unwrap();

    let err = api.delete_acl_table(table).unwrap_err();
    assert!(matches!(err, AclError::Engine(_)));

    api.delete_acl_rule(rule).unwrap();
    api.delete_acl_table(table).unwrap();
    assert_eq!(api.engine().table_count(), 0);
}

#[test]
fn test_scenario_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "tables": [
                {{ "name": "edge", "qualifiers": ["SRC_IP", "L4_DST_PORT", "IN_PORTS"] }},
                {{ "name": "v6", "qualifiers": ["SRC_IPV6", "TTL"] }},
                {{ "name": "broken", "qualifiers": ["SRC_IP", "DST_IPV6"] }}
            ],
            "rules": [
                {{
                    "name": "block-telnet",
                    "table": "edge",
                    "priority": 10,
                    "matches": [
                        {{ "qualifier": "SRC_IP", "value": "10.0.0.0/8" }},
                        {{ "qualifier": "L4_DST_PORT", "value": 23 }},
                        {{ "qualifier": "IN_PORTS", "value": [4096, 4097] }}
                    ],
                    "actions": [{{ "packet_action": "DROP" }}]
                }},
                {{
                    "name": "mac-on-v6",
                    "table": "v6",
                    "matches": [{{ "qualifier": "SRC_MAC", "value": "00:11:22:33:44:55" }}]
                }}
            ]
        }}"#
    )
    .unwrap();

    let scenario = Scenario::from_file(file.path()).unwrap();
    let api = AclApi::new(Arc::new(MemorySwitch::new()), AclConfig::default());
    let report = scenario::run(&api, &scenario, true);

    let shapes: Vec<_> = report.tables.iter().map(|t| t.shape).collect();
    assert_eq!(shapes, vec![Some(TableShape::Ipv4), Some(TableShape::Ipv6), None]);
    assert_eq!(
        report.tables[2].status.as_deref(),
        Some("SAI_STATUS_INVALID_PARAMETER")
    );

    let telnet = &report.rules[0];
    let translation = telnet.translation.as_ref().unwrap();
    assert_eq!(translation.keys.len(), 2);
    assert_eq!(translation.action, AclAction::Drop);
    assert_eq!(translation.references, vec![4097, 4096]);
    assert!(telnet.handle.is_some());

    assert!(report.rules[1].error.is_some());
    assert_eq!(report.failures(), 2);
    assert_eq!(api.engine().rule_count(), 1);
}

#[test]
fn test_dry_run_installs_nothing() {
    let scenario = Scenario::from_json_str(
        r#"{
            "tables": [{ "name": "l2", "qualifiers": ["SRC_MAC", "ETHER_TYPE"] }],
            "rules": [{
                "name": "arp",
                "table": "l2",
                "matches": [{ "qualifier": "ETHER_TYPE", "value": "0x0806" }],
                "actions": [{ "packet_action": "TRAP" }]
            }]
        }"#,
    )
    .unwrap();
    let api = AclApi::new(Arc::new(MemorySwitch::new()), AclConfig::default());
    let report = scenario::run(&api, &scenario, false);

    let translation = report.rules[0].translation.as_ref().unwrap();
    assert_eq!(translation.shape, TableShape::Mac);
    assert_eq!(translation.keys[0].value, FieldValue::U16(0x0806));
    assert_eq!(translation.action, AclAction::RedirectToCpu);
    assert_eq!(report.rules[0].handle, None);
    assert_eq!(api.engine().rule_count(), 0);
    assert_eq!(report.failures(), 0);
}

#[test]
fn test_null_port_never_reaches_engine() {
    let api = recording_api(AclConfig::default());
    let table = api.create_acl_table(&[AclQualifier::DstIp]).unwrap();

    let err = api
        .create_acl_rule(&[
            AclEntryAttr::TableId(table.as_raw()),
            dst_ip(Ipv4Addr::new(10, 0, 0, 0), 8),
            AclEntryAttr::field(AclQualifier::InPort, AclFieldData::object(0)),
            AclEntryAttr::field(AclQualifier::InPort, AclFieldData::object(0x77)),
            AclEntryAttr::PacketAction(AclPacketAction::Drop),
        ])
        .unwrap_err();

    assert_eq!(err.status().to_string(), "SAI_STATUS_INVALID_ATTRIBUTE");
    assert_eq!(
        api.engine().calls(),
        vec![Call::CreateTable(AclType::Ip), Call::TableType]
    );
    assert!(api.engine().inner.references(table).is_empty());
}

#[test]
fn test_scenario_install_translates_once() {
    let scenario = Scenario::from_json_str(
        r#"{
            "tables": [{ "name": "edge", "qualifiers": ["DST_IP", "IN_PORT"] }],
            "rules": [{
                "name": "guard",
                "table": "edge",
                "matches": [
                    { "qualifier": "DST_IP", "value": "10.9.0.0/16" },
                    { "qualifier": "IN_PORT", "value": 4096 }
                ],
                "actions": [{ "packet_action": "DROP" }]
            }]
        }"#,
    )
    .unwrap();
    let api = recording_api(AclConfig::default());
    let report = scenario::run(&api, &scenario, true);

    assert_eq!(report.failures(), 0);
    assert_eq!(
        api.engine().calls(),
        vec![
            Call::CreateTable(AclType::Ip),
            // table report
            Call::TableType,
            // rule translation
            Call::TableType,
            Call::CreateRule {
                keys: 1,
                action: AclAction::Drop
            },
            Call::Bind(4096),
        ]
    );
}
