//! JSON scenario driver.
//!
//! A scenario lists tables (by qualifier set) and rules (by attribute) the
//! way a SAI client would submit them. Running it against an engine yields
//! a report of the native translation of every table and rule, including
//! the ones that failed.
//!
//! ```json
//! {
//!   "tables": [{ "name": "edge", "qualifiers": ["SRC_IP", "L4_DST_PORT", "IN_PORTS"] }],
//!   "rules": [{
//!     "name": "block-telnet",
//!     "table": "edge",
//!     "priority": 10,
//!     "matches": [
//!       { "qualifier": "SRC_IP", "value": "10.0.0.0/8" },
//!       { "qualifier": "L4_DST_PORT", "value": 23 },
//!       { "qualifier": "IN_PORTS", "value": [4096, 4097] }
//!     ],
//!     "actions": [{ "packet_action": "DROP" }]
//!   }]
//! }
//! ```

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::{Path, PathBuf};
use switchapi::{AclRuleHandle, AclTableHandle, SwitchAclApi};
use thiserror::Error;

use crate::api::AclApi;
use crate::capability::TableShape;
use crate::error::AclError;
use crate::qualifier::{AclEntryAttr, AclFieldData, AclPacketAction, AclQualifier, AclValue};
use crate::rule::AssembledRule;

/// Errors raised while loading or converting a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Failed to read scenario {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Invalid value for {qualifier}: {message}")]
    InvalidValue {
        qualifier: AclQualifier,
        message: String,
    },
}

/// A table request.
#[derive(Debug, Clone, Deserialize)]
pub struct TableSpec {
    pub name: String,
    pub qualifiers: Vec<AclQualifier>,
}

/// Value or mask of a match as written in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MatchValue {
    Number(u64),
    List(Vec<u64>),
    Text(String),
}

/// One match attribute of a rule.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchSpec {
    pub qualifier: AclQualifier,
    pub value: MatchValue,
    #[serde(default)]
    pub mask: Option<MatchValue>,
}

/// One action attribute of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSpec {
    PacketAction(AclPacketAction),
    Redirect(u64),
    Flood,
}

/// A rule request.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSpec {
    pub name: String,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub priority: Option<u32>,
    #[serde(default)]
    pub matches: Vec<MatchSpec>,
    #[serde(default)]
    pub actions: Vec<ActionSpec>,
}

/// A full scenario.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub tables: Vec<TableSpec>,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

impl Scenario {
    pub fn from_json_str(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

/// Outcome of one table request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReport {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<TableShape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<AclTableHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Outcome of one rule request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleReport {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<AssembledRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<AclRuleHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl RuleReport {
    fn failed(name: &str, error: String, status: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            translation: None,
            handle: None,
            error: Some(error),
            status,
        }
    }

    fn acl_failure(name: &str, error: &AclError) -> Self {
        Self::failed(name, error.to_string(), Some(error.status().to_string()))
    }
}

/// Report of a scenario run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    pub tables: Vec<TableReport>,
    pub rules: Vec<RuleReport>,
}

impl ScenarioReport {
    /// Number of requests that failed.
    pub fn failures(&self) -> usize {
        self.tables.iter().filter(|t| t.error.is_some()).count()
            + self.rules.iter().filter(|r| r.error.is_some()).count()
    }
}

/// Runs a scenario. With `install` unset rules are only translated.
pub fn run<E: SwitchAclApi>(api: &AclApi<E>, scenario: &Scenario, install: bool) -> ScenarioReport {
    let mut report = ScenarioReport::default();
    let mut tables: HashMap<&str, AclTableHandle> = HashMap::new();

    for spec in &scenario.tables {
        let outcome = api
            .create_acl_table(&spec.qualifiers)
            .and_then(|handle| Ok((handle, api.table_shape(handle)?)));
        let table_report = match outcome {
            Ok((handle, shape)) => {
                tables.insert(spec.name.as_str(), handle);
                TableReport {
                    name: spec.name.clone(),
                    shape: Some(shape),
                    handle: Some(handle),
                    error: None,
                    status: None,
                }
            }
            Err(e) => {
                warn!("Table {} failed: {}", spec.name, e);
                TableReport {
                    name: spec.name.clone(),
                    shape: None,
                    handle: None,
                    error: Some(e.to_string()),
                    status: Some(e.status().to_string()),
                }
            }
        };
        report.tables.push(table_report);
    }

    for spec in &scenario.rules {
        let rule_report = match rule_attributes(spec, &tables) {
            Ok(attrs) => run_rule(api, &spec.name, &attrs, install),
            Err(e) => {
                warn!("Rule {} rejected: {}", spec.name, e);
                RuleReport::failed(&spec.name, e.to_string(), None)
            }
        };
        report.rules.push(rule_report);
    }

    info!(
        "Scenario done: {} tables, {} rules, {} failures",
        report.tables.len(),
        report.rules.len(),
        report.failures()
    );
    report
}

fn run_rule<E: SwitchAclApi>(
    api: &AclApi<E>,
    name: &str,
    attrs: &[AclEntryAttr],
    install: bool,
) -> RuleReport {
    let translation = match api.assemble_rule(attrs) {
        Ok(rule) => rule,
        Err(e) => {
            warn!("Rule {} failed: {}", name, e);
            return RuleReport::acl_failure(name, &e);
        }
    };

    let handle = if install {
        match api.install(&translation) {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Rule {} failed to install: {}", name, e);
                return RuleReport::acl_failure(name, &e);
            }
        }
    } else {
        None
    };

    RuleReport {
        name: name.to_string(),
        translation: Some(translation),
        handle,
        error: None,
        status: None,
    }
}

/// Converts a rule request into SAI entry attributes.
pub fn rule_attributes(
    spec: &RuleSpec,
    tables: &HashMap<&str, AclTableHandle>,
) -> Result<Vec<AclEntryAttr>, ScenarioError> {
    let mut attrs = Vec::with_capacity(spec.matches.len() + spec.actions.len() + 2);

    if let Some(name) = &spec.table {
        let table = tables
            .get(name.as_str())
            .ok_or_else(|| ScenarioError::UnknownTable(name.clone()))?;
        attrs.push(AclEntryAttr::TableId(table.as_raw()));
    }
    if let Some(priority) = spec.priority {
        attrs.push(AclEntryAttr::Priority(priority));
    }
    for m in &spec.matches {
        attrs.push(AclEntryAttr::field(m.qualifier, field_data(m)?));
    }
    for action in &spec.actions {
        attrs.push(match *action {
            ActionSpec::PacketAction(a) => AclEntryAttr::PacketAction(a),
            ActionSpec::Redirect(target) => AclEntryAttr::Redirect(target),
            ActionSpec::Flood => AclEntryAttr::Flood,
        });
    }
    Ok(attrs)
}

/// Converts a JSON match into field data for its qualifier.
pub fn field_data(spec: &MatchSpec) -> Result<AclFieldData, ScenarioError> {
    let q = spec.qualifier;
    let invalid = |message: String| ScenarioError::InvalidValue {
        qualifier: q,
        message,
    };

    match q {
        AclQualifier::SrcIp | AclQualifier::DstIp => {
            let (addr, prefix_mask) = parse_ipv4(text(&spec.value, q)?).map_err(invalid)?;
            let mask = match &spec.mask {
                Some(m) => text(m, q)?
                    .parse::<Ipv4Addr>()
                    .map_err(|e| invalid(e.to_string()))?,
                None => prefix_mask,
            };
            Ok(AclFieldData::ipv4(addr, mask))
        }
        AclQualifier::SrcIpv6 | AclQualifier::DstIpv6 => {
            let (addr, prefix_mask) = parse_ipv6(text(&spec.value, q)?).map_err(invalid)?;
            let mask = match &spec.mask {
                Some(m) => text(m, q)?
                    .parse::<Ipv6Addr>()
                    .map_err(|e| invalid(e.to_string()))?,
                None => prefix_mask,
            };
            Ok(AclFieldData::ipv6(addr, mask))
        }
        AclQualifier::SrcMac | AclQualifier::DstMac => {
            let addr = parse_mac(text(&spec.value, q)?).map_err(invalid)?;
            let mask = match &spec.mask {
                Some(m) => parse_mac(text(m, q)?).map_err(invalid)?,
                None => [0xff; 6],
            };
            Ok(AclFieldData::mac(addr, mask))
        }
        _ => match &spec.value {
            MatchValue::List(handles) => Ok(AclFieldData::objects(handles.clone())),
            MatchValue::Number(n) if q.is_reference() => Ok(AclFieldData::object(*n)),
            value => {
                let data = scalar(value, q)?;
                let mask = match &spec.mask {
                    Some(m) => scalar(m, q)?,
                    None => u32::MAX,
                };
                Ok(AclFieldData::new(AclValue::U32(data), AclValue::U32(mask)))
            }
        },
    }
}

fn text(value: &MatchValue, qualifier: AclQualifier) -> Result<&str, ScenarioError> {
    match value {
        MatchValue::Text(s) => Ok(s),
        other => Err(ScenarioError::InvalidValue {
            qualifier,
            message: format!("expected a string, got {:?}", other),
        }),
    }
}

fn scalar(value: &MatchValue, qualifier: AclQualifier) -> Result<u32, ScenarioError> {
    let parsed = match value {
        MatchValue::Number(n) => u32::try_from(*n).map_err(|e| e.to_string()),
        MatchValue::Text(s) => match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u32::from_str_radix(hex, 16).map_err(|e| e.to_string()),
            None => s.parse::<u32>().map_err(|e| e.to_string()),
        },
        MatchValue::List(_) => Err("expected a number, got a list".to_string()),
    };
    parsed.map_err(|message| ScenarioError::InvalidValue { qualifier, message })
}

/// Parses `a.b.c.d` or `a.b.c.d/len` into an address and mask.
fn parse_ipv4(s: &str) -> Result<(Ipv4Addr, Ipv4Addr), String> {
    let (addr, len) = split_prefix(s, 32)?;
    let addr = addr.parse::<Ipv4Addr>().map_err(|e| e.to_string())?;
    let mask = u32::MAX.checked_shl(32 - u32::from(len)).unwrap_or(0);
    Ok((addr, Ipv4Addr::from(mask)))
}

/// Parses an IPv6 address with optional prefix length.
fn parse_ipv6(s: &str) -> Result<(Ipv6Addr, Ipv6Addr), String> {
    let (addr, len) = split_prefix(s, 128)?;
    let addr = addr.parse::<Ipv6Addr>().map_err(|e| e.to_string())?;
    let mask = u128::MAX.checked_shl(128 - u32::from(len)).unwrap_or(0);
    Ok((addr, Ipv6Addr::from(mask)))
}

fn split_prefix(s: &str, max: u8) -> Result<(&str, u8), String> {
    match s.split_once('/') {
        Some((addr, len)) => {
            let len = len
                .parse::<u8>()
                .map_err(|e| format!("bad prefix length {}: {}", len, e))?;
            if len > max {
                return Err(format!("prefix length {} exceeds {}", len, max));
            }
            Ok((addr, len))
        }
        None => Ok((s, max)),
    }
}

/// Parses a colon- or dash-separated MAC address.
fn parse_mac(s: &str) -> Result<[u8; 6], String> {
    let mut mac = [0u8; 6];
    let mut parts = s.split([':', '-']);
    for byte in mac.iter_mut() {
        let part = parts
            .next()
            .ok_or_else(|| format!("MAC address {} is too short", s))?;
        *byte = u8::from_str_radix(part, 16).map_err(|e| format!("bad MAC byte {}: {}", part, e))?;
    }
    if parts.next().is_some() {
        return Err(format!("MAC address {} is too long", s));
    }
    Ok(mac)
}
