//! ACL rule assembly.
//!
//! A rule arrives as a flat SAI attribute list. Assembly walks it once and
//! sorts each attribute by role:
//! - match fields become native key/value pairs for the table's shape
//! - port and VLAN qualifiers become objects the table is bound to
//! - action attributes resolve to a single engine action

use log::debug;
use serde::Serialize;
use switchapi::{AclAction, AclActionParams, AclTableHandle, KeyValuePair, ObjectHandle};

use crate::capability::{Capability, TableShape};
use crate::config::{AclConfig, EmptyMatchPolicy};
use crate::error::{AclError, Result};
use crate::qualifier::{AclEntryAttr, AclFieldData, AclPacketAction, AclQualifier};
use crate::xform::transform;

/// Objects a rule binds its table to, in the order they were seen.
#[derive(Debug, Default)]
pub struct ReferenceTracker {
    handles: Vec<ObjectHandle>,
}

impl ReferenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one object handle.
    pub fn track(&mut self, handle: ObjectHandle) -> Result<()> {
        self.handles
            .try_reserve(1)
            .map_err(|e| AclError::AllocationFailure(format!("reference list: {}", e)))?;
        self.handles.push(handle);
        Ok(())
    }

    /// Records a list of object handles.
    pub fn track_all(&mut self, handles: &[ObjectHandle]) -> Result<()> {
        self.handles
            .try_reserve(handles.len())
            .map_err(|e| AclError::AllocationFailure(format!("reference list: {}", e)))?;
        self.handles.extend_from_slice(handles);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Consumes the tracker and returns the handles in binding order:
    /// most recently tracked first.
    pub fn drain_bind_order(self) -> Vec<ObjectHandle> {
        let mut handles = self.handles;
        handles.reverse();
        handles
    }
}

/// A rule translated into engine terms, ready to install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssembledRule {
    pub table: AclTableHandle,
    pub shape: TableShape,
    pub priority: u32,
    pub keys: Vec<KeyValuePair>,
    pub action: AclAction,
    pub params: AclActionParams,
    /// Objects to bind the table to, in binding order.
    pub references: Vec<ObjectHandle>,
}

/// Maps one action attribute to an engine action.
///
/// Returns `None` for attributes that are not actions. A redirect must name
/// a target.
pub fn resolve_action(attr: &AclEntryAttr) -> Result<Option<(AclAction, AclActionParams)>> {
    let resolved = match attr {
        AclEntryAttr::Redirect(0) => {
            return Err(AclError::InvalidFieldData {
                field: "REDIRECT".to_string(),
                expected: "non-null redirect target",
            });
        }
        AclEntryAttr::Redirect(target) => {
            (AclAction::Redirect, AclActionParams::redirect(*target))
        }
        AclEntryAttr::PacketAction(action) => {
            let native = match action {
                AclPacketAction::Drop | AclPacketAction::Deny => AclAction::Drop,
                AclPacketAction::Forward => AclAction::Permit,
                AclPacketAction::Trap => AclAction::RedirectToCpu,
                AclPacketAction::Copy | AclPacketAction::Log => AclAction::CopyToCpu,
            };
            (native, AclActionParams::default())
        }
        AclEntryAttr::Flood => (AclAction::FloodToVlan, AclActionParams::default()),
        AclEntryAttr::TableId(_) | AclEntryAttr::Priority(_) | AclEntryAttr::Field(..) => {
            return Ok(None)
        }
    };
    Ok(Some(resolved))
}

/// Returns the table a rule's attributes point at.
///
/// A null table id counts as missing.
pub fn rule_table(attrs: &[AclEntryAttr]) -> Result<AclTableHandle> {
    attrs
        .iter()
        .filter_map(|attr| match attr {
            AclEntryAttr::TableId(raw) => Some(*raw),
            _ => None,
        })
        .last()
        .and_then(AclTableHandle::from_raw)
        .ok_or(AclError::MissingTable)
}

/// Translates a rule's attributes for a table of `shape`.
pub fn assemble(
    table: AclTableHandle,
    shape: TableShape,
    attrs: &[AclEntryAttr],
    config: &AclConfig,
) -> Result<AssembledRule> {
    let mut priority = 0;
    let mut keys: Vec<KeyValuePair> = Vec::new();
    let mut tracker = ReferenceTracker::new();
    let mut action: Option<(AclAction, AclActionParams)> = None;

    for attr in attrs {
        match attr {
            AclEntryAttr::TableId(_) => {}
            AclEntryAttr::Priority(p) => priority = *p,
            AclEntryAttr::Field(qualifier, data) => match shape.capability(*qualifier) {
                Capability::Native(field) => {
                    if let Some(kvp) = transform(shape, field, data)? {
                        push_key(&mut keys, kvp, config.max_rule_fields)?;
                    }
                }
                Capability::PortOrVlanReference => {
                    track_reference(&mut tracker, *qualifier, data, shape)?;
                }
                Capability::Unsupported => {
                    return Err(AclError::UnsupportedQualifierForShape {
                        qualifier: *qualifier,
                        shape,
                    });
                }
            },
            _ => {
                if let Some(resolved) = resolve_action(attr)? {
                    if let Some((previous, _)) = action.replace(resolved) {
                        debug!(
                            "ACL rule action {} replaced by {}",
                            previous, resolved.0
                        );
                    }
                }
            }
        }
    }

    if keys.is_empty() && config.empty_match_policy == EmptyMatchPolicy::Reject {
        return Err(AclError::NoMatchFields);
    }

    let (action, params) = action.unwrap_or_default();
    Ok(AssembledRule {
        table,
        shape,
        priority,
        keys,
        action,
        params,
        references: tracker.drain_bind_order(),
    })
}

fn push_key(keys: &mut Vec<KeyValuePair>, kvp: KeyValuePair, max: usize) -> Result<()> {
    if keys.len() >= max {
        return Err(AclError::AllocationFailure(format!(
            "rule exceeds {} key fields",
            max
        )));
    }
    keys.try_reserve(1)
        .map_err(|e| AclError::AllocationFailure(format!("key list: {}", e)))?;
    keys.push(kvp);
    Ok(())
}

fn track_reference(
    tracker: &mut ReferenceTracker,
    qualifier: AclQualifier,
    data: &AclFieldData,
    shape: TableShape,
) -> Result<()> {
    // Null objects must fail here. At bind time the rule and any earlier
    // bindings already exist, and the engine has no unbind.
    match qualifier {
        AclQualifier::InPorts => {
            let ports = data
                .data
                .as_obj_list()
                .ok_or_else(|| AclError::invalid_reference_data(qualifier, "object list"))?;
            if ports.contains(&0) {
                return Err(AclError::invalid_reference_data(
                    qualifier,
                    "non-null object ids",
                ));
            }
            tracker.track_all(ports)
        }
        AclQualifier::InPort | AclQualifier::OuterVlanId => {
            let object = data
                .data
                .as_oid()
                .ok_or_else(|| AclError::invalid_reference_data(qualifier, "object id"))?;
            if object == 0 {
                return Err(AclError::invalid_reference_data(
                    qualifier,
                    "non-null object id",
                ));
            }
            tracker.track(object)
        }
        // Egress ports and inner VLANs have no binding in the engine.
        _ => Err(AclError::UnsupportedQualifierForShape { qualifier, shape }),
    }
}
