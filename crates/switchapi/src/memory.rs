//! In-memory switch API engine.
//!
//! `MemorySwitch` stores ACL lists and rules in process memory. It backs the
//! unit and integration tests and the dry-run driver, and enforces the same
//! referential rules a hardware engine would: rules need a live table whose
//! type matches their keys, and a table cannot be deleted while it still
//! holds rules.

use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::acl::{AclAction, AclActionParams, AclType, KeyValuePair};
use crate::api::SwitchAclApi;
use crate::error::{SwitchError, SwitchResult, SwitchStatus};
use crate::handle::{AclRuleHandle, AclTableHandle, ObjectHandle, RawHandle};

/// Handle type bits, placed above the sequence number like the engine does.
const HANDLE_TYPE_SHIFT: u32 = 26;
const HANDLE_TYPE_ACL_TABLE: RawHandle = 0x11;
const HANDLE_TYPE_ACL_RULE: RawHandle = 0x12;

/// Engine operations that can be made to fail on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitchOp {
    CreateTable,
    DeleteTable,
    CreateRule,
    DeleteRule,
    BindReference,
}

/// A rule as the engine stored it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledRule {
    pub table: AclTableHandle,
    pub priority: u32,
    pub keys: Vec<KeyValuePair>,
    pub action: AclAction,
    pub params: AclActionParams,
}

#[derive(Debug)]
struct TableEntry {
    acl_type: AclType,
    references: Vec<ObjectHandle>,
}

#[derive(Debug, Default)]
struct State {
    next_seq: RawHandle,
    tables: BTreeMap<RawHandle, TableEntry>,
    rules: BTreeMap<RawHandle, InstalledRule>,
    failures: HashMap<SwitchOp, SwitchStatus>,
}

impl State {
    fn alloc(&mut self, kind: RawHandle) -> RawHandle {
        self.next_seq += 1;
        (kind << HANDLE_TYPE_SHIFT) | self.next_seq
    }

    fn check_failure(&mut self, op: SwitchOp) -> SwitchResult<()> {
        match self.failures.remove(&op) {
            Some(status) => {
                debug!("Injected failure for {:?}: {}", op, status);
                status.into_result()
            }
            None => Ok(()),
        }
    }
}

/// In-memory implementation of [`SwitchAclApi`].
#[derive(Debug, Default)]
pub struct MemorySwitch {
    state: Mutex<State>,
}

impl MemorySwitch {
    /// Creates an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes the next call of `op` fail with `status`.
    pub fn fail_next(&self, op: SwitchOp, status: SwitchStatus) {
        self.state().failures.insert(op, status);
    }

    /// Returns the number of live tables.
    pub fn table_count(&self) -> usize {
        self.state().tables.len()
    }

    /// Returns the number of installed rules.
    pub fn rule_count(&self) -> usize {
        self.state().rules.len()
    }

    /// Returns a copy of an installed rule.
    pub fn rule(&self, rule: AclRuleHandle) -> Option<InstalledRule> {
        self.state().rules.get(&rule.as_raw()).cloned()
    }

    /// Returns the objects a table is bound to, in binding order.
    pub fn references(&self, table: AclTableHandle) -> Vec<ObjectHandle> {
        self.state()
            .tables
            .get(&table.as_raw())
            .map(|t| t.references.clone())
            .unwrap_or_default()
    }
}

impl SwitchAclApi for MemorySwitch {
    fn create_table(&self, acl_type: AclType) -> SwitchResult<AclTableHandle> {
        let mut state = self.state();
        state.check_failure(SwitchOp::CreateTable)?;

        let raw = state.alloc(HANDLE_TYPE_ACL_TABLE);
        state.tables.insert(
            raw,
            TableEntry {
                acl_type,
                references: Vec::new(),
            },
        );
        debug!("Created {} ACL table 0x{:x}", acl_type, raw);
        Ok(AclTableHandle::from_raw_unchecked(raw))
    }

    fn delete_table(&self, table: AclTableHandle) -> SwitchResult<()> {
        let mut state = self.state();
        state.check_failure(SwitchOp::DeleteTable)?;

        if !state.tables.contains_key(&table.as_raw()) {
            return Err(SwitchError::invalid_handle(table.as_raw()));
        }
        if state.rules.values().any(|r| r.table == table) {
            return Err(SwitchError::resource_in_use(format!("ACL table {}", table)));
        }
        state.tables.remove(&table.as_raw());
        debug!("Deleted ACL table {}", table);
        Ok(())
    }

    fn table_type(&self, table: AclTableHandle) -> SwitchResult<AclType> {
        self.state()
            .tables
            .get(&table.as_raw())
            .map(|t| t.acl_type)
            .ok_or_else(|| SwitchError::invalid_handle(table.as_raw()))
    }

    fn create_rule(
        &self,
        table: AclTableHandle,
        priority: u32,
        keys: &[KeyValuePair],
        action: AclAction,
        params: &AclActionParams,
    ) -> SwitchResult<AclRuleHandle> {
        let mut state = self.state();
        state.check_failure(SwitchOp::CreateRule)?;

        let acl_type = state
            .tables
            .get(&table.as_raw())
            .map(|t| t.acl_type)
            .ok_or_else(|| SwitchError::invalid_handle(table.as_raw()))?;
        if let Some(key) = keys.iter().find(|k| k.field.acl_type() != acl_type) {
            return Err(SwitchError::invalid_parameter(format!(
                "field {} does not belong to {} table {}",
                key.field, acl_type, table
            )));
        }
        if action == AclAction::Redirect && params.redirect.is_none() {
            return Err(SwitchError::invalid_parameter("redirect without target"));
        }

        let raw = state.alloc(HANDLE_TYPE_ACL_RULE);
        state.rules.insert(
            raw,
            InstalledRule {
                table,
                priority,
                keys: keys.to_vec(),
                action,
                params: *params,
            },
        );
        debug!(
            "Created ACL rule 0x{:x} in table {} ({} keys, {})",
            raw,
            table,
            keys.len(),
            action
        );
        Ok(AclRuleHandle::from_raw_unchecked(raw))
    }

    fn delete_rule(&self, rule: AclRuleHandle) -> SwitchResult<()> {
        let mut state = self.state();
        state.check_failure(SwitchOp::DeleteRule)?;

        state
            .rules
            .remove(&rule.as_raw())
            .map(|_| debug!("Deleted ACL rule {}", rule))
            .ok_or_else(|| SwitchError::invalid_handle(rule.as_raw()))
    }

    fn bind_reference(&self, table: AclTableHandle, object: ObjectHandle) -> SwitchResult<()> {
        let mut state = self.state();
        state.check_failure(SwitchOp::BindReference)?;

        if object == 0 {
            return Err(SwitchError::invalid_handle(object));
        }
        let entry = state
            .tables
            .get_mut(&table.as_raw())
            .ok_or_else(|| SwitchError::invalid_handle(table.as_raw()))?;
        entry.references.push(object);
        debug!("Bound ACL table {} to object 0x{:x}", table, object);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::{FieldValue, IpField, MacField, NativeField};
    use pretty_assertions::assert_eq;

    fn ttl_key() -> KeyValuePair {
        KeyValuePair::new(
            NativeField::Ip(IpField::Ttl),
            FieldValue::U8(64),
            FieldValue::U8(0xff),
        )
    }

    #[test]
    fn test_table_lifecycle() {
        let switch = MemorySwitch::new();
        let table = switch.create_table(AclType::Ip).unwrap();

        assert_eq!(switch.table_type(table).unwrap(), AclType::Ip);
        assert_eq!(switch.table_count(), 1);

        switch.delete_table(table).unwrap();
        assert_eq!(switch.table_count(), 0);
        assert!(switch.table_type(table).is_err());
    }

    #[test]
    fn test_table_in_use() {
        let switch = MemorySwitch::new();
        let table = switch.create_table(AclType::Ip).unwrap();
        let rule = switch
            .create_rule(table, 1, &[ttl_key()], AclAction::Drop, &AclActionParams::default())
            .unwrap();

        let err = switch.delete_table(table).unwrap_err();
        assert!(matches!(err, SwitchError::ResourceInUse { .. }));

        switch.delete_rule(rule).unwrap();
        switch.delete_table(table).unwrap();
    }

    #[test]
    fn test_rule_keys_must_match_table_type() {
        let switch = MemorySwitch::new();
        let table = switch.create_table(AclType::Ip).unwrap();
        let mac_key = KeyValuePair::new(
            NativeField::Mac(MacField::EthType),
            FieldValue::U16(0x0800),
            FieldValue::U16(0xffff),
        );

        let err = switch
            .create_rule(table, 1, &[mac_key], AclAction::Drop, &AclActionParams::default())
            .unwrap_err();
        assert!(matches!(err, SwitchError::InvalidParameter { .. }));
        assert_eq!(switch.rule_count(), 0);
    }

    #[test]
    fn test_injected_failure_is_one_shot() {
        let switch = MemorySwitch::new();
        switch.fail_next(SwitchOp::CreateTable, SwitchStatus::TableFull);

        assert!(switch.create_table(AclType::Mac).is_err());
        assert!(switch.create_table(AclType::Mac).is_ok());
    }

    #[test]
    fn test_bind_reference_order() {
        let switch = MemorySwitch::new();
        let table = switch.create_table(AclType::Mac).unwrap();

        switch.bind_reference(table, 0x30).unwrap();
        switch.bind_reference(table, 0x10).unwrap();
        assert!(switch.bind_reference(table, 0).is_err());

        assert_eq!(switch.references(table), vec![0x30, 0x10]);
    }
}
