//! The ACL operations the engine exposes.

use crate::acl::{AclAction, AclActionParams, AclType, KeyValuePair};
use crate::error::SwitchResult;
use crate::handle::{AclRuleHandle, AclTableHandle, ObjectHandle};

/// ACL entry points of the switch API engine.
///
/// Implementations may be called from several threads at once. Calls that
/// touch *different* tables may run concurrently; rule creation against the
/// *same* table must be serialized by the implementation.
pub trait SwitchAclApi: Send + Sync {
    /// Creates an ACL list of the given type.
    fn create_table(&self, acl_type: AclType) -> SwitchResult<AclTableHandle>;

    /// Deletes an ACL list.
    fn delete_table(&self, table: AclTableHandle) -> SwitchResult<()>;

    /// Returns the type of an existing ACL list.
    fn table_type(&self, table: AclTableHandle) -> SwitchResult<AclType>;

    /// Installs a rule and returns its handle.
    fn create_rule(
        &self,
        table: AclTableHandle,
        priority: u32,
        keys: &[KeyValuePair],
        action: AclAction,
        params: &AclActionParams,
    ) -> SwitchResult<AclRuleHandle>;

    /// Removes a rule.
    fn delete_rule(&self, rule: AclRuleHandle) -> SwitchResult<()>;

    /// Applies an ACL list to an object (port, LAG or VLAN).
    fn bind_reference(&self, table: AclTableHandle, object: ObjectHandle) -> SwitchResult<()>;
}
