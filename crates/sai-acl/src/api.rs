//! SAI ACL entry points over a switch API engine.

use log::{debug, info, warn};
use std::sync::Arc;
use switchapi::{AclRuleHandle, AclTableHandle, SwitchAclApi};

use crate::capability::TableShape;
use crate::classify::classify;
use crate::config::AclConfig;
use crate::error::{AclError, Result};
use crate::qualifier::{AclEntryAttr, AclQualifier};
use crate::rule::{assemble, rule_table, AssembledRule};

/// ACL table and rule operations, translated onto `E`.
///
/// Holds no mutable state. Table shapes live in the engine and rules are
/// assembled per call.
pub struct AclApi<E: SwitchAclApi> {
    engine: Arc<E>,
    config: AclConfig,
}

impl<E: SwitchAclApi> std::fmt::Debug for AclApi<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AclApi")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<E: SwitchAclApi> AclApi<E> {
    pub fn new(engine: Arc<E>, config: AclConfig) -> Self {
        Self { engine, config }
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    pub fn config(&self) -> &AclConfig {
        &self.config
    }

    /// Classifies the requested qualifiers and creates a table of the
    /// matching shape.
    pub fn create_acl_table(&self, qualifiers: &[AclQualifier]) -> Result<AclTableHandle> {
        let shape = classify(qualifiers)?;
        let table = self.engine.create_table(shape.acl_type())?;
        info!("Created {} ACL table {}", shape, table);
        Ok(table)
    }

    pub fn delete_acl_table(&self, table: AclTableHandle) -> Result<()> {
        self.engine.delete_table(table)?;
        info!("Deleted ACL table {}", table);
        Ok(())
    }

    /// Returns the shape of an existing table.
    pub fn table_shape(&self, table: AclTableHandle) -> Result<TableShape> {
        let acl_type = self
            .engine
            .table_type(table)
            .map_err(|source| AclError::InvalidTableReference { table, source })?;
        Ok(TableShape::from_acl_type(acl_type))
    }

    /// Translates a rule without installing it.
    pub fn assemble_rule(&self, attrs: &[AclEntryAttr]) -> Result<AssembledRule> {
        let table = rule_table(attrs)?;
        let shape = self.table_shape(table)?;
        assemble(table, shape, attrs, &self.config)
    }

    /// Translates and installs a rule, then binds its table to every
    /// referenced port or VLAN.
    pub fn create_acl_rule(&self, attrs: &[AclEntryAttr]) -> Result<AclRuleHandle> {
        let rule = self.assemble_rule(attrs)?;
        self.install(&rule)
    }

    /// Installs an assembled rule and binds its table to the rule's
    /// references, most recent first.
    ///
    /// If a binding fails the rule is removed again before the error is
    /// returned. Bindings made before the failure stay in place, since the
    /// engine has no unbind.
    pub fn install(&self, rule: &AssembledRule) -> Result<AclRuleHandle> {
        let handle = self.engine.create_rule(
            rule.table,
            rule.priority,
            &rule.keys,
            rule.action,
            &rule.params,
        )?;
        debug!(
            "Installed ACL rule {} in table {} ({} keys, action {})",
            handle,
            rule.table,
            rule.keys.len(),
            rule.action
        );

        for &object in &rule.references {
            if let Err(e) = self.engine.bind_reference(rule.table, object) {
                warn!(
                    "Failed to bind ACL table {} to 0x{:x}: {}",
                    rule.table, object, e
                );
                if let Err(undo) = self.engine.delete_rule(handle) {
                    warn!("Failed to remove ACL rule {} after bind error: {}", handle, undo);
                }
                return Err(e.into());
            }
        }

        Ok(handle)
    }

    pub fn delete_acl_rule(&self, rule: AclRuleHandle) -> Result<()> {
        self.engine.delete_rule(rule)?;
        debug!("Deleted ACL rule {}", rule);
        Ok(())
    }
}
