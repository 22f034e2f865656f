use crate::error::{AccessDenied, EngineError, EngineResult, RoleOperationError};
use crate::types::{PrincipalId, Role};
use parking_lot::RwLock;
use std::collections::HashMap;

/// The role the outgoing admin is demoted to on `transfer_admin`.
const DEMOTED_ADMIN_ROLE: Role = Role::Student;

struct RegistryInner {
    roles: HashMap<PrincipalId, Role>,
    admin: PrincipalId,
}

/// Exactly one role per principal; only the single admin principal mutates
/// the map. The admin role is transferred, never revoked to zero.
pub struct RoleRegistry {
    inner: RwLock<RegistryInner>,
}

impl RoleRegistry {
    /// Bootstrap with the distinguished admin principal.
    pub fn new(admin: PrincipalId) -> Self {
        let mut roles = HashMap::new();
        roles.insert(admin, Role::Admin);
        Self {
            inner: RwLock::new(RegistryInner { roles, admin }),
        }
    }

    pub fn admin(&self) -> PrincipalId {
        self.inner.read().admin
    }

    pub fn is_admin(&self, principal: PrincipalId) -> bool {
        self.inner.read().admin == principal
    }

    /// Pure lookup. Unassigned principals report `None`, a sentinel distinct
    /// from `Student`.
    pub fn role_of(&self, principal: PrincipalId) -> Option<Role> {
        self.inner.read().roles.get(&principal).copied()
    }

    /// Replace `target`'s role. Admin-only; the Admin role itself is not
    /// assignable here.
    pub(crate) fn assign(
        &self,
        caller: PrincipalId,
        target: PrincipalId,
        role: Role,
    ) -> EngineResult<()> {
        let mut inner = self.inner.write();
        if caller != inner.admin {
            return Err(EngineError::unauthorized(AccessDenied::RoleRequired(
                Role::Admin,
            )));
        }
        if target == caller {
            return Err(RoleOperationError::SelfAssignment.into());
        }
        if role == Role::Admin {
            return Err(RoleOperationError::CannotAssignAdmin.into());
        }
        inner.roles.insert(target, role);
        Ok(())
    }

    /// Remove `target`'s role. Admin-only; the admin itself is protected.
    /// Returns the revoked role.
    pub(crate) fn revoke(&self, caller: PrincipalId, target: PrincipalId) -> EngineResult<Role> {
        let mut inner = self.inner.write();
        if caller != inner.admin {
            return Err(EngineError::unauthorized(AccessDenied::RoleRequired(
                Role::Admin,
            )));
        }
        if target == inner.admin {
            return Err(RoleOperationError::TargetIsAdmin.into());
        }
        inner
            .roles
            .remove(&target)
            .ok_or_else(|| RoleOperationError::UnknownPrincipal.into())
    }

    /// Atomically demote the current admin and promote `new_admin`.
    /// Returns the outgoing admin for audit emission.
    pub(crate) fn transfer_admin(
        &self,
        caller: PrincipalId,
        new_admin: PrincipalId,
    ) -> EngineResult<PrincipalId> {
        let mut inner = self.inner.write();
        if caller != inner.admin {
            return Err(EngineError::unauthorized(AccessDenied::RoleRequired(
                Role::Admin,
            )));
        }
        if new_admin == caller {
            return Err(RoleOperationError::AlreadyAdmin.into());
        }
        let old_admin = inner.admin;
        inner.roles.insert(old_admin, DEMOTED_ADMIN_ROLE);
        inner.roles.insert(new_admin, Role::Admin);
        inner.admin = new_admin;
        Ok(old_admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_assigns_admin_exactly_once() {
        let admin = PrincipalId::new();
        let registry = RoleRegistry::new(admin);
        assert_eq!(registry.role_of(admin), Some(Role::Admin));
        assert_eq!(registry.admin(), admin);
        assert_eq!(registry.role_of(PrincipalId::new()), None);
    }

    #[test]
    fn transfer_demotes_old_admin_and_promotes_new() {
        let admin = PrincipalId::new();
        let next = PrincipalId::new();
        let registry = RoleRegistry::new(admin);

        let old = registry.transfer_admin(admin, next).unwrap();
        assert_eq!(old, admin);
        assert_eq!(registry.role_of(admin), Some(DEMOTED_ADMIN_ROLE));
        assert_eq!(registry.role_of(next), Some(Role::Admin));
        assert!(registry.is_admin(next));

        // The demoted principal lost its registry authority.
        let err = registry.assign(admin, PrincipalId::new(), Role::Student);
        assert!(err.unwrap_err().is_unauthorized());
    }
}
