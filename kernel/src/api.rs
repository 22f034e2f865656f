//! Operational surface of the kernel, grouped by concern.
//!
//! All four traits are implemented by [`crate::handle::EngineHandle`];
//! collaborators depend on the trait they need.

use crate::error::EngineResult;
use crate::logging::Event;
use crate::types::{Grievance, GrievanceId, PrincipalId, Role};

/// Admin-gated mutations of the principal→role map.
pub trait RoleAdministration {
    fn assign_role(
        &self,
        caller: PrincipalId,
        target: PrincipalId,
        role: Role,
    ) -> EngineResult<()>;

    fn revoke_role(&self, caller: PrincipalId, target: PrincipalId) -> EngineResult<()>;

    /// Demote the current admin and promote `new_admin` as one logical
    /// operation (two audit events).
    fn transfer_admin(&self, caller: PrincipalId, new_admin: PrincipalId) -> EngineResult<()>;

    fn role_of(&self, principal: PrincipalId) -> Option<Role>;
}

/// The workflow transitions. Every success appends to the audit log; every
/// failure leaves the record untouched.
pub trait GrievanceWorkflow {
    fn submit_grievance(&self, caller: PrincipalId, description: &str)
        -> EngineResult<GrievanceId>;

    fn review_grievance(&self, caller: PrincipalId, id: GrievanceId) -> EngineResult<()>;

    fn assign_to_handler(
        &self,
        caller: PrincipalId,
        id: GrievanceId,
        handler: PrincipalId,
    ) -> EngineResult<()>;

    fn resolve_grievance(
        &self,
        caller: PrincipalId,
        id: GrievanceId,
        remarks: &str,
    ) -> EngineResult<()>;

    fn escalate_grievance(
        &self,
        caller: PrincipalId,
        id: GrievanceId,
        remarks: &str,
    ) -> EngineResult<()>;

    fn close_grievance(
        &self,
        caller: PrincipalId,
        id: GrievanceId,
        remarks: &str,
    ) -> EngineResult<()>;
}

/// Read paths, scoped per caller role.
pub trait VisibilityQueries {
    /// Single-record fetch; fails `Unauthorized` rather than redacting.
    fn get_grievance(&self, caller: PrincipalId, id: GrievanceId) -> EngineResult<Grievance>;

    /// Ids the caller may enumerate. Unassigned principals (and the admin,
    /// whose listing is `list_all`) get the empty set.
    fn list_visible(&self, caller: PrincipalId) -> Vec<GrievanceId>;

    /// Unrestricted listing, admin only.
    fn list_all(&self, caller: PrincipalId) -> EngineResult<Vec<GrievanceId>>;
}

/// Audit log access.
pub trait AuditQueries {
    /// Events about one grievance, in sequence order.
    fn events_for(&self, id: GrievanceId) -> Vec<Event>;

    /// The full event stream in order.
    fn events(&self) -> Vec<Event>;

    fn verify_integrity(&self) -> EngineResult<IntegrityReport>;
}

/// Outcome of an audit-chain verification walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityReport {
    pub valid: bool,
    pub events_checked: usize,
    pub first_invalid_seq: Option<u64>,
}
