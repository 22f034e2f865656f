use crate::api::{
    AuditQueries, GrievanceWorkflow, IntegrityReport, RoleAdministration, VisibilityQueries,
};
use crate::error::{
    AccessDenied, EngineError, EngineResult, LogError, ValidationError,
};
use crate::logging::{AuditLog, Event, EventKind, EventSubject};
use crate::registry::RoleRegistry;
use crate::state_machine;
use crate::store::GrievanceStore;
use crate::types::{
    now_timestamp, EscalationTier, Grievance, GrievanceId, GrievanceStatus, PrincipalId, Role,
    MAX_DESCRIPTION_LEN, MAX_REMARKS_LEN,
};
use crate::visibility;
use parking_lot::Mutex;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// The distinguished admin principal, assigned at bootstrap.
    pub admin: PrincipalId,
    pub description_limit: usize,
    pub remarks_limit: usize,
}

impl EngineConfig {
    pub fn new(admin: PrincipalId) -> Self {
        Self {
            admin,
            description_limit: MAX_DESCRIPTION_LEN,
            remarks_limit: MAX_REMARKS_LEN,
        }
    }
}

/// Main engine handle that implements all operational traits.
///
/// Mutations are strictly serialized through `write_gate`: each one
/// validates against a committed snapshot, commits, and appends its audit
/// events before the next mutation can begin. Reads run concurrently
/// against the stores' read locks.
pub struct EngineHandle {
    config: EngineConfig,
    registry: RoleRegistry,
    store: GrievanceStore,
    audit: AuditLog,
    write_gate: Mutex<()>,
}

impl EngineHandle {
    /// Create an engine bootstrapped with the given admin principal.
    pub fn new(admin: PrincipalId) -> Self {
        Self::with_config(EngineConfig::new(admin))
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let registry = RoleRegistry::new(config.admin);
        Self {
            config,
            registry,
            store: GrievanceStore::new(),
            audit: AuditLog::default(),
            write_gate: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    pub fn store(&self) -> &GrievanceStore {
        &self.store
    }

    fn log_event(
        &self,
        actor: PrincipalId,
        subject: EventSubject,
        kind: EventKind,
        payload: Option<String>,
        timestamp: u64,
    ) -> u64 {
        self.audit.append(actor, subject, kind, payload, timestamp)
    }

    fn check_remarks(&self, remarks: &str) -> EngineResult<()> {
        let len = remarks.chars().count();
        if len > self.config.remarks_limit {
            return Err(ValidationError::RemarksTooLong {
                len,
                max: self.config.remarks_limit,
            }
            .into());
        }
        Ok(())
    }

    fn check_description(&self, description: &str) -> EngineResult<()> {
        let len = description.chars().count();
        if len == 0 {
            return Err(ValidationError::EmptyDescription.into());
        }
        if len > self.config.description_limit {
            return Err(ValidationError::DescriptionTooLong {
                len,
                max: self.config.description_limit,
            }
            .into());
        }
        Ok(())
    }

    /// Tier authority for the workflow actions that follow the shared rule.
    fn authorize_actor(&self, grievance: &Grievance, caller: PrincipalId) -> EngineResult<()> {
        let role = self.registry.role_of(caller);
        visibility::tier_authority(grievance, caller, role).map_err(EngineError::unauthorized)
    }
}

impl RoleAdministration for EngineHandle {
    fn assign_role(
        &self,
        caller: PrincipalId,
        target: PrincipalId,
        role: Role,
    ) -> EngineResult<()> {
        let _gate = self.write_gate.lock();
        self.registry.assign(caller, target, role)?;
        self.log_event(
            caller,
            EventSubject::Principal(target),
            EventKind::RoleAssigned,
            Some(role.as_str().to_string()),
            now_timestamp(),
        );
        tracing::info!(principal = %target, role = role.as_str(), "role assigned");
        Ok(())
    }

    fn revoke_role(&self, caller: PrincipalId, target: PrincipalId) -> EngineResult<()> {
        let _gate = self.write_gate.lock();
        let removed = self.registry.revoke(caller, target)?;
        self.log_event(
            caller,
            EventSubject::Principal(target),
            EventKind::RoleRevoked,
            Some(removed.as_str().to_string()),
            now_timestamp(),
        );
        tracing::info!(principal = %target, role = removed.as_str(), "role revoked");
        Ok(())
    }

    fn transfer_admin(&self, caller: PrincipalId, new_admin: PrincipalId) -> EngineResult<()> {
        let _gate = self.write_gate.lock();
        let old_admin = self.registry.transfer_admin(caller, new_admin)?;
        // One logical operation, two chained events with adjacent sequence
        // numbers.
        let now = now_timestamp();
        self.log_event(
            caller,
            EventSubject::Principal(old_admin),
            EventKind::RoleRevoked,
            Some(Role::Admin.as_str().to_string()),
            now,
        );
        self.log_event(
            caller,
            EventSubject::Principal(new_admin),
            EventKind::RoleAssigned,
            Some(Role::Admin.as_str().to_string()),
            now,
        );
        tracing::info!(%old_admin, %new_admin, "admin transferred");
        Ok(())
    }

    fn role_of(&self, principal: PrincipalId) -> Option<Role> {
        self.registry.role_of(principal)
    }
}

impl GrievanceWorkflow for EngineHandle {
    fn submit_grievance(
        &self,
        caller: PrincipalId,
        description: &str,
    ) -> EngineResult<GrievanceId> {
        let _gate = self.write_gate.lock();
        if self.registry.role_of(caller) != Some(Role::Student) {
            return Err(EngineError::unauthorized(AccessDenied::RoleRequired(
                Role::Student,
            )));
        }
        self.check_description(description)?;

        let now = now_timestamp();
        let id = self.store.create(caller, description.to_string(), now);
        self.log_event(
            caller,
            EventSubject::Grievance(id),
            EventKind::GrievanceSubmitted,
            Some(description.to_string()),
            now,
        );
        tracing::info!(grievance = %id, submitter = %caller, "grievance submitted");
        Ok(id)
    }

    fn review_grievance(&self, caller: PrincipalId, id: GrievanceId) -> EngineResult<()> {
        let _gate = self.write_gate.lock();
        let grievance = self.store.get(id)?;
        state_machine::validate_transition(
            id,
            grievance.status,
            GrievanceStatus::InReview,
            "review",
        )?;
        self.authorize_actor(&grievance, caller)?;

        let now = now_timestamp();
        self.store.update(id, now, |g| {
            g.status = GrievanceStatus::InReview;
        })?;
        self.log_event(
            caller,
            EventSubject::Grievance(id),
            EventKind::GrievanceReviewed,
            None,
            now,
        );
        tracing::debug!(grievance = %id, reviewer = %caller, "grievance in review");
        Ok(())
    }

    fn assign_to_handler(
        &self,
        caller: PrincipalId,
        id: GrievanceId,
        handler: PrincipalId,
    ) -> EngineResult<()> {
        let _gate = self.write_gate.lock();
        let grievance = self.store.get(id)?;
        state_machine::validate_transition(
            id,
            grievance.status,
            GrievanceStatus::AssignedToHandler,
            "assign",
        )?;

        let caller_tier = self.registry.role_of(caller).and_then(Role::tier);
        let assigning_tier = match grievance.assigned_by_tier {
            // Explicit re-assignment: only the tier that made the original
            // assignment may re-target the handler.
            Some(assigned_by) => {
                if caller_tier != Some(assigned_by) {
                    return Err(EngineError::unauthorized(
                        AccessDenied::ReassignmentTierMismatch { id, assigned_by },
                    ));
                }
                assigned_by
            }
            None => {
                let tier = grievance.escalation_tier;
                if caller_tier != Some(tier) {
                    return Err(EngineError::unauthorized(AccessDenied::TierMismatch {
                        id,
                        tier,
                        caller_role: self.registry.role_of(caller),
                    }));
                }
                if !tier.may_delegate() {
                    return Err(EngineError::unauthorized(AccessDenied::TierCannotDelegate {
                        id,
                        tier,
                    }));
                }
                tier
            }
        };

        if self.registry.role_of(handler) != Some(Role::Hod) {
            return Err(EngineError::unauthorized(AccessDenied::HandlerNotEligible {
                required: Role::Hod,
            }));
        }

        let now = now_timestamp();
        self.store.update(id, now, |g| {
            g.assigned_handler = Some(handler);
            g.assigned_by_tier = Some(assigning_tier);
            g.escalation_tier = EscalationTier::Hod;
            g.status = GrievanceStatus::AssignedToHandler;
        })?;
        self.log_event(
            caller,
            EventSubject::Grievance(id),
            EventKind::HandlerAssigned,
            Some(handler.to_string()),
            now,
        );
        tracing::debug!(grievance = %id, %handler, "handler assigned");
        Ok(())
    }

    fn resolve_grievance(
        &self,
        caller: PrincipalId,
        id: GrievanceId,
        remarks: &str,
    ) -> EngineResult<()> {
        let _gate = self.write_gate.lock();
        let grievance = self.store.get(id)?;
        state_machine::validate_transition(
            id,
            grievance.status,
            GrievanceStatus::Resolved,
            "resolve",
        )?;
        self.authorize_actor(&grievance, caller)?;
        self.check_remarks(remarks)?;

        let now = now_timestamp();
        self.store.update(id, now, |g| {
            g.status = GrievanceStatus::Resolved;
            g.resolved_by = Some(caller);
            g.resolution_remarks = Some(remarks.to_string());
        })?;
        self.log_event(
            caller,
            EventSubject::Grievance(id),
            EventKind::GrievanceResolved,
            Some(remarks.to_string()),
            now,
        );
        tracing::info!(grievance = %id, resolver = %caller, "grievance resolved");
        Ok(())
    }

    fn escalate_grievance(
        &self,
        caller: PrincipalId,
        id: GrievanceId,
        remarks: &str,
    ) -> EngineResult<()> {
        let _gate = self.write_gate.lock();
        let grievance = self.store.get(id)?;
        state_machine::validate_transition(
            id,
            grievance.status,
            GrievanceStatus::Escalated,
            "escalate",
        )?;
        self.authorize_actor(&grievance, caller)?;
        let next_tier = grievance
            .escalation_tier
            .next()
            .ok_or(EngineError::TerminalLevel(id))?;
        self.check_remarks(remarks)?;

        let now = now_timestamp();
        self.store.update(id, now, |g| {
            g.escalation_tier = next_tier;
            g.assigned_handler = None;
            g.assigned_by_tier = None;
            g.status = GrievanceStatus::Escalated;
        })?;
        self.log_event(
            caller,
            EventSubject::Grievance(id),
            EventKind::GrievanceEscalated,
            Some(remarks.to_string()),
            now,
        );
        tracing::info!(grievance = %id, tier = ?next_tier, "grievance escalated");
        Ok(())
    }

    fn close_grievance(
        &self,
        caller: PrincipalId,
        id: GrievanceId,
        remarks: &str,
    ) -> EngineResult<()> {
        let _gate = self.write_gate.lock();
        let grievance = self.store.get(id)?;
        state_machine::validate_transition(id, grievance.status, GrievanceStatus::Closed, "close")?;
        if self.registry.role_of(caller) != Some(Role::Dean) {
            return Err(EngineError::unauthorized(AccessDenied::RoleRequired(
                Role::Dean,
            )));
        }
        self.check_remarks(remarks)?;

        let now = now_timestamp();
        self.store.update(id, now, |g| {
            g.status = GrievanceStatus::Closed;
            g.resolved_by = Some(caller);
            g.resolution_remarks = Some(remarks.to_string());
        })?;
        self.log_event(
            caller,
            EventSubject::Grievance(id),
            EventKind::GrievanceClosed,
            Some(remarks.to_string()),
            now,
        );
        tracing::info!(grievance = %id, dean = %caller, "grievance closed");
        Ok(())
    }
}

impl VisibilityQueries for EngineHandle {
    fn get_grievance(&self, caller: PrincipalId, id: GrievanceId) -> EngineResult<Grievance> {
        let grievance = self.store.get(id)?;
        let role = self.registry.role_of(caller);
        if visibility::can_view(&grievance, caller, role) {
            Ok(grievance)
        } else {
            Err(EngineError::unauthorized(AccessDenied::NotVisible { id }))
        }
    }

    fn list_visible(&self, caller: PrincipalId) -> Vec<GrievanceId> {
        let role = self.registry.role_of(caller);
        visibility::visible_ids(&self.store, caller, role)
    }

    fn list_all(&self, caller: PrincipalId) -> EngineResult<Vec<GrievanceId>> {
        if !self.registry.is_admin(caller) {
            return Err(EngineError::unauthorized(AccessDenied::RoleRequired(
                Role::Admin,
            )));
        }
        Ok(self.store.all_ids())
    }
}

impl AuditQueries for EngineHandle {
    fn events_for(&self, id: GrievanceId) -> Vec<Event> {
        self.audit.events_for(id)
    }

    fn events(&self) -> Vec<Event> {
        self.audit.events()
    }

    fn verify_integrity(&self) -> EngineResult<IntegrityReport> {
        let events_checked = self.audit.len();
        match self.audit.verify_integrity() {
            Ok(()) => Ok(IntegrityReport {
                valid: true,
                events_checked,
                first_invalid_seq: None,
            }),
            Err(LogError::IntegrityViolation { seq }) => Ok(IntegrityReport {
                valid: false,
                events_checked,
                first_invalid_seq: Some(seq),
            }),
        }
    }
}
