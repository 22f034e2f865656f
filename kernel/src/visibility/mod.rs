//! Visibility scoping and tier authority.
//!
//! Listing goes through incrementally maintained secondary indices; the
//! single-record path re-derives the same rules and rejects rather than
//! redacts.

use crate::error::AccessDenied;
use crate::store::GrievanceStore;
use crate::types::{EscalationTier, Grievance, GrievanceId, GrievanceStatus, PrincipalId, Role};
use std::collections::{BTreeSet, HashMap};

/// Whether `caller` holds workflow authority over `grievance`.
///
/// The assigned handler always acts. With a handler set (which only happens
/// at the `Hod` tier), nobody else acts, including other `Hod` principals.
/// Otherwise authority is broad: any principal whose role matches the
/// record's current tier.
pub fn tier_authority(
    grievance: &Grievance,
    caller: PrincipalId,
    role: Option<Role>,
) -> Result<(), AccessDenied> {
    if grievance.assigned_handler == Some(caller) {
        return Ok(());
    }
    if grievance.assigned_handler.is_some() {
        return Err(AccessDenied::HandlerOnly { id: grievance.id });
    }
    if role == Some(grievance.escalation_tier.role()) {
        return Ok(());
    }
    Err(AccessDenied::TierMismatch {
        id: grievance.id,
        tier: grievance.escalation_tier,
        caller_role: role,
    })
}

/// Single-record visibility rule, re-derived per role.
pub fn can_view(grievance: &Grievance, caller: PrincipalId, role: Option<Role>) -> bool {
    match role {
        Some(Role::Student) => grievance.submitter == caller,
        Some(Role::Counselor) => grievance.escalation_tier == EscalationTier::Counselor,
        Some(Role::YearCoordinator) => {
            grievance.escalation_tier == EscalationTier::YearCoordinator
        }
        Some(Role::Hod) => grievance.assigned_handler == Some(caller),
        Some(Role::Dean) => matches!(
            grievance.status,
            GrievanceStatus::Escalated | GrievanceStatus::Closed
        ),
        // The admin's elevated read covers point fetch; bulk listing stays
        // behind the separate list_all operation.
        Some(Role::Admin) => true,
        None => false,
    }
}

/// Ids a principal may enumerate, from the indices. Admin gets the empty set
/// here; `list_all` is the elevated listing.
pub fn visible_ids(
    store: &GrievanceStore,
    caller: PrincipalId,
    role: Option<Role>,
) -> Vec<GrievanceId> {
    match role {
        Some(Role::Student) => store.ids_for_submitter(caller),
        Some(Role::Counselor) => store.ids_at_tier(EscalationTier::Counselor),
        Some(Role::YearCoordinator) => store.ids_at_tier(EscalationTier::YearCoordinator),
        Some(Role::Hod) => store.ids_for_handler(caller),
        Some(Role::Dean) => store.ids_in_dean_scope(),
        Some(Role::Admin) | None => Vec::new(),
    }
}

/// Secondary indices over the grievance records, maintained on every
/// create/update instead of rescanning the store per query.
#[derive(Debug, Default)]
pub struct VisibilityIndex {
    by_submitter: HashMap<PrincipalId, BTreeSet<GrievanceId>>,
    by_tier: HashMap<EscalationTier, BTreeSet<GrievanceId>>,
    by_handler: HashMap<PrincipalId, BTreeSet<GrievanceId>>,
    dean_scope: BTreeSet<GrievanceId>,
}

impl VisibilityIndex {
    pub(crate) fn note_created(&mut self, grievance: &Grievance) {
        self.by_submitter
            .entry(grievance.submitter)
            .or_default()
            .insert(grievance.id);
        self.by_tier
            .entry(grievance.escalation_tier)
            .or_default()
            .insert(grievance.id);
        debug_assert!(grievance.assigned_handler.is_none());
        debug_assert!(!in_dean_scope(grievance.status));
    }

    /// Apply the index delta between a record's previous and current state.
    pub(crate) fn reindex(&mut self, old: &Grievance, new: &Grievance) {
        if old.escalation_tier != new.escalation_tier {
            if let Some(set) = self.by_tier.get_mut(&old.escalation_tier) {
                set.remove(&old.id);
            }
            self.by_tier
                .entry(new.escalation_tier)
                .or_default()
                .insert(new.id);
        }
        if old.assigned_handler != new.assigned_handler {
            if let Some(handler) = old.assigned_handler {
                if let Some(set) = self.by_handler.get_mut(&handler) {
                    set.remove(&old.id);
                }
            }
            if let Some(handler) = new.assigned_handler {
                self.by_handler.entry(handler).or_default().insert(new.id);
            }
        }
        match (in_dean_scope(old.status), in_dean_scope(new.status)) {
            (false, true) => {
                self.dean_scope.insert(new.id);
            }
            (true, false) => {
                self.dean_scope.remove(&old.id);
            }
            _ => {}
        }
    }

    pub(crate) fn submitter_ids(&self, principal: PrincipalId) -> Vec<GrievanceId> {
        self.by_submitter
            .get(&principal)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default()
    }

    pub(crate) fn tier_ids(&self, tier: EscalationTier) -> Vec<GrievanceId> {
        self.by_tier
            .get(&tier)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default()
    }

    pub(crate) fn handler_ids(&self, principal: PrincipalId) -> Vec<GrievanceId> {
        self.by_handler
            .get(&principal)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default()
    }

    pub(crate) fn dean_ids(&self) -> Vec<GrievanceId> {
        self.dean_scope.iter().copied().collect()
    }
}

fn in_dean_scope(status: GrievanceStatus) -> bool {
    matches!(
        status,
        GrievanceStatus::Escalated | GrievanceStatus::Closed
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::now_timestamp;

    fn sample(id: u64, submitter: PrincipalId) -> Grievance {
        Grievance {
            id: GrievanceId(id),
            submitter,
            description: "sample".to_string(),
            status: GrievanceStatus::Submitted,
            escalation_tier: EscalationTier::Counselor,
            assigned_handler: None,
            assigned_by_tier: None,
            submitted_at: now_timestamp(),
            last_updated_at: now_timestamp(),
            resolution_remarks: None,
            resolved_by: None,
        }
    }

    #[test]
    fn handler_assignment_locks_out_same_role_peers() {
        let handler = PrincipalId::new();
        let other_hod = PrincipalId::new();
        let mut g = sample(1, PrincipalId::new());
        g.escalation_tier = EscalationTier::Hod;
        g.assigned_handler = Some(handler);

        assert!(tier_authority(&g, handler, Some(Role::Hod)).is_ok());
        assert!(matches!(
            tier_authority(&g, other_hod, Some(Role::Hod)),
            Err(AccessDenied::HandlerOnly { .. })
        ));
    }

    #[test]
    fn unassigned_hod_tier_record_accepts_any_hod() {
        let mut g = sample(1, PrincipalId::new());
        g.escalation_tier = EscalationTier::Hod;
        assert!(tier_authority(&g, PrincipalId::new(), Some(Role::Hod)).is_ok());
        assert!(tier_authority(&g, PrincipalId::new(), Some(Role::Counselor)).is_err());
    }

    #[test]
    fn dean_sees_escalated_and_closed_only() {
        let dean = PrincipalId::new();
        let mut g = sample(1, PrincipalId::new());
        assert!(!can_view(&g, dean, Some(Role::Dean)));
        g.status = GrievanceStatus::Escalated;
        assert!(can_view(&g, dean, Some(Role::Dean)));
        g.status = GrievanceStatus::Closed;
        assert!(can_view(&g, dean, Some(Role::Dean)));
    }

    #[test]
    fn reindex_moves_tier_and_dean_scope_membership() {
        let mut index = VisibilityIndex::default();
        let old = sample(1, PrincipalId::new());
        index.note_created(&old);
        assert_eq!(index.tier_ids(EscalationTier::Counselor).len(), 1);

        let mut new = old.clone();
        new.escalation_tier = EscalationTier::YearCoordinator;
        new.status = GrievanceStatus::Escalated;
        index.reindex(&old, &new);

        assert!(index.tier_ids(EscalationTier::Counselor).is_empty());
        assert_eq!(index.tier_ids(EscalationTier::YearCoordinator).len(), 1);
        assert_eq!(index.dean_ids(), vec![GrievanceId(1)]);
    }
}
