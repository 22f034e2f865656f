use crate::error::{EngineError, EngineResult};
use crate::types::{
    EscalationTier, Grievance, GrievanceId, GrievanceStatus, PrincipalId, Timestamp,
};
use crate::visibility::VisibilityIndex;
use parking_lot::RwLock;
use std::collections::BTreeMap;

struct StoreInner {
    records: BTreeMap<GrievanceId, Grievance>,
    next_id: u64,
    index: VisibilityIndex,
}

/// Grievance records keyed by dense sequential id. Creation is append-only;
/// records are never deleted; field updates happen only through the engine
/// via `update`, which also refreshes the visibility indices.
pub struct GrievanceStore {
    inner: RwLock<StoreInner>,
}

impl GrievanceStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                records: BTreeMap::new(),
                next_id: 1,
                index: VisibilityIndex::default(),
            }),
        }
    }

    /// Insert a new record in its initial state and return the assigned id.
    /// Description validation is the engine's job and has already happened.
    pub(crate) fn create(
        &self,
        submitter: PrincipalId,
        description: String,
        now: Timestamp,
    ) -> GrievanceId {
        let mut inner = self.inner.write();
        let id = GrievanceId(inner.next_id);
        inner.next_id += 1;
        let grievance = Grievance {
            id,
            submitter,
            description,
            status: GrievanceStatus::Submitted,
            escalation_tier: EscalationTier::Counselor,
            assigned_handler: None,
            assigned_by_tier: None,
            submitted_at: now,
            last_updated_at: now,
            resolution_remarks: None,
            resolved_by: None,
        };
        inner.index.note_created(&grievance);
        inner.records.insert(id, grievance);
        id
    }

    /// Snapshot of one record.
    pub fn get(&self, id: GrievanceId) -> EngineResult<Grievance> {
        self.inner
            .read()
            .records
            .get(&id)
            .cloned()
            .ok_or(EngineError::NotFound(id))
    }

    /// Apply an already-validated mutation in place, bump `last_updated_at`,
    /// and refresh the indices from the old/new delta.
    pub(crate) fn update(
        &self,
        id: GrievanceId,
        now: Timestamp,
        mutate: impl FnOnce(&mut Grievance),
    ) -> EngineResult<()> {
        let mut inner = self.inner.write();
        let record = inner.records.get_mut(&id).ok_or(EngineError::NotFound(id))?;
        let old = record.clone();
        mutate(record);
        record.last_updated_at = now;
        let new = record.clone();
        inner.index.reindex(&old, &new);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }

    pub fn all_ids(&self) -> Vec<GrievanceId> {
        self.inner.read().records.keys().copied().collect()
    }

    pub fn ids_for_submitter(&self, principal: PrincipalId) -> Vec<GrievanceId> {
        self.inner.read().index.submitter_ids(principal)
    }

    pub fn ids_at_tier(&self, tier: EscalationTier) -> Vec<GrievanceId> {
        self.inner.read().index.tier_ids(tier)
    }

    pub fn ids_for_handler(&self, principal: PrincipalId) -> Vec<GrievanceId> {
        self.inner.read().index.handler_ids(principal)
    }

    pub fn ids_in_dean_scope(&self) -> Vec<GrievanceId> {
        self.inner.read().index.dean_ids()
    }
}

impl Default for GrievanceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_dense_and_start_at_one() {
        let store = GrievanceStore::new();
        let submitter = PrincipalId::new();
        for expected in 1..=4u64 {
            let id = store.create(submitter, format!("complaint {expected}"), expected);
            assert_eq!(id, GrievanceId(expected));
        }
        assert_eq!(store.len(), 4);
        assert_eq!(
            store.all_ids(),
            (1..=4).map(GrievanceId).collect::<Vec<_>>()
        );
    }

    #[test]
    fn get_outside_assigned_range_is_not_found() {
        let store = GrievanceStore::new();
        assert!(matches!(
            store.get(GrievanceId(1)),
            Err(EngineError::NotFound(GrievanceId(1)))
        ));
        store.create(PrincipalId::new(), "x".into(), 1);
        assert!(store.get(GrievanceId(1)).is_ok());
        assert!(store.get(GrievanceId(2)).is_err());
    }

    #[test]
    fn update_bumps_last_updated_and_reindexes() {
        let store = GrievanceStore::new();
        let id = store.create(PrincipalId::new(), "x".into(), 1);
        store
            .update(id, 9, |g| {
                g.status = GrievanceStatus::Escalated;
                g.escalation_tier = EscalationTier::YearCoordinator;
            })
            .unwrap();
        let g = store.get(id).unwrap();
        assert_eq!(g.last_updated_at, 9);
        assert_eq!(store.ids_at_tier(EscalationTier::Counselor), vec![]);
        assert_eq!(
            store.ids_at_tier(EscalationTier::YearCoordinator),
            vec![id]
        );
        assert_eq!(store.ids_in_dean_scope(), vec![id]);
    }
}
