use crate::error::LogError;
use crate::types::{GrievanceId, PrincipalId, Timestamp};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// What a single audit event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    GrievanceSubmitted,
    GrievanceReviewed,
    HandlerAssigned,
    GrievanceResolved,
    GrievanceEscalated,
    GrievanceClosed,
    RoleAssigned,
    RoleRevoked,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::GrievanceSubmitted => "grievance_submitted",
            EventKind::GrievanceReviewed => "grievance_reviewed",
            EventKind::HandlerAssigned => "handler_assigned",
            EventKind::GrievanceResolved => "grievance_resolved",
            EventKind::GrievanceEscalated => "grievance_escalated",
            EventKind::GrievanceClosed => "grievance_closed",
            EventKind::RoleAssigned => "role_assigned",
            EventKind::RoleRevoked => "role_revoked",
        }
    }
}

/// The entity an event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventSubject {
    Grievance(GrievanceId),
    Principal(PrincipalId),
}

/// One immutable audit record.
///
/// `seq` is dense and 1-based, derived from total operation order. The hash
/// chain (`prev_hash`/`hash`) makes tamper and reorder detectable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub seq: u64,
    pub timestamp: Timestamp,
    pub actor: PrincipalId,
    pub subject: EventSubject,
    pub kind: EventKind,
    pub payload: Option<String>,
    pub prev_hash: [u8; 32],
    pub hash: [u8; 32],
}

/// Append-only, strictly ordered domain event log.
#[derive(Debug, Default)]
pub struct AuditLog {
    inner: Mutex<Vec<Event>>,
}

impl AuditLog {
    /// Append one event, assigning its sequence number and chaining its hash
    /// to the predecessor. Returns the assigned sequence number.
    pub fn append(
        &self,
        actor: PrincipalId,
        subject: EventSubject,
        kind: EventKind,
        payload: Option<String>,
        timestamp: Timestamp,
    ) -> u64 {
        let mut guard = self.inner.lock();
        let seq = guard.len() as u64 + 1;
        let prev_hash = guard.last().map(|e| e.hash).unwrap_or([0u8; 32]);
        let mut event = Event {
            seq,
            timestamp,
            actor,
            subject,
            kind,
            payload,
            prev_hash,
            hash: [0u8; 32],
        };
        event.hash = compute_hash(&event);
        guard.push(event);
        seq
    }

    pub fn events(&self) -> Vec<Event> {
        self.inner.lock().clone()
    }

    /// Events about one grievance, in sequence order.
    pub fn events_for(&self, id: GrievanceId) -> Vec<Event> {
        self.inner
            .lock()
            .iter()
            .filter(|e| e.subject == EventSubject::Grievance(id))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Walk the chain and recompute every hash.
    pub fn verify_integrity(&self) -> Result<(), LogError> {
        let guard = self.inner.lock();
        let mut prev = [0u8; 32];
        for (i, e) in guard.iter().enumerate() {
            if e.seq != i as u64 + 1 {
                return Err(LogError::IntegrityViolation { seq: e.seq });
            }
            if e.prev_hash != prev {
                return Err(LogError::IntegrityViolation { seq: e.seq });
            }
            if e.hash != compute_hash(e) {
                return Err(LogError::IntegrityViolation { seq: e.seq });
            }
            prev = e.hash;
        }
        Ok(())
    }
}

fn compute_hash(event: &Event) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(event.seq.to_le_bytes());
    hasher.update(event.timestamp.to_le_bytes());
    hasher.update(event.actor.0.as_bytes());
    match event.subject {
        EventSubject::Grievance(id) => {
            hasher.update([0u8]);
            hasher.update(id.0.to_le_bytes());
        }
        EventSubject::Principal(p) => {
            hasher.update([1u8]);
            hasher.update(p.0.as_bytes());
        }
    }
    hasher.update(event.kind.as_str().as_bytes());
    hasher.update([0]);
    if let Some(payload) = &event.payload {
        hasher.update(payload.as_bytes());
    }
    hasher.update([0]);
    hasher.update(event.prev_hash);
    hasher.finalize().into()
}
