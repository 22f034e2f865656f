use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier for an authenticated principal.
///
/// Authentication happens outside the kernel; callers arrive as bare ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PrincipalId(pub Uuid);

impl PrincipalId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PrincipalId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Grievance identifier, assigned sequentially starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GrievanceId(pub u64);

impl std::fmt::Display for GrievanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One role per principal. `Admin` is held by exactly one principal at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Student,
    Counselor,
    YearCoordinator,
    /// Head of department. The only tier with per-principal assignment.
    Hod,
    Dean,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Counselor => "Counselor",
            Role::YearCoordinator => "YearCoordinator",
            Role::Hod => "Hod",
            Role::Dean => "Dean",
            Role::Admin => "Admin",
        }
    }

    /// The escalation tier this role holds authority over, if any.
    pub fn tier(self) -> Option<EscalationTier> {
        match self {
            Role::Counselor => Some(EscalationTier::Counselor),
            Role::YearCoordinator => Some(EscalationTier::YearCoordinator),
            Role::Hod => Some(EscalationTier::Hod),
            Role::Dean => Some(EscalationTier::Dean),
            Role::Student | Role::Admin => None,
        }
    }
}

/// The rank in the fixed hierarchy currently responsible for a grievance.
///
/// Totally ordered: `Counselor < YearCoordinator < Hod < Dean`. A record's
/// tier never regresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EscalationTier {
    Counselor,
    YearCoordinator,
    Hod,
    Dean,
}

impl EscalationTier {
    /// Next tier up, or `None` at the apex.
    pub fn next(self) -> Option<EscalationTier> {
        match self {
            EscalationTier::Counselor => Some(EscalationTier::YearCoordinator),
            EscalationTier::YearCoordinator => Some(EscalationTier::Hod),
            EscalationTier::Hod => Some(EscalationTier::Dean),
            EscalationTier::Dean => None,
        }
    }

    /// The role holding authority at this tier.
    pub fn role(self) -> Role {
        match self {
            EscalationTier::Counselor => Role::Counselor,
            EscalationTier::YearCoordinator => Role::YearCoordinator,
            EscalationTier::Hod => Role::Hod,
            EscalationTier::Dean => Role::Dean,
        }
    }

    /// Whether this tier may delegate a record to a named handler.
    pub fn may_delegate(self) -> bool {
        matches!(
            self,
            EscalationTier::Counselor | EscalationTier::YearCoordinator
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrievanceStatus {
    Submitted,
    InReview,
    AssignedToHandler,
    Escalated,
    Resolved,
    Closed,
}

/// One complaint record. Created only through the engine, never destroyed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grievance {
    pub id: GrievanceId,
    pub submitter: PrincipalId,
    pub description: String,
    pub status: GrievanceStatus,
    pub escalation_tier: EscalationTier,
    pub assigned_handler: Option<PrincipalId>,
    /// Tier that performed the handler assignment; only that tier may
    /// re-target the handler.
    pub assigned_by_tier: Option<EscalationTier>,
    pub submitted_at: Timestamp,
    pub last_updated_at: Timestamp,
    pub resolution_remarks: Option<String>,
    pub resolved_by: Option<PrincipalId>,
}

pub type Timestamp = u64;

pub fn now_timestamp() -> Timestamp {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Maximum description length, in Unicode scalar values.
pub const MAX_DESCRIPTION_LEN: usize = 1000;
/// Maximum resolution/escalation remarks length, in Unicode scalar values.
pub const MAX_REMARKS_LEN: usize = 500;
