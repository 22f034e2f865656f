//! Error taxonomy for the grievance kernel.
//!
//! Every precondition failure maps to one of the variants below; callers
//! inspect the result rather than catching a panic. No partial mutation ever
//! accompanies an error.

use crate::types::{EscalationTier, GrievanceId, GrievanceStatus, Role};

/// Why an action was denied for the calling principal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    /// Caller's role does not hold authority at the record's current tier.
    #[error(
        "caller role {caller_role:?} does not hold authority at tier {tier:?} of grievance {id}"
    )]
    TierMismatch {
        id: GrievanceId,
        tier: EscalationTier,
        caller_role: Option<Role>,
    },

    /// Record is assigned to a specific handler; only that handler may act.
    #[error("grievance {id} is assigned to a specific handler")]
    HandlerOnly { id: GrievanceId },

    /// Operation requires a specific role the caller does not hold.
    #[error("operation requires the {0:?} role")]
    RoleRequired(Role),

    /// Proposed handler does not hold the role the target tier requires.
    #[error("handler does not hold the {required:?} role")]
    HandlerNotEligible { required: Role },

    /// Caller's tier matches the record but holds no delegation authority.
    #[error("tier {tier:?} cannot delegate grievance {id} to a handler")]
    TierCannotDelegate {
        id: GrievanceId,
        tier: EscalationTier,
    },

    /// Record exists but is outside the caller's visibility scope.
    #[error("grievance {id} is not visible to the caller")]
    NotVisible { id: GrievanceId },

    /// Handler re-assignment attempted by a tier other than the one that
    /// made the original assignment.
    #[error("grievance {id} may only be re-assigned by the {assigned_by:?} tier")]
    ReassignmentTierMismatch {
        id: GrievanceId,
        assigned_by: EscalationTier,
    },
}

/// Text bound violations on submission or remarks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("description must not be empty")]
    EmptyDescription,

    #[error("description length {len} exceeds the {max} character bound")]
    DescriptionTooLong { len: usize, max: usize },

    #[error("remarks length {len} exceeds the {max} character bound")]
    RemarksTooLong { len: usize, max: usize },
}

/// Illegal role-registry mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoleOperationError {
    #[error("the admin cannot assign a role to itself")]
    SelfAssignment,

    #[error("the Admin role can only move through transfer_admin")]
    CannotAssignAdmin,

    #[error("the admin's own role cannot be reassigned or revoked")]
    TargetIsAdmin,

    #[error("principal is already the admin")]
    AlreadyAdmin,

    #[error("principal has no assigned role")]
    UnknownPrincipal,
}

/// Audit log integrity failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogError {
    #[error("audit log hash chain broken at sequence {seq}")]
    IntegrityViolation { seq: u64 },
}

/// Umbrella error for every engine operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("unauthorized: {0}")]
    Unauthorized(AccessDenied),

    #[error("grievance {0} not found")]
    NotFound(GrievanceId),

    #[error("cannot {action} grievance {id} in status {status:?}")]
    InvalidStateForAction {
        id: GrievanceId,
        status: GrievanceStatus,
        action: &'static str,
    },

    #[error("grievance {0} is already at the apex tier and cannot escalate")]
    TerminalLevel(GrievanceId),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("invalid role operation: {0}")]
    InvalidRoleOperation(#[from] RoleOperationError),

    #[error("audit log error: {0}")]
    Log(#[from] LogError),
}

impl EngineError {
    /// Denials of authority, as opposed to structural or validation errors.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, EngineError::Unauthorized(_))
    }

    /// Errors that indicate the record can never accept the action again
    /// (as opposed to a wrong caller retrying with the right principal).
    pub fn is_terminal_rejection(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidStateForAction { .. } | EngineError::TerminalLevel(_)
        )
    }

    pub(crate) fn unauthorized(denied: AccessDenied) -> Self {
        EngineError::Unauthorized(denied)
    }
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
