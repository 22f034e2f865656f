use crate::error::EngineError;
use crate::types::{GrievanceId, GrievanceStatus};

/// Validates a status transition.
///
/// Illegal transitions can be made to panic in debug builds with the
/// `strict-debug` feature; by default they return a typed error so callers
/// can exercise rejection paths.
pub fn validate_transition(
    id: GrievanceId,
    from: GrievanceStatus,
    to: GrievanceStatus,
    action: &'static str,
) -> Result<(), EngineError> {
    if allowed(from, to) {
        Ok(())
    } else {
        #[cfg(feature = "strict-debug")]
        panic!("Illegal status transition attempted: {:?} -> {:?}", from, to);

        Err(EngineError::InvalidStateForAction {
            id,
            status: from,
            action,
        })
    }
}

/// Self-transitions carry meaning: `InReview -> InReview` is a repeated
/// review, `AssignedToHandler -> AssignedToHandler` an explicit handler
/// re-assignment, `Escalated -> Escalated` a further escalation.
pub fn allowed_transitions(from: GrievanceStatus) -> Vec<GrievanceStatus> {
    use GrievanceStatus::*;
    match from {
        Submitted => vec![InReview, AssignedToHandler, Resolved, Escalated],
        InReview => vec![InReview, AssignedToHandler, Resolved, Escalated],
        AssignedToHandler => vec![AssignedToHandler, Resolved, Escalated],
        Escalated => vec![InReview, AssignedToHandler, Resolved, Escalated, Closed],
        Resolved => vec![],
        Closed => vec![],
    }
}

/// Whether any workflow action can still touch a record in this status.
pub fn is_actionable(status: GrievanceStatus) -> bool {
    !allowed_transitions(status).is_empty()
}

fn allowed(from: GrievanceStatus, to: GrievanceStatus) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}
