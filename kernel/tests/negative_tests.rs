//! Negative tests - rejection paths for every failure mode in the taxonomy.

use grievance_kernel::api::{GrievanceWorkflow, RoleAdministration, VisibilityQueries};
use grievance_kernel::handle::EngineHandle;
use grievance_kernel::types::{GrievanceId, PrincipalId, Role};
use grievance_kernel::{AccessDenied, EngineError, ValidationError};

fn engine_with_roles() -> (EngineHandle, Principals) {
    let admin = PrincipalId::new();
    let engine = EngineHandle::new(admin);

    let p = Principals {
        admin,
        student: PrincipalId::new(),
        student2: PrincipalId::new(),
        counselor: PrincipalId::new(),
        coordinator: PrincipalId::new(),
        hod: PrincipalId::new(),
        hod2: PrincipalId::new(),
        dean: PrincipalId::new(),
    };

    engine.assign_role(admin, p.student, Role::Student).unwrap();
    engine.assign_role(admin, p.student2, Role::Student).unwrap();
    engine.assign_role(admin, p.counselor, Role::Counselor).unwrap();
    engine
        .assign_role(admin, p.coordinator, Role::YearCoordinator)
        .unwrap();
    engine.assign_role(admin, p.hod, Role::Hod).unwrap();
    engine.assign_role(admin, p.hod2, Role::Hod).unwrap();
    engine.assign_role(admin, p.dean, Role::Dean).unwrap();

    (engine, p)
}

struct Principals {
    admin: PrincipalId,
    student: PrincipalId,
    student2: PrincipalId,
    counselor: PrincipalId,
    coordinator: PrincipalId,
    hod: PrincipalId,
    hod2: PrincipalId,
    dean: PrincipalId,
}

#[test]
fn test_rejects_submission_from_non_student() {
    let (engine, p) = engine_with_roles();

    for caller in [p.counselor, p.hod, p.dean, p.admin, PrincipalId::new()] {
        let err = engine.submit_grievance(caller, "not a student").unwrap_err();
        assert!(err.is_unauthorized(), "caller {caller} got {err:?}");
    }
}

#[test]
fn test_rejects_description_bounds() {
    let (engine, p) = engine_with_roles();

    let err = engine.submit_grievance(p.student, "").unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ValidationError::EmptyDescription)
    ));

    let err = engine
        .submit_grievance(p.student, &"x".repeat(1001))
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ValidationError::DescriptionTooLong { len: 1001, max: 1000 })
    ));

    // Exactly at the bound is accepted.
    assert!(engine.submit_grievance(p.student, &"x".repeat(1000)).is_ok());
}

#[test]
fn test_rejects_remarks_bounds() {
    let (engine, p) = engine_with_roles();
    let id = engine.submit_grievance(p.student, "a complaint").unwrap();

    let err = engine
        .resolve_grievance(p.counselor, id, &"r".repeat(501))
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ValidationError::RemarksTooLong { len: 501, max: 500 })
    ));

    assert!(engine
        .resolve_grievance(p.counselor, id, &"r".repeat(500))
        .is_ok());
}

#[test]
fn test_rejects_wrong_tier_actions() {
    let (engine, p) = engine_with_roles();
    let id = engine.submit_grievance(p.student, "a complaint").unwrap();

    // Record sits at the Counselor tier; everyone else bounces.
    for caller in [p.coordinator, p.hod, p.dean, p.student2] {
        let err = engine.review_grievance(caller, id).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Unauthorized(AccessDenied::TierMismatch { .. })
        ));
    }
}

#[test]
fn test_rejects_escalation_past_apex() {
    let (engine, p) = engine_with_roles();
    let id = engine.submit_grievance(p.student, "a complaint").unwrap();

    engine.escalate_grievance(p.counselor, id, "up").unwrap();
    engine.escalate_grievance(p.coordinator, id, "up").unwrap();
    engine.escalate_grievance(p.hod, id, "up").unwrap();

    let err = engine.escalate_grievance(p.dean, id, "up").unwrap_err();
    assert!(
        matches!(err, EngineError::TerminalLevel(gid) if gid == id),
        "escalation at the Dean tier must fail TerminalLevel, got {err:?}"
    );
}

#[test]
fn test_rejects_close_by_non_dean() {
    let (engine, p) = engine_with_roles();
    let id = engine.submit_grievance(p.student, "a complaint").unwrap();
    engine.escalate_grievance(p.counselor, id, "up").unwrap();

    let err = engine.close_grievance(p.coordinator, id, "done").unwrap_err();
    assert!(matches!(
        err,
        EngineError::Unauthorized(AccessDenied::RoleRequired(Role::Dean))
    ));
}

#[test]
fn test_rejects_close_outside_escalated_status() {
    let (engine, p) = engine_with_roles();
    let id = engine.submit_grievance(p.student, "a complaint").unwrap();

    // Submitted is not closable, even by a Dean.
    let err = engine.close_grievance(p.dean, id, "done").unwrap_err();
    assert!(matches!(err, EngineError::InvalidStateForAction { .. }));

    engine.review_grievance(p.counselor, id).unwrap();
    let err = engine.close_grievance(p.dean, id, "done").unwrap_err();
    assert!(matches!(err, EngineError::InvalidStateForAction { .. }));
}

#[test]
fn test_closed_records_reject_every_mutation() {
    let (engine, p) = engine_with_roles();
    let id = engine.submit_grievance(p.student, "a complaint").unwrap();
    engine.escalate_grievance(p.counselor, id, "up").unwrap();
    engine.close_grievance(p.dean, id, "settled").unwrap();

    assert!(matches!(
        engine.review_grievance(p.counselor, id).unwrap_err(),
        EngineError::InvalidStateForAction { .. }
    ));
    assert!(matches!(
        engine.escalate_grievance(p.dean, id, "more").unwrap_err(),
        EngineError::InvalidStateForAction { .. }
    ));
    assert!(matches!(
        engine.assign_to_handler(p.counselor, id, p.hod).unwrap_err(),
        EngineError::InvalidStateForAction { .. }
    ));
    assert!(matches!(
        engine.close_grievance(p.dean, id, "again").unwrap_err(),
        EngineError::InvalidStateForAction { .. }
    ));
}

#[test]
fn test_rejects_unknown_grievance() {
    let (engine, p) = engine_with_roles();

    let missing = GrievanceId(99);
    assert!(matches!(
        engine.review_grievance(p.counselor, missing).unwrap_err(),
        EngineError::NotFound(GrievanceId(99))
    ));
    assert!(matches!(
        engine.get_grievance(p.student, missing).unwrap_err(),
        EngineError::NotFound(GrievanceId(99))
    ));
}

#[test]
fn test_assigned_record_locks_out_other_hods() {
    let (engine, p) = engine_with_roles();
    let id = engine.submit_grievance(p.student, "a complaint").unwrap();
    engine.assign_to_handler(p.counselor, id, p.hod).unwrap();

    let err = engine
        .resolve_grievance(p.hod2, id, "borrowing this one")
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Unauthorized(AccessDenied::HandlerOnly { .. })
    ));

    // The assigned handler is fine.
    assert!(engine.resolve_grievance(p.hod, id, "handled").is_ok());
}

#[test]
fn test_rejects_handler_without_hod_role() {
    let (engine, p) = engine_with_roles();
    let id = engine.submit_grievance(p.student, "a complaint").unwrap();

    let err = engine
        .assign_to_handler(p.counselor, id, p.student2)
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Unauthorized(AccessDenied::HandlerNotEligible { required: Role::Hod })
    ));
}

#[test]
fn test_rejects_delegation_from_non_delegating_tier() {
    let (engine, p) = engine_with_roles();
    let id = engine.submit_grievance(p.student, "a complaint").unwrap();

    // Walk the record up to the Hod tier without an assignment.
    engine.escalate_grievance(p.counselor, id, "up").unwrap();
    engine.escalate_grievance(p.coordinator, id, "up").unwrap();

    let err = engine.assign_to_handler(p.hod, id, p.hod2).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Unauthorized(AccessDenied::TierCannotDelegate { .. })
    ));
}

#[test]
fn test_students_hold_no_workflow_authority() {
    let (engine, p) = engine_with_roles();
    let id = engine.submit_grievance(p.student, "a complaint").unwrap();

    assert!(engine.review_grievance(p.student, id).unwrap_err().is_unauthorized());
    assert!(engine
        .resolve_grievance(p.student, id, "done")
        .unwrap_err()
        .is_unauthorized());
    assert!(engine
        .escalate_grievance(p.student, id, "up")
        .unwrap_err()
        .is_unauthorized());
    assert!(engine
        .assign_to_handler(p.student, id, p.hod)
        .unwrap_err()
        .is_unauthorized());
}
