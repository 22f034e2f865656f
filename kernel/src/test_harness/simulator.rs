//! Workflow simulator - randomized testing harness for the engine.
//!
//! Generates a seeded stream of valid, edge-case, and invalid operations
//! against a fixed principal population, checks every outcome against its
//! expectation, and re-verifies the engine invariants after each step.

use crate::api::{AuditQueries, GrievanceWorkflow, RoleAdministration, VisibilityQueries};
use crate::handle::EngineHandle;
use crate::state_machine;
use crate::types::{
    EscalationTier, Grievance, GrievanceId, GrievanceStatus, PrincipalId, Role,
    MAX_DESCRIPTION_LEN,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::HashMap;

/// Simulator configuration
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Total operations to execute
    pub total_operations: u64,
    /// Distribution of operation types
    pub operation_distribution: OperationDistribution,
    /// Principal population sizes
    pub students: usize,
    pub counselors: usize,
    pub coordinators: usize,
    pub hods: usize,
    pub deans: usize,
    /// Records submitted before the randomized phase starts
    pub preseeded_grievances: usize,
    /// Stop conditions
    pub stop_on_first_violation: bool,
    pub stop_on_error_count: Option<usize>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            total_operations: 10_000,
            operation_distribution: OperationDistribution::default(),
            students: 20,
            counselors: 3,
            coordinators: 3,
            hods: 4,
            deans: 2,
            preseeded_grievances: 0,
            stop_on_first_violation: true,
            stop_on_error_count: None,
        }
    }
}

/// Probability distribution for operation generation
#[derive(Debug, Clone)]
pub struct OperationDistribution {
    /// Operations constructed to be legal right now
    pub valid_ops: f64,
    /// Boundary values and benign repeats
    pub edge_cases: f64,
    /// Operations constructed to be rejected
    pub invalid_ops: f64,
}

impl Default for OperationDistribution {
    fn default() -> Self {
        Self {
            valid_ops: 0.70,
            edge_cases: 0.20,
            invalid_ops: 0.10,
        }
    }
}

/// All operations the simulator can generate
#[derive(Debug, Clone)]
pub enum SimulatedOperation {
    Submit {
        caller: PrincipalId,
        description: String,
    },
    Review {
        caller: PrincipalId,
        id: GrievanceId,
    },
    AssignHandler {
        caller: PrincipalId,
        id: GrievanceId,
        handler: PrincipalId,
    },
    Resolve {
        caller: PrincipalId,
        id: GrievanceId,
        remarks: String,
    },
    Escalate {
        caller: PrincipalId,
        id: GrievanceId,
        remarks: String,
    },
    Close {
        caller: PrincipalId,
        id: GrievanceId,
        remarks: String,
    },
    FetchRecord {
        caller: PrincipalId,
        id: GrievanceId,
    },
    ListVisible {
        caller: PrincipalId,
    },
    VerifyIntegrity,
}

impl SimulatedOperation {
    fn type_name(&self) -> &'static str {
        match self {
            SimulatedOperation::Submit { .. } => "Submit",
            SimulatedOperation::Review { .. } => "Review",
            SimulatedOperation::AssignHandler { .. } => "AssignHandler",
            SimulatedOperation::Resolve { .. } => "Resolve",
            SimulatedOperation::Escalate { .. } => "Escalate",
            SimulatedOperation::Close { .. } => "Close",
            SimulatedOperation::FetchRecord { .. } => "FetchRecord",
            SimulatedOperation::ListVisible { .. } => "ListVisible",
            SimulatedOperation::VerifyIntegrity => "VerifyIntegrity",
        }
    }
}

/// Expected result classification for an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedResult {
    ShouldSucceed,
    ShouldFail,
}

/// A violation detected during simulation
#[derive(Debug, Clone)]
pub enum Violation {
    /// Operation outcome didn't match expectation
    UnexpectedOutcome {
        operation_index: u64,
        operation: SimulatedOperation,
        expected: ExpectedResult,
        actual: Result<String, String>,
    },
    /// Invariant was violated
    Invariant(InvariantViolation),
}

/// A specific invariant violation
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    pub check: InvariantCheck,
    pub details: String,
}

/// Types of invariant checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantCheck {
    IdsAreDense,
    EscalationIsMonotonic,
    ClosedRecordsUnchanged,
    HashChainUnbroken,
    SequenceNumbersDense,
}

/// Statistics collected during simulation
#[derive(Debug, Clone, Default)]
pub struct OperationStats {
    pub total_operations: u64,
    pub successful_operations: u64,
    pub failed_operations: u64,
    pub operations_by_type: HashMap<String, u64>,
}

impl OperationStats {
    pub fn record(&mut self, operation: &SimulatedOperation, result: &Result<String, String>) {
        self.total_operations += 1;
        *self
            .operations_by_type
            .entry(operation.type_name().to_string())
            .or_insert(0) += 1;
        match result {
            Ok(_) => self.successful_operations += 1,
            Err(_) => self.failed_operations += 1,
        }
    }
}

/// Final report from the simulator
#[derive(Debug, Clone)]
pub struct SimulatorReport {
    pub config: SimulatorConfig,
    pub stats: OperationStats,
    pub violations: Vec<Violation>,
    pub final_grievance_count: usize,
    pub final_event_count: usize,
}

impl SimulatorReport {
    /// Check if simulation passed all criteria
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Generate a text report
    pub fn generate_text(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Workflow Simulator Report ===\n\n");
        report.push_str(&format!("Seed: {}\n", self.config.seed));
        report.push_str(&format!("Total Operations: {}\n", self.stats.total_operations));
        report.push_str(&format!("Successful: {}\n", self.stats.successful_operations));
        report.push_str(&format!("Failed: {}\n", self.stats.failed_operations));
        report.push_str(&format!("Violations: {}\n", self.violations.len()));
        report.push_str(&format!("Final Grievances: {}\n", self.final_grievance_count));
        report.push_str(&format!("Final Audit Events: {}\n", self.final_event_count));

        if !self.violations.is_empty() {
            report.push_str("\n=== Violations ===\n");
            for (i, v) in self.violations.iter().enumerate() {
                report.push_str(&format!("{}. {:?}\n", i + 1, v));
            }
        }

        report.push_str(&format!(
            "\n=== Result: {} ===\n",
            if self.passed() { "PASS" } else { "FAIL" }
        ));

        report
    }
}

/// The fixed principal population a run executes against.
struct Population {
    admin: PrincipalId,
    students: Vec<PrincipalId>,
    counselors: Vec<PrincipalId>,
    coordinators: Vec<PrincipalId>,
    hods: Vec<PrincipalId>,
    deans: Vec<PrincipalId>,
    /// A principal that never receives a role.
    outsider: PrincipalId,
}

impl Population {
    fn of_tier(&self, tier: EscalationTier) -> &[PrincipalId] {
        match tier {
            EscalationTier::Counselor => &self.counselors,
            EscalationTier::YearCoordinator => &self.coordinators,
            EscalationTier::Hod => &self.hods,
            EscalationTier::Dean => &self.deans,
        }
    }
}

fn bootstrap(config: &SimulatorConfig) -> (EngineHandle, Population) {
    let admin = PrincipalId::new();
    let engine = EngineHandle::new(admin);

    let mut grant = |count: usize, role: Role| -> Vec<PrincipalId> {
        (0..count)
            .map(|_| {
                let principal = PrincipalId::new();
                engine
                    .assign_role(admin, principal, role)
                    .expect("bootstrap role assignment");
                principal
            })
            .collect()
    };

    let population = Population {
        admin,
        students: grant(config.students.max(1), Role::Student),
        counselors: grant(config.counselors.max(1), Role::Counselor),
        coordinators: grant(config.coordinators.max(1), Role::YearCoordinator),
        hods: grant(config.hods.max(1), Role::Hod),
        deans: grant(config.deans.max(1), Role::Dean),
        outsider: PrincipalId::new(),
    };
    (engine, population)
}

/// Per-record bookkeeping used by the invariant checks.
#[derive(Default)]
struct SimTracker {
    tiers: HashMap<GrievanceId, EscalationTier>,
    closed_snapshots: HashMap<GrievanceId, Grievance>,
}

/// Run the workflow simulator
pub fn run_simulator(config: SimulatorConfig) -> SimulatorReport {
    let (engine, population) = bootstrap(&config);
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut stats = OperationStats::default();
    let mut violations = Vec::new();
    let mut tracker = SimTracker::default();

    for i in 0..config.preseeded_grievances {
        let student = population.students[i % population.students.len()];
        engine
            .submit_grievance(student, &format!("preseeded complaint {i}"))
            .expect("preseed submission");
    }

    for i in 0..config.total_operations {
        let (operation, expected) = generate_operation(
            &mut rng,
            &config.operation_distribution,
            &engine,
            &population,
        );

        let actual = execute_operation(&engine, &operation);

        let outcome_matches = match (expected, &actual) {
            (ExpectedResult::ShouldSucceed, Ok(_)) => true,
            (ExpectedResult::ShouldFail, Err(_)) => true,
            _ => false,
        };

        if !outcome_matches {
            violations.push(Violation::UnexpectedOutcome {
                operation_index: i,
                operation: operation.clone(),
                expected,
                actual: actual.clone(),
            });

            if config.stop_on_first_violation {
                break;
            }
            if let Some(max_errors) = config.stop_on_error_count {
                if violations.len() >= max_errors {
                    break;
                }
            }
        }

        if let Err(inv_violations) = EngineInvariants::check_all(&engine, &mut tracker) {
            for v in inv_violations {
                violations.push(Violation::Invariant(v));
            }
            if config.stop_on_first_violation {
                break;
            }
        }

        stats.record(&operation, &actual);
    }

    let final_grievance_count = engine.store().len();
    let final_event_count = engine.events().len();
    SimulatorReport {
        config,
        stats,
        violations,
        final_grievance_count,
        final_event_count,
    }
}

fn generate_operation(
    rng: &mut StdRng,
    distribution: &OperationDistribution,
    engine: &EngineHandle,
    population: &Population,
) -> (SimulatedOperation, ExpectedResult) {
    let r: f64 = rng.gen();

    if r < distribution.valid_ops {
        (
            generate_valid_operation(rng, engine, population),
            ExpectedResult::ShouldSucceed,
        )
    } else if r < distribution.valid_ops + distribution.edge_cases {
        (
            generate_edge_case_operation(rng, engine, population),
            ExpectedResult::ShouldSucceed,
        )
    } else {
        (
            generate_invalid_operation(rng, engine, population),
            ExpectedResult::ShouldFail,
        )
    }
}

fn pick<'a, T>(rng: &mut StdRng, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        None
    } else {
        Some(&items[rng.gen_range(0..items.len())])
    }
}

fn records(engine: &EngineHandle) -> Vec<Grievance> {
    engine
        .store()
        .all_ids()
        .into_iter()
        .filter_map(|id| engine.store().get(id).ok())
        .collect()
}

fn records_where(engine: &EngineHandle, predicate: impl Fn(&Grievance) -> bool) -> Vec<Grievance> {
    records(engine).into_iter().filter(|g| predicate(g)).collect()
}

/// The principal the engine would accept for a workflow action on `record`.
fn authorized_actor(
    rng: &mut StdRng,
    record: &Grievance,
    population: &Population,
) -> PrincipalId {
    if let Some(handler) = record.assigned_handler {
        return handler;
    }
    *pick(rng, population.of_tier(record.escalation_tier)).expect("non-empty tier population")
}

fn submit_op(rng: &mut StdRng, population: &Population) -> SimulatedOperation {
    let student = *pick(rng, &population.students).expect("students");
    SimulatedOperation::Submit {
        caller: student,
        description: format!("complaint #{}", rng.gen_range(0..u32::MAX)),
    }
}

/// Generate an operation that is legal against the current state.
fn generate_valid_operation(
    rng: &mut StdRng,
    engine: &EngineHandle,
    population: &Population,
) -> SimulatedOperation {
    use GrievanceStatus::*;

    for _ in 0..8 {
        match rng.gen_range(0..8) {
            0 => return submit_op(rng, population),
            1 => {
                let eligible =
                    records_where(engine, |g| matches!(g.status, Submitted | InReview | Escalated));
                if let Some(g) = pick(rng, &eligible) {
                    return SimulatedOperation::Review {
                        caller: authorized_actor(rng, g, population),
                        id: g.id,
                    };
                }
            }
            2 => {
                let eligible = records_where(engine, |g| {
                    matches!(g.status, Submitted | InReview | Escalated)
                        && g.escalation_tier.may_delegate()
                });
                if let Some(g) = pick(rng, &eligible) {
                    let caller =
                        *pick(rng, population.of_tier(g.escalation_tier)).expect("tier population");
                    let handler = *pick(rng, &population.hods).expect("hods");
                    return SimulatedOperation::AssignHandler {
                        caller,
                        id: g.id,
                        handler,
                    };
                }
            }
            3 => {
                let eligible = records_where(engine, |g| state_machine::is_actionable(g.status));
                if let Some(g) = pick(rng, &eligible) {
                    return SimulatedOperation::Resolve {
                        caller: authorized_actor(rng, g, population),
                        id: g.id,
                        remarks: "handled at current tier".to_string(),
                    };
                }
            }
            4 => {
                let eligible = records_where(engine, |g| {
                    state_machine::is_actionable(g.status)
                        && g.escalation_tier != EscalationTier::Dean
                });
                if let Some(g) = pick(rng, &eligible) {
                    return SimulatedOperation::Escalate {
                        caller: authorized_actor(rng, g, population),
                        id: g.id,
                        remarks: "needs a higher tier".to_string(),
                    };
                }
            }
            5 => {
                let eligible = records_where(engine, |g| g.status == Escalated);
                if let Some(g) = pick(rng, &eligible) {
                    let dean = *pick(rng, &population.deans).expect("deans");
                    return SimulatedOperation::Close {
                        caller: dean,
                        id: g.id,
                        remarks: "closed at apex".to_string(),
                    };
                }
            }
            6 => {
                let all = records(engine);
                if let Some(g) = pick(rng, &all) {
                    return SimulatedOperation::FetchRecord {
                        caller: g.submitter,
                        id: g.id,
                    };
                }
            }
            _ => {
                let caller = *pick(rng, &population.students).expect("students");
                return SimulatedOperation::ListVisible { caller };
            }
        }
    }
    submit_op(rng, population)
}

/// Boundary values and benign repeats; all expected to succeed.
fn generate_edge_case_operation(
    rng: &mut StdRng,
    engine: &EngineHandle,
    population: &Population,
) -> SimulatedOperation {
    use GrievanceStatus::*;

    match rng.gen_range(0..5) {
        0 => {
            let student = *pick(rng, &population.students).expect("students");
            SimulatedOperation::Submit {
                caller: student,
                description: "x".repeat(MAX_DESCRIPTION_LEN),
            }
        }
        1 => {
            // Empty remarks are within bounds.
            let eligible = records_where(engine, |g| state_machine::is_actionable(g.status));
            match pick(rng, &eligible) {
                Some(g) => SimulatedOperation::Resolve {
                    caller: authorized_actor(rng, g, population),
                    id: g.id,
                    remarks: String::new(),
                },
                None => submit_op(rng, population),
            }
        }
        2 => {
            // Repeated review is a legal self-transition.
            let eligible = records_where(engine, |g| g.status == InReview);
            match pick(rng, &eligible) {
                Some(g) => SimulatedOperation::Review {
                    caller: authorized_actor(rng, g, population),
                    id: g.id,
                },
                None => submit_op(rng, population),
            }
        }
        3 => SimulatedOperation::ListVisible {
            caller: population.outsider,
        },
        _ => SimulatedOperation::VerifyIntegrity,
    }
}

/// Generate an operation the engine must reject.
fn generate_invalid_operation(
    rng: &mut StdRng,
    engine: &EngineHandle,
    population: &Population,
) -> SimulatedOperation {
    use GrievanceStatus::*;

    let missing_id = GrievanceId(engine.store().len() as u64 + 1000);
    match rng.gen_range(0..6) {
        0 => {
            // Only students submit.
            let caller = *pick(rng, &population.counselors).expect("counselors");
            SimulatedOperation::Submit {
                caller,
                description: "submitted from the wrong role".to_string(),
            }
        }
        1 => {
            let student = *pick(rng, &population.students).expect("students");
            SimulatedOperation::Submit {
                caller: student,
                description: "x".repeat(MAX_DESCRIPTION_LEN + 1),
            }
        }
        2 => {
            let finished = records_where(engine, |g| !state_machine::is_actionable(g.status));
            match pick(rng, &finished) {
                Some(g) => SimulatedOperation::Resolve {
                    caller: *pick(rng, &population.deans).expect("deans"),
                    id: g.id,
                    remarks: "too late".to_string(),
                },
                None => SimulatedOperation::Review {
                    caller: *pick(rng, &population.counselors).expect("counselors"),
                    id: missing_id,
                },
            }
        }
        3 => {
            // Students hold no tier authority.
            let actionable = records_where(engine, |g| state_machine::is_actionable(g.status));
            match pick(rng, &actionable) {
                Some(g) => SimulatedOperation::Escalate {
                    caller: *pick(rng, &population.students).expect("students"),
                    id: g.id,
                    remarks: "student escalation".to_string(),
                },
                None => SimulatedOperation::FetchRecord {
                    caller: population.outsider,
                    id: missing_id,
                },
            }
        }
        4 => {
            // Closing is Dean-only and requires Escalated status.
            let escalated = records_where(engine, |g| g.status == Escalated);
            match pick(rng, &escalated) {
                Some(g) => SimulatedOperation::Close {
                    caller: *pick(rng, &population.counselors).expect("counselors"),
                    id: g.id,
                    remarks: "not a dean".to_string(),
                },
                None => SimulatedOperation::Close {
                    caller: *pick(rng, &population.deans).expect("deans"),
                    id: missing_id,
                    remarks: "nothing there".to_string(),
                },
            }
        }
        _ => {
            // A student fetching someone else's record.
            let foreign = records_where(engine, |g| g.submitter != population.students[0]);
            match pick(rng, &foreign) {
                Some(g) => SimulatedOperation::FetchRecord {
                    caller: population.students[0],
                    id: g.id,
                },
                None => SimulatedOperation::FetchRecord {
                    caller: population.outsider,
                    id: missing_id,
                },
            }
        }
    }
}

/// Execute an operation against the engine
fn execute_operation(
    engine: &EngineHandle,
    operation: &SimulatedOperation,
) -> Result<String, String> {
    match operation {
        SimulatedOperation::Submit {
            caller,
            description,
        } => engine
            .submit_grievance(*caller, description)
            .map(|id| format!("submitted {id}"))
            .map_err(|e| e.to_string()),
        SimulatedOperation::Review { caller, id } => engine
            .review_grievance(*caller, *id)
            .map(|_| "reviewed".to_string())
            .map_err(|e| e.to_string()),
        SimulatedOperation::AssignHandler {
            caller,
            id,
            handler,
        } => engine
            .assign_to_handler(*caller, *id, *handler)
            .map(|_| "assigned".to_string())
            .map_err(|e| e.to_string()),
        SimulatedOperation::Resolve {
            caller,
            id,
            remarks,
        } => engine
            .resolve_grievance(*caller, *id, remarks)
            .map(|_| "resolved".to_string())
            .map_err(|e| e.to_string()),
        SimulatedOperation::Escalate {
            caller,
            id,
            remarks,
        } => engine
            .escalate_grievance(*caller, *id, remarks)
            .map(|_| "escalated".to_string())
            .map_err(|e| e.to_string()),
        SimulatedOperation::Close {
            caller,
            id,
            remarks,
        } => engine
            .close_grievance(*caller, *id, remarks)
            .map(|_| "closed".to_string())
            .map_err(|e| e.to_string()),
        SimulatedOperation::FetchRecord { caller, id } => engine
            .get_grievance(*caller, *id)
            .map(|g| format!("fetched {}", g.id))
            .map_err(|e| e.to_string()),
        SimulatedOperation::ListVisible { caller } => {
            Ok(format!("{} visible", engine.list_visible(*caller).len()))
        }
        SimulatedOperation::VerifyIntegrity => engine
            .verify_integrity()
            .map_err(|e| e.to_string())
            .and_then(|report| {
                if report.valid {
                    Ok(format!("{} events intact", report.events_checked))
                } else {
                    Err(format!(
                        "chain broken at {:?}",
                        report.first_invalid_seq
                    ))
                }
            }),
    }
}

/// Engine-wide invariants re-checked after every simulated operation.
struct EngineInvariants;

impl EngineInvariants {
    fn check_all(
        engine: &EngineHandle,
        tracker: &mut SimTracker,
    ) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();

        let ids = engine.store().all_ids();
        for (i, id) in ids.iter().enumerate() {
            if id.0 != i as u64 + 1 {
                violations.push(InvariantViolation {
                    check: InvariantCheck::IdsAreDense,
                    details: format!("expected id {} at position {i}, found {id}", i + 1),
                });
                break;
            }
        }

        for id in &ids {
            let Ok(record) = engine.store().get(*id) else {
                continue;
            };
            if let Some(previous) = tracker.tiers.insert(*id, record.escalation_tier) {
                if record.escalation_tier < previous {
                    violations.push(InvariantViolation {
                        check: InvariantCheck::EscalationIsMonotonic,
                        details: format!(
                            "grievance {id} regressed from {previous:?} to {:?}",
                            record.escalation_tier
                        ),
                    });
                }
            }
            if record.status == GrievanceStatus::Closed {
                match tracker.closed_snapshots.get(id) {
                    None => {
                        tracker.closed_snapshots.insert(*id, record.clone());
                    }
                    Some(snapshot) => {
                        if snapshot.last_updated_at != record.last_updated_at
                            || snapshot.resolved_by != record.resolved_by
                            || snapshot.resolution_remarks != record.resolution_remarks
                            || snapshot.escalation_tier != record.escalation_tier
                        {
                            violations.push(InvariantViolation {
                                check: InvariantCheck::ClosedRecordsUnchanged,
                                details: format!("grievance {id} mutated after close"),
                            });
                        }
                    }
                }
            }
        }

        let events = engine.events();
        for (i, event) in events.iter().enumerate() {
            if event.seq != i as u64 + 1 {
                violations.push(InvariantViolation {
                    check: InvariantCheck::SequenceNumbersDense,
                    details: format!("expected seq {} at position {i}, found {}", i + 1, event.seq),
                });
                break;
            }
        }

        if let Ok(report) = engine.verify_integrity() {
            if !report.valid {
                violations.push(InvariantViolation {
                    check: InvariantCheck::HashChainUnbroken,
                    details: format!("first invalid seq: {:?}", report.first_invalid_seq),
                });
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}
