use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, Command};
use grievance_kernel::api::{AuditQueries, GrievanceWorkflow, RoleAdministration};
use grievance_kernel::handle::EngineHandle;
use grievance_kernel::test_harness::{run_simulator, SimulatorConfig, TestHarness};
use grievance_kernel::types::{PrincipalId, Role};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Command::new("grievance-kernel")
        .version("0.1.0")
        .about("Grievance workflow kernel")
        .arg_required_else_help(false)
        .subcommand(
            Command::new("simulate")
                .about("Run the randomized workflow simulator")
                .arg(
                    Arg::new("operations")
                        .long("ops")
                        .default_value("10000")
                        .value_parser(value_parser!(u64))
                        .help("Number of operations to simulate"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("stop-on-violation")
                        .long("stop-on-violation")
                        .action(ArgAction::SetTrue)
                        .help("Stop simulation on first violation"),
                ),
        )
        .subcommand(
            Command::new("stress")
                .about("Run stress test")
                .arg(
                    Arg::new("grievances")
                        .long("grievances")
                        .default_value("10000")
                        .value_parser(value_parser!(usize))
                        .help("Number of grievances to preseed"),
                )
                .arg(
                    Arg::new("iterations")
                        .long("iterations")
                        .default_value("5000")
                        .value_parser(value_parser!(u64))
                        .help("Number of randomized operations"),
                ),
        )
        .subcommand(Command::new("certify").about("Run the multi-seed certification sweep"))
        .subcommand(Command::new("validate-log").about("Run a workload and verify the audit chain"))
        .subcommand(
            Command::new("demo")
                .about("Run the canonical escalation path and print its audit trail")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output events as JSON"),
                ),
        );

    let matches = cli.get_matches();

    match matches.subcommand() {
        Some(("simulate", args)) => {
            let operations = *args.get_one::<u64>("operations").unwrap();
            let seed = *args.get_one::<u64>("seed").unwrap();
            let stop_on_violation = args.get_flag("stop-on-violation");

            println!("Running workflow simulator...");
            println!("Operations: {}", operations);
            println!("Seed: {}", seed);
            println!();

            let config = SimulatorConfig {
                seed,
                total_operations: operations,
                stop_on_first_violation: stop_on_violation,
                ..Default::default()
            };

            let report = run_simulator(config);

            println!("{}", report.generate_text());

            std::process::exit(if report.passed() { 0 } else { 1 });
        }
        Some(("stress", args)) => {
            let grievances = *args.get_one::<usize>("grievances").unwrap();
            let iterations = *args.get_one::<u64>("iterations").unwrap();

            println!("Running stress test...");
            println!("Grievances: {}", grievances);
            println!("Iterations: {}", iterations);
            println!();

            let report = TestHarness::run_stress_test(grievances, iterations);

            println!("Stress Test Report:");
            println!("  Grievances: {}", report.grievances);
            println!("  Iterations: {}", report.iterations);
            println!("  Violations: {}", report.violations);
            println!("  Success: {}", report.success);

            std::process::exit(if report.success { 0 } else { 1 });
        }
        Some(("certify", _)) => {
            println!("Running certification sweep...");

            let report = TestHarness::run_certification();

            println!("Certification Report:");
            println!("  Seeds tested: {}", report.seeds_tested);
            println!("  Violations: {}", report.total_violations);
            println!("  Passed: {}", report.passed);

            std::process::exit(if report.passed { 0 } else { 1 });
        }
        Some(("validate-log", _)) => {
            println!("Building demo workload and validating audit chain...");
            let (engine, _) = demo_workload()?;
            let report = engine.verify_integrity()?;
            println!(
                "Log integrity: {}",
                if report.valid { "VALID" } else { "INVALID" }
            );
            println!("Events checked: {}", report.events_checked);
            if !report.valid {
                println!("First invalid sequence: {:?}", report.first_invalid_seq);
                std::process::exit(1);
            }
        }
        Some(("demo", args)) => {
            let json = args.get_flag("json");
            let (engine, id) = demo_workload()?;
            let events = engine.events_for(id);

            if json {
                println!("{}", serde_json::to_string_pretty(&events)?);
            } else {
                println!("Audit trail for grievance {id}:");
                for event in &events {
                    println!(
                        "  #{:<3} {:<22} actor={} payload={}",
                        event.seq,
                        event.kind.as_str(),
                        event.actor,
                        event.payload.as_deref().unwrap_or("-"),
                    );
                }
            }
        }
        _ => {}
    }

    Ok(())
}

/// The canonical full escalation path: submit, review, escalate, delegate,
/// escalate again, close at the apex.
fn demo_workload() -> Result<(EngineHandle, grievance_kernel::types::GrievanceId)> {
    let admin = PrincipalId::new();
    let engine = EngineHandle::new(admin);

    let student = PrincipalId::new();
    let counselor = PrincipalId::new();
    let coordinator = PrincipalId::new();
    let hod = PrincipalId::new();
    let dean = PrincipalId::new();

    engine.assign_role(admin, student, Role::Student)?;
    engine.assign_role(admin, counselor, Role::Counselor)?;
    engine.assign_role(admin, coordinator, Role::YearCoordinator)?;
    engine.assign_role(admin, hod, Role::Hod)?;
    engine.assign_role(admin, dean, Role::Dean)?;

    let id = engine.submit_grievance(student, "projector in lab 3 has been broken for weeks")?;
    engine.review_grievance(counselor, id)?;
    engine.escalate_grievance(counselor, id, "needs budget approval")?;
    engine.assign_to_handler(coordinator, id, hod)?;
    engine.escalate_grievance(hod, id, "vendor quote exceeds department budget")?;
    engine.close_grievance(dean, id, "approved replacement from the central fund")?;

    Ok((engine, id))
}
