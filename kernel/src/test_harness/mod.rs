// Test harness module
// Randomized workflow simulation and stress certification

pub mod simulator;

pub use simulator::*;

/// Test harness for running stress tests and certification
pub struct TestHarness;

impl TestHarness {
    /// Run a stress test: preseed a record population, then hammer it with
    /// randomized operations.
    pub fn run_stress_test(grievances: usize, iterations: u64) -> StressTestReport {
        let config = SimulatorConfig {
            seed: 12345,
            total_operations: iterations,
            preseeded_grievances: grievances,
            ..Default::default()
        };

        let report = run_simulator(config);

        StressTestReport {
            grievances,
            iterations,
            violations: report.violations.len(),
            success: report.passed(),
        }
    }

    /// Run certification: the full simulation across multiple seeds.
    pub fn run_certification() -> CertificationReport {
        let mut all_passed = true;
        let mut total_violations = 0;

        for seed in 0..10 {
            let config = SimulatorConfig {
                seed,
                total_operations: 5_000,
                ..Default::default()
            };

            let report = run_simulator(config);
            if !report.passed() {
                all_passed = false;
            }
            total_violations += report.violations.len();
        }

        CertificationReport {
            passed: all_passed && total_violations == 0,
            total_violations,
            seeds_tested: 10,
        }
    }
}

/// Report from a stress test
#[derive(Debug, Clone)]
pub struct StressTestReport {
    pub grievances: usize,
    pub iterations: u64,
    pub violations: usize,
    pub success: bool,
}

/// Report from certification
#[derive(Debug, Clone)]
pub struct CertificationReport {
    pub passed: bool,
    pub total_violations: usize,
    pub seeds_tested: u64,
}
