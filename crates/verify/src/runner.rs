//! Main runner that orchestrates the target probe, fixtures, and the browser

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::{VerifyError, VerifyResult};
use crate::playwright::{DriverConfig, PlaywrightDriver, ScriptOutcome, StepReport};
use crate::probe;
use crate::scenario::{Credentials, Scenario, FIXTURE_FILE};

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepReport>,
    pub error: Option<String>,
}

/// Result of running a whole verification pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

/// Configuration for the verification runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub driver: DriverConfig,
    pub credentials: Credentials,

    /// How long to wait for the target to accept connections before the
    /// first scenario. Zero skips the probe.
    pub target_wait: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            driver: DriverConfig::default(),
            credentials: Credentials::default(),
            target_wait: Duration::from_secs(30),
        }
    }
}

/// Drives scenarios against the admin console and aggregates results.
pub struct Runner {
    driver: PlaywrightDriver,
    credentials: Credentials,
    base_url: String,
    target_wait: Duration,
}

impl Runner {
    /// Create a runner, verifying the Playwright toolchain up front.
    pub fn new(config: RunnerConfig) -> VerifyResult<Self> {
        PlaywrightDriver::check_installed()?;

        let driver = PlaywrightDriver::new(config.driver)?;

        Ok(Self {
            // The driver normalizes the base URL; probe the same form
            base_url: driver.base_url().to_string(),
            driver,
            credentials: config.credentials,
            target_wait: config.target_wait,
        })
    }

    /// Run every built-in scenario in order.
    pub async fn run_all(&self) -> VerifyResult<RunReport> {
        self.run_scenarios(&Scenario::builtin(&self.credentials)).await
    }

    /// Run a single built-in scenario by name.
    pub async fn run_named(&self, name: &str) -> VerifyResult<RunReport> {
        let scenario = Scenario::by_name(name, &self.credentials)
            .ok_or_else(|| VerifyError::UnknownScenario(name.to_string()))?;
        self.run_scenarios(std::slice::from_ref(&scenario)).await
    }

    /// Run a list of scenarios sequentially.
    ///
    /// A scenario that fails inside the browser is an unsuccessful result;
    /// only infrastructure problems (target unreachable, node missing, IO)
    /// abort the pass.
    pub async fn run_scenarios(&self, scenarios: &[Scenario]) -> VerifyResult<RunReport> {
        let start = Instant::now();

        probe::wait_until_reachable(&self.base_url, self.target_wait).await?;

        info!("Running {} scenario(s) against {}", scenarios.len(), self.base_url);

        let mut results = Vec::new();
        let mut passed = 0;
        let mut failed = 0;

        for scenario in scenarios {
            let result = self.run_scenario(scenario).await?;

            if result.success {
                passed += 1;
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                failed += 1;
                error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.push(result);
        }

        let duration_ms = start.elapsed().as_millis() as u64;

        info!("");
        info!("Verification: {} passed, {} failed ({} ms)", passed, failed, duration_ms);

        Ok(RunReport {
            total: scenarios.len(),
            passed,
            failed,
            duration_ms,
            results,
        })
    }

    /// Run a single scenario: stage its fixture, execute the generated
    /// script, and fold progress events into a result.
    pub async fn run_scenario(&self, scenario: &Scenario) -> VerifyResult<ScenarioResult> {
        let start = Instant::now();
        debug!("Running scenario: {}", scenario.name);

        if let Some(fixture) = &scenario.fixture {
            let path = self.driver.artifact_path(FIXTURE_FILE);
            fixture.write(&path)?;
            debug!("Fixture staged at {}", path.display());
        }

        let script = self.driver.build_script(scenario);
        let outcome = self.driver.run_script(&script).await?;

        Ok(fold_outcome(&scenario.name, outcome, start.elapsed().as_millis() as u64))
    }

    /// Write the aggregate report next to the screenshots.
    pub fn write_report(&self, report: &RunReport) -> VerifyResult<PathBuf> {
        let path = self.driver.artifact_path("results.json");
        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(&path, json)?;

        info!("Report written to: {}", path.display());
        Ok(path)
    }
}

/// Fold a script outcome into a scenario result, turning a step failure into
/// the result's error string.
fn fold_outcome(name: &str, outcome: ScriptOutcome, duration_ms: u64) -> ScenarioResult {
    let error = outcome
        .failure
        .map(|f| format!("step {} ({}): {}", f.step, f.name, f.message));

    ScenarioResult {
        name: name.to_string(),
        success: error.is_none(),
        duration_ms,
        steps: outcome.completed,
        error,
    }
}
