//! Playwright browser automation
//!
//! Each scenario is rendered into a self-contained Node.js script: the
//! browser is acquired at the top, every step runs inside one `try` block,
//! and a `finally` closes the browser so the session is released on every
//! exit path. The script reports progress as one JSON event per stdout line;
//! the driver folds those into step reports.

use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

use serde::{Deserialize, Serialize};
use tokio::process::Command as TokioCommand;
use tracing::debug;

use crate::error::{VerifyError, VerifyResult};
use crate::scenario::{Locator, Scenario, Step};

#[derive(Debug, Clone, Copy, Default)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// Configuration for the browser driver
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Base URL of the admin console under verification
    pub base_url: String,

    /// Directory screenshots, fixtures and reports land in
    pub artifact_dir: PathBuf,

    /// Viewport dimensions
    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Browser type
    pub browser: Browser,

    /// Whether to run without a visible window
    pub headless: bool,

    /// Default timeout for waits, in milliseconds. `None` leaves the
    /// framework default in place.
    pub default_timeout_ms: Option<u64>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            artifact_dir: PathBuf::from("jules-scratch/verification"),
            viewport_width: 1280,
            viewport_height: 720,
            browser: Browser::Chromium,
            headless: true,
            default_timeout_ms: None,
        }
    }
}

/// Timing record for one completed step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    pub step: usize,
    pub name: String,
    pub duration_ms: u64,
}

/// The step a script run stopped at, with the framework's message.
#[derive(Debug, Clone)]
pub struct StepFailure {
    pub step: usize,
    pub name: String,
    pub message: String,
}

/// Raw outcome of one script run.
///
/// A present `failure` means the browser side stopped at that step; the
/// session was still closed by the script's `finally`.
#[derive(Debug, Clone)]
pub struct ScriptOutcome {
    pub completed: Vec<StepReport>,
    pub failure: Option<StepFailure>,
}

/// One progress event emitted by the generated script.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum ScriptEvent {
    Step { step: usize, name: String, ms: u64 },
    Failed { step: usize, name: String, message: String },
    Done,
}

/// Renders scenarios into Node.js scripts and executes them.
pub struct PlaywrightDriver {
    config: DriverConfig,

    /// Absolute form of `config.artifact_dir`, embedded into scripts so they
    /// write artifacts to the right place regardless of working directory.
    artifact_dir: PathBuf,
}

impl PlaywrightDriver {
    /// Create a driver, ensuring the artifact directory exists.
    pub fn new(mut config: DriverConfig) -> VerifyResult<Self> {
        // Routes are appended verbatim; trailing slashes would double up
        let trimmed = config.base_url.trim_end_matches('/').len();
        config.base_url.truncate(trimmed);

        std::fs::create_dir_all(&config.artifact_dir)?;
        let artifact_dir = config.artifact_dir.canonicalize()?;

        Ok(Self { config, artifact_dir })
    }

    /// Base URL scripts are generated against.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Check that the Playwright toolchain is available.
    pub fn check_installed() -> VerifyResult<()> {
        let output = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(VerifyError::PlaywrightNotFound),
        }
    }

    /// Absolute path of a named artifact.
    pub fn artifact_path(&self, file: &str) -> PathBuf {
        self.artifact_dir.join(file)
    }

    /// Absolute path of a named screenshot.
    pub fn screenshot_path(&self, name: &str) -> PathBuf {
        self.artifact_dir.join(format!("{}.png", name))
    }

    /// Build the Node.js script for a whole scenario.
    pub fn build_script(&self, scenario: &Scenario) -> String {
        let mut script = String::new();

        let set_timeout = match self.config.default_timeout_ms {
            Some(ms) => format!("\n  context.setDefaultTimeout({});", ms),
            None => String::new(),
        };

        // Header: acquire the session, set up progress reporting
        script.push_str(&format!(
            r#"const {{ chromium, firefox, webkit }} = require('playwright');

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});{set_timeout}
  const page = await context.newPage();
  const baseUrl = {base_url};
  let current = {{ step: 0, name: 'launch' }};
  let mark = Date.now();
  const progress = () => {{
    console.log(JSON.stringify({{ event: 'step', step: current.step, name: current.name, ms: Date.now() - mark }}));
    mark = Date.now();
  }};

  try {{
"#,
            browser = self.config.browser.as_str(),
            headless = self.config.headless,
            width = self.config.viewport_width,
            height = self.config.viewport_height,
            set_timeout = set_timeout,
            base_url = js_str(&self.config.base_url),
        ));

        // One block per step; `current` is set before the action so the
        // catch handler can attribute a failure to the right step.
        for (i, step) in scenario.steps.iter().enumerate() {
            let name = step.name();
            script.push_str(&format!("\n    // step {}: {}\n", i + 1, name));
            script.push_str(&format!(
                "    current = {{ step: {}, name: {} }};\n",
                i + 1,
                js_str(&name)
            ));
            script.push_str(&self.step_to_js(step));
            script.push_str("\n    progress();\n");
        }

        // Footer: report, record failures without skipping the close
        script.push_str(
            r#"
    console.log(JSON.stringify({ event: 'done' }));
  } catch (error) {
    const message = error && error.message ? error.message.split('\n')[0] : String(error);
    console.log(JSON.stringify({ event: 'failed', step: current.step, name: current.name, message }));
    process.exitCode = 1;
  } finally {
    await browser.close();
  }
})();
"#,
        );

        script
    }

    /// Convert a step to JavaScript code.
    fn step_to_js(&self, step: &Step) -> String {
        match step {
            Step::Navigate { route } => {
                format!("    await page.goto(baseUrl + {});", js_str(route))
            }
            Step::WaitForLoad => "    await page.waitForLoadState();".to_string(),
            Step::Screenshot { name } => {
                let path = self.screenshot_path(name);
                format!(
                    "    await page.screenshot({{ path: {} }});",
                    js_str(&path.to_string_lossy())
                )
            }
            Step::Fill { locator, value } => {
                format!("    await {}.fill({});", locator_js(locator), js_str(value))
            }
            Step::Click { locator } => {
                format!("    await {}.click();", locator_js(locator))
            }
            Step::WaitForUrl { route } => {
                format!("    await page.waitForURL(baseUrl + {});", js_str(route))
            }
            Step::ExpectVisible { locator } => {
                format!("    await {}.waitFor({{ state: 'visible' }});", locator_js(locator))
            }
            Step::UploadFile { locator, file } => {
                let path = self.artifact_path(file);
                format!(
                    "    await {}.setInputFiles({});",
                    locator_js(locator),
                    js_str(&path.to_string_lossy())
                )
            }
        }
    }

    /// Run a generated script under node, collecting progress events.
    ///
    /// A reported step failure is part of the outcome; `Err` is reserved for
    /// the script dying without reporting (node missing, playwright module
    /// missing, syntax error) or exiting dirty after reporting completion.
    pub async fn run_script(&self, script: &str) -> VerifyResult<ScriptOutcome> {
        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("scenario.js");
        std::fs::write(&script_path, script)?;

        debug!("Running scenario script: {}", script_path.display());

        let output = TokioCommand::new("node")
            .arg(&script_path)
            .current_dir(temp_dir.path())
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        classify_run(output.status, &stdout, &stderr)
    }
}

/// Classify a finished script run.
fn classify_run(status: ExitStatus, stdout: &str, stderr: &str) -> VerifyResult<ScriptOutcome> {
    let (completed, failure, done) = parse_events(stdout);

    // A reported step failure is a scenario outcome, not a driver problem,
    // even though the script exits non-zero.
    if failure.is_some() {
        return Ok(ScriptOutcome { completed, failure });
    }

    if !done {
        return Err(VerifyError::Driver(format!(
            "script exited ({}) without reporting:\nstdout: {}\nstderr: {}",
            status,
            stdout.trim(),
            stderr.trim()
        )));
    }

    if !status.success() {
        // done arrived but the exit is dirty: the close itself threw
        return Err(VerifyError::Driver(format!(
            "script reported completion but exited ({}):\nstderr: {}",
            status,
            stderr.trim()
        )));
    }

    Ok(ScriptOutcome { completed, failure: None })
}

/// Fold the script's stdout into step reports, an optional failure, and
/// whether the terminal `done` event arrived. Non-JSON lines are ignored.
fn parse_events(stdout: &str) -> (Vec<StepReport>, Option<StepFailure>, bool) {
    let mut completed = Vec::new();
    let mut failure = None;
    let mut done = false;

    for line in stdout.lines() {
        if let Ok(event) = serde_json::from_str::<ScriptEvent>(line.trim()) {
            match event {
                ScriptEvent::Step { step, name, ms } => {
                    completed.push(StepReport { step, name, duration_ms: ms });
                }
                ScriptEvent::Failed { step, name, message } => {
                    failure = Some(StepFailure { step, name, message });
                }
                ScriptEvent::Done => done = true,
            }
        }
    }

    (completed, failure, done)
}

/// Render a Rust string as a single-quoted JavaScript string literal.
fn js_str(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Render a locator as a Playwright page query.
fn locator_js(locator: &Locator) -> String {
    match locator {
        Locator::Css { selector } => format!("page.locator({})", js_str(selector)),
        Locator::Role { role, name } => {
            format!("page.getByRole({}, {{ name: {} }})", js_str(role), js_str(name))
        }
        Locator::Label { text } => format!("page.getByLabel({})", js_str(text)),
        Locator::Text { text } => format!("page.getByText({})", js_str(text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Credentials;
    use test_case::test_case;

    fn test_driver() -> (tempfile::TempDir, PlaywrightDriver) {
        let temp = tempfile::tempdir().unwrap();
        let config = DriverConfig {
            artifact_dir: temp.path().join("artifacts"),
            ..DriverConfig::default()
        };
        let driver = PlaywrightDriver::new(config).unwrap();
        (temp, driver)
    }

    #[test_case("plain" => "'plain'" ; "plain text")]
    #[test_case("it's" => r"'it\'s'" ; "single quote")]
    #[test_case(r"back\slash" => r"'back\\slash'" ; "backslash")]
    #[test_case("two\nlines" => r"'two\nlines'" ; "newline")]
    fn test_js_str(input: &str) -> String {
        js_str(input)
    }

    #[test_case(Locator::css(r#"input[type="email"]"#), r#"page.locator('input[type="email"]')"# ; "css")]
    #[test_case(Locator::role("button", "Login"), "page.getByRole('button', { name: 'Login' })" ; "role")]
    #[test_case(Locator::label("Select CSV or Excel file"), "page.getByLabel('Select CSV or Excel file')" ; "label")]
    #[test_case(Locator::text("Validation preview"), "page.getByText('Validation preview')" ; "text")]
    fn test_locator_js(locator: Locator, expected: &str) {
        assert_eq!(locator_js(&locator), expected);
    }

    #[test]
    fn test_script_closes_browser_in_finally() {
        let (_temp, driver) = test_driver();
        let script = driver.build_script(&Scenario::bulk_upload(&Credentials::default()));

        assert_eq!(
            script.matches("await browser.close();").count(),
            1,
            "the browser must be closed exactly once"
        );
        let finally_pos = script.find("} finally {").unwrap();
        let close_pos = script.find("await browser.close();").unwrap();
        assert!(close_pos > finally_pos, "the close must live in the finally block");
    }

    #[test]
    fn test_script_failure_path_preserves_the_finally() {
        let (_temp, driver) = test_driver();
        let script = driver.build_script(&Scenario::login_page());

        assert!(script.contains("process.exitCode = 1;"));
        assert!(
            !script.contains("process.exit("),
            "exiting inside the catch would skip the finally"
        );
    }

    #[test]
    fn test_script_preserves_step_order() {
        let (_temp, driver) = test_driver();
        let script = driver.build_script(&Scenario::bulk_upload(&Credentials::default()));

        let fragments = [
            "await page.goto(baseUrl + '/login');",
            "await page.waitForLoadState();",
            "login_page.png",
            r#"await page.locator('input[type="email"]').fill('h+admin@m.com');"#,
            r#"await page.locator('input[type="password"]').fill('123456');"#,
            "await page.getByRole('button', { name: 'Login' }).click();",
            "await page.waitForURL(baseUrl + '/admin');",
            "await page.getByRole('heading', { name: 'Admin Dashboard' }).waitFor({ state: 'visible' });",
            "await page.getByRole('button', { name: 'Bulk upload dealers' }).click();",
            "await page.getByRole('heading', { name: 'Bulk upload dealers' }).waitFor({ state: 'visible' });",
            "dealers.csv",
            "await page.getByText('Validation preview').waitFor({ state: 'visible' });",
            "await page.getByText('1 valid rows').waitFor({ state: 'visible' });",
            "verification.png",
        ];

        let mut last = 0;
        for fragment in fragments {
            let pos = script
                .find(fragment)
                .unwrap_or_else(|| panic!("script missing fragment: {}", fragment));
            assert!(pos > last, "fragment out of order: {}", fragment);
            last = pos;
        }
    }

    #[test]
    fn test_script_numbers_steps_from_one() {
        let (_temp, driver) = test_driver();
        let script = driver.build_script(&Scenario::login_page());

        assert!(script.contains("// step 1: navigate:/login"));
        assert!(script.contains("// step 2: wait_for_load"));
        assert!(script.contains("// step 3: screenshot:login_page"));
        assert!(!script.contains("// step 4:"));
    }

    #[test]
    fn test_artifact_paths_are_absolute() {
        let (_temp, driver) = test_driver();
        let script = driver.build_script(&Scenario::bulk_upload(&Credentials::default()));

        let upload = driver.artifact_path("dealers.csv");
        let shot = driver.screenshot_path("verification");
        assert!(upload.is_absolute());
        assert!(script.contains(&*upload.to_string_lossy()));
        assert!(script.contains(&*shot.to_string_lossy()));
    }

    #[test]
    fn test_timeout_override_is_opt_in() {
        let temp = tempfile::tempdir().unwrap();
        let config = DriverConfig {
            artifact_dir: temp.path().join("artifacts"),
            ..DriverConfig::default()
        };
        let driver = PlaywrightDriver::new(config.clone()).unwrap();
        assert!(!driver.build_script(&Scenario::login_page()).contains("setDefaultTimeout"));

        let driver = PlaywrightDriver::new(DriverConfig {
            default_timeout_ms: Some(15000),
            ..config
        })
        .unwrap();
        assert!(driver
            .build_script(&Scenario::login_page())
            .contains("context.setDefaultTimeout(15000);"));
    }

    #[test]
    fn test_headed_mode_is_reflected() {
        let temp = tempfile::tempdir().unwrap();
        let driver = PlaywrightDriver::new(DriverConfig {
            artifact_dir: temp.path().join("artifacts"),
            headless: false,
            browser: Browser::Firefox,
            ..DriverConfig::default()
        })
        .unwrap();
        let script = driver.build_script(&Scenario::login_page());

        assert!(script.contains("await firefox.launch({ headless: false });"));
    }

    #[test]
    fn test_trailing_slash_on_base_url_is_normalized() {
        let temp = tempfile::tempdir().unwrap();
        let driver = PlaywrightDriver::new(DriverConfig {
            base_url: "http://localhost:3000/".to_string(),
            artifact_dir: temp.path().join("artifacts"),
            ..DriverConfig::default()
        })
        .unwrap();

        assert_eq!(driver.base_url(), "http://localhost:3000");

        let script = driver.build_script(&Scenario::login_page());
        assert!(script.contains("const baseUrl = 'http://localhost:3000';"));
        assert!(
            !script.contains("http://localhost:3000/'"),
            "a kept trailing slash would make routes resolve as //login"
        );
    }

    #[test]
    fn test_parse_events_success_stream() {
        let stdout = concat!(
            "Debugger attached.\n",
            r#"{"event":"step","step":1,"name":"navigate:/login","ms":812}"#,
            "\n",
            r#"{"event":"step","step":2,"name":"wait_for_load","ms":40}"#,
            "\n",
            r#"{"event":"done"}"#,
            "\n",
        );
        let (completed, failure, done) = parse_events(stdout);
        assert_eq!(completed.len(), 2);
        assert_eq!(completed[0].name, "navigate:/login");
        assert_eq!(completed[1].duration_ms, 40);
        assert!(failure.is_none());
        assert!(done);
    }

    #[test]
    fn test_parse_events_failure_stream() {
        let stdout = concat!(
            r#"{"event":"step","step":1,"name":"navigate:/login","ms":812}"#,
            "\n",
            r#"{"event":"failed","step":7,"name":"wait_for_url:/admin","message":"Timeout 30000ms exceeded."}"#,
            "\n",
        );
        let (completed, failure, done) = parse_events(stdout);
        assert_eq!(completed.len(), 1);
        let failure = failure.expect("failure event must be captured");
        assert_eq!(failure.step, 7);
        assert!(failure.message.contains("Timeout"));
        assert!(!done);
    }

    #[test]
    fn test_parse_events_ignores_noise() {
        let (completed, failure, done) = parse_events("not json\n{\"also\": \"not an event\"}\n");
        assert!(completed.is_empty());
        assert!(failure.is_none());
        assert!(!done);
    }

    #[cfg(unix)]
    fn exit_status(code: i32) -> ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        ExitStatus::from_raw(code << 8)
    }

    #[test]
    #[cfg(unix)]
    fn test_classify_run_done_with_clean_exit_is_success() {
        let stdout = concat!(
            r#"{"event":"step","step":1,"name":"navigate:/login","ms":812}"#,
            "\n",
            r#"{"event":"done"}"#,
            "\n",
        );

        let outcome = classify_run(exit_status(0), stdout, "").unwrap();
        assert_eq!(outcome.completed.len(), 1);
        assert!(outcome.failure.is_none());
    }

    #[test]
    #[cfg(unix)]
    fn test_classify_run_step_failure_is_an_outcome_not_an_error() {
        let stdout = concat!(
            r#"{"event":"step","step":6,"name":"click:button:Login","ms":95}"#,
            "\n",
            r#"{"event":"failed","step":7,"name":"wait_for_url:/admin","message":"Timeout 30000ms exceeded."}"#,
            "\n",
        );

        // The script sets a non-zero exit code on step failure; that must not
        // turn the reported failure into a driver error.
        let outcome = classify_run(exit_status(1), stdout, "").unwrap();
        assert_eq!(outcome.completed.len(), 1);
        let failure = outcome.failure.expect("the reported failure must survive");
        assert_eq!(failure.step, 7);
        assert_eq!(failure.name, "wait_for_url:/admin");
        assert_eq!(failure.message, "Timeout 30000ms exceeded.");
    }

    #[test]
    #[cfg(unix)]
    fn test_classify_run_silent_death_is_a_driver_error() {
        let err = classify_run(exit_status(1), "", "Error: Cannot find module 'playwright'")
            .unwrap_err();

        match err {
            VerifyError::Driver(message) => {
                assert!(message.contains("without reporting"));
                assert!(message.contains("Cannot find module 'playwright'"));
            }
            other => panic!("expected a driver error, got: {}", other),
        }
    }

    #[test]
    #[cfg(unix)]
    fn test_classify_run_dirty_exit_after_done_is_a_driver_error() {
        let stdout = concat!(
            r#"{"event":"step","step":1,"name":"navigate:/login","ms":812}"#,
            "\n",
            r#"{"event":"done"}"#,
            "\n",
        );

        let err = classify_run(exit_status(1), stdout, "Error: Browser closed unexpectedly")
            .unwrap_err();

        match err {
            VerifyError::Driver(message) => {
                assert!(message.contains("reported completion"));
                assert!(message.contains("Browser closed unexpectedly"));
            }
            other => panic!("expected a driver error, got: {}", other),
        }
    }
}
