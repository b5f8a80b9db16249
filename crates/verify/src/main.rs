//! Verification runner entry point
//!
//! Drives the EV Dealers admin console through its login and bulk-upload
//! flows. Defaults assume the console runs locally on port 3000; everything
//! is overridable per run.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use evdealers_verify::playwright::{Browser, DriverConfig};
use evdealers_verify::runner::{Runner, RunnerConfig};
use evdealers_verify::scenario::{Credentials, Scenario};
use evdealers_verify::VerifyResult;

#[derive(Parser, Debug)]
#[command(name = "evdealers-verify")]
#[command(about = "UI verification runner for the EV Dealers admin console")]
struct Args {
    /// Base URL of the running console
    #[arg(long, default_value = "http://localhost:3000")]
    base_url: String,

    /// Admin login email
    #[arg(long, env = "EVDEALERS_ADMIN_EMAIL", default_value = "h+admin@m.com")]
    email: String,

    /// Admin login password
    #[arg(long, env = "EVDEALERS_ADMIN_PASSWORD", default_value = "123456")]
    password: String,

    /// Run only a specific scenario by name
    #[arg(short, long)]
    scenario: Option<String>,

    /// List built-in scenarios and exit
    #[arg(long)]
    list: bool,

    /// Directory screenshots, fixtures and the report are written to
    #[arg(long, default_value = "jules-scratch/verification")]
    artifact_dir: PathBuf,

    /// Browser to use (chromium, firefox, webkit)
    #[arg(long, default_value = "chromium")]
    browser: String,

    /// Run with a visible browser window
    #[arg(long)]
    headed: bool,

    /// Viewport width
    #[arg(long, default_value = "1280")]
    viewport_width: u32,

    /// Viewport height
    #[arg(long, default_value = "720")]
    viewport_height: u32,

    /// Default wait timeout in milliseconds (framework default when omitted)
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Seconds to wait for the console to accept connections (0 skips)
    #[arg(long, default_value = "30")]
    wait_secs: u64,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();

    if args.list {
        for scenario in Scenario::builtin(&Credentials::default()) {
            println!("{:<12} {}", scenario.name, scenario.description);
        }
        return;
    }

    // Run async main
    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    let result = rt.block_on(async_main(args));

    match result {
        Ok(success) => {
            if success {
                std::process::exit(0);
            } else {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

async fn async_main(args: Args) -> VerifyResult<bool> {
    let browser = match args.browser.as_str() {
        "firefox" => Browser::Firefox,
        "webkit" => Browser::Webkit,
        _ => Browser::Chromium,
    };

    let config = RunnerConfig {
        driver: DriverConfig {
            base_url: args.base_url,
            artifact_dir: args.artifact_dir,
            viewport_width: args.viewport_width,
            viewport_height: args.viewport_height,
            browser,
            headless: !args.headed,
            default_timeout_ms: args.timeout_ms,
        },
        credentials: Credentials {
            email: args.email,
            password: args.password,
        },
        target_wait: Duration::from_secs(args.wait_secs),
    };

    let runner = Runner::new(config)?;

    let report = match args.scenario {
        Some(name) => runner.run_named(&name).await?,
        None => runner.run_all().await?,
    };

    runner.write_report(&report)?;

    Ok(report.failed == 0)
}
