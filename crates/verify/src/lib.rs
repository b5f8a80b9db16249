//! EV Dealers admin console UI verification
//!
//! This crate drives a real browser through the console's admin login flow
//! and the dealer bulk-upload dialog, leaving screenshots behind as
//! evidence:
//! - Probes the target until it accepts connections
//! - Stages a deterministic dealer CSV fixture
//! - Renders each scenario into a self-contained Playwright script and runs
//!   it under node
//! - Folds per-step progress events into a JSON report
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Verification Runner (Rust)                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Runner                                                      │
//! │    ├── wait_until_reachable(base_url)                        │
//! │    ├── stage fixture -> dealers.csv                          │
//! │    ├── build_script(scenario) -> node -> browser             │
//! │    └── write_report() -> results.json                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Scenario (built in code)                                    │
//! │    ├── name, description, fixture?                           │
//! │    └── steps: [Step]                                         │
//! │          ├── navigate { route }                              │
//! │          ├── fill { locator, value }                         │
//! │          ├── click { locator }                               │
//! │          ├── wait_for_url { route }                          │
//! │          ├── expect_visible { locator }                      │
//! │          ├── upload_file { locator, file }                   │
//! │          └── screenshot { name }                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The generated script owns the browser session: every step runs inside one
//! `try`, and the `finally` closes the browser on all exit paths. A failing
//! step surfaces as an unsuccessful result and a non-zero exit; it never
//! leaks the session.

pub mod error;
pub mod fixture;
pub mod playwright;
pub mod probe;
pub mod runner;
pub mod scenario;

pub use error::{VerifyError, VerifyResult};
pub use runner::{Runner, RunnerConfig};
pub use scenario::{Credentials, Scenario, Step};
