//! Typed verification scenarios for the admin console
//!
//! Scenarios are built in code rather than loaded from files: the step
//! sequences are this tool's contract with the console, and changing them
//! should be a reviewed code change.

use serde::{Deserialize, Serialize};

use crate::fixture::DealerFixture;

/// Route of the admin login form.
pub const LOGIN_ROUTE: &str = "/login";

/// Route the console lands on after a successful admin login.
pub const ADMIN_ROUTE: &str = "/admin";

/// File name of the staged dealer fixture inside the artifact directory.
pub const FIXTURE_FILE: &str = "dealers.csv";

/// Screenshot captured once the login page has settled.
pub const LOGIN_SCREENSHOT: &str = "login_page";

/// Screenshot captured after the validation preview is confirmed.
pub const FINAL_SCREENSHOT: &str = "verification";

/// Admin credentials used to drive the login form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            email: "h+admin@m.com".to_string(),
            password: "123456".to_string(),
        }
    }
}

/// A query identifying one element on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum Locator {
    /// CSS selector
    Css { selector: String },

    /// Accessible role plus accessible name
    Role { role: String, name: String },

    /// Form control tied to a label with this text
    Label { text: String },

    /// Any element containing this text
    Text { text: String },
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css { selector: selector.into() }
    }

    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Role { role: role.into(), name: name.into() }
    }

    pub fn label(text: impl Into<String>) -> Self {
        Self::Label { text: text.into() }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Compact form used in step names and failure messages.
    pub fn describe(&self) -> String {
        match self {
            Locator::Css { selector } => format!("css:{}", selector),
            Locator::Role { role, name } => format!("{}:{}", role, name),
            Locator::Label { text } => format!("label:{}", text),
            Locator::Text { text } => format!("text:{}", text),
        }
    }
}

/// A single step in a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Navigate to a route (relative to the base URL)
    Navigate {
        route: String,
    },

    /// Wait for the page load event to fire
    WaitForLoad,

    /// Capture a screenshot into the artifact directory
    Screenshot {
        name: String,
    },

    /// Fill an input with a value
    Fill {
        locator: Locator,
        value: String,
    },

    /// Click an element
    Click {
        locator: Locator,
    },

    /// Block until the page URL becomes the given route
    WaitForUrl {
        route: String,
    },

    /// Assert that an element is visible, waiting up to the default timeout
    ExpectVisible {
        locator: Locator,
    },

    /// Attach a file from the artifact directory to a file input
    UploadFile {
        locator: Locator,
        file: String,
    },
}

impl Step {
    /// Short name used in progress events and reports.
    pub fn name(&self) -> String {
        match self {
            Step::Navigate { route } => format!("navigate:{}", route),
            Step::WaitForLoad => "wait_for_load".to_string(),
            Step::Screenshot { name } => format!("screenshot:{}", name),
            Step::Fill { locator, .. } => format!("fill:{}", locator.describe()),
            Step::Click { locator } => format!("click:{}", locator.describe()),
            Step::WaitForUrl { route } => format!("wait_for_url:{}", route),
            Step::ExpectVisible { locator } => format!("expect_visible:{}", locator.describe()),
            Step::UploadFile { file, .. } => format!("upload:{}", file),
        }
    }
}

/// A named, ordered step sequence with an optional fixture to stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique name for this scenario
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Steps to execute in order
    pub steps: Vec<Step>,

    /// CSV fixture staged into the artifact directory before the run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixture: Option<DealerFixture>,
}

impl Scenario {
    /// The full verification flow: log in as admin, open the bulk-upload
    /// dialog, attach the dealer fixture, and confirm the validation preview
    /// accepts the row.
    pub fn bulk_upload(credentials: &Credentials) -> Self {
        Self::bulk_upload_with(credentials, DealerFixture::single_valid_row(), 1)
    }

    /// Bulk-upload flow with a custom fixture and expected valid-row count.
    /// Uploading a fixture the importer rejects while still expecting one
    /// valid row turns this into the negative-path scenario.
    pub fn bulk_upload_with(
        credentials: &Credentials,
        fixture: DealerFixture,
        expected_valid_rows: usize,
    ) -> Self {
        let mut steps = Self::login_steps(credentials);
        steps.extend([
            Step::Click {
                locator: Locator::role("button", "Bulk upload dealers"),
            },
            Step::ExpectVisible {
                locator: Locator::role("heading", "Bulk upload dealers"),
            },
            Step::UploadFile {
                locator: Locator::label("Select CSV or Excel file"),
                file: FIXTURE_FILE.to_string(),
            },
            Step::ExpectVisible {
                locator: Locator::text("Validation preview"),
            },
            Step::ExpectVisible {
                locator: Locator::text(format!("{} valid rows", expected_valid_rows)),
            },
            Step::Screenshot {
                name: FINAL_SCREENSHOT.to_string(),
            },
        ]);

        Self {
            name: "bulk-upload".to_string(),
            description: "Admin login and dealer bulk-upload validation preview".to_string(),
            steps,
            fixture: Some(fixture),
        }
    }

    /// Smoke variant: open the login page, capture it, stop.
    pub fn login_page() -> Self {
        Self {
            name: "login-page".to_string(),
            description: "Login page renders".to_string(),
            steps: Self::landing_steps(),
            fixture: None,
        }
    }

    /// All built-in scenarios in execution order.
    pub fn builtin(credentials: &Credentials) -> Vec<Self> {
        vec![Self::bulk_upload(credentials), Self::login_page()]
    }

    /// Look up a built-in scenario by name.
    pub fn by_name(name: &str, credentials: &Credentials) -> Option<Self> {
        Self::builtin(credentials).into_iter().find(|s| s.name == name)
    }

    /// Open the login page and capture it.
    fn landing_steps() -> Vec<Step> {
        vec![
            Step::Navigate { route: LOGIN_ROUTE.to_string() },
            Step::WaitForLoad,
            Step::Screenshot { name: LOGIN_SCREENSHOT.to_string() },
        ]
    }

    /// Landing steps plus the login form and the dashboard assertion.
    fn login_steps(credentials: &Credentials) -> Vec<Step> {
        let mut steps = Self::landing_steps();
        steps.extend([
            Step::Fill {
                locator: Locator::css(r#"input[type="email"]"#),
                value: credentials.email.clone(),
            },
            Step::Fill {
                locator: Locator::css(r#"input[type="password"]"#),
                value: credentials.password.clone(),
            },
            Step::Click {
                locator: Locator::role("button", "Login"),
            },
            Step::WaitForUrl { route: ADMIN_ROUTE.to_string() },
            Step::ExpectVisible {
                locator: Locator::role("heading", "Admin Dashboard"),
            },
        ]);
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::DealerRow;

    #[test]
    fn test_bulk_upload_step_order() {
        let scenario = Scenario::bulk_upload(&Credentials::default());
        assert_eq!(scenario.name, "bulk-upload");

        let names: Vec<String> = scenario.steps.iter().map(Step::name).collect();
        assert_eq!(
            names,
            vec![
                "navigate:/login",
                "wait_for_load",
                "screenshot:login_page",
                r#"fill:css:input[type="email"]"#,
                r#"fill:css:input[type="password"]"#,
                "click:button:Login",
                "wait_for_url:/admin",
                "expect_visible:heading:Admin Dashboard",
                "click:button:Bulk upload dealers",
                "expect_visible:heading:Bulk upload dealers",
                "upload:dealers.csv",
                "expect_visible:text:Validation preview",
                "expect_visible:text:1 valid rows",
                "screenshot:verification",
            ]
        );
    }

    #[test]
    fn test_bulk_upload_stages_one_valid_row() {
        let scenario = Scenario::bulk_upload(&Credentials::default());
        let fixture = scenario.fixture.expect("bulk-upload must stage a fixture");
        assert_eq!(fixture.rows.len(), 1);
        assert_eq!(fixture.rows[0], DealerRow::valid());
    }

    #[test]
    fn test_bulk_upload_uses_given_credentials() {
        let credentials = Credentials {
            email: "someone@example.com".to_string(),
            password: "hunter2".to_string(),
        };
        let scenario = Scenario::bulk_upload(&credentials);
        let filled: Vec<&str> = scenario
            .steps
            .iter()
            .filter_map(|s| match s {
                Step::Fill { value, .. } => Some(value.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(filled, vec!["someone@example.com", "hunter2"]);
    }

    #[test]
    fn test_negative_path_expects_zero_valid_rows() {
        let fixture = DealerFixture { rows: vec![DealerRow::invalid_latitude()] };
        let scenario = Scenario::bulk_upload_with(&Credentials::default(), fixture, 0);
        assert!(scenario.steps.contains(&Step::ExpectVisible {
            locator: Locator::text("0 valid rows"),
        }));
    }

    #[test]
    fn test_login_page_is_a_prefix_of_bulk_upload() {
        let smoke = Scenario::login_page();
        let full = Scenario::bulk_upload(&Credentials::default());
        assert_eq!(smoke.steps.len(), 3);
        assert_eq!(smoke.steps[..], full.steps[..3]);
        assert!(smoke.fixture.is_none());
    }

    #[test]
    fn test_by_name_finds_builtins() {
        let credentials = Credentials::default();
        assert!(Scenario::by_name("bulk-upload", &credentials).is_some());
        assert!(Scenario::by_name("login-page", &credentials).is_some());
        assert!(Scenario::by_name("nope", &credentials).is_none());
    }

    #[test]
    fn test_step_serialization_tags_action() {
        let step = Step::Click {
            locator: Locator::role("button", "Login"),
        };
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["action"], "click");
        assert_eq!(json["locator"]["by"], "role");
        assert_eq!(json["locator"]["name"], "Login");

        let back: Step = serde_json::from_value(json).unwrap();
        assert_eq!(back, step);
    }
}
