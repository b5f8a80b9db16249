//! Target probing - waiting for the admin console to accept connections

use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{VerifyError, VerifyResult};

/// Poll the target until it answers an HTTP request, or give up.
///
/// Any response counts: readiness means a server is listening, and whether
/// the pages behave is the scenario's job to establish. A zero budget skips
/// the probe entirely.
pub async fn wait_until_reachable(base_url: &str, budget: Duration) -> VerifyResult<()> {
    if budget.is_zero() {
        return Ok(());
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;

    let start = std::time::Instant::now();
    let mut attempts = 0;

    while start.elapsed() < budget {
        attempts += 1;

        match client.get(base_url).send().await {
            Ok(_) => return Ok(()),
            Err(e) => {
                if attempts == 1 {
                    info!("Waiting for {} to accept connections...", base_url);
                }
                // Connection refused is expected while the app is starting
                if !e.is_connect() && !e.is_timeout() {
                    warn!("Probe error: {}", e);
                }
            }
        }

        sleep(Duration::from_millis(100)).await;
    }

    Err(VerifyError::TargetUnreachable {
        url: base_url.to_string(),
        attempts,
    })
}
