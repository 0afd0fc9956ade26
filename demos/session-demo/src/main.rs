//! Session Demo - Coordinator Walkthrough
//!
//! Drives a full account lifecycle through the session coordinator against
//! the in-memory platform: sign-up, confirmation, sign-in, profile update,
//! photo upload, signed URL and sign-out. Status changes are logged by a
//! listener, and the Prometheus rendering of the coordinator metrics is
//! printed at the end.
//!
//! # Running the Example
//!
//! ```bash
//! cargo run -p session-demo
//! ```
//!
//! Set the `IDENTITY_*` variables to use a real-looking platform
//! configuration; otherwise placeholder values are used.

#![allow(missing_docs)]

use composable_identity_core::{CoordinatorConfig, PlatformConfig};
use composable_identity_runtime::SessionCoordinator;
use composable_identity_runtime::metrics::MetricsExporter;
use composable_identity_testing::mocks::{DEFAULT_CONFIRMATION_CODE, MockPlatformRuntime};
use composable_identity_testing::test_platform_config;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const PHONE_NUMBER: &str = "+15550100";
const PASSWORD: &str = "correct-horse";

#[tokio::main]
#[allow(clippy::cognitive_complexity)] // Demo walkthrough
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,composable_identity_runtime=debug,session_demo=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Session Demo");

    // 2. Install Prometheus recorder
    let mut exporter = MetricsExporter::new();
    exporter.install()?;

    // 3. Configure the platform and attach a coordinator
    let platform_config = PlatformConfig::from_env().unwrap_or_else(|e| {
        tracing::info!(reason = %e, "Using placeholder platform configuration");
        test_platform_config()
    });
    let runtime = MockPlatformRuntime::new();
    let coordinator = SessionCoordinator::configure(
        &runtime,
        &platform_config,
        CoordinatorConfig::default().with_url_expiry(chrono::Duration::minutes(15)),
    )
    .await?;

    let listener = coordinator.listen(|status| {
        tracing::info!(%status, "Status changed");
    })?;

    // 4. Account lifecycle
    let signed_in = coordinator.is_signed_in().await;
    tracing::info!(signed_in, "Initial session probe");

    let complete = coordinator.sign_up(PHONE_NUMBER, PASSWORD).await?;
    tracing::info!(complete, "Signed up");
    coordinator.resend_sign_up_code(PHONE_NUMBER).await?;
    coordinator
        .confirm_sign_up(PHONE_NUMBER, DEFAULT_CONFIRMATION_CODE)
        .await?;
    coordinator.sign_in(PHONE_NUMBER, PASSWORD, true).await?;

    let user = coordinator.get_current_user().await?;
    tracing::info!(id = %user.id, "Current user");
    if let Some(session) = coordinator.fetch_session().await {
        tracing::info!(identity_id = ?session.identity_id, "Session fetched");
    }

    // 5. Profile
    let updated = coordinator
        .update_attributes(
            "https://cdn.example.com/ada.png",
            "Ada Lovelace",
            "Engineer",
            "Analytical Engines",
            36,
            2,
        )
        .await?;
    tracing::info!(updated, "Profile attributes submitted");
    let profile = coordinator.fetch_attributes_into_user().await?;
    tracing::info!(?profile, "Profile loaded");

    // 6. Storage
    let key = coordinator.upload("avatar.png").await?;
    let url = coordinator.get_url(&key).await?;
    tracing::info!(%key, %url, "Photo available");

    // 7. Sign out and shut down
    coordinator.sign_out().await?;
    tokio::time::sleep(Duration::from_millis(50)).await;
    coordinator.close();
    listener.closed().await;

    if let Some(rendered) = exporter.render() {
        println!("{rendered}");
    }

    tracing::info!("Session Demo finished");
    Ok(())
}
