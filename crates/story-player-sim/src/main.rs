//! Story player simulator entry point.
//!
//! Builds a player from the JSON declaration at `STORY_PLAYER_DECLARATION`,
//! replays the command list at `STORY_PLAYER_SCRIPT` (or a default visible +
//! layout script) and logs every host event and document message.

use std::error::Error;
use std::time::Duration;

use story_player::PlayerDeclaration;
use tokio::task::LocalSet;
use tracing_subscriber::EnvFilter;

mod error;
mod headless;
mod script;

use error::SimError;
use script::{Session, default_script, parse_script};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting story player simulator");

    // Read configuration from environment.
    let declaration_path = std::env::var("STORY_PLAYER_DECLARATION").map_err(|_| {
        SimError::Config("STORY_PLAYER_DECLARATION environment variable must be set".to_owned())
    })?;
    let host_origin = std::env::var("STORY_PLAYER_HOST_ORIGIN")
        .unwrap_or_else(|_| "http://localhost".to_owned());
    let pass_timeout_ms: u64 = std::env::var("STORY_PLAYER_PASS_TIMEOUT_MS")
        .unwrap_or_else(|_| "2000".to_owned())
        .parse()
        .map_err(|e| format!("STORY_PLAYER_PASS_TIMEOUT_MS must be a valid u64: {e}"))?;

    let declaration: PlayerDeclaration =
        serde_json::from_str(&tokio::fs::read_to_string(&declaration_path).await?)
            .map_err(SimError::from)?;
    let script = match std::env::var("STORY_PLAYER_SCRIPT") {
        Ok(path) => parse_script(&tokio::fs::read_to_string(&path).await?)?,
        Err(_) => default_script(),
    };

    let local = LocalSet::new();
    local
        .run_until(async move {
            let session = Session::start(declaration, &host_origin)?
                .with_pass_timeout(Duration::from_millis(pass_timeout_ms));
            session.run(&script).await;

            let entries = serde_json::to_string(&session.entries()).map_err(SimError::from)?;
            tracing::info!(
                active = session.player().active_index(),
                events = session.events_dispatched(),
                %entries,
                "Simulation finished"
            );
            Ok::<_, SimError>(())
        })
        .await?;

    Ok(())
}
