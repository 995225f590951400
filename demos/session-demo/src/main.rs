//! Walks through the SDK against a live CrateBytes project.
//!
//! ```text
//! CRATEBYTES_PUBLIC_KEY=pk_... cargo run -p session-demo [settings.json] [leaderboard-id]
//! ```
//!
//! Logs in as a guest (reusing the saved player on later runs), starts a
//! session with the heartbeat armed, reads a leaderboard, round-trips a
//! metadata object, then waits for Ctrl-C and stops the session.

use std::sync::Arc;

use cratebytes::prelude::*;
use serde::{Deserialize, Serialize};

const STORE_PATH: &str = "cratebytes-demo-auth.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Progress {
    runs: u32,
    best_score: u64,
}

fn load_config() -> Result<SdkConfig, CrateBytesError> {
    let mut config = match std::env::args().nth(1) {
        Some(path) => SdkConfig::from_json_file(path)?,
        None => SdkConfig::default(),
    };
    if let Ok(key) = std::env::var("CRATEBYTES_PUBLIC_KEY") {
        config.public_key = key;
    }
    if let Ok(url) = std::env::var("CRATEBYTES_BASE_URL") {
        config.base_url = url;
    }
    Ok(config.with_logging(true))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let leaderboard_id = std::env::args().nth(2).unwrap_or_else(|| "default".into());

    let sdk = CrateBytes::builder()
        .config(config)
        .store(Arc::new(FileStore::open(STORE_PATH)?))
        .build()?;

    let login = sdk.auth().guest_login(None).await?;
    let Some(auth) = login.data.filter(|_| login.success) else {
        eprintln!("login failed: {}", login.error.map(|e| e.message).unwrap_or_default());
        return Ok(());
    };
    eprintln!("logged in as {} (#{})", auth.player_id, auth.sequential_id);

    let started = sdk.start_session().await?;
    match started.data.as_ref().filter(|_| started.success) {
        Some(session) => {
            eprintln!("session {} started", session.id);
            sdk.start_heartbeat();
        }
        None => eprintln!("session start failed: {:?}", started.error_message()),
    }

    let page = sdk.leaderboard().get_leaderboard(&leaderboard_id, 1).await?;
    match page.into_result() {
        Ok(page) => {
            eprintln!("{}: {} entries", page.leaderboard.name, page.total_entries);
            for (rank, entry) in page.entries.iter().enumerate() {
                eprintln!("  {:>3}. {} {}", rank + 1, entry.player.player_id, entry.score);
            }
        }
        Err(error) => eprintln!("leaderboard unavailable: {error}"),
    }

    let mut progress = sdk
        .metadata()
        .get_player_data_as::<Progress>()
        .await?
        .data
        .unwrap_or_default();
    progress.runs += 1;
    let saved = sdk.metadata().set_player_data_object(&progress).await?;
    eprintln!("saved progress {progress:?}: {}", saved.success);

    if sdk.session().is_active() {
        eprintln!("session running; press Ctrl-C to stop");
        tokio::signal::ctrl_c().await?;
        let stopped = sdk.stop_session().await?;
        eprintln!("session stopped: {}", stopped.success);
    }
    Ok(())
}
