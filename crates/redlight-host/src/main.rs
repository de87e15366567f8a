use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use redlight_core::events::GameEvent;
use redlight_host::camera::SyntheticCamera;
use redlight_host::config::HostConfig;
use redlight_host::narrator::SimulatedNarrator;
use redlight_host::session::{SessionBroadcast, SessionCommand, spawn_session};
use redlight_host::sink::{JsonLinesSink, TracingSink};

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so `--json` output on stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let json = std::env::args().skip(1).any(|arg| arg == "--json");

    let config = HostConfig::load();
    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        return ExitCode::FAILURE;
    }
    tracing::info!(
        players = config.game.player_count,
        rounds = config.game.total_rounds,
        sensitivity = config.game.sensitivity,
        "Red Light, Green Light starting"
    );

    let camera = SyntheticCamera::new(&config.video, &config.game);
    let narration = config.narration.clone();
    let make_narrator = |notifier| SimulatedNarrator::new(notifier, &narration);
    let spawned = if json {
        spawn_session(
            &config,
            camera,
            make_narrator,
            JsonLinesSink::new(std::io::stdout()),
        )
    } else {
        spawn_session(&config, camera, make_narrator, TracingSink)
    };
    let (cmd_tx, mut rx, handle) = match spawned {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start session");
            return ExitCode::FAILURE;
        },
    };

    if cmd_tx.send(SessionCommand::Start).is_err() {
        tracing::error!("Session exited before the game could start");
        return ExitCode::FAILURE;
    }

    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                Some(SessionBroadcast::Event(GameEvent::GameOver { .. })) => {
                    let _ = cmd_tx.send(SessionCommand::Stop);
                },
                Some(SessionBroadcast::Event(_)) => {},
                Some(SessionBroadcast::SessionEnded) | None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, leaving the game");
                let _ = cmd_tx.send(SessionCommand::Exit);
                let _ = cmd_tx.send(SessionCommand::Stop);
            }
        }
    }

    if let Err(e) = handle.await {
        tracing::error!(error = %e, "Session task failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
