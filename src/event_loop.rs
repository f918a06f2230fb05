use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::ValueEnum as _;
use tokio::{
    io::{stdin, AsyncBufReadExt as _, BufReader},
    select,
    time::{interval, MissedTickBehavior},
};
use zbus::Connection;

use crate::{
    commands::{self, Command},
    dbus::{bluez::BluezBus, Bus},
    listener::{spawn_listener, subscribe},
    queue::event_queue,
    reconciler::{Reconciler, ReconcilerOptions},
    resolver::Resolver,
    surface::{Surface, WaybarSurface},
};

/// Run the Waybar module until the signal subscription fails.
///
/// Property changes are collected by a listener task and applied by the
/// reconciler on every tick. Commands are read from stdin, one per line.
pub async fn event_loop(
    conn: Connection,
    tick_interval: Duration,
    resolver: Resolver,
    options: ReconcilerOptions,
) -> Result<()> {
    let (sender, receiver) = event_queue();
    let signals = subscribe(&conn).await?;
    let listener = spawn_listener(signals, sender);

    let mut reconciler = Reconciler::new(
        BluezBus::new(conn),
        WaybarSurface::stdout(),
        resolver,
        receiver,
        options,
    );

    // The first tick completes immediately, which binds eagerly at startup
    let mut ticker = interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut commands = BufReader::new(stdin()).lines();
    let mut stdin_open = true;

    loop {
        select! {
            _ = ticker.tick() => {
                if listener.is_finished() {
                    anyhow::bail!("Property change listener stopped");
                }
                reconciler.tick().await;
            }
            line = commands.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => handle_command_line(&mut reconciler, &line).await,
                    Ok(None) => {
                        tracing::info!("Stdin closed, no longer reading commands");
                        stdin_open = false;
                    }
                    Err(e) => {
                        tracing::warn!(?e, "Failed to read command from stdin");
                        stdin_open = false;
                    }
                }
            }
        }
    }
}

async fn handle_command_line<B: Bus, S: Surface>(reconciler: &mut Reconciler<B, S>, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    let command = match Command::from_str(line, true) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(line, %e, "Ignoring unknown command");
            return;
        }
    };
    match reconciler.execute(command).await {
        Ok(()) => tracing::debug!(?command, state = ?reconciler.state(), "Command sent"),
        Err(e) => tracing::warn!(?command, %e, "Command failed"),
    }
}

/// Resolve the player once and send it a single command.
///
/// # Errors
///
/// Returns an error if no player can be bound or the command fails.
pub async fn oneshot(
    conn: Connection,
    resolver: Resolver,
    options: ReconcilerOptions,
    command: Command,
) -> Result<()> {
    let bus = BluezBus::new(conn);
    let binding = resolver
        .bind(&bus)
        .await
        .context("Cannot find a media player to control")?;
    tracing::debug!(?binding, ?command, "Sending command");
    commands::execute(&bus, &binding, command, options.volume_step)
        .await
        .with_context(|| format!("Failed to send {command:?}"))?;
    Ok(())
}
