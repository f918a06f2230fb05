use std::{fs::File, io, sync::Mutex, time::Duration};

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::{
    commands::Command,
    playback::{PlayStateSource, DEFAULT_VOLUME_STEP},
    reconciler::ReconcilerOptions,
    resolver::DeviceAddress,
};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Reconcile the playback state every X milliseconds
    #[clap(long, short, default_value_t = 1000)]
    pub tick_interval: u64,
    /// File to write the log to. If not specified, logs will be written to stderr.
    #[clap(long, short, global = true)]
    log_file: Option<String>,
    /// Bluetooth address of the device to prefer when several players are
    /// connected, e.g. `AA:BB:CC:DD:EE:FF`.
    #[clap(long, short, global = true)]
    pub device: Option<DeviceAddress>,
    /// Volume change applied by `volume-up` and `volume-down`, out of 127.
    #[clap(long, default_value_t = DEFAULT_VOLUME_STEP, global = true)]
    pub volume_step: u16,
    /// Which property drives the playing/paused indicator.
    #[clap(long, value_enum, default_value_t)]
    pub play_state_source: PlayStateSource,
    #[command(subcommand)]
    pub mode: Option<Mode>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum Mode {
    /// Send one command to the connected device and exit
    Ctl {
        #[arg(value_enum)]
        command: Command,
    },
}

impl Args {
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval)
    }

    pub const fn reconciler_options(&self) -> ReconcilerOptions {
        ReconcilerOptions {
            play_state_source: self.play_state_source,
            volume_step: self.volume_step,
        }
    }

    /// Build the tracing subscriber using parameters from the command line arguments
    ///
    /// # Errors
    ///
    /// Returns an error if the log file cannot be created.
    pub fn init_tracing_subscriber(&self) -> Result<()> {
        let builder = tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(EnvFilter::from_default_env());

        match self.log_file.as_ref() {
            None => builder.with_writer(io::stderr).init(),
            Some(f) => {
                let file = File::create(f).with_context(|| format!("Cannot create log file {f}"))?;
                builder.with_writer(Mutex::new(file)).init();
            }
        }
        Ok(())
    }
}
