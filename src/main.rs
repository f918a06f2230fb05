use anyhow::Result;
use clap::Parser as _;
use event_loop::{event_loop, oneshot};
use resolver::Resolver;
use zbus::Connection;

mod args;
mod commands;
mod dbus;
mod event_loop;
mod listener;
mod output;
mod playback;
mod queue;
mod reconciler;
mod resolver;
mod surface;
mod utils;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = args::Args::parse();
    args.init_tracing_subscriber()?;
    let resolver = Resolver::new(args.device.clone());
    let options = args.reconciler_options();

    let connection = Connection::system().await?;
    match args.mode {
        Some(args::Mode::Ctl { command }) => oneshot(connection, resolver, options, command).await,
        None => event_loop(connection, args.tick_interval(), resolver, options).await,
    }
}
