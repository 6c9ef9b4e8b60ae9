use anyhow::Result;
use balloon::cli::{Cli, Command};
use balloon::config::MatchConfig;
use balloon::console::{self, PowerGauge};
use balloon::core::engine::Engine;
use balloon::core::lobby;
use balloon::MatchController;
use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match cli.command.config() {
        Some(path) => MatchConfig::load(path)?,
        None => MatchConfig::default(),
    };
    let name = cli.command.name().to_string();

    // 1. Fill the room
    let room = match cli.command {
        Command::Host { .. } => lobby::host_room(&config, name).await?,
        Command::Join { host, .. } => lobby::join_room(host, name).await?,
    };
    config.wire_format = room.wire;

    // 2. Wire the match to the room and the console
    let mut controller = MatchController::new(room.transport, &config);
    let events = controller.subscribe();
    let roster = controller.roster().clone();
    let engine = Engine::new(controller, room.inbox, config.turn_timeout());

    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    tokio::spawn(console::print_events(events, roster));
    console::spawn_command_reader(cmd_tx, PowerGauge::new(config.gauge_speed, config.gauge_max));

    // 3. Play until someone quits
    let controller = engine.run(cmd_rx).await?;
    if let Some(by) = controller.state().cracked_by {
        println!("Game over, {} popped it.", controller.roster().name_of(by).unwrap_or("?"));
    }
    Ok(())
}
